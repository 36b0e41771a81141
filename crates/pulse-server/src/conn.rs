//! Per-connection supervisor.
//!
//! Accepts the WebSocket upgrade, authenticates the `token` query parameter,
//! registers the connection in the presence registry and then pumps frames
//! until the peer goes away. All writes flow through an unbounded channel to
//! a dedicated writer task so the broadcaster never blocks on a slow socket.

use std::net::SocketAddr;
use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::accept_hdr_async;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::http::StatusCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use time::OffsetDateTime;
use tracing::{debug, error, info, warn};

use pulse_metrics::{
    record_auth_failure, record_connection_rejected, record_error, record_session_replaced,
    set_users_online, ERROR_STORE, ERROR_WEBSOCKET,
};
use pulse_proto::{ClientFrame, ErrorCode, ServerFrame};

use crate::error::ServerError;
use crate::intake::IntakeError;
use crate::presence::ConnHandle;
use crate::state::ServerState;

/// Handle a single client connection from TCP accept to teardown.
pub async fn handle_conn(
    stream: TcpStream,
    state: Arc<ServerState>,
    peer: SocketAddr,
) -> Result<(), ServerError> {
    let mut token: Option<String> = None;
    let ws_path = state.ws_path.clone();
    let callback = |req: &Request, resp: Response| -> Result<Response, ErrorResponse> {
        if req.uri().path() != ws_path {
            let mut reject = ErrorResponse::new(Some("not found".into()));
            *reject.status_mut() = StatusCode::NOT_FOUND;
            return Err(reject);
        }
        token = req.uri().query().and_then(token_from_query);
        Ok(resp)
    };

    let mut ws = match accept_hdr_async(stream, callback).await {
        Ok(ws) => ws,
        Err(err) => {
            debug!(peer = %peer, error = %err, "websocket handshake failed");
            record_error(ERROR_WEBSOCKET);
            record_connection_rejected("handshake");
            return Ok(());
        }
    };

    // Accept first, then close with a policy code so the client sees a
    // proper close frame instead of a failed upgrade.
    let user_id = match token.filter(|t| !t.is_empty()) {
        Some(token) => token,
        None => {
            record_auth_failure();
            record_connection_rejected("missing_token");
            debug!(peer = %peer, "closing connection without token");
            let _ = ws
                .close(Some(CloseFrame {
                    code: CloseCode::Policy,
                    reason: "token required".into(),
                }))
                .await;
            return Ok(());
        }
    };

    match state.store.get_user(&user_id).await {
        Ok(Some(_)) => {}
        Ok(None) => {
            record_auth_failure();
            record_connection_rejected("unknown_user");
            debug!(peer = %peer, user = %user_id, "closing connection for unknown user");
            let _ = ws
                .close(Some(CloseFrame {
                    code: CloseCode::Policy,
                    reason: "unknown user".into(),
                }))
                .await;
            return Ok(());
        }
        Err(err) => {
            record_error(ERROR_STORE);
            warn!(peer = %peer, user = %user_id, error = %err, "user lookup failed");
            let _ = ws
                .close(Some(CloseFrame {
                    code: CloseCode::Error,
                    reason: "internal error".into(),
                }))
                .await;
            return Ok(());
        }
    }

    let (mut sink, mut reader) = ws.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<WsMessage>();

    let writer = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            let is_close = matches!(msg, WsMessage::Close(_));
            if sink.send(msg).await.is_err() {
                break;
            }
            if is_close {
                break;
            }
        }
        let _ = sink.close().await;
    });

    let (conn_id, evicted) = state.presence.register(&user_id, tx.clone());
    if let Some(old) = evicted {
        record_session_replaced();
        info!(user = %user_id, "replacing existing session");
        let _ = old.send(WsMessage::Close(Some(CloseFrame {
            code: CloseCode::Policy,
            reason: "session replaced".into(),
        })));
    }
    set_users_online(state.presence.online_count());

    if let Err(err) = state
        .store
        .set_presence(&user_id, true, OffsetDateTime::now_utc())
        .await
    {
        record_error(ERROR_STORE);
        warn!(user = %user_id, error = %err, "failed to persist online presence");
    }
    state.broadcast.broadcast_all(&ServerFrame::UserOnline {
        user_id: user_id.clone(),
    });
    info!(peer = %peer, user = %user_id, "connection established");

    while let Some(msg) = reader.next().await {
        match msg {
            Ok(WsMessage::Text(text)) => handle_frame(&state, &user_id, &tx, &text).await,
            Ok(WsMessage::Ping(payload)) => {
                let _ = tx.send(WsMessage::Pong(payload));
            }
            Ok(WsMessage::Close(_)) => break,
            Ok(_) => {}
            Err(err) => {
                debug!(peer = %peer, user = %user_id, error = %err, "read error");
                break;
            }
        }
    }

    // Only announce offline if this connection still owns the registration;
    // a replacement session keeps the user online.
    if state.presence.unregister(&user_id, conn_id) {
        set_users_online(state.presence.online_count());
        if let Err(err) = state
            .store
            .set_presence(&user_id, false, OffsetDateTime::now_utc())
            .await
        {
            record_error(ERROR_STORE);
            warn!(user = %user_id, error = %err, "failed to persist offline presence");
        }
        state.broadcast.broadcast_all(&ServerFrame::UserOffline {
            user_id: user_id.clone(),
        });
    }

    drop(tx);
    let _ = writer.await;
    debug!(peer = %peer, user = %user_id, "connection teardown complete");
    Ok(())
}

/// Dispatch one inbound text frame. Malformed frames are logged and ignored.
async fn handle_frame(state: &ServerState, user_id: &str, tx: &ConnHandle, raw: &str) {
    let frame: ClientFrame = match serde_json::from_str(raw) {
        Ok(frame) => frame,
        Err(err) => {
            debug!(user = %user_id, error = %err, "ignoring malformed frame");
            return;
        }
    };

    match frame {
        ClientFrame::Ping => send_frame(tx, &ServerFrame::Pong),
        ClientFrame::SendMessage {
            receiver_id,
            content,
            use_diamonds,
        } => {
            match state
                .intake
                .send(user_id, &receiver_id, &content, use_diamonds)
                .await
            {
                Ok(outcome) => send_frame(
                    tx,
                    &ServerFrame::MessageSent {
                        is_paid: outcome.message.is_paid,
                        remaining_free: outcome.remaining_free,
                        message: outcome.message,
                    },
                ),
                Err(err) => {
                    record_error(err.error_type());
                    send_frame(tx, &error_frame(&err));
                }
            }
        }
        ClientFrame::DeleteConversation { peer_id } => {
            match state.intake.delete_conversation(user_id, &peer_id).await {
                Ok(()) => send_frame(tx, &ServerFrame::ConversationDeleted { peer_id }),
                Err(err) => {
                    record_error(err.error_type());
                    send_frame(tx, &error_frame(&err));
                }
            }
        }
    }
}

fn send_frame(tx: &ConnHandle, frame: &ServerFrame) {
    match serde_json::to_string(frame) {
        Ok(text) => {
            let _ = tx.send(WsMessage::text(text));
        }
        Err(err) => error!(error = %err, "failed to serialize frame"),
    }
}

fn error_frame(err: &IntakeError) -> ServerFrame {
    match err {
        IntakeError::Validation(msg) => ServerFrame::error(ErrorCode::Validation, *msg),
        IntakeError::UnknownUser(id) => {
            ServerFrame::error(ErrorCode::UnknownUser, format!("unknown user: {id}"))
        }
        IntakeError::QuotaBlocked {
            current_diamonds,
            diamonds_needed,
        } => ServerFrame::Error {
            code: ErrorCode::DiamondsRequired,
            message: "free message limit reached".into(),
            diamonds_needed: Some(*diamonds_needed),
            current_diamonds: Some(*current_diamonds),
        },
        IntakeError::Store(_) => ServerFrame::error(ErrorCode::Internal, "storage unavailable"),
    }
}

/// Extract the `token` parameter from a raw query string.
///
/// The value is form-urlencoded: `+` means space and percent escapes are
/// decoded, so seeded ids are not restricted to URL-safe characters.
fn token_from_query(query: &str) -> Option<String> {
    query.split('&').find_map(|pair| {
        pair.strip_prefix("token=").map(|value| {
            let value = value.replace('+', " ");
            percent_encoding::percent_decode_str(&value)
                .decode_utf8()
                .map(|decoded| decoded.into_owned())
                .unwrap_or(value)
        })
    })
}
