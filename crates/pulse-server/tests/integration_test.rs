//! Integration tests for pulse-server.
//!
//! These tests run a real server on an ephemeral port and drive it with
//! tokio-tungstenite clients, covering:
//! - token handshake and policy closes
//! - presence broadcasts
//! - the send flow with quota decisions
//! - session replacement
//! - graceful shutdown

use std::net::SocketAddr;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::net::TcpStream;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use pulse_core::VipTier;
use pulse_config::{Config, LoggingConfig, MetricsConfig, QuotaConfig, ServerConfig};
use pulse_server::{CancellationToken, run_with_shutdown};
use pulse_store::{MemoryStore, SeedUser};

type WsClient = WebSocketStream<MaybeTlsStream<TcpStream>>;

struct TestServer {
    addr: SocketAddr,
    shutdown: CancellationToken,
    handle: JoinHandle<()>,
}

impl TestServer {
    async fn start(users: Vec<SeedUser>) -> Self {
        // Find available port
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let config = Config {
            server: ServerConfig {
                listen: addr.to_string(),
                ws_path: "/ws".into(),
                max_connections: None,
                connection_backlog: 128,
                shutdown_timeout_secs: 1,
            },
            quota: QuotaConfig::default(),
            users: vec![],
            metrics: MetricsConfig::default(),
            logging: LoggingConfig::default(),
        };

        let store = MemoryStore::from_seed(users);
        let shutdown = CancellationToken::new();
        let token = shutdown.clone();
        let handle = tokio::spawn(async move {
            let _ = run_with_shutdown(config, store, token).await;
        });

        // Wait for the listener to come up
        tokio::time::sleep(Duration::from_millis(300)).await;

        Self {
            addr,
            shutdown,
            handle,
        }
    }

    async fn connect(&self, token: &str) -> WsClient {
        let url = format!("ws://{}/ws?token={}", self.addr, token);
        let (ws, _) = connect_async(url).await.unwrap();
        ws
    }
}

fn default_users() -> Vec<SeedUser> {
    vec![
        SeedUser::new("alice", "Alice").with_diamonds(5),
        SeedUser::new("bob", "Bob").with_diamonds(0),
    ]
}

/// Read the next frame of any kind, failing the test on timeout.
async fn next_message(ws: &mut WsClient) -> WsMessage {
    timeout(Duration::from_secs(2), ws.next())
        .await
        .expect("timed out waiting for frame")
        .expect("connection ended unexpectedly")
        .expect("websocket error")
}

/// Skip frames until one with the given `type` tag arrives.
async fn wait_for(ws: &mut WsClient, frame_type: &str) -> Value {
    loop {
        if let WsMessage::Text(text) = next_message(ws).await {
            let value: Value = serde_json::from_str(&text).unwrap();
            if value["type"] == frame_type {
                return value;
            }
        }
    }
}

async fn send_json(ws: &mut WsClient, value: Value) {
    ws.send(WsMessage::text(value.to_string())).await.unwrap();
}

/// Read until a close frame arrives and return it.
async fn wait_for_close(ws: &mut WsClient) -> Option<tokio_tungstenite::tungstenite::protocol::CloseFrame<'static>> {
    loop {
        match next_message(ws).await {
            WsMessage::Close(frame) => return frame,
            _ => continue,
        }
    }
}

#[tokio::test]
async fn test_missing_token_closed_with_policy() {
    let server = TestServer::start(default_users()).await;

    let url = format!("ws://{}/ws", server.addr);
    let (mut ws, _) = connect_async(url).await.unwrap();
    let frame = wait_for_close(&mut ws).await.expect("expected close frame");
    assert_eq!(frame.code, CloseCode::Policy);
    assert_eq!(frame.reason, "token required");

    server.shutdown.cancel();
}

#[tokio::test]
async fn test_unknown_user_closed_with_policy() {
    let server = TestServer::start(default_users()).await;

    let mut ws = server.connect("ghost").await;
    let frame = wait_for_close(&mut ws).await.expect("expected close frame");
    assert_eq!(frame.code, CloseCode::Policy);
    assert_eq!(frame.reason, "unknown user");

    server.shutdown.cancel();
}

#[tokio::test]
async fn test_percent_encoded_token_authenticates() {
    let users = vec![
        SeedUser::new("user one", "Spacey"),
        SeedUser::new("bob", "Bob"),
    ];
    let server = TestServer::start(users).await;

    let mut ws = server.connect("user%20one").await;
    send_json(&mut ws, json!({"type": "ping"})).await;
    wait_for(&mut ws, "pong").await;

    server.shutdown.cancel();
}

#[tokio::test]
async fn test_ping_pong() {
    let server = TestServer::start(default_users()).await;

    let mut ws = server.connect("alice").await;
    send_json(&mut ws, json!({"type": "ping"})).await;
    wait_for(&mut ws, "pong").await;

    server.shutdown.cancel();
}

#[tokio::test]
async fn test_online_broadcast_on_connect() {
    let server = TestServer::start(default_users()).await;

    let mut alice = server.connect("alice").await;
    let mut bob = server.connect("bob").await;

    // Alice first sees her own announcement, then bob's arrival.
    let frame = wait_for(&mut alice, "user_online").await;
    assert_eq!(frame["userId"], "alice");
    let frame = wait_for(&mut alice, "user_online").await;
    assert_eq!(frame["userId"], "bob");
    // The newcomer hears about itself as well.
    let frame = wait_for(&mut bob, "user_online").await;
    assert_eq!(frame["userId"], "bob");

    server.shutdown.cancel();
}

#[tokio::test]
async fn test_send_message_flow() {
    let server = TestServer::start(default_users()).await;

    let mut alice = server.connect("alice").await;
    let mut bob = server.connect("bob").await;
    wait_for(&mut alice, "user_online").await;

    send_json(
        &mut alice,
        json!({"type": "send_message", "receiverId": "bob", "content": "hello"}),
    )
    .await;

    // Sender gets the durable echo before the acknowledgement.
    let echo = wait_for(&mut alice, "new_message").await;
    assert_eq!(echo["message"]["senderId"], "alice");
    assert_eq!(echo["message"]["content"], "hello");
    assert_eq!(echo["message"]["isPaid"], false);

    let ack = wait_for(&mut alice, "message_sent").await;
    assert_eq!(ack["isPaid"], false);
    assert_eq!(ack["remainingFree"], 2);

    let push = wait_for(&mut bob, "new_message").await;
    assert_eq!(push["message"]["senderId"], "alice");
    assert_eq!(push["message"]["id"], echo["message"]["id"]);

    server.shutdown.cancel();
}

#[tokio::test]
async fn test_quota_block_and_paid_send() {
    let server = TestServer::start(default_users()).await;

    let mut alice = server.connect("alice").await;
    for _ in 0..3 {
        send_json(
            &mut alice,
            json!({"type": "send_message", "receiverId": "bob", "content": "hi"}),
        )
        .await;
        wait_for(&mut alice, "message_sent").await;
    }

    // Fourth message without consent is refused with quota details.
    send_json(
        &mut alice,
        json!({"type": "send_message", "receiverId": "bob", "content": "hi"}),
    )
    .await;
    let error = wait_for(&mut alice, "error").await;
    assert_eq!(error["code"], "diamonds_required");
    assert_eq!(error["diamondsNeeded"], 1);
    assert_eq!(error["currentDiamonds"], 5);

    // With consent the message goes through as paid.
    send_json(
        &mut alice,
        json!({"type": "send_message", "receiverId": "bob", "content": "hi", "useDiamonds": true}),
    )
    .await;
    let ack = wait_for(&mut alice, "message_sent").await;
    assert_eq!(ack["isPaid"], true);
    assert_eq!(ack["remainingFree"], 0);

    server.shutdown.cancel();
}

#[tokio::test]
async fn test_unknown_receiver_error_frame() {
    let server = TestServer::start(default_users()).await;

    let mut alice = server.connect("alice").await;
    send_json(
        &mut alice,
        json!({"type": "send_message", "receiverId": "ghost", "content": "hi"}),
    )
    .await;
    let error = wait_for(&mut alice, "error").await;
    assert_eq!(error["code"], "unknown_user");

    server.shutdown.cancel();
}

#[tokio::test]
async fn test_vip_sender_keeps_free_messages() {
    let users = vec![
        SeedUser::new("vip", "Vip").with_vip(VipTier::Bronze).with_diamonds(0),
        SeedUser::new("bob", "Bob"),
    ];
    let server = TestServer::start(users).await;

    let mut vip = server.connect("vip").await;
    for _ in 0..5 {
        send_json(
            &mut vip,
            json!({"type": "send_message", "receiverId": "bob", "content": "hi"}),
        )
        .await;
        let ack = wait_for(&mut vip, "message_sent").await;
        assert_eq!(ack["isPaid"], false);
    }

    server.shutdown.cancel();
}

#[tokio::test]
async fn test_session_replacement() {
    let server = TestServer::start(default_users()).await;

    let mut first = server.connect("alice").await;
    wait_for(&mut first, "user_online").await;

    let mut second = server.connect("alice").await;
    let frame = wait_for_close(&mut first).await.expect("expected close frame");
    assert_eq!(frame.code, CloseCode::Policy);
    assert_eq!(frame.reason, "session replaced");

    // The replacement session is live.
    send_json(&mut second, json!({"type": "ping"})).await;
    wait_for(&mut second, "pong").await;

    server.shutdown.cancel();
}

#[tokio::test]
async fn test_offline_broadcast_on_disconnect() {
    let server = TestServer::start(default_users()).await;

    let mut bob = server.connect("bob").await;
    let alice = server.connect("alice").await;
    wait_for(&mut bob, "user_online").await;

    drop(alice);
    let frame = wait_for(&mut bob, "user_offline").await;
    assert_eq!(frame["userId"], "alice");

    server.shutdown.cancel();
}

#[tokio::test]
async fn test_delete_conversation_resets_quota() {
    let server = TestServer::start(default_users()).await;

    let mut alice = server.connect("alice").await;
    for _ in 0..3 {
        send_json(
            &mut alice,
            json!({"type": "send_message", "receiverId": "bob", "content": "hi"}),
        )
        .await;
        wait_for(&mut alice, "message_sent").await;
    }

    send_json(&mut alice, json!({"type": "delete_conversation", "peerId": "bob"})).await;
    let ack = wait_for(&mut alice, "conversation_deleted").await;
    assert_eq!(ack["peerId"], "bob");

    // The free allowance is back.
    send_json(
        &mut alice,
        json!({"type": "send_message", "receiverId": "bob", "content": "hi"}),
    )
    .await;
    let ack = wait_for(&mut alice, "message_sent").await;
    assert_eq!(ack["isPaid"], false);
    assert_eq!(ack["remainingFree"], 2);

    server.shutdown.cancel();
}

#[tokio::test]
async fn test_graceful_shutdown() {
    let server = TestServer::start(default_users()).await;

    let _ws = server.connect("alice").await;
    server.shutdown.cancel();

    timeout(Duration::from_secs(5), server.handle)
        .await
        .expect("server did not stop in time")
        .unwrap();
}
