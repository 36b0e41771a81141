//! At-most-once event delivery to connected clients.
//!
//! Frames are serialized once and pushed onto the target connection's
//! outbound channel. Offline recipients are skipped; nothing is queued or
//! retried.

use std::sync::Arc;

use tokio_tungstenite::tungstenite::Message as WsMessage;
use tracing::{error, trace};

use pulse_metrics::{record_event_delivered, record_event_dropped};
use pulse_proto::ServerFrame;

use crate::presence::Presence;

#[derive(Clone)]
pub struct Broadcaster {
    presence: Arc<Presence>,
}

impl Broadcaster {
    pub fn new(presence: Arc<Presence>) -> Self {
        Self { presence }
    }

    /// Deliver a frame to a single user. Returns false when the user is
    /// offline or the connection is going away; the frame is dropped.
    pub fn deliver_to_user(&self, user_id: &str, frame: &ServerFrame) -> bool {
        let event = frame.event_type();
        let Some(handle) = self.presence.lookup(user_id) else {
            trace!(user = %user_id, event, "recipient offline, dropping event");
            record_event_dropped(event);
            return false;
        };
        let text = match serde_json::to_string(frame) {
            Ok(text) => text,
            Err(err) => {
                error!(event, error = %err, "failed to serialize frame");
                return false;
            }
        };
        if handle.send(WsMessage::text(text)).is_ok() {
            record_event_delivered(event);
            true
        } else {
            // Writer task already gone; the connection is tearing down.
            record_event_dropped(event);
            false
        }
    }

    /// Deliver a frame to every connected client.
    pub fn broadcast_all(&self, frame: &ServerFrame) {
        let event = frame.event_type();
        let text = match serde_json::to_string(frame) {
            Ok(text) => text,
            Err(err) => {
                error!(event, error = %err, "failed to serialize frame");
                return;
            }
        };
        for handle in self.presence.handles() {
            if handle.send(WsMessage::text(text.clone())).is_ok() {
                record_event_delivered(event);
            } else {
                record_event_dropped(event);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deliver_to_offline_user_is_dropped() {
        let presence = Arc::new(Presence::new());
        let broadcast = Broadcaster::new(presence);
        assert!(!broadcast.deliver_to_user("nobody", &ServerFrame::Pong));
    }

    #[test]
    fn test_deliver_to_online_user() {
        let presence = Arc::new(Presence::new());
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        presence.register("u1", tx);
        let broadcast = Broadcaster::new(presence);

        assert!(broadcast.deliver_to_user(
            "u1",
            &ServerFrame::UserOnline {
                user_id: "u2".into()
            }
        ));
        let msg = rx.try_recv().unwrap();
        assert_eq!(
            msg.to_text().unwrap(),
            r#"{"type":"user_online","userId":"u2"}"#
        );
    }

    #[test]
    fn test_broadcast_reaches_everyone() {
        let presence = Arc::new(Presence::new());
        let (tx1, mut rx1) = tokio::sync::mpsc::unbounded_channel();
        let (tx2, mut rx2) = tokio::sync::mpsc::unbounded_channel();
        presence.register("u1", tx1);
        presence.register("u2", tx2);
        let broadcast = Broadcaster::new(presence);

        broadcast.broadcast_all(&ServerFrame::UserOffline {
            user_id: "u3".into(),
        });
        assert!(rx1.try_recv().is_ok());
        assert!(rx2.try_recv().is_ok());
    }
}
