//! JSON wire frames for the pulse duplex endpoint.
//!
//! Frames are tagged with a `type` field; payload fields use camelCase to
//! match the stored record shape. Inbound frames the server does not
//! recognize are ignored by the connection supervisor, so this enum only
//! needs the frames it acts on.

use serde::{Deserialize, Serialize};

use pulse_store::Message;

/// Frames a client may send over an established connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientFrame {
    /// Liveness probe; answered with [`ServerFrame::Pong`].
    Ping,
    /// Send a chat message to another user.
    #[serde(rename_all = "camelCase")]
    SendMessage {
        receiver_id: String,
        content: String,
        /// Whether the sender agrees to spend diamonds if no free
        /// allowance remains.
        #[serde(default)]
        use_diamonds: bool,
    },
    /// Delete the whole conversation with a peer, resetting its quota.
    #[serde(rename_all = "camelCase")]
    DeleteConversation { peer_id: String },
}

/// Frames the server pushes to clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerFrame {
    Pong,
    /// A stored message delivered to one of the two parties. The sender
    /// receives this as an echo, strictly after the record is durable.
    NewMessage { message: Message },
    /// Acknowledgement to the sending connection with the quota outcome.
    #[serde(rename_all = "camelCase")]
    MessageSent {
        message: Message,
        is_paid: bool,
        remaining_free: u32,
    },
    #[serde(rename_all = "camelCase")]
    UserOnline { user_id: String },
    #[serde(rename_all = "camelCase")]
    UserOffline { user_id: String },
    #[serde(rename_all = "camelCase")]
    ConversationDeleted { peer_id: String },
    /// A request-level failure, resolved at the supervisor boundary.
    #[serde(rename_all = "camelCase")]
    Error {
        code: ErrorCode,
        message: String,
        /// Present for `diamonds_required`: cost of one paid message.
        #[serde(skip_serializing_if = "Option::is_none")]
        diamonds_needed: Option<u64>,
        /// Present for `diamonds_required`: balance at decision time.
        #[serde(skip_serializing_if = "Option::is_none")]
        current_diamonds: Option<u64>,
    },
}

/// Machine-readable failure classification carried by error frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// Missing or empty required field.
    Validation,
    /// Referenced user id is unknown.
    UnknownUser,
    /// The send is blocked until the sender spends diamonds.
    DiamondsRequired,
    /// Storage collaborator failure.
    Internal,
}

impl ServerFrame {
    /// Shorthand for an error frame without quota details.
    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        ServerFrame::Error {
            code,
            message: message.into(),
            diamonds_needed: None,
            current_diamonds: None,
        }
    }

    /// The wire `type` tag, used as a metric label.
    pub fn event_type(&self) -> &'static str {
        match self {
            ServerFrame::Pong => "pong",
            ServerFrame::NewMessage { .. } => "new_message",
            ServerFrame::MessageSent { .. } => "message_sent",
            ServerFrame::UserOnline { .. } => "user_online",
            ServerFrame::UserOffline { .. } => "user_offline",
            ServerFrame::ConversationDeleted { .. } => "conversation_deleted",
            ServerFrame::Error { .. } => "error",
        }
    }
}
