//! Shared server state passed to connection handlers.

use std::sync::Arc;

use pulse_store::Store;

use crate::broadcast::Broadcaster;
use crate::intake::MessageIntake;
use crate::presence::Presence;

/// Immutable state shared by every connection.
pub struct ServerState {
    pub presence: Arc<Presence>,
    pub broadcast: Broadcaster,
    pub intake: MessageIntake,
    pub store: Arc<dyn Store>,
    /// Path the duplex endpoint is served on, e.g. `/ws`.
    pub ws_path: String,
}
