//! Pulse server library.
//!
//! This module exposes the server implementation for use by integration tests
//! and potential embedding scenarios.

pub mod cli;

mod broadcast;
mod conn;
mod error;
mod intake;
mod ledger;
mod presence;
mod server;
mod state;
mod util;

pub use broadcast::Broadcaster;
pub use error::ServerError;
pub use intake::{IntakeError, MessageIntake, SendOutcome};
pub use ledger::{Decision, PairCounters, QuotaLedger, QuotaPolicy};
pub use presence::{ConnHandle, Presence};
pub use server::{run, run_with_shutdown};
pub use tokio_util::sync::CancellationToken;
