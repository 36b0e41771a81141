//! Metrics collection and Prometheus exporter for pulse.
//!
//! This module provides metrics instrumentation for the presence and
//! message-delivery server: connection counts, quota decisions, delivery
//! outcomes, and error rates.

use std::net::SocketAddr;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Initialize Prometheus metrics exporter.
///
/// Starts an HTTP server on the given address to expose metrics.
/// Returns an error message if binding fails.
pub fn init_prometheus(listen: &str) -> Result<(), String> {
    let addr: SocketAddr = listen
        .parse()
        .map_err(|e| format!("invalid metrics listen address: {}", e))?;

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| format!("failed to install prometheus exporter: {}", e))?;

    Ok(())
}

// ============================================================================
// Metric Names
// ============================================================================

/// Total number of WebSocket connections accepted.
pub const CONNECTIONS_TOTAL: &str = "pulse_connections_total";
/// Number of currently active connections.
pub const CONNECTIONS_ACTIVE: &str = "pulse_connections_active";
/// Total number of connections rejected before reaching Open.
pub const CONNECTIONS_REJECTED_TOTAL: &str = "pulse_connections_rejected_total";
/// Total number of sessions evicted by a newer connection for the same user.
pub const SESSIONS_REPLACED_TOTAL: &str = "pulse_sessions_replaced_total";
/// Total number of failed handshake authentications.
pub const AUTH_FAILURE_TOTAL: &str = "pulse_auth_failure_total";
/// Number of users currently registered as online.
pub const USERS_ONLINE: &str = "pulse_users_online";
/// Total messages accepted, labeled by quota kind ("free", "paid").
pub const MESSAGES_SENT_TOTAL: &str = "pulse_messages_sent_total";
/// Total sends blocked pending diamonds.
pub const MESSAGES_BLOCKED_TOTAL: &str = "pulse_messages_blocked_total";
/// Total events delivered to a live connection, labeled by event type.
pub const EVENTS_DELIVERED_TOTAL: &str = "pulse_events_delivered_total";
/// Total events dropped because the recipient was offline.
pub const EVENTS_DROPPED_TOTAL: &str = "pulse_events_dropped_total";
/// Connection duration histogram (seconds).
pub const CONNECTION_DURATION_SECONDS: &str = "pulse_connection_duration_seconds";
/// Total number of errors by type.
pub const ERRORS_TOTAL: &str = "pulse_errors_total";

// ============================================================================
// Metric Recording Functions
// ============================================================================

/// Record a new connection accepted.
#[inline]
pub fn record_connection_accepted() {
    counter!(CONNECTIONS_TOTAL).increment(1);
    gauge!(CONNECTIONS_ACTIVE).increment(1.0);
}

/// Record a connection closed.
#[inline]
pub fn record_connection_closed(duration_secs: f64) {
    gauge!(CONNECTIONS_ACTIVE).decrement(1.0);
    histogram!(CONNECTION_DURATION_SECONDS).record(duration_secs);
}

/// Record a rejected connection (reason: "max_connections", "bad_path",
/// "missing_token", "unknown_user").
#[inline]
pub fn record_connection_rejected(reason: &'static str) {
    counter!(CONNECTIONS_REJECTED_TOTAL, "reason" => reason).increment(1);
}

/// Record a session evicted by a newer connection for the same user.
#[inline]
pub fn record_session_replaced() {
    counter!(SESSIONS_REPLACED_TOTAL).increment(1);
}

/// Record failed handshake authentication.
#[inline]
pub fn record_auth_failure() {
    counter!(AUTH_FAILURE_TOTAL).increment(1);
}

/// Set the online users gauge.
#[inline]
pub fn set_users_online(count: usize) {
    gauge!(USERS_ONLINE).set(count as f64);
}

/// Record an accepted message (kind: "free" or "paid").
#[inline]
pub fn record_message_sent(kind: &'static str) {
    counter!(MESSAGES_SENT_TOTAL, "kind" => kind).increment(1);
}

/// Record a send blocked pending diamonds.
#[inline]
pub fn record_message_blocked() {
    counter!(MESSAGES_BLOCKED_TOTAL).increment(1);
}

/// Record an event delivered to a live connection.
#[inline]
pub fn record_event_delivered(event_type: &'static str) {
    counter!(EVENTS_DELIVERED_TOTAL, "event" => event_type).increment(1);
}

/// Record an event dropped because the recipient had no live connection.
#[inline]
pub fn record_event_dropped(event_type: &'static str) {
    counter!(EVENTS_DROPPED_TOTAL, "event" => event_type).increment(1);
}

/// Record an error by type.
#[inline]
pub fn record_error(error_type: &'static str) {
    counter!(ERRORS_TOTAL, "type" => error_type).increment(1);
}

// ============================================================================
// Error Type Constants (re-exported from pulse-core)
// ============================================================================

pub use pulse_core::{
    ERROR_AUTH, ERROR_CONFIG, ERROR_IO, ERROR_QUOTA, ERROR_STORE, ERROR_VALIDATION,
    ERROR_WEBSOCKET,
};
