//! Main server loop and connection handling.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use pulse_config::Config;
use pulse_metrics::{
    record_connection_accepted, record_connection_closed, record_connection_rejected,
    record_error,
};
use pulse_store::Store;

use crate::broadcast::Broadcaster;
use crate::conn::handle_conn;
use crate::error::ServerError;
use crate::intake::MessageIntake;
use crate::ledger::{QuotaLedger, QuotaPolicy};
use crate::presence::Presence;
use crate::state::ServerState;
use crate::util::{ConnectionGuard, ConnectionTracker, create_listener};

/// Run the server with a cancellation token for graceful shutdown.
pub async fn run_with_shutdown(
    config: Config,
    store: impl Store + 'static,
    shutdown: CancellationToken,
) -> Result<(), ServerError> {
    let listen: SocketAddr = config
        .server
        .listen
        .parse()
        .map_err(|_| ServerError::Config("invalid listen address".into()))?;

    let store: Arc<dyn Store> = Arc::new(store);
    let presence = Arc::new(Presence::new());
    let broadcast = Broadcaster::new(presence.clone());
    let ledger = Arc::new(QuotaLedger::new(QuotaPolicy::from_config(&config.quota)));
    let intake = MessageIntake::new(store.clone(), ledger, broadcast.clone());

    let state = Arc::new(ServerState {
        presence,
        broadcast,
        intake,
        store,
        ws_path: config.server.ws_path.clone(),
    });

    let tracker = ConnectionTracker::new();

    // Connection limiter (None = unlimited)
    let conn_limit: Option<Arc<Semaphore>> = config.server.max_connections.map(|n| {
        info!("max_connections set to {}", n);
        Arc::new(Semaphore::new(n))
    });

    // Create listener with custom backlog using socket2
    let listener = create_listener(listen, config.server.connection_backlog)?;
    info!(
        address = %listen,
        path = %state.ws_path,
        backlog = config.server.connection_backlog,
        "listening"
    );

    loop {
        tokio::select! {
            biased;

            _ = shutdown.cancelled() => {
                info!("shutdown signal received, stopping accept loop");
                break;
            }

            result = listener.accept() => {
                let (tcp, peer) = result?;

                // Try to acquire connection permit
                let permit: Option<OwnedSemaphorePermit> = match &conn_limit {
                    Some(sem) => match sem.clone().try_acquire_owned() {
                        Ok(p) => Some(p),
                        Err(_) => {
                            debug!(peer = %peer, reason = "max_connections", "connection rejected");
                            record_connection_rejected("max_connections");
                            drop(tcp); // close immediately
                            continue;
                        }
                    },
                    None => None,
                };

                debug!(peer = %peer, "new connection");

                let state = state.clone();
                tracker.increment();
                let guard = ConnectionGuard::new(tracker.clone());

                tokio::spawn(async move {
                    let _guard = guard; // ensure decrement on drop
                    let _permit = permit; // hold permit until connection closes
                    record_connection_accepted();
                    let start = Instant::now();

                    let result = handle_conn(tcp, state, peer).await;

                    let duration_secs = start.elapsed().as_secs_f64();
                    record_connection_closed(duration_secs);

                    if let Err(ref err) = result {
                        record_error(err.error_type());
                        warn!(peer = %peer, duration_secs, error = %err, "connection closed with error");
                    } else {
                        debug!(peer = %peer, duration_secs, "connection closed");
                    }
                });
            }
        }
    }

    // Graceful drain: wait for active connections
    let active = tracker.count();
    if active > 0 {
        let timeout = Duration::from_secs(config.server.shutdown_timeout_secs);
        info!("waiting for {} active connections to drain", active);
        if tracker.wait_for_zero(timeout).await {
            info!("all connections drained");
        } else {
            warn!(
                "shutdown timeout, {} connections still active",
                tracker.count()
            );
        }
    }

    info!("server stopped");
    Ok(())
}

/// Run the server (blocking until error, no graceful shutdown).
pub async fn run(config: Config, store: impl Store + 'static) -> Result<(), ServerError> {
    run_with_shutdown(config, store, CancellationToken::new()).await
}
