// Server loop module
// Accepts connections until shutdown is requested, then drains

use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

use super::connection::{accept_connection, ConnectionTracker};
use super::signal::SignalHandler;
use crate::config::AppState;
use crate::logger;

/// Accept connections until `signals` requests shutdown
///
/// Accept errors (for example running out of file descriptors) are logged and
/// the loop keeps going; they only affect the connection being accepted.
pub async fn start_server_loop(
    listener: TcpListener,
    state: Arc<AppState>,
    signals: Arc<SignalHandler>,
) {
    let tracker = Arc::new(ConnectionTracker::new());

    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => {
                        accept_connection(stream, peer_addr, &state, &tracker);
                    }
                    Err(e) => {
                        logger::log_error(&format!("Failed to accept connection: {e}"));
                    }
                }
            }

            () = signals.shutdown.notified() => {
                logger::log_info("Shutdown requested, no longer accepting connections");
                break;
            }
        }
    }

    drop(listener);

    let timeout = Duration::from_secs(state.config.shutdown_timeout);
    let remaining = tracker.wait_idle(timeout).await;
    if remaining > 0 {
        logger::log_warning(&format!(
            "Shutdown timeout after {} seconds, abandoning {remaining} connection(s)",
            timeout.as_secs()
        ));
    } else {
        logger::log_info("All connections closed");
    }
}
