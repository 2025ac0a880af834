//! Periodic expiry sweep.
//!
//! Spawns a background task that closes expired open positions and
//! flips lapsed pending applications and invites to EXPIRED, notifying
//! affected applicants. Read paths already compute effective status on
//! the fly; this sweep is the only writer of persisted expiry state.

use std::sync::Arc;
use std::time::Duration;

use squadhq_workflows::PositionService;
use tokio_util::sync::CancellationToken;

/// Run the expiry sweep loop until `cancel` is triggered.
pub async fn run(positions: Arc<PositionService>, interval_secs: u64, cancel: CancellationToken) {
    tracing::info!(interval_secs, "Expiry sweep started");

    let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Expiry sweep stopping");
                break;
            }
            _ = interval.tick() => {
                match positions.process_expirations().await {
                    Ok(sweep) => {
                        tracing::debug!(
                            positions_closed = sweep.positions_closed,
                            applications_expired = sweep.applications_expired,
                            invites_expired = sweep.invites_expired,
                            "Expiry sweep completed"
                        );
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Expiry sweep failed");
                    }
                }
            }
        }
    }
}
