//! Periodic token housekeeping.
//!
//! The cleanup sweeps run outside the request path. They only touch rows
//! already expired or revoked past the retention window, so they never race
//! with in-flight issuance or refresh.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::token::TokenService;

/// Spawns the periodic cleanup sweep on the current tokio runtime.
///
/// Each tick deletes expired pairs and revoked pairs past retention,
/// logging the counts. Errors are logged and the sweep keeps running.
/// Abort the returned handle to stop it.
pub fn spawn_cleanup_task(service: Arc<TokenService>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;

            match service.delete_expired_tokens().await {
                Ok(count) if count > 0 => {
                    tracing::info!(count, "Cleanup: deleted expired token pairs");
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(error = %e, "Cleanup: expired-token sweep failed");
                }
            }

            match service.delete_old_revoked_tokens().await {
                Ok(count) if count > 0 => {
                    tracing::info!(count, "Cleanup: deleted old revoked token pairs");
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(error = %e, "Cleanup: revoked-token sweep failed");
                }
            }
        }
    })
}
