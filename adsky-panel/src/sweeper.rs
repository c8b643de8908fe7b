//! Background removal of spent verification tokens

use std::sync::Arc;
use std::time::Duration;

use adsky_core::{TokenStore, VerificationTokenService};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Periodically delete tokens that are expired or already consumed.
///
/// Only rows that are spent at the time of the sweep are deleted, so a
/// sweep never races a validation that could still succeed.
pub fn spawn_sweeper<T>(tokens: Arc<VerificationTokenService<T>>, every: Duration) -> JoinHandle<()>
where
    T: TokenStore + 'static,
{
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            interval.tick().await;
            match tokens.sweep() {
                Ok(0) => tracing::trace!("Token sweep found nothing to delete"),
                Ok(deleted) => tracing::info!(deleted, "Swept spent verification tokens"),
                Err(e) => tracing::error!(error = %e, "Token sweep failed"),
            }
        }
    })
}
