//! Background sweep for the in-memory nonce store.
//!
//! Reads already treat expired challenges as absent; this job only keeps
//! abandoned challenges from accumulating. Redis expires keys natively and
//! needs no sweep.

use crate::storage::MemoryNonceStore;
use chrono::Utc;
use std::sync::Weak;
use std::time::Duration;

/// Run the sweep loop.
///
/// Purges expired records every `interval`. Exits once the store has been
/// dropped, so the task lives exactly as long as the store it serves.
pub async fn run_sweep_loop(store: Weak<MemoryNonceStore>, interval: Duration) {
    loop {
        tokio::time::sleep(interval).await;

        let Some(store) = store.upgrade() else {
            tracing::debug!("Nonce store dropped, stopping sweep");
            break;
        };

        let removed = store.purge_expired(Utc::now()).await;
        if removed > 0 {
            tracing::info!(removed, "Expired challenges swept");
        }
    }
}
