//! Nonce storage for outstanding authentication challenges.
//!
//! One live record per address. `put` replaces whatever was stored for the
//! address, `get_valid` treats expired or mismatched records as absent, and
//! `consume` removes the record only while it still holds the given nonce.
//!
//! Backends:
//! - [`RedisNonceStore`]: production, `redis://` / `rediss://` URLs
//! - [`MemoryNonceStore`]: tests and local development, `memory://`

pub mod memory;
pub mod nonce;

pub use memory::MemoryNonceStore;
pub use nonce::RedisNonceStore;

use crate::cleanup;
use crate::models::{Address, NonceRecord};
use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use std::sync::Arc;
use std::time::Duration;
use subtle::ConstantTimeEq;

/// Storage URL scheme selecting the in-memory backend.
pub const MEMORY_URL_SCHEME: &str = "memory://";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("JSON error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid nonce TTL")]
    InvalidTtl,
}

/// Persistence for challenge nonces, keyed by lower-cased address.
#[async_trait]
pub trait NonceStore: Send + Sync {
    /// Replace any record for `address` with a fresh one expiring after `ttl`.
    async fn put(
        &self,
        address: &Address,
        nonce: &str,
        ttl: Duration,
    ) -> Result<NonceRecord, StoreError>;

    /// Return the record only if it holds `nonce` and has not expired.
    async fn get_valid(
        &self,
        address: &Address,
        nonce: &str,
    ) -> Result<Option<NonceRecord>, StoreError>;

    /// Delete the record if it still holds `nonce`.
    ///
    /// Returns true if a record was removed. Deleting an absent or superseded
    /// record is a no-op.
    async fn consume(&self, address: &Address, nonce: &str) -> Result<bool, StoreError>;
}

/// Open the nonce store named by `url`.
///
/// A `memory://` URL yields an in-memory store with a background sweep
/// running every `sweep_interval`; anything else is handed to Redis and
/// must be reachable now.
pub async fn open(url: &str, sweep_interval: Duration) -> Result<Arc<dyn NonceStore>, StoreError> {
    if url.starts_with(MEMORY_URL_SCHEME) {
        let store = Arc::new(MemoryNonceStore::new());
        tokio::spawn(cleanup::run_sweep_loop(
            Arc::downgrade(&store),
            sweep_interval,
        ));
        tracing::warn!("Using in-memory nonce store; challenges will not survive a restart");
        return Ok(store);
    }

    let store = RedisNonceStore::connect(url).await?;
    tracing::info!("Connected to Redis nonce store");
    Ok(Arc::new(store))
}

/// Constant-time nonce comparison.
pub fn nonces_match(stored: &str, presented: &str) -> bool {
    stored.as_bytes().ct_eq(presented.as_bytes()).into()
}

/// Build the record written by `put`.
pub(crate) fn new_record(
    address: &Address,
    nonce: &str,
    ttl: Duration,
    now: DateTime<Utc>,
) -> Result<NonceRecord, StoreError> {
    if ttl.is_zero() {
        return Err(StoreError::InvalidTtl);
    }
    let ttl = TimeDelta::from_std(ttl).map_err(|_| StoreError::InvalidTtl)?;
    let expires_at = now.checked_add_signed(ttl).ok_or(StoreError::InvalidTtl)?;

    Ok(NonceRecord {
        address: address.as_str().to_string(),
        nonce: nonce.to_string(),
        expires_at,
        created_at: now,
    })
}

/// Keep `record` only if it belongs to `address`, holds `nonce`, and is live.
pub(crate) fn valid_record(
    record: NonceRecord,
    address: &Address,
    nonce: &str,
    now: DateTime<Utc>,
) -> Option<NonceRecord> {
    let matches = record.address == address.as_str() && nonces_match(&record.nonce, nonce);
    (matches && record.is_live(now)).then_some(record)
}
