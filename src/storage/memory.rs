//! In-memory nonce store.
//!
//! Used by tests and by local development (`STORAGE_URL=memory://`).
//! Expired records are dropped lazily on read and periodically by
//! [`crate::cleanup::run_sweep_loop`].

use super::{NonceStore, StoreError, new_record, nonces_match, valid_record};
use crate::models::{Address, NonceRecord};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
pub struct MemoryNonceStore {
    records: RwLock<HashMap<String, NonceRecord>>,
}

impl MemoryNonceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove every record that has expired at `now`. Returns how many were removed.
    pub async fn purge_expired(&self, now: DateTime<Utc>) -> usize {
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|_, record| record.is_live(now));
        before - records.len()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl NonceStore for MemoryNonceStore {
    async fn put(
        &self,
        address: &Address,
        nonce: &str,
        ttl: Duration,
    ) -> Result<NonceRecord, StoreError> {
        let record = new_record(address, nonce, ttl, Utc::now())?;
        self.records
            .write()
            .await
            .insert(address.as_str().to_string(), record.clone());
        Ok(record)
    }

    async fn get_valid(
        &self,
        address: &Address,
        nonce: &str,
    ) -> Result<Option<NonceRecord>, StoreError> {
        let record = self.records.read().await.get(address.as_str()).cloned();
        Ok(record.and_then(|r| valid_record(r, address, nonce, Utc::now())))
    }

    async fn consume(&self, address: &Address, nonce: &str) -> Result<bool, StoreError> {
        let mut records = self.records.write().await;
        let matches = records
            .get(address.as_str())
            .is_some_and(|record| nonces_match(&record.nonce, nonce));
        if matches {
            records.remove(address.as_str());
        }
        Ok(matches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;
    use std::sync::Arc;

    fn addr() -> Address {
        "0x90F79bf6EB2c4f870365E785982E1f101E93b906".parse().unwrap()
    }

    #[tokio::test]
    async fn test_put_and_get_valid() {
        let store = MemoryNonceStore::new();
        store
            .put(&addr(), "nonce-1", Duration::from_secs(60))
            .await
            .unwrap();

        let record = store.get_valid(&addr(), "nonce-1").await.unwrap().unwrap();
        assert_eq!(record.nonce, "nonce-1");
        assert_eq!(record.address, addr().as_str());

        assert!(store.get_valid(&addr(), "nonce-2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_put_is_upsert() {
        let store = MemoryNonceStore::new();
        store
            .put(&addr(), "first", Duration::from_secs(60))
            .await
            .unwrap();
        store
            .put(&addr(), "second", Duration::from_secs(60))
            .await
            .unwrap();

        assert_eq!(store.len().await, 1);
        assert!(store.get_valid(&addr(), "first").await.unwrap().is_none());
        assert!(store.get_valid(&addr(), "second").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_consume_is_single_use_and_idempotent() {
        let store = MemoryNonceStore::new();
        store
            .put(&addr(), "nonce-1", Duration::from_secs(60))
            .await
            .unwrap();

        assert!(store.consume(&addr(), "nonce-1").await.unwrap());
        assert!(store.get_valid(&addr(), "nonce-1").await.unwrap().is_none());
        assert!(!store.consume(&addr(), "nonce-1").await.unwrap());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_consume_superseded_nonce_keeps_successor() {
        let store = MemoryNonceStore::new();
        store
            .put(&addr(), "old", Duration::from_secs(60))
            .await
            .unwrap();
        store
            .put(&addr(), "new", Duration::from_secs(60))
            .await
            .unwrap();

        assert!(!store.consume(&addr(), "old").await.unwrap());
        assert!(store.get_valid(&addr(), "new").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_expired_record_is_absent() {
        let store = MemoryNonceStore::new();
        store
            .put(&addr(), "short", Duration::from_millis(20))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(60)).await;

        assert!(store.get_valid(&addr(), "short").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_purge_expired() {
        let store = MemoryNonceStore::new();
        let other: Address = "0x15d34AAf54267DB7D7c367839AAf71A00a2C6A65".parse().unwrap();
        store
            .put(&addr(), "a", Duration::from_secs(10))
            .await
            .unwrap();
        store
            .put(&other, "b", Duration::from_secs(600))
            .await
            .unwrap();

        let removed = store.purge_expired(Utc::now() + TimeDelta::seconds(60)).await;
        assert_eq!(removed, 1);
        assert_eq!(store.len().await, 1);
        assert!(store.get_valid(&other, "b").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_concurrent_consume_has_one_winner() {
        let store = Arc::new(MemoryNonceStore::new());
        store
            .put(&addr(), "race", Duration::from_secs(60))
            .await
            .unwrap();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move { store.consume(&addr(), "race").await.unwrap() })
            })
            .collect();

        let mut winners = 0;
        for handle in handles {
            if handle.await.unwrap() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
    }
}
