//! Redis-backed nonce store.
//!
//! Redis key pattern:
//! - `nonce:{address}` — outstanding challenge (JSON `NonceRecord`), expires with the challenge
//!
//! `put` is a single `SET .. PX`, so a new challenge atomically replaces the
//! previous one. `consume` runs a Lua script that deletes the key only while
//! it still holds the presented nonce, so a verify racing a newer challenge
//! cannot delete its successor.

use super::{NonceStore, StoreError, new_record, valid_record};
use crate::models::{Address, NonceRecord};
use async_trait::async_trait;
use chrono::Utc;
use redis::AsyncCommands;
use redis::aio::MultiplexedConnection;
use std::time::Duration;
use zeroize::Zeroizing;

const CONSUME_SCRIPT: &str = r"
local val = redis.call('GET', KEYS[1])
if not val then
    return 0
end
local record = cjson.decode(val)
if record.nonce ~= ARGV[1] then
    return 0
end
return redis.call('DEL', KEYS[1])
";

fn nonce_key(address: &Address) -> String {
    format!("nonce:{}", address)
}

/// Nonce store over one multiplexed Redis connection shared by all requests.
#[derive(Clone)]
pub struct RedisNonceStore {
    con: MultiplexedConnection,
}

impl RedisNonceStore {
    /// Open the client and establish the shared connection.
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let client = redis::Client::open(url)?;
        let con = client.get_multiplexed_async_connection().await?;
        Ok(Self { con })
    }
}

#[async_trait]
impl NonceStore for RedisNonceStore {
    async fn put(
        &self,
        address: &Address,
        nonce: &str,
        ttl: Duration,
    ) -> Result<NonceRecord, StoreError> {
        let record = new_record(address, nonce, ttl, Utc::now())?;
        let json = serde_json::to_string(&record)?;
        let ttl_ms = u64::try_from(ttl.as_millis()).map_err(|_| StoreError::InvalidTtl)?;

        let mut con = self.con.clone();
        con.pset_ex::<_, _, ()>(nonce_key(address), json, ttl_ms)
            .await?;
        Ok(record)
    }

    async fn get_valid(
        &self,
        address: &Address,
        nonce: &str,
    ) -> Result<Option<NonceRecord>, StoreError> {
        let mut con = self.con.clone();
        let json: Option<String> = con.get(nonce_key(address)).await?;

        match json {
            Some(data) => {
                // The stored JSON holds a live nonce; clear our copy once parsed
                let data = Zeroizing::new(data);
                let record: NonceRecord = serde_json::from_str(&data)?;
                Ok(valid_record(record, address, nonce, Utc::now()))
            }
            None => Ok(None),
        }
    }

    async fn consume(&self, address: &Address, nonce: &str) -> Result<bool, StoreError> {
        let mut con = self.con.clone();
        let removed: i64 = redis::Script::new(CONSUME_SCRIPT)
            .key(nonce_key(address))
            .arg(nonce)
            .invoke_async(&mut con)
            .await?;
        Ok(removed > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Tests marked #[ignore] need a running Redis instance:
    //   REDIS_URL=redis://127.0.0.1:6379 cargo test -- --ignored
    async fn test_store() -> RedisNonceStore {
        let redis_url =
            std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string());
        RedisNonceStore::connect(&redis_url)
            .await
            .expect("Redis not available at REDIS_URL")
    }

    #[test]
    fn test_consume_script_reads_serialized_nonce_field() {
        let record = new_record(
            &random_address(),
            "nonce-a",
            Duration::from_secs(60),
            Utc::now(),
        )
        .unwrap();
        let json = serde_json::to_value(&record).unwrap();

        assert_eq!(json["nonce"], "nonce-a");
        assert!(CONSUME_SCRIPT.contains("record.nonce ~= ARGV[1]"));
    }

    #[test]
    fn test_nonce_key() {
        let address: Address = "0x90F79bf6EB2c4f870365E785982E1f101E93b906".parse().unwrap();
        assert_eq!(
            nonce_key(&address),
            "nonce:0x90f79bf6eb2c4f870365e785982e1f101e93b906"
        );
    }

    fn random_address() -> Address {
        let bytes: [u8; 20] = rand::random();
        format!("0x{}", hex::encode(bytes)).parse().unwrap()
    }

    #[tokio::test]
    #[ignore]
    async fn test_put_get_consume() {
        let store = test_store().await;
        let address = random_address();

        store
            .put(&address, "nonce-a", Duration::from_secs(60))
            .await
            .unwrap();

        let record = store.get_valid(&address, "nonce-a").await.unwrap();
        assert_eq!(record.unwrap().nonce, "nonce-a");
        assert!(store.get_valid(&address, "nonce-b").await.unwrap().is_none());

        assert!(store.consume(&address, "nonce-a").await.unwrap());
        assert!(store.get_valid(&address, "nonce-a").await.unwrap().is_none());

        // Idempotent
        assert!(!store.consume(&address, "nonce-a").await.unwrap());
    }

    #[tokio::test]
    #[ignore]
    async fn test_put_replaces_previous_nonce() {
        let store = test_store().await;
        let address = random_address();

        store
            .put(&address, "first", Duration::from_secs(60))
            .await
            .unwrap();
        store
            .put(&address, "second", Duration::from_secs(60))
            .await
            .unwrap();

        assert!(store.get_valid(&address, "first").await.unwrap().is_none());

        // Consuming the superseded nonce must not delete the live one
        assert!(!store.consume(&address, "first").await.unwrap());
        assert!(store.get_valid(&address, "second").await.unwrap().is_some());

        assert!(store.consume(&address, "second").await.unwrap());
    }

    #[tokio::test]
    #[ignore]
    async fn test_expired_nonce_is_absent() {
        let store = test_store().await;
        let address = random_address();

        store
            .put(&address, "short", Duration::from_millis(50))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(120)).await;

        assert!(store.get_valid(&address, "short").await.unwrap().is_none());
    }
}
