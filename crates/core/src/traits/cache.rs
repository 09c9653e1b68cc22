//! Key/value cache substrate

use async_trait::async_trait;
use std::time::Duration;

use crate::error::CacheError;

/// Byte-valued cache with per-entry TTL.
///
/// May be in-process or external. Callers treat every error as a miss.
#[async_trait]
pub trait KvCache: Send + Sync + 'static {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError>;

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), CacheError>;

    /// Remove every key starting with `prefix`, returning how many went
    async fn delete_prefix(&self, prefix: &str) -> Result<usize, CacheError>;
}
