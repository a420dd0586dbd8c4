//! Feed page caching.
//!
//! A short-TTL, key-per-page cache sitting in front of the store's post
//! listing. Keys follow the pattern `feed:<page-number>`; values are the
//! JSON-serialized array of post snapshots for that page. The cache never
//! computes pages itself and is never required for correctness: every error
//! here is absorbed by the feed service, which falls back to direct store
//! reads.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::PostView;

pub mod memory;
pub mod redis;

pub use memory::MemoryFeedCache;
pub use redis::RedisFeedCache;

/// Cache error types. Non-fatal by policy.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache unavailable: {0}")]
    Unavailable(String),

    #[error("cache codec error: {0}")]
    Codec(String),
}

pub type CacheResult<T> = std::result::Result<T, CacheError>;

/// Cache key for a feed page
pub fn feed_key(page: u32) -> String {
    format!("feed:{}", page)
}

/// Contract for the feed page cache.
///
/// Per-key reads and writes are linearizable (last writer within the TTL
/// window wins; readers never observe a torn page). Eviction is purely
/// TTL-based.
#[async_trait]
pub trait FeedPageCache: Send + Sync {
    async fn get(&self, page: u32) -> CacheResult<Option<Vec<PostView>>>;

    async fn put(&self, page: u32, posts: &[PostView], ttl: Duration) -> CacheResult<()>;

    async fn invalidate(&self, page: u32) -> CacheResult<()>;

    async fn invalidate_all(&self) -> CacheResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feed_key_format() {
        assert_eq!(feed_key(1), "feed:1");
        assert_eq!(feed_key(42), "feed:42");
    }
}
