//! Process-local backend for the feed page cache.
//!
//! Deadline-stamped map with the same TTL semantics as the Redis backend.
//! Used by local development without Redis and by the test suite.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::cache::{CacheResult, FeedPageCache};
use crate::models::PostView;

struct Entry {
    expires_at: Instant,
    posts: Vec<PostView>,
}

/// Feed page cache backed by a process-local map
#[derive(Default, Clone)]
pub struct MemoryFeedCache {
    inner: Arc<RwLock<HashMap<u32, Entry>>>,
}

impl MemoryFeedCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live (non-expired) entries. Test/diagnostic helper.
    pub async fn len(&self) -> usize {
        let now = Instant::now();
        self.inner
            .read()
            .await
            .values()
            .filter(|e| e.expires_at > now)
            .count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl FeedPageCache for MemoryFeedCache {
    async fn get(&self, page: u32) -> CacheResult<Option<Vec<PostView>>> {
        let mut guard = self.inner.write().await;

        match guard.get(&page) {
            Some(entry) if entry.expires_at > Instant::now() => Ok(Some(entry.posts.clone())),
            Some(_) => {
                guard.remove(&page);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn put(&self, page: u32, posts: &[PostView], ttl: Duration) -> CacheResult<()> {
        self.inner.write().await.insert(
            page,
            Entry {
                expires_at: Instant::now() + ttl,
                posts: posts.to_vec(),
            },
        );
        Ok(())
    }

    async fn invalidate(&self, page: u32) -> CacheResult<()> {
        self.inner.write().await.remove(&page);
        Ok(())
    }

    async fn invalidate_all(&self) -> CacheResult<()> {
        self.inner.write().await.clear();
        Ok(())
    }
}
