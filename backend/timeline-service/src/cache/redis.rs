//! Redis backend for the feed page cache.

use std::time::Duration;

use async_trait::async_trait;
use redis::{aio::ConnectionManager, AsyncCommands};
use tracing::debug;

use crate::cache::{feed_key, CacheError, CacheResult, FeedPageCache};
use crate::models::PostView;

/// Feed page cache backed by Redis
#[derive(Clone)]
pub struct RedisFeedCache {
    redis: ConnectionManager,
}

impl RedisFeedCache {
    pub fn new(redis: ConnectionManager) -> Self {
        Self { redis }
    }
}

#[async_trait]
impl FeedPageCache for RedisFeedCache {
    async fn get(&self, page: u32) -> CacheResult<Option<Vec<PostView>>> {
        let key = feed_key(page);
        let mut conn = self.redis.clone();

        let value: Option<String> = conn
            .get(&key)
            .await
            .map_err(|e| CacheError::Unavailable(e.to_string()))?;

        match value {
            Some(data) => {
                debug!("feed cache HIT for page {}", page);
                serde_json::from_str::<Vec<PostView>>(&data)
                    .map(Some)
                    .map_err(|e| CacheError::Codec(e.to_string()))
            }
            None => {
                debug!("feed cache MISS for page {}", page);
                Ok(None)
            }
        }
    }

    async fn put(&self, page: u32, posts: &[PostView], ttl: Duration) -> CacheResult<()> {
        let key = feed_key(page);
        let data = serde_json::to_string(posts).map_err(|e| CacheError::Codec(e.to_string()))?;

        let mut conn = self.redis.clone();
        conn.set_ex::<_, _, ()>(&key, data, ttl.as_secs())
            .await
            .map_err(|e| CacheError::Unavailable(e.to_string()))?;

        debug!(
            "feed cache WRITE for page {} ({} posts) with TTL {:?}",
            page,
            posts.len(),
            ttl
        );

        Ok(())
    }

    async fn invalidate(&self, page: u32) -> CacheResult<()> {
        let key = feed_key(page);
        let mut conn = self.redis.clone();
        conn.del::<_, ()>(&key)
            .await
            .map_err(|e| CacheError::Unavailable(e.to_string()))?;

        debug!("feed cache INVALIDATE for page {}", page);

        Ok(())
    }

    async fn invalidate_all(&self) -> CacheResult<()> {
        // SCAN is non-blocking unlike KEYS
        let mut conn = self.redis.clone();
        let mut cursor: u64 = 0;
        let mut total_deleted = 0usize;

        loop {
            let (next_cursor, keys): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg("feed:*")
                .arg("COUNT")
                .arg(100)
                .query_async(&mut conn)
                .await
                .map_err(|e| CacheError::Unavailable(e.to_string()))?;

            if !keys.is_empty() {
                redis::cmd("DEL")
                    .arg(&keys)
                    .query_async::<_, ()>(&mut conn)
                    .await
                    .map_err(|e| CacheError::Unavailable(e.to_string()))?;
                total_deleted += keys.len();
            }

            cursor = next_cursor;
            if cursor == 0 {
                break;
            }
        }

        if total_deleted > 0 {
            debug!("feed cache INVALIDATE ALL removed {} pages", total_deleted);
        }

        Ok(())
    }
}
