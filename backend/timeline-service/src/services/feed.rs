//! Feed service: the single entry point for paginated feed reads and for
//! reconciling the cache with the store on write paths.
//!
//! Population is lazy (write-through-on-read): a miss computes the page from
//! the store and caches it for the TTL. The cache is an optimization, never
//! a dependency for correctness — any cache failure degrades to a direct
//! store read.

use std::sync::Arc;
use std::time::Duration;

use tracing::warn;
use uuid::Uuid;

use crate::cache::FeedPageCache;
use crate::error::Result;
use crate::metrics::{FEED_CACHE_EVENTS, FEED_CACHE_INVALIDATIONS_TOTAL, FEED_CACHE_WRITE_TOTAL};
use crate::models::PostView;
use crate::store::RelationshipStore;

/// Posts per feed page
pub const FEED_PAGE_SIZE: u32 = 20;

/// Feed page cache TTL
pub const FEED_TTL: Duration = Duration::from_secs(60);

pub struct FeedService {
    store: Arc<dyn RelationshipStore>,
    cache: Arc<dyn FeedPageCache>,
    page_size: u32,
    ttl: Duration,
}

impl FeedService {
    pub fn new(store: Arc<dyn RelationshipStore>, cache: Arc<dyn FeedPageCache>) -> Self {
        Self::with_settings(store, cache, FEED_PAGE_SIZE, FEED_TTL)
    }

    pub fn with_settings(
        store: Arc<dyn RelationshipStore>,
        cache: Arc<dyn FeedPageCache>,
        page_size: u32,
        ttl: Duration,
    ) -> Self {
        Self {
            store,
            cache,
            page_size,
            ttl,
        }
    }

    /// Read feed page `page` (1-based; values below 1 clamp to 1).
    ///
    /// Cache hit returns immediately with no store access. Miss fetches one
    /// page from the store, repopulates the cache, and returns it.
    pub async fn read_page(&self, page: u32) -> Result<Vec<PostView>> {
        let page = page.max(1);

        match self.cache.get(page).await {
            Ok(Some(posts)) => {
                FEED_CACHE_EVENTS.with_label_values(&["hit"]).inc();
                return Ok(posts);
            }
            Ok(None) => {
                FEED_CACHE_EVENTS.with_label_values(&["miss"]).inc();
            }
            Err(err) => {
                FEED_CACHE_EVENTS.with_label_values(&["error"]).inc();
                warn!("feed cache read failed, falling back to store: {}", err);
            }
        }

        let skip = (page - 1) * self.page_size;
        let posts = self.store.list_posts_page(skip, self.page_size).await?;

        match self.cache.put(page, &posts, self.ttl).await {
            Ok(()) => {
                FEED_CACHE_WRITE_TOTAL.with_label_values(&["success"]).inc();
            }
            Err(err) => {
                FEED_CACHE_WRITE_TOTAL.with_label_values(&["error"]).inc();
                warn!("feed cache write failed for page {}: {}", page, err);
            }
        }

        Ok(posts)
    }

    /// A post was created: synchronously invalidate page 1, the page most
    /// visibly affected by chronological insertion. TTL expiry covers deeper
    /// pages.
    pub async fn on_post_created(&self, post: &PostView) {
        FEED_CACHE_INVALIDATIONS_TOTAL
            .with_label_values(&["create"])
            .inc();
        if let Err(err) = self.cache.invalidate(1).await {
            warn!(
                post_id = %post.id,
                "feed cache invalidation failed after post creation: {}",
                err
            );
        }
    }

    /// A post was deleted: invalidate every cached page, since the removed
    /// post may sit on any of them.
    pub async fn on_post_deleted(&self, post_id: Uuid) {
        FEED_CACHE_INVALIDATIONS_TOTAL
            .with_label_values(&["delete"])
            .inc();
        if let Err(err) = self.cache.invalidate_all().await {
            warn!(
                %post_id,
                "feed cache invalidation failed after post deletion: {}",
                err
            );
        }
    }

    /// A post's content changed: same blast radius as deletion.
    pub async fn on_post_updated(&self, post_id: Uuid) {
        FEED_CACHE_INVALIDATIONS_TOTAL
            .with_label_values(&["update"])
            .inc();
        if let Err(err) = self.cache.invalidate_all().await {
            warn!(
                %post_id,
                "feed cache invalidation failed after post update: {}",
                err
            );
        }
    }
}
