//! Feed service properties: cache-hit behavior, pagination, ordering, and
//! graceful degradation when the cache is unavailable.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, TimeZone, Utc};
use uuid::Uuid;

use timeline_service::cache::{CacheError, CacheResult, FeedPageCache, MemoryFeedCache};
use timeline_service::models::{Post, PostView, User};
use timeline_service::services::FeedService;
use timeline_service::store::{
    MemoryRelationshipStore, PostEdge, RelationshipStore, StoreResult, UserEdge,
};

/// Store wrapper that counts page listings, to verify cache hits perform no
/// store access.
#[derive(Clone)]
struct CountingStore {
    inner: MemoryRelationshipStore,
    list_calls: Arc<AtomicUsize>,
}

impl CountingStore {
    fn new(inner: MemoryRelationshipStore) -> Self {
        Self {
            inner,
            list_calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RelationshipStore for CountingStore {
    async fn get_user(&self, id: Uuid) -> StoreResult<User> {
        self.inner.get_user(id).await
    }

    async fn save_user(&self, user: &User) -> StoreResult<()> {
        self.inner.save_user(user).await
    }

    async fn create_post(&self, post: &Post) -> StoreResult<()> {
        self.inner.create_post(post).await
    }

    async fn get_post(&self, id: Uuid) -> StoreResult<Post> {
        self.inner.get_post(id).await
    }

    async fn update_post_content(&self, id: Uuid, author: Uuid, content: &str)
        -> StoreResult<Post> {
        self.inner.update_post_content(id, author, content).await
    }

    async fn delete_post(&self, id: Uuid, expected_author: Uuid) -> StoreResult<()> {
        self.inner.delete_post(id, expected_author).await
    }

    async fn list_posts_page(&self, skip: u32, limit: u32) -> StoreResult<Vec<PostView>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.list_posts_page(skip, limit).await
    }

    async fn flip_post_edge(
        &self,
        post_id: Uuid,
        member: Uuid,
        edge: PostEdge,
    ) -> StoreResult<(Post, bool)> {
        self.inner.flip_post_edge(post_id, member, edge).await
    }

    async fn flip_user_edge(
        &self,
        user_id: Uuid,
        edge: UserEdge,
        member: Uuid,
    ) -> StoreResult<bool> {
        self.inner.flip_user_edge(user_id, edge, member).await
    }

    async fn set_user_edge(
        &self,
        user_id: Uuid,
        edge: UserEdge,
        member: Uuid,
        present: bool,
    ) -> StoreResult<()> {
        self.inner.set_user_edge(user_id, edge, member, present).await
    }
}

/// Cache that fails every operation, standing in for an unreachable Redis.
struct BrokenCache;

#[async_trait]
impl FeedPageCache for BrokenCache {
    async fn get(&self, _page: u32) -> CacheResult<Option<Vec<PostView>>> {
        Err(CacheError::Unavailable("connection refused".into()))
    }

    async fn put(&self, _page: u32, _posts: &[PostView], _ttl: Duration) -> CacheResult<()> {
        Err(CacheError::Unavailable("connection refused".into()))
    }

    async fn invalidate(&self, _page: u32) -> CacheResult<()> {
        Err(CacheError::Unavailable("connection refused".into()))
    }

    async fn invalidate_all(&self) -> CacheResult<()> {
        Err(CacheError::Unavailable("connection refused".into()))
    }
}

fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
}

fn post_at(author: Uuid, content: &str, at: DateTime<Utc>) -> Post {
    let mut post = Post::new(author, content);
    post.created_at = at;
    post
}

/// Seed one author and `count` posts with strictly increasing timestamps.
async fn seed_posts(store: &MemoryRelationshipStore, count: usize) -> Uuid {
    let author = Uuid::new_v4();
    store
        .save_user(&User::new(author, "seeder"))
        .await
        .unwrap();

    for i in 0..count {
        let at = base_time() + ChronoDuration::seconds(i as i64);
        store
            .create_post(&post_at(author, &format!("post {}", i), at))
            .await
            .unwrap();
    }

    author
}

#[tokio::test]
async fn cache_hit_performs_no_store_access() {
    let inner = MemoryRelationshipStore::new();
    seed_posts(&inner, 3).await;

    let store = CountingStore::new(inner);
    let feed = FeedService::new(Arc::new(store.clone()), Arc::new(MemoryFeedCache::new()));

    let first = feed.read_page(1).await.unwrap();
    let second = feed.read_page(1).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(store.list_calls(), 1);
}

#[tokio::test]
async fn page_two_of_twenty_five_returns_exactly_five() {
    let inner = MemoryRelationshipStore::new();
    seed_posts(&inner, 25).await;

    let store = CountingStore::new(inner);
    let feed = FeedService::new(Arc::new(store), Arc::new(MemoryFeedCache::new()));

    let page_one = feed.read_page(1).await.unwrap();
    let page_two = feed.read_page(2).await.unwrap();

    assert_eq!(page_one.len(), 20);
    assert_eq!(page_two.len(), 5);

    // Newest first: post 24 leads page one, post 4 leads page two.
    assert_eq!(page_one[0].content, "post 24");
    assert_eq!(page_two[0].content, "post 4");
    assert_eq!(page_two[4].content, "post 0");

    for pair in page_two.windows(2) {
        assert!(pair[0].created_at >= pair[1].created_at);
    }
}

#[tokio::test]
async fn equal_timestamps_break_ties_by_id_descending() {
    let store = MemoryRelationshipStore::new();
    let author = Uuid::new_v4();
    store.save_user(&User::new(author, "tied")).await.unwrap();

    let at = base_time();
    store.create_post(&post_at(author, "a", at)).await.unwrap();
    store.create_post(&post_at(author, "b", at)).await.unwrap();
    store.create_post(&post_at(author, "c", at)).await.unwrap();

    let feed = FeedService::new(Arc::new(store), Arc::new(MemoryFeedCache::new()));
    let page = feed.read_page(1).await.unwrap();

    assert_eq!(page.len(), 3);
    assert!(page[0].id > page[1].id);
    assert!(page[1].id > page[2].id);
}

#[tokio::test]
async fn page_below_one_clamps_to_one() {
    let inner = MemoryRelationshipStore::new();
    seed_posts(&inner, 2).await;

    let feed = FeedService::new(Arc::new(inner), Arc::new(MemoryFeedCache::new()));
    let page = feed.read_page(0).await.unwrap();

    assert_eq!(page.len(), 2);
}

#[tokio::test]
async fn post_creation_invalidates_page_one() {
    let inner = MemoryRelationshipStore::new();
    let author = seed_posts(&inner, 2).await;

    let store = CountingStore::new(inner.clone());
    let feed = FeedService::new(Arc::new(store.clone()), Arc::new(MemoryFeedCache::new()));

    assert_eq!(feed.read_page(1).await.unwrap().len(), 2);

    let fresh = post_at(author, "fresh", base_time() + ChronoDuration::seconds(100));
    inner.create_post(&fresh).await.unwrap();
    feed.on_post_created(&PostView::from_post(fresh, "seeder"))
        .await;

    let page = feed.read_page(1).await.unwrap();
    assert_eq!(page.len(), 3);
    assert_eq!(page[0].content, "fresh");
    assert_eq!(store.list_calls(), 2);
}

#[tokio::test]
async fn post_deletion_invalidates_every_cached_page() {
    let inner = MemoryRelationshipStore::new();
    seed_posts(&inner, 25).await;

    let cache = MemoryFeedCache::new();
    let feed = FeedService::new(Arc::new(inner), Arc::new(cache.clone()));

    feed.read_page(1).await.unwrap();
    feed.read_page(2).await.unwrap();
    assert_eq!(cache.len().await, 2);

    feed.on_post_deleted(Uuid::new_v4()).await;
    assert!(cache.is_empty().await);
}

#[tokio::test]
async fn cached_pages_expire_after_ttl() {
    let inner = MemoryRelationshipStore::new();
    seed_posts(&inner, 1).await;

    let store = CountingStore::new(inner);
    let feed = FeedService::with_settings(
        Arc::new(store.clone()),
        Arc::new(MemoryFeedCache::new()),
        20,
        Duration::from_millis(30),
    );

    feed.read_page(1).await.unwrap();
    assert_eq!(store.list_calls(), 1);

    tokio::time::sleep(Duration::from_millis(60)).await;

    feed.read_page(1).await.unwrap();
    assert_eq!(store.list_calls(), 2);
}

#[tokio::test]
async fn broken_cache_degrades_to_direct_store_reads() {
    let inner = MemoryRelationshipStore::new();
    seed_posts(&inner, 3).await;

    let store = CountingStore::new(inner);
    let feed = FeedService::new(Arc::new(store.clone()), Arc::new(BrokenCache));

    let first = feed.read_page(1).await.unwrap();
    let second = feed.read_page(1).await.unwrap();

    assert_eq!(first.len(), 3);
    assert_eq!(first, second);
    // Every read goes to the store when the cache is down.
    assert_eq!(store.list_calls(), 2);
}
