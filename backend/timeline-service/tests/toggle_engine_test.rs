//! Toggle engine properties: idempotent double-toggle, follow symmetry, and
//! partial-failure compensation for the two-record follow write.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use timeline_service::error::AppError;
use timeline_service::models::{Post, PostView, User};
use timeline_service::services::ToggleEngine;
use timeline_service::store::{
    MemoryRelationshipStore, PostEdge, RelationshipStore, StoreError, StoreResult, UserEdge,
};

async fn seed_user(store: &MemoryRelationshipStore, username: &str) -> Uuid {
    let user = User::new(Uuid::new_v4(), username);
    store.save_user(&user).await.unwrap();
    user.id
}

async fn seed_post(store: &MemoryRelationshipStore, author: Uuid) -> Uuid {
    let post = Post::new(author, "something short");
    store.create_post(&post).await.unwrap();
    post.id
}

#[tokio::test]
async fn double_like_returns_to_original_state() {
    let store = MemoryRelationshipStore::new();
    let author = seed_user(&store, "author").await;
    let caller = seed_user(&store, "caller").await;
    let post_id = seed_post(&store, author).await;

    let engine = ToggleEngine::new(Arc::new(store.clone()));

    let first = engine.toggle_like(post_id, caller).await.unwrap();
    assert!(first.present);
    assert_eq!(first.post.likes, vec![caller]);

    let second = engine.toggle_like(post_id, caller).await.unwrap();
    assert!(!second.present);
    assert!(second.post.likes.is_empty());
}

#[tokio::test]
async fn retweet_toggles_independently_of_likes() {
    let store = MemoryRelationshipStore::new();
    let author = seed_user(&store, "author").await;
    let caller = seed_user(&store, "caller").await;
    let post_id = seed_post(&store, author).await;

    let engine = ToggleEngine::new(Arc::new(store.clone()));

    engine.toggle_like(post_id, caller).await.unwrap();
    let outcome = engine.toggle_retweet(post_id, caller).await.unwrap();

    assert!(outcome.present);
    assert_eq!(outcome.post.likes, vec![caller]);
    assert_eq!(outcome.post.retweets, vec![caller]);
}

#[tokio::test]
async fn toggles_by_different_callers_do_not_conflict() {
    let store = MemoryRelationshipStore::new();
    let author = seed_user(&store, "author").await;
    let alice = seed_user(&store, "alice").await;
    let bob = seed_user(&store, "bob").await;
    let post_id = seed_post(&store, author).await;

    let engine = ToggleEngine::new(Arc::new(store.clone()));

    engine.toggle_like(post_id, alice).await.unwrap();
    engine.toggle_like(post_id, bob).await.unwrap();
    let outcome = engine.toggle_like(post_id, alice).await.unwrap();

    // Alice's second toggle removes only her own membership.
    assert!(!outcome.present);
    assert_eq!(outcome.post.likes, vec![bob]);
}

#[tokio::test]
async fn missing_post_surfaces_not_found() {
    let store = MemoryRelationshipStore::new();
    let caller = seed_user(&store, "caller").await;

    let engine = ToggleEngine::new(Arc::new(store));
    let err = engine.toggle_like(Uuid::new_v4(), caller).await.unwrap_err();

    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn follow_keeps_edge_sets_symmetric() {
    let store = MemoryRelationshipStore::new();
    let alice = seed_user(&store, "alice").await;
    let bob = seed_user(&store, "bob").await;

    let engine = ToggleEngine::new(Arc::new(store.clone()));

    let outcome = engine.toggle_follow(bob, alice).await.unwrap();
    assert!(outcome.following);

    let alice_record = store.get_user(alice).await.unwrap();
    let bob_record = store.get_user(bob).await.unwrap();
    assert!(alice_record.following.contains(&bob));
    assert!(bob_record.followers.contains(&alice));

    // Symmetry holds in the other direction after the un-follow toggle.
    let outcome = engine.toggle_follow(bob, alice).await.unwrap();
    assert!(!outcome.following);

    let alice_record = store.get_user(alice).await.unwrap();
    let bob_record = store.get_user(bob).await.unwrap();
    assert!(!alice_record.following.contains(&bob));
    assert!(!bob_record.followers.contains(&alice));
}

#[tokio::test]
async fn follow_missing_target_is_not_found() {
    let store = MemoryRelationshipStore::new();
    let alice = seed_user(&store, "alice").await;

    let engine = ToggleEngine::new(Arc::new(store.clone()));
    let err = engine
        .toggle_follow(Uuid::new_v4(), alice)
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::NotFound(_)));

    let alice_record = store.get_user(alice).await.unwrap();
    assert!(alice_record.following.is_empty());
}

#[tokio::test]
async fn self_follow_is_rejected() {
    let store = MemoryRelationshipStore::new();
    let alice = seed_user(&store, "alice").await;

    let engine = ToggleEngine::new(Arc::new(store));
    let err = engine.toggle_follow(alice, alice).await.unwrap_err();

    assert!(matches!(err, AppError::Validation(_)));
}

/// Store wrapper that fails `set_user_edge` for one configured record,
/// simulating the second half of the follow write dying mid-flight.
#[derive(Clone)]
struct FlakyStore {
    inner: MemoryRelationshipStore,
    failing_user: Uuid,
    armed: Arc<AtomicBool>,
}

impl FlakyStore {
    fn new(inner: MemoryRelationshipStore, failing_user: Uuid) -> Self {
        Self {
            inner,
            failing_user,
            armed: Arc::new(AtomicBool::new(true)),
        }
    }
}

#[async_trait]
impl RelationshipStore for FlakyStore {
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
        if user_id == self.failing_user && self.armed.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("simulated write failure".into()));
        }
        self.inner.set_user_edge(user_id, edge, member, present).await
    }
}

#[tokio::test]
async fn failed_second_write_is_compensated() {
    let inner = MemoryRelationshipStore::new();
    let alice = seed_user(&inner, "alice").await;
    let bob = seed_user(&inner, "bob").await;

    // The write to bob's follower set fails; alice's following set must be
    // rolled back so no one-sided edge survives.
    let store = FlakyStore::new(inner.clone(), bob);
    let engine = ToggleEngine::new(Arc::new(store));

    let err = engine.toggle_follow(bob, alice).await.unwrap_err();
    assert!(matches!(err, AppError::StoreUnavailable(_)));

    let alice_record = inner.get_user(alice).await.unwrap();
    let bob_record = inner.get_user(bob).await.unwrap();
    assert!(!alice_record.following.contains(&bob));
    assert!(!bob_record.followers.contains(&alice));
}

#[tokio::test]
async fn recovered_store_allows_the_follow_to_succeed() {
    let inner = MemoryRelationshipStore::new();
    let alice = seed_user(&inner, "alice").await;
    let bob = seed_user(&inner, "bob").await;

    let store = FlakyStore::new(inner.clone(), bob);
    let engine = ToggleEngine::new(Arc::new(store.clone()));

    engine.toggle_follow(bob, alice).await.unwrap_err();

    // Store comes back; the retried toggle lands cleanly on both records.
    store.armed.store(false, Ordering::SeqCst);
    let outcome = engine.toggle_follow(bob, alice).await.unwrap();
    assert!(outcome.following);

    let alice_record = inner.get_user(alice).await.unwrap();
    let bob_record = inner.get_user(bob).await.unwrap();
    assert!(alice_record.following.contains(&bob));
    assert!(bob_record.followers.contains(&alice));
}
