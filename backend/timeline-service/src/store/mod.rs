//! Relationship store: the durable collaborator holding user and post
//! records and their embedded edge sets.
//!
//! The store exposes key-based CRUD plus single-record atomic edge updates.
//! No multi-record transaction is assumed; callers that touch two records
//! (the follow toggle) must handle partial failure themselves.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{Post, PostView, User};

pub mod memory;
pub mod postgres;

pub use memory::MemoryRelationshipStore;
pub use postgres::PgRelationshipStore;

/// Store error types
#[derive(Debug, Error)]
pub enum StoreError {
    /// The identifier does not resolve
    #[error("not found: {0}")]
    NotFound(String),

    /// An author-scoped mutation targeted a record not owned by the caller
    #[error("not owned by caller: {0}")]
    Unauthorized(String),

    /// The store is unreachable or timed out
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Engagement edge sets embedded on a post record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostEdge {
    Likes,
    Retweets,
}

/// Social-graph edge sets embedded on a user record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserEdge {
    Followers,
    Following,
}

/// Adapter contract over the durable store.
///
/// Edge mutations (`flip_post_edge`, `flip_user_edge`, `set_user_edge`) are
/// atomic per record: each maps to one native single-record update, which is
/// the only ordering guarantee concurrent toggles rely on.
#[async_trait]
pub trait RelationshipStore: Send + Sync {
    async fn get_user(&self, id: Uuid) -> StoreResult<User>;

    /// Upsert a user record.
    async fn save_user(&self, user: &User) -> StoreResult<()>;

    async fn create_post(&self, post: &Post) -> StoreResult<()>;

    async fn get_post(&self, id: Uuid) -> StoreResult<Post>;

    /// Replace a post's content. Author-scoped: fails when the post does not
    /// exist or is not owned by `author`.
    async fn update_post_content(&self, id: Uuid, author: Uuid, content: &str)
        -> StoreResult<Post>;

    /// Delete a post. Author-scoped like `update_post_content`.
    async fn delete_post(&self, id: Uuid, expected_author: Uuid) -> StoreResult<()>;

    /// One feed page worth of post snapshots, author username populated,
    /// ordered by creation timestamp descending with identifier-descending
    /// tie-break.
    async fn list_posts_page(&self, skip: u32, limit: u32) -> StoreResult<Vec<PostView>>;

    /// Atomically flip `member`'s presence in the named post edge set.
    /// Returns the updated post and the resulting membership.
    async fn flip_post_edge(
        &self,
        post_id: Uuid,
        member: Uuid,
        edge: PostEdge,
    ) -> StoreResult<(Post, bool)>;

    /// Atomically flip `member`'s presence in the named user edge set.
    /// Returns the resulting membership.
    async fn flip_user_edge(&self, user_id: Uuid, edge: UserEdge, member: Uuid)
        -> StoreResult<bool>;

    /// Atomically drive `member`'s presence in the named user edge set to
    /// `present`. Idempotent; used to mirror the second half of a follow
    /// toggle and to compensate a failed one.
    async fn set_user_edge(
        &self,
        user_id: Uuid,
        edge: UserEdge,
        member: Uuid,
        present: bool,
    ) -> StoreResult<()>;
}
