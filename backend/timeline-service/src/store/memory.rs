//! In-memory backend for the relationship store.
//!
//! Used by local development without a database and by the test suite, which
//! wraps it to count accesses and inject faults. Semantics mirror the
//! PostgreSQL backend: every edge mutation happens under one write-lock
//! acquisition, the in-process equivalent of a single-record atomic update.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::{Post, PostView, User};
use crate::store::{PostEdge, RelationshipStore, StoreError, StoreResult, UserEdge};

#[derive(Default)]
struct Inner {
    users: HashMap<Uuid, User>,
    posts: HashMap<Uuid, Post>,
}

/// Relationship store backed by process-local maps
#[derive(Default, Clone)]
pub struct MemoryRelationshipStore {
    inner: Arc<RwLock<Inner>>,
}

impl MemoryRelationshipStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of posts currently held. Test/diagnostic helper.
    pub async fn post_count(&self) -> usize {
        self.inner.read().await.posts.len()
    }
}

fn flip(set: &mut Vec<Uuid>, member: Uuid) -> bool {
    if let Some(idx) = set.iter().position(|m| *m == member) {
        set.remove(idx);
        false
    } else {
        set.push(member);
        true
    }
}

fn drive(set: &mut Vec<Uuid>, member: Uuid, present: bool) {
    let idx = set.iter().position(|m| *m == member);
    match (idx, present) {
        (None, true) => set.push(member),
        (Some(i), false) => {
            set.remove(i);
        }
        _ => {}
    }
}

#[async_trait]
impl RelationshipStore for MemoryRelationshipStore {
    async fn get_user(&self, id: Uuid) -> StoreResult<User> {
        self.inner
            .read()
            .await
            .users
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("user {}", id)))
    }

    async fn save_user(&self, user: &User) -> StoreResult<()> {
        self.inner.write().await.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn create_post(&self, post: &Post) -> StoreResult<()> {
        self.inner.write().await.posts.insert(post.id, post.clone());
        Ok(())
    }

    async fn get_post(&self, id: Uuid) -> StoreResult<Post> {
        self.inner
            .read()
            .await
            .posts
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("post {}", id)))
    }

    async fn update_post_content(
        &self,
        id: Uuid,
        author: Uuid,
        content: &str,
    ) -> StoreResult<Post> {
        let mut guard = self.inner.write().await;
        let post = guard
            .posts
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("post {}", id)))?;

        if post.author_id != author {
            return Err(StoreError::Unauthorized(format!("post {}", id)));
        }

        post.content = content.to_string();
        Ok(post.clone())
    }

    async fn delete_post(&self, id: Uuid, expected_author: Uuid) -> StoreResult<()> {
        let mut guard = self.inner.write().await;
        let post = guard
            .posts
            .get(&id)
            .ok_or_else(|| StoreError::NotFound(format!("post {}", id)))?;

        if post.author_id != expected_author {
            return Err(StoreError::Unauthorized(format!("post {}", id)));
        }

        guard.posts.remove(&id);
        Ok(())
    }

    async fn list_posts_page(&self, skip: u32, limit: u32) -> StoreResult<Vec<PostView>> {
        let guard = self.inner.read().await;

        let mut posts: Vec<&Post> = guard.posts.values().collect();
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        Ok(posts
            .into_iter()
            .skip(skip as usize)
            .take(limit as usize)
            .map(|post| {
                let username = guard
                    .users
                    .get(&post.author_id)
                    .map(|u| u.username.clone())
                    .unwrap_or_default();
                PostView::from_post(post.clone(), username)
            })
            .collect())
    }

    async fn flip_post_edge(
        &self,
        post_id: Uuid,
        member: Uuid,
        edge: PostEdge,
    ) -> StoreResult<(Post, bool)> {
        let mut guard = self.inner.write().await;
        let post = guard
            .posts
            .get_mut(&post_id)
            .ok_or_else(|| StoreError::NotFound(format!("post {}", post_id)))?;

        let present = match edge {
            PostEdge::Likes => flip(&mut post.likes, member),
            PostEdge::Retweets => flip(&mut post.retweets, member),
        };

        Ok((post.clone(), present))
    }

    async fn flip_user_edge(
        &self,
        user_id: Uuid,
        edge: UserEdge,
        member: Uuid,
    ) -> StoreResult<bool> {
        let mut guard = self.inner.write().await;
        let user = guard
            .users
            .get_mut(&user_id)
            .ok_or_else(|| StoreError::NotFound(format!("user {}", user_id)))?;

        let present = match edge {
            UserEdge::Followers => flip(&mut user.followers, member),
            UserEdge::Following => flip(&mut user.following, member),
        };

        Ok(present)
    }

    async fn set_user_edge(
        &self,
        user_id: Uuid,
        edge: UserEdge,
        member: Uuid,
        present: bool,
    ) -> StoreResult<()> {
        let mut guard = self.inner.write().await;
        let user = guard
            .users
            .get_mut(&user_id)
            .ok_or_else(|| StoreError::NotFound(format!("user {}", user_id)))?;

        match edge {
            UserEdge::Followers => drive(&mut user.followers, member, present),
            UserEdge::Following => drive(&mut user.following, member, present),
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_author_scoped_delete() {
        let store = MemoryRelationshipStore::new();
        let author = Uuid::new_v4();
        let stranger = Uuid::new_v4();

        let post = Post::new(author, "mine");
        store.create_post(&post).await.unwrap();

        let err = store.delete_post(post.id, stranger).await.unwrap_err();
        assert!(matches!(err, StoreError::Unauthorized(_)));
        assert!(store.get_post(post.id).await.is_ok());

        store.delete_post(post.id, author).await.unwrap();
        assert!(matches!(
            store.get_post(post.id).await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_flip_post_edge_round_trip() {
        let store = MemoryRelationshipStore::new();
        let post = Post::new(Uuid::new_v4(), "toggle me");
        store.create_post(&post).await.unwrap();

        let member = Uuid::new_v4();
        let (_, present) = store
            .flip_post_edge(post.id, member, PostEdge::Likes)
            .await
            .unwrap();
        assert!(present);

        let (updated, present) = store
            .flip_post_edge(post.id, member, PostEdge::Likes)
            .await
            .unwrap();
        assert!(!present);
        assert!(updated.likes.is_empty());
    }
}
