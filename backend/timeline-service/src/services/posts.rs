//! Post service: creation, author-scoped mutation, and deletion.

use std::sync::Arc;

use uuid::Uuid;

use crate::error::Result;
use crate::models::{Post, PostView};
use crate::store::RelationshipStore;

pub struct PostService {
    store: Arc<dyn RelationshipStore>,
}

impl PostService {
    pub fn new(store: Arc<dyn RelationshipStore>) -> Self {
        Self { store }
    }

    /// Create a post authored by `author` and return its feed snapshot.
    pub async fn create_post(&self, author: Uuid, content: &str) -> Result<PostView> {
        let author_user = self.store.get_user(author).await?;

        let post = Post::new(author, content);
        self.store.create_post(&post).await?;

        Ok(PostView::from_post(post, author_user.username))
    }

    /// Replace a post's content. Author-scoped; misses surface as 404.
    pub async fn update_post(&self, post_id: Uuid, author: Uuid, content: &str) -> Result<Post> {
        let post = self
            .store
            .update_post_content(post_id, author, content)
            .await?;
        Ok(post)
    }

    /// Delete a post. Author-scoped; misses surface as 404.
    pub async fn delete_post(&self, post_id: Uuid, author: Uuid) -> Result<()> {
        self.store.delete_post(post_id, author).await?;
        Ok(())
    }
}
