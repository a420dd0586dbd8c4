//! Data structures for users, posts, and feed snapshots.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// User record with embedded social-graph edge sets.
///
/// Credentials live with the external identity service; this record carries
/// only the public profile and the follower/following duals. The two edge
/// sets are symmetric across records: `a.following` contains `b` iff
/// `b.followers` contains `a`.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub followers: Vec<Uuid>,
    pub following: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(id: Uuid, username: impl Into<String>) -> Self {
        Self {
            id,
            username: username.into(),
            followers: Vec::new(),
            following: Vec::new(),
            created_at: Utc::now(),
        }
    }
}

/// Post record with embedded engagement edge sets.
///
/// Authorship and creation timestamp are immutable after creation; content is
/// mutable by the author only; the like/retweet sets are mutable by any
/// caller through the toggle engine.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Post {
    pub id: Uuid,
    pub author_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub likes: Vec<Uuid>,
    pub retweets: Vec<Uuid>,
}

impl Post {
    pub fn new(author_id: Uuid, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            author_id,
            content: content.into(),
            created_at: Utc::now(),
            likes: Vec::new(),
            retweets: Vec::new(),
        }
    }
}

/// Post snapshot with the author's username populated.
///
/// The shape cached per feed page, returned by feed reads, and carried in the
/// NEW_POST push event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct PostView {
    pub id: Uuid,
    pub author_id: Uuid,
    pub author_username: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub likes: Vec<Uuid>,
    pub retweets: Vec<Uuid>,
}

impl PostView {
    pub fn from_post(post: Post, author_username: impl Into<String>) -> Self {
        Self {
            id: post.id,
            author_id: post.author_id,
            author_username: author_username.into(),
            content: post.content,
            created_at: post.created_at,
            likes: post.likes,
            retweets: post.retweets,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_post_view_serialization_round_trip() {
        let post = Post::new(Uuid::new_v4(), "hello");
        let view = PostView::from_post(post.clone(), "alice");

        let json = serde_json::to_string(&view).unwrap();
        let back: PostView = serde_json::from_str(&json).unwrap();

        assert_eq!(back.id, post.id);
        assert_eq!(back.author_username, "alice");
        assert_eq!(back.content, "hello");
    }
}
