//! PostgreSQL backend for the relationship store.
//!
//! Edge sets are `uuid[]` columns on the owning record; every edge mutation
//! is a single `UPDATE ... RETURNING` statement so concurrent toggles
//! serialize on the store's own per-record update ordering.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{Post, PostView, User};
use crate::store::{PostEdge, RelationshipStore, StoreError, StoreResult, UserEdge};

/// Relationship store backed by PostgreSQL
#[derive(Clone)]
pub struct PgRelationshipStore {
    pool: PgPool,
}

impl PgRelationshipStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the users/posts tables and the feed-ordering index if they do
    /// not exist yet. Called once at startup.
    pub async fn ensure_schema(&self) -> StoreResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id UUID PRIMARY KEY,
                username TEXT NOT NULL UNIQUE,
                followers UUID[] NOT NULL DEFAULT '{}',
                following UUID[] NOT NULL DEFAULT '{}',
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(unavailable)?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS posts (
                id UUID PRIMARY KEY,
                author_id UUID NOT NULL REFERENCES users(id),
                content TEXT NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                likes UUID[] NOT NULL DEFAULT '{}',
                retweets UUID[] NOT NULL DEFAULT '{}'
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(unavailable)?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_posts_feed_order ON posts (created_at DESC, id DESC)",
        )
        .execute(&self.pool)
        .await
        .map_err(unavailable)?;

        Ok(())
    }
}

fn unavailable(err: sqlx::Error) -> StoreError {
    StoreError::Unavailable(err.to_string())
}

#[async_trait]
impl RelationshipStore for PgRelationshipStore {
    async fn get_user(&self, id: Uuid) -> StoreResult<User> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, followers, following, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unavailable)?
        .ok_or_else(|| StoreError::NotFound(format!("user {}", id)))
    }

    async fn save_user(&self, user: &User) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO users (id, username, followers, following, created_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (id) DO UPDATE
            SET username = EXCLUDED.username,
                followers = EXCLUDED.followers,
                following = EXCLUDED.following
            "#,
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.followers)
        .bind(&user.following)
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(unavailable)?;

        Ok(())
    }

    async fn create_post(&self, post: &Post) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO posts (id, author_id, content, created_at, likes, retweets)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(post.id)
        .bind(post.author_id)
        .bind(&post.content)
        .bind(post.created_at)
        .bind(&post.likes)
        .bind(&post.retweets)
        .execute(&self.pool)
        .await
        .map_err(unavailable)?;

        Ok(())
    }

    async fn get_post(&self, id: Uuid) -> StoreResult<Post> {
        sqlx::query_as::<_, Post>(
            r#"
            SELECT id, author_id, content, created_at, likes, retweets
            FROM posts
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unavailable)?
        .ok_or_else(|| StoreError::NotFound(format!("post {}", id)))
    }

    async fn update_post_content(
        &self,
        id: Uuid,
        author: Uuid,
        content: &str,
    ) -> StoreResult<Post> {
        sqlx::query_as::<_, Post>(
            r#"
            UPDATE posts
            SET content = $3
            WHERE id = $1 AND author_id = $2
            RETURNING id, author_id, content, created_at, likes, retweets
            "#,
        )
        .bind(id)
        .bind(author)
        .bind(content)
        .fetch_optional(&self.pool)
        .await
        .map_err(unavailable)?
        .ok_or_else(|| StoreError::NotFound(format!("post {}", id)))
    }

    async fn delete_post(&self, id: Uuid, expected_author: Uuid) -> StoreResult<()> {
        let result = sqlx::query(
            r#"
            DELETE FROM posts
            WHERE id = $1 AND author_id = $2
            "#,
        )
        .bind(id)
        .bind(expected_author)
        .execute(&self.pool)
        .await
        .map_err(unavailable)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("post {}", id)));
        }

        Ok(())
    }

    async fn list_posts_page(&self, skip: u32, limit: u32) -> StoreResult<Vec<PostView>> {
        sqlx::query_as::<_, PostView>(
            r#"
            SELECT p.id, p.author_id, u.username AS author_username,
                   p.content, p.created_at, p.likes, p.retweets
            FROM posts p
            JOIN users u ON u.id = p.author_id
            ORDER BY p.created_at DESC, p.id DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit as i64)
        .bind(skip as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(unavailable)
    }

    async fn flip_post_edge(
        &self,
        post_id: Uuid,
        member: Uuid,
        edge: PostEdge,
    ) -> StoreResult<(Post, bool)> {
        let sql = match edge {
            PostEdge::Likes => {
                r#"
                UPDATE posts
                SET likes = CASE WHEN $2 = ANY(likes)
                                 THEN array_remove(likes, $2)
                                 ELSE array_append(likes, $2) END
                WHERE id = $1
                RETURNING id, author_id, content, created_at, likes, retweets
                "#
            }
            PostEdge::Retweets => {
                r#"
                UPDATE posts
                SET retweets = CASE WHEN $2 = ANY(retweets)
                                    THEN array_remove(retweets, $2)
                                    ELSE array_append(retweets, $2) END
                WHERE id = $1
                RETURNING id, author_id, content, created_at, likes, retweets
                "#
            }
        };

        let post = sqlx::query_as::<_, Post>(sql)
            .bind(post_id)
            .bind(member)
            .fetch_optional(&self.pool)
            .await
            .map_err(unavailable)?
            .ok_or_else(|| StoreError::NotFound(format!("post {}", post_id)))?;

        let present = match edge {
            PostEdge::Likes => post.likes.contains(&member),
            PostEdge::Retweets => post.retweets.contains(&member),
        };

        Ok((post, present))
    }

    async fn flip_user_edge(
        &self,
        user_id: Uuid,
        edge: UserEdge,
        member: Uuid,
    ) -> StoreResult<bool> {
        let sql = match edge {
            UserEdge::Followers => {
                r#"
                UPDATE users
                SET followers = CASE WHEN $2 = ANY(followers)
                                     THEN array_remove(followers, $2)
                                     ELSE array_append(followers, $2) END
                WHERE id = $1
                RETURNING $2 = ANY(followers)
                "#
            }
            UserEdge::Following => {
                r#"
                UPDATE users
                SET following = CASE WHEN $2 = ANY(following)
                                     THEN array_remove(following, $2)
                                     ELSE array_append(following, $2) END
                WHERE id = $1
                RETURNING $2 = ANY(following)
                "#
            }
        };

        sqlx::query_scalar::<_, bool>(sql)
            .bind(user_id)
            .bind(member)
            .fetch_optional(&self.pool)
            .await
            .map_err(unavailable)?
            .ok_or_else(|| StoreError::NotFound(format!("user {}", user_id)))
    }

    async fn set_user_edge(
        &self,
        user_id: Uuid,
        edge: UserEdge,
        member: Uuid,
        present: bool,
    ) -> StoreResult<()> {
        let sql = match edge {
            UserEdge::Followers => {
                r#"
                UPDATE users
                SET followers = CASE
                    WHEN $3 AND NOT ($2 = ANY(followers)) THEN array_append(followers, $2)
                    WHEN NOT $3 THEN array_remove(followers, $2)
                    ELSE followers END
                WHERE id = $1
                RETURNING id
                "#
            }
            UserEdge::Following => {
                r#"
                UPDATE users
                SET following = CASE
                    WHEN $3 AND NOT ($2 = ANY(following)) THEN array_append(following, $2)
                    WHEN NOT $3 THEN array_remove(following, $2)
                    ELSE following END
                WHERE id = $1
                RETURNING id
                "#
            }
        };

        sqlx::query_scalar::<_, Uuid>(sql)
            .bind(user_id)
            .bind(member)
            .bind(present)
            .fetch_optional(&self.pool)
            .await
            .map_err(unavailable)?
            .ok_or_else(|| StoreError::NotFound(format!("user {}", user_id)))?;

        Ok(())
    }
}
