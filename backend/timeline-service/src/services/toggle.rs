//! Toggle engine: idempotent presence-toggling for likes, retweets, and
//! follow pairs.
//!
//! Each toggle lands opposite to wherever the set stood at the moment its
//! write committed; concurrent toggles by different callers touch distinct
//! elements and do not conflict. Like/retweet are one atomic record update.
//! Follow spans two user records with no cross-record transaction available,
//! so it runs as a fixed-order two-phase write with best-effort compensation
//! (see `toggle_follow`).

use std::sync::Arc;

use tracing::error;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::Post;
use crate::store::{PostEdge, RelationshipStore, UserEdge};

/// Outcome of a like/retweet toggle: the updated post plus the caller's
/// resulting membership, reported without a second read.
#[derive(Debug)]
pub struct PostToggle {
    pub post: Post,
    pub present: bool,
}

/// Outcome of a follow toggle.
#[derive(Debug)]
pub struct FollowToggle {
    pub following: bool,
}

pub struct ToggleEngine {
    store: Arc<dyn RelationshipStore>,
}

impl ToggleEngine {
    pub fn new(store: Arc<dyn RelationshipStore>) -> Self {
        Self { store }
    }

    pub async fn toggle_like(&self, post_id: Uuid, caller: Uuid) -> Result<PostToggle> {
        self.toggle_post_edge(post_id, caller, PostEdge::Likes).await
    }

    pub async fn toggle_retweet(&self, post_id: Uuid, caller: Uuid) -> Result<PostToggle> {
        self.toggle_post_edge(post_id, caller, PostEdge::Retweets)
            .await
    }

    async fn toggle_post_edge(
        &self,
        post_id: Uuid,
        caller: Uuid,
        edge: PostEdge,
    ) -> Result<PostToggle> {
        let (post, present) = self.store.flip_post_edge(post_id, caller, edge).await?;
        Ok(PostToggle { post, present })
    }

    /// Flip the follow edge between `caller` and `target`.
    ///
    /// Two set mutations in fixed order: (1) flip `caller.following`, the
    /// authoritative side that decides toggle direction; (2) drive
    /// `target.followers` to match. If the second write fails, the first is
    /// reverted best-effort; a failed compensation leaves a one-sided edge,
    /// logged at error level with both ids for operator reconciliation.
    pub async fn toggle_follow(&self, target: Uuid, caller: Uuid) -> Result<FollowToggle> {
        if target == caller {
            return Err(AppError::Validation("cannot follow yourself".to_string()));
        }

        // Both users must resolve before either record is touched.
        self.store.get_user(target).await?;

        let following = self
            .store
            .flip_user_edge(caller, UserEdge::Following, target)
            .await?;

        match self
            .store
            .set_user_edge(target, UserEdge::Followers, caller, following)
            .await
        {
            Ok(()) => Ok(FollowToggle { following }),
            Err(err) => {
                if let Err(comp_err) = self
                    .store
                    .set_user_edge(caller, UserEdge::Following, target, !following)
                    .await
                {
                    error!(
                        caller = %caller,
                        target = %target,
                        error = %comp_err,
                        "follow compensation failed; one-sided follow edge left behind"
                    );
                }
                Err(err.into())
            }
        }
    }
}
