//! Shared application state handed to HTTP handlers.

use std::sync::Arc;

use crate::services::{FeedService, PostService, ToggleEngine};
use crate::store::RelationshipStore;
use crate::ws::FanoutHub;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn RelationshipStore>,
    pub feed: Arc<FeedService>,
    pub posts: Arc<PostService>,
    pub toggles: Arc<ToggleEngine>,
    pub hub: FanoutHub,
}

impl AppState {
    pub fn new(
        store: Arc<dyn RelationshipStore>,
        feed: Arc<FeedService>,
        posts: Arc<PostService>,
        toggles: Arc<ToggleEngine>,
        hub: FanoutHub,
    ) -> Self {
        Self {
            store,
            feed,
            posts,
            toggles,
            hub,
        }
    }
}
