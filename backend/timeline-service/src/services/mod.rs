//! Business logic layer.

pub mod feed;
pub mod posts;
pub mod toggle;

pub use feed::{FeedService, FEED_PAGE_SIZE, FEED_TTL};
pub use posts::PostService;
pub use toggle::{FollowToggle, PostToggle, ToggleEngine};
