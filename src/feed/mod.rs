//! Feed subscription module for skimmer.
//!
//! This module provides registered feeds, user follows, and persisted
//! feed items.

pub mod repository;
pub mod service;
pub mod types;

pub use repository::{FeedFollowRepository, FeedItemRepository, FeedRepository};
pub use service::SubscriptionService;
pub use types::{
    Feed, FeedFollow, FeedItem, FeedWithOwner, FollowedFeed, NewFeed, NewFeedFollow, NewFeedItem,
};
