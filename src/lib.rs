//! skimmer - a command-line RSS feed aggregator.
//!
//! Users register themselves, add feeds by URL, follow feeds other users
//! added, and run `agg` to fetch, sanitize, and store feed items.

pub mod commands;
pub mod config;
pub mod db;
pub mod error;
pub mod feed;
pub mod logging;
pub mod rss;

pub use commands::{default_registry, require_login, Command, CommandRegistry, Handler, State};
pub use config::Config;
pub use db::{Database, NewUser, User, UserRepository};
pub use error::{Result, SkimmerError};
pub use feed::{
    Feed, FeedFollow, FeedFollowRepository, FeedItemRepository, FeedRepository, FeedWithOwner,
    FollowedFeed, SubscriptionService,
};
pub use rss::{fetch_feed, sanitize, validate_url, FeedFetcher, ParsedFeed, ParsedItem};
