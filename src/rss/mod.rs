//! Feed ingestion module for skimmer.
//!
//! HTTP fetch, RSS/Atom decoding, and text sanitization.

pub mod fetcher;
pub mod sanitize;

pub use fetcher::{fetch_feed, validate_url, FeedFetcher, ParsedFeed, ParsedItem};
pub use sanitize::sanitize;
