//! Subscription service for skimmer.
//!
//! High-level feed operations: registering feeds, following them, and
//! storing items collected by aggregation.

use super::repository::{FeedFollowRepository, FeedItemRepository, FeedRepository};
use super::types::{Feed, FeedWithOwner, FollowedFeed, NewFeed, NewFeedFollow, NewFeedItem};
use crate::db::{Database, User};
use crate::rss::ParsedFeed;
use crate::{Result, SkimmerError};

/// Service for subscription operations.
pub struct SubscriptionService<'a> {
    db: &'a Database,
}

impl<'a> SubscriptionService<'a> {
    /// Create a new SubscriptionService with the given database reference.
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Register a new feed and follow it as its creator.
    ///
    /// The two steps are sequential and not wrapped in a transaction: if
    /// recording the follow fails, the feed row stays in place and the
    /// failure is surfaced as a distinct error carrying the cause.
    pub async fn add_feed(&self, user: &User, name: &str, url: &str) -> Result<Feed> {
        let feed_repo = FeedRepository::new(self.db.pool());
        let feed = feed_repo.create(&NewFeed::new(name, url, user.id)).await?;

        let follow_repo = FeedFollowRepository::new(self.db.pool());
        follow_repo
            .create(&NewFeedFollow::new(user.id, feed.id))
            .await
            .map_err(|e| SkimmerError::FeedWithoutFollow {
                source: Box::new(e),
            })?;

        Ok(feed)
    }

    /// Follow an already-registered feed by URL.
    pub async fn follow(&self, user: &User, url: &str) -> Result<FollowedFeed> {
        let feed = FeedRepository::new(self.db.pool())
            .get_by_url(url)
            .await?
            .ok_or_else(|| SkimmerError::NotFound(format!("feed '{url}'")))?;

        let follow = FeedFollowRepository::new(self.db.pool())
            .create(&NewFeedFollow::new(user.id, feed.id))
            .await?;

        Ok(FollowedFeed {
            follow,
            feed_name: feed.name,
        })
    }

    /// Names of the feeds a user follows, in the gateway's return order.
    pub async fn list_follows(&self, user: &User) -> Result<Vec<String>> {
        let follows = FeedFollowRepository::new(self.db.pool())
            .list_for_user(user.id)
            .await?;

        Ok(follows.into_iter().map(|f| f.feed_name).collect())
    }

    /// List all registered feeds with their owners.
    pub async fn list_feeds(&self) -> Result<Vec<FeedWithOwner>> {
        FeedRepository::new(self.db.pool()).list_with_owners().await
    }

    /// Store the items of a fetched feed, skipping ones already present.
    ///
    /// Items without a link carry no stable key and are not persisted.
    /// Returns the number of newly stored items.
    pub async fn store_items(&self, feed_id: i64, parsed: &ParsedFeed) -> Result<usize> {
        let item_repo = FeedItemRepository::new(self.db.pool());
        let mut stored = 0;

        for item in &parsed.items {
            let Some(link) = &item.link else {
                continue;
            };

            let mut new_item = NewFeedItem::new(feed_id, item.title.as_str(), link.as_str());
            if !item.description.is_empty() {
                new_item = new_item.with_description(item.description.as_str());
            }
            if let Some(published) = item.published {
                new_item = new_item.with_published_at(published);
            }

            if item_repo.create_or_ignore(&new_item).await?.is_some() {
                stored += 1;
            }
        }

        Ok(stored)
    }
}
