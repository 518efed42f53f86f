//! Feed and follow types for skimmer.

use chrono::{DateTime, Utc};

/// A registered feed.
#[derive(Debug, Clone)]
pub struct Feed {
    /// Feed ID.
    pub id: i64,
    /// Human-readable feed name.
    pub name: String,
    /// Feed URL (unique).
    pub url: String,
    /// User who registered the feed. Informational only; following is
    /// open to everyone.
    pub user_id: i64,
    /// When the feed was registered.
    pub created_at: DateTime<Utc>,
    /// When the feed was last updated.
    pub updated_at: DateTime<Utc>,
}

/// New feed for creation.
#[derive(Debug, Clone)]
pub struct NewFeed {
    /// Feed name.
    pub name: String,
    /// Feed URL.
    pub url: String,
    /// User registering the feed.
    pub user_id: i64,
}

impl NewFeed {
    /// Create a new feed record.
    pub fn new(name: impl Into<String>, url: impl Into<String>, user_id: i64) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            user_id,
        }
    }
}

/// A feed together with the name of the user who registered it.
#[derive(Debug, Clone)]
pub struct FeedWithOwner {
    /// The feed.
    pub feed: Feed,
    /// Name of the registering user.
    pub owner_name: String,
}

/// A user's follow of a feed.
#[derive(Debug, Clone)]
pub struct FeedFollow {
    /// Follow ID.
    pub id: i64,
    /// Following user.
    pub user_id: i64,
    /// Followed feed.
    pub feed_id: i64,
    /// When the follow was created.
    pub created_at: DateTime<Utc>,
    /// When the follow was last updated.
    pub updated_at: DateTime<Utc>,
}

/// New follow for creation.
#[derive(Debug, Clone)]
pub struct NewFeedFollow {
    /// Following user.
    pub user_id: i64,
    /// Feed to follow.
    pub feed_id: i64,
}

impl NewFeedFollow {
    /// Create a new follow record.
    pub fn new(user_id: i64, feed_id: i64) -> Self {
        Self { user_id, feed_id }
    }
}

/// A follow together with the followed feed's name.
#[derive(Debug, Clone)]
pub struct FollowedFeed {
    /// The follow.
    pub follow: FeedFollow,
    /// Name of the followed feed.
    pub feed_name: String,
}

/// A feed item collected by aggregation.
#[derive(Debug, Clone)]
pub struct FeedItem {
    /// Item ID.
    pub id: i64,
    /// Feed this item belongs to.
    pub feed_id: i64,
    /// Item title (sanitized).
    pub title: String,
    /// Link to the original article. Also the dedup key within a feed.
    pub link: String,
    /// Item description (sanitized).
    pub description: Option<String>,
    /// When the item was published.
    pub published_at: Option<DateTime<Utc>>,
    /// When the item was collected.
    pub fetched_at: DateTime<Utc>,
}

/// New feed item for creation.
#[derive(Debug, Clone)]
pub struct NewFeedItem {
    /// Feed ID.
    pub feed_id: i64,
    /// Item title.
    pub title: String,
    /// Link to the original article.
    pub link: String,
    /// Item description.
    pub description: Option<String>,
    /// When the item was published.
    pub published_at: Option<DateTime<Utc>>,
}

impl NewFeedItem {
    /// Create a new item.
    pub fn new(feed_id: i64, title: impl Into<String>, link: impl Into<String>) -> Self {
        Self {
            feed_id,
            title: title.into(),
            link: link.into(),
            description: None,
            published_at: None,
        }
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the published date.
    pub fn with_published_at(mut self, published_at: DateTime<Utc>) -> Self {
        self.published_at = Some(published_at);
        self
    }
}
