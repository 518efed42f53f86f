//! Feed, follow, and item repositories for skimmer.

use chrono::Utc;
use sqlx::SqlitePool;

use super::types::{
    Feed, FeedFollow, FeedItem, FeedWithOwner, FollowedFeed, NewFeed, NewFeedFollow, NewFeedItem,
};
use crate::db::{is_unique_violation, parse_datetime};
use crate::{Result, SkimmerError};

/// Row type for a feed from the database.
#[derive(Debug, Clone, sqlx::FromRow)]
struct FeedRow {
    id: i64,
    name: String,
    url: String,
    user_id: i64,
    created_at: String,
    updated_at: String,
}

impl From<FeedRow> for Feed {
    fn from(row: FeedRow) -> Self {
        Feed {
            id: row.id,
            name: row.name,
            url: row.url,
            user_id: row.user_id,
            created_at: parse_datetime(&row.created_at).unwrap_or_else(Utc::now),
            updated_at: parse_datetime(&row.updated_at).unwrap_or_else(Utc::now),
        }
    }
}

/// Row type for a feed joined with its owner's name.
#[derive(Debug, Clone, sqlx::FromRow)]
struct FeedWithOwnerRow {
    id: i64,
    name: String,
    url: String,
    user_id: i64,
    created_at: String,
    updated_at: String,
    owner_name: String,
}

impl From<FeedWithOwnerRow> for FeedWithOwner {
    fn from(row: FeedWithOwnerRow) -> Self {
        let feed = Feed {
            id: row.id,
            name: row.name,
            url: row.url,
            user_id: row.user_id,
            created_at: parse_datetime(&row.created_at).unwrap_or_else(Utc::now),
            updated_at: parse_datetime(&row.updated_at).unwrap_or_else(Utc::now),
        };
        FeedWithOwner {
            feed,
            owner_name: row.owner_name,
        }
    }
}

/// Row type for a follow from the database.
#[derive(Debug, Clone, sqlx::FromRow)]
struct FeedFollowRow {
    id: i64,
    user_id: i64,
    feed_id: i64,
    created_at: String,
    updated_at: String,
}

impl From<FeedFollowRow> for FeedFollow {
    fn from(row: FeedFollowRow) -> Self {
        FeedFollow {
            id: row.id,
            user_id: row.user_id,
            feed_id: row.feed_id,
            created_at: parse_datetime(&row.created_at).unwrap_or_else(Utc::now),
            updated_at: parse_datetime(&row.updated_at).unwrap_or_else(Utc::now),
        }
    }
}

/// Row type for a follow joined with the feed name.
#[derive(Debug, Clone, sqlx::FromRow)]
struct FollowedFeedRow {
    id: i64,
    user_id: i64,
    feed_id: i64,
    created_at: String,
    updated_at: String,
    feed_name: String,
}

impl From<FollowedFeedRow> for FollowedFeed {
    fn from(row: FollowedFeedRow) -> Self {
        let follow = FeedFollow {
            id: row.id,
            user_id: row.user_id,
            feed_id: row.feed_id,
            created_at: parse_datetime(&row.created_at).unwrap_or_else(Utc::now),
            updated_at: parse_datetime(&row.updated_at).unwrap_or_else(Utc::now),
        };
        FollowedFeed {
            follow,
            feed_name: row.feed_name,
        }
    }
}

/// Row type for a feed item from the database.
#[derive(Debug, Clone, sqlx::FromRow)]
struct FeedItemRow {
    id: i64,
    feed_id: i64,
    title: String,
    link: String,
    description: Option<String>,
    published_at: Option<String>,
    fetched_at: String,
}

impl From<FeedItemRow> for FeedItem {
    fn from(row: FeedItemRow) -> Self {
        FeedItem {
            id: row.id,
            feed_id: row.feed_id,
            title: row.title,
            link: row.link,
            description: row.description,
            published_at: row.published_at.and_then(|s| parse_datetime(&s)),
            fetched_at: parse_datetime(&row.fetched_at).unwrap_or_else(Utc::now),
        }
    }
}

/// Repository for feed operations.
pub struct FeedRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> FeedRepository<'a> {
    /// Create a new repository instance.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new feed.
    ///
    /// Fails with a duplicate-conflict error if the URL is already
    /// registered.
    pub async fn create(&self, feed: &NewFeed) -> Result<Feed> {
        let result = sqlx::query("INSERT INTO feeds (name, url, user_id) VALUES (?, ?, ?)")
            .bind(&feed.name)
            .bind(&feed.url)
            .bind(feed.user_id)
            .execute(self.pool)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    SkimmerError::Duplicate(format!("feed '{}'", feed.url))
                } else {
                    SkimmerError::Database(e.to_string())
                }
            })?;

        let id = result.last_insert_rowid();
        self.get_by_id(id)
            .await?
            .ok_or_else(|| SkimmerError::NotFound("feed".to_string()))
    }

    /// Get a feed by ID.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<Feed>> {
        let row = sqlx::query_as::<_, FeedRow>(
            "SELECT id, name, url, user_id, created_at, updated_at FROM feeds WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| SkimmerError::Database(e.to_string()))?;

        Ok(row.map(Feed::from))
    }

    /// Get a feed by URL.
    pub async fn get_by_url(&self, url: &str) -> Result<Option<Feed>> {
        let row = sqlx::query_as::<_, FeedRow>(
            "SELECT id, name, url, user_id, created_at, updated_at FROM feeds WHERE url = ?",
        )
        .bind(url)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| SkimmerError::Database(e.to_string()))?;

        Ok(row.map(Feed::from))
    }

    /// List all feeds in registration order.
    pub async fn list_all(&self) -> Result<Vec<Feed>> {
        let rows = sqlx::query_as::<_, FeedRow>(
            "SELECT id, name, url, user_id, created_at, updated_at FROM feeds ORDER BY id ASC",
        )
        .fetch_all(self.pool)
        .await
        .map_err(|e| SkimmerError::Database(e.to_string()))?;

        Ok(rows.into_iter().map(Feed::from).collect())
    }

    /// List all feeds with the name of the registering user.
    pub async fn list_with_owners(&self) -> Result<Vec<FeedWithOwner>> {
        let rows = sqlx::query_as::<_, FeedWithOwnerRow>(
            r#"
            SELECT f.id, f.name, f.url, f.user_id, f.created_at, f.updated_at,
                   u.name AS owner_name
            FROM feeds f
            JOIN users u ON u.id = f.user_id
            ORDER BY f.id ASC
            "#,
        )
        .fetch_all(self.pool)
        .await
        .map_err(|e| SkimmerError::Database(e.to_string()))?;

        Ok(rows.into_iter().map(FeedWithOwner::from).collect())
    }
}

/// Repository for follow operations.
pub struct FeedFollowRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> FeedFollowRepository<'a> {
    /// Create a new repository instance.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new follow.
    ///
    /// Fails with a duplicate-conflict error if the user already follows
    /// the feed.
    pub async fn create(&self, follow: &NewFeedFollow) -> Result<FeedFollow> {
        let result = sqlx::query("INSERT INTO feed_follows (user_id, feed_id) VALUES (?, ?)")
            .bind(follow.user_id)
            .bind(follow.feed_id)
            .execute(self.pool)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    SkimmerError::Duplicate(format!(
                        "follow of feed {} by user {}",
                        follow.feed_id, follow.user_id
                    ))
                } else {
                    SkimmerError::Database(e.to_string())
                }
            })?;

        let id = result.last_insert_rowid();
        let row = sqlx::query_as::<_, FeedFollowRow>(
            "SELECT id, user_id, feed_id, created_at, updated_at FROM feed_follows WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| SkimmerError::Database(e.to_string()))?;

        row.map(FeedFollow::from)
            .ok_or_else(|| SkimmerError::NotFound("follow".to_string()))
    }

    /// List a user's follows with feed names, in follow order.
    pub async fn list_for_user(&self, user_id: i64) -> Result<Vec<FollowedFeed>> {
        let rows = sqlx::query_as::<_, FollowedFeedRow>(
            r#"
            SELECT ff.id, ff.user_id, ff.feed_id, ff.created_at, ff.updated_at,
                   f.name AS feed_name
            FROM feed_follows ff
            JOIN feeds f ON f.id = ff.feed_id
            WHERE ff.user_id = ?
            ORDER BY ff.id ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await
        .map_err(|e| SkimmerError::Database(e.to_string()))?;

        Ok(rows.into_iter().map(FollowedFeed::from).collect())
    }

    /// Count follows for a feed.
    pub async fn count_for_feed(&self, feed_id: i64) -> Result<i64> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM feed_follows WHERE feed_id = ?")
            .bind(feed_id)
            .fetch_one(self.pool)
            .await
            .map_err(|e| SkimmerError::Database(e.to_string()))?;

        Ok(count.0)
    }
}

/// Repository for feed item operations.
pub struct FeedItemRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> FeedItemRepository<'a> {
    /// Create a new repository instance.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new item, ignoring it if a duplicate (same feed_id + link)
    /// already exists.
    pub async fn create_or_ignore(&self, item: &NewFeedItem) -> Result<Option<i64>> {
        let published_at = item.published_at.map(|dt| dt.to_rfc3339());

        let result = sqlx::query(
            r#"
            INSERT OR IGNORE INTO feed_items (feed_id, title, link, description, published_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(item.feed_id)
        .bind(&item.title)
        .bind(&item.link)
        .bind(&item.description)
        .bind(&published_at)
        .execute(self.pool)
        .await
        .map_err(|e| SkimmerError::Database(e.to_string()))?;

        if result.rows_affected() > 0 {
            Ok(Some(result.last_insert_rowid()))
        } else {
            Ok(None) // Already existed
        }
    }

    /// List items for a feed, newest first.
    pub async fn list_by_feed(&self, feed_id: i64, limit: usize, offset: usize) -> Result<Vec<FeedItem>> {
        let rows = sqlx::query_as::<_, FeedItemRow>(
            r#"
            SELECT id, feed_id, title, link, description, published_at, fetched_at
            FROM feed_items
            WHERE feed_id = ?
            ORDER BY COALESCE(published_at, fetched_at) DESC, id DESC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(feed_id)
        .bind(limit as i64)
        .bind(offset as i64)
        .fetch_all(self.pool)
        .await
        .map_err(|e| SkimmerError::Database(e.to_string()))?;

        Ok(rows.into_iter().map(FeedItem::from).collect())
    }

    /// Count items for a feed.
    pub async fn count_by_feed(&self, feed_id: i64) -> Result<i64> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM feed_items WHERE feed_id = ?")
            .bind(feed_id)
            .fetch_one(self.pool)
            .await
            .map_err(|e| SkimmerError::Database(e.to_string()))?;

        Ok(count.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{NewUser, UserRepository};
    use crate::Database;

    async fn setup_db() -> Database {
        Database::open_in_memory().await.unwrap()
    }

    async fn create_test_user(db: &Database, name: &str) -> i64 {
        let repo = UserRepository::new(db.pool());
        repo.create(&NewUser::new(name)).await.unwrap().id
    }

    #[tokio::test]
    async fn test_create_feed() {
        let db = setup_db().await;
        let user_id = create_test_user(&db, "alice").await;
        let repo = FeedRepository::new(db.pool());

        let feed = repo
            .create(&NewFeed::new("Example", "https://example.com/feed.xml", user_id))
            .await
            .unwrap();

        assert!(feed.id > 0);
        assert_eq!(feed.name, "Example");
        assert_eq!(feed.url, "https://example.com/feed.xml");
        assert_eq!(feed.user_id, user_id);
    }

    #[tokio::test]
    async fn test_create_feed_duplicate_url() {
        let db = setup_db().await;
        let user_id = create_test_user(&db, "alice").await;
        let repo = FeedRepository::new(db.pool());

        let url = "https://example.com/feed.xml";
        repo.create(&NewFeed::new("First", url, user_id)).await.unwrap();

        // Same URL again, even with a different name and owner
        let other_id = create_test_user(&db, "bob").await;
        let result = repo.create(&NewFeed::new("Second", url, other_id)).await;

        assert!(matches!(result, Err(SkimmerError::Duplicate(_))));
    }

    #[tokio::test]
    async fn test_get_feed_by_url() {
        let db = setup_db().await;
        let user_id = create_test_user(&db, "alice").await;
        let repo = FeedRepository::new(db.pool());

        let url = "https://example.com/feed.xml";
        repo.create(&NewFeed::new("Example", url, user_id)).await.unwrap();

        let found = repo.get_by_url(url).await.unwrap();
        assert!(found.is_some());
        assert_eq!(found.unwrap().url, url);

        let not_found = repo.get_by_url("https://other.example/feed.xml").await.unwrap();
        assert!(not_found.is_none());
    }

    #[tokio::test]
    async fn test_list_all_in_registration_order() {
        let db = setup_db().await;
        let user_id = create_test_user(&db, "alice").await;
        let repo = FeedRepository::new(db.pool());

        repo.create(&NewFeed::new("One", "https://one.example/rss", user_id))
            .await
            .unwrap();
        repo.create(&NewFeed::new("Two", "https://two.example/rss", user_id))
            .await
            .unwrap();

        let feeds = repo.list_all().await.unwrap();
        assert_eq!(feeds.len(), 2);
        assert_eq!(feeds[0].name, "One");
        assert_eq!(feeds[1].name, "Two");
    }

    #[tokio::test]
    async fn test_list_with_owners() {
        let db = setup_db().await;
        let alice = create_test_user(&db, "alice").await;
        let bob = create_test_user(&db, "bob").await;
        let repo = FeedRepository::new(db.pool());

        repo.create(&NewFeed::new("One", "https://one.example/rss", alice))
            .await
            .unwrap();
        repo.create(&NewFeed::new("Two", "https://two.example/rss", bob))
            .await
            .unwrap();

        let feeds = repo.list_with_owners().await.unwrap();
        assert_eq!(feeds.len(), 2);
        assert_eq!(feeds[0].owner_name, "alice");
        assert_eq!(feeds[1].owner_name, "bob");
    }

    #[tokio::test]
    async fn test_create_follow() {
        let db = setup_db().await;
        let user_id = create_test_user(&db, "alice").await;
        let feed_repo = FeedRepository::new(db.pool());
        let follow_repo = FeedFollowRepository::new(db.pool());

        let feed = feed_repo
            .create(&NewFeed::new("Example", "https://example.com/feed.xml", user_id))
            .await
            .unwrap();

        let follow = follow_repo
            .create(&NewFeedFollow::new(user_id, feed.id))
            .await
            .unwrap();

        assert!(follow.id > 0);
        assert_eq!(follow.user_id, user_id);
        assert_eq!(follow.feed_id, feed.id);
    }

    #[tokio::test]
    async fn test_create_follow_duplicate_pair() {
        let db = setup_db().await;
        let user_id = create_test_user(&db, "alice").await;
        let feed_repo = FeedRepository::new(db.pool());
        let follow_repo = FeedFollowRepository::new(db.pool());

        let feed = feed_repo
            .create(&NewFeed::new("Example", "https://example.com/feed.xml", user_id))
            .await
            .unwrap();

        follow_repo
            .create(&NewFeedFollow::new(user_id, feed.id))
            .await
            .unwrap();
        let result = follow_repo.create(&NewFeedFollow::new(user_id, feed.id)).await;

        assert!(matches!(result, Err(SkimmerError::Duplicate(_))));

        // A different user can still follow the same feed
        let bob = create_test_user(&db, "bob").await;
        assert!(follow_repo.create(&NewFeedFollow::new(bob, feed.id)).await.is_ok());
    }

    #[tokio::test]
    async fn test_list_for_user_in_follow_order() {
        let db = setup_db().await;
        let user_id = create_test_user(&db, "alice").await;
        let feed_repo = FeedRepository::new(db.pool());
        let follow_repo = FeedFollowRepository::new(db.pool());

        let one = feed_repo
            .create(&NewFeed::new("One", "https://one.example/rss", user_id))
            .await
            .unwrap();
        let two = feed_repo
            .create(&NewFeed::new("Two", "https://two.example/rss", user_id))
            .await
            .unwrap();

        // Follow in reverse registration order
        follow_repo.create(&NewFeedFollow::new(user_id, two.id)).await.unwrap();
        follow_repo.create(&NewFeedFollow::new(user_id, one.id)).await.unwrap();

        let follows = follow_repo.list_for_user(user_id).await.unwrap();
        let names: Vec<&str> = follows.iter().map(|f| f.feed_name.as_str()).collect();
        assert_eq!(names, vec!["Two", "One"]);
    }

    #[tokio::test]
    async fn test_follow_requires_existing_feed() {
        let db = setup_db().await;
        let user_id = create_test_user(&db, "alice").await;
        let follow_repo = FeedFollowRepository::new(db.pool());

        // Foreign key violation surfaces as a database error
        let result = follow_repo.create(&NewFeedFollow::new(user_id, 999)).await;
        assert!(matches!(result, Err(SkimmerError::Database(_))));
    }

    #[tokio::test]
    async fn test_create_item() {
        let db = setup_db().await;
        let user_id = create_test_user(&db, "alice").await;
        let feed_repo = FeedRepository::new(db.pool());
        let item_repo = FeedItemRepository::new(db.pool());

        let feed = feed_repo
            .create(&NewFeed::new("Example", "https://example.com/feed.xml", user_id))
            .await
            .unwrap();

        let new_item = NewFeedItem::new(feed.id, "Article", "https://example.com/1")
            .with_description("Summary");
        let item_id = item_repo.create_or_ignore(&new_item).await.unwrap().unwrap();
        assert!(item_id > 0);

        let items = item_repo.list_by_feed(feed.id, 10, 0).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "Article");
        assert_eq!(items[0].description, Some("Summary".to_string()));
    }

    #[tokio::test]
    async fn test_create_item_ignores_duplicate_link() {
        let db = setup_db().await;
        let user_id = create_test_user(&db, "alice").await;
        let feed_repo = FeedRepository::new(db.pool());
        let item_repo = FeedItemRepository::new(db.pool());

        let feed = feed_repo
            .create(&NewFeed::new("Example", "https://example.com/feed.xml", user_id))
            .await
            .unwrap();

        let new_item = NewFeedItem::new(feed.id, "Article", "https://example.com/1");

        let id1 = item_repo.create_or_ignore(&new_item).await.unwrap();
        assert!(id1.is_some());

        let id2 = item_repo.create_or_ignore(&new_item).await.unwrap();
        assert!(id2.is_none());

        assert_eq!(item_repo.count_by_feed(feed.id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_reset_cascades() {
        let db = setup_db().await;
        let user_id = create_test_user(&db, "alice").await;
        let feed_repo = FeedRepository::new(db.pool());
        let follow_repo = FeedFollowRepository::new(db.pool());
        let item_repo = FeedItemRepository::new(db.pool());

        let feed = feed_repo
            .create(&NewFeed::new("Example", "https://example.com/feed.xml", user_id))
            .await
            .unwrap();
        follow_repo.create(&NewFeedFollow::new(user_id, feed.id)).await.unwrap();
        item_repo
            .create_or_ignore(&NewFeedItem::new(feed.id, "Article", "https://example.com/1"))
            .await
            .unwrap();

        UserRepository::new(db.pool()).delete_all().await.unwrap();

        assert!(feed_repo.list_all().await.unwrap().is_empty());
        assert!(follow_repo.list_for_user(user_id).await.unwrap().is_empty());
        assert_eq!(item_repo.count_by_feed(feed.id).await.unwrap(), 0);
    }
}
