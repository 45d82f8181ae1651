use super::db::Database;
use super::types::{Feed, FeedWithOwner, StoreError};

impl Database {
    // ========================================================================
    // Feed Operations
    // ========================================================================

    /// Create a feed owned by `user_id`. Fails if the URL is already known.
    pub async fn create_feed(
        &self,
        user_id: i64,
        name: &str,
        url: &str,
    ) -> Result<Feed, StoreError> {
        let now = chrono::Utc::now().timestamp();
        let feed = sqlx::query_as(
            "INSERT INTO feeds (created_at, updated_at, name, url, user_id)
             VALUES (?, ?, ?, ?, ?) RETURNING *",
        )
        .bind(now)
        .bind(now)
        .bind(name)
        .bind(url)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(feed)
    }

    /// Look up a feed by its source URL.
    pub async fn get_feed_by_url(&self, url: &str) -> Result<Option<Feed>, StoreError> {
        let feed = sqlx::query_as("SELECT * FROM feeds WHERE url = ?")
            .bind(url)
            .fetch_optional(&self.pool)
            .await?;
        Ok(feed)
    }

    /// Every feed with its owner's name, for the `feeds` listing.
    pub async fn list_feeds_with_owners(&self) -> Result<Vec<FeedWithOwner>, StoreError> {
        let feeds = sqlx::query_as(
            r#"
            SELECT f.name AS name, f.url AS url, u.name AS user_name
            FROM feeds f
            JOIN users u ON u.id = f.user_id
            ORDER BY f.id
        "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(feeds)
    }

    /// The single most-overdue feed: never-fetched feeds first, then by
    /// oldest `last_fetched_at`. `None` when no feed exists.
    pub async fn next_feed_to_fetch(&self) -> Result<Option<Feed>, StoreError> {
        let feed = sqlx::query_as(
            "SELECT * FROM feeds ORDER BY last_fetched_at ASC NULLS FIRST, id ASC LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await?;
        Ok(feed)
    }

    /// Record a poll attempt by setting `last_fetched_at` to now. Idempotent;
    /// called after every attempt regardless of the fetch outcome.
    pub async fn mark_feed_fetched(&self, feed_id: i64) -> Result<(), StoreError> {
        let now = chrono::Utc::now().timestamp();
        sqlx::query("UPDATE feeds SET last_fetched_at = ?, updated_at = ? WHERE id = ?")
            .bind(now)
            .bind(now)
            .bind(feed_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    // ========================================================================
    // Follow Operations
    // ========================================================================

    /// Follow a feed for a user. Fails if the follow already exists.
    pub async fn follow_feed(&self, user_id: i64, feed_id: i64) -> Result<(), StoreError> {
        let now = chrono::Utc::now().timestamp();
        sqlx::query(
            "INSERT INTO feed_follows (created_at, updated_at, user_id, feed_id)
             VALUES (?, ?, ?, ?)",
        )
        .bind(now)
        .bind(now)
        .bind(user_id)
        .bind(feed_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Remove a user's follow of a feed. Returns whether a follow existed.
    pub async fn unfollow_feed(&self, user_id: i64, feed_id: i64) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM feed_follows WHERE user_id = ? AND feed_id = ?")
            .bind(user_id)
            .bind(feed_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Feeds the user follows, in follow order.
    pub async fn feeds_followed_by(&self, user_id: i64) -> Result<Vec<Feed>, StoreError> {
        let feeds = sqlx::query_as(
            r#"
            SELECT f.*
            FROM feeds f
            JOIN feed_follows ff ON ff.feed_id = f.id
            WHERE ff.user_id = ?
            ORDER BY ff.id
        "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(feeds)
    }
}
