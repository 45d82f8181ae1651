use super::db::Database;
use super::types::{NewPost, Post, StoreError};

impl Database {
    // ========================================================================
    // Post Operations
    // ========================================================================

    /// Append a post for a feed. No existence or uniqueness check is
    /// performed; re-fetching a feed may insert items already seen.
    pub async fn insert_post(&self, feed_id: i64, post: &NewPost) -> Result<Post, StoreError> {
        let now = chrono::Utc::now().timestamp();
        let post = sqlx::query_as(
            "INSERT INTO posts (created_at, updated_at, title, url, description, published_at, feed_id)
             VALUES (?, ?, ?, ?, ?, ?, ?) RETURNING *",
        )
        .bind(now)
        .bind(now)
        .bind(&post.title)
        .bind(&post.url)
        .bind(&post.description)
        .bind(post.published_at)
        .bind(feed_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(post)
    }

    /// All posts for one feed, newest published first.
    pub async fn posts_for_feed(&self, feed_id: i64) -> Result<Vec<Post>, StoreError> {
        let posts =
            sqlx::query_as("SELECT * FROM posts WHERE feed_id = ? ORDER BY published_at DESC")
                .bind(feed_id)
                .fetch_all(&self.pool)
                .await?;
        Ok(posts)
    }

    /// Recent posts from the feeds a user follows, newest published first.
    pub async fn posts_for_user(&self, user_id: i64, limit: i64) -> Result<Vec<Post>, StoreError> {
        let posts = sqlx::query_as(
            r#"
            SELECT p.*
            FROM posts p
            JOIN feed_follows ff ON ff.feed_id = p.feed_id
            WHERE ff.user_id = ?
            ORDER BY p.published_at DESC
            LIMIT ?
        "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(posts)
    }
}

#[cfg(test)]
mod tests {
    use crate::storage::{Database, NewPost};

    fn new_post(n: i64) -> NewPost {
        NewPost {
            title: format!("Post {}", n),
            url: format!("https://example.com/post{}", n),
            description: Some(format!("Body {}", n)),
            published_at: 1_700_000_000 + n,
        }
    }

    async fn db_with_followed_feed() -> (Database, i64, i64) {
        let db = Database::open(":memory:").await.unwrap();
        let user = db.create_user("alice").await.unwrap();
        let feed = db
            .create_feed(user.id, "Blog", "https://example.com/rss")
            .await
            .unwrap();
        db.follow_feed(user.id, feed.id).await.unwrap();
        (db, user.id, feed.id)
    }

    #[tokio::test]
    async fn test_insert_and_list_posts() {
        let (db, _, feed_id) = db_with_followed_feed().await;

        let post = db.insert_post(feed_id, &new_post(1)).await.unwrap();
        assert_eq!(post.title, "Post 1");
        assert_eq!(post.feed_id, feed_id);
        assert_eq!(post.description.as_deref(), Some("Body 1"));

        let posts = db.posts_for_feed(feed_id).await.unwrap();
        assert_eq!(posts.len(), 1);
    }

    #[tokio::test]
    async fn test_no_uniqueness_on_repeated_insert() {
        let (db, _, feed_id) = db_with_followed_feed().await;

        db.insert_post(feed_id, &new_post(1)).await.unwrap();
        db.insert_post(feed_id, &new_post(1)).await.unwrap();

        let posts = db.posts_for_feed(feed_id).await.unwrap();
        assert_eq!(posts.len(), 2, "insertion performs no duplicate check");
    }

    #[tokio::test]
    async fn test_browse_respects_limit_and_order() {
        let (db, user_id, feed_id) = db_with_followed_feed().await;

        for n in 0..5 {
            db.insert_post(feed_id, &new_post(n)).await.unwrap();
        }

        let posts = db.posts_for_user(user_id, 2).await.unwrap();
        assert_eq!(posts.len(), 2);
        assert_eq!(posts[0].title, "Post 4", "newest published first");
        assert_eq!(posts[1].title, "Post 3");
    }

    #[tokio::test]
    async fn test_browse_only_followed_feeds() {
        let (db, user_id, feed_id) = db_with_followed_feed().await;
        let other_owner = db.create_user("bob").await.unwrap();
        let other_feed = db
            .create_feed(other_owner.id, "Other", "https://other.example/rss")
            .await
            .unwrap();

        db.insert_post(feed_id, &new_post(1)).await.unwrap();
        db.insert_post(other_feed.id, &new_post(2)).await.unwrap();

        let posts = db.posts_for_user(user_id, 10).await.unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].feed_id, feed_id);
    }
}
