use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Errors from the backing store. Nothing here is fatal to the aggregation
/// loop; callers decide whether to end a batch or just log and continue.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("database migration failed: {0}")]
    Migration(String),
}

// ============================================================================
// Data Structures
// ============================================================================

/// A registered user. `name` is unique.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub created_at: i64,
    pub updated_at: i64,
    pub name: String,
}

/// A subscribed syndication source.
///
/// `last_fetched_at` is the fetch bookkeeping: `None` means never fetched,
/// which ranks the feed first for selection. It is updated on every poll
/// attempt regardless of the fetch outcome.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Feed {
    pub id: i64,
    pub created_at: i64,
    pub updated_at: i64,
    pub name: String,
    pub url: String,
    pub user_id: i64,
    pub last_fetched_at: Option<i64>,
}

/// A persisted entry derived from one feed item. Created exclusively by the
/// scheduler; never mutated afterwards.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Post {
    pub id: i64,
    pub created_at: i64,
    pub updated_at: i64,
    pub title: String,
    pub url: String,
    pub description: Option<String>,
    pub published_at: i64,
    pub feed_id: i64,
}

/// Post fields supplied by the scheduler when persisting a feed item.
#[derive(Debug, Clone)]
pub struct NewPost {
    pub title: String,
    pub url: String,
    pub description: Option<String>,
    /// Normalized publish instant, epoch seconds UTC.
    pub published_at: i64,
}

/// A feed joined with its owner's name, for the `feeds` listing.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct FeedWithOwner {
    pub name: String,
    pub url: String,
    pub user_name: String,
}
