//! SQLite-backed persistence for users, feeds, follows, and posts.
//!
//! The scheduler consumes three operations from here: [`Database::next_feed_to_fetch`],
//! [`Database::mark_feed_fetched`], and [`Database::insert_post`]. Everything
//! else serves the CLI commands.

mod db;
mod feeds;
mod posts;
mod types;
mod users;

pub use db::Database;
pub use types::{Feed, FeedWithOwner, NewPost, Post, StoreError, User};
