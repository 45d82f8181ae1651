//! CLI command handlers.
//!
//! Each handler maps one subcommand onto the storage layer and prints its
//! result for the terminal. State shared between commands (the open database,
//! the loaded config and where to write it back) lives in [`Session`].

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use chrono::{TimeZone, Utc};
use tokio::sync::watch;

use crate::config::Config;
use crate::feed;
use crate::scheduler::Scheduler;
use crate::storage::{Database, User};

/// Everything a command handler needs: the open database plus the config and
/// the path it was loaded from, so login state can be written back.
pub struct Session {
    pub db: Database,
    pub config: Config,
    pub config_path: PathBuf,
}

impl Session {
    /// The logged-in user, resolved against the database. Errors if nobody is
    /// logged in or the configured user no longer exists (e.g. after `reset`).
    async fn current_user(&self) -> Result<User> {
        let name = self
            .config
            .current_user
            .as_deref()
            .context("not logged in; run `creel login <name>` first")?;
        self.db
            .get_user_by_name(name)
            .await?
            .with_context(|| format!("logged-in user '{}' no longer exists; log in again", name))
    }

    fn set_current_user(&mut self, name: &str) -> Result<()> {
        self.config.current_user = Some(name.to_string());
        self.config.save(&self.config_path)?;
        Ok(())
    }

    // ========================================================================
    // User Commands
    // ========================================================================

    /// `register <name>`: create the user and log them in.
    pub async fn register(&mut self, name: &str) -> Result<()> {
        if self.db.get_user_by_name(name).await?.is_some() {
            bail!("user '{}' already exists", name);
        }
        let user = self.db.create_user(name).await?;
        self.set_current_user(&user.name)?;
        println!("User '{}' created and logged in.", user.name);
        Ok(())
    }

    /// `login <name>`: switch the current user. The user must exist.
    pub async fn login(&mut self, name: &str) -> Result<()> {
        let user = self
            .db
            .get_user_by_name(name)
            .await?
            .with_context(|| format!("user '{}' does not exist; register first", name))?;
        self.set_current_user(&user.name)?;
        println!("Logged in as '{}'.", user.name);
        Ok(())
    }

    /// `users`: list all users, marking the current one.
    pub async fn users(&self) -> Result<()> {
        let current = self.config.current_user.as_deref();
        for user in self.db.list_users().await? {
            if Some(user.name.as_str()) == current {
                println!("* {} (current)", user.name);
            } else {
                println!("* {}", user.name);
            }
        }
        Ok(())
    }

    /// `reset`: delete all users; feeds, follows, and posts cascade.
    pub async fn reset(&self) -> Result<()> {
        self.db.delete_all_users().await?;
        println!("Database reset.");
        Ok(())
    }

    // ========================================================================
    // Feed Commands
    // ========================================================================

    /// `addfeed <name> <url>`: register a feed owned by the current user and
    /// follow it immediately.
    pub async fn addfeed(&self, name: &str, url: &str) -> Result<()> {
        url::Url::parse(url).with_context(|| format!("'{}' is not a valid URL", url))?;

        let user = self.current_user().await?;
        if self.db.get_feed_by_url(url).await?.is_some() {
            bail!("a feed with URL '{}' already exists", url);
        }
        let feed = self.db.create_feed(user.id, name, url).await?;
        self.db.follow_feed(user.id, feed.id).await?;
        println!("Feed '{}' added and followed.", feed.name);
        Ok(())
    }

    /// `feeds`: list every known feed with its owner.
    pub async fn feeds(&self) -> Result<()> {
        for feed in self.db.list_feeds_with_owners().await? {
            println!("* {} ({}) added by {}", feed.name, feed.url, feed.user_name);
        }
        Ok(())
    }

    /// `follow <url>`: follow an already-registered feed.
    pub async fn follow(&self, url: &str) -> Result<()> {
        let user = self.current_user().await?;
        let feed = self
            .db
            .get_feed_by_url(url)
            .await?
            .with_context(|| format!("no feed with URL '{}'; add it with `creel addfeed`", url))?;
        self.db.follow_feed(user.id, feed.id).await?;
        println!("Now following '{}'.", feed.name);
        Ok(())
    }

    /// `following`: list the current user's followed feeds.
    pub async fn following(&self) -> Result<()> {
        let user = self.current_user().await?;
        for feed in self.db.feeds_followed_by(user.id).await? {
            println!("* {}", feed.name);
        }
        Ok(())
    }

    /// `unfollow <url>`: drop the current user's follow of a feed.
    pub async fn unfollow(&self, url: &str) -> Result<()> {
        let user = self.current_user().await?;
        let feed = self
            .db
            .get_feed_by_url(url)
            .await?
            .with_context(|| format!("no feed with URL '{}'", url))?;
        if self.db.unfollow_feed(user.id, feed.id).await? {
            println!("Unfollowed '{}'.", feed.name);
        } else {
            println!("You were not following '{}'.", feed.name);
        }
        Ok(())
    }

    /// `browse [limit]`: show recent posts from followed feeds.
    pub async fn browse(&self, limit: i64) -> Result<()> {
        let user = self.current_user().await?;
        let posts = self.db.posts_for_user(user.id, limit).await?;
        if posts.is_empty() {
            println!("No posts yet. Follow some feeds and run `creel agg`.");
            return Ok(());
        }
        for post in posts {
            let published = Utc
                .timestamp_opt(post.published_at, 0)
                .single()
                .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_else(|| post.published_at.to_string());
            println!("{} - {}", published, post.title);
            println!("  {}", post.url);
            if let Some(description) = &post.description {
                println!("  {}", description);
            }
        }
        Ok(())
    }

    // ========================================================================
    // Aggregation
    // ========================================================================

    /// `agg <interval>`: run the polling loop until Ctrl+C or SIGTERM.
    pub async fn aggregate(&self, interval: Duration) -> Result<()> {
        println!("Collecting feeds every {:?}. Press Ctrl+C to stop.", interval);

        let client = feed::build_client()?;
        let scheduler = Scheduler::new(self.db.clone(), client, interval);

        let (shutdown_tx, shutdown_rx) = watch::channel(());
        tokio::spawn(async move {
            if let Err(e) = wait_for_shutdown_signal().await {
                tracing::error!(error = %e, "failed to listen for shutdown signals");
                return;
            }
            let _ = shutdown_tx.send(());
        });

        scheduler.run(shutdown_rx).await;
        println!("Aggregator stopped.");
        Ok(())
    }
}

/// Resolves on Ctrl+C or, on Unix, SIGTERM.
async fn wait_for_shutdown_signal() -> std::io::Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = signal(SignalKind::terminate())?;
        tokio::select! {
            r = tokio::signal::ctrl_c() => r,
            _ = sigterm.recv() => Ok(()),
        }
    }
    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await
    }
}
