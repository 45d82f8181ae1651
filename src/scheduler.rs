//! The aggregation scheduler: a tick-driven loop that polls due feeds in
//! bounded batches, normalizes item dates, persists new posts, and records
//! fetch bookkeeping.
//!
//! Failure isolation is the point of this module. A bad date skips one item,
//! a bad feed skips one feed, a store error at selection time ends one batch;
//! nothing here ever stops the loop. Shutdown is cooperative and is only
//! consulted between batches, never inside one.

use std::time::Duration;

use reqwest::Client;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

use crate::feed::{self, dates};
use crate::storage::{Database, NewPost};

/// Upper bound on feeds polled within one tick. Combined with the pacing
/// delay this caps the outbound request burst when many feeds are
/// simultaneously overdue, e.g. after a long downtime.
pub const MAX_FEEDS_PER_TICK: usize = 10;

/// Courtesy delay between consecutive outbound fetches within one batch.
pub const PACING_DELAY: Duration = Duration::from_secs(1);

/// Counts from one completed batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    /// Feeds selected and attempted this tick.
    pub feeds_polled: usize,
    /// Posts successfully persisted.
    pub posts_created: usize,
    /// Feeds whose fetch failed outright.
    pub fetch_failures: usize,
    /// Items dropped because their publish date did not parse.
    pub items_skipped: usize,
}

/// Drives periodic, bounded, failure-isolated polling of due feeds.
pub struct Scheduler {
    db: Database,
    client: Client,
    interval: Duration,
    pacing: Duration,
}

impl Scheduler {
    pub fn new(db: Database, client: Client, interval: Duration) -> Self {
        Self {
            db,
            client,
            interval,
            pacing: PACING_DELAY,
        }
    }

    /// Override the inter-feed pacing delay. Tests use this to avoid real
    /// one-second sleeps.
    #[must_use]
    pub fn with_pacing(mut self, pacing: Duration) -> Self {
        self.pacing = pacing;
        self
    }

    /// Run the polling loop until `shutdown` fires (or its sender is dropped).
    ///
    /// The first batch runs immediately; afterwards one batch runs per tick.
    /// The shutdown signal is only consulted here at the tick-boundary wait,
    /// so a batch that is already underway always completes first.
    pub async fn run(self, mut shutdown: watch::Receiver<()>) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let summary = self.run_batch().await;
                    tracing::info!(
                        feeds = summary.feeds_polled,
                        posts = summary.posts_created,
                        fetch_failures = summary.fetch_failures,
                        items_skipped = summary.items_skipped,
                        "batch complete"
                    );
                }
                _ = shutdown.changed() => {
                    tracing::info!("shutdown signal received, stopping aggregator");
                    return;
                }
            }
        }
    }

    /// Process one batch of due feeds, up to [`MAX_FEEDS_PER_TICK`].
    ///
    /// Each feed's bookkeeping is updated whether or not its fetch succeeds,
    /// so an unreachable feed cannot monopolize future batches.
    pub async fn run_batch(&self) -> BatchSummary {
        let mut summary = BatchSummary::default();

        for _ in 0..MAX_FEEDS_PER_TICK {
            let feed = match self.db.next_feed_to_fetch().await {
                Ok(Some(feed)) => feed,
                Ok(None) => break,
                Err(e) => {
                    // Treated like "no due feed": end the batch, wait for
                    // the next tick
                    tracing::error!(error = %e, "failed to select next feed, ending batch");
                    break;
                }
            };

            summary.feeds_polled += 1;
            tracing::info!(url = %feed.url, "fetching feed");

            match feed::fetch_feed(&self.client, &feed.url).await {
                Ok(parsed) => self.store_items(&feed, &parsed, &mut summary).await,
                Err(e) => {
                    summary.fetch_failures += 1;
                    tracing::error!(url = %feed.url, error = %e, "feed fetch failed");
                }
            }

            if let Err(e) = self.db.mark_feed_fetched(feed.id).await {
                tracing::error!(feed_id = feed.id, error = %e, "failed to update fetch bookkeeping");
            }

            tokio::time::sleep(self.pacing).await;
        }

        summary
    }

    async fn store_items(
        &self,
        feed: &crate::storage::Feed,
        parsed: &feed::ParsedFeed,
        summary: &mut BatchSummary,
    ) {
        for item in &parsed.items {
            let published_at = match dates::normalize(&item.pub_date) {
                Ok(instant) => instant.timestamp(),
                Err(e) => {
                    tracing::warn!(
                        feed = %feed.url,
                        item = %item.link,
                        error = %e,
                        "skipping item with unparseable publish date"
                    );
                    summary.items_skipped += 1;
                    continue;
                }
            };

            let post = NewPost {
                title: item.title.clone(),
                url: item.link.clone(),
                description: (!item.description.is_empty()).then(|| item.description.clone()),
                published_at,
            };

            match self.db.insert_post(feed.id, &post).await {
                Ok(_) => summary.posts_created += 1,
                Err(e) => {
                    tracing::error!(feed = %feed.url, item = %item.link, error = %e, "failed to insert post");
                }
            }
        }
    }
}
