//! End-to-end scheduler tests against a mock HTTP server and an in-memory
//! database: batch bounds, failure isolation, bookkeeping, and shutdown.

use std::time::Duration;

use pretty_assertions::assert_eq;
use tokio::sync::watch;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use creel::feed::build_client;
use creel::scheduler::{BatchSummary, Scheduler, MAX_FEEDS_PER_TICK};
use creel::storage::Database;

fn rss_body(feed_title: &str, items: &[(&str, &str, &str)]) -> String {
    let mut body = format!(
        "<rss version=\"2.0\"><channel><title>{}</title>\
         <link>https://example.com</link><description>test</description>",
        feed_title
    );
    for (title, link, pub_date) in items {
        body.push_str(&format!(
            "<item><title>{}</title><link>{}</link>\
             <description>body</description><pubDate>{}</pubDate></item>",
            title, link, pub_date
        ));
    }
    body.push_str("</channel></rss>");
    body
}

async fn mock_feed(server: &MockServer, route: &str, items: &[(&str, &str, &str)]) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(rss_body("Test Feed", items)),
        )
        .mount(server)
        .await;
}

async fn test_db_with_feeds(server: &MockServer, count: usize) -> Database {
    let db = Database::open(":memory:").await.unwrap();
    let user = db.create_user("alice").await.unwrap();
    for n in 0..count {
        db.create_feed(
            user.id,
            &format!("Feed {}", n),
            &format!("{}/feed{}", server.uri(), n),
        )
        .await
        .unwrap();
    }
    db
}

fn scheduler_for(db: &Database) -> Scheduler {
    Scheduler::new(db.clone(), build_client().unwrap(), Duration::from_secs(60))
        .with_pacing(Duration::ZERO)
}

async fn count_unfetched(db: &Database, server: &MockServer, feed_count: usize) -> usize {
    let mut unfetched = 0;
    for n in 0..feed_count {
        let feed = db
            .get_feed_by_url(&format!("{}/feed{}", server.uri(), n))
            .await
            .unwrap()
            .unwrap();
        if feed.last_fetched_at.is_none() {
            unfetched += 1;
        }
    }
    unfetched
}

#[tokio::test]
async fn test_batch_is_bounded_and_resumes_next_tick() {
    let server = MockServer::start().await;
    let db = test_db_with_feeds(&server, 15).await;
    for n in 0..15 {
        mock_feed(
            &server,
            &format!("/feed{}", n),
            &[("One", "https://example.com/1", "Mon, 02 Jan 2006 15:04:05 GMT")],
        )
        .await;
    }

    let scheduler = scheduler_for(&db);

    let summary = scheduler.run_batch().await;
    assert_eq!(summary.feeds_polled, MAX_FEEDS_PER_TICK);
    assert_eq!(summary.posts_created, MAX_FEEDS_PER_TICK);
    assert_eq!(
        count_unfetched(&db, &server, 15).await,
        5,
        "remaining feeds wait for the next tick"
    );

    // The next batch covers the rest
    let summary = scheduler.run_batch().await;
    assert_eq!(summary.feeds_polled, 5);
    assert_eq!(count_unfetched(&db, &server, 15).await, 0);
}

#[tokio::test]
async fn test_empty_database_yields_empty_batch() {
    let db = Database::open(":memory:").await.unwrap();
    let scheduler = scheduler_for(&db);
    assert_eq!(scheduler.run_batch().await, BatchSummary::default());
}

#[tokio::test]
async fn test_fetch_failure_does_not_stop_the_batch() {
    let server = MockServer::start().await;
    let db = test_db_with_feeds(&server, 2).await;

    // feed0 is broken, feed1 has one good item and one with a junk date
    Mock::given(method("GET"))
        .and(path("/feed0"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    mock_feed(
        &server,
        "/feed1",
        &[
            ("Good", "https://example.com/good", "Mon, 02 Jan 2006 15:04:05 GMT"),
            ("Bad", "https://example.com/bad", "sometime last week"),
        ],
    )
    .await;

    let summary = scheduler_for(&db).run_batch().await;
    assert_eq!(summary.feeds_polled, 2);
    assert_eq!(summary.fetch_failures, 1);
    assert_eq!(summary.posts_created, 1);
    assert_eq!(summary.items_skipped, 1);

    // Both feeds are bookkept regardless of outcome, so the broken feed
    // rotates to the back of the queue instead of being retried immediately.
    assert_eq!(count_unfetched(&db, &server, 2).await, 0);

    let good_feed = db
        .get_feed_by_url(&format!("{}/feed1", server.uri()))
        .await
        .unwrap()
        .unwrap();
    let posts = db.posts_for_feed(good_feed.id).await.unwrap();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].title, "Good");
}

#[tokio::test]
async fn test_refetch_inserts_duplicates_without_error() {
    let server = MockServer::start().await;
    let db = test_db_with_feeds(&server, 1).await;
    mock_feed(
        &server,
        "/feed0",
        &[("One", "https://example.com/1", "Mon, 02 Jan 2006 15:04:05 GMT")],
    )
    .await;

    let scheduler = scheduler_for(&db);
    scheduler.run_batch().await;
    let summary = scheduler.run_batch().await;
    assert_eq!(summary.posts_created, 1, "no duplicate suppression");

    let feed = db
        .get_feed_by_url(&format!("{}/feed0", server.uri()))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(db.posts_for_feed(feed.id).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_run_stops_on_shutdown_signal() {
    let db = Database::open(":memory:").await.unwrap();
    let scheduler = scheduler_for(&db);

    let (shutdown_tx, shutdown_rx) = watch::channel(());
    let handle = tokio::spawn(scheduler.run(shutdown_rx));

    shutdown_tx.send(()).unwrap();
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("scheduler did not stop after shutdown signal")
        .unwrap();
}

#[tokio::test]
async fn test_run_stops_when_shutdown_sender_dropped() {
    let db = Database::open(":memory:").await.unwrap();
    let scheduler = scheduler_for(&db);

    let (shutdown_tx, shutdown_rx) = watch::channel(());
    let handle = tokio::spawn(scheduler.run(shutdown_rx));

    drop(shutdown_tx);
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("scheduler did not stop after sender was dropped")
        .unwrap();
}
