//! HTTP retrieval of feed documents.

use std::time::Duration;

use reqwest::Client;
use thiserror::Error;
use url::Url;

use super::parser::{self, FeedParseError, ParsedFeed};

/// Per-request deadline covering the entire exchange, headers and body both.
/// A remote server that stalls longer than this counts as a fetch failure for
/// the current cycle.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(15);

/// Identifying User-Agent sent with every feed request.
pub const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Errors that can occur while fetching one feed. Each stage of the fetch
/// surfaces its own variant; none of them are retried here.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The feed URL could not be parsed, so no request was made.
    #[error("invalid feed URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Network-level error (DNS, connection, TLS, ...).
    #[error("request failed: {0}")]
    Network(reqwest::Error),

    /// The request exceeded [`FETCH_TIMEOUT`].
    #[error("request timed out")]
    Timeout,

    /// Non-2xx HTTP status. The body is not read or parsed.
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),

    /// The response body could not be read.
    #[error("failed to read response body: {0}")]
    Body(reqwest::Error),

    /// The body is not a well-formed channel/item document.
    #[error(transparent)]
    Parse(#[from] FeedParseError),
}

/// Builds the shared HTTP client used by the scheduler.
pub fn build_client() -> Result<Client, reqwest::Error> {
    Client::builder().user_agent(USER_AGENT).build()
}

/// Performs a single GET of `feed_url` and parses the response into a
/// [`ParsedFeed`].
///
/// # Errors
///
/// Returns a distinct [`FetchError`] variant for URL, transport, timeout,
/// HTTP-status, body-read, and parse failures. Non-2xx statuses are hard
/// failures; the body is not inspected.
pub async fn fetch_feed(client: &Client, feed_url: &str) -> Result<ParsedFeed, FetchError> {
    fetch_with_deadline(client, feed_url, FETCH_TIMEOUT).await
}

/// A slow body read must not escape the deadline, so the timeout wraps the
/// whole exchange rather than just `send()`.
async fn fetch_with_deadline(
    client: &Client,
    feed_url: &str,
    deadline: Duration,
) -> Result<ParsedFeed, FetchError> {
    let url = Url::parse(feed_url)?;

    let body = tokio::time::timeout(deadline, async {
        let response = client.get(url).send().await.map_err(FetchError::Network)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus(status.as_u16()));
        }

        response.text().await.map_err(FetchError::Body)
    })
    .await
    .map_err(|_| FetchError::Timeout)??;

    Ok(parser::parse_feed(&body)?)
}
