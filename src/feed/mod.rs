//! Feed retrieval and normalization.
//!
//! - [`fetcher`] - single-shot HTTP retrieval with a fixed deadline
//! - [`parser`] - structural RSS parsing tolerant of common HTML entities
//! - [`dates`] - ordered fallback parsing of heterogeneous publish dates

pub mod dates;
mod fetcher;
mod parser;

pub use dates::DateParseError;
pub use fetcher::{build_client, fetch_feed, FetchError, FETCH_TIMEOUT, USER_AGENT};
pub use parser::{parse_feed, FeedParseError, ParsedFeed, ParsedItem};
