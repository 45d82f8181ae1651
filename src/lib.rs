//! creel — a command-line feed aggregator.
//!
//! Users register, subscribe to RSS feeds, and run `creel agg <interval>` to
//! start a polling loop that fetches due feeds, normalizes entry dates, and
//! stores new posts in a local SQLite database for `creel browse`.

pub mod commands;
pub mod config;
pub mod feed;
pub mod scheduler;
pub mod storage;
