use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

use creel::commands::Session;
use creel::config::Config;
use creel::storage::Database;

/// Get the config directory path (~/.config/creel/)
fn get_config_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    Ok(PathBuf::from(home).join(".config").join("creel"))
}

#[derive(Parser, Debug)]
#[command(name = "creel", about = "Command-line RSS feed aggregator", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a new user and log in
    Register { name: String },
    /// Switch to an existing user
    Login { name: String },
    /// List all users
    Users,
    /// Delete all users, feeds, and posts
    Reset,
    /// Add a feed and follow it
    Addfeed { name: String, url: String },
    /// List every known feed
    Feeds,
    /// Follow an existing feed
    Follow { url: String },
    /// List feeds you follow
    Following,
    /// Stop following a feed
    Unfollow { url: String },
    /// Show recent posts from feeds you follow
    Browse {
        #[arg(default_value_t = 2)]
        limit: i64,
    },
    /// Run the aggregation loop, polling feeds at the given interval (e.g. "1m", "30s")
    Agg {
        #[arg(value_parser = humantime::parse_duration)]
        interval: Duration,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let config_dir = get_config_dir()?;
    std::fs::create_dir_all(&config_dir).context("Failed to create config directory")?;
    let config_path = config_dir.join("config.toml");
    let config = Config::load(&config_path)?;

    let db_path = config
        .database_path
        .clone()
        .unwrap_or_else(|| config_dir.join("creel.db"));
    let db_path_str = db_path
        .to_str()
        .context("Invalid UTF-8 in database path")?;
    let db = Database::open(db_path_str)
        .await
        .context("Failed to open database")?;

    let mut session = Session {
        db,
        config,
        config_path,
    };

    match cli.command {
        Command::Register { name } => session.register(&name).await,
        Command::Login { name } => session.login(&name).await,
        Command::Users => session.users().await,
        Command::Reset => session.reset().await,
        Command::Addfeed { name, url } => session.addfeed(&name, &url).await,
        Command::Feeds => session.feeds().await,
        Command::Follow { url } => session.follow(&url).await,
        Command::Following => session.following().await,
        Command::Unfollow { url } => session.unfollow(&url).await,
        Command::Browse { limit } => session.browse(limit).await,
        Command::Agg { interval } => session.aggregate(interval).await,
    }
}
