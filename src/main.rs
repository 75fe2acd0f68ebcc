//! tweetcontext CLI entry point.

use anyhow::Context as _;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use std::sync::Arc;
use tweetcontext::messaging::{DiscordAdapter, Messaging as _};
use tweetcontext::posts::TwitterClient;

#[derive(Parser)]
#[command(name = "tweetcontext")]
#[command(about = "Replies to Twitter links with the posts they quote or reply to")]
struct Cli {
    /// Path to config file (optional)
    #[arg(short, long)]
    config: Option<std::path::PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins over the --debug default
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.debug {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        }
    });

    tracing_subscriber::fmt().with_env_filter(filter).init();

    tracing::info!("starting tweetcontext");

    let config = if let Some(config_path) = cli.config {
        tweetcontext::config::Config::load_from_path(&config_path)
            .with_context(|| format!("failed to load config from {}", config_path.display()))?
    } else {
        tweetcontext::config::Config::load()
            .with_context(|| "failed to load configuration")?
    };

    tracing::info!(
        max_depth = %config.max_depth,
        max_urls_per_message = %config.max_urls_per_message,
        include_replies = config.include_replies,
        cache_ttl_secs = config.cache.ttl_secs,
        cache_max_entries = config.cache.max_entries,
        "configuration loaded"
    );

    let discord = Arc::new(DiscordAdapter::new(config.discord_token.clone()));
    let twitter = Arc::new(TwitterClient::new(config.twitter_bearer_token.clone()));
    let bot = Arc::new(tweetcontext::ContextBot::new(config, discord.clone(), twitter));

    let event_loop = tokio::spawn(bot.run());

    tokio::select! {
        result = event_loop => {
            match result {
                Ok(Ok(())) => tracing::info!("event loop ended"),
                Ok(Err(error)) => tracing::error!(%error, "event loop failed"),
                Err(error) => tracing::error!(%error, "event loop panicked"),
            }
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("shutdown signal received");
        }
    }

    tracing::info!("shutting down...");
    discord
        .shutdown()
        .await
        .with_context(|| "failed to shut down discord adapter")?;

    tracing::info!("tweetcontext stopped");
    Ok(())
}
