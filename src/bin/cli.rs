//! sismiq CLI
//!
//! Local entry point: one-shot fetch, periodic watch, offline parsing and the
//! relay endpoint.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use sismiq::{
    error::{AppError, Result},
    models::{Config, FeedSource},
    pipeline::{self, RefreshController, RefreshOutcome},
    services::{ConsoleNotifier, FeedParser, Notifier, relay},
    storage::cache_from_config,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

/// sismiq - recent earthquakes from KOERI
#[derive(Parser, Debug)]
#[command(
    name = "sismiq",
    version,
    about = "Recent earthquake tracker for the KOERI feed"
)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "storage/config.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run one refresh cycle and print the list
    Fetch,

    /// Refresh at startup and on every interval; press Enter to refresh now
    Watch,

    /// Parse a saved report page or text file
    Parse {
        /// File holding the report
        file: PathBuf,

        /// Print records as JSON instead of the list view
        #[arg(long)]
        json: bool,
    },

    /// Serve the same-origin relay endpoint
    #[cfg(feature = "relay")]
    ServeRelay,

    /// Validate the configuration file
    Validate,

    /// Show configuration and cached snapshot info
    Info,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

fn console(config: &Config) -> Arc<dyn Notifier> {
    Arc::new(ConsoleNotifier::new(
        config.display.clone(),
        config.zones.clone(),
    ))
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = Config::load_or_default(&cli.config);

    match cli.command {
        Command::Fetch => {
            config.validate()?;
            let controller = RefreshController::from_config(&config, console(&config))?;

            match controller.refresh().await {
                RefreshOutcome::Failed { cause, .. } => return Err(AppError::Refresh(cause)),
                outcome => log::debug!("Refresh outcome: {outcome:?}"),
            }
        }

        Command::Watch => {
            config.validate()?;
            let controller = Arc::new(RefreshController::from_config(&config, console(&config))?);
            let interval = Duration::from_secs(config.refresh.interval_secs);

            let (tx, rx) = mpsc::channel(1);
            tokio::spawn(async move {
                let mut lines = BufReader::new(tokio::io::stdin()).lines();
                while let Ok(Some(_)) = lines.next_line().await {
                    // A full channel means a trigger is already pending.
                    let _ = tx.try_send(());
                }
            });

            log::info!("Watching for earthquakes. Press Enter to refresh, Ctrl-C to quit.");
            pipeline::run_scheduler(controller, interval, rx, async {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    log::error!("Failed to listen for Ctrl-C: {e}");
                    std::future::pending::<()>().await;
                }
            })
            .await;
        }

        Command::Parse { file, json } => {
            let bytes = tokio::fs::read(&file).await?;
            let text = relay::extract_payload(&relay::normalize(&bytes));
            let records = FeedParser::from_config(&config)?.parse(&text);
            log::info!("Parsed {} records from {}", records.len(), file.display());

            if json {
                println!("{}", serde_json::to_string_pretty(&records)?);
            } else {
                console(&config).publish(&records);
            }
        }

        #[cfg(feature = "relay")]
        Command::ServeRelay => {
            config.validate()?;
            sismiq::server::serve(&config).await?;
        }

        Command::Validate => {
            log::info!("Validating configuration...");

            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            log::info!("✓ Config OK ({} zones)", config.zones.len());
        }

        Command::Info => {
            log::info!("Config file: {}", cli.config.display());
            match config.feed.source {
                FeedSource::Relay => log::info!("Feed source: relay at {}", config.feed.relay_url),
                FeedSource::Direct => {
                    log::info!("Feed source: direct from {}", config.feed.upstream_url)
                }
            }
            log::info!("Refresh interval: {}s", config.refresh.interval_secs);

            match cache_from_config(&config.cache).load().await {
                Some(snapshot) => log::info!(
                    "Cached snapshot: {} records from {}",
                    snapshot.count,
                    snapshot.fetched_at.to_rfc3339()
                ),
                None => log::info!("No cached snapshot found yet."),
            }
        }
    }

    Ok(())
}
