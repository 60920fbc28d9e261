mod engine;
mod manual;
mod server;

use chanfeed_channels::telegram::TelegramChannel;
use chanfeed_core::config::{self, Config, FetchMode, StoreBackend};
use chanfeed_core::traits::{ImageHost, MessageSource, Notifier, SnapshotSink};
use chanfeed_publish::{ImgbbClient, NotifyClient, SnapshotPublisher};
use clap::{Parser, Subcommand};
use engine::SyncEngine;
use std::sync::Arc;

#[derive(Parser)]
#[command(
    name = "chanfeed",
    version,
    about = "Telegram channel to public feed batch sync"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to config file.
    #[arg(short, long, default_value = "config.toml")]
    config: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one reconciliation pass.
    Sync {
        /// Override the fetch window size.
        #[arg(long)]
        limit: Option<usize>,
        /// Only reconcile messages dated today (calendar-day mode).
        #[arg(long)]
        today: bool,
    },
    /// Serve the HTTP trigger endpoint for an external scheduler.
    Serve {
        #[arg(long, default_value = "0.0.0.0:8080")]
        bind: String,
    },
    /// Re-send the notification for the newest published post.
    Push,
    /// Re-sort a local posts.json by descending id.
    SortFile {
        /// Path to the snapshot file.
        path: String,
    },
    /// Show which integrations are configured.
    Status,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    match cli.command {
        Commands::Sync { limit, today } => {
            let mut cfg = config::load(&cli.config)?;
            if let Some(limit) = limit {
                cfg.sync.fetch_limit = limit;
            }
            if today {
                cfg.sync.mode = FetchMode::Today;
            }
            cfg.validate()?;

            let engine = build_engine(&cfg).await?;
            let outcome = engine.run().await?;
            println!(
                "sync complete: {} candidates, {} images resolved, {} posts total{}",
                outcome.candidates,
                outcome.images_resolved,
                outcome.total_posts,
                if outcome.notified {
                    ", notification sent"
                } else {
                    ""
                }
            );
        }
        Commands::Serve { bind } => {
            let cfg = config::load(&cli.config)?;
            cfg.validate()?;
            let engine = Arc::new(build_engine(&cfg).await?);
            server::serve(engine, &bind).await?;
        }
        Commands::Push => {
            let cfg = config::load(&cli.config)?;
            manual::push_latest(&cfg).await?;
            println!("push sent.");
        }
        Commands::SortFile { path } => {
            let count = manual::sort_file(&path)?;
            println!("{path} sorted, {count} posts.");
        }
        Commands::Status => {
            let cfg = config::load(&cli.config)?;
            print_status(&cfg, &cli.config);
        }
    }

    Ok(())
}

/// Wire the engine from config: real channel, configured store backend,
/// image host, and the optional snapshot/notification sinks.
async fn build_engine(cfg: &Config) -> anyhow::Result<SyncEngine> {
    let source: Arc<dyn MessageSource> =
        Arc::new(TelegramChannel::new(cfg.channel.clone(), cfg.sync.tz()));
    let store = chanfeed_store::build(&cfg.store).await?;
    let images: Arc<dyn ImageHost> = Arc::new(ImgbbClient::new(cfg.imagehost.clone()));
    let snapshot: Option<Arc<dyn SnapshotSink>> = cfg
        .snapshot
        .enabled
        .then(|| Arc::new(SnapshotPublisher::new(cfg.snapshot.clone())) as Arc<dyn SnapshotSink>);
    let notifier: Option<Arc<dyn Notifier>> = cfg
        .notify
        .enabled
        .then(|| Arc::new(NotifyClient::new(cfg.notify.clone())) as Arc<dyn Notifier>);

    Ok(SyncEngine::new(
        &cfg.sync,
        source,
        Arc::from(store),
        images,
        snapshot,
        notifier,
    ))
}

fn print_status(cfg: &Config, path: &str) {
    println!("chanfeed — status\n");
    println!("Config: {path}");
    println!(
        "  channel: {}",
        if cfg.channel.bot_token.is_empty() {
            "missing bot_token".to_string()
        } else if cfg.channel.channel.is_empty() {
            "missing channel".to_string()
        } else {
            format!("{} via {}", cfg.channel.channel, cfg.channel.gateway_url)
        }
    );
    println!(
        "  image host: {}",
        if cfg.imagehost.api_key.is_empty() {
            "missing api_key"
        } else {
            "configured"
        }
    );
    let backend = match cfg.store.backend {
        StoreBackend::Sqlite => format!("sqlite at {}", cfg.store.db_path),
        StoreBackend::File => format!("file at {}", cfg.store.file_path),
    };
    println!("  store: {backend}");
    println!(
        "  snapshot: {}",
        if !cfg.snapshot.enabled {
            "disabled".to_string()
        } else if cfg.snapshot.bucket.is_empty() {
            "enabled but missing bucket".to_string()
        } else {
            format!("bucket {}", cfg.snapshot.bucket)
        }
    );
    println!(
        "  notify: {}",
        if !cfg.notify.enabled {
            "disabled"
        } else if cfg.notify.base_url.is_empty() {
            "enabled but missing base_url"
        } else {
            "configured"
        }
    );
}
