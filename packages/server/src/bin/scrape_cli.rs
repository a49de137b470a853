//! Operator CLI for the scrape dashboard backend.
//!
//! Talks to the configured record store directly. `run` executes the job
//! in-process and polls it to completion the same way the dashboard does.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use scrape_core::common::{ScrapeJobId, WebsiteId};
use scrape_core::domains::scraping::actions::{create_job, job_history, DEFAULT_HISTORY_LIMIT};
use scrape_core::domains::scraping::{
    Poller, PollerHandle, PollerState, ProgressView, StoreProgressSource,
};
use scrape_core::domains::websites::{seed_websites, SeedEntry};
use scrape_core::kernel::{store, BaseScrapeStore, ServerDeps, SimpleScraper, StreamHub};
use scrape_core::Config;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "scrape_cli")]
#[command(about = "Scrape dashboard operator CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List websites available for scraping
    Websites,

    /// Add websites from a JSON file (array of URLs or {name, url, description})
    Seed { file: String },

    /// Create a scrape job and poll it until it finishes
    Run {
        #[arg(required = true)]
        website_ids: Vec<WebsiteId>,
    },

    /// Show recent jobs
    History {
        #[arg(long, default_value_t = DEFAULT_HISTORY_LIMIT)]
        limit: usize,
    },

    /// Poll an existing job until it finishes
    Watch { job_id: ScrapeJobId },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn,scrape_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = Config::from_env().context("Failed to load configuration")?;
    let store = store::connect(&config.store)
        .await
        .context("Failed to connect to record store")?;

    match cli.command {
        Commands::Websites => {
            let websites = store.list_websites().await?;
            for website in &websites {
                println!("{}  {:<24} {}", website.id, website.name, website.url);
            }
            println!("{} websites", websites.len());
        }

        Commands::Seed { file } => {
            let raw = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read seed file {}", file))?;
            let entries: Vec<SeedEntry> =
                serde_json::from_str(&raw).context("Failed to parse seed file")?;

            let report = seed_websites(store.as_ref(), entries).await?;
            println!(
                "✓ Added {}, skipped {} existing, {} invalid",
                report.added, report.skipped, report.invalid
            );
        }

        Commands::Run { website_ids } => {
            let scraper = SimpleScraper::new(config.settings.scrape_timeout)
                .context("Failed to build HTTP scraper")?;
            let deps = ServerDeps::new(
                store.clone(),
                Arc::new(scraper),
                StreamHub::new(),
                config.settings,
            );

            let job = create_job(&website_ids, &deps).await?;
            println!("Started job {}", job.id);

            let poller = Poller::new(
                Arc::new(StoreProgressSource::new(store)),
                config.settings.poll_interval,
            );
            follow(poller.start(job.id)).await;
        }

        Commands::History { limit } => {
            for summary in job_history(store.as_ref(), limit).await? {
                println!(
                    "{}  {:<11} {}  sites {}/{} ok, {} failed  items {}",
                    summary.job_id,
                    summary.status,
                    summary.started_at.format("%Y-%m-%d %H:%M:%S"),
                    summary.sites_succeeded,
                    summary.sites_total,
                    summary.sites_failed,
                    summary.items_found,
                );
            }
        }

        Commands::Watch { job_id } => {
            let poller = Poller::new(
                Arc::new(StoreProgressSource::new(store)),
                config.settings.poll_interval,
            );
            follow(poller.start(job_id)).await;
        }
    }

    Ok(())
}

/// Print each new view until the poller stops.
async fn follow(handle: PollerHandle) {
    let mut rx = handle.subscribe();
    let mut last_percent = None;

    loop {
        let state = rx.borrow_and_update().clone();
        match &state {
            PollerState::Polling { latest: Some(view) } => {
                if last_percent != Some(view.progress_percent) {
                    print_progress(view);
                    last_percent = Some(view.progress_percent);
                }
            }
            PollerState::Polling { latest: None } => {}
            PollerState::Terminal { view } => {
                print_progress(view);
                for task in &view.tasks {
                    println!(
                        "  {:<24} {:<11} {}",
                        task.website_name.as_deref().unwrap_or("?"),
                        task.status.as_str(),
                        task.display_text
                    );
                }
                println!("Job {} {}", view.job_id, view.job_status);
                break;
            }
            PollerState::Idle => break,
        }

        if rx.changed().await.is_err() {
            break;
        }
    }

    handle.join().await;
}

fn print_progress(view: &ProgressView) {
    println!(
        "[{:>5.1}%] {}/{} sites done ({} ok, {} failed)",
        view.progress_percent,
        view.counts.completed,
        view.counts.total,
        view.counts.success,
        view.counts.failed,
    );
}
