//! Profit Board
//!
//! Command-line dashboard for the profit feed: headline statistics, the
//! paginated feed with its filters, per-service and per-worker breakdowns,
//! the worker roster, profit submission and CSV export.

mod config;
mod logging;
mod reports;

use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

use config::{Config, FileConfig, Overrides};
use profit_core::{
    constants, Dashboard, FilterKind, HttpApi, IdentityResolver, LoadOutcome, StaticContext,
    SubmissionDraft,
};

/// Default config file path
const CONFIG_FILE: &str = "profit-board.toml";

#[derive(Parser, Debug)]
#[command(name = "profit-board")]
#[command(about = "Statistics and feed for the profit tracker")]
struct Args {
    /// Config file (defaults apply when it does not exist)
    #[arg(short, long, default_value = CONFIG_FILE, global = true)]
    config: PathBuf,

    /// Backend base URL (overrides [api] base_url)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Use the built-in demo data instead of the backend
    #[arg(long, global = true)]
    offline: bool,

    /// Log filter, e.g. "debug" or "profit_core=debug"
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Records per page (overrides [dashboard] page_size)
    #[arg(long, global = true)]
    page_size: Option<usize>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the profit feed
    Feed {
        /// all, today or top
        #[arg(long, default_value_t = FilterKind::All)]
        filter: FilterKind,

        /// Number of pages to load
        #[arg(long, default_value_t = 1)]
        pages: usize,
    },

    /// Show total amount, worker and profit counts
    Stats,

    /// Breakdown by service
    Services,

    /// Worker roster with per-worker totals
    Workers,

    /// Record a new profit
    Submit {
        /// Amount, e.g. "5.400" or "1.234,50"
        #[arg(long)]
        amount: String,

        /// Worker share in percent
        #[arg(long, default_value_t = constants::DEFAULT_WORKER_PERCENT, value_parser = clap::value_parser!(u32).range(0..=100))]
        percent: u32,

        /// Service name
        #[arg(long)]
        service: String,

        /// Worker handle (with or without @)
        #[arg(long)]
        worker: String,
    },

    /// Resolve a worker handle and register it with the backend. Without a
    /// handle, reads handles from stdin and looks each up once typing pauses.
    Worker {
        /// Worker handle (with or without @)
        handle: Option<String>,
    },

    /// Export the feed to a CSV file (loads every page)
    Export {
        /// all, today or top
        #[arg(long, default_value_t = FilterKind::All)]
        filter: FilterKind,

        /// Path to output CSV file
        #[arg(long)]
        out: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let file_config = FileConfig::load_or_default(&args.config)?;
    let config = Config::from_file(
        file_config,
        Overrides {
            api_url: args.api_url,
            offline: args.offline,
            log_level: args.log_level,
            page_size: args.page_size,
        },
    )?;

    logging::init_tracing(&config.log_level, &config.log_format);
    debug!(
        api_url = config.api_url.as_deref().unwrap_or("offline"),
        page_size = config.page_size,
        "configuration loaded"
    );

    let mut dashboard = build_dashboard(&config)?;

    // No subcommand - show the summary
    let command = args.command.unwrap_or(Command::Stats);
    handle_command(command, &mut dashboard, &config).await
}

fn build_dashboard(config: &Config) -> Result<Dashboard> {
    let resolver = Arc::new(IdentityResolver::new(StaticContext(config.init_data.clone())));

    match &config.api_url {
        Some(url) => {
            let api = HttpApi::new(url, config.timeout).context("Failed to build HTTP client")?;
            Ok(Dashboard::new(Arc::new(api), resolver, config.page_size))
        }
        None => Ok(Dashboard::offline(resolver, config.page_size)),
    }
}

/// Refresh and load up to `pages` pages (`None` loads everything)
async fn load_pages(dashboard: &mut Dashboard, pages: Option<usize>) {
    if let LoadOutcome::Failed(msg) = dashboard.refresh().await {
        eprintln!("Could not load profits: {}", msg);
        return;
    }

    let mut loaded = 1;
    while pages.is_none_or(|max| loaded < max) {
        match dashboard.load_more().await {
            LoadOutcome::Loaded(_) => loaded += 1,
            LoadOutcome::Failed(msg) => {
                eprintln!("Could not load more profits: {}", msg);
                break;
            }
            LoadOutcome::Empty | LoadOutcome::Exhausted => break,
        }
    }
}

async fn handle_command(command: Command, dashboard: &mut Dashboard, config: &Config) -> Result<()> {
    let currency = config.currency.as_str();

    match command {
        Command::Feed { filter, pages } => {
            load_pages(dashboard, Some(pages.max(1))).await;
            dashboard.set_filter(filter);

            let view = dashboard.view(&Local::now());
            reports::print_feed(&view, filter, currency);
            if dashboard.store().has_more() {
                println!("\nMore profits available, use --pages {}", pages.max(1) + 1);
            }
            Ok(())
        }

        Command::Stats => {
            load_pages(dashboard, Some(1)).await;
            reports::print_stats(&dashboard.overview(), currency);
            if dashboard.is_offline() {
                println!("(demo data)");
            }
            Ok(())
        }

        Command::Services => {
            load_pages(dashboard, None).await;
            reports::print_breakdown("Service", &dashboard.service_breakdown(), currency);
            Ok(())
        }

        Command::Workers => {
            load_pages(dashboard, None).await;
            let cards = dashboard
                .worker_cards()
                .await
                .context("Failed to load workers")?;
            reports::print_workers(&cards, currency);
            Ok(())
        }

        Command::Submit {
            amount,
            percent,
            service,
            worker,
        } => {
            load_pages(dashboard, Some(1)).await;

            let draft = SubmissionDraft {
                amount,
                worker_percent: percent,
                service,
                worker,
            };
            let record = dashboard
                .submit(&draft)
                .await
                .context("Failed to submit profit")?;

            println!(
                "Profit added: {} from {} via {} ({})",
                reports::money(record.amount, currency),
                record.worker,
                record.service,
                record.worker_percent_text()
            );
            reports::print_stats(&dashboard.overview(), currency);
            Ok(())
        }

        Command::Worker { handle: None } => watch_worker_input(dashboard).await,

        Command::Worker {
            handle: Some(handle),
        } => {
            let result = dashboard
                .register_worker(&handle)
                .await
                .context("Failed to look up worker")?;
            reports::print_worker_lookup(&result);
            Ok(())
        }

        Command::Export { filter, out } => {
            load_pages(dashboard, None).await;
            dashboard.set_filter(filter);

            let view = dashboard.view(&Local::now());
            let written = reports::export_records(&out, &view)?;
            println!("Exported {} profit(s) to {}", written, out.display());
            Ok(())
        }
    }
}

/// Feed stdin lines to the debounced worker lookup and print results as
/// they arrive
async fn watch_worker_input(dashboard: &Dashboard) -> Result<()> {
    let (mut lookup, mut results) = dashboard.worker_lookup();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("Type worker handles, one per line (Ctrl-D to finish)\n");

    loop {
        tokio::select! {
            line = lines.next_line() => match line.context("Failed to read input")? {
                Some(text) => lookup.on_input(&text),
                None => break,
            },
            Some(result) = results.recv() => {
                reports::print_worker_lookup(&result);
                println!();
            }
        }
    }

    // Input closed while a lookup was still waiting out the quiet period
    if lookup.is_pending() {
        if let Some(result) = results.recv().await {
            reports::print_worker_lookup(&result);
        }
    }
    Ok(())
}
