//! bulkget - Concurrent bulk file fetcher
//!
//! Reads a manifest of `<url> <filename>` lines and fetches every distinct
//! URL once, throttled by a global bandwidth budget shared across workers.

mod output;
mod progress;

use anyhow::Result;
use bulkget_core::{Config, ConfigError, Manifest, WorkerPool};
use clap::{CommandFactory, Parser};
use console::style;
use std::path::PathBuf;
use tracing::warn;

/// bulkget - Bulk file fetcher with a shared bandwidth budget
#[derive(Parser)]
#[command(name = "bulkget")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Manifest file with one `<url> <filename>` entry per line
    #[arg(short = 'f', long)]
    input: PathBuf,

    /// Number of concurrent workers
    #[arg(short = 'n', long, default_value_t = bulkget_core::DEFAULT_WORKERS)]
    workers: usize,

    /// Bandwidth limit in bytes per second (accepts KB, KiB, MB, MiB)
    #[arg(
        short = 'l',
        long,
        default_value_t = bulkget_core::DEFAULT_RATE_LIMIT,
        value_parser = bulkget_core::parse_size
    )]
    limit: u64,

    /// Directory destination files are written into
    #[arg(short = 'o', long, env = "BULKGET_OUTPUT_DIR", default_value = ".")]
    output_dir: PathBuf,

    /// Output format
    #[arg(long, default_value = "human")]
    format: OutputFormat,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
enum OutputFormat {
    Human,
    Json,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("{} {}", style("error:").red().bold(), e);
        if e.downcast_ref::<ConfigError>().is_some() {
            eprintln!();
            let _ = Cli::command().print_help();
            std::process::exit(2);
        }
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config {
        workers: cli.workers,
        rate_limit: cli.limit,
        output_dir: cli.output_dir,
    };
    config.validate()?;

    let manifest = Manifest::load(&cli.input).await?;
    if manifest.is_empty() {
        warn!("Manifest {} contains no usable entries", cli.input.display());
    }
    let task_count = manifest.len();

    let pool = WorkerPool::new(&config, manifest.into_tasks())?;

    // JSON mode keeps stdout to the final report only
    let printer = if matches!(cli.format, OutputFormat::Human) {
        println!(
            "Fetching {} tasks with {} workers ({}/s limit)",
            task_count,
            config.workers,
            output::format_bytes(config.rate_limit)
        );
        Some(tokio::spawn(progress::print_events(pool.subscribe())))
    } else {
        None
    };

    let cancel = pool.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, stopping transfers");
            cancel.cancel();
        }
    });

    let report = pool.run().await;

    // The pool dropped its event senders, so the printer drains and exits
    if let Some(printer) = printer {
        let _ = printer.await;
    }

    output::print_report(&report, cli.format)?;
    Ok(())
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "info,bulkget_core=debug" } else { "warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter));

    // Logs go to stderr; stdout carries progress lines and the report
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
