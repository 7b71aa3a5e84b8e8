//! Sermon scraper CLI
//!
//! With no flag: ingest every listed sermon, then print the index status.

use std::path::PathBuf;

use clap::{ArgGroup, Parser};
use sermon_scraper::{
    error::{AppError, Result},
    models::Config,
    pipeline,
    storage::Storage,
    utils::http::HttpFetcher,
};

/// Sermon scraper - saves sermon transcripts to an index and text files
#[derive(Parser, Debug)]
#[command(name = "sermon-scraper", version, about = "Sermon transcript scraper")]
#[command(group(
    ArgGroup::new("action")
        .args(["test", "status", "other", "clean_db"])
        .multiple(false)
))]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Number of listing pages to walk (overrides the configuration)
    #[arg(long)]
    pages: Option<u32>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Run the self-test fixtures, then exit
    #[arg(long)]
    test: bool,

    /// Print the index summary without crawling
    #[arg(long)]
    status: bool,

    /// Set up the index schema, then exit
    #[arg(long)]
    other: bool,

    /// Remove index rows whose sermon file is missing, then print the status
    #[arg(long = "clean_db")]
    clean_db: bool,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = Config::load_or_default(&cli.config);
    if let Some(pages) = cli.pages {
        config.source.total_pages = pages;
    }
    if let Err(e) = config.validate() {
        log::error!("Config validation failed: {}", e);
        return Err(e);
    }

    if cli.test {
        let scratch = std::env::temp_dir()
            .join(format!("sermon-scraper-selftest-{}", std::process::id()));
        let results = pipeline::run_self_test(&scratch).await?;
        let failed = results.iter().filter(|r| !r.passed).count();
        if failed > 0 {
            return Err(AppError::crawl(
                "self test",
                format!("{failed} of {} fixtures failed", results.len()),
            ));
        }
        log::info!("All {} self tests passed", results.len());
        return Ok(());
    }

    let storage = Storage::open(&config.storage).await?;
    log::debug!(
        "Using index {} and sermons in {}",
        config.storage.database_path.display(),
        config.storage.sermons_dir.display()
    );

    if cli.other {
        storage.close().await;
        return Ok(());
    }

    if cli.clean_db {
        pipeline::run_reconcile(&storage).await?;
    } else if !cli.status {
        let fetcher = HttpFetcher::new(&config.crawler)?;
        pipeline::run_ingest(&config, &fetcher, &storage).await?;
    }

    pipeline::run_status(&storage).await?;
    storage.close().await;

    Ok(())
}
