//! `city-jobs` command line
//!
//! `download` fetches and archives the search pages of every portal and
//! writes the parsed listings, `parse` re-extracts listings from the
//! archive without touching the network, and `details` fetches the detail
//! pages of already parsed listings.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use city_jobs::{
    DirectoryPageSource, HttpPageSource, PageSource, PageStore, Portal, PortalOrchestrator,
    ScrapeConfig,
};

#[derive(Parser)]
#[command(name = "city-jobs")]
#[command(about = "Scrape the City of Toronto job boards")]
#[command(version)]
struct Cli {
    /// JSON config file; missing keys take their defaults
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Archive directory (overrides the config file)
    #[arg(long, global = true)]
    storage_root: Option<PathBuf>,

    /// Portal to scrape, repeatable (default: all configured portals)
    #[arg(short, long = "portal", global = true)]
    portals: Vec<Portal>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch every search page, archive it and write parsed_jobs.json
    Download,

    /// Re-extract parsed_jobs.json from the archived search pages
    Parse,

    /// Fetch detail pages of parsed listings and write parsed_job_details.json
    Details {
        /// Jobs per portal to fetch
        #[arg(short, long)]
        limit: Option<usize>,

        /// Read detail pages from the archive instead of the network
        #[arg(long)]
        offline: bool,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Err(e) = run() {
        eprintln!("Error: {:#}", e);
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;
    let portals = config.portals.clone();
    let store = PageStore::new(&config.storage_root);

    match cli.command {
        Commands::Download => {
            let source = HttpPageSource::new(&config);
            let orchestrator =
                PortalOrchestrator::new(Box::new(source), config).with_store(store.clone());
            let listings = orchestrator.run(&portals).context("download failed")?;
            let path = store.save_listings(&listings)?;
            report_listings(&listings, &path);
        }
        Commands::Parse => {
            let source = DirectoryPageSource::new(store.clone());
            let orchestrator = PortalOrchestrator::new(Box::new(source), config);
            let listings = orchestrator.run(&portals).with_context(|| {
                format!("parsing archive at {} failed", store.root().display())
            })?;
            let path = store.save_listings(&listings)?;
            report_listings(&listings, &path);
        }
        Commands::Details { limit, offline } => {
            let mut listings = store
                .load_listings()
                .context("no parsed listings, run `download` or `parse` first")?;
            listings.retain(|portal, _| portals.contains(portal));

            let orchestrator = if offline {
                let source: Box<dyn PageSource> = Box::new(DirectoryPageSource::new(store.clone()));
                PortalOrchestrator::new(source, config)
            } else {
                PortalOrchestrator::new(Box::new(HttpPageSource::new(&config)), config)
                    .with_store(store.clone())
            };

            let report = orchestrator
                .collect_details(&listings, limit)
                .context("detail collection failed")?;
            let path = store.save_details(&report.details)?;

            let parsed: usize = report.details.values().map(|d| d.len()).sum();
            info!(
                parsed,
                closed = report.closed.len(),
                failed = report.failed.len(),
                path = %path.display(),
                "saved job details"
            );
            for (portal, job_id, reason) in &report.failed {
                eprintln!("{} {}: {}", portal, job_id, reason);
            }
        }
    }

    Ok(())
}

fn load_config(cli: &Cli) -> Result<ScrapeConfig> {
    let mut config = match &cli.config {
        Some(path) => ScrapeConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => ScrapeConfig::default(),
    };

    if let Some(root) = &cli.storage_root {
        config.storage_root = root.clone();
    }
    if !cli.portals.is_empty() {
        config.set_portals(cli.portals.iter().copied());
    }

    config.validate()?;
    Ok(config)
}

fn report_listings(listings: &city_jobs::ListingsByPortal, path: &std::path::Path) {
    for (portal, records) in listings {
        info!(portal = %portal, listings = records.len(), "parsed");
    }
    info!(path = %path.display(), "saved listings");
}
