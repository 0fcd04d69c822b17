use clap::Parser;
use std::time::Duration;
use tracing::info;

use tune_scraper::apis::AbcNotationCrawler;
use tune_scraper::config::{ScraperConfig, StoreConfig};
use tune_scraper::constants::{DEFAULT_PAGE_LIMIT, DEFAULT_QUERY};
use tune_scraper::logging;
use tune_scraper::pipeline::Pipeline;
use tune_scraper::storage::SqliteTuneStore;
use tune_scraper::types::ScrapeMode;

#[derive(Parser)]
#[command(name = "tune_scraper")]
#[command(about = "Scrape ABC tunes from abcnotation.com")]
#[command(version)]
struct Cli {
    /// Search query (ignored if --browse is used)
    #[arg(long, default_value = DEFAULT_QUERY)]
    query: String,

    /// Number of search result pages or browse pages to scrape
    #[arg(long, default_value_t = DEFAULT_PAGE_LIMIT)]
    limit: u32,

    /// Browse tunes instead of searching
    #[arg(long)]
    browse: bool,

    /// Starting page number for browse mode
    #[arg(long, default_value_t = 0)]
    start_page: u32,
}

impl Cli {
    fn mode(&self) -> ScrapeMode {
        if self.browse {
            ScrapeMode::Browse {
                start_page: self.start_page,
                pages: self.limit,
            }
        } else {
            ScrapeMode::Search {
                query: self.query.clone(),
                pages: self.limit,
            }
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _guard = logging::init_logging("scraper.log");
    let cli = Cli::parse();

    let scraper_config = ScraperConfig::load()?;
    let store_config = StoreConfig::from_env()?;

    let mode = cli.mode();
    match &mode {
        ScrapeMode::Browse { start_page, .. } => println!("Starting browse mode from page {start_page}"),
        ScrapeMode::Search { query, .. } => println!("Starting search mode for '{query}'"),
    }

    let crawler = AbcNotationCrawler::new(&scraper_config)?;
    let store = SqliteTuneStore::connect(&store_config)?;
    let pipeline = Pipeline::new(Duration::from_millis(scraper_config.delay_ms));

    let summary = pipeline.run(&crawler, &store, &mode).await?;
    store.close()?;

    info!("Scrape run complete");
    println!("\n📊 Scrape results:");
    println!("   Found: {}", summary.discovered);
    println!("   Saved: {} ({} new, {} updated)", summary.saved(), summary.inserted, summary.replaced);
    println!("   Rejected: {}", summary.rejected);
    println!("   Failed: {}", summary.failed);
    if !summary.errors.is_empty() {
        println!("\n⚠️  Errors encountered:");
        for error in &summary.errors {
            println!("   - {}", error);
        }
    }
    Ok(())
}
