use crate::error::Result;
use crate::storage::TuneStore;
use crate::types::{ScrapeMode, TuneSource, UpsertOutcome};
use crate::validation::assess_tune;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Counts from one scrape run.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct ScrapeSummary {
    pub discovered: usize,
    pub inserted: usize,
    pub replaced: usize,
    pub rejected: usize,
    pub failed: usize,
    pub errors: Vec<String>,
}

impl ScrapeSummary {
    pub fn saved(&self) -> usize {
        self.inserted + self.replaced
    }
}

/// Sequential scrape loop: discover tune pages, fetch each one, validate it
/// and upsert the accepted records.
pub struct Pipeline {
    delay: Duration,
}

impl Pipeline {
    /// `delay` is the courtesy pause between consecutive tune page requests.
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    #[instrument(skip(self, source, store), fields(source_name = %source.source_name()))]
    pub async fn run(&self, source: &dyn TuneSource, store: &dyn TuneStore, mode: &ScrapeMode) -> Result<ScrapeSummary> {
        let urls = source.discover(mode).await;
        info!("Found {} tunes to scrape", urls.len());

        let mut summary = ScrapeSummary {
            discovered: urls.len(),
            ..Default::default()
        };

        for (i, url) in urls.iter().enumerate() {
            if i > 0 && !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }

            let record = match source.fetch_tune(url).await {
                Ok(record) => record,
                Err(e) if e.is_skippable() => {
                    warn!("Skipping {}: {}", url, e);
                    summary.failed += 1;
                    summary.errors.push(format!("{url}: {e}"));
                    continue;
                }
                Err(e) => return Err(e),
            };

            if let Err(reason) = assess_tune(Some(&record)) {
                debug!("Skipping invalid data for {}: {}", url, reason);
                summary.rejected += 1;
                continue;
            }

            match store.upsert(&record).await? {
                UpsertOutcome::Inserted => summary.inserted += 1,
                UpsertOutcome::Replaced => summary.replaced += 1,
            }
            info!("Saved/Updated: {}", record.title);
        }

        info!(
            "Scrape finished: {} saved ({} new), {} rejected, {} failed",
            summary.saved(),
            summary.inserted,
            summary.rejected,
            summary.failed
        );
        Ok(summary)
    }
}
