//! Batch passes over the persisted collection: drop documents that no longer
//! validate, then drop exact-content duplicates.
//!
//! Both passes delete immediately. They take no lock, so running them while a
//! scrape is writing to the same collection is not supported.

use crate::error::Result;
use crate::storage::TuneStore;
use crate::types::{ContentGroup, TuneId};
use crate::validation::assess_tune;
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::{info, instrument};

const PREVIEW_CHARS: usize = 50;
const FINGERPRINT_BYTES: usize = 6;

#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct CleanupReport {
    pub scanned: usize,
    pub deleted: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupRemoval {
    pub fingerprint: String,
    pub preview: String,
    pub kept: TuneId,
    pub removed: usize,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct DedupReport {
    pub groups: Vec<GroupRemoval>,
    pub total_removed: usize,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct CleanerSummary {
    pub invalid: CleanupReport,
    pub duplicates: DedupReport,
}

/// Re-validate every stored document and delete the ones that fail.
#[instrument(skip(store))]
pub async fn remove_invalid(store: &dyn TuneStore) -> Result<CleanupReport> {
    info!("Scanning database for invalid tunes...");
    let mut report = CleanupReport::default();

    for tune in store.scan().await? {
        report.scanned += 1;
        if let Err(reason) = assess_tune(Some(&tune.document)) {
            info!(
                "Deleting invalid tune: {} (ID: {}): {}",
                tune.document.title_or_unknown(),
                tune.id,
                reason
            );
            if store.delete(tune.id).await? {
                report.deleted += 1;
            }
        }
    }

    info!("Cleanup complete. Deleted {} invalid documents.", report.deleted);
    Ok(report)
}

/// Keep the first document of every identical-content group, delete the rest.
#[instrument(skip(store))]
pub async fn deduplicate(store: &dyn TuneStore) -> Result<DedupReport> {
    info!("Scanning for duplicate scores (matching content)...");
    let mut report = DedupReport::default();

    for group in store.group_by_content().await? {
        let Some((&kept, extra)) = group.ids.split_first() else {
            continue;
        };
        if extra.is_empty() {
            continue;
        }

        let removed = store.delete_many(extra).await?;
        let removal = GroupRemoval {
            fingerprint: content_fingerprint(&group.content),
            preview: preview(&group),
            kept,
            removed,
        };
        info!(
            "Removed {} duplicates of {} for content starting with: {}...",
            removal.removed, removal.kept, removal.preview
        );
        report.total_removed += removed;
        report.groups.push(removal);
    }

    info!("Deduplication complete. Removed {} duplicate records.", report.total_removed);
    Ok(report)
}

/// Invalid-record removal followed by deduplication.
pub async fn run_cleanup(store: &dyn TuneStore) -> Result<CleanerSummary> {
    let invalid = remove_invalid(store).await?;
    let duplicates = deduplicate(store).await?;
    Ok(CleanerSummary { invalid, duplicates })
}

/// Short hex digest identifying a content group in logs.
pub fn content_fingerprint(content: &str) -> String {
    let digest = Sha256::digest(content.as_bytes());
    hex::encode(&digest[..FINGERPRINT_BYTES])
}

fn preview(group: &ContentGroup) -> String {
    group.content.chars().take(PREVIEW_CHARS).collect()
}
