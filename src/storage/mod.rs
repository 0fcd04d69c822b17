//! Persistence for scraped tunes.
//!
//! The core only needs five operations from a store: upsert by source URL,
//! a full scan, single and bulk delete by identity, and a group-by-content
//! aggregation. Anything offering those can back the scraper and the cleaner.

mod in_memory;
mod sqlite;

pub use in_memory::InMemoryTuneStore;
pub use sqlite::SqliteTuneStore;

use crate::constants::PUBLIC_VISIBILITY;
use crate::error::Result;
use crate::types::{ContentGroup, StoredTune, TuneDocument, TuneId, TuneRecord, UpsertOutcome};
use async_trait::async_trait;

#[async_trait]
pub trait TuneStore: Send + Sync {
    /// Insert the record, or fully replace the document with the same
    /// `source_url`. A replaced document keeps its identity.
    async fn upsert(&self, record: &TuneRecord) -> Result<UpsertOutcome>;

    /// Every document exactly once, in ascending identity order, with
    /// `abc_content` already folded into `content`.
    async fn scan(&self) -> Result<Vec<StoredTune>>;

    /// Returns whether a document was removed.
    async fn delete(&self, id: TuneId) -> Result<bool>;

    /// Returns how many of the ids were removed.
    async fn delete_many(&self, ids: &[TuneId]) -> Result<usize>;

    /// Groups of more than one document with byte-identical content.
    /// Documents without content are not grouped.
    async fn group_by_content(&self) -> Result<Vec<ContentGroup>>;

    /// Seed the store with a raw document, e.g. one written by an older
    /// scraper with `abc_content` or with fields missing. Not one of the
    /// operations the scraper or the cleaner rely on. A document whose
    /// `source_url` is already stored replaces that document and keeps its
    /// identity, like `upsert`; documents without a URL are always added.
    async fn insert_document(&self, document: &TuneDocument) -> Result<TuneId>;

    async fn count(&self) -> Result<usize>;

    async fn find_public(&self) -> Result<Option<StoredTune>> {
        let found = self
            .scan()
            .await?
            .into_iter()
            .find(|t| t.document.visibility.as_deref() == Some(PUBLIC_VISIBILITY));
        Ok(found)
    }
}
