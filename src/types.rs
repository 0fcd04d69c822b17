use crate::constants::PUBLIC_VISIBILITY;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A tune as produced by the scrape step, ready to be upserted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TuneRecord {
    pub source_url: String,
    pub title: String,
    pub content: String,
    pub scraped_at: DateTime<Utc>,
    #[serde(rename = "isPublic")]
    pub is_public: bool,
    pub visibility: String,
}

impl TuneRecord {
    /// Build a public record stamped with the current time.
    pub fn new(source_url: impl Into<String>, title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            source_url: source_url.into(),
            title: title.into(),
            content: content.into(),
            scraped_at: Utc::now(),
            is_public: true,
            visibility: PUBLIC_VISIBILITY.to_string(),
        }
    }
}

/// A document as read back from the store.
///
/// Every field is optional: the collection may hold documents written by older
/// scrapers or edited by hand. Some of those carry the notation under
/// `abc_content`; [`TuneDocument::normalized`] folds it into `content`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TuneDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub abc_content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scraped_at: Option<DateTime<Utc>>,
    #[serde(rename = "isPublic", default, skip_serializing_if = "Option::is_none")]
    pub is_public: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility: Option<String>,
}

impl TuneDocument {
    pub fn from_json(json: &str) -> crate::error::Result<Self> {
        let doc: TuneDocument = serde_json::from_str(json)?;
        Ok(doc.normalized())
    }

    /// Use `abc_content` as `content` when `content` is absent.
    pub fn normalized(mut self) -> Self {
        if self.content.is_none() {
            self.content = self.abc_content.take();
        }
        self
    }

    pub fn title_or_unknown(&self) -> &str {
        self.title.as_deref().unwrap_or(crate::constants::UNKNOWN_TITLE)
    }
}

impl From<&TuneRecord> for TuneDocument {
    fn from(record: &TuneRecord) -> Self {
        Self {
            source_url: Some(record.source_url.clone()),
            title: Some(record.title.clone()),
            content: Some(record.content.clone()),
            abc_content: None,
            scraped_at: Some(record.scraped_at),
            is_public: Some(record.is_public),
            visibility: Some(record.visibility.clone()),
        }
    }
}

/// Store-assigned identity of a persisted document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TuneId(pub i64);

impl fmt::Display for TuneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoredTune {
    pub id: TuneId,
    pub document: TuneDocument,
}

/// Documents sharing a byte-identical `content`, ids in the store's natural order.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentGroup {
    pub content: String,
    pub ids: Vec<TuneId>,
}

impl ContentGroup {
    pub fn count(&self) -> usize {
        self.ids.len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Replaced,
}

/// How tune pages are discovered on the source site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScrapeMode {
    Search { query: String, pages: u32 },
    Browse { start_page: u32, pages: u32 },
}

/// A site that can list tune pages and turn one into a candidate record.
#[async_trait::async_trait]
pub trait TuneSource: Send + Sync {
    /// Identifier used in logs.
    fn source_name(&self) -> &'static str;

    /// Tune page URLs for the given mode. Listing failures are logged by the
    /// source and simply contribute no URLs.
    async fn discover(&self, mode: &ScrapeMode) -> Vec<String>;

    /// Fetch one tune page and assemble a candidate record. The record is not
    /// validated yet.
    async fn fetch_tune(&self, url: &str) -> crate::error::Result<TuneRecord>;
}
