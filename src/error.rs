use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScraperError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected status {status} fetching {url}")]
    Status { url: String, status: u16 },

    #[error("Could not extract ABC content from {url}: {reason}")]
    Extraction { url: String, reason: String },

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("JSON (de)serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ScraperError {
    /// Fetch and extraction failures only cost the current URL; everything
    /// else ends the run.
    pub fn is_skippable(&self) -> bool {
        matches!(
            self,
            ScraperError::Http(_) | ScraperError::Status { .. } | ScraperError::Extraction { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, ScraperError>;
