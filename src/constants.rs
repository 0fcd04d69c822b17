/// Constants shared by the scraper, the store and the cleaner binaries.

// Source site
pub const DEFAULT_BASE_URL: &str = "https://abcnotation.com";
pub const SEARCH_PATH: &str = "/searchTunes";
pub const BROWSE_PATH: &str = "/browseTunes";
pub const TUNE_PAGE_MARKER: &str = "tunePage?a=";
pub const SEARCH_RESULTS_PER_PAGE: u32 = 10;

// Courtesy delay between page requests
pub const DEFAULT_DELAY_MS: u64 = 1000;

pub const DEFAULT_USER_AGENT: &str = concat!("tune_scraper/", env!("CARGO_PKG_VERSION"));

// CLI defaults
pub const DEFAULT_QUERY: &str = "jig";
pub const DEFAULT_PAGE_LIMIT: u32 = 1;

// Store defaults, overridable from the environment
pub const STORE_URI_ENV: &str = "TUNE_STORE_URI";
pub const DB_NAME_ENV: &str = "TUNE_DB_NAME";
pub const COLLECTION_ENV: &str = "TUNE_COLLECTION";
pub const DEFAULT_STORE_URI: &str = "data";
pub const DEFAULT_DB_NAME: &str = "music-notation";
pub const DEFAULT_COLLECTION: &str = "scores";

// Record conventions
pub const UNKNOWN_TITLE: &str = "Unknown";
pub const PUBLIC_VISIBILITY: &str = "public";

// Structural markers of the ABC notation format
pub const TUNE_INDEX_MARKER: &str = "X:";
pub const KEY_FIELD_MARKER: &str = "K:";
pub const TITLE_FIELD_MARKER: &str = "T:";
