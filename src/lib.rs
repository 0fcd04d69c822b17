pub mod apis;
pub mod cleaner;
pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod parser;
pub mod pipeline;
pub mod storage;
pub mod types;
pub mod validation;

pub use error::{Result, ScraperError};
pub use types::{TuneDocument, TuneId, TuneRecord};
pub use validation::{assess_tune, is_header_field_line, validate_tune, Rejection};
