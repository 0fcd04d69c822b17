pub mod abc_notation;

pub use abc_notation::AbcNotationCrawler;
