mod lease;
pub mod normalizer;
pub mod processor;

pub use normalizer::{NO_URL_FOUND, extract_urls, first_url};
pub use processor::{BatchOutcome, IngestionProcessor};
