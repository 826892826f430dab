pub mod dispatcher;
pub mod fetcher;
pub mod generic;
pub mod html;
pub mod linkedin;
pub mod medium;

pub use dispatcher::PlatformDispatcher;
pub use fetcher::{FetchError, FetchedPage, HttpFetcher, PageFetcher};
pub use generic::GenericExtractor;
pub use linkedin::LinkedInExtractor;
pub use medium::MediumExtractor;

use crate::models::ExtractionResult;
use async_trait::async_trait;
use thiserror::Error;
use url::Url;

#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
}

/// A content extractor for one platform.
#[async_trait]
pub trait Extractor: Send + Sync {
    /// Stored as `source_platform` on success.
    fn platform(&self) -> &'static str;

    /// Whether this extractor handles the given (lower-cased) host.
    fn matches_domain(&self, host: &str) -> bool;

    async fn extract(&self, url: &Url) -> Result<ExtractionResult, ExtractionError>;
}
