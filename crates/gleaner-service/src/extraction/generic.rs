use super::html::parse_metadata;
use super::{ExtractionError, Extractor, PageFetcher};
use crate::models::ExtractionResult;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;
use url::Url;

/// Metadata-only extraction for any site without a dedicated rule.
pub struct GenericExtractor {
    fetcher: Arc<dyn PageFetcher>,
}

impl GenericExtractor {
    pub fn new(fetcher: Arc<dyn PageFetcher>) -> Self {
        Self { fetcher }
    }
}

#[async_trait]
impl Extractor for GenericExtractor {
    fn platform(&self) -> &'static str {
        "generic"
    }

    fn matches_domain(&self, _host: &str) -> bool {
        true
    }

    async fn extract(&self, url: &Url) -> Result<ExtractionResult, ExtractionError> {
        let page = self.fetcher.fetch(url).await?;
        let metadata = parse_metadata(&page.body);
        debug!(url = %url, title = %metadata.title, "Extracted generic metadata");

        Ok(ExtractionResult {
            title: metadata.title,
            content: metadata.description,
            author: metadata.author,
            published_at: metadata.published_at,
            platform_post_id: None,
            platform_data: None,
        })
    }
}
