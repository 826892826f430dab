use super::html::parse_metadata;
use super::{ExtractionError, Extractor, PageFetcher};
use crate::models::ExtractionResult;
use async_trait::async_trait;
use regex::Regex;
use std::sync::{Arc, LazyLock};
use url::Url;

static TRAILING_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|-)([0-9a-f]{8,16})$").expect("valid post id regex"));

pub struct MediumExtractor {
    fetcher: Arc<dyn PageFetcher>,
}

impl MediumExtractor {
    pub fn new(fetcher: Arc<dyn PageFetcher>) -> Self {
        Self { fetcher }
    }
}

#[async_trait]
impl Extractor for MediumExtractor {
    fn platform(&self) -> &'static str {
        "medium"
    }

    fn matches_domain(&self, host: &str) -> bool {
        host.contains("medium.com")
    }

    async fn extract(&self, url: &Url) -> Result<ExtractionResult, ExtractionError> {
        let page = self.fetcher.fetch(url).await?;
        let metadata = parse_metadata(&page.body);

        let author = if metadata.author.is_empty() {
            handle_from_url(url).unwrap_or_default()
        } else {
            metadata.author
        };

        Ok(ExtractionResult {
            title: metadata.title,
            content: metadata.description,
            author,
            published_at: metadata.published_at,
            platform_post_id: post_id_from_url(url),
            platform_data: None,
        })
    }
}

/// Medium slugs end in a hex id: `/@user/some-title-1a2b3c4d5e6f`.
pub fn post_id_from_url(url: &Url) -> Option<String> {
    let last = url.path_segments()?.rev().find(|s| !s.is_empty())?;
    TRAILING_ID
        .captures(last)
        .map(|captures| captures[1].to_string())
}

fn handle_from_url(url: &Url) -> Option<String> {
    url.path_segments()?
        .find_map(|segment| segment.strip_prefix('@'))
        .filter(|handle| !handle.is_empty())
        .map(str::to_string)
}
