use super::{Extractor, GenericExtractor, LinkedInExtractor, MediumExtractor, PageFetcher};
use std::sync::Arc;
use url::Url;

/// Routes a URL to the first extractor whose domain rule matches its host.
pub struct PlatformDispatcher {
    extractors: Vec<Arc<dyn Extractor>>,
    fallback: Arc<dyn Extractor>,
}

impl PlatformDispatcher {
    /// `extractors` are consulted in order; `fallback` handles everything else.
    pub fn new(extractors: Vec<Arc<dyn Extractor>>, fallback: Arc<dyn Extractor>) -> Self {
        Self {
            extractors,
            fallback,
        }
    }

    /// LinkedIn and Medium rules backed by a generic fallback.
    pub fn standard(fetcher: Arc<dyn PageFetcher>) -> Self {
        Self::new(
            vec![
                Arc::new(LinkedInExtractor::new(fetcher.clone())),
                Arc::new(MediumExtractor::new(fetcher.clone())),
            ],
            Arc::new(GenericExtractor::new(fetcher)),
        )
    }

    pub fn select(&self, url: &Url) -> &Arc<dyn Extractor> {
        let Some(host) = url.host_str() else {
            return &self.fallback;
        };
        let host = host.to_ascii_lowercase();

        self.extractors
            .iter()
            .find(|extractor| extractor.matches_domain(&host))
            .unwrap_or(&self.fallback)
    }

    /// Platform name for a raw URL string. Unparseable input maps to the fallback.
    pub fn platform_for(&self, url: &str) -> &'static str {
        match Url::parse(url) {
            Ok(url) => self.select(&url).platform(),
            Err(_) => self.fallback.platform(),
        }
    }
}
