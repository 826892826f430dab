use super::html::{PageMetadata, parse_metadata};
use super::{ExtractionError, Extractor, FetchError, PageFetcher};
use crate::models::ExtractionResult;
use async_trait::async_trait;
use regex::Regex;
use serde_json::json;
use std::sync::{Arc, LazyLock};
use tracing::{debug, info};
use url::Url;

pub const LOGIN_WALL_CONTENT: &str = "LinkedIn content requires authentication to view";
const DEFAULT_TITLE: &str = "LinkedIn Post";

/// Statuses LinkedIn answers with instead of content for anonymous clients.
const LOGIN_WALL_STATUSES: [u16; 4] = [401, 403, 429, 999];
const LOGIN_WALL_PATHS: [&str; 4] = ["/authwall", "/login", "/uas/login", "/checkpoint"];

static POST_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(activity|ugcPost|share)(?:-|:|%3A)(\d{6,})").expect("valid post id regex")
});

pub struct LinkedInExtractor {
    fetcher: Arc<dyn PageFetcher>,
}

impl LinkedInExtractor {
    pub fn new(fetcher: Arc<dyn PageFetcher>) -> Self {
        Self { fetcher }
    }

    fn login_walled(
        &self,
        url: &Url,
        fetch_url: &Url,
        post_id: Option<String>,
        title: Option<String>,
        reason: &str,
    ) -> ExtractionResult {
        info!(url = %url, reason, "LinkedIn post is behind a login wall");
        ExtractionResult {
            title: title
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| DEFAULT_TITLE.to_string()),
            content: LOGIN_WALL_CONTENT.to_string(),
            author: author_from_url(url).unwrap_or_default(),
            published_at: None,
            platform_post_id: post_id,
            platform_data: Some(json!({
                "fetchUrl": fetch_url.as_str(),
                "authRequired": true,
                "reason": reason,
            })),
        }
    }
}

#[async_trait]
impl Extractor for LinkedInExtractor {
    fn platform(&self) -> &'static str {
        "linkedin"
    }

    fn matches_domain(&self, host: &str) -> bool {
        host.contains("linkedin.com")
    }

    async fn extract(&self, url: &Url) -> Result<ExtractionResult, ExtractionError> {
        let urn = post_urn(url);
        let post_id = urn.as_ref().map(|(_, id)| id.clone());
        let fetch_url = urn
            .as_ref()
            .and_then(|(kind, id)| embed_url(kind, id))
            .unwrap_or_else(|| url.clone());
        debug!(url = %url, fetch_url = %fetch_url, post_id = ?post_id, "Fetching LinkedIn post");

        let page = match self.fetcher.fetch(&fetch_url).await {
            Ok(page) => page,
            Err(FetchError::Status { status, .. }) if LOGIN_WALL_STATUSES.contains(&status) => {
                let reason = format!("status {status}");
                return Ok(self.login_walled(url, &fetch_url, post_id, None, &reason));
            }
            Err(err) => return Err(err.into()),
        };

        if is_login_redirect(&page.final_url) {
            return Ok(self.login_walled(url, &fetch_url, post_id, None, "redirected to login"));
        }

        let PageMetadata {
            title,
            description,
            author,
            published_at,
        } = parse_metadata(&page.body);

        if description.is_empty() {
            return Ok(self.login_walled(url, &fetch_url, post_id, Some(title), "empty description"));
        }

        Ok(ExtractionResult {
            title: if title.is_empty() {
                DEFAULT_TITLE.to_string()
            } else {
                title
            },
            content: description,
            author: if author.is_empty() {
                author_from_url(url).unwrap_or_default()
            } else {
                author
            },
            published_at,
            platform_post_id: post_id,
            platform_data: Some(json!({
                "fetchUrl": fetch_url.as_str(),
                "authRequired": false,
            })),
        })
    }
}

pub fn post_id_from_url(url: &Url) -> Option<String> {
    post_urn(url).map(|(_, id)| id)
}

/// URN kind (`activity`, `ugcPost` or `share`) and numeric id.
fn post_urn(url: &Url) -> Option<(String, String)> {
    POST_ID
        .captures(url.as_str())
        .map(|captures| (captures[1].to_string(), captures[2].to_string()))
}

fn embed_url(kind: &str, post_id: &str) -> Option<Url> {
    Url::parse(&format!(
        "https://www.linkedin.com/embed/feed/update/urn:li:{kind}:{post_id}"
    ))
    .ok()
}

/// `/posts/jane-doe_some-title-activity-123` and `/in/jane-doe` both yield `jane-doe`.
pub fn author_from_url(url: &Url) -> Option<String> {
    let mut segments = url.path_segments()?;
    let author = match segments.next()? {
        "posts" => segments.next()?.split('_').next()?,
        "in" => segments.next()?,
        _ => return None,
    };
    (!author.is_empty()).then(|| author.to_string())
}

fn is_login_redirect(final_url: &str) -> bool {
    Url::parse(final_url)
        .map(|url| {
            LOGIN_WALL_PATHS
                .iter()
                .any(|path| url.path().starts_with(path))
        })
        .unwrap_or(false)
}
