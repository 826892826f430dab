use crate::config::FetchConfig;
use crate::validation::{UrlPolicy, ValidationError, is_private_ip};
use async_trait::async_trait;
use reqwest::dns::{Addrs, Name, Resolve, Resolving};
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderValue};
use reqwest::redirect;
use std::error::Error as StdError;
use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

const MAX_REDIRECTS: usize = 5;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Request(reqwest::Error),

    #[error("blocked fetch target: {0}")]
    Blocked(ValidationError),

    #[error("HTTP error status: {status}")]
    Status { status: u16, final_url: String },

    #[error("response body exceeds {limit} bytes")]
    TooLarge { limit: usize },
}

impl From<reqwest::Error> for FetchError {
    /// Policy rejections raised from the redirect policy or the resolver come
    /// back wrapped in a `reqwest::Error`; surface them as `Blocked`.
    fn from(err: reqwest::Error) -> Self {
        let mut source = err.source();
        while let Some(inner) = source {
            if let Some(rejection) = inner.downcast_ref::<ValidationError>() {
                return FetchError::Blocked(rejection.clone());
            }
            source = inner.source();
        }
        FetchError::Request(err)
    }
}

/// A successfully fetched page.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub status: u16,
    /// URL after redirects.
    pub final_url: String,
    pub body: String,
}

#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Issue one GET. Non-2xx responses are errors.
    async fn fetch(&self, url: &Url) -> Result<FetchedPage, FetchError>;
}

/// Resolves through the system resolver and drops loopback, private and
/// link-local answers. A name with only such answers fails to resolve.
struct PublicOnlyResolver;

impl Resolve for PublicOnlyResolver {
    fn resolve(&self, name: Name) -> Resolving {
        Box::pin(async move {
            let host = name.as_str().to_string();
            let resolved = tokio::net::lookup_host((host.as_str(), 0))
                .await
                .map_err(|err| Box::new(err) as Box<dyn StdError + Send + Sync>)?;
            let addrs: Vec<SocketAddr> = resolved
                .filter(|addr| !is_private_ip(&addr.ip()))
                .collect();

            if addrs.is_empty() {
                warn!(host = %host, "Host resolves only to private addresses");
                let rejection: Box<dyn StdError + Send + Sync> =
                    Box::new(ValidationError::LocalAddress(host));
                return Err(rejection);
            }
            let addrs: Addrs = Box::new(addrs.into_iter());
            Ok(addrs)
        })
    }
}

/// Follows up to `MAX_REDIRECTS` hops, each of which must pass `policy`.
fn redirect_policy(policy: UrlPolicy) -> redirect::Policy {
    redirect::Policy::custom(move |attempt| {
        if attempt.previous().len() > MAX_REDIRECTS {
            return attempt.error("too many redirects");
        }
        match policy.check(attempt.url()) {
            Ok(()) => attempt.follow(),
            Err(rejection) => {
                warn!(url = %attempt.url(), error = %rejection, "Refusing redirect");
                attempt.error(rejection)
            }
        }
    })
}

/// `reqwest`-backed fetcher presenting itself as a desktop browser.
///
/// Callers validate the first URL; redirect targets and DNS answers are
/// checked here against the same private-host rule.
pub struct HttpFetcher {
    client: reqwest::Client,
    max_body_bytes: usize,
}

impl HttpFetcher {
    pub fn new(config: &FetchConfig) -> Result<Self, reqwest::Error> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
            ),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));

        let mut builder = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .timeout(config.timeout)
            .redirect(redirect_policy(UrlPolicy::new(config.allow_private_hosts)));
        if !config.allow_private_hosts {
            builder = builder.dns_resolver(Arc::new(PublicOnlyResolver));
        }
        let client = builder.build()?;

        Ok(Self {
            client,
            max_body_bytes: config.max_body_bytes,
        })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Result<FetchedPage, FetchError> {
        let mut response = self.client.get(url.clone()).send().await?;

        let status = response.status();
        let final_url = response.url().to_string();
        debug!(url = %url, final_url = %final_url, status = status.as_u16(), "Fetched page");

        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                final_url,
            });
        }

        let limit = self.max_body_bytes;
        if response
            .content_length()
            .is_some_and(|length| length > limit as u64)
        {
            return Err(FetchError::TooLarge { limit });
        }

        // content-length may be absent or wrong, so count while reading
        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await? {
            body.extend_from_slice(&chunk);
            if body.len() > limit {
                return Err(FetchError::TooLarge { limit });
            }
        }

        Ok(FetchedPage {
            status: status.as_u16(),
            final_url,
            body: String::from_utf8_lossy(&body).into_owned(),
        })
    }
}
