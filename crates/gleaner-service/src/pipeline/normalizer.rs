//! Finds the link a user meant to share inside a raw email body.

use regex::Regex;
use scraper::{Html, Selector};
use std::collections::HashSet;
use std::sync::LazyLock;
use url::Url;

pub const NO_URL_FOUND: &str = "No URL found in content";

static URL_CANDIDATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i:https?://)?(?i:www\.)?[^\s<>"']+\.[^\s<>"']+"#)
        .expect("valid url candidate regex")
});

const TRAILING_PUNCTUATION: &[char] = &['.', ',', ';', '!'];

/// Every URL in `content`, anchor hrefs first, then bare links in the text.
/// Duplicates keep their first position.
pub fn extract_urls(content: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut urls = Vec::new();

    for url in anchor_hrefs(content).into_iter().chain(text_urls(content)) {
        if seen.insert(url.clone()) {
            urls.push(url);
        }
    }

    urls
}

pub fn first_url(content: &str) -> Option<String> {
    extract_urls(content).into_iter().next()
}

fn anchor_hrefs(content: &str) -> Vec<String> {
    let Ok(selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };
    let document = Html::parse_document(content);

    document
        .select(&selector)
        .filter_map(|anchor| anchor.value().attr("href"))
        .map(str::trim)
        .filter(|href| has_http_scheme(href))
        .filter(|href| is_web_url(href))
        .map(str::to_string)
        .collect()
}

fn text_urls(content: &str) -> impl Iterator<Item = String> + '_ {
    URL_CANDIDATE.find_iter(content).filter_map(|candidate| {
        let candidate = candidate.as_str().trim_end_matches(TRAILING_PUNCTUATION);
        let url = if has_http_scheme(candidate) {
            candidate.to_string()
        } else {
            format!("https://{candidate}")
        };
        is_web_url(&url).then_some(url)
    })
}

/// `http://` or `https://`, any case. Hosts like `httpbin.org` do not count.
fn has_http_scheme(value: &str) -> bool {
    ["http://", "https://"].iter().any(|scheme| {
        value
            .get(..scheme.len())
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case(scheme))
    })
}

fn is_web_url(value: &str) -> bool {
    Url::parse(value).is_ok_and(|url| {
        matches!(url.scheme(), "http" | "https")
            && url.host_str().is_some_and(|host| !host.is_empty())
    })
}
