//! Metadata scraping from static HTML.
//!
//! Each field is resolved in a fixed order: Open Graph / article property,
//! then a named meta tag, then raw markup. Values are whitespace-normalized
//! (trimmed, internal runs collapsed to one space) and nothing more.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use scraper::{Html, Selector};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageMetadata {
    pub title: String,
    pub description: String,
    pub author: String,
    pub published_at: Option<NaiveDateTime>,
}

pub fn parse_metadata(html: &str) -> PageMetadata {
    let document = Html::parse_document(html);

    let title = first_attr(&document, r#"meta[property="og:title"]"#, "content")
        .or_else(|| {
            first_attr(
                &document,
                r#"meta[name="title"], meta[name="twitter:title"]"#,
                "content",
            )
        })
        .or_else(|| first_text(&document, "title"))
        .unwrap_or_default();

    let description = first_attr(&document, r#"meta[property="og:description"]"#, "content")
        .or_else(|| {
            first_attr(
                &document,
                r#"meta[name="description"], meta[name="twitter:description"]"#,
                "content",
            )
        })
        .unwrap_or_default();

    let author = first_attr(&document, r#"meta[property="article:author"]"#, "content")
        .or_else(|| first_attr(&document, r#"meta[name="author"]"#, "content"))
        .unwrap_or_default();

    let published_at = first_attr(
        &document,
        r#"meta[property="article:published_time"]"#,
        "content",
    )
    .or_else(|| {
        first_attr(
            &document,
            r#"meta[name="date"], meta[name="publish_date"], meta[name="pubdate"]"#,
            "content",
        )
    })
    .or_else(|| first_attr(&document, "time[datetime]", "datetime"))
    .and_then(|raw| parse_published_at(&raw));

    PageMetadata {
        title,
        description,
        author,
        published_at,
    }
}

pub fn normalize_whitespace(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Accepts RFC 3339, `YYYY-MM-DDTHH:MM:SS` with or without fraction/offset,
/// and bare dates. Anything else is treated as absent.
pub fn parse_published_at(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();

    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.naive_utc());
    }
    if let Ok(parsed) = DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f%z") {
        return Some(parsed.naive_utc());
    }
    if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(parsed);
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

fn first_attr(document: &Html, selector: &str, attr: &str) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;
    document
        .select(&selector)
        .filter_map(|el| el.value().attr(attr))
        .map(normalize_whitespace)
        .find(|value| !value.is_empty())
}

fn first_text(document: &Html, selector: &str) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;
    document
        .select(&selector)
        .map(|el| normalize_whitespace(&el.text().collect::<String>()))
        .find(|value| !value.is_empty())
}
