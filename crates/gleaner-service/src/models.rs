use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Where an ingestion record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    Email,
    Url,
    Test,
}

impl SourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::Email => "email",
            SourceType::Url => "url",
            SourceType::Test => "test",
        }
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "email" => Ok(SourceType::Email),
            "url" => Ok(SourceType::Url),
            "test" => Ok(SourceType::Test),
            other => Err(format!("unknown source type: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Serialize)]
#[diesel(table_name = crate::schema::ingestion_records)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[serde(rename_all = "camelCase")]
pub struct IngestionRecord {
    pub id: i32,
    pub user_id: String,
    pub source_type: String,
    pub source_platform: Option<String>,
    pub content_title: Option<String>,
    pub content_body: Option<String>,
    pub original_url: Option<String>,
    pub original_author: Option<String>,
    pub metadata: Option<String>,
    pub title: Option<String>,
    pub content: Option<String>,
    pub author: Option<String>,
    pub published_at: Option<NaiveDateTime>,
    pub platform_post_id: Option<String>,
    pub platform_data: Option<String>,
    pub processed: bool,
    pub error_message: Option<String>,
    pub version: i32,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl IngestionRecord {
    pub fn source(&self) -> Option<SourceType> {
        self.source_type.parse().ok()
    }

    pub fn succeeded(&self) -> bool {
        self.processed && self.error_message.is_none()
    }

    pub fn failed(&self) -> bool {
        self.processed && self.error_message.is_some()
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = crate::schema::ingestion_records)]
pub struct NewIngestionRecord {
    pub user_id: String,
    pub source_type: String,
    pub content_title: Option<String>,
    pub content_body: Option<String>,
    pub original_url: Option<String>,
    pub original_author: Option<String>,
    pub metadata: Option<String>,
}

impl NewIngestionRecord {
    /// A record for a URL submitted directly by a user.
    pub fn from_url(user_id: impl Into<String>, url: impl Into<String>) -> Self {
        NewIngestionRecord {
            user_id: user_id.into(),
            source_type: SourceType::Url.as_str().to_string(),
            content_title: None,
            content_body: None,
            original_url: Some(url.into()),
            original_author: None,
            metadata: None,
        }
    }

    /// A record holding a raw email body; the URL is located later.
    pub fn from_email(
        user_id: impl Into<String>,
        subject: Option<String>,
        body: String,
        sender: Option<String>,
        metadata: Option<String>,
    ) -> Self {
        NewIngestionRecord {
            user_id: user_id.into(),
            source_type: SourceType::Email.as_str().to_string(),
            content_title: Some(subject.unwrap_or_else(|| "Email Content".to_string())),
            content_body: Some(body),
            original_url: None,
            original_author: sender,
            metadata,
        }
    }
}

/// Partial update applied under a version check. `None` leaves a column as is;
/// `Some(None)` clears a nullable column.
#[derive(Debug, Clone, Default, AsChangeset)]
#[diesel(table_name = crate::schema::ingestion_records)]
pub struct IngestionChanges {
    pub source_platform: Option<Option<String>>,
    pub original_url: Option<Option<String>>,
    pub title: Option<Option<String>>,
    pub content: Option<Option<String>>,
    pub author: Option<Option<String>>,
    pub published_at: Option<Option<NaiveDateTime>>,
    pub platform_post_id: Option<Option<String>>,
    pub platform_data: Option<Option<String>>,
    pub processed: Option<bool>,
    pub error_message: Option<Option<String>>,
    pub version: Option<i32>,
    pub updated_at: Option<NaiveDateTime>,
}

impl IngestionChanges {
    /// Terminal failure. Extracted fields are left untouched.
    pub fn failure(message: impl Into<String>) -> Self {
        IngestionChanges {
            processed: Some(true),
            error_message: Some(Some(message.into())),
            ..Default::default()
        }
    }

    /// URL located; the record stays pending until extraction finishes.
    pub fn located(url: impl Into<String>) -> Self {
        IngestionChanges {
            original_url: Some(Some(url.into())),
            processed: Some(false),
            error_message: Some(None),
            ..Default::default()
        }
    }

    pub fn success(platform: &str, result: ExtractionResult) -> Self {
        IngestionChanges {
            source_platform: Some(Some(platform.to_string())),
            title: Some(Some(result.title)),
            content: Some(Some(result.content)),
            author: Some(Some(result.author)),
            published_at: Some(result.published_at),
            platform_post_id: Some(result.platform_post_id),
            platform_data: Some(result.platform_data.map(|data| data.to_string())),
            processed: Some(true),
            error_message: Some(None),
            ..Default::default()
        }
    }
}

/// What an extractor produced for one URL. Missing fields are empty strings.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionResult {
    pub title: String,
    pub content: String,
    pub author: String,
    pub published_at: Option<NaiveDateTime>,
    pub platform_post_id: Option<String>,
    pub platform_data: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = crate::schema::inbound_addresses)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct InboundAddress {
    pub id: i32,
    pub user_id: String,
    pub email_address: String,
    pub webhook_username: String,
    pub webhook_password_hash: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = crate::schema::inbound_addresses)]
pub struct NewInboundAddress {
    pub user_id: String,
    pub email_address: String,
    pub webhook_username: String,
    pub webhook_password_hash: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SummaryStatus {
    Completed,
    Failed,
}

impl SummaryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SummaryStatus::Completed => "completed",
            SummaryStatus::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Serialize)]
#[diesel(table_name = crate::schema::summaries)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub id: i32,
    pub post_id: i32,
    pub user_id: String,
    pub summary_content: Option<String>,
    pub status: String,
    pub error_message: Option<String>,
    pub model: Option<String>,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = crate::schema::summaries)]
pub struct NewSummary {
    pub post_id: i32,
    pub user_id: String,
    pub summary_content: Option<String>,
    pub status: String,
    pub error_message: Option<String>,
    pub model: Option<String>,
}
