use super::lease::LeaseSet;
use super::normalizer::{NO_URL_FOUND, first_url};
use crate::errors::ApiError;
use crate::extraction::PlatformDispatcher;
use crate::models::{IngestionChanges, IngestionRecord, SourceType};
use crate::repositories::IngestionRepository;
use crate::validation::UrlPolicy;
use futures::future::join_all;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Outcome of one record in a batch run.
#[derive(Debug, Clone, Serialize)]
pub struct BatchOutcome {
    pub id: i32,
    pub success: bool,
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Runs URL location and content extraction for stored records.
///
/// Every write is conditional on the version read just before it, and a
/// record can only be processed by one task at a time within this process.
#[derive(Clone)]
pub struct IngestionProcessor<R> {
    repo: R,
    dispatcher: Arc<PlatformDispatcher>,
    policy: UrlPolicy,
    leases: LeaseSet,
}

impl<R: IngestionRepository> IngestionProcessor<R> {
    pub fn new(repo: R, dispatcher: Arc<PlatformDispatcher>, policy: UrlPolicy) -> Self {
        Self {
            repo,
            dispatcher,
            policy,
            leases: LeaseSet::default(),
        }
    }

    pub fn policy(&self) -> UrlPolicy {
        self.policy
    }

    /// Process one record to a terminal state and return it.
    ///
    /// Failures that belong to the record (no URL, invalid URL, fetch errors)
    /// are persisted on it and are not errors here.
    #[instrument(skip(self))]
    pub async fn process(&self, id: i32) -> Result<IngestionRecord, ApiError> {
        let _lease = self
            .leases
            .acquire(id)
            .ok_or(ApiError::AlreadyProcessing(id))?;

        let record = self.repo.find_by_id(id).await?.ok_or(ApiError::NotFound)?;

        let Some(target) = locate_url(&record) else {
            info!(id, "No URL found in record content");
            return self
                .commit(&record, IngestionChanges::failure(NO_URL_FOUND))
                .await;
        };

        let record = self
            .commit(&record, IngestionChanges::located(target.clone()))
            .await?;

        let url = match self.policy.validate(&target) {
            Ok(url) => url,
            Err(err) => {
                warn!(id, url = %target, error = %err, "Rejected record URL");
                return self
                    .commit(&record, IngestionChanges::failure(format!("Invalid URL: {err}")))
                    .await;
            }
        };

        let extractor = self.dispatcher.select(&url);
        let platform = extractor.platform();

        match extractor.extract(&url).await {
            Ok(result) => {
                info!(id, url = %url, platform, title = %result.title, "Extracted content");
                self.commit(&record, IngestionChanges::success(platform, result))
                    .await
            }
            Err(err) => {
                warn!(id, url = %url, platform, error = %err, "Content extraction failed");
                let changes = IngestionChanges {
                    source_platform: Some(Some(platform.to_string())),
                    ..IngestionChanges::failure(format!("Failed to fetch content: {err}"))
                };
                self.commit(&record, changes).await
            }
        }
    }

    /// Process up to `limit` pending records concurrently, oldest first.
    #[instrument(skip(self))]
    pub async fn process_pending(
        &self,
        user_id: Option<&str>,
        limit: i64,
    ) -> Result<Vec<BatchOutcome>, ApiError> {
        let pending = self.repo.find_pending(user_id, limit).await?;
        info!(count = pending.len(), "Processing pending records");

        let outcomes = join_all(pending.iter().map(|record| async move {
            let outcome = self.process(record.id).await;
            BatchOutcome::new(record, outcome)
        }))
        .await;

        Ok(outcomes)
    }

    async fn commit(
        &self,
        record: &IngestionRecord,
        changes: IngestionChanges,
    ) -> Result<IngestionRecord, ApiError> {
        self.repo
            .update_versioned(record.id, record.version, &changes)
            .await?
            .ok_or_else(|| {
                warn!(
                    id = record.id,
                    version = record.version,
                    "Record changed underneath processing; write discarded"
                );
                ApiError::VersionConflict(record.id)
            })
    }
}

impl BatchOutcome {
    fn new(pending: &IngestionRecord, outcome: Result<IngestionRecord, ApiError>) -> Self {
        match outcome {
            Ok(record) => BatchOutcome {
                id: record.id,
                success: record.succeeded(),
                url: record.original_url.clone(),
                error: record.error_message,
            },
            Err(err) => BatchOutcome {
                id: pending.id,
                success: false,
                url: pending.original_url.clone(),
                error: Some(err.to_string()),
            },
        }
    }
}

/// Email records always locate their URL in the body. URL records use the
/// submitted URL and only scan the body when none was stored.
fn locate_url(record: &IngestionRecord) -> Option<String> {
    let from_body = || record.content_body.as_deref().and_then(first_url);

    match record.source() {
        Some(SourceType::Email) => from_body(),
        _ => record
            .original_url
            .clone()
            .filter(|url| !url.trim().is_empty())
            .or_else(from_body),
    }
}
