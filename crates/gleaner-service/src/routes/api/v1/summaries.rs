use axum::{
    Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::auth::IngestUser;
use crate::errors::ApiError;
use crate::models::{NewSummary, Summary, SummaryStatus};
use crate::repositories::{IngestionRepository, SummaryRepository};
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct CreateSummaryRequest {
    post_id: Option<i32>,
    content: Option<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct SummaryResponse {
    summary: String,
}

#[instrument(skip_all, fields(user_id = %user.user_id, post_id = ?payload.post_id))]
pub(super) async fn create_summary<S: AppState>(
    State(state): State<S>,
    user: IngestUser,
    Json(payload): Json<CreateSummaryRequest>,
) -> Result<Json<SummaryResponse>, ApiError> {
    let (Some(post_id), Some(content)) = (
        payload.post_id,
        payload.content.filter(|c| !c.trim().is_empty()),
    ) else {
        return Err(ApiError::BadRequest(
            "Missing required fields: postId and content are required".to_string(),
        ));
    };

    state
        .ingestion_repo()
        .find_for_user(post_id, &user.user_id)
        .await?
        .ok_or(ApiError::NotFound)?;

    let summarizer = state.summarizer();
    let outcome = summarizer.summarize(&content).await;

    let mut row = NewSummary {
        post_id,
        user_id: user.user_id,
        summary_content: None,
        status: SummaryStatus::Completed.as_str().to_string(),
        error_message: None,
        model: Some(summarizer.model().to_string()),
    };

    match outcome {
        Ok(summary) => {
            row.summary_content = Some(summary.clone());
            state.summary_repo().create(&row).await?;
            info!(post_id, "Stored summary");
            Ok(Json(SummaryResponse { summary }))
        }
        Err(err) => {
            warn!(post_id, error = %err, "Summarization failed");
            row.status = SummaryStatus::Failed.as_str().to_string();
            row.error_message = Some(err.to_string());
            state.summary_repo().create(&row).await?;
            Err(ApiError::Failure {
                error: "Failed to generate summary".to_string(),
                details: err.to_string(),
            })
        }
    }
}

#[instrument(skip_all, fields(post_id = %post_id))]
pub(super) async fn get_summary<S: AppState>(
    State(state): State<S>,
    user: IngestUser,
    Path(post_id): Path<i32>,
) -> Result<Json<Summary>, ApiError> {
    state
        .ingestion_repo()
        .find_for_user(post_id, &user.user_id)
        .await?
        .ok_or(ApiError::NotFound)?;

    state
        .summary_repo()
        .latest_for_post(post_id)
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound)
}
