use axum::{
    Json,
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::auth::IngestUser;
use crate::errors::ApiError;
use crate::models::{IngestionRecord, NewIngestionRecord};
use crate::repositories::IngestionRepository;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub(super) struct IngestQuery {
    url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IngestBody {
    ingest_id: Option<i32>,
    url: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct IngestResponse {
    success: bool,
    ingest_id: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    record: IngestionRecord,
}

impl IngestResponse {
    /// 200 for pending or successful records, 422 for terminal failures.
    pub(super) fn for_record(record: IngestionRecord) -> Response {
        let status = if record.failed() {
            StatusCode::UNPROCESSABLE_ENTITY
        } else {
            StatusCode::OK
        };
        let body = IngestResponse {
            success: !record.failed(),
            ingest_id: record.id,
            error: record.error_message.clone(),
            record,
        };
        (status, Json(body)).into_response()
    }
}

/// `?url=` submits a new URL; a JSON `{ingestId}` body re-processes an owned record.
#[instrument(skip_all, fields(user_id = %user.user_id))]
pub(super) async fn ingest<S: AppState>(
    State(state): State<S>,
    user: IngestUser,
    Query(query): Query<IngestQuery>,
    body: Bytes,
) -> Result<Response, ApiError> {
    let body: IngestBody = if body.iter().all(u8::is_ascii_whitespace) {
        IngestBody::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|err| ApiError::BadRequest(format!("Invalid JSON body: {err}")))?
    };

    if let Some(id) = body.ingest_id {
        debug!(id, "Re-processing existing record");
        state
            .ingestion_repo()
            .find_for_user(id, &user.user_id)
            .await?
            .ok_or(ApiError::NotFound)?;

        let record = state.processor().process(id).await?;
        return Ok(IngestResponse::for_record(record));
    }

    let raw_url = query
        .url
        .or(body.url)
        .ok_or_else(|| ApiError::BadRequest("URL parameter or ingestId is required".to_string()))?;
    let url = state.processor().policy().validate(&raw_url)?;

    let record = state
        .ingestion_repo()
        .create(&NewIngestionRecord::from_url(&user.user_id, url.as_str()))
        .await?;
    info!(id = record.id, url = %url, "Created URL record");

    let record = if state.config().process_on_receive {
        state.processor().process(record.id).await?
    } else {
        record
    };

    Ok(IngestResponse::for_record(record))
}
