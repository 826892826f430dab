use axum::{
    Json,
    extract::{Path, Query, State},
    response::Response,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use super::ingest::IngestResponse;
use crate::auth::IngestUser;
use crate::errors::ApiError;
use crate::models::IngestionRecord;
use crate::pipeline::BatchOutcome;
use crate::repositories::{IngestionRepository, ListRecordsParams};
use crate::AppState;

const DEFAULT_LIMIT: u32 = 50;
const MAX_BATCH_LIMIT: i64 = 100;

#[derive(Debug, Deserialize)]
pub(super) struct ListRecordsQuery {
    limit: Option<u32>,
    offset: Option<u32>,
    processed: Option<bool>,
}

#[derive(Debug, Serialize)]
pub(super) struct ListRecordsResponse {
    items: Vec<IngestionRecord>,
    total: u64,
    limit: u32,
    offset: u32,
}

#[derive(Debug, Deserialize)]
pub(super) struct ProcessPendingQuery {
    limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub(super) struct ProcessPendingResponse {
    success: bool,
    results: Vec<BatchOutcome>,
}

#[instrument(skip_all, fields(user_id = %user.user_id, limit = query.limit, offset = query.offset))]
pub(super) async fn list_records<S: AppState>(
    State(state): State<S>,
    user: IngestUser,
    Query(query): Query<ListRecordsQuery>,
) -> Result<Json<ListRecordsResponse>, ApiError> {
    if query.limit == Some(0) {
        return Err(ApiError::BadRequest(
            "Limit must be greater than 0".to_string(),
        ));
    }

    let params = ListRecordsParams {
        user_id: user.user_id,
        limit: query.limit,
        offset: query.offset,
        processed: query.processed,
    };
    let result = state.ingestion_repo().list(&params).await?;

    info!(
        returned_count = result.items.len(),
        total = result.total,
        "Listed records"
    );

    Ok(Json(ListRecordsResponse {
        items: result.items,
        total: result.total,
        limit: params.limit.unwrap_or(DEFAULT_LIMIT),
        offset: params.offset.unwrap_or(0),
    }))
}

#[instrument(skip_all, fields(id = %id))]
pub(super) async fn get_record<S: AppState>(
    State(state): State<S>,
    user: IngestUser,
    Path(id): Path<i32>,
) -> Result<Json<IngestionRecord>, ApiError> {
    let record = state
        .ingestion_repo()
        .find_for_user(id, &user.user_id)
        .await?;

    match record {
        Some(record) => Ok(Json(record)),
        None => {
            debug!("Record not found");
            Err(ApiError::NotFound)
        }
    }
}

#[instrument(skip_all, fields(id = %id))]
pub(super) async fn process_record<S: AppState>(
    State(state): State<S>,
    user: IngestUser,
    Path(id): Path<i32>,
) -> Result<Response, ApiError> {
    state
        .ingestion_repo()
        .find_for_user(id, &user.user_id)
        .await?
        .ok_or(ApiError::NotFound)?;

    let record = state.processor().process(id).await?;
    Ok(IngestResponse::for_record(record))
}

#[instrument(skip_all, fields(user_id = %user.user_id, limit = query.limit))]
pub(super) async fn process_pending<S: AppState>(
    State(state): State<S>,
    user: IngestUser,
    Query(query): Query<ProcessPendingQuery>,
) -> Result<Json<ProcessPendingResponse>, ApiError> {
    let limit = query.limit.unwrap_or(state.config().batch_limit);
    if !(1..=MAX_BATCH_LIMIT).contains(&limit) {
        return Err(ApiError::BadRequest(format!(
            "Limit must be between 1 and {MAX_BATCH_LIMIT}"
        )));
    }

    let results = state
        .processor()
        .process_pending(Some(&user.user_id), limit)
        .await?;

    info!(
        processed = results.len(),
        succeeded = results.iter().filter(|r| r.success).count(),
        "Processed pending records"
    );

    Ok(Json(ProcessPendingResponse {
        success: true,
        results,
    }))
}
