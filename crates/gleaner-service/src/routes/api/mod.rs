use crate::AppState;
use crate::errors::ApiError;
use axum::Router;

pub mod v1;

/// Unknown API paths answer with the JSON error shape instead of an empty 404.
async fn not_found() -> ApiError {
    ApiError::NotFound
}

pub fn create_api_router<S: AppState>() -> Router<S> {
    Router::new()
        .nest("/v1", v1::create_api_v1_router())
        .fallback(not_found)
}
