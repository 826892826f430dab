use crate::AppState;
use axum::{
    Router,
    routing::{get, post},
};

mod admin;
mod ingest;
mod records;
mod summaries;

pub fn create_api_v1_router<S: AppState>() -> Router<S> {
    Router::new()
        .route("/ingest", get(ingest::ingest::<S>).post(ingest::ingest::<S>))
        .route("/records", get(records::list_records::<S>))
        .route(
            "/records/process-pending",
            post(records::process_pending::<S>),
        )
        .route("/records/{id}", get(records::get_record::<S>))
        .route("/records/{id}/process", post(records::process_record::<S>))
        .route("/summaries", post(summaries::create_summary::<S>))
        .route("/summaries/{post_id}", get(summaries::get_summary::<S>))
        .route("/admin/addresses", post(admin::create_address::<S>))
        .route(
            "/admin/addresses/{user_id}/credentials",
            post(admin::rotate_credentials::<S>),
        )
}
