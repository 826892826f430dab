use crate::errors::ApiError;
use diesel::sqlite::SqliteConnection;
use std::sync::{Mutex, MutexGuard};
use tracing::error;

pub mod addresses;
pub mod ingestion;
pub mod summaries;
pub mod traits;

pub use addresses::SqliteInboundAddressRepository;
pub use ingestion::SqliteIngestionRepository;
pub use summaries::SqliteSummaryRepository;
pub use traits::{
    InboundAddressRepository, IngestionRepository, ListRecordsParams, ListRecordsResult,
    SummaryRepository,
};

fn lock(db: &Mutex<SqliteConnection>) -> Result<MutexGuard<'_, SqliteConnection>, ApiError> {
    db.lock().map_err(|_| {
        error!("Database connection mutex poisoned");
        ApiError::InternalError
    })
}
