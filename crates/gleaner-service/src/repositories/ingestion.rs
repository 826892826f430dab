use super::lock;
use super::traits::{IngestionRepository, ListRecordsParams, ListRecordsResult};
use crate::errors::ApiError;
use crate::models::{IngestionChanges, IngestionRecord, NewIngestionRecord};
use crate::schema::ingestion_records;
use async_trait::async_trait;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use std::sync::{Arc, Mutex};

const DEFAULT_LIST_LIMIT: u32 = 50;

#[derive(Clone)]
pub struct SqliteIngestionRepository {
    db: Arc<Mutex<SqliteConnection>>,
}

impl SqliteIngestionRepository {
    pub fn new(db: Arc<Mutex<SqliteConnection>>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl IngestionRepository for SqliteIngestionRepository {
    async fn create(&self, record: &NewIngestionRecord) -> Result<IngestionRecord, ApiError> {
        let mut conn = lock(&self.db)?;
        let result = diesel::insert_into(ingestion_records::table)
            .values(record)
            .returning(IngestionRecord::as_returning())
            .get_result(&mut *conn)?;
        Ok(result)
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<IngestionRecord>, ApiError> {
        let mut conn = lock(&self.db)?;
        let result = ingestion_records::table
            .find(id)
            .select(IngestionRecord::as_select())
            .first(&mut *conn)
            .optional()?;
        Ok(result)
    }

    async fn find_for_user(
        &self,
        id: i32,
        user_id: &str,
    ) -> Result<Option<IngestionRecord>, ApiError> {
        let mut conn = lock(&self.db)?;
        let result = ingestion_records::table
            .filter(ingestion_records::id.eq(id))
            .filter(ingestion_records::user_id.eq(user_id))
            .select(IngestionRecord::as_select())
            .first(&mut *conn)
            .optional()?;
        Ok(result)
    }

    async fn list(&self, params: &ListRecordsParams) -> Result<ListRecordsResult, ApiError> {
        let mut conn = lock(&self.db)?;

        let mut count_query = ingestion_records::table
            .filter(ingestion_records::user_id.eq(&params.user_id))
            .into_boxed();
        let mut items_query = ingestion_records::table
            .filter(ingestion_records::user_id.eq(&params.user_id))
            .into_boxed();

        if let Some(processed) = params.processed {
            count_query = count_query.filter(ingestion_records::processed.eq(processed));
            items_query = items_query.filter(ingestion_records::processed.eq(processed));
        }

        let total: i64 = count_query.count().get_result(&mut *conn)?;

        let items = items_query
            .order((
                ingestion_records::created_at.desc(),
                ingestion_records::id.desc(),
            ))
            .limit(i64::from(params.limit.unwrap_or(DEFAULT_LIST_LIMIT)))
            .offset(i64::from(params.offset.unwrap_or(0)))
            .select(IngestionRecord::as_select())
            .load(&mut *conn)?;

        Ok(ListRecordsResult {
            items,
            total: total as u64,
        })
    }

    async fn find_pending(
        &self,
        user_id: Option<&str>,
        limit: i64,
    ) -> Result<Vec<IngestionRecord>, ApiError> {
        let mut conn = lock(&self.db)?;

        let mut query = ingestion_records::table
            .filter(ingestion_records::processed.eq(false))
            .into_boxed();
        if let Some(user_id) = user_id {
            query = query.filter(ingestion_records::user_id.eq(user_id));
        }

        let records = query
            .order(ingestion_records::id.asc())
            .limit(limit)
            .select(IngestionRecord::as_select())
            .load(&mut *conn)?;
        Ok(records)
    }

    async fn update_versioned(
        &self,
        id: i32,
        expected_version: i32,
        changes: &IngestionChanges,
    ) -> Result<Option<IngestionRecord>, ApiError> {
        let changes = IngestionChanges {
            version: Some(expected_version + 1),
            updated_at: Some(chrono::Utc::now().naive_utc()),
            ..changes.clone()
        };

        let mut conn = lock(&self.db)?;
        let result = diesel::update(
            ingestion_records::table
                .filter(ingestion_records::id.eq(id))
                .filter(ingestion_records::version.eq(expected_version)),
        )
        .set(&changes)
        .returning(IngestionRecord::as_returning())
        .get_result(&mut *conn)
        .optional()?;
        Ok(result)
    }
}
