use super::lock;
use super::traits::SummaryRepository;
use crate::errors::ApiError;
use crate::models::{NewSummary, Summary};
use crate::schema::summaries;
use async_trait::async_trait;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub struct SqliteSummaryRepository {
    db: Arc<Mutex<SqliteConnection>>,
}

impl SqliteSummaryRepository {
    pub fn new(db: Arc<Mutex<SqliteConnection>>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SummaryRepository for SqliteSummaryRepository {
    async fn create(&self, summary: &NewSummary) -> Result<Summary, ApiError> {
        let mut conn = lock(&self.db)?;
        let result = diesel::insert_into(summaries::table)
            .values(summary)
            .returning(Summary::as_returning())
            .get_result(&mut *conn)?;
        Ok(result)
    }

    async fn latest_for_post(&self, post_id: i32) -> Result<Option<Summary>, ApiError> {
        let mut conn = lock(&self.db)?;
        let result = summaries::table
            .filter(summaries::post_id.eq(post_id))
            .order(summaries::id.desc())
            .select(Summary::as_select())
            .first(&mut *conn)
            .optional()?;
        Ok(result)
    }
}
