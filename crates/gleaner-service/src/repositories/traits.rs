use crate::errors::ApiError;
use crate::models::{
    InboundAddress, IngestionChanges, IngestionRecord, NewInboundAddress, NewIngestionRecord,
    NewSummary, Summary,
};
use async_trait::async_trait;

#[derive(Debug, Clone, Default)]
pub struct ListRecordsParams {
    pub user_id: String,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
    pub processed: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct ListRecordsResult {
    pub items: Vec<IngestionRecord>,
    pub total: u64,
}

#[async_trait]
pub trait IngestionRepository: Clone + Send + Sync + 'static {
    async fn create(&self, record: &NewIngestionRecord) -> Result<IngestionRecord, ApiError>;
    async fn find_by_id(&self, id: i32) -> Result<Option<IngestionRecord>, ApiError>;
    async fn find_for_user(
        &self,
        id: i32,
        user_id: &str,
    ) -> Result<Option<IngestionRecord>, ApiError>;
    async fn list(&self, params: &ListRecordsParams) -> Result<ListRecordsResult, ApiError>;
    /// Oldest unprocessed records first, optionally scoped to one user.
    async fn find_pending(
        &self,
        user_id: Option<&str>,
        limit: i64,
    ) -> Result<Vec<IngestionRecord>, ApiError>;
    /// Applies `changes` only if the stored version still equals
    /// `expected_version`; returns `None` when it does not.
    async fn update_versioned(
        &self,
        id: i32,
        expected_version: i32,
        changes: &IngestionChanges,
    ) -> Result<Option<IngestionRecord>, ApiError>;
}

#[async_trait]
pub trait InboundAddressRepository: Clone + Send + Sync + 'static {
    async fn find_by_email(&self, email_address: &str)
    -> Result<Option<InboundAddress>, ApiError>;
    async fn find_by_username(&self, username: &str) -> Result<Option<InboundAddress>, ApiError>;
    async fn find_by_user(&self, user_id: &str) -> Result<Option<InboundAddress>, ApiError>;
    async fn create(&self, address: &NewInboundAddress) -> Result<InboundAddress, ApiError>;
    async fn update_credentials(
        &self,
        user_id: &str,
        username: &str,
        password_hash: &str,
    ) -> Result<Option<InboundAddress>, ApiError>;
}

#[async_trait]
pub trait SummaryRepository: Clone + Send + Sync + 'static {
    async fn create(&self, summary: &NewSummary) -> Result<Summary, ApiError>;
    async fn latest_for_post(&self, post_id: i32) -> Result<Option<Summary>, ApiError>;
}
