use axum::Router;
use diesel::sqlite::SqliteConnection;
use std::sync::{Arc, Mutex};

pub mod auth;
pub mod config;
pub mod db;
pub mod errors;
pub mod extraction;
pub mod models;
pub mod pipeline;
pub mod repositories;
pub mod routes;
pub mod schema;
pub mod shutdown;
pub mod summarize;
pub mod validation;
pub mod webhook;

use config::Config;
use extraction::{HttpFetcher, PageFetcher, PlatformDispatcher};
use pipeline::IngestionProcessor;
use repositories::{
    InboundAddressRepository, IngestionRepository, SqliteInboundAddressRepository,
    SqliteIngestionRepository, SqliteSummaryRepository, SummaryRepository,
};
use summarize::{ChatCompletionsSummarizer, Summarizer};
use validation::UrlPolicy;

/// Everything a handler can reach.
pub trait AppState: Clone + Send + Sync + 'static {
    type IngestionRepo: IngestionRepository;
    type AddressRepo: InboundAddressRepository;
    type SummaryRepo: SummaryRepository;

    fn ingestion_repo(&self) -> Self::IngestionRepo;
    fn address_repo(&self) -> Self::AddressRepo;
    fn summary_repo(&self) -> Self::SummaryRepo;
    fn processor(&self) -> &IngestionProcessor<Self::IngestionRepo>;
    fn summarizer(&self) -> &dyn Summarizer;
    fn config(&self) -> &Config;
}

#[derive(Clone)]
pub struct DefaultAppState {
    ingestion_repo: SqliteIngestionRepository,
    address_repo: SqliteInboundAddressRepository,
    summary_repo: SqliteSummaryRepository,
    processor: IngestionProcessor<SqliteIngestionRepository>,
    summarizer: Arc<dyn Summarizer>,
    config: Arc<Config>,
}

impl DefaultAppState {
    /// Production wiring: `reqwest` fetcher and chat-completions summarizer.
    pub fn new(db: Arc<Mutex<SqliteConnection>>, config: Config) -> Result<Self, reqwest::Error> {
        let fetcher = Arc::new(HttpFetcher::new(&config.fetch)?);
        let summarizer = Arc::new(ChatCompletionsSummarizer::new(&config.summary)?);
        Ok(Self::with_services(db, config, fetcher, summarizer))
    }

    /// Wiring with caller-supplied network collaborators.
    pub fn with_services(
        db: Arc<Mutex<SqliteConnection>>,
        config: Config,
        fetcher: Arc<dyn PageFetcher>,
        summarizer: Arc<dyn Summarizer>,
    ) -> Self {
        let ingestion_repo = SqliteIngestionRepository::new(db.clone());
        let processor = IngestionProcessor::new(
            ingestion_repo.clone(),
            Arc::new(PlatformDispatcher::standard(fetcher)),
            UrlPolicy::new(config.fetch.allow_private_hosts),
        );

        Self {
            ingestion_repo,
            address_repo: SqliteInboundAddressRepository::new(db.clone()),
            summary_repo: SqliteSummaryRepository::new(db),
            processor,
            summarizer,
            config: Arc::new(config),
        }
    }
}

impl AppState for DefaultAppState {
    type IngestionRepo = SqliteIngestionRepository;
    type AddressRepo = SqliteInboundAddressRepository;
    type SummaryRepo = SqliteSummaryRepository;

    fn ingestion_repo(&self) -> Self::IngestionRepo {
        self.ingestion_repo.clone()
    }

    fn address_repo(&self) -> Self::AddressRepo {
        self.address_repo.clone()
    }

    fn summary_repo(&self) -> Self::SummaryRepo {
        self.summary_repo.clone()
    }

    fn processor(&self) -> &IngestionProcessor<Self::IngestionRepo> {
        &self.processor
    }

    fn summarizer(&self) -> &dyn Summarizer {
        self.summarizer.as_ref()
    }

    fn config(&self) -> &Config {
        &self.config
    }
}

pub fn create_app<S: AppState>(state: S) -> Router {
    routes::create_router().with_state(state)
}
