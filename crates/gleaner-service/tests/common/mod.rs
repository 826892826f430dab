#![allow(dead_code)]

use async_trait::async_trait;
use axum::http::{HeaderValue, header::AUTHORIZATION};
use axum_test::{TestRequest, TestServer};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use gleaner_service::{
    DefaultAppState,
    auth::hash_password,
    create_app,
    config::Config,
    db::establish_connection,
    extraction::{FetchError, FetchedPage, PageFetcher},
    models::{IngestionRecord, NewInboundAddress},
    schema::{inbound_addresses, ingestion_records},
    summarize::{SummarizeError, Summarizer},
    webhook,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;
use url::Url;

pub type Db = Arc<Mutex<SqliteConnection>>;

pub const WEBHOOK_SECRET: &str = "whsec_test_secret";
pub const ADMIN_TOKEN: &str = "admin-test-token";

pub fn establish_test_connection() -> SqliteConnection {
    establish_connection(":memory:").expect("Failed to create in-memory database")
}

pub fn test_config() -> Config {
    let mut config = Config::for_database(":memory:");
    config.webhook_signing_secret = Some(WEBHOOK_SECRET.to_string());
    config.admin_token = Some(ADMIN_TOKEN.to_string());
    config
}

/// Canned pages keyed by normalized URL. Unknown URLs answer 404.
#[derive(Clone, Default)]
pub struct StaticFetcher {
    responses: Arc<Mutex<HashMap<String, Result<String, u16>>>>,
    hits: Arc<AtomicUsize>,
}

impl StaticFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(self, url: &str, body: &str) -> Self {
        self.set_page(url, body);
        self
    }

    pub fn with_status(self, url: &str, status: u16) -> Self {
        self.responses
            .lock()
            .unwrap()
            .insert(normalize(url), Err(status));
        self
    }

    pub fn set_page(&self, url: &str, body: &str) {
        self.responses
            .lock()
            .unwrap()
            .insert(normalize(url), Ok(body.to_string()));
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

fn normalize(url: &str) -> String {
    Url::parse(url).expect("test URL should parse").to_string()
}

#[async_trait]
impl PageFetcher for StaticFetcher {
    async fn fetch(&self, url: &Url) -> Result<FetchedPage, FetchError> {
        self.hits.fetch_add(1, Ordering::SeqCst);
        let response = self.responses.lock().unwrap().get(url.as_str()).cloned();
        match response {
            Some(Ok(body)) => Ok(FetchedPage {
                status: 200,
                final_url: url.to_string(),
                body,
            }),
            Some(Err(status)) => Err(FetchError::Status {
                status,
                final_url: url.to_string(),
            }),
            None => Err(FetchError::Status {
                status: 404,
                final_url: url.to_string(),
            }),
        }
    }
}

/// Blocks every fetch until `release` is notified; signals `entered` first.
#[derive(Clone)]
pub struct GatedFetcher {
    pub inner: StaticFetcher,
    pub entered: Arc<Notify>,
    pub release: Arc<Notify>,
}

impl GatedFetcher {
    pub fn new(inner: StaticFetcher) -> Self {
        Self {
            inner,
            entered: Arc::new(Notify::new()),
            release: Arc::new(Notify::new()),
        }
    }
}

#[async_trait]
impl PageFetcher for GatedFetcher {
    async fn fetch(&self, url: &Url) -> Result<FetchedPage, FetchError> {
        self.entered.notify_one();
        self.release.notified().await;
        self.inner.fetch(url).await
    }
}

pub struct StubSummarizer {
    reply: Result<String, String>,
}

impl StubSummarizer {
    pub fn replying(summary: &str) -> Self {
        Self {
            reply: Ok(summary.to_string()),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            reply: Err(message.to_string()),
        }
    }
}

#[async_trait]
impl Summarizer for StubSummarizer {
    async fn summarize(&self, _content: &str) -> Result<String, SummarizeError> {
        self.reply.clone().map_err(|body| SummarizeError::Api { status: 500, body })
    }

    fn model(&self) -> &str {
        "stub-model"
    }
}

pub struct TestApp {
    pub server: TestServer,
    pub db: Db,
    pub state: DefaultAppState,
}

pub fn test_app(fetcher: impl PageFetcher + 'static) -> TestApp {
    build_app(test_config(), fetcher, StubSummarizer::replying("A short summary."))
}

pub fn build_app(
    config: Config,
    fetcher: impl PageFetcher + 'static,
    summarizer: impl Summarizer + 'static,
) -> TestApp {
    let db: Db = Arc::new(Mutex::new(establish_test_connection()));
    let state =
        DefaultAppState::with_services(db.clone(), config, Arc::new(fetcher), Arc::new(summarizer));
    let app = create_app(state.clone());

    TestApp {
        server: TestServer::new(app).unwrap(),
        db,
        state,
    }
}

pub struct TestUser {
    pub user_id: String,
    pub email_address: String,
    pub username: String,
    pub password: String,
}

impl TestUser {
    pub fn basic_auth(&self) -> HeaderValue {
        let encoded = STANDARD.encode(format!("{}:{}", self.username, self.password));
        HeaderValue::from_str(&format!("Basic {encoded}")).unwrap()
    }

    pub fn authorize(&self, request: TestRequest) -> TestRequest {
        request.add_header(AUTHORIZATION, self.basic_auth())
    }
}

pub fn provision_user(db: &Db, user_id: &str, email_address: &str) -> TestUser {
    let user = TestUser {
        user_id: user_id.to_string(),
        email_address: email_address.to_string(),
        username: format!("ingest_{user_id}"),
        password: format!("{user_id}-password"),
    };

    let mut conn = db.lock().unwrap();
    diesel::insert_into(inbound_addresses::table)
        .values(&NewInboundAddress {
            user_id: user.user_id.clone(),
            email_address: user.email_address.clone(),
            webhook_username: user.username.clone(),
            webhook_password_hash: hash_password(&user.password),
        })
        .execute(&mut *conn)
        .unwrap();

    user
}

pub fn signature_for(body: &[u8]) -> HeaderValue {
    HeaderValue::from_str(&webhook::sign(WEBHOOK_SECRET, body).unwrap()).unwrap()
}

pub fn load_record(db: &Db, id: i32) -> IngestionRecord {
    let mut conn = db.lock().unwrap();
    ingestion_records::table
        .find(id)
        .select(IngestionRecord::as_select())
        .first(&mut *conn)
        .unwrap()
}

pub fn count_records(db: &Db) -> i64 {
    let mut conn = db.lock().unwrap();
    ingestion_records::table
        .count()
        .get_result(&mut *conn)
        .unwrap()
}

/// Simulates a write from another process.
pub fn bump_version(db: &Db, id: i32) {
    let mut conn = db.lock().unwrap();
    diesel::update(ingestion_records::table.find(id))
        .set(ingestion_records::version.eq(ingestion_records::version + 1))
        .execute(&mut *conn)
        .unwrap();
}

pub fn email_payload(recipient: &str, html: &str) -> serde_json::Value {
    serde_json::json!({
        "headers": {
            "subject": "Worth a read",
            "content-type": "text/html",
            "from": "Friend <friend@example.org>",
            "to": recipient
        },
        "envelope": {
            "from": "friend@example.org",
            "to": recipient,
            "recipients": [recipient],
            "helo_domain": "mail.example.org",
            "remote_ip": "203.0.113.7"
        },
        "plain": null,
        "html": html,
        "attachments": []
    })
}
