use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";
pub const DEFAULT_SUMMARY_MODEL: &str = "llama-3.1-sonar-small-128k-online";

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("Invalid value for {var}: {value}")]
    Invalid { var: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub user_agent: String,
    pub timeout: Duration,
    pub max_body_bytes: usize,
    pub allow_private_hosts: bool,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: Duration::from_secs(30),
            max_body_bytes: 2 * 1024 * 1024,
            allow_private_hosts: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SummaryConfig {
    pub api_base: String,
    pub api_key: Option<String>,
    pub model: String,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.perplexity.ai".to_string(),
            api_key: None,
            model: DEFAULT_SUMMARY_MODEL.to_string(),
        }
    }
}

/// Service configuration, read from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_address: String,
    pub webhook_signing_secret: Option<String>,
    pub admin_token: Option<String>,
    pub inbound_email_domain: String,
    pub process_on_receive: bool,
    pub batch_limit: i64,
    pub request_timeout: Duration,
    pub fetch: FetchConfig,
    pub summary: SummaryConfig,
}

impl Config {
    /// Defaults suitable for tests and local runs against the given database.
    pub fn for_database(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            bind_address: "0.0.0.0:3000".to_string(),
            webhook_signing_secret: None,
            admin_token: None,
            inbound_email_domain: "ingest.example.com".to_string(),
            process_on_receive: true,
            batch_limit: 10,
            request_timeout: Duration::from_secs(60),
            fetch: FetchConfig::default(),
            summary: SummaryConfig::default(),
        }
    }

    /// Load configuration from environment variables, reading `.env` first if present.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;
        let mut config = Self::for_database(database_url);

        if let Some(bind_address) = lookup("BIND_ADDRESS") {
            config.bind_address = bind_address;
        }
        config.webhook_signing_secret = non_empty(lookup("WEBHOOK_SIGNING_SECRET"));
        config.admin_token = non_empty(lookup("ADMIN_TOKEN"));
        if let Some(domain) = non_empty(lookup("INBOUND_EMAIL_DOMAIN")) {
            config.inbound_email_domain = domain.to_lowercase();
        }
        if let Some(value) = parse_var(&lookup, "PROCESS_ON_RECEIVE", parse_bool)? {
            config.process_on_receive = value;
        }
        if let Some(limit) = parse_var(&lookup, "BATCH_LIMIT", parse_positive)? {
            config.batch_limit = limit;
        }
        if let Some(secs) = parse_var(&lookup, "REQUEST_TIMEOUT_SECS", parse_positive)? {
            config.request_timeout = Duration::from_secs(secs as u64);
        }

        if let Some(secs) = parse_var(&lookup, "FETCH_TIMEOUT_SECS", parse_positive)? {
            config.fetch.timeout = Duration::from_secs(secs as u64);
        }
        if let Some(bytes) = parse_var(&lookup, "FETCH_MAX_BODY_BYTES", parse_positive)? {
            config.fetch.max_body_bytes = bytes as usize;
        }
        if let Some(user_agent) = non_empty(lookup("FETCH_USER_AGENT")) {
            config.fetch.user_agent = user_agent;
        }
        if let Some(allow) = parse_var(&lookup, "FETCH_ALLOW_PRIVATE_HOSTS", parse_bool)? {
            config.fetch.allow_private_hosts = allow;
        }

        if let Some(api_base) = non_empty(lookup("SUMMARY_API_BASE")) {
            config.summary.api_base = api_base;
        }
        config.summary.api_key = non_empty(lookup("SUMMARY_API_KEY"));
        if let Some(model) = non_empty(lookup("SUMMARY_MODEL")) {
            config.summary.model = model;
        }

        Ok(config)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn parse_var<F, T>(
    lookup: &F,
    var: &'static str,
    parse: fn(&str) -> Option<T>,
) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match non_empty(lookup(var)) {
        None => Ok(None),
        Some(value) => parse(value.trim())
            .map(Some)
            .ok_or(ConfigError::Invalid { var, value }),
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn parse_positive(value: &str) -> Option<i64> {
    i64::from_str(value).ok().filter(|v| *v > 0)
}
