use crate::AppState;
use crate::errors::ApiError;
use crate::repositories::InboundAddressRepository;
use axum::extract::FromRequestParts;
use axum::http::{header::AUTHORIZATION, request::Parts};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use sha2::{Digest, Sha256};
use tracing::warn;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq)]
pub struct BasicCredentials {
    pub username: String,
    pub password: String,
}

/// Parse `Authorization: Basic <base64(user:pass)>`.
pub fn parse_basic_auth(header: &str) -> Option<BasicCredentials> {
    let (scheme, encoded) = header.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }

    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (username, password) = decoded.split_once(':')?;
    if username.is_empty() {
        return None;
    }

    Some(BasicCredentials {
        username: username.to_string(),
        password: password.to_string(),
    })
}

fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    scheme
        .eq_ignore_ascii_case("bearer")
        .then(|| token.trim())
        .filter(|token| !token.is_empty())
}

pub fn hash_password(password: &str) -> String {
    hex::encode(Sha256::digest(password.as_bytes()))
}

pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    constant_time_eq(hash_password(password).as_bytes(), stored_hash.as_bytes())
}

/// Constant-time comparison to prevent timing attacks.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter()
        .zip(b.iter())
        .fold(0u8, |acc, (x, y)| acc | (x ^ y))
        == 0
}

/// Freshly generated webhook credentials. The password is only ever shown once.
#[derive(Debug, Clone)]
pub struct GeneratedCredentials {
    pub username: String,
    pub password: String,
}

pub fn generate_credentials() -> GeneratedCredentials {
    GeneratedCredentials {
        username: format!("ingest_{}", short_id()),
        password: Uuid::new_v4().simple().to_string(),
    }
}

/// `share-<12 hex>@<domain>`
pub fn generate_address(domain: &str) -> String {
    format!("share-{}@{}", short_id(), domain.trim().to_lowercase())
}

fn short_id() -> String {
    let mut id = Uuid::new_v4().simple().to_string();
    id.truncate(12);
    id
}

/// A user authenticated with their webhook credentials over Basic auth.
pub struct IngestUser {
    pub user_id: String,
}

impl<S: AppState> FromRequestParts<S> for IngestUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let credentials = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_basic_auth)
            .ok_or_else(|| ApiError::unauthorized("Missing or malformed credentials"))?;

        let address = state
            .address_repo()
            .find_by_username(&credentials.username)
            .await?;

        match address {
            Some(address)
                if verify_password(&credentials.password, &address.webhook_password_hash) =>
            {
                Ok(IngestUser {
                    user_id: address.user_id,
                })
            }
            _ => {
                warn!(username = %credentials.username, "Rejected ingest credentials");
                Err(ApiError::unauthorized("Invalid credentials"))
            }
        }
    }
}

/// Holder of the configured admin bearer token. Admin routes answer 404 when
/// no token is configured.
pub struct AdminAccess;

impl<S: AppState> FromRequestParts<S> for AdminAccess {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Some(expected) = state.config().admin_token.as_deref() else {
            return Err(ApiError::NotFound);
        };

        let provided = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(bearer_token)
            .ok_or_else(|| ApiError::unauthorized("Missing admin token"))?;

        if constant_time_eq(provided.as_bytes(), expected.as_bytes()) {
            Ok(AdminAccess)
        } else {
            warn!("Rejected admin token");
            Err(ApiError::unauthorized("Invalid admin token"))
        }
    }
}
