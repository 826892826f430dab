//! Inbound email payloads and their signatures.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_HEADER: &str = "resend-signature";
const SIGNATURE_VERSION: &str = "v1";

#[derive(Error, Debug, PartialEq)]
pub enum SignatureError {
    #[error("Missing signature")]
    Missing,
    #[error("Malformed signature")]
    Malformed,
    #[error("Invalid signature")]
    Invalid,
}

/// JSON body posted by the mail provider for each received message.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InboundEmail {
    #[serde(default)]
    pub headers: EmailHeaders,
    #[serde(default)]
    pub envelope: Envelope,
    #[serde(default)]
    pub plain: Option<String>,
    #[serde(default)]
    pub html: Option<String>,
    #[serde(default)]
    pub attachments: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmailHeaders {
    pub subject: Option<String>,
    #[serde(rename = "content-type")]
    pub content_type: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    #[serde(flatten)]
    pub other: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Envelope {
    pub from: Option<String>,
    pub to: Option<String>,
    #[serde(default)]
    pub recipients: Vec<String>,
    pub helo_domain: Option<String>,
    pub remote_ip: Option<String>,
}

impl InboundEmail {
    /// First envelope recipient, falling back to `envelope.to` and then the
    /// `To` header. Lower-cased and trimmed.
    pub fn recipient(&self) -> Option<String> {
        self.envelope
            .recipients
            .first()
            .or(self.envelope.to.as_ref())
            .or(self.headers.to.as_ref())
            .map(|raw| bare_address(raw).trim().to_lowercase())
            .filter(|address| !address.is_empty())
    }

    /// Raw body to store; HTML is preferred over plain text.
    pub fn body(&self) -> String {
        [&self.html, &self.plain]
            .into_iter()
            .flatten()
            .find(|body| !body.trim().is_empty())
            .cloned()
            .unwrap_or_default()
    }

    pub fn sender(&self) -> Option<String> {
        self.headers
            .from
            .clone()
            .or_else(|| self.envelope.from.clone())
            .filter(|sender| !sender.trim().is_empty())
    }

    pub fn subject(&self) -> Option<String> {
        self.headers
            .subject
            .clone()
            .filter(|subject| !subject.trim().is_empty())
    }

    /// Headers and envelope as stored in the record's `metadata` column.
    pub fn metadata(&self) -> String {
        json!({
            "headers": self.headers,
            "envelope": self.envelope,
            "attachmentCount": self.attachments.len(),
        })
        .to_string()
    }
}

/// `Jane <jane@example.com>` -> `jane@example.com`
fn bare_address(raw: &str) -> &str {
    match (raw.find('<'), raw.rfind('>')) {
        (Some(start), Some(end)) if start < end => &raw[start + 1..end],
        _ => raw,
    }
}

/// `v1,<base64 HMAC-SHA256(secret, body)>`
pub fn sign(secret: &str, body: &[u8]) -> Result<String, SignatureError> {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| SignatureError::Invalid)?;
    mac.update(body);
    Ok(format!(
        "{SIGNATURE_VERSION},{}",
        STANDARD.encode(mac.finalize().into_bytes())
    ))
}

/// Accepts a header holding one or more space-separated `v1,<sig>` entries;
/// any matching entry is enough.
pub fn verify_signature(
    secret: &str,
    body: &[u8],
    header: Option<&str>,
) -> Result<(), SignatureError> {
    let header = header
        .map(str::trim)
        .filter(|h| !h.is_empty())
        .ok_or(SignatureError::Missing)?;

    let candidates: Vec<Vec<u8>> = header
        .split_whitespace()
        .filter_map(|entry| entry.split_once(','))
        .filter(|(version, _)| *version == SIGNATURE_VERSION)
        .filter_map(|(_, signature)| STANDARD.decode(signature).ok())
        .collect();

    if candidates.is_empty() {
        return Err(SignatureError::Malformed);
    }

    for candidate in candidates {
        let mut mac =
            HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| SignatureError::Invalid)?;
        mac.update(body);
        if mac.verify_slice(&candidate).is_ok() {
            return Ok(());
        }
    }

    Err(SignatureError::Invalid)
}
