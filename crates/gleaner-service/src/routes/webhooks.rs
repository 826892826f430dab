use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::HeaderMap,
    routing::post,
};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::AppState;
use crate::errors::ApiError;
use crate::models::{IngestionRecord, NewIngestionRecord};
use crate::repositories::{InboundAddressRepository, IngestionRepository};
use crate::webhook::{InboundEmail, SIGNATURE_HEADER, verify_signature};

#[derive(Debug, Serialize)]
struct WebhookResponse {
    success: bool,
    ingest: IngestionRecord,
}

fn malformed(details: impl Into<String>) -> ApiError {
    ApiError::Failure {
        error: "Invalid email payload".to_string(),
        details: details.into(),
    }
}

/// Receives one email from the mail provider. Signature and recipient are
/// checked before anything is written.
#[instrument(skip_all, fields(body_len = body.len()))]
async fn inbound_email<S: AppState>(
    State(state): State<S>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookResponse>, ApiError> {
    match state.config().webhook_signing_secret.as_deref() {
        Some(secret) => {
            let signature = headers
                .get(SIGNATURE_HEADER)
                .and_then(|value| value.to_str().ok());
            if let Err(err) = verify_signature(secret, &body, signature) {
                warn!(error = %err, "Rejected webhook signature");
                return Err(ApiError::unauthorized(err.to_string()));
            }
        }
        None => warn!("Webhook signing secret not configured; accepting unsigned payload"),
    }

    let email: InboundEmail =
        serde_json::from_slice(&body).map_err(|err| malformed(err.to_string()))?;
    let recipient = email
        .recipient()
        .ok_or_else(|| malformed("No recipient found in envelope or headers"))?;

    let Some(address) = state.address_repo().find_by_email(&recipient).await? else {
        warn!(recipient = %recipient, "No inbound address for recipient");
        return Err(ApiError::UnknownRecipient);
    };
    debug!(user_id = %address.user_id, "Resolved recipient");

    let record = state
        .ingestion_repo()
        .create(&NewIngestionRecord::from_email(
            address.user_id,
            email.subject(),
            email.body(),
            email.sender(),
            Some(email.metadata()),
        ))
        .await?;
    info!(id = record.id, "Created email record");

    // the email is stored at this point; a non-2xx answer would make the
    // provider redeliver it as a second record
    let record = if state.config().process_on_receive {
        match state.processor().process(record.id).await {
            Ok(processed) => processed,
            Err(err) => {
                warn!(id = record.id, error = %err, "Inline processing failed; record left for a later trigger");
                record
            }
        }
    } else {
        record
    };

    Ok(Json(WebhookResponse {
        success: true,
        ingest: record,
    }))
}

pub fn create_webhook_router<S: AppState>() -> Router<S> {
    Router::new().route("/inbound-email", post(inbound_email::<S>))
}
