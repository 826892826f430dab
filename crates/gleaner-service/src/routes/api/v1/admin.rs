use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::auth::{AdminAccess, generate_address, generate_credentials, hash_password};
use crate::errors::ApiError;
use crate::models::NewInboundAddress;
use crate::repositories::InboundAddressRepository;
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct CreateAddressRequest {
    user_id: String,
}

/// Returned on creation and rotation; the only time the password is visible.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct AddressCredentialsResponse {
    user_id: String,
    email_address: String,
    username: String,
    password: String,
}

#[instrument(skip_all, fields(user_id = %payload.user_id))]
pub(super) async fn create_address<S: AppState>(
    State(state): State<S>,
    _admin: AdminAccess,
    Json(payload): Json<CreateAddressRequest>,
) -> Result<(StatusCode, Json<AddressCredentialsResponse>), ApiError> {
    let user_id = payload.user_id.trim().to_string();
    if user_id.is_empty() {
        return Err(ApiError::BadRequest("userId is required".to_string()));
    }

    let repo = state.address_repo();
    if repo.find_by_user(&user_id).await?.is_some() {
        warn!("User already has an inbound address");
        return Err(ApiError::BadRequest(
            "User already has an inbound address".to_string(),
        ));
    }

    let credentials = generate_credentials();
    let address = repo
        .create(&NewInboundAddress {
            user_id,
            email_address: generate_address(&state.config().inbound_email_domain),
            webhook_username: credentials.username.clone(),
            webhook_password_hash: hash_password(&credentials.password),
        })
        .await?;

    info!(email_address = %address.email_address, "Provisioned inbound address");

    Ok((
        StatusCode::CREATED,
        Json(AddressCredentialsResponse {
            user_id: address.user_id,
            email_address: address.email_address,
            username: credentials.username,
            password: credentials.password,
        }),
    ))
}

#[instrument(skip_all, fields(user_id = %user_id))]
pub(super) async fn rotate_credentials<S: AppState>(
    State(state): State<S>,
    _admin: AdminAccess,
    Path(user_id): Path<String>,
) -> Result<Json<AddressCredentialsResponse>, ApiError> {
    let credentials = generate_credentials();
    let address = state
        .address_repo()
        .update_credentials(
            &user_id,
            &credentials.username,
            &hash_password(&credentials.password),
        )
        .await?
        .ok_or(ApiError::NotFound)?;

    info!("Rotated webhook credentials");

    Ok(Json(AddressCredentialsResponse {
        user_id: address.user_id,
        email_address: address.email_address,
        username: credentials.username,
        password: credentials.password,
    }))
}
