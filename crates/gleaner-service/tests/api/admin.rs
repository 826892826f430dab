use crate::common::{ADMIN_TOKEN, StaticFetcher, StubSummarizer, build_app, test_app, test_config};
use anyhow::Result;
use axum::http::{HeaderValue, StatusCode, header::AUTHORIZATION};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde_json::{Value, json};

fn bearer(token: &str) -> HeaderValue {
    HeaderValue::from_str(&format!("Bearer {token}")).unwrap()
}

fn basic(username: &str, password: &str) -> HeaderValue {
    let encoded = STANDARD.encode(format!("{username}:{password}"));
    HeaderValue::from_str(&format!("Basic {encoded}")).unwrap()
}

#[tokio::test]
async fn test_provisioned_credentials_authenticate() -> Result<()> {
    let app = test_app(StaticFetcher::new());

    let response = app
        .server
        .post("/api/v1/admin/addresses")
        .add_header(AUTHORIZATION, bearer(ADMIN_TOKEN))
        .json(&json!({ "userId": "user-7" }))
        .await;

    response.assert_status(StatusCode::CREATED);
    let created: Value = response.json();
    assert_eq!(created["userId"], "user-7");
    let address = created["emailAddress"].as_str().unwrap();
    assert!(address.starts_with("share-"));
    assert!(address.ends_with("@ingest.example.com"));
    let username = created["username"].as_str().unwrap();
    let password = created["password"].as_str().unwrap();
    assert!(username.starts_with("ingest_"));

    let listing = app
        .server
        .get("/api/v1/records")
        .add_header(AUTHORIZATION, basic(username, password))
        .await;
    listing.assert_status_ok();
    assert_eq!(listing.json::<Value>()["total"], 0);

    Ok(())
}

#[tokio::test]
async fn test_second_address_for_same_user_is_rejected() -> Result<()> {
    let app = test_app(StaticFetcher::new());

    for expected in [StatusCode::CREATED, StatusCode::BAD_REQUEST] {
        app.server
            .post("/api/v1/admin/addresses")
            .add_header(AUTHORIZATION, bearer(ADMIN_TOKEN))
            .json(&json!({ "userId": "user-7" }))
            .await
            .assert_status(expected);
    }

    app.server
        .post("/api/v1/admin/addresses")
        .add_header(AUTHORIZATION, bearer(ADMIN_TOKEN))
        .json(&json!({ "userId": "   " }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    Ok(())
}

#[tokio::test]
async fn test_admin_token_is_required() -> Result<()> {
    let app = test_app(StaticFetcher::new());

    app.server
        .post("/api/v1/admin/addresses")
        .json(&json!({ "userId": "user-7" }))
        .await
        .assert_status(StatusCode::UNAUTHORIZED);

    let response = app
        .server
        .post("/api/v1/admin/addresses")
        .add_header(AUTHORIZATION, bearer("not-the-token"))
        .json(&json!({ "userId": "user-7" }))
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);
    assert_eq!(response.json::<Value>()["error"], "Invalid admin token");

    Ok(())
}

#[tokio::test]
async fn test_admin_routes_hidden_without_token() -> Result<()> {
    let mut config = test_config();
    config.admin_token = None;
    let app = build_app(config, StaticFetcher::new(), StubSummarizer::replying("unused"));

    app.server
        .post("/api/v1/admin/addresses")
        .add_header(AUTHORIZATION, bearer(ADMIN_TOKEN))
        .json(&json!({ "userId": "user-7" }))
        .await
        .assert_status(StatusCode::NOT_FOUND);

    Ok(())
}

#[tokio::test]
async fn test_rotation_invalidates_old_password() -> Result<()> {
    let app = test_app(StaticFetcher::new());

    let created: Value = app
        .server
        .post("/api/v1/admin/addresses")
        .add_header(AUTHORIZATION, bearer(ADMIN_TOKEN))
        .json(&json!({ "userId": "user-7" }))
        .await
        .json();

    let response = app
        .server
        .post("/api/v1/admin/addresses/user-7/credentials")
        .add_header(AUTHORIZATION, bearer(ADMIN_TOKEN))
        .await;
    response.assert_status_ok();
    let rotated: Value = response.json();
    assert_eq!(rotated["emailAddress"], created["emailAddress"]);
    assert_ne!(rotated["password"], created["password"]);

    app.server
        .get("/api/v1/records")
        .add_header(
            AUTHORIZATION,
            basic(
                created["username"].as_str().unwrap(),
                created["password"].as_str().unwrap(),
            ),
        )
        .await
        .assert_status(StatusCode::UNAUTHORIZED);

    app.server
        .get("/api/v1/records")
        .add_header(
            AUTHORIZATION,
            basic(
                rotated["username"].as_str().unwrap(),
                rotated["password"].as_str().unwrap(),
            ),
        )
        .await
        .assert_status_ok();

    app.server
        .post("/api/v1/admin/addresses/nobody/credentials")
        .add_header(AUTHORIZATION, bearer(ADMIN_TOKEN))
        .await
        .assert_status(StatusCode::NOT_FOUND);

    Ok(())
}
