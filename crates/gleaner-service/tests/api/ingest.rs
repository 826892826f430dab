use crate::common::{StaticFetcher, StubSummarizer, build_app, provision_user, test_app, test_config};
use anyhow::Result;
use axum::http::{HeaderValue, StatusCode, header::AUTHORIZATION};
use serde_json::{Value, json};

const POST_URL: &str = "https://example.com/post";

#[tokio::test]
async fn test_ingest_url_via_query() -> Result<()> {
    let app = test_app(StaticFetcher::new().with_page(
        POST_URL,
        r#"<head><meta property="og:title" content="X"><meta name="author" content="Ann"></head>"#,
    ));
    let user = provision_user(&app.db, "user-1", "share-aaa@ingest.example.com");

    let response = user
        .authorize(app.server.get("/api/v1/ingest"))
        .add_query_param("url", POST_URL)
        .await;

    response.assert_status_ok();
    let json: Value = response.json();
    assert_eq!(json["success"], true);
    assert_eq!(json["record"]["sourceType"], "url");
    assert_eq!(json["record"]["title"], "X");
    assert_eq!(json["record"]["author"], "Ann");
    assert_eq!(json["record"]["originalUrl"], POST_URL);
    assert_eq!(json["ingestId"], json["record"]["id"]);

    Ok(())
}

#[tokio::test]
async fn test_ingest_accepts_post_with_json_url() -> Result<()> {
    let app = test_app(StaticFetcher::new().with_page(POST_URL, "<title>Posted</title>"));
    let user = provision_user(&app.db, "user-1", "share-aaa@ingest.example.com");

    let response = user
        .authorize(app.server.post("/api/v1/ingest"))
        .json(&json!({ "url": POST_URL }))
        .await;

    response.assert_status_ok();
    let json: Value = response.json();
    assert_eq!(json["record"]["title"], "Posted");

    Ok(())
}

#[tokio::test]
async fn test_terminal_failure_is_422_with_record() -> Result<()> {
    let app = test_app(StaticFetcher::new().with_status(POST_URL, 404));
    let user = provision_user(&app.db, "user-1", "share-aaa@ingest.example.com");

    let response = user
        .authorize(app.server.post("/api/v1/ingest"))
        .add_query_param("url", POST_URL)
        .await;

    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    let json: Value = response.json();
    assert_eq!(json["error"], "Failed to fetch content: HTTP error status: 404");
    assert_eq!(json["record"]["processed"], true);
    assert!(json["record"]["title"].is_null());
    assert!(json["ingestId"].is_number());

    Ok(())
}

#[tokio::test]
async fn test_reprocess_by_ingest_id() -> Result<()> {
    let fetcher = StaticFetcher::new().with_status(POST_URL, 404);
    let app = test_app(fetcher.clone());
    let user = provision_user(&app.db, "user-1", "share-aaa@ingest.example.com");

    let response = user
        .authorize(app.server.post("/api/v1/ingest"))
        .add_query_param("url", POST_URL)
        .await;
    let id = response.json::<Value>()["ingestId"].as_i64().unwrap();

    fetcher.set_page(POST_URL, "<title>Fixed</title>");
    let response = user
        .authorize(app.server.post("/api/v1/ingest"))
        .json(&json!({ "ingestId": id }))
        .await;

    response.assert_status_ok();
    let json: Value = response.json();
    assert_eq!(json["ingestId"], id);
    assert_eq!(json["record"]["title"], "Fixed");
    assert!(json["record"]["errorMessage"].is_null());

    Ok(())
}

#[tokio::test]
async fn test_cannot_reprocess_another_users_record() -> Result<()> {
    let app = test_app(StaticFetcher::new().with_page(POST_URL, "<title>Mine</title>"));
    let owner = provision_user(&app.db, "owner", "share-own@ingest.example.com");
    let intruder = provision_user(&app.db, "intruder", "share-int@ingest.example.com");

    let id = owner
        .authorize(app.server.post("/api/v1/ingest"))
        .add_query_param("url", POST_URL)
        .await
        .json::<Value>()["ingestId"]
        .as_i64()
        .unwrap();

    intruder
        .authorize(app.server.post("/api/v1/ingest"))
        .json(&json!({ "ingestId": id }))
        .await
        .assert_status(StatusCode::NOT_FOUND);

    Ok(())
}

#[tokio::test]
async fn test_authentication_failures() -> Result<()> {
    let app = test_app(StaticFetcher::new());
    let user = provision_user(&app.db, "user-1", "share-aaa@ingest.example.com");

    app.server
        .get("/api/v1/ingest")
        .add_query_param("url", POST_URL)
        .await
        .assert_status(StatusCode::UNAUTHORIZED);

    let wrong = format!("{}-wrong", user.password);
    let header = {
        use base64::Engine;
        let encoded = base64::engine::general_purpose::STANDARD
            .encode(format!("{}:{wrong}", user.username));
        HeaderValue::from_str(&format!("Basic {encoded}"))?
    };
    let response = app
        .server
        .get("/api/v1/ingest")
        .add_header(AUTHORIZATION, header)
        .add_query_param("url", POST_URL)
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);
    assert_eq!(response.json::<Value>()["error"], "Invalid credentials");

    Ok(())
}

#[tokio::test]
async fn test_missing_or_invalid_url_is_400() -> Result<()> {
    let app = test_app(StaticFetcher::new());
    let user = provision_user(&app.db, "user-1", "share-aaa@ingest.example.com");

    let response = user.authorize(app.server.get("/api/v1/ingest")).await;
    response.assert_status(StatusCode::BAD_REQUEST);

    for bad in ["not a url", "ftp://example.com/file", "http://localhost/admin"] {
        user.authorize(app.server.get("/api/v1/ingest"))
            .add_query_param("url", bad)
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    user.authorize(app.server.post("/api/v1/ingest"))
        .content_type("application/json")
        .text("{oops")
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    Ok(())
}

#[tokio::test]
async fn test_intake_without_inline_processing_stays_pending() -> Result<()> {
    let mut config = test_config();
    config.process_on_receive = false;
    let fetcher = StaticFetcher::new();
    let app = build_app(config, fetcher.clone(), StubSummarizer::replying("unused"));
    let user = provision_user(&app.db, "user-1", "share-aaa@ingest.example.com");

    let response = user
        .authorize(app.server.get("/api/v1/ingest"))
        .add_query_param("url", POST_URL)
        .await;

    response.assert_status_ok();
    let json: Value = response.json();
    assert_eq!(json["record"]["processed"], false);
    assert_eq!(fetcher.hits(), 0);

    Ok(())
}
