use crate::common::{StaticFetcher, StubSummarizer, build_app, provision_user, test_app, test_config};
use anyhow::Result;
use axum::http::StatusCode;
use gleaner_service::AppState;
use gleaner_service::models::NewIngestionRecord;
use gleaner_service::repositories::{IngestionRepository, SummaryRepository};
use serde_json::{Value, json};

#[tokio::test]
async fn test_summary_is_generated_and_stored() -> Result<()> {
    let app = test_app(StaticFetcher::new());
    let user = provision_user(&app.db, "user-1", "share-aaa@ingest.example.com");
    let record = app
        .state
        .ingestion_repo()
        .create(&NewIngestionRecord::from_url("user-1", "https://example.com/post"))
        .await?;

    let response = user
        .authorize(app.server.post("/api/v1/summaries"))
        .json(&json!({ "postId": record.id, "content": "A long article about engines." }))
        .await;

    response.assert_status_ok();
    assert_eq!(response.json::<Value>(), json!({ "summary": "A short summary." }));

    let stored = app
        .state
        .summary_repo()
        .latest_for_post(record.id)
        .await?
        .expect("summary row");
    assert_eq!(stored.status, "completed");
    assert_eq!(stored.summary_content.as_deref(), Some("A short summary."));
    assert_eq!(stored.model.as_deref(), Some("stub-model"));

    let latest = user
        .authorize(app.server.get(&format!("/api/v1/summaries/{}", record.id)))
        .await;
    latest.assert_status_ok();
    let latest: Value = latest.json();
    assert_eq!(latest["summaryContent"], "A short summary.");
    assert_eq!(latest["postId"], record.id);

    Ok(())
}

#[tokio::test]
async fn test_failed_summary_is_recorded() -> Result<()> {
    let app = build_app(
        test_config(),
        StaticFetcher::new(),
        StubSummarizer::failing("model overloaded"),
    );
    let user = provision_user(&app.db, "user-1", "share-aaa@ingest.example.com");
    let record = app
        .state
        .ingestion_repo()
        .create(&NewIngestionRecord::from_url("user-1", "https://example.com/post"))
        .await?;

    let response = user
        .authorize(app.server.post("/api/v1/summaries"))
        .json(&json!({ "postId": record.id, "content": "text" }))
        .await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let json: Value = response.json();
    assert_eq!(json["error"], "Failed to generate summary");
    assert!(json["details"].as_str().unwrap().contains("model overloaded"));

    let stored = app
        .state
        .summary_repo()
        .latest_for_post(record.id)
        .await?
        .expect("failed summary row");
    assert_eq!(stored.status, "failed");
    assert_eq!(stored.summary_content, None);
    assert!(stored.error_message.is_some());

    Ok(())
}

#[tokio::test]
async fn test_missing_fields_are_rejected() -> Result<()> {
    let app = test_app(StaticFetcher::new());
    let user = provision_user(&app.db, "user-1", "share-aaa@ingest.example.com");

    for body in [json!({ "content": "text" }), json!({ "postId": 1 }), json!({ "postId": 1, "content": "  " })] {
        let response = user
            .authorize(app.server.post("/api/v1/summaries"))
            .json(&body)
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(
            response.json::<Value>()["error"],
            "Missing required fields: postId and content are required"
        );
    }

    Ok(())
}

#[tokio::test]
async fn test_summary_requires_owned_record() -> Result<()> {
    let app = test_app(StaticFetcher::new());
    let user = provision_user(&app.db, "user-1", "share-aaa@ingest.example.com");
    let foreign = app
        .state
        .ingestion_repo()
        .create(&NewIngestionRecord::from_url("someone-else", "https://example.com/post"))
        .await?;

    user.authorize(app.server.post("/api/v1/summaries"))
        .json(&json!({ "postId": foreign.id, "content": "text" }))
        .await
        .assert_status(StatusCode::NOT_FOUND);

    user.authorize(app.server.get(&format!("/api/v1/summaries/{}", foreign.id)))
        .await
        .assert_status(StatusCode::NOT_FOUND);

    Ok(())
}

#[tokio::test]
async fn test_get_summary_before_any_exists_is_404() -> Result<()> {
    let app = test_app(StaticFetcher::new());
    let user = provision_user(&app.db, "user-1", "share-aaa@ingest.example.com");
    let record = app
        .state
        .ingestion_repo()
        .create(&NewIngestionRecord::from_url("user-1", "https://example.com/post"))
        .await?;

    user.authorize(app.server.get(&format!("/api/v1/summaries/{}", record.id)))
        .await
        .assert_status(StatusCode::NOT_FOUND);

    Ok(())
}
