use crate::common::{StaticFetcher, TestApp, TestUser, provision_user, test_app};
use anyhow::Result;
use axum::http::StatusCode;
use gleaner_service::AppState;
use gleaner_service::models::NewIngestionRecord;
use gleaner_service::repositories::IngestionRepository;
use serde_json::Value;

async fn seed(app: &TestApp, user: &TestUser, url: &str) -> Result<i32> {
    let record = app
        .state
        .ingestion_repo()
        .create(&NewIngestionRecord::from_url(&user.user_id, url))
        .await?;
    Ok(record.id)
}

#[tokio::test]
async fn test_list_only_returns_own_records() -> Result<()> {
    let app = test_app(StaticFetcher::new());
    let alice = provision_user(&app.db, "alice", "share-alice@ingest.example.com");
    let bob = provision_user(&app.db, "bob", "share-bob@ingest.example.com");

    seed(&app, &alice, "https://example.com/1").await?;
    seed(&app, &alice, "https://example.com/2").await?;
    seed(&app, &bob, "https://example.com/3").await?;

    let response = alice.authorize(app.server.get("/api/v1/records")).await;
    response.assert_status_ok();

    let json: Value = response.json();
    assert_eq!(json["total"], 2);
    assert_eq!(json["limit"], 50);
    assert_eq!(json["offset"], 0);
    let items = json["items"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert!(items.iter().all(|item| item["userId"] == "alice"));

    Ok(())
}

#[tokio::test]
async fn test_list_pagination_and_processed_filter() -> Result<()> {
    let app = test_app(StaticFetcher::new().with_page("https://example.com/done", "<title>d</title>"));
    let user = provision_user(&app.db, "user-1", "share-aaa@ingest.example.com");

    let done = seed(&app, &user, "https://example.com/done").await?;
    for n in 0..3 {
        seed(&app, &user, &format!("https://example.com/p{n}")).await?;
    }
    app.state.processor().process(done).await?;

    let page = user
        .authorize(app.server.get("/api/v1/records"))
        .add_query_param("limit", 2)
        .add_query_param("offset", 1)
        .await
        .json::<Value>();
    assert_eq!(page["total"], 4);
    assert_eq!(page["items"].as_array().unwrap().len(), 2);
    assert_eq!(page["limit"], 2);
    assert_eq!(page["offset"], 1);

    let processed = user
        .authorize(app.server.get("/api/v1/records"))
        .add_query_param("processed", true)
        .await
        .json::<Value>();
    assert_eq!(processed["total"], 1);
    assert_eq!(processed["items"][0]["id"], done);

    Ok(())
}

#[tokio::test]
async fn test_list_rejects_zero_limit() -> Result<()> {
    let app = test_app(StaticFetcher::new());
    let user = provision_user(&app.db, "user-1", "share-aaa@ingest.example.com");

    let response = user
        .authorize(app.server.get("/api/v1/records"))
        .add_query_param("limit", 0)
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["error"], "Limit must be greater than 0");

    Ok(())
}

#[tokio::test]
async fn test_get_record_is_scoped_to_owner() -> Result<()> {
    let app = test_app(StaticFetcher::new());
    let alice = provision_user(&app.db, "alice", "share-alice@ingest.example.com");
    let bob = provision_user(&app.db, "bob", "share-bob@ingest.example.com");
    let id = seed(&app, &alice, "https://example.com/1").await?;

    let response = alice
        .authorize(app.server.get(&format!("/api/v1/records/{id}")))
        .await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["originalUrl"], "https://example.com/1");

    bob.authorize(app.server.get(&format!("/api/v1/records/{id}")))
        .await
        .assert_status(StatusCode::NOT_FOUND);

    alice
        .authorize(app.server.get("/api/v1/records/9999"))
        .await
        .assert_status(StatusCode::NOT_FOUND);

    Ok(())
}

#[tokio::test]
async fn test_process_single_record() -> Result<()> {
    let app = test_app(StaticFetcher::new().with_page(
        "https://medium.com/@writer/a-story-1a2b3c4d5e6f",
        r#"<head><title>A Story</title><meta name="description" content="Once upon a time"></head>"#,
    ));
    let user = provision_user(&app.db, "user-1", "share-aaa@ingest.example.com");
    let id = seed(&app, &user, "https://medium.com/@writer/a-story-1a2b3c4d5e6f").await?;

    let response = user
        .authorize(app.server.post(&format!("/api/v1/records/{id}/process")))
        .await;

    response.assert_status_ok();
    let json: Value = response.json();
    assert_eq!(json["success"], true);
    assert_eq!(json["record"]["sourcePlatform"], "medium");
    assert_eq!(json["record"]["platformPostId"], "1a2b3c4d5e6f");
    assert_eq!(json["record"]["title"], "A Story");
    assert_eq!(json["record"]["content"], "Once upon a time");

    Ok(())
}

#[tokio::test]
async fn test_process_pending_reports_each_record() -> Result<()> {
    let app = test_app(StaticFetcher::new().with_page("https://example.com/ok", "<title>ok</title>"));
    let user = provision_user(&app.db, "user-1", "share-aaa@ingest.example.com");
    let ok = seed(&app, &user, "https://example.com/ok").await?;
    let broken = seed(&app, &user, "https://example.com/gone").await?;

    let response = user
        .authorize(app.server.post("/api/v1/records/process-pending"))
        .await;

    response.assert_status_ok();
    let json: Value = response.json();
    assert_eq!(json["success"], true);
    let results = json["results"].as_array().unwrap();
    assert_eq!(results.len(), 2);

    let find = |id: i32| results.iter().find(|r| r["id"] == id).unwrap();
    assert_eq!(find(ok)["success"], true);
    assert_eq!(find(ok)["url"], "https://example.com/ok");
    assert!(find(ok).get("error").is_none());
    assert_eq!(find(broken)["success"], false);
    assert!(find(broken)["error"].as_str().unwrap().contains("404"));

    Ok(())
}

#[tokio::test]
async fn test_process_pending_limit_bounds() -> Result<()> {
    let app = test_app(StaticFetcher::new());
    let user = provision_user(&app.db, "user-1", "share-aaa@ingest.example.com");

    for limit in [0, 101] {
        user.authorize(app.server.post("/api/v1/records/process-pending"))
            .add_query_param("limit", limit)
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    let response = user
        .authorize(app.server.post("/api/v1/records/process-pending"))
        .add_query_param("limit", 100)
        .await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["results"], serde_json::json!([]));

    Ok(())
}
