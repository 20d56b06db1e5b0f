//! HTTP API tests against an in-process router with mock collaborators.

mod common;

use std::time::Duration;

use axum::http::StatusCode;
use serde_json::json;

use common::{eventually, TestFixture};
use stickerforge_core::{OptionFlags, PublishError};

#[tokio::test]
async fn test_health_endpoint() {
    let fixture = TestFixture::new().await;
    let response = fixture.get("/api/v1/health").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "ok");
}

#[tokio::test]
async fn test_config_hides_bot_token() {
    let fixture = TestFixture::new().await;
    let response = fixture.get("/api/v1/config").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["telegram"]["bot_token_configured"], true);
    assert_eq!(response.body["admission"]["max_concurrent_jobs"], 2);
    assert!(!response.body.to_string().contains("123:abc"));
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let fixture = TestFixture::new().await;
    let (status, text) = fixture.get_text("/api/v1/metrics").await;
    assert_eq!(status, StatusCode::OK);
    assert!(text.contains("stickerforge_admission_slots_available"));
    assert!(text.contains("stickerforge_jobs_in_flight"));
}

#[tokio::test]
async fn test_create_job_publishes_set() {
    let fixture = TestFixture::new().await;
    fixture.add_stills(10, 2).await;

    let response = fixture
        .post(
            "/api/v1/jobs",
            json!({"requester_id": 1, "requester_name": "alice", "source_id": 10}),
        )
        .await;
    assert_eq!(response.status, StatusCode::ACCEPTED);
    assert_eq!(response.body["outcome"], "started");
    assert_eq!(response.body["source_id"], 10);

    fixture.wait_idle().await;
    let publisher = fixture.publisher.clone();
    eventually(|| {
        let publisher = publisher.clone();
        async move { publisher.created_sets().await.len() == 1 }
    })
    .await;

    let notices = fixture.get("/api/v1/requesters/1/notices").await;
    assert_eq!(notices.status, StatusCode::OK);
    assert_eq!(notices.body["session"]["state"], "idle");
    let list = notices.body["notices"].as_array().unwrap();
    assert_eq!(list.len(), 2);
    assert_eq!(list[0]["notice"]["type"], "started");
    assert_eq!(list[1]["notice"]["type"], "completed");
    assert!(list[1]["message"]
        .as_str()
        .unwrap()
        .contains("https://t.me/addstickers/"));
}

#[tokio::test]
async fn test_command_endpoint_creates_job() {
    let fixture = TestFixture::new().await;
    fixture.add_stills(10, 1).await;

    let response = fixture
        .post(
            "/api/v1/commands",
            json!({"requester_id": 1, "requester_name": "alice", "text": "/create 10"}),
        )
        .await;
    assert_eq!(response.status, StatusCode::ACCEPTED);
    assert_eq!(response.body["command"], "create");
    assert_eq!(response.body["outcome"]["outcome"], "started");

    fixture.wait_idle().await;
}

#[tokio::test]
async fn test_command_usage_error() {
    let fixture = TestFixture::new().await;

    let response = fixture
        .post(
            "/api/v1/commands",
            json!({"requester_id": 1, "text": "/create -x 10"}),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(response.body["error"].as_str().unwrap().contains("/create"));

    let notices = fixture.inbox.notices_for(1).await;
    assert_eq!(notices.len(), 1);
    assert!(notices[0].notice.is_error());
}

#[tokio::test]
async fn test_existing_set_is_returned() {
    let fixture = TestFixture::new().await;
    fixture
        .registry
        .add_existing(10, OptionFlags::default(), "https://t.me/addstickers/x_by_forge_bot")
        .await;

    let response = fixture
        .post("/api/v1/jobs", json!({"requester_id": 1, "source_id": 10}))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["outcome"], "already_published");
    assert_eq!(
        response.body["url"],
        "https://t.me/addstickers/x_by_forge_bot"
    );
    assert!(fixture.manager.jobs().is_empty());
}

#[tokio::test]
async fn test_overwrite_without_set_is_not_found() {
    let fixture = TestFixture::new().await;
    let response = fixture
        .post(
            "/api/v1/jobs",
            json!({"requester_id": 1, "source_id": 10, "overwrite": true}),
        )
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.body["outcome"], "nothing_to_overwrite");
}

#[tokio::test]
async fn test_registry_outage_is_unavailable() {
    let fixture = TestFixture::new().await;
    fixture.registry.set_unavailable(true).await;

    let response = fixture
        .post("/api/v1/jobs", json!({"requester_id": 1, "source_id": 10}))
        .await;
    assert_eq!(response.status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(response.body["outcome"], "registry_unavailable");
}

#[tokio::test]
async fn test_duplicate_source_conflicts() {
    let fixture = TestFixture::new().await;
    fixture.add_stills(10, 1).await;
    fixture.gallery.set_frame_delay(Duration::from_secs(2)).await;

    let first = fixture
        .post("/api/v1/jobs", json!({"requester_id": 1, "source_id": 10}))
        .await;
    assert_eq!(first.status, StatusCode::ACCEPTED);

    let second = fixture
        .post("/api/v1/jobs", json!({"requester_id": 2, "source_id": 10}))
        .await;
    assert_eq!(second.status, StatusCode::CONFLICT);
    assert_eq!(second.body["outcome"], "rejected");
    assert_eq!(second.body["rejection"]["type"], "duplicate");

    let jobs = fixture.get("/api/v1/jobs").await;
    assert_eq!(jobs.status, StatusCode::OK);
    assert_eq!(jobs.body["jobs"].as_array().unwrap().len(), 1);
    assert_eq!(jobs.body["jobs"][0]["source_id"], 10);
    assert_eq!(jobs.body["jobs"][0]["requester_id"], 1);
    assert_eq!(jobs.body["available_slots"], 1);

    fixture.manager.shutdown().await;
}

#[tokio::test]
async fn test_merge_flow() {
    let fixture = TestFixture::new().await;
    fixture.add_stills(10, 3).await;

    let response = fixture
        .post(
            "/api/v1/jobs",
            json!({"requester_id": 1, "source_id": 10, "merge": true}),
        )
        .await;
    assert_eq!(response.status, StatusCode::ACCEPTED);
    assert_eq!(response.body["outcome"], "awaiting_merge_indices");

    let notices = fixture.get("/api/v1/requesters/1/notices").await;
    assert_eq!(notices.body["session"]["state"], "awaiting_merge_indices");
    assert_eq!(notices.body["session"]["source_id"], 10);

    let merged = fixture
        .post("/api/v1/jobs/merge", json!({"requester_id": 1, "indices": [1]}))
        .await;
    assert_eq!(merged.status, StatusCode::OK);
    assert_eq!(merged.body["source_id"], 10);

    fixture.wait_idle().await;
    let publisher = fixture.publisher.clone();
    eventually(|| {
        let publisher = publisher.clone();
        async move { publisher.created_sets().await.len() == 1 }
    })
    .await;
    assert_eq!(fixture.publisher.created_sets().await[0].stickers.len(), 2);
}

#[tokio::test]
async fn test_merge_without_question_conflicts() {
    let fixture = TestFixture::new().await;
    let response = fixture
        .post("/api/v1/jobs/merge", json!({"requester_id": 1, "indices": [1]}))
        .await;
    assert_eq!(response.status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_cancel_flow() {
    let fixture = TestFixture::new().await;
    fixture.add_stills(10, 1).await;
    fixture.gallery.set_frame_delay(Duration::from_secs(5)).await;

    fixture
        .post("/api/v1/jobs", json!({"requester_id": 1, "source_id": 10}))
        .await;

    let asked = fixture
        .post("/api/v1/jobs/cancel", json!({"requester_id": 1, "source_id": 10}))
        .await;
    assert_eq!(asked.status, StatusCode::OK);
    assert_eq!(asked.body["outcome"], "awaiting_confirmation");

    let confirmed = fixture
        .post(
            "/api/v1/jobs/cancel/confirm",
            json!({"requester_id": 1, "confirm": true}),
        )
        .await;
    assert_eq!(confirmed.status, StatusCode::OK);
    assert_eq!(confirmed.body["outcome"], "cancelled");

    let jobs = fixture.get("/api/v1/jobs").await;
    assert!(jobs.body["jobs"].as_array().unwrap().is_empty());
    assert_eq!(jobs.body["available_slots"], 2);

    let notices = fixture.get("/api/v1/requesters/1/notices").await;
    assert_eq!(notices.body["session"]["state"], "idle");
    let last = notices.body["notices"].as_array().unwrap().last().cloned();
    assert_eq!(last.unwrap()["notice"]["type"], "cancelled");
}

#[tokio::test]
async fn test_cancel_unknown_job_is_not_found() {
    let fixture = TestFixture::new().await;
    let response = fixture
        .post("/api/v1/jobs/cancel", json!({"requester_id": 1, "source_id": 99}))
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_confirm_without_question_conflicts() {
    let fixture = TestFixture::new().await;
    let response = fixture
        .post(
            "/api/v1/jobs/cancel/confirm",
            json!({"requester_id": 1, "confirm": true}),
        )
        .await;
    assert_eq!(response.status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_notices_since_filter() {
    let fixture = TestFixture::new().await;
    fixture
        .post("/api/v1/commands", json!({"requester_id": 3, "text": "hello"}))
        .await;

    let all = fixture.get("/api/v1/requesters/3/notices").await;
    assert_eq!(all.body["notices"].as_array().unwrap().len(), 1);

    let later = fixture
        .get("/api/v1/requesters/3/notices?since=2999-01-01T00:00:00Z")
        .await;
    assert_eq!(later.status, StatusCode::OK);
    assert!(later.body["notices"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_delete_sticker_set() {
    let fixture = TestFixture::new().await;

    let response = fixture
        .delete("/api/v1/sticker-sets/abc_10_by_forge_bot")
        .await;
    assert_eq!(response.status, StatusCode::NO_CONTENT);
    assert_eq!(
        fixture.publisher.deleted_sets().await,
        vec!["abc_10_by_forge_bot".to_string()]
    );

    fixture
        .publisher
        .set_next_error(PublishError::api(400, "Bad Request: STICKERSET_INVALID"))
        .await;
    let missing = fixture.delete("/api/v1/sticker-sets/gone_by_forge_bot").await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
}
