//! Common test utilities for API testing with mocks.
//!
//! This module provides a test fixture that creates an in-process router
//! backed by a real job manager whose collaborators are mocks, so requests
//! run whole jobs without a gallery, ffmpeg or Telegram.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use stickerforge_core::{
    load_config_from_str,
    testing::{MockGallery, MockPublisher, MockRegistry, MockUpscaler, MockVideoEncoder},
    AdmissionController, Config, FrameSourceResolver, InboxNotifier, JobManager, JobRunner,
    SetPublisher, SizeConstrainedEncoder, Workspace, WorkspaceConfig,
};
use stickerforge_server::{api::create_router, state::AppState};

/// Re-export fixtures for test convenience
pub use stickerforge_core::testing::fixtures;

const TEST_CONFIG: &str = r#"
[admission]
max_concurrent_jobs = 2
max_requests_per_day = 5

[runner]
min_frame_bytes = 64
canvas_size = 64

[gallery]
metadata_url = "http://gallery.invalid/index/package_detail"
frame_url = "http://gallery.invalid/viewer"

[registry]
base_url = "http://registry.invalid"

[telegram]
bot_token = "123:abc"
owner_user_id = 7
sticker_tag = "forge_bot"
"#;

/// Test fixture for API testing with mock collaborators.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_health() {
///     let fixture = TestFixture::new().await;
///     let response = fixture.get("/api/v1/health").await;
///     assert_eq!(response.status, StatusCode::OK);
/// }
/// ```
pub struct TestFixture {
    router: Router,
    pub manager: JobManager,
    pub gallery: Arc<MockGallery>,
    pub registry: Arc<MockRegistry>,
    pub publisher: Arc<MockPublisher>,
    pub inbox: Arc<InboxNotifier>,
    _workspace: TempDir,
}

/// Response from a test request.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestFixture {
    pub async fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let mut config: Config = load_config_from_str(TEST_CONFIG).expect("Invalid test config");
        config.workspace = WorkspaceConfig::default().with_root(dir.path());
        let workspace = Workspace::new(&config.workspace);

        let gallery = Arc::new(MockGallery::new());
        let registry = Arc::new(MockRegistry::new());
        let publisher = Arc::new(MockPublisher::new());
        let inbox = Arc::new(InboxNotifier::new());

        let runner = JobRunner::new(
            config.runner.clone(),
            gallery.clone(),
            Arc::new(MockUpscaler::new()),
            FrameSourceResolver::new(config.resolver.clone()),
            Arc::new(SizeConstrainedEncoder::new(
                Arc::new(MockVideoEncoder::new()),
                config.encoder.clone(),
            )),
            workspace,
        );
        let sets = SetPublisher::new(publisher.clone(), registry.clone(), &config.telegram);

        let manager = JobManager::new(
            config.session.clone(),
            Arc::new(AdmissionController::new(config.admission.clone())),
            Arc::new(runner),
            Arc::new(sets),
            registry.clone(),
            inbox.clone(),
        );

        let state = Arc::new(AppState::new(config, manager.clone(), inbox.clone()));

        Self {
            router: create_router(state),
            manager,
            gallery,
            registry,
            publisher,
            inbox,
            _workspace: dir,
        }
    }

    /// Registers a gallery asset made of small PNG stills.
    pub async fn add_stills(&self, source_id: u64, count: usize) {
        self.gallery
            .add_asset(
                source_id,
                "Stills",
                (0..count)
                    .map(|_| ("png", fixtures::noise_png(16, 16)))
                    .collect(),
            )
            .await;
    }

    /// Waits until no job holds a slot.
    pub async fn wait_idle(&self) {
        let manager = self.manager.clone();
        eventually(|| {
            let manager = manager.clone();
            async move { manager.admission().in_flight_count() == 0 }
        })
        .await;
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, None).await
    }

    /// Send a POST request with JSON body.
    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.request("POST", path, Some(body)).await
    }

    /// Send a DELETE request.
    pub async fn delete(&self, path: &str) -> TestResponse {
        self.request("DELETE", path, None).await
    }

    /// Send a GET request and return the raw body text.
    pub async fn get_text(&self, path: &str) -> (StatusCode, String) {
        let request = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())
            .unwrap();
        let (status, bytes) = self.send(request).await;
        (status, String::from_utf8_lossy(&bytes).into_owned())
    }

    async fn request(&self, method: &str, path: &str, body: Option<Value>) -> TestResponse {
        let mut request_builder = Request::builder().method(method).uri(path);

        let body = if let Some(json_body) = body {
            request_builder = request_builder.header("Content-Type", "application/json");
            Body::from(serde_json::to_vec(&json_body).unwrap())
        } else {
            Body::empty()
        };

        let request = request_builder.body(body).unwrap();
        let (status, body_bytes) = self.send(request).await;

        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, body }
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Vec<u8>) {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();
        (status, body_bytes.to_vec())
    }
}

/// Polls `check` for up to five seconds.
pub async fn eventually<F, Fut>(mut check: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    for _ in 0..500 {
        if check().await {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not reached in time");
}
