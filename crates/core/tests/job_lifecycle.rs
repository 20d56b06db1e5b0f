//! Job lifecycle integration tests.
//!
//! These tests drive the job manager end to end with mock collaborators:
//! - Registry checks before admission
//! - Running jobs to a published set
//! - Cancellation, merge-indices timeouts and shutdown through cleanup
//! - Exactly one notice per rejection or failure

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;

use tempfile::TempDir;

use stickerforge_core::{
    testing::{fixtures, MockGallery, MockPublisher, MockRegistry, MockUpscaler, MockVideoEncoder},
    AdmissionConfig, AdmissionController, CancelOutcome, CommandOutcome, CreateOutcome,
    CreateRequest, EncoderConfig, FrameSourceResolver, InboxNotifier, JobManager, JobPhase,
    JobRunner, LifecycleError, Notice, Notifier, OptionFlags, Rejection, ResolverConfig,
    RunnerConfig, SessionConfig, SessionState, SetPublisher, SizeConstrainedEncoder,
    TelegramConfig, Workspace, WorkspaceConfig,
};

/// Test helper wiring a job manager to mocks.
struct TestHarness {
    manager: JobManager,
    gallery: Arc<MockGallery>,
    upscaler: Arc<MockUpscaler>,
    video: Arc<MockVideoEncoder>,
    registry: Arc<MockRegistry>,
    publisher: Arc<MockPublisher>,
    inbox: Arc<InboxNotifier>,
    workspace: Workspace,
    _dir: TempDir,
}

impl TestHarness {
    fn new() -> Self {
        Self::with_session(SessionConfig::default())
    }

    fn with_session(session: SessionConfig) -> Self {
        Self::build(session, |inbox| inbox as Arc<dyn Notifier>)
    }

    /// Wires the manager to the notifier `wrap` builds around the inbox.
    fn build(
        session: SessionConfig,
        wrap: impl FnOnce(Arc<InboxNotifier>) -> Arc<dyn Notifier>,
    ) -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let workspace = Workspace::new(&WorkspaceConfig::default().with_root(dir.path()));

        let gallery = Arc::new(MockGallery::new());
        let upscaler = Arc::new(MockUpscaler::new());
        let video = Arc::new(MockVideoEncoder::new());
        let registry = Arc::new(MockRegistry::new());
        let publisher = Arc::new(MockPublisher::new());
        let inbox = Arc::new(InboxNotifier::new());

        let runner = JobRunner::new(
            RunnerConfig::default()
                .with_min_frame_bytes(64)
                .with_canvas_size(64),
            gallery.clone(),
            upscaler.clone(),
            FrameSourceResolver::new(ResolverConfig::default()),
            Arc::new(SizeConstrainedEncoder::new(
                video.clone(),
                EncoderConfig::default(),
            )),
            workspace.clone(),
        );
        let telegram: TelegramConfig = toml::from_str(
            r#"
bot_token = "123:abc"
owner_user_id = 7
sticker_tag = "forge_bot"
"#,
        )
        .expect("Failed to parse telegram config");
        let sets = SetPublisher::new(publisher.clone(), registry.clone(), &telegram);

        let manager = JobManager::new(
            session,
            Arc::new(AdmissionController::new(
                AdmissionConfig::default()
                    .with_max_concurrent_jobs(3)
                    .with_max_requests_per_day(10),
            )),
            Arc::new(runner),
            Arc::new(sets),
            registry.clone(),
            wrap(inbox.clone()),
        );

        Self {
            manager,
            gallery,
            upscaler,
            video,
            registry,
            publisher,
            inbox,
            workspace,
            _dir: dir,
        }
    }

    async fn add_stills(&self, source_id: u64, count: usize) {
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

    fn request(&self, requester_id: i64, source_id: u64) -> CreateRequest {
        CreateRequest::new(requester_id, "alice", source_id, OptionFlags::default())
    }

    async fn notices(&self, requester_id: i64) -> Vec<Notice> {
        self.inbox
            .notices_for(requester_id)
            .await
            .into_iter()
            .map(|stored| stored.notice)
            .collect()
    }

    async fn wait_idle(&self) {
        let manager = self.manager.clone();
        eventually(|| {
            let manager = manager.clone();
            async move { manager.admission().in_flight_count() == 0 }
        })
        .await;
    }

    fn job_dirs_exist(&self, source_id: u64) -> bool {
        let job = self.workspace.job(source_id);
        job.raw_dir.exists() || job.sticker_dir.exists()
    }
}

/// Delays every notice to one requester before recording it.
struct SlowNotifier {
    inbox: Arc<InboxNotifier>,
    slow_requester: i64,
    delay: Duration,
}

#[async_trait]
impl Notifier for SlowNotifier {
    fn name(&self) -> &str {
        "slow"
    }

    async fn notify(&self, requester_id: i64, notice: &Notice) {
        if requester_id == self.slow_requester {
            tokio::time::sleep(self.delay).await;
        }
        self.inbox.notify(requester_id, notice).await;
    }
}

/// Polls `check` for up to five seconds.
async fn eventually<F, Fut>(mut check: F)
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

#[tokio::test]
async fn test_static_job_publishes_set() {
    let h = TestHarness::new();
    h.add_stills(10, 3).await;

    let outcome = h.manager.create(h.request(1, 10)).await;
    assert_eq!(outcome, CreateOutcome::Started { source_id: 10 });

    let inbox = h.inbox.clone();
    eventually(|| {
        let inbox = inbox.clone();
        async move { matches!(inbox.last_for(1).await, Some(Notice::Completed { .. })) }
    })
    .await;
    h.wait_idle().await;

    let notices = h.notices(1).await;
    assert_eq!(notices.len(), 2);
    assert_eq!(notices[0], Notice::Started { source_id: 10 });

    let sets = h.publisher.created_sets().await;
    assert_eq!(sets.len(), 1);
    assert_eq!(sets[0].stickers.len(), 3);
    assert_eq!(sets[0].owner_id, 7);

    assert_eq!(h.upscaler.call_count().await, 3);
    assert_eq!(h.video.pass_count().await, 0);

    let records = h.registry.registered().await;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].sticker_id, 10);
    assert_eq!(records[0].user_id, 1);

    let announcements = h.inbox.announcements().await;
    assert_eq!(announcements.len(), 1);
    assert!(announcements[0].starts_with("Stills(10)\nhttps://t.me/addstickers/"));

    let harness = &h;
    eventually(move || async move { !harness.job_dirs_exist(10) }).await;
    assert_eq!(h.manager.session_state(1).await, SessionState::Idle);
}

#[tokio::test]
async fn test_unknown_source_fails_with_one_notice() {
    let h = TestHarness::new();

    h.manager.create(h.request(1, 404)).await;
    h.wait_idle().await;

    let inbox = h.inbox.clone();
    eventually(|| {
        let inbox = inbox.clone();
        async move { inbox.notices_for(1).await.len() == 2 }
    })
    .await;
    let notices = h.notices(1).await;
    assert_eq!(notices[1], Notice::NotFound { source_id: 404 });
    assert!(h.publisher.created_sets().await.is_empty());
    assert_eq!(h.manager.admission().available_slots(), 3);
}

#[tokio::test]
async fn test_existing_set_is_not_rebuilt() {
    let h = TestHarness::new();
    h.registry
        .add_existing(10, OptionFlags::default(), "https://t.me/addstickers/old")
        .await;

    let outcome = h.manager.create(h.request(1, 10)).await;
    assert_eq!(
        outcome,
        CreateOutcome::AlreadyPublished {
            url: "https://t.me/addstickers/old".to_string()
        }
    );
    assert_eq!(h.manager.admission().in_flight_count(), 0);
    assert_eq!(h.gallery.metadata_request_count().await, 0);
    assert_eq!(h.notices(1).await.len(), 1);
}

#[tokio::test]
async fn test_overwrite_requires_existing_set() {
    let h = TestHarness::new();
    let flags = OptionFlags {
        overwrite: true,
        merge: false,
    };

    let outcome = h
        .manager
        .create(CreateRequest::new(1, "alice", 10, flags))
        .await;
    assert_eq!(outcome, CreateOutcome::NothingToOverwrite);
    assert_eq!(
        h.notices(1).await,
        vec![Notice::NothingToOverwrite { source_id: 10 }]
    );
}

#[tokio::test]
async fn test_registry_outage_is_reported() {
    let h = TestHarness::new();
    h.registry.set_unavailable(true).await;

    let outcome = h.manager.create(h.request(1, 10)).await;
    assert_eq!(outcome, CreateOutcome::RegistryUnavailable);
    assert_eq!(h.notices(1).await, vec![Notice::RegistryUnavailable]);
    assert_eq!(h.manager.admission().in_flight_count(), 0);
}

#[tokio::test]
async fn test_duplicate_source_is_rejected() {
    let h = TestHarness::new();
    h.add_stills(10, 1).await;
    h.gallery.set_frame_delay(Duration::from_secs(5)).await;

    assert_eq!(
        h.manager.create(h.request(1, 10)).await,
        CreateOutcome::Started { source_id: 10 }
    );
    let second = h.manager.create(h.request(2, 10)).await;
    assert_eq!(
        second,
        CreateOutcome::Rejected {
            rejection: Rejection::Duplicate { source_id: 10 }
        }
    );
    assert_eq!(h.notices(2).await.len(), 1);

    h.manager.shutdown().await;
    assert_eq!(h.manager.admission().in_flight_count(), 0);
}

#[tokio::test]
async fn test_confirmed_cancel_cleans_up() {
    let h = TestHarness::new();
    h.add_stills(10, 2).await;
    h.gallery.set_frame_delay(Duration::from_secs(5)).await;

    h.manager.create(h.request(1, 10)).await;
    assert_eq!(
        h.manager.request_cancel(1, 10).await.unwrap(),
        CancelOutcome::AwaitingConfirmation
    );
    assert_eq!(
        h.manager.session_state(1).await,
        SessionState::AwaitingConfirmation { source_id: 10 }
    );

    assert_eq!(
        h.manager.confirm_cancel(1, true).await.unwrap(),
        CancelOutcome::Cancelled
    );
    assert_eq!(h.manager.admission().in_flight_count(), 0);
    assert_eq!(h.manager.admission().available_slots(), 3);
    assert_eq!(h.manager.session_state(1).await, SessionState::Idle);
    assert!(!h.job_dirs_exist(10));

    // Shutdown with nothing admitted changes nothing.
    h.manager.shutdown().await;
    assert_eq!(h.manager.admission().available_slots(), 3);

    let notices = h.notices(1).await;
    assert_eq!(notices.last(), Some(&Notice::Cancelled { source_id: 10 }));
    assert_eq!(
        notices
            .iter()
            .filter(|n| matches!(n, Notice::Cancelled { .. }))
            .count(),
        1
    );

    // The slot is free for the same source again.
    h.gallery.set_frame_delay(Duration::from_millis(0)).await;
    assert_eq!(
        h.manager.create(h.request(1, 10)).await,
        CreateOutcome::Started { source_id: 10 }
    );
    h.wait_idle().await;
}

#[tokio::test]
async fn test_cancel_while_publishing_wins_over_completion() {
    let h = TestHarness::new();
    h.add_stills(10, 1).await;
    h.publisher.set_delay(Duration::from_millis(800)).await;

    h.manager.create(h.request(1, 10)).await;
    let manager = h.manager.clone();
    eventually(|| {
        let manager = manager.clone();
        async move {
            manager
                .jobs()
                .first()
                .is_some_and(|job| job.phase == JobPhase::Publishing)
        }
    })
    .await;

    h.manager.request_cancel(1, 10).await.unwrap();
    assert_eq!(
        h.manager.confirm_cancel(1, true).await.unwrap(),
        CancelOutcome::Cancelled
    );

    // Let the blocked publisher call run out.
    tokio::time::sleep(Duration::from_millis(1200)).await;

    assert_eq!(h.manager.admission().in_flight_count(), 0);
    assert_eq!(h.manager.admission().available_slots(), 3);
    assert_eq!(h.manager.session_state(1).await, SessionState::Idle);
    assert!(!h.job_dirs_exist(10));
    assert!(h.publisher.created_sets().await.is_empty());
    assert!(h.registry.registered().await.is_empty());

    let notices = h.notices(1).await;
    let cancelled = notices
        .iter()
        .filter(|n| matches!(n, Notice::Cancelled { .. }))
        .count();
    assert_eq!(cancelled, 1);
    assert!(!notices.iter().any(|n| matches!(n, Notice::Completed { .. })));
}

#[tokio::test]
async fn test_slow_notice_does_not_block_other_requesters() {
    let h = TestHarness::build(SessionConfig::default(), |inbox| {
        Arc::new(SlowNotifier {
            inbox,
            slow_requester: 1,
            delay: Duration::from_millis(1500),
        }) as Arc<dyn Notifier>
    });
    h.add_stills(10, 1).await;
    h.add_stills(20, 1).await;

    let manager = h.manager.clone();
    let request = h.request(1, 10);
    let slow = tokio::spawn(async move { manager.create(request).await });
    // Requester 1 is admitted and waiting on its notice.
    let manager = h.manager.clone();
    eventually(|| {
        let manager = manager.clone();
        async move { manager.admission().in_flight_count() == 1 }
    })
    .await;

    let started = Instant::now();
    let outcome = h.manager.create(h.request(2, 20)).await;
    assert_eq!(outcome, CreateOutcome::Started { source_id: 20 });
    assert!(started.elapsed() < Duration::from_millis(750));

    assert_eq!(slow.await.unwrap(), CreateOutcome::Started { source_id: 10 });
    h.wait_idle().await;

    // The job waited for its Started notice.
    let notices = h.notices(1).await;
    assert_eq!(notices.first(), Some(&Notice::Started { source_id: 10 }));
}

#[tokio::test]
async fn test_declined_cancel_keeps_job() {
    let h = TestHarness::new();
    h.add_stills(10, 1).await;
    h.gallery.set_frame_delay(Duration::from_secs(5)).await;

    h.manager.create(h.request(1, 10)).await;
    h.manager.request_cancel(1, 10).await.unwrap();
    assert_eq!(
        h.manager.confirm_cancel(1, false).await.unwrap(),
        CancelOutcome::Kept
    );
    assert_eq!(
        h.manager.session_state(1).await,
        SessionState::Running { source_id: 10 }
    );
    assert_eq!(h.manager.admission().in_flight_count(), 1);
    assert_eq!(
        h.manager.confirm_cancel(1, true).await.unwrap_err(),
        LifecycleError::NothingToConfirm
    );

    h.manager.shutdown().await;
}

#[tokio::test]
async fn test_cancel_of_unknown_job() {
    let h = TestHarness::new();

    let err = h.manager.request_cancel(1, 99).await.unwrap_err();
    assert_eq!(err, LifecycleError::NoSuchJob { source_id: 99 });
    assert_eq!(h.notices(1).await, vec![Notice::NoSuchJob { source_id: 99 }]);
}

#[tokio::test]
async fn test_merge_indices_start_job() {
    let h = TestHarness::new();
    h.add_stills(10, 3).await;
    let flags = OptionFlags {
        overwrite: false,
        merge: true,
    };

    let outcome = h
        .manager
        .create(CreateRequest::new(1, "alice", 10, flags))
        .await;
    assert_eq!(outcome, CreateOutcome::AwaitingMergeIndices { source_id: 10 });
    assert_eq!(h.manager.admission().in_flight_count(), 1);

    assert_eq!(h.manager.submit_merge_indices(1, vec![1]).await.unwrap(), 10);

    let publisher = h.publisher.clone();
    eventually(|| {
        let publisher = publisher.clone();
        async move { !publisher.created_sets().await.is_empty() }
    })
    .await;
    h.wait_idle().await;

    // Items 1 and 2 fused, item 3 alone.
    assert_eq!(h.publisher.created_sets().await[0].stickers.len(), 2);
    let records = h.registry.registered().await;
    assert_eq!(records[0].sticker_option_flag, 2);
}

#[tokio::test]
async fn test_merge_indices_timeout_releases_slot() {
    let h = TestHarness::with_session(SessionConfig::default().with_timeouts(15, 1));
    let flags = OptionFlags {
        overwrite: false,
        merge: true,
    };

    h.manager
        .create(CreateRequest::new(1, "alice", 10, flags))
        .await;
    h.wait_idle().await;

    assert_eq!(h.manager.session_state(1).await, SessionState::Idle);
    let inbox = h.inbox.clone();
    eventually(|| {
        let inbox = inbox.clone();
        async move {
            inbox.last_for(1).await == Some(Notice::MergeIndicesTimedOut { source_id: 10 })
        }
    })
    .await;
    assert_eq!(
        h.manager.submit_merge_indices(1, vec![1]).await.unwrap_err(),
        LifecycleError::NotAwaitingMergeIndices
    );
}

#[tokio::test]
async fn test_chat_commands() {
    let h = TestHarness::new();
    h.add_stills(10, 1).await;
    h.gallery.set_frame_delay(Duration::from_secs(5)).await;

    let outcome = h.manager.handle_command(1, "alice", "/create 10").await.unwrap();
    assert_eq!(
        outcome,
        CommandOutcome::Create {
            outcome: CreateOutcome::Started { source_id: 10 }
        }
    );

    let outcome = h.manager.handle_command(1, "alice", "/cancel 10").await.unwrap();
    assert_eq!(
        outcome,
        CommandOutcome::Cancel {
            outcome: CancelOutcome::AwaitingConfirmation
        }
    );
    let outcome = h.manager.handle_command(1, "alice", "y").await.unwrap();
    assert_eq!(
        outcome,
        CommandOutcome::Cancel {
            outcome: CancelOutcome::Cancelled
        }
    );

    let err = h.manager.handle_command(1, "alice", "/create").await.unwrap_err();
    assert!(matches!(err, LifecycleError::Usage(_)));
    assert!(matches!(
        h.inbox.last_for(1).await,
        Some(Notice::Usage { .. })
    ));
}

#[tokio::test]
async fn test_shutdown_cancels_all_jobs() {
    let h = TestHarness::new();
    for source_id in [10, 11] {
        h.add_stills(source_id, 1).await;
    }
    h.gallery.set_frame_delay(Duration::from_secs(5)).await;

    h.manager.create(h.request(1, 10)).await;
    h.manager.create(h.request(2, 11)).await;
    assert_eq!(h.manager.jobs().len(), 2);

    h.manager.shutdown().await;

    assert!(h.manager.jobs().is_empty());
    assert_eq!(h.manager.admission().available_slots(), 3);
    for requester_id in [1, 2] {
        assert!(matches!(
            h.inbox.last_for(requester_id).await,
            Some(Notice::Cancelled { .. })
        ));
    }
}
