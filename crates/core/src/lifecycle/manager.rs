//! Multi-tenant job lifecycle.
//!
//! The manager owns every requester's conversation, spawns one task per
//! running job and funnels every way a job can end through a single
//! cleanup path:
//!
//! 1. the task handle is taken out of the task table
//! 2. the admission entry is released (requester lock, registry, slot)
//! 3. an external caller aborts the task and waits for it to stop
//! 4. the job's working directories are deleted
//!
//! Cleanup is serialized with admission, so a new job for the same source
//! can never be admitted halfway through the previous one's cleanup.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Local;
use serde::Serialize;
use tokio::sync::{oneshot, Mutex};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use super::command::{parse_command, ChatCommand};
use super::config::SessionConfig;
use super::error::LifecycleError;
use super::state::{transition, SessionEvent, SessionState};
use crate::admission::{AdmissionController, BusyReason, InFlightJob, Rejection};
use crate::job::{Job, JobPhase, OptionFlags, RequesterId, SourceId};
use crate::metrics;
use crate::notify::{Notice, Notifier};
use crate::publish::{PublishedSet, SetPublisher, StickerRecord, StickerRegistry};
use crate::runner::{CompletedJob, JobError, JobRunner, PhaseCallback};

/// A request to build a sticker set from one source.
#[derive(Debug, Clone)]
pub struct CreateRequest {
    pub requester_id: RequesterId,
    pub requester_name: String,
    pub source_id: SourceId,
    pub flags: OptionFlags,
}

impl CreateRequest {
    pub fn new(
        requester_id: RequesterId,
        requester_name: impl Into<String>,
        source_id: SourceId,
        flags: OptionFlags,
    ) -> Self {
        Self {
            requester_id,
            requester_name: requester_name.into(),
            source_id,
            flags,
        }
    }
}

/// What became of a create request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CreateOutcome {
    Started { source_id: SourceId },
    AwaitingMergeIndices { source_id: SourceId },
    AlreadyPublished { url: String },
    NothingToOverwrite,
    RegistryUnavailable,
    Rejected { rejection: Rejection },
}

/// What became of a cancel request or its confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CancelOutcome {
    AwaitingConfirmation,
    Cancelled,
    Kept,
}

/// Result of a chat-style message.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum CommandOutcome {
    Create { outcome: CreateOutcome },
    MergeIndicesAccepted { source_id: SourceId },
    Cancel { outcome: CancelOutcome },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Caller {
    /// The job task cleaning up after itself.
    JobTask,
    /// A cancel, a timer or shutdown.
    External,
}

/// Work left after an admission, done without the lifecycle lock.
enum AfterAdmit {
    Nothing,
    AwaitMergeIndices { generation: u64 },
    /// Lets the spawned job run.
    Start(oneshot::Sender<()>),
}

struct Session {
    state: SessionState,
    /// Changes on every transition; timers only act on the generation they saw.
    generation: u64,
    /// Admitted job waiting for its merge indices.
    pending: Option<Job>,
}

struct Inner {
    config: SessionConfig,
    admission: Arc<AdmissionController>,
    runner: Arc<JobRunner>,
    publisher: Arc<SetPublisher>,
    registry: Arc<dyn StickerRegistry>,
    notifier: Arc<dyn Notifier>,
    /// Held while admitting and spawning, and for a whole cleanup. Never
    /// held across a notice.
    lifecycle: Mutex<()>,
    sessions: Mutex<HashMap<RequesterId, Session>>,
    tasks: Mutex<HashMap<SourceId, JoinHandle<()>>>,
    generation: AtomicU64,
}

/// Runs create, merge and cancel conversations on top of the admission
/// controller and the job runner.
#[derive(Clone)]
pub struct JobManager {
    inner: Arc<Inner>,
}

impl JobManager {
    pub fn new(
        config: SessionConfig,
        admission: Arc<AdmissionController>,
        runner: Arc<JobRunner>,
        publisher: Arc<SetPublisher>,
        registry: Arc<dyn StickerRegistry>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                admission,
                runner,
                publisher,
                registry,
                notifier,
                lifecycle: Mutex::new(()),
                sessions: Mutex::new(HashMap::new()),
                tasks: Mutex::new(HashMap::new()),
                generation: AtomicU64::new(0),
            }),
        }
    }

    pub fn admission(&self) -> &Arc<AdmissionController> {
        &self.inner.admission
    }

    pub fn publisher(&self) -> &Arc<SetPublisher> {
        &self.inner.publisher
    }

    /// Checks the registry, then admits and starts the job (or asks for
    /// merge indices). Sends exactly one notice.
    pub async fn create(&self, request: CreateRequest) -> CreateOutcome {
        self.inner.create(request).await
    }

    /// Starts a job that was waiting for its merge indices.
    pub async fn submit_merge_indices(
        &self,
        requester_id: RequesterId,
        indices: Vec<u32>,
    ) -> Result<SourceId, LifecycleError> {
        let result = self.inner.submit_merge_indices(requester_id, indices).await;
        self.inner.notify_error(requester_id, &result).await;
        result
    }

    /// Asks the requester to confirm cancelling their job for `source_id`.
    ///
    /// A job still waiting for merge indices is cancelled at once.
    pub async fn request_cancel(
        &self,
        requester_id: RequesterId,
        source_id: SourceId,
    ) -> Result<CancelOutcome, LifecycleError> {
        let result = self.inner.request_cancel(requester_id, source_id).await;
        self.inner.notify_error(requester_id, &result).await;
        result
    }

    /// Answers a pending cancel confirmation.
    pub async fn confirm_cancel(
        &self,
        requester_id: RequesterId,
        yes: bool,
    ) -> Result<CancelOutcome, LifecycleError> {
        let result = self.inner.confirm_cancel(requester_id, yes).await;
        self.inner.notify_error(requester_id, &result).await;
        result
    }

    /// Parses and dispatches a chat message.
    pub async fn handle_command(
        &self,
        requester_id: RequesterId,
        requester_name: &str,
        text: &str,
    ) -> Result<CommandOutcome, LifecycleError> {
        let command = match parse_command(text) {
            Ok(command) => command,
            Err(e) => {
                let result = Err(e);
                self.inner.notify_error(requester_id, &result).await;
                return result;
            }
        };
        debug!(requester_id, ?command, "Command received");

        match command {
            ChatCommand::Create { source_id, flags } => {
                let request = CreateRequest::new(requester_id, requester_name, source_id, flags);
                Ok(CommandOutcome::Create {
                    outcome: self.create(request).await,
                })
            }
            ChatCommand::Cancel { source_id } => self
                .request_cancel(requester_id, source_id)
                .await
                .map(|outcome| CommandOutcome::Cancel { outcome }),
            ChatCommand::MergeIndices { indices } => self
                .submit_merge_indices(requester_id, indices)
                .await
                .map(|source_id| CommandOutcome::MergeIndicesAccepted { source_id }),
            ChatCommand::Confirm { yes } => self
                .confirm_cancel(requester_id, yes)
                .await
                .map(|outcome| CommandOutcome::Cancel { outcome }),
        }
    }

    /// Current conversation state of a requester.
    pub async fn session_state(&self, requester_id: RequesterId) -> SessionState {
        self.inner
            .sessions
            .lock()
            .await
            .get(&requester_id)
            .map(|session| session.state)
            .unwrap_or(SessionState::Idle)
    }

    /// Admitted jobs with their phases, oldest first.
    pub fn jobs(&self) -> Vec<InFlightJob> {
        self.inner.admission.snapshot()
    }

    /// Cancels every admitted job through the cleanup path.
    pub async fn shutdown(&self) {
        self.inner.shutdown().await;
    }
}

impl Inner {
    fn next_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::Relaxed) + 1
    }

    async fn create(self: &Arc<Self>, request: CreateRequest) -> CreateOutcome {
        let CreateRequest {
            requester_id,
            source_id,
            flags,
            ..
        } = request;

        let outcome = match self.registry.existing_url(source_id, flags).await {
            Err(e) => {
                warn!(source_id, error = %e, "Registry lookup failed");
                CreateOutcome::RegistryUnavailable
            }
            Ok(Some(url)) if !flags.overwrite => CreateOutcome::AlreadyPublished { url },
            Ok(None) if flags.overwrite => CreateOutcome::NothingToOverwrite,
            // Admission sends its own notices.
            Ok(_) => return self.admit(request).await,
        };

        let notice = match &outcome {
            CreateOutcome::AlreadyPublished { url } => Notice::AlreadyPublished {
                source_id,
                url: url.clone(),
            },
            CreateOutcome::NothingToOverwrite => Notice::NothingToOverwrite { source_id },
            _ => Notice::RegistryUnavailable,
        };
        self.notifier.notify(requester_id, &notice).await;
        outcome
    }

    async fn admit(self: &Arc<Self>, request: CreateRequest) -> CreateOutcome {
        let requester_id = request.requester_id;
        let (outcome, notice, next) = self.admit_locked(request).await;

        // Notices go out after the lifecycle lock is released.
        self.notifier.notify(requester_id, &notice).await;
        match next {
            AfterAdmit::Nothing => {}
            AfterAdmit::AwaitMergeIndices { generation } => {
                self.spawn_merge_timer(requester_id, generation)
            }
            AfterAdmit::Start(gate) => {
                let _ = gate.send(());
            }
        }
        outcome
    }

    async fn admit_locked(
        self: &Arc<Self>,
        request: CreateRequest,
    ) -> (CreateOutcome, Notice, AfterAdmit) {
        let CreateRequest {
            requester_id,
            requester_name,
            source_id,
            flags,
        } = request;
        let _guard = self.lifecycle.lock().await;

        if let Err(rejection) = self.admission.try_admit(requester_id, source_id) {
            metrics::ADMISSIONS_TOTAL
                .with_label_values(&[rejection.kind()])
                .inc();
            info!(requester_id, source_id, %rejection, "Request rejected");
            return (
                CreateOutcome::Rejected { rejection },
                Notice::Rejected { rejection },
                AfterAdmit::Nothing,
            );
        }
        metrics::ADMISSIONS_TOTAL
            .with_label_values(&["admitted"])
            .inc();
        metrics::JOBS_IN_FLIGHT.set(self.admission.in_flight_count() as i64);

        let job = Job::new(requester_id, requester_name, source_id, flags);
        let generation = self.next_generation();
        let entered = {
            let mut sessions = self.sessions.lock().await;
            let state = sessions
                .get(&requester_id)
                .map(|session| session.state)
                .unwrap_or(SessionState::Idle);
            transition(
                state,
                SessionEvent::Admitted {
                    source_id,
                    merge: flags.merge,
                },
            )
            .map(|next| {
                sessions.insert(
                    requester_id,
                    Session {
                        state: next,
                        generation,
                        pending: flags.merge.then(|| job.clone()),
                    },
                );
            })
            .map_err(|e| (e, state))
        };

        if let Err((e, state)) = entered {
            warn!(requester_id, source_id, error = %e, "Conversation already active");
            self.admission.release(requester_id, source_id);
            metrics::JOBS_IN_FLIGHT.set(self.admission.in_flight_count() as i64);
            let rejection = Rejection::Busy {
                reason: BusyReason::RequesterInFlight {
                    source_id: state.source_id().unwrap_or(source_id),
                },
            };
            return (
                CreateOutcome::Rejected { rejection },
                Notice::Rejected { rejection },
                AfterAdmit::Nothing,
            );
        }

        if flags.merge {
            let timeout_secs = self.config.merge_indices_timeout_secs;
            return (
                CreateOutcome::AwaitingMergeIndices { source_id },
                Notice::AskMergeIndices {
                    source_id,
                    timeout_secs,
                },
                AfterAdmit::AwaitMergeIndices { generation },
            );
        }

        let gate = self.spawn_job(job).await;
        (
            CreateOutcome::Started { source_id },
            Notice::Started { source_id },
            AfterAdmit::Start(gate),
        )
    }

    async fn submit_merge_indices(
        self: &Arc<Self>,
        requester_id: RequesterId,
        indices: Vec<u32>,
    ) -> Result<SourceId, LifecycleError> {
        let guard = self.lifecycle.lock().await;

        let job = {
            let mut sessions = self.sessions.lock().await;
            let session = sessions
                .get_mut(&requester_id)
                .ok_or(LifecycleError::NotAwaitingMergeIndices)?;
            if !matches!(session.state, SessionState::AwaitingMergeIndices { .. }) {
                return Err(LifecycleError::NotAwaitingMergeIndices);
            }
            let job = session
                .pending
                .take()
                .ok_or(LifecycleError::NotAwaitingMergeIndices)?;
            session.state = transition(session.state, SessionEvent::MergeIndicesReceived)?;
            session.generation = self.next_generation();
            job.with_merge_indices(indices)
        };

        let source_id = job.source_id;
        info!(requester_id, source_id, merge_indices = ?job.merge_indices, "Merge indices received");
        let gate = self.spawn_job(job).await;
        drop(guard);

        self.notifier
            .notify(requester_id, &Notice::Started { source_id })
            .await;
        let _ = gate.send(());
        Ok(source_id)
    }

    async fn request_cancel(
        self: &Arc<Self>,
        requester_id: RequesterId,
        source_id: SourceId,
    ) -> Result<CancelOutcome, LifecycleError> {
        let (next, generation) = {
            let mut sessions = self.sessions.lock().await;
            let session = sessions
                .get_mut(&requester_id)
                .ok_or(LifecycleError::NoSuchJob { source_id })?;
            let next = transition(session.state, SessionEvent::CancelRequested { source_id })
                .map_err(|_| LifecycleError::NoSuchJob { source_id })?;
            session.state = next;
            session.generation = self.next_generation();
            (next, session.generation)
        };

        if let SessionState::Cancelled { .. } = next {
            self.cancel(requester_id, source_id).await;
            return Ok(CancelOutcome::Cancelled);
        }

        let timeout_secs = self.config.confirmation_timeout_secs;
        self.notifier
            .notify(
                requester_id,
                &Notice::ConfirmCancel {
                    source_id,
                    timeout_secs,
                },
            )
            .await;
        self.spawn_confirmation_timer(requester_id, generation);
        Ok(CancelOutcome::AwaitingConfirmation)
    }

    async fn confirm_cancel(
        self: &Arc<Self>,
        requester_id: RequesterId,
        yes: bool,
    ) -> Result<CancelOutcome, LifecycleError> {
        let (source_id, next) = {
            let mut sessions = self.sessions.lock().await;
            let session = sessions
                .get_mut(&requester_id)
                .ok_or(LifecycleError::NothingToConfirm)?;
            let SessionState::AwaitingConfirmation { source_id } = session.state else {
                return Err(LifecycleError::NothingToConfirm);
            };
            let event = if yes {
                SessionEvent::CancelConfirmed
            } else {
                SessionEvent::CancelDeclined
            };
            session.state = transition(session.state, event)?;
            session.generation = self.next_generation();
            (source_id, session.state)
        };

        if let SessionState::Cancelled { .. } = next {
            self.cancel(requester_id, source_id).await;
            return Ok(CancelOutcome::Cancelled);
        }
        self.notifier
            .notify(requester_id, &Notice::CancelKept { source_id })
            .await;
        Ok(CancelOutcome::Kept)
    }

    /// Cleans up a job whose session is already `Cancelled` and reports it.
    async fn cancel(&self, requester_id: RequesterId, source_id: SourceId) {
        self.cleanup(requester_id, source_id, Caller::External).await;
        metrics::JOBS_FINISHED
            .with_label_values(&["cancelled"])
            .inc();
        info!(requester_id, source_id, "Job cancelled");
        self.notifier
            .notify(requester_id, &Notice::Cancelled { source_id })
            .await;
    }

    async fn shutdown(&self) {
        let jobs = self.admission.snapshot();
        info!(jobs = jobs.len(), "Cancelling in-flight jobs");

        for job in jobs {
            let aborted = {
                let mut sessions = self.sessions.lock().await;
                match sessions.get_mut(&job.requester_id) {
                    Some(session) if session.state.source_id() == Some(job.source_id) => {
                        match transition(session.state, SessionEvent::Abort) {
                            Ok(next) => {
                                session.state = next;
                                session.generation = self.next_generation();
                                true
                            }
                            Err(_) => false,
                        }
                    }
                    _ => false,
                }
            };

            if aborted {
                self.cancel(job.requester_id, job.source_id).await;
            } else {
                self.cleanup(job.requester_id, job.source_id, Caller::External)
                    .await;
            }
        }
    }

    /// Registers the job's task. The task waits until the returned gate
    /// fires or is dropped, so its notices follow `Started`.
    async fn spawn_job(self: &Arc<Self>, job: Job) -> oneshot::Sender<()> {
        let inner = Arc::clone(self);
        let source_id = job.source_id;
        let (gate, opened) = oneshot::channel();
        let mut tasks = self.tasks.lock().await;
        let handle = tokio::spawn(async move {
            let _ = opened.await;
            inner.run_job(job).await
        });
        tasks.insert(source_id, handle);
        gate
    }

    fn spawn_merge_timer(self: &Arc<Self>, requester_id: RequesterId, generation: u64) {
        let inner = Arc::clone(self);
        let wait = Duration::from_secs(self.config.merge_indices_timeout_secs);
        tokio::spawn(async move {
            tokio::time::sleep(wait).await;
            inner.merge_indices_timed_out(requester_id, generation).await;
        });
    }

    fn spawn_confirmation_timer(self: &Arc<Self>, requester_id: RequesterId, generation: u64) {
        let inner = Arc::clone(self);
        let wait = Duration::from_secs(self.config.confirmation_timeout_secs);
        tokio::spawn(async move {
            tokio::time::sleep(wait).await;
            let mut sessions = inner.sessions.lock().await;
            if let Some(session) = sessions.get_mut(&requester_id) {
                if session.generation != generation {
                    return;
                }
                if let Ok(next) = transition(session.state, SessionEvent::CancelDeclined) {
                    debug!(requester_id, "Cancel confirmation lapsed");
                    session.state = next;
                    session.generation = inner.next_generation();
                }
            }
        });
    }

    async fn merge_indices_timed_out(&self, requester_id: RequesterId, generation: u64) {
        let source_id = {
            let mut sessions = self.sessions.lock().await;
            let Some(session) = sessions.get(&requester_id) else {
                return;
            };
            if session.generation != generation {
                return;
            }
            let SessionState::AwaitingMergeIndices { source_id } = session.state else {
                return;
            };
            if transition(session.state, SessionEvent::MergeIndicesTimedOut).is_err() {
                return;
            }
            sessions.remove(&requester_id);
            source_id
        };

        info!(requester_id, source_id, "Merge indices not received in time");
        self.cleanup(requester_id, source_id, Caller::External).await;
        self.notifier
            .notify(requester_id, &Notice::MergeIndicesTimedOut { source_id })
            .await;
    }

    async fn run_job(self: Arc<Self>, job: Job) {
        let started = Instant::now();
        let result = self.execute(&job).await;

        if !self.settle(job.requester_id, job.source_id).await {
            // A cancel won the race; it owns cleanup and the notice.
            return;
        }

        let outcome = match result {
            Ok((completed, published)) => {
                self.admission.set_phase(job.source_id, JobPhase::Done);
                info!(
                    requester_id = job.requester_id,
                    source_id = job.source_id,
                    url = %published.url,
                    elapsed_secs = started.elapsed().as_secs(),
                    "Job done"
                );
                self.notifier
                    .notify(
                        job.requester_id,
                        &Notice::Completed {
                            title: completed.title.clone(),
                            url: published.url.clone(),
                        },
                    )
                    .await;
                self.notifier
                    .announce(&format!(
                        "{}({}){}\n{}",
                        completed.title,
                        job.source_id,
                        job.flags.suffix(),
                        published.url
                    ))
                    .await;
                "done"
            }
            Err(e) => {
                self.admission.set_phase(job.source_id, JobPhase::Failed);
                error!(
                    requester_id = job.requester_id,
                    source_id = job.source_id,
                    kind = e.kind(),
                    error = %e,
                    "Job failed"
                );
                self.notifier
                    .notify(job.requester_id, &failure_notice(&e, job.source_id))
                    .await;
                "failed"
            }
        };

        metrics::JOBS_FINISHED.with_label_values(&[outcome]).inc();
        metrics::JOB_DURATION
            .with_label_values(&[outcome])
            .observe(started.elapsed().as_secs_f64());
        self.cleanup(job.requester_id, job.source_id, Caller::JobTask)
            .await;
    }

    /// Image processing, publishing and registration, each under its timeout.
    async fn execute(&self, job: &Job) -> Result<(CompletedJob, PublishedSet), JobError> {
        let source_id = job.source_id;
        let admission = Arc::clone(&self.admission);
        let on_phase: PhaseCallback = Arc::new(move |phase| admission.set_phase(source_id, phase));
        let config = self.runner.config();

        let image_secs = config.image_timeout_secs;
        let completed = timeout(
            Duration::from_secs(image_secs),
            self.runner.run(job, Arc::clone(&on_phase)),
        )
        .await
        .map_err(|_| JobError::Timeout {
            phase: "image processing",
            secs: image_secs,
        })??;

        on_phase(JobPhase::Publishing);
        let publish_secs = config.publish_timeout_secs;
        let published = timeout(
            Duration::from_secs(publish_secs),
            self.publisher.publish(&completed),
        )
        .await
        .map_err(|_| JobError::Timeout {
            phase: "publishing",
            secs: publish_secs,
        })??;

        let record = StickerRecord {
            sticker_id: source_id,
            sticker_option_flag: job.flags.bits(),
            sticker_title: completed.title.clone(),
            registered_at: Local::now().naive_local(),
            url: published.url.clone(),
            user_id: job.requester_id,
            user_name: job.requester_name.clone(),
        };
        if let Err(e) = self.registry.register(&record).await {
            warn!(source_id, error = %e, "Failed to register sticker set");
        }

        Ok((completed, published))
    }

    /// Ends the conversation for a finished job. Returns false if the job
    /// was cancelled in the meantime.
    async fn settle(&self, requester_id: RequesterId, source_id: SourceId) -> bool {
        let mut sessions = self.sessions.lock().await;
        let Some(state) = sessions.get(&requester_id).map(|session| session.state) else {
            return true;
        };
        match state {
            SessionState::Cancelled { source_id: cancelled } if cancelled == source_id => false,
            state if state.source_id() == Some(source_id) => {
                if transition(state, SessionEvent::JobFinished).is_ok() {
                    sessions.remove(&requester_id);
                }
                true
            }
            _ => true,
        }
    }

    /// The single cleanup path. Safe to run any number of times.
    async fn cleanup(&self, requester_id: RequesterId, source_id: SourceId, caller: Caller) {
        let _guard = self.lifecycle.lock().await;

        let handle = self.tasks.lock().await.remove(&source_id);
        let released = self.admission.release(requester_id, source_id);

        if let (Some(handle), Caller::External) = (handle, caller) {
            handle.abort();
            match handle.await {
                Err(e) if e.is_panic() => warn!(source_id, "Job task panicked"),
                _ => {}
            }
        }

        if let Err(e) = self.runner.workspace().delete(source_id).await {
            warn!(source_id, error = %e, "Failed to delete job workspace");
        }

        {
            let mut sessions = self.sessions.lock().await;
            if let Some(session) = sessions.get(&requester_id) {
                if session.state.source_id() == Some(source_id)
                    && transition(session.state, SessionEvent::JobFinished).is_ok()
                {
                    sessions.remove(&requester_id);
                }
            }
        }

        metrics::JOBS_IN_FLIGHT.set(self.admission.in_flight_count() as i64);
        debug!(requester_id, source_id, released, "Cleanup finished");
    }

    /// Sends the notice for a failed lifecycle operation.
    async fn notify_error<T>(&self, requester_id: RequesterId, result: &Result<T, LifecycleError>) {
        if let Err(e) = result {
            let notice = match e {
                LifecycleError::NoSuchJob { source_id } => Notice::NoSuchJob {
                    source_id: *source_id,
                },
                LifecycleError::Usage(usage) => Notice::usage(*usage),
                LifecycleError::InvalidInput(reason) => Notice::invalid_input(reason.clone()),
                other => Notice::invalid_input(other.to_string()),
            };
            self.notifier.notify(requester_id, &notice).await;
        }
    }
}

fn failure_notice(error: &JobError, source_id: SourceId) -> Notice {
    match error {
        JobError::NotFound { .. } => Notice::NotFound { source_id },
        JobError::Timeout { .. } => Notice::TimedOut { source_id },
        _ => Notice::Failed { source_id },
    }
}
