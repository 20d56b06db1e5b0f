//! Job control endpoints.
//!
//! Every endpoint goes through the job manager, so requests made here and
//! chat commands share one conversation per requester. Notices produced
//! along the way land in the inbox and can be read back per requester.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;

use stickerforge_core::{
    CancelOutcome, CommandOutcome, CreateOutcome, CreateRequest, InFlightJob, LifecycleError,
    OptionFlags, PublishError, Rejection, RequesterId, SessionState, SourceId, StoredNotice,
};

use crate::state::AppState;

// ============================================================================
// Request/Response types
// ============================================================================

/// Body of a chat-style message.
#[derive(Debug, Deserialize)]
pub struct CommandBody {
    pub requester_id: RequesterId,
    #[serde(default)]
    pub requester_name: String,
    pub text: String,
}

/// Body of a create request.
#[derive(Debug, Deserialize)]
pub struct CreateJobBody {
    pub requester_id: RequesterId,
    #[serde(default)]
    pub requester_name: String,
    pub source_id: SourceId,
    #[serde(default)]
    pub overwrite: bool,
    #[serde(default)]
    pub merge: bool,
}

#[derive(Debug, Deserialize)]
pub struct MergeIndicesBody {
    pub requester_id: RequesterId,
    pub indices: Vec<u32>,
}

#[derive(Debug, Deserialize)]
pub struct CancelBody {
    pub requester_id: RequesterId,
    pub source_id: SourceId,
}

#[derive(Debug, Deserialize)]
pub struct ConfirmCancelBody {
    pub requester_id: RequesterId,
    pub confirm: bool,
}

/// Query parameters for reading notices.
#[derive(Debug, Default, Deserialize)]
pub struct NoticesParams {
    /// Only notices sent after this instant.
    pub since: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct MergeIndicesResponse {
    pub source_id: SourceId,
}

#[derive(Debug, Serialize)]
pub struct CancelResponse {
    pub outcome: CancelOutcome,
}

#[derive(Debug, Serialize)]
pub struct JobsResponse {
    pub jobs: Vec<InFlightJob>,
    pub available_slots: usize,
}

#[derive(Debug, Serialize)]
pub struct NoticesResponse {
    pub requester_id: RequesterId,
    pub session: SessionState,
    pub notices: Vec<StoredNotice>,
}

#[derive(Debug, Serialize)]
pub struct JobErrorResponse {
    pub error: String,
}

type ApiError = (StatusCode, Json<JobErrorResponse>);

fn error_response(status: StatusCode, error: impl Into<String>) -> ApiError {
    (
        status,
        Json(JobErrorResponse {
            error: error.into(),
        }),
    )
}

fn lifecycle_error(e: LifecycleError) -> ApiError {
    let status = match e {
        LifecycleError::NoSuchJob { .. } => StatusCode::NOT_FOUND,
        LifecycleError::Usage(_) | LifecycleError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        LifecycleError::InvalidTransition { .. }
        | LifecycleError::NotAwaitingMergeIndices
        | LifecycleError::NothingToConfirm => StatusCode::CONFLICT,
    };
    error_response(status, e.to_string())
}

/// Status code for a create outcome. The body always carries the outcome.
fn create_status(outcome: &CreateOutcome) -> StatusCode {
    match outcome {
        CreateOutcome::Started { .. } | CreateOutcome::AwaitingMergeIndices { .. } => {
            StatusCode::ACCEPTED
        }
        CreateOutcome::AlreadyPublished { .. } => StatusCode::OK,
        CreateOutcome::NothingToOverwrite => StatusCode::NOT_FOUND,
        CreateOutcome::RegistryUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        CreateOutcome::Rejected { rejection } => match rejection {
            Rejection::Busy { .. } => StatusCode::SERVICE_UNAVAILABLE,
            Rejection::Duplicate { .. } => StatusCode::CONFLICT,
            Rejection::Quota { .. } => StatusCode::TOO_MANY_REQUESTS,
        },
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// Dispatch a chat-style message (`/create`, `/cancel`, y/n, merge indices).
pub async fn run_command(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CommandBody>,
) -> Result<(StatusCode, Json<CommandOutcome>), ApiError> {
    let outcome = state
        .manager()
        .handle_command(body.requester_id, &body.requester_name, &body.text)
        .await
        .map_err(lifecycle_error)?;

    let status = match &outcome {
        CommandOutcome::Create { outcome } => create_status(outcome),
        _ => StatusCode::OK,
    };
    Ok((status, Json(outcome)))
}

/// Start building a sticker set.
pub async fn create_job(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateJobBody>,
) -> (StatusCode, Json<CreateOutcome>) {
    let flags = OptionFlags {
        overwrite: body.overwrite,
        merge: body.merge,
    };
    let request = CreateRequest::new(body.requester_id, body.requester_name, body.source_id, flags);
    let outcome = state.manager().create(request).await;
    (create_status(&outcome), Json(outcome))
}

/// Answer a merge-indices question.
pub async fn submit_merge_indices(
    State(state): State<Arc<AppState>>,
    Json(body): Json<MergeIndicesBody>,
) -> Result<Json<MergeIndicesResponse>, ApiError> {
    let source_id = state
        .manager()
        .submit_merge_indices(body.requester_id, body.indices)
        .await
        .map_err(lifecycle_error)?;
    Ok(Json(MergeIndicesResponse { source_id }))
}

/// Ask to cancel a job. Running jobs wait for a confirmation.
pub async fn request_cancel(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CancelBody>,
) -> Result<Json<CancelResponse>, ApiError> {
    let outcome = state
        .manager()
        .request_cancel(body.requester_id, body.source_id)
        .await
        .map_err(lifecycle_error)?;
    Ok(Json(CancelResponse { outcome }))
}

pub async fn confirm_cancel(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ConfirmCancelBody>,
) -> Result<Json<CancelResponse>, ApiError> {
    let outcome = state
        .manager()
        .confirm_cancel(body.requester_id, body.confirm)
        .await
        .map_err(lifecycle_error)?;
    Ok(Json(CancelResponse { outcome }))
}

/// In-flight jobs with their phases, oldest first.
pub async fn list_jobs(State(state): State<Arc<AppState>>) -> Json<JobsResponse> {
    let manager = state.manager();
    Json(JobsResponse {
        jobs: manager.jobs(),
        available_slots: manager.admission().available_slots(),
    })
}

/// Notices sent to a requester, with their current conversation state.
pub async fn list_notices(
    State(state): State<Arc<AppState>>,
    Path(requester_id): Path<RequesterId>,
    Query(params): Query<NoticesParams>,
) -> Json<NoticesResponse> {
    let mut notices = state.inbox().notices_for(requester_id).await;
    if let Some(since) = params.since {
        notices.retain(|notice| notice.at > since);
    }
    Json(NoticesResponse {
        requester_id,
        session: state.manager().session_state(requester_id).await,
        notices,
    })
}

/// Delete a published sticker set.
pub async fn delete_sticker_set(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<StatusCode, ApiError> {
    match state.manager().publisher().delete(&name).await {
        Ok(()) => Ok(StatusCode::NO_CONTENT),
        Err(e @ PublishError::Api { code: 400, .. }) => {
            Err(error_response(StatusCode::NOT_FOUND, e.to_string()))
        }
        Err(e) => {
            warn!(name = %name, error = %e, "Failed to delete sticker set");
            Err(error_response(StatusCode::BAD_GATEWAY, e.to_string()))
        }
    }
}
