//! Per-asset job execution.
//!
//! [`JobRunner::run`] takes one admitted [`Job`](crate::job::Job) through
//! fetch, validation, upscaling and encoding, and returns the finished
//! artifacts. It does not publish and does not clean up; both belong to the
//! lifecycle layer.

mod compose;
mod config;
mod error;
mod fetch;
mod pipeline;
mod types;

pub use compose::{average_durations, fit_canvas, merge_pair, plan_items, ItemPlan};
pub use config::RunnerConfig;
pub use error::JobError;
pub use fetch::fetch_asset;
pub use pipeline::JobRunner;
pub use types::{
    ArtifactKind, CompletedJob, EncodedArtifact, ItemKind, PhaseCallback, RawItem, SourceAsset,
};
