//! Admission control for conversion jobs.
//!
//! Every job passes through [`AdmissionController::try_admit`] before any
//! work is scheduled. The controller bounds:
//!
//! - how many jobs run at once (a fixed pool of slots),
//! - how many jobs one requester may have in flight (one),
//! - how many jobs may target the same source asset (one),
//! - how many requests one requester may make per calendar day.
//!
//! All four checks and the registration of an admitted job happen under a
//! single lock, so two concurrent calls can never both admit the same
//! source or requester. [`AdmissionController::release`] reverses an
//! admission and is safe to call more than once.
//!
//! # Example
//!
//! ```ignore
//! use stickerforge_core::admission::{AdmissionConfig, AdmissionController};
//!
//! let admission = AdmissionController::new(AdmissionConfig::default());
//! let ticket = admission.try_admit(42, 1001)?;
//! // ... run the job ...
//! admission.release(ticket.requester_id, ticket.source_id);
//! ```

mod config;
mod controller;
mod types;

pub use config::AdmissionConfig;
pub use controller::AdmissionController;
pub use types::{AdmissionTicket, BusyReason, InFlightJob, Rejection};
