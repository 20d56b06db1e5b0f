//! Request lifecycle: conversations, job tasks and their cleanup.

mod command;
mod config;
mod error;
mod manager;
mod state;

pub use command::{parse_command, ChatCommand, CANCEL_USAGE, CREATE_USAGE};
pub use config::SessionConfig;
pub use error::LifecycleError;
pub use manager::{CancelOutcome, CommandOutcome, CreateOutcome, CreateRequest, JobManager};
pub use state::{transition, SessionEvent, SessionState};
