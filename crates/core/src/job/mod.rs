//! Job identity and request types shared by admission, the runner and the
//! lifecycle manager.

mod types;

pub use types::{Job, JobPhase, OptionFlags, RequesterId, SourceId};
