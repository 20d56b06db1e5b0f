//! Conversation timeouts.

use serde::{Deserialize, Serialize};

/// How long the lifecycle waits for a requester's reply.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Seconds to answer a cancel confirmation before it lapses (default: 15).
    #[serde(default = "default_confirmation_timeout")]
    pub confirmation_timeout_secs: u64,

    /// Seconds to send merge indices before the request is dropped (default: 60).
    #[serde(default = "default_merge_indices_timeout")]
    pub merge_indices_timeout_secs: u64,
}

fn default_confirmation_timeout() -> u64 {
    15
}

fn default_merge_indices_timeout() -> u64 {
    60
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            confirmation_timeout_secs: default_confirmation_timeout(),
            merge_indices_timeout_secs: default_merge_indices_timeout(),
        }
    }
}

impl SessionConfig {
    pub fn with_timeouts(mut self, confirmation_secs: u64, merge_indices_secs: u64) -> Self {
        self.confirmation_timeout_secs = confirmation_secs;
        self.merge_indices_timeout_secs = merge_indices_secs;
        self
    }
}
