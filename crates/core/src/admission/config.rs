//! Configuration for the admission module.

use serde::{Deserialize, Serialize};

/// Limits enforced by the admission controller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdmissionConfig {
    /// Number of jobs that may run at the same time.
    #[serde(default = "default_max_concurrent_jobs")]
    pub max_concurrent_jobs: usize,

    /// Admitted requests allowed per requester per calendar day.
    #[serde(default = "default_max_requests_per_day")]
    pub max_requests_per_day: u32,
}

fn default_max_concurrent_jobs() -> usize {
    3
}

fn default_max_requests_per_day() -> u32 {
    10
}

impl Default for AdmissionConfig {
    fn default() -> Self {
        Self {
            max_concurrent_jobs: default_max_concurrent_jobs(),
            max_requests_per_day: default_max_requests_per_day(),
        }
    }
}

impl AdmissionConfig {
    pub fn with_max_concurrent_jobs(mut self, max: usize) -> Self {
        self.max_concurrent_jobs = max;
        self
    }

    pub fn with_max_requests_per_day(mut self, max: u32) -> Self {
        self.max_requests_per_day = max;
        self
    }
}
