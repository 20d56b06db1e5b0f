use std::sync::Arc;

use stickerforge_core::{Config, InboxNotifier, JobManager, SanitizedConfig};

/// Shared application state
pub struct AppState {
    config: Config,
    manager: JobManager,
    inbox: Arc<InboxNotifier>,
}

impl AppState {
    pub fn new(config: Config, manager: JobManager, inbox: Arc<InboxNotifier>) -> Self {
        Self {
            config,
            manager,
            inbox,
        }
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn manager(&self) -> &JobManager {
        &self.manager
    }

    /// Every notice sent to requesters, readable over HTTP.
    pub fn inbox(&self) -> &InboxNotifier {
        &self.inbox
    }
}
