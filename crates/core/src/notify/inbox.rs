use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::debug;

use super::notice::Notice;
use super::Notifier;
use crate::job::RequesterId;

/// Oldest entries are dropped past this many per requester.
const MAX_PER_REQUESTER: usize = 100;

/// A delivered notice with its rendered text.
#[derive(Debug, Clone, Serialize)]
pub struct StoredNotice {
    pub notice: Notice,
    pub message: String,
    pub at: DateTime<Utc>,
}

/// Keeps notices in memory so they can be read back over HTTP.
#[derive(Default)]
pub struct InboxNotifier {
    inboxes: Arc<RwLock<HashMap<RequesterId, Vec<StoredNotice>>>>,
    announcements: Arc<RwLock<Vec<String>>>,
}

impl InboxNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Notices for `requester_id`, oldest first.
    pub async fn notices_for(&self, requester_id: RequesterId) -> Vec<StoredNotice> {
        self.inboxes
            .read()
            .await
            .get(&requester_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Most recent notice for `requester_id`.
    pub async fn last_for(&self, requester_id: RequesterId) -> Option<Notice> {
        self.inboxes
            .read()
            .await
            .get(&requester_id)
            .and_then(|n| n.last())
            .map(|n| n.notice.clone())
    }

    pub async fn announcements(&self) -> Vec<String> {
        self.announcements.read().await.clone()
    }
}

#[async_trait]
impl Notifier for InboxNotifier {
    fn name(&self) -> &str {
        "inbox"
    }

    async fn notify(&self, requester_id: RequesterId, notice: &Notice) {
        debug!(requester_id, ?notice, "Notice");
        let mut inboxes = self.inboxes.write().await;
        let inbox = inboxes.entry(requester_id).or_default();
        inbox.push(StoredNotice {
            notice: notice.clone(),
            message: notice.to_string(),
            at: Utc::now(),
        });
        if inbox.len() > MAX_PER_REQUESTER {
            let excess = inbox.len() - MAX_PER_REQUESTER;
            inbox.drain(..excess);
        }
    }

    async fn announce(&self, text: &str) {
        self.announcements.write().await.push(text.to_string());
    }
}
