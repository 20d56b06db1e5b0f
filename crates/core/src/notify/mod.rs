//! Requester notifications.

mod inbox;
mod notice;

use std::sync::Arc;

use async_trait::async_trait;

use crate::job::RequesterId;

pub use inbox::{InboxNotifier, StoredNotice};
pub use notice::Notice;

/// Delivers notices to requesters.
///
/// Delivery failures are logged by the implementation; a lost message never
/// changes the outcome of a job.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Returns the name of this notifier implementation.
    fn name(&self) -> &str;

    /// Sends `notice` to `requester_id`.
    async fn notify(&self, requester_id: RequesterId, notice: &Notice);

    /// Posts `text` to the public announcement channel, if there is one.
    async fn announce(&self, _text: &str) {}
}

/// Forwards every call to each inner notifier in order.
pub struct MultiNotifier {
    notifiers: Vec<Arc<dyn Notifier>>,
}

impl MultiNotifier {
    pub fn new(notifiers: Vec<Arc<dyn Notifier>>) -> Self {
        Self { notifiers }
    }
}

#[async_trait]
impl Notifier for MultiNotifier {
    fn name(&self) -> &str {
        "multi"
    }

    async fn notify(&self, requester_id: RequesterId, notice: &Notice) {
        for notifier in &self.notifiers {
            notifier.notify(requester_id, notice).await;
        }
    }

    async fn announce(&self, text: &str) {
        for notifier in &self.notifiers {
            notifier.announce(text).await;
        }
    }
}
