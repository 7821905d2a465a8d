//! Transient user-facing notices.
//!
//! A [`Notices`] handle is a shared queue of short-lived messages (toasts,
//! in the web client). Handles clone cheaply and point at the same queue,
//! so whichever component performs a mutation can publish and whichever
//! component renders can snapshot and dismiss. Listeners that want push
//! delivery instead of polling can [`Notices::subscribe`].

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::broadcast;

/// Visual flavor of a notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeKind {
    Info,
    Success,
    Error,
    Warning,
}

/// One queued notice.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Notice {
    pub id: u64,
    pub kind: NoticeKind,
    pub message: String,
}

/// Shared notice queue.
#[derive(Debug, Clone)]
pub struct Notices {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    entries: Mutex<Vec<Notice>>,
    next_id: AtomicU64,
    tx: broadcast::Sender<Notice>,
}

impl Default for Notices {
    fn default() -> Self {
        Notices::new()
    }
}

impl Notices {
    pub fn new() -> Notices {
        let (tx, _) = broadcast::channel(64);
        Notices {
            inner: Arc::new(Inner {
                entries: Mutex::new(Vec::new()),
                next_id: AtomicU64::new(0),
                tx,
            }),
        }
    }

    /// Queues a notice and returns its id. Subscribers receive a copy;
    /// a queue with no subscribers still records the notice.
    pub fn publish(&self, kind: NoticeKind, message: impl Into<String>) -> u64 {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let notice = Notice {
            id,
            kind,
            message: message.into(),
        };
        self.inner.entries.lock().push(notice.clone());
        let _ = self.inner.tx.send(notice);
        id
    }

    pub fn info(&self, message: impl Into<String>) -> u64 {
        self.publish(NoticeKind::Info, message)
    }

    pub fn success(&self, message: impl Into<String>) -> u64 {
        self.publish(NoticeKind::Success, message)
    }

    pub fn error(&self, message: impl Into<String>) -> u64 {
        self.publish(NoticeKind::Error, message)
    }

    pub fn warning(&self, message: impl Into<String>) -> u64 {
        self.publish(NoticeKind::Warning, message)
    }

    /// Current queue contents, oldest first.
    pub fn snapshot(&self) -> Vec<Notice> {
        self.inner.entries.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.inner.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.entries.lock().is_empty()
    }

    /// Drops one notice by id; unknown ids are ignored.
    pub fn dismiss(&self, id: u64) {
        self.inner.entries.lock().retain(|notice| notice.id != id);
    }

    pub fn dismiss_all(&self) {
        self.inner.entries.lock().clear();
    }

    /// Push delivery of future notices.
    pub fn subscribe(&self) -> broadcast::Receiver<Notice> {
        self.inner.tx.subscribe()
    }
}
