//! Transient user-facing notifications (success/failure toasts).

use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::error::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationStatus {
    Success,
    Error,
    Info,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub status: NotificationStatus,
    pub title: Option<String>,
    pub description: String,
}

impl Notification {
    pub fn success(description: impl Into<String>) -> Self {
        Self {
            status: NotificationStatus::Success,
            title: None,
            description: description.into(),
        }
    }

    pub fn error(description: impl Into<String>) -> Self {
        Self {
            status: NotificationStatus::Error,
            title: None,
            description: description.into(),
        }
    }

    pub fn info(description: impl Into<String>) -> Self {
        Self {
            status: NotificationStatus::Info,
            title: None,
            description: description.into(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Error toast for a failed call. Validation failures are shown as plain
    /// informational prompts.
    pub fn from_error(err: &ApiError, fallback: &str) -> Self {
        let description = err.user_message(fallback);
        match err {
            ApiError::Validation(_) => Self::info(description),
            _ => Self::error(description),
        }
    }
}

/// Sink for notifications raised by client operations.
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Writes notifications to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, n: Notification) {
        match n.status {
            NotificationStatus::Error => {
                tracing::warn!(title = ?n.title, "{}", n.description)
            }
            NotificationStatus::Success | NotificationStatus::Info => {
                tracing::info!(title = ?n.title, "{}", n.description)
            }
        }
    }
}

/// Keeps notifications in memory until the host drains them.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    inner: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove and return everything recorded so far.
    pub fn take(&self) -> Vec<Notification> {
        self.inner
            .lock()
            .map(|mut v| std::mem::take(&mut *v))
            .unwrap_or_default()
    }

    pub fn last(&self) -> Option<Notification> {
        self.inner.lock().ok().and_then(|v| v.last().cloned())
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: Notification) {
        if let Ok(mut v) = self.inner.lock() {
            v.push(notification);
        }
    }
}
