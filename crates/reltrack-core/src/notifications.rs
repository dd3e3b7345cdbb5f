use std::time::{Duration, Instant};

pub const ADD_SUCCESS: &str = "Repository added successfully!";
pub const ADD_FAILURE: &str = "Failed to add repository. Please try again.";
pub const MARK_SEEN_SUCCESS: &str = "Release marked as seen successfully!";
pub const MARK_SEEN_FAILURE: &str = "Failed to mark release as seen. Please try again.";

/// Default lifetime of a toast
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(3000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Error,
}

/// A user-facing message produced by a finished operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.level == NoticeLevel::Error
    }
}

#[derive(Debug, Clone)]
pub struct Toast {
    pub notice: Notice,
    pub shown_at: Instant,
}

/// Live toasts, oldest first. Each one disappears `timeout` after it was
/// pushed; callers drive expiry by calling [`ToastQueue::prune`].
#[derive(Debug, Clone)]
pub struct ToastQueue {
    toasts: Vec<Toast>,
    timeout: Duration,
}

impl ToastQueue {
    pub fn new(timeout: Duration) -> Self {
        Self {
            toasts: Vec::new(),
            timeout,
        }
    }

    pub fn push(&mut self, notice: Notice, now: Instant) {
        self.toasts.push(Toast {
            notice,
            shown_at: now,
        });
    }

    /// Drop every toast older than the timeout
    pub fn prune(&mut self, now: Instant) {
        let timeout = self.timeout;
        self.toasts
            .retain(|toast| now.saturating_duration_since(toast.shown_at) < timeout);
    }

    pub fn visible(&self) -> &[Toast] {
        &self.toasts
    }

    pub fn is_empty(&self) -> bool {
        self.toasts.is_empty()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl Default for ToastQueue {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT)
    }
}
