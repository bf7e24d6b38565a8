//! Download task model with a checked status lifecycle.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::engine::Engine;

/// Monotonic source for process-unique task identifiers.
static NEXT_TASK_ID: AtomicU64 = AtomicU64::new(1);

/// Status of a download task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Created, not yet handed to the dispatcher.
    Pending,
    /// An engine is currently transferring it.
    Downloading,
    /// Transfer finished successfully.
    Completed,
    /// Transfer failed; the task carries an error detail.
    Failed,
}

impl TaskStatus {
    /// Returns the stable string representation.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Downloading => "downloading",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    /// Whether this status permits no further transitions.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One requested file transfer and its mutable lifecycle state.
///
/// Tasks are created `Pending` and move through `Downloading` into exactly
/// one of the terminal states. The lifecycle fields are private; mutation
/// goes through the transition methods, which uphold two invariants:
/// an error detail is present if and only if the status is `Failed`, and
/// terminal states accept no further transitions (attempts are logged and
/// ignored). The dispatcher borrows a task mutably for the duration of one
/// execution, which statically rules out concurrent execution of the same
/// task.
#[derive(Debug)]
pub struct DownloadTask {
    id: u64,
    url: String,
    engine: Engine,
    output_name: Option<String>,
    status: TaskStatus,
    progress: f64,
    speed: String,
    size: String,
    error: Option<String>,
}

impl DownloadTask {
    /// Creates a pending task for `url` using `engine`.
    ///
    /// The URL is expected to have passed [`crate::parser::validate`];
    /// the task itself does not re-validate.
    #[must_use]
    pub fn new(url: impl Into<String>, engine: Engine, output_name: Option<String>) -> Self {
        Self {
            id: NEXT_TASK_ID.fetch_add(1, Ordering::Relaxed),
            url: url.into(),
            engine,
            output_name,
            status: TaskStatus::Pending,
            progress: 0.0,
            speed: "0 B/s".to_string(),
            size: "unknown".to_string(),
            error: None,
        }
    }

    /// Process-unique identifier, used by `Dispatcher::terminate`.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// The source URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// The engine chosen for this transfer.
    #[must_use]
    pub fn engine(&self) -> Engine {
        self.engine
    }

    /// Caller-requested output filename, if any.
    #[must_use]
    pub fn output_name(&self) -> Option<&str> {
        self.output_name.as_deref()
    }

    /// Current lifecycle status.
    #[must_use]
    pub fn status(&self) -> TaskStatus {
        self.status
    }

    /// Progress percentage in `[0, 100]`.
    #[must_use]
    pub fn progress(&self) -> f64 {
        self.progress
    }

    /// Human-readable transfer speed.
    #[must_use]
    pub fn speed(&self) -> &str {
        &self.speed
    }

    /// Human-readable total size, `"unknown"` until an engine reports it.
    #[must_use]
    pub fn size(&self) -> &str {
        &self.size
    }

    /// Error detail; `Some` exactly when the status is [`TaskStatus::Failed`].
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Marks the task as being transferred.
    pub fn mark_downloading(&mut self) {
        if self.refuse_if_terminal("mark_downloading") {
            return;
        }
        self.status = TaskStatus::Downloading;
    }

    /// Marks the task completed: progress 100, no error detail.
    pub fn complete(&mut self) {
        if self.refuse_if_terminal("complete") {
            return;
        }
        self.status = TaskStatus::Completed;
        self.progress = 100.0;
        self.error = None;
    }

    /// Marks the task failed with a human-readable error detail.
    ///
    /// An empty detail is replaced with a generic one so that a failed
    /// task always carries a non-empty error string.
    pub fn fail(&mut self, error: impl Into<String>) {
        if self.refuse_if_terminal("fail") {
            return;
        }
        let detail = error.into();
        self.status = TaskStatus::Failed;
        self.error = Some(if detail.trim().is_empty() {
            "unknown error".to_string()
        } else {
            detail
        });
    }

    /// Updates the displayed progress percentage, clamped to `[0, 100]`.
    ///
    /// Display-only: reaching 100 here does not complete the task; only
    /// [`complete`](Self::complete) does.
    pub fn set_progress(&mut self, percentage: f64) {
        if self.status.is_terminal() {
            return;
        }
        self.progress = percentage.clamp(0.0, 100.0);
    }

    /// Updates the human-readable speed string.
    pub fn set_speed(&mut self, speed: impl Into<String>) {
        if self.status.is_terminal() {
            return;
        }
        self.speed = speed.into();
    }

    /// Records the total size once an engine reports it.
    pub fn set_size(&mut self, size: impl Into<String>) {
        if self.status.is_terminal() {
            return;
        }
        self.size = size.into();
    }

    fn refuse_if_terminal(&self, transition: &str) -> bool {
        if self.status.is_terminal() {
            warn!(
                task_id = self.id,
                status = %self.status,
                transition,
                "ignoring transition on terminal task"
            );
            return true;
        }
        false
    }
}
