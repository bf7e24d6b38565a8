//! Error types for engine selection and execution.
//!
//! Selection errors (`UnknownEngine`) reach the caller before a task can
//! exist. Execution errors are captured at the adapter boundary and
//! surfaced through the task's `Failed` status instead of being thrown
//! across the dispatcher contract.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while selecting or executing a download engine.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The requested engine name is not in the fixed engine set.
    #[error("unsupported engine: {name}")]
    UnknownEngine {
        /// The name that failed to resolve.
        name: String,
    },

    /// A required external executable is not available.
    #[error("missing dependency: {binary} not found on PATH")]
    MissingDependency {
        /// The helper executable that could not be resolved.
        binary: &'static str,
    },

    /// The external tool exited nonzero.
    #[error("{binary} failed: {detail}")]
    ProcessFailure {
        /// The tool that failed.
        binary: &'static str,
        /// Captured diagnostic text, or the numeric exit code when the
        /// tool produced none.
        detail: String,
    },

    /// The external process could not be started at all.
    #[error("failed to launch {binary}: {source}")]
    LaunchFailure {
        /// The tool that failed to start.
        binary: &'static str,
        /// The underlying spawn error.
        #[source]
        source: std::io::Error,
    },

    /// The execution was terminated by an explicit caller request.
    #[error("cancelled: {reason}")]
    Cancelled {
        /// Why the execution was cancelled.
        reason: String,
    },

    /// Filesystem error preparing the download environment.
    #[error("IO error at {path}: {source}")]
    Io {
        /// The path where the error occurred.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

impl DispatchError {
    /// Creates an unknown-engine error.
    pub fn unknown_engine(name: impl Into<String>) -> Self {
        Self::UnknownEngine { name: name.into() }
    }

    /// Creates a process-failure error.
    pub fn process_failure(binary: &'static str, detail: impl Into<String>) -> Self {
        Self::ProcessFailure {
            binary,
            detail: detail.into(),
        }
    }

    /// Creates a launch-failure error.
    pub fn launch(binary: &'static str, source: std::io::Error) -> Self {
        Self::LaunchFailure { binary, source }
    }

    /// Creates a cancellation error.
    pub fn cancelled(reason: impl Into<String>) -> Self {
        Self::Cancelled {
            reason: reason.into(),
        }
    }

    /// Creates an IO error with path context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

// No `From<std::io::Error>` impl on purpose: every IO failure here needs
// either a binary name or a path for context, which the bare error does
// not carry. The helper constructors are the supported construction path.

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_engine_display_names_the_engine() {
        let err = DispatchError::unknown_engine("unknown-engine");
        assert_eq!(err.to_string(), "unsupported engine: unknown-engine");
    }

    #[test]
    fn test_missing_dependency_display_names_the_binary() {
        let err = DispatchError::MissingDependency { binary: "megadl" };
        let msg = err.to_string();
        assert!(msg.contains("megadl"), "expected binary name in: {msg}");
        assert!(msg.contains("missing dependency"));
    }

    #[test]
    fn test_process_failure_carries_diagnostic_text() {
        let err = DispatchError::process_failure("wget", "404 Not Found");
        let msg = err.to_string();
        assert!(msg.contains("wget"));
        assert!(msg.contains("404 Not Found"));
    }

    #[test]
    fn test_launch_failure_preserves_source() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = DispatchError::launch("curl", io);
        assert!(err.to_string().contains("curl"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_cancelled_display() {
        let err = DispatchError::cancelled("terminated by caller");
        assert_eq!(err.to_string(), "cancelled: terminated by caller");
    }
}
