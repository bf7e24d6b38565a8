//! Execution dispatcher: one uniform contract over heterogeneous engines.
//!
//! `execute` owns the full lifecycle of one transfer: it marks the task
//! downloading, prepares the output directory, selects the adapter by
//! exhaustive match on the task's engine, supervises the external
//! process, and maps the outcome back onto the task. Launch and exit
//! failures never propagate to the caller; they become the task's
//! `Failed` state. Callers observe results through the task, not through
//! a `Result`.

use std::collections::HashMap;
use std::ffi::{OsStr, OsString};
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::process::Command;
use tokio::sync::Notify;
use tracing::{debug, info, instrument, warn};

use super::aria2::Aria2Adapter;
use super::curl::CurlAdapter;
use super::error::DispatchError;
use super::mega::MegaAdapter;
use super::wget::WgetAdapter;
use super::{Engine, binary_on_path};
use crate::config::{Config, ensure_dir};
use crate::filename::output_filename;
use crate::progress::ProgressTracker;
use crate::task::DownloadTask;

/// Everything an adapter needs to build and launch its external tool.
pub(crate) struct ExecContext<'a> {
    pub config: &'a Config,
    search_path: &'a OsStr,
}

impl ExecContext<'_> {
    /// Resolves an engine binary within the dispatcher's search path.
    pub(crate) fn resolve_binary(&self, name: &str) -> Option<PathBuf> {
        binary_on_path(self.search_path, name)
    }

    /// Resolves a binary, mapping absence to a launch failure.
    pub(crate) fn require_binary(&self, name: &'static str) -> Result<PathBuf, DispatchError> {
        self.resolve_binary(name).ok_or_else(|| {
            DispatchError::launch(
                name,
                std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("{name} not found on search path"),
                ),
            )
        })
    }

    /// Final output path for `task`: explicit name, URL-derived name, or
    /// the generic fallback, sanitized.
    pub(crate) fn output_path(&self, task: &DownloadTask) -> PathBuf {
        self.config
            .download_dir
            .join(output_filename(task.output_name(), task.url()))
    }
}

#[cfg(test)]
impl<'a> ExecContext<'a> {
    /// Bare context for adapter argument-construction tests.
    pub(crate) fn for_tests(config: &'a Config, search_path: &'a OsStr) -> Self {
        Self {
            config,
            search_path,
        }
    }
}

/// Per-engine translation from a task to an external process invocation.
///
/// Implementations build their tool's argument list, launch it, and
/// report the outcome; they may push display progress onto the task and
/// tracker mid-flight, but the process exit code alone decides success.
#[async_trait]
pub(crate) trait EngineAdapter: Send + Sync {
    async fn run(
        &self,
        ctx: &ExecContext<'_>,
        task: &mut DownloadTask,
        tracker: Option<&ProgressTracker>,
    ) -> Result<(), DispatchError>;
}

/// Exhaustive adapter selection; adding an engine without an adapter is a
/// compile error.
fn adapter_for(engine: Engine) -> &'static dyn EngineAdapter {
    match engine {
        Engine::Aria2 => &Aria2Adapter,
        Engine::Wget => &WgetAdapter,
        Engine::Curl => &CurlAdapter,
        Engine::Mega => &MegaAdapter,
    }
}

/// Runs a fully-argued command to completion, capturing output.
///
/// Used by adapters without incremental completion markers: block until
/// exit, then map nonzero status to a failure carrying the tool's
/// diagnostic text (stderr first, stdout as fallback, exit code last).
pub(crate) async fn run_captured(
    mut cmd: Command,
    binary: &'static str,
) -> Result<(), DispatchError> {
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let output = cmd
        .output()
        .await
        .map_err(|e| DispatchError::launch(binary, e))?;

    if output.status.success() {
        return Ok(());
    }

    let stderr = String::from_utf8_lossy(&output.stderr);
    let stdout = String::from_utf8_lossy(&output.stdout);
    let detail = if !stderr.trim().is_empty() {
        stderr.trim_end().to_string()
    } else if !stdout.trim().is_empty() {
        stdout.trim_end().to_string()
    } else {
        describe_exit(output.status)
    };
    Err(DispatchError::process_failure(binary, detail))
}

/// Renders an exit status when a tool produced no diagnostic text.
pub(crate) fn describe_exit(status: std::process::ExitStatus) -> String {
    match status.code() {
        Some(code) => format!("exit code {code}"),
        None => "terminated by signal".to_string(),
    }
}

/// Removes the running-registry entry even if `execute` is cancelled.
struct RunningGuard<'a> {
    running: &'a Mutex<HashMap<u64, Arc<Notify>>>,
    task_id: u64,
}

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        if let Ok(mut guard) = self.running.lock() {
            guard.remove(&self.task_id);
        }
    }
}

/// Executes download tasks against external engines.
///
/// The dispatcher holds no mutable state shared across tasks other than
/// the registry of in-flight executions backing [`terminate`]; multiple
/// tasks may execute concurrently, each owning its own child process.
///
/// [`terminate`]: Dispatcher::terminate
#[derive(Debug)]
pub struct Dispatcher {
    config: Config,
    search_path: OsString,
    running: Mutex<HashMap<u64, Arc<Notify>>>,
}

impl Dispatcher {
    /// Creates a dispatcher resolving engine binaries through the
    /// process environment's `PATH`.
    #[must_use]
    pub fn new(config: Config) -> Self {
        let search_path = std::env::var_os("PATH").unwrap_or_default();
        Self::with_search_path(config, search_path)
    }

    /// Creates a dispatcher with an explicit binary search path.
    ///
    /// Embedders and tests use this to pin where engine executables are
    /// resolved from, independent of the ambient environment.
    #[must_use]
    pub fn with_search_path(config: Config, search_path: impl Into<OsString>) -> Self {
        Self {
            config,
            search_path: search_path.into(),
            running: Mutex::new(HashMap::new()),
        }
    }

    /// The configuration this dispatcher was built with.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Executes `task` to completion, without progress tracking.
    ///
    /// Returns whether the task completed successfully; failures are
    /// recorded on the task itself. Must not be called twice for one
    /// task (the `&mut` borrow enforces no concurrent execution).
    pub async fn execute(&self, task: &mut DownloadTask) -> bool {
        self.execute_with_tracker(task, None).await
    }

    /// Executes `task`, pushing progress through `tracker` when given.
    #[instrument(skip(self, task, tracker), fields(task_id = task.id(), engine = %task.engine(), url = task.url()))]
    pub async fn execute_with_tracker(
        &self,
        task: &mut DownloadTask,
        tracker: Option<&ProgressTracker>,
    ) -> bool {
        info!("dispatching download");
        task.mark_downloading();

        if let Err(e) = ensure_dir(&self.config.download_dir) {
            let err = DispatchError::io(&self.config.download_dir, e);
            warn!(error = %err, "could not prepare download directory");
            task.fail(err.to_string());
            return false;
        }

        let cancel = Arc::new(Notify::new());
        self.register_running(task.id(), &cancel);
        let _guard = RunningGuard {
            running: &self.running,
            task_id: task.id(),
        };

        let ctx = ExecContext {
            config: &self.config,
            search_path: &self.search_path,
        };
        let adapter = adapter_for(task.engine());

        // kill_on_drop on every child means the cancel arm tears the
        // process down simply by dropping the adapter future.
        let result = tokio::select! {
            result = adapter.run(&ctx, task, tracker) => result,
            () = cancel.notified() => Err(DispatchError::cancelled("terminated by caller")),
        };

        match result {
            Ok(()) => {
                if let Some(tracker) = tracker {
                    let remaining = tracker.total().saturating_sub(tracker.snapshot().current);
                    if remaining > 0 {
                        tracker.advance(remaining);
                    }
                }
                task.complete();
                info!("download completed");
                true
            }
            Err(e) => {
                warn!(error = %e, "download failed");
                task.fail(e.to_string());
                false
            }
        }
    }

    /// Terminates an in-flight execution.
    ///
    /// The underlying process is killed and the task fails with a
    /// cancellation reason. Returns whether a running execution with
    /// `task_id` was found; terminating an unknown or already-finished
    /// task is a no-op.
    pub fn terminate(&self, task_id: u64) -> bool {
        let notify = match self.running.lock() {
            Ok(guard) => guard.get(&task_id).cloned(),
            Err(_) => None,
        };
        match notify {
            Some(notify) => {
                debug!(task_id, "terminating in-flight execution");
                notify.notify_one();
                true
            }
            None => false,
        }
    }

    fn register_running(&self, task_id: u64, cancel: &Arc<Notify>) {
        if let Ok(mut guard) = self.running.lock() {
            guard.insert(task_id, Arc::clone(cancel));
        }
    }
}
