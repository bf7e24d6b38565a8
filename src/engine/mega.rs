//! Adapter for megadl, the Mega.nz-specific downloader.
//!
//! The helper executable must be locally available; when it is not, the
//! transfer fails immediately with a missing-dependency error, before
//! any process is spawned or network contact attempted.

use std::ffi::OsString;

use async_trait::async_trait;
use tokio::process::Command;

use super::dispatcher::{EngineAdapter, ExecContext, run_captured};
use super::error::DispatchError;
use crate::filename::clean_filename;
use crate::progress::ProgressTracker;
use crate::task::DownloadTask;

const BINARY: &str = "megadl";

pub(crate) struct MegaAdapter;

/// Builds the megadl argument list: an output directory (or full output
/// path when the caller named the file) followed by the URL.
fn build_args(task: &DownloadTask, ctx: &ExecContext<'_>) -> Vec<OsString> {
    let output = match task.output_name() {
        Some(name) => format!(
            "--output={}",
            ctx.config.download_dir.join(clean_filename(name)).display()
        ),
        None => format!("--output={}/", ctx.config.download_dir.display()),
    };
    vec![output.into(), task.url().into()]
}

#[async_trait]
impl EngineAdapter for MegaAdapter {
    async fn run(
        &self,
        ctx: &ExecContext<'_>,
        task: &mut DownloadTask,
        _tracker: Option<&ProgressTracker>,
    ) -> Result<(), DispatchError> {
        // Availability gate first: no spawn, no network when absent.
        let Some(binary_path) = ctx.resolve_binary(BINARY) else {
            return Err(DispatchError::MissingDependency { binary: BINARY });
        };

        let mut cmd = Command::new(binary_path);
        cmd.args(build_args(task, ctx));
        // Nonzero exits surface the tool's stderr verbatim as the error detail.
        run_captured(cmd, BINARY).await
    }
}
