//! Adapter for curl, the redirect-following transfer tool.
//!
//! Unlike the wget variant this follows redirects, resumes from an
//! explicit offset (`-C -`), runs with no overall timeout, and keeps its
//! progress display suppressed down to the plain bar.

use std::ffi::OsString;

use async_trait::async_trait;
use tokio::process::Command;

use super::dispatcher::{EngineAdapter, ExecContext, run_captured};
use super::error::DispatchError;
use crate::progress::ProgressTracker;
use crate::task::DownloadTask;

const BINARY: &str = "curl";

pub(crate) struct CurlAdapter;

fn build_args(task: &DownloadTask, ctx: &ExecContext<'_>) -> Vec<OsString> {
    vec![
        "-L".into(),
        "-C".into(),
        "-".into(),
        "--retry".into(),
        "10".into(),
        "--retry-delay".into(),
        "5".into(),
        "--max-time".into(),
        "0".into(),
        "--progress-bar".into(),
        "-o".into(),
        ctx.output_path(task).into_os_string(),
        task.url().into(),
    ]
}

#[async_trait]
impl EngineAdapter for CurlAdapter {
    async fn run(
        &self,
        ctx: &ExecContext<'_>,
        task: &mut DownloadTask,
        _tracker: Option<&ProgressTracker>,
    ) -> Result<(), DispatchError> {
        let binary_path = ctx.require_binary(BINARY)?;
        let mut cmd = Command::new(binary_path);
        cmd.args(build_args(task, ctx));
        run_captured(cmd, BINARY).await
    }
}
