//! Adapter for wget, the generic single-connection HTTP/FTP client.

use std::ffi::OsString;

use async_trait::async_trait;
use tokio::process::Command;

use super::dispatcher::{EngineAdapter, ExecContext, run_captured};
use super::error::DispatchError;
use crate::progress::ProgressTracker;
use crate::task::DownloadTask;

const BINARY: &str = "wget";

pub(crate) struct WgetAdapter;

/// Builds the wget argument list: resume on restart, 10 bounded tries,
/// a 60 s timeout per attempt, output into the download directory.
fn build_args(task: &DownloadTask, ctx: &ExecContext<'_>) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec![
        "--continue".into(),
        "--progress=bar:force".into(),
        "--tries=10".into(),
        "--timeout=60".into(),
        "-P".into(),
        ctx.config.download_dir.as_os_str().to_os_string(),
    ];
    if task.output_name().is_some() {
        args.push("-O".into());
        args.push(ctx.output_path(task).into_os_string());
    }
    args.push(task.url().into());
    args
}

#[async_trait]
impl EngineAdapter for WgetAdapter {
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
