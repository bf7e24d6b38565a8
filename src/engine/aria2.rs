//! Adapter for the aria2c parallel-connection accelerator.
//!
//! aria2c is the only engine whose output is streamed line-by-line: a
//! completion marker on stdout pushes displayed progress to 100% before
//! the process exits. The marker is a best-effort UI hint; the exit code
//! alone decides whether the transfer completed.

use std::collections::VecDeque;
use std::ffi::OsString;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::Command;
use tracing::debug;

use super::dispatcher::{EngineAdapter, ExecContext, describe_exit};
use super::error::DispatchError;
use crate::config::Config;
use crate::filename::clean_filename;
use crate::progress::ProgressTracker;
use crate::task::DownloadTask;

const BINARY: &str = "aria2c";

/// Printed by aria2c when a file finishes downloading.
const COMPLETION_MARKER: &str = "Download complete";

/// Diagnostic lines kept from the end of the output stream.
const DIAGNOSTIC_TAIL_LINES: usize = 8;

pub(crate) struct Aria2Adapter;

/// Builds the aria2c argument list.
///
/// Connection and split counts come from the config (default 16/16);
/// `-k 10M` keeps small files from being over-split; `--max-tries=10`
/// with a 5 s wait bounds retries inside the tool itself.
fn build_args(task: &DownloadTask, config: &Config) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec![
        "-x".into(),
        config.connections.to_string().into(),
        "-s".into(),
        config.split.to_string().into(),
        "-j".into(),
        "5".into(),
        "-k".into(),
        "10M".into(),
        "--continue=true".into(),
        "--max-tries=10".into(),
        "--retry-wait=5".into(),
        format!("--dir={}", config.download_dir.display()).into(),
        "--summary-interval=1".into(),
        "--console-log-level=warn".into(),
    ];
    if let Some(name) = task.output_name() {
        args.push("--out".into());
        args.push(clean_filename(name).into());
    }
    args.push(task.url().into());
    args
}

#[async_trait]
impl EngineAdapter for Aria2Adapter {
    async fn run(
        &self,
        ctx: &ExecContext<'_>,
        task: &mut DownloadTask,
        tracker: Option<&ProgressTracker>,
    ) -> Result<(), DispatchError> {
        let binary_path = ctx.require_binary(BINARY)?;

        let mut cmd = Command::new(binary_path);
        cmd.args(build_args(task, ctx.config))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = cmd.spawn().map_err(|e| DispatchError::launch(BINARY, e))?;

        // Drain stderr concurrently so a chatty tool cannot block on a
        // full pipe while we read stdout.
        let stderr = child.stderr.take();
        let stderr_drain = tokio::spawn(async move {
            let mut buf = String::new();
            if let Some(mut stderr) = stderr {
                let _ = stderr.read_to_string(&mut buf).await;
            }
            buf
        });

        let mut tail: VecDeque<String> = VecDeque::with_capacity(DIAGNOSTIC_TAIL_LINES);
        if let Some(stdout) = child.stdout.take() {
            let mut lines = BufReader::new(stdout).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                if line.contains(COMPLETION_MARKER) {
                    debug!("completion marker observed on engine output");
                    task.set_progress(100.0);
                    if let Some(tracker) = tracker {
                        let remaining =
                            tracker.total().saturating_sub(tracker.snapshot().current);
                        if remaining > 0 {
                            tracker.advance(remaining);
                        }
                    }
                }
                if line.trim().is_empty() {
                    continue;
                }
                if tail.len() == DIAGNOSTIC_TAIL_LINES {
                    tail.pop_front();
                }
                tail.push_back(line);
            }
        }

        let status = child
            .wait()
            .await
            .map_err(|e| DispatchError::launch(BINARY, e))?;
        let stderr_text = stderr_drain.await.unwrap_or_default();

        if status.success() {
            return Ok(());
        }

        let detail = if !stderr_text.trim().is_empty() {
            stderr_text.trim_end().to_string()
        } else if tail.is_empty() {
            describe_exit(status)
        } else {
            Vec::from(tail).join("\n")
        };
        Err(DispatchError::process_failure(BINARY, detail))
    }
}
