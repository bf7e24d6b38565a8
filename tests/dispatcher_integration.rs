//! Dispatcher integration tests against stub engine executables.
//!
//! Each test writes small shell-script stubs into a temp directory and
//! points the dispatcher's binary search path at it, exercising the full
//! execute path (argument construction, process supervision, outcome
//! mapping) without touching the network or real tools.

#![cfg(unix)]

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use tempfile::TempDir;

use dlmux::{
    Config, Dispatcher, DownloadTask, Engine, ProgressSnapshot, ProgressTracker, TaskStatus,
};

/// Writes an executable stub named `name` running `script` into `dir`.
fn write_stub(dir: &Path, name: &str, script: &str) {
    use std::os::unix::fs::PermissionsExt;
    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{script}\n")).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
}

struct Fixture {
    dispatcher: Dispatcher,
    bin_dir: TempDir,
    download_dir: TempDir,
}

impl Fixture {
    fn new() -> Self {
        let bin_dir = TempDir::new().unwrap();
        let download_dir = TempDir::new().unwrap();
        let dispatcher = Dispatcher::with_search_path(
            Config::with_download_dir(download_dir.path()),
            bin_dir.path().as_os_str(),
        );
        Self {
            dispatcher,
            bin_dir,
            download_dir,
        }
    }

    fn stub(&self, name: &str, script: &str) {
        write_stub(self.bin_dir.path(), name, script);
    }

    fn args_file(&self) -> PathBuf {
        self.bin_dir.path().join("recorded-args")
    }

    /// Stub that records its argv (one per line) and exits 0.
    fn recording_stub(&self, name: &str) {
        let out = self.args_file();
        self.stub(
            name,
            &format!("printf '%s\\n' \"$@\" > {}\nexit 0", out.display()),
        );
    }

    fn recorded_args(&self) -> Vec<String> {
        std::fs::read_to_string(self.args_file())
            .unwrap()
            .lines()
            .map(ToString::to_string)
            .collect()
    }
}

// ───── exit-code mapping ────────────────────────────────────────────────

#[tokio::test]
async fn wget_stub_exit_zero_completes_task() {
    let fx = Fixture::new();
    fx.stub("wget", "exit 0");
    let mut task = DownloadTask::new("http://example.com/file.zip", Engine::Wget, None);

    let ok = fx.dispatcher.execute(&mut task).await;

    assert!(ok);
    assert_eq!(task.status(), TaskStatus::Completed);
    assert_eq!(task.progress(), 100.0);
    assert!(task.error().is_none());
}

#[tokio::test]
async fn curl_stub_nonzero_exit_fails_with_stderr_text() {
    let fx = Fixture::new();
    fx.stub("curl", "echo 'server said no' >&2\nexit 3");
    let mut task = DownloadTask::new("http://example.com/file.zip", Engine::Curl, None);

    let ok = fx.dispatcher.execute(&mut task).await;

    assert!(!ok);
    assert_eq!(task.status(), TaskStatus::Failed);
    let error = task.error().unwrap();
    assert!(error.contains("server said no"), "got: {error}");
}

#[tokio::test]
async fn silent_nonzero_exit_reports_the_exit_code() {
    let fx = Fixture::new();
    fx.stub("wget", "exit 4");
    let mut task = DownloadTask::new("http://example.com/file.zip", Engine::Wget, None);

    fx.dispatcher.execute(&mut task).await;

    let error = task.error().unwrap();
    assert!(error.contains("exit code 4"), "got: {error}");
}

// ───── argument templates ───────────────────────────────────────────────

#[tokio::test]
async fn aria2_arguments_follow_the_accelerator_template() {
    let fx = Fixture::new();
    fx.recording_stub("aria2c");
    let mut task = DownloadTask::new("http://example.com/big.iso", Engine::Aria2, None);

    assert!(fx.dispatcher.execute(&mut task).await);

    let args = fx.recorded_args();
    let x = args.iter().position(|a| a == "-x").unwrap();
    assert_eq!(args[x + 1], "16");
    assert!(args.contains(&"--continue=true".to_string()));
    assert!(args.contains(&"--max-tries=10".to_string()));
    assert!(args.contains(&"--retry-wait=5".to_string()));
    assert!(
        args.contains(&format!("--dir={}", fx.download_dir.path().display())),
        "args: {args:?}"
    );
    assert_eq!(args.last().unwrap(), "http://example.com/big.iso");
}

#[tokio::test]
async fn wget_arguments_use_explicit_output_name() {
    let fx = Fixture::new();
    fx.recording_stub("wget");
    let mut task = DownloadTask::new(
        "http://example.com/file.zip",
        Engine::Wget,
        Some("renamed.zip".to_string()),
    );

    assert!(fx.dispatcher.execute(&mut task).await);

    let args = fx.recorded_args();
    let o = args.iter().position(|a| a == "-O").unwrap();
    assert_eq!(
        args[o + 1],
        fx.download_dir.path().join("renamed.zip").display().to_string()
    );
}

#[tokio::test]
async fn curl_output_path_derives_from_url_last_segment() {
    let fx = Fixture::new();
    fx.recording_stub("curl");
    let mut task = DownloadTask::new("http://example.com/dir/data.tar.gz", Engine::Curl, None);

    assert!(fx.dispatcher.execute(&mut task).await);

    let args = fx.recorded_args();
    let o = args.iter().position(|a| a == "-o").unwrap();
    assert_eq!(
        args[o + 1],
        fx.download_dir.path().join("data.tar.gz").display().to_string()
    );
}

// ───── mega dependency gate ─────────────────────────────────────────────

#[tokio::test]
async fn missing_megadl_fails_without_spawning_anything() {
    let fx = Fixture::new();
    let mut task = DownloadTask::new("https://mega.nz/file/abc", Engine::Mega, None);

    let ok = fx.dispatcher.execute(&mut task).await;

    assert!(!ok);
    let error = task.error().unwrap();
    assert!(error.contains("missing dependency"), "got: {error}");
    assert!(error.contains("megadl"), "got: {error}");
    assert!(
        std::fs::read_dir(fx.download_dir.path()).unwrap().next().is_none(),
        "nothing may be written when the helper is absent"
    );
}

#[tokio::test]
async fn megadl_failure_surfaces_diagnostic_verbatim() {
    let fx = Fixture::new();
    fx.stub("megadl", "echo 'ERROR: quota exceeded' >&2\nexit 1");
    let mut task = DownloadTask::new("https://mega.nz/file/abc", Engine::Mega, None);

    fx.dispatcher.execute(&mut task).await;

    let error = task.error().unwrap();
    assert!(error.contains("ERROR: quota exceeded"), "got: {error}");
}

// ───── progress wiring ──────────────────────────────────────────────────

#[tokio::test]
async fn completion_marker_pushes_tracker_to_full() {
    let fx = Fixture::new();
    fx.stub("aria2c", "echo 'Download complete: /dl/big.iso'\nexit 0");
    let mut task = DownloadTask::new("http://example.com/big.iso", Engine::Aria2, None);
    let tracker = ProgressTracker::new(1);

    let saw_full = Arc::new(AtomicBool::new(false));
    let observer_flag = Arc::clone(&saw_full);
    tracker.register_observer(move |snapshot: &ProgressSnapshot| {
        if snapshot.percentage >= 100.0 {
            observer_flag.store(true, Ordering::SeqCst);
        }
    });

    let ok = fx
        .dispatcher
        .execute_with_tracker(&mut task, Some(&tracker))
        .await;

    assert!(ok);
    assert_eq!(tracker.snapshot().percentage, 100.0);
    assert!(saw_full.load(Ordering::SeqCst));
    assert_eq!(task.progress(), 100.0);
}

#[tokio::test]
async fn tracker_reaches_full_even_without_marker() {
    let fx = Fixture::new();
    fx.stub("wget", "exit 0");
    let mut task = DownloadTask::new("http://example.com/f.zip", Engine::Wget, None);
    let tracker = ProgressTracker::new(1);

    fx.dispatcher
        .execute_with_tracker(&mut task, Some(&tracker))
        .await;

    assert_eq!(tracker.snapshot().percentage, 100.0);
}

// ───── termination ──────────────────────────────────────────────────────

#[tokio::test]
async fn terminate_kills_in_flight_transfer_and_fails_the_task() {
    let fx = Fixture::new();
    fx.stub("aria2c", "sleep 30");
    let mut task = DownloadTask::new("http://example.com/slow.bin", Engine::Aria2, None);
    let task_id = task.id();

    let dispatcher = Arc::new(fx.dispatcher);
    let worker = Arc::clone(&dispatcher);
    let started = Instant::now();
    let handle = tokio::spawn(async move {
        let ok = worker.execute(&mut task).await;
        (ok, task)
    });

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert!(dispatcher.terminate(task_id), "task should be in flight");

    let (ok, task) = handle.await.unwrap();
    assert!(!ok);
    assert_eq!(task.status(), TaskStatus::Failed);
    let error = task.error().unwrap();
    assert!(error.contains("cancelled"), "got: {error}");
    assert!(
        started.elapsed() < Duration::from_secs(10),
        "termination must not wait for the stub's 30s sleep"
    );

    // Finished executions are deregistered.
    assert!(!dispatcher.terminate(task_id));
}

// ───── concurrency ──────────────────────────────────────────────────────

#[tokio::test]
async fn concurrent_tasks_each_own_their_outcome() {
    let fx = Fixture::new();
    fx.stub("wget", "exit 0");
    fx.stub("curl", "echo 'broken pipe' >&2\nexit 7");
    let dispatcher = Arc::new(fx.dispatcher);

    let ok_worker = Arc::clone(&dispatcher);
    let ok_handle = tokio::spawn(async move {
        let mut task = DownloadTask::new("http://example.com/a.zip", Engine::Wget, None);
        let ok = ok_worker.execute(&mut task).await;
        (ok, task)
    });
    let err_worker = Arc::clone(&dispatcher);
    let err_handle = tokio::spawn(async move {
        let mut task = DownloadTask::new("http://example.com/b.zip", Engine::Curl, None);
        let ok = err_worker.execute(&mut task).await;
        (ok, task)
    });

    let (ok_a, task_a) = ok_handle.await.unwrap();
    let (ok_b, task_b) = err_handle.await.unwrap();

    assert!(ok_a);
    assert_eq!(task_a.status(), TaskStatus::Completed);
    assert!(!ok_b);
    assert!(task_b.error().unwrap().contains("broken pipe"));
}
