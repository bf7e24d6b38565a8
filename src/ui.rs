//! Progress UI for download runs.
//!
//! A thin indicatif layer registered as a tracker observer; the transfer
//! code never touches the bar directly.

use std::time::Duration;

use dlmux::{ProgressSnapshot, ProgressTracker};
use indicatif::{ProgressBar, ProgressStyle};

/// Attaches a percent-scale progress bar to `tracker`.
///
/// Returns a hidden bar when `enabled` is false so callers can drive it
/// unconditionally. The caller finishes the bar when the transfer ends.
pub(crate) fn attach_progress_bar(tracker: &ProgressTracker, enabled: bool) -> ProgressBar {
    if !enabled {
        return ProgressBar::hidden();
    }

    let bar = ProgressBar::new(100);
    bar.set_style(
        ProgressStyle::with_template("{spinner} [{bar:30}] {percent}% {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    bar.enable_steady_tick(Duration::from_millis(100));

    let observer_bar = bar.clone();
    tracker.register_observer(move |snapshot: &ProgressSnapshot| {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        observer_bar.set_position(snapshot.percentage.round().clamp(0.0, 100.0) as u64);
    });
    bar
}
