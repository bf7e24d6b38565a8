//! Concurrent-safe progress tracking with observer notification.
//!
//! A [`ProgressTracker`] counts completed work units against a known or
//! unknown total and pushes a derived [`ProgressSnapshot`] to registered
//! observers on every update. The tracker is deliberately decoupled from
//! the transfer mechanism: adapters advance it, UIs observe it, and
//! neither knows about the other.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use tracing::warn;

/// Derived, ephemeral view of a tracker's state.
///
/// Recomputed on every observer notification and on every direct query;
/// never persisted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressSnapshot {
    /// Work units completed so far.
    pub current: u64,
    /// Total work units; 0 means unknown.
    pub total: u64,
    /// Completion percentage; 0 when the total is unknown.
    pub percentage: f64,
    /// Instantaneous speed in units per second (current / elapsed).
    pub speed: f64,
    /// Seconds since the tracker was constructed.
    pub elapsed: f64,
}

/// Anything that wants to observe progress updates.
///
/// Observers are invoked in registration order, while the tracker's
/// update lock is held. A panicking observer is isolated and logged; it
/// neither prevents later observers from running nor reaches the caller
/// of [`ProgressTracker::advance`].
pub trait ProgressObserver: Send {
    /// Called with the freshly computed snapshot after each update.
    fn on_progress(&self, snapshot: &ProgressSnapshot);
}

impl<F> ProgressObserver for F
where
    F: Fn(&ProgressSnapshot) + Send,
{
    fn on_progress(&self, snapshot: &ProgressSnapshot) {
        self(snapshot);
    }
}

/// Mutable progress counter with observer notification.
///
/// One tracker belongs to one transfer (single producer). `snapshot()` is
/// safe from any thread at any time; `advance()` serializes updates and
/// notification through an internal lock, so notifications arrive in the
/// exact order updates were made.
pub struct ProgressTracker {
    total: u64,
    current: AtomicU64,
    started: Instant,
    observers: Mutex<Vec<Box<dyn ProgressObserver>>>,
}

impl std::fmt::Debug for ProgressTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressTracker")
            .field("total", &self.total)
            .field("current", &self.current.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl ProgressTracker {
    /// Creates a tracker for `total` work units (0 when unknown).
    ///
    /// The start time for speed/elapsed derivation is captured here.
    #[must_use]
    pub fn new(total: u64) -> Self {
        Self {
            total,
            current: AtomicU64::new(0),
            started: Instant::now(),
            observers: Mutex::new(Vec::new()),
        }
    }

    /// Registers an observer. No deduplication; registration order is
    /// notification order.
    pub fn register_observer(&self, observer: impl ProgressObserver + 'static) {
        self.lock_observers().push(Box::new(observer));
    }

    /// Advances the counter by `n` units and notifies every observer.
    ///
    /// The update lock is held across notification, so a slow observer
    /// delays subsequent `advance` calls on the same tracker. That is
    /// acceptable for the single-producer transfer loop this serves.
    pub fn advance(&self, n: u64) {
        let observers = self.lock_observers();
        let current = self.current.fetch_add(n, Ordering::SeqCst) + n;
        let snapshot = self.snapshot_at(current);

        for observer in observers.iter() {
            let outcome = catch_unwind(AssertUnwindSafe(|| observer.on_progress(&snapshot)));
            if outcome.is_err() {
                warn!(
                    current = snapshot.current,
                    total = snapshot.total,
                    "progress observer panicked; continuing with remaining observers"
                );
            }
        }
    }

    /// Returns the current snapshot without mutating state.
    ///
    /// Lock-free; safe to call concurrently with `advance`.
    #[must_use]
    pub fn snapshot(&self) -> ProgressSnapshot {
        self.snapshot_at(self.current.load(Ordering::SeqCst))
    }

    /// Total work units this tracker was created with.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.total
    }

    fn snapshot_at(&self, current: u64) -> ProgressSnapshot {
        let elapsed = self.started.elapsed().as_secs_f64();
        #[allow(clippy::cast_precision_loss)]
        let percentage = if self.total > 0 {
            current as f64 / self.total as f64 * 100.0
        } else {
            0.0
        };
        #[allow(clippy::cast_precision_loss)]
        let speed = if elapsed > 0.0 {
            current as f64 / elapsed
        } else {
            0.0
        };
        ProgressSnapshot {
            current,
            total: self.total,
            percentage,
            speed,
            elapsed,
        }
    }

    fn lock_observers(&self) -> std::sync::MutexGuard<'_, Vec<Box<dyn ProgressObserver>>> {
        // A poisoned lock only means an observer panicked mid-notification;
        // the observer list itself is still consistent.
        match self.observers.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
