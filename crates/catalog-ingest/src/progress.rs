//! Progress reporting for long-running fetch runs.
//!
//! Traversals report through a [`ProgressReporter`] handed to them
//! explicitly, so no progress state is shared between invocations. The
//! reporter owns the [`OperationProgress`] counters of the current run; the
//! caller can read them back with [`ProgressReporter::snapshot`], including
//! after a run aborted part way.

use crate::result::{DatabaseOperationResult, OperationProgress};
use std::sync::Mutex;
use tracing::{info, warn};

/// Sink for traversal progress.
///
/// Implementations must be `Send + Sync`; the genre worker pool reports
/// from spawned tasks.
pub trait ProgressReporter: Send + Sync {
    /// Reset counters for a new top-level invocation
    fn begin(&self, label: &str, total: u64);

    /// Replace the expected total (e.g. once page 1 reports an item count)
    fn set_total(&self, total: u64);

    /// Advance by `processed` units whose outcome is `delta`
    fn advance(&self, processed: u64, delta: &DatabaseOperationResult);

    /// Surface a per-item warning without interrupting the run
    fn warn(&self, message: &str);

    /// Current counters
    fn snapshot(&self) -> OperationProgress;
}

/// Default reporter: keeps counters and logs a line every `log_every` units
pub struct TrackingProgress {
    state: Mutex<TrackingState>,
    log_every: u64,
}

#[derive(Default)]
struct TrackingState {
    label: String,
    progress: OperationProgress,
    last_logged: u64,
}

impl TrackingProgress {
    pub fn new(log_every: u64) -> Self {
        Self {
            state: Mutex::new(TrackingState::default()),
            log_every,
        }
    }

    /// Counters only, no log output
    pub fn silent() -> Self {
        Self::new(0)
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut TrackingState) -> T) -> T {
        // counters stay consistent even if a holder panicked
        let mut guard = self.state.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut guard)
    }
}

impl Default for TrackingProgress {
    fn default() -> Self {
        Self::new(100)
    }
}

impl ProgressReporter for TrackingProgress {
    fn begin(&self, label: &str, total: u64) {
        self.with_state(|state| {
            state.label = label.to_string();
            state.progress = OperationProgress {
                total,
                ..OperationProgress::default()
            };
            state.last_logged = 0;
        });
        if self.log_every > 0 {
            info!(operation = label, total, "Starting");
        }
    }

    fn set_total(&self, total: u64) {
        self.with_state(|state| state.progress.total = total);
    }

    fn advance(&self, processed: u64, delta: &DatabaseOperationResult) {
        let due = self.with_state(|state| {
            state.progress.absorb(processed, delta);
            let p = state.progress;
            if self.log_every > 0 && p.processed >= state.last_logged + self.log_every {
                state.last_logged = p.processed;
                Some((state.label.clone(), p))
            } else {
                None
            }
        });

        if let Some((label, p)) = due {
            info!(
                operation = %label,
                progress = format!("{}/{}", p.processed, p.total),
                inserted = p.inserted,
                updated = p.updated,
                skipped = p.skipped,
                errors = p.errors,
                "Progress"
            );
        }
    }

    fn warn(&self, message: &str) {
        if self.log_every > 0 {
            warn!("{}", message);
        }
    }

    fn snapshot(&self) -> OperationProgress {
        self.with_state(|state| state.progress)
    }
}
