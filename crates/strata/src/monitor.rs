//! Phase progress reporting.

use std::time::Instant;
use tracing::debug;

/// Receives the begin and end of every layout phase. Phases do not nest.
pub trait ProgressMonitor {
    fn begin(&mut self, task: &str);
    fn done(&mut self);
}

/// Ignores all progress.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullMonitor;

impl ProgressMonitor for NullMonitor {
    fn begin(&mut self, _task: &str) {}

    fn done(&mut self) {}
}

/// Emits a `debug` event with the elapsed time when a phase ends.
#[derive(Debug, Default)]
pub struct TracingMonitor {
    current: Option<(String, Instant)>,
}

impl TracingMonitor {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProgressMonitor for TracingMonitor {
    fn begin(&mut self, task: &str) {
        self.current = Some((task.to_string(), Instant::now()));
    }

    fn done(&mut self) {
        if let Some((task, start)) = self.current.take() {
            debug!(task = %task, elapsed = ?start.elapsed(), "layout phase done");
        }
    }
}
