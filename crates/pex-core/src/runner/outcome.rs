use std::sync::atomic::{AtomicUsize, Ordering};

/// Failure tally shared by every command task of one run.
///
/// Written by any number of tasks, read once after the run is done. Only the
/// fact that a failure happened reaches the caller; details live in events.
#[derive(Debug, Default)]
pub(crate) struct Outcome {
    failures: AtomicUsize,
}

impl Outcome {
    pub(crate) fn record_failure(&self) {
        self.failures.fetch_add(1, Ordering::AcqRel);
    }

    pub(crate) fn failures(&self) -> usize {
        self.failures.load(Ordering::Acquire)
    }

    pub(crate) fn has_failures(&self) -> bool {
        self.failures() > 0
    }
}
