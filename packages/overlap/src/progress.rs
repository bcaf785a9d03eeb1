//! Scan progress hooks.
//!
//! [`OverlapEngine`](crate::OverlapEngine) announces how many reserves it
//! will scan, ticks once per reserve, and closes with a one-line tally of
//! overlaps found. The binary renders this as a terminal bar; tests and
//! library callers pass [`null_progress`].

use std::sync::Arc;

/// Receives scan events. Implementations must not affect the scan.
pub trait ProgressCallback: Send + Sync {
    /// Number of reserves about to be scanned.
    fn set_total(&self, total: u64);

    /// `delta` more reserves scanned.
    fn inc(&self, delta: u64);

    fn set_message(&self, msg: String);

    /// Scan finished; `msg` summarizes what was found.
    fn finish(&self, msg: String);
}

/// Discards every event.
pub struct NullProgress;

impl ProgressCallback for NullProgress {
    fn set_total(&self, _total: u64) {}
    fn inc(&self, _delta: u64) {}
    fn set_message(&self, _msg: String) {}
    fn finish(&self, _msg: String) {}
}

/// A shared [`NullProgress`].
#[must_use]
pub fn null_progress() -> Arc<dyn ProgressCallback> {
    Arc::new(NullProgress)
}
