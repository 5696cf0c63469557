//! Download progress accounting
//!
//! A `ProgressTracker` is shared by every ranged writer of one download.
//! Writers add the length of each chunk they persist; the running total is
//! an `AtomicU64`, so the final value equals the bytes written regardless of
//! how the writers interleave.

use std::io::Write;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

/// Snapshot of a download's progress
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressUpdate {
    /// Authoritative object size from the metadata probe
    pub size: u64,
    /// Bytes written so far across all writers
    pub downloaded: u64,
}

impl ProgressUpdate {
    /// Percentage complete; a zero-byte object is complete from the start
    pub fn percentage(&self) -> f64 {
        if self.size == 0 {
            return 100.0;
        }
        self.downloaded as f64 * 100.0 / self.size as f64
    }
}

impl std::fmt::Display for ProgressUpdate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "size={} downloaded={} percentage={:.2}%",
            self.size,
            self.downloaded,
            self.percentage()
        )
    }
}

/// Receiver of progress updates
pub trait ProgressObserver: Send + Sync {
    /// Called once when the transfer starts
    fn on_start(&self, _size: u64) {}

    /// Called after every chunk
    fn on_progress(&self, update: ProgressUpdate);

    /// Called once after the file has been published
    fn on_finish(&self) {}
}

/// Observer that discards every update
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressObserver for NoProgress {
    fn on_progress(&self, _update: ProgressUpdate) {}
}

/// Observer writing one `size=.. downloaded=.. percentage=..%` line per update
pub struct LineProgress<W: Write + Send> {
    out: Mutex<W>,
}

impl<W: Write + Send> LineProgress<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    /// Recover the writer (used by tests to inspect output)
    pub fn into_inner(self) -> W {
        self.out
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<W: Write + Send> ProgressObserver for LineProgress<W> {
    fn on_progress(&self, update: ProgressUpdate) {
        let mut out = self.out.lock().unwrap_or_else(|p| p.into_inner());
        // Progress output is best effort; a closed pipe must not fail the transfer.
        if let Err(e) = writeln!(out, "{update}") {
            tracing::debug!(error = %e, "dropping progress line");
        }
    }
}

/// Shared byte counter for one download
#[derive(Debug)]
pub struct ProgressTracker {
    size: u64,
    written: AtomicU64,
}

impl ProgressTracker {
    pub fn new(size: u64) -> Self {
        Self {
            size,
            written: AtomicU64::new(0),
        }
    }

    /// Account for `bytes` newly written and return the resulting snapshot
    pub fn record(&self, bytes: u64) -> ProgressUpdate {
        let downloaded = self.written.fetch_add(bytes, Ordering::AcqRel) + bytes;
        ProgressUpdate {
            size: self.size,
            downloaded,
        }
    }

    /// Current snapshot
    pub fn snapshot(&self) -> ProgressUpdate {
        ProgressUpdate {
            size: self.size,
            downloaded: self.written.load(Ordering::Acquire),
        }
    }

    pub fn size(&self) -> u64 {
        self.size
    }
}
