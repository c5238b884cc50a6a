//! Page output trait: the downstream side of a pipeline stage.

use arrow::record_batch::RecordBatch;
use sf_error::Result;
use std::sync::{Arc, Mutex, MutexGuard};

/// Consumer of sealed pages.
///
/// Lifecycle: any number of [`add`](PageOutput::add) calls, then
/// [`finish`](PageOutput::finish) on success, and [`close`](PageOutput::close)
/// on every path. `close` must be safe to call after `finish`.
pub trait PageOutput: Send {
    /// Accepts one sealed page.
    fn add(&mut self, page: Arc<RecordBatch>) -> Result<()>;

    /// Signals that no more pages will arrive.
    fn finish(&mut self) -> Result<()>;

    /// Releases resources. Called on both success and failure paths.
    fn close(&mut self);
}

/// In-memory page sink.
///
/// Clones share the same storage, so a host can hand one clone downstream
/// and inspect what arrived through another.
#[derive(Debug, Clone, Default)]
pub struct MemoryOutput {
    state: Arc<Mutex<MemoryState>>,
}

#[derive(Debug, Default)]
struct MemoryState {
    pages: Vec<Arc<RecordBatch>>,
    finished: bool,
    closed: bool,
}

impl MemoryOutput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the pages received so far.
    pub fn pages(&self) -> Vec<Arc<RecordBatch>> {
        self.lock().pages.clone()
    }

    /// Total number of records received.
    pub fn num_rows(&self) -> usize {
        self.lock().pages.iter().map(|p| p.num_rows()).sum()
    }

    pub fn is_finished(&self) -> bool {
        self.lock().finished
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        // A poisoned lock only means another holder panicked; the data is plain.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl PageOutput for MemoryOutput {
    fn add(&mut self, page: Arc<RecordBatch>) -> Result<()> {
        self.lock().pages.push(page);
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.lock().finished = true;
        Ok(())
    }

    fn close(&mut self) {
        self.lock().closed = true;
    }
}
