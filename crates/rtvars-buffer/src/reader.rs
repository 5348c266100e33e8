//! Consumer-side read handle.

use std::sync::Arc;

use parking_lot::RwLock;
use rtvars_errors::BufferError;

use crate::counters::{BufferCounters, CounterSnapshot};
use crate::storage::RingStorage;
use crate::window::{ColumnInfo, Window};

/// State shared between the writer and every reader.
#[derive(Debug, Default)]
pub(crate) struct Shared {
    pub(crate) storage: RwLock<Option<Arc<RingStorage>>>,
    pub(crate) counters: BufferCounters,
}

impl Shared {
    pub(crate) fn current(&self) -> Option<Arc<RingStorage>> {
        self.storage.read().clone()
    }

    pub(crate) fn install(&self, storage: Arc<RingStorage>) {
        *self.storage.write() = Some(storage);
    }
}

/// Read `count` rows starting `from` rows after the out point.
pub(crate) fn read_relative(
    storage: &RingStorage,
    counters: &BufferCounters,
    from: u64,
    count: u64,
) -> Result<Window, BufferError> {
    let out = storage.out_point();
    let len = storage.in_point().saturating_sub(out);
    if from >= len || count == 0 {
        return Err(BufferError::Range {
            from,
            count,
            first: 0,
            end: len,
        });
    }
    storage.read(out.saturating_add(from), count, counters)
}

/// Read the newest `count` rows.
pub(crate) fn read_latest(
    storage: &RingStorage,
    counters: &BufferCounters,
    count: u64,
) -> Result<Window, BufferError> {
    let in_point = storage.in_point();
    let first = in_point.saturating_sub(count).max(storage.out_point());
    storage.read(first, in_point.saturating_sub(first), counters)
}

/// Cloneable handle for threads that consume buffer history.
///
/// Every read copies rows out and returns an owned [`Window`], so a reader
/// never holds a reference into storage the writer is using. Reads may run
/// while the writer ticks; rows the writer overwrites during the copy are
/// dropped from the result rather than returned torn.
///
/// # RT Safety
///
/// Readers never block the writer. Each read takes a short read lock to fetch
/// the current storage, which only contends with `configure`, `reconfigure`
/// and `rebind`.
#[derive(Debug, Clone)]
pub struct BufferReader {
    shared: Arc<Shared>,
}

impl BufferReader {
    pub(crate) fn new(shared: Arc<Shared>) -> Self {
        Self { shared }
    }

    fn storage(&self) -> Result<Arc<RingStorage>, BufferError> {
        self.shared.current().ok_or(BufferError::NotConfigured)
    }

    /// Copy `count` rows starting `from` rows after the oldest retained row.
    ///
    /// The result is clipped to the retained history.
    ///
    /// # Errors
    ///
    /// `Range` if the request does not overlap the retained rows,
    /// `NotConfigured` before the buffer is configured.
    pub fn read_window(&self, from: u64, count: u64) -> Result<Window, BufferError> {
        read_relative(&*self.storage()?, &self.shared.counters, from, count)
    }

    /// Copy ticks `[first_tick, first_tick + count)`, clipped to the retained
    /// history.
    ///
    /// # Errors
    ///
    /// `Range` if no requested tick is retained.
    pub fn read_ticks(&self, first_tick: u64, count: u64) -> Result<Window, BufferError> {
        self.storage()?.read(first_tick, count, &self.shared.counters)
    }

    /// Copy the newest `count` rows.
    ///
    /// # Errors
    ///
    /// `Range` if nothing has been recorded.
    pub fn read_latest(&self, count: u64) -> Result<Window, BufferError> {
        read_latest(&*self.storage()?, &self.shared.counters, count)
    }

    /// Number of retained rows.
    pub fn len(&self) -> u64 {
        self.shared
            .current()
            .map_or(0, |s| s.in_point().saturating_sub(s.out_point()))
    }

    /// True if no rows are retained.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Oldest retained tick.
    pub fn out_point(&self) -> u64 {
        self.shared.current().map_or(0, |s| s.out_point())
    }

    /// One past the newest retained tick.
    pub fn in_point(&self) -> u64 {
        self.shared.current().map_or(0, |s| s.in_point())
    }

    /// Ring length, zero before configuration.
    pub fn capacity(&self) -> usize {
        self.shared.current().map_or(0, |s| s.capacity())
    }

    /// Column layout of the current binding.
    pub fn columns(&self) -> Vec<ColumnInfo> {
        self.shared
            .current()
            .map(|s| s.layout().to_vec())
            .unwrap_or_default()
    }

    /// Activity counters.
    pub fn counters(&self) -> CounterSnapshot {
        self.shared.counters.snapshot()
    }
}
