//! The producer-side history buffer.

use std::collections::HashMap;
use std::sync::Arc;

use rtvars_errors::BufferError;
use rtvars_registry::VariableHandle;
use tracing::{debug, info, warn};

use crate::counters::BufferCounters;
use crate::key_points::KeyPoints;
use crate::reader::{BufferReader, Shared, read_latest, read_relative};
use crate::storage::RingStorage;
use crate::window::{ColumnInfo, Window};

/// Fixed-capacity history of a bound set of variables.
///
/// Owned by the control loop. Each [`tick`](Self::tick) copies the current
/// value of every bound variable into the next ring row; once the ring is
/// full the oldest row is overwritten. Consumers read through
/// [`BufferReader`] handles from [`reader`](Self::reader).
///
/// Rows carry absolute tick numbers starting at zero. `out_point` is the
/// oldest retained tick and `in_point` is one past the newest.
///
/// # RT Safety
///
/// - `tick` is allocation-free, lock-free and `O(columns)`
/// - `configure`, `reconfigure`, `rebind`, `crop`, `thin` and `clear`
///   allocate or take a lock and must run while ticking is paused
///
/// # Example
///
/// ```
/// use rtvars_buffer::HistoryBuffer;
/// use rtvars_registry::prelude::*;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let mut root = Registry::new("root")?;
/// let x = root.register_variable("x", VariableKind::Double, None)?;
///
/// let mut buffer = HistoryBuffer::new();
/// buffer.configure(vec![x.clone()], 4)?;
/// for v in 1..=5 {
///     x.set_double(f64::from(v))?;
///     buffer.tick()?;
/// }
///
/// let window = buffer.read_window(0, 4)?;
/// assert_eq!(window.column_f64(0), Some(vec![2.0, 3.0, 4.0, 5.0]));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct HistoryBuffer {
    shared: Arc<Shared>,
    storage: Option<Arc<RingStorage>>,
    variables: Vec<VariableHandle>,
    key_points: KeyPoints,
}

impl HistoryBuffer {
    /// Unconfigured buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `variables` as columns and allocate `capacity` rows for each.
    ///
    /// # Errors
    ///
    /// - `AlreadyConfigured` on a second call; use [`rebind`](Self::rebind) or
    ///   [`reconfigure`](Self::reconfigure)
    /// - `InvalidCapacity` for a zero capacity
    /// - `DetachedVariable` if a variable's registry is gone
    /// - `DuplicateColumn` if a variable appears twice
    pub fn configure(
        &mut self,
        variables: Vec<VariableHandle>,
        capacity: usize,
    ) -> Result<(), BufferError> {
        if self.storage.is_some() {
            return Err(BufferError::AlreadyConfigured);
        }
        check_capacity(capacity)?;
        check_binding(&variables)?;

        let storage = Arc::new(RingStorage::new(layout_of(&variables), capacity, 0));
        self.shared.install(Arc::clone(&storage));
        self.storage = Some(storage);
        self.variables = variables;
        info!(
            columns = self.variables.len(),
            capacity, "history buffer configured"
        );
        Ok(())
    }

    /// True once `configure` has succeeded.
    pub fn is_configured(&self) -> bool {
        self.storage.is_some()
    }

    /// Snapshot every bound variable into the next row.
    ///
    /// Returns the tick number of the row written.
    ///
    /// # Errors
    ///
    /// `NotConfigured` before `configure`.
    #[inline]
    pub fn tick(&mut self) -> Result<u64, BufferError> {
        let storage = self.storage.as_ref().ok_or(BufferError::NotConfigured)?;
        let (tick, overwrote) = storage.write_row(&self.variables);
        self.shared.counters.inc_tick();
        if overwrote {
            self.shared.counters.inc_overwritten();
        }
        Ok(tick)
    }

    /// Change the capacity, keeping the newest rows that fit.
    ///
    /// Allocates new storage, copies the retained window into it and swaps
    /// it in for every reader.
    ///
    /// # Errors
    ///
    /// `NotConfigured` or `InvalidCapacity`.
    pub fn reconfigure(&mut self, capacity: usize) -> Result<(), BufferError> {
        let current = self.storage.as_ref().ok_or(BufferError::NotConfigured)?;
        check_capacity(capacity)?;

        let previous = current.capacity();
        let next = Arc::new(current.resized(capacity));
        self.key_points.prune(next.out_point());
        self.shared.install(Arc::clone(&next));
        self.storage = Some(next);
        info!(from = previous, to = capacity, "history buffer reconfigured");
        Ok(())
    }

    /// Keep only the retained rows in `[first_tick, first_tick + count)` and
    /// shrink the ring to fit them.
    ///
    /// Kept rows are renumbered consecutively from the current `in_point`,
    /// so tick numbers stay unique. Key points are dropped.
    ///
    /// # Errors
    ///
    /// `NotConfigured`, or `Range` if the request misses the retained rows.
    pub fn crop(&mut self, first_tick: u64, count: u64) -> Result<(), BufferError> {
        let current = self.storage.as_ref().ok_or(BufferError::NotConfigured)?;
        let (out, end) = (current.out_point(), current.in_point());
        let start = first_tick.max(out);
        let stop = first_tick.saturating_add(count).min(end);
        if start >= stop {
            return Err(BufferError::Range {
                from: first_tick,
                count,
                first: out,
                end,
            });
        }
        let ticks: Vec<u64> = (start..stop).collect();
        self.install_repacked(&ticks);
        info!(from = start, to = stop, "history buffer cropped");
        Ok(())
    }

    /// Keep every `stride`-th retained row, starting with the oldest, and
    /// shrink the ring to fit them.
    ///
    /// Renumbers like [`crop`](Self::crop). An empty buffer is left as is.
    ///
    /// # Errors
    ///
    /// `NotConfigured`, or `InvalidStride` for a zero stride.
    pub fn thin(&mut self, stride: usize) -> Result<(), BufferError> {
        let current = self.storage.as_ref().ok_or(BufferError::NotConfigured)?;
        if stride == 0 {
            return Err(BufferError::InvalidStride { stride });
        }
        let ticks: Vec<u64> = (current.out_point()..current.in_point())
            .step_by(stride)
            .collect();
        if ticks.is_empty() {
            return Ok(());
        }
        self.install_repacked(&ticks);
        info!(stride, kept = ticks.len(), "history buffer thinned");
        Ok(())
    }

    fn install_repacked(&mut self, ticks: &[u64]) {
        let Some(current) = self.storage.as_ref() else {
            return;
        };
        let next = Arc::new(current.repacked(ticks));
        self.shared.install(Arc::clone(&next));
        self.storage = Some(next);
        self.key_points.clear();
    }

    /// Replace the bound column set, keeping the capacity and discarding
    /// history. Tick numbering continues.
    ///
    /// # Errors
    ///
    /// `NotConfigured`, `DetachedVariable` or `DuplicateColumn`.
    pub fn rebind(&mut self, variables: Vec<VariableHandle>) -> Result<(), BufferError> {
        let current = self.storage.as_ref().ok_or(BufferError::NotConfigured)?;
        check_binding(&variables)?;

        let next = Arc::new(RingStorage::new(
            layout_of(&variables),
            current.capacity(),
            current.in_point(),
        ));
        self.shared.install(Arc::clone(&next));
        self.storage = Some(next);
        self.variables = variables;
        self.key_points.clear();
        info!(columns = self.variables.len(), "history buffer rebound");
        Ok(())
    }

    /// Drop all recorded rows and key points, keeping binding and capacity.
    ///
    /// # Errors
    ///
    /// `NotConfigured`.
    pub fn clear(&mut self) -> Result<(), BufferError> {
        let storage = self.storage.as_ref().ok_or(BufferError::NotConfigured)?;
        storage.clear();
        self.key_points.clear();
        debug!(at = storage.in_point(), "history buffer cleared");
        Ok(())
    }

    /// New read handle sharing this buffer's storage.
    pub fn reader(&self) -> BufferReader {
        BufferReader::new(Arc::clone(&self.shared))
    }

    /// Copy `count` rows starting `from` rows after the oldest retained row.
    ///
    /// # Errors
    ///
    /// See [`BufferReader::read_window`].
    pub fn read_window(&self, from: u64, count: u64) -> Result<Window, BufferError> {
        let storage = self.storage.as_ref().ok_or(BufferError::NotConfigured)?;
        read_relative(storage, &self.shared.counters, from, count)
    }

    /// Copy ticks `[first_tick, first_tick + count)`.
    ///
    /// # Errors
    ///
    /// See [`BufferReader::read_ticks`].
    pub fn read_ticks(&self, first_tick: u64, count: u64) -> Result<Window, BufferError> {
        let storage = self.storage.as_ref().ok_or(BufferError::NotConfigured)?;
        storage.read(first_tick, count, &self.shared.counters)
    }

    /// Copy the newest `count` rows.
    ///
    /// # Errors
    ///
    /// See [`BufferReader::read_latest`].
    pub fn read_latest(&self, count: u64) -> Result<Window, BufferError> {
        let storage = self.storage.as_ref().ok_or(BufferError::NotConfigured)?;
        read_latest(storage, &self.shared.counters, count)
    }

    /// Bound variables in column order.
    pub fn variables(&self) -> &[VariableHandle] {
        &self.variables
    }

    /// Ring length, zero before configuration.
    pub fn capacity(&self) -> usize {
        self.storage.as_ref().map_or(0, |s| s.capacity())
    }

    /// Slot the next tick will be written to.
    pub fn write_index(&self) -> usize {
        self.storage.as_ref().map_or(0, |s| {
            let capacity = s.capacity() as u64;
            usize::try_from(s.in_point() % capacity).unwrap_or(0)
        })
    }

    /// Oldest retained tick.
    pub fn out_point(&self) -> u64 {
        self.storage.as_ref().map_or(0, |s| s.out_point())
    }

    /// One past the newest retained tick.
    pub fn in_point(&self) -> u64 {
        self.storage.as_ref().map_or(0, |s| s.in_point())
    }

    /// Number of retained rows.
    pub fn len(&self) -> u64 {
        self.in_point().saturating_sub(self.out_point())
    }

    /// True if no rows are retained.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Activity counters shared with every reader.
    pub fn counters(&self) -> &BufferCounters {
        &self.shared.counters
    }

    /// Flip the bookmark on a retained tick; returns true if it is now set.
    ///
    /// # Errors
    ///
    /// `Range` if `tick` is not retained.
    pub fn toggle_key_point(&mut self, tick: u64) -> Result<bool, BufferError> {
        let (out, end) = (self.out_point(), self.in_point());
        if !(out..end).contains(&tick) {
            return Err(BufferError::Range {
                from: tick,
                count: 1,
                first: out,
                end,
            });
        }
        Ok(self.key_points.toggle(tick))
    }

    /// True if `tick` is a retained bookmark.
    pub fn is_key_point(&self, tick: u64) -> bool {
        self.key_points.contains(tick, self.out_point())
    }

    /// First bookmark after `tick`.
    pub fn next_key_point(&self, tick: u64) -> Option<u64> {
        self.key_points.next_after(tick, self.out_point())
    }

    /// Last bookmark before `tick`.
    pub fn previous_key_point(&self, tick: u64) -> Option<u64> {
        self.key_points.previous_before(tick, self.out_point())
    }

    /// Retained bookmarks, ascending.
    pub fn key_points(&self) -> Vec<u64> {
        self.key_points.iter(self.out_point()).collect()
    }
}

fn check_capacity(capacity: usize) -> Result<(), BufferError> {
    if capacity == 0 {
        return Err(BufferError::InvalidCapacity { capacity });
    }
    if !capacity.is_power_of_two() {
        warn!(capacity, "history buffer capacity is not a power of two");
    }
    Ok(())
}

fn check_binding(variables: &[VariableHandle]) -> Result<(), BufferError> {
    let mut seen = HashMap::with_capacity(variables.len());
    for (column, variable) in variables.iter().enumerate() {
        if variable.is_detached() {
            return Err(BufferError::DetachedVariable { column });
        }
        if let Some(&first) = seen.get(&variable.id()) {
            return Err(BufferError::DuplicateColumn {
                first,
                second: column,
            });
        }
        seen.insert(variable.id(), column);
    }
    Ok(())
}

fn layout_of(variables: &[VariableHandle]) -> Arc<[ColumnInfo]> {
    variables
        .iter()
        .map(|v| ColumnInfo {
            name: v.full_name(),
            kind: v.kind(),
        })
        .collect()
}
