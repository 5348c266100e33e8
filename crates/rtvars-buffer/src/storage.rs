//! Column-major ring storage with a sequence-lock read protocol.
//!
//! Tick `t` lives in slot `t % capacity` of every column. Two counters track
//! the writer:
//!
//! - `writing`: one past the tick currently being written
//! - `published`: one past the last fully written tick
//!
//! A reader copies rows below `published`, then re-reads `writing`. Any row the
//! writer may have lapped during the copy (tick `< writing - capacity`) is
//! discarded, so a window only ever contains fully written rows.

use core::fmt;
use core::sync::atomic::{AtomicU64, Ordering, fence};
use std::sync::Arc;

use crossbeam::utils::CachePadded;
use rtvars_errors::BufferError;
use rtvars_registry::VariableHandle;

use crate::counters::BufferCounters;
use crate::window::{ColumnInfo, Window};

struct Column {
    cells: Box<[AtomicU64]>,
}

impl Column {
    fn new(capacity: usize) -> Self {
        Self {
            cells: (0..capacity).map(|_| AtomicU64::new(0)).collect(),
        }
    }

    #[inline]
    fn store(&self, slot: usize, bits: u64) {
        if let Some(cell) = self.cells.get(slot) {
            cell.store(bits, Ordering::Relaxed);
        }
    }

    fn load(&self, slot: usize) -> u64 {
        self.cells
            .get(slot)
            .map_or(0, |cell| cell.load(Ordering::Relaxed))
    }

    /// Copy `rows` cells starting at `slot`, wrapping at the end.
    fn copy_out(&self, slot: usize, rows: usize) -> Vec<u64> {
        let (head, tail) = self.cells.split_at(slot.min(self.cells.len()));
        tail.iter()
            .chain(head)
            .take(rows)
            .map(|cell| cell.load(Ordering::Relaxed))
            .collect()
    }
}

/// Fixed-capacity storage for one column layout.
///
/// Allocated once by `configure`/`reconfigure`/`rebind`; `write_row` never
/// allocates.
pub(crate) struct RingStorage {
    capacity: u64,
    slots: usize,
    layout: Arc<[ColumnInfo]>,
    columns: Box<[Column]>,
    writing: CachePadded<AtomicU64>,
    published: CachePadded<AtomicU64>,
    oldest: CachePadded<AtomicU64>,
}

impl RingStorage {
    /// Empty storage whose first tick will be `start`.
    pub(crate) fn new(layout: Arc<[ColumnInfo]>, capacity: usize, start: u64) -> Self {
        let columns = layout.iter().map(|_| Column::new(capacity)).collect();
        Self {
            capacity: capacity as u64,
            slots: capacity,
            layout,
            columns,
            writing: CachePadded::new(AtomicU64::new(start)),
            published: CachePadded::new(AtomicU64::new(start)),
            oldest: CachePadded::new(AtomicU64::new(start)),
        }
    }

    pub(crate) fn capacity(&self) -> usize {
        self.slots
    }

    pub(crate) fn layout(&self) -> &Arc<[ColumnInfo]> {
        &self.layout
    }

    #[inline]
    fn slot(&self, tick: u64) -> usize {
        // capacity fits in usize, so the remainder does too
        usize::try_from(tick % self.capacity).unwrap_or(0)
    }

    /// One past the newest retained tick.
    pub(crate) fn in_point(&self) -> u64 {
        self.published.load(Ordering::Acquire)
    }

    /// Oldest retained tick for a given `published` value.
    fn out_point_at(&self, published: u64) -> u64 {
        published
            .saturating_sub(self.capacity)
            .max(self.oldest.load(Ordering::Acquire))
    }

    /// Oldest retained tick.
    pub(crate) fn out_point(&self) -> u64 {
        self.out_point_at(self.in_point())
    }

    /// Write one row from the bound variables and publish it.
    ///
    /// Returns the tick number written and whether a retained row was
    /// overwritten. Only the owning writer calls this.
    #[inline]
    pub(crate) fn write_row(&self, variables: &[VariableHandle]) -> (u64, bool) {
        let tick = self.published.load(Ordering::Relaxed);
        let overwrote = tick.saturating_sub(self.oldest.load(Ordering::Relaxed)) >= self.capacity;
        let slot = self.slot(tick);

        self.writing.store(tick.wrapping_add(1), Ordering::Relaxed);
        fence(Ordering::Release);
        for (column, variable) in self.columns.iter().zip(variables) {
            column.store(slot, variable.raw_bits());
        }
        self.published.store(tick.wrapping_add(1), Ordering::Release);
        (tick, overwrote)
    }

    /// Drop all retained rows; tick numbering continues.
    pub(crate) fn clear(&self) {
        self.oldest.store(self.in_point(), Ordering::Release);
    }

    /// Copy ticks `[first, first + count)`, clipped to the retained range.
    pub(crate) fn read(
        &self,
        first: u64,
        count: u64,
        counters: &BufferCounters,
    ) -> Result<Window, BufferError> {
        let published = self.published.load(Ordering::Acquire);
        let out = self.out_point_at(published);
        let start = first.max(out);
        let end = first.saturating_add(count).min(published);
        let range_error = BufferError::Range {
            from: first,
            count,
            first: out,
            end: published,
        };
        if start >= end {
            return Err(range_error);
        }

        // bounded by capacity
        let rows = usize::try_from(end - start).unwrap_or(usize::MAX);
        let slot = self.slot(start);
        let mut columns: Vec<Vec<u64>> = self
            .columns
            .iter()
            .map(|column| column.copy_out(slot, rows))
            .collect();

        fence(Ordering::Acquire);
        let writing = self.writing.load(Ordering::Relaxed);
        let stable = writing.saturating_sub(self.capacity).max(start);
        if stable >= end {
            counters.add_torn_rows(end - start);
            return Err(BufferError::Range {
                from: first,
                count,
                first: stable,
                end: published,
            });
        }
        let torn = stable - start;
        if torn > 0 {
            counters.add_torn_rows(torn);
            let discard = usize::try_from(torn).unwrap_or(rows);
            for column in &mut columns {
                column.drain(..discard.min(column.len()));
            }
        }
        counters.inc_window_read();

        if self.columns.is_empty() {
            let len = usize::try_from(end - stable).unwrap_or(0);
            return Ok(Window::empty_columns(stable, len));
        }
        Ok(Window::new(stable, Arc::clone(&self.layout), columns))
    }

    /// Build storage of a new capacity holding the newest retained rows.
    ///
    /// Must not run concurrently with `write_row` on `self`.
    pub(crate) fn resized(&self, capacity: usize) -> Self {
        let published = self.in_point();
        let out = self.out_point_at(published);
        let retained = (published - out).min(capacity as u64);
        let first = published - retained;

        let next = Self::new(Arc::clone(&self.layout), capacity, first);
        for tick in first..published {
            let from = self.slot(tick);
            let to = next.slot(tick);
            for (src, dst) in self.columns.iter().zip(next.columns.iter()) {
                dst.store(to, src.load(from));
            }
        }
        next.writing.store(published, Ordering::Relaxed);
        next.published.store(published, Ordering::Release);
        next
    }

    /// Build storage holding copies of `ticks`, renumbered consecutively
    /// from this storage's `in_point`. Capacity is `ticks.len()`, at least one.
    ///
    /// Every tick in `ticks` must be retained. Must not run concurrently with
    /// `write_row` on `self`.
    pub(crate) fn repacked(&self, ticks: &[u64]) -> Self {
        let start = self.in_point();
        let next = Self::new(Arc::clone(&self.layout), ticks.len().max(1), start);
        for (to_tick, &from_tick) in (start..).zip(ticks) {
            let from = self.slot(from_tick);
            let to = next.slot(to_tick);
            for (src, dst) in self.columns.iter().zip(next.columns.iter()) {
                dst.store(to, src.load(from));
            }
        }
        let end = start + ticks.len() as u64;
        next.writing.store(end, Ordering::Relaxed);
        next.published.store(end, Ordering::Release);
        next
    }
}

impl fmt::Debug for RingStorage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RingStorage")
            .field("capacity", &self.capacity)
            .field("columns", &self.layout.len())
            .field("out_point", &self.out_point())
            .field("in_point", &self.in_point())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rtvars_registry::prelude::*;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    fn one_column(capacity: usize) -> Result<(Registry, VariableHandle, RingStorage), RegistryError> {
        let mut root = Registry::new("root")?;
        let x = root.register_variable("x", VariableKind::Long, None)?;
        let layout: Arc<[ColumnInfo]> = Arc::from(vec![ColumnInfo {
            name: x.full_name(),
            kind: x.kind(),
        }]);
        Ok((root, x, RingStorage::new(layout, capacity, 0)))
    }

    #[test]
    fn test_write_then_read() -> TestResult {
        let (_root, x, storage) = one_column(4)?;
        let counters = BufferCounters::new();
        for v in 1..=3 {
            x.set_long(v)?;
            storage.write_row(std::slice::from_ref(&x));
        }
        let window = storage.read(0, 10, &counters)?;
        assert_eq!(window.first_tick(), 0);
        assert_eq!(
            window.column(0),
            Some(vec![
                VariableValue::Long(1),
                VariableValue::Long(2),
                VariableValue::Long(3)
            ])
        );
        assert_eq!(counters.snapshot().window_reads, 1);
        Ok(())
    }

    #[test]
    fn test_wraparound_reports_overwrite() -> TestResult {
        let (_root, x, storage) = one_column(2)?;
        let vars = [x];
        assert_eq!(storage.write_row(&vars), (0, false));
        assert_eq!(storage.write_row(&vars), (1, false));
        assert_eq!(storage.write_row(&vars), (2, true));
        assert_eq!(storage.out_point(), 1);
        assert_eq!(storage.in_point(), 3);
        Ok(())
    }

    #[test]
    fn test_read_before_out_point_is_range_error() -> TestResult {
        let (_root, x, storage) = one_column(2)?;
        let vars = [x];
        for _ in 0..5 {
            storage.write_row(&vars);
        }
        let counters = BufferCounters::new();
        assert_eq!(
            storage.read(0, 2, &counters),
            Err(BufferError::Range {
                from: 0,
                count: 2,
                first: 3,
                end: 5
            })
        );
        Ok(())
    }

    #[test]
    fn test_resized_keeps_newest_rows() -> TestResult {
        let (_root, x, storage) = one_column(4)?;
        for v in 1..=4 {
            x.set_long(v * 10)?;
            storage.write_row(std::slice::from_ref(&x));
        }
        let smaller = storage.resized(2);
        assert_eq!(smaller.out_point(), 2);
        assert_eq!(smaller.in_point(), 4);
        let window = smaller.read(0, 4, &BufferCounters::new())?;
        assert_eq!(
            window.column(0),
            Some(vec![VariableValue::Long(30), VariableValue::Long(40)])
        );
        Ok(())
    }

    #[test]
    fn test_repacked_renumbers_from_in_point() -> TestResult {
        let (_root, x, storage) = one_column(8)?;
        for v in 0..6 {
            x.set_long(v)?;
            storage.write_row(std::slice::from_ref(&x));
        }
        let packed = storage.repacked(&[1, 3, 5]);
        assert_eq!(packed.capacity(), 3);
        assert_eq!((packed.out_point(), packed.in_point()), (6, 9));
        let window = packed.read(6, 3, &BufferCounters::new())?;
        assert_eq!(
            window.column(0),
            Some(vec![
                VariableValue::Long(1),
                VariableValue::Long(3),
                VariableValue::Long(5)
            ])
        );
        assert_eq!(packed.write_row(std::slice::from_ref(&x)), (9, true));
        Ok(())
    }

    #[test]
    fn test_clear_keeps_numbering() -> TestResult {
        let (_root, x, storage) = one_column(4)?;
        let vars = [x];
        storage.write_row(&vars);
        storage.write_row(&vars);
        storage.clear();
        assert_eq!(storage.out_point(), 2);
        assert_eq!(storage.in_point(), 2);
        assert_eq!(storage.write_row(&vars).0, 2);
        Ok(())
    }
}
