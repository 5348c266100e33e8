//! Atomic counters describing buffer activity.
//!
//! # RT Safety
//!
//! The increment methods are RT-safe:
//! - single `fetch_add` with `Ordering::Relaxed`
//! - no allocation, no blocking

use core::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Counter snapshot returned by [`BufferCounters::snapshot`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct CounterSnapshot {
    /// Rows written by `tick`
    pub ticks_written: u64,
    /// Ticks that overwrote a retained row
    pub rows_overwritten: u64,
    /// Successful window reads
    pub window_reads: u64,
    /// Rows dropped from a read because the writer lapped them mid-copy
    pub torn_rows_discarded: u64,
}

/// Shared activity counters for one history buffer.
///
/// The writer and every reader see the same instance; it survives
/// `reconfigure` and `rebind`.
///
/// ```rust
/// use rtvars_buffer::BufferCounters;
///
/// let counters = BufferCounters::new();
/// counters.inc_tick();
/// counters.inc_tick();
/// assert_eq!(counters.snapshot().ticks_written, 2);
/// ```
#[derive(Debug)]
pub struct BufferCounters {
    ticks_written: AtomicU64,
    rows_overwritten: AtomicU64,
    window_reads: AtomicU64,
    torn_rows_discarded: AtomicU64,
}

impl Default for BufferCounters {
    fn default() -> Self {
        Self::new()
    }
}

impl BufferCounters {
    /// All counters at zero.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            ticks_written: AtomicU64::new(0),
            rows_overwritten: AtomicU64::new(0),
            window_reads: AtomicU64::new(0),
            torn_rows_discarded: AtomicU64::new(0),
        }
    }

    /// Count one written row.
    #[inline]
    pub fn inc_tick(&self) {
        self.ticks_written.fetch_add(1, Ordering::Relaxed);
    }

    /// Count one overwritten row.
    #[inline]
    pub fn inc_overwritten(&self) {
        self.rows_overwritten.fetch_add(1, Ordering::Relaxed);
    }

    /// Count one successful read.
    #[inline]
    pub fn inc_window_read(&self) {
        self.window_reads.fetch_add(1, Ordering::Relaxed);
    }

    /// Add rows discarded by a read.
    #[inline]
    pub fn add_torn_rows(&self, rows: u64) {
        self.torn_rows_discarded.fetch_add(rows, Ordering::Relaxed);
    }

    /// Rows written so far.
    #[inline]
    pub fn ticks_written(&self) -> u64 {
        self.ticks_written.load(Ordering::Relaxed)
    }

    /// Read every counter.
    ///
    /// Individual loads are not atomic with each other; the result is
    /// eventually consistent.
    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            ticks_written: self.ticks_written.load(Ordering::Relaxed),
            rows_overwritten: self.rows_overwritten.load(Ordering::Relaxed),
            window_reads: self.window_reads.load(Ordering::Relaxed),
            torn_rows_discarded: self.torn_rows_discarded.load(Ordering::Relaxed),
        }
    }

    /// Read every counter and zero it.
    pub fn snapshot_and_reset(&self) -> CounterSnapshot {
        CounterSnapshot {
            ticks_written: self.ticks_written.swap(0, Ordering::Relaxed),
            rows_overwritten: self.rows_overwritten.swap(0, Ordering::Relaxed),
            window_reads: self.window_reads.swap(0, Ordering::Relaxed),
            torn_rows_discarded: self.torn_rows_discarded.swap(0, Ordering::Relaxed),
        }
    }

    /// Zero every counter.
    pub fn reset(&self) {
        self.ticks_written.store(0, Ordering::Relaxed);
        self.rows_overwritten.store(0, Ordering::Relaxed);
        self.window_reads.store(0, Ordering::Relaxed);
        self.torn_rows_discarded.store(0, Ordering::Relaxed);
    }
}
