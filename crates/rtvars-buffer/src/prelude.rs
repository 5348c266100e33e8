//! Prelude for the history buffer crate.

pub use crate::buffer::HistoryBuffer;
pub use crate::counters::{BufferCounters, CounterSnapshot};
pub use crate::reader::BufferReader;
pub use crate::window::{ColumnInfo, Window};
pub use rtvars_errors::BufferError;
