//! Fixed-capacity history buffer for rtvars variables
//!
//! A [`HistoryBuffer`] binds an ordered set of registry variables as columns
//! and, once per control tick, copies their current values into a ring of
//! rows. When the ring is full the oldest row is overwritten.
//!
//! # Overview
//!
//! - **Writer**: [`HistoryBuffer`], owned by the control loop
//! - **Readers**: [`BufferReader`] handles, cloneable and `Send + Sync`
//! - **Windows**: owned [`Window`] copies with per-column statistics
//! - **Counters**: [`BufferCounters`] for ticks, overwrites and torn reads
//!
//! # RT Safety
//!
//! - `tick()` never allocates, never locks and runs in `O(columns)`
//! - Reads copy rows under a sequence-lock check and never block the writer
//! - Configuration and resizing allocate and must happen while ticking is
//!   paused
//!
//! # Example
//!
//! ```
//! use rtvars_buffer::prelude::*;
//! use rtvars_registry::prelude::*;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut root = Registry::new("robot")?;
//! let angle = root.register_variable("angle", VariableKind::Double, None)?;
//!
//! let mut buffer = HistoryBuffer::new();
//! buffer.configure(root.all_variables().cloned().collect(), 1024)?;
//! let reader = buffer.reader();
//!
//! angle.set_double(0.25)?;
//! buffer.tick()?;
//!
//! let window = reader.read_latest(1)?;
//! assert_eq!(window.column_average(0), Some(0.25));
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_op_in_unsafe_fn, clippy::unwrap_used)]
#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

pub mod buffer;
pub mod counters;
pub mod key_points;
pub mod prelude;
pub mod reader;
mod storage;
pub mod window;

pub use buffer::HistoryBuffer;
pub use counters::{BufferCounters, CounterSnapshot};
pub use key_points::KeyPoints;
pub use reader::BufferReader;
pub use window::{ColumnInfo, Window};
