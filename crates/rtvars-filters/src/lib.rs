//! Stateful filters over rtvars variables
//!
//! Each filter reads one input variable, runs one step of its recurrence
//! and writes a double output variable, once per control tick.
//!
//! # Overview
//!
//! - **Alpha**: exponential smoothing from a break frequency or fixed α
//! - **Rate limiter**: caps the output step at `max_rate · dt`
//! - **Backlash compensator**: holds the output inside a dead-band after a
//!   direction reversal
//! - **First order**: RC low-pass or high-pass
//! - **Running average**: cumulative mean since reset
//!
//! Every filter comes in two layers: a `#[repr(C)]` state struct with a free
//! step function (`alpha_filter`, `rate_limit_filter`, ...), and a bound
//! type implementing [`Filter`] that owns the state plus its variable
//! [`Binding`]. A binding holds the output's writer claim, so only one filter
//! can drive a given output.
//!
//! # RT Safety Guarantees
//!
//! - No heap allocations in `update` or the step functions
//! - O(1) time per step
//! - No logging on the update path; construction logs at `debug`
//! - `dt <= 0` (or non-finite) is rejected before any state changes
//!
//! # Example
//!
//! ```
//! use rtvars_filters::prelude::*;
//! use rtvars_registry::prelude::*;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut root = Registry::new("joint")?;
//! let raw = root.register_variable("raw", VariableKind::Double, None)?;
//! let smooth = root.register_variable("smooth", VariableKind::Double, None)?;
//! let limited = root.register_variable("limited", VariableKind::Double, None)?;
//!
//! let mut chain = FilterChain::new()
//!     .with(AlphaFilter::new(&raw, &smooth, 20.0)?)
//!     .with(RateLimiter::new(&smooth, &limited, 1.0)?);
//!
//! raw.set_double(0.5)?;
//! chain.update(0.001)?;
//! assert_eq!(limited.get_double(), Some(0.5));
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_op_in_unsafe_fn, clippy::unwrap_used)]
#![deny(static_mut_refs)]
#![deny(unused_must_use)]
#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

pub mod alpha;
pub mod backlash;
pub mod coefficients;
pub mod filter;
pub mod first_order;
pub mod prelude;
pub mod rate_limit;
pub mod running_average;
pub mod state;

pub use alpha::{AlphaFilter, alpha_filter};
pub use backlash::{BacklashCompensator, backlash_filter};
pub use coefficients::{alpha_from_break_frequency, break_frequency_from_alpha, validate_timestep};
pub use filter::{AnyFilter, Binding, Filter, FilterChain};
pub use first_order::{FirstOrderFilter, first_order_filter};
pub use rate_limit::{RateLimiter, rate_limit_filter};
pub use running_average::{RunningAverage, running_average_filter};
pub use rtvars_errors::FilterError;
pub use state::*;
