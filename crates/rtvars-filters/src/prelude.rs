//! Prelude for the filters crate.
//!
//! # Example
//!
//! ```
//! use rtvars_filters::prelude::*;
//!
//! let mut state = RateLimitState::new(1.0)?;
//! rate_limit_filter(0.0, 0.1, &mut state)?;
//! let y = rate_limit_filter(10.0, 0.1, &mut state)?;
//! assert!((y - 0.1).abs() < 1e-12);
//! # Ok::<(), FilterError>(())
//! ```

pub use crate::alpha::{AlphaFilter, AlphaState, alpha_filter};
pub use crate::backlash::{BacklashCompensator, BacklashState, backlash_filter};
pub use crate::coefficients::{
    alpha_from_break_frequency, break_frequency_from_alpha, validate_timestep,
};
pub use crate::filter::{AnyFilter, Binding, Filter, FilterChain};
pub use crate::first_order::{
    FirstOrderFilter, FirstOrderMode, FirstOrderState, first_order_filter,
};
pub use crate::rate_limit::{RateLimitState, RateLimiter, rate_limit_filter};
pub use crate::running_average::{RunningAverage, RunningAverageState, running_average_filter};
pub use crate::state::FilterState;
pub use rtvars_errors::FilterError;
