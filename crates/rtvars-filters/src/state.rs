//! Filter state types
//!
//! All state types are `#[repr(C)]` and `Copy`, so they can be embedded in
//! fixed-layout control structures and driven through the free step
//! functions without a bound variable.

pub use crate::alpha::{AlphaSource, AlphaState};
pub use crate::backlash::BacklashState;
pub use crate::first_order::{FirstOrderMode, FirstOrderState};
pub use crate::rate_limit::RateLimitState;
pub use crate::running_average::RunningAverageState;

/// Common reset for filter state.
pub trait FilterState: Copy + Clone + std::fmt::Debug {
    /// Return to the unseeded state, keeping coefficients.
    fn reset(&mut self);
}

impl FilterState for AlphaState {
    fn reset(&mut self) {
        self.prev_output = 0.0;
        self.initialized = false;
    }
}

impl FilterState for RateLimitState {
    fn reset(&mut self) {
        self.prev_output = 0.0;
        self.initialized = false;
    }
}

impl FilterState for BacklashState {
    fn reset(&mut self) {
        *self = BacklashState {
            dead_band: self.dead_band,
            ..BacklashState::default()
        };
    }
}

impl FilterState for FirstOrderState {
    fn reset(&mut self) {
        self.prev_input = 0.0;
        self.prev_high_pass = 0.0;
        self.prev_output = 0.0;
        self.initialized = false;
    }
}

impl FilterState for RunningAverageState {
    fn reset(&mut self) {
        *self = RunningAverageState::default();
    }
}
