//! Rate limiter
//!
//! Restricts the change between consecutive outputs to `max_rate · dt`.

use rtvars_errors::FilterError;
use rtvars_registry::VariableHandle;
use tracing::debug;

use crate::coefficients::validate_timestep;
use crate::filter::{Binding, Filter};

/// State for the rate limiter.
///
/// # RT Safety
///
/// - `#[repr(C)]` for stable ABI
/// - No heap allocations
/// - O(1) time complexity
#[repr(C)]
#[derive(Copy, Clone, Debug)]
pub struct RateLimitState {
    /// Largest allowed change per second
    pub max_rate: f64,
    /// Previous output
    pub prev_output: f64,
    /// False until the first update after a reset
    pub initialized: bool,
}

impl RateLimitState {
    /// Limit the output to `max_rate` units per second.
    ///
    /// # Errors
    ///
    /// `InvalidParameter` for a negative or NaN rate.
    ///
    /// # Example
    ///
    /// ```
    /// use rtvars_filters::RateLimitState;
    ///
    /// let state = RateLimitState::new(2.0)?;
    /// assert_eq!(state.max_step(0.5), 1.0);
    /// # Ok::<(), rtvars_filters::FilterError>(())
    /// ```
    pub fn new(max_rate: f64) -> Result<Self, FilterError> {
        if max_rate.is_nan() || max_rate < 0.0 {
            return Err(FilterError::InvalidParameter {
                name: "max_rate",
                value: max_rate,
            });
        }
        Ok(Self {
            max_rate,
            prev_output: 0.0,
            initialized: false,
        })
    }

    /// No limit (bypass).
    pub fn unlimited() -> Self {
        Self {
            max_rate: f64::INFINITY,
            prev_output: 0.0,
            initialized: false,
        }
    }

    /// Largest step allowed over `dt`.
    #[inline]
    pub fn max_step(&self, dt: f64) -> f64 {
        self.max_rate * dt
    }
}

impl Default for RateLimitState {
    fn default() -> Self {
        Self::unlimited()
    }
}

/// One rate limiter step.
///
/// The first update after a reset passes the input through.
///
/// # RT Safety
///
/// - No heap allocations
/// - O(1) time complexity
///
/// # Errors
///
/// `InvalidTimestep` if `dt` is not positive and finite.
///
/// # Example
///
/// ```
/// use rtvars_filters::prelude::*;
///
/// let mut state = RateLimitState::new(1.0)?;
/// let outputs: Vec<f64> = [0.0, 10.0, 10.0]
///     .into_iter()
///     .map(|x| rate_limit_filter(x, 0.1, &mut state))
///     .collect::<Result<_, _>>()?;
/// assert!((outputs[1] - 0.1).abs() < 1e-12);
/// assert!((outputs[2] - 0.2).abs() < 1e-12);
/// # Ok::<(), FilterError>(())
/// ```
#[inline]
pub fn rate_limit_filter(
    input: f64,
    dt: f64,
    state: &mut RateLimitState,
) -> Result<f64, FilterError> {
    validate_timestep(dt)?;
    if !state.initialized {
        state.initialized = true;
        state.prev_output = input;
        return Ok(input);
    }
    let max_step = state.max_step(dt);
    let step = (input - state.prev_output).clamp(-max_step, max_step);
    let output = state.prev_output + step;
    state.prev_output = output;
    Ok(output)
}

/// Rate limiter bound to an input and an output variable.
#[derive(Debug)]
pub struct RateLimiter {
    state: RateLimitState,
    binding: Binding,
}

impl RateLimiter {
    /// Follow `input` into `output` at no more than `max_rate` units per second.
    ///
    /// # Errors
    ///
    /// `InvalidParameter`, or a binding error (see [`Binding::new`]).
    pub fn new(
        input: &VariableHandle,
        output: &VariableHandle,
        max_rate: f64,
    ) -> Result<Self, FilterError> {
        let state = RateLimitState::new(max_rate)?;
        let binding = Binding::new(input, output)?;
        debug!(
            input = %input.full_name(),
            output = %output.full_name(),
            max_rate,
            "rate limiter bound"
        );
        Ok(Self { state, binding })
    }

    /// Current state.
    pub fn state(&self) -> &RateLimitState {
        &self.state
    }

    /// Change the limit.
    ///
    /// # Errors
    ///
    /// `InvalidParameter`.
    pub fn set_max_rate(&mut self, max_rate: f64) -> Result<(), FilterError> {
        self.state.max_rate = RateLimitState::new(max_rate)?.max_rate;
        Ok(())
    }

    /// The input variable.
    pub fn input(&self) -> &VariableHandle {
        self.binding.input()
    }
}

impl Filter for RateLimiter {
    fn reset(&mut self) {
        self.state.initialized = false;
        self.state.prev_output = 0.0;
    }

    #[inline]
    fn update(&mut self, dt: f64) -> Result<f64, FilterError> {
        let mut next = self.state;
        let output = rate_limit_filter(self.binding.read(), dt, &mut next)?;
        let stored = self.binding.write(output)?;
        self.state = next;
        Ok(stored)
    }

    fn output(&self) -> &VariableHandle {
        self.binding.output()
    }

    fn kind(&self) -> &'static str {
        "rate_limiter"
    }
}
