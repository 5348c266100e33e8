//! Alpha (exponential smoothing) filter.
//!
//! `y[n] = α·y[n-1] + (1-α)·x[n]`, seeded with `y[0] = x[0]` after a reset.

use rtvars_errors::FilterError;
use rtvars_registry::VariableHandle;
use tracing::debug;

use crate::coefficients::{alpha_from_break_frequency, validate_timestep};
use crate::filter::{Binding, Filter};

/// Where an [`AlphaState`] takes its coefficient from.
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum AlphaSource {
    /// `coefficient` is a break frequency in Hz; α is derived per update from `dt`
    BreakFrequency = 0,
    /// `coefficient` is α itself
    Fixed = 1,
}

/// State for the alpha filter.
///
/// # RT Safety
///
/// - `#[repr(C)]` for stable ABI
/// - No heap allocations
/// - O(1) time complexity
#[repr(C)]
#[derive(Copy, Clone, Debug)]
pub struct AlphaState {
    /// Interpretation of `coefficient`
    pub source: AlphaSource,
    /// Break frequency in Hz, or α
    pub coefficient: f64,
    /// Previous output
    pub prev_output: f64,
    /// False until the first update after a reset
    pub initialized: bool,
}

impl AlphaState {
    /// Smoothing derived from a break frequency in Hz.
    ///
    /// `f64::INFINITY` disables smoothing.
    ///
    /// # Errors
    ///
    /// `InvalidParameter` for a negative or NaN frequency.
    ///
    /// # Example
    ///
    /// ```
    /// use rtvars_filters::AlphaState;
    ///
    /// let state = AlphaState::new(5.0)?;
    /// assert!(state.alpha(0.001) > 0.9);
    /// # Ok::<(), rtvars_filters::FilterError>(())
    /// ```
    pub fn new(break_frequency: f64) -> Result<Self, FilterError> {
        if break_frequency.is_nan() || break_frequency < 0.0 {
            return Err(FilterError::InvalidParameter {
                name: "break_frequency",
                value: break_frequency,
            });
        }
        Ok(Self {
            source: AlphaSource::BreakFrequency,
            coefficient: break_frequency,
            prev_output: 0.0,
            initialized: false,
        })
    }

    /// Fixed smoothing coefficient in `[0, 1]`.
    ///
    /// # Errors
    ///
    /// `InvalidParameter` outside `[0, 1]`.
    pub fn fixed(alpha: f64) -> Result<Self, FilterError> {
        if !(0.0..=1.0).contains(&alpha) {
            return Err(FilterError::InvalidParameter {
                name: "alpha",
                value: alpha,
            });
        }
        Ok(Self {
            source: AlphaSource::Fixed,
            coefficient: alpha,
            prev_output: 0.0,
            initialized: false,
        })
    }

    /// Pass-through: α = 0.
    pub fn passthrough() -> Self {
        Self {
            source: AlphaSource::Fixed,
            coefficient: 0.0,
            prev_output: 0.0,
            initialized: false,
        }
    }

    /// α for timestep `dt`.
    #[inline]
    pub fn alpha(&self, dt: f64) -> f64 {
        match self.source {
            AlphaSource::BreakFrequency => alpha_from_break_frequency(self.coefficient, dt),
            AlphaSource::Fixed => self.coefficient,
        }
    }
}

impl Default for AlphaState {
    fn default() -> Self {
        Self::passthrough()
    }
}

/// One alpha filter step.
///
/// # RT Safety
///
/// - No heap allocations
/// - O(1) time complexity
///
/// # Errors
///
/// `InvalidTimestep` if `dt` is not positive and finite; the state is left
/// untouched.
///
/// # Example
///
/// ```
/// use rtvars_filters::prelude::*;
///
/// let mut state = AlphaState::fixed(0.5)?;
/// assert_eq!(alpha_filter(4.0, 0.01, &mut state)?, 4.0);
/// assert_eq!(alpha_filter(0.0, 0.01, &mut state)?, 2.0);
/// # Ok::<(), FilterError>(())
/// ```
#[inline]
pub fn alpha_filter(input: f64, dt: f64, state: &mut AlphaState) -> Result<f64, FilterError> {
    validate_timestep(dt)?;
    if !state.initialized {
        state.initialized = true;
        state.prev_output = input;
        return Ok(input);
    }
    let alpha = state.alpha(dt);
    let output = alpha * state.prev_output + (1.0 - alpha) * input;
    state.prev_output = output;
    Ok(output)
}

/// Alpha filter bound to an input and an output variable.
#[derive(Debug)]
pub struct AlphaFilter {
    state: AlphaState,
    binding: Binding,
}

impl AlphaFilter {
    /// Smooth `input` into `output` with a break frequency in Hz.
    ///
    /// # Errors
    ///
    /// `InvalidParameter`, or a binding error (see [`Binding::new`]).
    pub fn new(
        input: &VariableHandle,
        output: &VariableHandle,
        break_frequency: f64,
    ) -> Result<Self, FilterError> {
        Self::with_state(input, output, AlphaState::new(break_frequency)?)
    }

    /// Smooth with a fixed α.
    ///
    /// # Errors
    ///
    /// `InvalidParameter`, or a binding error.
    pub fn with_alpha(
        input: &VariableHandle,
        output: &VariableHandle,
        alpha: f64,
    ) -> Result<Self, FilterError> {
        Self::with_state(input, output, AlphaState::fixed(alpha)?)
    }

    fn with_state(
        input: &VariableHandle,
        output: &VariableHandle,
        state: AlphaState,
    ) -> Result<Self, FilterError> {
        let binding = Binding::new(input, output)?;
        debug!(
            input = %input.full_name(),
            output = %output.full_name(),
            coefficient = state.coefficient,
            "alpha filter bound"
        );
        Ok(Self { state, binding })
    }

    /// Current state.
    pub fn state(&self) -> &AlphaState {
        &self.state
    }

    /// Change the break frequency; smoothing continues from the current output.
    ///
    /// # Errors
    ///
    /// `InvalidParameter`.
    pub fn set_break_frequency(&mut self, break_frequency: f64) -> Result<(), FilterError> {
        let next = AlphaState::new(break_frequency)?;
        self.state.source = next.source;
        self.state.coefficient = next.coefficient;
        Ok(())
    }

    /// The input variable.
    pub fn input(&self) -> &VariableHandle {
        self.binding.input()
    }
}

impl Filter for AlphaFilter {
    fn reset(&mut self) {
        self.state.initialized = false;
        self.state.prev_output = 0.0;
    }

    #[inline]
    fn update(&mut self, dt: f64) -> Result<f64, FilterError> {
        let mut next = self.state;
        let output = alpha_filter(self.binding.read(), dt, &mut next)?;
        let stored = self.binding.write(output)?;
        self.state = next;
        Ok(stored)
    }

    fn output(&self) -> &VariableHandle {
        self.binding.output()
    }

    fn kind(&self) -> &'static str {
        "alpha"
    }
}
