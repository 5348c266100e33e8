//! Backlash compensator
//!
//! Holds the output while the input wanders inside a dead-band around the
//! last direction reversal. Once the input leaves the band in the new
//! direction, or returns past the reversal point, the output tracks the
//! input again.

use rtvars_errors::FilterError;
use rtvars_registry::VariableHandle;
use tracing::debug;

use crate::coefficients::validate_timestep;
use crate::filter::{Binding, Filter};

/// State for the backlash compensator.
///
/// # RT Safety
///
/// - `#[repr(C)]` for stable ABI
/// - No heap allocations
/// - O(1) time complexity
#[repr(C)]
#[derive(Copy, Clone, Debug)]
pub struct BacklashState {
    /// Half-width of the hold zone, in input units
    pub dead_band: f64,
    /// Last output
    pub output: f64,
    /// Last input
    pub last_input: f64,
    /// Input value at the last reversal
    pub reversal: f64,
    /// Direction of travel: `1`, `-1`, or `0` before any movement
    pub direction: i8,
    /// True while the output is held
    pub holding: bool,
    /// False until the first update after a reset
    pub initialized: bool,
}

impl BacklashState {
    /// Compensator with the given dead-band.
    ///
    /// # Errors
    ///
    /// `InvalidParameter` for a negative or non-finite dead-band.
    pub fn new(dead_band: f64) -> Result<Self, FilterError> {
        if !dead_band.is_finite() || dead_band < 0.0 {
            return Err(FilterError::InvalidParameter {
                name: "dead_band",
                value: dead_band,
            });
        }
        Ok(Self {
            dead_band,
            ..Self::default()
        })
    }
}

impl Default for BacklashState {
    fn default() -> Self {
        Self {
            dead_band: 0.0,
            output: 0.0,
            last_input: 0.0,
            reversal: 0.0,
            direction: 0,
            holding: false,
            initialized: false,
        }
    }
}

#[inline]
fn direction_of(delta: f64) -> i8 {
    if delta > 0.0 {
        1
    } else if delta < 0.0 {
        -1
    } else {
        0
    }
}

/// One backlash compensator step.
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
/// let mut state = BacklashState::new(0.5)?;
/// for x in [0.0, 1.0, 2.0] {
///     backlash_filter(x, 0.01, &mut state)?;
/// }
/// // Reversal at 2.0: small moves back are absorbed.
/// assert_eq!(backlash_filter(1.7, 0.01, &mut state)?, 2.0);
/// // Leaving the band resumes tracking.
/// assert_eq!(backlash_filter(1.0, 0.01, &mut state)?, 1.0);
/// # Ok::<(), FilterError>(())
/// ```
#[inline]
pub fn backlash_filter(
    input: f64,
    dt: f64,
    state: &mut BacklashState,
) -> Result<f64, FilterError> {
    validate_timestep(dt)?;
    if !state.initialized {
        state.initialized = true;
        state.output = input;
        state.last_input = input;
        state.reversal = input;
        state.direction = 0;
        state.holding = false;
        return Ok(input);
    }

    let step = direction_of(input - state.last_input);
    let previous = state.last_input;
    state.last_input = input;

    if !state.holding {
        if step != 0 && state.direction != 0 && step != state.direction {
            state.reversal = previous;
            state.holding = true;
        }
        if step != 0 {
            state.direction = step;
        }
    }

    if state.holding {
        let travel = (input - state.reversal) * f64::from(state.direction);
        if travel > state.dead_band {
            state.holding = false;
        } else if travel < 0.0 {
            state.holding = false;
            state.direction = -state.direction;
        } else {
            return Ok(state.output);
        }
    }
    state.output = input;
    Ok(input)
}

/// Backlash compensator bound to an input and an output variable.
#[derive(Debug)]
pub struct BacklashCompensator {
    state: BacklashState,
    binding: Binding,
}

impl BacklashCompensator {
    /// Compensate `input` into `output` with a dead-band in input units.
    ///
    /// # Errors
    ///
    /// `InvalidParameter`, or a binding error (see [`Binding::new`]).
    pub fn new(
        input: &VariableHandle,
        output: &VariableHandle,
        dead_band: f64,
    ) -> Result<Self, FilterError> {
        let state = BacklashState::new(dead_band)?;
        let binding = Binding::new(input, output)?;
        debug!(
            input = %input.full_name(),
            output = %output.full_name(),
            dead_band,
            "backlash compensator bound"
        );
        Ok(Self { state, binding })
    }

    /// Current state.
    pub fn state(&self) -> &BacklashState {
        &self.state
    }

    /// The input variable.
    pub fn input(&self) -> &VariableHandle {
        self.binding.input()
    }
}

impl Filter for BacklashCompensator {
    fn reset(&mut self) {
        self.state = BacklashState {
            dead_band: self.state.dead_band,
            ..BacklashState::default()
        };
    }

    #[inline]
    fn update(&mut self, dt: f64) -> Result<f64, FilterError> {
        let mut next = self.state;
        let output = backlash_filter(self.binding.read(), dt, &mut next)?;
        let stored = self.binding.write(output)?;
        self.state = next;
        Ok(stored)
    }

    fn output(&self) -> &VariableHandle {
        self.binding.output()
    }

    fn kind(&self) -> &'static str {
        "backlash"
    }
}
