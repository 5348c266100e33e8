//! First-order RC low-pass, high-pass and band-pass filter.
//!
//! The band-pass mode is a high-pass at the lower corner feeding a low-pass
//! at the upper corner.

use rtvars_errors::FilterError;
use rtvars_registry::VariableHandle;
use tracing::debug;

use crate::coefficients::{rc_alpha, validate_timestep};
use crate::filter::{Binding, Filter};
use crate::state::FilterState;

/// Pass band of a [`FirstOrderState`].
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FirstOrderMode {
    /// Attenuate above the cutoff
    LowPass = 0,
    /// Attenuate below the cutoff
    HighPass = 1,
    /// Attenuate outside `[low_cutoff, cutoff]`
    BandPass = 2,
}

/// State for the first-order filter.
#[repr(C)]
#[derive(Copy, Clone, Debug)]
pub struct FirstOrderState {
    /// Cutoff frequency in Hz; the upper corner in band-pass mode
    pub cutoff: f64,
    /// Lower corner in Hz, used only in band-pass mode
    pub low_cutoff: f64,
    /// Pass band
    pub mode: FirstOrderMode,
    /// Previous input
    pub prev_input: f64,
    /// Previous high-pass stage output, used only in band-pass mode
    pub prev_high_pass: f64,
    /// Previous output
    pub prev_output: f64,
    /// False until the first update after a reset
    pub initialized: bool,
}

impl FirstOrderState {
    /// Filter with a cutoff in Hz.
    ///
    /// In band-pass mode both corners sit at `cutoff`; use
    /// [`band_pass`](Self::band_pass) for a real band.
    ///
    /// # Errors
    ///
    /// `InvalidParameter` unless the cutoff is positive and finite.
    pub fn new(cutoff: f64, mode: FirstOrderMode) -> Result<Self, FilterError> {
        check_cutoff("cutoff", cutoff)?;
        Ok(Self {
            cutoff,
            low_cutoff: cutoff,
            mode,
            prev_input: 0.0,
            prev_high_pass: 0.0,
            prev_output: 0.0,
            initialized: false,
        })
    }

    /// Low-pass filter.
    ///
    /// # Errors
    ///
    /// See [`new`](Self::new).
    pub fn low_pass(cutoff: f64) -> Result<Self, FilterError> {
        Self::new(cutoff, FirstOrderMode::LowPass)
    }

    /// High-pass filter.
    ///
    /// # Errors
    ///
    /// See [`new`](Self::new).
    pub fn high_pass(cutoff: f64) -> Result<Self, FilterError> {
        Self::new(cutoff, FirstOrderMode::HighPass)
    }

    /// Band-pass filter passing `[min_hz, max_hz]`.
    ///
    /// # Errors
    ///
    /// `InvalidParameter` unless both corners are positive and finite and
    /// `min_hz <= max_hz`.
    ///
    /// # Example
    ///
    /// ```
    /// use rtvars_filters::prelude::*;
    ///
    /// let mut state = FirstOrderState::band_pass(1.0, 20.0)?;
    /// first_order_filter(2.0, 0.001, &mut state)?;
    /// let mut y = 0.0;
    /// for _ in 0..5000 {
    ///     y = first_order_filter(2.0, 0.001, &mut state)?;
    /// }
    /// // A constant input is outside the band.
    /// assert!(y.abs() < 1e-3);
    /// # Ok::<(), FilterError>(())
    /// ```
    pub fn band_pass(min_hz: f64, max_hz: f64) -> Result<Self, FilterError> {
        check_cutoff("min_hz", min_hz)?;
        check_cutoff("max_hz", max_hz)?;
        if min_hz > max_hz {
            return Err(FilterError::InvalidParameter {
                name: "min_hz",
                value: min_hz,
            });
        }
        Ok(Self {
            low_cutoff: min_hz,
            ..Self::new(max_hz, FirstOrderMode::BandPass)?
        })
    }
}

fn check_cutoff(name: &'static str, cutoff: f64) -> Result<(), FilterError> {
    if !cutoff.is_finite() || cutoff <= 0.0 {
        return Err(FilterError::InvalidParameter {
            name,
            value: cutoff,
        });
    }
    Ok(())
}

/// One first-order filter step.
///
/// Low pass: `y = α·y + (1-α)·x`. High pass: `y = α·(y + x - x_prev)`.
/// `α = RC/(RC + dt)`. Band pass runs the high-pass step at `low_cutoff`
/// and low-passes its result at `cutoff`. The first update after a reset
/// outputs the input.
///
/// # Errors
///
/// `InvalidTimestep` if `dt` is not positive and finite.
#[inline]
pub fn first_order_filter(
    input: f64,
    dt: f64,
    state: &mut FirstOrderState,
) -> Result<f64, FilterError> {
    validate_timestep(dt)?;
    if !state.initialized {
        state.initialized = true;
        state.prev_input = input;
        state.prev_high_pass = input;
        state.prev_output = input;
        return Ok(input);
    }
    let alpha = rc_alpha(state.cutoff, dt);
    let output = match state.mode {
        FirstOrderMode::LowPass => alpha * state.prev_output + (1.0 - alpha) * input,
        FirstOrderMode::HighPass => alpha * (state.prev_output + input - state.prev_input),
        FirstOrderMode::BandPass => {
            let high_alpha = rc_alpha(state.low_cutoff, dt);
            let high = high_alpha * (state.prev_high_pass + input - state.prev_input);
            state.prev_high_pass = high;
            alpha * state.prev_output + (1.0 - alpha) * high
        }
    };
    state.prev_input = input;
    state.prev_output = output;
    Ok(output)
}

/// First-order filter bound to an input and an output variable.
#[derive(Debug)]
pub struct FirstOrderFilter {
    state: FirstOrderState,
    binding: Binding,
}

impl FirstOrderFilter {
    /// Filter `input` into `output`.
    ///
    /// # Errors
    ///
    /// `InvalidParameter`, or a binding error (see [`Binding::new`]).
    pub fn new(
        input: &VariableHandle,
        output: &VariableHandle,
        cutoff: f64,
        mode: FirstOrderMode,
    ) -> Result<Self, FilterError> {
        let state = FirstOrderState::new(cutoff, mode)?;
        let binding = Binding::new(input, output)?;
        debug!(
            input = %input.full_name(),
            output = %output.full_name(),
            cutoff,
            ?mode,
            "first-order filter bound"
        );
        Ok(Self { state, binding })
    }

    /// Current state.
    pub fn state(&self) -> &FirstOrderState {
        &self.state
    }
}

impl Filter for FirstOrderFilter {
    fn reset(&mut self) {
        FilterState::reset(&mut self.state);
    }

    #[inline]
    fn update(&mut self, dt: f64) -> Result<f64, FilterError> {
        let mut next = self.state;
        let output = first_order_filter(self.binding.read(), dt, &mut next)?;
        let stored = self.binding.write(output)?;
        self.state = next;
        Ok(stored)
    }

    fn output(&self) -> &VariableHandle {
        self.binding.output()
    }

    fn kind(&self) -> &'static str {
        match self.state.mode {
            FirstOrderMode::LowPass => "low_pass",
            FirstOrderMode::HighPass => "high_pass",
            FirstOrderMode::BandPass => "band_pass",
        }
    }
}
