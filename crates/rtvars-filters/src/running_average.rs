//! Cumulative running average.

use rtvars_errors::FilterError;
use rtvars_registry::VariableHandle;
use tracing::debug;

use crate::coefficients::validate_timestep;
use crate::filter::{Binding, Filter};

/// State for the running average.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default)]
pub struct RunningAverageState {
    /// Samples averaged since the last reset
    pub count: u64,
    /// Current mean
    pub average: f64,
}

/// One running-average step: `y += (x - y) / n`.
///
/// # Errors
///
/// `InvalidTimestep` if `dt` is not positive and finite. The timestep does
/// not weight the mean.
#[inline]
pub fn running_average_filter(
    input: f64,
    dt: f64,
    state: &mut RunningAverageState,
) -> Result<f64, FilterError> {
    validate_timestep(dt)?;
    state.count = state.count.saturating_add(1);
    #[expect(clippy::cast_precision_loss, reason = "sample counts stay far below 2^52")]
    let n = state.count as f64;
    state.average += (input - state.average) / n;
    Ok(state.average)
}

/// Running average bound to an input and an output variable.
#[derive(Debug)]
pub struct RunningAverage {
    state: RunningAverageState,
    binding: Binding,
}

impl RunningAverage {
    /// Average `input` into `output`.
    ///
    /// # Errors
    ///
    /// A binding error (see [`Binding::new`]).
    pub fn new(input: &VariableHandle, output: &VariableHandle) -> Result<Self, FilterError> {
        let binding = Binding::new(input, output)?;
        debug!(
            input = %input.full_name(),
            output = %output.full_name(),
            "running average bound"
        );
        Ok(Self {
            state: RunningAverageState::default(),
            binding,
        })
    }

    /// Current state.
    pub fn state(&self) -> &RunningAverageState {
        &self.state
    }
}

impl Filter for RunningAverage {
    fn reset(&mut self) {
        self.state = RunningAverageState::default();
    }

    #[inline]
    fn update(&mut self, dt: f64) -> Result<f64, FilterError> {
        let mut next = self.state;
        let output = running_average_filter(self.binding.read(), dt, &mut next)?;
        let stored = self.binding.write(output)?;
        self.state = next;
        Ok(stored)
    }

    fn output(&self) -> &VariableHandle {
        self.binding.output()
    }

    fn kind(&self) -> &'static str {
        "running_average"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_of_samples() -> Result<(), FilterError> {
        let mut state = RunningAverageState::default();
        let mut y = 0.0;
        for x in [2.0, 4.0, 6.0, 8.0] {
            y = running_average_filter(x, 0.1, &mut state)?;
        }
        assert!((y - 5.0).abs() < 1e-12);
        assert_eq!(state.count, 4);
        Ok(())
    }

    #[test]
    fn test_first_sample_is_mean() -> Result<(), FilterError> {
        let mut state = RunningAverageState::default();
        let y = running_average_filter(-3.0, 0.1, &mut state)?;
        assert!((y + 3.0).abs() < f64::EPSILON);
        Ok(())
    }
}
