//! Variable-bound filters and the common `Filter` contract.

use core::fmt;
use std::sync::Arc;

use rtvars_errors::{FilterError, VariableError};
use rtvars_registry::{Variable, VariableHandle, VariableKind, WriterClaim};

use crate::alpha::AlphaFilter;
use crate::backlash::BacklashCompensator;
use crate::first_order::FirstOrderFilter;
use crate::rate_limit::RateLimiter;
use crate::running_average::RunningAverage;

/// A filter bound to live variables.
///
/// `update` reads the bound input, runs one step of the recurrence, writes
/// the result to the bound output and returns the value the output now
/// holds (after its bounds policy).
///
/// # RT Safety
///
/// `update` must not allocate, block or log. `reset` only touches filter
/// state; the bound variables keep their values.
pub trait Filter: fmt::Debug + Send {
    /// Return to the initial, unseeded state.
    fn reset(&mut self);

    /// Run one step with timestep `dt` seconds.
    ///
    /// # Errors
    ///
    /// - [`FilterError::InvalidTimestep`] if `dt` is not positive and finite;
    ///   nothing is read or written
    /// - [`FilterError::Variable`] if the output rejects the value
    ///
    /// On error the filter state is left as it was before the call.
    fn update(&mut self, dt: f64) -> Result<f64, FilterError>;

    /// The output variable.
    fn output(&self) -> &VariableHandle;

    /// Short kind label, e.g. `"alpha"`.
    fn kind(&self) -> &'static str;
}

/// One input variable and the claimed output variable.
///
/// Holding a `Binding` holds the output's writer claim, so two filters can
/// never drive the same output.
#[derive(Debug)]
pub struct Binding {
    input: VariableHandle,
    output: WriterClaim,
}

impl Binding {
    /// Bind `input` to `output`, claiming the output.
    ///
    /// # Errors
    ///
    /// - `KindMismatch` unless `output` is a double
    /// - `WriterConflict` if another filter owns `output`
    pub fn new(input: &VariableHandle, output: &VariableHandle) -> Result<Self, FilterError> {
        if output.kind() != VariableKind::Double {
            return Err(VariableError::KindMismatch {
                expected: VariableKind::Double.name(),
                actual: output.kind().name(),
            }
            .into());
        }
        let output = Variable::claim_writer(output)?;
        Ok(Self {
            input: Arc::clone(input),
            output,
        })
    }

    /// The input variable.
    pub fn input(&self) -> &VariableHandle {
        &self.input
    }

    /// The output variable.
    pub fn output(&self) -> &VariableHandle {
        self.output.variable()
    }

    /// Current input as `f64`.
    #[inline]
    pub fn read(&self) -> f64 {
        self.input.value_as_f64()
    }

    /// Write `value` to the output and return what it stored.
    ///
    /// # Errors
    ///
    /// The output's rejection, if its policy is `Reject`.
    #[inline]
    pub fn write(&self, value: f64) -> Result<f64, FilterError> {
        let output = self.output.variable();
        output.set_double(value)?;
        Ok(output.value_as_f64())
    }
}

/// Any built-in filter.
#[derive(Debug)]
pub enum AnyFilter {
    /// Exponential smoothing
    Alpha(AlphaFilter),
    /// Rate-of-change limit
    RateLimiter(RateLimiter),
    /// Dead-band around reversals
    Backlash(BacklashCompensator),
    /// RC low/high pass
    FirstOrder(FirstOrderFilter),
    /// Cumulative mean
    RunningAverage(RunningAverage),
}

impl AnyFilter {
    fn inner(&self) -> &dyn Filter {
        match self {
            AnyFilter::Alpha(f) => f,
            AnyFilter::RateLimiter(f) => f,
            AnyFilter::Backlash(f) => f,
            AnyFilter::FirstOrder(f) => f,
            AnyFilter::RunningAverage(f) => f,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn Filter {
        match self {
            AnyFilter::Alpha(f) => f,
            AnyFilter::RateLimiter(f) => f,
            AnyFilter::Backlash(f) => f,
            AnyFilter::FirstOrder(f) => f,
            AnyFilter::RunningAverage(f) => f,
        }
    }
}

impl Filter for AnyFilter {
    fn reset(&mut self) {
        self.inner_mut().reset();
    }

    #[inline]
    fn update(&mut self, dt: f64) -> Result<f64, FilterError> {
        self.inner_mut().update(dt)
    }

    fn output(&self) -> &VariableHandle {
        self.inner().output()
    }

    fn kind(&self) -> &'static str {
        self.inner().kind()
    }
}

impl From<AlphaFilter> for AnyFilter {
    fn from(f: AlphaFilter) -> Self {
        AnyFilter::Alpha(f)
    }
}

impl From<RateLimiter> for AnyFilter {
    fn from(f: RateLimiter) -> Self {
        AnyFilter::RateLimiter(f)
    }
}

impl From<BacklashCompensator> for AnyFilter {
    fn from(f: BacklashCompensator) -> Self {
        AnyFilter::Backlash(f)
    }
}

impl From<FirstOrderFilter> for AnyFilter {
    fn from(f: FirstOrderFilter) -> Self {
        AnyFilter::FirstOrder(f)
    }
}

impl From<RunningAverage> for AnyFilter {
    fn from(f: RunningAverage) -> Self {
        AnyFilter::RunningAverage(f)
    }
}

/// Filters updated in insertion order once per tick.
///
/// A filter may read another filter's output; put the producer first.
#[derive(Debug, Default)]
pub struct FilterChain {
    filters: Vec<AnyFilter>,
}

impl FilterChain {
    /// Empty chain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a filter.
    pub fn push(&mut self, filter: impl Into<AnyFilter>) {
        self.filters.push(filter.into());
    }

    /// Builder form of [`push`](Self::push).
    #[must_use]
    pub fn with(mut self, filter: impl Into<AnyFilter>) -> Self {
        self.push(filter);
        self
    }

    /// Update every filter in order.
    ///
    /// # Errors
    ///
    /// The first filter error; later filters are not updated this tick.
    #[inline]
    pub fn update(&mut self, dt: f64) -> Result<(), FilterError> {
        for filter in &mut self.filters {
            filter.update(dt)?;
        }
        Ok(())
    }

    /// Reset every filter.
    pub fn reset(&mut self) {
        for filter in &mut self.filters {
            filter.reset();
        }
    }

    /// Filters in update order.
    pub fn filters(&self) -> &[AnyFilter] {
        &self.filters
    }

    /// Number of filters.
    pub fn len(&self) -> usize {
        self.filters.len()
    }

    /// True if the chain is empty.
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}
