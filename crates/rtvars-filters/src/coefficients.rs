//! Coefficient helpers shared by the smoothing filters.

use core::f64::consts::PI;

use rtvars_errors::FilterError;

/// Reject a timestep that is not strictly positive and finite.
///
/// # Errors
///
/// [`FilterError::InvalidTimestep`].
#[inline]
pub fn validate_timestep(dt: f64) -> Result<(), FilterError> {
    if dt.is_finite() && dt > 0.0 {
        Ok(())
    } else {
        Err(FilterError::InvalidTimestep { dt })
    }
}

/// Smoothing coefficient for a break frequency in Hz at timestep `dt`.
///
/// Bilinear form `(1 - ωdt/2) / (1 + ωdt/2)` with `ω = 2πf`, clamped to
/// `[0, 1]`. An infinite break frequency gives `0` (no smoothing).
///
/// ```
/// use rtvars_filters::alpha_from_break_frequency;
///
/// assert_eq!(alpha_from_break_frequency(f64::INFINITY, 0.001), 0.0);
/// let alpha = alpha_from_break_frequency(10.0, 0.001);
/// assert!(alpha > 0.9 && alpha < 1.0);
/// ```
#[inline]
pub fn alpha_from_break_frequency(break_frequency: f64, dt: f64) -> f64 {
    if break_frequency.is_infinite() {
        return 0.0;
    }
    let half = PI * break_frequency * dt;
    ((1.0 - half) / (1.0 + half)).clamp(0.0, 1.0)
}

/// Inverse of [`alpha_from_break_frequency`] for `alpha` in `[0, 1]`.
#[inline]
pub fn break_frequency_from_alpha(alpha: f64, dt: f64) -> f64 {
    (1.0 - alpha) / (PI * dt * (1.0 + alpha))
}

/// `RC / (RC + dt)` for an RC stage with the given cutoff in Hz.
#[inline]
pub fn rc_alpha(cutoff: f64, dt: f64) -> f64 {
    let rc = 1.0 / (2.0 * PI * cutoff);
    rc / (rc + dt)
}
