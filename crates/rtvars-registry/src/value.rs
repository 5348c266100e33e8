//! Variable kinds, values and bounds.
//!
//! Every value fits in 64 bits, so a variable stores its current value as a
//! single atomic word. [`VariableValue::to_bits`] and [`VariableValue::from_bits`]
//! define that encoding; the history buffer stores the same words.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Bit pattern used for a null enum value.
pub const ENUM_NULL_BITS: u64 = u64::MAX;

/// The fixed set of primitive variable kinds.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum VariableKind {
    /// 64-bit float
    Double,
    /// 32-bit signed integer
    Integer,
    /// 64-bit signed integer
    Long,
    /// Boolean flag
    Boolean,
    /// Ordinal into a fixed list of named constants, optionally null
    Enum,
}

impl VariableKind {
    /// Every kind, in declaration order.
    pub const ALL: [VariableKind; 5] = [
        VariableKind::Double,
        VariableKind::Integer,
        VariableKind::Long,
        VariableKind::Boolean,
        VariableKind::Enum,
    ];

    /// Lowercase name used in errors and schemas.
    pub fn name(self) -> &'static str {
        match self {
            VariableKind::Double => "double",
            VariableKind::Integer => "integer",
            VariableKind::Long => "long",
            VariableKind::Boolean => "boolean",
            VariableKind::Enum => "enum",
        }
    }

    /// Kinds that accept `[min, max]` bounds.
    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            VariableKind::Double | VariableKind::Integer | VariableKind::Long
        )
    }

    /// Zero value of this kind. Enums default to null.
    pub fn zero(self) -> VariableValue {
        match self {
            VariableKind::Double => VariableValue::Double(0.0),
            VariableKind::Integer => VariableValue::Integer(0),
            VariableKind::Long => VariableValue::Long(0),
            VariableKind::Boolean => VariableValue::Boolean(false),
            VariableKind::Enum => VariableValue::Enum(None),
        }
    }
}

impl fmt::Display for VariableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A tagged scalar value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum VariableValue {
    /// 64-bit float
    Double(f64),
    /// 32-bit signed integer
    Integer(i32),
    /// 64-bit signed integer
    Long(i64),
    /// Boolean flag
    Boolean(bool),
    /// Enum ordinal, `None` for null
    Enum(Option<u32>),
}

impl VariableValue {
    /// Kind of this value.
    pub fn kind(&self) -> VariableKind {
        match self {
            VariableValue::Double(_) => VariableKind::Double,
            VariableValue::Integer(_) => VariableKind::Integer,
            VariableValue::Long(_) => VariableKind::Long,
            VariableValue::Boolean(_) => VariableKind::Boolean,
            VariableValue::Enum(_) => VariableKind::Enum,
        }
    }

    /// Encode as a 64-bit word.
    ///
    /// ```
    /// use rtvars_registry::{VariableKind, VariableValue};
    ///
    /// let v = VariableValue::Long(-7);
    /// assert_eq!(VariableValue::from_bits(VariableKind::Long, v.to_bits()), v);
    /// ```
    pub fn to_bits(self) -> u64 {
        match self {
            VariableValue::Double(v) => v.to_bits(),
            VariableValue::Integer(v) => u64::from_ne_bytes(i64::from(v).to_ne_bytes()),
            VariableValue::Long(v) => u64::from_ne_bytes(v.to_ne_bytes()),
            VariableValue::Boolean(v) => u64::from(v),
            VariableValue::Enum(Some(ordinal)) => u64::from(ordinal),
            VariableValue::Enum(None) => ENUM_NULL_BITS,
        }
    }

    /// Decode a word written by [`to_bits`](Self::to_bits) for a value of `kind`.
    pub fn from_bits(kind: VariableKind, bits: u64) -> Self {
        match kind {
            VariableKind::Double => VariableValue::Double(f64::from_bits(bits)),
            VariableKind::Integer => {
                let wide = i64::from_ne_bytes(bits.to_ne_bytes());
                VariableValue::Integer(i32::try_from(wide).unwrap_or_default())
            }
            VariableKind::Long => VariableValue::Long(i64::from_ne_bytes(bits.to_ne_bytes())),
            VariableKind::Boolean => VariableValue::Boolean(bits != 0),
            VariableKind::Enum => VariableValue::Enum(u32::try_from(bits).ok()),
        }
    }

    /// Numeric view used by filters and statistics.
    ///
    /// Booleans map to `0.0`/`1.0`, enums to their ordinal and null enums to NaN.
    #[expect(clippy::cast_precision_loss, reason = "longs are viewed as f64 by numeric consumers")]
    pub fn as_f64(&self) -> f64 {
        match *self {
            VariableValue::Double(v) => v,
            VariableValue::Integer(v) => f64::from(v),
            VariableValue::Long(v) => v as f64,
            VariableValue::Boolean(v) => f64::from(u8::from(v)),
            VariableValue::Enum(Some(ordinal)) => f64::from(ordinal),
            VariableValue::Enum(None) => f64::NAN,
        }
    }
}

impl fmt::Display for VariableValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VariableValue::Double(v) => write!(f, "{v}"),
            VariableValue::Integer(v) => write!(f, "{v}"),
            VariableValue::Long(v) => write!(f, "{v}"),
            VariableValue::Boolean(v) => write!(f, "{v}"),
            VariableValue::Enum(Some(ordinal)) => write!(f, "#{ordinal}"),
            VariableValue::Enum(None) => write!(f, "null"),
        }
    }
}

impl From<f64> for VariableValue {
    fn from(v: f64) -> Self {
        VariableValue::Double(v)
    }
}

impl From<i32> for VariableValue {
    fn from(v: i32) -> Self {
        VariableValue::Integer(v)
    }
}

impl From<i64> for VariableValue {
    fn from(v: i64) -> Self {
        VariableValue::Long(v)
    }
}

impl From<bool> for VariableValue {
    fn from(v: bool) -> Self {
        VariableValue::Boolean(v)
    }
}

/// What a numeric variable does with a value outside its bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundsPolicy {
    /// Silently clamp into range
    #[default]
    Clamp,
    /// Fail the write with an out-of-bounds error
    Reject,
}

impl fmt::Display for BoundsPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoundsPolicy::Clamp => f.write_str("clamp"),
            BoundsPolicy::Reject => f.write_str("reject"),
        }
    }
}

/// Inclusive `[min, max]` range for a numeric variable.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    /// Lower bound
    pub min: f64,
    /// Upper bound
    pub max: f64,
}

impl Bounds {
    /// Create bounds. Validity is checked at registration.
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// `[-limit, limit]`
    pub fn symmetric(limit: f64) -> Self {
        Self::new(-limit.abs(), limit.abs())
    }

    /// Neither bound is NaN and `min <= max`.
    ///
    /// Infinite bounds are valid and leave that side open.
    pub fn is_valid(&self) -> bool {
        !self.min.is_nan() && !self.max.is_nan() && self.min <= self.max
    }

    /// True if `value` lies inside the range. NaN is never inside.
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    /// Clamp into range. NaN is returned unchanged.
    ///
    /// Never panics: with `min > max` the result is `max`, and a NaN bound
    /// leaves that side unclamped.
    pub fn clamp(&self, value: f64) -> f64 {
        if value.is_nan() {
            return value;
        }
        value.max(self.min).min(self.max)
    }

    /// Integral sub-range `ceil(min)..=floor(max)`, `None` if it is empty.
    #[expect(clippy::cast_possible_truncation, reason = "float to int casts saturate at the i64 range")]
    pub fn integral(&self) -> Option<(i64, i64)> {
        if !self.is_valid() {
            return None;
        }
        let lo = self.min.ceil() as i64;
        let hi = self.max.floor() as i64;
        (lo <= hi).then_some((lo, hi))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bits_roundtrip_per_kind() {
        let values = [
            VariableValue::Double(-2.5),
            VariableValue::Integer(i32::MIN),
            VariableValue::Long(i64::MAX),
            VariableValue::Boolean(true),
            VariableValue::Enum(Some(3)),
            VariableValue::Enum(None),
        ];
        for value in values {
            assert_eq!(VariableValue::from_bits(value.kind(), value.to_bits()), value);
        }
    }

    #[test]
    fn test_as_f64() {
        assert!((VariableValue::Boolean(true).as_f64() - 1.0).abs() < f64::EPSILON);
        assert!((VariableValue::Enum(Some(2)).as_f64() - 2.0).abs() < f64::EPSILON);
        assert!(VariableValue::Enum(None).as_f64().is_nan());
    }

    #[test]
    fn test_bounds_validity() {
        assert!(Bounds::new(-1.0, 1.0).is_valid());
        assert!(Bounds::new(1.0, 1.0).is_valid());
        assert!(!Bounds::new(2.0, 1.0).is_valid());
        assert!(!Bounds::new(f64::NAN, 1.0).is_valid());
    }

    #[test]
    fn test_infinite_bounds_are_open_sides() {
        let b = Bounds::new(0.0, f64::INFINITY);
        assert!(b.is_valid());
        assert!(b.contains(1e300));
        assert!((b.clamp(-3.0)).abs() < f64::EPSILON);
        assert!(b.clamp(f64::INFINITY).is_infinite());
    }

    #[test]
    fn test_clamp_is_total_on_invalid_bounds() {
        let inverted = Bounds::new(2.0, 1.0);
        assert!(!inverted.is_valid());
        assert!((inverted.clamp(0.0) - 1.0).abs() < f64::EPSILON);
        assert!((inverted.clamp(5.0) - 1.0).abs() < f64::EPSILON);

        let half_nan = Bounds::new(f64::NAN, 1.0);
        assert!((half_nan.clamp(-7.0) + 7.0).abs() < f64::EPSILON);
        assert!((half_nan.clamp(7.0) - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_bounds_clamp() {
        let b = Bounds::symmetric(core::f64::consts::PI);
        assert!((b.clamp(4.0) - core::f64::consts::PI).abs() < f64::EPSILON);
        assert!(b.clamp(f64::NAN).is_nan());
        assert!(!b.contains(f64::NAN));
    }

    #[test]
    fn test_integral_range() {
        assert_eq!(Bounds::new(-1.5, 2.5).integral(), Some((-1, 2)));
        assert_eq!(Bounds::new(0.2, 0.8).integral(), None);
        assert_eq!(
            Bounds::new(f64::NEG_INFINITY, 0.0).integral(),
            Some((i64::MIN, 0))
        );
    }

    #[test]
    fn test_kind_serde_names() -> Result<(), Box<dyn std::error::Error>> {
        assert_eq!(serde_json::to_string(&VariableKind::Enum)?, "\"enum\"");
        let policy: BoundsPolicy = serde_json::from_str("\"reject\"")?;
        assert_eq!(policy, BoundsPolicy::Reject);
        Ok(())
    }
}
