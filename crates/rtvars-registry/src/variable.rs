//! Typed real-time variables.
//!
//! A [`Variable`] holds one scalar in an atomic 64-bit word. The control loop
//! writes it through [`Variable::set`]; any thread may read it with
//! [`Variable::get`] at any time.
//!
//! # RT Safety
//!
//! - `get` is a single atomic load
//! - `set` validates, stores, then runs listeners; with no listeners it takes no lock
//! - listener management takes a lock and is meant for setup code

use core::cell::RefCell;
use core::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};

use parking_lot::ReentrantMutex;
use rtvars_errors::{RegistryError, VariableError};

use crate::listener::{ListenerHandle, ListenerTable};
use crate::name::{Namespace, validate_name};
use crate::value::{Bounds, BoundsPolicy, VariableKind, VariableValue};

/// Shared handle to a registered variable.
pub type VariableHandle = Arc<Variable>;

static NEXT_VARIABLE_ID: AtomicU64 = AtomicU64::new(1);

/// Everything needed to register a variable.
///
/// # Example
///
/// ```
/// use rtvars_registry::prelude::*;
///
/// let spec = VariableSpec::double("position")
///     .with_bounds(-3.2, 3.2)
///     .with_policy(BoundsPolicy::Reject)
///     .with_description("joint angle in radians");
/// assert_eq!(spec.kind(), VariableKind::Double);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct VariableSpec {
    name: String,
    kind: VariableKind,
    bounds: Option<Bounds>,
    policy: Option<BoundsPolicy>,
    description: String,
    enum_constants: Vec<String>,
    allow_null: bool,
    initial: Option<VariableValue>,
}

impl VariableSpec {
    /// Spec for a variable of any kind.
    pub fn new(name: impl Into<String>, kind: VariableKind) -> Self {
        Self {
            name: name.into(),
            kind,
            bounds: None,
            policy: None,
            description: String::new(),
            enum_constants: Vec::new(),
            allow_null: false,
            initial: None,
        }
    }

    /// Double variable.
    pub fn double(name: impl Into<String>) -> Self {
        Self::new(name, VariableKind::Double)
    }

    /// 32-bit integer variable.
    pub fn integer(name: impl Into<String>) -> Self {
        Self::new(name, VariableKind::Integer)
    }

    /// 64-bit integer variable.
    pub fn long(name: impl Into<String>) -> Self {
        Self::new(name, VariableKind::Long)
    }

    /// Boolean variable.
    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, VariableKind::Boolean)
    }

    /// Enum variable over the given constant names.
    pub fn enumeration<I, S>(name: impl Into<String>, constants: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut spec = Self::new(name, VariableKind::Enum);
        spec.enum_constants = constants.into_iter().map(Into::into).collect();
        spec
    }

    /// Set `[min, max]` bounds. Only numeric kinds accept bounds.
    pub fn with_bounds(mut self, min: f64, max: f64) -> Self {
        self.bounds = Some(Bounds::new(min, max));
        self
    }

    /// Set optional bounds.
    pub fn with_optional_bounds(mut self, bounds: Option<Bounds>) -> Self {
        self.bounds = bounds;
        self
    }

    /// Override the registry's default bounds policy.
    pub fn with_policy(mut self, policy: BoundsPolicy) -> Self {
        self.policy = Some(policy);
        self
    }

    /// Attach a free-text description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Allow a null enum value.
    pub fn allow_null(mut self, allow: bool) -> Self {
        self.allow_null = allow;
        self
    }

    /// Initial value instead of the kind's zero.
    pub fn with_initial(mut self, value: impl Into<VariableValue>) -> Self {
        self.initial = Some(value.into());
        self
    }

    /// Name of the variable.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Kind of the variable.
    pub fn kind(&self) -> VariableKind {
        self.kind
    }
}

/// A named, typed scalar with change notification.
pub struct Variable {
    id: u64,
    name: String,
    namespace: Namespace,
    kind: VariableKind,
    bounds: Option<Bounds>,
    int_range: Option<(i64, i64)>,
    policy: BoundsPolicy,
    description: String,
    enum_constants: Box<[String]>,
    enum_count: u32,
    allow_null: bool,
    bits: AtomicU64,
    detached: AtomicBool,
    writer_claimed: AtomicBool,
    listener_count: AtomicUsize,
    listeners: ReentrantMutex<RefCell<ListenerTable>>,
}

impl Variable {
    pub(crate) fn from_spec(
        spec: VariableSpec,
        namespace: Namespace,
        default_policy: BoundsPolicy,
    ) -> Result<Self, RegistryError> {
        validate_name(&spec.name)?;
        let invalid = |reason: &'static str| RegistryError::InvalidDefinition {
            name: spec.name.clone(),
            reason,
        };

        let mut int_range = None;
        if let Some(bounds) = spec.bounds {
            if !spec.kind.is_numeric() {
                return Err(invalid("bounds only apply to numeric kinds"));
            }
            let bad_bounds = || RegistryError::InvalidBounds {
                name: spec.name.clone(),
                min: bounds.min,
                max: bounds.max,
            };
            if !bounds.is_valid() {
                return Err(bad_bounds());
            }
            int_range = match spec.kind {
                VariableKind::Integer => {
                    let (lo, hi) = bounds.integral().ok_or_else(bad_bounds)?;
                    let lo = lo.max(i64::from(i32::MIN));
                    let hi = hi.min(i64::from(i32::MAX));
                    if lo > hi {
                        return Err(bad_bounds());
                    }
                    Some((lo, hi))
                }
                VariableKind::Long => Some(bounds.integral().ok_or_else(bad_bounds)?),
                _ => None,
            };
        }

        if spec.kind != VariableKind::Enum && !spec.enum_constants.is_empty() {
            return Err(invalid("only enum variables take constants"));
        }
        let enum_count = u32::try_from(spec.enum_constants.len())
            .map_err(|_overflow| invalid("too many enum constants"))?;
        if spec.kind == VariableKind::Enum && enum_count == 0 && !spec.allow_null {
            return Err(invalid("enum without constants must allow null"));
        }

        let mut variable = Self {
            id: NEXT_VARIABLE_ID.fetch_add(1, Ordering::Relaxed),
            name: spec.name.clone(),
            namespace,
            kind: spec.kind,
            bounds: spec.bounds,
            int_range,
            policy: spec.policy.unwrap_or(default_policy),
            description: spec.description.clone(),
            enum_constants: spec.enum_constants.clone().into_boxed_slice(),
            enum_count,
            allow_null: spec.allow_null,
            bits: AtomicU64::new(0),
            detached: AtomicBool::new(false),
            writer_claimed: AtomicBool::new(false),
            listener_count: AtomicUsize::new(0),
            listeners: ReentrantMutex::new(RefCell::new(ListenerTable::default())),
        };

        let initial = match spec.initial {
            Some(value) => variable
                .admit(value)
                .map_err(|_rejected| invalid("initial value is not admissible"))?,
            None => variable.default_value(),
        };
        *variable.bits.get_mut() = initial.to_bits();
        Ok(variable)
    }

    /// Zero of the kind, pulled into bounds. Non-null enums start at ordinal 0.
    fn default_value(&self) -> VariableValue {
        match self.kind {
            VariableKind::Double => {
                VariableValue::Double(self.bounds.map_or(0.0, |b| b.clamp(0.0)))
            }
            VariableKind::Integer => {
                let v = self.int_range.map_or(0, |(lo, hi)| 0_i64.clamp(lo, hi));
                VariableValue::Integer(i32::try_from(v).unwrap_or_default())
            }
            VariableKind::Long => {
                VariableValue::Long(self.int_range.map_or(0, |(lo, hi)| 0_i64.clamp(lo, hi)))
            }
            VariableKind::Enum if !self.allow_null => VariableValue::Enum(Some(0)),
            kind => kind.zero(),
        }
    }

    /// Process-unique id.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Short name, unique within the owning registry.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Namespace of the owning registry.
    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    /// `namespace.name`
    pub fn full_name(&self) -> String {
        self.namespace.qualify(&self.name)
    }

    /// Kind, fixed at creation.
    pub fn kind(&self) -> VariableKind {
        self.kind
    }

    /// Bounds for numeric kinds.
    pub fn bounds(&self) -> Option<Bounds> {
        self.bounds
    }

    /// What happens to out-of-bounds writes.
    pub fn policy(&self) -> BoundsPolicy {
        self.policy
    }

    /// Free-text description.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Constant names of an enum variable.
    pub fn enum_constants(&self) -> &[String] {
        &self.enum_constants
    }

    /// Whether an enum variable accepts null.
    pub fn allow_null(&self) -> bool {
        self.allow_null
    }

    /// Name of the current enum constant, `None` for null or non-enum kinds.
    pub fn enum_constant_name(&self) -> Option<&str> {
        match self.get() {
            VariableValue::Enum(Some(ordinal)) => usize::try_from(ordinal)
                .ok()
                .and_then(|i| self.enum_constants.get(i))
                .map(String::as_str),
            _ => None,
        }
    }

    /// True once the owning registry has been dropped.
    pub fn is_detached(&self) -> bool {
        self.detached.load(Ordering::Acquire)
    }

    pub(crate) fn detach(&self) {
        self.detached.store(true, Ordering::Release);
    }

    /// Current value. Never blocks.
    #[inline]
    pub fn get(&self) -> VariableValue {
        VariableValue::from_bits(self.kind, self.raw_bits())
    }

    /// Current value as its raw 64-bit encoding.
    #[inline]
    pub fn raw_bits(&self) -> u64 {
        self.bits.load(Ordering::Acquire)
    }

    /// Current value through [`VariableValue::as_f64`].
    #[inline]
    pub fn value_as_f64(&self) -> f64 {
        self.get().as_f64()
    }

    /// Current value if this is a double variable.
    pub fn get_double(&self) -> Option<f64> {
        match self.get() {
            VariableValue::Double(v) => Some(v),
            _ => None,
        }
    }

    /// Current value if this is an integer variable.
    pub fn get_integer(&self) -> Option<i32> {
        match self.get() {
            VariableValue::Integer(v) => Some(v),
            _ => None,
        }
    }

    /// Current value if this is a long variable.
    pub fn get_long(&self) -> Option<i64> {
        match self.get() {
            VariableValue::Long(v) => Some(v),
            _ => None,
        }
    }

    /// Current value if this is a boolean variable.
    pub fn get_boolean(&self) -> Option<bool> {
        match self.get() {
            VariableValue::Boolean(v) => Some(v),
            _ => None,
        }
    }

    /// Current ordinal if this is an enum variable (`Some(None)` for null).
    pub fn get_enum(&self) -> Option<Option<u32>> {
        match self.get() {
            VariableValue::Enum(v) => Some(v),
            _ => None,
        }
    }

    /// Write a new value and notify listeners.
    ///
    /// Numeric values outside the bounds are clamped or rejected according to
    /// the policy. On success every listener runs synchronously, in
    /// registration order, on the calling thread. Returns whether the stored
    /// value changed.
    ///
    /// # Errors
    ///
    /// - [`VariableError::KindMismatch`] if `value` has another kind
    /// - [`VariableError::OutOfBounds`] under [`BoundsPolicy::Reject`]
    /// - [`VariableError::InvalidEnumOrdinal`] for ordinals past the constants
    ///
    /// On error the stored value is unchanged and no listener runs.
    #[inline]
    pub fn set(&self, value: impl Into<VariableValue>) -> Result<bool, VariableError> {
        let admitted = self.admit(value.into())?;
        let bits = admitted.to_bits();
        let previous = self.bits.swap(bits, Ordering::AcqRel);
        self.notify();
        Ok(previous != bits)
    }

    /// Write a double.
    #[inline]
    pub fn set_double(&self, value: f64) -> Result<bool, VariableError> {
        self.set(VariableValue::Double(value))
    }

    /// Write a 32-bit integer.
    #[inline]
    pub fn set_integer(&self, value: i32) -> Result<bool, VariableError> {
        self.set(VariableValue::Integer(value))
    }

    /// Write a 64-bit integer.
    #[inline]
    pub fn set_long(&self, value: i64) -> Result<bool, VariableError> {
        self.set(VariableValue::Long(value))
    }

    /// Write a boolean.
    #[inline]
    pub fn set_boolean(&self, value: bool) -> Result<bool, VariableError> {
        self.set(VariableValue::Boolean(value))
    }

    /// Write an enum ordinal, `None` for null.
    #[inline]
    pub fn set_enum(&self, ordinal: Option<u32>) -> Result<bool, VariableError> {
        self.set(VariableValue::Enum(ordinal))
    }

    fn admit(&self, value: VariableValue) -> Result<VariableValue, VariableError> {
        if value.kind() != self.kind {
            return Err(VariableError::KindMismatch {
                expected: self.kind.name(),
                actual: value.kind().name(),
            });
        }
        match value {
            VariableValue::Double(v) => self.admit_double(v).map(VariableValue::Double),
            VariableValue::Integer(v) => self
                .admit_integral(i64::from(v))
                .map(|w| VariableValue::Integer(i32::try_from(w).unwrap_or(v))),
            VariableValue::Long(v) => self.admit_integral(v).map(VariableValue::Long),
            VariableValue::Boolean(_) => Ok(value),
            VariableValue::Enum(ordinal) => self.admit_enum(ordinal).map(|()| value),
        }
    }

    fn admit_double(&self, value: f64) -> Result<f64, VariableError> {
        let Some(bounds) = self.bounds else {
            return Ok(value);
        };
        if bounds.contains(value) {
            return Ok(value);
        }
        match self.policy {
            BoundsPolicy::Clamp => Ok(bounds.clamp(value)),
            BoundsPolicy::Reject => Err(VariableError::OutOfBounds {
                value,
                min: bounds.min,
                max: bounds.max,
            }),
        }
    }

    #[expect(clippy::cast_precision_loss, reason = "bounds are reported as f64")]
    fn admit_integral(&self, value: i64) -> Result<i64, VariableError> {
        let Some((lo, hi)) = self.int_range else {
            return Ok(value);
        };
        if (lo..=hi).contains(&value) {
            return Ok(value);
        }
        match self.policy {
            BoundsPolicy::Clamp => Ok(value.clamp(lo, hi)),
            BoundsPolicy::Reject => Err(VariableError::OutOfBounds {
                value: value as f64,
                min: lo as f64,
                max: hi as f64,
            }),
        }
    }

    fn admit_enum(&self, ordinal: Option<u32>) -> Result<(), VariableError> {
        let legal = match ordinal {
            None => self.allow_null,
            Some(o) => o < self.enum_count,
        };
        if legal {
            Ok(())
        } else {
            Err(VariableError::InvalidEnumOrdinal {
                ordinal: ordinal.map_or(-1, i64::from),
                constants: self.enum_count,
                allow_null: self.allow_null,
            })
        }
    }

    fn notify(&self) {
        if self.listener_count.load(Ordering::Acquire) == 0 {
            return;
        }
        let guard = self.listeners.lock();
        // A listener may write this variable again; the shared borrow nests.
        let Ok(table) = guard.try_borrow() else {
            return;
        };
        for listener in table.iter() {
            listener(self);
        }
    }

    /// Register a change listener.
    ///
    /// # Errors
    ///
    /// [`VariableError::Reentrancy`] when called from inside a notification of
    /// this same variable.
    pub fn add_listener<F>(&self, listener: F) -> Result<ListenerHandle, VariableError>
    where
        F: Fn(&Variable) + Send + Sync + 'static,
    {
        let guard = self.listeners.lock();
        let Ok(mut table) = guard.try_borrow_mut() else {
            return Err(VariableError::Reentrancy);
        };
        let key = table.insert(Box::new(listener));
        self.listener_count.store(table.live(), Ordering::Release);
        Ok(ListenerHandle {
            owner: self.id,
            key,
        })
    }

    /// Remove a listener by handle.
    ///
    /// # Errors
    ///
    /// - [`VariableError::Reentrancy`] when called from inside a notification of this variable
    /// - [`VariableError::ListenerNotFound`] for a foreign or already removed handle
    pub fn remove_listener(&self, handle: ListenerHandle) -> Result<(), VariableError> {
        let guard = self.listeners.lock();
        let Ok(mut table) = guard.try_borrow_mut() else {
            return Err(VariableError::Reentrancy);
        };
        if handle.owner != self.id || !table.remove(handle.key) {
            return Err(VariableError::ListenerNotFound);
        }
        self.listener_count.store(table.live(), Ordering::Release);
        Ok(())
    }

    /// Number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.listener_count.load(Ordering::Acquire)
    }

    /// Claim exclusive writer rights, released when the claim is dropped.
    ///
    /// # Errors
    ///
    /// [`VariableError::WriterConflict`] if another claim is alive.
    pub fn claim_writer(variable: &VariableHandle) -> Result<WriterClaim, VariableError> {
        variable
            .writer_claimed
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_held| VariableError::WriterConflict)?;
        Ok(WriterClaim {
            variable: Arc::clone(variable),
        })
    }

    /// True while a [`WriterClaim`] is alive.
    pub fn has_exclusive_writer(&self) -> bool {
        self.writer_claimed.load(Ordering::Acquire)
    }
}

impl fmt::Debug for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Variable")
            .field("id", &self.id)
            .field("full_name", &self.full_name())
            .field("kind", &self.kind)
            .field("value", &self.get())
            .field("bounds", &self.bounds)
            .field("policy", &self.policy)
            .field("detached", &self.is_detached())
            .finish_non_exhaustive()
    }
}

/// Exclusive writer rights on a variable.
#[derive(Debug)]
pub struct WriterClaim {
    variable: VariableHandle,
}

impl WriterClaim {
    /// The claimed variable.
    pub fn variable(&self) -> &VariableHandle {
        &self.variable
    }
}

impl Drop for WriterClaim {
    fn drop(&mut self) {
        self.variable.writer_claimed.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    fn make(spec: VariableSpec) -> Result<Arc<Variable>, RegistryError> {
        Variable::from_spec(spec, Namespace::parse("root")?, BoundsPolicy::Clamp).map(Arc::new)
    }

    #[test]
    fn test_clamp_policy_clamps_silently() -> TestResult {
        let v = make(VariableSpec::double("position").with_bounds(-1.0, 1.0))?;
        v.set_double(4.0)?;
        assert_eq!(v.get(), VariableValue::Double(1.0));
        Ok(())
    }

    #[test]
    fn test_reject_policy_keeps_old_value() -> TestResult {
        let v = make(
            VariableSpec::double("position")
                .with_bounds(-1.0, 1.0)
                .with_policy(BoundsPolicy::Reject),
        )?;
        v.set_double(0.5)?;
        assert!(matches!(
            v.set_double(4.0),
            Err(VariableError::OutOfBounds { .. })
        ));
        assert_eq!(v.get(), VariableValue::Double(0.5));
        Ok(())
    }

    #[test]
    fn test_half_open_bounds() -> TestResult {
        let v = make(
            VariableSpec::double("stiffness")
                .with_bounds(0.0, f64::INFINITY)
                .with_policy(BoundsPolicy::Reject),
        )?;
        v.set_double(1e12)?;
        assert!(matches!(
            v.set_double(-1.0),
            Err(VariableError::OutOfBounds { .. })
        ));
        assert!(make(VariableSpec::double("bad").with_bounds(f64::NAN, 1.0)).is_err());
        Ok(())
    }

    #[test]
    fn test_nan_under_each_policy() -> TestResult {
        let clamp = make(VariableSpec::double("a").with_bounds(0.0, 1.0))?;
        clamp.set_double(f64::NAN)?;
        assert!(clamp.value_as_f64().is_nan());

        let reject = make(
            VariableSpec::double("b")
                .with_bounds(0.0, 1.0)
                .with_policy(BoundsPolicy::Reject),
        )?;
        assert!(reject.set_double(f64::NAN).is_err());
        Ok(())
    }

    #[test]
    fn test_kind_mismatch() -> TestResult {
        let v = make(VariableSpec::integer("count"))?;
        assert_eq!(
            v.set_double(1.0),
            Err(VariableError::KindMismatch {
                expected: "integer",
                actual: "double"
            })
        );
        Ok(())
    }

    #[test]
    fn test_integer_bounds_use_integral_range() -> TestResult {
        let v = make(VariableSpec::integer("gear").with_bounds(-1.5, 6.7))?;
        v.set_integer(9)?;
        assert_eq!(v.get_integer(), Some(6));
        v.set_integer(-4)?;
        assert_eq!(v.get_integer(), Some(-1));
        Ok(())
    }

    #[test]
    fn test_default_value_pulled_into_bounds() -> TestResult {
        let v = make(VariableSpec::double("height").with_bounds(1.0, 2.0))?;
        assert_eq!(v.get_double(), Some(1.0));
        Ok(())
    }

    #[test]
    fn test_enum_ordinals_and_null() -> TestResult {
        let v = make(VariableSpec::enumeration("mode", ["idle", "walk", "run"]))?;
        assert_eq!(v.get_enum(), Some(Some(0)));
        v.set_enum(Some(2))?;
        assert_eq!(v.enum_constant_name(), Some("run"));
        assert!(v.set_enum(Some(3)).is_err());
        assert!(v.set_enum(None).is_err());

        let nullable = make(VariableSpec::enumeration("phase", ["a"]).allow_null(true))?;
        assert_eq!(nullable.get_enum(), Some(None));
        assert!(nullable.value_as_f64().is_nan());
        Ok(())
    }

    #[test]
    fn test_spec_validation() {
        assert!(make(VariableSpec::boolean("flag").with_bounds(0.0, 1.0)).is_err());
        assert!(make(VariableSpec::double("x").with_bounds(2.0, 1.0)).is_err());
        assert!(make(VariableSpec::integer("x").with_bounds(0.2, 0.8)).is_err());
        assert!(make(VariableSpec::enumeration("e", Vec::<String>::new())).is_err());
        assert!(make(VariableSpec::double("bad name")).is_err());
        assert!(
            make(
                VariableSpec::double("x")
                    .with_bounds(0.0, 1.0)
                    .with_policy(BoundsPolicy::Reject)
                    .with_initial(5.0)
            )
            .is_err()
        );
    }

    #[test]
    fn test_set_reports_change() -> TestResult {
        let v = make(VariableSpec::long("ticks"))?;
        assert!(v.set_long(3)?);
        assert!(!v.set_long(3)?);
        Ok(())
    }

    #[test]
    fn test_listeners_run_in_registration_order() -> TestResult {
        let v = make(VariableSpec::double("x"))?;
        let log = Arc::new(parking_lot::Mutex::new(Vec::new()));
        for tag in 0..3 {
            let log = Arc::clone(&log);
            v.add_listener(move |_| log.lock().push(tag))?;
        }
        v.set_double(1.0)?;
        assert_eq!(*log.lock(), vec![0, 1, 2]);
        Ok(())
    }

    #[test]
    fn test_listener_not_called_on_rejected_write() -> TestResult {
        let v = make(
            VariableSpec::double("x")
                .with_bounds(0.0, 1.0)
                .with_policy(BoundsPolicy::Reject),
        )?;
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        v.add_listener(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        })?;
        assert!(v.set_double(2.0).is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        Ok(())
    }

    #[test]
    fn test_remove_listener() -> TestResult {
        let v = make(VariableSpec::double("x"))?;
        let other = make(VariableSpec::double("y"))?;
        let handle = v.add_listener(|_| {})?;
        assert_eq!(
            other.remove_listener(handle),
            Err(VariableError::ListenerNotFound)
        );
        v.remove_listener(handle)?;
        assert_eq!(v.listener_count(), 0);
        assert_eq!(
            v.remove_listener(handle),
            Err(VariableError::ListenerNotFound)
        );
        Ok(())
    }

    #[test]
    fn test_listener_cannot_restructure_during_notification() -> TestResult {
        let v = make(VariableSpec::double("x"))?;
        let outcome = Arc::new(parking_lot::Mutex::new(None));
        let seen = Arc::clone(&outcome);
        v.add_listener(move |var| {
            *seen.lock() = Some(var.add_listener(|_| {}).map(|_| ()));
        })?;
        v.set_double(1.0)?;
        assert_eq!(*outcome.lock(), Some(Err(VariableError::Reentrancy)));
        assert_eq!(v.listener_count(), 1);
        Ok(())
    }

    #[test]
    fn test_listener_cannot_remove_itself() -> TestResult {
        let v = make(VariableSpec::double("x"))?;
        let own = Arc::new(parking_lot::Mutex::new(None::<ListenerHandle>));
        let outcome = Arc::new(parking_lot::Mutex::new(None));
        let (handle_slot, seen) = (Arc::clone(&own), Arc::clone(&outcome));
        let handle = v.add_listener(move |var| {
            if let Some(handle) = *handle_slot.lock() {
                *seen.lock() = Some(var.remove_listener(handle));
            }
        })?;
        *own.lock() = Some(handle);

        v.set_double(1.0)?;
        assert_eq!(*outcome.lock(), Some(Err(VariableError::Reentrancy)));
        assert_eq!(v.listener_count(), 1);

        // Outside the notification the same handle still works.
        v.remove_listener(handle)?;
        assert_eq!(v.listener_count(), 0);
        Ok(())
    }

    #[test]
    fn test_listener_churn_reuses_slots() -> TestResult {
        let v = make(VariableSpec::double("x"))?;
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let kept = v.add_listener(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        })?;

        let mut stale = Vec::new();
        for _ in 0..100_000 {
            let handle = v.add_listener(|_| {})?;
            v.remove_listener(handle)?;
            if stale.len() < 4 {
                stale.push(handle);
            }
        }
        assert_eq!(v.listener_count(), 1);
        assert_eq!(v.listeners.lock().borrow().slot_count(), 2);

        // Handles from earlier generations of the reused slot stay dead.
        let fresh = v.add_listener(|_| {})?;
        for handle in stale {
            assert_eq!(
                v.remove_listener(handle),
                Err(VariableError::ListenerNotFound)
            );
        }
        assert_eq!(v.listener_count(), 2);

        v.set_double(1.0)?;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        v.remove_listener(fresh)?;
        v.remove_listener(kept)?;
        Ok(())
    }

    #[test]
    fn test_listener_may_write_its_own_variable() -> TestResult {
        let v = make(VariableSpec::double("x"))?;
        v.add_listener(|var| {
            if var.value_as_f64() > 10.0 {
                assert!(var.set_double(10.0).is_ok());
            }
        })?;
        v.set_double(15.0)?;
        assert_eq!(v.get_double(), Some(10.0));
        Ok(())
    }

    #[test]
    fn test_writer_claim_is_exclusive() -> TestResult {
        let v = make(VariableSpec::double("out"))?;
        let claim = Variable::claim_writer(&v)?;
        assert!(v.has_exclusive_writer());
        assert_eq!(
            Variable::claim_writer(&v).map(|_| ()),
            Err(VariableError::WriterConflict)
        );
        drop(claim);
        assert!(!v.has_exclusive_writer());
        let _again = Variable::claim_writer(&v)?;
        Ok(())
    }
}
