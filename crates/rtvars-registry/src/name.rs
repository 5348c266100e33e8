//! Names and namespaces.
//!
//! A [`Namespace`] is the ordered list of registry names from the root down to
//! a node. It doubles as the non-owning back-reference a variable keeps to its
//! owning registry.

use core::fmt;
use core::str::FromStr;

use rtvars_errors::RegistryError;
use serde::{Deserialize, Serialize};

/// Separator between sub-names in a namespace or lookup path.
pub const SEPARATOR: char = '.';

/// Alternative separator accepted by lookup paths only.
pub const PATH_SEPARATOR: char = '/';

/// Characters that may not appear in a registry or variable name.
pub const ILLEGAL_CHARACTERS: &[char] = &[
    '`', '~', '*', '!', '?', '@', '#', '$', '%', '/', '^', '&', '(', ')', '<', '>', ',', ':', ';',
    '{', '}', '\'', '"', '\\', '=', '+', '|', ' ',
];

/// Check that `name` is usable as a registry or variable name.
///
/// # Errors
///
/// Returns [`RegistryError::IllegalName`] for empty names, names containing
/// the separator, and names containing any of [`ILLEGAL_CHARACTERS`].
///
/// ```
/// use rtvars_registry::validate_name;
///
/// assert!(validate_name("left_knee-pitch").is_ok());
/// assert!(validate_name("knee.pitch").is_err());
/// assert!(validate_name("knee pitch").is_err());
/// ```
pub fn validate_name(name: &str) -> Result<(), RegistryError> {
    if name.is_empty() {
        return Err(RegistryError::illegal_name(name, "name is empty"));
    }
    if name.contains(SEPARATOR) {
        return Err(RegistryError::illegal_name(
            name,
            "contains the namespace separator",
        ));
    }
    if name.contains(ILLEGAL_CHARACTERS) {
        return Err(RegistryError::illegal_name(
            name,
            "contains a reserved character",
        ));
    }
    Ok(())
}

/// Split a lookup path on `.` or `/` into its segments.
pub(crate) fn split_path(path: &str) -> Result<Vec<&str>, RegistryError> {
    let trimmed = path.trim_matches(|c: char| c == SEPARATOR || c == PATH_SEPARATOR);
    if trimmed.is_empty() {
        return Err(RegistryError::EmptyPath);
    }
    let segments: Vec<&str> = trimmed
        .split(|c: char| c == SEPARATOR || c == PATH_SEPARATOR)
        .collect();
    if segments.iter().any(|s| s.is_empty()) {
        return Err(RegistryError::not_found(path));
    }
    Ok(segments)
}

/// Full namespace of a registry node, e.g. `robot.left_leg.knee`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Namespace {
    sub_names: Vec<String>,
}

impl Namespace {
    /// Namespace with no sub-names.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Single-element namespace for a root registry.
    ///
    /// # Errors
    ///
    /// Fails if `name` is not a legal name.
    pub fn root(name: &str) -> Result<Self, RegistryError> {
        validate_name(name)?;
        Ok(Self {
            sub_names: vec![name.to_owned()],
        })
    }

    /// Parse a dotted namespace string.
    ///
    /// # Errors
    ///
    /// Fails with [`RegistryError::EmptyPath`] for an empty string and
    /// [`RegistryError::IllegalName`] if any sub-name is illegal.
    pub fn parse(text: &str) -> Result<Self, RegistryError> {
        if text.is_empty() {
            return Err(RegistryError::EmptyPath);
        }
        let sub_names = text
            .split(SEPARATOR)
            .map(|s| validate_name(s).map(|()| s.to_owned()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { sub_names })
    }

    /// Namespace of a direct child. `name` must already be validated.
    pub(crate) fn child(&self, name: &str) -> Self {
        let mut sub_names = Vec::with_capacity(self.sub_names.len() + 1);
        sub_names.extend(self.sub_names.iter().cloned());
        sub_names.push(name.to_owned());
        Self { sub_names }
    }

    /// The sub-names, root first.
    pub fn sub_names(&self) -> &[String] {
        &self.sub_names
    }

    /// Number of sub-names.
    pub fn depth(&self) -> usize {
        self.sub_names.len()
    }

    /// True when there are no sub-names.
    pub fn is_empty(&self) -> bool {
        self.sub_names.is_empty()
    }

    /// First sub-name.
    pub fn root_name(&self) -> Option<&str> {
        self.sub_names.first().map(String::as_str)
    }

    /// Last sub-name.
    pub fn short_name(&self) -> Option<&str> {
        self.sub_names.last().map(String::as_str)
    }

    /// Namespace with the last sub-name removed, `None` at the root.
    pub fn parent(&self) -> Option<Self> {
        let (_, parent) = self.sub_names.split_last()?;
        if parent.is_empty() {
            return None;
        }
        Some(Self {
            sub_names: parent.to_vec(),
        })
    }

    /// True if `prefix` matches the leading sub-names exactly.
    pub fn starts_with(&self, prefix: &Namespace) -> bool {
        self.sub_names.starts_with(&prefix.sub_names)
    }

    /// True if `suffix` matches the trailing sub-names exactly.
    pub fn ends_with(&self, suffix: &Namespace) -> bool {
        self.sub_names.ends_with(&suffix.sub_names)
    }

    /// Strip `prefix`, returning `None` if it does not match.
    pub fn remove_start(&self, prefix: &Namespace) -> Option<Self> {
        self.sub_names
            .strip_prefix(prefix.sub_names.as_slice())
            .map(|rest| Self {
                sub_names: rest.to_vec(),
            })
    }

    /// Append all of `other`'s sub-names.
    pub fn concat(&self, other: &Namespace) -> Self {
        let mut sub_names = self.sub_names.clone();
        sub_names.extend(other.sub_names.iter().cloned());
        Self { sub_names }
    }

    /// Fully qualified name of an entry directly under this namespace.
    pub fn qualify(&self, name: &str) -> String {
        if self.is_empty() {
            name.to_owned()
        } else {
            format!("{self}{SEPARATOR}{name}")
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for name in &self.sub_names {
            if !first {
                write!(f, "{SEPARATOR}")?;
            }
            write!(f, "{name}")?;
            first = false;
        }
        Ok(())
    }
}

impl FromStr for Namespace {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Namespace {
    type Error = RegistryError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Namespace> for String {
    fn from(value: Namespace) -> Self {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    #[test]
    fn test_parse_and_display() -> TestResult {
        let ns = Namespace::parse("robot.left_leg.knee")?;
        assert_eq!(ns.depth(), 3);
        assert_eq!(ns.to_string(), "robot.left_leg.knee");
        assert_eq!(ns.root_name(), Some("robot"));
        assert_eq!(ns.short_name(), Some("knee"));
        Ok(())
    }

    #[test]
    fn test_parse_rejects_empty_sub_names() {
        assert!(Namespace::parse("robot..knee").is_err());
        assert!(matches!(Namespace::parse(""), Err(RegistryError::EmptyPath)));
    }

    #[test]
    fn test_parent_chain() -> TestResult {
        let ns = Namespace::parse("a.b.c")?;
        let parent = ns.parent().ok_or("missing parent")?;
        assert_eq!(parent.to_string(), "a.b");
        assert_eq!(Namespace::parse("a")?.parent(), None);
        Ok(())
    }

    #[test]
    fn test_starts_and_ends_with_whole_names() -> TestResult {
        let ns = Namespace::parse("robot.arm.wrist")?;
        assert!(ns.starts_with(&Namespace::parse("robot.arm")?));
        assert!(ns.ends_with(&Namespace::parse("arm.wrist")?));
        assert!(!ns.ends_with(&Namespace::parse("rm.wrist")?));
        Ok(())
    }

    #[test]
    fn test_remove_start_and_concat() -> TestResult {
        let ns = Namespace::parse("robot.arm.wrist")?;
        let rest = ns
            .remove_start(&Namespace::parse("robot")?)
            .ok_or("prefix should match")?;
        assert_eq!(rest.to_string(), "arm.wrist");
        assert_eq!(Namespace::parse("robot")?.concat(&rest), ns);
        Ok(())
    }

    #[test]
    fn test_qualify() -> TestResult {
        assert_eq!(Namespace::parse("a.b")?.qualify("x"), "a.b.x");
        assert_eq!(Namespace::empty().qualify("x"), "x");
        Ok(())
    }

    #[test]
    fn test_validate_name_characters() {
        for bad in ["", "a.b", "a b", "a/b", "a:b", "a|b", "x=1"] {
            assert!(validate_name(bad).is_err(), "{bad:?} should be rejected");
        }
        for good in ["q", "q_desired", "left-knee", "Joint7"] {
            assert!(validate_name(good).is_ok(), "{good:?} should be accepted");
        }
    }

    #[test]
    fn test_split_path_accepts_both_separators() -> TestResult {
        assert_eq!(split_path("root/joint1/position")?, ["root", "joint1", "position"]);
        assert_eq!(split_path("root.joint1.position")?, ["root", "joint1", "position"]);
        assert!(matches!(split_path(""), Err(RegistryError::EmptyPath)));
        assert!(split_path("a//b").is_err());
        Ok(())
    }
}
