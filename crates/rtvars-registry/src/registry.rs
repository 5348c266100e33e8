//! The registry tree.
//!
//! Each [`Registry`] node owns its child registries and its variables. Children
//! and variables share one name index per node, so a child and a variable can
//! never have the same name under the same parent.
//!
//! Structural calls (`create_child`, `register*`) are not RT-safe and must not
//! race with a history buffer ticking over this subtree. A buffer only sees a
//! new variable after an explicit bind or rebind.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;

use rtvars_errors::RegistryError;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::iter::{AllVariables, SubtreeRegistries};
use crate::name::{Namespace, split_path, validate_name};
use crate::schema::{RegistrySchema, VariableSchema};
use crate::value::{Bounds, BoundsPolicy, VariableKind};
use crate::variable::{Variable, VariableHandle, VariableSpec};

/// Construction-time options shared by a whole tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryOptions {
    /// Bounds policy for variables that do not set their own
    pub default_policy: BoundsPolicy,
    /// Kinds that may be registered
    pub allowed_kinds: BTreeSet<VariableKind>,
}

impl Default for RegistryOptions {
    fn default() -> Self {
        Self {
            default_policy: BoundsPolicy::Clamp,
            allowed_kinds: VariableKind::ALL.into_iter().collect(),
        }
    }
}

/// Result of a path lookup.
#[derive(Debug, Clone, Copy)]
pub enum Entry<'a> {
    /// A registry node
    Registry(&'a Registry),
    /// A variable
    Variable(&'a VariableHandle),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Child(usize),
    Variable(usize),
}

/// A node in the namespace tree.
///
/// # Example
///
/// ```
/// use rtvars_registry::prelude::*;
///
/// # fn main() -> Result<(), RegistryError> {
/// let mut root = Registry::new("root")?;
/// let joint = root.create_child("joint1")?;
/// let position = joint.register_variable(
///     "position",
///     VariableKind::Double,
///     Some(Bounds::symmetric(std::f64::consts::PI)),
/// )?;
///
/// let found = root.find_variable("root/joint1/position")?;
/// assert_eq!(found.id(), position.id());
/// assert_eq!(found.full_name(), "root.joint1.position");
/// # Ok(())
/// # }
/// ```
pub struct Registry {
    name: String,
    namespace: Namespace,
    options: Arc<RegistryOptions>,
    children: Vec<Registry>,
    variables: Vec<VariableHandle>,
    index: HashMap<String, Slot>,
}

impl Registry {
    /// Create a standalone root registry with default options.
    ///
    /// # Errors
    ///
    /// Fails if `name` is not a legal name.
    pub fn new(name: &str) -> Result<Self, RegistryError> {
        Self::with_options(name, RegistryOptions::default())
    }

    /// Create a standalone root registry.
    ///
    /// # Errors
    ///
    /// Fails if `name` is not a legal name.
    pub fn with_options(name: &str, options: RegistryOptions) -> Result<Self, RegistryError> {
        let namespace = Namespace::root(name)?;
        debug!(registry = %namespace, "created root registry");
        Ok(Self::node(name, namespace, Arc::new(options)))
    }

    fn node(name: &str, namespace: Namespace, options: Arc<RegistryOptions>) -> Self {
        Self {
            name: name.to_owned(),
            namespace,
            options,
            children: Vec::new(),
            variables: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Short name of this node.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Full namespace from the root to this node.
    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    /// Options shared by the whole tree.
    pub fn options(&self) -> &RegistryOptions {
        &self.options
    }

    fn ensure_free(&self, name: &str) -> Result<(), RegistryError> {
        validate_name(name)?;
        if self.index.contains_key(name) {
            return Err(RegistryError::duplicate(self.namespace.to_string(), name));
        }
        Ok(())
    }

    /// Create a named child registry.
    ///
    /// # Errors
    ///
    /// [`RegistryError::DuplicateName`] if a child or variable of that name
    /// exists, [`RegistryError::IllegalName`] for a bad name. The tree is left
    /// unchanged on error.
    pub fn create_child(&mut self, name: &str) -> Result<&mut Registry, RegistryError> {
        self.ensure_free(name)?;
        let child = Self::node(name, self.namespace.child(name), Arc::clone(&self.options));
        debug!(registry = %child.namespace, "created child registry");
        let position = self.children.len();
        self.index.insert(name.to_owned(), Slot::Child(position));
        self.children.push(child);
        self.children
            .last_mut()
            .ok_or_else(|| RegistryError::not_found(self.namespace.qualify(name)))
    }

    /// Register a variable with the tree's default policy.
    ///
    /// # Errors
    ///
    /// See [`register`](Self::register).
    pub fn register_variable(
        &mut self,
        name: &str,
        kind: VariableKind,
        bounds: Option<Bounds>,
    ) -> Result<VariableHandle, RegistryError> {
        self.register(VariableSpec::new(name, kind).with_optional_bounds(bounds))
    }

    /// Register a variable from a full spec.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::DuplicateName`] if the name is taken in this node
    /// - [`RegistryError::IllegalName`] for a bad name
    /// - [`RegistryError::KindNotAllowed`] if the kind is not in the allowed set
    /// - [`RegistryError::InvalidBounds`] / [`RegistryError::InvalidDefinition`] for a bad spec
    ///
    /// The tree is left unchanged on error.
    pub fn register(&mut self, spec: VariableSpec) -> Result<VariableHandle, RegistryError> {
        self.ensure_free(spec.name())?;
        if !self.options.allowed_kinds.contains(&spec.kind()) {
            return Err(RegistryError::KindNotAllowed {
                name: spec.name().to_owned(),
                kind: spec.kind().name(),
            });
        }
        let variable = Arc::new(Variable::from_spec(
            spec,
            self.namespace.clone(),
            self.options.default_policy,
        )?);
        debug!(
            variable = %variable.full_name(),
            kind = %variable.kind(),
            "registered variable"
        );
        self.index.insert(
            variable.name().to_owned(),
            Slot::Variable(self.variables.len()),
        );
        self.variables.push(Arc::clone(&variable));
        Ok(variable)
    }

    /// Direct child by name.
    pub fn child(&self, name: &str) -> Option<&Registry> {
        match self.index.get(name)? {
            Slot::Child(i) => self.children.get(*i),
            Slot::Variable(_) => None,
        }
    }

    /// Direct child by name, mutably.
    pub fn child_mut(&mut self, name: &str) -> Option<&mut Registry> {
        match self.index.get(name)? {
            Slot::Child(i) => self.children.get_mut(*i),
            Slot::Variable(_) => None,
        }
    }

    /// Own variable by name.
    pub fn variable(&self, name: &str) -> Option<&VariableHandle> {
        match self.index.get(name)? {
            Slot::Variable(i) => self.variables.get(*i),
            Slot::Child(_) => None,
        }
    }

    /// Child registries in insertion order.
    pub fn children(&self) -> &[Registry] {
        &self.children
    }

    /// Own variables in insertion order.
    pub fn variables(&self) -> &[VariableHandle] {
        &self.variables
    }

    fn entry(&self, name: &str) -> Option<Entry<'_>> {
        match self.index.get(name)? {
            Slot::Child(i) => self.children.get(*i).map(Entry::Registry),
            Slot::Variable(i) => self.variables.get(*i).map(Entry::Variable),
        }
    }

    fn resolve(&self, segments: &[&str]) -> Option<Entry<'_>> {
        let (last, parents) = segments.split_last()?;
        let mut node = self;
        for segment in parents {
            node = node.child(segment)?;
        }
        node.entry(last)
    }

    fn resolve_mut(&mut self, segments: &[&str]) -> Option<&mut Registry> {
        let mut node = self;
        for segment in segments {
            node = node.child_mut(segment)?;
        }
        Some(node)
    }

    /// Segments relative to this node, stripping this node's namespace if the
    /// path is written from the root.
    fn relative<'p>(&self, segments: &'p [&'p str]) -> Option<&'p [&'p str]> {
        let own = self.namespace.sub_names();
        let matches = segments.len() >= own.len()
            && segments.iter().zip(own).all(|(seg, name)| *seg == name.as_str());
        if matches { segments.get(own.len()..) } else { None }
    }

    /// Resolve a `.` or `/` separated path to a variable or registry.
    ///
    /// The path is tried relative to this node first, then as a path that
    /// starts with this node's own namespace. Lookup is case-sensitive and
    /// costs O(depth).
    ///
    /// # Errors
    ///
    /// [`RegistryError::NotFound`] if any segment is missing,
    /// [`RegistryError::EmptyPath`] for an empty path.
    pub fn find(&self, path: &str) -> Result<Entry<'_>, RegistryError> {
        let segments = split_path(path)?;
        if let Some(entry) = self.resolve(&segments) {
            return Ok(entry);
        }
        match self.relative(&segments) {
            Some([]) => Ok(Entry::Registry(self)),
            Some(rest) => self
                .resolve(rest)
                .ok_or_else(|| RegistryError::not_found(path)),
            None => Err(RegistryError::not_found(path)),
        }
    }

    /// Resolve a path to a variable.
    ///
    /// # Errors
    ///
    /// As [`find`](Self::find), plus [`RegistryError::WrongEntry`] if the
    /// path names a registry.
    pub fn find_variable(&self, path: &str) -> Result<VariableHandle, RegistryError> {
        match self.find(path)? {
            Entry::Variable(v) => Ok(Arc::clone(v)),
            Entry::Registry(_) => Err(RegistryError::WrongEntry {
                path: path.to_owned(),
                expected: "variable",
            }),
        }
    }

    /// Resolve a path to a registry.
    ///
    /// # Errors
    ///
    /// As [`find`](Self::find), plus [`RegistryError::WrongEntry`] if the
    /// path names a variable.
    pub fn find_registry(&self, path: &str) -> Result<&Registry, RegistryError> {
        match self.find(path)? {
            Entry::Registry(r) => Ok(r),
            Entry::Variable(_) => Err(RegistryError::WrongEntry {
                path: path.to_owned(),
                expected: "registry",
            }),
        }
    }

    /// Resolve a path to a registry for further construction.
    ///
    /// # Errors
    ///
    /// [`RegistryError::NotFound`] if no registry lives at `path`.
    pub fn find_registry_mut(&mut self, path: &str) -> Result<&mut Registry, RegistryError> {
        let segments = split_path(path)?;
        if self.resolve(&segments).is_some() {
            return self
                .resolve_mut(&segments)
                .ok_or_else(|| RegistryError::not_found(path));
        }
        let rest = self
            .relative(&segments)
            .ok_or_else(|| RegistryError::not_found(path))?;
        self.resolve_mut(rest)
            .ok_or_else(|| RegistryError::not_found(path))
    }

    /// All variables named `name` whose namespace ends with `namespace_ending`.
    ///
    /// # Errors
    ///
    /// Fails if `namespace_ending` is not a valid namespace.
    pub fn find_by_suffix(
        &self,
        namespace_ending: &str,
        name: &str,
    ) -> Result<Vec<VariableHandle>, RegistryError> {
        let ending = Namespace::parse(namespace_ending)?;
        Ok(self
            .all_variables()
            .filter(|v| v.name() == name && v.namespace().ends_with(&ending))
            .cloned()
            .collect())
    }

    /// All variables whose short name contains `text`, in
    /// [`all_variables`](Self::all_variables) order.
    ///
    /// Case-insensitive matching compares lowercased names.
    pub fn find_containing(&self, text: &str, case_sensitive: bool) -> Vec<VariableHandle> {
        if case_sensitive {
            return self
                .all_variables()
                .filter(|v| v.name().contains(text))
                .cloned()
                .collect();
        }
        let needle = text.to_lowercase();
        self.all_variables()
            .filter(|v| v.name().to_lowercase().contains(&needle))
            .cloned()
            .collect()
    }

    /// Lazy depth-first walk over every variable in this subtree.
    ///
    /// Children are visited in insertion order before the node's own
    /// variables. Call again to restart.
    pub fn all_variables(&self) -> AllVariables<'_> {
        AllVariables::new(self)
    }

    /// Pre-order walk over this node and every descendant registry.
    pub fn subtree_registries(&self) -> SubtreeRegistries<'_> {
        SubtreeRegistries::new(self)
    }

    /// Number of variables owned directly by this node.
    pub fn number_of_variables(&self) -> usize {
        self.variables.len()
    }

    /// Number of variables in the whole subtree.
    pub fn number_of_variables_deep(&self) -> usize {
        self.subtree_registries()
            .map(Registry::number_of_variables)
            .sum()
    }

    /// `(path, kind, bounds)` for every variable, in [`all_variables`](Self::all_variables) order.
    pub fn schema(&self) -> RegistrySchema {
        RegistrySchema {
            root: self.namespace.to_string(),
            variables: self.all_variables().map(|v| VariableSchema::of(v)).collect(),
        }
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("namespace", &self.namespace)
            .field(
                "children",
                &self.children.iter().map(Registry::name).collect::<Vec<_>>(),
            )
            .field(
                "variables",
                &self.variables.iter().map(|v| v.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl Drop for Registry {
    fn drop(&mut self) {
        for variable in &self.variables {
            variable.detach();
        }
    }
}
