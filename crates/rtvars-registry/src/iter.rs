//! Depth-first walks over a registry subtree.

use crate::registry::Registry;
use crate::variable::VariableHandle;

#[derive(Debug, Clone)]
struct Frame<'a> {
    registry: &'a Registry,
    next_child: usize,
    next_variable: usize,
}

impl<'a> Frame<'a> {
    fn new(registry: &'a Registry) -> Self {
        Self {
            registry,
            next_child: 0,
            next_variable: 0,
        }
    }
}

/// Iterator returned by [`Registry::all_variables`].
///
/// Explicit stack, so deep trees do not recurse. Yields each child subtree in
/// insertion order, then the node's own variables.
#[derive(Debug, Clone)]
pub struct AllVariables<'a> {
    stack: Vec<Frame<'a>>,
}

impl<'a> AllVariables<'a> {
    pub(crate) fn new(root: &'a Registry) -> Self {
        Self {
            stack: vec![Frame::new(root)],
        }
    }
}

impl<'a> Iterator for AllVariables<'a> {
    type Item = &'a VariableHandle;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let frame = self.stack.last_mut()?;
            let registry = frame.registry;
            if let Some(child) = registry.children().get(frame.next_child) {
                frame.next_child += 1;
                self.stack.push(Frame::new(child));
                continue;
            }
            if let Some(variable) = registry.variables().get(frame.next_variable) {
                frame.next_variable += 1;
                return Some(variable);
            }
            self.stack.pop();
        }
    }
}

/// Iterator returned by [`Registry::subtree_registries`], pre-order.
#[derive(Debug, Clone)]
pub struct SubtreeRegistries<'a> {
    stack: Vec<&'a Registry>,
}

impl<'a> SubtreeRegistries<'a> {
    pub(crate) fn new(root: &'a Registry) -> Self {
        Self { stack: vec![root] }
    }
}

impl<'a> Iterator for SubtreeRegistries<'a> {
    type Item = &'a Registry;

    fn next(&mut self) -> Option<Self::Item> {
        let registry = self.stack.pop()?;
        self.stack.extend(registry.children().iter().rev());
        Some(registry)
    }
}
