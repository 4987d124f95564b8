//! Context Propagation
//!
//! Pushes a set of named variables from a node into its entire subtree.

use indexmap::IndexMap;

use crate::value::{FormViewHandle, Value};
use crate::view::{BlockTree, NodeId};

/// Set every entry of `vars` on `node` and all of its descendants,
/// overwriting existing keys. Depth-first, pre-order. Returns `node` so
/// builder pipelines can chain on the result. Idempotent.
pub fn merge_context(tree: &mut BlockTree, node: NodeId, vars: &IndexMap<String, Value>) -> NodeId {
    let mut stack = vec![node];
    while let Some(current) = stack.pop() {
        for (name, value) in vars {
            tree.set_var(current, name.clone(), value.clone());
        }
        stack.extend(tree.children_of(current));
    }
    node
}

/// Stamp a CSS class prefix on a form view and every descendant, including
/// collection prototypes, so themed field rendering stays consistent.
pub fn set_class_prefix(view: &FormViewHandle, prefix: &str) {
    view.as_ref().set_class_prefix(prefix);
    for child in view.children() {
        set_class_prefix(child, prefix);
    }
    if let Some(prototype) = view.prototype() {
        set_class_prefix(prototype, prefix);
    }
}
