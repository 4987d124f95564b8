//! Render Reconciliation - Finish-Phase Field Accounting
//!
//! Runs once per build pass, after the tree and all node views exist.
//! For every processed form field it decides whether a distinct block
//! genuinely rendered the field; if not, the field's sub-view is marked
//! rendered so the fallback bulk-render pass does not emit it twice.
//! Covers three failure shapes: the dedicated block was pruned from the
//! tree, the block exists but renders an unrelated form view under the same
//! id, or the block never carried a form view at all.

use std::rc::Rc;
use thiserror::Error;
use tracing::debug;

use crate::form::{find_view, ProcessedFieldMap};
use crate::value::FormViewHandle;
use crate::view::{BlockTree, NodeId};

#[derive(Debug, Error)]
pub enum ReconcileError {
    /// The processed-field map and the form structure disagree about
    /// topology. Fatal: the tree and the form have diverged.
    #[error("Form field '{path}' cannot be resolved against the form view")]
    UnresolvedField { path: String },

    #[error("Block '{block_id}' carries no form view")]
    FormVarMissing { block_id: String },
}

/// Reconcile processed form fields against the built tree.
///
/// `view` is the form block whose `form` var holds the root form view.
/// Entries are evaluated independently; the pass is idempotent.
pub fn reconcile(
    tree: &BlockTree,
    view: NodeId,
    processed_fields: &ProcessedFieldMap,
) -> Result<(), ReconcileError> {
    let form_root = tree
        .node(view)
        .var("form")
        .and_then(|value| value.as_form())
        .cloned()
        .ok_or_else(|| ReconcileError::FormVarMissing {
            block_id: tree.node(view).id().to_string(),
        })?;

    // Root discovery is lazy: only fields missing under `view` need it,
    // and it is memoized for the remainder of the pass.
    let mut cached_root: Option<Option<NodeId>> = None;

    for (path, expected_id) in processed_fields {
        let mut found = tree.descendant_by_id(view, expected_id);
        if found.is_none() {
            let root = *cached_root.get_or_insert_with(|| {
                if tree.parent(view).is_some() {
                    Some(tree.root_of(view))
                } else {
                    None
                }
            });
            if let Some(root) = root {
                found = tree.descendant_by_id(root, expected_id);
            }
        }

        match found {
            Some(node) => check_existing_field_view(tree, node, &form_root, path)?,
            None => {
                // never materialized as a distinct block
                debug!(field = %path, block = %expected_id, "field block missing, marking rendered");
                resolve(&form_root, path)?.set_rendered();
            }
        }
    }
    Ok(())
}

/// A block with the expected id exists. It represents the field only if its
/// own `form` var is identity-equal to the field's resolved sub-view;
/// otherwise the block is unrelated and the field must be suppressed.
fn check_existing_field_view(
    tree: &BlockTree,
    node: NodeId,
    form_root: &FormViewHandle,
    path: &str,
) -> Result<(), ReconcileError> {
    match tree.node(node).var("form").and_then(|value| value.as_form()) {
        None => {
            debug!(field = %path, block = %tree.node(node).id(), "block has no form view, marking rendered");
            resolve(form_root, path)?.set_rendered();
        }
        Some(node_form) => {
            let field_view = resolve(form_root, path)?;
            if !Rc::ptr_eq(node_form, field_view) {
                debug!(field = %path, block = %tree.node(node).id(), "block renders a different form view, marking rendered");
                field_view.set_rendered();
            }
        }
    }
    Ok(())
}

fn resolve<'a>(
    form_root: &'a FormViewHandle,
    path: &str,
) -> Result<&'a FormViewHandle, ReconcileError> {
    find_view(form_root, path).ok_or_else(|| ReconcileError::UnresolvedField {
        path: path.to_string(),
    })
}
