//! BlockLayout Core - Block-View Tree Composition and Reconciliation
//!
//! # The Pass Contract
//! 1. One tree, one pass - never reused, never shared
//! 2. Block ids are unique or the build fails
//! 3. Explicit attributes win; append defaults compose
//! 4. Context flows down, never up
//! 5. A field renders once - the reconciler guarantees it

pub mod attributes;
pub mod context;
pub mod form;
pub mod reconcile;
pub mod value;
pub mod view;

pub use attributes::{merge_attributes, AttrDefault, APPEND_MARKER};
pub use context::{merge_context, set_class_prefix};
pub use form::{find_view, FormAccessor, FormAction, FormView, ProcessedFieldMap};
pub use reconcile::{reconcile, ReconcileError};
pub use value::{FormViewHandle, Value};
pub use view::{BlockNode, BlockTree, NodeId, TreeError};

pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");
