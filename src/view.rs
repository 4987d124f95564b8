//! Block-View Tree - Arena-Owned Node Model
//!
//! One tree per build/render pass, discarded after output. The arena owns
//! every node; parent links are plain indices used only for root discovery,
//! never for ownership. Block ids are globally unique within a tree and
//! checked at insertion, since id-based lookup depends on it.

use indexmap::IndexMap;
use std::collections::HashMap;
use thiserror::Error;

use crate::value::Value;

#[derive(Debug, Error)]
pub enum TreeError {
    #[error("Duplicate block id: {0}")]
    DuplicateBlockId(String),

    #[error("Duplicate child name '{name}' under block '{parent}'")]
    DuplicateChildName { parent: String, name: String },

    #[error("Unknown node handle")]
    UnknownNode,
}

/// Handle to a node inside one `BlockTree`. Valid only for the tree that
/// issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Debug)]
pub struct BlockNode {
    id: String,
    vars: IndexMap<String, Value>,
    children: IndexMap<String, NodeId>,
    parent: Option<NodeId>,
}

impl BlockNode {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn vars(&self) -> &IndexMap<String, Value> {
        &self.vars
    }

    pub fn var(&self, name: &str) -> Option<&Value> {
        self.vars.get(name)
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }
}

/// The composed view tree for one render pass.
pub struct BlockTree {
    nodes: Vec<BlockNode>,
    index: HashMap<String, NodeId>,
    root: NodeId,
}

impl BlockTree {
    pub fn new(root_id: impl Into<String>) -> Self {
        let root_id = root_id.into();
        let root = NodeId(0);
        let mut index = HashMap::new();
        index.insert(root_id.clone(), root);
        Self {
            nodes: vec![BlockNode {
                id: root_id,
                vars: IndexMap::new(),
                children: IndexMap::new(),
                parent: None,
            }],
            index,
            root,
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Add a child block under `parent`. Fails on a duplicate block id
    /// anywhere in the tree or a duplicate child name under `parent`.
    pub fn add(
        &mut self,
        parent: NodeId,
        name: impl Into<String>,
        block_id: impl Into<String>,
    ) -> Result<NodeId, TreeError> {
        let name = name.into();
        let block_id = block_id.into();

        if self.index.contains_key(&block_id) {
            return Err(TreeError::DuplicateBlockId(block_id));
        }
        let parent_node = self.nodes.get(parent.0).ok_or(TreeError::UnknownNode)?;
        if parent_node.children.contains_key(&name) {
            return Err(TreeError::DuplicateChildName {
                parent: parent_node.id.clone(),
                name,
            });
        }

        let id = NodeId(self.nodes.len());
        self.nodes.push(BlockNode {
            id: block_id.clone(),
            vars: IndexMap::new(),
            children: IndexMap::new(),
            parent: Some(parent),
        });
        self.nodes[parent.0].children.insert(name, id);
        self.index.insert(block_id, id);
        Ok(id)
    }

    pub fn node(&self, id: NodeId) -> &BlockNode {
        &self.nodes[id.0]
    }

    pub fn set_var(&mut self, node: NodeId, name: impl Into<String>, value: Value) {
        self.nodes[node.0].vars.insert(name.into(), value);
    }

    /// Look a node up by block id anywhere in the tree.
    pub fn find(&self, block_id: &str) -> Option<NodeId> {
        self.index.get(block_id).copied()
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes[node.0].parent
    }

    /// Child handles of `node`, in insertion order.
    pub fn children_of(&self, node: NodeId) -> Vec<NodeId> {
        self.nodes[node.0].children.values().copied().collect()
    }

    pub fn children(&self, node: NodeId) -> impl Iterator<Item = (&str, NodeId)> + '_ {
        self.nodes[node.0]
            .children
            .iter()
            .map(|(name, id)| (name.as_str(), *id))
    }

    /// Node with `block_id` lying strictly below `scope`, if any.
    ///
    /// The id index spans the whole tree; containment is checked by walking
    /// the candidate's ancestor chain.
    pub fn descendant_by_id(&self, scope: NodeId, block_id: &str) -> Option<NodeId> {
        let candidate = self.find(block_id)?;
        let mut current = self.nodes[candidate.0].parent;
        while let Some(ancestor) = current {
            if ancestor == scope {
                return Some(candidate);
            }
            current = self.nodes[ancestor.0].parent;
        }
        None
    }

    /// Tree root reached by walking parent links from `node`.
    pub fn root_of(&self, node: NodeId) -> NodeId {
        let mut current = node;
        while let Some(parent) = self.nodes[current.0].parent {
            current = parent;
        }
        current
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
