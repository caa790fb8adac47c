//! Arena-backed forest of hierarchy nodes.
//!
//! The arena owns every node by value. Parent and child relations are stored
//! as [`NodeId`] handles, so the parent direction is a plain lookup key and
//! never a second owner.

use std::collections::HashMap;
use std::ops::{Index, IndexMut};

use super::HierarchyError;
use super::node::{HierarchyNode, NodeId, NodeRef};
use crate::TagId;

/// Roots, nodes and the `id -> node` index of one hierarchy snapshot.
#[derive(Debug, Clone, Default)]
pub struct Forest {
    pub(super) nodes: Vec<HierarchyNode>,
    pub(super) roots: Vec<NodeId>,
    pub(super) index: HashMap<TagId, NodeId>,
}

impl Forest {
    /// Creates an empty forest.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of nodes in the forest.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Root handles in display order.
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// The `id -> handle` index.
    pub fn index(&self) -> &HashMap<TagId, NodeId> {
        &self.index
    }

    /// Resolves a tag id to its handle in O(1).
    pub fn lookup(&self, id: &str) -> Option<NodeId> {
        self.index.get(id).copied()
    }

    /// Resolves a tag id to a navigable view.
    pub fn get(&self, id: &str) -> Option<NodeRef<'_>> {
        self.lookup(id).map(|handle| self.view(handle))
    }

    /// Wraps a handle in a navigable view.
    pub fn view(&self, id: NodeId) -> NodeRef<'_> {
        NodeRef::new(self, id)
    }

    /// All nodes in arena order.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &HierarchyNode)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, node)| (NodeId(i), node))
    }

    pub(super) fn nodes_mut(&mut self) -> impl Iterator<Item = &mut HierarchyNode> {
        self.nodes.iter_mut()
    }

    pub(super) fn push(&mut self, node: HierarchyNode) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        id
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self[id].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self[id].children
    }

    /// Attaches `child` under `parent`, appending it to the parent's children.
    ///
    /// The child is first detached from wherever it currently sits (the root
    /// list or a previous parent), so membership stays exclusive. Attaching a
    /// node under itself or under one of its own descendants is refused.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), HierarchyError> {
        if parent == child || self.is_ancestor(child, parent) {
            return Err(HierarchyError::CycleDetected {
                id: self[child].id().clone(),
                parent_id: self[parent].id().clone(),
            });
        }

        self.detach(child);
        self[child].parent = Some(parent);
        self[parent].children.push(child);
        Ok(())
    }

    /// Detaches `child` from `parent` and makes it a root.
    ///
    /// Returns false when `child` is not a child of `parent`.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> bool {
        if self[child].parent != Some(parent) {
            return false;
        }
        self.detach(child);
        self.roots.push(child);
        true
    }

    fn detach(&mut self, id: NodeId) {
        match self[id].parent.take() {
            Some(parent) => self[parent].children.retain(|&c| c != id),
            None => self.roots.retain(|&r| r != id),
        }
    }

    /// Depth-first search of `from` and its descendants for a tag id.
    ///
    /// Follows children order, so the first match is deterministic.
    pub fn find_by_id(&self, from: NodeId, id: &str) -> Option<NodeId> {
        std::iter::once(from)
            .chain(self.descendants(from))
            .find(|&candidate| self[candidate].id().as_str() == id)
    }

    /// Lazy pre-order traversal of every node strictly below `from`.
    ///
    /// Each call starts a fresh traversal.
    pub fn descendants(&self, from: NodeId) -> Descendants<'_> {
        let mut stack = self[from].children.clone();
        stack.reverse();
        Descendants { forest: self, stack }
    }

    /// Lazy pre-order traversal of the whole forest, roots in order.
    pub fn walk(&self) -> Descendants<'_> {
        let mut stack = self.roots.clone();
        stack.reverse();
        Descendants { forest: self, stack }
    }

    /// Parent chain of `id`, nearest parent first, excluding `id` itself.
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            forest: self,
            next: self[id].parent,
        }
    }

    /// Returns true when `ancestor` lies on the parent chain of `node`.
    pub fn is_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        self.ancestors(node).any(|a| a == ancestor)
    }

    /// Depth of a node: 0 for roots, otherwise one more than its parent.
    pub fn level(&self, id: NodeId) -> usize {
        self.ancestors(id).count()
    }

    /// Display names from the root down to `id`, joined with `separator`.
    pub fn path(&self, id: NodeId, separator: &str) -> String {
        let mut names: Vec<&str> = self
            .ancestors(id)
            .map(|a| self[a].display_name())
            .collect();
        names.reverse();
        names.push(self[id].display_name());
        names.join(separator)
    }

    /// Tag ids from the root down to and including `id`.
    pub fn id_path(&self, id: NodeId) -> Vec<&TagId> {
        let mut ids: Vec<&TagId> = self.ancestors(id).map(|a| self[a].id()).collect();
        ids.reverse();
        ids.push(self[id].id());
        ids
    }
}

impl Index<NodeId> for Forest {
    type Output = HierarchyNode;

    fn index(&self, id: NodeId) -> &HierarchyNode {
        &self.nodes[id.0]
    }
}

impl IndexMut<NodeId> for Forest {
    fn index_mut(&mut self, id: NodeId) -> &mut HierarchyNode {
        &mut self.nodes[id.0]
    }
}

/// Explicit-stack pre-order iterator over forest nodes.
pub struct Descendants<'a> {
    forest: &'a Forest,
    stack: Vec<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.stack.pop()?;
        self.stack
            .extend(self.forest[id].children.iter().rev().copied());
        Some(id)
    }
}

/// Iterator over a node's parent chain.
pub struct Ancestors<'a> {
    forest: &'a Forest,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.next?;
        self.next = self.forest[id].parent;
        Some(id)
    }
}
