use std::fmt;

use super::forest::{Descendants, Forest};
use crate::{TagId, TagRecord};

/// Handle to a node inside a [`Forest`].
///
/// Handles are only meaningful for the forest that issued them and are
/// invalidated by a rebuild.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub(super) usize);

impl NodeId {
    pub(crate) fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One taxonomy entry placed in the tree.
///
/// The parent link is a non-owning handle; the forest arena owns every node.
/// `level` and `path` are not stored here at all: they are derived from the
/// live parent chain through [`Forest::level`] and [`Forest::path`].
#[derive(Debug, Clone)]
pub struct HierarchyNode {
    pub(super) record: TagRecord,
    pub(super) parent: Option<NodeId>,
    pub(super) children: Vec<NodeId>,
    pub(super) direct_count: u64,
    pub(super) total_count: u64,
    pub(super) expanded: bool,
    pub(super) selected: bool,
}

impl HierarchyNode {
    pub(super) fn new(record: TagRecord) -> Self {
        Self {
            record,
            parent: None,
            children: Vec::new(),
            direct_count: 0,
            total_count: 0,
            expanded: false,
            selected: false,
        }
    }

    pub fn id(&self) -> &TagId {
        &self.record.id
    }

    pub fn record(&self) -> &TagRecord {
        &self.record
    }

    pub fn display_name(&self) -> &str {
        self.record.display_name()
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// Items tagged with exactly this tag.
    pub fn direct_count(&self) -> u64 {
        self.direct_count
    }

    /// Direct count plus the totals of every child.
    pub fn total_count(&self) -> u64 {
        self.total_count
    }

    pub fn is_expanded(&self) -> bool {
        self.expanded
    }

    pub fn is_selected(&self) -> bool {
        self.selected
    }

    /// View state only; has no effect on structure or counts.
    pub fn set_expanded(&mut self, expanded: bool) {
        self.expanded = expanded;
    }

    /// View state only; has no effect on structure or counts.
    pub fn set_selected(&mut self, selected: bool) {
        self.selected = selected;
    }
}

/// Read-only view of a node together with the forest it lives in.
///
/// Borrowing the forest lets the view answer navigation questions (level,
/// path, ancestors) while guaranteeing it cannot outlive a rebuild.
#[derive(Clone, Copy)]
pub struct NodeRef<'a> {
    forest: &'a Forest,
    id: NodeId,
}

impl<'a> NodeRef<'a> {
    pub(super) fn new(forest: &'a Forest, id: NodeId) -> Self {
        Self { forest, id }
    }

    /// Arena handle of this node.
    pub fn handle(&self) -> NodeId {
        self.id
    }

    pub fn node(&self) -> &'a HierarchyNode {
        &self.forest[self.id]
    }

    pub fn id(&self) -> &'a TagId {
        self.node().id()
    }

    pub fn record(&self) -> &'a TagRecord {
        self.node().record()
    }

    pub fn display_name(&self) -> &'a str {
        self.node().display_name()
    }

    pub fn direct_count(&self) -> u64 {
        self.node().direct_count
    }

    pub fn total_count(&self) -> u64 {
        self.node().total_count
    }

    pub fn is_expanded(&self) -> bool {
        self.node().expanded
    }

    pub fn is_selected(&self) -> bool {
        self.node().selected
    }

    /// Depth below the root: 0 for roots.
    pub fn level(&self) -> usize {
        self.forest.level(self.id)
    }

    /// Ancestor display names joined with `separator`, root first.
    pub fn path(&self, separator: &str) -> String {
        self.forest.path(self.id, separator)
    }

    /// Ancestor ids from the root down to and including this node.
    pub fn id_path(&self) -> Vec<&'a TagId> {
        self.forest.id_path(self.id)
    }

    pub fn parent(&self) -> Option<NodeRef<'a>> {
        self.node().parent.map(|id| NodeRef::new(self.forest, id))
    }

    pub fn children(&self) -> impl Iterator<Item = NodeRef<'a>> + use<'a> {
        let forest = self.forest;
        self.node()
            .children
            .iter()
            .map(move |&id| NodeRef::new(forest, id))
    }

    /// Every node strictly below this one, depth-first pre-order.
    pub fn descendants(&self) -> impl Iterator<Item = NodeRef<'a>> + use<'a> {
        let forest = self.forest;
        let walk: Descendants<'a> = forest.descendants(self.id);
        walk.map(move |id| NodeRef::new(forest, id))
    }

    /// Depth-first search of this node and its descendants.
    pub fn find_by_id(&self, id: &str) -> Option<NodeRef<'a>> {
        self.forest
            .find_by_id(self.id, id)
            .map(|found| NodeRef::new(self.forest, found))
    }
}

impl fmt::Debug for NodeRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeRef")
            .field("id", self.id())
            .field("name", &self.display_name())
            .field("level", &self.level())
            .finish()
    }
}
