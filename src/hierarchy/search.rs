//! Text search over the hierarchy.
//!
//! A node is visible when it matches the query itself or when any of its
//! descendants does. Matches propagate upward only, so the path from a root to
//! every hit stays intact. Searching never touches view state.

use std::collections::HashSet;

use super::forest::Forest;
use super::node::NodeId;
use crate::TagRecord;

/// Case-insensitive substring query over name, type and description.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SearchQuery {
    needle: Option<String>,
}

impl SearchQuery {
    /// Parses a query.
    ///
    /// Leading and trailing whitespace is ignored, so `" rust "` behaves like
    /// `"rust"`. Blank input places no constraint and matches everything.
    pub fn new(query: &str) -> Self {
        let trimmed = query.trim();
        Self {
            needle: (!trimmed.is_empty()).then(|| trimmed.to_lowercase()),
        }
    }

    /// Returns true when the query matches every node.
    pub fn is_unconstrained(&self) -> bool {
        self.needle.is_none()
    }

    /// Does the record itself match, ignoring its descendants?
    pub fn matches_record(&self, record: &TagRecord) -> bool {
        let Some(needle) = &self.needle else {
            return true;
        };

        record.name.to_lowercase().contains(needle)
            || record.tag_type.as_str().contains(needle.as_str())
            || record
                .description
                .as_deref()
                .is_some_and(|d| d.to_lowercase().contains(needle))
    }
}

/// Returns true when `node` or any of its descendants matches.
pub fn subtree_matches(forest: &Forest, node: NodeId, query: &SearchQuery) -> bool {
    std::iter::once(node)
        .chain(forest.descendants(node))
        .any(|id| query.matches_record(forest[id].record()))
}

/// Every node that should be shown for `query`: direct matches plus all of their ancestors.
pub fn match_set(forest: &Forest, query: &SearchQuery) -> HashSet<NodeId> {
    let order: Vec<NodeId> = forest.walk().collect();
    let mut visible = vec![false; forest.len()];

    for &id in order.iter().rev() {
        visible[id.index()] = query.matches_record(forest[id].record())
            || forest
                .children(id)
                .iter()
                .any(|child| visible[child.index()]);
    }

    order
        .into_iter()
        .filter(|id| visible[id.index()])
        .collect()
}

/// Nodes whose own fields match, in pre-order.
pub fn direct_matches(forest: &Forest, query: &SearchQuery) -> Vec<NodeId> {
    forest
        .walk()
        .filter(|&id| query.matches_record(forest[id].record()))
        .collect()
}

/// Roots whose subtree contains a match, in root order.
pub fn search_roots(forest: &Forest, query: &SearchQuery) -> Vec<NodeId> {
    forest
        .roots()
        .iter()
        .copied()
        .filter(|&root| subtree_matches(forest, root, query))
        .collect()
}
