//! Deterministic sibling ordering.
//!
//! Sorting rearranges sibling lists in place and never changes membership.
//! Every key is extended with the tag id so equal keys still order the same
//! way on every run.

use std::cmp::Reverse;
use std::fmt;
use std::str::FromStr;

use super::forest::Forest;
use super::node::{HierarchyNode, NodeId};

/// Built-in ordering presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortField {
    /// Display name, case-insensitive first and raw text as tie break.
    #[default]
    Name,
    /// Tag type name (`client`, `priority`, ...) alphabetically, then name.
    Type,
    /// Largest total count first, then name.
    TotalCount,
}

impl SortField {
    /// Applies this ordering to every sibling list of the forest.
    pub fn apply(self, forest: &mut Forest) {
        match self {
            Self::Name => sort_siblings_by(forest, display_name_key),
            Self::Type => sort_siblings_by(forest, |node| {
                (node.record().tag_type.as_str(), display_name_key(node))
            }),
            Self::TotalCount => sort_siblings_by(forest, |node| {
                (Reverse(node.total_count()), display_name_key(node))
            }),
        }
    }
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Name => "name",
            Self::Type => "type",
            Self::TotalCount => "count",
        };
        write!(f, "{name}")
    }
}

impl FromStr for SortField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name" => Ok(Self::Name),
            "type" => Ok(Self::Type),
            "count" => Ok(Self::TotalCount),
            other => Err(format!("unknown sort field: {other}")),
        }
    }
}

/// Default key: lowercase display name, then the raw display name.
pub fn display_name_key(node: &HierarchyNode) -> (String, String) {
    let name = node.display_name();
    (name.to_lowercase(), name.to_string())
}

/// Orders every sibling list, including the root list, by display name.
pub fn sort_by_display_name(forest: &mut Forest) {
    sort_siblings_by(forest, display_name_key);
}

/// Orders every sibling list, including the root list, by a caller-supplied key.
///
/// Ties on the key fall back to the tag id.
pub fn sort_siblings_by<K, F>(forest: &mut Forest, mut key: F)
where
    K: Ord,
    F: FnMut(&HierarchyNode) -> K,
{
    let mut roots = std::mem::take(&mut forest.roots);
    sort_list(&forest.nodes, &mut roots, &mut key);
    forest.roots = roots;

    for i in 0..forest.nodes.len() {
        if forest.nodes[i].children.len() < 2 {
            continue;
        }
        let mut children = std::mem::take(&mut forest.nodes[i].children);
        sort_list(&forest.nodes, &mut children, &mut key);
        forest.nodes[i].children = children;
    }
}

fn sort_list<K, F>(nodes: &[HierarchyNode], list: &mut [NodeId], key: &mut F)
where
    K: Ord,
    F: FnMut(&HierarchyNode) -> K,
{
    list.sort_by_cached_key(|&id| {
        let node = &nodes[id.index()];
        (key(node), node.id().clone())
    });
}
