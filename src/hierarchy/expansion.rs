//! Bulk expansion state and flattening into display rows.

use std::collections::HashSet;

use super::forest::Forest;
use super::node::NodeId;

/// Expands every node with `level < max_level`.
///
/// Deeper nodes keep whatever state they had. Returns how many nodes changed.
pub fn expand_to_level(forest: &mut Forest, max_level: usize) -> usize {
    if max_level == 0 {
        return 0;
    }

    let mut changed = 0;
    let mut stack: Vec<(NodeId, usize)> = forest.roots().iter().map(|&r| (r, 0)).collect();
    while let Some((id, level)) = stack.pop() {
        let node = &mut forest[id];
        if !node.expanded {
            node.expanded = true;
            changed += 1;
        }
        if level + 1 < max_level {
            stack.extend(forest.children(id).iter().map(|&c| (c, level + 1)));
        }
    }
    changed
}

/// Collapses the root nodes only; descendants keep their flags.
pub fn collapse_roots(forest: &mut Forest) {
    let roots = forest.roots().to_vec();
    for root in roots {
        forest[root].expanded = false;
    }
}

/// Collapses every node.
pub fn collapse_all(forest: &mut Forest) {
    for node in forest.nodes_mut() {
        node.expanded = false;
    }
}

/// Expands every ancestor of `id` so the node becomes visible.
pub fn reveal(forest: &mut Forest, id: NodeId) {
    let ancestors: Vec<NodeId> = forest.ancestors(id).collect();
    for ancestor in ancestors {
        forest[ancestor].expanded = true;
    }
}

/// Flips the expansion flag of one node and returns the new state.
pub fn toggle(forest: &mut Forest, id: NodeId) -> bool {
    let node = &mut forest[id];
    node.expanded = !node.expanded;
    node.expanded
}

/// Flattens the forest into `(node, level)` rows in display order.
///
/// Children are listed only below expanded nodes. With a `filter`, nodes
/// outside the set are skipped along with their subtrees.
pub fn visible_rows(forest: &Forest, filter: Option<&HashSet<NodeId>>) -> Vec<(NodeId, usize)> {
    let allowed = |id: &NodeId| filter.is_none_or(|set| set.contains(id));

    let mut rows = Vec::new();
    let mut stack: Vec<(NodeId, usize)> = forest
        .roots()
        .iter()
        .rev()
        .filter(|&&r| allowed(&r))
        .map(|&r| (r, 0))
        .collect();

    while let Some((id, level)) = stack.pop() {
        rows.push((id, level));
        if forest[id].is_expanded() {
            stack.extend(
                forest
                    .children(id)
                    .iter()
                    .rev()
                    .filter(|&&c| allowed(&c))
                    .map(|&c| (c, level + 1)),
            );
        }
    }
    rows
}
