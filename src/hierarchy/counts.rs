//! Roll-up of externally supplied counts.

use std::collections::HashMap;

use super::forest::Forest;
use super::node::NodeId;
use crate::TagId;

/// Sets direct counts from `direct` and recomputes every total bottom-up.
///
/// Tags missing from `direct` get 0. Entries for unknown tags are ignored;
/// their number is returned. Running it twice with the same map gives the
/// same totals.
pub fn update_counts(forest: &mut Forest, direct: &HashMap<TagId, u64>) -> usize {
    for node in forest.nodes_mut() {
        node.direct_count = direct.get(node.id()).copied().unwrap_or(0);
    }

    // Children follow their parent in pre-order, so the reverse visits them first.
    let order: Vec<NodeId> = forest.walk().collect();
    for &id in order.iter().rev() {
        let from_children: u64 = forest
            .children(id)
            .iter()
            .map(|&child| forest[child].total_count)
            .fold(0, u64::saturating_add);
        let node = &mut forest[id];
        node.total_count = node.direct_count.saturating_add(from_children);
    }

    let ignored = direct
        .keys()
        .filter(|id| forest.lookup(id.as_str()).is_none())
        .count();
    if ignored > 0 {
        tracing::debug!(ignored, "ignored counts for unknown tags");
    }
    ignored
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{HierarchyBuilder, TagRecord};

    fn chain() -> Forest {
        HierarchyBuilder::new()
            .record(TagRecord::builder("1", "Root").build())
            .record(TagRecord::builder("2", "Child").parent("1").build())
            .record(TagRecord::builder("3", "Grandchild").parent("2").build())
            .record(TagRecord::builder("4", "Sibling").parent("1").build())
            .build()
            .forest
    }

    fn counts(entries: &[(&str, u64)]) -> HashMap<TagId, u64> {
        entries
            .iter()
            .map(|&(id, n)| (TagId::new(id), n))
            .collect()
    }

    fn totals(forest: &Forest) -> Vec<(String, u64, u64)> {
        let mut rows: Vec<_> = forest
            .nodes()
            .map(|(_, n)| (n.id().to_string(), n.direct_count(), n.total_count()))
            .collect();
        rows.sort();
        rows
    }

    #[test]
    fn totals_roll_up_through_ancestors() {
        let mut forest = chain();
        update_counts(&mut forest, &counts(&[("3", 5), ("4", 2), ("1", 1)]));

        assert_eq!(
            totals(&forest),
            vec![
                ("1".to_string(), 1, 8),
                ("2".to_string(), 0, 5),
                ("3".to_string(), 5, 5),
                ("4".to_string(), 2, 2),
            ]
        );
    }

    #[test]
    fn empty_map_zeroes_everything() {
        let mut forest = chain();
        update_counts(&mut forest, &counts(&[("3", 5)]));
        update_counts(&mut forest, &HashMap::new());

        assert!(
            forest
                .nodes()
                .all(|(_, n)| n.direct_count() == 0 && n.total_count() == 0)
        );
    }

    #[test]
    fn repeated_updates_are_idempotent() {
        let mut forest = chain();
        let map = counts(&[("2", 3), ("3", 4)]);

        update_counts(&mut forest, &map);
        let first = totals(&forest);
        update_counts(&mut forest, &map);
        assert_eq!(totals(&forest), first);
    }

    #[test]
    fn huge_counts_saturate_instead_of_overflowing() {
        let mut forest = chain();
        update_counts(
            &mut forest,
            &counts(&[("3", u64::MAX), ("4", u64::MAX), ("1", 1)]),
        );

        assert_eq!(forest.get("1").unwrap().total_count(), u64::MAX);
        assert_eq!(forest.get("2").unwrap().total_count(), u64::MAX);
    }

    #[test]
    fn unknown_ids_are_ignored_and_reported() {
        let mut forest = chain();
        let ignored = update_counts(&mut forest, &counts(&[("3", 1), ("ghost", 9)]));

        assert_eq!(ignored, 1);
        assert_eq!(forest.get("1").unwrap().total_count(), 1);
    }
}
