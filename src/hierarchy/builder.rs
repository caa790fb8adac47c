//! Two-pass construction of a forest from flat, parent-referencing records.

use super::forest::Forest;
use super::node::{HierarchyNode, NodeId};
use super::{HierarchyError, sort};
use crate::TagRecord;

/// A freshly built forest together with the conditions resolved while building it.
#[derive(Debug, Clone, Default)]
pub struct BuildOutcome {
    pub forest: Forest,
    pub warnings: Vec<HierarchyError>,
}

/// Builder turning a snapshot of tag records into a validated forest.
///
/// Input order does not matter for correctness. Malformed entries never fail
/// the build:
/// - duplicate ids: last record wins, keeping the first record's position
/// - dangling parent ids: the record becomes a root
/// - records on a parent cycle: every record on the cycle becomes a root
///
/// Each of these is reported in [`BuildOutcome::warnings`].
///
/// # Examples
///
/// ```
/// use tagtree::{HierarchyBuilder, TagRecord};
///
/// let outcome = HierarchyBuilder::new()
///     .record(TagRecord::builder("1", "Root").build())
///     .record(TagRecord::builder("2", "Child").parent("1").build())
///     .build();
///
/// assert!(outcome.warnings.is_empty());
/// assert_eq!(outcome.forest.roots().len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct HierarchyBuilder {
    records: Vec<TagRecord>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Visit {
    New,
    OnPath,
    Done,
}

impl HierarchyBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one record to the snapshot.
    pub fn record(mut self, record: TagRecord) -> Self {
        self.records.push(record);
        self
    }

    /// Adds many records to the snapshot.
    pub fn records(mut self, records: impl IntoIterator<Item = TagRecord>) -> Self {
        self.records.extend(records);
        self
    }

    /// Builds the forest. Siblings come out ordered by display name.
    pub fn build(self) -> BuildOutcome {
        let mut forest = Forest::new();
        let mut warnings = Vec::new();

        // Pass 1: one node per distinct id.
        for record in self.records {
            match forest.index.get(&record.id).copied() {
                Some(existing) => {
                    tracing::warn!(id = %record.id, "duplicate tag id; later record wins");
                    warnings.push(HierarchyError::DuplicateIdentity {
                        id: record.id.clone(),
                    });
                    forest[existing].record = record;
                }
                None => {
                    let id = record.id.clone();
                    let handle = forest.push(HierarchyNode::new(record));
                    forest.index.insert(id, handle);
                }
            }
        }

        // Pass 2: resolve parents, demoting dangling and cyclic entries.
        let declared: Vec<Option<NodeId>> = forest
            .nodes
            .iter()
            .map(|node| {
                node.record
                    .parent()
                    .and_then(|parent| forest.lookup(parent.as_str()))
            })
            .collect();
        let on_cycle = cycle_members(&declared);

        for (i, parent) in declared.iter().enumerate() {
            let handle = NodeId(i);
            let Some(parent_id) = forest[handle].record.parent().cloned() else {
                forest.roots.push(handle);
                continue;
            };
            let id = forest[handle].id().clone();

            match parent {
                None => {
                    tracing::warn!(%id, %parent_id, "dangling parent reference; treating tag as root");
                    warnings.push(HierarchyError::DanglingParentReference { id, parent_id });
                    forest.roots.push(handle);
                }
                Some(_) if on_cycle[i] => {
                    tracing::warn!(%id, %parent_id, "parent cycle detected; treating tag as root");
                    warnings.push(HierarchyError::CycleDetected { id, parent_id });
                    forest.roots.push(handle);
                }
                Some(parent) => {
                    forest[handle].parent = Some(*parent);
                    forest[*parent].children.push(handle);
                }
            }
        }

        sort::sort_by_display_name(&mut forest);

        tracing::debug!(
            nodes = forest.len(),
            roots = forest.roots.len(),
            warnings = warnings.len(),
            "built tag hierarchy"
        );

        BuildOutcome { forest, warnings }
    }
}

/// Marks every node that lies on a cycle of the declared parent graph.
///
/// Each node has at most one declared parent, so following parent links from
/// any node either ends, joins an already explored chain, or loops back onto
/// the chain being walked.
fn cycle_members(declared: &[Option<NodeId>]) -> Vec<bool> {
    let mut state = vec![Visit::New; declared.len()];
    let mut on_cycle = vec![false; declared.len()];
    let mut chain = Vec::new();

    for start in 0..declared.len() {
        let mut current = Some(start);
        while let Some(i) = current {
            match state[i] {
                Visit::New => {
                    state[i] = Visit::OnPath;
                    chain.push(i);
                    current = declared[i].map(NodeId::index);
                }
                Visit::OnPath => {
                    if let Some(pos) = chain.iter().position(|&c| c == i) {
                        for &member in &chain[pos..] {
                            on_cycle[member] = true;
                        }
                    }
                    break;
                }
                Visit::Done => break,
            }
        }
        for i in chain.drain(..) {
            state[i] = Visit::Done;
        }
    }

    on_cycle
}
