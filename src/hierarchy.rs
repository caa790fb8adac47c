//! In-memory tag hierarchy: construction, roll-up counts, search, ordering and
//! expansion state.
//!
//! Nodes live in a [`Forest`] arena and refer to each other by [`NodeId`]
//! handles. The forest is always acyclic and every indexed node is reachable
//! from exactly one place: the root list or a single parent's children.
//!
//! # Examples
//!
//! ```
//! use std::collections::HashMap;
//!
//! use tagtree::hierarchy::{HierarchyBuilder, SearchQuery, search_roots, update_counts};
//! use tagtree::{TagId, TagRecord};
//!
//! let mut forest = HierarchyBuilder::new()
//!     .record(TagRecord::builder("1", "Root").build())
//!     .record(TagRecord::builder("2", "Child").parent("1").build())
//!     .record(TagRecord::builder("3", "Grandchild").parent("2").build())
//!     .build()
//!     .forest;
//!
//! let counts = HashMap::from([(TagId::new("3"), 5)]);
//! update_counts(&mut forest, &counts);
//!
//! let root = forest.get("1").unwrap();
//! assert_eq!(root.total_count(), 5);
//! assert_eq!(forest.get("3").unwrap().path(" > "), "Root > Child > Grandchild");
//!
//! let hits = search_roots(&forest, &SearchQuery::new("grand"));
//! assert_eq!(hits, vec![root.handle()]);
//! ```

mod builder;
mod counts;
mod error;
mod expansion;
mod forest;
mod node;
mod search;
mod sort;

pub use builder::{BuildOutcome, HierarchyBuilder};
pub use counts::update_counts;
pub use error::HierarchyError;
pub use expansion::{collapse_all, collapse_roots, expand_to_level, reveal, toggle, visible_rows};
pub use forest::{Ancestors, Descendants, Forest};
pub use node::{HierarchyNode, NodeId, NodeRef};
pub use search::{SearchQuery, direct_matches, match_set, search_roots, subtree_matches};
pub use sort::{SortField, display_name_key, sort_by_display_name, sort_siblings_by};
