//! Hierarchical tag taxonomy: build a tree from flat parent-referencing tag
//! records, roll up document counts, search, sort and track expansion state.
//!
//! The [`hierarchy`] module holds the in-memory engine, [`HierarchyManager`]
//! is the facade callers use, and [`TagService`] is a SQLite-backed
//! [`TagStore`] feeding it snapshots.

pub mod db;
pub mod hierarchy;
pub mod manager;
pub mod models;
pub mod service;
pub mod store;
pub mod utils;

pub use db::Database;
pub use hierarchy::{
    BuildOutcome, Forest, HierarchyBuilder, HierarchyError, HierarchyNode, NodeId, NodeRef,
    SearchQuery, SortField,
};
pub use manager::{
    HierarchyConfig, HierarchyEvent, HierarchyManager, HierarchyObserver, HierarchyStats,
};
pub use models::{
    DocumentId, ParseTagTypeError, TagId, TagMetadata, TagRecord, TagRecordBuilder, TagType,
};
pub use service::{TagService, TagValidationError};
pub use store::TagStore;
