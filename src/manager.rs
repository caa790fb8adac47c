//! Facade owning the current hierarchy snapshot.
//!
//! All mutation goes through [`HierarchyManager`]. Views returned by lookups
//! borrow the manager, so they cannot be held across a rebuild.

use std::collections::{HashMap, HashSet};

use anyhow::Result;

use crate::hierarchy::{
    self, Forest, HierarchyBuilder, HierarchyError, HierarchyNode, NodeId, NodeRef, SearchQuery,
    SortField,
};
use crate::{TagId, TagRecord, TagStore};

/// Configuration for hierarchy presentation.
///
/// Parsed from environment variables at call time with fallback defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HierarchyConfig {
    /// Separator placed between names in a node path (default `" > "`).
    pub path_separator: String,
    /// Nodes above this depth are expanded after every rebuild (default 1).
    pub initial_expand_level: usize,
}

impl Default for HierarchyConfig {
    fn default() -> Self {
        Self {
            path_separator: " > ".to_string(),
            initial_expand_level: 1,
        }
    }
}

impl HierarchyConfig {
    /// Parses configuration from environment variables.
    ///
    /// Falls back to defaults when env vars are not set or invalid.
    ///
    /// # Environment Variables
    ///
    /// - `TAGTREE_PATH_SEPARATOR` (string, default `" > "`)
    /// - `TAGTREE_EXPAND_LEVEL` (usize, default 1)
    ///
    /// # Examples
    ///
    /// ```
    /// use tagtree::HierarchyConfig;
    ///
    /// let config = HierarchyConfig::from_env();
    /// assert!(!config.path_separator.is_empty());
    /// ```
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let path_separator = std::env::var("TAGTREE_PATH_SEPARATOR")
            .ok()
            .filter(|s| !s.is_empty())
            .unwrap_or(defaults.path_separator);

        let initial_expand_level = std::env::var("TAGTREE_EXPAND_LEVEL")
            .ok()
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(defaults.initial_expand_level);

        Self {
            path_separator,
            initial_expand_level,
        }
    }
}

/// Notification emitted after a mutating operation completes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HierarchyEvent {
    Rebuilt { nodes: usize, warnings: usize },
    CountsUpdated,
    Reordered,
    ExpansionChanged,
    SelectionChanged(Option<TagId>),
}

/// Receives [`HierarchyEvent`]s. Correctness never depends on delivery.
///
/// Observers are `Sync` so a `&HierarchyManager` can be shared across threads
/// for read-only queries.
pub trait HierarchyObserver: Send + Sync {
    fn on_event(&self, event: &HierarchyEvent);
}

impl<F> HierarchyObserver for F
where
    F: Fn(&HierarchyEvent) + Send + Sync,
{
    fn on_event(&self, event: &HierarchyEvent) {
        self(event)
    }
}

/// Summary figures for the current snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HierarchyStats {
    pub nodes: usize,
    pub roots: usize,
    /// Deepest level present; 0 when only roots exist.
    pub max_depth: usize,
    /// Sum of all direct counts.
    pub documents: u64,
}

/// Owner of the forest, its index and the view state.
///
/// Mutating operations (`rebuild`, `update_counts`, sorting, expansion) need
/// `&mut self` and so are serialized by the borrow checker; read-only queries
/// can run side by side between mutations.
///
/// # Examples
///
/// ```
/// use tagtree::{HierarchyManager, TagRecord};
///
/// let mut manager = HierarchyManager::default();
/// let warnings = manager.rebuild(vec![
///     TagRecord::builder("1", "Root").build(),
///     TagRecord::builder("2", "Child").parent("1").build(),
/// ]);
/// assert!(warnings.is_empty());
///
/// let child = manager.find_node("2").unwrap();
/// assert_eq!(child.level(), 1);
/// assert_eq!(manager.path("2").unwrap(), "Root > Child");
/// ```
pub struct HierarchyManager {
    forest: Forest,
    config: HierarchyConfig,
    warnings: Vec<HierarchyError>,
    direct_counts: HashMap<TagId, u64>,
    observers: Vec<Box<dyn HierarchyObserver>>,
}

impl Default for HierarchyManager {
    fn default() -> Self {
        Self::new(HierarchyConfig::default())
    }
}

impl HierarchyManager {
    /// Creates a manager with an empty forest.
    pub fn new(config: HierarchyConfig) -> Self {
        Self {
            forest: Forest::new(),
            config,
            warnings: Vec::new(),
            direct_counts: HashMap::new(),
            observers: Vec::new(),
        }
    }

    pub fn config(&self) -> &HierarchyConfig {
        &self.config
    }

    /// Registers an observer for subsequent events.
    pub fn subscribe(&mut self, observer: impl HierarchyObserver + 'static) {
        self.observers.push(Box::new(observer));
    }

    fn notify(&self, event: HierarchyEvent) {
        for observer in &self.observers {
            observer.on_event(&event);
        }
    }

    /// Replaces the forest and index with ones built from `records`.
    ///
    /// The new forest is fully built before it replaces the old one. The last
    /// count map passed to [`update_counts`](Self::update_counts) is re-applied
    /// and nodes above the configured level are expanded. Returns the
    /// conditions the builder resolved.
    pub fn rebuild(&mut self, records: impl IntoIterator<Item = TagRecord>) -> &[HierarchyError] {
        let outcome = HierarchyBuilder::new().records(records).build();
        let mut forest = outcome.forest;

        hierarchy::update_counts(&mut forest, &self.direct_counts);
        hierarchy::expand_to_level(&mut forest, self.config.initial_expand_level);

        self.forest = forest;
        self.warnings = outcome.warnings;

        tracing::debug!(
            nodes = self.forest.len(),
            warnings = self.warnings.len(),
            "rebuilt hierarchy"
        );
        self.notify(HierarchyEvent::Rebuilt {
            nodes: self.forest.len(),
            warnings: self.warnings.len(),
        });
        &self.warnings
    }

    /// Conditions reported by the most recent rebuild.
    pub fn warnings(&self) -> &[HierarchyError] {
        &self.warnings
    }

    /// Sets direct counts and recomputes every total.
    ///
    /// Returns the number of entries that named unknown tags.
    pub fn update_counts(&mut self, direct_counts: HashMap<TagId, u64>) -> usize {
        self.direct_counts = direct_counts;
        let ignored = hierarchy::update_counts(&mut self.forest, &self.direct_counts);
        self.notify(HierarchyEvent::CountsUpdated);
        ignored
    }

    /// Fetches a fresh snapshot and counts from `store` and rebuilds.
    ///
    /// On a store failure the current forest is left untouched.
    pub fn refresh_from<S>(&mut self, store: &S) -> Result<&[HierarchyError]>
    where
        S: TagStore + ?Sized,
    {
        let records = store.fetch_all_tags()?;
        let counts = store.fetch_direct_counts()?;

        self.direct_counts = counts;
        Ok(self.rebuild(records))
    }

    pub fn forest(&self) -> &Forest {
        &self.forest
    }

    pub fn len(&self) -> usize {
        self.forest.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forest.is_empty()
    }

    /// Root nodes in display order.
    pub fn roots(&self) -> impl Iterator<Item = NodeRef<'_>> {
        self.forest.roots().iter().map(|&r| self.forest.view(r))
    }

    /// Snapshot of the `id -> node` index.
    pub fn index_snapshot(&self) -> HashMap<&TagId, NodeRef<'_>> {
        self.forest
            .index()
            .iter()
            .map(|(id, &handle)| (id, self.forest.view(handle)))
            .collect()
    }

    /// O(1) lookup by tag id.
    pub fn find_node(&self, id: &str) -> Option<NodeRef<'_>> {
        self.forest.get(id)
    }

    /// Lookup by tag id that reports unknown ids as [`HierarchyError::NotFound`].
    pub fn require_node(&self, id: &str) -> Result<NodeRef<'_>, HierarchyError> {
        self.find_node(id)
            .ok_or_else(|| HierarchyError::NotFound(TagId::new(id)))
    }

    fn handle(&self, id: &str) -> Result<NodeId, HierarchyError> {
        self.require_node(id).map(|node| node.handle())
    }

    /// Path of display names using the configured separator.
    pub fn path(&self, id: &str) -> Result<String, HierarchyError> {
        let node = self.require_node(id)?;
        Ok(node.path(&self.config.path_separator))
    }

    /// Roots whose subtree contains a match for `query`.
    pub fn search(&self, query: &str) -> Vec<NodeRef<'_>> {
        hierarchy::search_roots(&self.forest, &SearchQuery::new(query))
            .into_iter()
            .map(|handle| self.forest.view(handle))
            .collect()
    }

    /// Every node shown for `query`: matches plus their ancestors.
    pub fn search_visible(&self, query: &str) -> HashSet<NodeId> {
        hierarchy::match_set(&self.forest, &SearchQuery::new(query))
    }

    /// Expands the ancestors of every direct match so hits are on screen.
    ///
    /// Returns the number of direct matches.
    pub fn reveal_matches(&mut self, query: &str) -> usize {
        let query = SearchQuery::new(query);
        if query.is_unconstrained() {
            return 0;
        }

        let matches = hierarchy::direct_matches(&self.forest, &query);
        for &handle in &matches {
            hierarchy::reveal(&mut self.forest, handle);
        }
        self.notify(HierarchyEvent::ExpansionChanged);
        matches.len()
    }

    /// Orders every sibling list by display name.
    pub fn sort_all(&mut self) {
        self.sort_by_field(SortField::Name);
    }

    /// Orders every sibling list by one of the built-in presets.
    pub fn sort_by_field(&mut self, field: SortField) {
        field.apply(&mut self.forest);
        self.notify(HierarchyEvent::Reordered);
    }

    /// Orders every sibling list by a caller-supplied key; ties fall back to the id.
    pub fn sort_all_by<K, F>(&mut self, key: F)
    where
        K: Ord,
        F: FnMut(&HierarchyNode) -> K,
    {
        hierarchy::sort_siblings_by(&mut self.forest, key);
        self.notify(HierarchyEvent::Reordered);
    }

    /// Expands every node with `level < max_level`; returns how many changed.
    pub fn expand_to_level(&mut self, max_level: usize) -> usize {
        let changed = hierarchy::expand_to_level(&mut self.forest, max_level);
        self.notify(HierarchyEvent::ExpansionChanged);
        changed
    }

    /// Collapses root nodes only.
    pub fn collapse_roots(&mut self) {
        hierarchy::collapse_roots(&mut self.forest);
        self.notify(HierarchyEvent::ExpansionChanged);
    }

    pub fn collapse_all(&mut self) {
        hierarchy::collapse_all(&mut self.forest);
        self.notify(HierarchyEvent::ExpansionChanged);
    }

    /// Flips one node's expansion flag and returns the new state.
    pub fn toggle_expanded(&mut self, id: &str) -> Result<bool, HierarchyError> {
        let handle = self.handle(id)?;
        let expanded = hierarchy::toggle(&mut self.forest, handle);
        self.notify(HierarchyEvent::ExpansionChanged);
        Ok(expanded)
    }

    /// Expands every ancestor of a node.
    pub fn reveal(&mut self, id: &str) -> Result<(), HierarchyError> {
        let handle = self.handle(id)?;
        hierarchy::reveal(&mut self.forest, handle);
        self.notify(HierarchyEvent::ExpansionChanged);
        Ok(())
    }

    /// Marks a single node as selected, clearing any previous selection.
    pub fn select(&mut self, id: &str) -> Result<(), HierarchyError> {
        let handle = self.handle(id)?;
        self.clear_selected_flags();
        self.forest[handle].set_selected(true);
        self.notify(HierarchyEvent::SelectionChanged(Some(TagId::new(id))));
        Ok(())
    }

    pub fn clear_selection(&mut self) {
        self.clear_selected_flags();
        self.notify(HierarchyEvent::SelectionChanged(None));
    }

    fn clear_selected_flags(&mut self) {
        let selected: Vec<NodeId> = self
            .forest
            .nodes()
            .filter(|(_, node)| node.is_selected())
            .map(|(handle, _)| handle)
            .collect();
        for handle in selected {
            self.forest[handle].set_selected(false);
        }
    }

    /// The selected node, if any.
    pub fn selected(&self) -> Option<NodeRef<'_>> {
        self.forest
            .nodes()
            .find(|(_, node)| node.is_selected())
            .map(|(handle, _)| self.forest.view(handle))
    }

    /// Display rows `(node, level)` honouring expansion and an optional filter.
    pub fn visible_rows(&self, filter: Option<&HashSet<NodeId>>) -> Vec<(NodeRef<'_>, usize)> {
        hierarchy::visible_rows(&self.forest, filter)
            .into_iter()
            .map(|(handle, level)| (self.forest.view(handle), level))
            .collect()
    }

    pub fn stats(&self) -> HierarchyStats {
        let mut max_depth = 0;
        let mut stack: Vec<(NodeId, usize)> =
            self.forest.roots().iter().map(|&r| (r, 0)).collect();
        while let Some((handle, level)) = stack.pop() {
            max_depth = max_depth.max(level);
            stack.extend(self.forest.children(handle).iter().map(|&c| (c, level + 1)));
        }

        HierarchyStats {
            nodes: self.forest.len(),
            roots: self.forest.roots().len(),
            max_depth,
            documents: self
                .forest
                .nodes()
                .map(|(_, node)| node.direct_count())
                .fold(0, u64::saturating_add),
        }
    }
}
