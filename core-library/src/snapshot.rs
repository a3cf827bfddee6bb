//! Catalog snapshots
//!
//! A [`CatalogSnapshot`] is one immutable generation of the materialized
//! catalog: the ordered item collection of every kind plus the source maps of
//! the tracked kinds. Snapshots are never mutated once built. Changes go
//! through [`SnapshotBuilder`], which shares every untouched collection with
//! the base snapshot through its `Arc`.

use std::collections::HashSet;
use std::sync::Arc;

use crate::filter::filter_by_providers;
use crate::models::{MediaItem, MediaKind};
use crate::sources::SourceMap;

const KIND_COUNT: usize = MediaKind::ALL.len();

fn slot(kind: MediaKind) -> usize {
    kind as usize
}

/// One published generation of the catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogSnapshot {
    generation: u64,
    collections: [Arc<Vec<MediaItem>>; KIND_COUNT],
    sources: [Arc<SourceMap>; KIND_COUNT],
}

impl Default for CatalogSnapshot {
    fn default() -> Self {
        Self::empty()
    }
}

impl CatalogSnapshot {
    /// Generation zero: nothing cached, nothing tracked.
    pub fn empty() -> Self {
        Self {
            generation: 0,
            collections: std::array::from_fn(|_| Arc::new(Vec::new())),
            sources: std::array::from_fn(|_| Arc::new(SourceMap::new())),
        }
    }

    /// Start a new generation sharing this one's collections.
    pub fn to_builder(&self) -> SnapshotBuilder {
        SnapshotBuilder {
            collections: self.collections.clone(),
            sources: self.sources.clone(),
        }
    }

    /// Monotonic counter assigned on publish; `0` before the first publish.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub(crate) fn with_generation(mut self, generation: u64) -> Self {
        self.generation = generation;
        self
    }

    pub fn items(&self, kind: MediaKind) -> &[MediaItem] {
        &self.collections[slot(kind)]
    }

    /// Shared handle to a collection, for callers that outlive the snapshot borrow.
    pub fn items_arc(&self, kind: MediaKind) -> Arc<Vec<MediaItem>> {
        Arc::clone(&self.collections[slot(kind)])
    }

    /// Source map of `kind`; always empty for kinds that are not tracked.
    pub fn sources(&self, kind: MediaKind) -> &SourceMap {
        &self.sources[slot(kind)]
    }

    pub fn is_empty(&self, kind: MediaKind) -> bool {
        self.collections[slot(kind)].is_empty()
    }

    /// Whether every source-tracked kind holds at least one item.
    pub fn has_all_tracked(&self) -> bool {
        MediaKind::TRACKED.iter().all(|kind| !self.is_empty(*kind))
    }

    pub fn total_items(&self) -> usize {
        self.collections.iter().map(|items| items.len()).sum()
    }

    /// Items of `kind` visible under the provider selection `enabled`.
    ///
    /// Kinds without source tracking ignore the selection.
    pub fn filtered(&self, kind: MediaKind, enabled: &HashSet<String>) -> Vec<MediaItem> {
        let items = self.items(kind);
        if !kind.is_source_tracked() {
            return items.to_vec();
        }
        filter_by_providers(items, self.sources(kind), enabled)
            .into_iter()
            .cloned()
            .collect()
    }
}

/// Assembles the next [`CatalogSnapshot`].
#[derive(Debug, Clone)]
pub struct SnapshotBuilder {
    collections: [Arc<Vec<MediaItem>>; KIND_COUNT],
    sources: [Arc<SourceMap>; KIND_COUNT],
}

impl Default for SnapshotBuilder {
    fn default() -> Self {
        CatalogSnapshot::empty().to_builder()
    }
}

impl SnapshotBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(mut self, kind: MediaKind, items: Vec<MediaItem>) -> Self {
        self.collections[slot(kind)] = Arc::new(items);
        self
    }

    /// Set the source map of `kind`. Ignored for kinds that are not tracked.
    pub fn sources(mut self, kind: MediaKind, sources: SourceMap) -> Self {
        if kind.is_source_tracked() {
            self.sources[slot(kind)] = Arc::new(sources);
        }
        self
    }

    pub fn build(self) -> CatalogSnapshot {
        CatalogSnapshot {
            generation: 0,
            collections: self.collections,
            sources: self.sources,
        }
    }
}
