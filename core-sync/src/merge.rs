//! Merging fetched items into the next catalog generation
//!
//! Pure functions over owned values: nothing here touches the live cache.
//!
//! ## Full sync
//!
//! The fetched items become the collection and all attribution is dropped.
//!
//! ## Scoped sync
//!
//! 1. Previous entries whose providers are all outside the scope are copied
//!    unchanged. Entries naming a scoped provider start over.
//! 2. Each scoped provider's items are folded in, in scope order. A later
//!    provider overwrites the fields of an item an earlier one returned, but
//!    the item keeps the position where it first appeared.
//! 3. Previous items that were not fetched again stay if their attribution
//!    was carried over in step 1, or if they were never attributed to
//!    anyone. Items that any scoped provider vouched for are replaced
//!    wholesale by what the scoped fetches returned.

use std::collections::{HashMap, HashSet};

use core_library::{dedup_by_id, MediaItem, SourceMap};

/// Next generation of one tracked kind.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct MergedKind {
    pub items: Vec<MediaItem>,
    pub sources: SourceMap,
}

/// Items returned by one scoped fetch.
#[derive(Debug, Clone)]
pub struct ProviderBatch {
    pub provider: String,
    pub items: Vec<MediaItem>,
}

/// Normalize a caller scope: order kept, duplicates and blanks dropped.
pub fn normalize_scope(scoped_providers: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut normalized = Vec::with_capacity(scoped_providers.len());
    for provider in scoped_providers {
        if !provider.trim().is_empty() && seen.insert(provider.as_str()) {
            normalized.push(provider.clone());
        }
    }
    normalized
}

/// Result of an unscoped fetch: authoritative, untracked.
pub fn merge_full(fetched: Vec<MediaItem>) -> MergedKind {
    MergedKind {
        items: dedup_by_id(fetched),
        sources: SourceMap::new(),
    }
}

/// Fold scoped batches into the previous generation of one kind.
pub fn merge_scoped(
    previous_items: &[MediaItem],
    previous_sources: &SourceMap,
    scope: &[String],
    batches: Vec<ProviderBatch>,
) -> MergedKind {
    let scope_set: HashSet<String> = scope.iter().cloned().collect();
    let mut sources = previous_sources.carry_forward(&scope_set);

    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut items: Vec<MediaItem> = Vec::new();

    for batch in batches {
        for item in batch.items {
            sources.vouch(&item.item_id, &batch.provider);
            match positions.get(&item.item_id) {
                Some(&index) => items[index] = item,
                None => {
                    positions.insert(item.item_id.clone(), items.len());
                    items.push(item);
                }
            }
        }
    }

    for item in previous_items {
        if positions.contains_key(&item.item_id) {
            continue;
        }
        let carried = sources.is_tracked(&item.item_id);
        let untracked = !previous_sources.is_tracked(&item.item_id);
        if carried || untracked {
            positions.insert(item.item_id.clone(), items.len());
            items.push(item.clone());
        }
    }

    sources.retain_ids(|id| positions.contains_key(id));

    MergedKind { items, sources }
}
