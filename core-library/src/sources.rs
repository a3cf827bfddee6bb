//! Source tracking
//!
//! Records, per item id, which provider instances vouched for the item during
//! a completed sync. An id with no entry is *untracked*; the filter engine
//! hides untracked items whenever a provider filter is active.
//!
//! Sets are never stored empty: removing the last provider removes the entry.

use std::collections::{BTreeSet, HashMap, HashSet};

/// Provider instance ids attributed to one item, kept sorted for stable
/// persistence and logging.
pub type ProviderSet = BTreeSet<String>;

/// `item_id -> providers` for one media kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceMap {
    entries: HashMap<String, ProviderSet>,
}

impl SourceMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attribute `item_id` to `provider`. Returns `false` if it already was.
    pub fn vouch(&mut self, item_id: &str, provider: &str) -> bool {
        self.entries
            .entry(item_id.to_string())
            .or_default()
            .insert(provider.to_string())
    }

    /// Attribute `item_id` to every provider in `providers`.
    ///
    /// An empty iterator leaves the item untracked.
    pub fn vouch_all<I, S>(&mut self, item_id: &str, providers: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for provider in providers {
            self.vouch(item_id, provider.as_ref());
        }
    }

    /// Replace the attribution of `item_id`; an empty list untracks it.
    pub fn replace<I, S>(&mut self, item_id: &str, providers: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let set: ProviderSet = providers.into_iter().map(Into::into).collect();
        if set.is_empty() {
            self.entries.remove(item_id);
        } else {
            self.entries.insert(item_id.to_string(), set);
        }
    }

    pub fn get(&self, item_id: &str) -> Option<&ProviderSet> {
        self.entries.get(item_id)
    }

    pub fn is_tracked(&self, item_id: &str) -> bool {
        self.entries.contains_key(item_id)
    }

    /// Provider ids for persistence; empty when untracked.
    pub fn providers_for(&self, item_id: &str) -> Vec<String> {
        self.entries
            .get(item_id)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Whether any provider vouching for `item_id` is in `enabled`.
    pub fn intersects(&self, item_id: &str, enabled: &HashSet<String>) -> bool {
        self.entries
            .get(item_id)
            .is_some_and(|set| set.iter().any(|p| enabled.contains(p)))
    }

    pub fn remove(&mut self, item_id: &str) -> Option<ProviderSet> {
        self.entries.remove(item_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ProviderSet)> {
        self.entries.iter()
    }

    /// Attribution that survives a sync scoped to `scope`.
    ///
    /// Only entries disjoint from the scope come through, unchanged. An entry
    /// naming any scoped provider is dropped whole and must be rebuilt by the
    /// scoped fetch.
    pub fn carry_forward(&self, scope: &HashSet<String>) -> SourceMap {
        let entries = self
            .entries
            .iter()
            .filter(|(_, providers)| providers.iter().all(|p| !scope.contains(p)))
            .map(|(item_id, providers)| (item_id.clone(), providers.clone()))
            .collect();
        SourceMap { entries }
    }

    /// Keep only entries whose id satisfies `keep`.
    pub fn retain_ids<F>(&mut self, mut keep: F)
    where
        F: FnMut(&str) -> bool,
    {
        self.entries.retain(|item_id, _| keep(item_id));
    }
}

impl<K, S> FromIterator<(K, S)> for SourceMap
where
    K: Into<String>,
    S: IntoIterator,
    S::Item: Into<String>,
{
    fn from_iter<T: IntoIterator<Item = (K, S)>>(iter: T) -> Self {
        let mut map = SourceMap::new();
        for (item_id, providers) in iter {
            let item_id: String = item_id.into();
            let set: ProviderSet = providers.into_iter().map(Into::into).collect();
            if !set.is_empty() {
                map.entries.insert(item_id, set);
            }
        }
        map
    }
}
