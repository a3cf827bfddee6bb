//! Provider filtering
//!
//! Filtering is strict: with any provider selected, an item is shown only if
//! source tracking attributes it to a selected provider. Untracked items are
//! hidden rather than guessed at.

use std::collections::HashSet;

use crate::models::MediaItem;
use crate::sources::SourceMap;

/// Items visible under `enabled`. An empty selection means "all providers".
pub fn filter_by_providers<'a>(
    items: &'a [MediaItem],
    sources: &SourceMap,
    enabled: &HashSet<String>,
) -> Vec<&'a MediaItem> {
    items
        .iter()
        .filter(|item| is_visible(&item.item_id, sources, enabled))
        .collect()
}

/// Whether one item passes the selection.
pub fn is_visible(item_id: &str, sources: &SourceMap, enabled: &HashSet<String>) -> bool {
    enabled.is_empty() || sources.intersects(item_id, enabled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MediaKind;

    fn items(ids: &[&str]) -> Vec<MediaItem> {
        ids.iter()
            .map(|id| MediaItem::new(MediaKind::Album, *id, "p", *id))
            .collect()
    }

    fn set(ids: &[&str]) -> HashSet<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_empty_selection_shows_everything() {
        let items = items(&["a", "b"]);
        let visible = filter_by_providers(&items, &SourceMap::new(), &HashSet::new());
        assert_eq!(visible.len(), 2);
    }

    #[test]
    fn test_untracked_items_are_hidden() {
        let items = items(&["tracked", "untracked"]);
        let mut sources = SourceMap::new();
        sources.vouch("tracked", "P1");

        let visible = filter_by_providers(&items, &sources, &set(&["P1"]));
        let ids: Vec<_> = visible.iter().map(|i| i.item_id.as_str()).collect();
        assert_eq!(ids, vec!["tracked"]);
        assert!(!is_visible("untracked", &sources, &set(&["P1"])));
    }

    #[test]
    fn test_order_is_preserved() {
        let items = items(&["c", "a", "b"]);
        let mut sources = SourceMap::new();
        sources.vouch("c", "P2");
        sources.vouch("a", "P1");
        sources.vouch("b", "P2");

        let visible = filter_by_providers(&items, &sources, &set(&["P2"]));
        let ids: Vec<_> = visible.iter().map(|i| i.item_id.as_str()).collect();
        assert_eq!(ids, vec!["c", "b"]);
    }
}
