//! Store access for the catalog
//!
//! Translates between the [`CatalogStore`] row format (serialized payloads
//! plus provider id lists) and decoded [`MediaItem`] collections with their
//! [`SourceMap`].

use std::sync::Arc;
use std::time::Duration;

use bridge_traits::catalog::{CatalogStore, UpsertRow};
use tracing::{debug, instrument, warn};

use crate::error::Result;
use crate::models::{dedup_by_id, MediaItem, MediaKind};
use crate::sources::SourceMap;

/// One kind as read back from the store.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct LoadedKind {
    pub items: Vec<MediaItem>,
    pub sources: SourceMap,
    /// Rows dropped because their payload did not decode
    pub skipped: usize,
}

#[derive(Clone)]
pub struct CatalogRepository {
    store: Arc<dyn CatalogStore>,
}

impl CatalogRepository {
    pub fn new(store: Arc<dyn CatalogStore>) -> Self {
        Self { store }
    }

    /// Read and decode every cached row of `kind`.
    ///
    /// Duplicate rows collapse onto the first position with the last row's
    /// payload and attribution.
    #[instrument(skip(self), fields(kind = %kind))]
    pub async fn load(&self, kind: MediaKind) -> Result<LoadedKind> {
        let mut loaded = LoadedKind::default();
        let mut decoded = Vec::new();

        if kind.is_source_tracked() {
            for row in self.store.get_cached_items_with_providers(kind).await? {
                match MediaItem::decode_str(kind, &row.payload) {
                    Ok(item) => {
                        loaded.sources.replace(&item.item_id, row.provider_ids);
                        decoded.push(item);
                    }
                    Err(e) => {
                        warn!(error = %e, "Skipping undecodable cached row");
                        loaded.skipped += 1;
                    }
                }
            }
        } else {
            for payload in self.store.get_cached_items(kind).await? {
                match MediaItem::decode_str(kind, &payload) {
                    Ok(item) => decoded.push(item),
                    Err(e) => {
                        warn!(error = %e, "Skipping undecodable cached row");
                        loaded.skipped += 1;
                    }
                }
            }
        }

        loaded.items = dedup_by_id(decoded);
        debug!(
            items = loaded.items.len(),
            tracked = loaded.sources.len(),
            skipped = loaded.skipped,
            "Loaded cached kind"
        );
        Ok(loaded)
    }

    /// Replace the stored rows of `kind` and record a successful sync.
    #[instrument(skip(self, items, sources), fields(kind = %kind, count = items.len()))]
    pub async fn save(
        &self,
        kind: MediaKind,
        items: &[MediaItem],
        sources: &SourceMap,
    ) -> Result<()> {
        self.rewrite(kind, items, sources).await?;
        self.store.update_sync_metadata(kind, items.len()).await?;
        Ok(())
    }

    /// Replace the stored rows of `kind` without touching sync metadata.
    pub async fn rewrite(
        &self,
        kind: MediaKind,
        items: &[MediaItem],
        sources: &SourceMap,
    ) -> Result<()> {
        let rows = items
            .iter()
            .map(|item| {
                Ok(UpsertRow {
                    item_id: item.item_id.clone(),
                    payload: item.to_payload()?,
                    provider_ids: sources.providers_for(&item.item_id),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        self.store.clear_cache_for_type(kind).await?;
        self.store.batch_upsert_items(kind, rows).await?;
        Ok(())
    }

    pub async fn needs_sync(&self, kind: MediaKind, max_age: Duration) -> Result<bool> {
        Ok(self.store.needs_sync(kind, max_age).await?)
    }

    pub async fn clear_all(&self) -> Result<()> {
        Ok(self.store.clear_all_cache().await?)
    }
}

impl std::fmt::Debug for CatalogRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogRepository").finish_non_exhaustive()
    }
}
