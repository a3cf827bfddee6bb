//! In-memory catalog store
//!
//! Same contract as [`SqliteCatalogStore`](crate::SqliteCatalogStore) without
//! touching disk. Handy for tests and for sessions that must not leave a
//! cache behind.

use async_trait::async_trait;
use bridge_traits::{
    catalog::{CachedRow, CatalogStore, MediaKind, UpsertRow},
    error::Result,
    time::Clock,
};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Default)]
struct KindTable {
    /// Upsert order
    rows: Vec<(String, CachedRow)>,
    last_synced_at: Option<i64>,
    item_count: usize,
}

pub struct InMemoryCatalogStore {
    tables: Mutex<HashMap<MediaKind, KindTable>>,
    clock: Arc<dyn Clock>,
}

impl InMemoryCatalogStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            tables: Mutex::new(HashMap::new()),
            clock,
        }
    }

    /// Item count recorded by the last `update_sync_metadata` of `kind`.
    pub fn recorded_item_count(&self, kind: MediaKind) -> Option<usize> {
        let tables = self.tables.lock();
        tables
            .get(&kind)
            .filter(|table| table.last_synced_at.is_some())
            .map(|table| table.item_count)
    }
}

#[async_trait]
impl CatalogStore for InMemoryCatalogStore {
    async fn get_cached_items_with_providers(&self, kind: MediaKind) -> Result<Vec<CachedRow>> {
        let tables = self.tables.lock();
        Ok(tables
            .get(&kind)
            .map(|table| table.rows.iter().map(|(_, row)| row.clone()).collect())
            .unwrap_or_default())
    }

    async fn get_cached_items(&self, kind: MediaKind) -> Result<Vec<String>> {
        let tables = self.tables.lock();
        Ok(tables
            .get(&kind)
            .map(|table| table.rows.iter().map(|(_, row)| row.payload.clone()).collect())
            .unwrap_or_default())
    }

    async fn batch_upsert_items(&self, kind: MediaKind, rows: Vec<UpsertRow>) -> Result<()> {
        let mut tables = self.tables.lock();
        let table = tables.entry(kind).or_default();

        // Re-upserting moves the row to the end, as the SQLite store does:
        // only the last occurrence of an id in the batch survives.
        let latest: HashMap<String, usize> = rows
            .iter()
            .enumerate()
            .map(|(index, row)| (row.item_id.clone(), index))
            .collect();
        table.rows.retain(|(item_id, _)| !latest.contains_key(item_id));
        table.rows.reserve(latest.len());

        for (index, row) in rows.into_iter().enumerate() {
            if latest.get(&row.item_id) != Some(&index) {
                continue;
            }
            table.rows.push((
                row.item_id,
                CachedRow {
                    payload: row.payload,
                    provider_ids: row.provider_ids,
                },
            ));
        }
        Ok(())
    }

    async fn clear_cache_for_type(&self, kind: MediaKind) -> Result<()> {
        if let Some(table) = self.tables.lock().get_mut(&kind) {
            table.rows.clear();
        }
        Ok(())
    }

    async fn clear_all_cache(&self) -> Result<()> {
        self.tables.lock().clear();
        Ok(())
    }

    async fn needs_sync(&self, kind: MediaKind, max_age: Duration) -> Result<bool> {
        let last_synced_at = self
            .tables
            .lock()
            .get(&kind)
            .and_then(|table| table.last_synced_at);

        Ok(match last_synced_at {
            None => true,
            Some(at) => {
                let age_ms = self.clock.unix_timestamp_millis() - at;
                age_ms < 0 || age_ms as u128 >= max_age.as_millis()
            }
        })
    }

    async fn update_sync_metadata(&self, kind: MediaKind, item_count: usize) -> Result<()> {
        let now = self.clock.unix_timestamp_millis();
        let mut tables = self.tables.lock();
        let table = tables.entry(kind).or_default();
        table.last_synced_at = Some(now);
        table.item_count = item_count;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::time::ManualClock;

    fn row(id: &str) -> UpsertRow {
        UpsertRow {
            item_id: id.to_string(),
            payload: id.to_string(),
            provider_ids: vec!["P1".to_string()],
        }
    }

    #[tokio::test]
    async fn test_upsert_order_and_replacement() {
        let store = InMemoryCatalogStore::new(Arc::new(ManualClock::default()));
        store
            .batch_upsert_items(MediaKind::Album, vec![row("a"), row("b")])
            .await
            .unwrap();
        store
            .batch_upsert_items(MediaKind::Album, vec![row("a")])
            .await
            .unwrap();

        assert_eq!(
            store.get_cached_items(MediaKind::Album).await.unwrap(),
            vec!["b", "a"]
        );
    }

    #[tokio::test]
    async fn test_batch_with_repeated_ids_keeps_last_occurrence() {
        let store = InMemoryCatalogStore::new(Arc::new(ManualClock::default()));
        store
            .batch_upsert_items(MediaKind::Album, vec![row("a"), row("b"), row("c")])
            .await
            .unwrap();

        let mut replacement = row("a");
        replacement.payload = "a2".to_string();
        store
            .batch_upsert_items(MediaKind::Album, vec![row("b"), row("d"), replacement])
            .await
            .unwrap();

        assert_eq!(
            store.get_cached_items(MediaKind::Album).await.unwrap(),
            vec!["c", "b", "d", "a2"]
        );
    }

    #[tokio::test]
    async fn test_large_batch_upsert() {
        let store = InMemoryCatalogStore::new(Arc::new(ManualClock::default()));
        let rows: Vec<UpsertRow> = (0..5_000).map(|i| row(&i.to_string())).collect();
        store.batch_upsert_items(MediaKind::Track, rows.clone()).await.unwrap();
        store.batch_upsert_items(MediaKind::Track, rows).await.unwrap();

        let cached = store.get_cached_items(MediaKind::Track).await.unwrap();
        assert_eq!(cached.len(), 5_000);
        assert_eq!(cached.first().map(String::as_str), Some("0"));
        assert_eq!(cached.last().map(String::as_str), Some("4999"));
    }

    #[tokio::test]
    async fn test_staleness_and_metadata() {
        let clock = Arc::new(ManualClock::default());
        let store = InMemoryCatalogStore::new(clock.clone());
        let window = Duration::from_secs(60);

        assert!(store.needs_sync(MediaKind::Track, window).await.unwrap());
        assert_eq!(store.recorded_item_count(MediaKind::Track), None);

        store.update_sync_metadata(MediaKind::Track, 4).await.unwrap();
        assert!(!store.needs_sync(MediaKind::Track, window).await.unwrap());
        assert_eq!(store.recorded_item_count(MediaKind::Track), Some(4));

        clock.advance(window);
        assert!(store.needs_sync(MediaKind::Track, window).await.unwrap());

        store.clear_all_cache().await.unwrap();
        assert_eq!(store.recorded_item_count(MediaKind::Track), None);
    }
}
