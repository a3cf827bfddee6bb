//! Catalog cache storage using SQLite

use async_trait::async_trait;
use bridge_traits::{
    catalog::{CachedRow, CatalogStore, MediaKind, UpsertRow},
    error::{BridgeError, Result},
    time::Clock,
};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions},
    Row,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

const SCHEMA: [&str; 3] = [
    r#"
    CREATE TABLE IF NOT EXISTS catalog_items (
        entity_type TEXT NOT NULL,
        item_id TEXT NOT NULL,
        position INTEGER NOT NULL,
        payload TEXT NOT NULL,
        provider_ids TEXT NOT NULL DEFAULT '[]',
        updated_at INTEGER NOT NULL,
        PRIMARY KEY (entity_type, item_id)
    )
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS idx_catalog_items_position
        ON catalog_items (entity_type, position)
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS sync_metadata (
        entity_type TEXT PRIMARY KEY,
        last_synced_at INTEGER NOT NULL,
        item_count INTEGER NOT NULL
    )
    "#,
];

/// SQLite-backed catalog store
///
/// Rows of a kind come back in the order of their last upsert. Provider ids
/// are kept as a JSON array next to the payload. Sync timestamps are Unix
/// milliseconds taken from the injected [`Clock`].
pub struct SqliteCatalogStore {
    pool: SqlitePool,
    clock: Arc<dyn Clock>,
}

impl SqliteCatalogStore {
    /// Open (or create) the catalog database at `db_path`
    pub async fn new(db_path: PathBuf, clock: Arc<dyn Clock>) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(BridgeError::Io)?;
        }

        let options = SqliteConnectOptions::new()
            .filename(&db_path)
            .create_if_missing(true);

        let pool = SqlitePool::connect_with(options)
            .await
            .map_err(|e| BridgeError::DatabaseError(format!("Failed to connect to DB: {}", e)))?;

        let store = Self { pool, clock };
        store.create_schema().await?;

        debug!(path = ?db_path, "Initialized catalog store");
        Ok(store)
    }

    /// Create an in-memory catalog store (for testing)
    pub async fn in_memory(clock: Arc<dyn Clock>) -> Result<Self> {
        // Every pooled connection to :memory: is a separate database.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await
            .map_err(|e| BridgeError::DatabaseError(format!("Failed to connect to DB: {}", e)))?;

        let store = Self { pool, clock };
        store.create_schema().await?;
        Ok(store)
    }

    async fn create_schema(&self) -> Result<()> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| {
                    BridgeError::DatabaseError(format!("Failed to create table: {}", e))
                })?;
        }
        Ok(())
    }

    fn decode_provider_ids(kind: MediaKind, item_id: &str, raw: &str) -> Vec<String> {
        serde_json::from_str(raw).unwrap_or_else(|e| {
            warn!(
                kind = %kind,
                item_id = item_id,
                error = %e,
                "Discarding unreadable provider ids"
            );
            Vec::new()
        })
    }
}

#[async_trait]
impl CatalogStore for SqliteCatalogStore {
    async fn get_cached_items_with_providers(&self, kind: MediaKind) -> Result<Vec<CachedRow>> {
        let rows = sqlx::query(
            r#"
            SELECT item_id, payload, provider_ids
            FROM catalog_items
            WHERE entity_type = ?
            ORDER BY position
            "#,
        )
        .bind(kind.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| BridgeError::DatabaseError(format!("Failed to read cache: {}", e)))?;

        let cached = rows
            .iter()
            .map(|row| {
                let item_id: String = row.get(0);
                let raw_providers: String = row.get(2);
                CachedRow {
                    payload: row.get(1),
                    provider_ids: Self::decode_provider_ids(kind, &item_id, &raw_providers),
                }
            })
            .collect::<Vec<_>>();

        debug!(kind = %kind, count = cached.len(), "Read cached items");
        Ok(cached)
    }

    async fn get_cached_items(&self, kind: MediaKind) -> Result<Vec<String>> {
        let rows = sqlx::query(
            "SELECT payload FROM catalog_items WHERE entity_type = ? ORDER BY position",
        )
        .bind(kind.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| BridgeError::DatabaseError(format!("Failed to read cache: {}", e)))?;

        Ok(rows.iter().map(|row| row.get(0)).collect())
    }

    async fn batch_upsert_items(&self, kind: MediaKind, rows: Vec<UpsertRow>) -> Result<()> {
        let count = rows.len();
        let now = self.clock.unix_timestamp_millis();

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| BridgeError::DatabaseError(format!("Failed to begin transaction: {}", e)))?;

        let next_position: i64 = sqlx::query(
            "SELECT COALESCE(MAX(position) + 1, 0) FROM catalog_items WHERE entity_type = ?",
        )
        .bind(kind.as_str())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| BridgeError::DatabaseError(format!("Failed to read positions: {}", e)))?
        .get(0);

        for (offset, row) in rows.into_iter().enumerate() {
            let provider_ids = serde_json::to_string(&row.provider_ids)?;
            sqlx::query(
                r#"
                INSERT INTO catalog_items
                    (entity_type, item_id, position, payload, provider_ids, updated_at)
                VALUES (?, ?, ?, ?, ?, ?)
                ON CONFLICT(entity_type, item_id) DO UPDATE SET
                    position = excluded.position,
                    payload = excluded.payload,
                    provider_ids = excluded.provider_ids,
                    updated_at = excluded.updated_at
                "#,
            )
            .bind(kind.as_str())
            .bind(&row.item_id)
            .bind(next_position + offset as i64)
            .bind(&row.payload)
            .bind(provider_ids)
            .bind(now)
            .execute(&mut *tx)
            .await
            .map_err(|e| BridgeError::DatabaseError(format!("Failed to upsert item: {}", e)))?;
        }

        tx.commit()
            .await
            .map_err(|e| BridgeError::DatabaseError(format!("Failed to commit: {}", e)))?;

        debug!(kind = %kind, count = count, "Upserted cached items");
        Ok(())
    }

    async fn clear_cache_for_type(&self, kind: MediaKind) -> Result<()> {
        sqlx::query("DELETE FROM catalog_items WHERE entity_type = ?")
            .bind(kind.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| BridgeError::DatabaseError(format!("Failed to clear cache: {}", e)))?;

        debug!(kind = %kind, "Cleared cached items");
        Ok(())
    }

    async fn clear_all_cache(&self) -> Result<()> {
        for statement in ["DELETE FROM catalog_items", "DELETE FROM sync_metadata"] {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| {
                    BridgeError::DatabaseError(format!("Failed to clear cache: {}", e))
                })?;
        }

        debug!("Cleared entire catalog cache");
        Ok(())
    }

    async fn needs_sync(&self, kind: MediaKind, max_age: Duration) -> Result<bool> {
        let row = sqlx::query("SELECT last_synced_at FROM sync_metadata WHERE entity_type = ?")
            .bind(kind.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                BridgeError::DatabaseError(format!("Failed to read sync metadata: {}", e))
            })?;

        let Some(row) = row else {
            return Ok(true);
        };

        let last_synced_at: i64 = row.get(0);
        let age_ms = self.clock.unix_timestamp_millis() - last_synced_at;
        Ok(age_ms < 0 || age_ms as u128 >= max_age.as_millis())
    }

    async fn update_sync_metadata(&self, kind: MediaKind, item_count: usize) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO sync_metadata (entity_type, last_synced_at, item_count)
            VALUES (?, ?, ?)
            ON CONFLICT(entity_type) DO UPDATE SET
                last_synced_at = excluded.last_synced_at,
                item_count = excluded.item_count
            "#,
        )
        .bind(kind.as_str())
        .bind(self.clock.unix_timestamp_millis())
        .bind(item_count as i64)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            BridgeError::DatabaseError(format!("Failed to update sync metadata: {}", e))
        })?;

        debug!(kind = %kind, item_count = item_count, "Recorded sync");
        Ok(())
    }
}
