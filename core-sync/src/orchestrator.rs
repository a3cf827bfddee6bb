//! # Catalog Sync Orchestrator
//!
//! Keeps the local catalog in step with the remote multi-provider catalog.
//!
//! ## Overview
//!
//! [`CatalogSync`] owns the live [`CatalogCache`] and is the only writer to
//! it. Every change (cache load, sync, removal, reorder, clear) builds a
//! complete new [`CatalogSnapshot`] first and publishes it with one swap, so
//! readers see either the old catalog or the new one, never a mix.
//!
//! ## Sync Workflow
//!
//! 1. **Guard**: claim the in-flight flag or return [`SyncOutcome::AlreadyRunning`]
//! 2. **Staleness**: unless forced, skip when every tracked kind is cached and
//!    the store reports nothing stale
//! 3. **Fetch**: one unscoped request per kind, or one request per kind and
//!    scoped provider; podcasts are always fetched unscoped
//! 4. **Merge**: see [`crate::merge`]
//! 5. **Persist**: rewrite every kind in the store (failures are logged only)
//! 6. **Publish**: swap the snapshot, mark the status completed, notify
//!
//! A fetch failure aborts before step 4 and leaves the live catalog untouched.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let sync = Arc::new(CatalogSync::new(config, store, event_bus, clock));
//! sync.load_from_cache().await;
//!
//! match sync.sync_from_api(api.as_ref(), false, &[]).await {
//!     SyncOutcome::Completed(report) => println!("{} items", report.items_fetched),
//!     SyncOutcome::Failed(message) => eprintln!("sync failed: {}", message),
//!     _ => {}
//! }
//!
//! let visible = sync.albums_filtered_by_providers(&["spotify--a1".to_string()]);
//! ```

use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use bridge_traits::{
    catalog::{CatalogApi, CatalogStore},
    time::Clock,
};
use chrono::{DateTime, Utc};
use core_library::{
    decode_all, dedup_by_id, CatalogCache, CatalogRepository, CatalogSnapshot, LoadedKind,
    MediaItem, MediaKind, SnapshotBuilder,
};
use core_runtime::config::CatalogConfig;
use core_runtime::events::{
    CatalogEvent, ChangeReason, CoreEvent, EventBus, Receiver, SyncEvent,
};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::merge::{merge_full, merge_scoped, normalize_scope, MergedKind, ProviderBatch};
use crate::status::{SyncState, SyncStatus};
use crate::{Result, SyncError};

// ============================================================================
// Run Identity & Outcomes
// ============================================================================

/// Identifier of one sync pass, carried by its events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SyncRunId(Uuid);

impl SyncRunId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SyncRunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SyncRunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Summary of a completed pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncReport {
    pub run_id: SyncRunId,
    /// Normalized scope; empty for a full sync
    pub scoped_providers: Vec<String>,
    /// Items decoded from all responses, duplicates included
    pub items_fetched: usize,
    /// Items dropped because they failed to decode
    pub items_skipped: usize,
    /// Size of each collection after the merge
    pub collection_sizes: BTreeMap<MediaKind, usize>,
    /// Kinds whose store write failed; their in-memory state is still current
    pub persist_failures: Vec<MediaKind>,
    pub duration: Duration,
}

/// What a call to [`CatalogSync::sync_from_api`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Another pass holds the in-flight flag; nothing was fetched.
    AlreadyRunning,
    /// The cache is complete and fresh; nothing was fetched.
    UpToDate,
    Completed(SyncReport),
    /// A fetch failed; the previous catalog is still live.
    Failed(String),
}

/// Summary of [`CatalogSync::load_from_cache`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheLoadReport {
    pub items_loaded: usize,
    pub items_skipped: usize,
    /// Kinds whose store read failed and loaded empty
    pub failed_kinds: Vec<MediaKind>,
}

// ============================================================================
// In-flight Guard
// ============================================================================

/// Holds the in-flight flag for the duration of one pass.
struct InFlightGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

// ============================================================================
// Fetch Results
// ============================================================================

enum KindFetch {
    Full(Vec<MediaItem>),
    Scoped(Vec<ProviderBatch>),
}

struct FetchedCatalog {
    kinds: Vec<(MediaKind, KindFetch)>,
    items_fetched: usize,
    items_skipped: usize,
}

// ============================================================================
// Catalog Sync
// ============================================================================

/// Owner of the materialized catalog and its sync lifecycle.
pub struct CatalogSync {
    config: CatalogConfig,
    repository: CatalogRepository,
    cache: CatalogCache,
    event_bus: EventBus,
    clock: Arc<dyn Clock>,
    state: watch::Sender<SyncState>,
    in_flight: AtomicBool,
}

impl CatalogSync {
    pub fn new(
        config: CatalogConfig,
        store: Arc<dyn CatalogStore>,
        event_bus: EventBus,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let (state, _) = watch::channel(SyncState::default());
        Self {
            config,
            repository: CatalogRepository::new(store),
            cache: CatalogCache::new(),
            event_bus,
            clock,
            state,
            in_flight: AtomicBool::new(false),
        }
    }

    // ------------------------------------------------------------------
    // Cache loading
    // ------------------------------------------------------------------

    /// Replace the live catalog with what the store holds.
    ///
    /// No network access and no status change. A kind that cannot be read
    /// loads empty; the others still load.
    #[instrument(skip(self))]
    pub async fn load_from_cache(&self) -> CacheLoadReport {
        let mut report = CacheLoadReport::default();
        let mut builder = SnapshotBuilder::new();

        for kind in MediaKind::ALL {
            let loaded = match self.repository.load(kind).await {
                Ok(loaded) => loaded,
                Err(e) => {
                    error!(kind = %kind, error = %e, "Failed to load cached items");
                    report.failed_kinds.push(kind);
                    LoadedKind::default()
                }
            };

            report.items_loaded += loaded.items.len();
            report.items_skipped += loaded.skipped;
            builder = builder.items(kind, loaded.items).sources(kind, loaded.sources);
        }

        self.cache.publish(builder.build());
        self.notify_changed(&MediaKind::ALL, ChangeReason::CacheLoaded);

        info!(
            items = report.items_loaded,
            skipped = report.items_skipped,
            "Loaded catalog from cache"
        );
        report
    }

    // ------------------------------------------------------------------
    // Synchronization
    // ------------------------------------------------------------------

    /// Refresh the catalog from `api`.
    ///
    /// An empty `scoped_providers` runs a full sync that replaces all source
    /// tracking. A non-empty scope refreshes only those provider instances
    /// and keeps every other provider's items and attribution. Within a
    /// scope, a later provider's copy of a shared item wins its fields.
    ///
    /// Errors are absorbed into the returned outcome and [`Self::status`].
    #[instrument(skip(self, api, scoped_providers), fields(scoped = scoped_providers.len()))]
    pub async fn sync_from_api(
        &self,
        api: &dyn CatalogApi,
        force: bool,
        scoped_providers: &[String],
    ) -> SyncOutcome {
        let Some(_guard) = InFlightGuard::acquire(&self.in_flight) else {
            info!("Catalog sync already running, skipping");
            return SyncOutcome::AlreadyRunning;
        };

        if !force && !self.is_stale().await {
            debug!("Catalog is up to date");
            return SyncOutcome::UpToDate;
        }

        if let Err(e) = self.transition(SyncState::begin) {
            warn!(error = %e, "Could not enter syncing state");
            return SyncOutcome::Failed(e.to_string());
        }

        let scope = normalize_scope(scoped_providers);
        let run_id = SyncRunId::new();
        let started = Instant::now();

        self.event_bus
            .emit(CoreEvent::Sync(SyncEvent::Started {
                run_id: run_id.to_string(),
                scoped_providers: scope.clone(),
            }))
            .ok();
        info!(run_id = %run_id, scope = ?scope, "Catalog sync started");

        match self.run(api, &scope, run_id, started).await {
            Ok(report) => {
                if let Err(e) = self.transition(|s| s.complete(self.clock.now())) {
                    warn!(error = %e, "Could not record sync completion");
                }
                self.event_bus
                    .emit(CoreEvent::Sync(SyncEvent::Completed {
                        run_id: run_id.to_string(),
                        items_fetched: report.items_fetched as u64,
                        items_skipped: report.items_skipped as u64,
                        duration_ms: report.duration.as_millis() as u64,
                    }))
                    .ok();
                info!(
                    run_id = %run_id,
                    fetched = report.items_fetched,
                    skipped = report.items_skipped,
                    duration_ms = report.duration.as_millis() as u64,
                    "Catalog sync completed"
                );
                SyncOutcome::Completed(report)
            }
            Err(e) => {
                let message = e.to_string();
                if let Err(e) = self.transition(|s| s.fail(message.clone())) {
                    warn!(error = %e, "Could not record sync failure");
                }
                self.event_bus
                    .emit(CoreEvent::Sync(SyncEvent::Failed {
                        run_id: run_id.to_string(),
                        message: message.clone(),
                    }))
                    .ok();
                error!(run_id = %run_id, error = %message, "Catalog sync failed");
                SyncOutcome::Failed(message)
            }
        }
    }

    /// Stale unless every tracked kind is cached and no kind needs a sync.
    async fn is_stale(&self) -> bool {
        // Podcasts are left out: an empty podcast feed is a valid cached state.
        if !self.cache.current().has_all_tracked() {
            return true;
        }

        for kind in MediaKind::ALL {
            match self
                .repository
                .needs_sync(kind, self.config.staleness_window)
                .await
            {
                Ok(false) => {}
                Ok(true) => {
                    debug!(kind = %kind, "Cached kind is stale");
                    return true;
                }
                Err(e) => {
                    warn!(kind = %kind, error = %e, "Staleness check failed, treating as stale");
                    return true;
                }
            }
        }
        false
    }

    async fn run(
        &self,
        api: &dyn CatalogApi,
        scope: &[String],
        run_id: SyncRunId,
        started: Instant,
    ) -> Result<SyncReport> {
        let fetched = self.fetch_all(api, scope).await?;

        let base = self.cache.current();
        let mut builder = base.to_builder();
        let mut merged_kinds = Vec::with_capacity(fetched.kinds.len());

        for (kind, fetch) in fetched.kinds {
            let merged = match fetch {
                KindFetch::Full(items) => merge_full(items),
                KindFetch::Scoped(batches) => {
                    merge_scoped(base.items(kind), base.sources(kind), scope, batches)
                }
            };
            merged_kinds.push((kind, merged));
        }

        let mut persist_failures = Vec::new();
        for (kind, merged) in &merged_kinds {
            if let Err(e) = self
                .repository
                .save(*kind, &merged.items, &merged.sources)
                .await
            {
                error!(kind = %kind, error = %e, "Failed to persist catalog kind");
                persist_failures.push(*kind);
            }
        }

        let mut collection_sizes = BTreeMap::new();
        for (kind, MergedKind { items, sources }) in merged_kinds {
            collection_sizes.insert(kind, items.len());
            builder = builder.items(kind, items).sources(kind, sources);
        }

        self.cache.publish(builder.build());
        self.notify_changed(&MediaKind::ALL, ChangeReason::SyncCompleted);

        Ok(SyncReport {
            run_id,
            scoped_providers: scope.to_vec(),
            items_fetched: fetched.items_fetched,
            items_skipped: fetched.items_skipped,
            collection_sizes,
            persist_failures,
            duration: started.elapsed(),
        })
    }

    async fn fetch_all(&self, api: &dyn CatalogApi, scope: &[String]) -> Result<FetchedCatalog> {
        let limit = self.config.fetch_limit;
        let mut fetched = FetchedCatalog {
            kinds: Vec::with_capacity(MediaKind::ALL.len()),
            items_fetched: 0,
            items_skipped: 0,
        };

        for kind in MediaKind::TRACKED {
            if scope.is_empty() {
                let values = api
                    .fetch(kind, limit, None)
                    .await
                    .map_err(|source| SyncError::Fetch {
                        kind,
                        provider: None,
                        source,
                    })?;
                let decoded = decode_all(kind, values);
                debug!(kind = %kind, result = %decoded, "Fetched kind");
                fetched.items_fetched += decoded.items.len();
                fetched.items_skipped += decoded.skipped;
                fetched.kinds.push((kind, KindFetch::Full(decoded.items)));
                continue;
            }

            let mut batches = Vec::with_capacity(scope.len());
            for provider in scope {
                let values = api
                    .fetch(kind, limit, Some(std::slice::from_ref(provider)))
                    .await
                    .map_err(|source| SyncError::Fetch {
                        kind,
                        provider: Some(provider.clone()),
                        source,
                    })?;
                let decoded = decode_all(kind, values);
                debug!(kind = %kind, provider = %provider, result = %decoded, "Fetched kind");
                fetched.items_fetched += decoded.items.len();
                fetched.items_skipped += decoded.skipped;
                batches.push(ProviderBatch {
                    provider: provider.clone(),
                    items: decoded.items,
                });
            }
            fetched.kinds.push((kind, KindFetch::Scoped(batches)));
        }

        let values = api
            .get_podcasts(limit)
            .await
            .map_err(|source| SyncError::Fetch {
                kind: MediaKind::Podcast,
                provider: None,
                source,
            })?;
        let decoded = decode_all(MediaKind::Podcast, values);
        debug!(result = %decoded, "Fetched podcasts");
        fetched.items_fetched += decoded.items.len();
        fetched.items_skipped += decoded.skipped;
        fetched
            .kinds
            .push((MediaKind::Podcast, KindFetch::Full(decoded.items)));

        Ok(fetched)
    }

    // ------------------------------------------------------------------
    // Targeted mutations
    // ------------------------------------------------------------------

    /// Drop every item of `kind` whose library id is `library_id`.
    ///
    /// Returns how many items were removed. The store copy of `kind` is
    /// rewritten afterwards; a store failure is logged and the in-memory
    /// removal stands.
    #[instrument(skip(self), fields(kind = %kind))]
    pub async fn remove_from_cache_by_library_id(
        &self,
        kind: MediaKind,
        library_id: &str,
    ) -> usize {
        let removed = self.cache.update(|current| {
            let (kept, removed): (Vec<MediaItem>, Vec<MediaItem>) = current
                .items(kind)
                .iter()
                .cloned()
                .partition(|item| item.library_id() != Some(library_id));
            if removed.is_empty() {
                return None;
            }

            let mut sources = current.sources(kind).clone();
            for item in &removed {
                sources.remove(&item.item_id);
            }
            let next = current
                .to_builder()
                .items(kind, kept)
                .sources(kind, sources)
                .build();
            Some((next, removed.len()))
        });

        let Some((snapshot, count)) = removed else {
            debug!(library_id = library_id, "No cached item matched library id");
            return 0;
        };

        self.notify_changed(&[kind], ChangeReason::ItemRemoved);
        debug!(library_id = library_id, count = count, "Removed cached items");

        if let Err(e) = self
            .repository
            .rewrite(kind, snapshot.items(kind), snapshot.sources(kind))
            .await
        {
            warn!(error = %e, "Failed to remove items from the store");
        }
        count
    }

    /// Replace the order of `kind` with `items`, e.g. after a UI sort.
    ///
    /// Source tracking is untouched and nothing is written to the store.
    pub fn update_cached(&self, kind: MediaKind, items: Vec<MediaItem>) {
        let items = dedup_by_id(items);
        self.cache
            .update(|current| Some((current.to_builder().items(kind, items).build(), ())));
        self.notify_changed(&[kind], ChangeReason::OrderUpdated);
    }

    /// Forget the whole catalog, in memory and in the store (e.g. on logout).
    #[instrument(skip(self))]
    pub async fn clear_cache(&self) {
        self.cache.publish(SnapshotBuilder::new().build());
        self.notify_changed(&MediaKind::ALL, ChangeReason::Cleared);

        if let Err(e) = self.repository.clear_all().await {
            error!(error = %e, "Failed to clear the catalog store");
        }
        info!("Catalog cache cleared");
    }

    // ------------------------------------------------------------------
    // Readers
    // ------------------------------------------------------------------

    /// The live catalog generation.
    pub fn snapshot(&self) -> Arc<CatalogSnapshot> {
        self.cache.current()
    }

    pub fn cached(&self, kind: MediaKind) -> Arc<Vec<MediaItem>> {
        self.cache.current().items_arc(kind)
    }

    /// Items of `kind` attributed to any of `provider_ids`.
    ///
    /// An empty list returns everything. Podcasts ignore the filter.
    pub fn filtered_by_providers(
        &self,
        kind: MediaKind,
        provider_ids: &[String],
    ) -> Vec<MediaItem> {
        let enabled: HashSet<String> = provider_ids.iter().cloned().collect();
        self.cache.current().filtered(kind, &enabled)
    }

    pub fn state(&self) -> SyncState {
        self.state.borrow().clone()
    }

    pub fn status(&self) -> SyncStatus {
        self.state.borrow().status.clone()
    }

    pub fn last_error(&self) -> Option<String> {
        self.state.borrow().last_error.clone()
    }

    pub fn last_sync_time(&self) -> Option<DateTime<Utc>> {
        self.state.borrow().last_sync_time
    }

    pub fn is_syncing(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Watch status changes.
    pub fn subscribe_state(&self) -> watch::Receiver<SyncState> {
        self.state.subscribe()
    }

    /// Catalog and sync events.
    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.event_bus.subscribe()
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn transition<F>(&self, next: F) -> Result<()>
    where
        F: FnOnce(&SyncState) -> Result<SyncState>,
    {
        let current = self.state.borrow().clone();
        self.state.send_replace(next(&current)?);
        Ok(())
    }

    fn notify_changed(&self, kinds: &[MediaKind], reason: ChangeReason) {
        self.event_bus
            .emit(CoreEvent::Catalog(CatalogEvent::Changed {
                kinds: kinds.iter().map(|k| k.as_str().to_string()).collect(),
                reason,
            }))
            .ok();
    }
}

macro_rules! kind_accessors {
    ($($kind:ident => $cached:ident, $filtered:ident, $update:ident;)*) => {
        impl CatalogSync {
            $(
                pub fn $cached(&self) -> Arc<Vec<MediaItem>> {
                    self.cached(MediaKind::$kind)
                }

                pub fn $filtered(&self, provider_ids: &[String]) -> Vec<MediaItem> {
                    self.filtered_by_providers(MediaKind::$kind, provider_ids)
                }

                pub fn $update(&self, items: Vec<MediaItem>) {
                    self.update_cached(MediaKind::$kind, items)
                }
            )*
        }
    };
}

kind_accessors! {
    Album => cached_albums, albums_filtered_by_providers, update_cached_albums;
    Artist => cached_artists, artists_filtered_by_providers, update_cached_artists;
    Audiobook => cached_audiobooks, audiobooks_filtered_by_providers, update_cached_audiobooks;
    Playlist => cached_playlists, playlists_filtered_by_providers, update_cached_playlists;
    Track => cached_tracks, tracks_filtered_by_providers, update_cached_tracks;
    Podcast => cached_podcasts, podcasts_filtered_by_providers, update_cached_podcasts;
}

impl std::fmt::Debug for CatalogSync {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogSync")
            .field("config", &self.config)
            .field("cache", &self.cache)
            .field("status", &self.status())
            .field("in_flight", &self.is_syncing())
            .finish()
    }
}
