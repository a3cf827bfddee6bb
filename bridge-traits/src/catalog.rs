//! Catalog Collaborator Contracts
//!
//! The two host-provided collaborators the catalog core is built on:
//!
//! - [`CatalogStore`]: durable key/value style storage for cached catalog
//!   items, keyed by `(media kind, item id)`, plus per-kind sync metadata.
//! - [`CatalogApi`]: the remote multi-provider catalog, optionally scoped to
//!   specific provider instances.
//!
//! Items cross both boundaries as JSON. The store keeps serialized text, the
//! API hands back raw [`serde_json::Value`]s that the core decodes itself.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{BridgeError, Result};

/// Catalog entity type.
///
/// The lowercase wire name (see [`MediaKind::as_str`]) is the key used by
/// stores to partition cached rows and sync metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Album,
    Artist,
    Audiobook,
    Playlist,
    Track,
    Podcast,
}

impl MediaKind {
    /// Kinds whose items carry per-provider source tracking.
    pub const TRACKED: [MediaKind; 5] = [
        MediaKind::Album,
        MediaKind::Artist,
        MediaKind::Audiobook,
        MediaKind::Playlist,
        MediaKind::Track,
    ];

    /// Every kind, tracked kinds first.
    pub const ALL: [MediaKind; 6] = [
        MediaKind::Album,
        MediaKind::Artist,
        MediaKind::Audiobook,
        MediaKind::Playlist,
        MediaKind::Track,
        MediaKind::Podcast,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Album => "album",
            MediaKind::Artist => "artist",
            MediaKind::Audiobook => "audiobook",
            MediaKind::Playlist => "playlist",
            MediaKind::Track => "track",
            MediaKind::Podcast => "podcast",
        }
    }

    /// Podcasts cannot be fetched per provider instance, so they are never
    /// attributed to one.
    pub fn is_source_tracked(&self) -> bool {
        !matches!(self, MediaKind::Podcast)
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaKind {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "album" => Ok(MediaKind::Album),
            "artist" => Ok(MediaKind::Artist),
            "audiobook" => Ok(MediaKind::Audiobook),
            "playlist" => Ok(MediaKind::Playlist),
            "track" => Ok(MediaKind::Track),
            "podcast" => Ok(MediaKind::Podcast),
            other => Err(BridgeError::UnknownKind(other.to_string())),
        }
    }
}

/// A cached row as read back from a [`CatalogStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedRow {
    /// Serialized JSON item
    pub payload: String,
    /// Provider instances that vouched for the item (may be empty)
    pub provider_ids: Vec<String>,
}

/// A row handed to [`CatalogStore::batch_upsert_items`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpsertRow {
    pub item_id: String,
    pub payload: String,
    pub provider_ids: Vec<String>,
}

/// Durable catalog cache.
///
/// Implementations must return rows in the order they were last upserted so
/// that the cached display order survives a restart.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// All rows of a kind together with their provider attribution.
    async fn get_cached_items_with_providers(&self, kind: MediaKind) -> Result<Vec<CachedRow>>;

    /// Payloads only, for kinds that are not source tracked.
    async fn get_cached_items(&self, kind: MediaKind) -> Result<Vec<String>>;

    /// Insert or replace rows keyed by `(kind, item_id)`.
    async fn batch_upsert_items(&self, kind: MediaKind, rows: Vec<UpsertRow>) -> Result<()>;

    async fn clear_cache_for_type(&self, kind: MediaKind) -> Result<()>;

    async fn clear_all_cache(&self) -> Result<()>;

    /// Whether the last successful sync of `kind` is older than `max_age`
    /// (or never happened).
    async fn needs_sync(&self, kind: MediaKind, max_age: Duration) -> Result<bool>;

    /// Record a successful sync of `kind` at the store's current time.
    async fn update_sync_metadata(&self, kind: MediaKind, item_count: usize) -> Result<()>;
}

/// Remote multi-provider catalog.
///
/// `providers` scopes a fetch to the given provider instance ids; `None`
/// fetches across every configured provider. Retries and timeouts are the
/// implementation's concern.
#[async_trait]
pub trait CatalogApi: Send + Sync {
    async fn get_albums(
        &self,
        limit: usize,
        providers: Option<&[String]>,
    ) -> Result<Vec<serde_json::Value>>;

    async fn get_artists(
        &self,
        limit: usize,
        providers: Option<&[String]>,
    ) -> Result<Vec<serde_json::Value>>;

    async fn get_audiobooks(
        &self,
        limit: usize,
        providers: Option<&[String]>,
    ) -> Result<Vec<serde_json::Value>>;

    async fn get_playlists(
        &self,
        limit: usize,
        providers: Option<&[String]>,
    ) -> Result<Vec<serde_json::Value>>;

    async fn get_tracks(
        &self,
        limit: usize,
        providers: Option<&[String]>,
    ) -> Result<Vec<serde_json::Value>>;

    /// Podcasts have no provider scoping.
    async fn get_podcasts(&self, limit: usize) -> Result<Vec<serde_json::Value>>;

    /// Dispatch to the per-kind getter. `providers` is ignored for podcasts.
    async fn fetch(
        &self,
        kind: MediaKind,
        limit: usize,
        providers: Option<&[String]>,
    ) -> Result<Vec<serde_json::Value>> {
        match kind {
            MediaKind::Album => self.get_albums(limit, providers).await,
            MediaKind::Artist => self.get_artists(limit, providers).await,
            MediaKind::Audiobook => self.get_audiobooks(limit, providers).await,
            MediaKind::Playlist => self.get_playlists(limit, providers).await,
            MediaKind::Track => self.get_tracks(limit, providers).await,
            MediaKind::Podcast => self.get_podcasts(limit).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Mutex;

    /// Records which getter was hit.
    #[derive(Default)]
    struct RecordingApi {
        calls: Mutex<Vec<(&'static str, Option<Vec<String>>)>>,
    }

    impl RecordingApi {
        fn record(&self, name: &'static str, providers: Option<&[String]>) -> Result<Vec<serde_json::Value>> {
            self.calls
                .lock()
                .unwrap()
                .push((name, providers.map(|p| p.to_vec())));
            Ok(vec![json!({ "item_id": name })])
        }
    }

    #[async_trait]
    impl CatalogApi for RecordingApi {
        async fn get_albums(&self, _limit: usize, providers: Option<&[String]>) -> Result<Vec<serde_json::Value>> {
            self.record("albums", providers)
        }
        async fn get_artists(&self, _limit: usize, providers: Option<&[String]>) -> Result<Vec<serde_json::Value>> {
            self.record("artists", providers)
        }
        async fn get_audiobooks(&self, _limit: usize, providers: Option<&[String]>) -> Result<Vec<serde_json::Value>> {
            self.record("audiobooks", providers)
        }
        async fn get_playlists(&self, _limit: usize, providers: Option<&[String]>) -> Result<Vec<serde_json::Value>> {
            self.record("playlists", providers)
        }
        async fn get_tracks(&self, _limit: usize, providers: Option<&[String]>) -> Result<Vec<serde_json::Value>> {
            self.record("tracks", providers)
        }
        async fn get_podcasts(&self, _limit: usize) -> Result<Vec<serde_json::Value>> {
            self.record("podcasts", None)
        }
    }

    #[test]
    fn test_kind_round_trip_names() {
        for kind in MediaKind::ALL {
            assert_eq!(kind.as_str().parse::<MediaKind>().unwrap(), kind);
        }
        assert!("episode".parse::<MediaKind>().is_err());
    }

    #[test]
    fn test_only_podcasts_untracked() {
        assert!(MediaKind::TRACKED.iter().all(|k| k.is_source_tracked()));
        assert!(!MediaKind::Podcast.is_source_tracked());
    }

    #[tokio::test]
    async fn test_fetch_dispatches_by_kind() {
        let api = RecordingApi::default();
        let scope = vec!["spotify--1".to_string()];

        api.fetch(MediaKind::Track, 10, Some(&scope)).await.unwrap();
        api.fetch(MediaKind::Podcast, 10, Some(&scope)).await.unwrap();

        let calls = api.calls.lock().unwrap();
        assert_eq!(calls[0], ("tracks", Some(scope.clone())));
        // podcasts ignore the provider scope
        assert_eq!(calls[1], ("podcasts", None));
    }
}
