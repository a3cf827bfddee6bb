//! Catalog sync demonstration
//!
//! Runs a full sync and a scoped sync against a canned two-provider backend
//! and prints what each provider filter shows.
//!
//! Run with:
//! ```bash
//! # Pretty format (default in debug)
//! cargo run -p core-service --example catalog_demo
//!
//! # JSON format
//! cargo run -p core-service --example catalog_demo -- json
//!
//! # With custom filter
//! cargo run -p core-service --example catalog_demo -- pretty "core_sync=trace"
//! ```

use std::env;
use std::sync::Arc;

use async_trait::async_trait;
use bridge_desktop::InMemoryCatalogStore;
use bridge_traits::error::Result as BridgeResult;
use bridge_traits::time::{Clock, LogLevel, SystemClock};
use bridge_traits::CatalogApi;
use core_runtime::config::CatalogConfig;
use core_runtime::logging::{init_logging, LogFormat, LoggingConfig};
use core_service::{CatalogService, CoreDependencies};
use core_sync::SyncOutcome;
use serde_json::{json, Value};
use tracing::{info, warn};

/// Two providers: "spotify" owns albums 1 and 2, "tidal" owns 2 and 3.
struct DemoApi;

impl DemoApi {
    fn albums(provider: &str) -> Vec<Value> {
        let ids: &[&str] = match provider {
            "spotify" => &["1", "2"],
            "tidal" => &["2", "3"],
            _ => &[],
        };
        ids.iter()
            .map(|id| {
                json!({
                    "item_id": id,
                    "provider": provider,
                    "name": format!("Album {id}"),
                    "media_type": "album",
                })
            })
            .collect()
    }
}

#[async_trait]
impl CatalogApi for DemoApi {
    async fn get_albums(&self, _limit: usize, providers: Option<&[String]>) -> BridgeResult<Vec<Value>> {
        Ok(match providers {
            Some(scope) => scope.iter().flat_map(|p| Self::albums(p)).collect(),
            None => ["spotify", "tidal"].iter().flat_map(|p| Self::albums(p)).collect(),
        })
    }

    async fn get_artists(&self, _limit: usize, _providers: Option<&[String]>) -> BridgeResult<Vec<Value>> {
        Ok(Vec::new())
    }

    async fn get_audiobooks(&self, _limit: usize, _providers: Option<&[String]>) -> BridgeResult<Vec<Value>> {
        Ok(Vec::new())
    }

    async fn get_playlists(&self, _limit: usize, _providers: Option<&[String]>) -> BridgeResult<Vec<Value>> {
        Ok(Vec::new())
    }

    async fn get_tracks(&self, _limit: usize, _providers: Option<&[String]>) -> BridgeResult<Vec<Value>> {
        Ok(Vec::new())
    }

    async fn get_podcasts(&self, _limit: usize) -> BridgeResult<Vec<Value>> {
        Ok(vec![json!({
            "item_id": "pod-1",
            "provider": "library",
            "name": "Morning News",
            "media_type": "podcast",
        })])
    }
}

#[tokio::main]
async fn main() -> core_service::Result<()> {
    let args: Vec<String> = env::args().collect();

    let format = match args.get(1).map(String::as_str) {
        Some("json") => LogFormat::Json,
        Some("compact") => LogFormat::Compact,
        Some("pretty") => LogFormat::Pretty,
        _ => LogFormat::default(),
    };

    let mut logging = LoggingConfig::default()
        .with_format(format)
        .with_level(LogLevel::Debug)
        .with_target(true);
    if let Some(filter) = args.get(2) {
        logging = logging.with_filter(filter.clone());
    }
    init_logging(logging)?;

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let deps = CoreDependencies::new(Arc::new(InMemoryCatalogStore::new(clock.clone())), clock);
    let service = CatalogService::new(CatalogConfig::default(), deps)?;
    let catalog = service.catalog();

    let api = DemoApi;
    let providers = vec!["spotify".to_string(), "tidal".to_string()];

    // Unscoped: authoritative, but nothing is attributed yet.
    report(catalog.sync_from_api(&api, true, &[]).await);
    info!(
        total = catalog.cached_albums().len(),
        visible = catalog.albums_filtered_by_providers(&providers).len(),
        "After full sync"
    );

    // Scoped: albums become visible under the providers that returned them.
    report(catalog.sync_from_api(&api, true, &providers).await);
    for provider in &providers {
        let visible: Vec<String> = catalog
            .albums_filtered_by_providers(std::slice::from_ref(provider))
            .into_iter()
            .map(|album| album.item_id)
            .collect();
        info!(provider = %provider, albums = ?visible, "Visible albums");
    }
    info!(podcasts = catalog.cached_podcasts().len(), "Podcasts are never filtered");

    Ok(())
}

fn report(outcome: SyncOutcome) {
    match outcome {
        SyncOutcome::Completed(report) => info!(
            run_id = %report.run_id,
            fetched = report.items_fetched,
            duration_ms = report.duration.as_millis() as u64,
            "Sync completed"
        ),
        SyncOutcome::Failed(message) => warn!(error = %message, "Sync failed"),
        other => info!(outcome = ?other, "Sync skipped"),
    }
}
