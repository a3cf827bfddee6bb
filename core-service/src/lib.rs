//! Core service façade and bootstrap helpers.
//!
//! This crate wires host-provided bridge implementations (catalog store,
//! clock) into the catalog core. Desktop apps typically enable the
//! `desktop-shims` feature (which depends on `bridge-desktop`) and call
//! [`bootstrap_desktop`]; mobile hosts build [`CoreDependencies`] from their
//! own platform bridges and call [`CatalogService::new`].
//!
//! There is no global instance: the host owns the service and hands
//! [`CatalogService::catalog`] to whatever UI layer needs it.

pub mod error;

pub use error::{CoreError, Result};

use std::sync::Arc;

use bridge_traits::{catalog::CatalogStore, time::Clock};
use core_runtime::{config::CatalogConfig, events::EventBus};
use core_sync::CatalogSync;
use tracing::info;

/// Aggregated handle to all bridge dependencies the core requires.
pub struct CoreDependencies {
    pub catalog_store: Arc<dyn CatalogStore>,
    pub clock: Arc<dyn Clock>,
}

impl CoreDependencies {
    /// Construct a dependency bundle from explicit bridge handles.
    pub fn new(catalog_store: Arc<dyn CatalogStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            catalog_store,
            clock,
        }
    }
}

/// Primary façade exposed to host applications.
#[derive(Clone)]
pub struct CatalogService {
    config: CatalogConfig,
    deps: Arc<CoreDependencies>,
    event_bus: EventBus,
    catalog: Arc<CatalogSync>,
}

impl CatalogService {
    /// Create a new service from the provided configuration and dependencies.
    ///
    /// # Errors
    ///
    /// Returns an error if `config` does not validate.
    pub fn new(config: CatalogConfig, deps: CoreDependencies) -> Result<Self> {
        config.validate()?;

        let event_bus = EventBus::new(config.event_buffer_size);
        let catalog = Arc::new(CatalogSync::new(
            config.clone(),
            Arc::clone(&deps.catalog_store),
            event_bus.clone(),
            Arc::clone(&deps.clock),
        ));

        info!(
            fetch_limit = config.fetch_limit,
            staleness_secs = config.staleness_window.as_secs(),
            "Catalog service initialized"
        );

        Ok(Self {
            config,
            deps: Arc::new(deps),
            event_bus,
            catalog,
        })
    }

    /// The catalog orchestrator shared by every clone of this service.
    pub fn catalog(&self) -> Arc<CatalogSync> {
        Arc::clone(&self.catalog)
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    /// Access the bridge dependencies being used by the service.
    pub fn dependencies(&self) -> Arc<CoreDependencies> {
        Arc::clone(&self.deps)
    }
}

/// Convenience bootstrapper for desktop hosts.
///
/// Opens the SQLite catalog store at `config.database_path` and uses the
/// system clock.
///
/// ```no_run
/// # async fn example() -> core_service::Result<()> {
/// use core_runtime::config::CatalogConfig;
/// use core_service::bootstrap_desktop;
///
/// let config = CatalogConfig::builder()
///     .database_path("/var/lib/app/catalog.db")
///     .build()?;
/// let service = bootstrap_desktop(config).await?;
/// service.catalog().load_from_cache().await;
/// # Ok(())
/// # }
/// ```
#[cfg(feature = "desktop-shims")]
pub async fn bootstrap_desktop(config: CatalogConfig) -> Result<CatalogService> {
    use bridge_desktop::SqliteCatalogStore;
    use bridge_traits::time::SystemClock;
    use core_runtime::logging::strip_path;

    config.validate()?;
    let path = config.require_database_path()?.clone();
    info!(database = %strip_path(&path.to_string_lossy()), "Opening catalog store");

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let store = SqliteCatalogStore::new(path, Arc::clone(&clock))
        .await
        .map_err(|err| CoreError::InitializationFailed(err.to_string()))?;

    CatalogService::new(config, CoreDependencies::new(Arc::new(store), clock))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_desktop::InMemoryCatalogStore;
    use bridge_traits::time::ManualClock;
    use std::time::Duration;

    fn deps() -> CoreDependencies {
        let clock: Arc<dyn Clock> = Arc::new(ManualClock::default());
        CoreDependencies::new(Arc::new(InMemoryCatalogStore::new(clock.clone())), clock)
    }

    #[tokio::test]
    async fn test_service_shares_one_catalog() {
        let service = CatalogService::new(CatalogConfig::default(), deps()).unwrap();
        let clone = service.clone();

        assert!(Arc::ptr_eq(&service.catalog(), &clone.catalog()));

        let mut events = service.event_bus().subscribe();
        clone.catalog().load_from_cache().await;
        assert!(events.try_recv().is_ok());
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = CatalogConfig {
            staleness_window: Duration::ZERO,
            ..CatalogConfig::default()
        };
        assert!(matches!(
            CatalogService::new(config, deps()),
            Err(CoreError::Runtime(_))
        ));
    }

    #[cfg(feature = "desktop-shims")]
    #[tokio::test]
    async fn test_bootstrap_desktop_requires_database_path() {
        match bootstrap_desktop(CatalogConfig::default()).await {
            Err(CoreError::CapabilityMissing { capability, .. }) => {
                assert_eq!(capability, "CatalogStore")
            }
            Err(other) => panic!("unexpected error: {}", other),
            Ok(_) => panic!("bootstrap should fail without a database path"),
        }
    }

    #[cfg(feature = "desktop-shims")]
    #[tokio::test]
    async fn test_bootstrap_desktop_opens_store() {
        let dir = std::env::temp_dir().join(format!("catalog-service-{}", std::process::id()));
        let config = CatalogConfig::builder()
            .database_path(dir.join("catalog.db"))
            .build()
            .unwrap();

        let service = bootstrap_desktop(config).await.unwrap();
        let report = service.catalog().load_from_cache().await;
        assert_eq!(report.items_loaded, 0);

        drop(service);
        let _ = std::fs::remove_dir_all(dir);
    }
}
