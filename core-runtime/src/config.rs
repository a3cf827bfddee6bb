//! # Core Configuration Module
//!
//! Tunables for the catalog core, built with a fail-fast builder.
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::config::CatalogConfig;
//! use std::time::Duration;
//!
//! let config = CatalogConfig::builder()
//!     .database_path("/tmp/catalog.db")
//!     .staleness_window(Duration::from_secs(120))
//!     .fetch_limit(500)
//!     .build()
//!     .expect("valid config");
//!
//! assert_eq!(config.fetch_limit, 500);
//! ```
//!
//! ## Error Handling
//!
//! `build()` validates eagerly and returns an actionable [`Error::Config`]:
//!
//! ```rust
//! use core_runtime::config::CatalogConfig;
//!
//! assert!(CatalogConfig::builder().fetch_limit(0).build().is_err());
//! ```

use crate::error::{Error, Result};
use crate::events::DEFAULT_EVENT_BUFFER_SIZE;
use std::path::PathBuf;
use std::time::Duration;

/// Default window after which a cached kind is considered stale.
pub const DEFAULT_STALENESS_WINDOW: Duration = Duration::from_secs(5 * 60);

/// Default page size handed to every catalog fetch.
pub const DEFAULT_FETCH_LIMIT: usize = 1000;

/// Configuration for the catalog core.
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    /// How old the last successful sync of a kind may be before a non-forced
    /// sync fetches again
    pub staleness_window: Duration,

    /// `limit` argument for every remote fetch
    pub fetch_limit: usize,

    /// Per-subscriber backlog of the event bus
    pub event_buffer_size: usize,

    /// SQLite file backing the desktop store (required by desktop bootstrap)
    pub database_path: Option<PathBuf>,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            staleness_window: DEFAULT_STALENESS_WINDOW,
            fetch_limit: DEFAULT_FETCH_LIMIT,
            event_buffer_size: DEFAULT_EVENT_BUFFER_SIZE,
            database_path: None,
        }
    }
}

impl CatalogConfig {
    pub fn builder() -> CatalogConfigBuilder {
        CatalogConfigBuilder::default()
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.staleness_window.is_zero() {
            return Err(Error::Config(
                "Staleness window must be greater than zero. \
                 Pass force = true to sync_from_api to bypass staleness instead."
                    .to_string(),
            ));
        }

        if self.fetch_limit == 0 {
            return Err(Error::Config(
                "Fetch limit must be greater than 0".to_string(),
            ));
        }

        if self.event_buffer_size == 0 {
            return Err(Error::Config(
                "Event buffer size must be greater than 0".to_string(),
            ));
        }

        if let Some(path) = &self.database_path {
            if path.as_os_str().is_empty() {
                return Err(Error::Config("Database path cannot be empty".to_string()));
            }
        }

        Ok(())
    }

    /// The database path, or a `CapabilityMissing` error naming what to do.
    pub fn require_database_path(&self) -> Result<&PathBuf> {
        self.database_path
            .as_ref()
            .ok_or_else(|| Error::CapabilityMissing {
                capability: "CatalogStore".to_string(),
                message: "No database path configured for the default SQLite catalog store. \
                          Desktop: call CatalogConfigBuilder::database_path. \
                          Mobile: inject a platform CatalogStore instead."
                    .to_string(),
            })
    }
}

/// Builder for [`CatalogConfig`].
#[derive(Debug, Default)]
pub struct CatalogConfigBuilder {
    staleness_window: Option<Duration>,
    fetch_limit: Option<usize>,
    event_buffer_size: Option<usize>,
    database_path: Option<PathBuf>,
}

impl CatalogConfigBuilder {
    pub fn staleness_window(mut self, window: Duration) -> Self {
        self.staleness_window = Some(window);
        self
    }

    pub fn fetch_limit(mut self, limit: usize) -> Self {
        self.fetch_limit = Some(limit);
        self
    }

    pub fn event_buffer_size(mut self, size: usize) -> Self {
        self.event_buffer_size = Some(size);
        self
    }

    pub fn database_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.database_path = Some(path.into());
        self
    }

    /// Builds and validates the configuration.
    pub fn build(self) -> Result<CatalogConfig> {
        let defaults = CatalogConfig::default();
        let config = CatalogConfig {
            staleness_window: self.staleness_window.unwrap_or(defaults.staleness_window),
            fetch_limit: self.fetch_limit.unwrap_or(defaults.fetch_limit),
            event_buffer_size: self.event_buffer_size.unwrap_or(defaults.event_buffer_size),
            database_path: self.database_path,
        };

        config.validate()?;
        Ok(config)
    }
}
