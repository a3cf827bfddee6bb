//! # Core Runtime Module
//!
//! Runtime infrastructure shared by every catalog crate:
//! - Logging and tracing infrastructure
//! - Configuration management
//! - Event bus system
//!
//! ## Overview
//!
//! Nothing in here knows about albums or providers. It establishes the
//! logging conventions, the tunables and the broadcast channel that the
//! library and sync crates build on.

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use config::{CatalogConfig, CatalogConfigBuilder};
pub use error::{Error, Result};
pub use events::{CatalogEvent, ChangeReason, CoreEvent, EventBus, SyncEvent};
