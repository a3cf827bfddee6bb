//! # Host Bridge Traits
//!
//! Contracts between the catalog core and the host application.
//!
//! ## Overview
//!
//! The core never talks to a database, a network socket or a log file
//! directly. Every such capability is injected through one of the traits in
//! this crate, so the same core runs on desktop, iOS and Android with
//! platform-native implementations behind it.
//!
//! ## Traits
//!
//! ### Catalog
//! - [`CatalogStore`](catalog::CatalogStore) - Durable item cache plus per-kind sync metadata
//! - [`CatalogApi`](catalog::CatalogApi) - Remote multi-provider catalog, optionally scoped per provider instance
//!
//! ### Utilities
//! - [`Clock`](time::Clock) - Time source for deterministic testing
//! - [`LoggerSink`](time::LoggerSink) - Forward structured logs to host logging
//!
//! ## Platform Requirements
//!
//! | Platform | Implementation Crate | Status |
//! |----------|---------------------|--------|
//! | Desktop  | `bridge-desktop`    | ✅ SQLite store |
//! | iOS      | TBD                 | 📋 Planned |
//! | Android  | TBD                 | 📋 Planned |
//!
//! ## Error Handling
//!
//! All bridge traits use [`BridgeError`](error::BridgeError). Implementations
//! should convert platform errors into it with an actionable message.
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` so a single instance can be shared
//! across tokio tasks behind an `Arc`.

pub mod catalog;
pub mod error;
pub mod time;

pub use error::BridgeError;

// Re-export commonly used types
pub use catalog::{CachedRow, CatalogApi, CatalogStore, MediaKind, UpsertRow};
pub use time::{Clock, LogEntry, LogLevel, LoggerSink, ManualClock, SystemClock};
