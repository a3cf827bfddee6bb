//! Workspace façade crate.
//!
//! This crate exists to expose shared feature flags that map to the individual
//! workspace crates. Host applications can depend on `catalog-workspace` and
//! enable `desktop-shims` to get the SQLite-backed defaults without wiring
//! each crate individually.

#[cfg(feature = "desktop-shims")]
pub use core_service::{bootstrap_desktop, CatalogService, CoreDependencies, CoreError, Result};
