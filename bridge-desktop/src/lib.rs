//! # Desktop Bridge Implementations
//!
//! Default implementations of bridge traits for desktop platforms
//! (macOS, Windows, Linux).
//!
//! ## Overview
//!
//! - `CatalogStore` using a SQLite database ([`SqliteCatalogStore`])
//! - `CatalogStore` held in process memory ([`InMemoryCatalogStore`])
//!
//! The remote `CatalogApi` is always supplied by the host application.
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::SqliteCatalogStore;
//! use bridge_traits::SystemClock;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let store = SqliteCatalogStore::new("catalog.db".into(), Arc::new(SystemClock))
//!         .await
//!         .unwrap();
//!
//!     // Hand to CoreDependencies
//! }
//! ```

mod catalog_store;
mod memory_store;

pub use catalog_store::SqliteCatalogStore;
pub use memory_store::InMemoryCatalogStore;
