//! # Catalog Library Module
//!
//! Data model and in-memory state of the mirrored media catalog.
//!
//! ## Overview
//!
//! This module manages:
//! - Decoding provider JSON into [`MediaItem`]s, skipping items that fail validation
//! - Source tracking: which provider instances vouched for each item ([`SourceMap`])
//! - Immutable catalog generations ([`CatalogSnapshot`]) and the live [`CatalogCache`]
//! - Strict provider filtering ([`filter::filter_by_providers`])
//! - Reading and writing the persistent store ([`CatalogRepository`])

pub mod cache;
pub mod error;
pub mod filter;
pub mod models;
pub mod repository;
pub mod snapshot;
pub mod sources;

pub use cache::CatalogCache;
pub use error::{LibraryError, Result};
pub use models::{
    decode_all, dedup_by_id, DecodeError, Decoded, MediaItem, MediaKind, ProviderMapping,
    LIBRARY_PROVIDER,
};
pub use repository::{CatalogRepository, LoadedKind};
pub use snapshot::{CatalogSnapshot, SnapshotBuilder};
pub use sources::{ProviderSet, SourceMap};
