//! # Catalog Sync Module
//!
//! Mirrors the remote multi-provider catalog into the local cache.
//!
//! ## Overview
//!
//! This module manages:
//! - Loading the persisted catalog at startup without touching the network
//! - Full and provider-scoped refreshes with source tracking
//! - Atomic publication of each new catalog generation
//! - Targeted removal, sort overrides and logout clearing
//!
//! ## Components
//!
//! - **Sync Status State Machine** (`status`): `Idle → Syncing → Completed | Error`
//! - **Merge** (`merge`): pure functions building the next generation of a kind
//! - **Catalog Sync** (`orchestrator`): re-entrancy guard, staleness policy,
//!   fetch strategy, persistence and publication

pub mod error;
pub mod merge;
pub mod orchestrator;
pub mod status;

pub use error::{Result, SyncError};
pub use merge::{MergedKind, ProviderBatch};
pub use orchestrator::{CacheLoadReport, CatalogSync, SyncOutcome, SyncReport, SyncRunId};
pub use status::{SyncState, SyncStatus};
