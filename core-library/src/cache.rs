//! Live catalog cache
//!
//! Holds the currently published [`CatalogSnapshot`]. Readers take a cheap
//! `Arc` clone and never wait on I/O; writers replace the whole snapshot in a
//! single assignment, so no reader can observe a half-applied change.

use parking_lot::RwLock;
use std::sync::Arc;

use crate::snapshot::CatalogSnapshot;

pub struct CatalogCache {
    live: RwLock<Arc<CatalogSnapshot>>,
}

impl Default for CatalogCache {
    fn default() -> Self {
        Self::new()
    }
}

impl CatalogCache {
    pub fn new() -> Self {
        Self {
            live: RwLock::new(Arc::new(CatalogSnapshot::empty())),
        }
    }

    /// The published snapshot.
    pub fn current(&self) -> Arc<CatalogSnapshot> {
        Arc::clone(&self.live.read())
    }

    /// Publish `next` as the following generation and return it.
    pub fn publish(&self, next: CatalogSnapshot) -> Arc<CatalogSnapshot> {
        let mut live = self.live.write();
        let published = Arc::new(next.with_generation(live.generation() + 1));
        *live = Arc::clone(&published);
        published
    }

    /// Derive and publish a new generation from the current one.
    ///
    /// `derive` runs under the write lock and must not block. Returning
    /// `None` leaves the live snapshot untouched.
    pub fn update<R, F>(&self, derive: F) -> Option<(Arc<CatalogSnapshot>, R)>
    where
        F: FnOnce(&CatalogSnapshot) -> Option<(CatalogSnapshot, R)>,
    {
        let mut live = self.live.write();
        let (next, result) = derive(&live)?;
        let published = Arc::new(next.with_generation(live.generation() + 1));
        *live = Arc::clone(&published);
        Some((published, result))
    }
}

impl std::fmt::Debug for CatalogCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let live = self.live.read();
        f.debug_struct("CatalogCache")
            .field("generation", &live.generation())
            .field("total_items", &live.total_items())
            .finish()
    }
}
