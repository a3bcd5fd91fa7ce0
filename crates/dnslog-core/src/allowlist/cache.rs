//! Allowlist cache
//!
//! Single writer (the refresher), many readers (the filter stage). Readers
//! clone an `Arc` to the current snapshot under a read lock; the writer
//! only holds the write lock for the pointer swap itself, never for a
//! download or a parse.

use super::snapshot::{AllowlistSnapshot, ValidationToken};
use super::source::AllowlistSource;
use crate::error::{Error, Result};
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::info;

/// Shared handle to the current allowlist snapshot
///
/// Cheap to clone; all clones see the same snapshot.
#[derive(Debug, Clone)]
pub struct AllowlistCache {
    current: Arc<RwLock<Arc<AllowlistSnapshot>>>,
}

impl AllowlistCache {
    /// Create a cache holding `initial`
    pub fn new(initial: AllowlistSnapshot) -> Self {
        Self {
            current: Arc::new(RwLock::new(Arc::new(initial))),
        }
    }

    /// Download and install the first snapshot.
    ///
    /// Any failure here is startup-fatal: without a cache the filter stage
    /// must not start.
    pub async fn initialize<S: AllowlistSource>(source: &S) -> Result<Self> {
        let fetched = source.fetch().await.map_err(Error::startup)?;
        let snapshot = fetched.into_snapshot().map_err(Error::startup)?;

        info!(
            version = %snapshot.version(),
            patterns = snapshot.len(),
            rejected = snapshot.rejected().len(),
            "Allowlist initialized"
        );
        Ok(Self::new(snapshot))
    }

    /// Latest installed snapshot
    pub fn current(&self) -> Arc<AllowlistSnapshot> {
        Arc::clone(&*self.current.read())
    }

    /// Token of the latest installed snapshot
    pub fn version(&self) -> ValidationToken {
        self.current.read().version().clone()
    }

    /// Install `snapshot`, returning the one it replaced.
    ///
    /// Readers holding the previous snapshot keep it until they drop it.
    pub fn replace(&self, snapshot: AllowlistSnapshot) -> Arc<AllowlistSnapshot> {
        let next = Arc::new(snapshot);
        std::mem::replace(&mut *self.current.write(), next)
    }
}
