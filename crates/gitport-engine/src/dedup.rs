//! Already-imported tracking
//!
//! Membership set of external object ids already scheduled for one
//! collection of one project. Marking is idempotent and happens before an
//! object is yielded or enqueued, so a redelivered queue message or a
//! refetched page can never double-import an object. The set is
//! append-only during a run and expired (not deleted) once scheduling
//! completes, leaving a window for in-flight duplicate page fetches to
//! still observe the marks.

use std::sync::Arc;
use std::time::Duration;

use gitport_common::types::{Collection, Project};

use crate::cache::ImportCache;
use crate::error::CacheError;

/// Per-collection set of already-scheduled external object ids
pub struct DedupTracker {
    cache: Arc<ImportCache>,
    key: String,
}

impl DedupTracker {
    pub fn new(cache: Arc<ImportCache>, project: &Project, collection: &Collection) -> Self {
        Self {
            cache,
            key: format!("already-imported/{}/{}", project.id, collection),
        }
    }

    /// Mark an external object id as scheduled. Idempotent.
    pub async fn mark(&self, id: &str) -> Result<(), CacheError> {
        self.cache.set_add(&self.key, id).await?;
        Ok(())
    }

    /// Whether an external object id has already been scheduled
    pub async fn already_marked(&self, id: &str) -> Result<bool, CacheError> {
        self.cache.set_includes(&self.key, id).await
    }

    /// Bound the set's remaining lifetime once the run completes
    pub async fn expire(&self, timeout: Duration) -> Result<(), CacheError> {
        self.cache.expire(&self.key, timeout).await
    }
}
