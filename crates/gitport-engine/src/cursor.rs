//! Resumable page cursor
//!
//! Tracks the highest page number already handed out for one collection of
//! one project. The cursor only moves forward: a retried or out-of-order
//! page arriving after a later page has advanced it is rejected, which is
//! what lets a relaunched run refetch from the recorded position and skip
//! pages it already covered without inspecting their contents.

use std::sync::Arc;

use gitport_common::types::{Collection, Project};

use crate::cache::ImportCache;
use crate::error::CacheError;

/// Per-collection pagination position
pub struct PageCursor {
    cache: Arc<ImportCache>,
    key: String,
}

impl PageCursor {
    pub fn new(cache: Arc<ImportCache>, project: &Project, collection: &Collection) -> Self {
        Self {
            cache,
            key: format!("page-counter/{}/{}", project.id, collection),
        }
    }

    /// The page to resume from; 1 when nothing has been recorded yet
    pub async fn current(&self) -> Result<u32, CacheError> {
        Ok(self
            .cache
            .read_integer(&self.key)
            .await?
            .and_then(|value| u32::try_from(value).ok())
            .unwrap_or(1))
    }

    /// Record that `page` is being processed
    ///
    /// Returns false when the stored cursor already covers this page, in
    /// which case the caller must skip the page's objects entirely.
    pub async fn set(&self, page: u32) -> Result<bool, CacheError> {
        self.cache.write_if_greater(&self.key, u64::from(page)).await
    }
}
