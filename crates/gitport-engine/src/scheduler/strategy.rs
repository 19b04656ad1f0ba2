//! Collection strategy seam
//!
//! Everything collection-specific (listing options, stable external ids,
//! representation building) lives behind [`CollectionStrategy`], with one
//! implementation per entity type. Strategies are registered in a
//! [`StrategyRegistry`] at startup and injected into the scheduler, so
//! adding an entity type never touches the page-walk.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use gitport_common::types::{Collection, EntityKind, Project};

use crate::client::PageOptions;
use crate::error::ImportError;
use crate::representation::Representation;

/// Collection-specific behavior plugged into the scheduler
pub trait CollectionStrategy: Send + Sync {
    /// The collection this strategy drives (cache key scope)
    fn collection(&self) -> Collection;

    /// Entity kind reported to the object counter
    fn entity_kind(&self) -> EntityKind;

    /// Listing options (state filter, sort order) for stable pagination
    fn page_options(&self) -> PageOptions;

    /// Stable external id of a raw object, used for dedup marking.
    /// `None` means the object cannot be identified and must be skipped.
    fn object_id(&self, raw: &serde_json::Value) -> Option<String>;

    /// Build the importable snapshot of a raw object
    fn representation(&self, raw: &serde_json::Value) -> Result<Representation, ImportError>;
}

/// Lookup table from collection name to strategy, built at startup
#[derive(Default)]
pub struct StrategyRegistry {
    strategies: HashMap<Collection, Arc<dyn CollectionStrategy>>,
}

impl StrategyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a strategy under its collection name
    ///
    /// Registering two strategies for the same collection is a wiring
    /// mistake and is rejected.
    pub fn register(&mut self, strategy: Arc<dyn CollectionStrategy>) -> Result<(), ImportError> {
        let collection = strategy.collection();
        if self.strategies.contains_key(&collection) {
            return Err(ImportError::Config(format!(
                "duplicate strategy registered for collection '{}'",
                collection
            )));
        }
        self.strategies.insert(collection, strategy);
        Ok(())
    }

    pub fn get(&self, collection: &Collection) -> Option<Arc<dyn CollectionStrategy>> {
        self.strategies.get(collection).cloned()
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }
}

/// Per-entity importer used in sequential mode
///
/// Maps a representation onto local records; supplied by the embedding
/// application per entity type.
#[async_trait]
pub trait ObjectImporter: Send + Sync {
    async fn import(
        &self,
        project: &Project,
        representation: &Representation,
    ) -> Result<(), ImportError>;
}

/// One unit of work handed to the distributed queue in parallel mode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportJob {
    pub project_id: i64,
    pub representation: Representation,
    pub waiter_key: String,
}

/// Asynchronous worker queue boundary
///
/// Delivery is at-least-once; the scheduler's dedup marking is what makes
/// redelivery safe on the consuming side.
#[async_trait]
pub trait JobQueue: Send + Sync {
    async fn enqueue(&self, job: ImportJob) -> Result<(), ImportError>;
}
