//! Per-project import progress counters
//!
//! Counts objects per entity kind and phase (`fetched` at page-walk time,
//! `imported` at successful-import time) through atomic cache adds, and
//! signals the live-progress hook after every change. While an import is
//! running the summary reads live counters; once the project is marked
//! finished it comes from the permanently persisted snapshot, because the
//! live counters are allowed to expire after that point.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

use gitport_common::types::{EntityKind, ImportPhase, Project};

use crate::cache::ImportCache;
use crate::error::Result;

/// Snapshot of counters for one project
///
/// Serializable because the finishing workflow persists it as the
/// project's terminal checksums.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterSummary {
    pub fetched: BTreeMap<EntityKind, i64>,
    pub imported: BTreeMap<EntityKind, i64>,
}

impl CounterSummary {
    pub fn get(&self, phase: ImportPhase, kind: EntityKind) -> i64 {
        self.phase(phase).get(&kind).copied().unwrap_or(0)
    }

    pub fn phase(&self, phase: ImportPhase) -> &BTreeMap<EntityKind, i64> {
        match phase {
            ImportPhase::Fetched => &self.fetched,
            ImportPhase::Imported => &self.imported,
        }
    }

    fn phase_mut(&mut self, phase: ImportPhase) -> &mut BTreeMap<EntityKind, i64> {
        match phase {
            ImportPhase::Fetched => &mut self.fetched,
            ImportPhase::Imported => &mut self.imported,
        }
    }

    pub fn set(&mut self, phase: ImportPhase, kind: EntityKind, count: i64) {
        self.phase_mut(phase).insert(kind, count);
    }
}

/// Metrics and live-progress notification hook
///
/// Called after every counter change so a progress endpoint can
/// invalidate whatever it caches. Implementations must be cheap and
/// non-blocking.
pub trait MetricsHook: Send + Sync {
    /// A named counter labeled by entity kind and phase changed by `value`
    fn counter_increment(&self, kind: EntityKind, phase: ImportPhase, value: i64);

    /// The project's live progress changed
    fn invalidate_progress(&self, project: &Project);
}

/// Default hook that emits counter changes as debug telemetry
#[derive(Debug, Default)]
pub struct TracingMetrics;

impl MetricsHook for TracingMetrics {
    fn counter_increment(&self, kind: EntityKind, phase: ImportPhase, value: i64) {
        debug!(kind = %kind, phase = %phase, value, "object counter incremented");
    }

    fn invalidate_progress(&self, project: &Project) {
        debug!(project = %project, "live progress changed");
    }
}

/// Terminal progress persistence for finished projects
///
/// Implemented by the embedding application against durable storage; the
/// engine only reads it back once `is_finished` reports true.
#[async_trait]
pub trait ProgressStore: Send + Sync {
    async fn is_finished(&self, project: &Project) -> Result<bool>;

    /// The checksum snapshot persisted when the project import finished
    async fn persisted_summary(&self, project: &Project) -> Result<CounterSummary>;
}

/// Per-project, per-kind, per-phase running counters
pub struct ObjectCounter {
    cache: Arc<ImportCache>,
    metrics: Arc<dyn MetricsHook>,
    progress: Arc<dyn ProgressStore>,
}

impl ObjectCounter {
    pub fn new(
        cache: Arc<ImportCache>,
        metrics: Arc<dyn MetricsHook>,
        progress: Arc<dyn ProgressStore>,
    ) -> Self {
        Self {
            cache,
            metrics,
            progress,
        }
    }

    fn counter_key(project: &Project, kind: EntityKind, phase: ImportPhase) -> String {
        format!("object-counter/{}/{}/{}", project.id, kind, phase)
    }

    /// Count one object
    pub async fn increment(
        &self,
        project: &Project,
        kind: EntityKind,
        phase: ImportPhase,
    ) -> Result<i64> {
        self.increment_by(project, kind, phase, 1).await
    }

    /// Count `value` objects; `value <= 0` changes nothing
    pub async fn increment_by(
        &self,
        project: &Project,
        kind: EntityKind,
        phase: ImportPhase,
        value: i64,
    ) -> Result<i64> {
        if value <= 0 {
            return Ok(0);
        }

        let total = self
            .cache
            .increment_by(&Self::counter_key(project, kind, phase), value)
            .await?;

        self.metrics.counter_increment(kind, phase, value);
        self.metrics.invalidate_progress(project);

        Ok(total)
    }

    /// Progress summary across all known entity kinds
    ///
    /// Live counters for a running import (cache misses read as 0, so the
    /// summary is always well-formed even if a counter expired mid-read);
    /// the persisted terminal snapshot for a finished one.
    pub async fn summary(&self, project: &Project) -> Result<CounterSummary> {
        if self.progress.is_finished(project).await? {
            return self.progress.persisted_summary(project).await;
        }

        let mut summary = CounterSummary::default();
        for phase in ImportPhase::ALL {
            for kind in EntityKind::ALL {
                let count = self
                    .cache
                    .read_integer(&Self::counter_key(project, kind, phase))
                    .await?
                    .unwrap_or(0);
                summary.set(phase, kind, count);
            }
        }

        Ok(summary)
    }
}
