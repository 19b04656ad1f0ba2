//! Import scheduling
//!
//! Drives one collection of one project end-to-end: walks the paginated
//! source listing from the recorded cursor position, skips pages and
//! objects already covered by a previous attempt, and hands each new
//! object to the per-entity importer (sequential mode) or the distributed
//! worker queue (parallel mode).
//!
//! Correctness rests on two cache-backed guards rather than a lock
//! manager: the monotonic page cursor makes whole-page replays cheap to
//! reject, and dedup marks are written *before* an object is yielded, so
//! a consumer failure after marking can at worst cost one retry and never
//! imports an object twice.

pub mod strategy;

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

use gitport_common::types::Project;

use crate::cache::ImportCache;
use crate::client::ProjectClient;
use crate::config::ImportConfig;
use crate::counter::ObjectCounter;
use crate::cursor::PageCursor;
use crate::dedup::DedupTracker;
use crate::error::{ImportError, Result};

use gitport_common::types::ImportPhase;
pub use strategy::{CollectionStrategy, ImportJob, JobQueue, ObjectImporter, StrategyRegistry};

/// Completion-barrier token for one parallel batch
///
/// The engine mints the key and counts successful pushes; polling or
/// awaiting the barrier itself is owned by the queue infrastructure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobWaiter {
    pub key: String,
    pub jobs_remaining: u64,
}

impl JobWaiter {
    pub fn new() -> Self {
        Self::with_key(format!("job-waiter/{}", Uuid::new_v4()))
    }

    pub fn with_key(key: String) -> Self {
        Self {
            key,
            jobs_remaining: 0,
        }
    }
}

impl Default for JobWaiter {
    fn default() -> Self {
        Self::new()
    }
}

/// Execution mode fixed at scheduler construction
pub enum ImportMode {
    /// Import each object inline, blocking per object
    Sequential(Arc<dyn ObjectImporter>),
    /// Enqueue each object to the worker queue and return immediately
    Parallel(Arc<dyn JobQueue>),
}

/// Outcome of one scheduling run
#[derive(Debug, Default)]
pub struct ScheduleRun {
    /// Present in parallel mode; `jobs_remaining` counts successful pushes
    pub waiter: Option<JobWaiter>,
    /// Objects newly marked and yielded off accepted pages
    pub fetched: u64,
    /// Objects imported inline (sequential mode only)
    pub imported: u64,
    /// Objects pushed to the queue (parallel mode only)
    pub enqueued: u64,
    /// Objects skipped: already marked, on a rejected page, or without a
    /// stable id
    pub skipped: u64,
    /// Per-object failures (representation, import or enqueue)
    pub failed: u64,
    /// Highest page number seen from the listing
    pub last_page: u32,
}

/// Drives one collection of one project through one client
pub struct ImportScheduler {
    project: Project,
    client: Arc<dyn ProjectClient>,
    cache: Arc<ImportCache>,
    strategy: Arc<dyn CollectionStrategy>,
    counter: Arc<ObjectCounter>,
    mode: ImportMode,
    dedup_timeout: Duration,
}

impl ImportScheduler {
    pub fn new(
        project: Project,
        client: Arc<dyn ProjectClient>,
        cache: Arc<ImportCache>,
        strategy: Arc<dyn CollectionStrategy>,
        counter: Arc<ObjectCounter>,
        mode: ImportMode,
        config: &ImportConfig,
    ) -> Self {
        Self {
            project,
            client,
            cache,
            strategy,
            counter,
            mode,
            dedup_timeout: config.dedup_timeout(),
        }
    }

    /// Run the page-walk to completion
    ///
    /// Transport and rate-limit errors from the client propagate out
    /// untouched; cursor and dedup state already written stay valid, so
    /// re-invoking with the same identifiers resumes the run. Per-object
    /// failures are logged and isolated.
    pub async fn execute(&self) -> Result<ScheduleRun> {
        let collection = self.strategy.collection();
        let cursor = PageCursor::new(self.cache.clone(), &self.project, &collection);
        let dedup = DedupTracker::new(self.cache.clone(), &self.project, &collection);
        let options = self.strategy.page_options();

        let mut run = ScheduleRun::default();
        let mut waiter = match self.mode {
            ImportMode::Parallel(_) => Some(JobWaiter::new()),
            ImportMode::Sequential(_) => None,
        };

        let mut page_number = cursor.current().await?;
        info!(
            project = %self.project,
            collection = %collection,
            start_page = page_number,
            "starting collection page-walk"
        );

        loop {
            let page = self
                .client
                .fetch_page(
                    &self.project.source_identifier,
                    &collection,
                    page_number,
                    &options,
                )
                .await?;

            let Some(page) = page else {
                break;
            };

            run.last_page = run.last_page.max(page.number);

            // A rejected page number was fully covered by a previous
            // attempt; trust the cursor, not the page contents.
            if !cursor.set(page.number).await? {
                debug!(
                    project = %self.project,
                    collection = %collection,
                    page = page.number,
                    objects = page.objects.len(),
                    "page already processed, skipping"
                );
                run.skipped += page.objects.len() as u64;
                page_number = page.number + 1;
                continue;
            }

            for object in &page.objects {
                self.process_object(object, &dedup, &mut run, waiter.as_mut())
                    .await?;
            }

            page_number = page.number + 1;
        }

        // Bound the dedup set's lifetime now that scheduling is done,
        // while leaving a window for in-flight duplicate fetches.
        dedup.expire(self.dedup_timeout).await?;

        run.waiter = waiter;
        info!(
            project = %self.project,
            collection = %collection,
            fetched = run.fetched,
            imported = run.imported,
            enqueued = run.enqueued,
            skipped = run.skipped,
            failed = run.failed,
            last_page = run.last_page,
            "collection page-walk finished"
        );

        Ok(run)
    }

    async fn process_object(
        &self,
        raw: &serde_json::Value,
        dedup: &DedupTracker,
        run: &mut ScheduleRun,
        waiter: Option<&mut JobWaiter>,
    ) -> Result<()> {
        let Some(id) = self.strategy.object_id(raw) else {
            warn!(
                project = %self.project,
                collection = %self.strategy.collection(),
                "object without a stable external id, skipping"
            );
            run.skipped += 1;
            return Ok(());
        };

        if dedup.already_marked(&id).await? {
            run.skipped += 1;
            return Ok(());
        }

        // Mark before yielding: a consumer failure past this point can
        // cost one retry but never a duplicate import.
        dedup.mark(&id).await?;
        self.counter
            .increment(&self.project, self.strategy.entity_kind(), ImportPhase::Fetched)
            .await?;
        run.fetched += 1;

        let representation = match self.strategy.representation(raw) {
            Ok(representation) => representation,
            Err(error) => {
                warn!(
                    project = %self.project,
                    object_id = %id,
                    error = %error,
                    "failed to build representation"
                );
                run.failed += 1;
                return Ok(());
            }
        };

        match &self.mode {
            ImportMode::Sequential(importer) => {
                match importer.import(&self.project, &representation).await {
                    Ok(()) => {
                        self.counter
                            .increment(
                                &self.project,
                                self.strategy.entity_kind(),
                                ImportPhase::Imported,
                            )
                            .await?;
                        run.imported += 1;
                    }
                    Err(error) => {
                        warn!(
                            project = %self.project,
                            object_id = %id,
                            error = %error,
                            "inline import failed"
                        );
                        run.failed += 1;
                    }
                }
            }
            ImportMode::Parallel(queue) => {
                let Some(waiter) = waiter else {
                    return Err(ImportError::Queue(
                        "parallel run is missing its job waiter".to_string(),
                    ));
                };
                let job = ImportJob {
                    project_id: self.project.id,
                    representation,
                    waiter_key: waiter.key.clone(),
                };
                match queue.enqueue(job).await {
                    Ok(()) => {
                        waiter.jobs_remaining += 1;
                        run.enqueued += 1;
                    }
                    Err(error) => {
                        warn!(
                            project = %self.project,
                            object_id = %id,
                            error = %error,
                            "failed to enqueue import job"
                        );
                        run.failed += 1;
                    }
                }
            }
        }

        Ok(())
    }
}
