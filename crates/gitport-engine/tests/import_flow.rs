//! End-to-end scheduling scenarios against an in-memory store: a full
//! sequential run, a crash-and-resume run over the same cache, parallel
//! enqueueing with the completion barrier, and per-object failure
//! isolation.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;

use gitport_engine::common::types::{Collection, EntityKind, ImportPhase, Project};
use gitport_engine::{
    CollectionStrategy, ImportCache, ImportConfig, ImportError, ImportJob, ImportMode,
    ImportScheduler, JobQueue, ObjectCounter, ObjectImporter, Page, PageOptions, ProgressStore,
    ProjectClient, Representation, Result, TracingMetrics,
};
use gitport_engine::cache::MemoryStore;
use gitport_engine::client::SortDirection;
use gitport_engine::counter::CounterSummary;

/// Serves a fixed listing; optionally fails when asked for one page
/// number, standing in for a transport outage mid-run.
struct ScriptedClient {
    pages: Vec<Page>,
    fail_on_page: Option<u32>,
}

impl ScriptedClient {
    fn new(pages: Vec<Page>) -> Self {
        Self {
            pages,
            fail_on_page: None,
        }
    }

    fn failing_on_page(pages: Vec<Page>, page: u32) -> Self {
        Self {
            pages,
            fail_on_page: Some(page),
        }
    }
}

#[async_trait]
impl ProjectClient for ScriptedClient {
    fn has_requests_remaining(&self) -> bool {
        true
    }

    fn remaining_requests(&self) -> u64 {
        5000
    }

    fn rate_limit_resets_in(&self) -> Duration {
        Duration::ZERO
    }

    async fn fetch_page(
        &self,
        _source_identifier: &str,
        _collection: &Collection,
        page: u32,
        _options: &PageOptions,
    ) -> std::result::Result<Option<Page>, ImportError> {
        if self.fail_on_page == Some(page) {
            return Err(ImportError::Transport("connection reset".to_string()));
        }
        Ok(self
            .pages
            .iter()
            .find(|candidate| candidate.number == page)
            .cloned())
    }
}

struct IssuesStrategy;

impl CollectionStrategy for IssuesStrategy {
    fn collection(&self) -> Collection {
        Collection::from(Collection::ISSUES)
    }

    fn entity_kind(&self) -> EntityKind {
        EntityKind::Issue
    }

    fn page_options(&self) -> PageOptions {
        PageOptions::new("all", "created", SortDirection::Asc)
    }

    fn object_id(&self, raw: &serde_json::Value) -> Option<String> {
        raw.get("id").and_then(|id| id.as_i64()).map(|id| id.to_string())
    }

    fn representation(&self, raw: &serde_json::Value) -> std::result::Result<Representation, ImportError> {
        Ok(Representation::builder()
            .raw("id", raw)?
            .raw("title", raw)?
            .build())
    }
}

#[derive(Default)]
struct RecordingImporter {
    imported: Mutex<Vec<Representation>>,
    fail_ids: HashSet<i64>,
}

impl RecordingImporter {
    fn failing_for(ids: impl IntoIterator<Item = i64>) -> Self {
        Self {
            imported: Mutex::new(Vec::new()),
            fail_ids: ids.into_iter().collect(),
        }
    }

    fn imported_ids(&self) -> Vec<i64> {
        self.imported
            .lock()
            .unwrap()
            .iter()
            .filter_map(|representation| representation.integer("id"))
            .collect()
    }
}

#[async_trait]
impl ObjectImporter for RecordingImporter {
    async fn import(
        &self,
        _project: &Project,
        representation: &Representation,
    ) -> std::result::Result<(), ImportError> {
        if let Some(id) = representation.integer("id") {
            if self.fail_ids.contains(&id) {
                return Err(ImportError::InvalidObject(format!(
                    "importer rejected object {id}"
                )));
            }
        }
        self.imported.lock().unwrap().push(representation.clone());
        Ok(())
    }
}

#[derive(Default)]
struct RecordingQueue {
    jobs: Mutex<Vec<ImportJob>>,
    fail_ids: HashSet<i64>,
}

impl RecordingQueue {
    fn failing_for(ids: impl IntoIterator<Item = i64>) -> Self {
        Self {
            jobs: Mutex::new(Vec::new()),
            fail_ids: ids.into_iter().collect(),
        }
    }

    fn enqueued_ids(&self) -> Vec<i64> {
        self.jobs
            .lock()
            .unwrap()
            .iter()
            .filter_map(|job| job.representation.integer("id"))
            .collect()
    }
}

#[async_trait]
impl JobQueue for RecordingQueue {
    async fn enqueue(&self, job: ImportJob) -> std::result::Result<(), ImportError> {
        if let Some(id) = job.representation.integer("id") {
            if self.fail_ids.contains(&id) {
                return Err(ImportError::Queue(format!("queue rejected object {id}")));
            }
        }
        self.jobs.lock().unwrap().push(job);
        Ok(())
    }
}

struct NeverFinished;

#[async_trait]
impl ProgressStore for NeverFinished {
    async fn is_finished(&self, _project: &Project) -> Result<bool> {
        Ok(false)
    }

    async fn persisted_summary(&self, _project: &Project) -> Result<CounterSummary> {
        Ok(CounterSummary::default())
    }
}

fn issue(id: i64, title: &str) -> serde_json::Value {
    json!({"id": id, "title": title})
}

fn two_page_listing() -> Vec<Page> {
    vec![
        Page {
            number: 1,
            objects: vec![issue(1, "issue A"), issue(2, "issue B")],
        },
        Page {
            number: 2,
            objects: vec![issue(3, "issue C")],
        },
    ]
}

fn shared_cache() -> Arc<ImportCache> {
    Arc::new(ImportCache::new(
        Arc::new(MemoryStore::new()),
        &ImportConfig::default(),
    ))
}

fn counter(cache: Arc<ImportCache>) -> Arc<ObjectCounter> {
    Arc::new(ObjectCounter::new(
        cache,
        Arc::new(TracingMetrics),
        Arc::new(NeverFinished),
    ))
}

fn scheduler(
    cache: Arc<ImportCache>,
    client: Arc<dyn ProjectClient>,
    mode: ImportMode,
) -> ImportScheduler {
    ImportScheduler::new(
        Project::new(1, "octo-org/octo-repo"),
        client,
        cache.clone(),
        Arc::new(IssuesStrategy),
        counter(cache),
        mode,
        &ImportConfig::default(),
    )
}

#[tokio::test(start_paused = true)]
async fn test_sequential_run_imports_every_object_once() {
    let cache = shared_cache();
    let importer = Arc::new(RecordingImporter::default());
    let scheduler = scheduler(
        cache.clone(),
        Arc::new(ScriptedClient::new(two_page_listing())),
        ImportMode::Sequential(importer.clone()),
    );

    let run = scheduler.execute().await.unwrap();

    assert_eq!(run.fetched, 3);
    assert_eq!(run.imported, 3);
    assert_eq!(run.enqueued, 0);
    assert_eq!(run.skipped, 0);
    assert_eq!(run.failed, 0);
    assert_eq!(run.last_page, 2);
    assert!(run.waiter.is_none());
    assert_eq!(importer.imported_ids(), vec![1, 2, 3]);
}

#[tokio::test(start_paused = true)]
async fn test_sequential_run_records_progress_counters() {
    let cache = shared_cache();
    let counter = counter(cache.clone());
    let importer = Arc::new(RecordingImporter::default());
    let project = Project::new(1, "octo-org/octo-repo");
    let scheduler = ImportScheduler::new(
        project.clone(),
        Arc::new(ScriptedClient::new(two_page_listing())),
        cache,
        Arc::new(IssuesStrategy),
        counter.clone(),
        ImportMode::Sequential(importer),
        &ImportConfig::default(),
    );

    scheduler.execute().await.unwrap();

    let summary = counter.summary(&project).await.unwrap();
    assert_eq!(summary.get(ImportPhase::Fetched, EntityKind::Issue), 3);
    assert_eq!(summary.get(ImportPhase::Imported, EntityKind::Issue), 3);
    assert_eq!(summary.get(ImportPhase::Fetched, EntityKind::Label), 0);
}

#[tokio::test(start_paused = true)]
async fn test_resume_after_crash_skips_covered_page_without_duplicates() {
    let cache = shared_cache();

    // First attempt covers page 1, then the transport dies on page 2.
    let importer = Arc::new(RecordingImporter::default());
    let crashed = scheduler(
        cache.clone(),
        Arc::new(ScriptedClient::failing_on_page(two_page_listing(), 2)),
        ImportMode::Sequential(importer.clone()),
    );
    let error = crashed.execute().await.unwrap_err();
    assert!(matches!(error, ImportError::Transport(_)));
    assert_eq!(importer.imported_ids(), vec![1, 2]);

    // The relaunch starts from the recorded cursor, refetches page 1,
    // rejects it wholesale and only processes page 2.
    let resumed_importer = Arc::new(RecordingImporter::default());
    let resumed = scheduler(
        cache,
        Arc::new(ScriptedClient::new(two_page_listing())),
        ImportMode::Sequential(resumed_importer.clone()),
    );
    let run = resumed.execute().await.unwrap();

    assert_eq!(run.skipped, 2);
    assert_eq!(run.fetched, 1);
    assert_eq!(run.imported, 1);
    assert_eq!(run.last_page, 2);
    assert_eq!(resumed_importer.imported_ids(), vec![3]);
}

#[tokio::test(start_paused = true)]
async fn test_parallel_run_enqueues_jobs_under_one_waiter() {
    let cache = shared_cache();
    let queue = Arc::new(RecordingQueue::default());
    let scheduler = scheduler(
        cache,
        Arc::new(ScriptedClient::new(two_page_listing())),
        ImportMode::Parallel(queue.clone()),
    );

    let run = scheduler.execute().await.unwrap();

    assert_eq!(run.enqueued, 3);
    assert_eq!(run.imported, 0);
    let waiter = run.waiter.expect("parallel run returns a waiter");
    assert_eq!(waiter.jobs_remaining, 3);
    assert!(waiter.key.starts_with("job-waiter/"));

    let jobs = queue.jobs.lock().unwrap();
    assert_eq!(jobs.len(), 3);
    for job in jobs.iter() {
        assert_eq!(job.project_id, 1);
        assert_eq!(job.waiter_key, waiter.key);
    }
    assert_eq!(jobs[0].representation.integer("id"), Some(1));
    assert_eq!(jobs[0].representation.text("title"), Some("issue A"));
}

#[tokio::test(start_paused = true)]
async fn test_enqueue_failures_do_not_stop_the_run() {
    let cache = shared_cache();
    let queue = Arc::new(RecordingQueue::failing_for([2]));
    let scheduler = scheduler(
        cache,
        Arc::new(ScriptedClient::new(two_page_listing())),
        ImportMode::Parallel(queue.clone()),
    );

    let run = scheduler.execute().await.unwrap();

    assert_eq!(run.fetched, 3);
    assert_eq!(run.enqueued, 2);
    assert_eq!(run.failed, 1);
    // Only successful pushes count towards the completion barrier
    let waiter = run.waiter.expect("parallel run returns a waiter");
    assert_eq!(waiter.jobs_remaining, 2);
    assert_eq!(queue.enqueued_ids(), vec![1, 3]);
}

#[tokio::test(start_paused = true)]
async fn test_per_object_failures_do_not_stop_the_run() {
    let cache = shared_cache();
    let importer = Arc::new(RecordingImporter::failing_for([2]));
    let scheduler = scheduler(
        cache,
        Arc::new(ScriptedClient::new(two_page_listing())),
        ImportMode::Sequential(importer.clone()),
    );

    let run = scheduler.execute().await.unwrap();

    assert_eq!(run.fetched, 3);
    assert_eq!(run.imported, 2);
    assert_eq!(run.failed, 1);
    assert_eq!(importer.imported_ids(), vec![1, 3]);
}

#[tokio::test(start_paused = true)]
async fn test_objects_without_an_id_are_skipped() {
    let cache = shared_cache();
    let importer = Arc::new(RecordingImporter::default());
    let pages = vec![Page {
        number: 1,
        objects: vec![issue(1, "issue A"), json!({"title": "no id"})],
    }];
    let scheduler = scheduler(
        cache,
        Arc::new(ScriptedClient::new(pages)),
        ImportMode::Sequential(importer.clone()),
    );

    let run = scheduler.execute().await.unwrap();

    assert_eq!(run.fetched, 1);
    assert_eq!(run.imported, 1);
    assert_eq!(run.skipped, 1);
    assert_eq!(importer.imported_ids(), vec![1]);
}

#[tokio::test(start_paused = true)]
async fn test_rerun_after_completion_is_a_noop() {
    let cache = shared_cache();
    let importer = Arc::new(RecordingImporter::default());
    let first = scheduler(
        cache.clone(),
        Arc::new(ScriptedClient::new(two_page_listing())),
        ImportMode::Sequential(importer.clone()),
    );
    first.execute().await.unwrap();

    let rerun_importer = Arc::new(RecordingImporter::default());
    let second = scheduler(
        cache,
        Arc::new(ScriptedClient::new(two_page_listing())),
        ImportMode::Sequential(rerun_importer.clone()),
    );
    let run = second.execute().await.unwrap();

    // The rerun resumes at the recorded cursor (page 2), which the
    // cursor rejects wholesale; page 1 is never refetched.
    assert_eq!(run.imported, 0);
    assert_eq!(run.fetched, 0);
    assert_eq!(run.skipped, 1);
    assert_eq!(run.last_page, 2);
    assert!(rerun_importer.imported_ids().is_empty());
}
