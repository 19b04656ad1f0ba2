//! Gitport Import Engine
//!
//! Parallel migration scheduling and caching engine for pulling an
//! external project's history (issues, pull requests, comments, labels,
//! milestones, events, users) out of a rate-limited paginated REST API.
//!
//! # Overview
//!
//! Many independent worker executions cooperate against the remote API
//! without a central lock manager; the only shared mutable state is a TTL
//! cache accessed through atomic primitives:
//!
//! - **Cache**: namespaced TTL key/value and set store behind a pluggable
//!   backend ([`cache::CacheStore`])
//! - **PageCursor**: monotonic, resumable pagination position per
//!   collection
//! - **ClientPool**: quota-aware selection among credential-bound API
//!   clients
//! - **ObjectCounter**: per-project fetched/imported progress counters
//! - **DedupTracker**: already-imported membership set preventing
//!   duplicate work across retried and relaunched jobs
//! - **ImportScheduler**: the page-walk fanning objects out inline
//!   (sequential mode) or to a distributed worker queue (parallel mode)
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use gitport_engine::cache::{ImportCache, MemoryStore};
//! use gitport_engine::config::ImportConfig;
//!
//! # fn main() -> anyhow::Result<()> {
//! let config = ImportConfig::from_env()?;
//! let cache = Arc::new(ImportCache::new(Arc::new(MemoryStore::new()), &config));
//! # let _ = cache;
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod client;
pub mod config;
pub mod counter;
pub mod cursor;
pub mod dedup;
pub mod error;
pub mod representation;
pub mod scheduler;

// Re-export the shared types crate so downstream code can bind to a
// single dependency surface.
pub use gitport_common as common;

pub use cache::{ImportCache, ReadOutcome};
pub use client::{ClientPool, Page, PageOptions, ProjectClient};
pub use config::ImportConfig;
pub use counter::{CounterSummary, MetricsHook, ObjectCounter, ProgressStore, TracingMetrics};
pub use cursor::PageCursor;
pub use dedup::DedupTracker;
pub use error::{CacheError, ImportError, Result};
pub use representation::Representation;
pub use scheduler::{
    CollectionStrategy, ImportJob, ImportMode, ImportScheduler, JobQueue, JobWaiter,
    ObjectImporter, ScheduleRun, StrategyRegistry,
};
