//! Source API clients and quota-aware selection
//!
//! The HTTP transport lives outside the engine; it plugs in through the
//! [`ProjectClient`] trait. A deployment typically holds several clients,
//! one per credential, and asks the [`ClientPool`] for the best one before
//! each batch of page requests; quota numbers are time-varying, so the
//! answer is only good for the request batch it was fetched for.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use gitport_common::types::Collection;

use crate::error::ImportError;

/// One page of raw objects from the source API
#[derive(Debug, Clone)]
pub struct Page {
    /// 1-based page number as reported by the source listing
    pub number: u32,
    /// Raw objects as returned by the API
    pub objects: Vec<serde_json::Value>,
}

/// Sort direction for a collection listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

/// Collection-specific request options (state filter, sort order)
///
/// Resolved by the collection strategy; e.g. issues are listed in "all"
/// state sorted by creation time so pagination is stable across runs.
#[derive(Debug, Clone, Default)]
pub struct PageOptions {
    pub state: Option<String>,
    pub sort: Option<String>,
    pub direction: SortDirection,
}

impl PageOptions {
    pub fn new(state: &str, sort: &str, direction: SortDirection) -> Self {
        Self {
            state: Some(state.to_string()),
            sort: Some(sort.to_string()),
            direction,
        }
    }
}

/// Credentialed client against the source API
///
/// Implementations surface throttling as
/// [`ImportError::RateLimited`] and other transport failures as
/// [`ImportError::Transport`]; the engine does not retry either.
#[async_trait]
pub trait ProjectClient: Send + Sync {
    /// Whether this client's quota allows further requests right now
    fn has_requests_remaining(&self) -> bool;

    /// Requests left in the current rate-limit window
    fn remaining_requests(&self) -> u64;

    /// Time until the rate-limit window resets
    fn rate_limit_resets_in(&self) -> Duration;

    /// Fetch one page of a collection listing. `None` means the listing
    /// is exhausted.
    async fn fetch_page(
        &self,
        source_identifier: &str,
        collection: &Collection,
        page: u32,
        options: &PageOptions,
    ) -> Result<Option<Page>, ImportError>;
}

/// Fixed set of credentialed clients with quota-based selection
pub struct ClientPool {
    clients: Vec<Arc<dyn ProjectClient>>,
}

impl ClientPool {
    /// Build a pool. Fails on an empty client set since `best_client`
    /// must always be able to return an answer.
    pub fn new(clients: Vec<Arc<dyn ProjectClient>>) -> Result<Self, ImportError> {
        if clients.is_empty() {
            return Err(ImportError::Config(
                "client pool requires at least one client".to_string(),
            ));
        }
        Ok(Self { clients })
    }

    /// Select the most usable client without blocking
    ///
    /// Any client with requests remaining beats all exhausted ones, and
    /// among those the greatest remaining quota wins. When every client is
    /// exhausted, the one whose window resets soonest wins; the caller is
    /// responsible for waiting before using it. Ties keep the first-seen
    /// client, so the answer is deterministic for a given pool order.
    pub fn best_client(&self) -> Arc<dyn ProjectClient> {
        let mut best = &self.clients[0];

        for candidate in &self.clients[1..] {
            best = match (candidate.has_requests_remaining(), best.has_requests_remaining()) {
                (true, false) => candidate,
                (false, true) => best,
                (true, true) => {
                    if candidate.remaining_requests() > best.remaining_requests() {
                        candidate
                    } else {
                        best
                    }
                }
                (false, false) => {
                    if candidate.rate_limit_resets_in() < best.rate_limit_resets_in() {
                        candidate
                    } else {
                        best
                    }
                }
            };
        }

        best.clone()
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FakeClient {
        remaining: u64,
        resets_in: Duration,
    }

    #[async_trait]
    impl ProjectClient for FakeClient {
        fn has_requests_remaining(&self) -> bool {
            self.remaining > 0
        }

        fn remaining_requests(&self) -> u64 {
            self.remaining
        }

        fn rate_limit_resets_in(&self) -> Duration {
            self.resets_in
        }

        async fn fetch_page(
            &self,
            _source_identifier: &str,
            _collection: &Collection,
            _page: u32,
            _options: &PageOptions,
        ) -> Result<Option<Page>, ImportError> {
            Ok(None)
        }
    }

    fn client(remaining: u64, resets_in_secs: u64) -> Arc<dyn ProjectClient> {
        Arc::new(FakeClient {
            remaining,
            resets_in: Duration::from_secs(resets_in_secs),
        })
    }

    #[test]
    fn test_empty_pool_is_rejected() {
        assert!(ClientPool::new(vec![]).is_err());
    }

    #[test]
    fn test_prefers_greatest_remaining_quota() {
        let pool = ClientPool::new(vec![client(10, 0), client(20, 0)]).unwrap();
        assert_eq!(pool.best_client().remaining_requests(), 20);
    }

    #[test]
    fn test_usable_client_beats_exhausted_one() {
        let pool = ClientPool::new(vec![client(0, 5), client(1, 0)]).unwrap();
        assert_eq!(pool.best_client().remaining_requests(), 1);
    }

    #[test]
    fn test_all_exhausted_prefers_soonest_reset() {
        let pool = ClientPool::new(vec![client(0, 20), client(0, 10)]).unwrap();
        assert_eq!(
            pool.best_client().rate_limit_resets_in(),
            Duration::from_secs(10)
        );
    }

    #[test]
    fn test_ties_keep_first_seen() {
        let first = client(10, 0);
        let pool = ClientPool::new(vec![first.clone(), client(10, 0)]).unwrap();
        assert!(Arc::ptr_eq(&pool.best_client(), &first));

        let first_exhausted = client(0, 10);
        let pool = ClientPool::new(vec![first_exhausted.clone(), client(0, 10)]).unwrap();
        assert!(Arc::ptr_eq(&pool.best_client(), &first_exhausted));
    }

    #[test]
    fn test_single_client_is_always_returned() {
        let only = client(0, 30);
        let pool = ClientPool::new(vec![only.clone()]).unwrap();
        assert!(Arc::ptr_eq(&pool.best_client(), &only));
    }
}
