//! Page store: pages memoized by offset, including in-flight fetches.
//!
//! Two callers asking for the same offset while its fetch is pending share
//! one network call. A successful page is cached for the lifetime of the
//! store and merged into the entity index before any waiter resumes. A failed
//! fetch is handed to every waiter and forgotten, so the next call retries.

use crate::index::EntityIndex;
use crate::traits::{PageFetcher, StatsCounters};
use airsense_core::{FetchError, Page};
use futures_util::future::{BoxFuture, FutureExt, Shared};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, trace, warn};

/// Outcome of a page request, shared by every waiter of the offset.
pub type PageResult<T> = Result<Arc<Page<T>>, FetchError>;

type PendingPage<T> = Shared<BoxFuture<'static, PageResult<T>>>;

struct PageTable<T> {
    pages: HashMap<u64, Arc<Page<T>>>,
    in_flight: HashMap<u64, PendingPage<T>>,
    /// Length of the first non-empty page; fixed once set.
    page_size: Option<u64>,
}

enum Slot<T> {
    Cached(Arc<Page<T>>),
    Joined(PendingPage<T>),
    Started(PendingPage<T>),
}

/// Per-scope page memo in front of a [`PageFetcher`].
pub struct PageStore<F: PageFetcher> {
    scope: F::Scope,
    fetcher: Arc<F>,
    index: Arc<EntityIndex<F::Entity>>,
    table: Mutex<PageTable<F::Entity>>,
    stats: Arc<StatsCounters>,
}

impl<F: PageFetcher> PageStore<F> {
    pub(crate) fn new(
        scope: F::Scope,
        fetcher: Arc<F>,
        index: Arc<EntityIndex<F::Entity>>,
        stats: Arc<StatsCounters>,
    ) -> Self {
        Self {
            scope,
            fetcher,
            index,
            table: Mutex::new(PageTable {
                pages: HashMap::new(),
                in_flight: HashMap::new(),
                page_size: None,
            }),
            stats,
        }
    }

    pub fn scope(&self) -> &F::Scope {
        &self.scope
    }

    /// Page size inferred from the first non-empty page, if any arrived yet.
    pub fn page_size(&self) -> Option<u64> {
        self.lock_table().page_size
    }

    /// The cached page at `offset`, without touching the network.
    pub fn cached_page(&self, offset: u64) -> Option<Arc<Page<F::Entity>>> {
        self.lock_table().pages.get(&offset).cloned()
    }

    /// Offsets of all cached pages, ascending.
    pub fn cached_offsets(&self) -> Vec<u64> {
        let mut offsets: Vec<u64> = self.lock_table().pages.keys().copied().collect();
        offsets.sort_unstable();
        offsets
    }

    pub fn is_in_flight(&self, offset: u64) -> bool {
        self.lock_table().in_flight.contains_key(&offset)
    }

    /// Get the page at `offset`, from memory, from a pending fetch, or from
    /// the fetcher.
    ///
    /// A started fetch is driven by a detached task, so it completes and
    /// populates the store even if every caller stops awaiting it.
    pub async fn fetch_page(self: &Arc<Self>, offset: u64) -> PageResult<F::Entity> {
        let slot = {
            let mut table = self.lock_table();
            if let Some(page) = table.pages.get(&offset) {
                Slot::Cached(Arc::clone(page))
            } else if let Some(pending) = table.in_flight.get(&offset) {
                Slot::Joined(pending.clone())
            } else {
                let pending = Self::run_fetch(Arc::clone(self), offset).boxed().shared();
                table.in_flight.insert(offset, pending.clone());
                Slot::Started(pending)
            }
        };

        match slot {
            Slot::Cached(page) => {
                StatsCounters::bump(&self.stats.page_hits);
                trace!(scope = ?self.scope, offset, "page served from memory");
                Ok(page)
            }
            Slot::Joined(pending) => {
                StatsCounters::bump(&self.stats.joined_fetches);
                trace!(scope = ?self.scope, offset, "joined in-flight page fetch");
                pending.await
            }
            Slot::Started(pending) => {
                StatsCounters::bump(&self.stats.page_fetches);
                tokio::spawn(pending.clone());
                pending.await
            }
        }
    }

    async fn run_fetch(store: Arc<Self>, offset: u64) -> PageResult<F::Entity> {
        debug!(scope = ?store.scope, offset, "fetching page");
        let result = store.fetcher.fetch_page(&store.scope, offset).await;

        let mut table = store.lock_table();
        table.in_flight.remove(&offset);
        match result {
            Ok(page) => {
                let added = store.index.merge(&page.data);
                if table.page_size.is_none() && !page.is_empty() {
                    let page_size = page.len() as u64;
                    table.page_size = Some(page_size);
                    debug!(scope = ?store.scope, page_size, "page size inferred");
                }
                let page = Arc::new(page);
                table.pages.insert(offset, Arc::clone(&page));
                debug!(
                    scope = ?store.scope,
                    offset,
                    returned = page.len(),
                    total = page.pagination.total,
                    added,
                    "page cached"
                );
                Ok(page)
            }
            Err(err) => {
                StatsCounters::bump(&store.stats.fetch_failures);
                warn!(scope = ?store.scope, offset, error = %err, "page fetch failed");
                Err(err)
            }
        }
    }

    fn lock_table(&self) -> MutexGuard<'_, PageTable<F::Entity>> {
        self.table.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::CachedEntity;
    use airsense_core::{EntityId, Pagination};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Semaphore;

    #[derive(Debug, Clone, PartialEq)]
    struct Reading {
        id: EntityId,
    }

    impl CachedEntity for Reading {
        fn entity_id(&self) -> EntityId {
            self.id
        }
    }

    /// Serves `total` readings in pages of three; fails while `failures > 0`.
    /// A gated fetcher holds every call until the gate closes.
    struct CountingFetcher {
        total: u64,
        calls: AtomicUsize,
        failures: AtomicUsize,
        gate: Option<Semaphore>,
    }

    impl CountingFetcher {
        fn new(total: u64) -> Self {
            Self {
                total,
                calls: AtomicUsize::new(0),
                failures: AtomicUsize::new(0),
                gate: None,
            }
        }

        fn gated(total: u64) -> Self {
            Self {
                gate: Some(Semaphore::new(0)),
                ..Self::new(total)
            }
        }

        fn open(&self) {
            if let Some(gate) = &self.gate {
                gate.close();
            }
        }
    }

    #[async_trait]
    impl PageFetcher for CountingFetcher {
        type Scope = ();
        type Entity = Reading;

        async fn fetch_page(&self, _scope: &(), offset: u64) -> Result<Page<Reading>, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.gate {
                Some(gate) => {
                    if let Ok(permit) = gate.acquire().await {
                        permit.forget();
                    }
                }
                None => tokio::task::yield_now().await,
            }
            if self.failures.load(Ordering::SeqCst) > 0 {
                self.failures.fetch_sub(1, Ordering::SeqCst);
                return Err(FetchError::status(500, "boom"));
            }
            let end = (offset + 3).min(self.total);
            let data = (offset..end).map(|id| Reading { id: id as EntityId }).collect();
            Ok(Page {
                data,
                pagination: Pagination {
                    total: self.total,
                    skip: offset,
                    count: 3,
                },
            })
        }
    }

    fn store(fetcher: Arc<CountingFetcher>) -> Arc<PageStore<CountingFetcher>> {
        Arc::new(PageStore::new(
            (),
            fetcher,
            Arc::new(EntityIndex::new()),
            Arc::new(StatsCounters::default()),
        ))
    }

    #[tokio::test]
    async fn test_page_is_fetched_once_and_indexed() {
        let fetcher = Arc::new(CountingFetcher::new(7));
        let store = store(Arc::clone(&fetcher));

        let first = store.fetch_page(3).await.unwrap();
        let second = store.fetch_page(3).await.unwrap();

        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(store.page_size(), Some(3));
        assert!(store.index.contains(4));
        assert_eq!(store.cached_offsets(), vec![3]);
        assert!(!store.is_in_flight(3));
    }

    #[tokio::test]
    async fn test_concurrent_requests_share_one_fetch() {
        let fetcher = Arc::new(CountingFetcher::gated(7));
        let store = store(Arc::clone(&fetcher));

        // The fetch stays pending until both latecomers have joined it.
        let release = async {
            while store.stats.snapshot().joined_fetches < 2 {
                tokio::task::yield_now().await;
            }
            fetcher.open();
        };
        let (a, b, c, ()) = tokio::join!(
            store.fetch_page(0),
            store.fetch_page(0),
            store.fetch_page(0),
            release
        );

        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
        assert_eq!(a.unwrap().len(), 3);
        assert_eq!(b.unwrap().len(), 3);
        assert_eq!(c.unwrap().len(), 3);
        let stats = store.stats.snapshot();
        assert_eq!(stats.page_fetches, 1);
        assert_eq!(stats.joined_fetches, 2);
        assert_eq!(stats.page_hits, 0);
    }

    #[tokio::test]
    async fn test_failure_is_not_cached() {
        let fetcher = Arc::new(CountingFetcher::new(7));
        fetcher.failures.store(1, Ordering::SeqCst);
        let store = store(Arc::clone(&fetcher));

        let err = store.fetch_page(0).await.unwrap_err();
        assert_eq!(err, FetchError::status(500, "boom"));
        assert!(store.cached_page(0).is_none());
        assert_eq!(store.page_size(), None);

        let page = store.fetch_page(0).await.unwrap();
        assert_eq!(page.len(), 3);
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_empty_page_leaves_page_size_unset() {
        let fetcher = Arc::new(CountingFetcher::new(0));
        let store = store(Arc::clone(&fetcher));

        let page = store.fetch_page(0).await.unwrap();
        assert!(page.is_empty());
        assert_eq!(store.page_size(), None);
        assert!(store.cached_page(0).is_some());
    }
}
