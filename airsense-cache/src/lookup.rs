//! Lookup coordinator: find one entity by id in a paged collection.
//!
//! A lookup first consults the entity index. On a miss it walks the
//! collection page by page through the [`PageStore`], re-checking the index
//! after every page, until the id shows up or the collection is exhausted.
//! Concurrent lookups for the same id join one scan and receive the same
//! outcome.

use crate::index::EntityIndex;
use crate::loading::LoadingTracker;
use crate::page_store::{PageResult, PageStore};
use crate::traits::{CacheStats, PageFetcher, StatsCounters};
use airsense_core::{CacheError, CacheResult, EntityId};
use futures_util::future::{BoxFuture, FutureExt, Shared};
use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;
use tracing::{debug, trace, warn};

type PendingLookup<T> = Shared<BoxFuture<'static, CacheResult<Option<T>>>>;

/// Everything the cache holds for one parent scope.
struct ScopeState<F: PageFetcher> {
    label: String,
    index: Arc<EntityIndex<F::Entity>>,
    pages: Arc<PageStore<F>>,
    lookups: Mutex<HashMap<EntityId, PendingLookup<F::Entity>>>,
    loading: LoadingTracker,
}

impl<F: PageFetcher> ScopeState<F> {
    fn lock_lookups(&self) -> MutexGuard<'_, HashMap<EntityId, PendingLookup<F::Entity>>> {
        self.lookups.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run one scan and clear its bookkeeping, whatever the outcome.
    async fn scan(state: Arc<Self>, id: EntityId) -> CacheResult<Option<F::Entity>> {
        let outcome = state.walk_pages(id).await;

        {
            let mut lookups = state.lock_lookups();
            lookups.remove(&id);
            state.loading.finish(id);
        }

        match &outcome {
            Ok(Some(_)) => debug!(scope = %state.label, id, "lookup resolved"),
            Ok(None) => debug!(scope = %state.label, id, "lookup exhausted collection"),
            Err(err) => warn!(scope = %state.label, id, error = %err, "lookup failed"),
        }
        outcome
    }

    async fn walk_pages(&self, id: EntityId) -> CacheResult<Option<F::Entity>> {
        let mut offset = 0u64;
        loop {
            let page = self.pages.fetch_page(offset).await?;

            // Any page merged so far may hold the id, not just this one.
            if let Some(entity) = self.index.get(id) {
                return Ok(Some(entity));
            }
            if page.is_empty() {
                return Ok(None);
            }
            let Some(page_size) = self.pages.page_size() else {
                return Ok(None);
            };
            match next_offset(&self.label, offset, page_size, page.pagination.total)? {
                Some(next) => offset = next,
                None => return Ok(None),
            }
            trace!(scope = %self.label, id, offset, "advancing scan");
        }
    }
}

/// Offset of the page after the one at `offset`, or `None` once it would
/// reach `total`.
///
/// The page store only records the length of a non-empty page, so a zero
/// stride means its bookkeeping is broken. Scanning on would never end.
fn next_offset(label: &str, offset: u64, page_size: u64, total: u64) -> CacheResult<Option<u64>> {
    if page_size == 0 {
        return Err(CacheError::InvariantViolation {
            scope: label.to_string(),
            reason: "page size observed as zero".to_string(),
        });
    }
    let next = offset.saturating_add(page_size);
    Ok((next < total).then_some(next))
}

/// Paged lookup cache keyed by parent scope.
///
/// Each scope gets its own entity index, page store, in-flight lookup table
/// and loading flags, created on first use and kept for the lifetime of the
/// cache. The cache never evicts: dropping it is the only way to forget.
///
/// # Example
///
/// ```ignore
/// let sensors = PagedLookupCache::new("sensors", SensorPages::new(client));
///
/// match sensors.find_by_id(&room_id, sensor_id).await? {
///     Some(sensor) => println!("{}", sensor.label()),
///     None => println!("sensor {} does not exist", sensor_id),
/// }
/// ```
pub struct PagedLookupCache<F: PageFetcher> {
    name: &'static str,
    fetcher: Arc<F>,
    scopes: Mutex<HashMap<F::Scope, Arc<ScopeState<F>>>>,
    stats: Arc<StatsCounters>,
}

impl<F: PageFetcher> PagedLookupCache<F> {
    /// Create a cache over `fetcher`. `name` tags log lines and errors.
    pub fn new(name: &'static str, fetcher: F) -> Self {
        Self::with_shared_fetcher(name, Arc::new(fetcher))
    }

    pub fn with_shared_fetcher(name: &'static str, fetcher: Arc<F>) -> Self {
        Self {
            name,
            fetcher,
            scopes: Mutex::new(HashMap::new()),
            stats: Arc::new(StatsCounters::default()),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Fast path only: the indexed entity, if any, without any I/O.
    pub fn get_cached(&self, scope: &F::Scope, id: EntityId) -> Option<F::Entity> {
        self.existing_scope(scope)
            .and_then(|state| state.index.get(id))
    }

    /// Find the entity with `id` in `scope`.
    ///
    /// Returns `Ok(None)` when the whole collection was scanned without a
    /// match. Errors are not cached: calling again after a failure starts a
    /// fresh scan.
    pub async fn find_by_id(
        &self,
        scope: &F::Scope,
        id: EntityId,
    ) -> CacheResult<Option<F::Entity>> {
        let state = self.scope_state(scope);
        if let Some(entity) = state.index.get(id) {
            StatsCounters::bump(&self.stats.index_hits);
            trace!(scope = %state.label, id, "lookup served from index");
            return Ok(Some(entity));
        }

        let (pending, started) = {
            let mut lookups = state.lock_lookups();
            if let Some(pending) = lookups.get(&id) {
                (pending.clone(), false)
            } else {
                let pending = ScopeState::scan(Arc::clone(&state), id).boxed().shared();
                lookups.insert(id, pending.clone());
                state.loading.begin(id);
                (pending, true)
            }
        };

        if started {
            StatsCounters::bump(&self.stats.scans);
            debug!(scope = %state.label, id, "lookup scan started");
            tokio::spawn(pending.clone());
        } else {
            StatsCounters::bump(&self.stats.joined_lookups);
            trace!(scope = %state.label, id, "joined in-flight lookup");
        }
        pending.await
    }

    /// Fetch one page of `scope` through the page store.
    pub async fn fetch_page(&self, scope: &F::Scope, offset: u64) -> PageResult<F::Entity> {
        let pages = self.page_store(scope);
        pages.fetch_page(offset).await
    }

    /// The page store serving `scope`.
    pub fn page_store(&self, scope: &F::Scope) -> Arc<PageStore<F>> {
        Arc::clone(&self.scope_state(scope).pages)
    }

    pub fn page_size(&self, scope: &F::Scope) -> Option<u64> {
        self.existing_scope(scope)
            .and_then(|state| state.pages.page_size())
    }

    /// Whether a lookup for `id` in `scope` is in flight.
    pub fn is_loading(&self, scope: &F::Scope, id: EntityId) -> bool {
        self.existing_scope(scope)
            .map(|state| state.loading.is_loading(id))
            .unwrap_or(false)
    }

    /// Watch the set of ids of `scope` with a lookup in flight.
    pub fn subscribe_loading(&self, scope: &F::Scope) -> watch::Receiver<BTreeSet<EntityId>> {
        self.scope_state(scope).loading.subscribe()
    }

    /// Every entity of `scope` indexed so far, ordered by id.
    pub fn cached_entities(&self, scope: &F::Scope) -> Vec<F::Entity> {
        self.existing_scope(scope)
            .map(|state| state.index.snapshot())
            .unwrap_or_default()
    }

    pub fn stats(&self) -> CacheStats {
        self.stats.snapshot()
    }

    fn lock_scopes(&self) -> MutexGuard<'_, HashMap<F::Scope, Arc<ScopeState<F>>>> {
        self.scopes.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn existing_scope(&self, scope: &F::Scope) -> Option<Arc<ScopeState<F>>> {
        self.lock_scopes().get(scope).cloned()
    }

    fn scope_state(&self, scope: &F::Scope) -> Arc<ScopeState<F>> {
        let mut scopes = self.lock_scopes();
        let state = scopes.entry(scope.clone()).or_insert_with(|| {
            let index = Arc::new(EntityIndex::new());
            let pages = Arc::new(PageStore::new(
                scope.clone(),
                Arc::clone(&self.fetcher),
                Arc::clone(&index),
                Arc::clone(&self.stats),
            ));
            Arc::new(ScopeState {
                label: format!("{}:{:?}", self.name, scope),
                index,
                pages,
                lookups: Mutex::new(HashMap::new()),
                loading: LoadingTracker::new(),
            })
        });
        Arc::clone(state)
    }
}

impl<F: PageFetcher> std::fmt::Debug for PagedLookupCache<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PagedLookupCache")
            .field("name", &self.name)
            .field("scopes", &self.lock_scopes().len())
            .field("stats", &self.stats.snapshot())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::CachedEntity;
    use airsense_core::{FetchError, Page, Pagination};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Clone, PartialEq)]
    struct Item {
        id: EntityId,
    }

    impl CachedEntity for Item {
        fn entity_id(&self) -> EntityId {
            self.id
        }
    }

    /// Scope `n` holds ids `n*100 .. n*100 + len`, served four per page.
    struct RangeFetcher {
        len: u64,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl PageFetcher for RangeFetcher {
        type Scope = u32;
        type Entity = Item;

        async fn fetch_page(&self, scope: &u32, offset: u64) -> Result<Page<Item>, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let base = EntityId::from(*scope) * 100;
            let end = (offset + 4).min(self.len);
            Ok(Page {
                data: (offset..end).map(|i| Item { id: base + i as EntityId }).collect(),
                pagination: Pagination {
                    total: self.len,
                    skip: offset,
                    count: 4,
                },
            })
        }
    }

    fn cache(len: u64) -> PagedLookupCache<RangeFetcher> {
        PagedLookupCache::new(
            "items",
            RangeFetcher {
                len,
                calls: AtomicUsize::new(0),
            },
        )
    }

    #[tokio::test]
    async fn test_scopes_are_isolated() {
        let cache = cache(6);

        assert_eq!(cache.find_by_id(&1, 103).await.unwrap(), Some(Item { id: 103 }));
        assert_eq!(cache.find_by_id(&2, 103).await.unwrap(), None);
        assert_eq!(cache.find_by_id(&2, 205).await.unwrap(), Some(Item { id: 205 }));

        assert!(cache.get_cached(&1, 103).is_some());
        assert!(cache.get_cached(&2, 103).is_none());
        assert_eq!(cache.page_size(&1), Some(4));
        assert_eq!(cache.page_size(&3), None);
    }

    #[tokio::test]
    async fn test_second_lookup_uses_index() {
        let cache = cache(10);

        let first = cache.find_by_id(&0, 9).await.unwrap();
        let calls = cache.fetcher().calls.load(Ordering::SeqCst);
        let second = cache.find_by_id(&0, 9).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(calls, 3);
        assert_eq!(cache.fetcher().calls.load(Ordering::SeqCst), calls);
        let stats = cache.stats();
        assert_eq!(stats.scans, 1);
        assert_eq!(stats.index_hits, 1);
    }

    #[tokio::test]
    async fn test_missing_id_rescan_uses_cached_pages() {
        let cache = cache(10);

        assert_eq!(cache.find_by_id(&0, 77).await.unwrap(), None);
        assert_eq!(cache.fetcher().calls.load(Ordering::SeqCst), 3);

        assert_eq!(cache.find_by_id(&0, 77).await.unwrap(), None);
        assert_eq!(cache.fetcher().calls.load(Ordering::SeqCst), 3);
        assert!(!cache.is_loading(&0, 77));
    }

    #[test]
    fn test_next_offset_stops_at_total() {
        assert_eq!(next_offset("items:0", 0, 5, 12), Ok(Some(5)));
        assert_eq!(next_offset("items:0", 5, 5, 12), Ok(Some(10)));
        assert_eq!(next_offset("items:0", 10, 5, 12), Ok(None));
        assert_eq!(next_offset("items:0", u64::MAX - 1, 5, u64::MAX), Ok(None));
    }

    #[test]
    fn test_zero_page_size_is_an_invariant_violation() {
        let err = next_offset("items:0", 0, 0, 10).unwrap_err();
        assert!(matches!(
            err,
            CacheError::InvariantViolation { ref scope, .. } if scope == "items:0"
        ));
    }

    #[tokio::test]
    async fn test_cached_entities_grow_with_pages() {
        let cache = cache(10);
        assert!(cache.cached_entities(&0).is_empty());

        cache.fetch_page(&0, 4).await.unwrap();
        let ids: Vec<EntityId> = cache.cached_entities(&0).iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![4, 5, 6, 7]);
        assert_eq!(cache.get_cached(&0, 5), Some(Item { id: 5 }));
    }
}
