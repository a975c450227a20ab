//! Traits at the seams of the paged lookup cache.
//!
//! The cache knows nothing about transport. It needs two capabilities:
//! entities that expose a stable id ([`CachedEntity`]) and a way to fetch one
//! page of a scoped collection ([`PageFetcher`]).

use airsense_core::{Device, EntityId, Environment, FetchError, Member, Page, Room, Sensor};
use async_trait::async_trait;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};

/// Marker trait for records that can live in the entity index.
///
/// # Implementation Requirements
///
/// - `entity_id()` must be unique within the parent scope and stable for
///   the lifetime of the record
/// - Implementations must be `Clone` (every waiter receives its own copy)
///   and `Send + Sync + 'static` so lookups can be driven by detached tasks
pub trait CachedEntity: Clone + Send + Sync + 'static {
    /// Get the identifier of this entity within its scope.
    fn entity_id(&self) -> EntityId;
}

/// Fetches one page of a scoped remote collection.
///
/// Implementations are assumed idempotent. `Page::pagination.total` is taken
/// as the authoritative collection size at call time.
#[async_trait]
pub trait PageFetcher: Send + Sync + 'static {
    /// Identifier partitioning the collection (a room id, an environment id,
    /// or `()` for a global collection).
    type Scope: Clone + Eq + Hash + Debug + Send + Sync + 'static;

    /// Entity type returned by the collection.
    type Entity: CachedEntity;

    /// Fetch the page starting at `offset`.
    async fn fetch_page(
        &self,
        scope: &Self::Scope,
        offset: u64,
    ) -> Result<Page<Self::Entity>, FetchError>;
}

/// Snapshot of cache activity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups answered from the entity index.
    pub index_hits: u64,
    /// Lookups that started a page scan.
    pub scans: u64,
    /// Lookups that joined a scan already in flight.
    pub joined_lookups: u64,
    /// Page requests answered from the page cache.
    pub page_hits: u64,
    /// Page requests that reached the fetcher.
    pub page_fetches: u64,
    /// Page requests that joined a fetch already in flight.
    pub joined_fetches: u64,
    /// Page fetches that failed.
    pub fetch_failures: u64,
}

impl CacheStats {
    /// Fraction of lookups served without starting a scan (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        let total = self.index_hits + self.scans + self.joined_lookups;
        if total == 0 {
            0.0
        } else {
            (self.index_hits + self.joined_lookups) as f64 / total as f64
        }
    }
}

/// Lock-free counters behind [`CacheStats`].
#[derive(Debug, Default)]
pub(crate) struct StatsCounters {
    pub(crate) index_hits: AtomicU64,
    pub(crate) scans: AtomicU64,
    pub(crate) joined_lookups: AtomicU64,
    pub(crate) page_hits: AtomicU64,
    pub(crate) page_fetches: AtomicU64,
    pub(crate) joined_fetches: AtomicU64,
    pub(crate) fetch_failures: AtomicU64,
}

impl StatsCounters {
    pub(crate) fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> CacheStats {
        CacheStats {
            index_hits: self.index_hits.load(Ordering::Relaxed),
            scans: self.scans.load(Ordering::Relaxed),
            joined_lookups: self.joined_lookups.load(Ordering::Relaxed),
            page_hits: self.page_hits.load(Ordering::Relaxed),
            page_fetches: self.page_fetches.load(Ordering::Relaxed),
            joined_fetches: self.joined_fetches.load(Ordering::Relaxed),
            fetch_failures: self.fetch_failures.load(Ordering::Relaxed),
        }
    }
}

// ============================================================================
// IMPLEMENTATIONS FOR AIRSENSE ENTITIES
// ============================================================================

impl CachedEntity for Environment {
    fn entity_id(&self) -> EntityId {
        self.id
    }
}

impl CachedEntity for Room {
    fn entity_id(&self) -> EntityId {
        self.id
    }
}

impl CachedEntity for Sensor {
    fn entity_id(&self) -> EntityId {
        self.id
    }
}

impl CachedEntity for Device {
    fn entity_id(&self) -> EntityId {
        self.id
    }
}

impl CachedEntity for Member {
    fn entity_id(&self) -> EntityId {
        self.id
    }
}
