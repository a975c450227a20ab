//! AirSense Test Utilities
//!
//! Centralized test infrastructure for the AirSense workspace:
//! - [`ScriptedFetcher`]: an in-memory [`PageFetcher`] with call recording,
//!   gating, failure injection and total overrides
//! - Fixtures for every entity type
//! - Proptest generators

pub use airsense_cache::{CachedEntity, PageFetcher, PagedLookupCache};
pub use airsense_core::{
    Device, EntityId, Environment, EnvironmentRole, FetchError, Member, Page, Pagination,
    Parameter, Room, Sensor,
};

use async_trait::async_trait;
use proptest::prelude::*;
use std::collections::{HashMap, VecDeque};
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::Semaphore;

// ============================================================================
// SCRIPTED PAGE FETCHER
// ============================================================================

/// In-memory page fetcher serving fixed collections in fixed-size pages.
///
/// Every call is recorded before it can block on the gate, so a test can
/// observe how many network calls were issued while they are still pending.
pub struct ScriptedFetcher<S, T> {
    page_size: u64,
    collections: Mutex<HashMap<S, Vec<T>>>,
    reported_totals: Mutex<HashMap<S, u64>>,
    failures: Mutex<HashMap<u64, VecDeque<FetchError>>>,
    calls: Mutex<Vec<(S, u64)>>,
    gate: Option<Semaphore>,
}

impl<S, T> ScriptedFetcher<S, T>
where
    S: Clone + Eq + Hash + Debug + Send + Sync + 'static,
    T: CachedEntity,
{
    pub fn new(page_size: u64) -> Self {
        Self {
            page_size,
            collections: Mutex::new(HashMap::new()),
            reported_totals: Mutex::new(HashMap::new()),
            failures: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            gate: None,
        }
    }

    pub fn with_collection(self, scope: S, items: Vec<T>) -> Self {
        self.set_collection(scope, items);
        self
    }

    /// Hold every fetch until [`release`](Self::release) or
    /// [`release_one`](Self::release_one) is called.
    pub fn gated(mut self) -> Self {
        self.gate = Some(Semaphore::new(0));
        self
    }

    /// Replace the collection of `scope`, e.g. to simulate concurrent edits.
    pub fn set_collection(&self, scope: S, items: Vec<T>) {
        lock(&self.collections).insert(scope, items);
    }

    /// Report `total` for `scope` regardless of the collection length.
    pub fn report_total(&self, scope: S, total: u64) {
        lock(&self.reported_totals).insert(scope, total);
    }

    /// Fail the next fetch at `offset` (any scope) with `err`.
    ///
    /// Queued failures are consumed one per call, in order.
    pub fn fail_next(&self, offset: u64, err: FetchError) {
        lock(&self.failures).entry(offset).or_default().push_back(err);
    }

    /// Open the gate for good.
    pub fn release(&self) {
        if let Some(gate) = &self.gate {
            gate.close();
        }
    }

    /// Let exactly one held fetch through.
    pub fn release_one(&self) {
        if let Some(gate) = &self.gate {
            gate.add_permits(1);
        }
    }

    pub fn call_count(&self) -> usize {
        lock(&self.calls).len()
    }

    pub fn calls_at(&self, offset: u64) -> usize {
        lock(&self.calls)
            .iter()
            .filter(|(_, called)| *called == offset)
            .count()
    }

    /// Offsets requested so far, in call order.
    pub fn offsets(&self) -> Vec<u64> {
        lock(&self.calls).iter().map(|(_, offset)| *offset).collect()
    }

    pub fn calls(&self) -> Vec<(S, u64)> {
        lock(&self.calls).clone()
    }

    fn page(&self, scope: &S, offset: u64) -> Page<T> {
        let collections = lock(&self.collections);
        let items = collections.get(scope).map(Vec::as_slice).unwrap_or(&[]);
        let start = (offset as usize).min(items.len());
        let end = (offset.saturating_add(self.page_size) as usize).min(items.len());
        let total = lock(&self.reported_totals)
            .get(scope)
            .copied()
            .unwrap_or(items.len() as u64);

        Page {
            data: items[start..end].to_vec(),
            pagination: Pagination {
                total,
                skip: offset,
                count: self.page_size,
            },
        }
    }
}

#[async_trait]
impl<S, T> PageFetcher for ScriptedFetcher<S, T>
where
    S: Clone + Eq + Hash + Debug + Send + Sync + 'static,
    T: CachedEntity,
{
    type Scope = S;
    type Entity = T;

    async fn fetch_page(&self, scope: &S, offset: u64) -> Result<Page<T>, FetchError> {
        lock(&self.calls).push((scope.clone(), offset));

        match &self.gate {
            Some(gate) => {
                // A closed gate means "released": acquire fails and we go on.
                if let Ok(permit) = gate.acquire().await {
                    permit.forget();
                }
            }
            None => tokio::task::yield_now().await,
        }

        let failure = lock(&self.failures)
            .get_mut(&offset)
            .and_then(VecDeque::pop_front);
        if let Some(err) = failure {
            return Err(err);
        }
        Ok(self.page(scope, offset))
    }
}

fn lock<V>(mutex: &Mutex<V>) -> MutexGuard<'_, V> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// ============================================================================
// FIXTURES
// ============================================================================

pub fn sensor(id: EntityId) -> Sensor {
    Sensor {
        id,
        type_name: "SCD41".to_string(),
        serial_number: format!("SN-{:05}", id),
        types: vec!["co2".to_string(), "temperature".to_string()],
        parameters: None,
    }
}

/// Sensors with ids `1..=count`.
pub fn sensors(count: EntityId) -> Vec<Sensor> {
    (1..=count).map(sensor).collect()
}

pub fn device(id: EntityId) -> Device {
    Device {
        id,
        serial_number: format!("DV-{:05}", id),
        fan_speed: 40.0,
        active_at: 1_700_000_000,
    }
}

/// Devices with ids `1..=count`.
pub fn devices(count: EntityId) -> Vec<Device> {
    (1..=count).map(device).collect()
}

pub fn room(id: EntityId, name: &str) -> Room {
    Room {
        id,
        name: name.to_string(),
        parameters: Some(vec![Parameter {
            name: "temperature".to_string(),
            value: Some(21.5),
            unit: "°C".to_string(),
            min_value: 18.0,
            max_value: 25.0,
            critical_value: 35.0,
        }]),
        device_speed: Some(40.0),
    }
}

pub fn environment(id: EntityId, name: &str) -> Environment {
    Environment {
        id,
        name: name.to_string(),
        role: EnvironmentRole::Owner,
    }
}

pub fn member(id: EntityId, email: &str, role: EnvironmentRole) -> Member {
    Member {
        id,
        email: email.to_string(),
        role,
        name: email.split('@').next().unwrap_or_default().to_string(),
    }
}

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

/// A collection size and a page size for it.
pub fn collection_shape_strategy() -> impl Strategy<Value = (u64, u64)> {
    (0u64..80, 1u64..12)
}

/// Sensors with unique ids in `1..=max_len`, shuffled.
pub fn sensor_collection_strategy(max_len: usize) -> impl Strategy<Value = Vec<Sensor>> {
    prop::collection::btree_set(1..=(max_len as EntityId * 4), 0..=max_len)
        .prop_map(|ids| ids.into_iter().map(sensor).collect::<Vec<_>>())
        .prop_shuffle()
}
