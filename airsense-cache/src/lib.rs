//! Paged lookup cache for AirSense collections.
//!
//! Most AirSense collections (environments, rooms, sensors, devices) are only
//! reachable through a paged listing endpoint. This crate answers "find
//! entity X" on top of such endpoints:
//!
//! - [`EntityIndex`]: id -> entity, filled as pages arrive; consulted first
//! - [`PageStore`]: pages memoized by offset, in-flight fetches coalesced
//! - [`PagedLookupCache`]: scans pages until the id shows up, joining
//!   concurrent lookups for the same id
//! - [`PageFetcher`]: the injected transport, one page per call
//!
//! # Outcomes
//!
//! A lookup ends in exactly one of three ways, and callers must keep them
//! apart:
//!
//! ```ignore
//! match cache.find_by_id(&room_id, sensor_id).await {
//!     Ok(Some(sensor)) => { /* found */ }
//!     Ok(None) => { /* collection scanned, no such id */ }
//!     Err(err) => { /* a page fetch failed; calling again retries */ }
//! }
//! ```

pub mod index;
pub mod loading;
pub mod lookup;
pub mod page_store;
pub mod traits;

pub use airsense_core::{CacheError, CacheResult, FetchError, Page, Pagination};
pub use index::EntityIndex;
pub use loading::LoadingTracker;
pub use lookup::PagedLookupCache;
pub use page_store::{PageResult, PageStore};
pub use traits::{CacheStats, CachedEntity, PageFetcher};
