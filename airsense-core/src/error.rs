//! Error types shared by the cache and its page fetchers.
//!
//! Both enums are `Clone` because one outcome is handed to every caller that
//! joined the same in-flight operation.

use thiserror::Error;

/// Failure of a single page fetch.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("Transport failure: {reason}")]
    Transport { reason: String },

    #[error("Request failed with status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Undecodable response: {reason}")]
    Decode { reason: String },

    #[error("Not authenticated")]
    Unauthenticated,
}

impl FetchError {
    pub fn transport(reason: impl Into<String>) -> Self {
        Self::Transport {
            reason: reason.into(),
        }
    }

    pub fn status(status: u16, message: impl Into<String>) -> Self {
        Self::Status {
            status,
            message: message.into(),
        }
    }
}

/// Failure of a lookup through the paged cache.
///
/// "Not found" is not an error: lookups report it as `Ok(None)`.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CacheError {
    #[error("Page fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("Invariant violated while scanning {scope}: {reason}")]
    InvariantViolation { scope: String, reason: String },
}

/// Result type alias for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_display_status() {
        let err = FetchError::status(503, "maintenance");
        let msg = format!("{}", err);
        assert!(msg.contains("503"));
        assert!(msg.contains("maintenance"));
    }

    #[test]
    fn test_cache_error_from_fetch_error() {
        let err = CacheError::from(FetchError::transport("connection reset"));
        assert!(matches!(err, CacheError::Fetch(FetchError::Transport { .. })));
        assert!(format!("{}", err).contains("connection reset"));
    }

    #[test]
    fn test_invariant_violation_display() {
        let err = CacheError::InvariantViolation {
            scope: "room 4".to_string(),
            reason: "page size is zero".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("room 4"));
        assert!(msg.contains("page size is zero"));
    }
}
