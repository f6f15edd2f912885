//! Error types for the sync engine.

use fieldsync_store::StoreError;
use thiserror::Error;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Batch-wide engine errors.
///
/// Entry-level failures (validation, a single record's storage error) never
/// surface here; the orchestrator converts them to `errors[]` data. Only
/// request-level rejections and infrastructure failures propagate.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Batch exceeds the protection limit.
    #[error("batch of {size} entries exceeds the limit of {limit}")]
    BatchTooLarge {
        /// Number of entries submitted.
        size: usize,
        /// Configured limit.
        limit: usize,
    },

    /// Backend unavailable for the whole batch; safe to retry wholesale.
    #[error("storage failure: {0}")]
    Storage(#[from] StoreError),

    /// A cached response could not be decoded, or another internal fault.
    #[error("internal error: {0}")]
    Internal(String),
}

impl EngineError {
    /// Returns true if the caller sent a bad request (4xx-equivalent).
    pub fn is_client_error(&self) -> bool {
        matches!(self, EngineError::BatchTooLarge { .. })
    }

    /// Returns true if a wholesale retry of the batch is safe.
    ///
    /// Retrying is always safe for infrastructure failures because no
    /// partial commitment was reported and the idempotency key dedupes
    /// whatever did land.
    pub fn is_retryable(&self) -> bool {
        matches!(self, EngineError::Storage(_) | EngineError::Internal(_))
    }
}
