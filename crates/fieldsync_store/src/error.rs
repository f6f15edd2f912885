//! Error types for the storage seams.

use fieldsync_protocol::{Domain, PolicyError, TenantId};
use thiserror::Error;
use uuid::Uuid;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur in the storage seams.
#[derive(Error, Debug)]
pub enum StoreError {
    /// A record with this mobile id already exists.
    #[error("record {mobile_id} already exists in domain {domain}")]
    AlreadyExists {
        /// Domain of the duplicate.
        domain: Domain,
        /// Entity identifier.
        mobile_id: Uuid,
    },

    /// The caller's expected version is stale.
    #[error("version mismatch for {mobile_id}: expected {expected}, actual {actual}")]
    VersionMismatch {
        /// Entity identifier.
        mobile_id: Uuid,
        /// Version the caller expected.
        expected: u64,
        /// Current server version.
        actual: u64,
    },

    /// The record does not exist.
    #[error("record {mobile_id} not found in domain {domain}")]
    NotFound {
        /// Domain looked up.
        domain: Domain,
        /// Entity identifier.
        mobile_id: Uuid,
    },

    /// A policy violated its construction invariant.
    #[error(transparent)]
    Policy(#[from] PolicyError),

    /// The audit entry does not exist.
    #[error("conflict log entry {0} not found")]
    AuditEntryNotFound(Uuid),

    /// Backend unavailable or failed mid-operation.
    #[error("storage unavailable for tenant {tenant_id}: {message}")]
    Unavailable {
        /// Tenant the operation was scoped to.
        tenant_id: TenantId,
        /// What failed.
        message: String,
    },
}

impl StoreError {
    /// Returns true if this error is a concurrency outcome the caller
    /// should re-read and re-decide on, not a failure.
    pub fn is_concurrency_conflict(&self) -> bool {
        matches!(
            self,
            StoreError::AlreadyExists { .. } | StoreError::VersionMismatch { .. }
        )
    }
}
