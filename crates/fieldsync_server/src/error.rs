//! Error types for the service layer.

use fieldsync_engine::EngineError;
use fieldsync_protocol::DomainParseError;
use fieldsync_store::StoreError;
use thiserror::Error;
use uuid::Uuid;

/// Result type for service operations.
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Errors that can occur in the service layer.
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Invalid request format or parameters.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Unknown domain name in the request path.
    #[error(transparent)]
    UnknownDomain(#[from] DomainParseError),

    /// The referenced conflict is not awaiting manual resolution.
    #[error("conflict {0} is not pending manual resolution")]
    NotPending(Uuid),

    /// Engine rejected or failed the operation.
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// Storage failure outside the engine.
    #[error(transparent)]
    Storage(#[from] StoreError),
}

impl ServiceError {
    /// Returns true if this is a client error (4xx).
    pub fn is_client_error(&self) -> bool {
        match self {
            ServiceError::InvalidRequest(_)
            | ServiceError::UnknownDomain(_)
            | ServiceError::NotPending(_) => true,
            ServiceError::Engine(e) => e.is_client_error(),
            ServiceError::Storage(e) => {
                e.is_concurrency_conflict()
                    || matches!(
                        e,
                        StoreError::NotFound { .. } | StoreError::AuditEntryNotFound(_)
                    )
            }
        }
    }

    /// Returns true if this is a server error (5xx).
    pub fn is_server_error(&self) -> bool {
        !self.is_client_error()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_classification() {
        assert!(ServiceError::InvalidRequest("bad".into()).is_client_error());
        assert!(ServiceError::NotPending(Uuid::new_v4()).is_client_error());

        let engine = ServiceError::Engine(EngineError::Internal("oops".into()));
        assert!(engine.is_server_error());

        let oversized = ServiceError::Engine(EngineError::BatchTooLarge {
            size: 2000,
            limit: 1000,
        });
        assert!(oversized.is_client_error());
    }

    #[test]
    fn unknown_domain_message() {
        let err: ServiceError = "inventory".parse::<fieldsync_protocol::Domain>().unwrap_err().into();
        assert!(err.to_string().contains("inventory"));
        assert!(err.is_client_error());
    }
}
