//! # FieldSync Protocol
//!
//! Data model and wire types for the FieldSync offline sync engine.
//!
//! This crate provides:
//! - `Domain` for the closed set of synced data categories
//! - `SyncEntry` / `ServerRecord` for client edits and server state
//! - `ResolutionPolicy` / `TenantConflictPolicy` for conflict handling
//! - `RequestContext` for explicit tenant/user/device scoping
//! - Batch request/response shapes (`SyncRequest`, `BatchResult`)
//!
//! This is a pure data-model crate with no I/O operations.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod batch;
mod context;
mod domain;
mod entry;
mod policy;
mod record;

pub use batch::{
    BatchResult, ChangesResponse, ConflictItem, ErrorItem, SyncRequest, SyncedItem, SyncedStatus,
};
pub use context::{RequestContext, TenantId};
pub use domain::{Domain, DomainParseError};
pub use entry::{Payload, SyncEntry};
pub use policy::{PolicyError, ResolutionPolicy, ResolutionResult, TenantConflictPolicy, Winner};
pub use record::{ServerRecord, SyncStatus};
