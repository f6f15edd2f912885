//! # FieldSync Store
//!
//! Storage seams for the FieldSync offline sync engine.
//!
//! This crate provides:
//! - `TenantScope` for mandatory tenant/site scoping of every store call
//! - `RecordStore` trait with an atomic version compare-and-swap update
//! - `PolicyStore` trait plus a read-through TTL cache
//! - `AuditLog` trait for the append-only conflict resolution trail
//! - In-memory implementations of all three seams
//!
//! The entity tables themselves are external collaborators; the in-memory
//! implementations here back the tests and the reference service. Any
//! persistent implementation must keep the update path an atomic
//! check-and-increment, never a read-then-write with a gap.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod audit;
mod error;
mod policy_store;
mod record_store;
mod scope;

pub use audit::{AuditLog, ConflictResolutionLog, MemoryAuditLog};
pub use error::{StoreError, StoreResult};
pub use policy_store::{CachedPolicyStore, MemoryPolicyStore, PolicyStore};
pub use record_store::{MemoryRecordStore, NewRecord, RecordStore};
pub use scope::TenantScope;
