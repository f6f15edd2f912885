//! # FieldSync Engine
//!
//! The core of the FieldSync offline sync pipeline.
//!
//! This crate provides:
//! - `SyncOrchestrator` for batch processing of client edits
//! - Conflict detection and policy-driven resolution
//! - `IdempotencyCache` for at-most-once execution under retries
//! - `DeltaPullService` for incremental "what changed since T" reads
//! - A `MetricsSink` seam for item counts and durations
//!
//! ## Architecture
//!
//! The orchestrator classifies every entry of a batch into exactly one of
//! created/updated/conflict/error:
//! 1. Idempotency short-circuit: a replayed key returns the cached result
//!    without touching the record store
//! 2. Per-entry: unknown ids are created at version 1, matching versions
//!    update through the store's compare-and-swap, mismatched versions go
//!    through the resolution engine
//! 3. Only a fully-completed batch result is stored under the key
//!
//! ## Key invariants
//!
//! - The version counter is server-owned and advances by exactly 1 per
//!   accepted write, even when a resolution lets the client's values win
//! - Entries are independent: one bad entry never blocks its siblings
//! - Resolution is a pure function of (domain, policy, server, client)
//! - Every conflict encountered appends one audit log entry

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod delta;
mod error;
mod idempotency;
mod metrics;
mod orchestrator;
mod resolution;
mod validate;

pub use config::EngineConfig;
pub use delta::DeltaPullService;
pub use error::{EngineError, EngineResult};
pub use idempotency::{
    canonical_json, derive_key, request_hash, IdempotencyCache, IdempotencyRecord,
    IdempotencyScope, MemoryIdempotencyCache, NewIdempotencyRecord,
};
pub use metrics::{BatchMetrics, CountingMetrics, MetricsSink, NoopMetrics};
pub use orchestrator::SyncOrchestrator;
pub use resolution::{
    effective_policy, resolve, ConflictCandidate, ResolutionOutcome, StrategyUsed,
    ESCALATION_FIELDS,
};
