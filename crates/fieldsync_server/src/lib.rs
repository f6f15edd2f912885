//! # FieldSync Server
//!
//! Service layer over the FieldSync engine.
//!
//! This crate provides:
//! - `SyncService` with sync, delta pull, pending-conflict and manual
//!   resolution operations
//! - Request/response translation (string domains in, typed engine calls
//!   through, typed errors out)
//! - A background sweeper for expired idempotency records
//! - Tracing initialization for binaries
//!
//! # Architecture
//!
//! The service owns one orchestrator and one delta pull service over
//! shared stores. An HTTP frontend maps routes onto the `handle_*`
//! methods and translates `ServiceError` classification into status
//! codes; the service itself is transport-agnostic.
//!
//! # Protocol
//!
//! A device cycle is push-then-pull:
//! 1. Client pushes a batch of offline edits per domain
//! 2. Server classifies each entry as created/updated/conflict/error
//! 3. Client pulls changes since its last watermark
//! 4. Unresolved conflicts surface to supervisors for manual resolution

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod config;
mod error;
mod service;
mod sweeper;
mod telemetry;

pub use config::ServiceConfig;
pub use error::{ServiceError, ServiceResult};
pub use service::{ManualResolution, SyncService};
pub use sweeper::spawn_expiry_sweeper;
pub use telemetry::init_tracing;
