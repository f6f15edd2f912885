//! Batch sync request and response shapes.

use crate::entry::SyncEntry;
use crate::policy::ResolutionResult;
use crate::record::{ServerRecord, SyncStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A parsed batch sync request body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncRequest {
    /// Client edits, one per entity, order-insensitive.
    pub entries: Vec<SyncEntry>,
    /// Device identifier as reported by the client.
    pub client_id: String,
}

impl SyncRequest {
    /// Creates a new request.
    pub fn new(entries: Vec<SyncEntry>, client_id: impl Into<String>) -> Self {
        Self {
            entries,
            client_id: client_id.into(),
        }
    }
}

/// How a synced entry was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncedStatus {
    /// A record was created at version 1.
    Created,
    /// An existing record was updated.
    Updated,
}

/// A cleanly applied entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncedItem {
    /// Entity identifier.
    pub mobile_id: Uuid,
    /// Whether the record was created or updated.
    pub status: SyncedStatus,
    /// Server version after the write.
    pub server_version: u64,
}

/// An entry that hit a version conflict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictItem {
    /// Entity identifier.
    pub mobile_id: Uuid,
    /// Always `SyncStatus::Conflict` on the wire.
    pub status: SyncStatus,
    /// Server version at detection time.
    pub server_version: u64,
    /// Version the client submitted.
    pub client_version: u64,
    /// Strategy applied, e.g. `"most_recent_wins (client)"`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution_strategy: Option<String>,
    /// Outcome of the resolution attempt.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution_result: Option<ResolutionResult>,
}

/// An entry rejected by validation or a storage failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorItem {
    /// Entity identifier.
    pub mobile_id: Uuid,
    /// Human-readable reason.
    pub error: String,
}

/// Deterministic classification of every entry in a batch.
///
/// Each submitted entry lands in exactly one of the three lists, except
/// entries dropped by an overall deadline, which the client resends later.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct BatchResult {
    /// Entries applied cleanly (created or updated).
    pub synced_items: Vec<SyncedItem>,
    /// Entries that hit a version conflict.
    pub conflicts: Vec<ConflictItem>,
    /// Entries rejected by validation or storage failures.
    pub errors: Vec<ErrorItem>,
}

impl BatchResult {
    /// Creates an empty result.
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of classified entries.
    pub fn total(&self) -> usize {
        self.synced_items.len() + self.conflicts.len() + self.errors.len()
    }
}

/// Result of a delta pull.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangesResponse {
    /// Records mutated after the watermark, scope-filtered.
    pub items: Vec<ServerRecord>,
    /// Snapshot time the query was evaluated at. Clients use this, not
    /// their own clock, as the `since` value of their next pull.
    pub server_timestamp: DateTime<Utc>,
}
