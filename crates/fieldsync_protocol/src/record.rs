//! Server-side persisted records.

use crate::context::TenantId;
use crate::domain::Domain;
use crate::entry::Payload;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Sync state of a server record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    /// Waiting for first sync.
    Pending,
    /// Last write was accepted cleanly.
    Synced,
    /// Last write went through conflict resolution.
    Conflict,
    /// Last write failed validation or storage.
    Error,
}

/// A persisted entity (task, ticket, journal entry, ...).
///
/// Invariant: `version` starts at 1 on creation and increases by exactly 1
/// on every accepted write; it never decreases and never skips. Records are
/// never hard-deleted by the sync path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerRecord {
    /// Client-generated stable identifier, unique per tenant and domain.
    pub mobile_id: Uuid,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Domain of the record.
    pub domain: Domain,
    /// Site the record belongs to, if site-scoped.
    pub site_id: Option<String>,
    /// Optimistic-lock version counter, server-owned.
    pub version: u64,
    /// Server-authoritative time of the last accepted write.
    pub updated_at: DateTime<Utc>,
    /// Domain payload fields.
    pub fields: Payload,
    /// Sync state of the record.
    pub sync_status: SyncStatus,
}

impl ServerRecord {
    /// Returns a field value if present.
    pub fn field(&self, key: &str) -> Option<&serde_json::Value> {
        self.fields.get(key)
    }
}
