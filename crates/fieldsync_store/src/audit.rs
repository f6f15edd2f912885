//! Append-only audit trail of conflict resolution decisions.

use crate::error::{StoreError, StoreResult};
use crate::scope::TenantScope;
use chrono::{DateTime, Utc};
use fieldsync_protocol::{Domain, ResolutionResult, TenantId, Winner};
use parking_lot::RwLock;
use uuid::Uuid;

/// One recorded resolution decision.
///
/// Created once per conflict encountered and never mutated afterwards;
/// a manual decision later appends a follow-up entry rather than editing
/// this one. Retention is an external cleanup policy (typically 90 days).
#[derive(Debug, Clone, PartialEq)]
pub struct ConflictResolutionLog {
    /// Log entry identifier.
    pub id: Uuid,
    /// Entity the conflict occurred on.
    pub mobile_id: Uuid,
    /// Domain of the entity.
    pub domain: Domain,
    /// Tenant the conflict belongs to.
    pub tenant_id: TenantId,
    /// Server version at detection time.
    pub server_version: u64,
    /// Version the client submitted.
    pub client_version: u64,
    /// Strategy annotation, e.g. `"most_recent_wins (client)"`.
    pub strategy_used: String,
    /// Terminal result of the resolution attempt.
    pub resolution_result: ResolutionResult,
    /// Which side's values won.
    pub winning_version: Winner,
    /// Structured description of what was kept and what was discarded.
    pub merge_details: serde_json::Value,
    /// When the decision was recorded.
    pub created_at: DateTime<Utc>,
}

/// Append-only store for resolution decisions.
pub trait AuditLog: Send + Sync {
    /// Appends an entry, returning its id.
    fn append(&self, entry: ConflictResolutionLog) -> StoreResult<Uuid>;

    /// Fetches an entry by id within the scope.
    fn get(&self, scope: &TenantScope, id: Uuid) -> StoreResult<ConflictResolutionLog>;

    /// Lists entries awaiting manual resolution, oldest first.
    ///
    /// An entry is pending while it is the newest entry for its
    /// `(domain, mobile_id)` pair and its result is `ManualRequired`.
    fn pending_manual(&self, scope: &TenantScope) -> StoreResult<Vec<ConflictResolutionLog>>;
}

/// In-memory audit log.
#[derive(Default)]
pub struct MemoryAuditLog {
    entries: RwLock<Vec<ConflictResolutionLog>>,
}

impl MemoryAuditLog {
    /// Creates an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of entries across all tenants.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns true if the log is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Returns all entries for a tenant, oldest first.
    pub fn entries_for(&self, scope: &TenantScope) -> Vec<ConflictResolutionLog> {
        self.entries
            .read()
            .iter()
            .filter(|e| &e.tenant_id == scope.tenant_id())
            .cloned()
            .collect()
    }
}

impl AuditLog for MemoryAuditLog {
    fn append(&self, entry: ConflictResolutionLog) -> StoreResult<Uuid> {
        let id = entry.id;
        self.entries.write().push(entry);
        Ok(id)
    }

    fn get(&self, scope: &TenantScope, id: Uuid) -> StoreResult<ConflictResolutionLog> {
        self.entries
            .read()
            .iter()
            .find(|e| e.id == id && &e.tenant_id == scope.tenant_id())
            .cloned()
            .ok_or(StoreError::AuditEntryNotFound(id))
    }

    fn pending_manual(&self, scope: &TenantScope) -> StoreResult<Vec<ConflictResolutionLog>> {
        let entries = self.entries.read();
        let pending = entries
            .iter()
            .filter(|e| {
                &e.tenant_id == scope.tenant_id()
                    && e.resolution_result == ResolutionResult::ManualRequired
                    // Superseded by a later entry for the same entity?
                    && !entries.iter().any(|later| {
                        later.domain == e.domain
                            && later.mobile_id == e.mobile_id
                            && later.created_at > e.created_at
                    })
            })
            .cloned()
            .collect();
        Ok(pending)
    }
}
