//! Versioned record store with optimistic concurrency.

use crate::error::{StoreError, StoreResult};
use crate::scope::TenantScope;
use chrono::{DateTime, Utc};
use fieldsync_protocol::{Domain, Payload, ServerRecord, SyncStatus, TenantId};
use parking_lot::RwLock;
use std::collections::HashMap;
use uuid::Uuid;

/// A record to be created at version 1.
#[derive(Debug, Clone)]
pub struct NewRecord {
    /// Client-generated stable identifier.
    pub mobile_id: Uuid,
    /// Domain of the record.
    pub domain: Domain,
    /// Site the record belongs to, if site-scoped.
    pub site_id: Option<String>,
    /// Initial domain payload.
    pub fields: Payload,
}

impl NewRecord {
    /// Creates a new record description.
    pub fn new(mobile_id: Uuid, domain: Domain, fields: Payload) -> Self {
        Self {
            mobile_id,
            domain,
            site_id: None,
            fields,
        }
    }

    /// Assigns the record to a site.
    pub fn with_site(mut self, site_id: impl Into<String>) -> Self {
        self.site_id = Some(site_id.into());
        self
    }
}

/// Versioned entities keyed by mobile id.
///
/// The `update` path is the compare-and-swap primitive that serializes
/// concurrent writers on the same entity: implementations must perform the
/// version check and the increment atomically (for SQL backends,
/// `UPDATE ... WHERE version = :expected` with affected-row verification).
/// `updated_at` is server-authoritative and assigned by the store.
pub trait RecordStore: Send + Sync {
    /// Fetches a record by mobile id within the scope.
    fn get(
        &self,
        scope: &TenantScope,
        domain: Domain,
        mobile_id: Uuid,
    ) -> StoreResult<Option<ServerRecord>>;

    /// Creates a record at version 1 in the scope's tenant.
    fn create(&self, scope: &TenantScope, record: NewRecord) -> StoreResult<ServerRecord>;

    /// Replaces the payload if `expected_version` matches, incrementing the
    /// version by exactly 1.
    fn update(
        &self,
        scope: &TenantScope,
        domain: Domain,
        mobile_id: Uuid,
        expected_version: u64,
        fields: Payload,
        sync_status: SyncStatus,
    ) -> StoreResult<ServerRecord>;

    /// Returns records with `updated_at > since`, scope-filtered.
    fn changed_since(
        &self,
        scope: &TenantScope,
        since: DateTime<Utc>,
    ) -> StoreResult<Vec<ServerRecord>>;
}

type RecordKey = (TenantId, Domain, Uuid);

/// In-memory record store backing tests and the reference service.
#[derive(Default)]
pub struct MemoryRecordStore {
    records: RwLock<HashMap<RecordKey, ServerRecord>>,
}

impl MemoryRecordStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a record verbatim, bypassing versioning.
    ///
    /// Fixture helper: lets tests seed records with a chosen `updated_at`
    /// or version without going through the write path.
    pub fn seed(&self, record: ServerRecord) {
        let key = (record.tenant_id.clone(), record.domain, record.mobile_id);
        self.records.write().insert(key, record);
    }

    /// Returns the number of stored records across all tenants.
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    /// Returns true if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

impl RecordStore for MemoryRecordStore {
    fn get(
        &self,
        scope: &TenantScope,
        domain: Domain,
        mobile_id: Uuid,
    ) -> StoreResult<Option<ServerRecord>> {
        let key = (scope.tenant_id().clone(), domain, mobile_id);
        let records = self.records.read();
        Ok(records.get(&key).filter(|r| scope.permits(r)).cloned())
    }

    fn create(&self, scope: &TenantScope, record: NewRecord) -> StoreResult<ServerRecord> {
        let key = (scope.tenant_id().clone(), record.domain, record.mobile_id);
        let mut records = self.records.write();

        if records.contains_key(&key) {
            return Err(StoreError::AlreadyExists {
                domain: record.domain,
                mobile_id: record.mobile_id,
            });
        }

        let stored = ServerRecord {
            mobile_id: record.mobile_id,
            tenant_id: scope.tenant_id().clone(),
            domain: record.domain,
            site_id: record.site_id,
            version: 1,
            updated_at: Utc::now(),
            fields: record.fields,
            sync_status: SyncStatus::Synced,
        };
        records.insert(key, stored.clone());
        Ok(stored)
    }

    fn update(
        &self,
        scope: &TenantScope,
        domain: Domain,
        mobile_id: Uuid,
        expected_version: u64,
        fields: Payload,
        sync_status: SyncStatus,
    ) -> StoreResult<ServerRecord> {
        let key = (scope.tenant_id().clone(), domain, mobile_id);
        // Single write lock: the version check and increment are atomic.
        let mut records = self.records.write();

        let record = records
            .get_mut(&key)
            .filter(|r| scope.permits(r))
            .ok_or(StoreError::NotFound { domain, mobile_id })?;

        if record.version != expected_version {
            return Err(StoreError::VersionMismatch {
                mobile_id,
                expected: expected_version,
                actual: record.version,
            });
        }

        record.version += 1;
        record.updated_at = Utc::now();
        record.fields = fields;
        record.sync_status = sync_status;
        Ok(record.clone())
    }

    fn changed_since(
        &self,
        scope: &TenantScope,
        since: DateTime<Utc>,
    ) -> StoreResult<Vec<ServerRecord>> {
        let records = self.records.read();
        let mut items: Vec<ServerRecord> = records
            .values()
            .filter(|r| scope.permits(r) && r.updated_at > since)
            .cloned()
            .collect();
        items.sort_by(|a, b| a.updated_at.cmp(&b.updated_at));
        Ok(items)
    }
}
