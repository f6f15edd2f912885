//! Fixtures for entries, records, policies and stores.
//!
//! Provides convenience builders for the shapes most tests need, with
//! sensible defaults that individual tests override.

use chrono::Utc;
use fieldsync_protocol::{
    Domain, Payload, RequestContext, ResolutionPolicy, ServerRecord, SyncEntry, SyncStatus,
    TenantConflictPolicy, TenantId,
};
use fieldsync_store::{MemoryPolicyStore, MemoryRecordStore, NewRecord, TenantScope};
use serde_json::json;
use uuid::Uuid;

/// A request context for the given tenant with fresh user and device ids.
pub fn context(tenant: &str) -> RequestContext {
    RequestContext::new(TenantId::new(tenant), Uuid::new_v4(), Uuid::new_v4())
}

/// A request context restricted to the given sites.
pub fn site_context(tenant: &str, sites: &[&str]) -> RequestContext {
    context(tenant).with_sites(sites.iter().map(|s| s.to_string()).collect())
}

/// A payload with a single valid `description` field.
pub fn payload(description: &str) -> Payload {
    let mut map = Payload::new();
    map.insert("description".into(), json!(description));
    map
}

/// A valid entry at the given version with a fresh id.
pub fn entry(version: u64) -> SyncEntry {
    SyncEntry::new(Uuid::new_v4(), version, Utc::now())
        .with_field("description", json!("routine maintenance check"))
}

/// A valid entry for a specific entity id.
pub fn entry_for(mobile_id: Uuid, version: u64) -> SyncEntry {
    SyncEntry::new(mobile_id, version, Utc::now())
        .with_field("description", json!("routine maintenance check"))
}

/// A synced server record owned by the given tenant.
pub fn record(tenant: &str, domain: Domain, version: u64) -> ServerRecord {
    ServerRecord {
        mobile_id: Uuid::new_v4(),
        tenant_id: TenantId::new(tenant),
        domain,
        site_id: None,
        version,
        updated_at: Utc::now(),
        fields: payload("seeded record"),
        sync_status: SyncStatus::Synced,
    }
}

/// A tenant policy override that auto-resolves.
pub fn policy(tenant: &str, domain: Domain, strategy: ResolutionPolicy) -> TenantConflictPolicy {
    TenantConflictPolicy::new(TenantId::new(tenant), domain, strategy, true)
        .expect("fixture policy must be constructible")
}

/// A tenant policy override that forces the manual path.
pub fn manual_policy(tenant: &str, domain: Domain) -> TenantConflictPolicy {
    TenantConflictPolicy::new(TenantId::new(tenant), domain, ResolutionPolicy::Manual, false)
        .expect("fixture policy must be constructible")
}

/// Test scenario helpers.
pub mod scenarios {
    use super::*;
    use fieldsync_store::RecordStore;

    /// A record store pre-populated with `count` task records for a tenant.
    pub fn populated_record_store(tenant: &str, count: usize) -> MemoryRecordStore {
        let store = MemoryRecordStore::new();
        let scope = TenantScope::new(TenantId::new(tenant));
        for i in 0..count {
            store
                .create(
                    &scope,
                    NewRecord::new(
                        Uuid::new_v4(),
                        Domain::Task,
                        payload(&format!("seeded task {i}")),
                    ),
                )
                .expect("seeding a fresh store cannot conflict");
        }
        store
    }

    /// A policy store with one override per domain, all auto-resolving
    /// with the given strategy.
    pub fn uniform_policy_store(tenant: &str, strategy: ResolutionPolicy) -> MemoryPolicyStore {
        let store = MemoryPolicyStore::new();
        for domain in Domain::ALL {
            store.upsert(policy(tenant, domain, strategy));
        }
        store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fieldsync_store::RecordStore;

    #[test]
    fn populated_store_has_requested_count() {
        let store = scenarios::populated_record_store("acme", 5);
        assert_eq!(store.len(), 5);
    }

    #[test]
    fn populated_store_is_tenant_scoped() {
        let store = scenarios::populated_record_store("acme", 3);
        let other = TenantScope::new(TenantId::new("globex"));
        let visible = store
            .changed_since(&other, Utc::now() - chrono::Duration::hours(1))
            .unwrap();
        assert!(visible.is_empty());
    }

    #[test]
    fn manual_policy_fixture_never_auto_resolves() {
        let p = manual_policy("acme", Domain::Task);
        assert!(!p.auto_resolve);
        assert_eq!(p.resolution_policy, ResolutionPolicy::Manual);
    }
}
