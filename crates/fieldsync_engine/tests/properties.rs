//! Property-based tests for resolution determinism and version monotonicity.

use chrono::Utc;
use fieldsync_engine::{
    derive_key, effective_policy, resolve, ConflictCandidate, EngineConfig,
    MemoryIdempotencyCache, SyncOrchestrator,
};
use fieldsync_protocol::{
    Domain, ServerRecord, SyncRequest, SyncStatus, TenantId,
};
use fieldsync_store::{
    AuditLog, MemoryAuditLog, MemoryPolicyStore, MemoryRecordStore, RecordStore, TenantScope,
};
use fieldsync_testkit::fixtures;
use fieldsync_testkit::generators::{
    auto_policy_strategy, domain_strategy, entry_strategy, payload_strategy,
};
use proptest::prelude::*;
use std::sync::Arc;
use uuid::Uuid;

fn server_record(domain: Domain, fields: fieldsync_protocol::Payload) -> ServerRecord {
    ServerRecord {
        mobile_id: Uuid::new_v4(),
        tenant_id: TenantId::new("acme"),
        domain,
        site_id: None,
        version: 2,
        updated_at: Utc::now(),
        fields,
        sync_status: SyncStatus::Synced,
    }
}

proptest! {
    /// Identical inputs always produce identical outcomes.
    #[test]
    fn resolution_is_deterministic(
        domain in domain_strategy(),
        policy in auto_policy_strategy(),
        entry in entry_strategy(),
        server_fields in payload_strategy(),
    ) {
        let server = server_record(domain, server_fields);
        let mut client = entry;
        client.mobile_id = server.mobile_id;

        let candidate = ConflictCandidate {
            domain,
            tenant_id: TenantId::new("acme"),
            server,
            client,
        };

        let first = resolve(&candidate, policy);
        let second = resolve(&candidate, policy);

        prop_assert_eq!(first.resolution, second.resolution);
        prop_assert_eq!(first.winning_fields, second.winning_fields);
        prop_assert_eq!(first.strategy, second.strategy);
        prop_assert_eq!(first.merge_details, second.merge_details);
    }

    /// An auto-resolving policy never defers to a human, and the manual
    /// path never produces fields to write.
    #[test]
    fn auto_policies_always_decide(
        domain in domain_strategy(),
        policy in auto_policy_strategy(),
        entry in entry_strategy(),
        server_fields in payload_strategy(),
    ) {
        let server = server_record(domain, server_fields);
        let mut client = entry;
        client.mobile_id = server.mobile_id;
        let candidate = ConflictCandidate {
            domain,
            tenant_id: TenantId::new("acme"),
            server,
            client,
        };

        let outcome = resolve(&candidate, policy);
        prop_assert!(outcome.winning_fields.is_some());

        let manual = resolve(&candidate, fieldsync_protocol::ResolutionPolicy::Manual);
        prop_assert!(manual.winning_fields.is_none());
    }

    /// Without a tenant override, every domain resolves to its default,
    /// never to manual.
    #[test]
    fn default_policy_tier_is_total(domain in domain_strategy()) {
        let policy = effective_policy(None, domain);
        prop_assert!(policy.auto_resolves());
    }

    /// Key derivation is stable under payload field reordering and
    /// always 64 hex characters.
    #[test]
    fn derived_keys_are_stable(entry in entry_strategy()) {
        let request = SyncRequest::new(vec![entry], "device-1");
        let payload = serde_json::to_value(&request).unwrap();
        let context = serde_json::json!({"tenant_id": "acme"});

        let key = derive_key("sync:task", &payload, &context);
        prop_assert_eq!(key.len(), 64);
        prop_assert_eq!(key.clone(), derive_key("sync:task", &payload, &context));
    }

    /// The version counter advances by exactly 1 per accepted write,
    /// whatever sequence of payloads is applied.
    #[test]
    fn version_is_monotonic_under_accepted_writes(
        payloads in prop::collection::vec(payload_strategy(), 1..12),
    ) {
        let records = Arc::new(MemoryRecordStore::new());
        let policies = Arc::new(MemoryPolicyStore::new());
        let cache = Arc::new(MemoryIdempotencyCache::new());
        let audit = Arc::new(MemoryAuditLog::new());
        let orchestrator = SyncOrchestrator::new(
            Arc::clone(&records),
            policies,
            cache,
            audit as Arc<dyn AuditLog>,
            EngineConfig::default(),
        );
        let ctx = fixtures::context("acme");
        let id = Uuid::new_v4();

        for (i, fields) in payloads.iter().enumerate() {
            // First write creates; later writes carry the last server version.
            let mut entry = fixtures::entry_for(id, (i as u64).max(1));
            entry.fields = fields.clone();

            let result = orchestrator
                .process_batch(
                    &ctx,
                    Domain::Task,
                    &SyncRequest::new(vec![entry], "device-p"),
                    Some(&format!("prop-{id}-{i}")),
                )
                .unwrap();
            prop_assert_eq!(result.synced_items.len(), 1);
            prop_assert_eq!(result.synced_items[0].server_version, i as u64 + 1);
        }

        let stored = records
            .get(&TenantScope::of(&ctx), Domain::Task, id)
            .unwrap()
            .unwrap();
        prop_assert_eq!(stored.version, payloads.len() as u64);
    }
}
