//! Integration tests for the sync pipeline end to end.

use chrono::{Duration, Utc};
use fieldsync_engine::{
    DeltaPullService, EngineConfig, MemoryIdempotencyCache, SyncOrchestrator,
};
use fieldsync_protocol::{
    Domain, RequestContext, ResolutionPolicy, ResolutionResult, SyncEntry, SyncRequest,
    SyncStatus, SyncedStatus, TenantId,
};
use fieldsync_store::{
    AuditLog, MemoryAuditLog, MemoryPolicyStore, MemoryRecordStore, RecordStore, TenantScope,
};
use fieldsync_testkit::fixtures;
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

struct World {
    orchestrator: SyncOrchestrator<MemoryRecordStore, MemoryPolicyStore, MemoryIdempotencyCache>,
    delta: DeltaPullService<MemoryRecordStore>,
    records: Arc<MemoryRecordStore>,
    policies: Arc<MemoryPolicyStore>,
    audit: Arc<MemoryAuditLog>,
}

fn world() -> World {
    let records = Arc::new(MemoryRecordStore::new());
    let policies = Arc::new(MemoryPolicyStore::new());
    let cache = Arc::new(MemoryIdempotencyCache::new());
    let audit = Arc::new(MemoryAuditLog::new());
    let orchestrator = SyncOrchestrator::new(
        Arc::clone(&records),
        Arc::clone(&policies),
        cache,
        Arc::clone(&audit) as Arc<dyn AuditLog>,
        EngineConfig::default(),
    );
    let delta = DeltaPullService::new(Arc::clone(&records));
    World {
        orchestrator,
        delta,
        records,
        policies,
        audit,
    }
}

#[test]
fn offline_edit_cycle_push_then_pull() {
    let w = world();
    let ctx = fixtures::context("acme");

    // Device pushes a batch of offline edits.
    let entries: Vec<SyncEntry> = (0..5).map(|_| fixtures::entry(1)).collect();
    let request = SyncRequest::new(entries.clone(), "tablet-7");
    let result = w
        .orchestrator
        .process_batch(&ctx, Domain::Task, &request, Some("push-1"))
        .unwrap();
    assert_eq!(result.synced_items.len(), 5);

    // A second device pulls and sees all five records.
    let other_device = fixtures::context("acme");
    let pull = w
        .delta
        .changes_since(&other_device, Some(Domain::Task), None)
        .unwrap();
    assert_eq!(pull.items.len(), 5);

    // Nothing new after the returned watermark.
    let pull_again = w
        .delta
        .changes_since(&other_device, Some(Domain::Task), Some(pull.server_timestamp))
        .unwrap();
    assert!(pull_again.items.is_empty());
}

#[test]
fn two_devices_conflict_under_domain_default() {
    let w = world();
    let ctx = fixtures::context("acme");
    let id = Uuid::new_v4();

    // Device A creates the task.
    let base = fixtures::entry_for(id, 1);
    w.orchestrator
        .process_batch(
            &ctx,
            Domain::Task,
            &SyncRequest::new(vec![base.clone()], "device-a"),
            Some("a-1"),
        )
        .unwrap();

    // Device A updates it to version 2.
    let mut newer = fixtures::entry_for(id, 1);
    newer.client_timestamp = Utc::now();
    newer
        .fields
        .insert("description".into(), json!("updated by device a"));
    w.orchestrator
        .process_batch(
            &ctx,
            Domain::Task,
            &SyncRequest::new(vec![newer], "device-a"),
            Some("a-2"),
        )
        .unwrap();

    // Device B pushes a stale edit with an older client timestamp. Tasks
    // default to most_recent_wins, so the server's fresher write survives.
    let mut stale = fixtures::entry_for(id, 1);
    stale.client_timestamp = Utc::now() - Duration::hours(2);
    stale
        .fields
        .insert("description".into(), json!("stale edit from device b"));
    let result = w
        .orchestrator
        .process_batch(
            &ctx,
            Domain::Task,
            &SyncRequest::new(vec![stale], "device-b"),
            Some("b-1"),
        )
        .unwrap();

    assert_eq!(result.conflicts.len(), 1);
    let conflict = &result.conflicts[0];
    assert_eq!(conflict.resolution_result, Some(ResolutionResult::Resolved));
    assert_eq!(
        conflict.resolution_strategy.as_deref(),
        Some("most_recent_wins (server)")
    );

    let stored = w
        .records
        .get(&TenantScope::of(&ctx), Domain::Task, id)
        .unwrap()
        .unwrap();
    assert_eq!(stored.field("description"), Some(&json!("updated by device a")));
    // The losing write still advanced the version and flagged the record.
    assert_eq!(stored.version, 3);
    assert_eq!(stored.sync_status, SyncStatus::Conflict);
}

#[test]
fn escalated_ticket_keeps_server_escalation_state() {
    let w = world();
    let ctx = fixtures::context("acme");
    let id = Uuid::new_v4();

    let base = SyncEntry::new(id, 1, Utc::now())
        .with_field("description", json!("hvac unit rattling"))
        .with_field("status", json!("open"));
    w.orchestrator
        .process_batch(
            &ctx,
            Domain::Ticket,
            &SyncRequest::new(vec![base], "device-a"),
            Some("t-1"),
        )
        .unwrap();

    // Server-side escalation bumps the record to version 2.
    let escalated = SyncEntry::new(id, 1, Utc::now())
        .with_field("description", json!("hvac unit rattling"))
        .with_field("status", json!("escalated"))
        .with_field("escalation_level", json!(2));
    w.orchestrator
        .process_batch(
            &ctx,
            Domain::Ticket,
            &SyncRequest::new(vec![escalated], "dispatch-console"),
            Some("t-2"),
        )
        .unwrap();

    // The offline technician edits the description against version 1.
    let offline = SyncEntry::new(id, 1, Utc::now())
        .with_field("description", json!("hvac unit rattling, fan bearing worn"))
        .with_field("status", json!("open"));
    let result = w
        .orchestrator
        .process_batch(
            &ctx,
            Domain::Ticket,
            &SyncRequest::new(vec![offline], "device-a"),
            Some("t-3"),
        )
        .unwrap();

    assert_eq!(result.conflicts.len(), 1);
    assert_eq!(
        result.conflicts[0].resolution_result,
        Some(ResolutionResult::Resolved)
    );

    // Client prose kept, server escalation state kept.
    let stored = w
        .records
        .get(&TenantScope::of(&ctx), Domain::Ticket, id)
        .unwrap()
        .unwrap();
    assert_eq!(
        stored.field("description"),
        Some(&json!("hvac unit rattling, fan bearing worn"))
    );
    assert_eq!(stored.field("status"), Some(&json!("escalated")));
    assert_eq!(stored.field("escalation_level"), Some(&json!(2)));
}

#[test]
fn tenant_override_forces_manual_and_audits() {
    let w = world();
    let ctx = fixtures::context("acme");
    let id = Uuid::new_v4();

    w.policies.upsert(fixtures::manual_policy("acme", Domain::Journal));

    w.orchestrator
        .process_batch(
            &ctx,
            Domain::Journal,
            &SyncRequest::new(vec![fixtures::entry_for(id, 1)], "device-a"),
            Some("j-1"),
        )
        .unwrap();
    let mut bump = fixtures::entry_for(id, 1);
    bump.fields.insert("description".into(), json!("second write"));
    w.orchestrator
        .process_batch(
            &ctx,
            Domain::Journal,
            &SyncRequest::new(vec![bump], "device-b"),
            Some("j-2"),
        )
        .unwrap();

    let result = w
        .orchestrator
        .process_batch(
            &ctx,
            Domain::Journal,
            &SyncRequest::new(vec![fixtures::entry_for(id, 1)], "device-a"),
            Some("j-3"),
        )
        .unwrap();

    assert_eq!(result.conflicts.len(), 1);
    assert_eq!(
        result.conflicts[0].resolution_result,
        Some(ResolutionResult::ManualRequired)
    );

    let pending = w.audit.pending_manual(&TenantScope::of(&ctx)).unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].mobile_id, id);
    assert_eq!(pending[0].client_version, 1);
    assert_eq!(pending[0].server_version, 2);
}

#[test]
fn partial_failure_ten_good_one_bad() {
    let w = world();
    let ctx = fixtures::context("acme");

    let mut entries: Vec<SyncEntry> = (0..10).map(|_| fixtures::entry(1)).collect();
    // Version 0 is never valid.
    entries.insert(
        4,
        SyncEntry::new(Uuid::new_v4(), 0, Utc::now())
            .with_field("description", json!("bad entry")),
    );

    let result = w
        .orchestrator
        .process_batch(
            &ctx,
            Domain::Task,
            &SyncRequest::new(entries, "device-a"),
            Some("p-1"),
        )
        .unwrap();

    assert_eq!(result.synced_items.len(), 10);
    assert_eq!(result.errors.len(), 1);
    assert_eq!(w.records.len(), 10);
}

#[test]
fn replayed_batch_is_not_reexecuted() {
    let w = world();
    let ctx = fixtures::context("acme");
    let request = SyncRequest::new(vec![fixtures::entry(1)], "device-a");

    let first = w
        .orchestrator
        .process_batch(&ctx, Domain::Task, &request, Some("r-1"))
        .unwrap();
    assert_eq!(first.synced_items[0].status, SyncedStatus::Created);

    let replay = w
        .orchestrator
        .process_batch(&ctx, Domain::Task, &request, Some("r-1"))
        .unwrap();

    // The replay reports Created again instead of colliding with itself.
    assert_eq!(replay.synced_items[0].status, SyncedStatus::Created);
    assert_eq!(replay.synced_items[0].server_version, 1);
    assert_eq!(w.records.len(), 1);
}

#[test]
fn tenants_never_observe_each_other() {
    let w = world();
    let acme = fixtures::context("acme");
    let globex = fixtures::context("globex");
    let id = Uuid::new_v4();

    w.orchestrator
        .process_batch(
            &acme,
            Domain::Task,
            &SyncRequest::new(vec![fixtures::entry_for(id, 1)], "device-a"),
            Some("iso-1"),
        )
        .unwrap();

    // The same mobile_id in another tenant is an independent create, not
    // an update and not a conflict.
    let result = w
        .orchestrator
        .process_batch(
            &globex,
            Domain::Task,
            &SyncRequest::new(vec![fixtures::entry_for(id, 1)], "device-x"),
            Some("iso-2"),
        )
        .unwrap();
    assert_eq!(result.synced_items[0].status, SyncedStatus::Created);

    let pull = w.delta.changes_since(&globex, None, None).unwrap();
    assert_eq!(pull.items.len(), 1);
    assert_eq!(pull.items[0].tenant_id, TenantId::new("globex"));
}

#[test]
fn tenant_override_changes_the_applied_strategy() {
    let w = world();
    let ctx = fixtures::context("acme");
    let id = Uuid::new_v4();

    // Attendance defaults to server_wins; this tenant prefers client_wins.
    w.policies.upsert(fixtures::policy(
        "acme",
        Domain::Attendance,
        ResolutionPolicy::ClientWins,
    ));

    w.orchestrator
        .process_batch(
            &ctx,
            Domain::Attendance,
            &SyncRequest::new(vec![fixtures::entry_for(id, 1)], "device-a"),
            Some("o-1"),
        )
        .unwrap();
    let mut bump = fixtures::entry_for(id, 1);
    bump.fields.insert("description".into(), json!("server copy"));
    w.orchestrator
        .process_batch(
            &ctx,
            Domain::Attendance,
            &SyncRequest::new(vec![bump], "device-b"),
            Some("o-2"),
        )
        .unwrap();

    let mut stale = fixtures::entry_for(id, 1);
    stale
        .fields
        .insert("description".into(), json!("client copy wins"));
    let result = w
        .orchestrator
        .process_batch(
            &ctx,
            Domain::Attendance,
            &SyncRequest::new(vec![stale], "device-a"),
            Some("o-3"),
        )
        .unwrap();

    assert_eq!(
        result.conflicts[0].resolution_strategy.as_deref(),
        Some("client_wins")
    );
    let stored = w
        .records
        .get(&TenantScope::of(&ctx), Domain::Attendance, id)
        .unwrap()
        .unwrap();
    assert_eq!(stored.field("description"), Some(&json!("client copy wins")));
}
