//! Batch sync orchestration.

use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::idempotency::{self, IdempotencyCache, IdempotencyScope, NewIdempotencyRecord};
use crate::metrics::{BatchMetrics, MetricsSink, NoopMetrics};
use crate::resolution::{self, ConflictCandidate};
use crate::validate::validate_entry;
use chrono::Utc;
use fieldsync_protocol::{
    BatchResult, ConflictItem, Domain, ErrorItem, RequestContext, ResolutionResult, ServerRecord,
    SyncEntry, SyncRequest, SyncStatus, SyncedItem, SyncedStatus, Winner,
};
use fieldsync_store::{
    AuditLog, ConflictResolutionLog, NewRecord, PolicyStore, RecordStore, StoreError, TenantScope,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

/// The batch sync pipeline.
///
/// For each incoming entry the orchestrator looks up server state, detects
/// conflicts, invokes the resolution engine or records a version mismatch,
/// writes through to the record store, and assembles the structured
/// response. Idempotency across retries is guaranteed per key.
pub struct SyncOrchestrator<R, P, I>
where
    R: RecordStore,
    P: PolicyStore,
    I: IdempotencyCache,
{
    records: Arc<R>,
    policies: Arc<P>,
    idempotency: Arc<I>,
    audit: Arc<dyn AuditLog>,
    metrics: Arc<dyn MetricsSink>,
    config: EngineConfig,
}

enum EntryOutcome {
    Synced(SyncedItem),
    Conflict(ConflictItem),
    Error(ErrorItem),
}

impl<R, P, I> SyncOrchestrator<R, P, I>
where
    R: RecordStore,
    P: PolicyStore,
    I: IdempotencyCache,
{
    /// Creates an orchestrator with a no-op metrics sink.
    pub fn new(
        records: Arc<R>,
        policies: Arc<P>,
        idempotency: Arc<I>,
        audit: Arc<dyn AuditLog>,
        config: EngineConfig,
    ) -> Self {
        Self {
            records,
            policies,
            idempotency,
            audit,
            metrics: Arc::new(NoopMetrics),
            config,
        }
    }

    /// Attaches a metrics sink.
    pub fn with_metrics(mut self, metrics: Arc<dyn MetricsSink>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Processes one batch of entries for a single domain.
    ///
    /// Every entry is classified into exactly one of
    /// created/updated/conflict/error. Entries are independent: processing
    /// order carries no meaning and one bad entry never blocks its
    /// siblings. A replayed idempotency key returns the cached result
    /// without touching the record store.
    pub fn process_batch(
        &self,
        ctx: &RequestContext,
        domain: Domain,
        request: &SyncRequest,
        idempotency_key: Option<&str>,
    ) -> EngineResult<BatchResult> {
        if request.entries.len() > self.config.max_batch_size {
            return Err(EngineError::BatchTooLarge {
                size: request.entries.len(),
                limit: self.config.max_batch_size,
            });
        }

        let started = Instant::now();
        let payload = serde_json::to_value(request)
            .map_err(|e| EngineError::Internal(format!("request serialization: {e}")))?;
        let payload_hash = idempotency::request_hash(&payload);
        let key = match idempotency_key {
            Some(key) => key.to_string(),
            None => idempotency::derive_key(
                &format!("sync:{domain}"),
                &payload,
                &json!({
                    "tenant_id": ctx.tenant_id,
                    "user_id": ctx.user_id,
                    "device_id": ctx.device_id,
                }),
            ),
        };

        // Replay short-circuit. A cache outage degrades retry-safety but
        // never blocks the batch.
        match self.idempotency.check_duplicate(&key) {
            Ok(Some(cached)) => {
                if cached.request_hash != payload_hash {
                    tracing::warn!(
                        domain = %domain,
                        key = %key,
                        "idempotency key reused with a different payload, replaying the original"
                    );
                }
                tracing::debug!(domain = %domain, key = %key, "idempotency cache hit, replaying");
                return serde_json::from_value(cached.response)
                    .map_err(|e| EngineError::Internal(format!("cached response decode: {e}")));
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(domain = %domain, error = %e, "idempotency cache unavailable, retry-safety degraded");
            }
        }

        let scope = TenantScope::of(ctx);
        let deadline = started + self.config.batch_deadline;
        let mut result = BatchResult::new();
        let mut completed = true;

        for entry in &request.entries {
            if Instant::now() >= deadline {
                tracing::warn!(
                    domain = %domain,
                    processed = result.total(),
                    submitted = request.entries.len(),
                    "batch deadline reached, remaining entries omitted"
                );
                completed = false;
                break;
            }

            match self.process_entry(&scope, ctx, domain, entry) {
                EntryOutcome::Synced(item) => result.synced_items.push(item),
                EntryOutcome::Conflict(item) => result.conflicts.push(item),
                EntryOutcome::Error(item) => result.errors.push(item),
            }
        }

        // A partial result is not the final answer for this key; only a
        // fully-completed batch is eligible for replay.
        if completed {
            let record = NewIdempotencyRecord {
                key: key.clone(),
                scope: IdempotencyScope::Batch,
                request_hash: payload_hash,
                response: serde_json::to_value(&result)
                    .map_err(|e| EngineError::Internal(format!("response serialization: {e}")))?,
                user_id: ctx.user_id,
                device_id: ctx.device_id,
                endpoint: format!("sync/{domain}"),
            };
            match self.idempotency.store_response(record) {
                Ok(true) => {}
                Ok(false) => {
                    tracing::debug!(key = %key, "concurrent duplicate already cached this key");
                }
                Err(e) => {
                    tracing::warn!(key = %key, error = %e, "failed to cache batch response");
                }
            }
        }

        let metrics = BatchMetrics {
            created: result
                .synced_items
                .iter()
                .filter(|i| i.status == SyncedStatus::Created)
                .count(),
            updated: result
                .synced_items
                .iter()
                .filter(|i| i.status == SyncedStatus::Updated)
                .count(),
            conflicts: result.conflicts.len(),
            errors: result.errors.len(),
        };
        self.metrics
            .batch_completed(domain, metrics, started.elapsed());
        tracing::info!(
            domain = %domain,
            synced = result.synced_items.len(),
            conflicts = result.conflicts.len(),
            errors = result.errors.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "batch processed"
        );

        Ok(result)
    }

    fn process_entry(
        &self,
        scope: &TenantScope,
        ctx: &RequestContext,
        domain: Domain,
        entry: &SyncEntry,
    ) -> EntryOutcome {
        if let Err(message) = validate_entry(entry, &self.config) {
            return EntryOutcome::Error(ErrorItem {
                mobile_id: entry.mobile_id,
                error: message,
            });
        }

        let existing = match self.records.get(scope, domain, entry.mobile_id) {
            Ok(existing) => existing,
            Err(e) => return self.entry_error(entry.mobile_id, &e),
        };

        match existing {
            None => self.create_entry(scope, ctx, domain, entry),
            Some(server) if entry.version == server.version => {
                self.update_entry(scope, ctx, domain, entry)
            }
            Some(server) => self.handle_conflict(scope, ctx, domain, entry, server),
        }
    }

    fn create_entry(
        &self,
        scope: &TenantScope,
        ctx: &RequestContext,
        domain: Domain,
        entry: &SyncEntry,
    ) -> EntryOutcome {
        let mut record = NewRecord::new(entry.mobile_id, domain, entry.fields.clone());
        if let Some(site) = entry.field("site_id").and_then(|v| v.as_str()) {
            record = record.with_site(site);
        }

        match self.records.create(scope, record) {
            Ok(created) => EntryOutcome::Synced(SyncedItem {
                mobile_id: created.mobile_id,
                status: SyncedStatus::Created,
                server_version: created.version,
            }),
            // Lost a create race: another writer claimed the id first.
            Err(StoreError::AlreadyExists { .. }) => {
                match self.records.get(scope, domain, entry.mobile_id) {
                    Ok(Some(server)) if entry.version == server.version => {
                        self.update_entry(scope, ctx, domain, entry)
                    }
                    Ok(Some(server)) => self.handle_conflict(scope, ctx, domain, entry, server),
                    Ok(None) => EntryOutcome::Error(ErrorItem {
                        mobile_id: entry.mobile_id,
                        error: "record vanished during create race".into(),
                    }),
                    Err(e) => self.entry_error(entry.mobile_id, &e),
                }
            }
            Err(e) => self.entry_error(entry.mobile_id, &e),
        }
    }

    fn update_entry(
        &self,
        scope: &TenantScope,
        ctx: &RequestContext,
        domain: Domain,
        entry: &SyncEntry,
    ) -> EntryOutcome {
        let write = self.records.update(
            scope,
            domain,
            entry.mobile_id,
            entry.version,
            entry.fields.clone(),
            SyncStatus::Synced,
        );

        match write {
            Ok(updated) => EntryOutcome::Synced(SyncedItem {
                mobile_id: updated.mobile_id,
                status: SyncedStatus::Updated,
                server_version: updated.version,
            }),
            // Lost the CAS race: re-read and resolve against fresh state.
            Err(StoreError::VersionMismatch { .. }) => {
                match self.records.get(scope, domain, entry.mobile_id) {
                    Ok(Some(server)) => self.handle_conflict(scope, ctx, domain, entry, server),
                    Ok(None) => EntryOutcome::Error(ErrorItem {
                        mobile_id: entry.mobile_id,
                        error: "record vanished during update race".into(),
                    }),
                    Err(e) => self.entry_error(entry.mobile_id, &e),
                }
            }
            Err(e) => self.entry_error(entry.mobile_id, &e),
        }
    }

    fn handle_conflict(
        &self,
        scope: &TenantScope,
        ctx: &RequestContext,
        domain: Domain,
        entry: &SyncEntry,
        server: ServerRecord,
    ) -> EntryOutcome {
        let tenant_override = match self.policies.policy(scope, domain) {
            Ok(p) => p,
            Err(e) => {
                // Policy store outage degrades to the domain defaults.
                tracing::warn!(domain = %domain, error = %e, "policy lookup failed, using domain default");
                None
            }
        };
        let policy = resolution::effective_policy(tenant_override.as_ref(), domain);

        let candidate = ConflictCandidate {
            domain,
            tenant_id: ctx.tenant_id.clone(),
            server: server.clone(),
            client: entry.clone(),
        };
        let outcome = resolution::resolve(&candidate, policy);

        tracing::debug!(
            domain = %domain,
            mobile_id = %entry.mobile_id,
            server_version = server.version,
            client_version = entry.version,
            strategy = %outcome.strategy,
            "version conflict detected"
        );

        let (resolution_result, winning_version) = match &outcome.winning_fields {
            Some(fields) => {
                let write = self.records.update(
                    scope,
                    domain,
                    entry.mobile_id,
                    server.version,
                    fields.clone(),
                    SyncStatus::Conflict,
                );
                match write {
                    Ok(_) => (ResolutionResult::Resolved, outcome.strategy.winner),
                    Err(e) => {
                        tracing::warn!(
                            mobile_id = %entry.mobile_id,
                            error = %e,
                            "resolution write failed"
                        );
                        (ResolutionResult::Failed, Winner::None)
                    }
                }
            }
            None => (ResolutionResult::ManualRequired, Winner::None),
        };

        let log = ConflictResolutionLog {
            id: Uuid::new_v4(),
            mobile_id: entry.mobile_id,
            domain,
            tenant_id: ctx.tenant_id.clone(),
            server_version: server.version,
            client_version: entry.version,
            strategy_used: outcome.strategy.to_string(),
            resolution_result,
            winning_version,
            merge_details: outcome.merge_details,
            created_at: Utc::now(),
        };
        if let Err(e) = self.audit.append(log) {
            tracing::warn!(mobile_id = %entry.mobile_id, error = %e, "audit append failed");
        }
        self.metrics
            .conflict_recorded(domain, outcome.strategy.policy, resolution_result);

        EntryOutcome::Conflict(ConflictItem {
            mobile_id: entry.mobile_id,
            status: SyncStatus::Conflict,
            server_version: server.version,
            client_version: entry.version,
            resolution_strategy: Some(outcome.strategy.to_string()),
            resolution_result: Some(resolution_result),
        })
    }

    fn entry_error(&self, mobile_id: Uuid, error: &StoreError) -> EntryOutcome {
        tracing::warn!(mobile_id = %mobile_id, error = %error, "entry failed");
        EntryOutcome::Error(ErrorItem {
            mobile_id,
            error: error.to_string(),
        })
    }
}
