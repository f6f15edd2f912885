//! The transport-agnostic sync service.

use crate::config::ServiceConfig;
use crate::error::{ServiceError, ServiceResult};
use chrono::{DateTime, Utc};
use fieldsync_engine::{DeltaPullService, IdempotencyCache, SyncOrchestrator};
use fieldsync_protocol::{
    BatchResult, ChangesResponse, Domain, Payload, RequestContext, ResolutionResult, SyncRequest,
    SyncStatus, Winner,
};
use fieldsync_store::{
    AuditLog, ConflictResolutionLog, PolicyStore, RecordStore, StoreError, TenantScope,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

/// A supervisor's decision for one pending conflict.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManualResolution {
    /// Audit log entry the decision applies to.
    pub conflict_id: Uuid,
    /// Side whose values should be applied.
    pub winner: Winner,
    /// Field values to write; required unless the server side wins.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<Payload>,
}

/// The sync service.
///
/// Owns the orchestrator and the delta pull service over shared stores
/// and exposes one method per operation. An HTTP frontend maps routes
/// onto these methods; nothing here depends on a transport.
pub struct SyncService<R, P, I>
where
    R: RecordStore,
    P: PolicyStore,
    I: IdempotencyCache,
{
    orchestrator: SyncOrchestrator<R, P, I>,
    delta: DeltaPullService<R>,
    records: Arc<R>,
    audit: Arc<dyn AuditLog>,
    config: ServiceConfig,
}

impl<R, P, I> SyncService<R, P, I>
where
    R: RecordStore,
    P: PolicyStore,
    I: IdempotencyCache,
{
    /// Creates a service over shared stores.
    pub fn new(
        records: Arc<R>,
        policies: Arc<P>,
        idempotency: Arc<I>,
        audit: Arc<dyn AuditLog>,
        config: ServiceConfig,
    ) -> Self {
        let orchestrator = SyncOrchestrator::new(
            Arc::clone(&records),
            policies,
            idempotency,
            Arc::clone(&audit),
            config.engine.clone(),
        );
        let delta = DeltaPullService::new(Arc::clone(&records));
        Self {
            orchestrator,
            delta,
            records,
            audit,
            config,
        }
    }

    /// Handles a batch sync push for one domain.
    pub fn handle_sync(
        &self,
        ctx: &RequestContext,
        domain: &str,
        request: &SyncRequest,
        idempotency_key: Option<&str>,
    ) -> ServiceResult<BatchResult> {
        let domain: Domain = domain.parse()?;
        if request.client_id.is_empty() {
            return Err(ServiceError::InvalidRequest("client_id is required".into()));
        }

        let result = self
            .orchestrator
            .process_batch(ctx, domain, request, idempotency_key)?;
        Ok(result)
    }

    /// Handles a delta pull, optionally filtered to one domain.
    ///
    /// When the page cap truncates the result, the returned watermark is
    /// the last included record's `updated_at` so the client's next pull
    /// resumes where this one stopped. Resumption filters with a strict
    /// greater-than, so the page always extends over records sharing the
    /// boundary timestamp; a cut inside such a tie would skip the rest of
    /// it forever. A page may therefore exceed the cap by the tie width.
    pub fn handle_changes(
        &self,
        ctx: &RequestContext,
        domain: Option<&str>,
        since: Option<DateTime<Utc>>,
    ) -> ServiceResult<ChangesResponse> {
        let domain = domain.map(|d| d.parse::<Domain>()).transpose()?;
        let mut response = self.delta.changes_since(ctx, domain, since)?;

        let cap = self.config.max_pull_items;
        if cap > 0 && response.items.len() > cap {
            let boundary = response.items[cap - 1].updated_at;
            let keep = cap
                + response.items[cap..]
                    .iter()
                    .take_while(|r| r.updated_at == boundary)
                    .count();
            if keep < response.items.len() {
                response.items.truncate(keep);
                response.server_timestamp = boundary;
            }
        }
        Ok(response)
    }

    /// Lists conflicts awaiting a human decision, oldest first.
    pub fn pending_conflicts(
        &self,
        ctx: &RequestContext,
    ) -> ServiceResult<Vec<ConflictResolutionLog>> {
        let scope = TenantScope::of(ctx);
        Ok(self.audit.pending_manual(&scope)?)
    }

    /// Applies a supervisor's decision to a pending conflict.
    ///
    /// The decision writes through the same compare-and-swap as any other
    /// update and appends a follow-up audit entry; the original entry is
    /// never edited.
    pub fn handle_resolve(
        &self,
        ctx: &RequestContext,
        resolution: &ManualResolution,
    ) -> ServiceResult<ConflictResolutionLog> {
        let scope = TenantScope::of(ctx);
        let entry = self.audit.get(&scope, resolution.conflict_id)?;

        let pending = self.audit.pending_manual(&scope)?;
        if !pending.iter().any(|p| p.id == entry.id) {
            return Err(ServiceError::NotPending(entry.id));
        }

        let current = self
            .records
            .get(&scope, entry.domain, entry.mobile_id)?
            .ok_or(StoreError::NotFound {
                domain: entry.domain,
                mobile_id: entry.mobile_id,
            })?;

        match resolution.winner {
            Winner::Server => {}
            Winner::Client | Winner::Merged => {
                let fields = resolution.fields.clone().ok_or_else(|| {
                    ServiceError::InvalidRequest(
                        "fields are required unless the server side wins".into(),
                    )
                })?;
                self.records.update(
                    &scope,
                    entry.domain,
                    entry.mobile_id,
                    current.version,
                    fields,
                    SyncStatus::Synced,
                )?;
            }
            Winner::None => {
                return Err(ServiceError::InvalidRequest(
                    "a manual resolution must name a winner".into(),
                ));
            }
        }

        let follow_up = ConflictResolutionLog {
            id: Uuid::new_v4(),
            mobile_id: entry.mobile_id,
            domain: entry.domain,
            tenant_id: ctx.tenant_id.clone(),
            server_version: current.version,
            client_version: entry.client_version,
            strategy_used: "manual".into(),
            resolution_result: ResolutionResult::Resolved,
            winning_version: resolution.winner,
            merge_details: json!({
                "resolved_by": ctx.user_id,
                "source_entry": entry.id,
            }),
            created_at: Utc::now(),
        };
        self.audit.append(follow_up.clone())?;

        tracing::info!(
            domain = %entry.domain,
            mobile_id = %entry.mobile_id,
            winner = %resolution.winner,
            "manual resolution applied"
        );
        Ok(follow_up)
    }
}
