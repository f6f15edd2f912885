//! Incremental "what changed since T" reads.

use crate::error::EngineResult;
use chrono::{DateTime, Utc};
use fieldsync_protocol::{ChangesResponse, Domain, RequestContext};
use fieldsync_store::{RecordStore, TenantScope};
use std::sync::Arc;

/// Serves delta pulls against the record store.
///
/// The response carries a `server_timestamp` captured before the query
/// runs. A record written between capture and query execution may appear
/// in two consecutive pulls; clients treat pulled records as upserts, so
/// the overlap is harmless. A gap would not be.
pub struct DeltaPullService<R: RecordStore> {
    records: Arc<R>,
}

impl<R: RecordStore> DeltaPullService<R> {
    /// Creates a service over a record store.
    pub fn new(records: Arc<R>) -> Self {
        Self { records }
    }

    /// Returns records mutated after `since`, filtered to the caller's
    /// scope and optionally to one domain, ordered oldest first.
    ///
    /// A client's first pull passes `None` and receives its full visible
    /// state.
    pub fn changes_since(
        &self,
        ctx: &RequestContext,
        domain: Option<Domain>,
        since: Option<DateTime<Utc>>,
    ) -> EngineResult<ChangesResponse> {
        // Captured before the query so a concurrent write lands in this
        // pull or the next, never in neither.
        let server_timestamp = Utc::now();
        let watermark = since.unwrap_or(DateTime::<Utc>::MIN_UTC);

        let scope = TenantScope::of(ctx);
        let mut items = self.records.changed_since(&scope, watermark)?;
        if let Some(domain) = domain {
            items.retain(|r| r.domain == domain);
        }

        tracing::debug!(
            tenant = %ctx.tenant_id,
            items = items.len(),
            "delta pull served"
        );

        Ok(ChangesResponse {
            items,
            server_timestamp,
        })
    }
}
