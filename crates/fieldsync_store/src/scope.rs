//! Mandatory tenant/site scoping for store calls.

use fieldsync_protocol::{RequestContext, ServerRecord, TenantId};

/// The visibility scope of a store call.
///
/// Every record and policy store operation takes a scope; there is no way
/// to query without one. This makes multi-tenant isolation a property of
/// the call signature rather than a convention each backend must remember
/// to apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantScope {
    tenant_id: TenantId,
    site_ids: Vec<String>,
}

impl TenantScope {
    /// Creates a scope covering all sites of a tenant.
    pub fn new(tenant_id: TenantId) -> Self {
        Self {
            tenant_id,
            site_ids: Vec::new(),
        }
    }

    /// Restricts the scope to the given sites.
    pub fn with_sites(mut self, site_ids: Vec<String>) -> Self {
        self.site_ids = site_ids;
        self
    }

    /// Builds the scope of a request context.
    pub fn of(ctx: &RequestContext) -> Self {
        Self {
            tenant_id: ctx.tenant_id.clone(),
            site_ids: ctx.assigned_site_ids.clone(),
        }
    }

    /// The tenant this scope covers.
    pub fn tenant_id(&self) -> &TenantId {
        &self.tenant_id
    }

    /// Site restriction; empty means all sites of the tenant.
    pub fn site_ids(&self) -> &[String] {
        &self.site_ids
    }

    /// Returns true if the record is visible within this scope.
    pub fn permits(&self, record: &ServerRecord) -> bool {
        if record.tenant_id != self.tenant_id {
            return false;
        }
        if self.site_ids.is_empty() {
            return true;
        }
        match &record.site_id {
            Some(site) => self.site_ids.iter().any(|s| s == site),
            // Tenant-wide records are visible to every site-restricted scope.
            None => true,
        }
    }
}
