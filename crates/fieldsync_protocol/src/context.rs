//! Request context for explicit tenant/user/device scoping.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identifier of a tenant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TenantId(String);

impl TenantId {
    /// Creates a new tenant id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TenantId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// The acting tenant, user and device for one core call.
///
/// The context is always passed explicitly; the core has no implicit or
/// global session state. The caller (transport layer) is assumed to have
/// already authenticated the user and resolved the tenant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestContext {
    /// Tenant the caller acts for.
    pub tenant_id: TenantId,
    /// Acting user.
    pub user_id: Uuid,
    /// Device the request originated from.
    pub device_id: Uuid,
    /// Sites the caller may see. Empty means all sites of the tenant.
    pub assigned_site_ids: Vec<String>,
}

impl RequestContext {
    /// Creates a context with no site restriction.
    pub fn new(tenant_id: TenantId, user_id: Uuid, device_id: Uuid) -> Self {
        Self {
            tenant_id,
            user_id,
            device_id,
            assigned_site_ids: Vec::new(),
        }
    }

    /// Restricts the context to the given sites.
    pub fn with_sites(mut self, site_ids: Vec<String>) -> Self {
        self.assigned_site_ids = site_ids;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_construction() {
        let ctx = RequestContext::new(TenantId::new("acme"), Uuid::new_v4(), Uuid::new_v4())
            .with_sites(vec!["hq".into(), "warehouse".into()]);

        assert_eq!(ctx.tenant_id.as_str(), "acme");
        assert_eq!(ctx.assigned_site_ids.len(), 2);
    }

    #[test]
    fn tenant_id_display() {
        assert_eq!(TenantId::new("acme").to_string(), "acme");
    }
}
