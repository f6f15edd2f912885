//! Tenant conflict policy store with read-through caching.

use crate::error::StoreResult;
use crate::scope::TenantScope;
use fieldsync_protocol::{Domain, TenantConflictPolicy, TenantId};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Per-tenant, per-domain resolution policy configuration.
///
/// Policies are written by tenant administrators outside this workspace;
/// the engine only reads them. Absence of a policy is not an error: the
/// engine falls back to the per-domain default table.
pub trait PolicyStore: Send + Sync {
    /// Looks up the tenant's policy override for a domain.
    fn policy(&self, scope: &TenantScope, domain: Domain) -> StoreResult<Option<TenantConflictPolicy>>;
}

/// In-memory policy store.
#[derive(Default)]
pub struct MemoryPolicyStore {
    policies: RwLock<HashMap<(TenantId, Domain), TenantConflictPolicy>>,
}

impl MemoryPolicyStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a policy.
    ///
    /// The `TenantConflictPolicy` constructor already rejects the
    /// manual-plus-auto-resolve combination, so anything reaching here
    /// satisfies the invariant.
    pub fn upsert(&self, policy: TenantConflictPolicy) {
        let key = (policy.tenant_id.clone(), policy.domain);
        self.policies.write().insert(key, policy);
    }

    /// Removes a policy override.
    pub fn remove(&self, tenant_id: &TenantId, domain: Domain) {
        self.policies.write().remove(&(tenant_id.clone(), domain));
    }
}

impl PolicyStore for MemoryPolicyStore {
    fn policy(&self, scope: &TenantScope, domain: Domain) -> StoreResult<Option<TenantConflictPolicy>> {
        let key = (scope.tenant_id().clone(), domain);
        Ok(self.policies.read().get(&key).cloned())
    }
}

/// Read-through cache in front of a policy store.
///
/// Policy lookups sit on the hot path of every conflict, but policies
/// change rarely; the cache holds both positive and negative lookups for
/// the TTL (default 1 hour).
pub struct CachedPolicyStore<S: PolicyStore> {
    inner: S,
    ttl: Duration,
    cache: RwLock<HashMap<(TenantId, Domain), CacheSlot>>,
}

struct CacheSlot {
    fetched_at: Instant,
    value: Option<TenantConflictPolicy>,
}

impl<S: PolicyStore> CachedPolicyStore<S> {
    /// Default cache TTL.
    pub const DEFAULT_TTL: Duration = Duration::from_secs(60 * 60);

    /// Wraps a policy store with the default TTL.
    pub fn new(inner: S) -> Self {
        Self::with_ttl(inner, Self::DEFAULT_TTL)
    }

    /// Wraps a policy store with an explicit TTL.
    pub fn with_ttl(inner: S, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Drops all cached entries.
    pub fn invalidate_all(&self) {
        self.cache.write().clear();
    }

    /// Drops the cached entry for one tenant/domain pair.
    pub fn invalidate(&self, tenant_id: &TenantId, domain: Domain) {
        self.cache.write().remove(&(tenant_id.clone(), domain));
    }
}

impl<S: PolicyStore> PolicyStore for CachedPolicyStore<S> {
    fn policy(&self, scope: &TenantScope, domain: Domain) -> StoreResult<Option<TenantConflictPolicy>> {
        let key = (scope.tenant_id().clone(), domain);

        if let Some(slot) = self.cache.read().get(&key) {
            if slot.fetched_at.elapsed() < self.ttl {
                return Ok(slot.value.clone());
            }
        }

        let value = self.inner.policy(scope, domain)?;
        self.cache.write().insert(
            key,
            CacheSlot {
                fetched_at: Instant::now(),
                value: value.clone(),
            },
        );
        Ok(value)
    }
}
