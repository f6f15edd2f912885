//! Conflict resolution policies.

use crate::context::TenantId;
use crate::domain::Domain;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Named strategy used to settle a version conflict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionPolicy {
    /// Client entry wins verbatim.
    ClientWins,
    /// Server record wins verbatim.
    ServerWins,
    /// Most recently updated side wins; ties go to the server.
    MostRecentWins,
    /// Client edits kept, server escalation state preserved.
    PreserveEscalation,
    /// A human must resolve the conflict out of band.
    Manual,
}

impl ResolutionPolicy {
    /// Returns true if this policy resolves conflicts without a human.
    pub fn auto_resolves(&self) -> bool {
        !matches!(self, ResolutionPolicy::Manual)
    }

    /// Returns the default policy for a domain.
    ///
    /// Used when no tenant override exists. The match is exhaustive over
    /// the closed domain set, so a new domain cannot ship without a default.
    pub fn default_for(domain: Domain) -> Self {
        match domain {
            Domain::Journal => ResolutionPolicy::ClientWins,
            Domain::Attendance => ResolutionPolicy::ServerWins,
            Domain::Task => ResolutionPolicy::MostRecentWins,
            Domain::Ticket => ResolutionPolicy::PreserveEscalation,
            Domain::WorkOrder => ResolutionPolicy::MostRecentWins,
        }
    }

    /// Returns the wire name of the policy.
    pub fn as_str(&self) -> &'static str {
        match self {
            ResolutionPolicy::ClientWins => "client_wins",
            ResolutionPolicy::ServerWins => "server_wins",
            ResolutionPolicy::MostRecentWins => "most_recent_wins",
            ResolutionPolicy::PreserveEscalation => "preserve_escalation",
            ResolutionPolicy::Manual => "manual",
        }
    }
}

impl fmt::Display for ResolutionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which side's values won a resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Winner {
    /// Client entry applied.
    Client,
    /// Server record kept.
    Server,
    /// Field-level merge of both sides.
    Merged,
    /// No winner (manual resolution pending).
    None,
}

impl fmt::Display for Winner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Winner::Client => "client",
            Winner::Server => "server",
            Winner::Merged => "merged",
            Winner::None => "none",
        };
        f.write_str(s)
    }
}

/// Terminal result of a resolution attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionResult {
    /// The conflict was resolved automatically.
    Resolved,
    /// A human must decide; nothing was written.
    ManualRequired,
    /// Resolution was attempted but the write failed.
    Failed,
}

/// Per-tenant, per-domain conflict policy configuration.
///
/// Read by the engine; created and updated by tenant administrators through
/// surfaces outside this workspace. Unique per `(tenant_id, domain)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantConflictPolicy {
    /// Tenant the policy applies to.
    pub tenant_id: TenantId,
    /// Domain the policy applies to.
    pub domain: Domain,
    /// Strategy used for conflicts in this domain.
    pub resolution_policy: ResolutionPolicy,
    /// Whether conflicts are resolved without a human.
    pub auto_resolve: bool,
    /// Whether to notify the tenant when a conflict occurs.
    pub notify_on_conflict: bool,
}

impl TenantConflictPolicy {
    /// Creates a policy, enforcing that a manual policy never claims to
    /// auto-resolve.
    pub fn new(
        tenant_id: TenantId,
        domain: Domain,
        resolution_policy: ResolutionPolicy,
        auto_resolve: bool,
    ) -> Result<Self, PolicyError> {
        if resolution_policy == ResolutionPolicy::Manual && auto_resolve {
            return Err(PolicyError::ManualCannotAutoResolve { tenant_id, domain });
        }
        Ok(Self {
            tenant_id,
            domain,
            resolution_policy,
            auto_resolve,
            notify_on_conflict: false,
        })
    }

    /// Enables conflict notification.
    pub fn with_notify(mut self) -> Self {
        self.notify_on_conflict = true;
        self
    }
}

/// Errors for policy construction and persistence.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyError {
    /// `resolution_policy == manual` with `auto_resolve == true`.
    #[error("manual policy for tenant {tenant_id} domain {domain} cannot auto-resolve")]
    ManualCannotAutoResolve {
        /// Tenant of the rejected policy.
        tenant_id: TenantId,
        /// Domain of the rejected policy.
        domain: Domain,
    },
}
