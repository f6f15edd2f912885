//! Policy-driven conflict resolution.
//!
//! Resolution is a pure decision function: given the server record, the
//! client entry and the effective policy, it produces the winning field
//! set (or defers to a human). It performs no I/O and holds no state, so
//! identical inputs always produce identical outcomes.

use fieldsync_protocol::{
    Domain, Payload, ResolutionPolicy, ResolutionResult, ServerRecord, SyncEntry,
    TenantConflictPolicy, TenantId, Winner,
};
use serde_json::json;
use std::fmt;

/// Fields on which the server's state always wins under
/// `preserve_escalation`, regardless of which side is more recent.
pub const ESCALATION_FIELDS: [&str; 4] =
    ["escalation_level", "escalated_at", "escalated_by", "status"];

/// A version conflict awaiting a decision.
///
/// Transient: built per conflicting entry, dropped after resolution.
#[derive(Debug, Clone)]
pub struct ConflictCandidate {
    /// Domain of the entity.
    pub domain: Domain,
    /// Tenant the conflict belongs to.
    pub tenant_id: TenantId,
    /// Snapshot of the server record at detection time.
    pub server: ServerRecord,
    /// The client's conflicting edit.
    pub client: SyncEntry,
}

/// The strategy that settled a conflict, annotated with the winning side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StrategyUsed {
    /// Policy that was applied.
    pub policy: ResolutionPolicy,
    /// Side whose values won.
    pub winner: Winner,
}

impl fmt::Display for StrategyUsed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Only most_recent_wins is ambiguous about its winner.
        if self.policy == ResolutionPolicy::MostRecentWins {
            write!(f, "{} ({})", self.policy, self.winner)
        } else {
            write!(f, "{}", self.policy)
        }
    }
}

/// Outcome of a resolution attempt.
#[derive(Debug, Clone)]
pub struct ResolutionOutcome {
    /// `Resolved` or `ManualRequired`; never `Failed` from the pure engine.
    pub resolution: ResolutionResult,
    /// Field values to apply, absent for manual outcomes.
    pub winning_fields: Option<Payload>,
    /// Strategy annotation for the audit trail and the response.
    pub strategy: StrategyUsed,
    /// Structured description of what was kept and discarded.
    pub merge_details: serde_json::Value,
}

/// Resolves the effective policy for a conflict.
///
/// Three tiers: tenant override, then the per-domain default table, then
/// `manual`. An override that disables `auto_resolve` forces the manual
/// path whatever strategy it names.
pub fn effective_policy(
    tenant_override: Option<&TenantConflictPolicy>,
    domain: Domain,
) -> ResolutionPolicy {
    match tenant_override {
        Some(p) if !p.auto_resolve => ResolutionPolicy::Manual,
        Some(p) => p.resolution_policy,
        None => ResolutionPolicy::default_for(domain),
    }
}

/// Resolves a conflict under the given policy.
pub fn resolve(candidate: &ConflictCandidate, policy: ResolutionPolicy) -> ResolutionOutcome {
    match policy {
        ResolutionPolicy::ClientWins => client_wins(candidate),
        ResolutionPolicy::ServerWins => server_wins(candidate),
        ResolutionPolicy::MostRecentWins => most_recent_wins(candidate),
        ResolutionPolicy::PreserveEscalation => preserve_escalation(candidate),
        ResolutionPolicy::Manual => manual(candidate),
    }
}

fn client_wins(candidate: &ConflictCandidate) -> ResolutionOutcome {
    ResolutionOutcome {
        resolution: ResolutionResult::Resolved,
        winning_fields: Some(candidate.client.fields.clone()),
        strategy: StrategyUsed {
            policy: ResolutionPolicy::ClientWins,
            winner: Winner::Client,
        },
        merge_details: json!({
            "discarded_server_version": candidate.server.version,
            "reason": "policy keeps the client's edits",
        }),
    }
}

fn server_wins(candidate: &ConflictCandidate) -> ResolutionOutcome {
    ResolutionOutcome {
        resolution: ResolutionResult::Resolved,
        winning_fields: Some(candidate.server.fields.clone()),
        strategy: StrategyUsed {
            policy: ResolutionPolicy::ServerWins,
            winner: Winner::Server,
        },
        merge_details: json!({
            "rejected_client_version": candidate.client.version,
            "reason": "policy keeps the server's state",
        }),
    }
}

fn most_recent_wins(candidate: &ConflictCandidate) -> ResolutionOutcome {
    let client_ts = candidate.client.client_timestamp;
    let server_ts = candidate.server.updated_at;

    // Strictly greater: ties go to the server.
    let client_more_recent = client_ts > server_ts;

    let (winner, fields) = if client_more_recent {
        (Winner::Client, candidate.client.fields.clone())
    } else {
        (Winner::Server, candidate.server.fields.clone())
    };

    ResolutionOutcome {
        resolution: ResolutionResult::Resolved,
        winning_fields: Some(fields),
        strategy: StrategyUsed {
            policy: ResolutionPolicy::MostRecentWins,
            winner,
        },
        merge_details: json!({
            "client_timestamp": client_ts.to_rfc3339(),
            "server_timestamp": server_ts.to_rfc3339(),
        }),
    }
}

fn preserve_escalation(candidate: &ConflictCandidate) -> ResolutionOutcome {
    // Client's free-form edits are the base; the server's escalation
    // state overrides field by field when present.
    let mut fields = candidate.client.fields.clone();
    let mut preserved = Vec::new();

    for name in ESCALATION_FIELDS {
        if let Some(value) = candidate.server.fields.get(name) {
            fields.insert(name.to_string(), value.clone());
            preserved.push(name);
        }
    }

    ResolutionOutcome {
        resolution: ResolutionResult::Resolved,
        winning_fields: Some(fields),
        strategy: StrategyUsed {
            policy: ResolutionPolicy::PreserveEscalation,
            winner: Winner::Merged,
        },
        merge_details: json!({
            "base": "client",
            "preserved_from_server": preserved,
        }),
    }
}

fn manual(candidate: &ConflictCandidate) -> ResolutionOutcome {
    ResolutionOutcome {
        resolution: ResolutionResult::ManualRequired,
        winning_fields: None,
        strategy: StrategyUsed {
            policy: ResolutionPolicy::Manual,
            winner: Winner::None,
        },
        merge_details: json!({
            "server_version": candidate.server.version,
            "client_version": candidate.client.version,
        }),
    }
}
