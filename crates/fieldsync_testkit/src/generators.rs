//! Property-based test generators using proptest.
//!
//! Provides strategies for generating random sync data that maintains
//! required invariants (valid versions, non-empty payloads).

use chrono::{DateTime, Duration, Utc};
use fieldsync_protocol::{Domain, Payload, ResolutionPolicy, SyncEntry, SyncRequest};
use proptest::prelude::*;
use serde_json::json;
use uuid::Uuid;

/// Strategy for generating a domain.
pub fn domain_strategy() -> impl Strategy<Value = Domain> {
    prop::sample::select(Domain::ALL.to_vec())
}

/// Strategy for generating an auto-resolving policy.
pub fn auto_policy_strategy() -> impl Strategy<Value = ResolutionPolicy> {
    prop::sample::select(vec![
        ResolutionPolicy::ClientWins,
        ResolutionPolicy::ServerWins,
        ResolutionPolicy::MostRecentWins,
        ResolutionPolicy::PreserveEscalation,
    ])
}

/// Strategy for generating a client timestamp within a day of now.
pub fn timestamp_strategy() -> impl Strategy<Value = DateTime<Utc>> {
    (-86_400i64..86_400).prop_map(|offset| Utc::now() + Duration::seconds(offset))
}

/// Strategy for generating a payload that passes entry validation.
pub fn payload_strategy() -> impl Strategy<Value = Payload> {
    (
        prop::string::string_regex("[a-z ]{3,40}").expect("valid regex"),
        prop::collection::btree_map(
            prop::string::string_regex("[a-z_]{1,12}").expect("valid regex"),
            any::<i64>(),
            0..4,
        ),
    )
        .prop_map(|(description, extras)| {
            let mut map = Payload::new();
            map.insert("description".into(), json!(description));
            for (key, value) in extras {
                if key != "description" {
                    map.insert(key, json!(value));
                }
            }
            map
        })
}

/// Strategy for generating a valid entry at version 1.
pub fn entry_strategy() -> impl Strategy<Value = SyncEntry> {
    (payload_strategy(), timestamp_strategy()).prop_map(|(fields, ts)| {
        let mut entry = SyncEntry::new(Uuid::new_v4(), 1, ts);
        entry.fields = fields;
        entry
    })
}

/// Strategy for generating a batch of up to `max` valid entries.
pub fn request_strategy(max: usize) -> impl Strategy<Value = SyncRequest> {
    prop::collection::vec(entry_strategy(), 0..=max)
        .prop_map(|entries| SyncRequest::new(entries, "prop-device"))
}
