//! Client-side sync entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Domain-specific fields of an entry or record.
///
/// The core assumes a structured-object boundary; payloads are JSON maps
/// whose keys are the domain's field names (description, status, ...).
pub type Payload = serde_json::Map<String, serde_json::Value>;

/// One client-side edit submitted in a sync batch.
///
/// Ephemeral: exists only for the duration of one batch call. The
/// `mobile_id` is client-generated and stable across the entity's lifetime;
/// `version` is the client's last known server version, used for optimistic
/// conflict detection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncEntry {
    /// Client-generated stable entity identifier.
    pub mobile_id: Uuid,
    /// Last server version known to the client.
    pub version: u64,
    /// When the client made the edit (client clock).
    pub client_timestamp: DateTime<Utc>,
    /// Domain-specific fields of the edit.
    #[serde(flatten)]
    pub fields: Payload,
}

impl SyncEntry {
    /// Creates a new entry.
    pub fn new(mobile_id: Uuid, version: u64, client_timestamp: DateTime<Utc>) -> Self {
        Self {
            mobile_id,
            version,
            client_timestamp,
            fields: Payload::new(),
        }
    }

    /// Sets a domain field.
    pub fn with_field(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.fields.insert(key.into(), value);
        self
    }

    /// Returns a field value if present.
    pub fn field(&self, key: &str) -> Option<&serde_json::Value> {
        self.fields.get(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn entry_fields() {
        let entry = SyncEntry::new(Uuid::new_v4(), 1, Utc::now())
            .with_field("description", json!("replace pump seal"))
            .with_field("status", json!("open"));

        assert_eq!(entry.field("description"), Some(&json!("replace pump seal")));
        assert!(entry.field("missing").is_none());
    }

    #[test]
    fn entry_serde_flattens_fields() {
        let id = Uuid::new_v4();
        let entry = SyncEntry::new(id, 2, Utc::now()).with_field("status", json!("done"));

        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["mobile_id"], json!(id.to_string()));
        assert_eq!(value["version"], json!(2));
        // Domain fields sit at the top level of the wire object.
        assert_eq!(value["status"], json!("done"));

        let back: SyncEntry = serde_json::from_value(value).unwrap();
        assert_eq!(back, entry);
    }
}
