//! Idempotency cache for retry-safe batch processing.
//!
//! A caller that retries an identical request (network retry, crash and
//! resume) gets the stored response back instead of a second execution.
//! The cache optimizes for avoiding duplicate *effects observed by the
//! caller*, not duplicate computation: two concurrent first-time requests
//! with the same key may both execute, and the losing `store_response`
//! simply does not cache.

use chrono::{DateTime, Duration, Utc};
use fieldsync_store::StoreResult;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use uuid::Uuid;

/// What one idempotency key covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdempotencyScope {
    /// One whole batch request.
    Batch,
    /// One item within a batch.
    Item,
}

/// A cached response keyed by an idempotency key.
#[derive(Debug, Clone, PartialEq)]
pub struct IdempotencyRecord {
    /// Opaque caller-supplied or derived key, unique while unexpired.
    pub key: String,
    /// What the key covers.
    pub scope: IdempotencyScope,
    /// Hash of the canonical request payload.
    pub request_hash: String,
    /// The stored response, returned verbatim on replay.
    pub response: serde_json::Value,
    /// Acting user.
    pub user_id: Uuid,
    /// Originating device.
    pub device_id: Uuid,
    /// Endpoint the request hit, e.g. `sync/task`.
    pub endpoint: String,
    /// Number of replays served (observability only).
    pub hit_count: u64,
    /// Time of the last replay.
    pub last_hit_at: Option<DateTime<Utc>>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Expiry; the record is dead past this instant.
    pub expires_at: DateTime<Utc>,
}

/// A record about to be stored (timestamps assigned by the cache).
#[derive(Debug, Clone)]
pub struct NewIdempotencyRecord {
    /// Idempotency key.
    pub key: String,
    /// What the key covers.
    pub scope: IdempotencyScope,
    /// Hash of the canonical request payload.
    pub request_hash: String,
    /// The response to cache.
    pub response: serde_json::Value,
    /// Acting user.
    pub user_id: Uuid,
    /// Originating device.
    pub device_id: Uuid,
    /// Endpoint the request hit.
    pub endpoint: String,
}

/// At-most-once response cache per key within a TTL window.
pub trait IdempotencyCache: Send + Sync {
    /// Looks up an unexpired record by key.
    ///
    /// On a hit, bumps `hit_count` and `last_hit_at` and returns the whole
    /// stored record; the caller replays `response` unchanged and may
    /// compare `request_hash` to detect a key reused for a different
    /// payload.
    fn check_duplicate(&self, key: &str) -> StoreResult<Option<IdempotencyRecord>>;

    /// Stores a response under a key.
    ///
    /// Returns false if an unexpired record with the key already exists
    /// (a concurrent first-writer won the race); the caller's own computed
    /// result is still valid to return.
    fn store_response(&self, record: NewIdempotencyRecord) -> StoreResult<bool>;

    /// Deletes all expired records, returning how many were removed.
    /// Intended for a periodic sweep, not the hot path.
    fn cleanup_expired(&self) -> StoreResult<usize>;
}

/// In-memory idempotency cache.
pub struct MemoryIdempotencyCache {
    ttl: Duration,
    records: RwLock<HashMap<String, IdempotencyRecord>>,
}

impl MemoryIdempotencyCache {
    /// Default record lifetime: 24 hours.
    pub fn default_ttl() -> Duration {
        Duration::hours(24)
    }

    /// Creates a cache with the default TTL.
    pub fn new() -> Self {
        Self::with_ttl(Self::default_ttl())
    }

    /// Creates a cache with an explicit TTL.
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            ttl,
            records: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the record stored under a key, expired or not.
    pub fn record(&self, key: &str) -> Option<IdempotencyRecord> {
        self.records.read().get(key).cloned()
    }

    /// Number of records including expired ones awaiting the sweep.
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    /// Returns true if the cache holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

impl Default for MemoryIdempotencyCache {
    fn default() -> Self {
        Self::new()
    }
}

impl IdempotencyCache for MemoryIdempotencyCache {
    fn check_duplicate(&self, key: &str) -> StoreResult<Option<IdempotencyRecord>> {
        let now = Utc::now();
        let mut records = self.records.write();

        match records.get_mut(key) {
            Some(record) if record.expires_at > now => {
                record.hit_count += 1;
                record.last_hit_at = Some(now);
                Ok(Some(record.clone()))
            }
            // Expired records are left for the sweep.
            _ => Ok(None),
        }
    }

    fn store_response(&self, record: NewIdempotencyRecord) -> StoreResult<bool> {
        let now = Utc::now();
        let mut records = self.records.write();

        if let Some(existing) = records.get(&record.key) {
            if existing.expires_at > now {
                return Ok(false);
            }
        }

        let stored = IdempotencyRecord {
            key: record.key.clone(),
            scope: record.scope,
            request_hash: record.request_hash,
            response: record.response,
            user_id: record.user_id,
            device_id: record.device_id,
            endpoint: record.endpoint,
            hit_count: 0,
            last_hit_at: None,
            created_at: now,
            expires_at: now + self.ttl,
        };
        records.insert(record.key, stored);
        Ok(true)
    }

    fn cleanup_expired(&self) -> StoreResult<usize> {
        let now = Utc::now();
        let mut records = self.records.write();
        let before = records.len();
        records.retain(|_, r| r.expires_at > now);
        Ok(before - records.len())
    }
}

/// Serializes a JSON value with recursively sorted object keys.
///
/// Two logically identical payloads hash identically regardless of the
/// field order they arrived in.
pub fn canonical_json(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let body: Vec<String> = keys
                .into_iter()
                .map(|k| {
                    format!(
                        "{}:{}",
                        serde_json::Value::String(k.clone()),
                        canonical_json(&map[k])
                    )
                })
                .collect();
            format!("{{{}}}", body.join(","))
        }
        serde_json::Value::Array(items) => {
            let body: Vec<String> = items.iter().map(canonical_json).collect();
            format!("[{}]", body.join(","))
        }
        scalar => scalar.to_string(),
    }
}

/// Derives a deterministic idempotency key from a request.
///
/// `sha256(operation_type + canonical_json(payload) + canonical_json(context))`,
/// hex-encoded (64 characters).
pub fn derive_key(
    operation_type: &str,
    payload: &serde_json::Value,
    context: &serde_json::Value,
) -> String {
    let mut hasher = Sha256::new();
    hasher.update(operation_type.as_bytes());
    hasher.update(canonical_json(payload).as_bytes());
    hasher.update(canonical_json(context).as_bytes());
    let digest = hasher.finalize();
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

/// Hashes a request payload for storage alongside the response.
pub fn request_hash(payload: &serde_json::Value) -> String {
    let mut hasher = Sha256::new();
    hasher.update(canonical_json(payload).as_bytes());
    let digest = hasher.finalize();
    digest.iter().map(|b| format!("{b:02x}")).collect()
}
