//! Per-entry field validation.

use crate::config::EngineConfig;
use fieldsync_protocol::SyncEntry;

/// Checks one entry's fields before any store access.
///
/// A failure here rejects this entry only; siblings in the batch are
/// unaffected.
pub(crate) fn validate_entry(entry: &SyncEntry, config: &EngineConfig) -> Result<(), String> {
    if entry.version == 0 {
        return Err("version must be at least 1".into());
    }

    if entry.fields.is_empty() {
        return Err("entry has no domain fields".into());
    }

    if let Some(value) = entry.fields.get("description") {
        match value.as_str() {
            Some(text) if text.chars().count() < config.min_description_chars => {
                return Err(format!(
                    "description too short (minimum {} characters)",
                    config.min_description_chars
                ));
            }
            Some(_) => {}
            None => return Err("description must be a string".into()),
        }
    }

    Ok(())
}
