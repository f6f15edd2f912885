//! Configuration for the sync engine.

use std::time::Duration;

/// Configuration for batch processing.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Maximum entries per batch. A protection limit, not a domain rule.
    pub max_batch_size: usize,
    /// Overall deadline for one batch call. Entries not reached before the
    /// deadline are omitted from the response and resent by the client.
    pub batch_deadline: Duration,
    /// Minimum length of a `description` field, when one is present.
    pub min_description_chars: usize,
}

impl EngineConfig {
    /// Creates the default configuration.
    pub fn new() -> Self {
        Self {
            max_batch_size: 1000,
            batch_deadline: Duration::from_secs(30),
            min_description_chars: 3,
        }
    }

    /// Sets the maximum batch size.
    pub fn with_max_batch_size(mut self, size: usize) -> Self {
        self.max_batch_size = size;
        self
    }

    /// Sets the batch deadline.
    pub fn with_batch_deadline(mut self, deadline: Duration) -> Self {
        self.batch_deadline = deadline;
        self
    }

    /// Sets the minimum description length.
    pub fn with_min_description_chars(mut self, chars: usize) -> Self {
        self.min_description_chars = chars;
        self
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}
