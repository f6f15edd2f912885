//! Service configuration.

use fieldsync_engine::EngineConfig;
use std::time::Duration;

/// Configuration for the sync service.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Engine configuration passed through to the orchestrator.
    pub engine: EngineConfig,
    /// Interval between idempotency expiry sweeps.
    pub sweep_interval: Duration,
    /// Maximum records returned by one delta pull.
    pub max_pull_items: usize,
}

impl ServiceConfig {
    /// Creates the default configuration.
    pub fn new() -> Self {
        Self {
            engine: EngineConfig::default(),
            sweep_interval: Duration::from_secs(3600),
            max_pull_items: 500,
        }
    }

    /// Sets the engine configuration.
    pub fn with_engine(mut self, engine: EngineConfig) -> Self {
        self.engine = engine;
        self
    }

    /// Sets the sweep interval.
    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        self
    }

    /// Sets the delta pull page cap.
    pub fn with_max_pull_items(mut self, max: usize) -> Self {
        self.max_pull_items = max;
        self
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self::new()
    }
}
