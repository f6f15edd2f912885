//! Metrics seam for batch processing.
//!
//! The orchestrator emits events to a sink; what happens to them
//! (aggregation, health scoring, alerting) is an external concern.
//! Emission is fire-and-forget and never affects entry classification.

use fieldsync_protocol::{Domain, ResolutionPolicy, ResolutionResult};
use parking_lot::RwLock;
use std::time::Duration;

/// Counters for one processed batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchMetrics {
    /// Records created.
    pub created: usize,
    /// Records updated.
    pub updated: usize,
    /// Conflicts encountered.
    pub conflicts: usize,
    /// Entries rejected.
    pub errors: usize,
}

/// Sink for sync pipeline events.
pub trait MetricsSink: Send + Sync {
    /// A batch finished processing.
    fn batch_completed(&self, domain: Domain, metrics: BatchMetrics, duration: Duration);

    /// A conflict went through resolution.
    fn conflict_recorded(&self, domain: Domain, policy: ResolutionPolicy, result: ResolutionResult);
}

/// Sink that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopMetrics;

impl MetricsSink for NoopMetrics {
    fn batch_completed(&self, _domain: Domain, _metrics: BatchMetrics, _duration: Duration) {}

    fn conflict_recorded(
        &self,
        _domain: Domain,
        _policy: ResolutionPolicy,
        _result: ResolutionResult,
    ) {
    }
}

/// Sink that accumulates totals, for tests and smoke checks.
#[derive(Debug, Default)]
pub struct CountingMetrics {
    totals: RwLock<BatchMetrics>,
    batches: RwLock<u64>,
}

impl CountingMetrics {
    /// Creates an empty counter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Accumulated per-entry totals.
    pub fn totals(&self) -> BatchMetrics {
        *self.totals.read()
    }

    /// Number of batches observed.
    pub fn batches(&self) -> u64 {
        *self.batches.read()
    }
}

impl MetricsSink for CountingMetrics {
    fn batch_completed(&self, _domain: Domain, metrics: BatchMetrics, _duration: Duration) {
        let mut totals = self.totals.write();
        totals.created += metrics.created;
        totals.updated += metrics.updated;
        totals.conflicts += metrics.conflicts;
        totals.errors += metrics.errors;
        *self.batches.write() += 1;
    }

    fn conflict_recorded(
        &self,
        _domain: Domain,
        _policy: ResolutionPolicy,
        _result: ResolutionResult,
    ) {
    }
}
