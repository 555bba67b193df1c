//! Metrics and reporting for gateway operations.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Gateway operation metrics (thread-safe counters).
#[derive(Debug, Clone, Default)]
pub struct GatewayMetrics {
    /// Packets deferred behind finality (record created)
    pub packets_deferred: Arc<AtomicU64>,
    /// Packets bypassed (non-rollapp target or already finalized)
    pub packets_bypassed: Arc<AtomicU64>,
    /// Packets rejected by the wrapped handler during try-execution
    pub packets_rejected: Arc<AtomicU64>,
    /// Records transitioned to finalized
    pub packets_finalized: Arc<AtomicU64>,
    /// Records transitioned to reverted
    pub packets_reverted: Arc<AtomicU64>,
    /// Records deleted by the pruner
    pub packets_pruned: Arc<AtomicU64>,
    /// Order-handler failures (record persisted, order not created)
    pub order_failures: Arc<AtomicU64>,
    /// Finalize-hook failures (record left pending for retry)
    pub finalize_failures: Arc<AtomicU64>,
}

impl GatewayMetrics {
    /// Create zeroed metrics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a deferred packet.
    pub fn record_deferred(&self) {
        self.packets_deferred.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a fast-path bypass.
    pub fn record_bypassed(&self) {
        self.packets_bypassed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a try-execution rejection.
    pub fn record_rejected(&self) {
        self.packets_rejected.fetch_add(1, Ordering::Relaxed);
    }

    /// Record finalized transitions.
    pub fn record_finalized(&self, count: u64) {
        self.packets_finalized.fetch_add(count, Ordering::Relaxed);
    }

    /// Record reverted transitions.
    pub fn record_reverted(&self, count: u64) {
        self.packets_reverted.fetch_add(count, Ordering::Relaxed);
    }

    /// Record pruned records.
    pub fn record_pruned(&self, count: u64) {
        self.packets_pruned.fetch_add(count, Ordering::Relaxed);
    }

    /// Record an order-handler failure.
    pub fn record_order_failure(&self) {
        self.order_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a finalize-hook failure.
    pub fn record_finalize_failure(&self) {
        self.finalize_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Get a snapshot of current metrics.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            packets_deferred: self.packets_deferred.load(Ordering::Relaxed),
            packets_bypassed: self.packets_bypassed.load(Ordering::Relaxed),
            packets_rejected: self.packets_rejected.load(Ordering::Relaxed),
            packets_finalized: self.packets_finalized.load(Ordering::Relaxed),
            packets_reverted: self.packets_reverted.load(Ordering::Relaxed),
            packets_pruned: self.packets_pruned.load(Ordering::Relaxed),
            order_failures: self.order_failures.load(Ordering::Relaxed),
            finalize_failures: self.finalize_failures.load(Ordering::Relaxed),
        }
    }

    /// Reset all counters.
    pub fn reset(&self) {
        self.packets_deferred.store(0, Ordering::Relaxed);
        self.packets_bypassed.store(0, Ordering::Relaxed);
        self.packets_rejected.store(0, Ordering::Relaxed);
        self.packets_finalized.store(0, Ordering::Relaxed);
        self.packets_reverted.store(0, Ordering::Relaxed);
        self.packets_pruned.store(0, Ordering::Relaxed);
        self.order_failures.store(0, Ordering::Relaxed);
        self.finalize_failures.store(0, Ordering::Relaxed);
    }
}

/// Snapshot of metrics (for reporting).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub packets_deferred: u64,
    pub packets_bypassed: u64,
    pub packets_rejected: u64,
    pub packets_finalized: u64,
    pub packets_reverted: u64,
    pub packets_pruned: u64,
    pub order_failures: u64,
    pub finalize_failures: u64,
}

impl MetricsSnapshot {
    /// Total packets intercepted (deferred + bypassed + rejected).
    pub fn total_intercepted(&self) -> u64 {
        self.packets_deferred + self.packets_bypassed + self.packets_rejected
    }

    /// Share of intercepted packets that were deferred behind finality.
    pub fn deferral_rate(&self) -> f64 {
        let total = self.total_intercepted();
        if total == 0 {
            return 0.0;
        }
        self.packets_deferred as f64 / total as f64
    }

    /// Format a human-readable report.
    pub fn format_report(&self) -> String {
        let mut lines = Vec::new();
        lines.push("Gateway Metrics Report".to_string());
        lines.push("=".repeat(50));
        lines.push("Interception:".to_string());
        lines.push(format!("  Deferred:        {}", self.packets_deferred));
        lines.push(format!("  Bypassed:        {}", self.packets_bypassed));
        lines.push(format!("  Rejected:        {}", self.packets_rejected));
        lines.push(format!(
            "  Deferral Rate:   {:.1}%",
            self.deferral_rate() * 100.0
        ));
        lines.push(String::new());
        lines.push("Lifecycle:".to_string());
        lines.push(format!("  Finalized:       {}", self.packets_finalized));
        lines.push(format!("  Reverted:        {}", self.packets_reverted));
        lines.push(format!("  Pruned:          {}", self.packets_pruned));
        lines.push(String::new());
        lines.push("Failures:".to_string());
        lines.push(format!("  Order Creation:  {}", self.order_failures));
        lines.push(format!("  Finalize Hook:   {}", self.finalize_failures));
        lines.join("\n")
    }
}
