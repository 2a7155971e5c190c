//! Atomic counters for hot-path metrics
//!
//! Lock-free counters that can be safely updated from any thread.

use std::sync::atomic::{AtomicU64, Ordering};

/// Global metrics instance
pub static METRICS: Metrics = Metrics::new();

/// Atomic metrics counters
pub struct Metrics {
    // Context metrics
    pub contexts_created: AtomicU64,
    pub leases_taken: AtomicU64,
    pub leases_returned: AtomicU64,
    pub leases_transferred: AtomicU64,
    pub leases_abandoned: AtomicU64,

    // Slab metrics
    pub slab_fresh: AtomicU64,
    pub slab_reused: AtomicU64,
    pub slab_returned: AtomicU64,
    pub slab_discarded: AtomicU64,
}

impl Metrics {
    pub const fn new() -> Self {
        Self {
            contexts_created: AtomicU64::new(0),
            leases_taken: AtomicU64::new(0),
            leases_returned: AtomicU64::new(0),
            leases_transferred: AtomicU64::new(0),
            leases_abandoned: AtomicU64::new(0),
            slab_fresh: AtomicU64::new(0),
            slab_reused: AtomicU64::new(0),
            slab_returned: AtomicU64::new(0),
            slab_discarded: AtomicU64::new(0),
        }
    }

    // Context tracking
    #[inline]
    pub fn context_created(&self) {
        self.contexts_created.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn lease_taken(&self) {
        self.leases_taken.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn leases_returned(&self, count: u64) {
        self.leases_returned.fetch_add(count, Ordering::Relaxed);
    }

    #[inline]
    pub fn leases_transferred(&self, count: u64) {
        self.leases_transferred.fetch_add(count, Ordering::Relaxed);
    }

    /// Leases freed with their context instead of being given back
    #[inline]
    pub fn leases_abandoned(&self, count: u64) {
        self.leases_abandoned.fetch_add(count, Ordering::Relaxed);
    }

    // Slab tracking
    #[inline]
    pub fn slab_fresh(&self) {
        self.slab_fresh.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn slab_reused(&self) {
        self.slab_reused.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn slab_returned(&self) {
        self.slab_returned.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn slab_discarded(&self) {
        self.slab_discarded.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            contexts_created: self.contexts_created.load(Ordering::Relaxed),
            leases_taken: self.leases_taken.load(Ordering::Relaxed),
            leases_returned: self.leases_returned.load(Ordering::Relaxed),
            leases_transferred: self.leases_transferred.load(Ordering::Relaxed),
            leases_abandoned: self.leases_abandoned.load(Ordering::Relaxed),
            slab_fresh: self.slab_fresh.load(Ordering::Relaxed),
            slab_reused: self.slab_reused.load(Ordering::Relaxed),
            slab_returned: self.slab_returned.load(Ordering::Relaxed),
            slab_discarded: self.slab_discarded.load(Ordering::Relaxed),
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of metrics for reporting
#[derive(Debug, Clone, Default)]
pub struct MetricsSnapshot {
    pub contexts_created: u64,
    pub leases_taken: u64,
    pub leases_returned: u64,
    pub leases_transferred: u64,
    pub leases_abandoned: u64,
    pub slab_fresh: u64,
    pub slab_reused: u64,
    pub slab_returned: u64,
    pub slab_discarded: u64,
}

impl MetricsSnapshot {
    /// Leases taken but not yet returned or abandoned
    pub fn leases_outstanding(&self) -> u64 {
        self.leases_taken
            .saturating_sub(self.leases_returned)
            .saturating_sub(self.leases_abandoned)
    }
}
