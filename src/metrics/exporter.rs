//! Prometheus metrics exporter
//!
//! HTTP endpoint for Prometheus scraping.

use anyhow::Result;
use metrics::{counter, describe_counter, describe_gauge, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;

use super::counters::{MetricsSnapshot, METRICS};
use crate::config::MetricsConfig;

/// Initialize the Prometheus metrics exporter
pub fn init_metrics(config: &MetricsConfig) -> Result<()> {
    // Register metric descriptions
    describe_counter!("reqpool_contexts_created", "Buffer contexts created");
    describe_counter!("reqpool_leases_taken", "Leases recorded by buffer contexts");
    describe_counter!("reqpool_leases_returned", "Leases given back to their pools");
    describe_counter!("reqpool_leases_transferred", "Leases moved between buffer contexts");
    describe_counter!("reqpool_leases_abandoned", "Leases dropped without being given back");
    describe_gauge!("reqpool_leases_outstanding", "Leases currently held by requests");
    describe_counter!("reqpool_slab_fresh", "Byte buffers allocated on a slab miss");
    describe_counter!("reqpool_slab_reused", "Byte buffers served from a slab free-list");
    describe_counter!("reqpool_slab_returned", "Byte buffers parked back in a slab");
    describe_counter!("reqpool_slab_discarded", "Byte buffers freed instead of pooled");

    // Build and install the Prometheus exporter
    PrometheusBuilder::new()
        .with_http_listener(config.bind_addr)
        .install()?;

    // Start background task to sync atomic counters to metrics crate
    tokio::spawn(sync_metrics_task());

    Ok(())
}

/// Background task that periodically syncs our atomic counters to the metrics crate
async fn sync_metrics_task() {
    let mut interval = tokio::time::interval(std::time::Duration::from_secs(1));

    let mut last_snapshot = MetricsSnapshot::default();

    loop {
        interval.tick().await;

        let snapshot = METRICS.snapshot();

        let deltas = [
            ("reqpool_contexts_created", snapshot.contexts_created, last_snapshot.contexts_created),
            ("reqpool_leases_taken", snapshot.leases_taken, last_snapshot.leases_taken),
            ("reqpool_leases_returned", snapshot.leases_returned, last_snapshot.leases_returned),
            ("reqpool_leases_transferred", snapshot.leases_transferred, last_snapshot.leases_transferred),
            ("reqpool_leases_abandoned", snapshot.leases_abandoned, last_snapshot.leases_abandoned),
            ("reqpool_slab_fresh", snapshot.slab_fresh, last_snapshot.slab_fresh),
            ("reqpool_slab_reused", snapshot.slab_reused, last_snapshot.slab_reused),
            ("reqpool_slab_returned", snapshot.slab_returned, last_snapshot.slab_returned),
            ("reqpool_slab_discarded", snapshot.slab_discarded, last_snapshot.slab_discarded),
        ];

        // Update counters with deltas
        for (name, now, before) in deltas {
            let delta = now.saturating_sub(before);
            if delta > 0 {
                counter!(name).increment(delta);
            }
        }

        gauge!("reqpool_leases_outstanding").set(snapshot.leases_outstanding() as f64);

        last_snapshot = snapshot;
    }
}
