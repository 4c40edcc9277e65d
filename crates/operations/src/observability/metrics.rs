//! Prometheus-compatible metrics collection.

use prometheus_client::encoding::text::encode;
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::histogram::{exponential_buckets, Histogram};
use prometheus_client::registry::Registry;

/// Metrics for the shutdown path.
///
/// All fields are cheap to clone; clones share the same underlying series,
/// so a copy can be handed to the orchestrator and another to the request
/// gate.
#[derive(Clone)]
pub struct ShutdownMetrics {
    /// Requests refused with 503 after the reject gate closed.
    pub requests_rejected: Counter,
    /// Wall time of the drain stage in seconds.
    pub drain_duration_seconds: Histogram,
    /// Wall time of the callback stage in seconds.
    pub callback_duration_seconds: Histogram,
    /// Listeners or callbacks abandoned at a stage deadline.
    pub units_abandoned: Counter,
}

impl Default for ShutdownMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl ShutdownMetrics {
    /// Create a new set of shutdown metrics.
    pub fn new() -> Self {
        // Buckets for stage durations: 1ms to ~30s
        let duration_buckets: Vec<f64> = exponential_buckets(0.001, 2.0, 16).collect();

        Self {
            requests_rejected: Counter::default(),
            drain_duration_seconds: Histogram::new(duration_buckets.iter().copied()),
            callback_duration_seconds: Histogram::new(duration_buckets.into_iter()),
            units_abandoned: Counter::default(),
        }
    }

    /// Record the drain stage outcome.
    pub fn record_drain(&self, duration_secs: f64, abandoned: u64) {
        self.drain_duration_seconds.observe(duration_secs);
        self.units_abandoned.inc_by(abandoned);
    }

    /// Record the callback stage outcome.
    pub fn record_callbacks(&self, duration_secs: f64, abandoned: u64) {
        self.callback_duration_seconds.observe(duration_secs);
        self.units_abandoned.inc_by(abandoned);
    }
}

/// Central metrics registry for the daemon.
pub struct MetricsRegistry {
    registry: Registry,
    /// Shutdown-path metrics.
    pub shutdown: ShutdownMetrics,
}

impl Default for MetricsRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsRegistry {
    /// Create a new metrics registry with all metrics registered.
    pub fn new() -> Self {
        let mut registry = Registry::default();
        let shutdown = ShutdownMetrics::new();

        registry.register(
            "quiesce_requests_rejected",
            "Requests refused with 503 after the reject gate closed",
            shutdown.requests_rejected.clone(),
        );

        registry.register(
            "quiesce_drain_duration_seconds",
            "Wall time of the drain stage in seconds",
            shutdown.drain_duration_seconds.clone(),
        );

        registry.register(
            "quiesce_callback_duration_seconds",
            "Wall time of the callback stage in seconds",
            shutdown.callback_duration_seconds.clone(),
        );

        registry.register(
            "quiesce_units_abandoned",
            "Listeners or callbacks abandoned at a stage deadline",
            shutdown.units_abandoned.clone(),
        );

        Self { registry, shutdown }
    }

    /// Encode all metrics in Prometheus text format.
    pub fn encode_prometheus(&self) -> String {
        let mut buffer = String::new();
        if encode(&mut buffer, &self.registry).is_err() {
            return String::from("# Error encoding metrics\n");
        }
        buffer
    }

    /// Get a reference to the underlying registry for custom metric registration.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Get a mutable reference to the underlying registry.
    pub fn registry_mut(&mut self) -> &mut Registry {
        &mut self.registry
    }
}
