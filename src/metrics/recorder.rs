//! Metrics recording implementation using Prometheus.

use prometheus::{
    register_counter_vec_with_registry, register_histogram_with_registry, CounterVec, Encoder,
    Histogram, Opts, Registry, TextEncoder,
};
use std::sync::Arc;

/// Trait for recording navigation metrics.
pub trait MetricsRecorder: Clone + Send + Sync + 'static {
    /// Records the outcome of one navigation attempt.
    fn record_navigation(&self, outcome: &str);

    /// Records a token mint attempt with its result.
    fn record_token_mint(&self, result: &str);

    /// Records how long a navigation waited on the initialization barrier.
    fn record_barrier_wait(&self, duration_secs: f64);
}

/// Prometheus metrics collector.
#[derive(Clone)]
pub struct Metrics {
    registry: Arc<Registry>,
    navigations_total: CounterVec,
    token_mints_total: CounterVec,
    barrier_wait_seconds: Histogram,
}

impl Metrics {
    /// Creates a new metrics instance with its own Prometheus registry.
    pub fn new() -> Self {
        let registry = Arc::new(Registry::new());

        let navigations_total = register_counter_vec_with_registry!(
            Opts::new("navigations_total", "Total navigation attempts by outcome"),
            &["outcome"],
            registry.clone()
        )
        .expect("Failed to register navigations_total");

        let token_mints_total = register_counter_vec_with_registry!(
            Opts::new("token_mints_total", "Total token mint attempts by result"),
            &["result"],
            registry.clone()
        )
        .expect("Failed to register token_mints_total");

        let barrier_wait_seconds = register_histogram_with_registry!(
            "barrier_wait_seconds",
            "Time navigations spent waiting for the first auth state",
            vec![0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 30.0],
            registry.clone()
        )
        .expect("Failed to register barrier_wait_seconds");

        Metrics {
            registry,
            navigations_total,
            token_mints_total,
            barrier_wait_seconds,
        }
    }

    /// Renders all metrics in Prometheus text format.
    pub fn render(&self) -> String {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
            tracing::error!("Failed to encode metrics: {}", e);
            return String::new();
        }
        String::from_utf8_lossy(&buffer).into_owned()
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsRecorder for Metrics {
    fn record_navigation(&self, outcome: &str) {
        self.navigations_total.with_label_values(&[outcome]).inc();
    }

    fn record_token_mint(&self, result: &str) {
        self.token_mints_total.with_label_values(&[result]).inc();
    }

    fn record_barrier_wait(&self, duration_secs: f64) {
        self.barrier_wait_seconds.observe(duration_secs);
    }
}
