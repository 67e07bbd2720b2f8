//! Metrics collection for observability

use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec_with_registry, register_counter_with_registry,
    register_histogram_with_registry, Counter, CounterVec, Histogram, Opts, Registry,
};
use std::sync::Arc;

/// Global metrics registry
pub static METRICS: Lazy<Arc<Metrics>> =
    Lazy::new(|| Arc::new(Metrics::new().expect("Failed to initialize metrics")));

/// Metrics collector
pub struct Metrics {
    registry: Registry,

    // Context build metrics
    pub context_builds: CounterVec,
    pub context_tokens_used: Histogram,
    pub context_build_duration: Histogram,
    pub fragments_scored: Counter,

    // Fusion metrics
    pub fusion_fallbacks: Counter,

    // Compaction metrics
    pub compactions: Counter,
    pub fragments_evicted: Counter,
}

impl Metrics {
    /// Create a new metrics collector
    pub fn new() -> Result<Self, Box<dyn std::error::Error>> {
        let registry = Registry::new();

        let context_builds = register_counter_vec_with_registry!(
            Opts::new("context_builds_total", "Total context build requests"),
            &["status"],
            registry
        )?;

        let context_tokens_used = register_histogram_with_registry!(
            "context_tokens_used",
            "Tokens packed into a built context",
            registry
        )?;

        let context_build_duration = register_histogram_with_registry!(
            "context_build_duration_seconds",
            "Context build duration in seconds",
            registry
        )?;

        let fragments_scored = register_counter_with_registry!(
            Opts::new("fragments_scored_total", "Total fragments scored"),
            registry
        )?;

        let fusion_fallbacks = register_counter_with_registry!(
            Opts::new(
                "fusion_fallbacks_total",
                "Builds degraded to symbolic-only scoring"
            ),
            registry
        )?;

        let compactions = register_counter_with_registry!(
            Opts::new("compactions_total", "Total compaction passes committed"),
            registry
        )?;

        let fragments_evicted = register_counter_with_registry!(
            Opts::new("fragments_evicted_total", "Total fragments evicted by compaction"),
            registry
        )?;

        Ok(Self {
            registry,
            context_builds,
            context_tokens_used,
            context_build_duration,
            fragments_scored,
            fusion_fallbacks,
            compactions,
            fragments_evicted,
        })
    }

    /// Get the metrics registry for exporting
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Record a context build
    pub fn record_context_build(&self, success: bool, tokens_used: usize, scored: usize) {
        let status = if success { "success" } else { "error" };
        self.context_builds.with_label_values(&[status]).inc();
        self.context_tokens_used.observe(tokens_used as f64);
        self.fragments_scored.inc_by(scored as f64);
    }

    /// Record a degradation to symbolic-only scoring
    pub fn record_fusion_fallback(&self) {
        self.fusion_fallbacks.inc();
    }

    /// Record a committed compaction pass
    pub fn record_compaction(&self, evicted: usize) {
        self.compactions.inc();
        self.fragments_evicted.inc_by(evicted as f64);
    }

    /// Export metrics in Prometheus text format
    pub fn export_prometheus(&self) -> String {
        use prometheus::Encoder;

        let encoder = prometheus::TextEncoder::new();
        let metric_families = self.registry.gather();

        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer).unwrap_or_default();

        String::from_utf8(buffer).unwrap_or_default()
    }
}
