use prometheus::{Counter, Gauge, Histogram, HistogramOpts, Opts, Registry};
use std::sync::Arc;

/// Prometheus metrics for the query shard
#[derive(Clone)]
pub struct ShardMetrics {
    // Counters
    pub queries_total: Counter,
    pub query_errors: Counter,
    pub empty_results: Counter,

    // Gauges
    pub segments_loaded: Gauge,
    pub mapped_bytes: Gauge,

    // Histograms
    pub query_latency: Histogram,

    // Registry
    registry: Arc<Registry>,
}

impl ShardMetrics {
    /// Create a new ShardMetrics instance
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let queries_total = Counter::with_opts(Opts::new(
            "nautex_queries_total",
            "Total number of queries served",
        ))?;
        registry.register(Box::new(queries_total.clone()))?;

        let query_errors = Counter::with_opts(Opts::new(
            "nautex_query_errors_total",
            "Total number of malformed or failed queries",
        ))?;
        registry.register(Box::new(query_errors.clone()))?;

        let empty_results = Counter::with_opts(Opts::new(
            "nautex_empty_results_total",
            "Total number of queries answered with zero results",
        ))?;
        registry.register(Box::new(empty_results.clone()))?;

        let segments_loaded = Gauge::with_opts(Opts::new(
            "nautex_segments_loaded",
            "Number of segments currently mapped",
        ))?;
        registry.register(Box::new(segments_loaded.clone()))?;

        let mapped_bytes = Gauge::with_opts(Opts::new(
            "nautex_mapped_bytes",
            "Total bytes of mapped segment files",
        ))?;
        registry.register(Box::new(mapped_bytes.clone()))?;

        let query_latency = Histogram::with_opts(
            HistogramOpts::new("nautex_query_latency_seconds", "Query latency in seconds")
                .buckets(vec![
                    0.001, 0.005, 0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0,
                ]),
        )?;
        registry.register(Box::new(query_latency.clone()))?;

        Ok(Self {
            queries_total,
            query_errors,
            empty_results,
            segments_loaded,
            mapped_bytes,
            query_latency,
            registry: Arc::new(registry),
        })
    }

    /// Gather all metrics for exposition
    pub fn gather(&self) -> Vec<prometheus::proto::MetricFamily> {
        self.registry.gather()
    }
}

impl Default for ShardMetrics {
    fn default() -> Self {
        Self::new().expect("metric registration cannot collide on a fresh registry")
    }
}
