use once_cell::sync::Lazy;
use prometheus::{
    register_int_counter_vec, register_int_gauge_vec, IntCounterVec, IntGaugeVec, TextEncoder,
};

// Metrics registry
static RATE_LIMIT_DECISIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "rate_limit_decisions_total",
        "Total number of rate limit admission checks",
        &["limiter", "decision"]
    )
    .unwrap()
});

static RATE_LIMIT_EXCEEDED_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "rate_limit_exceeded_total",
        "Total number of requests rejected with 429",
        &["limiter"]
    )
    .unwrap()
});

static RATE_LIMIT_VISITORS: Lazy<IntGaugeVec> = Lazy::new(|| {
    register_int_gauge_vec!(
        "rate_limit_visitors",
        "Number of client identities tracked by a rate limiter",
        &["limiter"]
    )
    .unwrap()
});

static CACHE_LOOKUPS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "cache_lookups_total",
        "Response cache lookups by resource and outcome",
        &["resource", "outcome"]
    )
    .unwrap()
});

pub struct MetricsRecorder;

impl MetricsRecorder {
    pub fn record_rate_limit_decision(limiter: &str, allowed: bool) {
        let decision = if allowed { "allowed" } else { "denied" };
        RATE_LIMIT_DECISIONS_TOTAL
            .with_label_values(&[limiter, decision])
            .inc();
    }

    pub fn record_rate_limit_exceeded(limiter: &str) {
        RATE_LIMIT_EXCEEDED_TOTAL.with_label_values(&[limiter]).inc();
    }

    pub fn set_rate_limit_visitors(limiter: &str, count: usize) {
        RATE_LIMIT_VISITORS
            .with_label_values(&[limiter])
            .set(i64::try_from(count).unwrap_or(i64::MAX));
    }

    /// `outcome` is one of `hit`, `miss` or `error`
    pub fn record_cache_lookup(resource: &str, outcome: &str) {
        CACHE_LOOKUPS_TOTAL
            .with_label_values(&[resource, outcome])
            .inc();
    }

    /// Export all metrics in Prometheus format
    pub fn export() -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let metric_families = prometheus::gather();
        encoder.encode_to_string(&metric_families)
    }
}
