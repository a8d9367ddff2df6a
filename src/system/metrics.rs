//! Prometheus exposition for the vector index
//!
//! The index block is rebuilt for every scrape from the monitor and a fresh
//! client reading, so it never carries stale values between scrapes. Families
//! are encoded one at a time to keep a fixed order in the output.

use prometheus::core::Collector;
use prometheus::{
    Counter, Encoder, Gauge, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts,
    Registry, TextEncoder,
};
use std::time::Duration;

use crate::client::{HealthState, StatsSnapshot};
use crate::core::Result;
use crate::health::MonitorSnapshot;

/// Content type of the text exposition format
pub const CONTENT_TYPE: &str = prometheus::TEXT_FORMAT;

const HEALTH_STATUS: &str = "vector_db_health_status";
const HEALTH_STATUS_HELP: &str =
    "Vector index health (1=healthy, 0.5=degraded, 0=unhealthy, -1=unknown or error)";

/// Gauge value exported for a health state
pub fn health_gauge_value(state: HealthState) -> f64 {
    match state {
        HealthState::Healthy => 1.0,
        HealthState::Degraded => 0.5,
        HealthState::Unhealthy => 0.0,
        HealthState::Unknown => -1.0,
    }
}

/// Per-scrape index metrics
struct IndexMetrics {
    health_status: Gauge,
    total_vectors: Gauge,
    index_fullness: Gauge,
    checks_total: IntCounter,
    errors_total: IntCounter,
    uptime_seconds: Counter,
}

impl IndexMetrics {
    fn new() -> Result<Self> {
        Ok(Self {
            health_status: Gauge::with_opts(Opts::new(HEALTH_STATUS, HEALTH_STATUS_HELP))?,
            total_vectors: Gauge::with_opts(Opts::new(
                "vector_db_total_vectors",
                "Total number of vectors stored in the index",
            ))?,
            index_fullness: Gauge::with_opts(Opts::new(
                "vector_db_index_fullness",
                "Ratio of used to total index capacity (0.0 to 1.0)",
            ))?,
            checks_total: IntCounter::with_opts(Opts::new(
                "vector_db_health_checks_total",
                "Total number of health checks performed",
            ))?,
            errors_total: IntCounter::with_opts(Opts::new(
                "vector_db_health_check_errors_total",
                "Total number of health checks that found the index unhealthy",
            ))?,
            uptime_seconds: Counter::with_opts(Opts::new(
                "vector_db_uptime_seconds",
                "Seconds since the health monitor started",
            ))?,
        })
    }

    fn encode(&self) -> Result<String> {
        let families = [
            self.health_status.collect(),
            self.total_vectors.collect(),
            self.index_fullness.collect(),
            self.checks_total.collect(),
            self.errors_total.collect(),
            self.uptime_seconds.collect(),
        ];

        let encoder = TextEncoder::new();
        let mut output = String::new();
        for family in families {
            output.push_str(&encoder.encode_to_string(&family)?);
        }
        Ok(output)
    }
}

/// Render the index block: health, vectors, fullness, checks, errors, uptime
pub fn render_index_metrics(
    state: HealthState,
    stats: &StatsSnapshot,
    monitor: &MonitorSnapshot,
) -> Result<String> {
    let metrics = IndexMetrics::new()?;
    metrics.health_status.set(health_gauge_value(state));
    metrics.total_vectors.set(stats.total_vector_count as f64);
    metrics.index_fullness.set(stats.index_fullness);
    metrics.checks_total.inc_by(monitor.total_checks);
    metrics.errors_total.inc_by(monitor.error_count);
    metrics.uptime_seconds.inc_by(monitor.uptime.as_secs_f64());
    metrics.encode()
}

/// Document served when the index cannot be read: a single `-1` health sample
pub fn sentinel_document() -> String {
    format!(
        "# HELP {name} {help}\n# TYPE {name} gauge\n{name} -1\n",
        name = HEALTH_STATUS,
        help = HEALTH_STATUS_HELP,
    )
}

/// Request counters and latency histograms for the service's own endpoints
pub struct EndpointMetrics {
    registry: Registry,
    requests_total: IntCounterVec,
    request_duration: HistogramVec,
}

impl EndpointMetrics {
    /// Create endpoint metrics in a private registry
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let requests_total = IntCounterVec::new(
            Opts::new("vector_health_requests_total", "Requests served per endpoint and outcome"),
            &["endpoint", "outcome"],
        )?;
        let request_duration = HistogramVec::new(
            HistogramOpts::new(
                "vector_health_request_duration_seconds",
                "Request handling time per endpoint in seconds",
            )
            .buckets(vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0]),
            &["endpoint"],
        )?;

        registry.register(Box::new(requests_total.clone()))?;
        registry.register(Box::new(request_duration.clone()))?;

        Ok(Self {
            registry,
            requests_total,
            request_duration,
        })
    }

    /// Record one handled request
    pub fn observe(&self, endpoint: &str, outcome: &str, elapsed: Duration) {
        self.requests_total.with_label_values(&[endpoint, outcome]).inc();
        self.request_duration
            .with_label_values(&[endpoint])
            .observe(elapsed.as_secs_f64());
    }

    /// Requests recorded for an endpoint and outcome
    pub fn requests(&self, endpoint: &str, outcome: &str) -> u64 {
        self.requests_total.with_label_values(&[endpoint, outcome]).get()
    }

    /// Encode the registry in text exposition format
    pub fn render(&self) -> Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| crate::core::Error::internal(e.to_string()))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::Utc;
    use std::collections::BTreeMap;

    fn stats() -> StatsSnapshot {
        StatsSnapshot {
            total_vector_count: 9_235,
            dimension: 384,
            index_fullness: 0.25,
            namespaces: BTreeMap::new(),
            fetched_at: Utc::now(),
        }
    }

    fn monitor() -> MonitorSnapshot {
        MonitorSnapshot {
            start_time: Utc::now(),
            last_check_time: None,
            cached_status: HealthState::Healthy,
            total_checks: 10,
            error_count: 3,
            uptime: Duration::from_secs(120),
        }
    }

    /// Every line is a comment or `name[{labels}] value` with a numeric value
    pub(crate) fn assert_valid_exposition(text: &str) {
        assert!(!text.trim().is_empty(), "empty exposition document");
        for line in text.lines().filter(|l| !l.is_empty()) {
            if line.starts_with("# HELP ") || line.starts_with("# TYPE ") {
                continue;
            }
            let (name, value) = line.rsplit_once(' ').expect("sample line without value");
            assert!(!name.is_empty(), "sample without name: {line}");
            assert!(
                value.parse::<f64>().is_ok() || value == "+Inf" || value == "NaN",
                "non-numeric sample value: {line}"
            );
        }
    }

    fn sample_names(text: &str) -> Vec<&str> {
        text.lines()
            .filter(|l| !l.starts_with('#') && !l.is_empty())
            .map(|l| l.split(' ').next().unwrap_or_default())
            .collect()
    }

    #[test]
    fn test_gauge_encoding() {
        assert_eq!(health_gauge_value(HealthState::Healthy), 1.0);
        assert_eq!(health_gauge_value(HealthState::Degraded), 0.5);
        assert_eq!(health_gauge_value(HealthState::Unhealthy), 0.0);
        assert_eq!(health_gauge_value(HealthState::Unknown), -1.0);
    }

    #[test]
    fn test_index_metrics_order_and_values() {
        let text = render_index_metrics(HealthState::Degraded, &stats(), &monitor()).unwrap();
        assert_valid_exposition(&text);

        assert_eq!(
            sample_names(&text),
            vec![
                "vector_db_health_status",
                "vector_db_total_vectors",
                "vector_db_index_fullness",
                "vector_db_health_checks_total",
                "vector_db_health_check_errors_total",
                "vector_db_uptime_seconds",
            ]
        );
        assert!(text.contains("vector_db_health_status 0.5\n"));
        assert!(text.contains("vector_db_total_vectors 9235\n"));
        assert!(text.contains("vector_db_index_fullness 0.25\n"));
        assert!(text.contains("vector_db_health_checks_total 10\n"));
        assert!(text.contains("vector_db_health_check_errors_total 3\n"));
        assert!(text.contains("# TYPE vector_db_health_checks_total counter"));
        assert!(text.contains("# TYPE vector_db_health_status gauge"));
    }

    #[test]
    fn test_sentinel_document() {
        let text = sentinel_document();
        assert_valid_exposition(&text);
        assert_eq!(sample_names(&text), vec!["vector_db_health_status"]);
        assert!(text.ends_with("vector_db_health_status -1\n"));
    }

    #[test]
    fn test_endpoint_metrics() {
        let metrics = EndpointMetrics::new().unwrap();
        metrics.observe("health", "ok", Duration::from_millis(3));
        metrics.observe("health", "ok", Duration::from_millis(4));
        metrics.observe("stats", "error", Duration::from_millis(40));

        assert_eq!(metrics.requests("health", "ok"), 2);
        assert_eq!(metrics.requests("stats", "error"), 1);

        let text = metrics.render().unwrap();
        assert_valid_exposition(&text);
        assert!(text.contains("vector_health_requests_total{endpoint=\"health\",outcome=\"ok\"} 2"));
    }
}
