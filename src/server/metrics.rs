use axum::{http::StatusCode, response::IntoResponse};
use lazy_static::lazy_static;
use prometheus::{
    CounterVec, Encoder, Gauge, Histogram, HistogramOpts, HistogramVec, Opts, Registry,
    TextEncoder,
};
use std::time::Duration;

/// Metric name prefix for all index server metrics
const PREFIX: &str = "signage";

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();

    // HTTP Request Metrics
    pub static ref HTTP_REQUESTS_TOTAL: CounterVec = CounterVec::new(
        Opts::new(format!("{PREFIX}_http_requests_total"), "Total number of HTTP requests"),
        &["method", "path", "status"]
    ).expect("Failed to create http_requests_total metric");

    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            format!("{PREFIX}_http_request_duration_seconds"),
            "HTTP request duration in seconds"
        )
        .buckets(vec![0.001, 0.01, 0.05, 0.1, 0.5, 1.0, 2.0, 5.0, 10.0]),
        &["method", "path"]
    ).expect("Failed to create http_request_duration_seconds metric");

    // Delivery Metrics
    pub static ref DOCUMENT_RESPONSES_TOTAL: CounterVec = CounterVec::new(
        Opts::new(
            format!("{PREFIX}_document_responses_total"),
            "Index and task schedule responses by document and status"
        ),
        &["document", "status"]
    ).expect("Failed to create document_responses_total metric");

    // Compiler Metrics
    pub static ref COMPILE_DURATION_SECONDS: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            format!("{PREFIX}_compile_duration_seconds"),
            "Index compilation duration in seconds"
        )
        .buckets(vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 15.0])
    ).expect("Failed to create compile_duration_seconds metric");

    pub static ref SUBTREE_FAILURES_TOTAL: CounterVec = CounterVec::new(
        Opts::new(
            format!("{PREFIX}_subtree_failures_total"),
            "Playlist subtrees replaced by empty content"
        ),
        &["kind"]
    ).expect("Failed to create subtree_failures_total metric");

    pub static ref EXTERNAL_FETCHES_TOTAL: CounterVec = CounterVec::new(
        Opts::new(
            format!("{PREFIX}_external_fetches_total"),
            "External playlist fetches by outcome"
        ),
        &["outcome"]
    ).expect("Failed to create external_fetches_total metric");

    // Process Metrics
    pub static ref PROCESS_MEMORY_BYTES: Gauge = Gauge::new(
        format!("{PREFIX}_process_memory_bytes"),
        "Process memory usage in bytes"
    ).expect("Failed to create process_memory_bytes metric");
}

/// Initialize all metrics and register them with the Prometheus registry
pub fn init_metrics() {
    // Ignore errors if already registered (tests call this repeatedly)
    let _ = REGISTRY.register(Box::new(HTTP_REQUESTS_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(HTTP_REQUEST_DURATION_SECONDS.clone()));
    let _ = REGISTRY.register(Box::new(DOCUMENT_RESPONSES_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(COMPILE_DURATION_SECONDS.clone()));
    let _ = REGISTRY.register(Box::new(SUBTREE_FAILURES_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(EXTERNAL_FETCHES_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(PROCESS_MEMORY_BYTES.clone()));

    tracing::info!("Metrics system initialized successfully");
}

/// Record an HTTP request
pub fn record_http_request(method: &str, path: &str, status: u16, duration: Duration) {
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[method, path, &status.to_string()])
        .inc();

    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[method, path])
        .observe(duration.as_secs_f64());
}

/// Collapses device keys out of request paths so label cardinality stays bounded.
pub fn categorize_endpoint(path: &str) -> &'static str {
    if path.starts_with("/index/") {
        "/index"
    } else if path.starts_with("/task-schedule/") {
        "/task-schedule"
    } else if path == "/" {
        "/"
    } else {
        "other"
    }
}

pub fn record_document_response(document: &str, status: u16) {
    DOCUMENT_RESPONSES_TOTAL
        .with_label_values(&[document, &status.to_string()])
        .inc();
}

pub fn record_compile_duration(duration: Duration) {
    COMPILE_DURATION_SECONDS.observe(duration.as_secs_f64());
}

pub fn record_subtree_failure(kind: &str) {
    SUBTREE_FAILURES_TOTAL.with_label_values(&[kind]).inc();
}

pub fn record_external_fetch(outcome: &str) {
    EXTERNAL_FETCHES_TOTAL.with_label_values(&[outcome]).inc();
}

/// Update process memory usage
pub fn update_memory_usage() {
    #[cfg(target_os = "linux")]
    {
        if let Ok(status) = std::fs::read_to_string("/proc/self/status") {
            let rss_kb = status
                .lines()
                .find(|line| line.starts_with("VmRSS:"))
                .and_then(|line| line.split_whitespace().nth(1))
                .and_then(|kb| kb.parse::<f64>().ok());
            if let Some(kb) = rss_kb {
                PROCESS_MEMORY_BYTES.set(kb * 1024.0);
            }
        }
    }
}

/// Handler for the /metrics endpoint
pub async fn metrics_handler() -> impl IntoResponse {
    update_memory_usage();

    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();

    let mut buffer = vec![];
    match encoder.encode(&metric_families, &mut buffer) {
        Ok(()) => {
            let response = String::from_utf8(buffer).unwrap_or_default();
            (StatusCode::OK, response)
        }
        Err(e) => {
            tracing::error!("Failed to encode metrics: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to encode metrics: {}", e),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn has_metric(name: &str) -> bool {
        REGISTRY
            .gather()
            .iter()
            .any(|m| m.get_name() == format!("{PREFIX}_{name}"))
    }

    #[test]
    fn test_metrics_initialization() {
        init_metrics();
        assert!(!REGISTRY.gather().is_empty(), "Metrics should be registered");
    }

    #[test]
    fn test_record_http_request() {
        init_metrics();
        record_http_request("GET", "/index", 200, Duration::from_millis(50));
        assert!(has_metric("http_requests_total"));
    }

    #[test]
    fn test_compiler_metrics() {
        init_metrics();
        record_subtree_failure("playlist_not_found");
        record_external_fetch("timeout");
        record_compile_duration(Duration::from_millis(3));
        assert!(has_metric("subtree_failures_total"));
        assert!(has_metric("external_fetches_total"));
        assert!(has_metric("compile_duration_seconds"));
    }

    #[test]
    fn test_categorize_endpoint() {
        assert_eq!(categorize_endpoint("/index/abc"), "/index");
        assert_eq!(categorize_endpoint("/task-schedule/abc"), "/task-schedule");
        assert_eq!(categorize_endpoint("/"), "/");
        assert_eq!(categorize_endpoint("/favicon.ico"), "other");
    }
}
