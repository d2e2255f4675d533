use prometheus::{
    HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::info;

// Declare the static OnceCell to hold the Metrics.
static METRICS_INSTANCE: OnceCell<Arc<Metrics>> = OnceCell::const_new();

/// Asynchronously initializes and gets a reference to the static `Metrics`.
pub async fn get_metrics() -> &'static Arc<Metrics> {
    METRICS_INSTANCE
        .get_or_init(|| async {
            info!("Initializing Metrics ...");
            Metrics::new()
        })
        .await
}

#[derive(Clone)]
pub struct Metrics {
    pub registry: Registry,

    // Vendor call metrics
    pub vendor_requests: IntCounterVec,
    pub vendor_failures: IntCounterVec,
    pub vendor_request_duration: HistogramVec,

    // Credential lifecycle metrics
    pub token_refreshes: IntCounter,
    pub token_refresh_failures: IntCounter,
    pub token_expiry_unix: IntGauge,

    // Fan-out metrics
    pub fanout_lock_failures: IntCounter,

    // Runtime
    pub up: IntGauge,
}

impl Metrics {
    fn new() -> Arc<Self> {
        let registry = Registry::new_custom(Some("lockbridge".into()), None).unwrap();

        let metrics: Arc<Metrics> = Arc::new(Self {
            vendor_requests: IntCounterVec::new(Opts::new("vendor_requests_total", "Total vendor API calls by endpoint"), &["endpoint", "verb"]).unwrap(),
            vendor_failures: IntCounterVec::new(Opts::new("vendor_failures_total", "Vendor call failures by error kind"), &["endpoint", "kind"]).unwrap(),
            vendor_request_duration: HistogramVec::new(HistogramOpts::new("vendor_request_duration_seconds", "Vendor call duration seconds").buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]), &["endpoint"]).unwrap(),

            token_refreshes: IntCounter::new("token_refreshes_total", "Refresh attempts against the vendor token endpoint").unwrap(),
            token_refresh_failures: IntCounter::new("token_refresh_failures_total", "Failed refresh attempts").unwrap(),
            token_expiry_unix: IntGauge::new("token_expiry_unix_seconds", "Margin-adjusted expiry of the live token").unwrap(),

            fanout_lock_failures: IntCounter::new("fanout_lock_failures_total", "Per-lock failures tolerated during fan-out").unwrap(),

            up: IntGauge::new("up", "1 if service is healthy").unwrap(),

            registry,
        });

        // Register all metrics in the registry
        let reg = &metrics.registry;
        reg.register(Box::new(metrics.vendor_requests.clone())).unwrap();
        reg.register(Box::new(metrics.vendor_failures.clone())).unwrap();
        reg.register(Box::new(metrics.vendor_request_duration.clone())).unwrap();
        reg.register(Box::new(metrics.token_refreshes.clone())).unwrap();
        reg.register(Box::new(metrics.token_refresh_failures.clone())).unwrap();
        reg.register(Box::new(metrics.token_expiry_unix.clone())).unwrap();
        reg.register(Box::new(metrics.fanout_lock_failures.clone())).unwrap();
        reg.register(Box::new(metrics.up.clone())).unwrap();

        metrics
    }
}
