use axum_prometheus::metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use axum_prometheus::PrometheusMetricLayer;
use std::sync::OnceLock;

static METRIC_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Request-level HTTP metrics; the handle renders the scrape payload for
/// the /metrics route. The global recorder can only be installed once per
/// process, so repeated router construction reuses the same handle.
pub fn setup_metrics() -> (PrometheusMetricLayer<'static>, PrometheusHandle) {
    let handle = METRIC_HANDLE
        .get_or_init(|| {
            PrometheusBuilder::new()
                .install_recorder()
                .expect("failed to install Prometheus recorder")
        })
        .clone();
    (PrometheusMetricLayer::new(), handle)
}
