use axum::body::Body;
use axum::extract::MatchedPath;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;
use metrics::{counter, histogram};
use std::time::Instant;

/// Label the request by its route template, never the raw path. Raw paths
/// embed uuids, which would blow up series cardinality, so anything that
/// missed the router collapses into one bucket.
fn route_label(matched: Option<&MatchedPath>) -> String {
    match matched {
        Some(p) => p.as_str().to_string(),
        None => "unmatched".to_string(),
    }
}

pub async fn metrics_middleware(
    matched_path: Option<MatchedPath>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let started = Instant::now();
    let method = req.method().to_string();
    let route = route_label(matched_path.as_ref());

    let response = next.run(req).await;

    let labels = [
        ("method", method),
        ("route", route),
        ("status", response.status().as_u16().to_string()),
    ];
    counter!("ematch_http_requests_total", &labels).increment(1);
    histogram!("ematch_http_request_duration_seconds", &labels)
        .record(started.elapsed().as_secs_f64());

    response
}

pub fn init_metrics() -> metrics_exporter_prometheus::PrometheusHandle {
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .install_recorder()
        .expect("failed to install Prometheus recorder")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_matched_path_collapses_into_one_label() {
        assert_eq!(route_label(None), "unmatched");
    }
}
