//! Prometheus metrics collection middleware
//!
//! Records `http_requests_total` (counter) and `http_request_duration_seconds`
//! (histogram) for every request, with method/path/status labels.

use axum::{extract::Request, middleware::Next, response::Response};
use std::time::Instant;

/// Collapse the segment after the collection name into `{id}` so
/// per-record requests share one label, whether or not the id is valid.
fn normalize_path(path: &str) -> String {
    path.split('/')
        .enumerate()
        .map(|(i, seg)| if i == 2 && !seg.is_empty() { "{id}" } else { seg })
        .collect::<Vec<_>>()
        .join("/")
}

/// Middleware that records request count and duration metrics.
pub async fn metrics_middleware(request: Request, next: Next) -> Response {
    let method = request.method().to_string();
    let path = normalize_path(request.uri().path());

    let start = Instant::now();
    let response = next.run(request).await;
    let duration = start.elapsed().as_secs_f64();

    let status = response.status().as_u16().to_string();

    metrics::counter!(
        "http_requests_total",
        "method" => method.clone(),
        "path" => path.clone(),
        "status" => status
    )
    .increment(1);

    metrics::histogram!(
        "http_request_duration_seconds",
        "method" => method,
        "path" => path
    )
    .record(duration);

    response
}

#[cfg(test)]
mod tests {
    use super::normalize_path;

    #[test]
    fn collapses_ids() {
        assert_eq!(
            normalize_path("/patients/6f1c3a52-3f7e-4b8e-9a51-3c2d7c0e1f00"),
            "/patients/{id}"
        );
        assert_eq!(normalize_path("/observations/not-a-uuid"), "/observations/{id}");
    }

    #[test]
    fn leaves_collections_alone() {
        assert_eq!(normalize_path("/patients"), "/patients");
        assert_eq!(normalize_path("/health"), "/health");
        assert_eq!(normalize_path("/patients/"), "/patients/");
    }
}
