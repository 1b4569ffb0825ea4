//! Audit logging middleware for mutations

use axum::{body::Body, extract::Request, http::Method, middleware::Next, response::Response};

use super::request_id::RequestId;

/// Middleware to log mutations (POST, PUT, DELETE) on clinical records.
///
/// Logs under the `audit` target after the handler ran, so the outcome
/// status is recorded alongside who-asked-for-what.
pub async fn audit_middleware(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    if !matches!(method, Method::POST | Method::PUT | Method::DELETE) {
        return next.run(request).await;
    }

    let path = request.uri().path().to_string();
    let request_id = request
        .extensions()
        .get::<RequestId>()
        .map(|r| r.0.clone())
        .unwrap_or_else(|| "unknown".to_string());

    let response = next.run(request).await;
    let status = response.status();

    if status.is_success() {
        tracing::info!(
            target: "audit",
            request_id = %request_id,
            method = %method,
            path = %path,
            status = status.as_u16(),
            "Record mutated"
        );
    } else {
        tracing::warn!(
            target: "audit",
            request_id = %request_id,
            method = %method,
            path = %path,
            status = status.as_u16(),
            "Mutation rejected"
        );
    }

    response
}
