use axum::{
    body::Body,
    extract::Request,
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::error::AppError;

/// Header carrying the API key
pub const API_KEY_HEADER: &str = "X-API-Key";

/// API Key authentication state
#[derive(Clone)]
pub struct ApiKeyAuth {
    api_key: Option<String>,
}

impl ApiKeyAuth {
    pub fn new(api_key: Option<String>) -> Self {
        Self { api_key }
    }

    /// With no key configured every request is allowed
    fn allows(&self, headers: &HeaderMap) -> bool {
        match &self.api_key {
            None => true,
            Some(expected) => headers
                .get(API_KEY_HEADER)
                .and_then(|v| v.to_str().ok())
                .is_some_and(|provided| provided == expected),
        }
    }
}

/// Reject requests without a valid `X-API-Key` when a key is configured
pub async fn auth_middleware(request: Request<Body>, next: Next) -> Response {
    let allowed = request
        .extensions()
        .get::<ApiKeyAuth>()
        .is_none_or(|auth| auth.allows(request.headers()));

    if !allowed {
        return AppError::Unauthorized("Invalid or missing API key".to_string()).into_response();
    }

    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(key: Option<&'static str>) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Some(key) = key {
            headers.insert(API_KEY_HEADER, HeaderValue::from_static(key));
        }
        headers
    }

    #[test]
    fn open_when_no_key_configured() {
        let auth = ApiKeyAuth::new(None);
        assert!(auth.allows(&headers(None)));
    }

    #[test]
    fn requires_matching_key() {
        let auth = ApiKeyAuth::new(Some("secret".into()));
        assert!(auth.allows(&headers(Some("secret"))));
        assert!(!auth.allows(&headers(Some("guess"))));
        assert!(!auth.allows(&headers(None)));
    }
}
