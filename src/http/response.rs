//! HTTP Response Building
//!
//! Functions for building broker HTTP responses with status, rate-limit and
//! CORS headers.

use crate::{error::BrokerError, rate_limit::RateLimitDecision};
use serde::Serialize;
use tracing::debug;
use warp::http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use warp::reply::{self, Reply};

/// Builder for HTTP responses
#[derive(Debug)]
pub struct ResponseBuilder {
    headers: HeaderMap,
}

impl ResponseBuilder {
    pub fn new() -> Self {
        Self {
            headers: HeaderMap::new(),
        }
    }

    /// Add custom header
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        if let Ok(header_name) = HeaderName::from_bytes(name.as_bytes()) {
            if let Ok(header_value) = HeaderValue::from_str(value) {
                self.headers.insert(header_name, header_value);
            }
        }
        self
    }

    /// Attach `x-ratelimit-*` headers describing `decision`
    pub fn with_rate_limit(self, decision: &RateLimitDecision) -> Self {
        let mut builder = self
            .with_header("x-ratelimit-limit", &decision.limit.to_string())
            .with_header("x-ratelimit-remaining", &decision.remaining.to_string())
            .with_header("x-ratelimit-reset", &decision.reset_in.to_string());
        if !decision.allowed {
            builder = builder.with_header("retry-after", &decision.reset_in.max(1).to_string());
        }
        builder
    }

    /// Serialize `body` as JSON with `status`
    pub fn build_json<T: Serialize>(self, status: StatusCode, body: &T) -> reply::Response {
        let mut response = reply::with_status(reply::json(body), status).into_response();

        let headers = response.headers_mut();
        for (key, value) in self.headers {
            if let Some(key) = key {
                headers.insert(key, value);
            }
        }

        debug!(status = status.as_u16(), "Built response");
        apply_cors_headers(response)
    }

    pub fn build_ok<T: Serialize>(self, body: &T) -> reply::Response {
        self.build_json(StatusCode::OK, body)
    }

    /// Build an error response with the status the error maps to
    pub fn build_error(self, error: &BrokerError) -> reply::Response {
        let status = StatusCode::from_u16(error.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        self.build_json(status, &error.to_json())
    }
}

impl Default for ResponseBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Apply CORS headers to a response
pub fn apply_cors_headers(mut response: reply::Response) -> reply::Response {
    let headers = response.headers_mut();

    headers.insert("Access-Control-Allow-Origin", HeaderValue::from_static("*"));
    headers.insert(
        "Access-Control-Allow-Methods",
        HeaderValue::from_static("GET, POST, OPTIONS"),
    );
    headers.insert(
        "Access-Control-Allow-Headers",
        HeaderValue::from_static("Content-Type, Authorization, X-Api-Key"),
    );

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_response_builder_basic() {
        let response = ResponseBuilder::new().build_ok(&json!({"result": "ok"}));

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get("Content-Type").is_some());
        assert_eq!(response.headers().get("Access-Control-Allow-Origin").unwrap(), "*");
    }

    #[test]
    fn test_response_builder_rate_limit_headers() {
        let decision = RateLimitDecision {
            allowed: false,
            remaining: 0,
            limit: 100,
            reset_in: 7,
        };
        let response = ResponseBuilder::new()
            .with_rate_limit(&decision)
            .build_ok(&json!({}));

        assert_eq!(response.headers().get("x-ratelimit-limit").unwrap(), "100");
        assert_eq!(response.headers().get("x-ratelimit-remaining").unwrap(), "0");
        assert_eq!(response.headers().get("retry-after").unwrap(), "7");
    }

    #[test]
    fn test_response_builder_error_status() {
        let error = BrokerError::ToolNotFound {
            category: "github".to_string(),
            tool: "github_nope".to_string(),
        };
        let response = ResponseBuilder::new().build_error(&error);
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let error = BrokerError::ExecutorMissing("github".to_string());
        let response = ResponseBuilder::new().build_error(&error);
        assert_eq!(response.status(), StatusCode::NOT_IMPLEMENTED);
    }
}
