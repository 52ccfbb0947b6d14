//! Response generators for the proxy.
//!
//! Built-in endpoints:
//! - `/health` - Health check endpoint
//! - `/metrics` - Prometheus metrics export
//!
//! Functions return `EndpointResponse` instead of writing directly to the
//! session, so response generation stays testable. The caller writes the
//! response to the session.

use bytes::Bytes;
use std::time::Instant;

use crate::error::{reason_phrase, ProxyError};
use crate::image_processor::ProcessedImage;
use crate::metrics::Metrics;

/// A complete response, ready to be written.
#[derive(Debug, Clone)]
pub struct EndpointResponse {
    /// HTTP status code
    pub status: u16,
    /// Content-Type header value
    pub content_type: &'static str,
    /// Headers beyond Content-Type, Content-Length and X-Request-Id
    pub headers: Vec<(&'static str, String)>,
    pub body: Bytes,
}

impl EndpointResponse {
    /// Create a JSON response with the given status and body.
    pub fn json(status: u16, body: String) -> Self {
        Self {
            status,
            content_type: "application/json",
            headers: Vec::new(),
            body: Bytes::from(body),
        }
    }

    /// Create a plain text response (for Prometheus metrics).
    pub fn prometheus(body: String) -> Self {
        Self {
            status: 200,
            content_type: "text/plain; version=0.0.4",
            headers: Vec::new(),
            body: Bytes::from(body),
        }
    }

    /// A transformed (or passed through) image.
    pub fn image(image: ProcessedImage) -> Self {
        Self {
            status: 200,
            content_type: image.mime_type,
            headers: Vec::new(),
            body: image.data,
        }
    }

    pub fn with_header(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.headers.push((name, value.into()));
        self
    }
}

/// Generate response for /health endpoint.
///
/// Returns health status with uptime and version information.
pub fn handle_health(start_time: Instant) -> EndpointResponse {
    let body = serde_json::json!({
        "status": "healthy",
        "uptime_seconds": start_time.elapsed().as_secs(),
        "version": env!("CARGO_PKG_VERSION"),
    })
    .to_string();

    EndpointResponse::json(200, body)
}

pub fn handle_metrics(metrics: &Metrics) -> EndpointResponse {
    EndpointResponse::prometheus(metrics.export_prometheus())
}

/// JSON error body for a failed request.
pub fn error_response(err: &ProxyError) -> EndpointResponse {
    EndpointResponse::json(err.to_http_status(), err.response_body())
}

fn status_response(status: u16) -> EndpointResponse {
    let body = serde_json::json!({
        "error": reason_phrase(status),
        "status": status,
    })
    .to_string();
    EndpointResponse::json(status, body)
}

/// Only GET and HEAD are served.
pub fn method_not_allowed() -> EndpointResponse {
    status_response(405).with_header("Allow", "GET, HEAD")
}

/// Concurrency limit reached.
pub fn service_unavailable() -> EndpointResponse {
    status_response(503).with_header("Retry-After", "1")
}
