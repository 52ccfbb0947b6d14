// Error types module

use std::time::Duration;
use thiserror::Error;

use crate::config::ConfigError;
use crate::image_processor::{DimensionError, OptionsError, ProcessingError, Stage, TransformError};
use crate::router::NoRouteMatched;
use crate::source::SourceError;

/// Centralized error type for the proxy
///
/// Every request failure lands in one of these categories, which decides the
/// HTTP status code. The message is for logs only; response bodies carry the
/// status reason phrase.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// Request path matches no configured route
    #[error(transparent)]
    NoRouteMatched(#[from] NoRouteMatched),

    /// A request parameter parsed but is out of range
    #[error(transparent)]
    InvalidParameter(#[from] OptionsError),

    /// The source could not produce the original image
    #[error(transparent)]
    SourceFetch(#[from] SourceError),

    /// Source or target geometry leaves nothing sensible to render
    #[error("{stage} stage: {source}")]
    Dimension { stage: Stage, source: DimensionError },

    /// An image library stage failed
    #[error(transparent)]
    Processing(#[from] ProcessingError),

    /// Configuration errors (invalid YAML, missing env vars, dangling references)
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Fetch and transform did not finish within the request deadline
    #[error("request exceeded its {0:?} deadline")]
    Timeout(Duration),

    /// Unexpected failures (worker panic, missing registry entry)
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<TransformError> for ProxyError {
    fn from(err: TransformError) -> Self {
        match err {
            TransformError::Dimension { stage, source } => ProxyError::Dimension { stage, source },
            TransformError::Processing(e) => ProxyError::Processing(e),
        }
    }
}

impl ProxyError {
    pub fn to_http_status(&self) -> u16 {
        match self {
            ProxyError::NoRouteMatched(_) => 404,
            ProxyError::InvalidParameter(_) => 400,
            ProxyError::SourceFetch(e) if e.is_client_error() => 404,
            ProxyError::SourceFetch(_) => 502,
            ProxyError::Dimension { .. } => 502,
            ProxyError::Processing(_) => 502,
            ProxyError::Config(_) => 500,
            ProxyError::Timeout(_) => 504,
            ProxyError::Internal(_) => 500,
        }
    }

    /// Pipeline stage that failed, for transform errors.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            ProxyError::Dimension { stage, .. } => Some(*stage),
            ProxyError::Processing(e) => Some(e.stage),
            _ => None,
        }
    }

    /// Short label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ProxyError::NoRouteMatched(_) => "no_route",
            ProxyError::InvalidParameter(_) => "invalid_parameter",
            ProxyError::SourceFetch(_) => "source",
            ProxyError::Dimension { .. } => "dimension",
            ProxyError::Processing(_) => "processing",
            ProxyError::Config(_) => "config",
            ProxyError::Timeout(_) => "timeout",
            ProxyError::Internal(_) => "internal",
        }
    }

    /// JSON body sent to the client: `{"error": <reason phrase>, "status": <code>}`.
    pub fn response_body(&self) -> String {
        let status = self.to_http_status();
        serde_json::json!({
            "error": reason_phrase(status),
            "status": status,
        })
        .to_string()
    }
}

pub fn reason_phrase(status: u16) -> &'static str {
    match status {
        400 => "Bad Request",
        404 => "Not Found",
        405 => "Method Not Allowed",
        500 => "Internal Server Error",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        504 => "Gateway Timeout",
        _ => "Error",
    }
}
