// Request pipeline module - per-request context carried through the proxy hooks

use std::collections::HashMap;
use std::time::Instant;
use uuid::Uuid;

/// Request context that holds all information about an HTTP request
/// as it flows from routing through fetch and transform
#[derive(Debug, Clone)]
pub struct RequestContext {
    request_id: String,
    method: String,
    path: String,
    query_params: HashMap<String, String>,
    started_at: Instant,
    route_name: Option<String>,
    source_key: Option<String>,
    status: Option<u16>,
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new("GET".to_string(), "/".to_string())
    }
}

impl RequestContext {
    /// Create a new RequestContext from HTTP request information
    /// Automatically generates a unique request ID (UUID v4)
    pub fn new(method: String, path: String) -> Self {
        Self {
            request_id: Uuid::new_v4().to_string(),
            method,
            path,
            query_params: HashMap::new(),
            started_at: Instant::now(),
            route_name: None,
            source_key: None,
            status: None,
        }
    }

    /// Create a new RequestContext with query parameters
    pub fn with_query_params(
        method: String,
        path: String,
        query_params: HashMap<String, String>,
    ) -> Self {
        Self {
            query_params,
            ..Self::new(method, path)
        }
    }

    /// Get the unique request ID
    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query_params(&self) -> &HashMap<String, String> {
        &self.query_params
    }

    pub fn started_at(&self) -> Instant {
        self.started_at
    }

    /// Record the route that matched this request
    pub fn set_route(&mut self, route_name: &str, source_key: &str) {
        self.route_name = Some(route_name.to_string());
        self.source_key = Some(source_key.to_string());
    }

    pub fn route_name(&self) -> Option<&str> {
        self.route_name.as_deref()
    }

    pub fn source_key(&self) -> Option<&str> {
        self.source_key.as_deref()
    }

    pub fn set_status(&mut self, status: u16) {
        self.status = Some(status);
    }

    /// Status written to the client, once a response has been sent
    pub fn status(&self) -> Option<u16> {
        self.status
    }
}
