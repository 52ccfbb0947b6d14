//! Server configuration types.
//!
//! Listen address, worker threads, connection timeouts and the concurrency
//! limit. Default values are sourced from `crate::constants`.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::constants::{
    DEFAULT_ADDRESS, DEFAULT_MAX_CONCURRENT_REQUESTS, DEFAULT_PORT, DEFAULT_READ_TIMEOUT_SECS,
    DEFAULT_THREADS, DEFAULT_WRITE_TIMEOUT_SECS,
};

fn default_address() -> String {
    DEFAULT_ADDRESS.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

// Default worker thread count
fn default_threads() -> usize {
    DEFAULT_THREADS
}

fn default_read_timeout() -> u64 {
    DEFAULT_READ_TIMEOUT_SECS
}

fn default_write_timeout() -> u64 {
    DEFAULT_WRITE_TIMEOUT_SECS
}

fn default_max_concurrent_requests() -> usize {
    DEFAULT_MAX_CONCURRENT_REQUESTS
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_address")]
    pub address: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Number of worker threads (default: 4)
    #[serde(default = "default_threads")]
    pub threads: usize,
    /// Seconds allowed for reading the request
    #[serde(default = "default_read_timeout")]
    pub read_timeout: u64,
    /// Seconds allowed for producing and writing the response
    #[serde(default = "default_write_timeout")]
    pub write_timeout: u64,
    #[serde(default = "default_max_concurrent_requests")]
    pub max_concurrent_requests: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: default_address(),
            port: default_port(),
            threads: default_threads(),
            read_timeout: default_read_timeout(),
            write_timeout: default_write_timeout(),
            max_concurrent_requests: default_max_concurrent_requests(),
        }
    }
}

impl ServerConfig {
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.address, self.port)
    }

    /// Deadline for one request, fetch and transform included.
    pub fn request_deadline(&self) -> Duration {
        Duration::from_secs(self.read_timeout.saturating_add(self.write_timeout))
    }
}
