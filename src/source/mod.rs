//! Image sources
//!
//! A source turns a key extracted from the request path into the original
//! image bytes. Sources are built once at startup from the resolved source
//! profiles and shared by every request.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

use crate::config::{NamedProfiles, SourceConfig};
use crate::image_processor::RawImage;

pub mod filesystem;
pub mod s3;

pub use filesystem::FileSystemSource;
pub use s3::S3Source;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("image '{0}' not found")]
    NotFound(String),

    #[error("access to '{0}' is forbidden")]
    Forbidden(String),

    #[error("failed to read '{key}': {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("source backend error: {0}")]
    Backend(String),
}

impl SourceError {
    /// Missing or unreachable-by-policy images are the client's problem.
    pub fn is_client_error(&self) -> bool {
        matches!(self, SourceError::NotFound(_) | SourceError::Forbidden(_))
    }
}

/// Fetches original image bytes by key.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ImageSource: Send + Sync {
    async fn fetch(&self, key: &str) -> Result<RawImage, SourceError>;
}

/// Named sources, built once at startup.
#[derive(Clone, Default)]
pub struct SourceRegistry {
    sources: HashMap<String, Arc<dyn ImageSource>>,
}

impl SourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a client for every resolved source profile.
    pub fn from_config(sources: &NamedProfiles<SourceConfig>) -> Self {
        let mut registry = Self::new();
        for (name, config) in sources.iter() {
            let source: Arc<dyn ImageSource> = match config {
                SourceConfig::S3(s3) => Arc::new(S3Source::new(s3)),
                SourceConfig::FileSystem(fs) => Arc::new(FileSystemSource::new(fs)),
            };
            tracing::debug!(source = %name, "Image source initialized");
            registry.insert(name, source);
        }
        registry
    }

    pub fn insert(&mut self, name: impl Into<String>, source: Arc<dyn ImageSource>) {
        self.sources.insert(name.into(), source);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn ImageSource>> {
        self.sources.get(name).cloned()
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}
