//! Local filesystem source.

use async_trait::async_trait;
use bytes::Bytes;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use crate::config::FileSystemSourceConfig;
use crate::image_processor::{ImageFormat, RawImage};

use super::{ImageSource, SourceError};

/// Reads images below a base directory.
#[derive(Debug, Clone)]
pub struct FileSystemSource {
    directory: PathBuf,
    allow_subdirectories: bool,
    timeout: Duration,
}

impl FileSystemSource {
    pub fn new(config: &FileSystemSourceConfig) -> Self {
        Self {
            directory: config.directory.clone(),
            allow_subdirectories: config.allow_subdirectories,
            timeout: config.timeout,
        }
    }

    /// Map a request key to a file below the base directory.
    ///
    /// `..`, absolute components and (unless allowed) nested paths are
    /// rejected before touching the filesystem.
    pub fn resolve_path(&self, key: &str) -> Result<PathBuf, SourceError> {
        let relative = Path::new(key.trim_start_matches('/'));

        let mut depth = 0;
        for component in relative.components() {
            match component {
                Component::Normal(_) => depth += 1,
                Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                    return Err(SourceError::Forbidden(key.to_string()));
                }
            }
        }

        if depth == 0 {
            return Err(SourceError::NotFound(key.to_string()));
        }
        if depth > 1 && !self.allow_subdirectories {
            return Err(SourceError::Forbidden(key.to_string()));
        }

        Ok(self.directory.join(relative))
    }
}

#[async_trait]
impl ImageSource for FileSystemSource {
    async fn fetch(&self, key: &str) -> Result<RawImage, SourceError> {
        let path = self.resolve_path(key)?;

        let data = tokio::time::timeout(self.timeout, tokio::fs::read(&path))
            .await
            .map_err(|_| {
                SourceError::Backend(format!("reading '{}' timed out", path.display()))
            })?
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => SourceError::NotFound(key.to_string()),
                ErrorKind::PermissionDenied => SourceError::Forbidden(key.to_string()),
                _ => SourceError::Io {
                    key: key.to_string(),
                    source: e,
                },
            })?;

        tracing::debug!(path = %path.display(), bytes = data.len(), "Read image from filesystem");

        let raw = RawImage::new(Bytes::from(data));
        Ok(match ImageFormat::from_extension(key) {
            Some(format) => raw.with_mime_type_hint(format.mime_type()),
            None => raw,
        })
    }
}
