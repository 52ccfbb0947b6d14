//! Source profile configuration.
//!
//! A source is either an S3 bucket or a local directory. Raw profiles keep
//! every field optional so they can inherit from `default`; resolution turns
//! them into a [`SourceConfig`] for the chosen backend.

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::constants::{DEFAULT_S3_REGION, DEFAULT_SOURCE_TIMEOUT_SECS};

use super::profile::{inherit_field, Profile};
use super::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    S3,
    Filesystem,
}

/// Source profile as written in the configuration document.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SourceProfile {
    #[serde(rename = "type")]
    pub source_type: Option<SourceType>,
    pub s3_bucket_name: Option<String>,
    pub s3_region: Option<String>,
    /// Custom endpoint for S3-compatible stores (MinIO, LocalStack)
    pub s3_endpoint: Option<String>,
    pub s3_access_key: Option<String>,
    pub s3_secret_key: Option<String>,
    pub directory: Option<String>,
    pub allow_subdirectories: Option<bool>,
    /// Fetch timeout in seconds
    pub timeout: Option<u64>,
}

impl Profile for SourceProfile {
    fn inherit(&self, default: &Self) -> Self {
        Self {
            source_type: inherit_field(&self.source_type, &default.source_type),
            s3_bucket_name: inherit_field(&self.s3_bucket_name, &default.s3_bucket_name),
            s3_region: inherit_field(&self.s3_region, &default.s3_region),
            s3_endpoint: inherit_field(&self.s3_endpoint, &default.s3_endpoint),
            s3_access_key: inherit_field(&self.s3_access_key, &default.s3_access_key),
            s3_secret_key: inherit_field(&self.s3_secret_key, &default.s3_secret_key),
            directory: inherit_field(&self.directory, &default.directory),
            allow_subdirectories: inherit_field(
                &self.allow_subdirectories,
                &default.allow_subdirectories,
            ),
            timeout: inherit_field(&self.timeout, &default.timeout),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct S3SourceConfig {
    pub name: String,
    pub bucket: String,
    pub region: String,
    pub endpoint: Option<String>,
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
    pub timeout: Duration,
}

impl S3SourceConfig {
    /// Static credentials are used only when both halves are configured.
    pub fn static_credentials(&self) -> Option<(&str, &str)> {
        match (&self.access_key, &self.secret_key) {
            (Some(access), Some(secret)) => Some((access.as_str(), secret.as_str())),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FileSystemSourceConfig {
    pub name: String,
    pub directory: PathBuf,
    pub allow_subdirectories: bool,
    pub timeout: Duration,
}

/// Fully resolved source profile.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceConfig {
    S3(S3SourceConfig),
    FileSystem(FileSystemSourceConfig),
}

impl SourceConfig {
    pub fn name(&self) -> &str {
        match self {
            SourceConfig::S3(c) => &c.name,
            SourceConfig::FileSystem(c) => &c.name,
        }
    }

    pub fn timeout(&self) -> Duration {
        match self {
            SourceConfig::S3(c) => c.timeout,
            SourceConfig::FileSystem(c) => c.timeout,
        }
    }
}

impl SourceProfile {
    /// Turn an inherited profile into a backend configuration.
    pub fn resolve(&self, name: &str) -> Result<SourceConfig, ConfigError> {
        let invalid = |message: &str| ConfigError::invalid("source", name, message);

        let timeout = match self.timeout {
            Some(0) => return Err(invalid("timeout must be > 0 seconds")),
            Some(secs) => Duration::from_secs(secs),
            None => Duration::from_secs(DEFAULT_SOURCE_TIMEOUT_SECS),
        };

        match self.source_type {
            Some(SourceType::S3) => {
                let bucket = non_empty(&self.s3_bucket_name)
                    .ok_or_else(|| invalid("s3_bucket_name is required for type 's3'"))?;
                if self.s3_access_key.is_some() != self.s3_secret_key.is_some() {
                    return Err(invalid(
                        "s3_access_key and s3_secret_key must be set together",
                    ));
                }
                if let Some(endpoint) = non_empty(&self.s3_endpoint) {
                    if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
                        return Err(invalid("s3_endpoint must start with http:// or https://"));
                    }
                }

                Ok(SourceConfig::S3(S3SourceConfig {
                    name: name.to_string(),
                    bucket: bucket.to_string(),
                    region: non_empty(&self.s3_region)
                        .unwrap_or(DEFAULT_S3_REGION)
                        .to_string(),
                    endpoint: non_empty(&self.s3_endpoint).map(str::to_string),
                    access_key: self.s3_access_key.clone(),
                    secret_key: self.s3_secret_key.clone(),
                    timeout,
                }))
            }
            Some(SourceType::Filesystem) => {
                let directory = non_empty(&self.directory)
                    .ok_or_else(|| invalid("directory is required for type 'filesystem'"))?;

                Ok(SourceConfig::FileSystem(FileSystemSourceConfig {
                    name: name.to_string(),
                    directory: PathBuf::from(directory),
                    allow_subdirectories: self.allow_subdirectories.unwrap_or(false),
                    timeout,
                }))
            }
            None => Err(invalid("type is required (s3 or filesystem)")),
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}
