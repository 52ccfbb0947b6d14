//! S3 source.
//!
//! The client is built synchronously from the resolved profile: static
//! credentials when configured, otherwise the standard `AWS_*` environment
//! variables. A custom endpoint switches to path-style addressing so MinIO
//! and LocalStack work unchanged.

use async_trait::async_trait;
use aws_config::environment::EnvironmentVariableCredentialsProvider;
use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::Client as S3Client;
use std::time::Duration;

use crate::config::S3SourceConfig;
use crate::image_processor::RawImage;

use super::{ImageSource, SourceError};

pub struct S3Source {
    client: S3Client,
    bucket: String,
    timeout: Duration,
}

impl S3Source {
    pub fn new(config: &S3SourceConfig) -> Self {
        let mut builder = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()));

        builder = match config.static_credentials() {
            Some((access_key, secret_key)) => builder.credentials_provider(Credentials::new(
                access_key,
                secret_key,
                None,
                None,
                "kagami-static",
            )),
            None => builder.credentials_provider(EnvironmentVariableCredentialsProvider::new()),
        };

        if let Some(endpoint) = &config.endpoint {
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }

        Self {
            client: S3Client::from_conf(builder.build()),
            bucket: config.bucket.clone(),
            timeout: config.timeout,
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn get_object(&self, key: &str) -> Result<RawImage, SourceError> {
        let output = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|err| {
                if err
                    .as_service_error()
                    .map(|e| e.is_no_such_key())
                    .unwrap_or(false)
                {
                    return SourceError::NotFound(key.to_string());
                }
                match err.raw_response().map(|r| r.status().as_u16()) {
                    Some(404) => SourceError::NotFound(key.to_string()),
                    Some(403) => SourceError::Forbidden(key.to_string()),
                    _ => SourceError::Backend(DisplayErrorContext(&err).to_string()),
                }
            })?;

        let mime_type_hint = output.content_type().map(str::to_string);
        let data = output
            .body
            .collect()
            .await
            .map_err(|e| SourceError::Backend(format!("failed to read S3 body: {}", e)))?
            .into_bytes();

        let raw = RawImage::new(data);
        Ok(match mime_type_hint {
            Some(mime) => raw.with_mime_type_hint(mime),
            None => raw,
        })
    }
}

/// Object key for a request key; S3 keys carry no leading slash.
pub fn object_key(key: &str) -> &str {
    key.trim_start_matches('/')
}

#[async_trait]
impl ImageSource for S3Source {
    async fn fetch(&self, key: &str) -> Result<RawImage, SourceError> {
        let key = object_key(key);
        if key.is_empty() {
            return Err(SourceError::NotFound(key.to_string()));
        }

        let raw = tokio::time::timeout(self.timeout, self.get_object(key))
            .await
            .map_err(|_| {
                SourceError::Backend(format!(
                    "fetching '{}' from bucket '{}' timed out after {:?}",
                    key, self.bucket, self.timeout
                ))
            })??;

        tracing::debug!(
            bucket = %self.bucket,
            key = %key,
            bytes = raw.data.len(),
            "Fetched image from S3"
        );
        Ok(raw)
    }
}
