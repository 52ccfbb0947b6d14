//! Route profile configuration.

use regex::Regex;
use serde::Deserialize;

use crate::constants::DEFAULT_IMAGE_KEY_GROUP;

use super::profile::{inherit_field, Profile};
use super::ConfigError;

/// Route profile as written in the configuration document.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RouteProfile {
    /// Regular expression matched against the request path
    pub pattern: Option<String>,
    /// Named capture group holding the source key
    pub image_key: Option<String>,
    pub source: Option<String>,
    pub processor: Option<String>,
}

impl Profile for RouteProfile {
    fn inherit(&self, default: &Self) -> Self {
        Self {
            pattern: inherit_field(&self.pattern, &default.pattern),
            image_key: inherit_field(&self.image_key, &default.image_key),
            source: inherit_field(&self.source, &default.source),
            processor: inherit_field(&self.processor, &default.processor),
        }
    }
}

/// Fully resolved route binding.
#[derive(Debug, Clone)]
pub struct RouteConfig {
    pub name: String,
    pub pattern: Regex,
    pub image_key: String,
    pub source: String,
    pub processor: String,
}

impl RouteProfile {
    /// Compile the pattern and check the references are present.
    ///
    /// Whether `source` and `processor` name existing profiles is checked by
    /// the caller, which sees all sections.
    pub fn resolve(&self, name: &str) -> Result<RouteConfig, ConfigError> {
        let invalid = |message: String| ConfigError::invalid("route", name, message);

        let pattern = self
            .pattern
            .as_deref()
            .filter(|p| !p.is_empty())
            .ok_or_else(|| invalid("pattern is required".to_string()))?;
        let pattern =
            Regex::new(pattern).map_err(|e| invalid(format!("invalid pattern: {}", e)))?;

        let image_key = self
            .image_key
            .clone()
            .unwrap_or_else(|| DEFAULT_IMAGE_KEY_GROUP.to_string());
        if !pattern.capture_names().flatten().any(|n| n == image_key) {
            return Err(invalid(format!(
                "pattern has no capture group named '{}'",
                image_key
            )));
        }

        let source = self
            .source
            .clone()
            .ok_or_else(|| invalid("source is required".to_string()))?;
        let processor = self
            .processor
            .clone()
            .ok_or_else(|| invalid("processor is required".to_string()))?;

        Ok(RouteConfig {
            name: name.to_string(),
            pattern,
            image_key,
            source,
            processor,
        })
    }
}
