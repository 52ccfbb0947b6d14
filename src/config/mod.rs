// Configuration module

use regex::Regex;
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

use crate::constants::DEFAULT_PROFILE_NAME;
use crate::image_processor::ProcessorConfig;

pub mod processor;
pub mod profile;
pub mod route;
pub mod server;
pub mod source;

pub use processor::ProcessorProfile;
pub use profile::{resolve_profiles, NamedProfiles, Profile};
pub use route::{RouteConfig, RouteProfile};
pub use server::ServerConfig;
pub use source::{
    FileSystemSourceConfig, S3SourceConfig, SourceConfig, SourceProfile, SourceType,
};

/// Reasons a configuration document cannot be served from.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("environment variable '{0}' is referenced but not set")]
    MissingEnvVar(String),

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("{section} '{name}': {message}")]
    Invalid {
        section: &'static str,
        name: String,
        message: String,
    },
}

impl ConfigError {
    pub fn invalid(
        section: &'static str,
        name: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        ConfigError::Invalid {
            section,
            name: name.into(),
            message: message.into(),
        }
    }
}

/// The configuration document as written.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub sources: NamedProfiles<SourceProfile>,
    #[serde(default)]
    pub processors: NamedProfiles<ProcessorProfile>,
    #[serde(default)]
    pub routes: NamedProfiles<RouteProfile>,
}

/// Configuration with inheritance applied and every reference checked.
///
/// Built once at startup and read-only afterwards.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub server: ServerConfig,
    pub sources: NamedProfiles<SourceConfig>,
    pub processors: NamedProfiles<ProcessorConfig>,
    /// In matching order; the `default` route template is not included
    pub routes: Vec<RouteConfig>,
}

impl Config {
    pub fn from_yaml_with_env(yaml: &str) -> Result<Self, ConfigError> {
        // Replace ${VAR_NAME} with environment variable values
        let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
            .map_err(|e| ConfigError::invalid("config", "env", e.to_string()))?;

        // First, check that all referenced environment variables exist
        for caps in re.captures_iter(yaml) {
            let var_name = &caps[1];
            if std::env::var(var_name).is_err() {
                return Err(ConfigError::MissingEnvVar(var_name.to_string()));
            }
        }

        let substituted = re.replace_all(yaml, |caps: &regex::Captures| {
            std::env::var(&caps[1]).unwrap_or_default()
        });

        Ok(serde_yaml::from_str(&substituted)?)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml_with_env(&yaml)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.resolve().map(|_| ())
    }

    /// Apply `default` inheritance to every section and validate the result.
    pub fn resolve(&self) -> Result<ResolvedConfig, ConfigError> {
        if self.server.max_concurrent_requests == 0 {
            return Err(ConfigError::invalid(
                "server",
                "server",
                "max_concurrent_requests must be > 0",
            ));
        }

        let mut sources = NamedProfiles::new();
        for (name, profile) in resolve_profiles(&self.sources).iter() {
            // A typeless `default` source only carries shared fields.
            if name == DEFAULT_PROFILE_NAME && profile.source_type.is_none() {
                continue;
            }
            sources.insert(name, profile.resolve(name)?);
        }

        let mut processors = NamedProfiles::new();
        for (name, profile) in resolve_profiles(&self.processors).iter() {
            processors.insert(name, profile.resolve(name)?);
        }

        let mut routes = Vec::new();
        for (name, profile) in resolve_profiles(&self.routes).iter() {
            if name == DEFAULT_PROFILE_NAME {
                continue;
            }
            let route = profile.resolve(name)?;
            if !sources.contains(&route.source) {
                return Err(ConfigError::invalid(
                    "route",
                    name,
                    format!("references undefined source '{}'", route.source),
                ));
            }
            if !processors.contains(&route.processor) {
                return Err(ConfigError::invalid(
                    "route",
                    name,
                    format!("references undefined processor '{}'", route.processor),
                ));
            }
            routes.push(route);
        }

        Ok(ResolvedConfig {
            server: self.server.clone(),
            sources,
            processors,
            routes,
        })
    }
}
