//! Processor profile configuration.

use serde::Deserialize;

use crate::constants::DEFAULT_COMPRESSION_QUALITY;
use crate::image_processor::ProcessorConfig;

use super::profile::{inherit_field, Profile};
use super::ConfigError;

/// Processor profile as written in the configuration document.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ProcessorProfile {
    /// 0 selects the encoder default
    pub image_compression_quality: Option<u8>,
    pub maintain_aspect_ratio: Option<bool>,
    pub default_image_width: Option<u32>,
    pub default_image_height: Option<u32>,
    pub max_image_width: Option<u32>,
    pub max_image_height: Option<u32>,
    pub max_blur_radius_percentage: Option<f64>,
    pub grayscale_by_default: Option<bool>,
    pub grayscale_disabled: Option<bool>,
}

impl Profile for ProcessorProfile {
    fn inherit(&self, default: &Self) -> Self {
        Self {
            image_compression_quality: inherit_field(
                &self.image_compression_quality,
                &default.image_compression_quality,
            ),
            maintain_aspect_ratio: inherit_field(
                &self.maintain_aspect_ratio,
                &default.maintain_aspect_ratio,
            ),
            default_image_width: inherit_field(
                &self.default_image_width,
                &default.default_image_width,
            ),
            default_image_height: inherit_field(
                &self.default_image_height,
                &default.default_image_height,
            ),
            max_image_width: inherit_field(&self.max_image_width, &default.max_image_width),
            max_image_height: inherit_field(&self.max_image_height, &default.max_image_height),
            max_blur_radius_percentage: inherit_field(
                &self.max_blur_radius_percentage,
                &default.max_blur_radius_percentage,
            ),
            grayscale_by_default: inherit_field(
                &self.grayscale_by_default,
                &default.grayscale_by_default,
            ),
            grayscale_disabled: inherit_field(
                &self.grayscale_disabled,
                &default.grayscale_disabled,
            ),
        }
    }
}

impl ProcessorProfile {
    pub fn resolve(&self, name: &str) -> Result<ProcessorConfig, ConfigError> {
        let quality = match self.image_compression_quality.unwrap_or(0) {
            0 => DEFAULT_COMPRESSION_QUALITY,
            q if q <= 100 => q,
            q => {
                return Err(ConfigError::invalid(
                    "processor",
                    name,
                    format!("image_compression_quality {} is outside 1-100", q),
                ))
            }
        };

        let blur_percentage = self.max_blur_radius_percentage.unwrap_or(0.0);
        if !blur_percentage.is_finite() || blur_percentage < 0.0 {
            return Err(ConfigError::invalid(
                "processor",
                name,
                "max_blur_radius_percentage must be a non-negative number",
            ));
        }

        Ok(ProcessorConfig {
            name: name.to_string(),
            image_compression_quality: quality,
            maintain_aspect_ratio: self.maintain_aspect_ratio.unwrap_or(false),
            default_image_width: self.default_image_width.unwrap_or(0),
            default_image_height: self.default_image_height.unwrap_or(0),
            max_image_width: self.max_image_width.unwrap_or(0),
            max_image_height: self.max_image_height.unwrap_or(0),
            max_blur_radius_percentage: blur_percentage,
            grayscale_by_default: self.grayscale_by_default.unwrap_or(false),
            grayscale_disabled: self.grayscale_disabled.unwrap_or(false),
        })
    }
}
