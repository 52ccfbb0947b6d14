use crate::constants::DEFAULT_COMPRESSION_QUALITY;

use super::dimensions::{ImageDimensions, ScalePolicy};

/// Resolved processor profile, immutable once loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessorConfig {
    pub name: String,

    /// JPEG quality applied when a JPEG is rescaled (1-100)
    pub image_compression_quality: u8,

    pub maintain_aspect_ratio: bool,

    /// Used when a request names neither width nor height (0 = current size)
    pub default_image_width: u32,
    pub default_image_height: u32,

    /// Upper bounds for the output size (0 = unbounded)
    pub max_image_width: u32,
    pub max_image_height: u32,

    /// Scales the requested blur fraction down to a radius
    pub max_blur_radius_percentage: f64,

    pub grayscale_by_default: bool,

    /// Overrides both the request and `grayscale_by_default`
    pub grayscale_disabled: bool,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            image_compression_quality: DEFAULT_COMPRESSION_QUALITY,
            maintain_aspect_ratio: false,
            default_image_width: 0,
            default_image_height: 0,
            max_image_width: 0,
            max_image_height: 0,
            max_blur_radius_percentage: 0.0,
            grayscale_by_default: false,
            grayscale_disabled: false,
        }
    }
}

impl ProcessorConfig {
    pub fn default_dimensions(&self) -> ImageDimensions {
        ImageDimensions::new(self.default_image_width, self.default_image_height)
    }

    pub fn maxima(&self) -> ImageDimensions {
        ImageDimensions::new(self.max_image_width, self.max_image_height)
    }

    pub fn scale_policy(&self) -> ScalePolicy {
        ScalePolicy {
            maintain_aspect_ratio: self.maintain_aspect_ratio,
            maxima: self.maxima(),
            defaults: self.default_dimensions(),
        }
    }

    /// Whether a request asking for `requested` ends up grayscale.
    pub fn applies_grayscale(&self, requested: bool) -> bool {
        !self.grayscale_disabled && (self.grayscale_by_default || requested)
    }
}
