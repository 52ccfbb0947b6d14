//! Target-size resolution
//!
//! Turns a partial or full requested size into concrete pixel dimensions:
//!
//! 1. An empty request (`0x0`) falls back to the processor defaults.
//! 2. A full request either stretches (aspect ratio not maintained) or is
//!    reduced to the binding dimension and resolved again.
//! 3. A single dimension derives the other from the current aspect ratio.
//! 4. The result is clamped to the configured maxima, recomputing the other
//!    dimension from the resolved target's own aspect ratio until both maxima
//!    hold.
//! 5. A target that differs from the current size must stay within
//!    [`MAX_OUTPUT_DIMENSION`] and [`MAX_OUTPUT_PIXELS`], whatever the maxima.
//!
//! All derived integers use round-half-up (`floor(x + 0.5)`).

use serde::{Deserialize, Serialize};
use std::fmt;

use super::error::DimensionError;
use crate::constants::{MAX_OUTPUT_DIMENSION, MAX_OUTPUT_PIXELS};

/// Width and height of an image or of a requested size, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ImageDimensions {
    pub width: u32,
    pub height: u32,
}

impl ImageDimensions {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// `width / height`, or `None` when the height is zero.
    pub fn aspect_ratio(&self) -> Option<f64> {
        if self.height == 0 {
            None
        } else {
            Some(self.width as f64 / self.height as f64)
        }
    }

    /// True when neither dimension is set.
    pub fn is_empty(&self) -> bool {
        self.width == 0 && self.height == 0
    }

    /// True when both dimensions are set.
    pub fn is_complete(&self) -> bool {
        self.width > 0 && self.height > 0
    }
}

impl fmt::Display for ImageDimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Processor settings that shape target-size resolution.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScalePolicy {
    pub maintain_aspect_ratio: bool,
    /// Zero in either dimension means "no maximum".
    pub maxima: ImageDimensions,
    /// Used when the request names neither width nor height.
    pub defaults: ImageDimensions,
}

/// Resolve the size the current image should be scaled to.
///
/// A result equal to `current` means no scaling is needed.
///
/// # Errors
///
/// Returns [`DimensionError`] when the current image has a zero dimension,
/// when resolution collapses one side of the target to zero pixels, or when a
/// new target exceeds the output size limit.
pub fn resolve_target_size(
    current: ImageDimensions,
    requested: ImageDimensions,
    policy: &ScalePolicy,
) -> Result<ImageDimensions, DimensionError> {
    if !current.is_complete() {
        return Err(DimensionError::EmptySource {
            width: current.width,
            height: current.height,
        });
    }

    let requested = if requested.is_empty() {
        policy.defaults
    } else {
        requested
    };

    let scaled = scale_to_requested(current, requested, policy.maintain_aspect_ratio)?;
    let clamped = clamp_to_maxima(scaled, policy.maxima)?;
    if !clamped.is_complete() {
        return Err(DimensionError::DegenerateTarget {
            width: clamped.width,
            height: clamped.height,
        });
    }
    if clamped != current && exceeds_output_limit(clamped) {
        return Err(DimensionError::TooLarge {
            width: clamped.width,
            height: clamped.height,
        });
    }
    Ok(clamped)
}

fn exceeds_output_limit(target: ImageDimensions) -> bool {
    target.width > MAX_OUTPUT_DIMENSION
        || target.height > MAX_OUTPUT_DIMENSION
        || target.width as u64 * target.height as u64 > MAX_OUTPUT_PIXELS
}

fn scale_to_requested(
    current: ImageDimensions,
    requested: ImageDimensions,
    maintain_aspect_ratio: bool,
) -> Result<ImageDimensions, DimensionError> {
    let image_ratio = source_ratio(current)?;

    if requested.is_complete() {
        if !maintain_aspect_ratio {
            return Ok(requested);
        }
        let requested_ratio = source_ratio(requested)?;

        return if requested_ratio > image_ratio {
            // Wider than the image: height binds.
            scale_to_requested(
                current,
                ImageDimensions::new(0, requested.height),
                maintain_aspect_ratio,
            )
        } else if requested_ratio < image_ratio {
            scale_to_requested(
                current,
                ImageDimensions::new(requested.width, 0),
                maintain_aspect_ratio,
            )
        } else {
            Ok(requested)
        };
    }

    if requested.width > 0 {
        return Ok(ImageDimensions::new(
            requested.width,
            aspect_scaled_height(image_ratio, requested.width),
        ));
    }

    if requested.height > 0 {
        return Ok(ImageDimensions::new(
            aspect_scaled_width(image_ratio, requested.height),
            requested.height,
        ));
    }

    Ok(current)
}

/// Clamp to the configured maxima, keeping the target's own aspect ratio.
pub fn clamp_to_maxima(
    dimensions: ImageDimensions,
    maxima: ImageDimensions,
) -> Result<ImageDimensions, DimensionError> {
    if maxima.width > 0 && dimensions.width > maxima.width {
        let ratio = target_ratio(dimensions)?;
        let height = aspect_scaled_height(ratio, maxima.width);
        return clamp_to_maxima(
            non_degenerate(ImageDimensions::new(maxima.width, height))?,
            maxima,
        );
    }

    if maxima.height > 0 && dimensions.height > maxima.height {
        let ratio = target_ratio(dimensions)?;
        let width = aspect_scaled_width(ratio, maxima.height);
        return clamp_to_maxima(
            non_degenerate(ImageDimensions::new(width, maxima.height))?,
            maxima,
        );
    }

    Ok(dimensions)
}

/// `round(width / aspect_ratio)`
pub fn aspect_scaled_height(aspect_ratio: f64, width: u32) -> u32 {
    round_half_up(width as f64 / aspect_ratio)
}

/// `round(height * aspect_ratio)`
pub fn aspect_scaled_width(aspect_ratio: f64, height: u32) -> u32 {
    round_half_up(height as f64 * aspect_ratio)
}

/// `floor(x + 0.5)`, saturating at the bounds of `u32`.
pub(crate) fn round_half_up(value: f64) -> u32 {
    (value + 0.5).floor() as u32
}

fn source_ratio(dimensions: ImageDimensions) -> Result<f64, DimensionError> {
    dimensions
        .aspect_ratio()
        .ok_or(DimensionError::EmptySource {
            width: dimensions.width,
            height: dimensions.height,
        })
}

fn target_ratio(dimensions: ImageDimensions) -> Result<f64, DimensionError> {
    dimensions
        .aspect_ratio()
        .ok_or(DimensionError::DegenerateTarget {
            width: dimensions.width,
            height: dimensions.height,
        })
}

fn non_degenerate(dimensions: ImageDimensions) -> Result<ImageDimensions, DimensionError> {
    if dimensions.is_complete() {
        Ok(dimensions)
    } else {
        Err(DimensionError::DegenerateTarget {
            width: dimensions.width,
            height: dimensions.height,
        })
    }
}
