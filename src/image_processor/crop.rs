//! Anchored aspect-ratio crop
//!
//! The crop window keeps one full side of the image and trims the other so
//! the result matches the target aspect ratio. The anchor positions the
//! window along the trimmed axis: 0 aligns it left/top, 1 right/bottom.

use super::dimensions::{aspect_scaled_height, aspect_scaled_width, round_half_up, ImageDimensions};

/// Normalized crop position, both coordinates in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropAnchor {
    x: f64,
    y: f64,
}

impl CropAnchor {
    pub const CENTER: CropAnchor = CropAnchor { x: 0.5, y: 0.5 };

    /// Returns `None` unless both coordinates are finite and within `[0, 1]`.
    pub fn new(x: f64, y: f64) -> Option<Self> {
        let valid = |v: f64| v.is_finite() && (0.0..=1.0).contains(&v);
        if valid(x) && valid(y) {
            Some(Self { x, y })
        } else {
            None
        }
    }

    pub fn x(&self) -> f64 {
        self.x
    }

    pub fn y(&self) -> f64 {
        self.y
    }
}

impl Default for CropAnchor {
    fn default() -> Self {
        Self::CENTER
    }
}

/// Pixel rectangle to keep, in source coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRect {
    pub width: u32,
    pub height: u32,
    pub offset_x: u32,
    pub offset_y: u32,
}

impl CropRect {
    pub fn dimensions(&self) -> ImageDimensions {
        ImageDimensions::new(self.width, self.height)
    }

    /// True when the rectangle keeps the whole of `current`.
    pub fn covers(&self, current: ImageDimensions) -> bool {
        self.offset_x == 0 && self.offset_y == 0 && self.dimensions() == current
    }
}

/// Compute the crop window for `current` that matches `target_aspect_ratio`.
///
/// `target_aspect_ratio` must be finite and positive.
pub fn compute_crop(
    current: ImageDimensions,
    target_aspect_ratio: f64,
    anchor: CropAnchor,
) -> CropRect {
    let wider = current
        .aspect_ratio()
        .map(|ratio| ratio > target_aspect_ratio)
        .unwrap_or(false);

    if wider {
        let width = aspect_scaled_width(target_aspect_ratio, current.height).clamp(1, current.width);
        CropRect {
            width,
            height: current.height,
            offset_x: round_half_up((current.width - width) as f64 * anchor.x),
            offset_y: 0,
        }
    } else {
        let height =
            aspect_scaled_height(target_aspect_ratio, current.width).clamp(1, current.height.max(1));
        CropRect {
            width: current.width,
            height,
            offset_x: 0,
            offset_y: round_half_up(current.height.saturating_sub(height) as f64 * anchor.y),
        }
    }
}
