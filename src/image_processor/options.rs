//! Per-request processing options
//!
//! Options are read through a lookup closure so the caller decides where a
//! value comes from (route captures first, then the query string). Values
//! that fail to parse fall back to "not requested"; only a crop anchor that
//! parses but lies outside `[0, 1]` is rejected.

use crate::constants::{
    PARAM_BLUR, PARAM_CROP_X, PARAM_CROP_Y, PARAM_GRAYSCALE, PARAM_HEIGHT, PARAM_WIDTH,
};

use super::crop::CropAnchor;
use super::dimensions::ImageDimensions;
use super::error::OptionsError;

/// What a single request asks the pipeline to do.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProcessingOptions {
    /// Requested size; a zero side means "derive it".
    pub dimensions: ImageDimensions,
    /// Fraction of the processor's maximum blur radius, `>= 0`.
    pub blur: f64,
    pub grayscale: bool,
    /// `None` disables the crop stage.
    pub crop: Option<CropAnchor>,
}

impl ProcessingOptions {
    /// Build options from a key lookup.
    ///
    /// # Errors
    ///
    /// Returns [`OptionsError::InvalidParameter`] when both crop coordinates
    /// are present but one lies outside `[0, 1]`.
    pub fn from_lookup<'a, F>(lookup: F) -> Result<Self, OptionsError>
    where
        F: Fn(&str) -> Option<&'a str>,
    {
        Ok(Self {
            dimensions: ImageDimensions::new(
                parse_dimension(lookup(PARAM_WIDTH)),
                parse_dimension(lookup(PARAM_HEIGHT)),
            ),
            blur: parse_blur(lookup(PARAM_BLUR)),
            grayscale: parse_bool(lookup(PARAM_GRAYSCALE)),
            crop: parse_anchor(lookup(PARAM_CROP_X), lookup(PARAM_CROP_Y))?,
        })
    }
}

/// Unsigned pixel count; anything unparseable is 0.
pub fn parse_dimension(value: Option<&str>) -> u32 {
    value.and_then(|v| v.parse().ok()).unwrap_or(0)
}

/// Blur fraction; unparseable, negative and non-finite values are 0.
pub fn parse_blur(value: Option<&str>) -> f64 {
    value
        .and_then(|v| v.parse::<f64>().ok())
        .filter(|v| v.is_finite() && *v > 0.0)
        .unwrap_or(0.0)
}

/// Boolean flag; unrecognized spellings are false.
pub fn parse_bool(value: Option<&str>) -> bool {
    matches!(
        value,
        Some("1" | "t" | "T" | "TRUE" | "true" | "True")
    )
}

fn parse_anchor(x: Option<&str>, y: Option<&str>) -> Result<Option<CropAnchor>, OptionsError> {
    let (x, y) = match (parse_coordinate(x), parse_coordinate(y)) {
        (Some(x), Some(y)) => (x, y),
        _ => return Ok(None),
    };

    CropAnchor::new(x, y).map(Some).ok_or_else(|| {
        let param = if CropAnchor::new(x, 0.0).is_none() {
            PARAM_CROP_X
        } else {
            PARAM_CROP_Y
        };
        OptionsError::invalid_param(param, "crop anchor must be within [0, 1]")
    })
}

fn parse_coordinate(value: Option<&str>) -> Option<f64> {
    value.and_then(|v| v.parse().ok())
}
