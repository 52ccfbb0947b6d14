//! Image processing error types
//!
//! Every failure names where it happened so the proxy can log the failing
//! stage and map the error to an HTTP status without leaking detail.

use std::fmt;
use thiserror::Error;

/// A discrete step of the transform pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Decode,
    Crop,
    Scale,
    Blur,
    Grayscale,
    Encode,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Decode => "decode",
            Stage::Crop => "crop",
            Stage::Scale => "scale",
            Stage::Blur => "blur",
            Stage::Grayscale => "grayscale",
            Stage::Encode => "encode",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure reported by an image backend primitive.
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct BackendError(pub String);

impl BackendError {
    pub fn new(message: impl Into<String>) -> Self {
        BackendError(message.into())
    }
}

/// Degenerate geometry that leaves no valid target size.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DimensionError {
    #[error("source image {width}x{height} has no usable aspect ratio")]
    EmptySource { width: u32, height: u32 },

    #[error("resolved target {width}x{height} collapses to zero pixels")]
    DegenerateTarget { width: u32, height: u32 },

    #[error("resolved target {width}x{height} exceeds the output size limit")]
    TooLarge { width: u32, height: u32 },
}

/// A pipeline stage failed inside the image backend.
#[derive(Debug, Clone, Error)]
#[error("{stage} stage failed: {message}")]
pub struct ProcessingError {
    pub stage: Stage,
    pub message: String,
}

impl ProcessingError {
    pub fn new(stage: Stage, message: impl Into<String>) -> Self {
        Self {
            stage,
            message: message.into(),
        }
    }

    /// Attach a stage to a backend failure.
    pub fn at(stage: Stage) -> impl Fn(BackendError) -> Self + Copy {
        move |e| Self::new(stage, e.0)
    }
}

/// Anything that aborts a pipeline run.
#[derive(Debug, Clone, Error)]
pub enum TransformError {
    #[error("{stage} stage: {source}")]
    Dimension { stage: Stage, source: DimensionError },

    #[error(transparent)]
    Processing(#[from] ProcessingError),
}

impl TransformError {
    /// Attach a stage to a geometry failure.
    pub fn dimension(stage: Stage) -> impl Fn(DimensionError) -> Self + Copy {
        move |source| TransformError::Dimension { stage, source }
    }

    /// The stage that failed.
    pub fn stage(&self) -> Stage {
        match self {
            TransformError::Dimension { stage, .. } => *stage,
            TransformError::Processing(e) => e.stage,
        }
    }
}

/// Request parameters that parse but are not acceptable.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum OptionsError {
    #[error("invalid parameter '{param}': {message}")]
    InvalidParameter { param: String, message: String },
}

impl OptionsError {
    pub fn invalid_param(param: impl Into<String>, message: impl Into<String>) -> Self {
        OptionsError::InvalidParameter {
            param: param.into(),
            message: message.into(),
        }
    }
}
