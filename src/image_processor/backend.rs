//! Image library interface
//!
//! The pipeline never touches pixels itself; it sequences and parameterizes
//! the primitives below. [`RasterBackend`](super::raster::RasterBackend) is
//! the production implementation. A handle owns the decoded working buffer
//! for exactly one pipeline run and releases it when dropped, so every exit
//! path (including a failed stage) frees it.

use super::crop::CropRect;
use super::dimensions::ImageDimensions;
use super::error::BackendError;
use super::format::ImageFormat;

/// Resampling kernel for [`ImageHandle::resize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeFilter {
    /// Highest-quality kernel the backend offers.
    Lanczos,
}

/// Pixel interpolation hint for later geometry operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interpolation {
    Bicubic,
}

/// Interlace scheme for encoders that support one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Interlace {
    #[default]
    None,
    /// Progressive (planar) encoding.
    Plane,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    Jpeg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Colorspace {
    Gray,
}

/// Decodes bytes into a working handle.
pub trait ImageBackend: Send + Sync {
    type Handle: ImageHandle;

    fn decode(&self, data: &[u8]) -> Result<Self::Handle, BackendError>;
}

/// A decoded image and its pending encode settings.
pub trait ImageHandle {
    fn dimensions(&self) -> ImageDimensions;

    /// Format the handle will encode to.
    fn format(&self) -> ImageFormat;

    fn crop(&mut self, rect: CropRect) -> Result<(), BackendError>;

    fn resize(&mut self, size: ImageDimensions, filter: ResizeFilter) -> Result<(), BackendError>;

    fn set_interpolation(&mut self, method: Interpolation) -> Result<(), BackendError>;

    fn strip_metadata(&mut self) -> Result<(), BackendError>;

    fn set_interlace(&mut self, scheme: Interlace) -> Result<(), BackendError>;

    fn set_compression(&mut self, kind: Compression, quality: u8) -> Result<(), BackendError>;

    fn gaussian_blur(&mut self, radius: f64, sigma: f64) -> Result<(), BackendError>;

    fn transform_colorspace(&mut self, colorspace: Colorspace) -> Result<(), BackendError>;

    fn encode(&self) -> Result<Vec<u8>, BackendError>;
}
