//! Transform pipeline
//!
//! Runs crop → scale → blur → grayscale against an [`ImageBackend`]. Each
//! stage reports whether it changed the image; when none did, the input
//! bytes are returned untouched and nothing is re-encoded.

use bytes::Bytes;

use super::backend::{
    Colorspace, Compression, ImageBackend, ImageHandle, Interlace, Interpolation, ResizeFilter,
};
use super::config::ProcessorConfig;
use super::crop::compute_crop;
use super::dimensions::{resolve_target_size, ImageDimensions};
use super::error::{DimensionError, ProcessingError, Stage, TransformError};
use super::format::ImageFormat;
use super::options::ProcessingOptions;
use super::raster::RasterBackend;

/// Original bytes as fetched from a source.
#[derive(Debug, Clone)]
pub struct RawImage {
    pub data: Bytes,
    /// Content type reported by the source, if any
    pub mime_type_hint: Option<String>,
}

impl RawImage {
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self {
            data: data.into(),
            mime_type_hint: None,
        }
    }

    pub fn with_mime_type_hint(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type_hint = Some(mime_type.into());
        self
    }
}

/// Result of image processing
#[derive(Debug, Clone)]
pub struct ProcessedImage {
    pub data: Bytes,
    /// Content-Type header value
    pub mime_type: &'static str,
    pub original_size: ImageDimensions,
    pub output_size: ImageDimensions,
    /// False when the input bytes were passed through
    pub modified: bool,
}

/// Blur radius handed to the backend: `width * fraction * max_percentage`.
pub fn blur_radius(width: u32, fraction: f64, max_blur_radius_percentage: f64) -> f64 {
    width as f64 * fraction * max_blur_radius_percentage
}

/// Applies one processor profile to decoded images.
pub struct ImageProcessor<B: ImageBackend = RasterBackend> {
    config: ProcessorConfig,
    backend: B,
}

impl ImageProcessor<RasterBackend> {
    pub fn new(config: ProcessorConfig) -> Self {
        Self::with_backend(config, RasterBackend)
    }
}

impl<B: ImageBackend> ImageProcessor<B> {
    pub fn with_backend(config: ProcessorConfig, backend: B) -> Self {
        Self { config, backend }
    }

    pub fn config(&self) -> &ProcessorConfig {
        &self.config
    }

    /// Run the pipeline.
    ///
    /// # Errors
    ///
    /// Aborts on the first failing stage; no partial output is produced.
    pub fn process(
        &self,
        raw: &RawImage,
        options: &ProcessingOptions,
    ) -> Result<ProcessedImage, TransformError> {
        // The handle owns the working buffer and is released on every return.
        let mut handle = self
            .backend
            .decode(&raw.data)
            .map_err(ProcessingError::at(Stage::Decode))?;
        let original_size = handle.dimensions();

        let cropped = self.crop(&mut handle, options)?;
        let scaled = self.scale(&mut handle, options)?;
        let blurred = self.blur(&mut handle, options)?;
        let grayscaled = self.grayscale(&mut handle, options)?;
        let modified = cropped || scaled || blurred || grayscaled;

        let data = if modified {
            Bytes::from(handle.encode().map_err(ProcessingError::at(Stage::Encode))?)
        } else {
            raw.data.clone()
        };

        tracing::debug!(
            processor = %self.config.name,
            original = %original_size,
            output = %handle.dimensions(),
            modified,
            "Image processed"
        );

        Ok(ProcessedImage {
            data,
            mime_type: handle.format().mime_type(),
            original_size,
            output_size: handle.dimensions(),
            modified,
        })
    }

    fn crop(
        &self,
        handle: &mut B::Handle,
        options: &ProcessingOptions,
    ) -> Result<bool, TransformError> {
        let Some(anchor) = options.crop else {
            return Ok(false);
        };

        let target = if options.dimensions.is_empty() {
            self.config.default_dimensions()
        } else {
            options.dimensions
        };
        // Without a full target size there is no ratio to crop to.
        let Some(ratio) = target.aspect_ratio().filter(|r| *r > 0.0) else {
            return Ok(false);
        };

        let current = handle.dimensions();
        if !current.is_complete() {
            return Err(TransformError::Dimension {
                stage: Stage::Crop,
                source: DimensionError::EmptySource {
                    width: current.width,
                    height: current.height,
                },
            });
        }

        let rect = compute_crop(current, ratio, anchor);
        if rect.covers(current) {
            return Ok(false);
        }

        tracing::debug!(
            processor = %self.config.name,
            width = rect.width,
            height = rect.height,
            offset_x = rect.offset_x,
            offset_y = rect.offset_y,
            "Cropping image"
        );
        handle.crop(rect).map_err(ProcessingError::at(Stage::Crop))?;
        Ok(true)
    }

    fn scale(
        &self,
        handle: &mut B::Handle,
        options: &ProcessingOptions,
    ) -> Result<bool, TransformError> {
        let current = handle.dimensions();
        let target = resolve_target_size(current, options.dimensions, &self.config.scale_policy())
            .map_err(TransformError::dimension(Stage::Scale))?;
        if target == current {
            return Ok(false);
        }

        tracing::debug!(
            processor = %self.config.name,
            from = %current,
            to = %target,
            "Scaling image"
        );

        let fail = ProcessingError::at(Stage::Scale);
        handle.resize(target, ResizeFilter::Lanczos).map_err(fail)?;
        handle
            .set_interpolation(Interpolation::Bicubic)
            .map_err(fail)?;
        handle.strip_metadata().map_err(fail)?;

        if handle.format() == ImageFormat::Jpeg {
            handle.set_interlace(Interlace::Plane).map_err(fail)?;
            handle
                .set_compression(Compression::Jpeg, self.config.image_compression_quality)
                .map_err(fail)?;
        }
        Ok(true)
    }

    fn blur(
        &self,
        handle: &mut B::Handle,
        options: &ProcessingOptions,
    ) -> Result<bool, TransformError> {
        if options.blur == 0.0 {
            return Ok(false);
        }

        let radius = blur_radius(
            handle.dimensions().width,
            options.blur,
            self.config.max_blur_radius_percentage,
        );
        handle
            .gaussian_blur(radius, radius)
            .map_err(ProcessingError::at(Stage::Blur))?;
        Ok(true)
    }

    fn grayscale(
        &self,
        handle: &mut B::Handle,
        options: &ProcessingOptions,
    ) -> Result<bool, TransformError> {
        if !self.config.applies_grayscale(options.grayscale) {
            return Ok(false);
        }

        handle
            .transform_colorspace(Colorspace::Gray)
            .map_err(ProcessingError::at(Stage::Grayscale))?;
        Ok(true)
    }
}
