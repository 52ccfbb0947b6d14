//! Image encoder abstraction
//!
//! One encoder per output format, selected by [`EncoderFactory`] from the
//! format detected at decode time.

use image::{ColorType, DynamicImage, ImageEncoder as _};
use std::io::Cursor;

use super::backend::Interlace;
use super::error::BackendError;
use super::format::ImageFormat;
use crate::constants::DEFAULT_COMPRESSION_QUALITY;

/// Encoder settings collected on the handle before encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodeSettings {
    /// Quality value (1-100, where 100 is best quality)
    pub quality: u8,
    pub interlace: Interlace,
}

impl Default for EncodeSettings {
    fn default() -> Self {
        Self {
            quality: DEFAULT_COMPRESSION_QUALITY,
            interlace: Interlace::None,
        }
    }
}

impl EncodeSettings {
    pub fn with_quality(mut self, quality: u8) -> Self {
        self.quality = quality.clamp(1, 100);
        self
    }
}

/// Encodes a decoded image into one output format.
pub trait ImageEncoder: Send + Sync {
    fn format(&self) -> ImageFormat;

    fn encode(&self, image: &DynamicImage, settings: EncodeSettings)
        -> Result<Vec<u8>, BackendError>;
}

/// JPEG encoder using jpeg-encoder, which can write progressive scans.
///
/// `Interlace::Plane` selects progressive output; anything else is baseline.
pub struct JpegEncoder;

impl ImageEncoder for JpegEncoder {
    fn format(&self) -> ImageFormat {
        ImageFormat::Jpeg
    }

    fn encode(
        &self,
        image: &DynamicImage,
        settings: EncodeSettings,
    ) -> Result<Vec<u8>, BackendError> {
        use jpeg_encoder::{ColorType as JpegColorType, Encoder};

        // JPEG has no alpha channel
        let (data, color) = if is_gray(image) {
            (image.to_luma8().into_raw(), JpegColorType::Luma)
        } else {
            (image.to_rgb8().into_raw(), JpegColorType::Rgb)
        };
        let (width, height) = match (u16::try_from(image.width()), u16::try_from(image.height())) {
            (Ok(width), Ok(height)) => (width, height),
            _ => {
                return Err(BackendError::new(format!(
                    "failed to encode to jpeg: {}x{} exceeds the format limit",
                    image.width(),
                    image.height()
                )))
            }
        };

        let mut output = Vec::new();
        let mut encoder = Encoder::new(&mut output, settings.quality);
        encoder.set_progressive(settings.interlace == Interlace::Plane);
        encoder
            .encode(&data, width, height, color)
            .map_err(|e| {
                BackendError::new(format!(
                    "failed to encode to {}: {}",
                    ImageFormat::Jpeg.as_str(),
                    e
                ))
            })?;
        Ok(output)
    }
}

/// PNG encoder using the image crate.
pub struct PngEncoder;

impl ImageEncoder for PngEncoder {
    fn format(&self) -> ImageFormat {
        ImageFormat::Png
    }

    fn encode(
        &self,
        image: &DynamicImage,
        _settings: EncodeSettings,
    ) -> Result<Vec<u8>, BackendError> {
        use image::codecs::png::PngEncoder as ImagePngEncoder;

        let (data, color) = lossless_pixels(image);
        let mut output = Cursor::new(Vec::new());
        ImagePngEncoder::new(&mut output)
            .write_image(&data, image.width(), image.height(), color)
            .map_err(|e| encode_failed(ImageFormat::Png, e))?;
        Ok(output.into_inner())
    }
}

/// WebP encoder using the image crate.
///
/// The image crate only supports lossless WebP encoding.
pub struct WebPEncoder;

impl ImageEncoder for WebPEncoder {
    fn format(&self) -> ImageFormat {
        ImageFormat::WebP
    }

    fn encode(
        &self,
        image: &DynamicImage,
        _settings: EncodeSettings,
    ) -> Result<Vec<u8>, BackendError> {
        use image::codecs::webp::WebPEncoder as ImageWebPEncoder;

        let data = image.to_rgba8().into_raw();
        let mut output = Cursor::new(Vec::new());
        ImageWebPEncoder::new_lossless(&mut output)
            .write_image(&data, image.width(), image.height(), ColorType::Rgba8)
            .map_err(|e| encode_failed(ImageFormat::WebP, e))?;
        Ok(output.into_inner())
    }
}

/// GIF encoder (single frame) using the image crate.
pub struct GifEncoder;

impl ImageEncoder for GifEncoder {
    fn format(&self) -> ImageFormat {
        ImageFormat::Gif
    }

    fn encode(
        &self,
        image: &DynamicImage,
        _settings: EncodeSettings,
    ) -> Result<Vec<u8>, BackendError> {
        use image::codecs::gif::GifEncoder as ImageGifEncoder;

        let data = image.to_rgba8().into_raw();
        let mut output = Vec::new();
        {
            let mut encoder = ImageGifEncoder::new(&mut output);
            encoder
                .encode(&data, image.width(), image.height(), ColorType::Rgba8)
                .map_err(|e| encode_failed(ImageFormat::Gif, e))?;
        }
        Ok(output)
    }
}

/// Factory for creating encoders based on output format
pub struct EncoderFactory;

impl EncoderFactory {
    pub fn create(format: ImageFormat) -> Box<dyn ImageEncoder> {
        match format {
            ImageFormat::Jpeg => Box::new(JpegEncoder),
            ImageFormat::Png => Box::new(PngEncoder),
            ImageFormat::WebP => Box::new(WebPEncoder),
            ImageFormat::Gif => Box::new(GifEncoder),
        }
    }
}

fn is_gray(image: &DynamicImage) -> bool {
    matches!(
        image,
        DynamicImage::ImageLuma8(_)
            | DynamicImage::ImageLumaA8(_)
            | DynamicImage::ImageLuma16(_)
            | DynamicImage::ImageLumaA16(_)
    )
}

/// 8-bit pixels for lossless formats, keeping grayscale as grayscale.
fn lossless_pixels(image: &DynamicImage) -> (Vec<u8>, ColorType) {
    match image {
        DynamicImage::ImageLuma8(_) | DynamicImage::ImageLuma16(_) => {
            (image.to_luma8().into_raw(), ColorType::L8)
        }
        DynamicImage::ImageLumaA8(_) | DynamicImage::ImageLumaA16(_) => {
            (image.to_luma_alpha8().into_raw(), ColorType::La8)
        }
        _ => (image.to_rgba8().into_raw(), ColorType::Rgba8),
    }
}

fn encode_failed(format: ImageFormat, err: image::ImageError) -> BackendError {
    BackendError::new(format!("failed to encode to {}: {}", format.as_str(), err))
}
