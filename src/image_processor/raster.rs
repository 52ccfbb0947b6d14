//! Pure-Rust image backend
//!
//! Decoding, cropping, blurring and colorspace conversion use the `image`
//! crate; resizing uses `fast_image_resize` with a Lanczos3 convolution.

use fast_image_resize::{FilterType, Image, PixelType, ResizeAlg, Resizer};
use image::io::Reader as ImageReader;
use image::DynamicImage;
use std::io::Cursor;
use std::num::NonZeroU32;

use super::backend::{
    Colorspace, Compression, ImageBackend, ImageHandle, Interlace, Interpolation, ResizeFilter,
};
use super::crop::CropRect;
use super::dimensions::ImageDimensions;
use super::encoder::{EncodeSettings, EncoderFactory};
use super::error::BackendError;
use super::format::ImageFormat;

#[derive(Debug, Clone, Copy, Default)]
pub struct RasterBackend;

/// Decoded pixels plus the encode settings requested so far.
pub struct RasterImage {
    image: DynamicImage,
    format: ImageFormat,
    settings: EncodeSettings,
    interpolation: Option<Interpolation>,
}

impl RasterImage {
    pub fn image(&self) -> &DynamicImage {
        &self.image
    }

    pub fn settings(&self) -> EncodeSettings {
        self.settings
    }

    pub fn interpolation(&self) -> Option<Interpolation> {
        self.interpolation
    }
}

impl ImageBackend for RasterBackend {
    type Handle = RasterImage;

    fn decode(&self, data: &[u8]) -> Result<RasterImage, BackendError> {
        let reader = ImageReader::new(Cursor::new(data))
            .with_guessed_format()
            .map_err(|e| BackendError::new(format!("failed to read image: {}", e)))?;

        let format = reader
            .format()
            .and_then(ImageFormat::from_image_format)
            .ok_or_else(|| BackendError::new("unsupported image format"))?;

        let image = reader
            .decode()
            .map_err(|e| BackendError::new(format!("failed to decode image: {}", e)))?;

        Ok(RasterImage {
            image,
            format,
            settings: EncodeSettings::default(),
            interpolation: None,
        })
    }
}

impl ImageHandle for RasterImage {
    fn dimensions(&self) -> ImageDimensions {
        ImageDimensions::new(self.image.width(), self.image.height())
    }

    fn format(&self) -> ImageFormat {
        self.format
    }

    fn crop(&mut self, rect: CropRect) -> Result<(), BackendError> {
        let current = self.dimensions();
        let fits_x = rect.offset_x.checked_add(rect.width).map(|r| r <= current.width);
        let fits_y = rect.offset_y.checked_add(rect.height).map(|b| b <= current.height);
        if fits_x != Some(true) || fits_y != Some(true) || rect.width == 0 || rect.height == 0 {
            return Err(BackendError::new(format!(
                "crop {}x{}+{}+{} outside image {}",
                rect.width, rect.height, rect.offset_x, rect.offset_y, current
            )));
        }

        self.image = self
            .image
            .crop_imm(rect.offset_x, rect.offset_y, rect.width, rect.height);
        Ok(())
    }

    fn resize(&mut self, size: ImageDimensions, filter: ResizeFilter) -> Result<(), BackendError> {
        let kernel = match filter {
            ResizeFilter::Lanczos => FilterType::Lanczos3,
        };
        self.image = resize_image(&self.image, size, kernel)?;
        Ok(())
    }

    fn set_interpolation(&mut self, method: Interpolation) -> Result<(), BackendError> {
        self.interpolation = Some(method);
        Ok(())
    }

    fn strip_metadata(&mut self) -> Result<(), BackendError> {
        // Decoded pixels carry no EXIF/ICC data, and the encoders write none.
        Ok(())
    }

    fn set_interlace(&mut self, scheme: Interlace) -> Result<(), BackendError> {
        self.settings.interlace = scheme;
        Ok(())
    }

    fn set_compression(&mut self, kind: Compression, quality: u8) -> Result<(), BackendError> {
        match kind {
            Compression::Jpeg => self.settings = self.settings.with_quality(quality),
        }
        Ok(())
    }

    fn gaussian_blur(&mut self, _radius: f64, sigma: f64) -> Result<(), BackendError> {
        if !sigma.is_finite() || sigma < 0.0 {
            return Err(BackendError::new(format!("invalid blur sigma {}", sigma)));
        }
        if sigma > 0.0 {
            self.image = self.image.blur(sigma as f32);
        }
        Ok(())
    }

    fn transform_colorspace(&mut self, colorspace: Colorspace) -> Result<(), BackendError> {
        match colorspace {
            Colorspace::Gray => self.image = self.image.grayscale(),
        }
        Ok(())
    }

    fn encode(&self) -> Result<Vec<u8>, BackendError> {
        EncoderFactory::create(self.format).encode(&self.image, self.settings)
    }
}

/// Resize image using fast-image-resize with a convolution kernel
fn resize_image(
    img: &DynamicImage,
    target: ImageDimensions,
    kernel: FilterType,
) -> Result<DynamicImage, BackendError> {
    let src_width =
        NonZeroU32::new(img.width()).ok_or_else(|| BackendError::new("source width is 0"))?;
    let src_height =
        NonZeroU32::new(img.height()).ok_or_else(|| BackendError::new("source height is 0"))?;
    let dst_width =
        NonZeroU32::new(target.width).ok_or_else(|| BackendError::new("target width is 0"))?;
    let dst_height =
        NonZeroU32::new(target.height).ok_or_else(|| BackendError::new("target height is 0"))?;

    let src_image = Image::from_vec_u8(
        src_width,
        src_height,
        img.to_rgba8().into_raw(),
        PixelType::U8x4,
    )
    .map_err(|e| BackendError::new(format!("failed to create source image: {:?}", e)))?;

    let mut dst_image = Image::new(dst_width, dst_height, PixelType::U8x4);

    let mut resizer = Resizer::new(ResizeAlg::Convolution(kernel));
    resizer
        .resize(&src_image.view(), &mut dst_image.view_mut())
        .map_err(|e| BackendError::new(format!("resize operation failed: {:?}", e)))?;

    let rgba_image = image::RgbaImage::from_raw(target.width, target.height, dst_image.into_vec())
        .ok_or_else(|| BackendError::new("failed to create output image buffer"))?;

    Ok(DynamicImage::ImageRgba8(rgba_image))
}
