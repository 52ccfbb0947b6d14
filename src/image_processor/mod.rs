//! Image processing module
//!
//! Applies a processor profile to one fetched image:
//! - Crop to the target aspect ratio around a relative anchor
//! - Scale with optional aspect-ratio preservation and maxima
//! - Gaussian blur proportional to the image width
//! - Grayscale conversion
//!
//! Requests that change nothing get the original bytes back.

pub mod backend;
pub mod config;
pub mod crop;
pub mod dimensions;
pub mod encoder;
pub mod error;
pub mod format;
pub mod options;
pub mod processor;
pub mod raster;

pub use backend::{ImageBackend, ImageHandle};
pub use config::ProcessorConfig;
pub use crop::{compute_crop, CropAnchor, CropRect};
pub use dimensions::{resolve_target_size, ImageDimensions, ScalePolicy};
pub use encoder::{EncodeSettings, EncoderFactory, ImageEncoder};
pub use error::{BackendError, DimensionError, OptionsError, ProcessingError, Stage, TransformError};
pub use format::ImageFormat;
pub use options::ProcessingOptions;
pub use processor::{blur_radius, ImageProcessor, ProcessedImage, RawImage};
pub use raster::RasterBackend;
