// Constants module - centralized default values for configuration
//
// Defaults applied when the configuration document leaves a value unset.
// Profile fields that inherit from the "default" profile fall back to these
// only when the "default" profile omits them as well.

// =============================================================================
// Server defaults
// =============================================================================

/// Default bind address
pub const DEFAULT_ADDRESS: &str = "0.0.0.0";

/// Default listen port
pub const DEFAULT_PORT: u16 = 8080;

/// Default number of worker threads
pub const DEFAULT_THREADS: usize = 4;

/// Default connection read timeout in seconds
pub const DEFAULT_READ_TIMEOUT_SECS: u64 = 5;

/// Default connection write timeout in seconds
pub const DEFAULT_WRITE_TIMEOUT_SECS: u64 = 30;

/// Default maximum concurrent requests
pub const DEFAULT_MAX_CONCURRENT_REQUESTS: usize = 1000;

// =============================================================================
// Source defaults
// =============================================================================

/// Default S3 operation timeout in seconds
pub const DEFAULT_SOURCE_TIMEOUT_SECS: u64 = 20;

/// Default AWS region when a profile does not name one
pub const DEFAULT_S3_REGION: &str = "us-east-1";

// =============================================================================
// Processor defaults
// =============================================================================

/// JPEG quality used when a processor leaves `image_compression_quality` at 0
pub const DEFAULT_COMPRESSION_QUALITY: u8 = 85;

/// Largest width or height a scale stage will produce
pub const MAX_OUTPUT_DIMENSION: u32 = 32768;

/// Largest pixel count a scale stage will produce (400MB as RGBA)
pub const MAX_OUTPUT_PIXELS: u64 = 100_000_000;

// =============================================================================
// Route defaults
// =============================================================================

/// Name of the profile every other profile inherits from
pub const DEFAULT_PROFILE_NAME: &str = "default";

/// Capture group that selects the backend object key
pub const DEFAULT_IMAGE_KEY_GROUP: &str = "image_path";

// =============================================================================
// Request parameter names
// =============================================================================

pub const PARAM_WIDTH: &str = "w";
pub const PARAM_HEIGHT: &str = "h";
pub const PARAM_BLUR: &str = "blur";
pub const PARAM_GRAYSCALE: &str = "grayscale";
pub const PARAM_CROP_X: &str = "crop_x";
pub const PARAM_CROP_Y: &str = "crop_y";
