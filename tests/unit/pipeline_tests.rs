// Transform pipeline tests against the raster backend on generated images

use image::{DynamicImage, GenericImageView, ImageFormat as RasterFormat, RgbImage};
use kagami::image_processor::{
    CropAnchor, DimensionError, ImageDimensions, ImageProcessor, ProcessingOptions,
    ProcessorConfig, RawImage, Stage, TransformError,
};
use kagami::pipeline::RequestContext;
use std::io::Cursor;

fn encoded(format: RasterFormat, width: u32, height: u32) -> RawImage {
    // Left half red, right half blue, so crops are observable
    let img = RgbImage::from_fn(width, height, |x, _| {
        if x < width / 2 {
            image::Rgb([220, 20, 20])
        } else {
            image::Rgb([20, 20, 220])
        }
    });
    let mut buffer = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img)
        .write_to(&mut buffer, format)
        .unwrap();
    RawImage::new(buffer.into_inner())
}

fn processor(config: ProcessorConfig) -> ImageProcessor {
    ImageProcessor::new(config)
}

fn aspect_config() -> ProcessorConfig {
    ProcessorConfig {
        maintain_aspect_ratio: true,
        ..ProcessorConfig::default()
    }
}

fn sized(width: u32, height: u32) -> ProcessingOptions {
    ProcessingOptions {
        dimensions: ImageDimensions::new(width, height),
        ..ProcessingOptions::default()
    }
}

// Test: width-only request keeps the aspect ratio
#[test]
fn test_width_only_resize() {
    let raw = encoded(RasterFormat::Png, 400, 200);
    let out = processor(aspect_config()).process(&raw, &sized(100, 0)).unwrap();

    assert!(out.modified);
    assert_eq!(out.mime_type, "image/png");
    assert_eq!(out.original_size, ImageDimensions::new(400, 200));
    assert_eq!(out.output_size, ImageDimensions::new(100, 50));
    let decoded = image::load_from_memory(&out.data).unwrap();
    assert_eq!(decoded.dimensions(), (100, 50));
}

// Test: maxima clamp the output even with no requested size
#[test]
fn test_maxima_clamp_without_request() {
    let config = ProcessorConfig {
        max_image_width: 1000,
        ..aspect_config()
    };
    let raw = encoded(RasterFormat::Png, 2000, 1000);
    let out = processor(config)
        .process(&raw, &ProcessingOptions::default())
        .unwrap();
    assert_eq!(out.output_size, ImageDimensions::new(1000, 500));
}

// Test: JPEG output stays JPEG and is re-encoded
#[test]
fn test_jpeg_is_reencoded_as_jpeg() {
    let raw = encoded(RasterFormat::Jpeg, 320, 240);
    let out = processor(aspect_config()).process(&raw, &sized(160, 0)).unwrap();

    assert_eq!(out.mime_type, "image/jpeg");
    assert_eq!(
        image::guess_format(&out.data).unwrap(),
        RasterFormat::Jpeg
    );
    assert_eq!(out.output_size, ImageDimensions::new(160, 120));
}

// Test: a rescaled JPEG is written with progressive scans
#[test]
fn test_rescaled_jpeg_is_progressive() {
    let raw = encoded(RasterFormat::Jpeg, 320, 240);
    let out = processor(aspect_config()).process(&raw, &sized(160, 0)).unwrap();

    // Walk the segments up to the first start-of-frame marker
    let data = out.data.as_ref();
    let mut pos = 2;
    let frame = loop {
        let marker = data[pos + 1];
        if (0xC0..=0xC2).contains(&marker) {
            break marker;
        }
        pos += 2 + u16::from_be_bytes([data[pos + 2], data[pos + 3]]) as usize;
    };
    assert_eq!(frame, 0xC2, "expected SOF2 (progressive)");
}

// Test: an image that needs no transform is returned byte-for-byte
#[test]
fn test_passthrough_returns_original_bytes() {
    let raw = encoded(RasterFormat::Png, 64, 64);
    let out = processor(aspect_config())
        .process(&raw, &ProcessingOptions::default())
        .unwrap();

    assert!(!out.modified);
    assert_eq!(out.data, raw.data);
    assert_eq!(out.mime_type, "image/png");
}

// Test: an anchored crop keeps the requested side of the image
#[test]
fn test_crop_anchor_selects_region() {
    let raw = encoded(RasterFormat::Png, 200, 100);
    let options = ProcessingOptions {
        crop: CropAnchor::new(0.0, 0.5),
        ..sized(100, 100)
    };
    let out = processor(aspect_config()).process(&raw, &options).unwrap();
    assert_eq!(out.output_size, ImageDimensions::new(100, 100));

    // Anchored left: only the red half remains
    let decoded = image::load_from_memory(&out.data).unwrap().to_rgb8();
    let pixel = decoded.get_pixel(90, 50);
    assert!(pixel[0] > 150 && pixel[2] < 100, "expected red, got {:?}", pixel);
}

// Test: grayscale output has equal channels
#[test]
fn test_grayscale_requested() {
    let raw = encoded(RasterFormat::Png, 40, 40);
    let options = ProcessingOptions {
        grayscale: true,
        ..ProcessingOptions::default()
    };
    let out = processor(aspect_config()).process(&raw, &options).unwrap();
    assert!(out.modified);

    let decoded = image::load_from_memory(&out.data).unwrap().to_rgb8();
    let pixel = decoded.get_pixel(5, 5);
    assert_eq!(pixel[0], pixel[1]);
    assert_eq!(pixel[1], pixel[2]);
}

// Test: a disabled grayscale stage ignores both request and default
#[test]
fn test_grayscale_disabled_wins() {
    let config = ProcessorConfig {
        grayscale_by_default: true,
        grayscale_disabled: true,
        ..aspect_config()
    };
    let raw = encoded(RasterFormat::Png, 40, 40);
    let options = ProcessingOptions {
        grayscale: true,
        ..ProcessingOptions::default()
    };
    let out = processor(config).process(&raw, &options).unwrap();
    assert!(!out.modified);
}

// Test: blur modifies pixels but keeps the size
#[test]
fn test_blur_keeps_dimensions() {
    let config = ProcessorConfig {
        max_blur_radius_percentage: 0.1,
        ..aspect_config()
    };
    let raw = encoded(RasterFormat::Png, 40, 40);
    let options = ProcessingOptions {
        blur: 0.5,
        ..ProcessingOptions::default()
    };

    let out = processor(config).process(&raw, &options).unwrap();
    assert!(out.modified);
    assert_eq!(out.output_size, ImageDimensions::new(40, 40));
    assert_ne!(out.data, raw.data);
}

// Test: undecodable input fails in the decode stage
#[test]
fn test_garbage_fails_in_decode() {
    let raw = RawImage::new(b"definitely not an image".to_vec());
    let err = processor(aspect_config())
        .process(&raw, &sized(10, 10))
        .unwrap_err();
    assert_eq!(err.stage(), Stage::Decode);
}

// Test: a target collapsing to zero pixels is a dimension error
#[test]
fn test_degenerate_target() {
    let raw = encoded(RasterFormat::Png, 1000, 10);
    let err = processor(aspect_config())
        .process(&raw, &sized(10, 0))
        .unwrap_err();
    assert!(matches!(
        err,
        TransformError::Dimension {
            stage: Stage::Scale,
            source: DimensionError::DegenerateTarget { .. }
        }
    ));
}

// Test: an upscale past the output limit fails without allocating the target
#[test]
fn test_huge_width_fails_cleanly() {
    let raw = encoded(RasterFormat::Png, 100, 100);
    let err = processor(aspect_config())
        .process(&raw, &sized(60000, 0))
        .unwrap_err();
    assert!(matches!(
        err,
        TransformError::Dimension {
            source: DimensionError::TooLarge {
                width: 60000,
                height: 60000
            },
            ..
        }
    ));
    assert_eq!(err.stage(), Stage::Scale);
}

// Test: RequestContext carries a unique request ID per request
#[test]
fn test_request_context_includes_request_id() {
    let context1 = RequestContext::new("GET".to_string(), "/a.jpg".to_string());
    let context2 = RequestContext::new("GET".to_string(), "/a.jpg".to_string());

    assert_ne!(context1.request_id(), context2.request_id());
    assert_eq!(context1.request_id().len(), 36, "UUID should be 36 characters long");
}
