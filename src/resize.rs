//! Fits images into a bounding box and re-encodes them as JPEG.
//!
//! Landscape images are bound by width; everything else, squares
//! included, is bound by height. The other axis is scaled by the same
//! ratio and truncated, never dropping below one pixel.

use crate::conf::Settings;
use crate::error::ResizeError;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{ColorType, DynamicImage, GenericImageView};
use tracing::{debug, instrument};

/// MIME type of every output object.
pub const OUTPUT_CONTENT_TYPE: &str = "image/jpeg";

/// Resampling filter used for every resize. Catmull-Rom is a bicubic
/// filter.
const FILTER: FilterType = FilterType::CatmullRom;

/// Size of a resized image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetDimensions {
    pub width: u32,
    pub height: u32,
}

/// Compute the size an image of `width` by `height` pixels is resized
/// to, given the width bound for landscape images and the height
/// bound for the rest.
pub fn target_dimensions(
    width: u32,
    height: u32,
    target_width: u32,
    target_height: u32,
) -> TargetDimensions {
    // u64 so that the products can't overflow
    let scale = |side: u32, bound: u32, base: u32| -> u32 {
        let scaled = u64::from(side) * u64::from(bound) / u64::from(base.max(1));
        u32::try_from(scaled).unwrap_or(u32::MAX).max(1)
    };
    if width > height {
        TargetDimensions {
            width: target_width,
            height: scale(height, target_width, width),
        }
    } else {
        TargetDimensions {
            width: scale(width, target_height, height),
            height: target_height,
        }
    }
}

/// The result of processing one image.
#[derive(Debug)]
pub struct EncodedOutput {
    /// The JPEG encoded bytes.
    pub bytes: Vec<u8>,

    /// Dimensions of the source image.
    pub source: TargetDimensions,

    /// Dimensions of the encoded image.
    pub target: TargetDimensions,
}

/// The part of the settings that governs the image transformation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resizer {
    pub target_width: u32,
    pub target_height: u32,
    pub jpeg_quality: u8,
}

impl Resizer {
    /// Build a resizer from the settings, validating the bounds.
    pub fn new(settings: &Settings) -> anyhow::Result<Self> {
        anyhow::ensure!(settings.target_width > 0, "target width must be positive");
        anyhow::ensure!(settings.target_height > 0, "target height must be positive");
        Ok(Resizer {
            target_width: settings.target_width,
            target_height: settings.target_height,
            jpeg_quality: settings.jpeg_quality.clamp(1, 100),
        })
    }

    /// Decode, resize and encode the given image bytes.
    #[instrument(skip_all, fields(len = data.len()))]
    pub fn process(&self, data: &[u8]) -> Result<EncodedOutput, ResizeError> {
        let raster = decode(data)?;
        let (width, height) = raster.dimensions();
        let target = target_dimensions(width, height, self.target_width, self.target_height);
        debug!(
            width,
            height,
            target_width = target.width,
            target_height = target.height,
            "Resizing image"
        );
        let resized = resize(&raster, target);
        drop(raster);
        let bytes = encode_jpeg(&resized, self.jpeg_quality)?;
        Ok(EncodedOutput {
            bytes,
            source: TargetDimensions { width, height },
            target,
        })
    }
}

/// Decode an image, guessing its format from the contents.
pub fn decode(data: &[u8]) -> Result<DynamicImage, ResizeError> {
    Ok(image::load_from_memory(data)?)
}

/// Resample an image to exactly the given dimensions.
pub fn resize(raster: &DynamicImage, target: TargetDimensions) -> DynamicImage {
    raster.resize_exact(target.width, target.height, FILTER)
}

/// Encode an image as JPEG. JPEG has no alpha channel, so the image
/// is flattened to RGB first.
pub fn encode_jpeg(raster: &DynamicImage, quality: u8) -> Result<Vec<u8>, ResizeError> {
    let rgb = raster.to_rgb8();
    let mut buffer = Vec::new();
    JpegEncoder::new_with_quality(&mut buffer, quality)
        .encode(rgb.as_raw(), rgb.width(), rgb.height(), ColorType::Rgb8)
        .map_err(|e| ResizeError::Encode(e.to_string()))?;
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageOutputFormat, Rgba, RgbaImage};
    use std::io::Cursor;

    fn dims(width: u32, height: u32) -> TargetDimensions {
        TargetDimensions { width, height }
    }

    fn png(width: u32, height: u32) -> Vec<u8> {
        let img = RgbaImage::from_fn(width, height, |x, y| {
            Rgba([(x % 256) as u8, (y % 256) as u8, 128, 200])
        });
        let mut buffer = Vec::new();
        DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut buffer), ImageOutputFormat::Png)
            .unwrap();
        buffer
    }

    fn resizer() -> Resizer {
        Resizer::new(&Settings::default()).unwrap()
    }

    #[test]
    fn landscape_is_bound_by_width() {
        assert_eq!(target_dimensions(1600, 900, 800, 600), dims(800, 450));
        assert_eq!(target_dimensions(4000, 3000, 800, 600), dims(800, 600));
        assert_eq!(target_dimensions(400, 100, 800, 600), dims(800, 200));
    }

    #[test]
    fn portrait_is_bound_by_height() {
        assert_eq!(target_dimensions(500, 1000, 800, 600), dims(300, 600));
        assert_eq!(target_dimensions(90, 160, 800, 600), dims(337, 600));
    }

    #[test]
    fn square_is_bound_by_height() {
        assert_eq!(target_dimensions(1000, 1000, 800, 600), dims(600, 600));
        assert_eq!(target_dimensions(1, 1, 800, 600), dims(600, 600));
    }

    #[test]
    fn scaled_side_is_truncated() {
        // 700 * 800 / 1201 = 466.27...
        assert_eq!(target_dimensions(1201, 700, 800, 600), dims(800, 466));
        // 599 * 600 / 1000 = 359.4
        assert_eq!(target_dimensions(599, 1000, 800, 600), dims(359, 600));
    }

    #[test]
    fn extreme_ratios_are_clamped_to_one_pixel() {
        assert_eq!(target_dimensions(100_000, 1, 800, 600), dims(800, 1));
        assert_eq!(target_dimensions(1, 100_000, 800, 600), dims(1, 600));
    }

    #[test]
    fn ratio_is_preserved_within_a_pixel() {
        for (w, h) in [(1920, 1080), (1234, 987), (333, 1999), (3000, 2999)] {
            let t = target_dimensions(w, h, 800, 600);
            if w > h {
                let exact = f64::from(h) * 800.0 / f64::from(w);
                assert!((f64::from(t.height) - exact).abs() <= 1.0);
            } else {
                let exact = f64::from(w) * 600.0 / f64::from(h);
                assert!((f64::from(t.width) - exact).abs() <= 1.0);
            }
        }
    }

    #[test]
    fn already_scaled_dimensions_are_a_fixed_point() {
        for (w, h) in [(1600, 900), (500, 1000), (1000, 1000), (1201, 700)] {
            let first = target_dimensions(w, h, 800, 600);
            let second = target_dimensions(first.width, first.height, 800, 600);
            assert!(first.width.abs_diff(second.width) <= 1);
            assert!(first.height.abs_diff(second.height) <= 1);
        }
    }

    #[test]
    fn output_decodes_to_target_dimensions() {
        let output = resizer().process(&png(160, 90)).unwrap();
        assert_eq!(output.source, dims(160, 90));
        assert_eq!(output.target, dims(800, 450));
        let decoded = image::load_from_memory(&output.bytes).unwrap();
        assert_eq!(decoded.dimensions(), (800, 450));
        assert_eq!(
            image::guess_format(&output.bytes).unwrap(),
            image::ImageFormat::Jpeg
        );
    }

    #[test]
    fn reprocessing_output_keeps_dimensions() {
        let first = resizer().process(&png(50, 100)).unwrap();
        assert_eq!(first.target, dims(300, 600));
        let second = resizer().process(&first.bytes).unwrap();
        assert_eq!(second.target, first.target);
    }

    #[test]
    fn non_image_is_unsupported() {
        let result = resizer().process(b"shopping list: eggs, milk");
        assert!(matches!(result, Err(ResizeError::UnsupportedFormat(_))));
    }

    #[test]
    fn resize_is_smooth() {
        // A hard black/white edge must produce intermediate values
        // when upsampled by an interpolating filter.
        let img = image::GrayImage::from_fn(4, 2, |x, _| {
            image::Luma([if x < 2 { 0 } else { 255 }])
        });
        let resized = resize(&DynamicImage::ImageLuma8(img), dims(40, 20)).to_luma8();
        assert!(resized.pixels().any(|p| p.0[0] > 20 && p.0[0] < 235));
    }

    #[test]
    fn quality_is_clamped() {
        let settings = Settings {
            jpeg_quality: 0,
            ..Settings::default()
        };
        assert_eq!(Resizer::new(&settings).unwrap().jpeg_quality, 1);
    }

    #[test]
    fn zero_bound_is_rejected() {
        let settings = Settings {
            target_width: 0,
            ..Settings::default()
        };
        assert!(Resizer::new(&settings).is_err());
    }
}
