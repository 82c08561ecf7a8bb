//! Image file loading and saving.
//!
//! The transform modules are path-agnostic; this module is the single seam
//! where file extensions are checked, pixels are decoded, and results are
//! encoded.

use std::path::Path;

use image::{DynamicImage, ImageFormat, RgbImage};

use crate::error::{Error, Result};

/// Check if a file has a supported image extension.
///
/// Accepted: `.jpg .jpeg .png .bmp .tiff` (case-insensitive).
#[must_use]
pub fn is_supported_image(path: &Path) -> bool {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => matches!(
            ext.to_lowercase().as_str(),
            "jpg" | "jpeg" | "png" | "bmp" | "tiff"
        ),
        None => false,
    }
}

/// Load an image file into an RGB pixel matrix.
///
/// # Errors
///
/// Returns [`Error::InvalidImage`] when the file is missing, has an
/// unsupported extension, or fails to decode.
pub fn load_image(path: &Path) -> Result<RgbImage> {
    if !path.exists() {
        return Err(Error::InvalidImage {
            path: path.to_path_buf(),
            reason: "file does not exist".to_string(),
        });
    }
    if !is_supported_image(path) {
        return Err(Error::InvalidImage {
            path: path.to_path_buf(),
            reason: "unsupported extension (expected .jpg .jpeg .png .bmp .tiff)".to_string(),
        });
    }
    let img = image::open(path).map_err(|e| Error::InvalidImage {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    Ok(img.to_rgb8())
}

/// Save an RGB image with format-specific quality settings.
///
/// JPEG is written at quality 100; the remaining supported formats go
/// through the default encoder.
///
/// # Errors
///
/// Returns an error if the format is unsupported or writing fails.
pub fn save_image(img: &RgbImage, path: &Path) -> Result<()> {
    let format =
        ImageFormat::from_path(path).map_err(|e| Error::UnsupportedFormat(e.to_string()))?;

    match format {
        ImageFormat::Jpeg => {
            let file = std::fs::File::create(path)?;
            let mut encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(file, 100);
            encoder.encode_image(&DynamicImage::ImageRgb8(img.clone()))?;
        }
        ImageFormat::Png | ImageFormat::Bmp | ImageFormat::Tiff => {
            img.save(path)?;
        }
        _ => {
            return Err(Error::UnsupportedFormat(format!("{format:?}")));
        }
    }

    Ok(())
}

/// Basic numeric summary of a decoded image.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageInfo {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Channel count (always 3 for RGB storage).
    pub channels: u8,
    /// Mean intensity over all samples.
    pub mean_intensity: f64,
    /// Standard deviation over all samples.
    pub std_intensity: f64,
}

/// Compute dimensions and intensity statistics for an image.
#[must_use]
pub fn image_info(img: &RgbImage) -> ImageInfo {
    let samples: Vec<f64> = img
        .pixels()
        .flat_map(|px| px.0.iter().map(|&v| f64::from(v)))
        .collect();
    #[allow(clippy::cast_precision_loss)]
    let n = samples.len() as f64;
    let mean = samples.iter().sum::<f64>() / n;
    let variance = samples.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;

    ImageInfo {
        width: img.width(),
        height: img.height(),
        channels: 3,
        mean_intensity: mean,
        std_intensity: variance.sqrt(),
    }
}
