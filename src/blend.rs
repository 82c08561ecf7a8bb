//! Gradient-mask blending of two images.

use std::str::FromStr;

use image::imageops::{self, FilterType};
use image::RgbImage;

use crate::error::Error;
use crate::gray::GrayBuffer;

/// Axis along which a gradient mask ramps from 0 to 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GradientDirection {
    /// Ramp left to right.
    Horizontal,
    /// Ramp top to bottom.
    Vertical,
    /// Ramp top-left to bottom-right.
    Diagonal,
}

impl FromStr for GradientDirection {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "horizontal" => Ok(Self::Horizontal),
            "vertical" => Ok(Self::Vertical),
            "diagonal" => Ok(Self::Diagonal),
            other => Err(Error::UnknownBlendMode(other.to_owned())),
        }
    }
}

impl std::fmt::Display for GradientDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Horizontal => "horizontal",
            Self::Vertical => "vertical",
            Self::Diagonal => "diagonal",
        })
    }
}

/// Shape of the transition between the two images.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlendCurve {
    /// Straight ramp.
    Linear,
    /// Logistic ramp over the input mapped to [-5, 5].
    Sigmoid,
    /// Raised-cosine ramp.
    Cosine,
}

impl FromStr for BlendCurve {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "linear" => Ok(Self::Linear),
            "sigmoid" => Ok(Self::Sigmoid),
            "cosine" => Ok(Self::Cosine),
            other => Err(Error::UnknownBlendMode(other.to_owned())),
        }
    }
}

impl std::fmt::Display for BlendCurve {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Linear => "linear",
            Self::Sigmoid => "sigmoid",
            Self::Cosine => "cosine",
        })
    }
}

fn shape(t: f32, curve: BlendCurve) -> f32 {
    match curve {
        BlendCurve::Linear => t,
        BlendCurve::Sigmoid => 1.0 / (1.0 + (-(10.0 * t - 5.0)).exp()),
        BlendCurve::Cosine => (1.0 - (std::f32::consts::PI * t).cos()) / 2.0,
    }
}

// Ramp position in [0, 1]; a single-sample axis stays at 0.
fn ramp(i: u32, len: u32) -> f32 {
    if len <= 1 {
        0.0
    } else {
        #[allow(clippy::cast_precision_loss)]
        {
            i as f32 / (len - 1) as f32
        }
    }
}

// Diagonal position `(x + y) / (width + height - 2)`; a 1x1 mask stays at 0.
fn diagonal_ramp(x: u32, y: u32, width: u32, height: u32) -> f32 {
    let span = width + height;
    if span <= 2 {
        0.0
    } else {
        #[allow(clippy::cast_precision_loss)]
        {
            (x + y) as f32 / (span - 2) as f32
        }
    }
}

/// Build a gradient mask, curve-shaped and scaled by `alpha`.
#[must_use]
pub fn gradient_mask(
    width: u32,
    height: u32,
    direction: GradientDirection,
    curve: BlendCurve,
    alpha: f32,
) -> GrayBuffer {
    let mut mask = GrayBuffer::new(width as usize, height as usize);
    for y in 0..height {
        for x in 0..width {
            let t = match direction {
                GradientDirection::Horizontal => ramp(x, width),
                GradientDirection::Vertical => ramp(y, height),
                GradientDirection::Diagonal => diagonal_ramp(x, y, width, height),
            };
            mask.set(x as usize, y as usize, shape(t, curve) * alpha);
        }
    }
    mask
}

/// Build a constant-valued mask with point overrides.
///
/// Overrides outside the mask bounds are ignored; all values are clamped
/// to [0, 1].
#[must_use]
pub fn custom_mask(width: u32, height: u32, base: f32, points: &[(u32, u32, f32)]) -> GrayBuffer {
    let mut mask = GrayBuffer::new(width as usize, height as usize);
    let base = base.clamp(0.0, 1.0);
    for v in &mut mask.data {
        *v = base;
    }
    for &(x, y, value) in points {
        if x < width && y < height {
            mask.set(x as usize, y as usize, value.clamp(0.0, 1.0));
        }
    }
    mask
}

/// Render a [0, 1] mask as an 8-bit image, scaling values by 255.
#[must_use]
pub fn render_mask(mask: &GrayBuffer) -> RgbImage {
    #[allow(clippy::cast_possible_truncation)]
    RgbImage::from_fn(mask.width as u32, mask.height as u32, |x, y| {
        let v = mask.get(x as usize, y as usize).clamp(0.0, 1.0) * 255.0;
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let v = v.round() as u8;
        image::Rgb([v, v, v])
    })
}

fn resize_to(img: &RgbImage, width: u32, height: u32) -> RgbImage {
    if img.dimensions() == (width, height) {
        img.clone()
    } else {
        imageops::resize(img, width, height, FilterType::Triangle)
    }
}

/// Blend two images under a per-pixel mask.
///
/// Both images are resized to the mask's dimensions. A mask value of 0
/// keeps the first image, 1 takes the second.
#[must_use]
pub fn blend_with_mask(first: &RgbImage, second: &RgbImage, mask: &GrayBuffer) -> RgbImage {
    #[allow(clippy::cast_possible_truncation)]
    let (width, height) = (mask.width as u32, mask.height as u32);
    let first = resize_to(first, width, height);
    let second = resize_to(second, width, height);

    RgbImage::from_fn(width, height, |x, y| {
        let m = mask.get(x as usize, y as usize).clamp(0.0, 1.0);
        let a = first.get_pixel(x, y).0;
        let b = second.get_pixel(x, y).0;
        let mut out = [0u8; 3];
        for c in 0..3 {
            let v = f32::from(a[c]) * (1.0 - m) + f32::from(b[c]) * m;
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            {
                out[c] = v.round().clamp(0.0, 255.0) as u8;
            }
        }
        image::Rgb(out)
    })
}

/// Blend two images along a gradient of the given direction and curve.
#[must_use]
pub fn blend_images(
    first: &RgbImage,
    second: &RgbImage,
    direction: GradientDirection,
    curve: BlendCurve,
    alpha: f32,
) -> RgbImage {
    let width = first.width().min(second.width());
    let height = first.height().min(second.height());
    let mask = gradient_mask(width, height, direction, curve, alpha);
    blend_with_mask(first, second, &mask)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn solid(width: u32, height: u32, value: u8) -> RgbImage {
        RgbImage::from_pixel(width, height, image::Rgb([value, value, value]))
    }

    #[test]
    fn direction_and_curve_parse() {
        assert_eq!(
            "horizontal".parse::<GradientDirection>().unwrap(),
            GradientDirection::Horizontal
        );
        assert_eq!("cosine".parse::<BlendCurve>().unwrap(), BlendCurve::Cosine);
        assert!("radial".parse::<GradientDirection>().is_err());
        assert!("ease".parse::<BlendCurve>().is_err());
    }

    #[test]
    fn horizontal_linear_blend_matches_ramp() {
        let white = solid(100, 100, 255);
        let black = solid(100, 100, 0);
        let out = blend_images(
            &white,
            &black,
            GradientDirection::Horizontal,
            BlendCurve::Linear,
            1.0,
        );
        for x in 0..100u32 {
            let expected = (255.0 * (1.0 - x as f32 / 99.0)).round() as u8;
            assert_eq!(out.get_pixel(x, 50).0[0], expected, "column {x}");
        }
    }

    #[test]
    fn vertical_blend_varies_down_rows() {
        let white = solid(40, 40, 255);
        let black = solid(40, 40, 0);
        let out = blend_images(
            &white,
            &black,
            GradientDirection::Vertical,
            BlendCurve::Linear,
            1.0,
        );
        assert_eq!(out.get_pixel(20, 0).0[0], 255);
        assert_eq!(out.get_pixel(20, 39).0[0], 0);
        assert_eq!(out.get_pixel(0, 20).0[0], out.get_pixel(39, 20).0[0]);
    }

    #[test]
    fn alpha_limits_how_far_the_blend_goes() {
        let white = solid(50, 50, 255);
        let black = solid(50, 50, 0);
        let out = blend_images(
            &white,
            &black,
            GradientDirection::Horizontal,
            BlendCurve::Linear,
            0.5,
        );
        // The right edge only reaches half-way toward the second image.
        assert_eq!(out.get_pixel(49, 25).0[0], 128);
    }

    #[test]
    fn single_column_gradient_is_constant_zero() {
        let mask = gradient_mask(1, 10, GradientDirection::Horizontal, BlendCurve::Linear, 1.0);
        for y in 0..10 {
            assert_relative_eq!(mask.get(0, y), 0.0);
        }
    }

    #[test]
    fn cosine_curve_is_symmetric_about_midpoint() {
        assert_relative_eq!(shape(0.0, BlendCurve::Cosine), 0.0, epsilon = 1e-6);
        assert_relative_eq!(shape(1.0, BlendCurve::Cosine), 1.0, epsilon = 1e-6);
        assert_relative_eq!(shape(0.5, BlendCurve::Cosine), 0.5, epsilon = 1e-6);
        let lo = shape(0.25, BlendCurve::Cosine);
        let hi = shape(0.75, BlendCurve::Cosine);
        assert_relative_eq!(lo + hi, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn sigmoid_curve_is_steep_in_the_middle() {
        let quarter = shape(0.25, BlendCurve::Sigmoid);
        let mid = shape(0.5, BlendCurve::Sigmoid);
        assert_relative_eq!(mid, 0.5, epsilon = 1e-6);
        assert!(quarter < 0.1, "sigmoid quarter point {quarter} too high");
    }

    #[test]
    fn mismatched_sizes_resize_to_common_dimensions() {
        let a = solid(80, 40, 255);
        let b = solid(40, 80, 0);
        let out = blend_images(
            &a,
            &b,
            GradientDirection::Diagonal,
            BlendCurve::Linear,
            1.0,
        );
        assert_eq!(out.dimensions(), (40, 40));
    }

    #[test]
    fn wider_second_image_is_resized_not_cropped() {
        let narrow = solid(2, 2, 0);
        // Left half black, right half white.
        let wide = RgbImage::from_fn(4, 2, |x, _| {
            image::Rgb(if x < 2 { [0, 0, 0] } else { [255, 255, 255] })
        });
        let out = blend_images(
            &narrow,
            &wide,
            GradientDirection::Horizontal,
            BlendCurve::Linear,
            1.0,
        );
        assert_eq!(out.dimensions(), (2, 2));
        // At x=1 the mask is fully the second image; resizing keeps its
        // bright right half there, which cropping would have discarded.
        assert!(out.get_pixel(1, 0).0[0] > 128, "got {:?}", out.get_pixel(1, 0).0);
    }

    #[test]
    fn diagonal_ramp_spans_the_corner_sum() {
        let mask = gradient_mask(3, 2, GradientDirection::Diagonal, BlendCurve::Linear, 1.0);
        assert_relative_eq!(mask.get(0, 0), 0.0);
        assert_relative_eq!(mask.get(2, 0), 2.0 / 3.0, epsilon = 1e-6);
        assert_relative_eq!(mask.get(0, 1), 1.0 / 3.0, epsilon = 1e-6);
        assert_relative_eq!(mask.get(2, 1), 1.0, epsilon = 1e-6);
    }

    #[test]
    fn render_mask_scales_to_eight_bit() {
        let mask = custom_mask(4, 1, 0.5, &[(0, 0, 0.0), (3, 0, 1.0)]);
        let img = render_mask(&mask);
        assert_eq!(img.dimensions(), (4, 1));
        assert_eq!(img.get_pixel(0, 0).0, [0, 0, 0]);
        assert_eq!(img.get_pixel(1, 0).0, [128, 128, 128]);
        assert_eq!(img.get_pixel(3, 0).0, [255, 255, 255]);
    }

    #[test]
    fn custom_mask_applies_point_overrides() {
        let mask = custom_mask(10, 10, 0.0, &[(3, 4, 1.0), (99, 0, 1.0)]);
        assert_relative_eq!(mask.get(3, 4), 1.0);
        assert_relative_eq!(mask.get(0, 0), 0.0);

        let white = solid(10, 10, 255);
        let black = solid(10, 10, 0);
        let out = blend_with_mask(&white, &black, &mask);
        assert_eq!(out.get_pixel(3, 4).0, [0, 0, 0]);
        assert_eq!(out.get_pixel(0, 0).0, [255, 255, 255]);
    }
}
