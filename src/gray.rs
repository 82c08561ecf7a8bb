//! Single-channel float working buffer.
//!
//! Every analysis path that operates "on grayscale" in this crate converts
//! the RGB input once into a [`GrayBuffer`] and works in `f32` until the
//! final quantization back to 8-bit.

use image::RgbImage;

/// A single-channel image plane with `f32` samples, row-major.
#[derive(Debug, Clone)]
pub struct GrayBuffer {
    /// Flat sample storage, length `width * height`.
    pub data: Vec<f32>,
    /// Width in pixels.
    pub width: usize,
    /// Height in pixels.
    pub height: usize,
}

impl GrayBuffer {
    /// Create a zero-filled buffer.
    #[must_use]
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            data: vec![0.0; width * height],
            width,
            height,
        }
    }

    /// Sample at `(x, y)` without bounds checking beyond the slice index.
    #[inline]
    #[must_use]
    pub fn get(&self, x: usize, y: usize) -> f32 {
        self.data[y * self.width + x]
    }

    /// Write the sample at `(x, y)`.
    #[inline]
    pub fn set(&mut self, x: usize, y: usize, value: f32) {
        self.data[y * self.width + x] = value;
    }

    /// Sample at signed coordinates with border replication.
    ///
    /// Out-of-range coordinates are clamped to the nearest edge pixel, so
    /// convolutions keep the output size equal to the input size.
    #[inline]
    #[must_use]
    pub fn get_replicate(&self, x: isize, y: isize) -> f32 {
        #[allow(clippy::cast_possible_wrap, clippy::cast_sign_loss)]
        let cx = x.clamp(0, self.width as isize - 1) as usize;
        #[allow(clippy::cast_possible_wrap, clippy::cast_sign_loss)]
        let cy = y.clamp(0, self.height as isize - 1) as usize;
        self.data[cy * self.width + cx]
    }

    /// Convert an RGB image to luma using `0.299*R + 0.587*G + 0.114*B`.
    ///
    /// Samples stay in the `[0, 255]` range.
    #[must_use]
    pub fn from_luma(img: &RgbImage) -> Self {
        let width = img.width() as usize;
        let height = img.height() as usize;
        let mut data = Vec::with_capacity(width * height);
        for px in img.pixels() {
            let lum =
                0.299 * f32::from(px[0]) + 0.587 * f32::from(px[1]) + 0.114 * f32::from(px[2]);
            data.push(lum);
        }
        Self {
            data,
            width,
            height,
        }
    }

    /// Quantize to 8-bit and replicate into all three channels of an RGB
    /// container (grayscale visually, 3-channel storage).
    #[must_use]
    pub fn to_rgb(&self) -> RgbImage {
        #[allow(clippy::cast_possible_truncation)]
        RgbImage::from_fn(self.width as u32, self.height as u32, |x, y| {
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let v = self.get(x as usize, y as usize).round().clamp(0.0, 255.0) as u8;
            image::Rgb([v, v, v])
        })
    }

    /// Rescale samples so the minimum maps to 0 and the maximum to 255.
    ///
    /// A constant buffer (max == min) maps to all zeros.
    pub fn normalize_minmax(&mut self) {
        let mut min = f32::INFINITY;
        let mut max = f32::NEG_INFINITY;
        for &v in &self.data {
            min = min.min(v);
            max = max.max(v);
        }
        let range = max - min;
        if range <= f32::EPSILON {
            self.data.fill(0.0);
            return;
        }
        for v in &mut self.data {
            *v = (*v - min) / range * 255.0;
        }
    }
}
