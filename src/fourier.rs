//! 2D discrete Fourier transform plumbing.
//!
//! A 2D transform is a 1D pass over every row followed by a 1D pass over
//! every column. Intermediates use `Complex<f64>` so watermark round trips
//! are limited by 8-bit quantization, not by transform precision.

use rustfft::num_complex::Complex;
use rustfft::FftPlanner;

use image::RgbImage;

use crate::gray::GrayBuffer;

/// A complex frequency plane produced by [`fft2`].
#[derive(Debug, Clone)]
pub struct Spectrum {
    /// Row-major complex bins, length `width * height`.
    pub data: Vec<Complex<f64>>,
    /// Plane width.
    pub width: usize,
    /// Plane height.
    pub height: usize,
}

impl Spectrum {
    fn from_real(plane: &[f64], width: usize, height: usize) -> Self {
        Self {
            data: plane.iter().map(|&v| Complex::new(v, 0.0)).collect(),
            width,
            height,
        }
    }
}

/// Forward 2D DFT of a real plane.
#[must_use]
pub fn fft2(plane: &[f64], width: usize, height: usize) -> Spectrum {
    debug_assert_eq!(plane.len(), width * height);
    let mut spectrum = Spectrum::from_real(plane, width, height);
    transform_2d(&mut spectrum, false);
    spectrum
}

/// Inverse 2D DFT; returns the real parts, normalized by `width * height`.
#[must_use]
pub fn ifft2(spectrum: &Spectrum) -> Vec<f64> {
    let mut work = spectrum.clone();
    transform_2d(&mut work, true);
    #[allow(clippy::cast_precision_loss)]
    let norm = (work.width * work.height) as f64;
    work.data.iter().map(|c| c.re / norm).collect()
}

/// Inverse 2D DFT keeping the complex output, normalized by `width * height`.
#[must_use]
pub fn ifft2_complex(spectrum: &Spectrum) -> Vec<Complex<f64>> {
    let mut work = spectrum.clone();
    transform_2d(&mut work, true);
    #[allow(clippy::cast_precision_loss)]
    let norm = (work.width * work.height) as f64;
    work.data
        .iter()
        .map(|c| Complex::new(c.re / norm, c.im / norm))
        .collect()
}

fn transform_2d(spectrum: &mut Spectrum, inverse: bool) {
    let width = spectrum.width;
    let height = spectrum.height;
    let mut planner = FftPlanner::new();
    let row_fft = if inverse {
        planner.plan_fft_inverse(width)
    } else {
        planner.plan_fft_forward(width)
    };
    let col_fft = if inverse {
        planner.plan_fft_inverse(height)
    } else {
        planner.plan_fft_forward(height)
    };

    for row in spectrum.data.chunks_exact_mut(width) {
        row_fft.process(row);
    }

    let mut column = vec![Complex::new(0.0, 0.0); height];
    for x in 0..width {
        for y in 0..height {
            column[y] = spectrum.data[y * width + x];
        }
        col_fft.process(&mut column);
        for y in 0..height {
            spectrum.data[y * width + x] = column[y];
        }
    }
}

fn roll(spectrum: &Spectrum, shift_x: usize, shift_y: usize) -> Spectrum {
    let width = spectrum.width;
    let height = spectrum.height;
    let mut data = vec![Complex::new(0.0, 0.0); width * height];
    for y in 0..height {
        let ny = (y + shift_y) % height;
        for x in 0..width {
            let nx = (x + shift_x) % width;
            data[ny * width + nx] = spectrum.data[y * width + x];
        }
    }
    Spectrum {
        data,
        width,
        height,
    }
}

/// Move the zero-frequency bin to the centre of the plane.
#[must_use]
pub fn fftshift(spectrum: &Spectrum) -> Spectrum {
    roll(spectrum, spectrum.width / 2, spectrum.height / 2)
}

/// Undo [`fftshift`]; exact inverse for both even and odd dimensions.
#[must_use]
pub fn ifftshift(spectrum: &Spectrum) -> Spectrum {
    roll(
        spectrum,
        spectrum.width - spectrum.width / 2,
        spectrum.height - spectrum.height / 2,
    )
}

/// Split an RGB image into three `f64` channel planes.
#[must_use]
pub fn channel_planes(img: &RgbImage) -> [Vec<f64>; 3] {
    let len = (img.width() * img.height()) as usize;
    let mut planes = [
        Vec::with_capacity(len),
        Vec::with_capacity(len),
        Vec::with_capacity(len),
    ];
    for px in img.pixels() {
        for ch in 0..3 {
            planes[ch].push(f64::from(px[ch]));
        }
    }
    planes
}

/// Merge three `f64` channel planes into an RGB image, clipping to `[0, 255]`.
#[must_use]
pub fn merge_planes(planes: &[Vec<f64>; 3], width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        let i = (y * width + x) as usize;
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let q = |v: f64| v.round().clamp(0.0, 255.0) as u8;
        image::Rgb([q(planes[0][i]), q(planes[1][i]), q(planes[2][i])])
    })
}

/// Convert a gray plane to an `f64` vector for transforming.
#[must_use]
pub fn gray_to_f64(gray: &GrayBuffer) -> Vec<f64> {
    gray.data.iter().map(|&v| f64::from(v)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn forward_inverse_round_trip() {
        let width = 7;
        let height = 5;
        #[allow(clippy::cast_precision_loss)]
        let plane: Vec<f64> = (0..width * height).map(|i| (i % 13) as f64).collect();
        let spec = fft2(&plane, width, height);
        let back = ifft2(&spec);
        for (orig, rec) in plane.iter().zip(back.iter()) {
            assert_relative_eq!(orig, rec, epsilon = 1e-9);
        }
    }

    #[test]
    fn dc_bin_is_sum_of_samples() {
        let plane = vec![2.0; 4 * 4];
        let spec = fft2(&plane, 4, 4);
        assert_relative_eq!(spec.data[0].re, 32.0, epsilon = 1e-9);
        assert_relative_eq!(spec.data[0].im, 0.0, epsilon = 1e-9);
        // All other bins are zero for a constant input
        for bin in &spec.data[1..] {
            assert!(bin.norm() < 1e-9);
        }
    }

    #[test]
    fn shift_moves_dc_to_centre() {
        let plane = vec![1.0; 6 * 6];
        let spec = fft2(&plane, 6, 6);
        let shifted = fftshift(&spec);
        assert_relative_eq!(shifted.data[3 * 6 + 3].re, 36.0, epsilon = 1e-9);
    }

    #[test]
    fn ifftshift_inverts_fftshift_for_odd_sizes() {
        let width = 5;
        let height = 3;
        #[allow(clippy::cast_precision_loss)]
        let data: Vec<Complex<f64>> = (0..width * height)
            .map(|i| Complex::new(i as f64, -(i as f64)))
            .collect();
        let spec = Spectrum {
            data: data.clone(),
            width,
            height,
        };
        let round = ifftshift(&fftshift(&spec));
        assert_eq!(round.data, data);
    }

    #[test]
    fn transform_is_linear() {
        let width = 8;
        let height = 8;
        #[allow(clippy::cast_precision_loss)]
        let a: Vec<f64> = (0..64).map(|i| (i * 3 % 17) as f64).collect();
        #[allow(clippy::cast_precision_loss)]
        let b: Vec<f64> = (0..64).map(|i| (i * 7 % 11) as f64).collect();
        let sum: Vec<f64> = a.iter().zip(&b).map(|(x, y)| x + y).collect();

        let fa = fft2(&a, width, height);
        let fb = fft2(&b, width, height);
        let fsum = fft2(&sum, width, height);
        for i in 0..64 {
            assert_relative_eq!(fsum.data[i].re, fa.data[i].re + fb.data[i].re, epsilon = 1e-6);
            assert_relative_eq!(fsum.data[i].im, fa.data[i].im + fb.data[i].im, epsilon = 1e-6);
        }
    }
}
