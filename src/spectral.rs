//! Frequency-domain filtering with radial masks.

use std::str::FromStr;

use image::RgbImage;
use rustfft::num_complex::Complex;

use crate::error::Error;
use crate::fourier::{fft2, fftshift, gray_to_f64, ifft2_complex, ifftshift, Spectrum};
use crate::gray::GrayBuffer;

/// Width of the band kept by [`FrequencyFilter::Bandpass`], on each side of
/// the cutoff radius.
const BAND_HALF_WIDTH: f64 = 10.0;

/// Radial frequency filter families.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrequencyFilter {
    /// Keep frequencies within the cutoff radius (`d <= cutoff`).
    Lowpass,
    /// Keep frequencies beyond the cutoff radius (`d > cutoff`).
    Highpass,
    /// Keep a ring `[cutoff - 10, cutoff + 10]`.
    Bandpass,
}

impl FromStr for FrequencyFilter {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "lowpass" => Ok(Self::Lowpass),
            "highpass" => Ok(Self::Highpass),
            "bandpass" => Ok(Self::Bandpass),
            other => Err(Error::UnknownMethod(other.to_string())),
        }
    }
}

impl std::fmt::Display for FrequencyFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Lowpass => "lowpass",
            Self::Highpass => "highpass",
            Self::Bandpass => "bandpass",
        })
    }
}

impl FrequencyFilter {
    /// Whether the frequency bin at distance `d` from the centre is kept.
    ///
    /// Lowpass claims the exact boundary (`d == cutoff`), highpass does not,
    /// so the two masks partition the plane at every radius.
    #[inline]
    #[must_use]
    pub fn keeps(self, d: f64, cutoff: f64) -> bool {
        match self {
            Self::Lowpass => d <= cutoff,
            Self::Highpass => d > cutoff,
            Self::Bandpass => d >= cutoff - BAND_HALF_WIDTH && d <= cutoff + BAND_HALF_WIDTH,
        }
    }
}

/// Build the binary radial mask for a centred spectrum.
#[must_use]
pub fn radial_mask(width: usize, height: usize, filter: FrequencyFilter, cutoff: f64) -> Vec<bool> {
    let ccol = width / 2;
    let crow = height / 2;
    let mut mask = Vec::with_capacity(width * height);
    for y in 0..height {
        for x in 0..width {
            #[allow(clippy::cast_precision_loss)]
            let dx = x as f64 - ccol as f64;
            #[allow(clippy::cast_precision_loss)]
            let dy = y as f64 - crow as f64;
            mask.push(filter.keeps(dx.hypot(dy), cutoff));
        }
    }
    mask
}

/// Apply a radial frequency filter to the luma of an image.
///
/// The image is converted to grayscale, transformed, shifted so the zero
/// frequency sits at the centre, masked, inverse-shifted and inverse
/// transformed. The magnitude of the reconstruction is min-max normalized to
/// `[0, 255]` and replicated to three channels.
#[must_use]
pub fn apply_frequency_filter(img: &RgbImage, filter: FrequencyFilter, cutoff: f64) -> RgbImage {
    let gray = GrayBuffer::from_luma(img);
    let width = gray.width;
    let height = gray.height;

    let spectrum = fftshift(&fft2(&gray_to_f64(&gray), width, height));
    let mask = radial_mask(width, height, filter, cutoff);

    let masked = Spectrum {
        data: spectrum
            .data
            .iter()
            .zip(mask.iter())
            .map(|(&bin, &keep)| if keep { bin } else { Complex::new(0.0, 0.0) })
            .collect(),
        width,
        height,
    };

    let reconstruction = ifft2_complex(&ifftshift(&masked));

    let mut out = GrayBuffer::new(width, height);
    for (dst, src) in out.data.iter_mut().zip(reconstruction.iter()) {
        #[allow(clippy::cast_possible_truncation)]
        {
            *dst = src.norm() as f32;
        }
    }
    out.normalize_minmax();
    out.to_rgb()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_names_parse() {
        assert_eq!(
            "lowpass".parse::<FrequencyFilter>().unwrap(),
            FrequencyFilter::Lowpass
        );
        assert_eq!(
            "bandpass".parse::<FrequencyFilter>().unwrap(),
            FrequencyFilter::Bandpass
        );
        assert!(matches!(
            "notch".parse::<FrequencyFilter>(),
            Err(Error::UnknownMethod(_))
        ));
    }

    #[test]
    fn lowpass_and_highpass_partition_the_plane() {
        let cutoff = 12.0;
        let low = radial_mask(64, 48, FrequencyFilter::Lowpass, cutoff);
        let high = radial_mask(64, 48, FrequencyFilter::Highpass, cutoff);
        for (l, h) in low.iter().zip(high.iter()) {
            assert!(l ^ h, "each bin must be claimed by exactly one mask");
        }
    }

    #[test]
    fn boundary_bin_belongs_to_lowpass() {
        assert!(FrequencyFilter::Lowpass.keeps(30.0, 30.0));
        assert!(!FrequencyFilter::Highpass.keeps(30.0, 30.0));
        assert!(FrequencyFilter::Highpass.keeps(30.0 + 1e-9, 30.0));
    }

    #[test]
    fn bandpass_keeps_only_the_ring() {
        let cutoff = 30.0;
        assert!(FrequencyFilter::Bandpass.keeps(20.0, cutoff));
        assert!(FrequencyFilter::Bandpass.keeps(40.0, cutoff));
        assert!(!FrequencyFilter::Bandpass.keeps(19.9, cutoff));
        assert!(!FrequencyFilter::Bandpass.keeps(40.1, cutoff));
    }

    #[test]
    fn lowpass_of_constant_image_stays_constant_shape() {
        let img = RgbImage::from_pixel(32, 32, image::Rgb([180, 180, 180]));
        let out = apply_frequency_filter(&img, FrequencyFilter::Lowpass, 10.0);
        assert_eq!(out.dimensions(), (32, 32));
        for px in out.pixels() {
            assert_eq!(px[0], px[1]);
            assert_eq!(px[1], px[2]);
        }
    }

    #[test]
    fn highpass_removes_the_dc_component() {
        // A constant image is pure DC; a highpass reconstruction is all zero
        // magnitude, which min-max normalizes to black.
        let img = RgbImage::from_pixel(16, 16, image::Rgb([200, 200, 200]));
        let out = apply_frequency_filter(&img, FrequencyFilter::Highpass, 5.0);
        assert!(out.pixels().all(|px| px[0] == 0));
    }

    #[test]
    fn deterministic_for_identical_inputs() {
        let img = RgbImage::from_fn(24, 24, |x, y| {
            #[allow(clippy::cast_possible_truncation)]
            image::Rgb([((x * y) % 256) as u8, 0, 0])
        });
        let a = apply_frequency_filter(&img, FrequencyFilter::Bandpass, 8.0);
        let b = apply_frequency_filter(&img, FrequencyFilter::Bandpass, 8.0);
        assert_eq!(a, b);
    }
}
