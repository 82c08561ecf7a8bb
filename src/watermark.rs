//! Watermark embedding and extraction.
//!
//! The invisible scheme superposes the watermark in the frequency domain:
//! `F(marked) = F(main) + alpha * F(mark)` per color channel. Because the
//! transform is linear this is equivalent to a faint spatial overlay, but
//! extraction works on the frequency difference and therefore recovers the
//! watermark even after the superposition has been mixed into every pixel.

use std::str::FromStr;

use image::imageops::{self, FilterType};
use image::RgbImage;

use crate::edges::{canny, CANNY_HIGH, CANNY_LOW};
use crate::error::Error;
use crate::fourier::{channel_planes, fft2, ifft2, merge_planes, Spectrum};
use crate::gray::GrayBuffer;

/// How to recover a watermark from a marked image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionMethod {
    /// Frequency-domain difference against the original.
    Fourier,
    /// Difference of Canny edge maps.
    Edge,
}

impl FromStr for ExtractionMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fourier" => Ok(Self::Fourier),
            "edge" => Ok(Self::Edge),
            other => Err(Error::UnknownMethod(other.to_string())),
        }
    }
}

impl std::fmt::Display for ExtractionMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Fourier => "fourier",
            Self::Edge => "edge",
        })
    }
}

fn resize_to(img: &RgbImage, width: u32, height: u32) -> RgbImage {
    if img.dimensions() == (width, height) {
        img.clone()
    } else {
        imageops::resize(img, width, height, FilterType::Triangle)
    }
}

/// Embed a watermark invisibly via per-channel frequency superposition.
///
/// The watermark is resized to the main image's dimensions; `alpha` in
/// `[0, 1]` trades visibility against fragility. Output pixels are the real
/// part of the inverse transform, clipped to `[0, 255]`.
#[must_use]
pub fn embed_invisible(main: &RgbImage, mark: &RgbImage, alpha: f64) -> RgbImage {
    let width = main.width() as usize;
    let height = main.height() as usize;
    let mark = resize_to(mark, main.width(), main.height());

    let main_planes = channel_planes(main);
    let mark_planes = channel_planes(&mark);

    let mut out_planes: [Vec<f64>; 3] = [Vec::new(), Vec::new(), Vec::new()];
    for ch in 0..3 {
        let main_fft = fft2(&main_planes[ch], width, height);
        let mark_fft = fft2(&mark_planes[ch], width, height);

        let combined = Spectrum {
            data: main_fft
                .data
                .iter()
                .zip(mark_fft.data.iter())
                .map(|(&m, &w)| m + w * alpha)
                .collect(),
            width,
            height,
        };
        out_planes[ch] = ifft2(&combined);
    }

    merge_planes(&out_planes, main.width(), main.height())
}

/// Stamp a visible edge-based watermark onto the main image.
///
/// The watermark is resized, converted to luma, and run through Canny with
/// the fixed (50, 150) thresholds; the edge map is replicated to all three
/// channels and added with weight `edge_opacity / 100`.
#[must_use]
pub fn apply_visible(main: &RgbImage, mark: &RgbImage, edge_opacity: u8) -> RgbImage {
    let mark = resize_to(mark, main.width(), main.height());
    let edges = canny(&GrayBuffer::from_luma(&mark), CANNY_LOW, CANNY_HIGH);
    let weight = f32::from(edge_opacity) / 100.0;

    let width = main.width() as usize;
    RgbImage::from_fn(main.width(), main.height(), |x, y| {
        let edge = edges.data[y as usize * width + x as usize];
        let px = main.get_pixel(x, y);
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let q = |v: f32| v.round().clamp(0.0, 255.0) as u8;
        image::Rgb([
            q(f32::from(px[0]) + weight * edge),
            q(f32::from(px[1]) + weight * edge),
            q(f32::from(px[2]) + weight * edge),
        ])
    })
}

/// Recover an embedded watermark from a marked image.
///
/// `Fourier` subtracts the original from the marked image in the frequency
/// domain and inverse-transforms the difference; this approximates
/// `alpha * mark` up to the clipping and rounding applied at embed time.
/// `Edge` subtracts Canny edge maps with saturation.
///
/// Both images must share dimensions; the marked image is resized to the
/// original's dimensions if they differ.
#[must_use]
pub fn extract(original: &RgbImage, marked: &RgbImage, method: ExtractionMethod) -> RgbImage {
    let marked = resize_to(marked, original.width(), original.height());
    match method {
        ExtractionMethod::Fourier => extract_fourier(original, &marked),
        ExtractionMethod::Edge => extract_edge(original, &marked),
    }
}

fn extract_fourier(original: &RgbImage, marked: &RgbImage) -> RgbImage {
    let width = original.width() as usize;
    let height = original.height() as usize;

    let orig_planes = channel_planes(original);
    let marked_planes = channel_planes(marked);

    let mut out_planes: [Vec<f64>; 3] = [Vec::new(), Vec::new(), Vec::new()];
    for ch in 0..3 {
        let orig_fft = fft2(&orig_planes[ch], width, height);
        let marked_fft = fft2(&marked_planes[ch], width, height);

        let difference = Spectrum {
            data: marked_fft
                .data
                .iter()
                .zip(orig_fft.data.iter())
                .map(|(&m, &o)| m - o)
                .collect(),
            width,
            height,
        };
        out_planes[ch] = ifft2(&difference);
    }

    merge_planes(&out_planes, original.width(), original.height())
}

fn extract_edge(original: &RgbImage, marked: &RgbImage) -> RgbImage {
    let orig_edges = canny(&GrayBuffer::from_luma(original), CANNY_LOW, CANNY_HIGH);
    let marked_edges = canny(&GrayBuffer::from_luma(marked), CANNY_LOW, CANNY_HIGH);

    let mut diff = GrayBuffer::new(orig_edges.width, orig_edges.height);
    for i in 0..diff.data.len() {
        diff.data[i] = (marked_edges.data[i] - orig_edges.data[i]).max(0.0);
    }
    diff.to_rgb()
}
