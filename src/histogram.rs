//! Histogram equalization, matching, and channel statistics.
//!
//! Tonal adjustments run in a luma/chroma space so color is preserved:
//! global equalization touches only the Y channel of YUV, CLAHE only the L
//! channel of Lab, and matching remaps all three Lab channels.

use std::str::FromStr;

use image::imageops::{self, FilterType};
use image::RgbImage;

use crate::color::{lab_planes_to_rgb, rgb_to_lab_planes, rgb_to_yuv_planes, yuv_planes_to_rgb};
use crate::error::Error;
use crate::gray::GrayBuffer;

/// CLAHE tile grid: 8x8 tiles.
const CLAHE_GRID: usize = 8;
/// CLAHE contrast clip limit, scaled by tile area / 256 before use.
const CLAHE_CLIP_LIMIT: f64 = 2.0;

/// Histogram equalization strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EqualizeMethod {
    /// Classic global equalization of the luma channel.
    Global,
    /// Contrast-limited adaptive equalization of the lightness channel.
    Clahe,
}

impl FromStr for EqualizeMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "global" => Ok(Self::Global),
            "clahe" => Ok(Self::Clahe),
            other => Err(Error::UnknownMethod(other.to_string())),
        }
    }
}

impl std::fmt::Display for EqualizeMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Global => "global",
            Self::Clahe => "clahe",
        })
    }
}

#[inline]
fn bin_of(v: f32) -> usize {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    {
        v.round().clamp(0.0, 255.0) as usize
    }
}

/// 256-bin histogram of a float plane quantized to 8 bits.
#[must_use]
pub fn histogram_256(plane: &GrayBuffer) -> [u32; 256] {
    let mut hist = [0u32; 256];
    for &v in &plane.data {
        hist[bin_of(v)] += 1;
    }
    hist
}

/// Normalized cumulative distribution of a histogram.
///
/// Monotonically non-decreasing, last entry 1.0 (all zeros for an empty
/// histogram).
#[must_use]
pub fn cdf_normalized(hist: &[u32; 256]) -> [f64; 256] {
    let total: u64 = hist.iter().map(|&c| u64::from(c)).sum();
    let mut cdf = [0.0f64; 256];
    if total == 0 {
        return cdf;
    }
    let mut running = 0u64;
    #[allow(clippy::cast_precision_loss)]
    for (i, &count) in hist.iter().enumerate() {
        running += u64::from(count);
        cdf[i] = running as f64 / total as f64;
    }
    cdf
}

/// Lookup table mapping each source level to the reference level whose CDF
/// value is closest (first minimum wins on ties).
#[must_use]
pub fn matching_lut(source_cdf: &[f64; 256], reference_cdf: &[f64; 256]) -> [u8; 256] {
    let mut lut = [0u8; 256];
    for (i, &sc) in source_cdf.iter().enumerate() {
        let mut best = 0usize;
        let mut best_diff = f64::INFINITY;
        for (j, &rc) in reference_cdf.iter().enumerate() {
            let diff = (rc - sc).abs();
            if diff < best_diff {
                best_diff = diff;
                best = j;
            }
        }
        #[allow(clippy::cast_possible_truncation)]
        {
            lut[i] = best as u8;
        }
    }
    lut
}

/// Classic histogram equalization LUT: `(cdf - cdf_min) / (n - cdf_min)`.
///
/// A constant plane maps to itself (identity LUT).
#[must_use]
pub fn equalization_lut(hist: &[u32; 256]) -> [u8; 256] {
    let total: u64 = hist.iter().map(|&c| u64::from(c)).sum();
    let mut identity = [0u8; 256];
    for (i, v) in identity.iter_mut().enumerate() {
        #[allow(clippy::cast_possible_truncation)]
        {
            *v = i as u8;
        }
    }
    let cdf_min = match hist.iter().position(|&c| c > 0) {
        Some(first) => {
            let mut running = 0u64;
            for &c in &hist[..=first] {
                running += u64::from(c);
            }
            running
        }
        None => return identity,
    };
    if total == cdf_min {
        // Single occupied bin: nothing to redistribute.
        return identity;
    }

    let mut lut = [0u8; 256];
    let mut running = 0u64;
    #[allow(clippy::cast_precision_loss)]
    let denom = (total - cdf_min) as f64;
    for (i, &count) in hist.iter().enumerate() {
        running += u64::from(count);
        #[allow(clippy::cast_precision_loss)]
        let scaled = (running.saturating_sub(cdf_min)) as f64 / denom * 255.0;
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        {
            lut[i] = scaled.round().clamp(0.0, 255.0) as u8;
        }
    }
    lut
}

fn apply_lut(plane: &mut GrayBuffer, lut: &[u8; 256]) {
    for v in &mut plane.data {
        *v = f32::from(lut[bin_of(*v)]);
    }
}

// Snap every sample to its 8-bit level so LUT lookups are exact.
fn quantize_plane(plane: &mut GrayBuffer) {
    for v in &mut plane.data {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        {
            *v = f32::from(v.round().clamp(0.0, 255.0) as u8);
        }
    }
}

/// Equalize an image's tonal distribution.
///
/// Spatial dimensions are preserved; chroma channels are untouched.
#[must_use]
pub fn equalize(img: &RgbImage, method: EqualizeMethod) -> RgbImage {
    match method {
        EqualizeMethod::Global => {
            let mut planes = rgb_to_yuv_planes(img);
            let lut = equalization_lut(&histogram_256(&planes[0]));
            apply_lut(&mut planes[0], &lut);
            yuv_planes_to_rgb(&planes)
        }
        EqualizeMethod::Clahe => {
            let mut planes = rgb_to_lab_planes(img);
            planes[0] = clahe(&planes[0]);
            lab_planes_to_rgb(&planes)
        }
    }
}

/// Contrast-limited adaptive histogram equalization over an 8x8 tile grid.
///
/// Each tile gets a clipped-histogram equalization LUT; output samples are
/// bilinearly interpolated between the four surrounding tile LUTs so tile
/// seams are invisible.
#[must_use]
pub fn clahe(plane: &GrayBuffer) -> GrayBuffer {
    let width = plane.width;
    let height = plane.height;
    let grid_x = CLAHE_GRID.min(width.max(1));
    let grid_y = CLAHE_GRID.min(height.max(1));

    // Tile boundaries (last tile absorbs the remainder).
    let tile_w = width.div_ceil(grid_x);
    let tile_h = height.div_ceil(grid_y);

    let mut luts: Vec<[u8; 256]> = Vec::with_capacity(grid_x * grid_y);
    for ty in 0..grid_y {
        for tx in 0..grid_x {
            let x0 = tx * tile_w;
            let y0 = ty * tile_h;
            let x1 = (x0 + tile_w).min(width);
            let y1 = (y0 + tile_h).min(height);

            let mut hist = [0u32; 256];
            for y in y0..y1 {
                for x in x0..x1 {
                    hist[bin_of(plane.get(x, y))] += 1;
                }
            }
            luts.push(clipped_equalization_lut(&hist));
        }
    }

    // Bilinear interpolation between tile-centre LUTs.
    let mut out = GrayBuffer::new(width, height);
    #[allow(clippy::cast_precision_loss)]
    let (tile_wf, tile_hf) = (tile_w as f32, tile_h as f32);
    for y in 0..height {
        for x in 0..width {
            #[allow(clippy::cast_precision_loss)]
            let gx = (x as f32 - tile_wf / 2.0) / tile_wf;
            #[allow(clippy::cast_precision_loss)]
            let gy = (y as f32 - tile_hf / 2.0) / tile_hf;

            let tx0 = gx.floor().max(0.0);
            let ty0 = gy.floor().max(0.0);
            let fx = (gx - tx0).clamp(0.0, 1.0);
            let fy = (gy - ty0).clamp(0.0, 1.0);

            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let tx0 = (tx0 as usize).min(grid_x - 1);
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let ty0 = (ty0 as usize).min(grid_y - 1);
            let tx1 = (tx0 + 1).min(grid_x - 1);
            let ty1 = (ty0 + 1).min(grid_y - 1);

            let bin = bin_of(plane.get(x, y));
            let v00 = f32::from(luts[ty0 * grid_x + tx0][bin]);
            let v10 = f32::from(luts[ty0 * grid_x + tx1][bin]);
            let v01 = f32::from(luts[ty1 * grid_x + tx0][bin]);
            let v11 = f32::from(luts[ty1 * grid_x + tx1][bin]);

            let top = v00 * (1.0 - fx) + v10 * fx;
            let bottom = v01 * (1.0 - fx) + v11 * fx;
            out.set(x, y, top * (1.0 - fy) + bottom * fy);
        }
    }
    out
}

/// Equalization LUT from a histogram clipped at the CLAHE limit, with the
/// clipped excess redistributed uniformly.
fn clipped_equalization_lut(hist: &[u32; 256]) -> [u8; 256] {
    let total: u64 = hist.iter().map(|&c| u64::from(c)).sum();
    if total == 0 {
        let mut identity = [0u8; 256];
        for (i, v) in identity.iter_mut().enumerate() {
            #[allow(clippy::cast_possible_truncation)]
            {
                *v = i as u8;
            }
        }
        return identity;
    }

    #[allow(clippy::cast_precision_loss)]
    let limit = ((CLAHE_CLIP_LIMIT * total as f64 / 256.0).max(1.0)) as u64;
    let mut clipped = [0u64; 256];
    let mut excess = 0u64;
    for (i, &count) in hist.iter().enumerate() {
        let c = u64::from(count);
        if c > limit {
            clipped[i] = limit;
            excess += c - limit;
        } else {
            clipped[i] = c;
        }
    }
    let share = excess / 256;
    let mut remainder = excess % 256;
    for c in &mut clipped {
        *c += share;
        if remainder > 0 {
            *c += 1;
            remainder -= 1;
        }
    }

    let mut lut = [0u8; 256];
    let mut running = 0u64;
    #[allow(clippy::cast_precision_loss)]
    let totalf = total as f64;
    for (i, &count) in clipped.iter().enumerate() {
        running += count;
        #[allow(clippy::cast_precision_loss)]
        let scaled = running as f64 / totalf * 255.0;
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        {
            lut[i] = scaled.round().clamp(0.0, 255.0) as u8;
        }
    }
    lut
}

/// Remap the source image's tonal distribution onto the reference's.
///
/// The reference is resized to the source dimensions and both are converted
/// to 8-bit Lab; each of the three channels is remapped through its
/// CDF-matching LUT independently. Matching an image against itself leaves
/// the Lab planes untouched.
#[must_use]
pub fn match_histograms(source: &RgbImage, reference: &RgbImage) -> RgbImage {
    let reference = if reference.dimensions() == source.dimensions() {
        reference.clone()
    } else {
        imageops::resize(
            reference,
            source.width(),
            source.height(),
            FilterType::Triangle,
        )
    };

    let mut src_planes = rgb_to_lab_planes(source);
    let mut ref_planes = rgb_to_lab_planes(&reference);
    for ch in 0..3 {
        quantize_plane(&mut src_planes[ch]);
        quantize_plane(&mut ref_planes[ch]);
    }

    for ch in 0..3 {
        let src_cdf = cdf_normalized(&histogram_256(&src_planes[ch]));
        let ref_cdf = cdf_normalized(&histogram_256(&ref_planes[ch]));
        let lut = matching_lut(&src_cdf, &ref_cdf);
        apply_lut(&mut src_planes[ch], &lut);
    }

    lab_planes_to_rgb(&src_planes)
}

/// Per-channel histograms and global statistics of an RGB image.
#[derive(Debug, Clone)]
pub struct HistogramReport {
    /// 256-bin counts for the red, green, and blue channels.
    pub channels: [[u32; 256]; 3],
    /// Mean over all samples.
    pub mean: f64,
    /// Standard deviation over all samples.
    pub std: f64,
    /// Minimum sample value.
    pub min: u8,
    /// Maximum sample value.
    pub max: u8,
}

/// Compute per-channel histograms plus mean/std/min/max statistics.
#[must_use]
pub fn histogram_report(img: &RgbImage) -> HistogramReport {
    let mut channels = [[0u32; 256]; 3];
    let mut min = u8::MAX;
    let mut max = u8::MIN;
    let mut sum = 0.0f64;
    let mut sum_sq = 0.0f64;
    let mut n = 0u64;

    for px in img.pixels() {
        for ch in 0..3 {
            let v = px[ch];
            channels[ch][v as usize] += 1;
            min = min.min(v);
            max = max.max(v);
            let vf = f64::from(v);
            sum += vf;
            sum_sq += vf * vf;
            n += 1;
        }
    }

    #[allow(clippy::cast_precision_loss)]
    let nf = n.max(1) as f64;
    let mean = sum / nf;
    let variance = (sum_sq / nf - mean * mean).max(0.0);

    HistogramReport {
        channels,
        mean,
        std: variance.sqrt(),
        min,
        max,
    }
}
