//! Binarization strategies and contour extraction.

use std::str::FromStr;

use image::RgbImage;

use crate::convolution::{convolve_plane, Kernel};
use crate::edges::{canny, CANNY_HIGH, CANNY_LOW};
use crate::error::Error;
use crate::gray::GrayBuffer;

/// Window size for adaptive thresholding.
const ADAPTIVE_WINDOW: usize = 11;
/// Constant subtracted from the local weighted mean.
const ADAPTIVE_OFFSET: f32 = 2.0;
/// Contours with shoelace area at or below this are treated as noise.
pub const MIN_CONTOUR_AREA: f64 = 100.0;

/// Binarization strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentationMethod {
    /// Canny edges with fixed (50, 150) hysteresis thresholds.
    Edge,
    /// Global binary threshold at a caller-supplied value.
    Threshold,
    /// Automatic global threshold via between-class variance maximization.
    Otsu,
    /// Gaussian-weighted local mean threshold (window 11, offset 2).
    Adaptive,
}

impl FromStr for SegmentationMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "edge" => Ok(Self::Edge),
            "threshold" => Ok(Self::Threshold),
            "otsu" => Ok(Self::Otsu),
            "adaptive" => Ok(Self::Adaptive),
            other => Err(Error::UnknownMethod(other.to_string())),
        }
    }
}

impl std::fmt::Display for SegmentationMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Edge => "edge",
            Self::Threshold => "threshold",
            Self::Otsu => "otsu",
            Self::Adaptive => "adaptive",
        })
    }
}

/// Segment an image into a binary map, returned as a 3-channel container.
///
/// `threshold_value` is only consulted by [`SegmentationMethod::Threshold`].
#[must_use]
pub fn segment(img: &RgbImage, method: SegmentationMethod, threshold_value: u8) -> RgbImage {
    let gray = GrayBuffer::from_luma(img);
    let binary = match method {
        SegmentationMethod::Edge => canny(&gray, CANNY_LOW, CANNY_HIGH),
        SegmentationMethod::Threshold => binarize(&gray, f32::from(threshold_value)),
        SegmentationMethod::Otsu => {
            let t = otsu_threshold(&gray);
            binarize(&gray, f32::from(t))
        }
        SegmentationMethod::Adaptive => adaptive_threshold(&gray),
    };
    binary.to_rgb()
}

/// Binary threshold: values strictly greater than `threshold` become 255.
#[must_use]
pub fn binarize(gray: &GrayBuffer, threshold: f32) -> GrayBuffer {
    let mut out = GrayBuffer::new(gray.width, gray.height);
    for (dst, &src) in out.data.iter_mut().zip(gray.data.iter()) {
        *dst = if src > threshold { 255.0 } else { 0.0 };
    }
    out
}

/// Otsu's threshold: the level maximizing between-class variance.
#[must_use]
pub fn otsu_threshold(gray: &GrayBuffer) -> u8 {
    let mut hist = [0u64; 256];
    for &v in &gray.data {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let bin = v.round().clamp(0.0, 255.0) as usize;
        hist[bin] += 1;
    }
    let total: u64 = hist.iter().sum();
    if total == 0 {
        return 0;
    }

    #[allow(clippy::cast_precision_loss)]
    let totalf = total as f64;
    let global_sum: f64 = hist
        .iter()
        .enumerate()
        .map(|(i, &c)| {
            #[allow(clippy::cast_precision_loss)]
            {
                i as f64 * c as f64
            }
        })
        .sum();

    let mut first_best = 0usize;
    let mut last_best = 0usize;
    let mut best_variance = -1.0f64;
    let mut weight_bg = 0.0f64;
    let mut sum_bg = 0.0f64;

    for t in 0..256usize {
        #[allow(clippy::cast_precision_loss)]
        {
            weight_bg += hist[t] as f64;
            sum_bg += t as f64 * hist[t] as f64;
        }
        if weight_bg == 0.0 {
            continue;
        }
        let weight_fg = totalf - weight_bg;
        if weight_fg == 0.0 {
            break;
        }

        let mean_bg = sum_bg / weight_bg;
        let mean_fg = (global_sum - sum_bg) / weight_fg;
        let between = weight_bg * weight_fg * (mean_bg - mean_fg).powi(2);
        #[allow(clippy::float_cmp)]
        if between > best_variance {
            best_variance = between;
            first_best = t;
            last_best = t;
        } else if between == best_variance {
            last_best = t;
        }
    }
    // A flat maximum (empty bins between the modes) splits at its middle.
    #[allow(clippy::cast_possible_truncation)]
    {
        ((first_best + last_best) / 2) as u8
    }
}

/// Adaptive threshold against a Gaussian-weighted local mean.
///
/// A pixel becomes 255 when it exceeds the weighted mean of its 11x11
/// neighborhood minus the fixed offset of 2.
#[must_use]
pub fn adaptive_threshold(gray: &GrayBuffer) -> GrayBuffer {
    let local_mean = convolve_plane(gray, &Kernel::gaussian(ADAPTIVE_WINDOW));
    let mut out = GrayBuffer::new(gray.width, gray.height);
    for i in 0..gray.data.len() {
        out.data[i] = if gray.data[i] > local_mean.data[i] - ADAPTIVE_OFFSET {
            255.0
        } else {
            0.0
        };
    }
    out
}

/// An outer region boundary with the region's interior pixel set.
#[derive(Debug, Clone)]
pub struct Contour {
    /// Ordered boundary coordinates from Moore tracing.
    pub points: Vec<(u32, u32)>,
    /// Every pixel of the connected component, including the boundary.
    pub pixels: Vec<(u32, u32)>,
}

impl Contour {
    /// Absolute shoelace area of the closed boundary polygon.
    #[must_use]
    pub fn area(&self) -> f64 {
        let n = self.points.len();
        if n < 3 {
            return 0.0;
        }
        let mut acc = 0.0f64;
        for i in 0..n {
            let (x0, y0) = self.points[i];
            let (x1, y1) = self.points[(i + 1) % n];
            acc += f64::from(x0) * f64::from(y1) - f64::from(x1) * f64::from(y0);
        }
        (acc / 2.0).abs()
    }

    /// Closed-path length of the boundary.
    #[must_use]
    pub fn perimeter(&self) -> f64 {
        let n = self.points.len();
        if n < 2 {
            return 0.0;
        }
        let mut acc = 0.0f64;
        for i in 0..n {
            let (x0, y0) = self.points[i];
            let (x1, y1) = self.points[(i + 1) % n];
            let dx = f64::from(x1) - f64::from(x0);
            let dy = f64::from(y1) - f64::from(y0);
            acc += dx.hypot(dy);
        }
        acc
    }

    /// Axis-aligned bounding box `(x, y, width, height)`.
    #[must_use]
    pub fn bounding_box(&self) -> (u32, u32, u32, u32) {
        let mut min_x = u32::MAX;
        let mut min_y = u32::MAX;
        let mut max_x = 0u32;
        let mut max_y = 0u32;
        for &(x, y) in &self.points {
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
        }
        if min_x > max_x {
            return (0, 0, 0, 0);
        }
        (min_x, min_y, max_x - min_x + 1, max_y - min_y + 1)
    }
}

// Moore neighborhood in clockwise order starting west.
const MOORE: [(isize, isize); 8] = [
    (-1, 0),
    (-1, -1),
    (0, -1),
    (1, -1),
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
];

/// Extract the outer boundaries of all foreground components.
///
/// Foreground is any sample above zero; components are 8-connected; each
/// component contributes exactly one contour (holes are not traced).
#[must_use]
pub fn trace_contours(binary: &GrayBuffer) -> Vec<Contour> {
    let width = binary.width;
    let height = binary.height;
    let is_fg = |x: isize, y: isize| -> bool {
        #[allow(clippy::cast_possible_wrap)]
        if x < 0 || y < 0 || x >= width as isize || y >= height as isize {
            return false;
        }
        #[allow(clippy::cast_sign_loss)]
        {
            binary.data[y as usize * width + x as usize] > 0.0
        }
    };

    let mut labels = vec![0u32; width * height];
    let mut contours = Vec::new();
    let mut next_label = 1u32;

    for sy in 0..height {
        for sx in 0..width {
            if binary.data[sy * width + sx] <= 0.0 || labels[sy * width + sx] != 0 {
                continue;
            }

            // Flood the component (8-connectivity) to collect its pixels.
            let label = next_label;
            next_label += 1;
            let mut pixels = Vec::new();
            let mut stack = vec![(sx, sy)];
            labels[sy * width + sx] = label;
            while let Some((x, y)) = stack.pop() {
                #[allow(clippy::cast_possible_truncation)]
                pixels.push((x as u32, y as u32));
                for &(dx, dy) in &MOORE {
                    #[allow(clippy::cast_possible_wrap)]
                    let (nx, ny) = (x as isize + dx, y as isize + dy);
                    if is_fg(nx, ny) {
                        #[allow(clippy::cast_sign_loss)]
                        let ni = ny as usize * width + nx as usize;
                        if labels[ni] == 0 {
                            labels[ni] = label;
                            #[allow(clippy::cast_sign_loss)]
                            stack.push((nx as usize, ny as usize));
                        }
                    }
                }
            }

            // Moore boundary trace from the component's scan-order first
            // pixel; its west neighbor is guaranteed background.
            let points = moore_trace(&is_fg, sx, sy, pixels.len());
            contours.push(Contour { points, pixels });
        }
    }

    contours
}

fn moore_trace(
    is_fg: &dyn Fn(isize, isize) -> bool,
    sx: usize,
    sy: usize,
    component_size: usize,
) -> Vec<(u32, u32)> {
    #[allow(clippy::cast_possible_truncation)]
    let start = (sx as u32, sy as u32);
    let mut points = vec![start];

    #[allow(clippy::cast_possible_wrap)]
    let (mut cx, mut cy) = (sx as isize, sy as isize);
    // Direction index of the backtrack (background) neighbor; west initially.
    let mut backtrack = 0usize;

    // The trace is a deterministic walk over (pixel, backtrack) states, so
    // the boundary is closed exactly when a state repeats. Boundary pixels
    // on one-pixel spurs are legitimately visited more than once, which is
    // why termination keys on the state and not on the pixel.
    let mut seen = std::collections::HashSet::new();
    seen.insert((cx, cy, backtrack));

    let max_steps = component_size * 8 + 8;
    for _ in 0..max_steps {
        let mut advanced = false;
        for k in 1..=8 {
            let dir = (backtrack + k) % 8;
            let (dx, dy) = MOORE[dir];
            let (nx, ny) = (cx + dx, cy + dy);
            if is_fg(nx, ny) {
                // New backtrack: the background neighbor checked just
                // before this one, expressed from the new pixel.
                let prev = (backtrack + k - 1) % 8;
                let (px, py) = (cx + MOORE[prev].0, cy + MOORE[prev].1);
                backtrack = MOORE
                    .iter()
                    .position(|&(bx, by)| (nx + bx, ny + by) == (px, py))
                    .unwrap_or(0);
                cx = nx;
                cy = ny;
                advanced = true;
                break;
            }
        }

        if !advanced {
            // Isolated single pixel.
            break;
        }
        if !seen.insert((cx, cy, backtrack)) {
            break;
        }
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        points.push((cx as u32, cy as u32));
    }

    points
}

/// Per-contour summary row returned by [`find_contours`].
#[derive(Debug, Clone, PartialEq)]
pub struct ContourStats {
    /// Index of the contour in trace order.
    pub id: usize,
    /// Absolute shoelace area.
    pub area: f64,
    /// Closed boundary length.
    pub perimeter: f64,
    /// Number of traced boundary points.
    pub points: usize,
}

/// Binarize at 127, trace outer contours, and report the significant ones.
///
/// Contours with area at or below 100 are dropped from the table. Returns an
/// overlay image with boundaries drawn in green plus the numeric table.
#[must_use]
pub fn find_contours(img: &RgbImage) -> (RgbImage, Vec<ContourStats>) {
    let gray = GrayBuffer::from_luma(img);
    let binary = binarize(&gray, 127.0);
    let contours = trace_contours(&binary);

    let mut overlay = img.clone();
    let mut stats = Vec::new();
    for (id, contour) in contours.iter().enumerate() {
        let area = contour.area();
        if area <= MIN_CONTOUR_AREA {
            continue;
        }
        draw_boundary(&mut overlay, &contour.points, image::Rgb([0, 255, 0]));
        stats.push(ContourStats {
            id,
            area,
            perimeter: contour.perimeter(),
            points: contour.points.len(),
        });
    }
    (overlay, stats)
}

/// Draw boundary points onto an image.
pub(crate) fn draw_boundary(img: &mut RgbImage, points: &[(u32, u32)], color: image::Rgb<u8>) {
    for &(x, y) in points {
        if x < img.width() && y < img.height() {
            img.put_pixel(x, y, color);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled_rect(width: usize, height: usize, x0: usize, y0: usize, w: usize, h: usize) -> GrayBuffer {
        let mut buf = GrayBuffer::new(width, height);
        for y in y0..y0 + h {
            for x in x0..x0 + w {
                buf.set(x, y, 255.0);
            }
        }
        buf
    }

    #[test]
    fn method_names_parse() {
        assert_eq!(
            "otsu".parse::<SegmentationMethod>().unwrap(),
            SegmentationMethod::Otsu
        );
        assert!(matches!(
            "watershed".parse::<SegmentationMethod>(),
            Err(Error::UnknownMethod(_))
        ));
    }

    #[test]
    fn binarize_is_strictly_greater_than() {
        let mut gray = GrayBuffer::new(3, 1);
        gray.data = vec![126.0, 127.0, 128.0];
        let b = binarize(&gray, 127.0);
        assert_eq!(b.data, vec![0.0, 0.0, 255.0]);
    }

    #[test]
    fn otsu_separates_a_bimodal_image() {
        // Two flat regions at 50 and 200.
        let mut gray = GrayBuffer::new(20, 10);
        for y in 0..10 {
            for x in 0..20 {
                gray.set(x, y, if x < 10 { 50.0 } else { 200.0 });
            }
        }
        let t = otsu_threshold(&gray);
        assert!(t > 50 && t < 200, "otsu threshold {t} outside (50, 200)");
        // Equal-mass modes leave a flat maximum over [50, 199]; the
        // threshold lands at its middle.
        assert_eq!(t, 124);

        let binary = binarize(&gray, f32::from(t));
        let mut levels: Vec<f32> = binary.data.clone();
        levels.sort_by(f32::total_cmp);
        levels.dedup();
        assert_eq!(levels, vec![0.0, 255.0]);
    }

    #[test]
    fn adaptive_threshold_of_flat_image_is_white() {
        // Flat image: every pixel equals the local mean, and mean - 2 is
        // below the pixel, so everything passes.
        let mut gray = GrayBuffer::new(16, 16);
        gray.data.fill(90.0);
        let out = adaptive_threshold(&gray);
        assert!(out.data.iter().all(|&v| v == 255.0));
    }

    #[test]
    fn rectangle_contour_geometry() {
        let binary = filled_rect(40, 40, 5, 5, 20, 12);
        let contours = trace_contours(&binary);
        assert_eq!(contours.len(), 1);
        let c = &contours[0];

        // Shoelace area of the boundary polygon of a w x h pixel block is
        // (w-1) * (h-1).
        assert!((c.area() - 19.0 * 11.0).abs() < 1e-9);
        // Axis-aligned rectangle boundary: perimeter 2 * ((w-1) + (h-1)).
        assert!((c.perimeter() - 2.0 * (19.0 + 11.0)).abs() < 1e-9);
        assert_eq!(c.bounding_box(), (5, 5, 20, 12));
        assert_eq!(c.pixels.len(), 20 * 12);
    }

    #[test]
    fn two_components_produce_two_contours() {
        let mut binary = filled_rect(50, 30, 2, 2, 10, 10);
        for y in 5..25 {
            for x in 30..45 {
                binary.set(x, y, 255.0);
            }
        }
        let contours = trace_contours(&binary);
        assert_eq!(contours.len(), 2);
    }

    #[test]
    fn single_pixel_component_is_degenerate() {
        let mut binary = GrayBuffer::new(10, 10);
        binary.set(4, 4, 255.0);
        let contours = trace_contours(&binary);
        assert_eq!(contours.len(), 1);
        assert_eq!(contours[0].points.len(), 1);
        assert_eq!(contours[0].area(), 0.0);
        assert_eq!(contours[0].perimeter(), 0.0);
    }

    #[test]
    fn find_contours_filters_small_regions() {
        // One large white block and one tiny speck on black background.
        let img = RgbImage::from_fn(60, 60, |x, y| {
            let big = (10..40).contains(&x) && (10..40).contains(&y);
            let speck = x == 50 && y == 50;
            if big || speck {
                image::Rgb([255, 255, 255])
            } else {
                image::Rgb([0, 0, 0])
            }
        });
        let (overlay, stats) = find_contours(&img);
        assert_eq!(overlay.dimensions(), (60, 60));
        assert_eq!(stats.len(), 1);
        assert!(stats[0].area > MIN_CONTOUR_AREA);
        // Boundary drawn in green on the overlay
        assert!(overlay.pixels().any(|px| *px == image::Rgb([0, 255, 0])));
    }

    #[test]
    fn segment_output_is_binary_three_channel() {
        let img = RgbImage::from_fn(20, 20, |x, _| {
            if x < 10 {
                image::Rgb([20, 20, 20])
            } else {
                image::Rgb([230, 230, 230])
            }
        });
        for method in [
            SegmentationMethod::Edge,
            SegmentationMethod::Threshold,
            SegmentationMethod::Otsu,
            SegmentationMethod::Adaptive,
        ] {
            let out = segment(&img, method, 127);
            assert_eq!(out.dimensions(), (20, 20));
            for px in out.pixels() {
                assert!(px[0] == 0 || px[0] == 255);
                assert_eq!(px[0], px[1]);
                assert_eq!(px[1], px[2]);
            }
        }
    }
}
