//! Shape, texture, and statistical descriptors of segmented regions.

use image::RgbImage;

use crate::gray::GrayBuffer;
use crate::segmentation::{binarize, draw_boundary, trace_contours, Contour, MIN_CONTOUR_AREA};

/// Shape descriptors of a single region.
#[derive(Debug, Clone)]
pub struct ShapeFeatures {
    /// Identity of the contour in trace order.
    pub contour_id: usize,
    /// Absolute shoelace area of the boundary.
    pub area: f64,
    /// Closed boundary length.
    pub perimeter: f64,
    /// Bounding-box width divided by height.
    pub aspect_ratio: f64,
    /// Area divided by convex hull area; 0 when the hull is degenerate.
    pub solidity: f64,
    /// The seven Hu moment invariants of the region raster.
    pub hu_moments: [f64; 7],
}

/// Texture descriptors over a region's interior pixels.
#[derive(Debug, Clone)]
pub struct TextureFeatures {
    /// Identity of the contour in trace order.
    pub contour_id: usize,
    /// Mean intensity inside the region.
    pub mean_intensity: f64,
    /// Intensity standard deviation inside the region.
    pub std_intensity: f64,
    /// Sum of squared intensities.
    pub energy: f64,
    /// Shannon entropy (bits) of the 256-bin intensity histogram.
    pub entropy: f64,
}

/// Statistical moments of a region's intensity distribution.
#[derive(Debug, Clone)]
pub struct StatFeatures {
    /// Identity of the contour in trace order.
    pub contour_id: usize,
    /// Mean intensity.
    pub mean: f64,
    /// Standard deviation.
    pub std: f64,
    /// Minimum intensity.
    pub min: f64,
    /// Maximum intensity.
    pub max: f64,
    /// Median intensity.
    pub median: f64,
    /// Third standardized moment; 0 when the deviation is 0.
    pub skewness: f64,
    /// Excess kurtosis (fourth standardized moment minus 3); 0 when the
    /// deviation is 0.
    pub kurtosis: f64,
}

/// The three parallel descriptor collections, indexed by contour identity.
#[derive(Debug, Clone, Default)]
pub struct RegionDescriptors {
    /// Shape descriptors per significant region.
    pub shape: Vec<ShapeFeatures>,
    /// Texture descriptors per significant region.
    pub texture: Vec<TextureFeatures>,
    /// Statistical descriptors per significant region.
    pub statistics: Vec<StatFeatures>,
}

/// Extract descriptors for every significant region of the image.
///
/// The image is binarized at 127 and outer contours are traced. Contours
/// with area below 100 or zero perimeter are skipped; zero standard
/// deviation and degenerate hulls fall back to the documented defaults
/// instead of failing, so extraction always covers every usable region.
#[must_use]
pub fn extract_region_descriptors(img: &RgbImage) -> RegionDescriptors {
    let gray = GrayBuffer::from_luma(img);
    let binary = binarize(&gray, 127.0);
    let contours = trace_contours(&binary);

    let mut out = RegionDescriptors::default();
    for (id, contour) in contours.iter().enumerate() {
        let area = contour.area();
        if area < MIN_CONTOUR_AREA {
            continue;
        }
        let perimeter = contour.perimeter();
        if perimeter == 0.0 {
            continue;
        }

        out.shape.push(shape_features(id, contour, area, perimeter));

        let intensities: Vec<f64> = contour
            .pixels
            .iter()
            .map(|&(x, y)| f64::from(gray.get(x as usize, y as usize)))
            .collect();
        out.texture.push(texture_features(id, &intensities));
        out.statistics.push(stat_features(id, &intensities));
    }
    out
}

fn shape_features(id: usize, contour: &Contour, area: f64, perimeter: f64) -> ShapeFeatures {
    let (_, _, bw, bh) = contour.bounding_box();
    let aspect_ratio = if bh == 0 {
        0.0
    } else {
        f64::from(bw) / f64::from(bh)
    };

    let hull = convex_hull(&contour.points);
    let hull_area = polygon_area(&hull);
    let solidity = if hull_area > 0.0 { area / hull_area } else { 0.0 };

    ShapeFeatures {
        contour_id: id,
        area,
        perimeter,
        aspect_ratio,
        solidity,
        hu_moments: hu_moments(&contour.pixels),
    }
}

fn texture_features(id: usize, intensities: &[f64]) -> TextureFeatures {
    let (mean, std) = mean_std(intensities);
    let energy = intensities.iter().map(|v| v * v).sum();

    let mut hist = [0u64; 256];
    for &v in intensities {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let bin = v.round().clamp(0.0, 255.0) as usize;
        hist[bin] += 1;
    }
    #[allow(clippy::cast_precision_loss)]
    let n = intensities.len() as f64;
    let mut entropy = 0.0;
    if n > 0.0 {
        for &count in &hist {
            if count > 0 {
                #[allow(clippy::cast_precision_loss)]
                let p = count as f64 / n;
                entropy -= p * p.log2();
            }
        }
    }

    TextureFeatures {
        contour_id: id,
        mean_intensity: mean,
        std_intensity: std,
        energy,
        entropy,
    }
}

fn stat_features(id: usize, intensities: &[f64]) -> StatFeatures {
    if intensities.is_empty() {
        return StatFeatures {
            contour_id: id,
            mean: 0.0,
            std: 0.0,
            min: 0.0,
            max: 0.0,
            median: 0.0,
            skewness: 0.0,
            kurtosis: 0.0,
        };
    }

    let (mean, std) = mean_std(intensities);
    let mut sorted = intensities.to_vec();
    sorted.sort_by(f64::total_cmp);
    let min = sorted[0];
    let max = sorted[sorted.len() - 1];
    let median = if sorted.len() % 2 == 1 {
        sorted[sorted.len() / 2]
    } else {
        (sorted[sorted.len() / 2 - 1] + sorted[sorted.len() / 2]) / 2.0
    };

    let (skewness, kurtosis) = if std == 0.0 {
        (0.0, 0.0)
    } else {
        #[allow(clippy::cast_precision_loss)]
        let n = intensities.len() as f64;
        let m3 = intensities
            .iter()
            .map(|v| ((v - mean) / std).powi(3))
            .sum::<f64>()
            / n;
        let m4 = intensities
            .iter()
            .map(|v| ((v - mean) / std).powi(4))
            .sum::<f64>()
            / n;
        (m3, m4 - 3.0)
    };

    StatFeatures {
        contour_id: id,
        mean,
        std,
        min,
        max,
        median,
        skewness,
        kurtosis,
    }
}

fn mean_std(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    #[allow(clippy::cast_precision_loss)]
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    (mean, variance.sqrt())
}

/// Convex hull of a point set (Andrew monotone chain, counter-clockwise).
#[must_use]
pub fn convex_hull(points: &[(u32, u32)]) -> Vec<(u32, u32)> {
    let mut pts: Vec<(u32, u32)> = points.to_vec();
    pts.sort_unstable();
    pts.dedup();
    if pts.len() < 3 {
        return pts;
    }

    let cross = |o: (u32, u32), a: (u32, u32), b: (u32, u32)| -> f64 {
        (f64::from(a.0) - f64::from(o.0)) * (f64::from(b.1) - f64::from(o.1))
            - (f64::from(a.1) - f64::from(o.1)) * (f64::from(b.0) - f64::from(o.0))
    };

    let mut hull: Vec<(u32, u32)> = Vec::with_capacity(pts.len() * 2);
    for &p in &pts {
        while hull.len() >= 2 && cross(hull[hull.len() - 2], hull[hull.len() - 1], p) <= 0.0 {
            hull.pop();
        }
        hull.push(p);
    }

    // Upper chain may only pop its own vertices, never the lower chain's.
    let lower_len = hull.len() + 1;
    for &p in pts.iter().rev().skip(1) {
        while hull.len() >= lower_len
            && cross(hull[hull.len() - 2], hull[hull.len() - 1], p) <= 0.0
        {
            hull.pop();
        }
        hull.push(p);
    }
    hull.pop();
    hull
}

/// Absolute shoelace area of a polygon.
#[must_use]
pub fn polygon_area(polygon: &[(u32, u32)]) -> f64 {
    if polygon.len() < 3 {
        return 0.0;
    }
    let mut acc = 0.0f64;
    for i in 0..polygon.len() {
        let (x0, y0) = polygon[i];
        let (x1, y1) = polygon[(i + 1) % polygon.len()];
        acc += f64::from(x0) * f64::from(y1) - f64::from(x1) * f64::from(y0);
    }
    (acc / 2.0).abs()
}

/// The seven Hu invariants from raster moments of a pixel set.
#[must_use]
pub fn hu_moments(pixels: &[(u32, u32)]) -> [f64; 7] {
    #[allow(clippy::cast_precision_loss)]
    let m00 = pixels.len() as f64;
    if m00 == 0.0 {
        return [0.0; 7];
    }

    let mut m10 = 0.0;
    let mut m01 = 0.0;
    for &(x, y) in pixels {
        m10 += f64::from(x);
        m01 += f64::from(y);
    }
    let cx = m10 / m00;
    let cy = m01 / m00;

    // Central moments up to order 3.
    let mut mu = [[0.0f64; 4]; 4];
    for &(x, y) in pixels {
        let dx = f64::from(x) - cx;
        let dy = f64::from(y) - cy;
        for (p, row) in mu.iter_mut().enumerate() {
            for (q, cell) in row.iter_mut().enumerate() {
                if p + q <= 3 {
                    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
                    {
                        *cell += dx.powi(p as i32) * dy.powi(q as i32);
                    }
                }
            }
        }
    }

    // Scale-normalized moments.
    let eta = |p: usize, q: usize| -> f64 {
        #[allow(clippy::cast_precision_loss)]
        let gamma = (p + q) as f64 / 2.0 + 1.0;
        mu[p][q] / m00.powf(gamma)
    };

    let n20 = eta(2, 0);
    let n02 = eta(0, 2);
    let n11 = eta(1, 1);
    let n30 = eta(3, 0);
    let n03 = eta(0, 3);
    let n21 = eta(2, 1);
    let n12 = eta(1, 2);

    let h1 = n20 + n02;
    let h2 = (n20 - n02).powi(2) + 4.0 * n11.powi(2);
    let h3 = (n30 - 3.0 * n12).powi(2) + (3.0 * n21 - n03).powi(2);
    let h4 = (n30 + n12).powi(2) + (n21 + n03).powi(2);
    let h5 = (n30 - 3.0 * n12)
        * (n30 + n12)
        * ((n30 + n12).powi(2) - 3.0 * (n21 + n03).powi(2))
        + (3.0 * n21 - n03) * (n21 + n03) * (3.0 * (n30 + n12).powi(2) - (n21 + n03).powi(2));
    let h6 = (n20 - n02) * ((n30 + n12).powi(2) - (n21 + n03).powi(2))
        + 4.0 * n11 * (n30 + n12) * (n21 + n03);
    let h7 = (3.0 * n21 - n03) * (n30 + n12)
        * ((n30 + n12).powi(2) - 3.0 * (n21 + n03).powi(2))
        - (n30 - 3.0 * n12) * (n21 + n03) * (3.0 * (n30 + n12).powi(2) - (n21 + n03).powi(2));

    [h1, h2, h3, h4, h5, h6, h7]
}

/// Draw the significant region boundaries with id labels at their centroids.
#[must_use]
pub fn render_regions(img: &RgbImage) -> RgbImage {
    let gray = GrayBuffer::from_luma(img);
    let binary = binarize(&gray, 127.0);
    let contours = trace_contours(&binary);

    let mut overlay = img.clone();
    for (id, contour) in contours.iter().enumerate() {
        if contour.area() < MIN_CONTOUR_AREA {
            continue;
        }
        draw_boundary(&mut overlay, &contour.points, image::Rgb([0, 255, 0]));
        if let Some((cx, cy)) = centroid(&contour.pixels) {
            draw_number(&mut overlay, id, cx, cy, image::Rgb([255, 0, 0]));
        }
    }
    overlay
}

fn centroid(pixels: &[(u32, u32)]) -> Option<(u32, u32)> {
    if pixels.is_empty() {
        return None;
    }
    let mut sx = 0u64;
    let mut sy = 0u64;
    for &(x, y) in pixels {
        sx += u64::from(x);
        sy += u64::from(y);
    }
    let n = pixels.len() as u64;
    #[allow(clippy::cast_possible_truncation)]
    Some(((sx / n) as u32, (sy / n) as u32))
}

// 3x5 digit glyphs, one bit per pixel, row-major from the top.
const DIGIT_GLYPHS: [[u8; 5]; 10] = [
    [0b111, 0b101, 0b101, 0b101, 0b111], // 0
    [0b010, 0b110, 0b010, 0b010, 0b111], // 1
    [0b111, 0b001, 0b111, 0b100, 0b111], // 2
    [0b111, 0b001, 0b111, 0b001, 0b111], // 3
    [0b101, 0b101, 0b111, 0b001, 0b001], // 4
    [0b111, 0b100, 0b111, 0b001, 0b111], // 5
    [0b111, 0b100, 0b111, 0b101, 0b111], // 6
    [0b111, 0b001, 0b010, 0b010, 0b010], // 7
    [0b111, 0b101, 0b111, 0b101, 0b111], // 8
    [0b111, 0b101, 0b111, 0b001, 0b111], // 9
];

fn draw_number(img: &mut RgbImage, number: usize, x: u32, y: u32, color: image::Rgb<u8>) {
    let digits: Vec<usize> = number
        .to_string()
        .bytes()
        .map(|b| usize::from(b - b'0'))
        .collect();
    for (i, &d) in digits.iter().enumerate() {
        #[allow(clippy::cast_possible_truncation)]
        let ox = x + (i as u32) * 4;
        for (row, bits) in DIGIT_GLYPHS[d].iter().enumerate() {
            for col in 0..3u32 {
                if bits >> (2 - col) & 1 == 1 {
                    #[allow(clippy::cast_possible_truncation)]
                    let (px, py) = (ox + col, y + row as u32);
                    if px < img.width() && py < img.height() {
                        img.put_pixel(px, py, color);
                    }
                }
            }
        }
    }
}
