//! Gradient-based edge extraction.
//!
//! Canny here is the classic pipeline: 3x3 Sobel gradients, L2 magnitude,
//! direction-quantized non-maximum suppression, then dual-threshold
//! hysteresis seeded from the strong pixels.

use crate::convolution::{convolve_plane, Kernel};
use crate::gray::GrayBuffer;

/// Hysteresis thresholds used by every edge-based operation in this crate.
pub const CANNY_LOW: f32 = 50.0;
/// Upper hysteresis threshold.
pub const CANNY_HIGH: f32 = 150.0;

/// Horizontal and vertical Sobel gradients of a plane.
#[must_use]
pub fn sobel_gradients(src: &GrayBuffer) -> (GrayBuffer, GrayBuffer) {
    let gx = convolve_plane(src, &Kernel::sobel_x());
    let gy = convolve_plane(src, &Kernel::sobel_y());
    (gx, gy)
}

/// Canny edge detection with dual-threshold hysteresis.
///
/// Returns a binary plane with edge pixels at 255 and everything else at 0.
#[must_use]
pub fn canny(src: &GrayBuffer, low: f32, high: f32) -> GrayBuffer {
    let width = src.width;
    let height = src.height;
    let (gx, gy) = sobel_gradients(src);

    let mut magnitude = GrayBuffer::new(width, height);
    for i in 0..width * height {
        magnitude.data[i] = gx.data[i].hypot(gy.data[i]);
    }

    // Non-maximum suppression along the quantized gradient direction.
    let mut thin = GrayBuffer::new(width, height);
    for y in 0..height {
        for x in 0..width {
            let i = y * width + x;
            let mag = magnitude.data[i];
            if mag == 0.0 {
                continue;
            }

            let angle = gy.data[i].atan2(gx.data[i]).to_degrees();
            let angle = if angle < 0.0 { angle + 180.0 } else { angle };

            #[allow(clippy::cast_possible_wrap)]
            let (xi, yi) = (x as isize, y as isize);
            let (n1, n2) = if !(22.5..157.5).contains(&angle) {
                // horizontal gradient: compare left/right
                (
                    magnitude.get_replicate(xi - 1, yi),
                    magnitude.get_replicate(xi + 1, yi),
                )
            } else if angle < 67.5 {
                // 45 degrees
                (
                    magnitude.get_replicate(xi + 1, yi - 1),
                    magnitude.get_replicate(xi - 1, yi + 1),
                )
            } else if angle < 112.5 {
                // vertical gradient: compare up/down
                (
                    magnitude.get_replicate(xi, yi - 1),
                    magnitude.get_replicate(xi, yi + 1),
                )
            } else {
                // 135 degrees
                (
                    magnitude.get_replicate(xi - 1, yi - 1),
                    magnitude.get_replicate(xi + 1, yi + 1),
                )
            };

            if mag >= n1 && mag >= n2 {
                thin.data[i] = mag;
            }
        }
    }

    // Hysteresis: flood from strong pixels through weak neighbors.
    let mut out = GrayBuffer::new(width, height);
    let mut stack: Vec<(usize, usize)> = Vec::new();
    for y in 0..height {
        for x in 0..width {
            if thin.data[y * width + x] >= high {
                out.data[y * width + x] = 255.0;
                stack.push((x, y));
            }
        }
    }

    while let Some((x, y)) = stack.pop() {
        for dy in -1_isize..=1 {
            for dx in -1_isize..=1 {
                if dx == 0 && dy == 0 {
                    continue;
                }
                #[allow(clippy::cast_possible_wrap)]
                let (nx, ny) = (x as isize + dx, y as isize + dy);
                if nx < 0 || ny < 0 {
                    continue;
                }
                #[allow(clippy::cast_sign_loss)]
                let (nx, ny) = (nx as usize, ny as usize);
                if nx >= width || ny >= height {
                    continue;
                }
                let ni = ny * width + nx;
                if out.data[ni] == 0.0 && thin.data[ni] >= low {
                    out.data[ni] = 255.0;
                    stack.push((nx, ny));
                }
            }
        }
    }

    out
}
