//! Color space conversions for histogram operations.
//!
//! Tonal operations run on a luma/lightness channel while chroma is carried
//! through untouched. Both conversions keep all channels in the 8-bit
//! `[0, 255]` range so 256-bin histograms apply directly.

use image::RgbImage;

use crate::gray::GrayBuffer;

const YUV_DELTA: f32 = 128.0;

/// Convert an RGB image into Y, U, V planes (BT.601, 8-bit offsets).
#[must_use]
pub fn rgb_to_yuv_planes(img: &RgbImage) -> [GrayBuffer; 3] {
    let width = img.width() as usize;
    let height = img.height() as usize;
    let mut y_plane = GrayBuffer::new(width, height);
    let mut u_plane = GrayBuffer::new(width, height);
    let mut v_plane = GrayBuffer::new(width, height);

    for (i, px) in img.pixels().enumerate() {
        let r = f32::from(px[0]);
        let g = f32::from(px[1]);
        let b = f32::from(px[2]);
        let y = 0.299 * r + 0.587 * g + 0.114 * b;
        y_plane.data[i] = y;
        u_plane.data[i] = 0.492 * (b - y) + YUV_DELTA;
        v_plane.data[i] = 0.877 * (r - y) + YUV_DELTA;
    }
    [y_plane, u_plane, v_plane]
}

/// Merge Y, U, V planes back into an RGB image, clipping to `[0, 255]`.
///
/// # Panics
///
/// Panics if the three planes do not share the same dimensions.
#[must_use]
pub fn yuv_planes_to_rgb(planes: &[GrayBuffer; 3]) -> RgbImage {
    let [y_plane, u_plane, v_plane] = planes;
    assert_eq!(y_plane.width, u_plane.width);
    assert_eq!(y_plane.width, v_plane.width);
    assert_eq!(y_plane.height, u_plane.height);
    assert_eq!(y_plane.height, v_plane.height);

    #[allow(clippy::cast_possible_truncation)]
    RgbImage::from_fn(y_plane.width as u32, y_plane.height as u32, |x, y| {
        let i = y as usize * y_plane.width + x as usize;
        let yy = y_plane.data[i];
        let u = u_plane.data[i] - YUV_DELTA;
        let v = v_plane.data[i] - YUV_DELTA;
        let r = yy + 1.140 * v;
        let g = yy - 0.395 * u - 0.581 * v;
        let b = yy + 2.032 * u;
        image::Rgb([quantize(r), quantize(g), quantize(b)])
    })
}

// CIE Lab via XYZ (D65), channels scaled to the 8-bit convention:
// L in [0, 255] (L*255/100), a and b offset by 128.

const XN: f32 = 0.950_456;
const ZN: f32 = 1.088_754;
const LAB_T0: f32 = 0.008_856;

fn lab_f(t: f32) -> f32 {
    if t > LAB_T0 {
        t.cbrt()
    } else {
        7.787 * t + 16.0 / 116.0
    }
}

fn lab_f_inv(t: f32) -> f32 {
    let t3 = t * t * t;
    if t3 > LAB_T0 {
        t3
    } else {
        (t - 16.0 / 116.0) / 7.787
    }
}

/// Convert an RGB image into L, a, b planes.
#[must_use]
pub fn rgb_to_lab_planes(img: &RgbImage) -> [GrayBuffer; 3] {
    let width = img.width() as usize;
    let height = img.height() as usize;
    let mut l_plane = GrayBuffer::new(width, height);
    let mut a_plane = GrayBuffer::new(width, height);
    let mut b_plane = GrayBuffer::new(width, height);

    for (i, px) in img.pixels().enumerate() {
        let r = f32::from(px[0]) / 255.0;
        let g = f32::from(px[1]) / 255.0;
        let b = f32::from(px[2]) / 255.0;

        let x = 0.412_453 * r + 0.357_580 * g + 0.180_423 * b;
        let y = 0.212_671 * r + 0.715_160 * g + 0.072_169 * b;
        let z = 0.019_334 * r + 0.119_193 * g + 0.950_227 * b;

        let fx = lab_f(x / XN);
        let fy = lab_f(y);
        let fz = lab_f(z / ZN);

        let l = if y > LAB_T0 {
            116.0 * y.cbrt() - 16.0
        } else {
            903.3 * y
        };

        l_plane.data[i] = l * 255.0 / 100.0;
        a_plane.data[i] = 500.0 * (fx - fy) + 128.0;
        b_plane.data[i] = 200.0 * (fy - fz) + 128.0;
    }
    [l_plane, a_plane, b_plane]
}

/// Merge L, a, b planes back into an RGB image, clipping to `[0, 255]`.
///
/// # Panics
///
/// Panics if the three planes do not share the same dimensions.
#[must_use]
pub fn lab_planes_to_rgb(planes: &[GrayBuffer; 3]) -> RgbImage {
    let [l_plane, a_plane, b_plane] = planes;
    assert_eq!(l_plane.width, a_plane.width);
    assert_eq!(l_plane.width, b_plane.width);
    assert_eq!(l_plane.height, a_plane.height);
    assert_eq!(l_plane.height, b_plane.height);

    #[allow(clippy::cast_possible_truncation)]
    RgbImage::from_fn(l_plane.width as u32, l_plane.height as u32, |px, py| {
        let i = py as usize * l_plane.width + px as usize;
        let l = l_plane.data[i] * 100.0 / 255.0;
        let a = a_plane.data[i] - 128.0;
        let bb = b_plane.data[i] - 128.0;

        let fy = (l + 16.0) / 116.0;
        let fx = fy + a / 500.0;
        let fz = fy - bb / 200.0;

        let y = if l > 903.3 * LAB_T0 {
            fy * fy * fy
        } else {
            l / 903.3
        };
        let x = lab_f_inv(fx) * XN;
        let z = lab_f_inv(fz) * ZN;

        let r = 3.240_479 * x - 1.537_150 * y - 0.498_535 * z;
        let g = -0.969_256 * x + 1.875_992 * y + 0.041_556 * z;
        let b = 0.055_648 * x - 0.204_043 * y + 1.057_311 * z;

        image::Rgb([
            quantize(r * 255.0),
            quantize(g * 255.0),
            quantize(b * 255.0),
        ])
    })
}

#[inline]
fn quantize(v: f32) -> u8 {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    {
        v.round().clamp(0.0, 255.0) as u8
    }
}
