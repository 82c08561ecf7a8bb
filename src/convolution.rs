//! Spatial convolution filters over fixed kernels.

use std::str::FromStr;

use image::RgbImage;

use crate::error::Error;
use crate::gray::GrayBuffer;

/// The set of supported convolution filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConvolutionFilter {
    /// Gaussian smoothing; the only filter that honors `kernel_size`.
    Gaussian,
    /// Horizontal Sobel gradient (computed on luma).
    SobelX,
    /// Vertical Sobel gradient (computed on luma).
    SobelY,
    /// Laplacian second-derivative filter (computed on luma).
    Laplacian,
    /// Unsharp-style sharpening (applied per color channel).
    Sharpen,
    /// Omnidirectional edge detection (applied per color channel).
    EdgeDetect,
}

impl FromStr for ConvolutionFilter {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "gaussian" => Ok(Self::Gaussian),
            "sobel_x" => Ok(Self::SobelX),
            "sobel_y" => Ok(Self::SobelY),
            "laplacian" => Ok(Self::Laplacian),
            "sharpen" => Ok(Self::Sharpen),
            "edge_detect" => Ok(Self::EdgeDetect),
            other => Err(Error::UnknownFilter(other.to_string())),
        }
    }
}

impl std::fmt::Display for ConvolutionFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Gaussian => "gaussian",
            Self::SobelX => "sobel_x",
            Self::SobelY => "sobel_y",
            Self::Laplacian => "laplacian",
            Self::Sharpen => "sharpen",
            Self::EdgeDetect => "edge_detect",
        })
    }
}

/// A small square convolution kernel with odd side length.
#[derive(Debug, Clone)]
pub struct Kernel {
    data: Vec<f32>,
    size: usize,
}

impl Kernel {
    /// Build a kernel from row-major coefficients.
    ///
    /// # Panics
    ///
    /// Panics if `data.len() != size * size` or `size` is even.
    #[must_use]
    pub fn new(data: Vec<f32>, size: usize) -> Self {
        assert_eq!(data.len(), size * size);
        assert_eq!(size % 2, 1, "kernel side length must be odd");
        Self { data, size }
    }

    /// Side length of the kernel.
    #[must_use]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Coefficient at `(kx, ky)`.
    #[inline]
    #[must_use]
    pub fn at(&self, kx: usize, ky: usize) -> f32 {
        self.data[ky * self.size + kx]
    }

    /// `k x k` Gaussian kernel as the outer product of a 1D Gaussian.
    #[must_use]
    pub fn gaussian(ksize: usize) -> Self {
        let g = gaussian_kernel_1d(ksize);
        let mut data = Vec::with_capacity(ksize * ksize);
        for &gy in &g {
            for &gx in &g {
                data.push(gy * gx);
            }
        }
        Self::new(data, ksize)
    }

    /// 3x3 horizontal Sobel kernel.
    #[must_use]
    pub fn sobel_x() -> Self {
        Self::new(vec![-1.0, 0.0, 1.0, -2.0, 0.0, 2.0, -1.0, 0.0, 1.0], 3)
    }

    /// 3x3 vertical Sobel kernel.
    #[must_use]
    pub fn sobel_y() -> Self {
        Self::new(vec![-1.0, -2.0, -1.0, 0.0, 0.0, 0.0, 1.0, 2.0, 1.0], 3)
    }

    /// 3x3 Laplacian kernel.
    #[must_use]
    pub fn laplacian() -> Self {
        Self::new(vec![0.0, -1.0, 0.0, -1.0, 4.0, -1.0, 0.0, -1.0, 0.0], 3)
    }

    /// 3x3 sharpening kernel.
    #[must_use]
    pub fn sharpen() -> Self {
        Self::new(vec![0.0, -1.0, 0.0, -1.0, 5.0, -1.0, 0.0, -1.0, 0.0], 3)
    }

    /// 3x3 edge detection kernel.
    #[must_use]
    pub fn edge_detect() -> Self {
        Self::new(
            vec![-1.0, -1.0, -1.0, -1.0, 8.0, -1.0, -1.0, -1.0, -1.0],
            3,
        )
    }
}

/// Normalized 1D Gaussian of length `ksize` with the automatic sigma
/// `0.3 * ((ksize - 1) * 0.5 - 1) + 0.8`.
#[must_use]
pub fn gaussian_kernel_1d(ksize: usize) -> Vec<f32> {
    #[allow(clippy::cast_precision_loss)]
    let sigma = 0.3 * ((ksize as f32 - 1.0) * 0.5 - 1.0) + 0.8;
    #[allow(clippy::cast_precision_loss)]
    let center = (ksize as f32 - 1.0) / 2.0;
    let two_sigma_sq = 2.0 * sigma * sigma;

    let mut kernel: Vec<f32> = (0..ksize)
        .map(|i| {
            #[allow(clippy::cast_precision_loss)]
            let d = i as f32 - center;
            (-d * d / two_sigma_sq).exp()
        })
        .collect();

    let sum: f32 = kernel.iter().sum();
    for v in &mut kernel {
        *v /= sum;
    }
    kernel
}

/// Normalize a kernel size to odd by bumping even values up by one.
#[must_use]
pub fn normalize_kernel_size(ksize: usize) -> usize {
    if ksize % 2 == 0 {
        ksize + 1
    } else {
        ksize
    }
}

/// Convolve a single plane with a kernel, border-replicated, same size out.
#[must_use]
pub fn convolve_plane(src: &GrayBuffer, kernel: &Kernel) -> GrayBuffer {
    let mut dst = GrayBuffer::new(src.width, src.height);
    #[allow(clippy::cast_possible_wrap)]
    let half = (kernel.size() / 2) as isize;

    for y in 0..src.height {
        for x in 0..src.width {
            let mut acc = 0.0_f32;
            for ky in 0..kernel.size() {
                for kx in 0..kernel.size() {
                    #[allow(clippy::cast_possible_wrap)]
                    let sx = x as isize + kx as isize - half;
                    #[allow(clippy::cast_possible_wrap)]
                    let sy = y as isize + ky as isize - half;
                    acc += kernel.at(kx, ky) * src.get_replicate(sx, sy);
                }
            }
            dst.set(x, y, acc);
        }
    }
    dst
}

/// Extract one color channel into a float plane.
fn channel_plane(img: &RgbImage, ch: usize) -> GrayBuffer {
    let mut plane = GrayBuffer::new(img.width() as usize, img.height() as usize);
    for (i, px) in img.pixels().enumerate() {
        plane.data[i] = f32::from(px[ch]);
    }
    plane
}

/// Apply a convolution filter to an image.
///
/// `kernel_size` only affects [`ConvolutionFilter::Gaussian`]; even values
/// are treated as the next odd size. Sobel and Laplacian filters run on the
/// luma conversion and replicate the result to all three channels; the
/// remaining filters run on each color channel independently. Output
/// dimensions always equal the input dimensions.
#[must_use]
pub fn apply_filter(img: &RgbImage, filter: ConvolutionFilter, kernel_size: usize) -> RgbImage {
    match filter {
        ConvolutionFilter::Gaussian => {
            let kernel = Kernel::gaussian(normalize_kernel_size(kernel_size));
            convolve_channels(img, &kernel)
        }
        ConvolutionFilter::Sharpen => convolve_channels(img, &Kernel::sharpen()),
        ConvolutionFilter::EdgeDetect => convolve_channels(img, &Kernel::edge_detect()),
        ConvolutionFilter::SobelX => convolve_luma(img, &Kernel::sobel_x()),
        ConvolutionFilter::SobelY => convolve_luma(img, &Kernel::sobel_y()),
        ConvolutionFilter::Laplacian => convolve_luma(img, &Kernel::laplacian()),
    }
}

fn convolve_channels(img: &RgbImage, kernel: &Kernel) -> RgbImage {
    let planes: Vec<GrayBuffer> = (0..3)
        .map(|ch| convolve_plane(&channel_plane(img, ch), kernel))
        .collect();

    let width = img.width() as usize;
    RgbImage::from_fn(img.width(), img.height(), |x, y| {
        let i = y as usize * width + x as usize;
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let q = |v: f32| v.round().clamp(0.0, 255.0) as u8;
        image::Rgb([
            q(planes[0].data[i]),
            q(planes[1].data[i]),
            q(planes[2].data[i]),
        ])
    })
}

fn convolve_luma(img: &RgbImage, kernel: &Kernel) -> RgbImage {
    let gray = GrayBuffer::from_luma(img);
    convolve_plane(&gray, kernel).to_rgb()
}
