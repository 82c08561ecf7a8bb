//! Image transforms: convolution filters, frequency-domain watermarking,
//! histogram operations, spectral filtering, segmentation, region
//! descriptors, and gradient blending.
//!
//! Every operation takes and returns 8-bit RGB images; single-channel
//! analysis happens on an internal `f32` plane and is quantized back at
//! the end. Parameterized behaviors (filter kinds, methods, curves) are
//! closed enums that parse from their lowercase names.
//!
//! # Quick Start
//!
//! ```no_run
//! use pixlab::{apply_filter, ConvolutionFilter};
//!
//! let img = image::open("photo.jpg").unwrap().to_rgb8();
//! let blurred = apply_filter(&img, ConvolutionFilter::Gaussian, 15);
//! blurred.save("blurred.jpg").unwrap();
//! ```
//!
//! # Invisible watermarking
//!
//! Watermarks are embedded additively in the frequency domain, one FFT
//! per color channel, and recovered by subtracting the original image's
//! spectrum:
//!
//! ```no_run
//! use pixlab::{embed_invisible, extract, ExtractionMethod};
//!
//! let main = image::open("photo.jpg").unwrap().to_rgb8();
//! let mark = image::open("logo.png").unwrap().to_rgb8();
//! let marked = embed_invisible(&main, &mark, 0.1);
//! let recovered = extract(&main, &marked, ExtractionMethod::Fourier);
//! recovered.save("recovered.png").unwrap();
//! ```

#![deny(missing_docs)]

pub mod blend;
pub mod codec;
pub mod color;
pub mod convolution;
pub mod descriptors;
pub mod edges;
pub mod error;
pub mod fourier;
pub mod gray;
pub mod histogram;
pub mod segmentation;
pub mod spectral;
pub mod watermark;

pub use blend::{
    blend_images, blend_with_mask, custom_mask, gradient_mask, render_mask, BlendCurve,
    GradientDirection,
};
pub use codec::{image_info, is_supported_image, load_image, save_image, ImageInfo};
pub use convolution::{apply_filter, ConvolutionFilter};
pub use descriptors::{extract_region_descriptors, render_regions, RegionDescriptors};
pub use error::{Error, Result};
pub use histogram::{
    equalize, histogram_report, match_histograms, EqualizeMethod, HistogramReport,
};
pub use segmentation::{find_contours, segment, ContourStats, SegmentationMethod};
pub use spectral::{apply_frequency_filter, FrequencyFilter};
pub use watermark::{apply_visible, embed_invisible, extract, ExtractionMethod};
