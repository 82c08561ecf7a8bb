use std::path::{Path, PathBuf};
use std::process;

use chrono::Local;
use clap::{Parser, Subcommand};
use image::RgbImage;
use rayon::prelude::*;

use pixlab::{
    apply_filter, apply_frequency_filter, apply_visible, blend_images, embed_invisible, equalize,
    extract, extract_region_descriptors, find_contours, histogram_report, image_info, is_supported_image,
    load_image, match_histograms, render_regions, save_image, segment, BlendCurve,
    ConvolutionFilter, EqualizeMethod, ExtractionMethod, FrequencyFilter, GradientDirection,
    SegmentationMethod,
};

#[derive(Parser)]
#[command(
    name = "pixlab",
    about = "Image transforms: filtering, watermarking, histograms, segmentation, blending",
    version,
    after_help = "Single-input commands accept a directory as input for batch processing\n\
                  (requires -o <output_dir>). Default output names carry a timestamp,\n\
                  e.g. filter_gaussian_20260829_153000.jpg."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Output file (or directory in batch mode)
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    /// Suppress all non-error output
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Apply a spatial convolution filter
    Filter {
        /// Input image file or directory
        input: PathBuf,
        /// Filter name: gaussian, sobel_x, sobel_y, laplacian, sharpen, edge_detect
        #[arg(short, long, default_value = "gaussian")]
        filter: ConvolutionFilter,
        /// Kernel size for the gaussian filter (even values round up)
        #[arg(short, long, default_value_t = 3)]
        kernel_size: usize,
    },

    /// Equalize the intensity histogram
    Equalize {
        /// Input image file or directory
        input: PathBuf,
        /// Method: global, clahe
        #[arg(short, long, default_value = "global")]
        method: EqualizeMethod,
    },

    /// Match an image's histogram to a reference image
    Match {
        /// Image to adjust
        input: PathBuf,
        /// Image providing the target distribution
        reference: PathBuf,
    },

    /// Filter the image in the frequency domain
    Spectral {
        /// Input image file or directory
        input: PathBuf,
        /// Filter family: lowpass, highpass, bandpass
        #[arg(short, long, default_value = "lowpass")]
        filter: FrequencyFilter,
        /// Cutoff radius in frequency bins
        #[arg(short, long, default_value_t = 30.0)]
        cutoff: f64,
    },

    /// Segment the image into a binary map
    Segment {
        /// Input image file or directory
        input: PathBuf,
        /// Method: edge, threshold, otsu, adaptive
        #[arg(short, long, default_value = "otsu")]
        method: SegmentationMethod,
        /// Threshold value (only used by the threshold method)
        #[arg(short, long, default_value_t = 127)]
        threshold: u8,
    },

    /// Trace significant contours and report their geometry
    Contours {
        /// Input image file
        input: PathBuf,
    },

    /// Extract shape, texture, and statistical descriptors per region
    Describe {
        /// Input image file
        input: PathBuf,
        /// Also save an overlay with boundaries and region ids
        #[arg(long)]
        render: bool,
    },

    /// Embed an invisible frequency-domain watermark
    Embed {
        /// Carrier image
        main: PathBuf,
        /// Watermark image
        mark: PathBuf,
        /// Embedding strength (0.0-1.0)
        #[arg(short, long, default_value_t = 0.1)]
        alpha: f64,
    },

    /// Overlay a visible edge-map watermark
    Visible {
        /// Carrier image
        main: PathBuf,
        /// Watermark image
        mark: PathBuf,
        /// Edge overlay opacity in percent (0-100)
        #[arg(long, default_value_t = 30)]
        opacity: u8,
    },

    /// Recover a watermark from a marked image
    Extract {
        /// The unmarked original
        original: PathBuf,
        /// The marked image
        marked: PathBuf,
        /// Method: fourier, edge
        #[arg(short, long, default_value = "fourier")]
        method: ExtractionMethod,
    },

    /// Blend two images along a gradient mask
    Blend {
        /// Image shown where the mask is 0
        first: PathBuf,
        /// Image shown where the mask is 1
        second: PathBuf,
        /// Gradient direction: horizontal, vertical, diagonal
        #[arg(short, long, default_value = "horizontal")]
        direction: GradientDirection,
        /// Transition curve: linear, sigmoid, cosine
        #[arg(long, default_value = "linear")]
        curve: BlendCurve,
        /// Maximum blend weight (0.0-1.0)
        #[arg(short, long, default_value_t = 1.0)]
        alpha: f32,
    },

    /// Print dimensions, intensity statistics, and histogram summary
    Info {
        /// Input image file
        input: PathBuf,
    },
}

/// Outcome of one file, for the [OK]/[FAIL] report.
struct RunResult {
    path: PathBuf,
    success: bool,
    message: String,
}

fn main() {
    let cli = Cli::parse();

    let results = match dispatch(&cli) {
        Ok(results) => results,
        Err(msg) => {
            eprintln!("Error: {msg}");
            process::exit(1);
        }
    };

    let mut success_count = 0u32;
    let mut fail_count = 0u32;
    for r in &results {
        print_result(r, cli.quiet);
        if r.success {
            success_count += 1;
        } else {
            fail_count += 1;
        }
    }

    if results.len() > 1 && !cli.quiet {
        eprintln!();
        eprint!("[Summary] Processed: {success_count}");
        if fail_count > 0 {
            eprint!(", Failed: {fail_count}");
        }
        eprintln!(" (Total: {})", results.len());
    }

    if fail_count > 0 {
        process::exit(1);
    }
}

fn print_result(result: &RunResult, quiet: bool) {
    let filename = result.path.file_name().map_or_else(
        || result.path.display().to_string(),
        |f| f.to_string_lossy().to_string(),
    );
    if result.success {
        if !quiet {
            eprintln!("[OK] {filename}: {}", result.message);
        }
    } else {
        eprintln!("[FAIL] {filename}: {}", result.message);
    }
}

fn dispatch(cli: &Cli) -> Result<Vec<RunResult>, String> {
    match &cli.command {
        Command::Filter {
            input,
            filter,
            kernel_size,
        } => {
            if *kernel_size == 0 {
                return Err("Kernel size must be at least 1".to_string());
            }
            let (filter, kernel_size) = (*filter, *kernel_size);
            run_single_input(
                cli,
                input,
                "filter",
                &filter.to_string(),
                move |img| apply_filter(img, filter, kernel_size),
            )
        }

        Command::Equalize { input, method } => {
            let method = *method;
            run_single_input(cli, input, "equalize", &method.to_string(), move |img| {
                equalize(img, method)
            })
        }

        Command::Match { input, reference } => {
            let reference = load_image(reference).map_err(|e| e.to_string())?;
            run_single_input(cli, input, "match", "histogram", move |img| {
                match_histograms(img, &reference)
            })
        }

        Command::Spectral {
            input,
            filter,
            cutoff,
        } => {
            if *cutoff <= 0.0 {
                return Err("Cutoff must be positive".to_string());
            }
            let (filter, cutoff) = (*filter, *cutoff);
            run_single_input(
                cli,
                input,
                "spectral",
                &filter.to_string(),
                move |img| apply_frequency_filter(img, filter, cutoff),
            )
        }

        Command::Segment {
            input,
            method,
            threshold,
        } => {
            let (method, threshold) = (*method, *threshold);
            run_single_input(cli, input, "segment", &method.to_string(), move |img| {
                segment(img, method, threshold)
            })
        }

        Command::Contours { input } => run_contours(cli, input),
        Command::Describe { input, render } => run_describe(cli, input, *render),

        Command::Embed { main, mark, alpha } => {
            if !(0.0..=1.0).contains(alpha) {
                return Err("Alpha must be between 0.0 and 1.0".to_string());
            }
            run_pair(cli, main, mark, "watermark", "embed", |a, b| {
                embed_invisible(a, b, *alpha)
            })
        }

        Command::Visible {
            main,
            mark,
            opacity,
        } => {
            if *opacity > 100 {
                return Err("Opacity must be between 0 and 100".to_string());
            }
            run_pair(cli, main, mark, "watermark", "visible", |a, b| {
                apply_visible(a, b, *opacity)
            })
        }

        Command::Extract {
            original,
            marked,
            method,
        } => run_pair(
            cli,
            original,
            marked,
            "extract",
            &method.to_string(),
            |a, b| extract(a, b, *method),
        ),

        Command::Blend {
            first,
            second,
            direction,
            curve,
            alpha,
        } => {
            if !(0.0..=1.0).contains(alpha) {
                return Err("Alpha must be between 0.0 and 1.0".to_string());
            }
            run_pair(cli, first, second, "blend", &direction.to_string(), |a, b| {
                blend_images(a, b, *direction, *curve, *alpha)
            })
        }

        Command::Info { input } => run_info(input),
    }
}

/// Run a one-image transform on a file, or on every supported image in a
/// directory when `input` is one.
fn run_single_input<F>(
    cli: &Cli,
    input: &Path,
    operation: &str,
    method: &str,
    op: F,
) -> Result<Vec<RunResult>, String>
where
    F: Fn(&RgbImage) -> RgbImage + Send + Sync,
{
    if input.is_dir() {
        let Some(output_dir) = cli.output.as_deref() else {
            return Err(format!(
                "Output directory is required for batch processing\n\
                 Usage: pixlab {operation} <input_dir> -o <output_dir>"
            ));
        };
        return run_batch(input, output_dir, &op);
    }

    let output = cli
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(operation, method));
    Ok(vec![process_one(input, &output, &op)])
}

fn run_batch<F>(input_dir: &Path, output_dir: &Path, op: &F) -> Result<Vec<RunResult>, String>
where
    F: Fn(&RgbImage) -> RgbImage + Send + Sync,
{
    let entries: Vec<PathBuf> = std::fs::read_dir(input_dir)
        .map_err(|e| format!("Failed to read directory: {e}"))?
        .filter_map(std::result::Result::ok)
        .map(|e| e.path())
        .filter(|p| p.is_file() && is_supported_image(p))
        .collect();

    if !output_dir.exists() {
        std::fs::create_dir_all(output_dir)
            .map_err(|e| format!("Failed to create output directory: {e}"))?;
    }

    Ok(entries
        .par_iter()
        .map(|input_path| {
            let filename = input_path.file_name().unwrap_or_default();
            let output_path = output_dir.join(filename);
            process_one(input_path, &output_path, op)
        })
        .collect())
}

fn process_one<F>(input: &Path, output: &Path, op: &F) -> RunResult
where
    F: Fn(&RgbImage) -> RgbImage + Send + Sync,
{
    let mut result = RunResult {
        path: input.to_path_buf(),
        success: false,
        message: String::new(),
    };

    let img = match load_image(input) {
        Ok(img) => img,
        Err(e) => {
            result.message = format!("Failed to load: {e}");
            return result;
        }
    };

    let transformed = op(&img);

    match save_image(&transformed, output) {
        Ok(()) => {
            result.success = true;
            result.message = format!("wrote {}", output.display());
        }
        Err(e) => {
            result.message = format!("Failed to save: {e}");
        }
    }
    result
}

/// Run a two-image transform on a pair of files.
fn run_pair<F>(
    cli: &Cli,
    first: &Path,
    second: &Path,
    operation: &str,
    method: &str,
    op: F,
) -> Result<Vec<RunResult>, String>
where
    F: Fn(&RgbImage, &RgbImage) -> RgbImage,
{
    let mut result = RunResult {
        path: first.to_path_buf(),
        success: false,
        message: String::new(),
    };

    let a = match load_image(first) {
        Ok(img) => img,
        Err(e) => {
            result.message = format!("Failed to load: {e}");
            return Ok(vec![result]);
        }
    };
    let b = match load_image(second) {
        Ok(img) => img,
        Err(e) => {
            result.message = format!("Failed to load: {e}");
            return Ok(vec![result]);
        }
    };

    let out_img = op(&a, &b);
    let output = cli
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(operation, method));

    match save_image(&out_img, &output) {
        Ok(()) => {
            result.success = true;
            result.message = format!("wrote {}", output.display());
        }
        Err(e) => {
            result.message = format!("Failed to save: {e}");
        }
    }
    Ok(vec![result])
}

fn run_contours(cli: &Cli, input: &Path) -> Result<Vec<RunResult>, String> {
    let img = load_image(input).map_err(|e| e.to_string())?;
    let (overlay, stats) = find_contours(&img);

    println!("{} significant contour(s)", stats.len());
    for s in &stats {
        println!(
            "  #{:<3} area {:>10.1}  perimeter {:>8.1}  points {:>5}",
            s.id, s.area, s.perimeter, s.points
        );
    }

    let output = cli
        .output
        .clone()
        .unwrap_or_else(|| default_output_path("contours", "overlay"));
    save_image(&overlay, &output).map_err(|e| e.to_string())?;

    Ok(vec![RunResult {
        path: input.to_path_buf(),
        success: true,
        message: format!("wrote {}", output.display()),
    }])
}

fn run_describe(cli: &Cli, input: &Path, render: bool) -> Result<Vec<RunResult>, String> {
    let img = load_image(input).map_err(|e| e.to_string())?;
    let descriptors = extract_region_descriptors(&img);

    println!("{} region(s)", descriptors.shape.len());
    for ((shape, texture), stats) in descriptors
        .shape
        .iter()
        .zip(&descriptors.texture)
        .zip(&descriptors.statistics)
    {
        println!("region #{}", shape.contour_id);
        println!(
            "  shape:      area {:.1}, perimeter {:.1}, aspect {:.3}, solidity {:.3}",
            shape.area, shape.perimeter, shape.aspect_ratio, shape.solidity
        );
        print!("  hu:        ");
        for h in shape.hu_moments {
            print!(" {h:.3e}");
        }
        println!();
        println!(
            "  texture:    mean {:.2}, std {:.2}, energy {:.3e}, entropy {:.3}",
            texture.mean_intensity, texture.std_intensity, texture.energy, texture.entropy
        );
        println!(
            "  statistics: min {:.0}, max {:.0}, median {:.1}, skew {:.3}, kurtosis {:.3}",
            stats.min, stats.max, stats.median, stats.skewness, stats.kurtosis
        );
    }

    let mut message = format!("{} region(s) described", descriptors.shape.len());
    if render || cli.output.is_some() {
        let overlay = render_regions(&img);
        let output = cli
            .output
            .clone()
            .unwrap_or_else(|| default_output_path("describe", "regions"));
        save_image(&overlay, &output).map_err(|e| e.to_string())?;
        message = format!("wrote {}", output.display());
    }

    Ok(vec![RunResult {
        path: input.to_path_buf(),
        success: true,
        message,
    }])
}

fn run_info(input: &Path) -> Result<Vec<RunResult>, String> {
    let img = load_image(input).map_err(|e| e.to_string())?;
    let info = image_info(&img);
    let report = histogram_report(&img);

    println!("{}", input.display());
    println!("  dimensions: {}x{} ({} channels)", info.width, info.height, info.channels);
    println!(
        "  intensity:  mean {:.2}, std {:.2}, min {}, max {}",
        info.mean_intensity, info.std_intensity, report.min, report.max
    );
    for (name, hist) in ["red", "green", "blue"].iter().zip(&report.channels) {
        let peak = hist
            .iter()
            .enumerate()
            .max_by_key(|(_, &count)| count)
            .map_or(0, |(bin, _)| bin);
        let occupied = hist.iter().filter(|&&c| c > 0).count();
        println!("  {name:<5} histogram: peak bin {peak}, {occupied} occupied bins");
    }

    Ok(vec![RunResult {
        path: input.to_path_buf(),
        success: true,
        message: "ok".to_string(),
    }])
}

/// Timestamped default output name, e.g. `filter_gaussian_20260829_153000.jpg`.
fn default_output_path(operation: &str, method: &str) -> PathBuf {
    let stamp = Local::now().format("%Y%m%d_%H%M%S");
    PathBuf::from(format!("{operation}_{method}_{stamp}.jpg"))
}
