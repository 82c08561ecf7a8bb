use image::RgbImage;

use pixlab::{
    apply_filter, apply_frequency_filter, apply_visible, blend_images, embed_invisible, equalize,
    extract, extract_region_descriptors, find_contours, histogram_report, load_image,
    match_histograms, save_image, segment, BlendCurve, ConvolutionFilter, EqualizeMethod,
    ExtractionMethod, FrequencyFilter, GradientDirection, SegmentationMethod,
};

fn solid(width: u32, height: u32, value: u8) -> RgbImage {
    RgbImage::from_pixel(width, height, image::Rgb([value, value, value]))
}

/// Left half dark, right half bright.
fn bimodal(width: u32, height: u32, lo: u8, hi: u8) -> RgbImage {
    RgbImage::from_fn(width, height, |x, _| {
        if x < width / 2 {
            image::Rgb([lo, lo, lo])
        } else {
            image::Rgb([hi, hi, hi])
        }
    })
}

#[test]
fn gaussian_filter_preserves_constant_images() {
    let img = solid(32, 32, 97);
    let out = apply_filter(&img, ConvolutionFilter::Gaussian, 7);
    assert_eq!(out.dimensions(), (32, 32));
    for px in out.pixels() {
        assert_eq!(px.0, [97, 97, 97]);
    }
}

#[test]
fn sobel_responds_to_a_vertical_edge() {
    let img = bimodal(40, 40, 0, 255);
    let out = apply_filter(&img, ConvolutionFilter::SobelX, 3);
    // Strong response at the step, none in the flat halves.
    assert!(out.get_pixel(20, 20).0[0] > 100);
    assert_eq!(out.get_pixel(5, 20).0[0], 0);
    assert_eq!(out.get_pixel(35, 20).0[0], 0);
}

#[test]
fn global_equalization_spreads_a_narrow_band() {
    // All luma packed into [100, 110].
    let img = RgbImage::from_fn(64, 64, |x, _| {
        let v = 100 + (x % 11) as u8;
        image::Rgb([v, v, v])
    });
    let before = histogram_report(&img);
    let after_img = equalize(&img, EqualizeMethod::Global);
    let after = histogram_report(&after_img);

    assert!(u16::from(before.max) - u16::from(before.min) <= 10);
    assert_eq!(after.min, 0);
    assert!(after.max >= 250);
}

#[test]
fn clahe_keeps_dimensions_and_range() {
    let img = RgbImage::from_fn(100, 80, |x, y| {
        let v = ((x + y) % 60 + 90) as u8;
        image::Rgb([v, v, v])
    });
    let out = equalize(&img, EqualizeMethod::Clahe);
    assert_eq!(out.dimensions(), (100, 80));
    let report = histogram_report(&out);
    assert!(report.std > 0.0);
}

#[test]
fn histogram_matching_moves_the_mean_toward_the_reference() {
    let source = solid(50, 50, 60);
    let reference = solid(50, 50, 190);
    let matched = match_histograms(&source, &reference);

    let src_mean = histogram_report(&source).mean;
    let out_mean = histogram_report(&matched).mean;
    let ref_mean = histogram_report(&reference).mean;
    assert!(
        (out_mean - ref_mean).abs() < (src_mean - ref_mean).abs(),
        "matched mean {out_mean:.1} no closer to reference {ref_mean:.1} than source {src_mean:.1}"
    );
}

#[test]
fn invisible_watermark_barely_changes_the_carrier() {
    let main = RgbImage::from_fn(64, 64, |x, y| {
        let v = ((x * 3 + y * 5) % 200 + 20) as u8;
        image::Rgb([v, v, v])
    });
    let mark = solid(64, 64, 100);
    let marked = embed_invisible(&main, &mark, 0.05);

    let mut total_diff = 0u64;
    for (a, b) in main.pixels().zip(marked.pixels()) {
        for c in 0..3 {
            total_diff += u64::from(a.0[c].abs_diff(b.0[c]));
        }
    }
    let mean_diff = total_diff as f64 / (64.0 * 64.0 * 3.0);
    assert!(mean_diff < 8.0, "mean per-sample change {mean_diff:.2}");
}

#[test]
fn fourier_extraction_recovers_an_embedded_mark() {
    let main = RgbImage::from_fn(32, 32, |x, y| {
        if (x + y) % 2 == 0 {
            image::Rgb([0, 0, 0])
        } else {
            image::Rgb([200, 200, 200])
        }
    });
    let mark = solid(32, 32, 100);
    let marked = embed_invisible(&main, &mark, 0.1);
    let recovered = extract(&main, &marked, ExtractionMethod::Fourier);

    // The recovered plane approximates alpha * mark.
    for px in recovered.pixels() {
        assert!(
            (i16::from(px.0[0]) - 10).abs() <= 1,
            "recovered sample {} far from 10",
            px.0[0]
        );
    }
}

#[test]
fn visible_watermark_is_identity_at_zero_opacity() {
    let main = bimodal(48, 48, 40, 210);
    let mark = bimodal(48, 48, 0, 255);
    let out = apply_visible(&main, &mark, 0);
    assert_eq!(out, main);
}

#[test]
fn edge_extraction_returns_a_binary_map() {
    let original = solid(48, 48, 40);
    let marked = apply_visible(&original, &bimodal(48, 48, 0, 255), 100);
    let recovered = extract(&original, &marked, ExtractionMethod::Edge);
    for px in recovered.pixels() {
        assert!(px.0[0] == 0 || px.0[0] == 255);
    }
}

#[test]
fn frequency_filters_flatten_constant_images() {
    let img = solid(32, 32, 120);
    for filter in [
        FrequencyFilter::Lowpass,
        FrequencyFilter::Highpass,
        FrequencyFilter::Bandpass,
    ] {
        let out = apply_frequency_filter(&img, filter, 10.0);
        assert_eq!(out.dimensions(), (32, 32));
        for px in out.pixels() {
            assert_eq!(px.0, [0, 0, 0], "{filter} of a flat image");
        }
    }
}

#[test]
fn lowpass_smooths_more_than_highpass_keeps() {
    let img = bimodal(64, 64, 0, 255);
    let low = apply_frequency_filter(&img, FrequencyFilter::Lowpass, 8.0);
    let high = apply_frequency_filter(&img, FrequencyFilter::Highpass, 8.0);
    let low_std = histogram_report(&low).std;
    let high_std = histogram_report(&high).std;
    assert!(low_std > 0.0);
    assert!(high_std > 0.0);
    // The step's energy is low-frequency; lowpass keeps the contrast.
    assert!(low_std > high_std);
}

#[test]
fn otsu_separates_a_bimodal_image() {
    let img = bimodal(60, 60, 30, 220);
    let out = segment(&img, SegmentationMethod::Otsu, 0);
    assert_eq!(out.get_pixel(10, 30).0, [0, 0, 0]);
    assert_eq!(out.get_pixel(50, 30).0, [255, 255, 255]);
}

#[test]
fn segmentation_outputs_are_binary_for_every_method() {
    let img = RgbImage::from_fn(50, 50, |x, y| {
        let v = ((x * 5 + y * 3) % 256) as u8;
        image::Rgb([v, v, v])
    });
    for method in [
        SegmentationMethod::Edge,
        SegmentationMethod::Threshold,
        SegmentationMethod::Otsu,
        SegmentationMethod::Adaptive,
    ] {
        let out = segment(&img, method, 127);
        for px in out.pixels() {
            assert!(px.0[0] == 0 || px.0[0] == 255, "{method} not binary");
            assert_eq!(px.0[0], px.0[1]);
            assert_eq!(px.0[1], px.0[2]);
        }
    }
}

#[test]
fn contour_and_descriptor_pipelines_agree_on_region_count() {
    let mut img = solid(120, 120, 0);
    for y in 10..40 {
        for x in 10..50 {
            img.put_pixel(x, y, image::Rgb([255, 255, 255]));
        }
    }
    for y in 60..110 {
        for x in 70..110 {
            img.put_pixel(x, y, image::Rgb([255, 255, 255]));
        }
    }

    let (overlay, stats) = find_contours(&img);
    assert_eq!(stats.len(), 2);
    assert_eq!(overlay.dimensions(), img.dimensions());

    let descriptors = extract_region_descriptors(&img);
    assert_eq!(descriptors.shape.len(), 2);
    assert_eq!(descriptors.texture.len(), 2);
    assert_eq!(descriptors.statistics.len(), 2);
}

#[test]
fn blend_is_monotone_along_the_gradient() {
    let white = solid(80, 80, 255);
    let black = solid(80, 80, 0);
    for curve in [BlendCurve::Linear, BlendCurve::Sigmoid, BlendCurve::Cosine] {
        let out = blend_images(&white, &black, GradientDirection::Horizontal, curve, 1.0);
        let mut prev = 255u8;
        for x in 0..80 {
            let v = out.get_pixel(x, 40).0[0];
            assert!(v <= prev, "{curve} not monotone at column {x}");
            prev = v;
        }
        assert_eq!(out.get_pixel(0, 40).0[0], 255);
        assert_eq!(out.get_pixel(79, 40).0[0], 0);
    }
}

#[test]
fn transform_results_survive_a_png_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("segmented.png");

    let img = bimodal(40, 40, 20, 230);
    let out = segment(&img, SegmentationMethod::Otsu, 0);
    save_image(&out, &path).unwrap();
    let loaded = load_image(&path).unwrap();
    assert_eq!(loaded, out);
}
