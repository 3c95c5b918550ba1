//! End-to-end scenario tests for sepfilter
//!
//! These tests pin the concrete behaviors a deployment relies on: constant
//! inputs passing through unchanged, tile tails leaving foreign memory
//! untouched, mixed output conventions reconciling inside the validator,
//! and caller-supplied variants plugging into the same capability trait.

use sepfilter::{
    plane_from_luma16, plane_to_luma16, validate, BoxBlurNaive, BoxBlurTiled, FilterError,
    FilterPipeline, Gray16Image, ImagePlane, OutputExtent, Planar3, ScanMode, TileConfig,
    Tolerance, UnsharpNaive, UnsharpTiled, ValidationConfig, ValidationError,
};

/// A DC-gain-1 box filter is a no-op on constant input: a 260x34 buffer of
/// 99 must blur to 99 everywhere, through both variants.
#[test]
fn constant_input_box_blur_is_identity() {
    let input = ImagePlane::filled(260, 34, 99u16);
    for pipeline in [
        &BoxBlurNaive::new(OutputExtent::Shrunk) as &dyn FilterPipeline<Buffer = ImagePlane<u16>>,
        &BoxBlurTiled::default(),
    ] {
        let (width, height) = pipeline.output_extent(260, 34);
        assert_eq!((width, height), (258, 32));
        let mut output = ImagePlane::new(width, height);
        pipeline.run(&input, &mut output).unwrap();
        for y in 0..height {
            for x in 0..width {
                assert_eq!(output.get(x, y), 99, "{} at ({x}, {y})", pipeline.name());
            }
        }
    }
}

/// For a truly constant gray image, blur == gray, so sharpen == gray,
/// ratio == 1 and the unsharp output equals the input.
#[test]
fn constant_gray_unsharp_is_identity() {
    let input = Planar3::from_fn(256, 64, |_, _, _| 128.0f32);
    for (name, result) in [
        ("naive", {
            let mut out = Planar3::new(256, 64);
            UnsharpNaive.run(&input, &mut out).unwrap();
            out
        }),
        ("tiled", {
            let mut out = Planar3::new(256, 64);
            UnsharpTiled::default().run(&input, &mut out).unwrap();
            out
        }),
    ] {
        for c in 0..3 {
            for y in 0..64 {
                for x in 0..256 {
                    let v = result.plane(c).get(x, y);
                    assert!((v - 128.0).abs() <= 1e-3, "{name} ({x}, {y}, {c}): {v}");
                }
            }
        }
    }
}

/// The masked tail must never write past the declared extent: canary
/// samples in the stride gap of every output row survive a tiled run whose
/// width ends mid-lane.
#[test]
fn tail_steps_leave_stride_canaries_untouched() {
    let input = ImagePlane::from_fn(29, 13, |x, y| ((x * 7 + y * 31) % 4096) as u16);
    // 27 output columns: three full lane steps plus a 3-lane tail.
    let mut output = ImagePlane::<u16>::with_stride(27, 11, 35);
    output.as_raw_mut().fill(0xDEAD);
    let pipeline = BoxBlurTiled::new(
        OutputExtent::Shrunk,
        TileConfig {
            band_rows: 4,
            block_cols: 8,
        },
    );
    pipeline.run(&input, &mut output).unwrap();

    let reference = {
        let mut out = ImagePlane::new(27, 11);
        BoxBlurNaive::new(OutputExtent::Shrunk)
            .run(&input, &mut out)
            .unwrap();
        out
    };
    for y in 0..11 {
        assert_eq!(output.row(y), reference.row(y), "row {y}");
        for gap in 27..35 {
            assert_eq!(output.as_raw()[y * 35 + gap], 0xDEAD, "row {y}, gap {gap}");
        }
    }
}

/// The validator reconciles the shrunk and same-size conventions by
/// cropping to the common interior: all four box variants agree exactly.
#[test]
fn mixed_extent_conventions_validate_exactly() {
    let input = ImagePlane::from_fn(70, 41, |x, y| ((x * 97 + y * 13) % 65536) as u16);
    let naive_shrunk = BoxBlurNaive::new(OutputExtent::Shrunk);
    let tiled_shrunk = BoxBlurTiled::new(OutputExtent::Shrunk, TileConfig::default());
    let naive_full = BoxBlurNaive::new(OutputExtent::Full);
    let tiled_full = BoxBlurTiled::new(
        OutputExtent::Full,
        TileConfig {
            band_rows: 16,
            block_cols: 32,
        },
    );
    let variants: Vec<&dyn FilterPipeline<Buffer = ImagePlane<u16>>> =
        vec![&naive_shrunk, &tiled_shrunk, &naive_full, &tiled_full];
    validate(&input, &variants, &ValidationConfig::default()).unwrap();
}

#[test]
fn unsharp_variants_validate_within_epsilon() {
    let input = Planar3::from_fn(80, 40, |c, x, y| {
        200.0 + (c as f32) * 31.0 + ((x + y) as f32) * 0.75
    });
    let naive = UnsharpNaive;
    let tiled = UnsharpTiled::default();
    let narrow_bands = UnsharpTiled::new(5);
    let variants: Vec<&dyn FilterPipeline<Buffer = Planar3<f32>>> =
        vec![&naive, &tiled, &narrow_bands];
    validate(
        &input,
        &variants,
        &ValidationConfig {
            tolerance: Tolerance::Absolute(1e-6),
            mode: ScanMode::FailFast,
        },
    )
    .unwrap();
}

/// A caller-supplied variant plugs into the same capability trait the
/// built-in ones use; a defect in it is pinned to its exact coordinate.
struct PerturbedBoxBlur {
    inner: BoxBlurNaive,
}

impl FilterPipeline for PerturbedBoxBlur {
    type Buffer = ImagePlane<u16>;

    fn name(&self) -> &'static str {
        "box-blur/perturbed"
    }

    fn margin(&self) -> usize {
        self.inner.margin()
    }

    fn output_extent(&self, in_width: usize, in_height: usize) -> (usize, usize) {
        self.inner.output_extent(in_width, in_height)
    }

    fn run(&self, input: &Self::Buffer, output: &mut Self::Buffer) -> Result<(), FilterError> {
        self.inner.run(input, output)?;
        let sample = output.get(12, 7);
        output.set(12, 7, sample + 3);
        Ok(())
    }
}

#[test]
fn validator_pins_a_faulty_variant_to_its_coordinate() {
    let input = ImagePlane::filled(40, 20, 600u16);
    let reference = BoxBlurNaive::new(OutputExtent::Shrunk);
    let faulty = PerturbedBoxBlur { inner: reference };
    let variants: Vec<&dyn FilterPipeline<Buffer = ImagePlane<u16>>> = vec![&reference, &faulty];

    let err = validate(&input, &variants, &ValidationConfig::default()).unwrap_err();
    match err {
        ValidationError::Mismatch { report } => {
            assert_eq!(report.candidate, "box-blur/perturbed");
            assert_eq!(report.mismatch_count, 1);
            let first = report.first().unwrap();
            assert_eq!((first.x, first.y, first.channel), (12, 7, 0));
            assert_eq!(first.reference, 600.0);
            assert_eq!(first.candidate, 603.0);
        }
        other => panic!("expected a mismatch, got {other:?}"),
    }
}

/// Decoded images convert losslessly through the adapters around a blur.
#[test]
fn image_adapters_round_trip_around_a_blur() {
    let image = Gray16Image::from_fn(20, 12, |x, y| image::Luma([(x * 100 + y) as u16]));
    let plane = plane_from_luma16(&image);
    assert_eq!(plane_to_luma16(&plane), image);

    let mut blurred = ImagePlane::new(18, 10);
    BoxBlurTiled::default().run(&plane, &mut blurred).unwrap();
    let out_image = plane_to_luma16(&blurred);
    assert_eq!(out_image.dimensions(), (18, 10));
}
