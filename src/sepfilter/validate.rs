//! Cross-implementation equivalence checking.
//!
//! The validator runs two or more variants of the same filter over one
//! input and compares their outputs under a tolerance policy: exact
//! equality for integer filters, an absolute epsilon for float filters. A
//! numeric mismatch is a correctness failure: it is reported with full
//! location and value context and never averaged away.

use std::fmt;

use crate::error::ValidationError;

use super::buffer::SampleBuffer;
use super::pipeline::FilterPipeline;

/// Per-comparison tolerance policy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Tolerance {
    /// Bit-for-bit equality, required for integer filters.
    Exact,
    /// `|a - b| <= eps`. Tight (e.g. 1e-6) for algorithmically identical
    /// float variants; loose (e.g. 1e-2) for variants with materially
    /// different arithmetic.
    Absolute(f32),
}

impl Tolerance {
    fn holds(&self, a: f64, b: f64) -> bool {
        match *self {
            Self::Exact => a == b,
            Self::Absolute(eps) => (a - b).abs() <= f64::from(eps),
        }
    }
}

impl fmt::Display for Tolerance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::Exact => write!(f, "exact"),
            Self::Absolute(eps) => write!(f, "|a-b| <= {eps}"),
        }
    }
}

/// How far to scan once a violation is found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanMode {
    /// Stop at the first violation.
    FailFast,
    /// Scan the whole extent, recording at most `max_reports` mismatches
    /// (the total count is always exact).
    Full { max_reports: usize },
}

/// One tolerance violation.
#[derive(Debug, Clone, PartialEq)]
pub struct Mismatch {
    pub x: usize,
    pub y: usize,
    pub channel: usize,
    pub reference: f64,
    pub candidate: f64,
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {}, channel {}): {} vs {}",
            self.x, self.y, self.channel, self.reference, self.candidate
        )
    }
}

/// Outcome of comparing one candidate against the reference.
///
/// Coordinates are relative to the compared region; an empty report means
/// the outputs are equivalent over the whole extent.
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonReport {
    pub candidate: String,
    pub tolerance: Tolerance,
    /// Exact number of violating samples over the scanned region.
    pub mismatch_count: usize,
    /// First violations, capped by the scan mode.
    pub mismatches: Vec<Mismatch>,
}

impl ComparisonReport {
    pub fn is_equivalent(&self) -> bool {
        self.mismatch_count == 0
    }

    pub fn first(&self) -> Option<&Mismatch> {
        self.mismatches.first()
    }
}

impl fmt::Display for ComparisonReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.first() {
            None => write!(f, "'{}' is equivalent to the reference", self.candidate),
            Some(first) => write!(
                f,
                "'{}' diverged from the reference at {} sample(s) under tolerance {}; first at {}",
                self.candidate, self.mismatch_count, self.tolerance, first
            ),
        }
    }
}

/// Validator configuration: tolerance plus scan behavior.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValidationConfig {
    pub tolerance: Tolerance,
    pub mode: ScanMode,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            tolerance: Tolerance::Exact,
            mode: ScanMode::FailFast,
        }
    }
}

/// Compare two equal-extent buffers sample by sample.
pub fn compare_buffers<B: SampleBuffer>(
    reference: &B,
    candidate: &B,
    name: &str,
    tolerance: Tolerance,
    mode: ScanMode,
) -> ComparisonReport {
    compare_cropped(reference, candidate, 0, 0, name, tolerance, mode)
}

/// Compare two buffers over their common interior, skipping `crop_ref` /
/// `crop_cand` border samples per side of the respective buffer. Report
/// coordinates are relative to the cropped region.
pub fn compare_cropped<B: SampleBuffer>(
    reference: &B,
    candidate: &B,
    crop_ref: usize,
    crop_cand: usize,
    name: &str,
    tolerance: Tolerance,
    mode: ScanMode,
) -> ComparisonReport {
    let width = reference.width() - 2 * crop_ref;
    let height = reference.height() - 2 * crop_ref;
    debug_assert_eq!(width, candidate.width() - 2 * crop_cand);
    debug_assert_eq!(height, candidate.height() - 2 * crop_cand);
    let channels = reference.channels();
    let keep = match mode {
        ScanMode::FailFast => 1,
        ScanMode::Full { max_reports } => max_reports,
    };

    let mut report = ComparisonReport {
        candidate: name.to_string(),
        tolerance,
        mismatch_count: 0,
        mismatches: Vec::new(),
    };
    'scan: for y in 0..height {
        for x in 0..width {
            for c in 0..channels {
                let a = reference.sample(x + crop_ref, y + crop_ref, c);
                let b = candidate.sample(x + crop_cand, y + crop_cand, c);
                if !tolerance.holds(a, b) {
                    report.mismatch_count += 1;
                    if report.mismatches.len() < keep {
                        report.mismatches.push(Mismatch {
                            x,
                            y,
                            channel: c,
                            reference: a,
                            candidate: b,
                        });
                    }
                    if mode == ScanMode::FailFast {
                        break 'scan;
                    }
                }
            }
        }
    }
    report
}

/// Run every variant over `input` and assert equivalence against the first
/// one (the reference).
///
/// Variants may use different output-extent conventions: each output is
/// cropped by its margin's difference to the largest margin, so all
/// comparisons happen over the common interior.
pub fn validate<B: SampleBuffer>(
    input: &B,
    variants: &[&dyn FilterPipeline<Buffer = B>],
    config: &ValidationConfig,
) -> Result<(), ValidationError> {
    assert!(
        variants.len() >= 2,
        "validation needs a reference and at least one candidate"
    );
    let max_margin = variants.iter().map(|v| v.margin()).max().unwrap_or(0);

    let mut outputs = Vec::with_capacity(variants.len());
    for variant in variants {
        let (out_width, out_height) = variant.output_extent(input.width(), input.height());
        let mut output = B::alloc(out_width, out_height);
        variant
            .run(input, &mut output)
            .map_err(|source| ValidationError::Pipeline {
                name: variant.name().to_string(),
                source,
            })?;
        outputs.push(output);
    }

    let reference = &outputs[0];
    let crop_ref = max_margin - variants[0].margin();
    let region_width = reference.width() - 2 * crop_ref;
    let region_height = reference.height() - 2 * crop_ref;

    for (variant, output) in variants.iter().zip(&outputs).skip(1) {
        let crop = max_margin - variant.margin();
        let cropped_width = output.width() - 2 * crop;
        let cropped_height = output.height() - 2 * crop;
        if (cropped_width, cropped_height) != (region_width, region_height) {
            return Err(ValidationError::Region {
                name: variant.name().to_string(),
                expected_width: region_width,
                expected_height: region_height,
                actual_width: cropped_width,
                actual_height: cropped_height,
            });
        }
        let report = compare_cropped(
            reference,
            output,
            crop_ref,
            crop,
            variant.name(),
            config.tolerance,
            config.mode,
        );
        if !report.is_equivalent() {
            return Err(ValidationError::Mismatch { report });
        }
    }
    Ok(())
}
