//! Filter pipelines: naive whole-image references and tiled, lane-vectorized
//! variants of the same two filters.
//!
//! Every variant of a filter computes the same numbers. The box pair is
//! bit-for-bit identical; the unsharp pair shares its row arithmetic (same
//! f32 operations in the same order), so it stays within the tight
//! cross-variant tolerance.

use crate::error::FilterError;

use super::boundary::{clamp_index, pad_plane, pad_planar};
use super::buffer::{ImagePlane, Planar3, PlaneView, SampleBuffer};
use super::convolve::{
    box3_h_row, box3_h_row_edge, box3_v_row, luma_row, luma_scalar, modulate_row,
    sharpen_ratio_row, tap7_scalar, tap7_v_ring,
};
use super::kernel::{div3_trunc, BOX3_RADIUS, BOX3_TAPS, GAUSS7_RADIUS, GAUSS7_TAPS};
use super::rolling::RollingBuffer;
use super::tile::{for_each_band, Tile, TileConfig, TileGrid};

/// Output extent convention of the box pipelines.
///
/// The convention is an explicit configuration choice; nothing infers it
/// from buffer sizes. The validator reconciles mixed conventions by
/// cropping to the common interior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputExtent {
    /// Only the fully-valid interior: the output shrinks by `2r` per axis
    /// and no boundary samples are synthesized.
    #[default]
    Shrunk,
    /// Same-size output; taps past the input edge read edge-replicated
    /// samples.
    Full,
}

/// A runnable implementation variant of a filter.
///
/// The validator depends on this capability alone, never on
/// variant-specific internals.
pub trait FilterPipeline {
    type Buffer: SampleBuffer;

    fn name(&self) -> &'static str;

    /// Border consumed per side relative to the same-size convention; the
    /// validator crops each variant by the margin difference before
    /// comparing.
    fn margin(&self) -> usize;

    /// Output extent for a given input extent.
    fn output_extent(&self, in_width: usize, in_height: usize) -> (usize, usize);

    /// Run the filter into a caller-allocated output buffer.
    fn run(&self, input: &Self::Buffer, output: &mut Self::Buffer) -> Result<(), FilterError>;
}

fn box_output_extent(extent: OutputExtent, width: usize, height: usize) -> (usize, usize) {
    match extent {
        OutputExtent::Shrunk => (width - 2 * BOX3_RADIUS, height - 2 * BOX3_RADIUS),
        OutputExtent::Full => (width, height),
    }
}

/// Dimension checks shared by the box variants, run before any tile is
/// scheduled.
fn check_box_extents(
    input: &ImagePlane<u16>,
    output: &ImagePlane<u16>,
    extent: OutputExtent,
) -> Result<(usize, usize), FilterError> {
    let (width, height) = (input.width(), input.height());
    if width == 0 || height == 0 {
        return Err(FilterError::EmptyImage { width, height });
    }
    if width < BOX3_TAPS || height < BOX3_TAPS {
        return Err(FilterError::ExtentTooSmall {
            width,
            height,
            min: BOX3_TAPS,
        });
    }
    let (out_width, out_height) = box_output_extent(extent, width, height);
    if output.width() != out_width || output.height() != out_height {
        return Err(FilterError::DimensionMismatch {
            expected_width: out_width,
            expected_height: out_height,
            actual_width: output.width(),
            actual_height: output.height(),
        });
    }
    Ok((out_width, out_height))
}

fn check_planar_extents(
    input: &Planar3<f32>,
    output: &Planar3<f32>,
) -> Result<(usize, usize), FilterError> {
    let (width, height) = (input.width(), input.height());
    if width == 0 || height == 0 {
        return Err(FilterError::EmptyImage { width, height });
    }
    if output.width() != width || output.height() != height {
        return Err(FilterError::DimensionMismatch {
            expected_width: width,
            expected_height: height,
            actual_width: output.width(),
            actual_height: output.height(),
        });
    }
    Ok((width, height))
}

/// Whole-image scalar box blur: horizontal pass into an intermediate plane,
/// then vertical pass, truncating `/3` at each stage.
///
/// This is the reference every optimized variant is validated against. It
/// takes no tile configuration and accepts any extent of at least 3x3.
#[derive(Debug, Clone, Copy, Default)]
pub struct BoxBlurNaive {
    pub extent: OutputExtent,
}

impl BoxBlurNaive {
    pub const fn new(extent: OutputExtent) -> Self {
        Self { extent }
    }
}

impl FilterPipeline for BoxBlurNaive {
    type Buffer = ImagePlane<u16>;

    fn name(&self) -> &'static str {
        "box-blur/naive"
    }

    fn margin(&self) -> usize {
        match self.extent {
            OutputExtent::Shrunk => BOX3_RADIUS,
            OutputExtent::Full => 0,
        }
    }

    fn output_extent(&self, in_width: usize, in_height: usize) -> (usize, usize) {
        box_output_extent(self.extent, in_width, in_height)
    }

    fn run(&self, input: &Self::Buffer, output: &mut Self::Buffer) -> Result<(), FilterError> {
        let (out_width, out_height) = check_box_extents(input, output, self.extent)?;
        match self.extent {
            OutputExtent::Shrunk => {
                let mut tmp = ImagePlane::<u16>::new(out_width, input.height());
                for y in 0..input.height() {
                    let src = input.row(y);
                    let dst = tmp.row_mut(y);
                    for (x, sample) in dst.iter_mut().enumerate() {
                        let sum = u32::from(src[x])
                            + u32::from(src[x + 1])
                            + u32::from(src[x + 2]);
                        *sample = div3_trunc(sum);
                    }
                }
                for y in 0..out_height {
                    for x in 0..out_width {
                        let sum = u32::from(tmp.get(x, y))
                            + u32::from(tmp.get(x, y + 1))
                            + u32::from(tmp.get(x, y + 2));
                        output.set(x, y, div3_trunc(sum));
                    }
                }
            }
            OutputExtent::Full => {
                // Same-size path clamps indices on the fly; the tiled
                // variant materializes the pad instead. Both realizations
                // of edge replication must agree exactly.
                let (width, height) = (input.width(), input.height());
                let mut tmp = ImagePlane::<u16>::new(width, height);
                for y in 0..height {
                    for x in 0..width {
                        let xl = clamp_index(x as isize - 1, width);
                        let xr = clamp_index(x as isize + 1, width);
                        let sum = u32::from(input.get(xl, y))
                            + u32::from(input.get(x, y))
                            + u32::from(input.get(xr, y));
                        tmp.set(x, y, div3_trunc(sum));
                    }
                }
                for y in 0..height {
                    let yt = clamp_index(y as isize - 1, height);
                    let yb = clamp_index(y as isize + 1, height);
                    for x in 0..width {
                        let sum = u32::from(tmp.get(x, yt))
                            + u32::from(tmp.get(x, y))
                            + u32::from(tmp.get(x, yb));
                        output.set(x, y, div3_trunc(sum));
                    }
                }
            }
        }
        Ok(())
    }
}

/// Two-pass box kernel for one tile: horizontal pass into `strip`, vertical
/// pass into the tile's slice of the band chunk.
///
/// The tile reads `tile.rows + 2*halo` input rows and `tile.cols + 2*halo`
/// input columns from its origin. With `halo` below the kernel radius the
/// missing taps replicate the tile edge, which diverges from the
/// whole-image result along the tile boundary.
pub(crate) fn box3_tile(
    src: &PlaneView<'_, u16>,
    tile: &Tile,
    strip: &mut [u16],
    strip_stride: usize,
    out_band: &mut [u16],
    out_stride: usize,
) {
    let span = 2 * tile.halo;
    let strip_rows = (tile.rows + span).min(src.height() - tile.row);
    let read_cols = (tile.cols + span).min(src.width() - tile.col);
    for sy in 0..strip_rows {
        let window = &src.row(tile.row + sy)[tile.col..tile.col + read_cols];
        let dst = &mut strip[sy * strip_stride..sy * strip_stride + tile.cols];
        if read_cols >= tile.cols + 2 * BOX3_RADIUS {
            box3_h_row(window, dst);
        } else {
            box3_h_row_edge(window, dst);
        }
    }
    for ly in 0..tile.rows {
        let taps = [
            ly.min(strip_rows - 1),
            (ly + 1).min(strip_rows - 1),
            (ly + 2).min(strip_rows - 1),
        ];
        let start = ly * out_stride + tile.col;
        box3_v_row(
            &strip[taps[0] * strip_stride..taps[0] * strip_stride + tile.cols],
            &strip[taps[1] * strip_stride..taps[1] * strip_stride + tile.cols],
            &strip[taps[2] * strip_stride..taps[2] * strip_stride + tile.cols],
            &mut out_band[start..start + tile.cols],
        );
    }
}

/// Tiled, lane-vectorized box blur.
///
/// Row bands dispatch independently (in parallel under the `rayon`
/// feature); within a band, each column block runs a horizontal pass into a
/// reused strip and a vertical pass out of it. Identical output to
/// [`BoxBlurNaive`] for every valid configuration.
#[derive(Debug, Clone, Copy)]
pub struct BoxBlurTiled {
    pub extent: OutputExtent,
    pub tiles: TileConfig,
}

impl Default for BoxBlurTiled {
    fn default() -> Self {
        Self {
            extent: OutputExtent::Shrunk,
            tiles: TileConfig::default(),
        }
    }
}

impl BoxBlurTiled {
    pub fn new(extent: OutputExtent, tiles: TileConfig) -> Self {
        Self { extent, tiles }
    }
}

impl FilterPipeline for BoxBlurTiled {
    type Buffer = ImagePlane<u16>;

    fn name(&self) -> &'static str {
        "box-blur/tiled"
    }

    fn margin(&self) -> usize {
        match self.extent {
            OutputExtent::Shrunk => BOX3_RADIUS,
            OutputExtent::Full => 0,
        }
    }

    fn output_extent(&self, in_width: usize, in_height: usize) -> (usize, usize) {
        box_output_extent(self.extent, in_width, in_height)
    }

    fn run(&self, input: &Self::Buffer, output: &mut Self::Buffer) -> Result<(), FilterError> {
        self.tiles.validate()?;
        let (out_width, out_height) = check_box_extents(input, output, self.extent)?;

        let padded;
        let src = match self.extent {
            OutputExtent::Shrunk => input.view(),
            OutputExtent::Full => {
                padded = pad_plane(input, BOX3_RADIUS);
                padded.view()
            }
        };

        let grid = TileGrid::new(out_width, out_height, self.tiles, BOX3_RADIUS);
        let config = self.tiles;
        let out_stride = output.stride();
        let band_len = config.band_rows * out_stride;
        let strip_stride = config.block_cols;
        for_each_band(output.as_raw_mut(), band_len, |band, chunk| {
            let mut strip =
                vec![0u16; (config.band_rows + 2 * BOX3_RADIUS) * strip_stride];
            for tile in grid.band_tiles(band) {
                box3_tile(&src, &tile, &mut strip, strip_stride, chunk, out_stride);
            }
        });
        Ok(())
    }
}

/// Whole-image scalar unsharp mask, the float reference.
///
/// Fixed step order: grayscale over the replicate-padded extent, vertical
/// 7-tap blur, horizontal 7-tap blur, `sharpen = 2*gray - blur`,
/// `ratio = sharpen / gray`, then `out = ratio * input` per channel. The
/// ratio division is unprotected: callers must supply strictly positive
/// luminance.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnsharpNaive;

impl FilterPipeline for UnsharpNaive {
    type Buffer = Planar3<f32>;

    fn name(&self) -> &'static str {
        "unsharp/naive"
    }

    fn margin(&self) -> usize {
        0
    }

    fn output_extent(&self, in_width: usize, in_height: usize) -> (usize, usize) {
        (in_width, in_height)
    }

    fn run(&self, input: &Self::Buffer, output: &mut Self::Buffer) -> Result<(), FilterError> {
        let (width, height) = check_planar_extents(input, output)?;
        let r = GAUSS7_RADIUS;
        let padded = pad_planar(input, r);
        let (pad_width, pad_height) = (width + 2 * r, height + 2 * r);

        let mut gray = ImagePlane::<f32>::new(pad_width, pad_height);
        for y in 0..pad_height {
            for x in 0..pad_width {
                gray.set(
                    x,
                    y,
                    luma_scalar(
                        padded.plane(0).get(x, y),
                        padded.plane(1).get(x, y),
                        padded.plane(2).get(x, y),
                    ),
                );
            }
        }

        let mut blur_y = ImagePlane::<f32>::new(pad_width, height);
        for y in 0..height {
            for x in 0..pad_width {
                blur_y.set(x, y, tap7_scalar(|d| gray.get(x, y + d)));
            }
        }

        let mut blur_x = ImagePlane::<f32>::new(width, height);
        for y in 0..height {
            for x in 0..width {
                blur_x.set(x, y, tap7_scalar(|d| blur_y.get(x + d, y)));
            }
        }

        let mut ratio = ImagePlane::<f32>::new(width, height);
        for y in 0..height {
            for x in 0..width {
                let g = gray.get(x + r, y + r);
                let sharpen = 2.0 * g - blur_x.get(x, y);
                ratio.set(x, y, sharpen / g);
            }
        }

        for c in 0..3 {
            let src = input.plane(c);
            let dst = output.plane_mut(c);
            for y in 0..height {
                for x in 0..width {
                    dst.set(x, y, ratio.get(x, y) * src.get(x, y));
                }
            }
        }
        Ok(())
    }
}

/// Banded, lane-vectorized unsharp mask.
///
/// Per band, a rolling buffer of grayscale rows feeds the vertical tap: six
/// rows prime the window, then each output row pushes one new gray row,
/// evaluates the vertical blur, and fuses the horizontal blur with the
/// sharpen/ratio step. Channel modulation runs as a second banded pass over
/// the finished ratio plane.
#[derive(Debug, Clone, Copy)]
pub struct UnsharpTiled {
    pub band_rows: usize,
}

impl Default for UnsharpTiled {
    fn default() -> Self {
        Self { band_rows: 32 }
    }
}

impl UnsharpTiled {
    pub const fn new(band_rows: usize) -> Self {
        Self { band_rows }
    }
}

impl FilterPipeline for UnsharpTiled {
    type Buffer = Planar3<f32>;

    fn name(&self) -> &'static str {
        "unsharp/tiled"
    }

    fn margin(&self) -> usize {
        0
    }

    fn output_extent(&self, in_width: usize, in_height: usize) -> (usize, usize) {
        (in_width, in_height)
    }

    fn run(&self, input: &Self::Buffer, output: &mut Self::Buffer) -> Result<(), FilterError> {
        if self.band_rows == 0 {
            return Err(crate::error::TileConfigError::ZeroBandRows.into());
        }
        let (width, height) = check_planar_extents(input, output)?;
        let r = GAUSS7_RADIUS;
        let padded = pad_planar(input, r);
        let pad_width = width + 2 * r;
        let band_rows = self.band_rows;

        let mut ratio = ImagePlane::<f32>::new(width, height);
        let ratio_stride = ratio.stride();
        for_each_band(
            ratio.as_raw_mut(),
            band_rows * ratio_stride,
            |band, chunk| {
                let row0 = band * band_rows;
                let rows = chunk.len() / ratio_stride;
                let mut ring = RollingBuffer::<f32>::new(GAUSS7_TAPS, pad_width);
                let mut blur_y = vec![0.0f32; pad_width];
                for sy in 0..2 * r {
                    luma_row(
                        padded.plane(0).row(row0 + sy),
                        padded.plane(1).row(row0 + sy),
                        padded.plane(2).row(row0 + sy),
                        ring.push_row(),
                    );
                }
                for ly in 0..rows {
                    let sy = row0 + ly + 2 * r;
                    luma_row(
                        padded.plane(0).row(sy),
                        padded.plane(1).row(sy),
                        padded.plane(2).row(sy),
                        ring.push_row(),
                    );
                    tap7_v_ring(&ring, &mut blur_y);
                    let start = ly * ratio_stride;
                    sharpen_ratio_row(ring.tap(r), &blur_y, &mut chunk[start..start + width]);
                }
            },
        );

        for c in 0..3 {
            let src = input.plane(c);
            let dst = output.plane_mut(c);
            let dst_stride = dst.stride();
            let ratio_ref = &ratio;
            for_each_band(dst.as_raw_mut(), band_rows * dst_stride, |band, chunk| {
                let row0 = band * band_rows;
                let rows = chunk.len() / dst_stride;
                for ly in 0..rows {
                    let start = ly * dst_stride;
                    modulate_row(
                        ratio_ref.row(row0 + ly),
                        src.row(row0 + ly),
                        &mut chunk[start..start + width],
                    );
                }
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{gradient_planar, planar_max_abs_diff, ramp_plane};

    fn run_box(
        pipeline: &impl FilterPipeline<Buffer = ImagePlane<u16>>,
        input: &ImagePlane<u16>,
    ) -> ImagePlane<u16> {
        let (w, h) = pipeline.output_extent(input.width(), input.height());
        let mut out = ImagePlane::new(w, h);
        pipeline.run(input, &mut out).unwrap();
        out
    }

    #[test]
    fn tiled_box_matches_naive_exactly() {
        let input = ramp_plane(41, 23);
        let config = TileConfig {
            band_rows: 8,
            block_cols: 16,
        };
        for extent in [OutputExtent::Shrunk, OutputExtent::Full] {
            let reference = run_box(&BoxBlurNaive::new(extent), &input);
            let tiled = run_box(&BoxBlurTiled::new(extent, config), &input);
            assert_eq!(reference, tiled, "{extent:?}");
        }
    }

    #[test]
    fn box_rejects_wrong_output_extent() {
        let input = ramp_plane(10, 10);
        let mut out = ImagePlane::new(10, 10);
        let err = BoxBlurNaive::new(OutputExtent::Shrunk)
            .run(&input, &mut out)
            .unwrap_err();
        assert!(matches!(err, FilterError::DimensionMismatch { .. }));
    }

    #[test]
    fn box_rejects_inputs_below_kernel_support() {
        let input = ramp_plane(2, 5);
        let mut out = ImagePlane::new(2, 5);
        let err = BoxBlurNaive::new(OutputExtent::Full)
            .run(&input, &mut out)
            .unwrap_err();
        assert!(matches!(err, FilterError::ExtentTooSmall { .. }));
    }

    #[test]
    fn tiled_box_rejects_misaligned_blocks() {
        let input = ramp_plane(20, 20);
        let mut out = ImagePlane::new(18, 18);
        let pipeline = BoxBlurTiled::new(
            OutputExtent::Shrunk,
            TileConfig {
                band_rows: 8,
                block_cols: 10,
            },
        );
        let err = pipeline.run(&input, &mut out).unwrap_err();
        assert!(matches!(err, FilterError::InvalidTileConfig(_)));
    }

    /// Shrinking a tile's halo below the kernel radius must produce a
    /// detectable divergence at the tile boundary.
    #[test]
    fn deficient_halo_diverges_at_tile_boundary() {
        let input = ramp_plane(20, 12);
        let src = input.view();
        let reference = run_box(&BoxBlurNaive::new(OutputExtent::Shrunk), &input);

        let run_tile = |halo: usize| {
            let tile = Tile {
                row: 0,
                col: 0,
                rows: 8,
                cols: 8,
                halo,
            };
            let mut strip = vec![0u16; (tile.rows + 2 * halo) * tile.cols];
            let mut out = vec![0u16; tile.rows * 18];
            box3_tile(&src, &tile, &mut strip, tile.cols, &mut out, 18);
            out
        };

        let healthy = run_tile(BOX3_RADIUS);
        for y in 0..8 {
            for x in 0..8 {
                assert_eq!(healthy[y * 18 + x], reference.get(x, y), "({x}, {y})");
            }
        }

        let starved = run_tile(0);
        let diverged = (0..8)
            .flat_map(|y| (0..8).map(move |x| (x, y)))
            .any(|(x, y)| starved[y * 18 + x] != reference.get(x, y));
        assert!(diverged, "halo starvation went undetected");
    }

    #[test]
    fn tiled_unsharp_matches_naive_within_tight_tolerance() {
        let input = gradient_planar(37, 19);
        let mut reference = Planar3::new(37, 19);
        UnsharpNaive.run(&input, &mut reference).unwrap();
        let mut tiled = Planar3::new(37, 19);
        UnsharpTiled::new(8).run(&input, &mut tiled).unwrap();
        assert!(planar_max_abs_diff(&reference, &tiled) <= 1e-6);
    }

    #[test]
    fn unsharp_rejects_zero_band_rows() {
        let input = gradient_planar(8, 8);
        let mut out = Planar3::new(8, 8);
        let err = UnsharpTiled::new(0).run(&input, &mut out).unwrap_err();
        assert!(matches!(err, FilterError::InvalidTileConfig(_)));
    }
}
