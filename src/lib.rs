mod error;
mod sepfilter;

#[cfg(test)]
mod test_utils;

pub use error::{FilterError, TileConfigError, ValidationError};
pub use sepfilter::boundary::{clamp_index, pad_plane, pad_planar};
pub use sepfilter::buffer::{ImagePlane, Planar3, PlaneView, SampleBuffer};
pub use sepfilter::convert::{
    plane_from_luma16, plane_to_luma16, planar_from_rgb32f, planar_to_rgb32f, Gray16Image,
    RgbF32Image,
};
pub use sepfilter::kernel::{
    div3_trunc, BOX3_RADIUS, BOX3_TAPS, GAUSS7, GAUSS7_RADIUS, GAUSS7_TAPS, LUMA_B, LUMA_G, LUMA_R,
};
pub use sepfilter::lanes::{lane_steps, LanePredicate, LANES};
pub use sepfilter::pipeline::{
    BoxBlurNaive, BoxBlurTiled, FilterPipeline, OutputExtent, UnsharpNaive, UnsharpTiled,
};
pub use sepfilter::rolling::RollingBuffer;
pub use sepfilter::tile::{Tile, TileConfig, TileGrid};
pub use sepfilter::validate::{
    compare_buffers, validate, ComparisonReport, Mismatch, ScanMode, Tolerance, ValidationConfig,
};
