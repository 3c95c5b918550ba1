//! Edge-replication boundary policy.
//!
//! Out-of-range coordinates are clamped to the nearest valid interior
//! coordinate, never wrapped and never zero-filled. The policy has two
//! realizations with identical numerics: clamping indices on the fly, and
//! materializing a replicate-padded copy.

use num_traits::Zero;

use super::buffer::{ImagePlane, Planar3};

/// Clamp a signed coordinate into `[0, len)`.
#[inline]
pub fn clamp_index(i: isize, len: usize) -> usize {
    debug_assert!(len > 0);
    i.clamp(0, len as isize - 1) as usize
}

/// Materialize a copy of `src` extended by `radius` samples of edge
/// replication on every side.
pub fn pad_plane<T: Copy + Zero>(src: &ImagePlane<T>, radius: usize) -> ImagePlane<T> {
    let (width, height) = (src.width(), src.height());
    let r = radius as isize;
    ImagePlane::from_fn(width + 2 * radius, height + 2 * radius, |x, y| {
        let sx = clamp_index(x as isize - r, width);
        let sy = clamp_index(y as isize - r, height);
        src.get(sx, sy)
    })
}

/// [`pad_plane`] applied to every channel of a planar buffer.
pub fn pad_planar<T: Copy + Zero>(src: &Planar3<T>, radius: usize) -> Planar3<T> {
    let (width, height) = (src.width(), src.height());
    let r = radius as isize;
    Planar3::from_fn(width + 2 * radius, height + 2 * radius, |c, x, y| {
        let sx = clamp_index(x as isize - r, width);
        let sy = clamp_index(y as isize - r, height);
        src.plane(c).get(sx, sy)
    })
}
