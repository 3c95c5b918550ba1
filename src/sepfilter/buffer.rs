//! Owned sample buffers and the borrowed views the convolution passes read.
//!
//! The engine never takes ownership of caller image storage: pipelines
//! borrow an input buffer and a caller-allocated output buffer for the
//! duration of a run. `stride` is measured in samples and may exceed
//! `width`; the gap `[width, stride)` of every row belongs to the caller and
//! is never read or written by any pass.

use num_traits::Zero;

/// Owned single-channel sample buffer with an explicit row stride.
#[derive(Debug, Clone, PartialEq)]
pub struct ImagePlane<T> {
    data: Vec<T>,
    width: usize,
    height: usize,
    stride: usize,
}

impl<T: Copy + Zero> ImagePlane<T> {
    /// Zero-filled plane with `stride == width`.
    pub fn new(width: usize, height: usize) -> Self {
        Self::with_stride(width, height, width)
    }

    /// Zero-filled plane with a caller-chosen stride.
    ///
    /// # Panics
    ///
    /// Panics if `stride < width`.
    pub fn with_stride(width: usize, height: usize, stride: usize) -> Self {
        assert!(stride >= width, "stride must be at least width");
        Self {
            data: vec![T::zero(); stride * height],
            width,
            height,
            stride,
        }
    }

    /// Plane filled with a single value.
    pub fn filled(width: usize, height: usize, value: T) -> Self {
        let mut plane = Self::new(width, height);
        plane.data.fill(value);
        plane
    }

    /// Plane built per coordinate from `f(x, y)`.
    pub fn from_fn(width: usize, height: usize, mut f: impl FnMut(usize, usize) -> T) -> Self {
        let mut plane = Self::new(width, height);
        for y in 0..height {
            for x in 0..width {
                plane.data[y * plane.stride + x] = f(x, y);
            }
        }
        plane
    }
}

impl<T: Copy> ImagePlane<T> {
    pub const fn width(&self) -> usize {
        self.width
    }

    pub const fn height(&self) -> usize {
        self.height
    }

    pub const fn stride(&self) -> usize {
        self.stride
    }

    pub fn get(&self, x: usize, y: usize) -> T {
        debug_assert!(x < self.width && y < self.height);
        self.data[y * self.stride + x]
    }

    pub fn set(&mut self, x: usize, y: usize, value: T) {
        debug_assert!(x < self.width && y < self.height);
        self.data[y * self.stride + x] = value;
    }

    /// Row `y`, excluding the stride gap.
    pub fn row(&self, y: usize) -> &[T] {
        let start = y * self.stride;
        &self.data[start..start + self.width]
    }

    /// Mutable row `y`, excluding the stride gap.
    pub fn row_mut(&mut self, y: usize) -> &mut [T] {
        let start = y * self.stride;
        &mut self.data[start..start + self.width]
    }

    /// Read-only view of the whole plane.
    pub fn view(&self) -> PlaneView<'_, T> {
        PlaneView {
            data: &self.data,
            width: self.width,
            height: self.height,
            stride: self.stride,
        }
    }

    /// Backing storage including stride gaps.
    pub fn as_raw(&self) -> &[T] {
        &self.data
    }

    /// Mutable backing storage including stride gaps.
    pub fn as_raw_mut(&mut self) -> &mut [T] {
        &mut self.data
    }
}

/// Borrowed read-only view of a rectangular plane region.
#[derive(Debug, Clone, Copy)]
pub struct PlaneView<'a, T> {
    data: &'a [T],
    width: usize,
    height: usize,
    stride: usize,
}

impl<'a, T: Copy> PlaneView<'a, T> {
    pub const fn width(&self) -> usize {
        self.width
    }

    pub const fn height(&self) -> usize {
        self.height
    }

    pub fn get(&self, x: usize, y: usize) -> T {
        debug_assert!(x < self.width && y < self.height);
        self.data[y * self.stride + x]
    }

    /// Row `y` of the viewed region.
    pub fn row(&self, y: usize) -> &'a [T] {
        let start = y * self.stride;
        &self.data[start..start + self.width]
    }

    /// Sub-view with the given origin and extent.
    ///
    /// # Panics
    ///
    /// Panics if the window exceeds the view's extent.
    pub fn window(&self, col: usize, row: usize, cols: usize, rows: usize) -> PlaneView<'a, T> {
        assert!(col + cols <= self.width && row + rows <= self.height);
        PlaneView {
            data: &self.data[row * self.stride + col..],
            width: cols,
            height: rows,
            stride: self.stride,
        }
    }
}

/// Channel-major three-plane color buffer (`[channel][y][x]`).
#[derive(Debug, Clone, PartialEq)]
pub struct Planar3<T> {
    planes: [ImagePlane<T>; 3],
}

impl<T: Copy + Zero> Planar3<T> {
    /// Zero-filled buffer.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            planes: [
                ImagePlane::new(width, height),
                ImagePlane::new(width, height),
                ImagePlane::new(width, height),
            ],
        }
    }

    /// Buffer built per sample from `f(channel, x, y)`.
    pub fn from_fn(
        width: usize,
        height: usize,
        mut f: impl FnMut(usize, usize, usize) -> T,
    ) -> Self {
        let mut buffer = Self::new(width, height);
        for c in 0..3 {
            for y in 0..height {
                for x in 0..width {
                    buffer.planes[c].set(x, y, f(c, x, y));
                }
            }
        }
        buffer
    }
}

impl<T: Copy> Planar3<T> {
    pub const fn width(&self) -> usize {
        self.planes[0].width()
    }

    pub const fn height(&self) -> usize {
        self.planes[0].height()
    }

    pub fn plane(&self, channel: usize) -> &ImagePlane<T> {
        &self.planes[channel]
    }

    pub fn plane_mut(&mut self, channel: usize) -> &mut ImagePlane<T> {
        &mut self.planes[channel]
    }
}

/// Uniform sample access the validator compares heterogeneous buffers
/// through. Samples are widened to `f64` so one comparison loop covers both
/// integer and float filters.
pub trait SampleBuffer {
    fn width(&self) -> usize;
    fn height(&self) -> usize;
    fn channels(&self) -> usize;
    fn sample(&self, x: usize, y: usize, channel: usize) -> f64;
    /// Caller-side allocation of an output buffer for a pipeline run.
    fn alloc(width: usize, height: usize) -> Self;
}

impl SampleBuffer for ImagePlane<u16> {
    fn width(&self) -> usize {
        ImagePlane::width(self)
    }

    fn height(&self) -> usize {
        ImagePlane::height(self)
    }

    fn channels(&self) -> usize {
        1
    }

    fn sample(&self, x: usize, y: usize, _channel: usize) -> f64 {
        f64::from(self.get(x, y))
    }

    fn alloc(width: usize, height: usize) -> Self {
        Self::new(width, height)
    }
}

impl SampleBuffer for Planar3<f32> {
    fn width(&self) -> usize {
        Planar3::width(self)
    }

    fn height(&self) -> usize {
        Planar3::height(self)
    }

    fn channels(&self) -> usize {
        3
    }

    fn sample(&self, x: usize, y: usize, channel: usize) -> f64 {
        f64::from(self.plane(channel).get(x, y))
    }

    fn alloc(width: usize, height: usize) -> Self {
        Self::new(width, height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stride_gap_is_not_part_of_rows() {
        let mut plane: ImagePlane<u16> = ImagePlane::with_stride(3, 2, 5);
        plane.as_raw_mut().fill(0xBEEF);
        for y in 0..2 {
            plane.row_mut(y).fill(7);
        }
        assert_eq!(plane.row(0), &[7, 7, 7]);
        assert_eq!(plane.row(1), &[7, 7, 7]);
        // Gap samples keep whatever the caller stored there.
        assert_eq!(plane.as_raw()[3], 0xBEEF);
        assert_eq!(plane.as_raw()[4], 0xBEEF);
    }

    #[test]
    fn window_offsets_into_parent() {
        let plane = ImagePlane::from_fn(4, 4, |x, y| (y * 10 + x) as u16);
        let view = plane.view().window(1, 2, 2, 2);
        assert_eq!(view.get(0, 0), 21);
        assert_eq!(view.get(1, 1), 32);
        assert_eq!(view.row(0), &[21, 22]);
    }

    #[test]
    fn planar_sample_access_is_channel_major() {
        let buffer = Planar3::from_fn(2, 2, |c, x, y| (c * 100 + y * 10 + x) as f32);
        assert_eq!(buffer.plane(2).get(1, 1), 211.0);
        assert_eq!(buffer.sample(1, 0, 1), 101.0);
        assert_eq!(buffer.channels(), 3);
    }
}
