//! Fixed-capacity ring of row strips for vertical sliding windows.

use num_traits::Zero;

/// Circular store of the most recent rows a vertical tap evaluation needs.
///
/// Capacity is the kernel support rounded up to a power of two, so slot
/// selection compiles to a mask instead of a division. All modulo
/// arithmetic lives here; convolution loops address rows only through
/// [`push_row`](Self::push_row) and [`tap`](Self::tap).
#[derive(Debug)]
pub struct RollingBuffer<T> {
    rows: Vec<T>,
    row_len: usize,
    capacity: usize,
    support: usize,
    pushed: usize,
}

impl<T: Copy + Zero> RollingBuffer<T> {
    /// Ring sized for a kernel needing `support` rows of `row_len` samples.
    ///
    /// # Panics
    ///
    /// Panics if `support` or `row_len` is zero.
    pub fn new(support: usize, row_len: usize) -> Self {
        assert!(support > 0 && row_len > 0);
        let capacity = support.next_power_of_two();
        Self {
            rows: vec![T::zero(); capacity * row_len],
            row_len,
            capacity,
            support,
            pushed: 0,
        }
    }
}

impl<T: Copy> RollingBuffer<T> {
    pub const fn support(&self) -> usize {
        self.support
    }

    pub const fn row_len(&self) -> usize {
        self.row_len
    }

    /// Total rows pushed so far.
    pub const fn len(&self) -> usize {
        self.pushed
    }

    pub const fn is_empty(&self) -> bool {
        self.pushed == 0
    }

    /// Whether a full tap window is available.
    pub const fn is_primed(&self) -> bool {
        self.pushed >= self.support
    }

    /// Claim the slot for the next row, evicting the oldest, and return it
    /// for the caller to fill.
    pub fn push_row(&mut self) -> &mut [T] {
        let slot = self.pushed % self.capacity;
        self.pushed += 1;
        let start = slot * self.row_len;
        &mut self.rows[start..start + self.row_len]
    }

    /// Row `i` of the current window: `0` is the oldest tap, `support - 1`
    /// the newest.
    ///
    /// Valid once [`is_primed`](Self::is_primed) holds.
    pub fn tap(&self, i: usize) -> &[T] {
        debug_assert!(i < self.support);
        debug_assert!(self.is_primed());
        let slot = (self.pushed - self.support + i) % self.capacity;
        let start = slot * self.row_len;
        &self.rows[start..start + self.row_len]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fill(ring: &mut RollingBuffer<f32>, value: f32) {
        ring.push_row().fill(value);
    }

    #[test]
    fn capacity_rounds_up_to_power_of_two() {
        let ring: RollingBuffer<f32> = RollingBuffer::new(7, 4);
        assert_eq!(ring.support(), 7);
        // 7 rows of taps remain addressable after an eighth push.
        assert_eq!(ring.row_len(), 4);
    }

    #[test]
    fn taps_track_the_most_recent_window() {
        let mut ring: RollingBuffer<f32> = RollingBuffer::new(3, 2);
        for v in 0..3 {
            fill(&mut ring, v as f32);
        }
        assert!(ring.is_primed());
        assert_eq!(ring.tap(0)[0], 0.0);
        assert_eq!(ring.tap(2)[0], 2.0);

        // Each further push slides the window by one row.
        for v in 3..10 {
            fill(&mut ring, v as f32);
            assert_eq!(ring.tap(0)[0], (v - 2) as f32);
            assert_eq!(ring.tap(1)[0], (v - 1) as f32);
            assert_eq!(ring.tap(2)[0], v as f32);
        }
    }

    #[test]
    fn seven_tap_window_survives_capacity_wraparound() {
        let mut ring: RollingBuffer<f32> = RollingBuffer::new(7, 1);
        for v in 0..20 {
            fill(&mut ring, v as f32);
        }
        for i in 0..7 {
            assert_eq!(ring.tap(i)[0], (13 + i) as f32);
        }
    }
}
