//! Fixed-width vector lane execution.
//!
//! Every vectorized pass walks its output row in lane-wide steps:
//! `len / LANES` full steps and at most one masked tail step for the
//! remainder. The tail reuses the same arithmetic path as the full case;
//! only the loads and stores are predicated, so nothing is ever read or
//! written past the declared extent.

use wide::f32x8;

/// Lane width of every vectorized pass.
pub const LANES: usize = 8;

/// Active-lane predicate for a (possibly partial) lane step.
///
/// The single masking primitive shared by every masked load, compute and
/// store site: lanes `0..active` participate, the rest read a neutral value
/// and write nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LanePredicate {
    active: usize,
}

impl LanePredicate {
    /// All lanes active, the full-step predicate.
    pub const fn all() -> Self {
        Self { active: LANES }
    }

    /// Tail predicate with `remaining` active lanes.
    pub const fn tail(remaining: usize) -> Self {
        debug_assert!(remaining >= 1 && remaining <= LANES);
        Self { active: remaining }
    }

    pub const fn active(&self) -> usize {
        self.active
    }

    pub const fn is_full(&self) -> bool {
        self.active == LANES
    }

    /// Load active lanes from the head of `src`; inactive lanes hold
    /// `neutral`.
    #[inline]
    pub fn load_f32(&self, src: &[f32], neutral: f32) -> f32x8 {
        if self.active == LANES {
            let head: [f32; LANES] = src[..LANES].try_into().unwrap();
            f32x8::from(head)
        } else {
            let mut head = [neutral; LANES];
            head[..self.active].copy_from_slice(&src[..self.active]);
            f32x8::from(head)
        }
    }

    /// Load active lanes of `u16` samples widened to `f32`; inactive lanes
    /// hold zero.
    #[inline]
    pub fn load_u16(&self, src: &[u16]) -> f32x8 {
        let mut head = [0.0f32; LANES];
        for (lane, &sample) in head.iter_mut().zip(&src[..self.active]) {
            *lane = f32::from(sample);
        }
        f32x8::from(head)
    }

    /// Store active lanes to the head of `dst`; inactive lanes leave memory
    /// untouched.
    #[inline]
    pub fn store_f32(&self, dst: &mut [f32], v: f32x8) {
        let lanes = v.to_array();
        dst[..self.active].copy_from_slice(&lanes[..self.active]);
    }

    /// Store active lanes truncated toward zero to `u16`.
    #[inline]
    pub fn store_u16_trunc(&self, dst: &mut [u16], v: f32x8) {
        let lanes = v.to_array();
        for (sample, &lane) in dst[..self.active].iter_mut().zip(&lanes) {
            *sample = lane as u16;
        }
    }
}

/// Lane-step walk over a row of `len` elements: yields the element offset
/// and predicate of each step. `len / LANES` full steps, then one tail step
/// iff `len % LANES != 0`.
#[inline]
pub fn lane_steps(len: usize) -> impl Iterator<Item = (usize, LanePredicate)> {
    let full = len / LANES;
    let rem = len % LANES;
    (0..full)
        .map(|step| (step * LANES, LanePredicate::all()))
        .chain((rem > 0).then(|| (full * LANES, LanePredicate::tail(rem))))
}
