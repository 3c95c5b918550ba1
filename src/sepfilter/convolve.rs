//! Row-level sliding-window convolution kernels.
//!
//! Each kernel walks its output row in lane steps with a single masked tail
//! (see [`lanes`](super::lanes)) and pins its evaluation order: the integer
//! box divides the three-tap sum by three with truncation, and the 7-tap
//! kernel accumulates `k0*c + k1*(l1+r1) + k2*(l2+r2) + k3*(l3+r3)` left to
//! right without fused multiply-add. The scalar twins below follow the same
//! order so the naive reference and the lane variants agree bit-for-bit.
//!
//! Callers guarantee slice extents; the kernels themselves are pure and
//! cannot fail.

use wide::f32x8;

use super::kernel::{GAUSS7, LUMA_B, LUMA_G, LUMA_R};
use super::lanes::{lane_steps, LanePredicate};
use super::rolling::RollingBuffer;

/// Horizontal 3-tap box pass: `out[x] = (src[x] + src[x+1] + src[x+2]) / 3`.
///
/// `src` must hold at least `out.len() + 2` samples. The division happens in
/// f32 lanes; for any three u16 taps the sum is below 2^24, so truncating
/// the correctly-rounded quotient reproduces integer division exactly.
pub fn box3_h_row(src: &[u16], out: &mut [u16]) {
    debug_assert!(src.len() >= out.len() + 2);
    let three = f32x8::splat(3.0);
    for (base, p) in lane_steps(out.len()) {
        let a = p.load_u16(&src[base..]);
        let b = p.load_u16(&src[base + 1..]);
        let c = p.load_u16(&src[base + 2..]);
        p.store_u16_trunc(&mut out[base..], ((a + b) + c) / three);
    }
}

/// Vertical 3-tap box pass across three row strips.
pub fn box3_v_row(top: &[u16], mid: &[u16], bot: &[u16], out: &mut [u16]) {
    debug_assert!(top.len() >= out.len() && mid.len() >= out.len() && bot.len() >= out.len());
    let three = f32x8::splat(3.0);
    for (base, p) in lane_steps(out.len()) {
        let a = p.load_u16(&top[base..]);
        let b = p.load_u16(&mid[base..]);
        let c = p.load_u16(&bot[base..]);
        p.store_u16_trunc(&mut out[base..], ((a + b) + c) / three);
    }
}

/// Horizontal 3-tap box pass for a window narrower than the kernel support;
/// taps clamp to the window edge. Used when a tile's halo is smaller than
/// the kernel radius.
pub fn box3_h_row_edge(src: &[u16], out: &mut [u16]) {
    let last = src.len() - 1;
    for (x, sample) in out.iter_mut().enumerate() {
        let sum = u32::from(src[x.min(last)])
            + u32::from(src[(x + 1).min(last)])
            + u32::from(src[(x + 2).min(last)]);
        *sample = super::kernel::div3_trunc(sum);
    }
}

/// One 7-tap evaluation over lane vectors produced by `load(offset)`,
/// `offset` in `0..7` with the center at 3.
#[inline]
fn tap7_lanes(load: impl Fn(usize) -> f32x8) -> f32x8 {
    let k0 = f32x8::splat(GAUSS7[0]);
    let k1 = f32x8::splat(GAUSS7[1]);
    let k2 = f32x8::splat(GAUSS7[2]);
    let k3 = f32x8::splat(GAUSS7[3]);
    let mut acc = k0 * load(3);
    acc = acc + k1 * (load(2) + load(4));
    acc = acc + k2 * (load(1) + load(5));
    acc = acc + k3 * (load(0) + load(6));
    acc
}

/// Scalar 7-tap evaluation with the same association order as
/// [`tap7_lanes`].
#[inline]
pub fn tap7_scalar(window: impl Fn(usize) -> f32) -> f32 {
    let mut acc = GAUSS7[0] * window(3);
    acc += GAUSS7[1] * (window(2) + window(4));
    acc += GAUSS7[2] * (window(1) + window(5));
    acc += GAUSS7[3] * (window(0) + window(6));
    acc
}

/// Horizontal 7-tap pass: `out[x]` windows `src[x..=x+6]` with the center at
/// `src[x+3]`. `src` must hold at least `out.len() + 6` samples.
pub fn tap7_h_row(src: &[f32], out: &mut [f32]) {
    debug_assert!(src.len() >= out.len() + 6);
    for (base, p) in lane_steps(out.len()) {
        let acc = tap7_lanes(|d| p.load_f32(&src[base + d..], 0.0));
        p.store_f32(&mut out[base..], acc);
    }
}

/// Vertical 7-tap pass across the current ring window.
pub fn tap7_v_ring(ring: &RollingBuffer<f32>, out: &mut [f32]) {
    debug_assert_eq!(ring.support(), 7);
    debug_assert!(ring.row_len() >= out.len());
    for (base, p) in lane_steps(out.len()) {
        let acc = tap7_lanes(|d| p.load_f32(&ring.tap(d)[base..], 0.0));
        p.store_f32(&mut out[base..], acc);
    }
}

/// BT.601 grayscale reduction of one row triple.
pub fn luma_row(r: &[f32], g: &[f32], b: &[f32], out: &mut [f32]) {
    debug_assert!(r.len() >= out.len() && g.len() >= out.len() && b.len() >= out.len());
    let wr = f32x8::splat(LUMA_R);
    let wg = f32x8::splat(LUMA_G);
    let wb = f32x8::splat(LUMA_B);
    for (base, p) in lane_steps(out.len()) {
        let acc = (wr * p.load_f32(&r[base..], 0.0) + wg * p.load_f32(&g[base..], 0.0))
            + wb * p.load_f32(&b[base..], 0.0);
        p.store_f32(&mut out[base..], acc);
    }
}

/// Scalar twin of [`luma_row`].
#[inline]
pub fn luma_scalar(r: f32, g: f32, b: f32) -> f32 {
    (LUMA_R * r + LUMA_G * g) + LUMA_B * b
}

/// Fused sharpen and ratio row:
/// `out[x] = (2*gray[x+3] - tap7(blur_y, x)) / gray[x+3]`.
///
/// `gray` is the ring's center row for this output row; both inputs hold
/// `out.len() + 6` samples. The division is unprotected: luminance must be
/// strictly positive (a documented precondition of the unsharp pipelines).
pub fn sharpen_ratio_row(gray: &[f32], blur_y: &[f32], out: &mut [f32]) {
    debug_assert!(gray.len() >= out.len() + 6 && blur_y.len() >= out.len() + 6);
    let two = f32x8::splat(2.0);
    for (base, p) in lane_steps(out.len()) {
        // Inactive lanes read 1.0 so the masked division stays finite.
        let g = p.load_f32(&gray[base + 3..], 1.0);
        let blur = tap7_lanes(|d| p.load_f32(&blur_y[base + d..], 0.0));
        let sharpen = two * g - blur;
        p.store_f32(&mut out[base..], sharpen / g);
    }
}

/// Per-channel modulate row: `out[x] = ratio[x] * src[x]`.
pub fn modulate_row(ratio: &[f32], src: &[f32], out: &mut [f32]) {
    debug_assert!(ratio.len() >= out.len() && src.len() >= out.len());
    for (base, p) in lane_steps(out.len()) {
        let v = p.load_f32(&ratio[base..], 0.0) * p.load_f32(&src[base..], 0.0);
        p.store_f32(&mut out[base..], v);
    }
}
