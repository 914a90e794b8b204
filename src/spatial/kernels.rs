//! Block arithmetic primitives for the convolution hot path.
//!
//! These operate on whole frequency blocks (one transform length of complex
//! values) and are the only arithmetic the engine performs per partition.

use rustfft::num_complex::Complex;

/// Zero a frequency block.
#[inline]
pub fn clear(block: &mut [Complex<f32>]) {
    block.fill(Complex::new(0.0, 0.0));
}

/// `acc[k] += x[k] * h[k]` across a whole frequency block.
///
/// All three blocks must share one transform length; mismatches are
/// construction-time bugs, not runtime conditions.
#[inline]
pub fn multiply_accumulate(acc: &mut [Complex<f32>], x: &[Complex<f32>], h: &[Complex<f32>]) {
    debug_assert_eq!(acc.len(), x.len());
    debug_assert_eq!(acc.len(), h.len());

    for ((a, &xk), &hk) in acc.iter_mut().zip(x).zip(h) {
        *a += xk * hk;
    }
}
