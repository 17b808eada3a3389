//! Q15 / Q31 conversions shared by the transform stages.
//!
//! Bus samples are 32-bit words carrying the audio in the top bits (Q31);
//! the filter works in Q15.

use super::intrinsics::{saturate16, saturate32};

/// Keep the top 16 bits of a Q31 sample.
#[inline(always)]
pub fn q31_to_q15(x: i32) -> i16 {
    (x >> 16) as i16
}

/// Widen a Q15 value back to the bus format.
#[inline(always)]
pub fn q15_to_q31(x: i16) -> i32 {
    (x as i32) << 16
}

/// Reduce a Q30 multiply-accumulate result to Q15 with saturation.
#[inline(always)]
pub fn q15_from_accumulator(acc: i64) -> i16 {
    saturate16(saturate32(acc >> 15))
}

/// Convert a float in `[-1.0, 1.0]` to a full-scale bus sample,
/// `(x * 32767) << 16`.
#[inline]
pub fn full_scale_sample(x: f32) -> i32 {
    let q15 = saturate16((x * 32767.0) as i32);
    q15_to_q31(q15)
}
