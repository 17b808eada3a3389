//! ARM DSP instruction wrappers with pure-Rust fallbacks.
//!
//! On `thumbv7em` targets (Cortex-M4/M33 with DSP extension), these compile to
//! single-cycle ARM instructions. On other targets (host tests, Cortex-M0),
//! equivalent pure-Rust implementations are used.

/// Saturate an `i32` to `i16` range (`-32768..=32767`).
///
/// Maps to ARM `SSAT #16`.
#[inline(always)]
pub fn saturate16(val: i32) -> i16 {
    #[cfg(all(target_arch = "arm", target_feature = "dsp"))]
    {
        let out: i32;
        unsafe {
            core::arch::asm!(
                "ssat {out}, #16, {val}",
                out = out(reg) out,
                val = in(reg) val,
            );
        }
        out as i16
    }
    #[cfg(not(all(target_arch = "arm", target_feature = "dsp")))]
    {
        val.clamp(i16::MIN as i32, i16::MAX as i32) as i16
    }
}

/// Saturate an `i64` to `i32` range.
#[inline(always)]
pub fn saturate32(val: i64) -> i32 {
    val.clamp(i32::MIN as i64, i32::MAX as i64) as i32
}

/// Saturating 32-bit subtraction `a - b`. Maps to ARM `QSUB`.
#[inline(always)]
pub fn qsub(a: i32, b: i32) -> i32 {
    #[cfg(all(target_arch = "arm", target_feature = "dsp"))]
    {
        let out: i32;
        unsafe {
            core::arch::asm!(
                "qsub {out}, {a}, {b}",
                out = out(reg) out,
                a = in(reg) a,
                b = in(reg) b,
            );
        }
        out
    }
    #[cfg(not(all(target_arch = "arm", target_feature = "dsp")))]
    {
        a.saturating_sub(b)
    }
}

/// 64-bit multiply-accumulate of two halfwords: `acc + a * b`.
///
/// Maps to ARM `SMLALBB`.
#[inline(always)]
pub fn multiply_accumulate_16x16_64(acc: i64, a: i16, b: i16) -> i64 {
    #[cfg(all(target_arch = "arm", target_feature = "dsp"))]
    {
        let mut lo = acc as u32;
        let mut hi = (acc >> 32) as i32;
        unsafe {
            core::arch::asm!(
                "smlalbb {lo}, {hi}, {a}, {b}",
                lo = inout(reg) lo,
                hi = inout(reg) hi,
                a = in(reg) a as i32,
                b = in(reg) b as i32,
            );
        }
        ((hi as i64) << 32) | lo as i64
    }
    #[cfg(not(all(target_arch = "arm", target_feature = "dsp")))]
    {
        acc + (a as i64) * (b as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_saturate16() {
        assert_eq!(saturate16(0), 0);
        assert_eq!(saturate16(32767), 32767);
        assert_eq!(saturate16(32768), 32767);
        assert_eq!(saturate16(-32768), -32768);
        assert_eq!(saturate16(-32769), -32768);
        assert_eq!(saturate16(i32::MAX), 32767);
        assert_eq!(saturate16(i32::MIN), -32768);
    }

    #[test]
    fn test_saturate32() {
        assert_eq!(saturate32(-5), -5);
        assert_eq!(saturate32(i64::MAX), i32::MAX);
        assert_eq!(saturate32(i32::MIN as i64 - 1), i32::MIN);
    }

    #[test]
    fn test_qsub() {
        assert_eq!(qsub(10, 3), 7);
        assert_eq!(qsub(i32::MAX, -1), i32::MAX);
        assert_eq!(qsub(i32::MIN, 1), i32::MIN);
    }

    #[test]
    fn test_multiply_accumulate() {
        assert_eq!(multiply_accumulate_16x16_64(0, 32767, 32767), 1_073_676_289);
        assert_eq!(multiply_accumulate_16x16_64(10, -2, 3), 4);
        let mut acc = 0;
        for _ in 0..64 {
            acc = multiply_accumulate_16x16_64(acc, i16::MIN, i16::MIN);
        }
        assert_eq!(acc, 64 * (1i64 << 30));
    }
}
