//! Fixed-point FIR low-pass.

use super::chain::BlockTransform;
use super::helpers::{q15_from_accumulator, q15_to_q31, q31_to_q15};
use super::intrinsics::multiply_accumulate_16x16_64;
use crate::constants::{BUS_CHANNELS, FIR_BLOCK_LEN, FIR_TAPS};

/// Low-pass coefficients, Q15: Hamming-windowed sinc, cutoff 4 kHz at
/// 44.1 kHz. Symmetric; unity DC gain.
pub const LOWPASS_COEFFS: [i16; FIR_TAPS] = [
    -43, -37, -17, 27, 95, 169, 209, 163, -6, -289, -613, -842, -811, -378, 512, 1790, 3256, 4625,
    5599, 5949, 5599, 4625, 3256, 1790, 512, -378, -811, -842, -613, -289, -6, 163, 209, 169, 95,
    27, -17, -37, -43,
];

const STATE_LEN: usize = FIR_TAPS + FIR_BLOCK_LEN;

/// Q15 FIR filter with a sliding state buffer.
///
/// `state[..FIR_TAPS - 1]` holds the tail of the previous call; new input is
/// appended behind it, so each output sees the full tap history regardless
/// of how the stream is chunked.
#[derive(Clone)]
pub struct FirQ15 {
    coeffs: &'static [i16; FIR_TAPS],
    state: [i16; STATE_LEN],
}

impl FirQ15 {
    pub const fn new(coeffs: &'static [i16; FIR_TAPS]) -> Self {
        FirQ15 {
            coeffs,
            state: [0; STATE_LEN],
        }
    }

    /// Filter `input` into `output`. Lengths must match; any length is
    /// accepted and processed in chunks of [`FIR_BLOCK_LEN`].
    pub fn process(&mut self, input: &[i16], output: &mut [i16]) {
        debug_assert_eq!(input.len(), output.len());
        for (src, dst) in input
            .chunks(FIR_BLOCK_LEN)
            .zip(output.chunks_mut(FIR_BLOCK_LEN))
        {
            self.process_chunk(src, dst);
        }
    }

    fn process_chunk(&mut self, input: &[i16], output: &mut [i16]) {
        let n = input.len();
        let history = FIR_TAPS - 1;
        self.state[history..history + n].copy_from_slice(input);

        for (i, y) in output.iter_mut().enumerate() {
            // x[i - k] lives at state[history + i - k].
            let mut acc = 0i64;
            for (k, &b) in self.coeffs.iter().enumerate() {
                acc = multiply_accumulate_16x16_64(acc, b, self.state[history + i - k]);
            }
            *y = q15_from_accumulator(acc);
        }

        self.state.copy_within(n..n + history, 0);
    }

    /// Clear the tap history.
    pub fn reset(&mut self) {
        self.state = [0; STATE_LEN];
    }
}

/// FIR low-pass over interleaved bus samples, one filter per channel.
#[derive(Clone)]
pub struct LowPassFilter {
    filters: [FirQ15; BUS_CHANNELS],
    channels: usize,
}

impl LowPassFilter {
    /// `channels` is clamped to `1..=BUS_CHANNELS`.
    pub const fn new(channels: usize) -> Self {
        let channels = if channels == 0 {
            1
        } else if channels > BUS_CHANNELS {
            BUS_CHANNELS
        } else {
            channels
        };
        LowPassFilter {
            filters: [const { FirQ15::new(&LOWPASS_COEFFS) }; BUS_CHANNELS],
            channels,
        }
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn reset(&mut self) {
        for f in self.filters.iter_mut() {
            f.reset();
        }
    }
}

impl BlockTransform for LowPassFilter {
    fn process(&mut self, samples: &mut [i32]) {
        let channels = self.channels;
        let frames = samples.len() / channels;
        let mut input = [0i16; FIR_BLOCK_LEN];
        let mut output = [0i16; FIR_BLOCK_LEN];

        for (ch, filter) in self.filters[..channels].iter_mut().enumerate() {
            let mut frame = 0;
            while frame < frames {
                let n = (frames - frame).min(FIR_BLOCK_LEN);
                for j in 0..n {
                    input[j] = q31_to_q15(samples[(frame + j) * channels + ch]);
                }
                filter.process(&input[..n], &mut output[..n]);
                for j in 0..n {
                    samples[(frame + j) * channels + ch] = q15_to_q31(output[j]);
                }
                frame += n;
            }
        }
    }
}
