//! Test-tone injection.

use core::f32::consts::PI;

use super::chain::BlockTransform;
use super::helpers::full_scale_sample;
use crate::constants::{SAMPLE_RATE_HZ, SIGNAL_TABLE_LEN};

const TONE_LOW_HZ: f32 = 1_000.0;
const TONE_HIGH_HZ: f32 = 15_000.0;

/// Overwrites every frame with a 1 kHz + 15 kHz test tone.
///
/// The waveform is computed once into a table of bus samples. The table
/// position persists across blocks, so consecutive blocks continue the
/// waveform.
#[derive(Clone)]
pub struct SignalGenerator {
    table: [i32; SIGNAL_TABLE_LEN],
    index: usize,
    channels: usize,
}

impl SignalGenerator {
    pub fn new(channels: usize) -> Self {
        let mut table = [0i32; SIGNAL_TABLE_LEN];
        let rate = SAMPLE_RATE_HZ as f32;
        for (n, entry) in table.iter_mut().enumerate() {
            let t = n as f32 / rate;
            let low = libm::sinf(2.0 * PI * TONE_LOW_HZ * t);
            let high = libm::sinf(2.0 * PI * TONE_HIGH_HZ * t);
            *entry = full_scale_sample(0.5 * low + 0.5 * high);
        }
        SignalGenerator {
            table,
            index: 0,
            channels: channels.max(1),
        }
    }

    /// Table position of the next frame.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn table(&self) -> &[i32; SIGNAL_TABLE_LEN] {
        &self.table
    }

    pub fn reset(&mut self) {
        self.index = 0;
    }
}

impl BlockTransform for SignalGenerator {
    fn process(&mut self, samples: &mut [i32]) {
        for frame in samples.chunks_mut(self.channels) {
            frame.fill(self.table[self.index]);
            self.index = (self.index + 1) % SIGNAL_TABLE_LEN;
        }
    }
}
