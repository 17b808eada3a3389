//! Circular delay line for the automatic double tracking (ADT) effect.

use crate::constants::ADT_BUFFER_LEN;
use crate::error::ConfigFault;

/// Delay line sized for the ADT effect (just over one second at 44.1 kHz).
pub type AdtDelay = DelayLine<ADT_BUFFER_LEN>;

/// Ring of `N` samples with independent read and write positions.
///
/// Reads lag writes by `offset` samples. Until that many samples have been
/// stored, [`get_sample`](Self::get_sample) produces silence.
pub struct DelayLine<const N: usize> {
    buffer: [i32; N],
    write: usize,
    read: usize,
    offset: usize,
}

impl<const N: usize> DelayLine<N> {
    /// Delay of `delay_ms` at `sample_rate`. The resulting offset must be at
    /// least one sample and below `N`.
    pub fn new(delay_ms: u32, sample_rate: u32) -> Result<Self, ConfigFault> {
        let offset = (delay_ms as u64 * sample_rate as u64 / 1000) as usize;
        if offset == 0 {
            return Err(ConfigFault::InvalidParameter("delay shorter than one sample"));
        }
        if offset >= N {
            return Err(ConfigFault::InvalidParameter("delay longer than buffer"));
        }
        Ok(Self::with_offset(offset))
    }

    /// Delay of exactly `offset` samples; `0 < offset < N` is the caller's
    /// responsibility.
    pub const fn with_offset(offset: usize) -> Self {
        DelayLine {
            buffer: [0; N],
            write: 0,
            read: 0,
            offset,
        }
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Samples stored but not yet read.
    pub fn pending(&self) -> usize {
        (self.write + N - self.read) % N
    }

    pub fn store(&mut self, sample: i32) {
        self.buffer[self.write] = sample;
        self.write = (self.write + 1) % N;
    }

    pub fn get_sample(&mut self) -> i32 {
        if self.pending() < self.offset {
            return 0;
        }
        let sample = self.buffer[self.read];
        self.read = (self.read + 1) % N;
        sample
    }

    /// Read the delayed sample, then store `sample`.
    pub fn process(&mut self, sample: i32) -> i32 {
        let out = self.get_sample();
        self.store(sample);
        out
    }

    pub fn reset(&mut self) {
        self.buffer.fill(0);
        self.write = 0;
        self.read = 0;
    }
}
