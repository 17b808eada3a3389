//! Init-time parameter structs for the acquisition engine, the serial audio
//! bus and the transform stage.
//!
//! Defaults mirror the firmware build: ADC on AIN2 at gain 1/6 sampling every
//! 22 µs, I2S master at 44.1 kHz with 32-bit stereo words, low-pass and gain
//! stages enabled.

use crate::constants::{
    ADC_BLOCK_SAMPLES, ADC_BUFFER_SLOTS, ADC_SAMPLING_PERIOD_US, AMP_FACTOR, BUS_BLOCK_BYTES,
    BUS_CHANNELS, I2S_MAX_RETRIES, I2S_TIMEOUT_MS, SAMPLE_RATE_HZ, TIMER_BASE_HZ,
};
use crate::error::ConfigFault;

/// ADC channel gain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChannelGain {
    Gain1_6,
    Gain1_5,
    Gain1_4,
    Gain1_3,
    Gain1_2,
    Gain1,
    Gain2,
    Gain4,
}

/// ADC reference voltage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Reference {
    /// Internal 0.6 V reference.
    Internal,
    /// VDD / 4.
    VddQuarter,
}

/// ADC conversion resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Resolution {
    Bits8,
    Bits10,
    Bits12,
    Bits14,
}

impl Resolution {
    pub const fn bits(self) -> u8 {
        match self {
            Resolution::Bits8 => 8,
            Resolution::Bits10 => 10,
            Resolution::Bits12 => 12,
            Resolution::Bits14 => 14,
        }
    }
}

/// Analog input pin `AIN0`..`AIN7`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AnalogInput(pub u8);

/// Acquisition engine parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AcquisitionConfig {
    pub channel_gain: ChannelGain,
    pub reference: Reference,
    pub input_pin: AnalogInput,
    pub resolution: Resolution,
    /// Interval between timer-triggered conversions.
    pub sampling_period_us: u32,
    /// Buffers handed to the hardware at once.
    pub buffer_count: usize,
    /// Samples per buffer; must equal the pool block length.
    pub buffer_size_samples: usize,
}

impl AcquisitionConfig {
    /// Reject parameters the hardware cannot honour.
    pub fn validate(&self, block_samples: usize, pool_blocks: usize) -> Result<(), ConfigFault> {
        if self.input_pin.0 > 7 {
            return Err(ConfigFault::InvalidParameter("input_pin"));
        }
        if self.sampling_period_us == 0 {
            return Err(ConfigFault::InvalidParameter("sampling_period_us"));
        }
        if self.buffer_count < 2 || self.buffer_count > pool_blocks {
            return Err(ConfigFault::InvalidParameter("buffer_count"));
        }
        if self.buffer_size_samples != block_samples {
            return Err(ConfigFault::BlockSizeMismatch);
        }
        Ok(())
    }

    /// Compare value for the sampling timer.
    pub fn timer_ticks(&self) -> u32 {
        let ticks = self.sampling_period_us as u64 * TIMER_BASE_HZ as u64 / 1_000_000;
        ticks.min(u32::MAX as u64) as u32
    }

    /// Effective sample rate in Hz.
    pub fn sample_rate_hz(&self) -> u32 {
        1_000_000 / self.sampling_period_us.max(1)
    }
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        AcquisitionConfig {
            channel_gain: ChannelGain::Gain1_6,
            reference: Reference::Internal,
            input_pin: AnalogInput(2),
            resolution: Resolution::Bits12,
            sampling_period_us: ADC_SAMPLING_PERIOD_US,
            buffer_count: ADC_BUFFER_SLOTS,
            buffer_size_samples: ADC_BLOCK_SAMPLES,
        }
    }
}

/// Serial audio data format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DataFormat {
    I2s,
    LeftJustified,
    RightJustified,
    PcmShort,
    PcmLong,
}

/// Who drives the bit and frame clocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ClockRole {
    Master,
    Slave,
}

/// Streaming direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    Rx,
    Tx,
    Both,
}

/// Serial audio bus parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct I2sConfig {
    pub word_size_bits: u8,
    pub channel_count: u8,
    pub frame_clock_hz: u32,
    pub format: DataFormat,
    pub block_size_bytes: usize,
    /// Bound on each blocking read/write.
    pub timeout_ms: u32,
    pub clock_role: ClockRole,
    pub direction: Direction,
    /// Consecutive timeouts tolerated before the bridge faults.
    pub max_retries: u8,
}

impl I2sConfig {
    pub fn validate(&self, block_bytes: usize) -> Result<(), ConfigFault> {
        if !matches!(self.word_size_bits, 16 | 24 | 32) {
            return Err(ConfigFault::InvalidParameter("word_size_bits"));
        }
        if self.channel_count == 0 || self.channel_count as usize > BUS_CHANNELS {
            return Err(ConfigFault::InvalidParameter("channel_count"));
        }
        if self.frame_clock_hz == 0 {
            return Err(ConfigFault::InvalidParameter("frame_clock_hz"));
        }
        if self.timeout_ms == 0 {
            return Err(ConfigFault::InvalidParameter("timeout_ms"));
        }
        if self.block_size_bytes != block_bytes {
            return Err(ConfigFault::BlockSizeMismatch);
        }
        Ok(())
    }
}

impl Default for I2sConfig {
    fn default() -> Self {
        I2sConfig {
            word_size_bits: 32,
            channel_count: BUS_CHANNELS as u8,
            frame_clock_hz: SAMPLE_RATE_HZ,
            format: DataFormat::I2s,
            block_size_bytes: BUS_BLOCK_BYTES,
            timeout_ms: I2S_TIMEOUT_MS,
            clock_role: ClockRole::Master,
            direction: Direction::Both,
            max_retries: I2S_MAX_RETRIES,
        }
    }
}

/// Which transform stages run, and their parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TransformConfig {
    /// Overwrite the block with the built-in test waveform.
    pub signal_injection: bool,
    pub lowpass: bool,
    /// Replace each stereo pair with `right - left` on both channels.
    pub stereo_difference: bool,
    pub gain: bool,
    /// Gain is `1 << gain_shift`; it is also the guaranteed headroom in bits.
    pub gain_shift: u32,
    /// Interleaved channels in each block.
    pub channels: usize,
}

impl TransformConfig {
    /// Every stage disabled: blocks pass through untouched.
    pub const fn passthrough() -> Self {
        TransformConfig {
            signal_injection: false,
            lowpass: false,
            stereo_difference: false,
            gain: false,
            gain_shift: AMP_FACTOR,
            channels: BUS_CHANNELS,
        }
    }

    /// Stage selection from the enabled Cargo features.
    pub const fn from_features() -> Self {
        TransformConfig {
            signal_injection: cfg!(feature = "signal-gen"),
            lowpass: cfg!(feature = "lowpass"),
            stereo_difference: cfg!(feature = "stereo-diff"),
            gain: cfg!(feature = "gain"),
            gain_shift: AMP_FACTOR,
            channels: BUS_CHANNELS,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigFault> {
        if self.gain_shift >= 31 {
            return Err(ConfigFault::InvalidParameter("gain_shift"));
        }
        if self.channels == 0 || self.channels > BUS_CHANNELS {
            return Err(ConfigFault::InvalidParameter("channels"));
        }
        if self.stereo_difference && self.channels != 2 {
            return Err(ConfigFault::InvalidParameter("stereo_difference"));
        }
        Ok(())
    }
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self::from_features()
    }
}
