//! Compile-time configuration of the audio path.
//!
//! The I2S bus carries 32-bit stereo frames at 44.1 kHz (the paired
//! Bluetooth module accepts 44.1 or 48 kHz only). The ADC front end produces
//! 16-bit mono samples which are widened before transmission.

/// Serial-bus frame clock in Hz.
pub const SAMPLE_RATE_HZ: u32 = 44_100;

/// Interleaved channels on the serial bus.
pub const BUS_CHANNELS: usize = 2;

/// Bytes per sample word on the serial bus.
pub const BUS_WORD_BYTES: usize = 4;

/// Audio carried by one block, in milliseconds.
pub const BLOCK_TIME_MS: u32 = 10;

/// Frames (one sample per channel) per block.
pub const FRAMES_PER_BLOCK: usize = (SAMPLE_RATE_HZ * BLOCK_TIME_MS / 1000) as usize;

/// Interleaved `i32` samples per serial-bus block.
pub const BUS_BLOCK_SAMPLES: usize = BUS_CHANNELS * FRAMES_PER_BLOCK;

/// Serial-bus block size in bytes.
pub const BUS_BLOCK_BYTES: usize = BUS_BLOCK_SAMPLES * BUS_WORD_BYTES;

/// Blocks that must be queued on the I2S peripheral before streaming starts.
pub const INITIAL_BLOCKS: usize = 2;

/// Spare blocks available to the bus beyond the priming set.
pub const AVAILABLE_BLOCKS: usize = 3;

/// Blocks in the serial-bus pool.
pub const BUS_POOL_BLOCKS: usize = INITIAL_BLOCKS + AVAILABLE_BLOCKS;

/// I2S read/write timeout in milliseconds.
pub const I2S_TIMEOUT_MS: u32 = 2000;

/// Timeouts tolerated on the I2S bus before the bridge faults.
pub const I2S_MAX_RETRIES: u8 = 3;

/// `i16` samples per ADC block (mono, one block per bus block).
pub const ADC_BLOCK_SAMPLES: usize = FRAMES_PER_BLOCK;

/// Buffers handed to the ADC at once (double buffering).
pub const ADC_BUFFER_SLOTS: usize = 2;

/// Blocks in the ADC pool: the hardware slots plus the handoff capacity.
pub const ADC_POOL_BLOCKS: usize = ADC_BUFFER_SLOTS + HANDOFF_CAPACITY;

/// Sampling period of the ADC timer in microseconds (~44.1 kHz).
pub const ADC_SAMPLING_PERIOD_US: u32 = 22;

/// Tick rate of the timer driving ADC conversions.
pub const TIMER_BASE_HZ: u32 = 1_000_000;

/// Blocks the cross-domain handoff can hold.
pub const HANDOFF_CAPACITY: usize = 2;

/// Poll interval used by bounded waits.
pub const POLL_INTERVAL_US: u32 = 50;

/// Left shift applied by the output gain stage (x8).
pub const AMP_FACTOR: u32 = 3;

/// Low-pass filter length.
pub const FIR_TAPS: usize = 39;

/// Samples the low-pass filter processes per pass over its state buffer.
pub const FIR_BLOCK_LEN: usize = 32;

/// Entries in the injected test waveform.
pub const SIGNAL_TABLE_LEN: usize = 320;

/// Ring length of the double-tracking delay line.
pub const ADT_BUFFER_LEN: usize = 50_000;

/// Maximum number of blocks a pool can track (one bit each).
pub const MAX_POOL_BLOCKS: usize = 32;
