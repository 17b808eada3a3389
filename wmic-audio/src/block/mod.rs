//! Fixed-size sample blocks and the pool that owns them.
//!
//! A [`BlockPool`] is created once with a fixed number of equally sized
//! blocks. [`BlockPool::acquire`] hands out a [`Block`], an exclusive handle
//! that dereferences to the sample array. Moving the handle is the only way
//! to pass a block between stages; dropping it returns the slot to the pool.

pub mod handle;
pub mod pool;

pub use handle::Block;
pub use pool::{AcquirePolicy, BlockPool};

use crate::constants::{
    ADC_BLOCK_SAMPLES, ADC_POOL_BLOCKS, BUS_BLOCK_SAMPLES, BUS_POOL_BLOCKS,
};

/// Signed PCM sample type stored in a block.
pub trait Sample: Copy + Send + PartialEq + core::fmt::Debug + 'static {
    /// Silence.
    const ZERO: Self;
    /// Most negative representable value.
    const MIN: Self;
    /// Most positive representable value.
    const MAX: Self;
    /// Width in bits.
    const BITS: u32;
}

impl Sample for i16 {
    const ZERO: Self = 0;
    const MIN: Self = i16::MIN;
    const MAX: Self = i16::MAX;
    const BITS: u32 = 16;
}

impl Sample for i32 {
    const ZERO: Self = 0;
    const MIN: Self = i32::MIN;
    const MAX: Self = i32::MAX;
    const BITS: u32 = 32;
}

/// Pool of interleaved 32-bit serial-bus blocks.
pub type BusPool = BlockPool<i32, BUS_BLOCK_SAMPLES, BUS_POOL_BLOCKS>;

/// Block from a [`BusPool`].
pub type BusBlock<'p> = Block<'p, i32, BUS_BLOCK_SAMPLES, BUS_POOL_BLOCKS>;

/// Pool of 16-bit ADC blocks.
pub type AdcPool = BlockPool<i16, ADC_BLOCK_SAMPLES, ADC_POOL_BLOCKS>;

/// Block from an [`AdcPool`].
pub type AdcBlock<'p> = Block<'p, i16, ADC_BLOCK_SAMPLES, ADC_POOL_BLOCKS>;
