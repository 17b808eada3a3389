//! # wmic-audio
//!
//! A `no_std`, allocation-free audio core for a wireless microphone /
//! Bluetooth audio bridge. A hardware-timed ADC front end (or an I2S
//! receiver) fills fixed-size blocks, a transform stage processes them in
//! place, and a transfer bridge streams them to a Bluetooth module over I2S.
//!
//! ## Architecture
//!
//! | Layer | Module | Purpose |
//! |-------|--------|---------|
//! | Memory | [`block`] | Fixed-size block pool with exclusive, move-only handles |
//! | Acquisition | [`acquisition`] | Timer + ADC + event-fabric state machine |
//! | I/O | [`io`] | Interrupt → thread handoff, I2S transfer bridge |
//! | DSP | [`dsp`] | Test tone, FIR low-pass, stereo difference, gain, delay line |
//! | Glue | [`pipeline`] | ADC blocks → bus blocks → bridge |
//! | Setup | [`config`] / [`constants`] | Peripheral parameters and build-time sizes |
//!
//! ## Quick start (ADC variant)
//!
//! ```ignore
//! use wmic_audio::prelude::*;
//!
//! static ADC_POOL: AdcPool = AdcPool::new();
//! static BUS_POOL: BusPool = BusPool::new();
//! static HANDOFF: Handoff<AdcBlock<'static>> = Handoff::new();
//!
//! // Interrupt side
//! let mut engine = AcquisitionEngine::new(saadc, &ADC_POOL, &HANDOFF);
//! engine.configure(AcquisitionConfig::default())?;
//! // in the ADC ISR:
//! let _ = engine.on_event(event);
//!
//! // Bus thread
//! let chain = TransformChain::new(TransformConfig::default())?;
//! let mut bridge = TransferBridge::new(i2s, &BUS_POOL, chain);
//! bridge.configure(I2sConfig { direction: Direction::Tx, ..I2sConfig::default() })?;
//! let mut pipeline = AdcPipeline::new(&HANDOFF, &BUS_POOL, bridge)?;
//! let err = pipeline.run(&mut delay);
//! ```
//!
//! ## Features
//!
//! | Feature | Default | Enables |
//! |---------|---------|---------|
//! | `lowpass` | yes | FIR low-pass in [`config::TransformConfig::from_features`] |
//! | `gain` | yes | Output gain (`x8`, saturating) |
//! | `stereo-diff` | no | Replace each frame with `R - L` |
//! | `signal-gen` | no | Replace input with the built-in test tone |
//! | `defmt` | no | `defmt::Format` on error, state and config types |
//!
//! ## Audio parameters
//!
//! - **Bus:** 44.1 kHz, 32-bit stereo I2S ([`constants::SAMPLE_RATE_HZ`])
//! - **Block:** 10 ms, 441 frames ([`constants::FRAMES_PER_BLOCK`])
//! - **ADC:** 16-bit mono, one conversion every 22 us
//! - **Pools:** 5 bus blocks, 4 ADC blocks

#![no_std]

pub mod acquisition;
pub mod block;
pub mod config;
pub mod constants;
pub mod dsp;
pub mod error;
pub mod io;
pub mod pipeline;

pub use error::{ConfigFault, PipelineError};

/// The types needed to assemble a pipeline.
pub mod prelude {
    pub use crate::acquisition::{AcquisitionEngine, AcquisitionEvent, SamplingHardware};
    pub use crate::block::{AcquirePolicy, AdcBlock, AdcPool, Block, BlockPool, BusBlock, BusPool};
    pub use crate::config::{AcquisitionConfig, Direction, I2sConfig, TransformConfig};
    pub use crate::dsp::{BlockTransform, TransformChain};
    pub use crate::error::{ConfigFault, PipelineError};
    pub use crate::io::{Handoff, I2sPeripheral, TransferBridge};
    pub use crate::pipeline::AdcPipeline;
}

#[cfg(test)]
mod mock;
