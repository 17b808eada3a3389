//! Moving blocks between execution contexts and out to the I2S bus.
//!
//! ## Components
//!
//! | Item | Role |
//! |------|------|
//! | [`Handoff`] | Interrupt → thread queue of filled ADC blocks (capacity 2) |
//! | [`TransferBridge`] | Read/transform/write loop against an [`I2sPeripheral`] |
//! | [`I2sPeripheral`] | Seam to the platform's block-oriented I2S driver |
//!
//! ## Utilities
//!
//! - [`interleave`]: widen mono ADC blocks into interleaved bus blocks
//! - [`spsc`]: lock-free single-producer single-consumer ring buffer
//!
//! ## Block flow
//!
//! ```text
//!  ADC ISR ──publish──► Handoff ──take──► pipeline ──push──► TransferBridge ──► I2S TX
//!                                                          ▲
//!  I2S RX ──read──────────────────────────────────► step ──┘ (duplex mode)
//! ```

pub mod bridge;
pub mod handoff;
pub mod i2s;
pub mod interleave;
pub mod spsc;

pub use bridge::{BridgeState, BusBridge, TransferBridge};
pub use handoff::Handoff;
pub use i2s::{I2sFault, I2sPeripheral, Trigger};
