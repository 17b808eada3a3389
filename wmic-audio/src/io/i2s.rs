//! Seam between the transfer bridge and the I2S peripheral driver.
//!
//! The driver works on whole blocks: [`write`](I2sPeripheral::write) queues
//! a block for transmission and takes ownership of it,
//! [`read`](I2sPeripheral::read) hands out the next received block. Both
//! block for at most the configured timeout.
//!
//! ```text
//!             ┌──────────── I2S peripheral ────────────┐
//!  write(b) ─►│ TX queue ──DMA──► SDOUT                │
//!  read()  ◄──│ RX queue ◄──DMA── SDIN                 │
//!             └────────────────────────────────────────┘
//! ```

use crate::config::{Direction, I2sConfig};

/// Stream control commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Trigger {
    /// Begin streaming; at least two TX blocks must be queued.
    Start,
    /// Stop after the current block.
    Stop,
    /// Stop once every queued block has been sent.
    Drain,
    /// Stop immediately and discard queued blocks.
    Drop,
}

/// Error reported by the I2S driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum I2sFault {
    /// No block arrived / no room freed within the timeout.
    Timeout,
    NotReady,
    /// Driver error code.
    Io(i32),
}

impl I2sFault {
    pub fn code(&self) -> i32 {
        match *self {
            I2sFault::Timeout => -11,
            I2sFault::NotReady => -19,
            I2sFault::Io(code) => code,
        }
    }
}

/// Block-oriented I2S driver.
pub trait I2sPeripheral<B> {
    /// Platform readiness query.
    fn is_ready(&self) -> bool;

    fn configure(&mut self, config: &I2sConfig) -> Result<(), I2sFault>;

    /// Next received block, waiting at most `timeout_ms`.
    fn read(&mut self, timeout_ms: u32) -> Result<B, I2sFault>;

    /// Queue a block for transmission. The block is handed back on failure.
    fn write(&mut self, block: B, timeout_ms: u32) -> Result<(), (I2sFault, B)>;

    fn trigger(&mut self, direction: Direction, cmd: Trigger) -> Result<(), I2sFault>;
}
