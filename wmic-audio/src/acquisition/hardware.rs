//! Seam between the acquisition engine and the sampling peripherals.
//!
//! Three peripherals cooperate: a periodic timer, an ADC with an
//! easy-DMA buffer queue, and the event fabric (PPI) that connects an event
//! on one peripheral to a task on another. Once wired, conversions run with
//! no CPU involvement:
//!
//! ```text
//!  TIMER ──COMPARE0──► (fabric) ──► ADC.SAMPLE
//!  ADC   ──END───────► (fabric) ──► ADC.START      (next queued buffer)
//!  ADC   ──BUF_REQ / DONE / READY──► interrupt ──► AcquisitionEngine::on_event
//! ```

use crate::config::AcquisitionConfig;

/// Event → task connections the engine wires on the fabric.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EventRoute {
    /// Timer compare triggers one conversion.
    TimerCompareToSample,
    /// End of a buffer immediately starts the next queued one.
    ConversionEndToStart,
}

/// Error reported by the sampling peripherals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HardwareError {
    NotReady,
    /// A buffer was supplied after the ADC needed it.
    DeadlineMissed,
    /// No free fabric channel.
    NoChannel,
    Busy,
    /// Vendor driver error code.
    Code(i32),
}

impl HardwareError {
    pub fn code(&self) -> i32 {
        match *self {
            HardwareError::NotReady => -19,
            HardwareError::DeadlineMissed => -116,
            HardwareError::NoChannel => -28,
            HardwareError::Busy => -16,
            HardwareError::Code(code) => code,
        }
    }
}

/// Hardware event delivered to [`AcquisitionEngine::on_event`](super::AcquisitionEngine::on_event).
///
/// `B` is the block type; a filled block comes back to software inside
/// [`ConversionDone`](AcquisitionEvent::ConversionDone).
#[derive(Debug)]
pub enum AcquisitionEvent<B> {
    /// The first buffer is loaded; sampling may start.
    Ready,
    /// The ADC started a queued buffer and wants the one after it.
    BufferRequested,
    /// A buffer is full.
    ConversionDone(B),
    /// The peripheral flagged an error.
    PeripheralError(i32),
    /// Event id the engine does not know.
    Unknown(u32),
}

/// Timer, ADC and event fabric as one unit.
///
/// Implementations own the blocks handed to [`set_buffer`](Self::set_buffer)
/// until they return them through [`AcquisitionEvent::ConversionDone`] or
/// [`reclaim`](Self::reclaim).
pub trait SamplingHardware<B> {
    /// Platform readiness query.
    fn is_ready(&self) -> bool;

    /// Channel gain, reference, input pin and resolution.
    fn configure_channel(&mut self, config: &AcquisitionConfig) -> Result<(), HardwareError>;

    /// Program the timer compare (clear on compare, timer left disabled).
    fn configure_timer(&mut self, compare_ticks: u32) -> Result<(), HardwareError>;

    /// Queue a buffer for the ADC's DMA. Hands the block back on failure.
    fn set_buffer(&mut self, block: B) -> Result<(), (HardwareError, B)>;

    /// Arm the ADC so conversions are started by fabric tasks.
    fn enter_trigger_mode(&mut self) -> Result<(), HardwareError>;

    fn connect(&mut self, route: EventRoute) -> Result<(), HardwareError>;

    fn disconnect_all(&mut self);

    fn enable_timer(&mut self);

    fn disable_timer(&mut self);

    /// Take back one queued buffer after the hardware is stopped.
    fn reclaim(&mut self) -> Option<B>;
}
