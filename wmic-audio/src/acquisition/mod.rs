//! Hardware-triggered ADC acquisition.
//!
//! [`AcquisitionEngine`] wires the timer, the ADC and the event fabric so
//! that conversions free-run at the configured period, then reacts to the
//! ADC's events:
//!
//! | Event | Response (interrupt context) |
//! |-------|------------------------------|
//! | `Ready` | enable the sampling timer |
//! | `BufferRequested` | queue the next pool block, or stall the timer |
//! | `ConversionDone` | publish the filled block to the [`Handoff`] |
//! | `PeripheralError` | record the fault for [`service`](AcquisitionEngine::service) |
//! | `Unknown` | count it, keep running |
//!
//! The interrupt path only moves handles and flips state. Anything that may
//! wait or log happens in [`service`](AcquisitionEngine::service) on a
//! thread.
//!
//! ## Back-pressure
//!
//! When the consumer holds every free block (it is a full cycle behind),
//! `BufferRequested` cannot be satisfied. The engine disables the sampling
//! timer instead of reusing a block, reports [`PipelineError::OverrunRisk`]
//! and resumes from `service` once a block comes back to the pool.

pub mod hardware;

pub use hardware::{AcquisitionEvent, EventRoute, HardwareError, SamplingHardware};

use embedded_hal::delay::DelayNs;
use log::{debug, error, info, warn};

use crate::block::{Block, BlockPool};
use crate::config::AcquisitionConfig;
use crate::constants::POLL_INTERVAL_US;
use crate::error::{ConfigFault, PipelineError};
use crate::io::handoff::Handoff;

/// Lifecycle of the acquisition engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EngineState {
    Idle,
    Configuring,
    /// Buffers queued and fabric wired; waiting for `Ready`.
    Armed,
    /// Timer running, conversions free-running.
    Sampling,
    /// Timer held off until the consumer frees a block.
    Stalled,
    Stopped,
    Faulted,
}

/// Why the engine is stalled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StallReason {
    /// `BufferRequested` found the pool empty.
    NoFreeBlock,
    /// A filled block could not be published.
    HandoffFull,
}

/// Counters for diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EngineStats {
    pub blocks_published: u32,
    pub buffers_supplied: u32,
    pub stalls: u32,
    pub event_errors: u32,
    /// Conversions completed while a parked block was still waiting.
    pub blocks_dropped: u32,
}

/// ADC acquisition state machine over `i16` blocks of `LEN` samples.
pub struct AcquisitionEngine<'p, 'h, H, const LEN: usize, const N: usize> {
    hw: H,
    pool: &'p BlockPool<i16, LEN, N>,
    handoff: &'h Handoff<Block<'p, i16, LEN, N>>,
    config: AcquisitionConfig,
    state: EngineState,
    stall: Option<StallReason>,
    /// A `BufferRequested` is waiting for a free block.
    pending_request: bool,
    /// Filled block waiting for room in the handoff.
    parked: Option<Block<'p, i16, LEN, N>>,
    next_slot: usize,
    /// Fault raised in interrupt context, reported by `service`.
    fault: Option<PipelineError>,
    reported_event_errors: u32,
    stats: EngineStats,
}

impl<'p, 'h, H, const LEN: usize, const N: usize> AcquisitionEngine<'p, 'h, H, LEN, N>
where
    H: SamplingHardware<Block<'p, i16, LEN, N>>,
{
    pub fn new(
        hw: H,
        pool: &'p BlockPool<i16, LEN, N>,
        handoff: &'h Handoff<Block<'p, i16, LEN, N>>,
    ) -> Self {
        AcquisitionEngine {
            hw,
            pool,
            handoff,
            config: AcquisitionConfig::default(),
            state: EngineState::Idle,
            stall: None,
            pending_request: false,
            parked: None,
            next_slot: 0,
            fault: None,
            reported_event_errors: 0,
            stats: EngineStats::default(),
        }
    }

    /// Configure channel, timer and buffers, and wire the event fabric.
    ///
    /// On success the engine is `Armed`. On failure every block handed to
    /// the hardware is reclaimed and the engine returns to `Idle`.
    pub fn configure(&mut self, config: AcquisitionConfig) -> Result<(), PipelineError> {
        if !matches!(self.state, EngineState::Idle | EngineState::Stopped) {
            return Err(ConfigFault::InvalidState.into());
        }
        self.state = EngineState::Configuring;

        if let Err(e) = self.try_configure(&config) {
            error!("acquisition: configuration failed: {}", e);
            self.release_hardware();
            self.state = EngineState::Idle;
            return Err(e);
        }

        self.config = config;
        self.state = EngineState::Armed;
        info!(
            "acquisition: armed, {} buffers of {} samples every {} us",
            config.buffer_count, LEN, config.sampling_period_us
        );
        Ok(())
    }

    fn try_configure(&mut self, config: &AcquisitionConfig) -> Result<(), PipelineError> {
        config.validate(LEN, N)?;
        if !self.hw.is_ready() {
            return Err(ConfigFault::NotReady.into());
        }

        self.hw.configure_timer(config.timer_ticks()).map_err(rejected)?;
        self.hw.configure_channel(config).map_err(rejected)?;

        self.next_slot = 0;
        for _ in 0..config.buffer_count {
            let block = self
                .pool
                .acquire()
                .map_err(|_| PipelineError::from(ConfigFault::InsufficientBlocks))?;
            self.hw.set_buffer(block).map_err(|(e, _block)| rejected(e))?;
            self.advance_slot(config.buffer_count);
        }
        self.hw.enter_trigger_mode().map_err(rejected)?;

        self.hw.connect(EventRoute::TimerCompareToSample).map_err(rejected)?;
        self.hw.connect(EventRoute::ConversionEndToStart).map_err(rejected)?;
        Ok(())
    }

    /// Handle one hardware event. Interrupt context: never blocks or logs.
    pub fn on_event(
        &mut self,
        event: AcquisitionEvent<Block<'p, i16, LEN, N>>,
    ) -> Result<(), PipelineError> {
        match event {
            AcquisitionEvent::Ready => {
                if self.state == EngineState::Armed {
                    self.hw.enable_timer();
                    self.state = EngineState::Sampling;
                }
                Ok(())
            }
            AcquisitionEvent::BufferRequested => self.on_buffer_request(),
            AcquisitionEvent::ConversionDone(block) => self.on_conversion_done(block),
            AcquisitionEvent::PeripheralError(code) => {
                let err = PipelineError::PeripheralFault(code);
                self.fault = Some(err);
                Err(err)
            }
            AcquisitionEvent::Unknown(raw) => {
                self.stats.event_errors = self.stats.event_errors.wrapping_add(1);
                Err(PipelineError::EventError(raw))
            }
        }
    }

    fn on_buffer_request(&mut self) -> Result<(), PipelineError> {
        if !matches!(self.state, EngineState::Sampling | EngineState::Stalled) {
            return Ok(());
        }
        match self.pool.acquire() {
            Ok(block) => self.supply(block),
            Err(_) => {
                self.pending_request = true;
                self.enter_stall(StallReason::NoFreeBlock);
                Err(PipelineError::OverrunRisk)
            }
        }
    }

    fn on_conversion_done(&mut self, block: Block<'p, i16, LEN, N>) -> Result<(), PipelineError> {
        if self.parked.is_some() {
            // The timer is already stalled, so this can only be a conversion
            // that was in flight. The parked block keeps its place in order.
            drop(block);
            self.stats.blocks_dropped = self.stats.blocks_dropped.wrapping_add(1);
            self.enter_stall(StallReason::HandoffFull);
            return Err(PipelineError::OverrunRisk);
        }
        match self.handoff.publish(block) {
            Ok(()) => {
                self.stats.blocks_published = self.stats.blocks_published.wrapping_add(1);
                Ok(())
            }
            Err(block) => {
                self.parked = Some(block);
                self.enter_stall(StallReason::HandoffFull);
                Err(PipelineError::OverrunRisk)
            }
        }
    }

    fn supply(&mut self, block: Block<'p, i16, LEN, N>) -> Result<(), PipelineError> {
        match self.hw.set_buffer(block) {
            Ok(()) => {
                self.stats.buffers_supplied = self.stats.buffers_supplied.wrapping_add(1);
                self.advance_slot(self.config.buffer_count);
                Ok(())
            }
            Err((e, _block)) => {
                let err = match e {
                    HardwareError::DeadlineMissed => PipelineError::PeripheralTimeout,
                    other => PipelineError::PeripheralFault(other.code()),
                };
                self.hw.disable_timer();
                self.hw.disconnect_all();
                self.fault = Some(err);
                self.state = EngineState::Faulted;
                Err(err)
            }
        }
    }

    fn enter_stall(&mut self, reason: StallReason) {
        if self.state == EngineState::Sampling {
            self.hw.disable_timer();
            self.state = EngineState::Stalled;
            self.stats.stalls = self.stats.stalls.wrapping_add(1);
        }
        if self.stall.is_none() {
            self.stall = Some(reason);
        }
    }

    fn advance_slot(&mut self, count: usize) {
        self.next_slot = (self.next_slot + 1) % count.max(1);
    }

    /// Thread-context housekeeping.
    ///
    /// Reports faults recorded by [`on_event`](Self::on_event) and, when
    /// stalled, publishes the parked block, satisfies the pending buffer
    /// request and restarts the timer. Returns `OverrunRisk` while the
    /// consumer still holds every block.
    pub fn service(&mut self) -> Result<EngineState, PipelineError> {
        if let Some(fault) = self.fault.take() {
            error!("acquisition: {}", fault);
            if fault.is_fatal() {
                self.release_hardware();
                self.state = EngineState::Faulted;
            }
            return Err(fault);
        }

        if self.stats.event_errors != self.reported_event_errors {
            warn!(
                "acquisition: {} unexpected hardware events ignored",
                self.stats.event_errors.wrapping_sub(self.reported_event_errors)
            );
            self.reported_event_errors = self.stats.event_errors;
        }

        if self.state != EngineState::Stalled {
            return Ok(self.state);
        }

        if let Some(block) = self.parked.take() {
            match self.handoff.publish(block) {
                Ok(()) => {
                    self.stats.blocks_published = self.stats.blocks_published.wrapping_add(1)
                }
                Err(block) => {
                    self.parked = Some(block);
                    return Err(PipelineError::OverrunRisk);
                }
            }
        }

        if self.pending_request {
            let block = self.pool.acquire().map_err(|_| PipelineError::OverrunRisk)?;
            self.supply(block)?;
            self.pending_request = false;
        }

        if let Some(reason) = self.stall.take() {
            debug!("acquisition: resuming after stall ({:?})", reason);
        }
        self.hw.enable_timer();
        self.state = EngineState::Sampling;
        Ok(self.state)
    }

    /// Call [`service`](Self::service) until the stall clears or `timeout_us`
    /// elapses, suspending on `delay` between attempts.
    pub fn wait_resume<D: DelayNs>(
        &mut self,
        delay: &mut D,
        timeout_us: u32,
    ) -> Result<EngineState, PipelineError> {
        let mut waited = 0u32;
        loop {
            match self.service() {
                Err(PipelineError::OverrunRisk) if waited < timeout_us => {
                    let step = POLL_INTERVAL_US.min(timeout_us - waited);
                    delay.delay_us(step);
                    waited += step;
                }
                other => return other,
            }
        }
    }

    /// Disable timer and event fabric and take every block back.
    pub fn stop(&mut self) {
        self.release_hardware();
        self.state = EngineState::Stopped;
        info!("acquisition: stopped");
    }

    fn release_hardware(&mut self) {
        self.hw.disable_timer();
        self.hw.disconnect_all();
        while let Some(block) = self.hw.reclaim() {
            drop(block);
        }
        self.parked = None;
        self.pending_request = false;
        self.stall = None;
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn stall_reason(&self) -> Option<StallReason> {
        self.stall
    }

    /// Index of the slot the next supplied buffer fills.
    pub fn next_slot(&self) -> usize {
        self.next_slot
    }

    pub fn stats(&self) -> EngineStats {
        self.stats
    }

    pub fn config(&self) -> &AcquisitionConfig {
        &self.config
    }

    pub fn hardware(&self) -> &H {
        &self.hw
    }

    pub fn hardware_mut(&mut self) -> &mut H {
        &mut self.hw
    }
}

fn rejected(e: HardwareError) -> PipelineError {
    ConfigFault::Rejected(e.code()).into()
}
