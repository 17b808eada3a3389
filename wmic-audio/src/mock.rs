//! Software doubles for the hardware seams, used by the unit and
//! integration tests.

extern crate std;

use std::collections::VecDeque;
use std::vec::Vec;

use embedded_hal::delay::DelayNs;

use crate::acquisition::{AcquisitionEvent, EventRoute, HardwareError, SamplingHardware};
use crate::config::{AcquisitionConfig, Direction, I2sConfig};
use crate::io::i2s::{I2sFault, I2sPeripheral, Trigger};

/// Delay provider that only records how long it was asked to wait.
#[derive(Debug, Default)]
pub struct MockDelay {
    elapsed_ns: u64,
}

impl MockDelay {
    pub fn new() -> Self {
        MockDelay { elapsed_ns: 0 }
    }

    pub fn elapsed_us(&self) -> u64 {
        self.elapsed_ns / 1_000
    }
}

impl DelayNs for MockDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.elapsed_ns += ns as u64;
    }
}

/// Timer + ADC + event fabric.
///
/// [`convert_block`](MockSaadc::convert_block) plays the part of the free-
/// running hardware: it fills the active buffer and yields the events the
/// ADC would raise.
pub struct MockSaadc<B> {
    pub ready: bool,
    pub timer_enabled: bool,
    pub trigger_mode: bool,
    pub compare_ticks: Option<u32>,
    pub channel: Option<AcquisitionConfig>,
    pub routes: Vec<EventRoute>,
    pub fail_connect: bool,
    pub fail_set_buffer: Option<HardwareError>,
    queue: VecDeque<B>,
}

impl<B> MockSaadc<B> {
    pub fn new() -> Self {
        MockSaadc {
            ready: true,
            timer_enabled: false,
            trigger_mode: false,
            compare_ticks: None,
            channel: None,
            routes: Vec::new(),
            fail_connect: false,
            fail_set_buffer: None,
            queue: VecDeque::new(),
        }
    }

    /// Buffers currently queued for DMA.
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    fn running(&self) -> bool {
        self.timer_enabled
            && self.trigger_mode
            && self.routes.contains(&EventRoute::TimerCompareToSample)
            && self.routes.contains(&EventRoute::ConversionEndToStart)
    }
}

impl<B: AsMut<[i16]>> MockSaadc<B> {
    /// Fill the active buffer with a ramp starting at `start`.
    ///
    /// Returns `[ConversionDone, BufferRequested]`, or nothing when the timer
    /// is stopped or no buffer is queued.
    pub fn convert_block(&mut self, start: i16) -> Vec<AcquisitionEvent<B>> {
        if !self.running() {
            return Vec::new();
        }
        let Some(mut block) = self.queue.pop_front() else {
            return Vec::new();
        };
        for (i, s) in block.as_mut().iter_mut().enumerate() {
            *s = start.wrapping_add(i as i16);
        }
        let mut events = Vec::new();
        events.push(AcquisitionEvent::ConversionDone(block));
        events.push(AcquisitionEvent::BufferRequested);
        events
    }
}

impl<B> SamplingHardware<B> for MockSaadc<B> {
    fn is_ready(&self) -> bool {
        self.ready
    }

    fn configure_channel(&mut self, config: &AcquisitionConfig) -> Result<(), HardwareError> {
        self.channel = Some(*config);
        Ok(())
    }

    fn configure_timer(&mut self, compare_ticks: u32) -> Result<(), HardwareError> {
        self.compare_ticks = Some(compare_ticks);
        Ok(())
    }

    fn set_buffer(&mut self, block: B) -> Result<(), (HardwareError, B)> {
        if let Some(e) = self.fail_set_buffer {
            return Err((e, block));
        }
        self.queue.push_back(block);
        Ok(())
    }

    fn enter_trigger_mode(&mut self) -> Result<(), HardwareError> {
        self.trigger_mode = true;
        Ok(())
    }

    fn connect(&mut self, route: EventRoute) -> Result<(), HardwareError> {
        if self.fail_connect {
            return Err(HardwareError::NoChannel);
        }
        self.routes.push(route);
        Ok(())
    }

    fn disconnect_all(&mut self) {
        self.routes.clear();
    }

    fn enable_timer(&mut self) {
        self.timer_enabled = true;
    }

    fn disable_timer(&mut self) {
        self.timer_enabled = false;
    }

    fn reclaim(&mut self) -> Option<B> {
        self.queue.pop_front()
    }
}

/// I2S peripheral whose receive side replays the blocks it transmitted,
/// the way a wire looped from SDOUT to SDIN would.
///
/// Timeouts can be scripted with [`fail_reads`](MockI2s::fail_reads).
pub struct MockI2s<B> {
    pub ready: bool,
    pub config: Option<I2sConfig>,
    pub triggers: Vec<(Direction, Trigger)>,
    pub reject_config: bool,
    /// Blocks written, in transmit order.
    tx: VecDeque<B>,
    /// Blocks written while the peripheral was idle (priming).
    pub primed: usize,
    pub streaming: bool,
    pending_read_faults: usize,
    pending_write_faults: usize,
    /// Copy of every transmitted block's samples, oldest first.
    pub transmitted: Vec<Vec<i32>>,
    max_tx: usize,
}

impl<B> MockI2s<B> {
    pub fn new() -> Self {
        MockI2s {
            ready: true,
            config: None,
            triggers: Vec::new(),
            reject_config: false,
            tx: VecDeque::new(),
            primed: 0,
            streaming: false,
            pending_read_faults: 0,
            pending_write_faults: 0,
            transmitted: Vec::new(),
            max_tx: 2,
        }
    }

    /// The next `count` reads time out.
    pub fn fail_reads(&mut self, count: usize) {
        self.pending_read_faults = count;
    }

    /// The next `count` writes time out.
    pub fn fail_writes(&mut self, count: usize) {
        self.pending_write_faults = count;
    }

    /// Blocks still owned by the peripheral.
    pub fn held(&self) -> usize {
        self.tx.len()
    }
}

impl<B> I2sPeripheral<B> for MockI2s<B>
where
    B: AsRef<[i32]>,
{
    fn is_ready(&self) -> bool {
        self.ready
    }

    fn configure(&mut self, config: &I2sConfig) -> Result<(), I2sFault> {
        if self.reject_config {
            return Err(I2sFault::Io(-22));
        }
        self.config = Some(*config);
        Ok(())
    }

    fn read(&mut self, _timeout_ms: u32) -> Result<B, I2sFault> {
        if self.pending_read_faults > 0 {
            self.pending_read_faults -= 1;
            return Err(I2sFault::Timeout);
        }
        self.tx.pop_front().ok_or(I2sFault::Timeout)
    }

    fn write(&mut self, block: B, _timeout_ms: u32) -> Result<(), (I2sFault, B)> {
        if self.pending_write_faults > 0 {
            self.pending_write_faults -= 1;
            return Err((I2sFault::Timeout, block));
        }
        if !self.streaming {
            self.primed += 1;
        }
        self.transmitted.push(block.as_ref().to_vec());
        self.tx.push_back(block);
        // A TX-only stream frees the oldest block once it is on the wire.
        let tx_only = matches!(self.config, Some(c) if c.direction == Direction::Tx);
        if tx_only && self.streaming {
            while self.tx.len() > self.max_tx {
                self.tx.pop_front();
            }
        }
        Ok(())
    }

    fn trigger(&mut self, direction: Direction, cmd: Trigger) -> Result<(), I2sFault> {
        self.triggers.push((direction, cmd));
        match cmd {
            Trigger::Start => self.streaming = true,
            // Queued blocks are either sent out or discarded; either way
            // the peripheral lets go of them.
            Trigger::Stop | Trigger::Drain | Trigger::Drop => {
                self.streaming = false;
                self.tx.clear();
            }
        }
        Ok(())
    }
}
