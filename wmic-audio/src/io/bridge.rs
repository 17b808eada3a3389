//! Block transfer between the processing pipeline and the I2S peripheral.
//!
//! [`TransferBridge`] runs one of two loops over pool blocks:
//!
//! - **Duplex** ([`step`](TransferBridge::step) / [`run`](TransferBridge::run)):
//!   read a received block, transform it in place, queue it for transmission.
//!   [`start`](TransferBridge::start) primes the transmitter with silence
//!   first.
//! - **Transmit only** ([`push`](TransferBridge::push)): blocks produced
//!   elsewhere (the ADC path) are transformed and queued. The first
//!   [`INITIAL_BLOCKS`] pushes prime the transmitter; the stream starts
//!   once priming is complete.
//!
//! Every read and write is bounded by the configured timeout. A timeout is
//! retried up to `max_retries` times in a row; one more and the bridge
//! faults, drops the stream (returning every queued block to the pool) and
//! reports [`PipelineError::PeripheralTimeout`].

use log::{debug, error, info, warn};

use crate::block::{Block, BlockPool};
use crate::config::I2sConfig;
use crate::constants::{BUS_BLOCK_SAMPLES, BUS_POOL_BLOCKS, INITIAL_BLOCKS};
use crate::dsp::BlockTransform;
use crate::error::{ConfigFault, PipelineError};

use super::i2s::{I2sFault, I2sPeripheral, Trigger};

/// Bridge over the firmware's bus pool.
pub type BusBridge<'p, P, T> = TransferBridge<'p, P, T, BUS_BLOCK_SAMPLES, BUS_POOL_BLOCKS>;

/// Lifecycle of the transfer bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BridgeState {
    Idle,
    Configured,
    Streaming,
    Stopped,
    Faulted,
}

/// I2S transfer loop over `i32` blocks of `LEN` samples.
pub struct TransferBridge<'p, P, T, const LEN: usize, const N: usize> {
    i2s: P,
    pool: &'p BlockPool<i32, LEN, N>,
    transform: T,
    config: I2sConfig,
    state: BridgeState,
    /// Blocks queued before the stream was started.
    primed: usize,
    blocks_processed: u32,
    retries: u32,
}

impl<'p, P, T, const LEN: usize, const N: usize> TransferBridge<'p, P, T, LEN, N>
where
    P: I2sPeripheral<Block<'p, i32, LEN, N>>,
    T: BlockTransform,
{
    pub fn new(i2s: P, pool: &'p BlockPool<i32, LEN, N>, transform: T) -> Self {
        TransferBridge {
            i2s,
            pool,
            transform,
            config: I2sConfig::default(),
            state: BridgeState::Idle,
            primed: 0,
            blocks_processed: 0,
            retries: 0,
        }
    }

    /// Validate `config` and apply it to the peripheral.
    pub fn configure(&mut self, config: I2sConfig) -> Result<(), PipelineError> {
        if !matches!(
            self.state,
            BridgeState::Idle | BridgeState::Configured | BridgeState::Stopped
        ) {
            return Err(ConfigFault::InvalidState.into());
        }
        config.validate(LEN * core::mem::size_of::<i32>())?;
        if !self.i2s.is_ready() {
            error!("i2s: peripheral not ready");
            return Err(ConfigFault::NotReady.into());
        }
        self.i2s.configure(&config).map_err(|e| {
            error!("i2s: configuration rejected ({})", e.code());
            ConfigFault::Rejected(e.code())
        })?;

        self.config = config;
        self.primed = 0;
        self.state = BridgeState::Configured;
        info!(
            "i2s: {} Hz, {} x {}-bit, {:?}",
            config.frame_clock_hz, config.channel_count, config.word_size_bits, config.direction
        );
        Ok(())
    }

    /// Prime the transmitter with silent blocks and start the stream.
    pub fn start(&mut self) -> Result<(), PipelineError> {
        if self.state != BridgeState::Configured {
            return Err(ConfigFault::InvalidState.into());
        }
        while self.primed < INITIAL_BLOCKS {
            let block = self
                .pool
                .acquire()
                .map_err(|_| ConfigFault::InsufficientBlocks)?;
            self.write(block)?;
            self.primed += 1;
        }
        self.start_stream()
    }

    /// One duplex iteration: read, transform, write.
    pub fn step(&mut self) -> Result<(), PipelineError> {
        if self.state != BridgeState::Streaming {
            return Err(ConfigFault::InvalidState.into());
        }
        let mut block = self.read()?;
        self.transform.process(&mut block[..]);
        self.write(block)?;
        self.blocks_processed = self.blocks_processed.wrapping_add(1);
        Ok(())
    }

    /// Step until something fails; returns the error that ended the loop.
    pub fn run(&mut self) -> PipelineError {
        loop {
            if let Err(e) = self.step() {
                return e;
            }
        }
    }

    /// Transform `block` and queue it for transmission.
    ///
    /// Starts the stream once [`INITIAL_BLOCKS`] blocks are queued.
    pub fn push(&mut self, mut block: Block<'p, i32, LEN, N>) -> Result<(), PipelineError> {
        match self.state {
            BridgeState::Configured | BridgeState::Streaming => {}
            _ => return Err(ConfigFault::InvalidState.into()),
        }
        self.transform.process(&mut block[..]);
        self.write(block)?;
        self.blocks_processed = self.blocks_processed.wrapping_add(1);

        if self.state == BridgeState::Configured {
            self.primed += 1;
            if self.primed >= INITIAL_BLOCKS {
                self.start_stream()?;
            }
        }
        Ok(())
    }

    /// Let queued blocks drain, then stop.
    pub fn stop(&mut self) -> Result<(), PipelineError> {
        match self.state {
            BridgeState::Streaming | BridgeState::Configured => {}
            BridgeState::Stopped => return Ok(()),
            _ => return Err(ConfigFault::InvalidState.into()),
        }
        self.i2s
            .trigger(self.config.direction, Trigger::Drain)
            .map_err(|e| PipelineError::PeripheralFault(e.code()))?;
        self.state = BridgeState::Stopped;
        self.primed = 0;
        info!("i2s: stopped after {} blocks", self.blocks_processed);
        Ok(())
    }

    pub fn state(&self) -> BridgeState {
        self.state
    }

    pub fn config(&self) -> &I2sConfig {
        &self.config
    }

    pub fn blocks_processed(&self) -> u32 {
        self.blocks_processed
    }

    /// Timeouts that were retried, over the bridge's lifetime.
    pub fn retries(&self) -> u32 {
        self.retries
    }

    pub fn peripheral(&self) -> &P {
        &self.i2s
    }

    pub fn peripheral_mut(&mut self) -> &mut P {
        &mut self.i2s
    }

    pub fn transform_mut(&mut self) -> &mut T {
        &mut self.transform
    }

    fn start_stream(&mut self) -> Result<(), PipelineError> {
        let direction = self.config.direction;
        if let Err(e) = self.i2s.trigger(direction, Trigger::Start) {
            return Err(self.fault(e));
        }
        self.state = BridgeState::Streaming;
        info!("i2s: streaming ({:?})", direction);
        Ok(())
    }

    fn read(&mut self) -> Result<Block<'p, i32, LEN, N>, PipelineError> {
        let mut attempts = 0;
        loop {
            match self.i2s.read(self.config.timeout_ms) {
                Ok(block) => return Ok(block),
                Err(I2sFault::Timeout) => self.retry_or_fault("read", &mut attempts)?,
                Err(e) => return Err(self.fault(e)),
            }
        }
    }

    fn write(&mut self, block: Block<'p, i32, LEN, N>) -> Result<(), PipelineError> {
        let mut attempts = 0;
        let mut block = block;
        loop {
            match self.i2s.write(block, self.config.timeout_ms) {
                Ok(()) => return Ok(()),
                Err((I2sFault::Timeout, returned)) => {
                    block = returned;
                    self.retry_or_fault("write", &mut attempts)?;
                }
                Err((e, _returned)) => return Err(self.fault(e)),
            }
        }
    }

    fn retry_or_fault(&mut self, op: &str, attempts: &mut u8) -> Result<(), PipelineError> {
        if *attempts < self.config.max_retries {
            *attempts += 1;
            self.retries = self.retries.wrapping_add(1);
            warn!(
                "i2s: {} timed out, retry {}/{}",
                op, attempts, self.config.max_retries
            );
            return Ok(());
        }
        Err(self.fault(I2sFault::Timeout))
    }

    /// Abandon the stream and hand every queued block back to the pool.
    fn fault(&mut self, cause: I2sFault) -> PipelineError {
        error!("i2s: fault ({}), dropping stream", cause.code());
        if let Err(e) = self.i2s.trigger(self.config.direction, Trigger::Drop) {
            debug!("i2s: drop trigger failed ({})", e.code());
        }
        self.state = BridgeState::Faulted;
        self.primed = 0;
        match cause {
            I2sFault::Timeout => PipelineError::PeripheralTimeout,
            other => PipelineError::PeripheralFault(other.code()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Direction;
    use crate::dsp::Passthrough;
    use crate::mock::MockI2s;

    type TestPool = BlockPool<i32, 8, 4>;
    type TestBlock<'p> = Block<'p, i32, 8, 4>;

    fn i2s_config(direction: Direction) -> I2sConfig {
        I2sConfig {
            block_size_bytes: 8 * 4,
            direction,
            ..I2sConfig::default()
        }
    }

    fn duplex<'p, T: BlockTransform>(
        pool: &'p TestPool,
        transform: T,
    ) -> TransferBridge<'p, MockI2s<TestBlock<'p>>, T, 8, 4> {
        let mut bridge = TransferBridge::new(MockI2s::new(), pool, transform);
        bridge.configure(i2s_config(Direction::Both)).unwrap();
        bridge
    }

    #[test]
    fn configure_validates_block_size() {
        let pool = TestPool::new();
        let mut bridge = TransferBridge::new(MockI2s::new(), &pool, Passthrough);
        let err = bridge.configure(I2sConfig::default()).unwrap_err();
        assert_eq!(
            err,
            PipelineError::ConfigurationError(ConfigFault::BlockSizeMismatch)
        );
        assert_eq!(bridge.state(), BridgeState::Idle);
    }

    #[test]
    fn configure_reports_unready_and_rejected_peripherals() {
        let pool = TestPool::new();
        let mut bridge = TransferBridge::new(MockI2s::new(), &pool, Passthrough);
        bridge.peripheral_mut().ready = false;
        assert_eq!(
            bridge.configure(i2s_config(Direction::Both)),
            Err(PipelineError::ConfigurationError(ConfigFault::NotReady))
        );

        bridge.peripheral_mut().ready = true;
        bridge.peripheral_mut().reject_config = true;
        assert_eq!(
            bridge.configure(i2s_config(Direction::Both)),
            Err(PipelineError::ConfigurationError(ConfigFault::Rejected(-22)))
        );
    }

    #[test]
    fn start_primes_with_silence() {
        let pool = TestPool::new();
        let mut bridge = duplex(&pool, Passthrough);
        bridge.start().unwrap();

        assert_eq!(bridge.state(), BridgeState::Streaming);
        let i2s = bridge.peripheral();
        assert_eq!(i2s.primed, INITIAL_BLOCKS);
        assert_eq!(i2s.triggers, [(Direction::Both, Trigger::Start)]);
        assert!(i2s.transmitted.iter().all(|b| b.iter().all(|&s| s == 0)));
        assert_eq!(pool.in_use(), INITIAL_BLOCKS);
    }

    #[test]
    fn start_without_enough_blocks_is_a_configuration_error() {
        let pool = BlockPool::<i32, 8, 1>::new();
        let mut bridge = TransferBridge::new(MockI2s::new(), &pool, Passthrough);
        bridge.configure(i2s_config(Direction::Both)).unwrap();
        assert_eq!(
            bridge.start(),
            Err(PipelineError::ConfigurationError(ConfigFault::InsufficientBlocks))
        );
    }

    #[test]
    fn step_transforms_in_place() {
        let pool = TestPool::new();
        let mut bridge = duplex(&pool, |samples: &mut [i32]| {
            for s in samples.iter_mut() {
                *s += 1;
            }
        });
        bridge.start().unwrap();
        for _ in 0..4 {
            bridge.step().unwrap();
        }

        assert_eq!(bridge.blocks_processed(), 4);
        let sent = &bridge.peripheral().transmitted;
        assert_eq!(sent.len(), INITIAL_BLOCKS + 4);
        // Loopback: each step re-sends a block that went out two writes ago.
        assert!(sent[2].iter().all(|&s| s == 1));
        assert!(sent[5].iter().all(|&s| s == 2));
        assert_eq!(pool.in_use(), INITIAL_BLOCKS);
    }

    #[test]
    fn timeouts_are_retried() {
        let pool = TestPool::new();
        let mut bridge = duplex(&pool, Passthrough);
        bridge.start().unwrap();

        bridge.peripheral_mut().fail_reads(3);
        bridge.step().unwrap();
        bridge.peripheral_mut().fail_writes(2);
        bridge.step().unwrap();

        assert_eq!(bridge.retries(), 5);
        assert_eq!(bridge.state(), BridgeState::Streaming);
    }

    #[test]
    fn persistent_timeout_faults_and_releases_blocks() {
        let pool = TestPool::new();
        let mut bridge = duplex(&pool, Passthrough);
        bridge.start().unwrap();

        bridge.peripheral_mut().fail_reads(4);
        assert_eq!(bridge.step(), Err(PipelineError::PeripheralTimeout));
        assert_eq!(bridge.state(), BridgeState::Faulted);
        assert_eq!(bridge.retries(), 3);
        assert_eq!(
            bridge.peripheral().triggers.last(),
            Some(&(Direction::Both, Trigger::Drop))
        );
        assert_eq!(pool.in_use(), 0);
        assert_eq!(bridge.step(), Err(ConfigFault::InvalidState.into()));
    }

    #[test]
    fn write_timeout_drops_the_block() {
        let pool = TestPool::new();
        let mut bridge = duplex(&pool, Passthrough);
        bridge.start().unwrap();

        bridge.peripheral_mut().fail_writes(4);
        assert_eq!(bridge.run(), PipelineError::PeripheralTimeout);
        assert_eq!(pool.in_use(), 0);
    }

    #[test]
    fn push_primes_then_starts() {
        let pool = TestPool::new();
        let mut bridge = TransferBridge::new(MockI2s::new(), &pool, Passthrough);
        bridge.configure(i2s_config(Direction::Tx)).unwrap();

        let mut block = pool.acquire().unwrap();
        block.fill(11);
        bridge.push(block).unwrap();
        assert_eq!(bridge.state(), BridgeState::Configured);
        assert!(bridge.peripheral().triggers.is_empty());

        bridge.push(pool.acquire().unwrap()).unwrap();
        assert_eq!(bridge.state(), BridgeState::Streaming);
        assert_eq!(
            bridge.peripheral().triggers,
            [(Direction::Tx, Trigger::Start)]
        );

        for _ in 0..6 {
            bridge.push(pool.acquire().unwrap()).unwrap();
        }
        assert_eq!(bridge.blocks_processed(), 8);
        assert_eq!(bridge.peripheral().transmitted[0], [11; 8]);
        // Sent blocks come back to the pool.
        assert!(pool.in_use() <= 3);
    }

    #[test]
    fn stop_drains() {
        let pool = TestPool::new();
        let mut bridge = duplex(&pool, Passthrough);
        bridge.start().unwrap();
        bridge.step().unwrap();
        bridge.stop().unwrap();

        assert_eq!(bridge.state(), BridgeState::Stopped);
        assert_eq!(
            bridge.peripheral().triggers.last(),
            Some(&(Direction::Both, Trigger::Drain))
        );
        assert_eq!(pool.in_use(), 0);
        assert!(bridge.stop().is_ok());

        // A stopped bridge can be configured and started again.
        bridge.configure(i2s_config(Direction::Both)).unwrap();
        bridge.start().unwrap();
        assert_eq!(pool.in_use(), INITIAL_BLOCKS);
    }
}
