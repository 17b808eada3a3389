//! Consumer side of the ADC variant.
//!
//! [`AdcPipeline`] runs on the bus thread. For every block the acquisition
//! engine publishes it:
//!
//! 1. takes the 16-bit mono block from the [`Handoff`] (bounded wait),
//! 2. acquires a bus block and widens the samples into it, duplicated onto
//!    both channels,
//! 3. drops the ADC block, which returns it to the acquisition pool,
//! 4. pushes the bus block into the [`TransferBridge`], which transforms and
//!    transmits it.
//!
//! An ADC block that finds no free bus block is held back and forwarded
//! first on the next call, so a busy bus pool delays samples but never
//! discards them.

use embedded_hal::delay::DelayNs;
use log::{debug, warn};

use crate::block::{AcquirePolicy, Block, BlockPool};
use crate::constants::{BLOCK_TIME_MS, POLL_INTERVAL_US};
use crate::dsp::BlockTransform;
use crate::error::{ConfigFault, PipelineError};
use crate::io::bridge::{BridgeState, TransferBridge};
use crate::io::handoff::Handoff;
use crate::io::i2s::I2sPeripheral;
use crate::io::interleave::widen_mono;

/// Counters for diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PipelineStats {
    pub blocks_forwarded: u32,
    pub take_timeouts: u32,
    /// Times a taken ADC block had to wait for a bus block.
    pub bus_waits: u32,
}

/// Handoff → widen → transfer bridge.
///
/// `ALEN`/`AN` describe the ADC pool, `BLEN`/`BN` the bus pool.
pub struct AdcPipeline<'h, 'a, 'b, P, T, const ALEN: usize, const AN: usize, const BLEN: usize, const BN: usize>
{
    handoff: &'h Handoff<Block<'a, i16, ALEN, AN>>,
    bus_pool: &'b BlockPool<i32, BLEN, BN>,
    bridge: TransferBridge<'b, P, T, BLEN, BN>,
    /// Taken from the handoff but not yet widened.
    held: Option<Block<'a, i16, ALEN, AN>>,
    channels: usize,
    take_timeout_us: u32,
    /// Consecutive handoff takes that timed out.
    take_misses: u8,
    acquire_policy: AcquirePolicy,
    stats: PipelineStats,
}

impl<'h, 'a, 'b, P, T, const ALEN: usize, const AN: usize, const BLEN: usize, const BN: usize>
    AdcPipeline<'h, 'a, 'b, P, T, ALEN, AN, BLEN, BN>
where
    P: I2sPeripheral<Block<'b, i32, BLEN, BN>>,
    T: BlockTransform,
{
    /// `bridge` must already be configured for transmission.
    ///
    /// Fails with `BlockSizeMismatch` when a widened ADC block does not fit
    /// in one bus block.
    pub fn new(
        handoff: &'h Handoff<Block<'a, i16, ALEN, AN>>,
        bus_pool: &'b BlockPool<i32, BLEN, BN>,
        bridge: TransferBridge<'b, P, T, BLEN, BN>,
    ) -> Result<Self, PipelineError> {
        let channels = bridge.config().channel_count as usize;
        if ALEN * channels > BLEN {
            return Err(ConfigFault::BlockSizeMismatch.into());
        }
        let take_timeout_us = bridge.config().timeout_ms.saturating_mul(1000);
        Ok(AdcPipeline {
            handoff,
            bus_pool,
            bridge,
            held: None,
            channels,
            take_timeout_us,
            take_misses: 0,
            acquire_policy: AcquirePolicy::Blocking {
                timeout_us: BLOCK_TIME_MS * 1000,
            },
            stats: PipelineStats::default(),
        })
    }

    /// Override how long to wait for a free bus block.
    pub fn with_acquire_policy(mut self, policy: AcquirePolicy) -> Self {
        self.acquire_policy = policy;
        self
    }

    /// Move one block from the handoff to the bridge.
    ///
    /// On `PoolExhausted` the ADC block is kept and retried by the next call.
    pub fn forward<D: DelayNs>(&mut self, delay: &mut D) -> Result<(), PipelineError> {
        let adc = match self.held.take() {
            Some(block) => block,
            None => match self.handoff.take(delay, self.take_timeout_us) {
                Ok(block) => {
                    self.take_misses = 0;
                    block
                }
                Err(e) => {
                    self.take_misses = self.take_misses.saturating_add(1);
                    self.stats.take_timeouts = self.stats.take_timeouts.wrapping_add(1);
                    warn!("pipeline: no acquisition block within {} us", self.take_timeout_us);
                    return Err(e);
                }
            },
        };

        let mut bus = match self.bus_pool.acquire_with(self.acquire_policy, delay) {
            Ok(block) => block,
            Err(e) => {
                self.held = Some(adc);
                self.stats.bus_waits = self.stats.bus_waits.wrapping_add(1);
                return Err(e);
            }
        };
        widen_mono(&mut bus[..], &adc[..], self.channels);
        drop(adc);

        self.bridge.push(bus)?;
        self.stats.blocks_forwarded = self.stats.blocks_forwarded.wrapping_add(1);
        Ok(())
    }

    /// Forward blocks until a fatal error; returns that error.
    ///
    /// Recoverable errors are waited out. An empty handoff is retried up to
    /// the bridge's `max_retries` times in a row. Before returning, the
    /// bridge is stopped so the peripheral lets go of its blocks.
    pub fn run<D: DelayNs>(&mut self, delay: &mut D) -> PipelineError {
        let max_misses = self.bridge.config().max_retries;
        let err = loop {
            match self.forward(delay) {
                Ok(()) => {}
                Err(PipelineError::PeripheralTimeout)
                    if self.take_misses > 0 && self.take_misses <= max_misses => {}
                Err(e) if !e.is_fatal() => {
                    debug!("pipeline: {}, retrying", e);
                    delay.delay_us(POLL_INTERVAL_US);
                }
                Err(e) => break e,
            }
        };

        if matches!(self.bridge.state(), BridgeState::Configured | BridgeState::Streaming) {
            if let Err(e) = self.bridge.stop() {
                debug!("pipeline: stopping bridge failed: {}", e);
            }
        }
        debug!("pipeline: stopped after {} blocks", self.stats.blocks_forwarded);
        err
    }

    pub fn stats(&self) -> PipelineStats {
        self.stats
    }

    pub fn bridge(&self) -> &TransferBridge<'b, P, T, BLEN, BN> {
        &self.bridge
    }

    pub fn bridge_mut(&mut self) -> &mut TransferBridge<'b, P, T, BLEN, BN> {
        &mut self.bridge
    }

    /// Give the bridge back, e.g. to stop it.
    pub fn into_bridge(self) -> TransferBridge<'b, P, T, BLEN, BN> {
        self.bridge
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Direction, I2sConfig};
    use crate::dsp::Passthrough;
    use crate::io::bridge::BridgeState;
    use crate::mock::{MockDelay, MockI2s};

    type AdcTestPool = BlockPool<i16, 4, 4>;
    type BusTestPool = BlockPool<i32, 8, 4>;

    fn tx_config() -> I2sConfig {
        I2sConfig {
            block_size_bytes: 8 * 4,
            direction: Direction::Tx,
            timeout_ms: 1,
            ..I2sConfig::default()
        }
    }

    #[test]
    fn forwards_widened_blocks() {
        let adc_pool = AdcTestPool::new();
        let bus_pool = BusTestPool::new();
        let handoff = Handoff::new();

        let mut bridge = TransferBridge::new(MockI2s::new(), &bus_pool, Passthrough);
        bridge.configure(tx_config()).unwrap();
        let mut pipeline = AdcPipeline::new(&handoff, &bus_pool, bridge).unwrap();
        let mut delay = MockDelay::new();

        for n in 0..3i16 {
            let mut block = adc_pool.acquire().unwrap();
            block.copy_from_slice(&[n, -n, 100 * n, 7]);
            handoff.publish(block).unwrap();
            pipeline.forward(&mut delay).unwrap();
        }

        assert_eq!(adc_pool.in_use(), 0);
        assert_eq!(pipeline.stats().blocks_forwarded, 3);
        assert_eq!(pipeline.bridge().state(), BridgeState::Streaming);
        let sent = &pipeline.bridge().peripheral().transmitted;
        assert_eq!(sent[2], [2 << 16, 2 << 16, -2 << 16, -2 << 16, 200 << 16, 200 << 16, 7 << 16, 7 << 16]);
    }

    #[test]
    fn empty_handoff_times_out() {
        let bus_pool = BusTestPool::new();
        let handoff = Handoff::<Block<'_, i16, 4, 4>>::new();
        let mut bridge = TransferBridge::new(MockI2s::new(), &bus_pool, Passthrough);
        bridge.configure(tx_config()).unwrap();
        let mut pipeline = AdcPipeline::new(&handoff, &bus_pool, bridge).unwrap();
        let mut delay = MockDelay::new();

        assert_eq!(pipeline.run(&mut delay), PipelineError::PeripheralTimeout);
        // One attempt plus three retries.
        assert_eq!(pipeline.stats().take_timeouts, 4);
        assert_eq!(delay.elapsed_us(), 4000);
        assert_eq!(pipeline.bridge().state(), BridgeState::Stopped);
    }

    #[test]
    fn busy_bus_pool_keeps_the_adc_block() {
        let adc_pool = AdcTestPool::new();
        let bus_pool = BusTestPool::new();
        let handoff = Handoff::new();

        let mut bridge = TransferBridge::new(MockI2s::new(), &bus_pool, Passthrough);
        bridge.configure(tx_config()).unwrap();
        let mut pipeline = AdcPipeline::new(&handoff, &bus_pool, bridge)
            .unwrap()
            .with_acquire_policy(AcquirePolicy::NonBlocking);
        let mut delay = MockDelay::new();

        let hogs: [_; 4] = core::array::from_fn(|_| bus_pool.acquire().unwrap());
        let mut block = adc_pool.acquire().unwrap();
        block.copy_from_slice(&[11, 22, 33, 44]);
        handoff.publish(block).unwrap();

        assert_eq!(pipeline.forward(&mut delay), Err(PipelineError::PoolExhausted));
        assert!(handoff.is_empty());
        assert_eq!(adc_pool.in_use(), 1);
        assert_eq!(pipeline.stats().bus_waits, 1);

        drop(hogs);
        pipeline.forward(&mut delay).unwrap();
        assert_eq!(adc_pool.in_use(), 0);
        assert_eq!(
            pipeline.bridge().peripheral().transmitted[0],
            [11 << 16, 11 << 16, 22 << 16, 22 << 16, 33 << 16, 33 << 16, 44 << 16, 44 << 16]
        );
    }

    #[test]
    fn run_stops_the_bridge_on_exit() {
        let adc_pool = AdcTestPool::new();
        let bus_pool = BusTestPool::new();
        let handoff = Handoff::new();

        let mut bridge = TransferBridge::new(MockI2s::new(), &bus_pool, Passthrough);
        bridge.configure(tx_config()).unwrap();
        let mut pipeline = AdcPipeline::new(&handoff, &bus_pool, bridge)
            .unwrap()
            .with_acquire_policy(AcquirePolicy::NonBlocking);
        let mut delay = MockDelay::new();

        for n in 1..=2i16 {
            let mut block = adc_pool.acquire().unwrap();
            block.fill(n);
            handoff.publish(block).unwrap();
        }

        // Both blocks reach the bridge; the empty handoff then ends the run.
        assert_eq!(pipeline.run(&mut delay), PipelineError::PeripheralTimeout);
        assert_eq!(pipeline.stats().blocks_forwarded, 2);
        assert_eq!(adc_pool.in_use(), 0);
        assert_eq!(pipeline.bridge().state(), BridgeState::Stopped);
        assert_eq!(pipeline.bridge().peripheral().held(), 0);
        assert_eq!(bus_pool.in_use(), 0);
    }

    #[test]
    fn rejects_blocks_that_do_not_fit() {
        let bus_pool = BlockPool::<i32, 6, 4>::new();
        let handoff = Handoff::<Block<'_, i16, 4, 4>>::new();
        let mut bridge = TransferBridge::new(MockI2s::new(), &bus_pool, Passthrough);
        bridge
            .configure(I2sConfig {
                block_size_bytes: 6 * 4,
                ..tx_config()
            })
            .unwrap();
        assert!(matches!(
            AdcPipeline::new(&handoff, &bus_pool, bridge),
            Err(PipelineError::ConfigurationError(ConfigFault::BlockSizeMismatch))
        ));
    }
}
