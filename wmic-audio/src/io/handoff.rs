//! Cross-domain handoff of filled blocks.
//!
//! The acquisition interrupt publishes each filled block; the consumer
//! thread takes it. What crosses the boundary is the block handle itself, so
//! the producer cannot touch a block once it is published and the consumer
//! owns it outright once taken. Capacity is two blocks: one being drained,
//! one completed behind it.
//!
//! ```text
//!  ISR (sampling clock)            thread (bus clock)
//!  ConversionDone ──publish()──► [ b0 | b1 ] ──take()──► transform/transmit
//! ```

use core::sync::atomic::{AtomicU32, Ordering};

use embedded_hal::delay::DelayNs;

use crate::constants::{HANDOFF_CAPACITY, POLL_INTERVAL_US};
use crate::error::PipelineError;

use super::spsc::SpscQueue;

/// Producer/consumer handoff of owned values (block handles).
pub struct Handoff<T> {
    queue: SpscQueue<T, HANDOFF_CAPACITY>,
    published: AtomicU32,
}

impl<T> Handoff<T> {
    pub const fn new() -> Self {
        Handoff {
            queue: SpscQueue::new(),
            published: AtomicU32::new(0),
        }
    }

    /// Producer side. Never blocks; returns the item if the consumer is a
    /// full cycle behind.
    pub fn publish(&self, item: T) -> Result<(), T> {
        self.queue.push(item)?;
        self.published.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Consumer side, non-blocking.
    pub fn try_take(&self) -> Option<T> {
        self.queue.pop()
    }

    /// Consumer side with a bounded wait.
    ///
    /// Suspends on `delay` between polls and gives up with
    /// [`PipelineError::PeripheralTimeout`] after `timeout_us`.
    pub fn take<D: DelayNs>(&self, delay: &mut D, timeout_us: u32) -> Result<T, PipelineError> {
        let mut waited = 0u32;
        loop {
            if let Some(item) = self.queue.pop() {
                return Ok(item);
            }
            if waited >= timeout_us {
                return Err(PipelineError::PeripheralTimeout);
            }
            let step = POLL_INTERVAL_US.min(timeout_us - waited);
            delay.delay_us(step);
            waited += step;
        }
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.queue.is_full()
    }

    /// Total items published since creation.
    pub fn published(&self) -> u32 {
        self.published.load(Ordering::Relaxed)
    }
}

impl<T> Default for Handoff<T> {
    fn default() -> Self {
        Self::new()
    }
}
