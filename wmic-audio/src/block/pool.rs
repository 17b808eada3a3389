use core::cell::UnsafeCell;
use core::sync::atomic::{AtomicU32, Ordering};

use embedded_hal::delay::DelayNs;

use crate::constants::{MAX_POOL_BLOCKS, POLL_INTERVAL_US};
use crate::error::PipelineError;

use super::handle::Block;
use super::Sample;

/// How [`BlockPool::acquire_with`] behaves when every block is in use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AcquirePolicy {
    /// Fail immediately with [`PipelineError::PoolExhausted`].
    NonBlocking,
    /// Suspend until a block is released or `timeout_us` elapses.
    Blocking { timeout_us: u32 },
}

/// Lock-free allocator of `N` blocks of `LEN` samples.
///
/// An atomic bitmap tracks which slots are handed out; claiming a slot is a
/// single CAS, so `acquire` and release are safe from interrupt context.
/// Storage lives inside the pool, so a pool placed in a `static` needs no
/// heap.
pub struct BlockPool<S, const LEN: usize, const N: usize> {
    /// Bit N = 1 means slot N is owned by a [`Block`].
    bitmap: AtomicU32,
    storage: UnsafeCell<[[S; LEN]; N]>,
}

// SAFETY: slot contents are only reached through a `Block`, and a slot has
// at most one `Block` (guaranteed by the bitmap CAS). Samples cross contexts
// by value, hence `S: Send`.
unsafe impl<S: Send, const LEN: usize, const N: usize> Sync for BlockPool<S, LEN, N> {}

impl<S: Sample, const LEN: usize, const N: usize> BlockPool<S, LEN, N> {
    const SIZE_OK: () = assert!(
        N >= 1 && N <= MAX_POOL_BLOCKS,
        "pool must hold between 1 and 32 blocks"
    );

    const MASK: u32 = if N >= 32 { u32::MAX } else { (1u32 << N) - 1 };

    /// Create a pool with every block free and zeroed.
    pub const fn new() -> Self {
        #[allow(clippy::let_unit_value)]
        let () = Self::SIZE_OK;
        BlockPool {
            bitmap: AtomicU32::new(0),
            storage: UnsafeCell::new([[S::ZERO; LEN]; N]),
        }
    }

    /// Take a free block. Non-blocking.
    ///
    /// The block comes back zeroed.
    pub fn acquire(&self) -> Result<Block<'_, S, LEN, N>, PipelineError> {
        let slot = self.claim().ok_or(PipelineError::PoolExhausted)?;
        // SAFETY: the slot was claimed by the CAS above and no handle exists yet.
        unsafe { (*self.slot_ptr(slot)).fill(S::ZERO) };
        Ok(Block::new(self, slot))
    }

    /// Take a free block according to `policy`.
    ///
    /// Under [`AcquirePolicy::Blocking`] the caller is suspended on `delay`
    /// between attempts; this must not be used from interrupt context.
    pub fn acquire_with<D: DelayNs>(
        &self,
        policy: AcquirePolicy,
        delay: &mut D,
    ) -> Result<Block<'_, S, LEN, N>, PipelineError> {
        let timeout_us = match policy {
            AcquirePolicy::NonBlocking => return self.acquire(),
            AcquirePolicy::Blocking { timeout_us } => timeout_us,
        };

        let mut waited = 0u32;
        loop {
            match self.acquire() {
                Ok(block) => return Ok(block),
                Err(e) if waited >= timeout_us => return Err(e),
                Err(_) => {
                    let step = POLL_INTERVAL_US.min(timeout_us - waited);
                    delay.delay_us(step);
                    waited += step;
                }
            }
        }
    }

    /// Give a block back. Equivalent to dropping it.
    pub fn release(&self, block: Block<'_, S, LEN, N>) {
        debug_assert!(core::ptr::eq(block.pool(), self), "block from another pool");
        drop(block);
    }

    /// Blocks currently owned by a handle.
    pub fn in_use(&self) -> usize {
        (self.bitmap.load(Ordering::Acquire) & Self::MASK).count_ones() as usize
    }

    /// Blocks free to acquire.
    pub fn available(&self) -> usize {
        N - self.in_use()
    }

    /// Total number of blocks.
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Whether `slot` is currently handed out.
    pub fn is_claimed(&self, slot: u8) -> bool {
        (slot as usize) < N && self.bitmap.load(Ordering::Acquire) & (1 << slot) != 0
    }

    fn claim(&self) -> Option<u8> {
        loop {
            let bitmap = self.bitmap.load(Ordering::Acquire);
            let free = !bitmap & Self::MASK;
            if free == 0 {
                return None;
            }
            let slot = free.trailing_zeros();
            let bit = 1u32 << slot;
            match self.bitmap.compare_exchange_weak(
                bitmap,
                bitmap | bit,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return Some(slot as u8),
                Err(_) => continue, // raced with another context, retry
            }
        }
    }

    /// Free a slot. Only called by the dropping [`Block`].
    pub(super) fn release_slot(&self, slot: u8) {
        let bit = 1u32 << slot;
        let old = self.bitmap.fetch_and(!bit, Ordering::Release);
        debug_assert!(old & bit != 0, "double release of slot {}", slot);
    }

    /// Pointer to the samples of `slot`.
    ///
    /// # Safety
    /// `slot < N`. Dereferencing requires owning the slot.
    pub(super) unsafe fn slot_ptr(&self, slot: u8) -> *mut [S; LEN] {
        debug_assert!((slot as usize) < N);
        unsafe { (self.storage.get() as *mut [S; LEN]).add(slot as usize) }
    }
}

impl<S: Sample, const LEN: usize, const N: usize> Default for BlockPool<S, LEN, N> {
    fn default() -> Self {
        Self::new()
    }
}
