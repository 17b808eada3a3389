use core::fmt;
use core::ops::{Deref, DerefMut};

use super::pool::BlockPool;
use super::Sample;

/// Exclusive handle to one block of a [`BlockPool`].
///
/// There is exactly one `Block` per claimed slot, and it cannot be cloned,
/// so whoever holds the handle is the only stage that can read or write the
/// samples. Dropping the handle frees the slot.
pub struct Block<'p, S: Sample, const LEN: usize, const N: usize> {
    pool: &'p BlockPool<S, LEN, N>,
    slot: u8,
}

impl<'p, S: Sample, const LEN: usize, const N: usize> Block<'p, S, LEN, N> {
    /// Wrap a freshly claimed slot.
    pub(super) fn new(pool: &'p BlockPool<S, LEN, N>, slot: u8) -> Self {
        Block { pool, slot }
    }

    /// Pool slot index.
    pub fn slot(&self) -> u8 {
        self.slot
    }

    /// Size of the sample data in bytes.
    pub const fn byte_len(&self) -> usize {
        LEN * (S::BITS as usize / 8)
    }

    /// Samples in the block.
    pub const fn len(&self) -> usize {
        LEN
    }

    /// Always false; blocks have a fixed, non-zero length.
    pub const fn is_empty(&self) -> bool {
        LEN == 0
    }

    pub(super) fn pool(&self) -> &'p BlockPool<S, LEN, N> {
        self.pool
    }
}

impl<S: Sample, const LEN: usize, const N: usize> Deref for Block<'_, S, LEN, N> {
    type Target = [S; LEN];

    fn deref(&self) -> &Self::Target {
        // SAFETY: this handle is the unique owner of the slot.
        unsafe { &*self.pool.slot_ptr(self.slot) }
    }
}

impl<S: Sample, const LEN: usize, const N: usize> DerefMut for Block<'_, S, LEN, N> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        // SAFETY: this handle is the unique owner of the slot.
        unsafe { &mut *self.pool.slot_ptr(self.slot) }
    }
}

impl<S: Sample, const LEN: usize, const N: usize> AsRef<[S]> for Block<'_, S, LEN, N> {
    fn as_ref(&self) -> &[S] {
        &self[..]
    }
}

impl<S: Sample, const LEN: usize, const N: usize> AsMut<[S]> for Block<'_, S, LEN, N> {
    fn as_mut(&mut self) -> &mut [S] {
        &mut self[..]
    }
}

impl<S: Sample, const LEN: usize, const N: usize> Drop for Block<'_, S, LEN, N> {
    fn drop(&mut self) {
        self.pool.release_slot(self.slot);
    }
}

impl<S: Sample, const LEN: usize, const N: usize> fmt::Debug for Block<'_, S, LEN, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Block")
            .field("slot", &self.slot)
            .field("len", &LEN)
            .finish()
    }
}
