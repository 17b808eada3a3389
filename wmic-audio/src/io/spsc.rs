//! Lock-free single-producer single-consumer ring of owned values.
//!
//! Head and tail are free-running counters, so all `N` slots are usable:
//! the ring is empty when `head == tail` and full when `head - tail == N`.
//! `N` must be a power of two so that `counter % N` stays continuous when
//! the counters wrap.
//!
//! # Safety Contract
//!
//! - Only ONE context may call [`push()`](SpscQueue::push) (the producer).
//! - Only ONE context may call [`pop()`](SpscQueue::pop) (the consumer).
//! - The two may run concurrently (e.g. an ISR and a thread).

use core::cell::UnsafeCell;
use core::mem::MaybeUninit;
use core::sync::atomic::{AtomicUsize, Ordering};

/// A bounded SPSC queue holding up to `N` values.
pub struct SpscQueue<T, const N: usize> {
    buffer: [UnsafeCell<MaybeUninit<T>>; N],
    /// Values pushed so far (producer-owned).
    head: AtomicUsize,
    /// Values popped so far (consumer-owned).
    tail: AtomicUsize,
}

// SAFETY: each slot is written only by the producer while it is outside
// `tail..head`, and read only by the consumer while inside it. Release on
// the counter that publishes a slot pairs with Acquire on the other side.
unsafe impl<T: Send, const N: usize> Sync for SpscQueue<T, N> {}
unsafe impl<T: Send, const N: usize> Send for SpscQueue<T, N> {}

impl<T, const N: usize> SpscQueue<T, N> {
    const CAPACITY_OK: () = assert!(
        N.is_power_of_two(),
        "SPSC queue capacity must be a power of two"
    );

    pub const fn new() -> Self {
        #[allow(clippy::let_unit_value)]
        let () = Self::CAPACITY_OK;
        SpscQueue {
            buffer: [const { UnsafeCell::new(MaybeUninit::uninit()) }; N],
            head: AtomicUsize::new(0),
            tail: AtomicUsize::new(0),
        }
    }

    /// Producer side. Hands the value back when the queue is full.
    pub fn push(&self, val: T) -> Result<(), T> {
        let head = self.head.load(Ordering::Relaxed);
        let tail = self.tail.load(Ordering::Acquire);
        if head.wrapping_sub(tail) >= N {
            return Err(val);
        }

        // SAFETY: sole producer; the slot is outside `tail..head`, so the
        // consumer is not reading it.
        unsafe {
            (*self.buffer[head % N].get()).write(val);
        }

        self.head.store(head.wrapping_add(1), Ordering::Release);
        Ok(())
    }

    /// Consumer side. `None` when empty.
    pub fn pop(&self) -> Option<T> {
        let tail = self.tail.load(Ordering::Relaxed);
        if tail == self.head.load(Ordering::Acquire) {
            return None;
        }

        // SAFETY: sole consumer; `tail != head` means the slot holds a value
        // whose write happened-before the Acquire load of `head`.
        let val = unsafe { (*self.buffer[tail % N].get()).assume_init_read() };

        self.tail.store(tail.wrapping_add(1), Ordering::Release);
        Some(val)
    }

    pub fn len(&self) -> usize {
        let tail = self.tail.load(Ordering::Acquire);
        let head = self.head.load(Ordering::Acquire);
        head.wrapping_sub(tail)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_full(&self) -> bool {
        self.len() >= N
    }

    pub const fn capacity(&self) -> usize {
        N
    }
}

impl<T, const N: usize> Default for SpscQueue<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, const N: usize> Drop for SpscQueue<T, N> {
    fn drop(&mut self) {
        // Queued values may own pool blocks; release them.
        while self.pop().is_some() {}
    }
}
