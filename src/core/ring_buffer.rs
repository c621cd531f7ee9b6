//! Lock-Free Multi-Producer Multi-Consumer (MPMC) Ring Buffer
//!
//! Bounded Vyukov-style queue: a fixed circular array of slots, each tagged
//! with an atomic sequence number that transfers slot ownership exclusively
//! from producer to consumer. No Mutex, no allocation after initialization.
//!
//! Producers sit on the application's hot path, so `push` never blocks:
//! a full buffer hands the value back to the caller (drop-on-full).

use std::cell::UnsafeCell;
use std::mem::MaybeUninit;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Slot in the ring buffer. The sequence number encodes ownership:
/// `seq == pos` means free for the producer claiming `pos`,
/// `seq == pos + 1` means filled and readable by the consumer claiming `pos`.
struct Slot<T> {
    sequence: AtomicUsize,
    data: UnsafeCell<MaybeUninit<T>>,
}

/// Padding for cache line isolation (64 bytes on x86-64), keeps the
/// producer and consumer cursors from false sharing.
#[repr(C, align(64))]
struct CacheLinePadded<T> {
    value: T,
}

impl<T> CacheLinePadded<T> {
    const fn new(value: T) -> Self {
        Self { value }
    }
}

/// Lock-Free MPMC Ring Buffer with runtime capacity.
///
/// Capacity is rounded up to the next power of two so slot indexing is a
/// single mask. Allocation happens once at construction.
#[repr(C)]
pub struct RingBuffer<T> {
    // Producer side - cache line aligned
    head: CacheLinePadded<AtomicUsize>,
    // Consumer side - cache line aligned
    tail: CacheLinePadded<AtomicUsize>,
    buffer: Box<[Slot<T>]>,
    // Mask for fast modulo (capacity is a power of 2)
    mask: usize,
}

// SAFETY: RingBuffer is Send/Sync because:
// - Cursor claims go through atomic CAS, so each position is claimed once
// - A slot's sequence number hands its contents from exactly one producer
//   to exactly one consumer with release/acquire ordering
unsafe impl<T: Send> Send for RingBuffer<T> {}
unsafe impl<T: Send> Sync for RingBuffer<T> {}

impl<T> RingBuffer<T> {
    /// Creates a ring buffer holding at least `capacity` elements.
    ///
    /// The effective capacity is `capacity` rounded up to a power of two;
    /// `capacity()` reports the rounded value.
    ///
    /// # Panics
    /// Panics if `capacity == 0`.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "capacity must be non-zero");
        let cap = capacity.next_power_of_two();

        let mut buffer = Vec::with_capacity(cap);
        for i in 0..cap {
            buffer.push(Slot {
                sequence: AtomicUsize::new(i),
                data: UnsafeCell::new(MaybeUninit::uninit()),
            });
        }

        Self {
            head: CacheLinePadded::new(AtomicUsize::new(0)),
            tail: CacheLinePadded::new(AtomicUsize::new(0)),
            buffer: buffer.into_boxed_slice(),
            mask: cap - 1,
        }
    }

    /// Push a value (producer side, any number of threads).
    ///
    /// Returns `Err(value)` without blocking if the buffer is full, handing
    /// the rejected value back so the caller decides its fate.
    #[inline(always)]
    pub fn push(&self, value: T) -> Result<(), T> {
        let mut pos = self.head.value.load(Ordering::Relaxed);
        loop {
            let slot = &self.buffer[pos & self.mask];
            let seq = slot.sequence.load(Ordering::Acquire);
            let dif = seq as isize - pos as isize;

            if dif == 0 {
                // Slot free at this position; try to claim it
                match self.head.value.compare_exchange_weak(
                    pos,
                    pos.wrapping_add(1),
                    Ordering::Relaxed,
                    Ordering::Relaxed,
                ) {
                    Ok(_) => {
                        // SAFETY: the CAS gave us exclusive ownership of this
                        // slot until the sequence store below publishes it
                        unsafe {
                            (*slot.data.get()).write(value);
                        }
                        slot.sequence.store(pos.wrapping_add(1), Ordering::Release);
                        return Ok(());
                    }
                    Err(p) => pos = p,
                }
            } else if dif < 0 {
                // Slot still holds an unconsumed value from a lap behind: full
                return Err(value);
            } else {
                // Another producer claimed this position; reload
                pos = self.head.value.load(Ordering::Relaxed);
            }
        }
    }

    /// Pop the oldest value (consumer side).
    ///
    /// Returns `None` if the buffer is empty. Safe for multiple consumers;
    /// each value is delivered to exactly one of them.
    #[inline(always)]
    pub fn pop(&self) -> Option<T> {
        let mut pos = self.tail.value.load(Ordering::Relaxed);
        loop {
            let slot = &self.buffer[pos & self.mask];
            let seq = slot.sequence.load(Ordering::Acquire);
            let dif = seq as isize - pos.wrapping_add(1) as isize;

            if dif == 0 {
                // Slot filled at this position; try to claim it
                match self.tail.value.compare_exchange_weak(
                    pos,
                    pos.wrapping_add(1),
                    Ordering::Relaxed,
                    Ordering::Relaxed,
                ) {
                    Ok(_) => {
                        // SAFETY: the CAS gave us exclusive ownership; the
                        // producer finished its write before the Release
                        // store we observed with Acquire above
                        let value = unsafe { (*slot.data.get()).assume_init_read() };
                        slot.sequence.store(
                            pos.wrapping_add(self.mask).wrapping_add(1),
                            Ordering::Release,
                        );
                        return Some(value);
                    }
                    Err(p) => pos = p,
                }
            } else if dif < 0 {
                // Slot not yet filled for this lap: empty
                return None;
            } else {
                // Another consumer claimed this position; reload
                pos = self.tail.value.load(Ordering::Relaxed);
            }
        }
    }

    /// Approximate occupancy. Only a hint for the drain loop, not a
    /// linearizable snapshot.
    #[inline(always)]
    pub fn len(&self) -> usize {
        let head = self.head.value.load(Ordering::Acquire);
        let tail = self.tail.value.load(Ordering::Acquire);
        head.wrapping_sub(tail)
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline(always)]
    pub fn is_full(&self) -> bool {
        self.len() > self.mask
    }

    /// Effective capacity (power of two).
    #[inline(always)]
    pub fn capacity(&self) -> usize {
        self.mask + 1
    }
}

impl<T> Drop for RingBuffer<T> {
    fn drop(&mut self) {
        // Drain anything never consumed so destructors run
        while self.pop().is_some() {}
    }
}
