//! Fixed-capacity lock-free set of packed region-pair keys.
//!
//! Open addressing with linear probing over `AtomicU64` slots.
//! Key `0` marks an empty slot; packed pairs are never zero because
//! the high half holds a non-background id.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

const EMPTY: u64 = 0;

/// Outcome of a single insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Insert {
    New,
    Present,
    /// Capacity reached; the key was not stored.
    Dropped,
}

pub struct PairKeySet {
    slots: Vec<AtomicU64>,
    mask: usize,
    capacity: usize,
    len: AtomicUsize,
    dropped: AtomicUsize,
}

impl PairKeySet {
    /// Set holding at most `capacity` keys.
    ///
    /// Slots are over-allocated to twice the capacity so collision runs stay short.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let n = (capacity * 2).next_power_of_two();
        let slots = (0..n).map(|_| AtomicU64::new(EMPTY)).collect();
        Self {
            slots,
            mask: n - 1,
            capacity,
            len: AtomicUsize::new(0),
            dropped: AtomicUsize::new(0),
        }
    }

    pub fn insert(&self, key: u64) -> Insert {
        debug_assert_ne!(key, EMPTY);
        let mut i = hash(key) & self.mask;
        let mut reserved = false;
        for _ in 0..self.slots.len() {
            let slot = &self.slots[i];
            let current = slot.load(Ordering::Acquire);
            if current == key {
                if reserved {
                    self.len.fetch_sub(1, Ordering::AcqRel);
                }
                return Insert::Present;
            }
            if current == EMPTY {
                if !reserved {
                    if !self.reserve() {
                        // Full, but the key may still sit further along the run.
                        return if self.run_contains(i, key) {
                            Insert::Present
                        } else {
                            self.dropped.fetch_add(1, Ordering::Relaxed);
                            Insert::Dropped
                        };
                    }
                    reserved = true;
                }
                match slot.compare_exchange(EMPTY, key, Ordering::AcqRel, Ordering::Acquire) {
                    Ok(_) => return Insert::New,
                    Err(actual) if actual == key => {
                        self.len.fetch_sub(1, Ordering::AcqRel);
                        return Insert::Present;
                    }
                    Err(_) => {}
                }
            }
            i = (i + 1) & self.mask;
        }
        if reserved {
            self.len.fetch_sub(1, Ordering::AcqRel);
        }
        self.dropped.fetch_add(1, Ordering::Relaxed);
        Insert::Dropped
    }

    fn reserve(&self) -> bool {
        self.len
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                (n < self.capacity).then_some(n + 1)
            })
            .is_ok()
    }

    fn run_contains(&self, start: usize, key: u64) -> bool {
        let mut i = start;
        for _ in 0..self.slots.len() {
            match self.slots[i].load(Ordering::Acquire) {
                EMPTY => return false,
                k if k == key => return true,
                _ => {}
            }
            i = (i + 1) & self.mask;
        }
        false
    }

    pub fn len(&self) -> usize {
        self.len.load(Ordering::Acquire)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn dropped(&self) -> usize {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Stored keys, in slot order. Call after all writers finished.
    pub fn keys(&self) -> impl Iterator<Item = u64> + '_ {
        self.slots
            .iter()
            .map(|s| s.load(Ordering::Acquire))
            .filter(|&k| k != EMPTY)
    }
}

#[inline]
fn hash(key: u64) -> usize {
    // Fibonacci hashing; the high bits are the well-mixed ones.
    (key.wrapping_mul(0x9E37_79B9_7F4A_7C15) >> 32) as usize
}
