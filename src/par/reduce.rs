/*
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Reduction accumulators.
//!
//! Each accumulator keeps one cache-padded partial value per pool thread
//! (plus one for callers outside the pool), updated without contention.
//! [`reduce`](Sum::reduce) combines the partials with an associative,
//! commutative operator; its result is meaningful only after all contributing
//! workers have reached the barrier ending their region. No ordering is
//! guaranteed among contributions.

use crossbeam_utils::CachePadded;
use kahan::KahanSum;
use std::sync::Mutex;

struct Slots<T> {
    slots: Box<[CachePadded<Mutex<T>>]>,
}

impl<T: Clone> Slots<T> {
    fn new(pool: &rayon::ThreadPool, identity: T) -> Self {
        // One slot per pool thread, and a final one for the calling thread.
        let slots = (0..pool.current_num_threads() + 1)
            .map(|_| CachePadded::new(Mutex::new(identity.clone())))
            .collect();
        Self { slots }
    }

    fn with_own(&self, f: impl FnOnce(&mut T)) {
        let slot = rayon::current_thread_index().unwrap_or(self.slots.len() - 1);
        f(&mut self.slots[slot].lock().unwrap())
    }

    fn fold(&self, identity: T, mut f: impl FnMut(T, T) -> T) -> T {
        self.slots
            .iter()
            .fold(identity, |acc, slot| f(acc, slot.lock().unwrap().clone()))
    }

    fn reset(&self, identity: T) {
        for slot in self.slots.iter() {
            *slot.lock().unwrap() = identity.clone();
        }
    }
}

/// A sum reduction over an integer-like type.
pub struct Sum<T> {
    slots: Slots<T>,
}

impl<T: Copy + Default + std::ops::Add<Output = T>> Sum<T> {
    pub fn new(pool: &rayon::ThreadPool) -> Self {
        Self {
            slots: Slots::new(pool, T::default()),
        }
    }

    #[inline]
    pub fn update(&self, value: T) {
        self.slots.with_own(|slot| *slot = *slot + value);
    }

    pub fn reduce(&self) -> T {
        self.slots.fold(T::default(), |a, b| a + b)
    }

    pub fn reset(&self) {
        self.slots.reset(T::default());
    }
}

/// A compensated floating-point sum reduction.
///
/// Per-thread partials are [`KahanSum`]s, so long convergence loops do not
/// accumulate cancellation error.
pub struct FloatSum {
    slots: Slots<KahanSum<f64>>,
}

impl FloatSum {
    pub fn new(pool: &rayon::ThreadPool) -> Self {
        Self {
            slots: Slots::new(pool, KahanSum::new()),
        }
    }

    #[inline]
    pub fn update(&self, value: f64) {
        self.slots.with_own(|slot| *slot += value);
    }

    pub fn reduce(&self) -> f64 {
        self.slots
            .fold(KahanSum::new(), |a, b| a + b.sum())
            .sum()
    }

    pub fn reset(&self) {
        self.slots.reset(KahanSum::new());
    }
}

/// A maximum reduction.
pub struct Max<T> {
    slots: Slots<Option<T>>,
}

impl<T: Copy + PartialOrd> Max<T> {
    pub fn new(pool: &rayon::ThreadPool) -> Self {
        Self {
            slots: Slots::new(pool, None),
        }
    }

    #[inline]
    pub fn update(&self, value: T) {
        self.slots.with_own(|slot| match slot {
            Some(max) if *max >= value => {}
            _ => *slot = Some(value),
        });
    }

    /// Returns the maximum contributed value, or [`None`] if there were no
    /// contributions.
    pub fn reduce(&self) -> Option<T> {
        self.slots.fold(None, |a, b| match (a, b) {
            (Some(a), Some(b)) => Some(if a >= b { a } else { b }),
            (a, None) => a,
            (None, b) => b,
        })
    }

    pub fn reset(&self) {
        self.slots.reset(None);
    }
}

/// A logical-or reduction, typically used as a "changed this round" flag.
pub struct LogicalOr {
    slots: Slots<bool>,
}

impl LogicalOr {
    pub fn new(pool: &rayon::ThreadPool) -> Self {
        Self {
            slots: Slots::new(pool, false),
        }
    }

    #[inline]
    pub fn update(&self, value: bool) {
        if value {
            self.slots.with_own(|slot| *slot = true);
        }
    }

    pub fn reduce(&self) -> bool {
        self.slots.fold(false, |a, b| a || b)
    }

    pub fn reset(&self) {
        self.slots.reset(false);
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_sum_across_threads() {
        let pool = crate::par::Threads::NumThreads(4).build();
        let sum = Sum::<usize>::new(&pool);
        pool.broadcast(|_| {
            for i in 0..100 {
                sum.update(i);
            }
        });
        assert_eq!(sum.reduce(), 4 * 4950);
        sum.reset();
        assert_eq!(sum.reduce(), 0);
    }

    #[test]
    fn test_max_and_or() {
        let pool = crate::par::Threads::NumThreads(2).build();
        let max = Max::<u64>::new(&pool);
        let or = LogicalOr::new(&pool);
        assert_eq!(max.reduce(), None);
        assert!(!or.reduce());
        pool.broadcast(|ctx| {
            max.update(ctx.index() as u64 * 10);
            or.update(ctx.index() == 1);
        });
        assert_eq!(max.reduce(), Some(10));
        assert!(or.reduce());
    }
}
