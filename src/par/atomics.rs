/*
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use std::cmp::Ordering as CmpOrdering;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

/// A numeric type usable as an edge weight or node distance: ordered, with a
/// zero, addable, and backed by an atomic cell supporting a monotone minimum
/// update.
///
/// The contract of [`fetch_min`](Weight::fetch_min) is the heart of the
/// concurrent relaxation protocol: after the call the cell holds a value that
/// is at most `value`, the previous value is returned, and the cell's value
/// never increases as observed by any thread.
///
/// [`INFINITY`](Weight::INFINITY) is the unreached sentinel. For integers it
/// is half the maximum value, so that adding a weight to a finite distance
/// cannot wrap around.
pub trait Weight:
    Copy + Send + Sync + PartialOrd + std::ops::Add<Output = Self> + std::fmt::Debug + 'static
{
    const ZERO: Self;
    const INFINITY: Self;

    /// The atomic cell holding values of this type.
    type Atomic: Send + Sync;

    fn new_atomic(value: Self) -> Self::Atomic;

    fn load(cell: &Self::Atomic) -> Self;

    fn store(cell: &Self::Atomic, value: Self);

    /// Atomically sets the cell to the minimum of its current value and
    /// `value`, returning the previous value.
    fn fetch_min(cell: &Self::Atomic, value: Self) -> Self;

    /// A total order consistent with `PartialOrd` on the values the
    /// algorithms produce (non-negative sums and the infinity sentinel).
    fn total_cmp(&self, other: &Self) -> CmpOrdering;

    /// The integer key used to assign a priority bucket. Only called on
    /// finite, non-negative values.
    fn bucket_key(self) -> u64;

    fn to_f64(self) -> f64;
}

impl Weight for u32 {
    const ZERO: Self = 0;
    const INFINITY: Self = u32::MAX / 2;

    type Atomic = AtomicU32;

    #[inline(always)]
    fn new_atomic(value: Self) -> Self::Atomic {
        AtomicU32::new(value)
    }

    #[inline(always)]
    fn load(cell: &Self::Atomic) -> Self {
        cell.load(Ordering::Relaxed)
    }

    #[inline(always)]
    fn store(cell: &Self::Atomic, value: Self) {
        cell.store(value, Ordering::Relaxed)
    }

    #[inline(always)]
    fn fetch_min(cell: &Self::Atomic, value: Self) -> Self {
        cell.fetch_min(value, Ordering::Relaxed)
    }

    #[inline(always)]
    fn total_cmp(&self, other: &Self) -> CmpOrdering {
        self.cmp(other)
    }

    #[inline(always)]
    fn bucket_key(self) -> u64 {
        self as u64
    }

    #[inline(always)]
    fn to_f64(self) -> f64 {
        self as f64
    }
}

impl Weight for u64 {
    const ZERO: Self = 0;
    const INFINITY: Self = u64::MAX / 2;

    type Atomic = AtomicU64;

    #[inline(always)]
    fn new_atomic(value: Self) -> Self::Atomic {
        AtomicU64::new(value)
    }

    #[inline(always)]
    fn load(cell: &Self::Atomic) -> Self {
        cell.load(Ordering::Relaxed)
    }

    #[inline(always)]
    fn store(cell: &Self::Atomic, value: Self) {
        cell.store(value, Ordering::Relaxed)
    }

    #[inline(always)]
    fn fetch_min(cell: &Self::Atomic, value: Self) -> Self {
        cell.fetch_min(value, Ordering::Relaxed)
    }

    #[inline(always)]
    fn total_cmp(&self, other: &Self) -> CmpOrdering {
        self.cmp(other)
    }

    #[inline(always)]
    fn bucket_key(self) -> u64 {
        self
    }

    #[inline(always)]
    fn to_f64(self) -> f64 {
        self as f64
    }
}

impl Weight for f32 {
    const ZERO: Self = 0.0;
    const INFINITY: Self = f32::INFINITY;

    /// Floats are stored as their bit patterns; the compare in the CAS loop
    /// is done on the decoded values, so the non-monotone bit order of
    /// negative floats never matters.
    type Atomic = AtomicU32;

    #[inline(always)]
    fn new_atomic(value: Self) -> Self::Atomic {
        AtomicU32::new(value.to_bits())
    }

    #[inline(always)]
    fn load(cell: &Self::Atomic) -> Self {
        f32::from_bits(cell.load(Ordering::Relaxed))
    }

    #[inline(always)]
    fn store(cell: &Self::Atomic, value: Self) {
        cell.store(value.to_bits(), Ordering::Relaxed)
    }

    fn fetch_min(cell: &Self::Atomic, value: Self) -> Self {
        let mut current = cell.load(Ordering::Relaxed);
        loop {
            let current_value = f32::from_bits(current);
            if current_value <= value {
                return current_value;
            }
            match cell.compare_exchange_weak(
                current,
                value.to_bits(),
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => return current_value,
                Err(actual) => current = actual,
            }
        }
    }

    #[inline(always)]
    fn total_cmp(&self, other: &Self) -> CmpOrdering {
        f32::total_cmp(self, other)
    }

    #[inline(always)]
    fn bucket_key(self) -> u64 {
        self as u64
    }

    #[inline(always)]
    fn to_f64(self) -> f64 {
        self as f64
    }
}

impl Weight for f64 {
    const ZERO: Self = 0.0;
    const INFINITY: Self = f64::INFINITY;

    type Atomic = AtomicU64;

    #[inline(always)]
    fn new_atomic(value: Self) -> Self::Atomic {
        AtomicU64::new(value.to_bits())
    }

    #[inline(always)]
    fn load(cell: &Self::Atomic) -> Self {
        f64::from_bits(cell.load(Ordering::Relaxed))
    }

    #[inline(always)]
    fn store(cell: &Self::Atomic, value: Self) {
        cell.store(value.to_bits(), Ordering::Relaxed)
    }

    fn fetch_min(cell: &Self::Atomic, value: Self) -> Self {
        let mut current = cell.load(Ordering::Relaxed);
        loop {
            let current_value = f64::from_bits(current);
            if current_value <= value {
                return current_value;
            }
            match cell.compare_exchange_weak(
                current,
                value.to_bits(),
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => return current_value,
                Err(actual) => current = actual,
            }
        }
    }

    #[inline(always)]
    fn total_cmp(&self, other: &Self) -> CmpOrdering {
        f64::total_cmp(self, other)
    }

    #[inline(always)]
    fn bucket_key(self) -> u64 {
        self as u64
    }

    #[inline(always)]
    fn to_f64(self) -> f64 {
        self
    }
}
