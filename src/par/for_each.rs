/*
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use super::Obim;
use std::sync::Barrier;

/// Handle passed to the step function of [`for_each`], through which newly
/// discovered work is pushed back into the worklist.
pub struct Ctx<'a, T> {
    worklist: &'a Obim<T>,
}

impl<T: Send> Ctx<'_, T> {
    /// Pushes a new item into the bucket with the given index.
    #[inline]
    pub fn push(&self, index: u64, item: T) {
        self.worklist.push(index, item);
    }
}

/// Drains the worklist with a pool of workers, each repeatedly popping an
/// item and running `step` on it, until quiescence.
///
/// `step` may push any number of new items through the [`Ctx`] handle.
/// Workers that find no work briefly yield and retry while any item is still
/// in flight; the call returns exactly when every worker is idle and every
/// bucket is empty. There is no cancellation and no timeout.
///
/// Workers may race slightly ahead across bucket boundaries: an item of
/// bucket *k* can still be in flight when the first items of bucket *k* + 1
/// are popped. Step functions must tolerate this through their own staleness
/// discipline.
pub fn for_each<T, F>(pool: &rayon::ThreadPool, worklist: &Obim<T>, step: F)
where
    T: Send,
    F: Fn(T, &Ctx<'_, T>) + Sync,
{
    pool.broadcast(|_| {
        let ctx = Ctx { worklist };
        loop {
            match worklist.pop() {
                Some(item) => {
                    step(item, &ctx);
                    worklist.complete();
                }
                None => {
                    if worklist.pending() == 0 {
                        break;
                    }
                    std::thread::yield_now();
                }
            }
        }
    });
}

/// Like [`for_each`], but no worker may advance past the current bucket
/// until every worker has fully drained it.
///
/// The cursor is advanced by a single leader while all workers are parked at
/// a barrier, which makes bucket retirement exact at the price of one
/// rendezvous per bucket. Simpler to reason about, less parallel.
pub fn for_each_with_barrier<T, F>(pool: &rayon::ThreadPool, worklist: &Obim<T>, step: F)
where
    T: Send,
    F: Fn(T, &Ctx<'_, T>) + Sync,
{
    let barrier = Barrier::new(pool.current_num_threads());
    pool.broadcast(|_| {
        let ctx = Ctx { worklist };
        loop {
            while let Some(item) = worklist.pop_current() {
                step(item, &ctx);
                worklist.complete();
            }
            // All workers idle on this bucket before the cursor moves; any
            // push they performed is already queued.
            if barrier.wait().is_leader() {
                worklist.advance_retiring();
            }
            barrier.wait();
            if worklist.is_done() {
                break;
            }
        }
    });
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::par::Threads;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_for_each_runs_to_quiescence() {
        let pool = Threads::NumThreads(4).build();
        let worklist = Obim::new(pool.current_num_threads());
        worklist.push(0, 0u64);
        let processed = AtomicUsize::new(0);
        // Each item at depth d < 6 spawns two children at depth d + 1.
        for_each(&pool, &worklist, |depth, ctx| {
            processed.fetch_add(1, Ordering::Relaxed);
            if depth < 6 {
                ctx.push(depth + 1, depth + 1);
                ctx.push(depth + 1, depth + 1);
            }
        });
        assert_eq!(processed.load(Ordering::Relaxed), (1 << 7) - 1);
        assert_eq!(worklist.pending(), 0);
        assert!(worklist.all_empty());
    }

    #[test]
    fn test_for_each_with_barrier_respects_bucket_order() {
        let pool = Threads::NumThreads(2).build();
        let worklist = Obim::new(pool.current_num_threads());
        for _ in 0..16 {
            worklist.push(0, 0u64);
        }
        let max_seen = AtomicUsize::new(0);
        for_each_with_barrier(&pool, &worklist, |bucket, ctx| {
            // With exact retirement, no item of a lower bucket can run after
            // a higher bucket was entered.
            let seen = max_seen.fetch_max(bucket as usize, Ordering::SeqCst);
            assert!(seen <= bucket as usize);
            if bucket < 3 {
                ctx.push(bucket + 1, bucket + 1);
            }
        });
        assert!(worklist.all_empty());
        assert_eq!(max_seen.load(Ordering::SeqCst), 3);
    }
}
