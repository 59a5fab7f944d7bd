/*
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use rayon::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Applies `f` to every index in `0..num_items` exactly once, splitting the
/// range into one contiguous block per pool thread.
///
/// The call returns only once every element has been processed. Ordering
/// between elements is unspecified: callers must not rely on any element
/// observing the effects of another element of the same pass.
///
/// Use this static partition for uniform-cost elements; for skewed costs
/// (e.g., per-node edge lists of varying degree) prefer [`do_all_steal`].
pub fn do_all(pool: &rayon::ThreadPool, num_items: usize, f: impl Fn(usize) + Sync) {
    pool.broadcast(|ctx| {
        let threads = ctx.num_threads();
        let begin = num_items * ctx.index() / threads;
        let end = num_items * (ctx.index() + 1) / threads;
        for item in begin..end {
            f(item);
        }
    });
}

/// Applies `f` to every index in `0..num_items` exactly once, with pool
/// threads grabbing fixed-size chunks from a shared cursor.
///
/// Threads that finish their chunk early immediately claim the next one, so
/// skewed per-element costs are balanced at the price of one atomic
/// increment per chunk. Same barrier and (absence of) ordering guarantees as
/// [`do_all`].
pub fn do_all_steal(
    pool: &rayon::ThreadPool,
    num_items: usize,
    chunk_size: usize,
    f: impl Fn(usize) + Sync,
) {
    let chunk_size = chunk_size.max(1);
    let cursor = AtomicUsize::new(0);
    pool.broadcast(|_| loop {
        let begin = cursor.fetch_add(chunk_size, Ordering::Relaxed);
        if begin >= num_items {
            break;
        }
        let end = (begin + chunk_size).min(num_items);
        for item in begin..end {
            f(item);
        }
    });
}

/// Applies `f` to every element of `items` exactly once with mutable access,
/// letting the pool balance skewed costs by splitting the slice adaptively
/// down to `chunk_size` elements.
pub fn do_all_mut_steal<T: Send>(
    pool: &rayon::ThreadPool,
    items: &mut [T],
    chunk_size: usize,
    f: impl Fn(&mut T) + Send + Sync,
) {
    pool.install(|| {
        items
            .par_iter_mut()
            .with_min_len(chunk_size.max(1))
            .for_each(f)
    });
}
