/*
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Priority-bucketed worklists ordered by an integer metric.

use crossbeam_utils::CachePadded;
use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, RwLock};

/// A concurrent worklist ordered by an integer metric, approximately.
///
/// Items live in integer-indexed buckets; workers drain the lowest non-empty
/// bucket before moving on, and [`push`](Obim::push) may be called from any
/// worker at any time, including into the bucket currently being drained.
/// Within a bucket items are FIFO per shard, for locality only: no relative
/// order is guaranteed.
///
/// Each bucket keeps one deque per worker. A push goes to the pusher's own
/// deque; a pop drains the popper's own deque first and steals from siblings
/// when it is empty, so contention stays bounded.
///
/// Two counters govern global progress:
/// * `pending` counts items that have been pushed and whose processing has
///   not yet been [completed](Obim::complete). It reaches zero exactly at
///   quiescence: no item queued anywhere and no item in flight that could
///   still produce pushes.
/// * `low` is a lower-bound hint for the scan that locates the next
///   non-empty bucket. A push may lower it again: an item produced by
///   in-flight work can legitimately land in the bucket a sibling worker just
///   found empty, and the scan must find it there.
///
/// In barrier mode (see [`for_each_with_barrier`](crate::par::for_each_with_barrier))
/// the cursor only advances once all workers are idle, which makes bucket
/// retirement exact: `watermark` records the lowest live bucket and every
/// later push is checked against it.
pub struct Obim<T> {
    num_shards: usize,
    buckets: RwLock<BTreeMap<u64, Arc<Bucket<T>>>>,
    low: AtomicU64,
    watermark: AtomicU64,
    pending: AtomicUsize,
    done: AtomicBool,
}

struct Bucket<T> {
    len: AtomicUsize,
    shards: Box<[CachePadded<Mutex<VecDeque<T>>>]>,
}

impl<T> Bucket<T> {
    fn new(num_shards: usize) -> Self {
        Self {
            len: AtomicUsize::new(0),
            shards: (0..num_shards)
                .map(|_| CachePadded::new(Mutex::new(VecDeque::new())))
                .collect(),
        }
    }
}

impl<T: Send> Obim<T> {
    /// Creates a worklist with one shard per worker.
    ///
    /// `num_shards` should match the number of threads of the pool the
    /// worklist will be drained on.
    pub fn new(num_shards: usize) -> Self {
        Self {
            num_shards: num_shards.max(1),
            buckets: RwLock::new(BTreeMap::new()),
            low: AtomicU64::new(u64::MAX),
            watermark: AtomicU64::new(0),
            pending: AtomicUsize::new(0),
            done: AtomicBool::new(false),
        }
    }

    #[inline]
    fn shard_index(&self) -> usize {
        rayon::current_thread_index().unwrap_or(0) % self.num_shards
    }

    /// Inserts an item into the bucket with the given index.
    ///
    /// Always succeeds; may be called concurrently from any worker,
    /// including while the target bucket is being drained.
    pub fn push(&self, index: u64, item: T) {
        debug_assert!(
            index >= self.watermark.load(Ordering::SeqCst),
            "push into retired bucket {} (watermark {})",
            index,
            self.watermark.load(Ordering::SeqCst),
        );

        self.pending.fetch_add(1, Ordering::SeqCst);

        let bucket = {
            let buckets = self.buckets.read().unwrap();
            match buckets.get(&index) {
                Some(bucket) => {
                    bucket.len.fetch_add(1, Ordering::SeqCst);
                    bucket.clone()
                }
                None => {
                    drop(buckets);
                    let mut buckets = self.buckets.write().unwrap();
                    let bucket = buckets
                        .entry(index)
                        .or_insert_with(|| Arc::new(Bucket::new(self.num_shards)))
                        .clone();
                    bucket.len.fetch_add(1, Ordering::SeqCst);
                    bucket
                }
            }
        };

        self.low.fetch_min(index, Ordering::SeqCst);
        bucket.shards[self.shard_index()]
            .lock()
            .unwrap()
            .push_back(item);
    }

    fn pop_from(&self, bucket: &Bucket<T>) -> Option<T> {
        let me = self.shard_index();
        for offset in 0..self.num_shards {
            let shard = &bucket.shards[(me + offset) % self.num_shards];
            if let Some(item) = shard.lock().unwrap().pop_front() {
                bucket.len.fetch_sub(1, Ordering::SeqCst);
                return Some(item);
            }
        }
        None
    }

    /// Removes and returns one item from the lowest non-empty bucket.
    ///
    /// Returns [`None`] when no queued item was found; the caller decides
    /// between retrying (work is still in flight) and terminating
    /// ([`pending`](Obim::pending) is zero).
    pub fn pop(&self) -> Option<T> {
        let low = self.low.load(Ordering::SeqCst);
        let buckets = self.buckets.read().unwrap();
        for bucket in buckets
            .range(low..)
            .map(|(_, bucket)| bucket)
            .filter(|bucket| bucket.len.load(Ordering::SeqCst) > 0)
        {
            if let Some(item) = self.pop_from(bucket) {
                return Some(item);
            }
        }
        None
    }

    /// Removes and returns one item from the cursor bucket only.
    ///
    /// Used in barrier mode, where no worker may run ahead of the cursor.
    pub fn pop_current(&self) -> Option<T> {
        let low = self.low.load(Ordering::SeqCst);
        let buckets = self.buckets.read().unwrap();
        let bucket = buckets.get(&low)?;
        if bucket.len.load(Ordering::SeqCst) == 0 {
            return None;
        }
        self.pop_from(bucket)
    }

    /// Records that the processing of one popped item has finished, together
    /// with all pushes it performed.
    #[inline]
    pub fn complete(&self) {
        self.pending.fetch_sub(1, Ordering::SeqCst);
    }

    /// Number of items pushed and not yet completed (queued or in flight).
    #[inline]
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    /// Whether every bucket is empty.
    pub fn all_empty(&self) -> bool {
        self.buckets
            .read()
            .unwrap()
            .values()
            .all(|bucket| bucket.len.load(Ordering::SeqCst) == 0)
    }

    /// Advances the cursor past the current bucket, retiring it.
    ///
    /// Must only be called while every worker is parked at a barrier: with
    /// no work in flight, `pending` counts exactly the queued items, and all
    /// buckets below the new cursor are permanently empty. Sets the
    /// termination flag when there is nothing left, or when the counters
    /// disagree with the bucket contents (the caller then reports the
    /// inconsistency).
    pub fn advance_retiring(&self) {
        if self.pending.load(Ordering::SeqCst) == 0 {
            self.done.store(true, Ordering::SeqCst);
            return;
        }
        let buckets = self.buckets.read().unwrap();
        match buckets
            .iter()
            .find(|(_, bucket)| bucket.len.load(Ordering::SeqCst) > 0)
        {
            Some((&index, _)) => {
                self.low.store(index, Ordering::SeqCst);
                self.watermark.store(index, Ordering::SeqCst);
            }
            // Pending work but no queued item: a scheduler invariant is
            // broken. Terminate so the executor can surface the failure.
            None => self.done.store(true, Ordering::SeqCst),
        }
    }

    #[inline]
    pub fn is_done(&self) -> bool {
        self.done.load(Ordering::SeqCst)
    }
}

/// The single-threaded counterpart of [`Obim`]: a growable list of FIFO
/// buckets with an explicit cursor, used by the serial delta-stepping
/// reference.
pub struct SerialBucketWl<T> {
    buckets: Vec<VecDeque<T>>,
    current: usize,
    len: usize,
}

impl<T> SerialBucketWl<T> {
    pub fn new() -> Self {
        Self {
            buckets: Vec::new(),
            current: 0,
            len: 0,
        }
    }

    /// Inserts an item into the bucket with the given index.
    pub fn push(&mut self, index: u64, item: T) {
        let index = index as usize;
        debug_assert!(
            index >= self.current,
            "push into retired bucket {} (cursor {})",
            index,
            self.current
        );
        if index >= self.buckets.len() {
            self.buckets.resize_with(index + 1, VecDeque::new);
        }
        self.buckets[index].push_back(item);
        self.len += 1;
    }

    /// Removes and returns one item from the cursor bucket.
    pub fn pop_current(&mut self) -> Option<T> {
        let item = self.buckets.get_mut(self.current)?.pop_front();
        if item.is_some() {
            self.len -= 1;
        }
        item
    }

    /// Retires the cursor bucket and advances to the next non-empty one.
    pub fn go_to_next_bucket(&mut self) {
        self.current += 1;
        while self
            .buckets
            .get(self.current)
            .is_some_and(|bucket| bucket.is_empty())
        {
            self.current += 1;
        }
    }

    /// Whether no bucket holds an item.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Whether every bucket, including ones behind the cursor, is empty.
    pub fn all_empty(&self) -> bool {
        self.buckets.iter().all(VecDeque::is_empty)
    }

    /// The cursor bucket index.
    pub fn current(&self) -> usize {
        self.current
    }
}

impl<T> Default for SerialBucketWl<T> {
    fn default() -> Self {
        Self::new()
    }
}
