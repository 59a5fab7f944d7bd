/*
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use super::{SsspPlan, WorkItem};
use crate::graph::CsrGraph;
use crate::par::{SerialBucketWl, Weight};
use crate::{Error, Result};
use dary_heap::QuaternaryHeap;
use std::cmp::Ordering;

/// Single-threaded bucket relaxation, the sequential reference for
/// delta-stepping: drains the cursor bucket to exhaustion, then retires it
/// and moves to the next non-empty one.
pub(super) fn delta<W: Weight, I: WorkItem<W>>(
    graph: &CsrGraph,
    weights: &[W],
    dist: &[W::Atomic],
    source: usize,
    plan: &SsspPlan,
) -> Result<()> {
    let shift = plan.delta;
    let mut worklist = SerialBucketWl::new();

    I::make(graph, source, W::ZERO, plan.edge_tile_size, |item| {
        worklist.push(item.dist().bucket_key() >> shift, item);
    });

    let mut iterations = 0usize;
    while !worklist.is_empty() {
        while let Some(item) = worklist.pop_current() {
            iterations += 1;

            if W::load(&dist[item.src()]) < item.dist() {
                // Lost to an earlier relaxation of the same bucket.
                continue;
            }

            for edge in item.edges(graph) {
                let dest = graph.edge_dest(edge);
                let new_dist = item.dist() + weights[edge];
                if new_dist < W::load(&dist[dest]) {
                    W::store(&dist[dest], new_dist);
                    I::make(graph, dest, new_dist, plan.edge_tile_size, |new_item| {
                        worklist.push(new_dist.bucket_key() >> shift, new_item);
                    });
                }
            }
        }
        worklist.go_to_next_bucket();
    }

    if !worklist.all_empty() {
        return Err(Error::InternalConsistency(
            "retired bucket not empty at completion",
        ));
    }
    log::info!("serial delta-stepping iterations: {}", iterations);
    Ok(())
}

struct HeapEntry<W, I> {
    dist: W,
    item: I,
}

impl<W: Weight, I> PartialEq for HeapEntry<W, I> {
    fn eq(&self, other: &Self) -> bool {
        self.dist.total_cmp(&other.dist) == Ordering::Equal
    }
}

impl<W: Weight, I> Eq for HeapEntry<W, I> {}

impl<W: Weight, I> PartialOrd for HeapEntry<W, I> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<W: Weight, I> Ord for HeapEntry<W, I> {
    // Reversed: the heap is a max-heap, we pop smallest distances first.
    fn cmp(&self, other: &Self) -> Ordering {
        other.dist.total_cmp(&self.dist)
    }
}

/// Exact priority order: the classic Dijkstra loop over a d-ary min-heap,
/// with the same staleness discard instead of a decrease-key.
pub(super) fn dijkstra<W: Weight, I: WorkItem<W>>(
    graph: &CsrGraph,
    weights: &[W],
    dist: &[W::Atomic],
    source: usize,
    plan: &SsspPlan,
) {
    let mut heap = QuaternaryHeap::new();

    I::make(graph, source, W::ZERO, plan.edge_tile_size, |item| {
        heap.push(HeapEntry {
            dist: item.dist(),
            item,
        });
    });

    let mut iterations = 0usize;
    while let Some(HeapEntry { item, .. }) = heap.pop() {
        iterations += 1;

        if W::load(&dist[item.src()]) < item.dist() {
            continue;
        }

        for edge in item.edges(graph) {
            let dest = graph.edge_dest(edge);
            let new_dist = item.dist() + weights[edge];
            if new_dist < W::load(&dist[dest]) {
                W::store(&dist[dest], new_dist);
                I::make(graph, dest, new_dist, plan.edge_tile_size, |new_item| {
                    heap.push(HeapEntry {
                        dist: new_dist,
                        item: new_item,
                    });
                });
            }
        }
    }

    log::info!("Dijkstra iterations: {}", iterations);
}
