/*
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use super::{SsspPlan, WorkItem};
use crate::graph::CsrGraph;
use crate::par::reduce::Sum;
use crate::par::{for_each, for_each_with_barrier, Ctx, Obim, Weight};
use crate::{Error, Result};

/// Parallel delta-stepping: drains a bucket worklist with the asynchronous
/// executor, one item per improved node (or per edge tile).
///
/// The step function re-reads the live distance of the item's node; if it
/// has already improved below the item's distance, the item lost its race
/// and is dropped. Otherwise every out-edge is relaxed with an atomic
/// minimum, and each strict improvement pushes a new item into the bucket of
/// the improved distance. The live distance is deliberately not re-read
/// between edges: an improvement racing with the loop costs at most one
/// extra pass over the stale edges, which is cheaper than synchronizing.
pub(super) fn run<W: Weight, I: WorkItem<W>>(
    graph: &CsrGraph,
    weights: &[W],
    dist: &[W::Atomic],
    source: usize,
    plan: &SsspPlan,
    pool: &rayon::ThreadPool,
    bucket_barrier: bool,
) -> Result<()> {
    let shift = plan.delta;
    let worklist = Obim::new(pool.current_num_threads());
    let stale_items = Sum::<usize>::new(pool);
    let overwritten = Sum::<usize>::new(pool);

    I::make(graph, source, W::ZERO, plan.edge_tile_size, |item| {
        worklist.push(item.dist().bucket_key() >> shift, item);
    });

    let step = |item: I, ctx: &Ctx<'_, I>| {
        let live = W::load(&dist[item.src()]);
        if live < item.dist() {
            if plan.track_work {
                stale_items.update(1);
            }
            return;
        }

        for edge in item.edges(graph) {
            let dest = graph.edge_dest(edge);
            let new_dist = live + weights[edge];
            let old_dist = W::fetch_min(&dist[dest], new_dist);
            if new_dist < old_dist {
                if plan.track_work && old_dist < W::INFINITY {
                    overwritten.update(1);
                }
                I::make(graph, dest, new_dist, plan.edge_tile_size, |new_item| {
                    ctx.push(new_dist.bucket_key() >> shift, new_item);
                });
            }
        }
    };

    if bucket_barrier {
        for_each_with_barrier(pool, &worklist, step);
    } else {
        for_each(pool, &worklist, step);
    }

    if worklist.pending() != 0 || !worklist.all_empty() {
        return Err(Error::InternalConsistency(
            "worklist not empty at declared completion",
        ));
    }

    if plan.track_work {
        log::info!(
            "stale items: {}, overwritten relaxations: {}",
            stale_items.reduce(),
            overwritten.reduce()
        );
    }
    Ok(())
}
