/*
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use super::{PageRankPlan, CHUNK_SIZE};
use crate::graph::CsrGraph;
use crate::par::do_all_steal;
use crate::par::reduce::FloatSum;
use kahan::KahanSum;
use sync_cell_slice::SyncSlice;

/// Recomputes every rank from its in-neighbors each round, until the sum of
/// absolute per-node changes falls below the tolerance or the round cap is
/// reached.
///
/// Every pulled neighbor has at least one out-edge (it appears as an arc
/// head in the transpose), so the division by its out-degree is always
/// defined.
pub(super) fn run(
    transpose: &CsrGraph,
    out_degrees: &[u32],
    plan: &PageRankPlan,
    pool: &rayon::ThreadPool,
) -> Box<[f64]> {
    let num_nodes = transpose.num_nodes();
    let base_score = (1.0 - plan.alpha) / num_nodes as f64;

    let mut rank: Box<[f64]> = vec![1.0 / num_nodes as f64; num_nodes].into_boxed_slice();
    let total_change = FloatSum::new(pool);
    let mut iteration = 0usize;

    {
        let rank_sync = rank.as_sync_slice();
        loop {
            do_all_steal(pool, num_nodes, CHUNK_SIZE, |node| {
                let mut sum = KahanSum::new();
                for edge in transpose.out_edges(node) {
                    let pred = transpose.edge_dest(edge);
                    // SAFETY: cells of other nodes race only with their
                    // owner's write; either the old or the new rank is read,
                    // and both are acceptable inputs for this round.
                    let pred_rank = unsafe { rank_sync[pred].get() };
                    sum += pred_rank / out_degrees[pred] as f64;
                }

                let value = sum.sum() * plan.alpha + base_score;
                // SAFETY: a node's own cell is written only by the worker
                // processing it, after the old value has been observed.
                let old = unsafe { rank_sync[node].get() };
                let diff = (value - old).abs();
                unsafe { rank_sync[node].set(value) };
                total_change.update(diff);
            });

            iteration += 1;
            let change = total_change.reduce();
            log::info!("iteration {}: total change {}", iteration, change);

            if change <= plan.tolerance || iteration >= plan.max_iterations {
                break;
            }
            total_change.reset();
        }
    }

    log::info!("PageRank iterations: {}", iteration);
    rank
}
