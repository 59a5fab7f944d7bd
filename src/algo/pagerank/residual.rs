/*
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use super::{PageRankPlan, CHUNK_SIZE};
use crate::graph::CsrGraph;
use crate::par::reduce::Sum;
use crate::par::{do_all, do_all_steal};
use kahan::KahanSum;
use sync_cell_slice::SyncSlice;

/// Residual-driven PageRank: each round, nodes whose residual exceeds the
/// tolerance absorb it into their rank and offer a per-out-edge delta; a
/// second pass pulls the offered deltas into the next residuals.
///
/// A node whose residual stays at or below the tolerance contributes
/// nothing, so converged regions cost two reads per round; the loop stops on
/// the first round in which no node pushed, or at the round cap.
pub(super) fn run(
    transpose: &CsrGraph,
    out_degrees: &[u32],
    plan: &PageRankPlan,
    pool: &rayon::ThreadPool,
) -> Box<[f64]> {
    let num_nodes = transpose.num_nodes();
    let initial_residual = plan
        .initial_residual
        .unwrap_or((1.0 - plan.alpha) / num_nodes as f64);

    let mut rank: Box<[f64]> = vec![0.0; num_nodes].into_boxed_slice();
    let mut delta: Box<[f64]> = vec![0.0; num_nodes].into_boxed_slice();
    let mut residual: Box<[f64]> = vec![initial_residual; num_nodes].into_boxed_slice();

    let pushing_nodes = Sum::<usize>::new(pool);
    let mut iterations = 0usize;

    {
        let rank_sync = rank.as_sync_slice();
        let delta_sync = delta.as_sync_slice();
        let residual_sync = residual.as_sync_slice();

        loop {
            // Absorb residuals above tolerance and offer deltas.
            do_all(pool, num_nodes, |node| {
                // SAFETY: this pass touches only the cells owned by `node`.
                unsafe {
                    delta_sync[node].set(0.0);
                    let r = residual_sync[node].get();
                    if r > plan.tolerance {
                        residual_sync[node].set(0.0);
                        rank_sync[node].set(rank_sync[node].get() + r);
                        if out_degrees[node] > 0 {
                            delta_sync[node].set(r * plan.alpha / out_degrees[node] as f64);
                            pushing_nodes.update(1);
                        }
                    }
                }
            });

            // Pull offered deltas into the next residuals.
            do_all_steal(pool, num_nodes, CHUNK_SIZE, |node| {
                let mut sum = KahanSum::new();
                for edge in transpose.out_edges(node) {
                    let pred = transpose.edge_dest(edge);
                    // SAFETY: deltas are read-only during this pass.
                    let d = unsafe { delta_sync[pred].get() };
                    if d > 0.0 {
                        sum += d;
                    }
                }
                if sum.sum() > 0.0 {
                    // SAFETY: a node's residual is written only by its owner.
                    unsafe { residual_sync[node].set(sum.sum()) };
                }
            });

            iterations += 1;
            if iterations >= plan.max_iterations || pushing_nodes.reduce() == 0 {
                break;
            }
            pushing_nodes.reset();
        }
    }

    log::info!("PageRank iterations: {}", iterations);
    rank
}
