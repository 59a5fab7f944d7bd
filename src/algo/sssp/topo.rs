/*
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use super::{EdgeTile, SsspPlan, CHUNK_SIZE};
use crate::graph::CsrGraph;
use crate::par::reduce::LogicalOr;
use crate::par::{do_all_mut_steal, do_all_steal, Weight};
use rayon::prelude::*;
use sync_cell_slice::SyncSlice;

/// Synchronous fixed-point relaxation: full work-stealing passes over all
/// nodes until a pass improves nothing.
///
/// Each node keeps a private gate value holding the distance it last
/// expanded at; a node relaxes its out-edges only when its live distance
/// dropped below the gate, so converged regions of the graph cost one
/// comparison per round.
pub(super) fn run<W: Weight>(
    graph: &CsrGraph,
    weights: &[W],
    dist: &[W::Atomic],
    pool: &rayon::ThreadPool,
) {
    let num_nodes = graph.num_nodes();
    let mut old_dist: Box<[W]> = vec![W::INFINITY; num_nodes].into_boxed_slice();
    let old_sync = old_dist.as_sync_slice();

    let changed = LogicalOr::new(pool);
    let mut rounds = 0usize;

    loop {
        rounds += 1;
        changed.reset();

        do_all_steal(pool, num_nodes, CHUNK_SIZE, |node| {
            let live = W::load(&dist[node]);
            // SAFETY: a node's gate cell is accessed only by the worker
            // processing that node, and each node is processed once per pass.
            let gate = unsafe { old_sync[node].get() };
            if gate > live {
                unsafe { old_sync[node].set(live) };
                changed.update(true);

                for edge in graph.out_edges(node) {
                    let new_dist = live + weights[edge];
                    W::fetch_min(&dist[graph.edge_dest(edge)], new_dist);
                }
            }
        });

        if !changed.reduce() {
            break;
        }
    }

    log::info!("topological relaxation rounds: {}", rounds);
}

/// The edge-tile flavor of [`run`]: out-edges are chunked into tiles once,
/// and the gate value lives in the tile instead of a per-node array, so a
/// pass streams sequentially through tile memory.
pub(super) fn run_tile<W: Weight>(
    graph: &CsrGraph,
    weights: &[W],
    dist: &[W::Atomic],
    pool: &rayon::ThreadPool,
    plan: &SsspPlan,
) {
    let num_nodes = graph.num_nodes();
    let tile_size = plan.edge_tile_size.max(1);

    let mut tiles: Vec<EdgeTile<W>> = pool.install(|| {
        (0..num_nodes)
            .into_par_iter()
            .flat_map_iter(|node| {
                let range = graph.out_edges(node);
                let (start, end) = (range.start, range.end);
                (start..end).step_by(tile_size).map(move |begin| EdgeTile {
                    src: node,
                    dist: W::INFINITY,
                    edges: begin..(begin + tile_size).min(end),
                })
            })
            .collect()
    });

    let changed = LogicalOr::new(pool);
    let mut rounds = 0usize;

    loop {
        rounds += 1;
        changed.reset();

        do_all_mut_steal(pool, &mut tiles, 1, |tile| {
            let live = W::load(&dist[tile.src]);
            if tile.dist > live {
                tile.dist = live;
                changed.update(true);

                for edge in tile.edges.clone() {
                    let new_dist = live + weights[edge];
                    W::fetch_min(&dist[graph.edge_dest(edge)], new_dist);
                }
            }
        });

        if !changed.reduce() {
            break;
        }
    }

    log::info!("topological relaxation rounds: {}", rounds);
}
