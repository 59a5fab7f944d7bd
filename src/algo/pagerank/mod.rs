/*
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Pull-based PageRank over a property graph.
//!
//! **Warning**: both entry points take the **transpose** of the graph to
//! rank, because each node pulls from its predecessors: the out-edges of the
//! transpose enumerate the in-neighbors of the original graph, and
//! out-degrees in the original are recovered by counting arc heads in the
//! transpose.
//!
//! Two fixed-point schedules are provided. The topological variant
//! recomputes every rank from scratch each round and stops when the total
//! absolute change falls below the tolerance. The residual variant keeps per
//! node the rank mass not yet propagated and only nodes whose residual
//! exceeds the tolerance push mass along their edges, so converged regions
//! of the graph drop out of the work early; it stops on the first round in
//! which no node pushed.

mod residual;
mod topological;

use crate::graph::{CsrGraph, PropertyGraph, ScalarType};
use crate::par::{do_all, do_all_steal, Threads};
use crate::Result;
use dsi_progress_logger::ProgressLog;
use std::sync::atomic::{AtomicU32, Ordering};
use sync_cell_slice::SyncSlice;

/// Chunk claimed at a time by a worker in the edge-bound passes.
const CHUNK_SIZE: usize = 16;

/// Configuration for the PageRank entry points.
#[derive(Debug, Clone)]
pub struct PageRankPlan {
    /// Damping factor, in [0..1).
    pub alpha: f64,
    /// Convergence threshold on the round's change metric.
    pub tolerance: f64,
    /// Round cap, applied to both variants.
    pub max_iterations: usize,
    /// Seed residual per node for the residual variant. [`None`] seeds
    /// `(1 - alpha) / n`, which makes the residual fixed point match the
    /// topological one.
    pub initial_residual: Option<f64>,
    pub threads: Threads,
}

impl Default for PageRankPlan {
    fn default() -> Self {
        Self {
            alpha: 0.85,
            tolerance: 1E-4,
            max_iterations: 1000,
            initial_residual: None,
            threads: Threads::Default,
        }
    }
}

/// Out-degrees of the original graph, computed by counting arc heads in the
/// transpose.
fn compute_out_degrees(transpose: &CsrGraph, pool: &rayon::ThreadPool) -> Box<[u32]> {
    let num_nodes = transpose.num_nodes();
    let counts: Box<[AtomicU32]> = (0..num_nodes).map(|_| AtomicU32::new(0)).collect();

    do_all_steal(pool, num_nodes, CHUNK_SIZE, |node| {
        for edge in transpose.out_edges(node) {
            counts[transpose.edge_dest(edge)].fetch_add(1, Ordering::Relaxed);
        }
    });

    counts.iter().map(|c| c.load(Ordering::Relaxed)).collect()
}

fn extract_ranks(
    graph: &mut PropertyGraph,
    output_property: &str,
    rank: &[f64],
    pool: &rayon::ThreadPool,
) -> Result<()> {
    let output = graph.node_values_mut::<f64>(output_property)?;
    let output_sync = output.as_sync_slice();
    do_all(pool, rank.len(), |node| {
        // SAFETY: every node writes its own output cell exactly once.
        unsafe { output_sync[node].set(rank[node]) }
    });
    Ok(())
}

/// Computes PageRank with the topological schedule and stores the ranks in a
/// new `f64` node property.
///
/// `transpose` must be the transpose of the graph to rank (see the
/// [module-level documentation](self)).
///
/// # Errors
///
/// [`crate::Error::PropertyExists`] if the output column already exists.
///
/// # Examples
/// ```
/// # fn main() -> propgraph_algo::Result<()> {
/// use dsi_progress_logger::no_logging;
/// use propgraph_algo::algo::pagerank::{page_rank_pull_topological, PageRankPlan};
/// use propgraph_algo::graph::PropertyGraph;
///
/// // Transpose of the 3-cycle 0 → 1 → 2 → 0.
/// let mut transpose = PropertyGraph::from_weighted_arcs(
///     3,
///     &[(1, 0, 1u32), (2, 1, 1), (0, 2, 1)],
///     "weight",
/// );
/// page_rank_pull_topological(&mut transpose, "rank", &PageRankPlan::default(), no_logging![])?;
/// let rank = transpose.node_values::<f64>("rank")?;
/// assert!((rank.iter().sum::<f64>() - 1.0).abs() < 1E-3);
/// # Ok(())
/// # }
/// ```
pub fn page_rank_pull_topological(
    transpose: &mut PropertyGraph,
    output_property: &str,
    plan: &PageRankPlan,
    pl: &mut impl ProgressLog,
) -> Result<()> {
    assert!(
        (0.0..1.0).contains(&plan.alpha),
        "The damping factor must be in [0 . . 1), got {}",
        plan.alpha
    );
    transpose.construct_node_property(output_property, ScalarType::F64)?;
    if transpose.num_nodes() == 0 {
        return Ok(());
    }

    let pool = plan.threads.build();
    let rank = {
        let topology = transpose.topology();
        let out_degrees = compute_out_degrees(topology, &pool);

        pl.start("Computing PageRank (topological)...");
        let rank = topological::run(topology, &out_degrees, plan, &pool);
        pl.done();
        rank
    };

    extract_ranks(transpose, output_property, &rank, &pool)
}

/// Computes PageRank with the residual schedule and stores the ranks in a
/// new `f64` node property.
///
/// `transpose` must be the transpose of the graph to rank (see the
/// [module-level documentation](self)).
///
/// # Errors
///
/// [`crate::Error::PropertyExists`] if the output column already exists.
pub fn page_rank_pull_residual(
    transpose: &mut PropertyGraph,
    output_property: &str,
    plan: &PageRankPlan,
    pl: &mut impl ProgressLog,
) -> Result<()> {
    assert!(
        (0.0..1.0).contains(&plan.alpha),
        "The damping factor must be in [0 . . 1), got {}",
        plan.alpha
    );
    transpose.construct_node_property(output_property, ScalarType::F64)?;
    if transpose.num_nodes() == 0 {
        return Ok(());
    }

    let pool = plan.threads.build();
    let rank = {
        let topology = transpose.topology();
        let out_degrees = compute_out_degrees(topology, &pool);

        pl.start("Computing PageRank (residual)...");
        let rank = residual::run(topology, &out_degrees, plan, &pool);
        pl.done();
        rank
    };

    extract_ranks(transpose, output_property, &rank, &pool)
}
