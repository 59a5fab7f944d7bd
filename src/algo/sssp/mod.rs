/*
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Single-source shortest paths by concurrent edge relaxation.
//!
//! The primary variant is delta-stepping: pending relaxations are kept in
//! priority buckets of width 2<sup>[`delta`](SsspPlan::delta)</sup> and
//! drained in approximately ascending order by the asynchronous executor.
//! Approximate order is sufficient for correctness: distances only decrease,
//! so a relaxation can never target a bucket that has already been fully
//! drained, and items that lost their race are discarded by a staleness
//! check when popped. Smaller buckets mean less wasted work, larger buckets
//! more parallelism; `delta = 0` degenerates to exact priority order.
//!
//! Serial bucket, Dijkstra and topological fixed-point variants of the same
//! relaxation rule are provided as references. Edge weights must be
//! non-negative; negative weights are not validated and yield unspecified
//! distances.

mod delta_step;
mod serial;
mod topo;

use crate::graph::{CsrGraph, PropertyGraph, Scalar, ScalarType};
use crate::par::reduce::{FloatSum, LogicalOr, Max, Sum};
use crate::par::{do_all, Threads, Weight};
use crate::{Error, Result};
use dsi_progress_logger::ProgressLog;
use std::ops::Range;
use sync_cell_slice::SyncSlice;

/// Chunk claimed at a time by a worker in work-stealing passes.
const CHUNK_SIZE: usize = 64;

/// Selects the shortest-path implementation run by [`shortest_path`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SsspAlgorithm {
    /// Parallel delta-stepping, one update request per improved node.
    DeltaStep,
    /// Parallel delta-stepping over pre-chunked edge tiles.
    DeltaStepTile,
    /// Delta-stepping with a full barrier between buckets.
    DeltaStepBarrier,
    /// Single-threaded bucket relaxation.
    SerialDelta,
    SerialDeltaTile,
    /// Exact priority order (reference implementation).
    Dijkstra,
    DijkstraTile,
    /// Synchronous fixed point over all nodes.
    Topological,
    TopologicalTile,
}

/// Configuration for [`shortest_path`].
#[derive(Debug, Clone)]
pub struct SsspPlan {
    pub algorithm: SsspAlgorithm,
    /// Bucket-width exponent: an item with distance `d` goes to bucket
    /// `d >> delta`.
    pub delta: u32,
    /// Edges per tile for the tiled variants.
    pub edge_tile_size: usize,
    /// Count and log stale items and overwritten relaxations.
    pub track_work: bool,
    pub threads: Threads,
}

impl Default for SsspPlan {
    fn default() -> Self {
        Self {
            algorithm: SsspAlgorithm::DeltaStep,
            delta: 13,
            edge_tile_size: 512,
            track_work: false,
            threads: Threads::Default,
        }
    }
}

impl SsspPlan {
    fn with_algorithm(algorithm: SsspAlgorithm) -> Self {
        Self {
            algorithm,
            ..Self::default()
        }
    }

    pub fn delta_step(delta: u32) -> Self {
        Self {
            delta,
            ..Self::with_algorithm(SsspAlgorithm::DeltaStep)
        }
    }

    pub fn delta_step_tile(delta: u32) -> Self {
        Self {
            delta,
            ..Self::with_algorithm(SsspAlgorithm::DeltaStepTile)
        }
    }

    pub fn delta_step_barrier(delta: u32) -> Self {
        Self {
            delta,
            ..Self::with_algorithm(SsspAlgorithm::DeltaStepBarrier)
        }
    }

    pub fn serial_delta(delta: u32) -> Self {
        Self {
            delta,
            ..Self::with_algorithm(SsspAlgorithm::SerialDelta)
        }
    }

    pub fn serial_delta_tile(delta: u32) -> Self {
        Self {
            delta,
            ..Self::with_algorithm(SsspAlgorithm::SerialDeltaTile)
        }
    }

    pub fn dijkstra() -> Self {
        Self::with_algorithm(SsspAlgorithm::Dijkstra)
    }

    pub fn dijkstra_tile() -> Self {
        Self::with_algorithm(SsspAlgorithm::DijkstraTile)
    }

    pub fn topological() -> Self {
        Self::with_algorithm(SsspAlgorithm::Topological)
    }

    pub fn topological_tile() -> Self {
        Self::with_algorithm(SsspAlgorithm::TopologicalTile)
    }
}

/// A proposed relaxation of the out-edges of `src`, created when its
/// distance improved to `dist`.
///
/// Consumed exactly once; by the time it is popped the live distance may
/// have improved further, in which case the request is stale and discarded.
pub struct Req<W> {
    pub src: usize,
    pub dist: W,
}

/// A pre-chunked group of out-edges of `src`, with the distance snapshot
/// taken at creation time.
///
/// Tiles amortize task-creation overhead on high-degree nodes; the snapshot
/// is re-validated against the live distance before the edges are relaxed.
pub struct EdgeTile<W> {
    pub src: usize,
    pub dist: W,
    pub edges: Range<usize>,
}

/// Unit of relaxation work: either a whole-node [`Req`] or an [`EdgeTile`].
pub(crate) trait WorkItem<W: Weight>: Send + Sized {
    fn src(&self) -> usize;

    fn dist(&self) -> W;

    /// The edge handles this item relaxes.
    fn edges(&self, graph: &CsrGraph) -> Range<usize>;

    /// Creates the items covering the out-edges of `node` at distance
    /// `dist` and feeds them to `push`.
    fn make(
        graph: &CsrGraph,
        node: usize,
        dist: W,
        tile_size: usize,
        push: impl FnMut(Self),
    );
}

impl<W: Weight> WorkItem<W> for Req<W> {
    #[inline(always)]
    fn src(&self) -> usize {
        self.src
    }

    #[inline(always)]
    fn dist(&self) -> W {
        self.dist
    }

    #[inline(always)]
    fn edges(&self, graph: &CsrGraph) -> Range<usize> {
        graph.out_edges(self.src)
    }

    #[inline(always)]
    fn make(
        _graph: &CsrGraph,
        node: usize,
        dist: W,
        _tile_size: usize,
        mut push: impl FnMut(Self),
    ) {
        push(Req { src: node, dist });
    }
}

impl<W: Weight> WorkItem<W> for EdgeTile<W> {
    #[inline(always)]
    fn src(&self) -> usize {
        self.src
    }

    #[inline(always)]
    fn dist(&self) -> W {
        self.dist
    }

    #[inline(always)]
    fn edges(&self, _graph: &CsrGraph) -> Range<usize> {
        self.edges.clone()
    }

    fn make(
        graph: &CsrGraph,
        node: usize,
        dist: W,
        tile_size: usize,
        mut push: impl FnMut(Self),
    ) {
        let Range { start, end } = graph.out_edges(node);
        let mut begin = start;
        while begin < end {
            let tile_end = (begin + tile_size).min(end);
            push(EdgeTile {
                src: node,
                dist,
                edges: begin..tile_end,
            });
            begin = tile_end;
        }
    }
}

/// Computes shortest-path distances from `start_node` and stores them in a
/// new node property.
///
/// Edge weights are read from the `weight_property` column, whose scalar
/// type (u32, u64, f32 or f64) selects the distance type. The output column
/// `output_property` is created with the same type; unreached nodes are left
/// at the type's infinity sentinel.
///
/// # Errors
///
/// * [`Error::InvalidStartNode`] if `start_node` is out of range.
/// * [`Error::PropertyNotFound`] if the weight column does not exist.
/// * [`Error::PropertyExists`] if the output column already exists.
/// * [`Error::InternalConsistency`] if the scheduler terminates with pending
///   work, which indicates a bug or a negative edge weight.
///
/// # Examples
/// ```
/// # fn main() -> propgraph_algo::Result<()> {
/// use dsi_progress_logger::no_logging;
/// use propgraph_algo::algo::sssp::{shortest_path, SsspPlan};
/// use propgraph_algo::graph::PropertyGraph;
///
/// let mut graph = PropertyGraph::from_weighted_arcs(
///     4,
///     &[(0, 1, 1u32), (1, 2, 1), (2, 3, 1), (3, 0, 1)],
///     "weight",
/// );
/// shortest_path(&mut graph, 0, "weight", "distance", &SsspPlan::default(), no_logging![])?;
/// assert_eq!(graph.node_values::<u32>("distance")?, &[0, 1, 2, 3]);
/// # Ok(())
/// # }
/// ```
pub fn shortest_path(
    graph: &mut PropertyGraph,
    start_node: usize,
    weight_property: &str,
    output_property: &str,
    plan: &SsspPlan,
    pl: &mut impl ProgressLog,
) -> Result<()> {
    match graph.edge_property(weight_property)?.scalar_type() {
        ScalarType::U32 => {
            run::<u32>(graph, start_node, weight_property, output_property, plan, pl)
        }
        ScalarType::U64 => {
            run::<u64>(graph, start_node, weight_property, output_property, plan, pl)
        }
        ScalarType::F32 => {
            run::<f32>(graph, start_node, weight_property, output_property, plan, pl)
        }
        ScalarType::F64 => {
            run::<f64>(graph, start_node, weight_property, output_property, plan, pl)
        }
    }
}

fn run<W: Weight + Scalar>(
    graph: &mut PropertyGraph,
    start_node: usize,
    weight_property: &str,
    output_property: &str,
    plan: &SsspPlan,
    pl: &mut impl ProgressLog,
) -> Result<()> {
    let num_nodes = graph.num_nodes();
    if start_node >= num_nodes {
        return Err(Error::InvalidStartNode {
            node: start_node,
            num_nodes,
        });
    }
    graph.construct_node_property(output_property, W::TYPE)?;

    let pool = plan.threads.build();
    let dist: Box<[W::Atomic]> = (0..num_nodes).map(|_| W::new_atomic(W::INFINITY)).collect();
    W::store(&dist[start_node], W::ZERO);

    {
        let topology = graph.topology();
        let weights: &[W] = graph.edge_values(weight_property)?;

        pl.start(format!(
            "Computing shortest paths with {:?}...",
            plan.algorithm
        ));
        match plan.algorithm {
            SsspAlgorithm::DeltaStep => {
                delta_step::run::<W, Req<W>>(topology, weights, &dist, start_node, plan, &pool, false)?
            }
            SsspAlgorithm::DeltaStepTile => delta_step::run::<W, EdgeTile<W>>(
                topology, weights, &dist, start_node, plan, &pool, false,
            )?,
            SsspAlgorithm::DeltaStepBarrier => {
                delta_step::run::<W, Req<W>>(topology, weights, &dist, start_node, plan, &pool, true)?
            }
            SsspAlgorithm::SerialDelta => {
                serial::delta::<W, Req<W>>(topology, weights, &dist, start_node, plan)?
            }
            SsspAlgorithm::SerialDeltaTile => {
                serial::delta::<W, EdgeTile<W>>(topology, weights, &dist, start_node, plan)?
            }
            SsspAlgorithm::Dijkstra => {
                serial::dijkstra::<W, Req<W>>(topology, weights, &dist, start_node, plan)
            }
            SsspAlgorithm::DijkstraTile => {
                serial::dijkstra::<W, EdgeTile<W>>(topology, weights, &dist, start_node, plan)
            }
            SsspAlgorithm::Topological => topo::run::<W>(topology, weights, &dist, &pool),
            SsspAlgorithm::TopologicalTile => {
                topo::run_tile::<W>(topology, weights, &dist, &pool, plan)
            }
        }
        pl.done();
    }

    let output = graph.node_values_mut::<W>(output_property)?;
    let output_sync = output.as_sync_slice();
    do_all(&pool, num_nodes, |node| {
        // SAFETY: every node writes its own output cell exactly once.
        unsafe { output_sync[node].set(W::load(&dist[node])) }
    });

    Ok(())
}

/// Checks the shortest-path optimality condition on a computed distance
/// column: the start node is at distance zero, and no edge can improve its
/// head's distance.
///
/// Returns [`Error::AssertionFailed`] on a violation. A violation after
/// [`shortest_path`] returned successfully indicates either a bug or a
/// negative edge weight.
pub fn shortest_path_validate(
    graph: &PropertyGraph,
    start_node: usize,
    weight_property: &str,
    output_property: &str,
) -> Result<()> {
    match graph.node_property(output_property)?.scalar_type() {
        ScalarType::U32 => validate::<u32>(graph, start_node, weight_property, output_property),
        ScalarType::U64 => validate::<u64>(graph, start_node, weight_property, output_property),
        ScalarType::F32 => validate::<f32>(graph, start_node, weight_property, output_property),
        ScalarType::F64 => validate::<f64>(graph, start_node, weight_property, output_property),
    }
}

fn validate<W: Weight + Scalar>(
    graph: &PropertyGraph,
    start_node: usize,
    weight_property: &str,
    output_property: &str,
) -> Result<()> {
    let num_nodes = graph.num_nodes();
    if start_node >= num_nodes {
        return Err(Error::InvalidStartNode {
            node: start_node,
            num_nodes,
        });
    }
    let dist: &[W] = graph.node_values(output_property)?;
    let weights: &[W] = graph.edge_values(weight_property)?;
    let topology = graph.topology();

    if dist[start_node] != W::ZERO {
        return Err(Error::AssertionFailed(format!(
            "start node {} has distance {:?} instead of zero",
            start_node, dist[start_node]
        )));
    }

    let pool = Threads::Default.build();
    let not_consistent = LogicalOr::new(&pool);
    do_all(&pool, num_nodes, |node| {
        if dist[node] >= W::INFINITY {
            return;
        }
        for edge in topology.out_edges(node) {
            let dest = topology.edge_dest(edge);
            if dist[dest] > dist[node] + weights[edge] {
                not_consistent.update(true);
            }
        }
    });

    if not_consistent.reduce() {
        return Err(Error::AssertionFailed(
            "an edge can still improve its head's distance".into(),
        ));
    }
    Ok(())
}

/// Summary of a computed distance column, over reached nodes only (nodes
/// left at the infinity sentinel are excluded).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SsspStatistics {
    pub reached_nodes: usize,
    pub max_distance: f64,
    pub average_distance: f64,
}

impl std::fmt::Display for SsspStatistics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Number of reached nodes = {}", self.reached_nodes)?;
        writeln!(f, "Maximum distance = {}", self.max_distance)?;
        writeln!(f, "Average distance = {}", self.average_distance)
    }
}

/// Computes [`SsspStatistics`] for a distance column produced by
/// [`shortest_path`].
pub fn shortest_path_statistics(
    graph: &PropertyGraph,
    output_property: &str,
) -> Result<SsspStatistics> {
    match graph.node_property(output_property)?.scalar_type() {
        ScalarType::U32 => statistics::<u32>(graph, output_property),
        ScalarType::U64 => statistics::<u64>(graph, output_property),
        ScalarType::F32 => statistics::<f32>(graph, output_property),
        ScalarType::F64 => statistics::<f64>(graph, output_property),
    }
}

fn statistics<W: Weight + Scalar>(
    graph: &PropertyGraph,
    output_property: &str,
) -> Result<SsspStatistics> {
    let dist: &[W] = graph.node_values(output_property)?;
    let pool = Threads::Default.build();

    let max_dist = Max::<W>::new(&pool);
    let sum_dist = FloatSum::new(&pool);
    let num_reached = Sum::<usize>::new(&pool);

    do_all(&pool, dist.len(), |node| {
        let d = dist[node];
        if d < W::INFINITY {
            max_dist.update(d);
            sum_dist.update(d.to_f64());
            num_reached.update(1);
        }
    });

    let reached_nodes = num_reached.reduce();
    Ok(SsspStatistics {
        reached_nodes,
        max_distance: max_dist.reduce().map_or(0.0, W::to_f64),
        average_distance: if reached_nodes == 0 {
            0.0
        } else {
            sum_dist.reduce() / reached_nodes as f64
        },
    })
}
