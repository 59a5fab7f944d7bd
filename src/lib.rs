/*
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! A parallel runtime for irregular graph algorithms on in-memory property
//! graphs, and the algorithms built on it.
//!
//! Work is scheduled either by bulk-synchronous passes over a static range
//! ([`par::do_all`] and friends) or by an asynchronous executor draining a
//! priority-bucketed worklist of dynamically discovered items
//! ([`par::for_each`] over [`par::Obim`]). Shared per-node state is mutated
//! only through atomic monotone updates ([`par::Weight::fetch_min`]) or by a
//! single owning worker per pass, so no algorithm takes a lock on the data
//! it converges on.
//!
//! On top of the runtime, [`algo::sssp`] implements shortest paths by
//! delta-stepping (plus serial, exact-priority and fixed-point references)
//! and [`algo::pagerank`] implements pull-based PageRank with topological
//! and residual schedules.

pub mod algo;
pub mod graph;
pub mod par;

mod error;
pub use error::{Error, Result};

/// Use `use propgraph_algo::prelude::*;` to import the graph types, the
/// runtime and the algorithm modules.
pub mod prelude {
    pub use crate::algo::pagerank;
    pub use crate::algo::sssp;
    pub use crate::graph::{Column, CsrGraph, CsrGraphBuilder, PropertyGraph, Scalar, ScalarType};
    pub use crate::par::{reduce, Threads, Weight};
    pub use crate::{Error, Result};
}
