/*
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! The storage boundary: an in-memory CSR topology plus named, typed scalar
//! property columns.
//!
//! The algorithms in [`crate::algo`] consume graphs exclusively through this
//! module: a finite, restartable enumeration of nodes and out-edges with
//! positional edge handles, typed per-node/per-edge scalar columns, and a
//! constructor for new output columns. Columnar persistence, import and
//! placement policies live outside this crate.

mod csr;
pub use csr::{CsrGraph, CsrGraphBuilder};

mod property;
pub use property::{Column, PropertyGraph, Scalar, ScalarType};
