/*
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use super::{CsrGraph, CsrGraphBuilder};
use crate::{Error, Result};
use std::collections::BTreeMap;

/// Tag identifying the scalar type of a [`Column`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarType {
    U32,
    U64,
    F32,
    F64,
}

/// A typed scalar column, one value per node or per edge.
pub enum Column {
    U32(Box<[u32]>),
    U64(Box<[u64]>),
    F32(Box<[f32]>),
    F64(Box<[f64]>),
}

impl Column {
    /// Returns a zero-filled column of the given type and length.
    pub fn new(scalar_type: ScalarType, len: usize) -> Self {
        match scalar_type {
            ScalarType::U32 => Column::U32(vec![0; len].into_boxed_slice()),
            ScalarType::U64 => Column::U64(vec![0; len].into_boxed_slice()),
            ScalarType::F32 => Column::F32(vec![0.0; len].into_boxed_slice()),
            ScalarType::F64 => Column::F64(vec![0.0; len].into_boxed_slice()),
        }
    }

    pub fn scalar_type(&self) -> ScalarType {
        match self {
            Column::U32(_) => ScalarType::U32,
            Column::U64(_) => ScalarType::U64,
            Column::F32(_) => ScalarType::F32,
            Column::F64(_) => ScalarType::F64,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Column::U32(v) => v.len(),
            Column::U64(v) => v.len(),
            Column::F32(v) => v.len(),
            Column::F64(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The closed set of scalar types storable in a [`Column`].
pub trait Scalar: Copy + Send + Sync + 'static {
    const TYPE: ScalarType;

    fn values(column: &Column) -> Option<&[Self]>;
    fn values_mut(column: &mut Column) -> Option<&mut [Self]>;
}

macro_rules! impl_scalar {
    ($ty:ty, $variant:ident) => {
        impl Scalar for $ty {
            const TYPE: ScalarType = ScalarType::$variant;

            fn values(column: &Column) -> Option<&[Self]> {
                match column {
                    Column::$variant(v) => Some(v),
                    _ => None,
                }
            }

            fn values_mut(column: &mut Column) -> Option<&mut [Self]> {
                match column {
                    Column::$variant(v) => Some(v),
                    _ => None,
                }
            }
        }
    };
}

impl_scalar!(u32, U32);
impl_scalar!(u64, U64);
impl_scalar!(f32, F32);
impl_scalar!(f64, F64);

/// A [`CsrGraph`] topology together with named scalar property columns.
///
/// Node columns are sized to the node count, edge columns to the edge count
/// and indexed by edge handle.
///
/// # Examples
/// ```
/// # use propgraph_algo::graph::PropertyGraph;
/// let graph = PropertyGraph::from_weighted_arcs(
///     3,
///     &[(0, 1, 10u32), (1, 2, 20), (2, 0, 30)],
///     "weight",
/// );
/// assert_eq!(graph.edge_values::<u32>("weight").unwrap(), &[10, 20, 30]);
/// ```
pub struct PropertyGraph {
    topology: CsrGraph,
    node_columns: BTreeMap<String, Column>,
    edge_columns: BTreeMap<String, Column>,
}

impl PropertyGraph {
    pub fn new(topology: CsrGraph) -> Self {
        Self {
            topology,
            node_columns: BTreeMap::new(),
            edge_columns: BTreeMap::new(),
        }
    }

    /// Builds a graph from `(src, dest, weight)` triples, storing the weights
    /// as an edge column named `weight_name`.
    ///
    /// # Panics
    ///
    /// Panics if an endpoint is out of range.
    pub fn from_weighted_arcs<S: Scalar>(
        num_nodes: usize,
        arcs: &[(usize, usize, S)],
        weight_name: &str,
    ) -> Self {
        let mut builder = CsrGraphBuilder::new(num_nodes);
        for &(src, dest, _) in arcs {
            builder.push_arc(src, dest);
        }
        let (topology, positions) = builder.build_with_positions();

        let mut column = Column::new(S::TYPE, arcs.len());
        let values =
            S::values_mut(&mut column).expect("freshly built column has the requested type");
        for (&(_, _, weight), &pos) in arcs.iter().zip(&positions) {
            values[pos] = weight;
        }

        let mut graph = Self::new(topology);
        graph.edge_columns.insert(weight_name.to_owned(), column);
        graph
    }

    #[inline(always)]
    pub fn topology(&self) -> &CsrGraph {
        &self.topology
    }

    #[inline(always)]
    pub fn num_nodes(&self) -> usize {
        self.topology.num_nodes()
    }

    /// Creates a new zero-filled node column.
    ///
    /// Fails with [`Error::PropertyExists`] if the name is already taken; in
    /// that case the graph is unchanged and the call may be retried with a
    /// different name.
    pub fn construct_node_property(&mut self, name: &str, scalar_type: ScalarType) -> Result<()> {
        if self.node_columns.contains_key(name) {
            return Err(Error::PropertyExists(name.to_owned()));
        }
        self.node_columns.insert(
            name.to_owned(),
            Column::new(scalar_type, self.topology.num_nodes()),
        );
        Ok(())
    }

    /// Returns the named node column.
    pub fn node_property(&self, name: &str) -> Result<&Column> {
        self.node_columns
            .get(name)
            .ok_or_else(|| Error::PropertyNotFound(name.to_owned()))
    }

    /// Returns the named edge column.
    pub fn edge_property(&self, name: &str) -> Result<&Column> {
        self.edge_columns
            .get(name)
            .ok_or_else(|| Error::PropertyNotFound(name.to_owned()))
    }

    /// Returns the values of the named node column, typed.
    pub fn node_values<S: Scalar>(&self, name: &str) -> Result<&[S]> {
        let column = self.node_property(name)?;
        S::values(column).ok_or_else(|| Error::TypeMismatch {
            property: name.to_owned(),
            expected: S::TYPE,
            found: column.scalar_type(),
        })
    }

    /// Returns the values of the named node column, typed and mutable.
    pub fn node_values_mut<S: Scalar>(&mut self, name: &str) -> Result<&mut [S]> {
        let column = self
            .node_columns
            .get_mut(name)
            .ok_or_else(|| Error::PropertyNotFound(name.to_owned()))?;
        let found = column.scalar_type();
        S::values_mut(column).ok_or_else(|| Error::TypeMismatch {
            property: name.to_owned(),
            expected: S::TYPE,
            found,
        })
    }

    /// Returns the values of the named edge column, typed.
    pub fn edge_values<S: Scalar>(&self, name: &str) -> Result<&[S]> {
        let column = self.edge_property(name)?;
        S::values(column).ok_or_else(|| Error::TypeMismatch {
            property: name.to_owned(),
            expected: S::TYPE,
            found: column.scalar_type(),
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_construct_node_property() -> Result<()> {
        let mut graph =
            PropertyGraph::from_weighted_arcs(2, &[(0, 1, 1.0f64)], "weight");
        graph.construct_node_property("rank", ScalarType::F64)?;
        assert_eq!(graph.node_values::<f64>("rank")?, &[0.0, 0.0]);
        assert!(matches!(
            graph.construct_node_property("rank", ScalarType::F64),
            Err(Error::PropertyExists(_))
        ));
        Ok(())
    }

    #[test]
    fn test_type_mismatch() {
        let graph = PropertyGraph::from_weighted_arcs(2, &[(0, 1, 1u32)], "weight");
        assert!(matches!(
            graph.edge_values::<f64>("weight"),
            Err(Error::TypeMismatch { .. })
        ));
        assert!(matches!(
            graph.edge_values::<u32>("missing"),
            Err(Error::PropertyNotFound(_))
        ));
    }
}
