/*
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use crate::graph::ScalarType;

/// Errors returned by the algorithms in this crate.
///
/// Caller errors ([`InvalidStartNode`](Error::InvalidStartNode),
/// [`PropertyNotFound`](Error::PropertyNotFound),
/// [`TypeMismatch`](Error::TypeMismatch)) are reported immediately and are
/// never retried internally. Schema errors
/// ([`PropertyExists`](Error::PropertyExists)) are safe to retry with a
/// different property name. [`AssertionFailed`](Error::AssertionFailed) and
/// [`InternalConsistency`](Error::InternalConsistency) are fatal to the call:
/// they indicate either a bug or a violated precondition, such as a negative
/// edge weight.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The start node passed to a traversal does not exist.
    #[error("invalid start node {node}: the graph has {num_nodes} nodes")]
    InvalidStartNode { node: usize, num_nodes: usize },
    /// The named property does not exist.
    #[error("property {0:?} not found")]
    PropertyNotFound(String),
    /// A property with the given name already exists, so the schema change
    /// was rejected.
    #[error("property {0:?} already exists")]
    PropertyExists(String),
    /// The named property does not have the scalar type the operation needs.
    #[error("property {property:?} has type {found:?}, expected {expected:?}")]
    TypeMismatch {
        property: String,
        expected: ScalarType,
        found: ScalarType,
    },
    /// Post-hoc validation found an inconsistent result.
    #[error("assertion failed: {0}")]
    AssertionFailed(String),
    /// A scheduler invariant was violated. This is a bug or a violated
    /// precondition, never a recoverable condition.
    #[error("internal consistency violation: {0}")]
    InternalConsistency(&'static str),
}

pub type Result<T> = std::result::Result<T, Error>;
