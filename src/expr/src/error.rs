// Copyright Materialize, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use sift_repr::ColumnRef;

/// The ways in which constructing a plan node can violate its invariants.
///
/// These are programming errors in whatever builds the plan. The plain plan
/// constructors panic with this error's message; the `try_` variants hand it
/// back to the caller.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlanError {
    /// A node would produce the same column twice.
    #[error("{node} produces column {column} more than once")]
    DuplicateOutput {
        column: ColumnRef,
        node: &'static str,
    },
    /// An assignment map would define the same column twice.
    #[error("column {0} is assigned more than once")]
    DuplicateAssignment(ColumnRef),
    /// A node reads a column that its input does not produce.
    #[error("{node} references column {column} that is not produced by its input")]
    UnknownColumn {
        column: ColumnRef,
        node: &'static str,
    },
    /// The marker of a mark-distinct node shadows one of its input columns.
    #[error("marker column {0} is already produced by the input of MarkDistinct")]
    MarkerCollision(ColumnRef),
    /// A mark-distinct node was given no key columns.
    #[error("MarkDistinct requires at least one key column")]
    EmptyDistinctKeys,
    /// The hash column of a mark-distinct node is not an input column.
    #[error("hash column {0} is not produced by the input of MarkDistinct")]
    UnknownHashColumn(ColumnRef),
}
