// Copyright Materialize, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Ordered maps from output columns to the expressions that define them.

use std::collections::BTreeSet;
use std::fmt;

use itertools::Itertools;
use serde::Serialize;

use sift_repr::ColumnRef;

use crate::{PlanError, ScalarExpr};

/// The assignments of a projection.
///
/// Entries keep the order in which they were supplied, and the order survives
/// every operation on the map. Semantics never depend on it, but output
/// column order, EXPLAIN text and structural comparison of plans all do.
#[derive(Clone, Debug, Default, Eq, PartialEq, Hash, Serialize)]
#[serde(transparent)]
pub struct Assignments {
    entries: Vec<(ColumnRef, ScalarExpr)>,
}

impl Assignments {
    /// An assignment map that passes each of `columns` through unchanged.
    ///
    /// # Panics
    ///
    /// Panics if a column is listed twice.
    pub fn identity<I>(columns: I) -> Self
    where
        I: IntoIterator<Item = ColumnRef>,
    {
        Self::of(
            columns
                .into_iter()
                .map(|c| (c.clone(), ScalarExpr::Column(c))),
        )
    }

    /// An assignment map with the given entries, in the given order.
    ///
    /// # Panics
    ///
    /// Panics if an output column is assigned twice.
    pub fn of<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (ColumnRef, ScalarExpr)>,
    {
        match Self::try_of(entries) {
            Ok(assignments) => assignments,
            Err(e) => panic!("invalid assignments: {}", e),
        }
    }

    /// Like [`Assignments::of`], but reports a duplicate output column as an
    /// error.
    pub fn try_of<I>(entries: I) -> Result<Self, PlanError>
    where
        I: IntoIterator<Item = (ColumnRef, ScalarExpr)>,
    {
        let entries = entries.into_iter().collect::<Vec<_>>();
        if let Some(column) = entries.iter().map(|(c, _)| c).duplicates().next() {
            return Err(PlanError::DuplicateAssignment(column.clone()));
        }
        Ok(Assignments { entries })
    }

    /// The entries whose output column is in `columns`, in their original
    /// order.
    pub fn restrict_to(&self, columns: &BTreeSet<ColumnRef>) -> Self {
        Assignments {
            entries: self
                .entries
                .iter()
                .filter(|(c, _)| columns.contains(c))
                .cloned()
                .collect(),
        }
    }

    /// The output columns, in order.
    pub fn outputs(&self) -> impl Iterator<Item = &ColumnRef> {
        self.entries.iter().map(|(c, _)| c)
    }

    /// The expression assigned to `column`, if any.
    pub fn get(&self, column: &ColumnRef) -> Option<&ScalarExpr> {
        self.entries
            .iter()
            .find(|(c, _)| c == column)
            .map(|(_, e)| e)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ColumnRef, &ScalarExpr)> {
        self.entries.iter().map(|(c, e)| (c, e))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether every output column is assigned exactly itself.
    pub fn is_identity(&self) -> bool {
        self.entries
            .iter()
            .all(|(c, e)| e.as_column() == Some(c))
    }

    /// The columns read by any of the assigned expressions.
    ///
    /// Output columns only count if some expression also reads them.
    pub fn referenced_columns(&self) -> BTreeSet<ColumnRef> {
        let mut columns = BTreeSet::new();
        for (_, expr) in self.entries.iter() {
            expr.referenced_columns_into(&mut columns);
        }
        columns
    }
}

impl fmt::Display for Assignments {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let entries = self.entries.iter().format_with(", ", |(c, e), f| {
            if e.as_column() == Some(c) {
                f(c)
            } else {
                f(&format_args!("{} = {}", c, e))
            }
        });
        write!(f, "{}", entries)
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use sift_repr::ScalarType;

    use super::*;
    use crate::func::BinaryFunc;

    fn col(name: &str) -> ColumnRef {
        ColumnRef::new(name, ScalarType::Int64)
    }

    #[test]
    fn test_identity() {
        let assignments = Assignments::identity([col("b"), col("a")]);
        assert!(assignments.is_identity());
        assert_eq!(
            assignments.outputs().cloned().collect::<Vec<_>>(),
            vec![col("b"), col("a")]
        );
        assert_eq!(assignments.get(&col("a")), Some(&ScalarExpr::column(col("a"))));
        assert_eq!(assignments.to_string(), "b, a");
    }

    #[test]
    fn test_of() {
        let sum = ScalarExpr::column(col("a")).call_binary(ScalarExpr::column(col("b")), BinaryFunc::Add);
        let assignments = Assignments::of([
            (col("x"), sum.clone()),
            (col("a"), ScalarExpr::column(col("a"))),
        ]);
        assert!(!assignments.is_identity());
        assert_eq!(assignments.get(&col("x")), Some(&sum));
        assert_eq!(assignments.get(&col("b")), None);
        assert_eq!(assignments.to_string(), "x = (a + b), a");
        // Keys are not references unless an expression reads them.
        assert_eq!(
            assignments.referenced_columns(),
            BTreeSet::from([col("a"), col("b")])
        );
    }

    #[test]
    fn test_duplicate_assignment() {
        let err = Assignments::try_of([
            (col("x"), ScalarExpr::column(col("a"))),
            (col("x"), ScalarExpr::column(col("b"))),
        ])
        .unwrap_err();
        assert_eq!(err, PlanError::DuplicateAssignment(col("x")));
    }

    #[test]
    #[should_panic(expected = "column a is assigned more than once")]
    fn test_identity_rejects_duplicates() {
        Assignments::identity([col("a"), col("a")]);
    }

    #[test]
    fn test_restrict_to() {
        let assignments = Assignments::identity([col("c"), col("a"), col("b")]);
        let restricted = assignments.restrict_to(&BTreeSet::from([col("b"), col("c"), col("z")]));
        assert_eq!(restricted, Assignments::identity([col("c"), col("b")]));
        assert!(assignments.restrict_to(&BTreeSet::new()).is_empty());
    }

    fn distinct_columns() -> impl Strategy<Value = Vec<ColumnRef>> {
        prop::collection::btree_set("[a-h]", 0..8).prop_flat_map(|names| {
            let names = names.into_iter().collect::<Vec<_>>();
            Just(names.into_iter().map(|n| col(&n)).collect::<Vec<_>>()).prop_shuffle()
        })
    }

    proptest! {
        #[test]
        fn restrict_to_preserves_order(
            columns in distinct_columns(),
            keep in prop::collection::btree_set("[a-h]", 0..8),
        ) {
            let keep = keep.iter().map(|n| col(n)).collect::<BTreeSet<_>>();
            let restricted = Assignments::identity(columns.clone()).restrict_to(&keep);
            let expected = columns.into_iter().filter(|c| keep.contains(c)).collect::<Vec<_>>();
            prop_assert_eq!(restricted.outputs().cloned().collect::<Vec<_>>(), expected);
        }
    }
}
