// Copyright Materialize, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Logical plans.
//!
//! A plan is a tree of [`LogicalPlan`] nodes. Each node owns its inputs and is
//! immutable once built: its constructor checks the node's invariants against
//! the columns its input produces, so a node that exists is a valid node.
//! Rewrites never patch a node in place; they build a replacement subtree.

use std::collections::BTreeSet;
use std::fmt;
use std::hash::{Hash, Hasher};

use itertools::Itertools;
use serde::{Serialize, Serializer};

use sift_repr::ColumnRef;

use crate::stack::maybe_grow;
use crate::PlanError;

pub mod assignments;

use self::assignments::Assignments;

/// A logical query plan.
///
/// The set of node kinds is closed; code that inspects plans matches on it
/// exhaustively.
///
/// The standard traits are implemented by hand so that they grow the stack
/// as they recurse, and dropping a plan unlinks its inputs iteratively.
pub enum LogicalPlan {
    /// A leaf that produces a fixed list of columns.
    Values(Values),
    /// Computes new columns from the columns of its input.
    Project(Project),
    /// Flags the first occurrence of each distinct combination of key values.
    MarkDistinct(MarkDistinct),
}

/// A leaf node.
///
/// Rows are never inspected by the optimizer, so only the columns are kept.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize)]
pub struct Values {
    columns: Vec<ColumnRef>,
}

impl Values {
    /// The columns produced, in order.
    pub fn columns(&self) -> &[ColumnRef] {
        &self.columns
    }
}

/// A projection.
///
/// The outputs are exactly the keys of `assignments`, in order.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize)]
pub struct Project {
    input: Box<LogicalPlan>,
    assignments: Assignments,
}

impl Project {
    pub fn input(&self) -> &LogicalPlan {
        &self.input
    }

    pub fn assignments(&self) -> &Assignments {
        &self.assignments
    }
}

/// Passes its input through and appends a `marker` column.
///
/// The marker is true for the first row seen with each distinct combination
/// of values in `keys`, and false for every repeat. It is how several
/// `DISTINCT` aggregates with different arguments are evaluated over one
/// scan of the input. `hash`, if present, names an input column that holds a
/// precomputed hash of the keys.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize)]
pub struct MarkDistinct {
    input: Box<LogicalPlan>,
    marker: ColumnRef,
    keys: Vec<ColumnRef>,
    hash: Option<ColumnRef>,
}

impl MarkDistinct {
    pub fn input(&self) -> &LogicalPlan {
        &self.input
    }

    pub fn marker(&self) -> &ColumnRef {
        &self.marker
    }

    /// The columns whose values define distinctness, in order. Never empty.
    pub fn keys(&self) -> &[ColumnRef] {
        &self.keys
    }

    pub fn hash(&self) -> Option<&ColumnRef> {
        self.hash.as_ref()
    }

    /// The input columns the operator itself reads: the keys and the hash.
    pub fn required_columns(&self) -> BTreeSet<ColumnRef> {
        self.keys.iter().chain(self.hash.iter()).cloned().collect()
    }
}

impl LogicalPlan {
    /// A leaf producing `columns`.
    ///
    /// # Panics
    ///
    /// Panics if a column is listed twice.
    pub fn values<I>(columns: I) -> Self
    where
        I: IntoIterator<Item = ColumnRef>,
    {
        Self::try_values(columns).unwrap_or_else(|e| panic!("invalid plan: {}", e))
    }

    /// Like [`LogicalPlan::values`], but reports violations as errors.
    pub fn try_values<I>(columns: I) -> Result<Self, PlanError>
    where
        I: IntoIterator<Item = ColumnRef>,
    {
        let columns = columns.into_iter().collect::<Vec<_>>();
        if let Some(column) = columns.iter().duplicates().next() {
            return Err(PlanError::DuplicateOutput {
                column: column.clone(),
                node: "Values",
            });
        }
        Ok(LogicalPlan::Values(Values { columns }))
    }

    /// Projects `self` through `assignments`.
    ///
    /// # Panics
    ///
    /// Panics if an assigned expression reads a column `self` does not
    /// produce.
    pub fn project(self, assignments: Assignments) -> Self {
        self.try_project(assignments)
            .unwrap_or_else(|e| panic!("invalid plan: {}", e))
    }

    /// Like [`LogicalPlan::project`], but reports violations as errors.
    pub fn try_project(self, assignments: Assignments) -> Result<Self, PlanError> {
        let available = self.output_columns().into_iter().collect::<BTreeSet<_>>();
        if let Some(column) = assignments
            .referenced_columns()
            .into_iter()
            .find(|c| !available.contains(c))
        {
            return Err(PlanError::UnknownColumn {
                column,
                node: "Project",
            });
        }
        Ok(LogicalPlan::Project(Project {
            input: Box::new(self),
            assignments,
        }))
    }

    /// Marks the rows of `self` that are distinct on `keys`.
    ///
    /// # Panics
    ///
    /// Panics if `keys` is empty, if `keys` or `hash` name columns `self`
    /// does not produce, or if `marker` is already a column of `self`.
    pub fn mark_distinct(
        self,
        marker: ColumnRef,
        keys: Vec<ColumnRef>,
        hash: Option<ColumnRef>,
    ) -> Self {
        self.try_mark_distinct(marker, keys, hash)
            .unwrap_or_else(|e| panic!("invalid plan: {}", e))
    }

    /// Like [`LogicalPlan::mark_distinct`], but reports violations as errors.
    pub fn try_mark_distinct(
        self,
        marker: ColumnRef,
        keys: Vec<ColumnRef>,
        hash: Option<ColumnRef>,
    ) -> Result<Self, PlanError> {
        let available = self.output_columns().into_iter().collect::<BTreeSet<_>>();
        if available.contains(&marker) {
            return Err(PlanError::MarkerCollision(marker));
        }
        if keys.is_empty() {
            return Err(PlanError::EmptyDistinctKeys);
        }
        if let Some(column) = keys.iter().find(|c| !available.contains(*c)) {
            return Err(PlanError::UnknownColumn {
                column: column.clone(),
                node: "MarkDistinct",
            });
        }
        if let Some(hash) = hash.as_ref().filter(|h| !available.contains(*h)) {
            return Err(PlanError::UnknownHashColumn(hash.clone()));
        }
        Ok(LogicalPlan::MarkDistinct(MarkDistinct {
            input: Box::new(self),
            marker,
            keys,
            hash,
        }))
    }

    /// The name of the node kind, as it appears in EXPLAIN output.
    pub fn name(&self) -> &'static str {
        match self {
            LogicalPlan::Values(_) => "Values",
            LogicalPlan::Project(_) => "Project",
            LogicalPlan::MarkDistinct(_) => "MarkDistinct",
        }
    }

    /// The columns this node produces, in order.
    ///
    /// This is computed by walking down the plan until a node that lists its
    /// columns, so it should not be called in a loop over a deep plan.
    pub fn output_columns(&self) -> Vec<ColumnRef> {
        match self {
            LogicalPlan::Values(values) => values.columns.clone(),
            LogicalPlan::Project(project) => project.assignments.outputs().cloned().collect(),
            LogicalPlan::MarkDistinct(mark_distinct) => maybe_grow(|| {
                let mut columns = mark_distinct.input.output_columns();
                columns.push(mark_distinct.marker.clone());
                columns
            }),
        }
    }

    /// The direct inputs of this node, in order.
    pub fn children(&self) -> impl Iterator<Item = &LogicalPlan> {
        let input = match self {
            LogicalPlan::Values(_) => None,
            LogicalPlan::Project(project) => Some(&*project.input),
            LogicalPlan::MarkDistinct(mark_distinct) => Some(&*mark_distinct.input),
        };
        input.into_iter()
    }

    /// Pre-order visitor for each node in the plan.
    pub fn visit_pre<'a, F>(&'a self, f: &mut F)
    where
        F: FnMut(&'a Self),
    {
        maybe_grow(|| {
            f(self);
            for child in self.children() {
                child.visit_pre(f);
            }
        })
    }

    /// The number of nodes on the longest path from `self` to a leaf.
    pub fn depth(&self) -> usize {
        maybe_grow(|| 1 + self.children().map(|c| c.depth()).max().unwrap_or(0))
    }

    /// Rebuilds this node over the result of applying `f` to each of its
    /// inputs.
    ///
    /// The node's own attributes are kept and re-validated against the new
    /// inputs, so a replacement input that drops a column this node needs is
    /// reported as an error rather than producing an invalid plan.
    pub fn try_map_inputs<F, E>(mut self, mut f: F) -> Result<Self, E>
    where
        F: FnMut(LogicalPlan) -> Result<LogicalPlan, E>,
        E: From<PlanError>,
    {
        // Fields are taken rather than moved out, as `LogicalPlan` implements
        // `Drop`.
        let rebuilt = match &mut self {
            LogicalPlan::Values(_) => None,
            LogicalPlan::Project(project) => {
                let input = f(project.input.take_dangerous())?;
                Some(input.try_project(std::mem::take(&mut project.assignments)))
            }
            LogicalPlan::MarkDistinct(mark_distinct) => {
                let input = f(mark_distinct.input.take_dangerous())?;
                Some(input.try_mark_distinct(
                    mark_distinct.marker.clone(),
                    std::mem::take(&mut mark_distinct.keys),
                    mark_distinct.hash.take(),
                ))
            }
        };
        match rebuilt {
            None => Ok(self),
            Some(rebuilt) => Ok(rebuilt?),
        }
    }

    /// Takes the plan out of `self`, leaving an empty `Values` behind.
    ///
    /// The placeholder does not satisfy the invariants of whatever node owned
    /// `self`, so that node must be discarded afterwards.
    fn take_dangerous(&mut self) -> LogicalPlan {
        std::mem::replace(self, LogicalPlan::Values(Values { columns: vec![] }))
    }

    /// Detaches the input of this node, if it has one.
    fn take_input(&mut self) -> Option<LogicalPlan> {
        match self {
            LogicalPlan::Values(_) => None,
            LogicalPlan::Project(project) => Some(project.input.take_dangerous()),
            LogicalPlan::MarkDistinct(mark_distinct) => {
                Some(mark_distinct.input.take_dangerous())
            }
        }
    }
}

impl Drop for LogicalPlan {
    fn drop(&mut self) {
        let mut detached = self.take_input().into_iter().collect::<Vec<_>>();
        while let Some(mut plan) = detached.pop() {
            detached.extend(plan.take_input());
        }
    }
}

impl Clone for LogicalPlan {
    fn clone(&self) -> Self {
        maybe_grow(|| match self {
            LogicalPlan::Values(values) => LogicalPlan::Values(values.clone()),
            LogicalPlan::Project(project) => LogicalPlan::Project(project.clone()),
            LogicalPlan::MarkDistinct(mark_distinct) => {
                LogicalPlan::MarkDistinct(mark_distinct.clone())
            }
        })
    }
}

impl PartialEq for LogicalPlan {
    fn eq(&self, other: &Self) -> bool {
        maybe_grow(|| match (self, other) {
            (LogicalPlan::Values(a), LogicalPlan::Values(b)) => a == b,
            (LogicalPlan::Project(a), LogicalPlan::Project(b)) => a == b,
            (LogicalPlan::MarkDistinct(a), LogicalPlan::MarkDistinct(b)) => a == b,
            _ => false,
        })
    }
}

impl Eq for LogicalPlan {}

impl Hash for LogicalPlan {
    fn hash<H: Hasher>(&self, state: &mut H) {
        maybe_grow(|| {
            std::mem::discriminant(self).hash(state);
            match self {
                LogicalPlan::Values(values) => values.hash(state),
                LogicalPlan::Project(project) => project.hash(state),
                LogicalPlan::MarkDistinct(mark_distinct) => Hash::hash(mark_distinct, state),
            }
        })
    }
}

impl fmt::Debug for LogicalPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        maybe_grow(|| match self {
            LogicalPlan::Values(values) => f.debug_tuple("Values").field(values).finish(),
            LogicalPlan::Project(project) => f.debug_tuple("Project").field(project).finish(),
            LogicalPlan::MarkDistinct(mark_distinct) => {
                f.debug_tuple("MarkDistinct").field(mark_distinct).finish()
            }
        })
    }
}

/// Serializes as an externally tagged enum, e.g. `{"Values": {"columns": [..]}}`.
impl Serialize for LogicalPlan {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        maybe_grow(|| match self {
            LogicalPlan::Values(values) => {
                serializer.serialize_newtype_variant("LogicalPlan", 0, "Values", values)
            }
            LogicalPlan::Project(project) => {
                serializer.serialize_newtype_variant("LogicalPlan", 1, "Project", project)
            }
            LogicalPlan::MarkDistinct(mark_distinct) => serializer.serialize_newtype_variant(
                "LogicalPlan",
                2,
                "MarkDistinct",
                mark_distinct,
            ),
        })
    }
}

#[cfg(test)]
mod tests {
    use sift_repr::ScalarType;

    use super::*;
    use crate::ScalarExpr;

    fn col(name: &str) -> ColumnRef {
        ColumnRef::new(name, ScalarType::Int64)
    }

    #[test]
    fn test_output_columns() {
        let values = LogicalPlan::values([col("key"), col("hash"), col("unused")]);
        assert_eq!(values.output_columns(), vec![col("key"), col("hash"), col("unused")]);

        let marker = ColumnRef::new("mark", ScalarType::Bool);
        let mark_distinct = values.mark_distinct(marker.clone(), vec![col("key")], Some(col("hash")));
        assert_eq!(
            mark_distinct.output_columns(),
            vec![col("key"), col("hash"), col("unused"), marker.clone()]
        );

        let project = mark_distinct.project(Assignments::of([
            (marker.clone(), ScalarExpr::column(marker.clone())),
            (col("key2"), ScalarExpr::column(col("key"))),
        ]));
        assert_eq!(project.output_columns(), vec![marker, col("key2")]);
        assert_eq!(project.depth(), 3);
        assert_eq!(project.children().count(), 1);

        let mut names = vec![];
        project.visit_pre(&mut |node| names.push(node.name()));
        assert_eq!(names, vec!["Project", "MarkDistinct", "Values"]);
    }

    #[test]
    fn test_invalid_values() {
        assert_eq!(
            LogicalPlan::try_values([col("a"), col("b"), col("a")]),
            Err(PlanError::DuplicateOutput {
                column: col("a"),
                node: "Values",
            })
        );
    }

    #[test]
    fn test_invalid_project() {
        let err = LogicalPlan::values([col("a")])
            .try_project(Assignments::of([(col("x"), ScalarExpr::column(col("b")))]))
            .unwrap_err();
        assert_eq!(
            err,
            PlanError::UnknownColumn {
                column: col("b"),
                node: "Project",
            }
        );
        // The output column may shadow an input column of a different type.
        LogicalPlan::values([col("a")]).project(Assignments::of([(
            ColumnRef::new("a", ScalarType::Int32),
            ScalarExpr::column(col("a")),
        )]));
    }

    #[test]
    fn test_invalid_mark_distinct() {
        let input = || LogicalPlan::values([col("key"), col("other")]);
        let marker = ColumnRef::new("mark", ScalarType::Bool);
        assert_eq!(
            input().try_mark_distinct(col("other"), vec![col("key")], None),
            Err(PlanError::MarkerCollision(col("other")))
        );
        assert_eq!(
            input().try_mark_distinct(marker.clone(), vec![], None),
            Err(PlanError::EmptyDistinctKeys)
        );
        assert_eq!(
            input().try_mark_distinct(marker.clone(), vec![col("key"), col("missing")], None),
            Err(PlanError::UnknownColumn {
                column: col("missing"),
                node: "MarkDistinct",
            })
        );
        assert_eq!(
            input().try_mark_distinct(marker, vec![col("key")], Some(col("hash"))),
            Err(PlanError::UnknownHashColumn(col("hash")))
        );
    }

    #[test]
    #[should_panic(expected = "invalid plan: marker column key is already produced")]
    fn test_mark_distinct_panics() {
        LogicalPlan::values([col("key")]).mark_distinct(col("key"), vec![col("key")], None);
    }

    #[test]
    fn test_try_map_inputs_revalidates() {
        let marker = ColumnRef::new("mark", ScalarType::Bool);
        let plan = LogicalPlan::values([col("key"), col("unused")]).mark_distinct(
            marker.clone(),
            vec![col("key")],
            None,
        );

        let narrowed = plan
            .clone()
            .try_map_inputs(|input| Ok::<_, PlanError>(input.project(Assignments::identity([col("key")]))))
            .unwrap();
        assert_eq!(narrowed.output_columns(), vec![col("key"), marker]);

        let err = plan
            .try_map_inputs(|_| Ok::<_, PlanError>(LogicalPlan::values([col("unused")])))
            .unwrap_err();
        assert_eq!(
            err,
            PlanError::UnknownColumn {
                column: col("key"),
                node: "MarkDistinct",
            }
        );
    }

    /// `depth` identity projections stacked on `Values (a)`.
    fn deep_plan(depth: usize) -> LogicalPlan {
        (0..depth).fold(LogicalPlan::values([col("a")]), |plan, _| {
            plan.project(Assignments::identity([col("a")]))
        })
    }

    fn hash_of(plan: &LogicalPlan) -> u64 {
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        plan.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn test_deep_plans() {
        let plan = deep_plan(50_000);
        assert_eq!(plan.depth(), 50_001);
        assert_eq!(plan.output_columns(), vec![col("a")]);
        let mut nodes = 0;
        plan.visit_pre(&mut |_| nodes += 1);
        assert_eq!(nodes, 50_001);

        let copy = plan.clone();
        assert!(copy == plan);
        assert_eq!(hash_of(&copy), hash_of(&plan));

        fn rebuild(plan: LogicalPlan) -> Result<LogicalPlan, PlanError> {
            maybe_grow(|| plan.try_map_inputs(rebuild))
        }
        assert!(rebuild(copy).unwrap() == plan);

        let json = serde_json::to_string(&plan).unwrap();
        assert_eq!(json.matches("\"Project\"").count(), 50_000);
    }

    #[test]
    fn test_deep_mark_distinct_outputs() {
        let markers = (0..500)
            .map(|i| ColumnRef::new(format!("m{i}"), ScalarType::Bool))
            .collect::<Vec<_>>();
        let plan = markers
            .iter()
            .fold(LogicalPlan::values([col("a")]), |plan, marker| {
                plan.mark_distinct(marker.clone(), vec![col("a")], None)
            });
        let mut expected = vec![col("a")];
        expected.extend(markers);
        assert_eq!(plan.output_columns(), expected);
    }

    #[test]
    fn test_serialize() {
        let marker = ColumnRef::new("mark", ScalarType::Bool);
        let plan = LogicalPlan::values([col("key"), col("hash")])
            .mark_distinct(marker.clone(), vec![col("key")], Some(col("hash")))
            .project(Assignments::identity([marker]));
        assert_eq!(
            serde_json::to_string(&plan).unwrap(),
            concat!(
                r#"{"Project":{"input":{"MarkDistinct":{"input":{"Values":{"columns":["#,
                r#"{"name":"key","typ":"Int64"},{"name":"hash","typ":"Int64"}]}},"#,
                r#""marker":{"name":"mark","typ":"Bool"},"keys":[{"name":"key","typ":"Int64"}],"#,
                r#""hash":{"name":"hash","typ":"Int64"}}},"assignments":[[{"name":"mark","typ":"Bool"},"#,
                r#"{"Column":{"name":"mark","typ":"Bool"}}]]}}"#
            )
        );
    }
}
