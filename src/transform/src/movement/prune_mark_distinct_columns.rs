// Copyright Materialize, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Prunes unread columns around a `MarkDistinct` that sits beneath a
//! projection.
//!
//! If the projection never reads the marker, the `MarkDistinct` computes
//! nothing anyone needs and is removed. Otherwise, the source is narrowed to
//! the columns that either the projection or the `MarkDistinct` itself reads:
//!
//! ```text
//! Project (mark)                      Project (mark)
//!   MarkDistinct mark=mark keys=[k]     MarkDistinct mark=mark keys=[k]
//!     Values (k, unused)        =>        Project (k)
//!                                           Values (k, unused)
//! ```

use std::collections::BTreeSet;

use sift_expr::{Assignments, LogicalPlan};
use sift_repr::ColumnRef;
use tracing::trace;

use crate::{Rule, RuleResult};

/// Removes a `MarkDistinct` whose marker its parent projection never reads,
/// and otherwise narrows its source to the columns the parent reads plus the
/// distinct keys and the hash column.
#[derive(Debug, Default, Clone, Copy)]
pub struct PruneMarkDistinctColumns;

impl Rule for PruneMarkDistinctColumns {
    fn name(&self) -> &'static str {
        "PruneMarkDistinctColumns"
    }

    fn apply(&self, node: &LogicalPlan) -> RuleResult {
        let LogicalPlan::Project(project) = node else {
            return RuleResult::Unchanged;
        };
        let LogicalPlan::MarkDistinct(mark_distinct) = project.input() else {
            return RuleResult::Unchanged;
        };
        let source = mark_distinct.input();
        let referenced = project.assignments().referenced_columns();

        // Both rewrites below only drop columns nobody reads, so the plan
        // constructors cannot fail.
        if !referenced.contains(mark_distinct.marker()) {
            trace!(
                target: "optimizer",
                marker = %mark_distinct.marker(),
                "removing MarkDistinct with unread marker"
            );
            return RuleResult::Replaced(source.clone().project(project.assignments().clone()));
        }

        let source_outputs = source.output_columns();
        let width = source_outputs.len();
        let required: BTreeSet<ColumnRef> = referenced
            .into_iter()
            .chain(mark_distinct.required_columns())
            .collect();
        let narrowed = Assignments::identity(source_outputs).restrict_to(&required);
        if narrowed.len() == width {
            return RuleResult::Unchanged;
        }
        trace!(
            target: "optimizer",
            before = width,
            after = narrowed.len(),
            "narrowing MarkDistinct source"
        );

        RuleResult::Replaced(
            source
                .clone()
                .project(narrowed)
                .mark_distinct(
                    mark_distinct.marker().clone(),
                    mark_distinct.keys().to_vec(),
                    mark_distinct.hash().cloned(),
                )
                .project(project.assignments().clone()),
        )
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use sift_expr::ScalarExpr;
    use sift_expr_test_util::{
        build_plan, init_logging, mark_distinct, strict_project, values, PlanMatchPattern,
    };
    use sift_repr::ScalarType;

    use super::*;

    fn apply(s: &str) -> RuleResult {
        init_logging();
        let plan = build_plan(s).unwrap();
        PruneMarkDistinctColumns.apply(&plan)
    }

    fn assert_rewrites_to(s: &str, expected: PlanMatchPattern) {
        match apply(s) {
            RuleResult::Replaced(plan) => expected.assert_matches(&plan),
            RuleResult::Unchanged => panic!("rule did not fire on {s}"),
        }
    }

    #[test]
    fn removes_mark_distinct_with_unread_marker() {
        assert_rewrites_to(
            "(project [key2 = key] (mark_distinct mark [key] (values [key unused])))",
            strict_project(&[("key2", "key")], values(&["key", "unused"])),
        );
    }

    #[test]
    fn narrows_source_to_keys_and_hash() {
        assert_rewrites_to(
            "(project [mark] (mark_distinct mark [key] hash (values [key hash unused])))",
            strict_project(
                &[("mark", "mark")],
                mark_distinct(
                    "mark",
                    &["key"],
                    Some("hash"),
                    strict_project(
                        &[("key", "key"), ("hash", "hash")],
                        values(&["key", "hash", "unused"]),
                    ),
                ),
            ),
        );
    }

    #[test]
    fn keeps_columns_read_by_parent() {
        assert_rewrites_to(
            "(project [flagged = (and mark (gt other 0))]
               (mark_distinct mark [key] (values [key other unused])))",
            strict_project(
                &[("flagged", "(mark AND (other > 0))")],
                mark_distinct(
                    "mark",
                    &["key"],
                    None,
                    strict_project(
                        &[("key", "key"), ("other", "other")],
                        values(&["key", "other", "unused"]),
                    ),
                ),
            ),
        );
    }

    #[test]
    fn narrowed_source_keeps_source_order() {
        assert_rewrites_to(
            "(project [mark, c] (mark_distinct mark [a] (values [c b a])))",
            strict_project(
                &[("mark", "mark"), ("c", "c")],
                mark_distinct(
                    "mark",
                    &["a"],
                    None,
                    strict_project(&[("c", "c"), ("a", "a")], values(&["c", "b", "a"])),
                ),
            ),
        );
    }

    #[test]
    fn no_change_when_source_is_minimal() {
        assert_eq!(
            apply("(project [mark] (mark_distinct mark [key] (values [key])))"),
            RuleResult::Unchanged
        );
        assert_eq!(
            apply("(project [key, mark] (mark_distinct mark [key] (values [key])))"),
            RuleResult::Unchanged
        );
    }

    #[test]
    fn no_change_on_other_shapes() {
        assert_eq!(
            apply("(mark_distinct mark [key] (values [key unused]))"),
            RuleResult::Unchanged
        );
        assert_eq!(apply("(project [a] (values [a b]))"), RuleResult::Unchanged);
        assert_eq!(
            apply("(project [a] (project [a, mark] (mark_distinct mark [a] (values [a b]))))"),
            RuleResult::Unchanged
        );
    }

    /// A `MarkDistinct` over `Values (c0, ..)` beneath a projection that reads
    /// an arbitrary subset of the `MarkDistinct` outputs, some of them through
    /// a computed column.
    fn arb_plan() -> impl Strategy<Value = LogicalPlan> {
        (1usize..6)
            .prop_flat_map(|width| {
                let columns: Vec<ColumnRef> = (0..width)
                    .map(|i| ColumnRef::new(format!("c{i}"), ScalarType::Int64))
                    .collect();
                (
                    Just(columns.clone()),
                    prop::sample::subsequence(columns.clone(), 1..=width),
                    prop::option::of(prop::sample::select(columns.clone())),
                    prop::sample::subsequence(columns.clone(), 0..=width),
                    prop::sample::subsequence(columns, 0..=width),
                    any::<bool>(),
                )
            })
            .prop_map(|(columns, keys, hash, passed, summed, marker_read)| {
                let marker = ColumnRef::new("mark", ScalarType::Bool);
                let mut entries: Vec<(ColumnRef, ScalarExpr)> = passed
                    .into_iter()
                    .map(|c| (c.clone(), ScalarExpr::column(c)))
                    .collect();
                if let Some(sum) = summed.into_iter().map(ScalarExpr::column).reduce(|a, b| {
                    a.call_binary(b, sift_expr::BinaryFunc::Add)
                }) {
                    entries.push((ColumnRef::new("sum", ScalarType::Int64), sum));
                }
                if marker_read {
                    entries.push((marker.clone(), ScalarExpr::column(marker.clone())));
                }
                LogicalPlan::values(columns)
                    .mark_distinct(marker, keys, hash)
                    .project(Assignments::of(entries))
            })
    }

    fn parts(plan: &LogicalPlan) -> (&sift_expr::Project, &sift_expr::MarkDistinct) {
        match plan {
            LogicalPlan::Project(project) => match project.input() {
                LogicalPlan::MarkDistinct(mark_distinct) => (project, mark_distinct),
                other => panic!("expected MarkDistinct, found {}", other.name()),
            },
            other => panic!("expected Project, found {}", other.name()),
        }
    }

    proptest! {
        #[test]
        fn preserves_outputs(plan in arb_plan()) {
            if let RuleResult::Replaced(rewritten) = PruneMarkDistinctColumns.apply(&plan) {
                prop_assert_eq!(rewritten.output_columns(), plan.output_columns());
            }
        }

        #[test]
        fn unread_marker_removes_mark_distinct(plan in arb_plan()) {
            let (project, mark_distinct) = parts(&plan);
            prop_assume!(!project.assignments().referenced_columns().contains(mark_distinct.marker()));
            let expected = mark_distinct.input().clone().project(project.assignments().clone());
            prop_assert_eq!(PruneMarkDistinctColumns.apply(&plan), RuleResult::Replaced(expected));
        }

        #[test]
        fn read_marker_keeps_required_columns(plan in arb_plan()) {
            let (project, mark_distinct) = parts(&plan);
            let referenced = project.assignments().referenced_columns();
            prop_assume!(referenced.contains(mark_distinct.marker()));
            let source_outputs = mark_distinct.input().output_columns();
            let required: Vec<ColumnRef> = source_outputs
                .iter()
                .filter(|c| referenced.contains(*c) || mark_distinct.required_columns().contains(*c))
                .cloned()
                .collect();
            match PruneMarkDistinctColumns.apply(&plan) {
                RuleResult::Unchanged => prop_assert_eq!(required, source_outputs),
                RuleResult::Replaced(rewritten) => {
                    let (_, narrowed) = parts(&rewritten);
                    prop_assert_eq!(narrowed.marker(), mark_distinct.marker());
                    prop_assert_eq!(narrowed.keys(), mark_distinct.keys());
                    prop_assert_eq!(narrowed.hash(), mark_distinct.hash());
                    prop_assert_eq!(narrowed.input().output_columns(), required);
                }
            }
        }

        #[test]
        fn second_application_is_a_no_op(plan in arb_plan()) {
            if let RuleResult::Replaced(rewritten) = PruneMarkDistinctColumns.apply(&plan) {
                prop_assert_eq!(PruneMarkDistinctColumns.apply(&rewritten), RuleResult::Unchanged);
            }
        }
    }
}
