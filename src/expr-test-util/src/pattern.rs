// Copyright Materialize, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Structural matching of plans.
//!
//! A [`PlanMatchPattern`] describes the expected shape of a plan. Columns are
//! written as `name` or `name:type`: a bare name matches a column of that name
//! and any type, while `a:text` also requires the type to be `text`.
//! Expressions are compared by their EXPLAIN rendering, so tests can state
//! expectations without rebuilding typed expressions.

use std::collections::BTreeSet;

use itertools::Itertools;

use sift_expr::LogicalPlan;
use sift_repr::{ColumnRef, ScalarType};

/// Reports whether `column` matches `spec`, which is `name` or `name:type`.
fn column_matches(spec: &str, column: &ColumnRef) -> bool {
    match spec.split_once(':') {
        Some((name, typ)) => {
            column.name() == name && typ.parse::<ScalarType>() == Ok(column.typ())
        }
        None => column.name() == spec,
    }
}

fn columns_match(specs: &[String], columns: &[ColumnRef]) -> bool {
    specs.len() == columns.len()
        && specs
            .iter()
            .zip_eq(columns)
            .all(|(spec, column)| column_matches(spec, column))
}

fn describe(columns: &[ColumnRef]) -> String {
    columns
        .iter()
        .map(|c| format!("{}:{}", c, c.typ()))
        .join(", ")
}

/// The expected shape of a plan.
#[derive(Clone, Debug)]
pub enum PlanMatchPattern {
    /// Matches any subtree.
    Any,
    /// A leaf with exactly these output columns, in order.
    Values { columns: Vec<String> },
    /// A projection that has each of `assignments`. If `strict`, it must have
    /// no other assignments.
    Project {
        assignments: Vec<(String, String)>,
        strict: bool,
        input: Box<PlanMatchPattern>,
    },
    /// A mark-distinct node with exactly these attributes.
    MarkDistinct {
        marker: String,
        keys: Vec<String>,
        hash: Option<String>,
        input: Box<PlanMatchPattern>,
    },
}

pub fn any() -> PlanMatchPattern {
    PlanMatchPattern::Any
}

pub fn values(columns: &[&str]) -> PlanMatchPattern {
    PlanMatchPattern::Values {
        columns: columns.iter().map(|c| c.to_string()).collect(),
    }
}

/// A projection containing at least `assignments`, given as
/// `(output, expression)` pairs.
pub fn project(assignments: &[(&str, &str)], input: PlanMatchPattern) -> PlanMatchPattern {
    build_project(assignments, false, input)
}

/// A projection containing exactly `assignments`.
pub fn strict_project(assignments: &[(&str, &str)], input: PlanMatchPattern) -> PlanMatchPattern {
    build_project(assignments, true, input)
}

fn build_project(
    assignments: &[(&str, &str)],
    strict: bool,
    input: PlanMatchPattern,
) -> PlanMatchPattern {
    PlanMatchPattern::Project {
        assignments: assignments
            .iter()
            .map(|(c, e)| (c.to_string(), e.to_string()))
            .collect(),
        strict,
        input: Box::new(input),
    }
}

pub fn mark_distinct(
    marker: &str,
    keys: &[&str],
    hash: Option<&str>,
    input: PlanMatchPattern,
) -> PlanMatchPattern {
    PlanMatchPattern::MarkDistinct {
        marker: marker.to_string(),
        keys: keys.iter().map(|k| k.to_string()).collect(),
        hash: hash.map(|h| h.to_string()),
        input: Box::new(input),
    }
}

impl PlanMatchPattern {
    /// Checks `plan` against the pattern, describing the first mismatch.
    pub fn matches(&self, plan: &LogicalPlan) -> Result<(), String> {
        match (self, plan) {
            (PlanMatchPattern::Any, _) => Ok(()),
            (PlanMatchPattern::Values { columns }, LogicalPlan::Values(v)) => {
                if !columns_match(columns, v.columns()) {
                    return Err(format!(
                        "expected Values ({}), found Values ({})",
                        columns.iter().format(", "),
                        describe(v.columns())
                    ));
                }
                Ok(())
            }
            (
                PlanMatchPattern::Project {
                    assignments,
                    strict,
                    input,
                },
                LogicalPlan::Project(p),
            ) => {
                for (column, expected) in assignments {
                    let actual = p
                        .assignments()
                        .iter()
                        .find(|(c, _)| column_matches(column, c))
                        .map(|(_, e)| e.to_string());
                    match actual {
                        None => return Err(format!("Project ({}) has no column {}", p.assignments(), column)),
                        Some(actual) if actual != *expected => {
                            return Err(format!(
                                "expected {} = {}, found {} = {}",
                                column, expected, column, actual
                            ))
                        }
                        Some(_) => {}
                    }
                }
                if *strict {
                    let expected = assignments.iter().map(|(c, _)| &c[..]).collect::<BTreeSet<_>>();
                    let all_expected = p
                        .assignments()
                        .outputs()
                        .all(|c| assignments.iter().any(|(spec, _)| column_matches(spec, c)));
                    if !all_expected || assignments.len() != p.assignments().len() {
                        return Err(format!(
                            "expected exactly Project ({}), found Project ({})",
                            expected.iter().format(", "),
                            p.assignments()
                        ));
                    }
                }
                input.matches(p.input())
            }
            (
                PlanMatchPattern::MarkDistinct {
                    marker,
                    keys,
                    hash,
                    input,
                },
                LogicalPlan::MarkDistinct(m),
            ) => {
                let hash_matches = match (hash, m.hash()) {
                    (Some(spec), Some(actual)) => column_matches(spec, actual),
                    (None, None) => true,
                    _ => false,
                };
                if !column_matches(marker, m.marker())
                    || !columns_match(keys, m.keys())
                    || !hash_matches
                {
                    return Err(format!(
                        "expected MarkDistinct mark={} keys=[{}] hash={:?}, found {}",
                        marker,
                        keys.iter().format(", "),
                        hash,
                        plan.pretty().lines().next().unwrap_or_default()
                    ));
                }
                input.matches(m.input())
            }
            (pattern, plan) => Err(format!(
                "expected {}, found {}",
                pattern.name(),
                plan.pretty().lines().next().unwrap_or_default()
            )),
        }
    }

    /// Panics with both plans rendered if `plan` does not match.
    pub fn assert_matches(&self, plan: &LogicalPlan) {
        if let Err(e) = self.matches(plan) {
            panic!("plan does not match pattern: {}\n{}", e, plan.pretty());
        }
    }

    fn name(&self) -> &'static str {
        match self {
            PlanMatchPattern::Any => "any plan",
            PlanMatchPattern::Values { .. } => "Values",
            PlanMatchPattern::Project { .. } => "Project",
            PlanMatchPattern::MarkDistinct { .. } => "MarkDistinct",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build_plan;

    #[test]
    fn test_strictness() {
        let plan = build_plan("(project [x = a, b] (values [a b]))").unwrap();
        project(&[("x", "a")], any()).assert_matches(&plan);
        strict_project(&[("b", "b"), ("x", "a")], values(&["a", "b"])).assert_matches(&plan);
        assert_eq!(
            strict_project(&[("x", "a")], any()).matches(&plan),
            Err("expected exactly Project (x), found Project (x = a, b)".to_string())
        );
        assert_eq!(
            project(&[("x", "b")], any()).matches(&plan),
            Err("expected x = b, found x = a".to_string())
        );
    }

    #[test]
    fn test_mismatches() {
        let plan = build_plan("(mark_distinct m [a] h (values [a h]))").unwrap();
        mark_distinct("m", &["a"], Some("h"), values(&["a", "h"])).assert_matches(&plan);
        assert!(mark_distinct("m", &["a"], None, any()).matches(&plan).is_err());
        assert!(mark_distinct("m", &["a"], Some("h"), values(&["h", "a"])).matches(&plan).is_err());
        assert_eq!(
            values(&["a"]).matches(&plan),
            Err("expected Values, found MarkDistinct mark=m keys=[a] hash=h".to_string())
        );
    }

    #[test]
    fn test_typed_columns() {
        let plan = build_plan("(project [x = b] (mark_distinct m [a] (values [a b:text])))").unwrap();
        strict_project(
            &[("x:text", "b")],
            mark_distinct("m:boolean", &["a:bigint"], None, values(&["a", "b:text"])),
        )
        .assert_matches(&plan);
        assert_eq!(
            project(&[("x", "b")], mark_distinct("m", &["a"], None, values(&["a", "b:bigint"])))
                .matches(&plan),
            Err("expected Values (a, b:bigint), found Values (a:bigint, b:text)".to_string())
        );
        assert!(strict_project(&[("x:bigint", "b")], any()).matches(&plan).is_err());
        assert!(project(&[("x", "b")], mark_distinct("m:text", &["a"], None, any()))
            .matches(&plan)
            .is_err());
        assert!(project(&[("x", "b")], mark_distinct("m", &["a:text"], None, any()))
            .matches(&plan)
            .is_err());
    }
}
