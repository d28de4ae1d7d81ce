// Copyright Materialize, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Local rewrite rules.

use std::fmt;

use sift_expr::LogicalPlan;

/// A local rewrite of a single plan node.
///
/// A rule looks at one node, and possibly at the nodes directly beneath it,
/// and decides whether it can be rewritten. Rules never mutate their input;
/// a rule that fires hands back a replacement that must produce exactly the
/// same output columns, in the same order, as the node it replaces.
pub trait Rule: fmt::Debug + Send + Sync {
    /// A short name for the rule, used in logs and errors.
    fn name(&self) -> &'static str;

    /// Attempts to rewrite `node`.
    fn apply(&self, node: &LogicalPlan) -> RuleResult;
}

/// The outcome of applying a [`Rule`] to a node.
#[must_use]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleResult {
    /// The rule does not apply, or applying it would not change anything.
    Unchanged,
    /// The node should be replaced by the given plan.
    Replaced(LogicalPlan),
}

impl RuleResult {
    /// Reports whether the rule proposed a replacement.
    pub fn fired(&self) -> bool {
        matches!(self, RuleResult::Replaced(_))
    }

    /// Returns the replacement, if any.
    pub fn into_replacement(self) -> Option<LogicalPlan> {
        match self {
            RuleResult::Unchanged => None,
            RuleResult::Replaced(plan) => Some(plan),
        }
    }
}
