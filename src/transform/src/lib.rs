// Copyright Materialize, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Transformations for logical plans.
//!
//! This crate contains traits, types, and methods suitable for transforming
//! [`LogicalPlan`]s in ways that preserve semantics and improve performance.
//! Local rewrites implement [`Rule`], which inspects a single node and either
//! leaves it alone or proposes a replacement. Rules are driven to a fixed point
//! over a whole plan by [`Fixpoint`], which is itself a [`Transform`]. The
//! [`Optimizer`] strings transforms together according to an
//! [`OptimizerConfig`].

#![forbid(missing_docs)]
#![deny(missing_debug_implementations)]

use std::fmt;
use std::num::NonZeroUsize;

use itertools::Itertools;
use sift_expr::stack::maybe_grow;
use sift_expr::{LogicalPlan, PlanError};
use tracing::{debug, trace};

pub mod config;
pub mod movement;
pub mod rule;

pub use config::OptimizerConfig;
pub use rule::{Rule, RuleResult};

/// Context that gets threaded through all transforms.
#[derive(Debug)]
pub struct TransformCtx<'a> {
    /// The configuration of the optimizer invoking the transform.
    pub config: &'a OptimizerConfig,
}

impl<'a> TransformCtx<'a> {
    /// Creates a context for a single optimizer run.
    pub fn new(config: &'a OptimizerConfig) -> Self {
        TransformCtx { config }
    }
}

/// Types capable of transforming logical plans.
pub trait Transform: fmt::Debug + Send + Sync {
    /// A short name for the transform, used in logs and errors.
    fn name(&self) -> &'static str;

    /// Transform a plan into a functionally equivalent plan.
    ///
    /// On error the plan is left as it was before the call.
    fn transform(
        &self,
        relation: &mut LogicalPlan,
        ctx: &mut TransformCtx,
    ) -> Result<(), TransformError>;
}

/// Errors that can occur during a transformation.
#[derive(Debug, Clone, thiserror::Error)]
pub enum TransformError {
    /// A [`Fixpoint`] kept firing rules after `limit` passes.
    #[error("fixpoint {name} looped too many times (limit {limit})")]
    FixpointLimit {
        /// The name of the fixpoint.
        name: &'static str,
        /// The number of passes that were attempted.
        limit: usize,
    },
    /// A rule proposed a replacement that does not produce the same columns
    /// as the node it replaces.
    #[error("rule {rule} changed the output of {node} from ({expected}) to ({actual})")]
    OutputMismatch {
        /// The rule that proposed the replacement.
        rule: &'static str,
        /// The kind of node that was replaced.
        node: &'static str,
        /// The columns of the original node.
        expected: String,
        /// The columns of the replacement.
        actual: String,
    },
    /// A rewritten plan failed validation.
    #[error("invalid plan: {0}")]
    InvalidPlan(#[from] PlanError),
}

/// A set of rules applied to every node of a plan until none of them fires.
///
/// Each pass visits the plan top-down. At every node the rules are tried in
/// order, and a replacement produced by one rule is what the next rule sees.
/// Children are visited after their parent has been rewritten, so a rule that
/// introduces a new child gets to see it in the same pass.
#[derive(Debug)]
pub struct Fixpoint {
    name: &'static str,
    rules: Vec<Box<dyn Rule>>,
    limit: NonZeroUsize,
}

impl Fixpoint {
    /// Creates a fixpoint that gives up after `limit` passes.
    pub fn new(name: &'static str, rules: Vec<Box<dyn Rule>>, limit: NonZeroUsize) -> Self {
        Fixpoint { name, rules, limit }
    }

    /// Runs one pass over `plan`, counting the rules that fired in `fired`.
    fn rewrite(
        &self,
        mut plan: LogicalPlan,
        fired: &mut usize,
    ) -> Result<LogicalPlan, TransformError> {
        maybe_grow(|| {
            for rule in self.rules.iter() {
                if let RuleResult::Replaced(replacement) = rule.apply(&plan) {
                    let expected = plan.output_columns();
                    let actual = replacement.output_columns();
                    if expected != actual {
                        return Err(TransformError::OutputMismatch {
                            rule: rule.name(),
                            node: plan.name(),
                            expected: expected.iter().join(", "),
                            actual: actual.iter().join(", "),
                        });
                    }
                    debug!(
                        target: "optimizer",
                        rule = rule.name(),
                        node = plan.name(),
                        "rule fired"
                    );
                    *fired += 1;
                    plan = replacement;
                }
            }
            plan.try_map_inputs(|input| self.rewrite(input, fired))
        })
    }
}

impl Transform for Fixpoint {
    fn name(&self) -> &'static str {
        self.name
    }

    #[tracing::instrument(
        target = "optimizer",
        level = "debug",
        skip_all,
        fields(path.segment = self.name)
    )]
    fn transform(
        &self,
        relation: &mut LogicalPlan,
        _ctx: &mut TransformCtx,
    ) -> Result<(), TransformError> {
        let mut plan = relation.clone();
        for pass in 1..=self.limit.get() {
            let mut fired = 0;
            plan = self.rewrite(plan, &mut fired)?;
            trace!(target: "optimizer", pass, fired, "fixpoint pass");
            if fired == 0 {
                *relation = plan;
                return Ok(());
            }
        }
        Err(TransformError::FixpointLimit {
            name: self.name,
            limit: self.limit.get(),
        })
    }
}

/// An optimizer for logical plans.
#[derive(Debug)]
pub struct Optimizer {
    /// The list of transforms to apply to an input plan.
    pub transforms: Vec<Box<dyn Transform>>,
    config: OptimizerConfig,
}

impl Optimizer {
    /// Builds the logical optimizer described by `config`.
    ///
    /// Rules disabled in `config` are left out of the pipeline entirely.
    pub fn logical_optimizer(config: &OptimizerConfig) -> Self {
        let mut rules: Vec<Box<dyn Rule>> = vec![];
        if config.enable_prune_mark_distinct_columns {
            rules.push(Box::new(movement::PruneMarkDistinctColumns));
        }
        let transforms: Vec<Box<dyn Transform>> = vec![Box::new(Fixpoint::new(
            "logical",
            rules,
            config.fixpoint_limit,
        ))];
        Optimizer {
            transforms,
            config: config.clone(),
        }
    }

    /// Optimizes the supplied plan, returning the rewritten plan.
    pub fn optimize(&self, mut relation: LogicalPlan) -> Result<LogicalPlan, TransformError> {
        let mut ctx = TransformCtx::new(&self.config);
        for transform in self.transforms.iter() {
            transform.transform(&mut relation, &mut ctx)?;
            trace!(
                target: "optimizer",
                transform = transform.name(),
                plan = %relation,
                "applied transform"
            );
        }
        Ok(relation)
    }
}

impl Default for Optimizer {
    fn default() -> Self {
        Optimizer::logical_optimizer(&OptimizerConfig::default())
    }
}
