// Copyright Materialize, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Core expression language.
//!
//! This crate defines the logical plans the optimizer rewrites, together with
//! the scalar expressions that appear inside them and the analyses on those
//! expressions (most importantly, which columns an expression reads).

#![warn(missing_debug_implementations)]

mod error;
mod relation;
mod scalar;

pub mod explain;
pub mod stack;

pub use error::PlanError;
pub use relation::assignments::Assignments;
pub use relation::{LogicalPlan, MarkDistinct, Project, Values};
pub use scalar::func::{self, BinaryFunc, UnaryFunc};
pub use scalar::ScalarExpr;
