// Copyright Materialize, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Utilities for building and checking plans in tests.
//!
//! Plans are written in a small s-expression syntax and checked against
//! [`PlanMatchPattern`]s, which compare plans structurally rather than by
//! exact equality.

use tracing_subscriber::EnvFilter;

mod builder;
mod pattern;

pub use builder::{build_plan, build_scalar};
pub use pattern::{any, mark_distinct, project, strict_project, values, PlanMatchPattern};

/// Installs a `tracing` subscriber that writes to the test harness's captured
/// output, filtered by `RUST_LOG`.
///
/// Calling this more than once is harmless.
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
