// Copyright Materialize, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Optimizer configuration.

use std::num::NonZeroUsize;

use serde::{Deserialize, Serialize};

/// The number of passes a [`crate::Fixpoint`] attempts before giving up.
pub const DEFAULT_FIXPOINT_LIMIT: NonZeroUsize = match NonZeroUsize::new(100) {
    Some(limit) => limit,
    None => unreachable!(),
};

/// Knobs controlling which rules the optimizer runs and how hard it tries.
///
/// Missing fields take their default values when deserializing, so an empty
/// JSON object describes the default configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OptimizerConfig {
    /// Passes attempted by each fixpoint before it reports an error.
    ///
    /// A fixpoint needs at least one pass to notice that nothing fires, so
    /// zero is rejected.
    pub fixpoint_limit: NonZeroUsize,
    /// Whether to run [`crate::movement::PruneMarkDistinctColumns`].
    pub enable_prune_mark_distinct_columns: bool,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        OptimizerConfig {
            fixpoint_limit: DEFAULT_FIXPOINT_LIMIT,
            enable_prune_mark_distinct_columns: true,
        }
    }
}

impl OptimizerConfig {
    /// Parses a configuration from a JSON object.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
