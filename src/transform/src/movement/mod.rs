// Copyright Materialize, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Transformations that move column demand down the plan.
//!
//! These rules look at which columns a parent actually reads and narrow the
//! nodes beneath it accordingly, either by dropping a node whose only
//! contribution is never read or by inserting a projection below it.

mod prune_mark_distinct_columns;

pub use prune_mark_distinct_columns::PruneMarkDistinctColumns;
