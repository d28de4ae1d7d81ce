// Copyright Materialize, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! EXPLAIN support for [`LogicalPlan`].
//!
//! Each node is rendered on its own line, indented two spaces deeper than its
//! parent:
//!
//! ```text
//! Project (mark)
//!   MarkDistinct mark=mark keys=[key] hash=hash
//!     Values (key, hash, unused)
//! ```

use std::fmt;

use itertools::Itertools;

use crate::stack::maybe_grow;
use crate::LogicalPlan;

impl LogicalPlan {
    /// Renders the plan as multi-line EXPLAIN text.
    pub fn pretty(&self) -> String {
        self.to_string()
    }

    fn fmt_indented(&self, f: &mut fmt::Formatter, depth: usize) -> fmt::Result {
        maybe_grow(|| {
            write!(f, "{:width$}{}", "", self.name(), width = 2 * depth)?;
            match self {
                LogicalPlan::Values(values) => {
                    writeln!(f, " ({})", values.columns().iter().format(", "))?;
                }
                LogicalPlan::Project(project) => {
                    writeln!(f, " ({})", project.assignments())?;
                }
                LogicalPlan::MarkDistinct(mark_distinct) => {
                    write!(
                        f,
                        " mark={} keys=[{}]",
                        mark_distinct.marker(),
                        mark_distinct.keys().iter().format(", ")
                    )?;
                    if let Some(hash) = mark_distinct.hash() {
                        write!(f, " hash={}", hash)?;
                    }
                    writeln!(f)?;
                }
            }
            for child in self.children() {
                child.fmt_indented(f, depth + 1)?;
            }
            Ok(())
        })
    }
}

impl fmt::Display for LogicalPlan {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.fmt_indented(f, 0)
    }
}
