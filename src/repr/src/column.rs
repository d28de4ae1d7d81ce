// Copyright Materialize, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::fmt;

use proptest_derive::Arbitrary;
use serde::{Deserialize, Serialize};

use crate::ScalarType;

/// A typed reference to one output column of a plan node.
///
/// Two references are the same column exactly when their names and types
/// agree; there is no identity beyond the value. Plans refer to columns by
/// reference rather than by position, so that rewrites can add or remove
/// columns without renumbering everything above them.
#[derive(
    Arbitrary, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize,
)]
pub struct ColumnRef {
    #[proptest(regex = "[a-z][a-z0-9_]{0,7}")]
    name: String,
    typ: ScalarType,
}

impl ColumnRef {
    /// Constructs a reference to the column `name` of type `typ`.
    pub fn new(name: impl Into<String>, typ: ScalarType) -> Self {
        ColumnRef {
            name: name.into(),
            typ,
        }
    }

    /// The name of the referenced column.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The type of the referenced column.
    pub fn typ(&self) -> ScalarType {
        self.typ
    }
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn equality_requires_name_and_type() {
        let a = ColumnRef::new("a", ScalarType::Int64);
        assert_eq!(a, ColumnRef::new("a", ScalarType::Int64));
        assert_ne!(a, ColumnRef::new("a", ScalarType::Int32));
        assert_ne!(a, ColumnRef::new("b", ScalarType::Int64));
        assert_eq!(a.to_string(), "a");
    }

    #[test]
    fn serde_uses_plain_fields() {
        let a = ColumnRef::new("mark", ScalarType::Bool);
        let json = serde_json::to_string(&a).unwrap();
        assert_eq!(json, r#"{"name":"mark","typ":"Bool"}"#);
        assert_eq!(serde_json::from_str::<ColumnRef>(&json).unwrap(), a);
    }

    proptest! {
        #[test]
        fn equality_is_by_value(a in any::<ColumnRef>(), b in any::<ColumnRef>()) {
            let same = a.name() == b.name() && a.typ() == b.typ();
            prop_assert_eq!(a == b, same);
            prop_assert_eq!(ColumnRef::new(a.name(), a.typ()), a);
        }
    }
}
