// Copyright Materialize, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::fmt;
use std::str::FromStr;

use proptest_derive::Arbitrary;
use serde::{Deserialize, Serialize};

/// The type of a [`Datum`].
#[derive(
    Arbitrary, Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize,
)]
pub enum ScalarType {
    /// The type of [`Datum::True`] and [`Datum::False`].
    Bool,
    /// The type of [`Datum::Int32`].
    Int32,
    /// The type of [`Datum::Int64`].
    Int64,
    /// The type of [`Datum::Float64`].
    Float64,
    /// The type of [`Datum::String`].
    String,
    /// A calendar date.
    ///
    /// Only ever the type of columns; there is no literal syntax for dates.
    Date,
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ScalarType::Bool => "boolean",
            ScalarType::Int32 => "integer",
            ScalarType::Int64 => "bigint",
            ScalarType::Float64 => "double",
            ScalarType::String => "text",
            ScalarType::Date => "date",
        })
    }
}

/// The error returned when a type name does not name a [`ScalarType`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid scalar type: {0}")]
pub struct InvalidScalarType(pub String);

impl FromStr for ScalarType {
    type Err = InvalidScalarType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "bool" | "boolean" => Ok(ScalarType::Bool),
            "int" | "int4" | "int32" | "integer" => Ok(ScalarType::Int32),
            "int8" | "int64" | "bigint" => Ok(ScalarType::Int64),
            "float8" | "float64" | "double" => Ok(ScalarType::Float64),
            "text" | "string" | "varchar" => Ok(ScalarType::String),
            "date" => Ok(ScalarType::Date),
            _ => Err(InvalidScalarType(s.to_string())),
        }
    }
}

/// A single value.
///
/// Unlike a column value in a row, a `Datum` here always owns its data, as it
/// only appears inside literal expressions.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum Datum {
    /// An unknown value.
    Null,
    /// The `true` boolean value.
    True,
    /// The `false` boolean value.
    False,
    /// A 32-bit signed integer.
    Int32(i32),
    /// A 64-bit signed integer.
    Int64(i64),
    /// A 64-bit floating point number.
    Float64(f64),
    /// A sequence of Unicode codepoints encoded as UTF-8.
    String(String),
}

impl Datum {
    /// The type of this datum, if it is not [`Datum::Null`].
    pub fn scalar_type(&self) -> Option<ScalarType> {
        match self {
            Datum::Null => None,
            Datum::True | Datum::False => Some(ScalarType::Bool),
            Datum::Int32(_) => Some(ScalarType::Int32),
            Datum::Int64(_) => Some(ScalarType::Int64),
            Datum::Float64(_) => Some(ScalarType::Float64),
            Datum::String(_) => Some(ScalarType::String),
        }
    }

    /// Reports whether this datum is an instance of the specified type.
    pub fn is_instance_of(&self, typ: ScalarType) -> bool {
        match self.scalar_type() {
            None => true,
            Some(t) => t == typ,
        }
    }
}

impl From<bool> for Datum {
    fn from(b: bool) -> Datum {
        if b {
            Datum::True
        } else {
            Datum::False
        }
    }
}

impl From<i32> for Datum {
    fn from(i: i32) -> Datum {
        Datum::Int32(i)
    }
}

impl From<i64> for Datum {
    fn from(i: i64) -> Datum {
        Datum::Int64(i)
    }
}

impl From<&str> for Datum {
    fn from(s: &str) -> Datum {
        Datum::String(s.to_owned())
    }
}

// Floats compare bitwise so that plan equality is an equivalence relation.
impl PartialEq for Datum {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Datum::Null, Datum::Null)
            | (Datum::True, Datum::True)
            | (Datum::False, Datum::False) => true,
            (Datum::Int32(a), Datum::Int32(b)) => a == b,
            (Datum::Int64(a), Datum::Int64(b)) => a == b,
            (Datum::Float64(a), Datum::Float64(b)) => a.to_bits() == b.to_bits(),
            (Datum::String(a), Datum::String(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Datum {}

impl std::hash::Hash for Datum {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Datum::Null | Datum::True | Datum::False => {}
            Datum::Int32(i) => i.hash(state),
            Datum::Int64(i) => i.hash(state),
            Datum::Float64(f) => f.to_bits().hash(state),
            Datum::String(s) => s.hash(state),
        }
    }
}

impl fmt::Display for Datum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Datum::Null => f.write_str("null"),
            Datum::True => f.write_str("true"),
            Datum::False => f.write_str("false"),
            Datum::Int32(i) => write!(f, "{}", i),
            Datum::Int64(i) => write!(f, "{}", i),
            Datum::Float64(n) => write!(f, "{}", n),
            Datum::String(s) => write!(f, "{:?}", s),
        }
    }
}
