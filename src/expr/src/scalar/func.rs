// Copyright Materialize, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Scalar functions callable from [`ScalarExpr`](crate::ScalarExpr).

use std::fmt;

use serde::{Deserialize, Serialize};

use sift_repr::ScalarType;

/// A function of one argument.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub enum UnaryFunc {
    Not,
    IsNull,
    Neg,
}

impl UnaryFunc {
    /// The type of the function's result, given the type of its argument.
    pub fn output_type(&self, input_type: ScalarType) -> ScalarType {
        match self {
            UnaryFunc::Not | UnaryFunc::IsNull => ScalarType::Bool,
            UnaryFunc::Neg => input_type,
        }
    }

    /// The name by which the function is spelled in test syntax.
    pub fn name(&self) -> &'static str {
        match self {
            UnaryFunc::Not => "not",
            UnaryFunc::IsNull => "isnull",
            UnaryFunc::Neg => "neg",
        }
    }

    /// Looks up a function by the name returned from [`UnaryFunc::name`].
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "not" => Some(UnaryFunc::Not),
            "isnull" => Some(UnaryFunc::IsNull),
            "neg" => Some(UnaryFunc::Neg),
            _ => None,
        }
    }
}

impl fmt::Display for UnaryFunc {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            UnaryFunc::Neg => f.write_str("-"),
            func => f.write_str(func.name()),
        }
    }
}

/// A function of two arguments.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub enum BinaryFunc {
    Add,
    Sub,
    Mul,
    Eq,
    NotEq,
    Lt,
    Gt,
    And,
    Or,
}

impl BinaryFunc {
    /// The type of the function's result, given the types of its arguments.
    pub fn output_type(&self, input1_type: ScalarType, _input2_type: ScalarType) -> ScalarType {
        use BinaryFunc::*;
        match self {
            Add | Sub | Mul => input1_type,
            Eq | NotEq | Lt | Gt | And | Or => ScalarType::Bool,
        }
    }

    /// The name by which the function is spelled in test syntax.
    pub fn name(&self) -> &'static str {
        use BinaryFunc::*;
        match self {
            Add => "add",
            Sub => "sub",
            Mul => "mul",
            Eq => "eq",
            NotEq => "noteq",
            Lt => "lt",
            Gt => "gt",
            And => "and",
            Or => "or",
        }
    }

    /// Looks up a function by the name returned from [`BinaryFunc::name`].
    pub fn from_name(name: &str) -> Option<Self> {
        use BinaryFunc::*;
        [Add, Sub, Mul, Eq, NotEq, Lt, Gt, And, Or]
            .into_iter()
            .find(|func| func.name() == name)
    }
}

impl fmt::Display for BinaryFunc {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use BinaryFunc::*;
        f.write_str(match self {
            Add => "+",
            Sub => "-",
            Mul => "*",
            Eq => "=",
            NotEq => "!=",
            Lt => "<",
            Gt => ">",
            And => "AND",
            Or => "OR",
        })
    }
}
