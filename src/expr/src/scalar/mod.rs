// Copyright Materialize, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use sift_repr::{ColumnRef, Datum, ScalarType};

use self::func::{BinaryFunc, UnaryFunc};

pub mod func;

/// An expression evaluated against a single input row.
///
/// Columns are referenced by [`ColumnRef`] rather than by position, so an
/// expression stays valid when the columns around the ones it reads change.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum ScalarExpr {
    /// A column of the input row
    Column(ColumnRef),
    /// A literal value.
    Literal(Datum, ScalarType),
    /// A function call that takes one expression as an argument.
    CallUnary {
        func: UnaryFunc,
        expr: Box<ScalarExpr>,
    },
    /// A function call that takes two expressions as arguments.
    CallBinary {
        func: BinaryFunc,
        expr1: Box<ScalarExpr>,
        expr2: Box<ScalarExpr>,
    },
}

impl ScalarExpr {
    pub fn column(column: ColumnRef) -> Self {
        ScalarExpr::Column(column)
    }

    /// A literal of the given type.
    ///
    /// # Panics
    ///
    /// Panics if `datum` is not an instance of `typ`.
    pub fn literal(datum: Datum, typ: ScalarType) -> Self {
        assert!(
            datum.is_instance_of(typ),
            "Expected datum of type {:?}, got value {:?}",
            typ,
            datum
        );
        ScalarExpr::Literal(datum, typ)
    }

    pub fn literal_null(typ: ScalarType) -> Self {
        ScalarExpr::Literal(Datum::Null, typ)
    }

    pub fn call_unary(self, func: UnaryFunc) -> Self {
        ScalarExpr::CallUnary {
            func,
            expr: Box::new(self),
        }
    }

    pub fn call_binary(self, other: Self, func: BinaryFunc) -> Self {
        ScalarExpr::CallBinary {
            func,
            expr1: Box::new(self),
            expr2: Box::new(other),
        }
    }

    /// The column this expression reads, if it is nothing but a column.
    pub fn as_column(&self) -> Option<&ColumnRef> {
        match self {
            ScalarExpr::Column(c) => Some(c),
            _ => None,
        }
    }

    /// The type of the values this expression produces.
    pub fn typ(&self) -> ScalarType {
        match self {
            ScalarExpr::Column(c) => c.typ(),
            ScalarExpr::Literal(_, typ) => *typ,
            ScalarExpr::CallUnary { func, expr } => func.output_type(expr.typ()),
            ScalarExpr::CallBinary { func, expr1, expr2 } => {
                func.output_type(expr1.typ(), expr2.typ())
            }
        }
    }

    /// Applies `f` to each direct sub-expression.
    pub fn visit_children<'a, F>(&'a self, mut f: F)
    where
        F: FnMut(&'a Self),
    {
        match self {
            ScalarExpr::Column(_) | ScalarExpr::Literal(..) => (),
            ScalarExpr::CallUnary { expr, .. } => f(expr),
            ScalarExpr::CallBinary { expr1, expr2, .. } => {
                f(expr1);
                f(expr2);
            }
        }
    }

    /// Post-order visitor for each sub-expression, including `self`.
    pub fn visit_post<'a, F>(&'a self, f: &mut F)
    where
        F: FnMut(&'a Self),
    {
        self.visit_children(|e| e.visit_post(f));
        f(self);
    }

    /// The set of columns this expression reads.
    pub fn referenced_columns(&self) -> BTreeSet<ColumnRef> {
        let mut columns = BTreeSet::new();
        self.referenced_columns_into(&mut columns);
        columns
    }

    /// Adds the columns this expression reads to `columns`.
    pub fn referenced_columns_into(&self, columns: &mut BTreeSet<ColumnRef>) {
        self.visit_post(&mut |e| {
            if let ScalarExpr::Column(c) = e {
                columns.insert(c.clone());
            }
        });
    }
}

impl From<ColumnRef> for ScalarExpr {
    fn from(column: ColumnRef) -> Self {
        ScalarExpr::Column(column)
    }
}

impl fmt::Display for ScalarExpr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ScalarExpr::Column(c) => write!(f, "{}", c),
            ScalarExpr::Literal(datum, _) => write!(f, "{}", datum),
            ScalarExpr::CallUnary {
                func: UnaryFunc::Neg,
                expr,
            } => write!(f, "-{}", expr),
            ScalarExpr::CallUnary { func, expr } => write!(f, "{}({})", func, expr),
            ScalarExpr::CallBinary { func, expr1, expr2 } => {
                write!(f, "({} {} {})", expr1, func, expr2)
            }
        }
    }
}
