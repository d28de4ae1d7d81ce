// Copyright Materialize, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Fundamental data representation.
//!
//! This module contains the types for representing column references and
//! their types in logical plans. Values are only needed to the extent that
//! literals appear in scalar expressions.

#![warn(missing_debug_implementations)]

mod column;
mod scalar;

pub use column::ColumnRef;
pub use scalar::{Datum, InvalidScalarType, ScalarType};
