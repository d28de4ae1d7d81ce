// Copyright Materialize, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Stack management for recursive walks over plans.
//!
//! Plans can be arbitrarily deep, so every recursive walk over a plan runs
//! its body through [`maybe_grow`], which switches to a freshly allocated
//! stack segment when the current one is nearly exhausted.

/// The remaining stack size at which a new segment is allocated.
pub const STACK_RED_ZONE: usize = 64 << 10; // 64KiB

/// The size of each newly allocated stack segment.
pub const STACK_SIZE: usize = 2 << 20; // 2MiB

/// Runs `f`, first growing the stack if less than [`STACK_RED_ZONE`] bytes
/// remain.
#[inline]
pub fn maybe_grow<F, R>(f: F) -> R
where
    F: FnOnce() -> R,
{
    stacker::maybe_grow(STACK_RED_ZONE, STACK_SIZE, f)
}
