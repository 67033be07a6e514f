// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The classical intermediate representation consumed by the reversible translator.
//!
//! A function body is a list of instructions over values in single-assignment form.
//! Conditionals are structured: a branch owns its then and else blocks, so there is
//! no control-flow graph to reconstruct.

pub mod builder;
pub mod cir;
pub mod eval;

pub use builder::Builder;
