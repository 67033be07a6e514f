// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The reversible dialect produced by the translator: instructions over versioned
//! registers, the dependency graph the constraint passes rewrite, and the export
//! formats handed to visualization tooling.

pub mod dialect;
pub mod eval;
pub mod export;
pub mod graph;
