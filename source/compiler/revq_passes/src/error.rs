// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use miette::Diagnostic;
use revq_cir::cir::ValueId;
use revq_dialect::{
    dialect::{Instruction, Register},
    graph,
};
use thiserror::Error;

#[derive(Clone, Debug, Diagnostic, Error, PartialEq, Eq)]
pub enum Error {
    #[error("value {0} is used before it is bound to a register")]
    #[diagnostic(code("Revq.Translate.UnboundValue"))]
    UnboundValue(ValueId),

    #[error("recomputing value {0} requires the value itself")]
    #[diagnostic(code("Revq.Translate.RecomputationCycle"))]
    #[diagnostic(help("the value's defining expression refers back to the value"))]
    RecomputationCycle(ValueId),

    #[error("unsupported construct `{0}`")]
    #[diagnostic(code("Revq.Translate.UnsupportedConstruct"))]
    UnsupportedConstruct(String),

    #[error("instruction {index} `{instruction}` writes {actual} but must write {expected}")]
    #[diagnostic(code("Revq.Verify.WriteInPlace"))]
    #[diagnostic(help(
        "an arithmetic result must reuse the register id of its left operand at the next version"
    ))]
    Verification {
        index: usize,
        instruction: Instruction,
        expected: Register,
        actual: Register,
    },

    #[error("found {} write-in-place violations", .violations.len())]
    #[diagnostic(code("Revq.Verify.Violations"))]
    Violations {
        #[related]
        violations: Vec<Error>,
    },

    #[error("constraint enforcement did not reach a fixpoint within {iterations} iterations")]
    #[diagnostic(code("Revq.Enforce.DidNotConverge"))]
    EnforcementDidNotConverge { iterations: usize },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Graph(#[from] graph::Error),
}
