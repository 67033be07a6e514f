// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#[cfg(test)]
mod tests;

use crate::Error;
use revq_dialect::dialect::{Instruction, Program};

/// Checks that every arithmetic instruction writes the register id of its left
/// operand at exactly the next version. Stops at the first violation.
pub fn verify(program: &Program) -> Result<(), Error> {
    program
        .instructions
        .iter()
        .enumerate()
        .try_for_each(|(index, instr)| check(index, instr))
}

/// Like [`verify`], but reports every violation in program order.
#[must_use]
pub fn verify_all(program: &Program) -> Vec<Error> {
    program
        .instructions
        .iter()
        .enumerate()
        .filter_map(|(index, instr)| check(index, instr).err())
        .collect()
}

fn check(index: usize, instr: &Instruction) -> Result<(), Error> {
    let (Some(lhs), Some(actual)) = (instr.lhs(), instr.result()) else {
        return Ok(());
    };
    let expected = lhs.next_version();
    if actual.id == expected.id && actual.version == expected.version {
        Ok(())
    } else {
        Err(Error::Verification {
            index,
            instruction: instr.clone(),
            expected,
            actual,
        })
    }
}
