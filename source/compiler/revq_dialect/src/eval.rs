// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Reference execution of dialect programs.
//!
//! Each `(register id, path)` pair is one physical lane holding a single version at
//! a time. Every read must observe exactly the version the operand names, so a
//! program that reads a register after it was overwritten fails with
//! [`Error::StaleRead`] instead of silently computing with the wrong value.

#[cfg(test)]
mod tests;

use crate::dialect::{Instruction, Op, Program, Register, RegisterId};
use miette::Diagnostic;
use revq_cir::cir::BinOp;
use rustc_hash::FxHashMap;
use thiserror::Error;

#[derive(Clone, Debug, Diagnostic, Error, PartialEq, Eq)]
pub enum Error {
    #[error("instruction {index} `{instruction}` reads {register} before anything was written to it")]
    #[diagnostic(code("Revq.DialectEval.Uninitialized"))]
    Uninitialized {
        index: usize,
        instruction: Instruction,
        register: Register,
    },

    #[error("instruction {index} `{instruction}` reads {register} but the register holds version {current}")]
    #[diagnostic(code("Revq.DialectEval.StaleRead"))]
    #[diagnostic(help("the register was overwritten before this read"))]
    StaleRead {
        index: usize,
        instruction: Instruction,
        register: Register,
        current: u32,
    },

    #[error("instruction {index} `{instruction}` divides by zero")]
    #[diagnostic(code("Revq.DialectEval.DivisionByZero"))]
    DivisionByZero { index: usize, instruction: Instruction },
}

#[derive(Clone, Copy, Debug)]
struct Cell {
    version: u32,
    value: i32,
}

/// Runs `program` and returns the value of every `return` it reaches, in order.
///
/// Controlled instructions act only when their control bit is set: a disabled
/// `init` leaves zero, a disabled arithmetic op leaves its left operand unchanged,
/// and a disabled compare leaves zero. The written version advances either way.
pub fn evaluate(program: &Program) -> Result<Vec<i32>, Error> {
    let mut lanes: FxHashMap<(RegisterId, u32), Cell> = FxHashMap::default();
    let mut returned = Vec::new();

    for (index, instr) in program.instructions.iter().enumerate() {
        let args = instr
            .operands()
            .into_iter()
            .map(|register| read(&lanes, index, instr, register))
            .collect::<Result<Vec<_>, _>>()?;
        let arith = |op: BinOp, lhs: i32, rhs: i32| {
            op.apply(lhs, rhs).ok_or_else(|| Error::DivisionByZero {
                index,
                instruction: instr.clone(),
            })
        };

        let value = match instr.op() {
            Op::Init(literal) => literal,
            Op::CInit(literal) => {
                if args[0] != 0 {
                    literal
                } else {
                    0
                }
            }
            Op::Binary(op) => arith(op, args[0], args[1])?,
            Op::BinaryImm(op, imm) => arith(op, args[0], imm)?,
            Op::CBinary(op) => {
                if args[2] != 0 {
                    arith(op, args[0], args[1])?
                } else {
                    args[0]
                }
            }
            Op::CBinaryImm(op, imm) => {
                if args[1] != 0 {
                    arith(op, args[0], imm)?
                } else {
                    args[0]
                }
            }
            Op::Icmp(predicate) => i32::from(predicate.apply(args[0], args[1])),
            Op::CIcmp(predicate) => i32::from(args[2] != 0 && predicate.apply(args[0], args[1])),
            Op::LogicalAnd => i32::from(args[0] != 0 && args[1] != 0),
            Op::LogicalNot => i32::from(args[0] == 0),
            Op::Return => {
                returned.push(args[0]);
                continue;
            }
        };

        if let Some(result) = instr.result() {
            lanes.insert(
                (result.id, result.path),
                Cell {
                    version: result.version,
                    value,
                },
            );
        }
    }

    Ok(returned)
}

fn read(
    lanes: &FxHashMap<(RegisterId, u32), Cell>,
    index: usize,
    instr: &Instruction,
    register: Register,
) -> Result<i32, Error> {
    match lanes.get(&(register.id, register.path)) {
        Some(cell) if cell.version == register.version => Ok(cell.value),
        Some(cell) => Err(Error::StaleRead {
            index,
            instruction: instr.clone(),
            register,
            current: cell.version,
        }),
        None => Err(Error::Uninitialized {
            index,
            instruction: instr.clone(),
            register,
        }),
    }
}
