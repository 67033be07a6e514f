// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Reference semantics for the classical IR. The reversible translation is checked
//! against this evaluator: both must agree on the value a function returns.


use crate::cir::{Block, Function, Instruction, Value, ValueId};
use miette::Diagnostic;
use rustc_hash::FxHashMap;
use std::rc::Rc;
use thiserror::Error;

#[derive(Clone, Debug, Diagnostic, Error, PartialEq, Eq)]
pub enum Error {
    #[error("division by zero while computing value {0}")]
    #[diagnostic(code("Revq.ClassicalEval.DivisionByZero"))]
    DivisionByZero(ValueId),

    #[error("value {0} is used before it is defined")]
    #[diagnostic(code("Revq.ClassicalEval.UndefinedValue"))]
    UndefinedValue(ValueId),

    #[error("function `{0}` finished without returning a value")]
    #[diagnostic(code("Revq.ClassicalEval.MissingReturn"))]
    MissingReturn(Rc<str>),
}

/// Runs `function` and returns the value of the first `Return` reached.
pub fn evaluate(function: &Function) -> Result<i32, Error> {
    let mut env = Env::default();
    env.eval_block(&function.body)?
        .ok_or_else(|| Error::MissingReturn(function.name.clone()))
}

#[derive(Default)]
struct Env {
    values: FxHashMap<ValueId, i32>,
}

impl Env {
    fn eval_block(&mut self, block: &Block) -> Result<Option<i32>, Error> {
        for instr in &block.0 {
            match instr {
                Instruction::Constant(literal, result) => self.define(*result, *literal),
                Instruction::Binary(op, lhs, rhs, result) => {
                    let value = op
                        .apply(self.read(*lhs)?, self.read(*rhs)?)
                        .ok_or(Error::DivisionByZero(result.id))?;
                    self.define(*result, value);
                }
                Instruction::BinaryImm(op, lhs, imm, result) => {
                    let value = op
                        .apply(self.read(*lhs)?, *imm)
                        .ok_or(Error::DivisionByZero(result.id))?;
                    self.define(*result, value);
                }
                Instruction::Icmp(predicate, lhs, rhs, result) => {
                    let value = predicate.apply(self.read(*lhs)?, self.read(*rhs)?);
                    self.define(*result, i32::from(value));
                }
                Instruction::LogicalAnd(lhs, rhs, result) => {
                    let value = self.read(*lhs)? != 0 && self.read(*rhs)? != 0;
                    self.define(*result, i32::from(value));
                }
                Instruction::LogicalOr(lhs, rhs, result) => {
                    let value = self.read(*lhs)? != 0 || self.read(*rhs)? != 0;
                    self.define(*result, i32::from(value));
                }
                Instruction::LogicalNot(operand, result) => {
                    let value = self.read(*operand)? == 0;
                    self.define(*result, i32::from(value));
                }
                Instruction::Branch(cond, then_block, else_block) => {
                    let taken = if self.read(*cond)? == 0 {
                        else_block
                    } else {
                        then_block
                    };
                    if let Some(returned) = self.eval_block(taken)? {
                        return Ok(Some(returned));
                    }
                }
                Instruction::Return(value) => return Ok(Some(self.read(*value)?)),
            }
        }
        Ok(None)
    }

    fn read(&self, value: Value) -> Result<i32, Error> {
        self.values
            .get(&value.id)
            .copied()
            .ok_or(Error::UndefinedValue(value.id))
    }

    fn define(&mut self, value: Value, content: i32) {
        self.values.insert(value.id, content);
    }
}
