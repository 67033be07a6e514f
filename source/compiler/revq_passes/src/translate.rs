// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Lowers a classical function into the reversible dialect in a single pass.
//!
//! Arithmetic overwrites its left operand's register, comparisons and logic produce
//! fresh bits, and a branch becomes two sequential arms guarded by complementary
//! control bits. Translation stops at the first error; nothing partial is returned.


use crate::{
    Error,
    tracker::{Expr, Tracker},
};
use revq_cir::cir::{self, BinOp, Block, Function, Ty, ValueId};
use revq_dialect::dialect::Program;

/// Whether control can continue past a translated block.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Flow {
    FallThrough,
    Returned,
}

pub fn translate(function: &Function) -> Result<Program, Error> {
    log::debug!("translating function {}", function.name);
    check_definitions(function)?;

    let mut tracker = Tracker::new();
    if translate_block(&mut tracker, &function.body)? == Flow::FallThrough {
        log::debug!("function {} ends without a return", function.name);
    }

    let program = Program::new(function.name.clone(), tracker.finish());
    log::debug!(
        "translated {} into {} instructions over {} registers",
        function.name,
        program.instructions.len(),
        program.register_count()
    );
    Ok(program)
}

/// Every value read anywhere in the function must be produced somewhere in it.
fn check_definitions(function: &Function) -> Result<(), Error> {
    let definitions = function.definitions();
    let mut pending = vec![&function.body];
    while let Some(block) = pending.pop() {
        for instr in &block.0 {
            if let Some(value) = instr
                .operands()
                .into_iter()
                .find(|value| !definitions.contains_key(&value.id))
            {
                return Err(Error::UnboundValue(value.id));
            }
            if let cir::Instruction::Branch(_, then_block, else_block) = instr {
                pending.push(then_block);
                pending.push(else_block);
            }
        }
    }
    Ok(())
}

fn translate_block(tracker: &mut Tracker, block: &Block) -> Result<Flow, Error> {
    for instr in &block.0 {
        match instr {
            cir::Instruction::Branch(cond, then_block, else_block) => {
                if translate_branch(tracker, cond.id, then_block, else_block)? == Flow::Returned {
                    return Ok(Flow::Returned);
                }
            }
            cir::Instruction::Return(value) => {
                tracker.emit_return(value.id)?;
                return Ok(Flow::Returned);
            }
            _ => {
                let (value, expr) = lower(instr)?;
                tracker.define(value.id, expr, value.ty)?;
            }
        }
    }
    Ok(Flow::FallThrough)
}

fn translate_branch(
    tracker: &mut Tracker,
    cond: ValueId,
    then_block: &Block,
    else_block: &Block,
) -> Result<Flow, Error> {
    let bit = tracker.materialize(cond)?;
    let then_control = tracker.arm_control(bit, false);
    tracker.push_control(then_control);
    let then_flow = translate_block(tracker, then_block)?;
    tracker.pop_control();

    // The then arm may have overwritten or recomputed the condition.
    let bit = tracker.materialize(cond)?;
    let else_control = tracker.arm_control(bit, true);
    tracker.push_control(else_control);
    let else_flow = translate_block(tracker, else_block)?;
    tracker.pop_control();

    if then_flow == Flow::Returned && else_flow == Flow::Returned {
        Ok(Flow::Returned)
    } else {
        Ok(Flow::FallThrough)
    }
}

/// Maps a value-producing classical instruction to the expression the tracker
/// emits and remembers for recomputation.
fn lower(instr: &cir::Instruction) -> Result<(cir::Value, Expr), Error> {
    let unsupported = || Error::UnsupportedConstruct(instr.to_string());
    match instr {
        cir::Instruction::Constant(literal, result) => Ok((*result, Expr::Constant(*literal))),
        cir::Instruction::Binary(op, lhs, rhs, result) if is_supported_op(*op) => {
            Ok((*result, Expr::Binary(*op, lhs.id, rhs.id)))
        }
        cir::Instruction::BinaryImm(op, lhs, imm, result) if is_supported_op(*op) => {
            Ok((*result, Expr::BinaryImm(*op, lhs.id, *imm)))
        }
        cir::Instruction::Icmp(predicate, lhs, rhs, result) if !predicate.is_unsigned() => Ok((
            with_ty(*result, Ty::Boolean),
            Expr::Icmp(*predicate, lhs.id, rhs.id),
        )),
        cir::Instruction::LogicalAnd(lhs, rhs, result) => Ok((
            with_ty(*result, Ty::Boolean),
            Expr::LogicalAnd(lhs.id, rhs.id),
        )),
        cir::Instruction::LogicalNot(operand, result) => {
            Ok((with_ty(*result, Ty::Boolean), Expr::LogicalNot(operand.id)))
        }
        cir::Instruction::Binary(..)
        | cir::Instruction::BinaryImm(..)
        | cir::Instruction::Icmp(..)
        | cir::Instruction::LogicalOr(..) => Err(unsupported()),
        cir::Instruction::Branch(..) | cir::Instruction::Return(_) => {
            unreachable!("control flow is handled by the block walk")
        }
    }
}

fn is_supported_op(op: BinOp) -> bool {
    matches!(op, BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::Sdiv)
}

fn with_ty(value: cir::Value, ty: Ty) -> cir::Value {
    cir::Value { ty, ..value }
}
