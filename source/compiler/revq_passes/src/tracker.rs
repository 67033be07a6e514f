// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Register and version bookkeeping for translation.
//!
//! Every classical value is bound to the register state that holds it together
//! with a description of how it was computed. In-place writes make older states
//! unreadable, so a binding can go stale; reading a stale value recomputes it from
//! its description into fresh registers instead of reusing the overwritten state.


use crate::{
    Error,
    control::{ControlStack, FrameId},
};
use index_map::IndexMap;
use revq_cir::cir::{BinOp, Predicate, Ty, ValueId};
use revq_dialect::dialect::{Instruction, Register, RegisterId};
use rustc_hash::{FxHashMap, FxHashSet};

/// How a value is computed, in terms of other classical values.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Expr {
    Constant(i32),
    Binary(BinOp, ValueId, ValueId),
    BinaryImm(BinOp, ValueId, i32),
    Icmp(Predicate, ValueId, ValueId),
    LogicalAnd(ValueId, ValueId),
    LogicalNot(ValueId),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ValueInfo {
    pub register: Register,
    pub expr: Expr,
    /// Control frame the binding was made under. The binding dies with the frame.
    pub frame: Option<FrameId>,
}

/// Translation state for one function: bindings, the latest version written to
/// each register id, the control stack, and the instructions emitted so far.
#[derive(Debug, Default)]
pub struct Tracker {
    bindings: FxHashMap<ValueId, ValueInfo>,
    latest: IndexMap<RegisterId, u32>,
    next_register: RegisterId,
    control: ControlStack,
    emitted: Vec<Instruction>,
}

impl Tracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates a register id that has never been used, at version 0.
    pub fn allocate(&mut self, ty: Ty) -> Register {
        let id = self.next_register;
        self.next_register = id.successor();
        self.latest.insert(id, 0);
        Register::new(id, ty)
    }

    pub fn bind(&mut self, value: ValueId, register: Register, expr: Expr) {
        let frame = self.control.frame();
        self.bindings.insert(
            value,
            ValueInfo {
                register,
                expr,
                frame,
            },
        );
    }

    pub fn lookup(&self, value: ValueId) -> Result<&ValueInfo, Error> {
        self.bindings.get(&value).ok_or(Error::UnboundValue(value))
    }

    /// A binding is current when nothing has overwritten its register since and the
    /// control frame it was made under is still open.
    #[must_use]
    pub fn is_current(&self, info: &ValueInfo) -> bool {
        self.is_latest(info.register) && info.frame.is_none_or(|frame| self.control.is_active(frame))
    }

    fn is_latest(&self, register: Register) -> bool {
        self.latest.get(register.id) == Some(&register.version)
    }

    /// Returns a register currently holding `value`, recomputing it when its
    /// binding has gone stale.
    pub fn materialize(&mut self, value: ValueId) -> Result<Register, Error> {
        self.materialize_inner(value, &mut FxHashSet::default())
    }

    fn materialize_inner(
        &mut self,
        value: ValueId,
        visiting: &mut FxHashSet<ValueId>,
    ) -> Result<Register, Error> {
        let info = *self.lookup(value)?;
        if self.is_current(&info) {
            return Ok(info.register);
        }
        if !visiting.insert(value) {
            return Err(Error::RecomputationCycle(value));
        }

        log::debug!("recomputing stale value {value} last held in {}", info.register);
        let register = self.emit(info.expr, info.register.ty, visiting)?;
        self.bind(value, register, info.expr);
        visiting.remove(&value);
        Ok(register)
    }

    /// Materializes several operands of one instruction. Recomputing one operand can
    /// overwrite another, so this repeats until all of them are current together.
    pub fn materialize_all(&mut self, values: &[ValueId]) -> Result<Vec<Register>, Error> {
        self.materialize_all_inner(values, &mut FxHashSet::default())
    }

    fn materialize_all_inner(
        &mut self,
        values: &[ValueId],
        visiting: &mut FxHashSet<ValueId>,
    ) -> Result<Vec<Register>, Error> {
        for _ in 0..=values.len() {
            let registers = values
                .iter()
                .map(|value| self.materialize_inner(*value, visiting))
                .collect::<Result<Vec<_>, _>>()?;
            if registers.iter().all(|register| self.is_latest(*register)) {
                return Ok(registers);
            }
        }
        // Operands keep evicting each other.
        Err(Error::RecomputationCycle(values[0]))
    }

    /// Emits `expr` for `value` under the current control and binds the result.
    pub fn define(&mut self, value: ValueId, expr: Expr, ty: Ty) -> Result<Register, Error> {
        let register = self.emit(expr, ty, &mut FxHashSet::default())?;
        self.bind(value, register, expr);
        Ok(register)
    }

    fn emit(
        &mut self,
        expr: Expr,
        ty: Ty,
        visiting: &mut FxHashSet<ValueId>,
    ) -> Result<Register, Error> {
        let control = self.control.current();
        let (instr, result) = match expr {
            Expr::Constant(literal) => {
                let result = self.allocate(ty);
                let instr = match control {
                    Some(ctrl) => Instruction::CInit(ctrl, literal, result),
                    None => Instruction::Init(literal, result),
                };
                (instr, result)
            }
            Expr::Binary(op, lhs, rhs) => {
                let operands = self.materialize_all_inner(&[lhs, rhs], visiting)?;
                let (lhs, rhs) = (operands[0], operands[1]);
                let result = self.overwrite(lhs);
                let instr = match control {
                    Some(ctrl) => Instruction::CBinary(op, lhs, rhs, ctrl, result),
                    None => Instruction::Binary(op, lhs, rhs, result),
                };
                (instr, result)
            }
            Expr::BinaryImm(op, lhs, imm) => {
                let lhs = self.materialize_inner(lhs, visiting)?;
                let result = self.overwrite(lhs);
                let instr = match control {
                    Some(ctrl) => Instruction::CBinaryImm(op, lhs, imm, ctrl, result),
                    None => Instruction::BinaryImm(op, lhs, imm, result),
                };
                (instr, result)
            }
            Expr::Icmp(predicate, lhs, rhs) => {
                let operands = self.materialize_all_inner(&[lhs, rhs], visiting)?;
                let result = self.allocate(Ty::Boolean);
                let instr = match control {
                    Some(ctrl) => {
                        Instruction::CIcmp(predicate, operands[0], operands[1], ctrl, result)
                    }
                    None => Instruction::Icmp(predicate, operands[0], operands[1], result),
                };
                (instr, result)
            }
            Expr::LogicalAnd(lhs, rhs) => {
                let operands = self.materialize_all_inner(&[lhs, rhs], visiting)?;
                let result = self.allocate(Ty::Boolean);
                (
                    Instruction::LogicalAnd(operands[0], operands[1], result),
                    result,
                )
            }
            Expr::LogicalNot(operand) => {
                let operand = self.materialize_inner(operand, visiting)?;
                let result = self.allocate(Ty::Boolean);
                (Instruction::LogicalNot(operand, result), result)
            }
        };
        self.push(instr);
        Ok(result)
    }

    /// The state produced by writing `lhs` in place.
    fn overwrite(&mut self, lhs: Register) -> Register {
        let result = lhs.next_version();
        self.latest.insert(result.id, result.version);
        result
    }

    /// Folds `cond`, negated if asked, into the enclosing control bit and returns the
    /// bit that guards a branch arm.
    pub fn arm_control(&mut self, cond: Register, negate: bool) -> Register {
        let cond = if negate {
            let bit = self.allocate(Ty::Boolean);
            self.push(Instruction::LogicalNot(cond, bit));
            bit
        } else {
            cond
        };
        match self.control.current() {
            Some(outer) => {
                let bit = self.allocate(Ty::Boolean);
                self.push(Instruction::LogicalAnd(cond, outer, bit));
                bit
            }
            None => cond,
        }
    }

    pub fn push_control(&mut self, control: Register) -> FrameId {
        self.control.push(control)
    }

    pub fn pop_control(&mut self) -> Option<FrameId> {
        self.control.pop()
    }

    pub fn emit_return(&mut self, value: ValueId) -> Result<(), Error> {
        let register = self.materialize(value)?;
        self.push(Instruction::Return(register));
        Ok(())
    }

    fn push(&mut self, instr: Instruction) {
        log::trace!("emit {instr}");
        self.emitted.push(instr);
    }

    #[must_use]
    pub fn emitted(&self) -> &[Instruction] {
        &self.emitted
    }

    #[must_use]
    pub fn finish(self) -> Vec<Instruction> {
        self.emitted
    }
}
