// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.


use revq_cir::cir::{BinOp, Predicate, Ty};
use rustc_hash::FxHashSet;
use std::{
    fmt::{self, Display, Formatter},
    rc::Rc,
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RegisterId(pub u32);

impl RegisterId {
    #[must_use]
    pub fn successor(self) -> Self {
        Self(self.0 + 1)
    }
}

impl From<RegisterId> for usize {
    fn from(id: RegisterId) -> Self {
        id.0 as usize
    }
}

impl From<usize> for RegisterId {
    fn from(value: usize) -> Self {
        Self(u32::try_from(value).expect("register id should fit in u32"))
    }
}

impl Display for RegisterId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "r{}", self.0)
    }
}

/// One state of a logical register: the `(id, version, path)` triple plus the
/// type of the data it holds. Versions count writes to the id; the path separates
/// results that must coexist under the same id and version.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Register {
    pub id: RegisterId,
    pub version: u32,
    pub path: u32,
    pub ty: Ty,
}

impl Register {
    #[must_use]
    pub fn new(id: RegisterId, ty: Ty) -> Self {
        Self {
            id,
            version: 0,
            path: 0,
            ty,
        }
    }

    #[must_use]
    pub fn triple(&self) -> (RegisterId, u32, u32) {
        (self.id, self.version, self.path)
    }

    /// The state produced by writing this register in place.
    #[must_use]
    pub fn next_version(&self) -> Self {
        Self {
            version: self.version + 1,
            path: 0,
            ..*self
        }
    }

    #[must_use]
    pub fn with_path(self, path: u32) -> Self {
        Self { path, ..self }
    }

    /// True when both registers name the same id at the same version, whatever their paths.
    #[must_use]
    pub fn same_version(&self, other: &Register) -> bool {
        self.id == other.id && self.version == other.version
    }
}

impl Display for Register {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "%{}.v{}", self.id, self.version)?;
        if self.path != 0 {
            write!(f, ".p{}", self.path)?;
        }
        Ok(())
    }
}

/// Which operand position of an instruction an edge feeds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Slot {
    Lhs,
    Rhs,
    Ctrl,
    Operand,
}

impl Display for Slot {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Slot::Lhs => write!(f, "lhs"),
            Slot::Rhs => write!(f, "rhs"),
            Slot::Ctrl => write!(f, "ctrl"),
            Slot::Operand => write!(f, "operand"),
        }
    }
}

/// The shape of an instruction with its register operands and result stripped.
/// Literals and immediates stay here because they are data, not operands.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Op {
    Init(i32),
    CInit(i32),
    Binary(BinOp),
    BinaryImm(BinOp, i32),
    CBinary(BinOp),
    CBinaryImm(BinOp, i32),
    Icmp(Predicate),
    CIcmp(Predicate),
    LogicalAnd,
    LogicalNot,
    Return,
}

impl Op {
    /// Operand slots in the order they appear in [`Instruction::operands`].
    #[must_use]
    pub fn slots(self) -> &'static [Slot] {
        match self {
            Op::Init(_) => &[],
            Op::CInit(_) => &[Slot::Ctrl],
            Op::Binary(_) | Op::Icmp(_) | Op::LogicalAnd => &[Slot::Lhs, Slot::Rhs],
            Op::BinaryImm(..) => &[Slot::Lhs],
            Op::CBinary(_) | Op::CIcmp(_) => &[Slot::Lhs, Slot::Rhs, Slot::Ctrl],
            Op::CBinaryImm(..) => &[Slot::Lhs, Slot::Ctrl],
            Op::LogicalNot | Op::Return => &[Slot::Operand],
        }
    }

    /// The binary family: the result overwrites the left operand's register.
    #[must_use]
    pub fn writes_in_place(self) -> bool {
        matches!(
            self,
            Op::Binary(_) | Op::BinaryImm(..) | Op::CBinary(_) | Op::CBinaryImm(..)
        )
    }

    #[must_use]
    pub fn is_controlled(self) -> bool {
        matches!(
            self,
            Op::CInit(_) | Op::CBinary(_) | Op::CBinaryImm(..) | Op::CIcmp(_)
        )
    }

    #[must_use]
    pub fn has_result(self) -> bool {
        !matches!(self, Op::Return)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Instruction {
    Init(i32, Register),
    CInit(Register, i32, Register),
    Binary(BinOp, Register, Register, Register),
    BinaryImm(BinOp, Register, i32, Register),
    CBinary(BinOp, Register, Register, Register, Register),
    CBinaryImm(BinOp, Register, i32, Register, Register),
    Icmp(Predicate, Register, Register, Register),
    CIcmp(Predicate, Register, Register, Register, Register),
    LogicalAnd(Register, Register, Register),
    LogicalNot(Register, Register),
    Return(Register),
}

impl Instruction {
    #[must_use]
    pub fn op(&self) -> Op {
        match self {
            Instruction::Init(literal, _) => Op::Init(*literal),
            Instruction::CInit(_, literal, _) => Op::CInit(*literal),
            Instruction::Binary(op, ..) => Op::Binary(*op),
            Instruction::BinaryImm(op, _, imm, _) => Op::BinaryImm(*op, *imm),
            Instruction::CBinary(op, ..) => Op::CBinary(*op),
            Instruction::CBinaryImm(op, _, imm, _, _) => Op::CBinaryImm(*op, *imm),
            Instruction::Icmp(predicate, ..) => Op::Icmp(*predicate),
            Instruction::CIcmp(predicate, ..) => Op::CIcmp(*predicate),
            Instruction::LogicalAnd(..) => Op::LogicalAnd,
            Instruction::LogicalNot(..) => Op::LogicalNot,
            Instruction::Return(_) => Op::Return,
        }
    }

    /// Register operands in slot order (see [`Op::slots`]).
    #[must_use]
    pub fn operands(&self) -> Vec<Register> {
        match self {
            Instruction::Init(..) => Vec::new(),
            Instruction::CInit(ctrl, _, _) => vec![*ctrl],
            Instruction::Binary(_, lhs, rhs, _)
            | Instruction::Icmp(_, lhs, rhs, _)
            | Instruction::LogicalAnd(lhs, rhs, _) => vec![*lhs, *rhs],
            Instruction::BinaryImm(_, lhs, _, _) => vec![*lhs],
            Instruction::CBinary(_, lhs, rhs, ctrl, _) | Instruction::CIcmp(_, lhs, rhs, ctrl, _) => {
                vec![*lhs, *rhs, *ctrl]
            }
            Instruction::CBinaryImm(_, lhs, _, ctrl, _) => vec![*lhs, *ctrl],
            Instruction::LogicalNot(operand, _) | Instruction::Return(operand) => vec![*operand],
        }
    }

    #[must_use]
    pub fn result(&self) -> Option<Register> {
        match self {
            Instruction::Init(_, result)
            | Instruction::CInit(_, _, result)
            | Instruction::Binary(_, _, _, result)
            | Instruction::BinaryImm(_, _, _, result)
            | Instruction::CBinary(_, _, _, _, result)
            | Instruction::CBinaryImm(_, _, _, _, result)
            | Instruction::Icmp(_, _, _, result)
            | Instruction::CIcmp(_, _, _, _, result)
            | Instruction::LogicalAnd(_, _, result)
            | Instruction::LogicalNot(_, result) => Some(*result),
            Instruction::Return(_) => None,
        }
    }

    /// The left operand of a binary-family instruction.
    #[must_use]
    pub fn lhs(&self) -> Option<Register> {
        match self {
            Instruction::Binary(_, lhs, ..)
            | Instruction::BinaryImm(_, lhs, ..)
            | Instruction::CBinary(_, lhs, ..)
            | Instruction::CBinaryImm(_, lhs, ..) => Some(*lhs),
            _ => None,
        }
    }

    /// Reassembles an instruction from its shape, slot-ordered operands, and result.
    ///
    /// # Panics
    ///
    /// Panics if the operand count does not match the shape's slots or if a result is
    /// missing for a shape that produces one.
    #[must_use]
    pub fn from_parts(op: Op, operands: &[Register], result: Option<Register>) -> Self {
        assert_eq!(
            op.slots().len(),
            operands.len(),
            "operand count should match the slots of {op:?}"
        );
        let produced = || result.expect("instruction shape should have a result register");
        match op {
            Op::Init(literal) => Instruction::Init(literal, produced()),
            Op::CInit(literal) => Instruction::CInit(operands[0], literal, produced()),
            Op::Binary(bin_op) => Instruction::Binary(bin_op, operands[0], operands[1], produced()),
            Op::BinaryImm(bin_op, imm) => {
                Instruction::BinaryImm(bin_op, operands[0], imm, produced())
            }
            Op::CBinary(bin_op) => {
                Instruction::CBinary(bin_op, operands[0], operands[1], operands[2], produced())
            }
            Op::CBinaryImm(bin_op, imm) => {
                Instruction::CBinaryImm(bin_op, operands[0], imm, operands[1], produced())
            }
            Op::Icmp(predicate) => Instruction::Icmp(predicate, operands[0], operands[1], produced()),
            Op::CIcmp(predicate) => {
                Instruction::CIcmp(predicate, operands[0], operands[1], operands[2], produced())
            }
            Op::LogicalAnd => Instruction::LogicalAnd(operands[0], operands[1], produced()),
            Op::LogicalNot => Instruction::LogicalNot(operands[0], produced()),
            Op::Return => Instruction::Return(operands[0]),
        }
    }
}

pub(crate) fn mnemonic(op: BinOp) -> &'static str {
    match op {
        BinOp::Add => "add",
        BinOp::Sub => "sub",
        BinOp::Mul => "mul",
        BinOp::Sdiv => "sdiv",
        BinOp::Srem => "srem",
        BinOp::Udiv => "udiv",
        BinOp::BitwiseAnd => "and",
        BinOp::BitwiseOr => "or",
        BinOp::BitwiseXor => "xor",
        BinOp::Shl => "shl",
        BinOp::Ashr => "ashr",
    }
}

impl Display for Instruction {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::Init(literal, result) => write!(f, "{result} = init {literal}"),
            Instruction::CInit(ctrl, literal, result) => {
                write!(f, "{result} = init {literal} if {ctrl}")
            }
            Instruction::Binary(op, lhs, rhs, result) => {
                write!(f, "{result} = {} {lhs}, {rhs}", mnemonic(*op))
            }
            Instruction::BinaryImm(op, lhs, imm, result) => {
                write!(f, "{result} = {} {lhs}, {imm}", mnemonic(*op))
            }
            Instruction::CBinary(op, lhs, rhs, ctrl, result) => {
                write!(f, "{result} = {} {lhs}, {rhs} if {ctrl}", mnemonic(*op))
            }
            Instruction::CBinaryImm(op, lhs, imm, ctrl, result) => {
                write!(f, "{result} = {} {lhs}, {imm} if {ctrl}", mnemonic(*op))
            }
            Instruction::Icmp(predicate, lhs, rhs, result) => {
                write!(f, "{result} = icmp {predicate} {lhs}, {rhs}")
            }
            Instruction::CIcmp(predicate, lhs, rhs, ctrl, result) => {
                write!(f, "{result} = icmp {predicate} {lhs}, {rhs} if {ctrl}")
            }
            Instruction::LogicalAnd(lhs, rhs, result) => write!(f, "{result} = and {lhs}, {rhs}"),
            Instruction::LogicalNot(operand, result) => write!(f, "{result} = not {operand}"),
            Instruction::Return(value) => write!(f, "return {value}"),
        }
    }
}

/// A translated function body: a flat instruction list in execution order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Program {
    pub name: Rc<str>,
    pub instructions: Vec<Instruction>,
}

impl Program {
    #[must_use]
    pub fn new(name: Rc<str>, instructions: Vec<Instruction>) -> Self {
        Self { name, instructions }
    }

    /// Number of distinct register ids the program touches.
    #[must_use]
    pub fn register_count(&self) -> usize {
        let mut ids = FxHashSet::default();
        for instr in &self.instructions {
            ids.extend(instr.operands().iter().map(|reg| reg.id));
            ids.extend(instr.result().map(|reg| reg.id));
        }
        ids.len()
    }
}

impl Display for Program {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "Program {}:", self.name)?;
        for instr in &self.instructions {
            write!(f, "\n    {instr}")?;
        }
        Ok(())
    }
}
