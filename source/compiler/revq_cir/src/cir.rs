// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.


use indenter::{Indented, indented};
use rustc_hash::FxHashMap;
use std::{
    fmt::{self, Display, Formatter, Write},
    rc::Rc,
};

#[derive(Clone, Debug, Default)]
pub struct Program {
    pub functions: Vec<Function>,
}

impl Program {
    #[must_use]
    pub fn new(functions: Vec<Function>) -> Self {
        Self { functions }
    }
}

impl Display for Program {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for (index, function) in self.functions.iter().enumerate() {
            if index > 0 {
                writeln!(f)?;
            }
            write!(f, "{function}")?;
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Function {
    pub name: Rc<str>,
    pub body: Block,
}

impl Function {
    /// Maps every value defined in the function, including inside nested branch blocks,
    /// to the instruction that produces it. A value defined twice keeps its first definition.
    #[must_use]
    pub fn definitions(&self) -> FxHashMap<ValueId, &Instruction> {
        let mut defs = FxHashMap::default();
        collect_definitions(&self.body, &mut defs);
        defs
    }
}

fn collect_definitions<'a>(block: &'a Block, defs: &mut FxHashMap<ValueId, &'a Instruction>) {
    for instr in &block.0 {
        if let Some(result) = instr.result() {
            defs.entry(result.id).or_insert(instr);
        }
        if let Instruction::Branch(_, then_block, else_block) = instr {
            collect_definitions(then_block, defs);
            collect_definitions(else_block, defs);
        }
    }
}

impl Display for Function {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let mut indent = set_indentation(indented(f), 0);
        write!(indent, "Function {}:", self.name)?;
        indent = set_indentation(indent, 1);
        for instr in &self.body.0 {
            write!(indent, "\n{instr}")?;
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Block(pub Vec<Instruction>);

impl Display for Block {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let mut indent = set_indentation(indented(f), 0);
        write!(indent, "Block:")?;
        indent = set_indentation(indent, 1);
        for instr in &self.0 {
            write!(indent, "\n{instr}")?;
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Instruction {
    Constant(i32, Value),
    Binary(BinOp, Value, Value, Value),
    BinaryImm(BinOp, Value, i32, Value),
    Icmp(Predicate, Value, Value, Value),
    LogicalAnd(Value, Value, Value),
    LogicalOr(Value, Value, Value),
    LogicalNot(Value, Value),
    Branch(Value, Block, Block),
    Return(Value),
}

impl Instruction {
    /// The value defined by this instruction, if any.
    #[must_use]
    pub fn result(&self) -> Option<Value> {
        match self {
            Instruction::Constant(_, result)
            | Instruction::Binary(_, _, _, result)
            | Instruction::BinaryImm(_, _, _, result)
            | Instruction::Icmp(_, _, _, result)
            | Instruction::LogicalAnd(_, _, result)
            | Instruction::LogicalOr(_, _, result)
            | Instruction::LogicalNot(_, result) => Some(*result),
            Instruction::Branch(..) | Instruction::Return(_) => None,
        }
    }

    /// The values read by this instruction itself. Values read inside the blocks of
    /// a branch are not included.
    #[must_use]
    pub fn operands(&self) -> Vec<Value> {
        match self {
            Instruction::Constant(..) => Vec::new(),
            Instruction::Binary(_, lhs, rhs, _)
            | Instruction::Icmp(_, lhs, rhs, _)
            | Instruction::LogicalAnd(lhs, rhs, _)
            | Instruction::LogicalOr(lhs, rhs, _) => vec![*lhs, *rhs],
            Instruction::BinaryImm(_, operand, _, _)
            | Instruction::LogicalNot(operand, _)
            | Instruction::Branch(operand, _, _)
            | Instruction::Return(operand) => vec![*operand],
        }
    }
}

impl Display for Instruction {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::Constant(literal, result) => write!(f, "{result} = Constant {literal}"),
            Instruction::Binary(op, lhs, rhs, result) => {
                write!(f, "{result} = {op} {lhs}, {rhs}")
            }
            Instruction::BinaryImm(op, lhs, imm, result) => {
                write!(f, "{result} = {op} {lhs}, {imm}")
            }
            Instruction::Icmp(predicate, lhs, rhs, result) => {
                write!(f, "{result} = Icmp {predicate}, {lhs}, {rhs}")
            }
            Instruction::LogicalAnd(lhs, rhs, result) => {
                write!(f, "{result} = LogicalAnd {lhs}, {rhs}")
            }
            Instruction::LogicalOr(lhs, rhs, result) => {
                write!(f, "{result} = LogicalOr {lhs}, {rhs}")
            }
            Instruction::LogicalNot(operand, result) => {
                write!(f, "{result} = LogicalNot {operand}")
            }
            Instruction::Branch(cond, then_block, else_block) => {
                write!(f, "Branch {cond}")?;
                let mut indent = set_indentation(indented(f), 1);
                write!(indent, "\nthen:")?;
                indent = set_indentation(indent, 2);
                for instr in &then_block.0 {
                    write!(indent, "\n{instr}")?;
                }
                indent = set_indentation(indent, 1);
                write!(indent, "\nelse:")?;
                indent = set_indentation(indent, 2);
                for instr in &else_block.0 {
                    write!(indent, "\n{instr}")?;
                }
                Ok(())
            }
            Instruction::Return(value) => write!(f, "Return {value}"),
        }
    }
}

fn set_indentation<'a, 'b>(
    indent: Indented<'a, Formatter<'b>>,
    level: usize,
) -> Indented<'a, Formatter<'b>> {
    match level {
        0 => indent.with_str(""),
        1 => indent.with_str("    "),
        2 => indent.with_str("        "),
        _ => unimplemented!("indentation level not supported"),
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ValueId(pub u32);

impl ValueId {
    #[must_use]
    pub fn successor(self) -> Self {
        Self(self.0 + 1)
    }
}

impl From<ValueId> for usize {
    fn from(id: ValueId) -> Self {
        id.0 as usize
    }
}

impl From<usize> for ValueId {
    fn from(value: usize) -> Self {
        Self(u32::try_from(value).expect("value id should fit in u32"))
    }
}

impl Display for ValueId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Ty {
    Integer,
    Boolean,
}

impl Display for Ty {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Ty::Integer => write!(f, "Integer"),
            Ty::Boolean => write!(f, "Boolean"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Value {
    pub id: ValueId,
    pub ty: Ty,
}

impl Value {
    #[must_use]
    pub fn new_integer(id: ValueId) -> Self {
        Self {
            id,
            ty: Ty::Integer,
        }
    }

    #[must_use]
    pub fn new_boolean(id: ValueId) -> Self {
        Self {
            id,
            ty: Ty::Boolean,
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "Value({}, {})", self.id, self.ty)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Sdiv,
    Srem,
    Udiv,
    BitwiseAnd,
    BitwiseOr,
    BitwiseXor,
    Shl,
    Ashr,
}

impl BinOp {
    /// Applies the operation with 32-bit wrapping semantics. Returns `None` when the
    /// right operand is zero for a division or remainder.
    #[must_use]
    #[allow(clippy::cast_sign_loss, clippy::cast_possible_wrap)]
    pub fn apply(self, lhs: i32, rhs: i32) -> Option<i32> {
        match self {
            BinOp::Add => Some(lhs.wrapping_add(rhs)),
            BinOp::Sub => Some(lhs.wrapping_sub(rhs)),
            BinOp::Mul => Some(lhs.wrapping_mul(rhs)),
            BinOp::Sdiv => (rhs != 0).then(|| lhs.wrapping_div(rhs)),
            BinOp::Srem => (rhs != 0).then(|| lhs.wrapping_rem(rhs)),
            BinOp::Udiv => (rhs != 0).then(|| ((lhs as u32) / (rhs as u32)) as i32),
            BinOp::BitwiseAnd => Some(lhs & rhs),
            BinOp::BitwiseOr => Some(lhs | rhs),
            BinOp::BitwiseXor => Some(lhs ^ rhs),
            BinOp::Shl => Some(lhs.wrapping_shl(rhs as u32)),
            BinOp::Ashr => Some(lhs.wrapping_shr(rhs as u32)),
        }
    }

    /// Infix symbol used in SSA-style labels.
    #[must_use]
    pub fn symbol(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Sdiv => "/",
            BinOp::Srem => "%",
            BinOp::Udiv => "/u",
            BinOp::BitwiseAnd => "&",
            BinOp::BitwiseOr => "|",
            BinOp::BitwiseXor => "^",
            BinOp::Shl => "<<",
            BinOp::Ashr => ">>",
        }
    }
}

impl Display for BinOp {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let name = match self {
            BinOp::Add => "Add",
            BinOp::Sub => "Sub",
            BinOp::Mul => "Mul",
            BinOp::Sdiv => "Sdiv",
            BinOp::Srem => "Srem",
            BinOp::Udiv => "Udiv",
            BinOp::BitwiseAnd => "BitwiseAnd",
            BinOp::BitwiseOr => "BitwiseOr",
            BinOp::BitwiseXor => "BitwiseXor",
            BinOp::Shl => "Shl",
            BinOp::Ashr => "Ashr",
        };
        write!(f, "{name}")
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Predicate {
    Eq,
    Ne,
    Slt,
    Sle,
    Sgt,
    Sge,
    Ult,
    Ule,
    Ugt,
    Uge,
}

impl Predicate {
    #[must_use]
    #[allow(clippy::cast_sign_loss)]
    pub fn apply(self, lhs: i32, rhs: i32) -> bool {
        match self {
            Predicate::Eq => lhs == rhs,
            Predicate::Ne => lhs != rhs,
            Predicate::Slt => lhs < rhs,
            Predicate::Sle => lhs <= rhs,
            Predicate::Sgt => lhs > rhs,
            Predicate::Sge => lhs >= rhs,
            Predicate::Ult => (lhs as u32) < (rhs as u32),
            Predicate::Ule => (lhs as u32) <= (rhs as u32),
            Predicate::Ugt => (lhs as u32) > (rhs as u32),
            Predicate::Uge => (lhs as u32) >= (rhs as u32),
        }
    }

    #[must_use]
    pub fn is_unsigned(self) -> bool {
        matches!(
            self,
            Predicate::Ult | Predicate::Ule | Predicate::Ugt | Predicate::Uge
        )
    }

    #[must_use]
    pub fn symbol(self) -> &'static str {
        match self {
            Predicate::Eq => "==",
            Predicate::Ne => "!=",
            Predicate::Slt | Predicate::Ult => "<",
            Predicate::Sle | Predicate::Ule => "<=",
            Predicate::Sgt | Predicate::Ugt => ">",
            Predicate::Sge | Predicate::Uge => ">=",
        }
    }
}

impl Display for Predicate {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let name = match self {
            Predicate::Eq => "eq",
            Predicate::Ne => "ne",
            Predicate::Slt => "slt",
            Predicate::Sle => "sle",
            Predicate::Sgt => "sgt",
            Predicate::Sge => "sge",
            Predicate::Ult => "ult",
            Predicate::Ule => "ule",
            Predicate::Ugt => "ugt",
            Predicate::Uge => "uge",
        };
        write!(f, "{name}")
    }
}
