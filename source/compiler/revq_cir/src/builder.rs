// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.


use crate::cir::{BinOp, Block, Function, Instruction, Predicate, Value, ValueId};

/// Incrementally constructs a classical function, handing out fresh value ids in
/// definition order. Branch arms are built through closures so that nesting in the
/// builder mirrors nesting in the produced IR.
#[derive(Debug)]
pub struct Builder {
    next_value: ValueId,
    blocks: Vec<Block>,
}

impl Default for Builder {
    fn default() -> Self {
        Self::new()
    }
}

impl Builder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            next_value: ValueId::default(),
            blocks: vec![Block::default()],
        }
    }

    pub fn constant(&mut self, literal: i32) -> Value {
        let result = self.next_integer();
        self.push(Instruction::Constant(literal, result));
        result
    }

    pub fn binary(&mut self, op: BinOp, lhs: Value, rhs: Value) -> Value {
        let result = self.next_integer();
        self.push(Instruction::Binary(op, lhs, rhs, result));
        result
    }

    pub fn binary_imm(&mut self, op: BinOp, lhs: Value, imm: i32) -> Value {
        let result = self.next_integer();
        self.push(Instruction::BinaryImm(op, lhs, imm, result));
        result
    }

    pub fn add(&mut self, lhs: Value, rhs: Value) -> Value {
        self.binary(BinOp::Add, lhs, rhs)
    }

    pub fn sub(&mut self, lhs: Value, rhs: Value) -> Value {
        self.binary(BinOp::Sub, lhs, rhs)
    }

    pub fn mul(&mut self, lhs: Value, rhs: Value) -> Value {
        self.binary(BinOp::Mul, lhs, rhs)
    }

    pub fn sdiv(&mut self, lhs: Value, rhs: Value) -> Value {
        self.binary(BinOp::Sdiv, lhs, rhs)
    }

    pub fn icmp(&mut self, predicate: Predicate, lhs: Value, rhs: Value) -> Value {
        let result = self.next_boolean();
        self.push(Instruction::Icmp(predicate, lhs, rhs, result));
        result
    }

    pub fn logical_and(&mut self, lhs: Value, rhs: Value) -> Value {
        let result = self.next_boolean();
        self.push(Instruction::LogicalAnd(lhs, rhs, result));
        result
    }

    pub fn logical_or(&mut self, lhs: Value, rhs: Value) -> Value {
        let result = self.next_boolean();
        self.push(Instruction::LogicalOr(lhs, rhs, result));
        result
    }

    pub fn logical_not(&mut self, operand: Value) -> Value {
        let result = self.next_boolean();
        self.push(Instruction::LogicalNot(operand, result));
        result
    }

    pub fn branch(
        &mut self,
        cond: Value,
        then_arm: impl FnOnce(&mut Self),
        else_arm: impl FnOnce(&mut Self),
    ) {
        let then_block = self.build_block(then_arm);
        let else_block = self.build_block(else_arm);
        self.push(Instruction::Branch(cond, then_block, else_block));
    }

    pub fn ret(&mut self, value: Value) {
        self.push(Instruction::Return(value));
    }

    /// Appends an already formed instruction to the block under construction.
    /// Value ids used by the instruction are not checked against the builder's counter.
    pub fn push(&mut self, instr: Instruction) {
        self.blocks
            .last_mut()
            .expect("builder should always have an open block")
            .0
            .push(instr);
    }

    #[must_use]
    pub fn finish(mut self, name: &str) -> Function {
        assert_eq!(self.blocks.len(), 1, "unterminated branch arm in builder");
        Function {
            name: name.into(),
            body: self.blocks.pop().unwrap_or_default(),
        }
    }

    fn build_block(&mut self, arm: impl FnOnce(&mut Self)) -> Block {
        self.blocks.push(Block::default());
        arm(self);
        self.blocks
            .pop()
            .expect("branch arm block should still be open")
    }

    fn next_integer(&mut self) -> Value {
        let value = Value::new_integer(self.next_value);
        self.next_value = self.next_value.successor();
        value
    }

    fn next_boolean(&mut self) -> Value {
        let value = Value::new_boolean(self.next_value);
        self.next_value = self.next_value.successor();
        value
    }
}
