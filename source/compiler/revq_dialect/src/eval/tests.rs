// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use expect_test::expect;
use revq_cir::cir::{BinOp, Predicate, Ty};

use super::{Error, evaluate};
use crate::dialect::{Instruction, Program, Register, RegisterId};

fn int(id: u32, version: u32) -> Register {
    Register {
        version,
        ..Register::new(RegisterId(id), Ty::Integer)
    }
}

fn bit(id: u32) -> Register {
    Register::new(RegisterId(id), Ty::Boolean)
}

fn program(instructions: Vec<Instruction>) -> Program {
    Program::new("main".into(), instructions)
}

#[test]
fn straight_line_arithmetic() {
    let returned = evaluate(&program(vec![
        Instruction::Init(2, int(0, 0)),
        Instruction::Init(3, int(1, 0)),
        Instruction::Binary(BinOp::Add, int(0, 0), int(1, 0), int(0, 1)),
        Instruction::BinaryImm(BinOp::Mul, int(0, 1), 4, int(0, 2)),
        Instruction::Return(int(0, 2)),
    ]))
    .expect("program should run");
    assert_eq!(returned, vec![20]);
}

#[test]
fn controlled_ops_only_act_when_enabled() {
    let returned = evaluate(&program(vec![
        Instruction::Init(2, int(0, 0)),
        Instruction::Init(3, int(1, 0)),
        Instruction::Icmp(Predicate::Slt, int(0, 0), int(1, 0), bit(2)),
        Instruction::LogicalNot(bit(2), bit(3)),
        Instruction::CInit(bit(2), 7, int(4, 0)),
        Instruction::CInit(bit(3), 7, int(5, 0)),
        Instruction::CBinaryImm(BinOp::Add, int(4, 0), 1, bit(2), int(4, 1)),
        Instruction::CBinary(BinOp::Sub, int(0, 0), int(1, 0), bit(3), int(0, 1)),
        Instruction::CIcmp(Predicate::Eq, int(4, 1), int(4, 1), bit(3), bit(6)),
        Instruction::LogicalAnd(bit(2), bit(3), bit(7)),
        Instruction::Return(int(4, 1)),
        Instruction::Return(int(5, 0)),
        Instruction::Return(int(0, 1)),
        Instruction::Return(bit(6)),
        Instruction::Return(bit(7)),
    ]))
    .expect("program should run");
    assert_eq!(returned, vec![8, 0, 2, 0, 0]);
}

#[test]
fn paths_are_separate_lanes() {
    let returned = evaluate(&program(vec![
        Instruction::Init(5, int(0, 0)),
        Instruction::Init(5, int(0, 0).with_path(1)),
        Instruction::Binary(BinOp::Add, int(0, 0), int(0, 0).with_path(1), int(0, 1)),
        Instruction::Return(int(0, 1)),
    ]))
    .expect("program should run");
    assert_eq!(returned, vec![10]);
}

#[test]
fn reading_an_overwritten_register_fails() {
    let error = evaluate(&program(vec![
        Instruction::Init(2, int(0, 0)),
        Instruction::Init(3, int(1, 0)),
        Instruction::Binary(BinOp::Add, int(0, 0), int(1, 0), int(0, 1)),
        Instruction::Return(int(0, 0)),
    ]))
    .expect_err("program should fail");
    assert!(matches!(error, Error::StaleRead { index: 3, current: 1, .. }));
    expect!["instruction 3 `return %r0.v0` reads %r0.v0 but the register holds version 1"]
        .assert_eq(&error.to_string());
}

#[test]
fn reading_an_unwritten_register_fails() {
    let error = evaluate(&program(vec![Instruction::Return(int(0, 0))]))
        .expect_err("program should fail");
    assert!(matches!(error, Error::Uninitialized { index: 0, .. }));
}

#[test]
fn division_by_zero_fails() {
    let error = evaluate(&program(vec![
        Instruction::Init(1, int(0, 0)),
        Instruction::BinaryImm(BinOp::Sdiv, int(0, 0), 0, int(0, 1)),
    ]))
    .expect_err("program should fail");
    assert!(matches!(error, Error::DivisionByZero { index: 1, .. }));
}
