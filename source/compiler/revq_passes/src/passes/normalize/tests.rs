// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use expect_test::{Expect, expect};
use revq_cir::cir::{BinOp, Ty};
use revq_dialect::{
    dialect::{Instruction, Program, Register, RegisterId},
    graph::DependencyGraph,
};

use super::normalize;

fn int(id: u32, version: u32) -> Register {
    Register {
        version,
        ..Register::new(RegisterId(id), Ty::Integer)
    }
}

fn check(instructions: Vec<Instruction>, splits: usize, expect: &Expect) {
    let program = Program::new("main".into(), instructions);
    let mut graph = DependencyGraph::from_program(&program).expect("graph should build");
    assert_eq!(normalize(&mut graph), splits);
    expect.assert_eq(&graph.to_program().to_string());

    // A second run finds nothing left to split.
    assert_eq!(normalize(&mut graph), 0);
}

#[test]
fn repeated_operand_is_read_from_a_clone() {
    check(
        vec![
            Instruction::Init(5, int(0, 0)),
            Instruction::Binary(BinOp::Add, int(0, 0), int(0, 0), int(0, 1)),
            Instruction::Return(int(0, 1)),
        ],
        1,
        &expect![[r#"
            Program main:
                %r0.v0 = init 5
                %r0.v0.p1 = init 5
                %r0.v1 = add %r0.v0, %r0.v0.p1
                return %r0.v1"#]],
    );
}

#[test]
fn clones_of_double_readers_are_normalized_too() {
    check(
        vec![
            Instruction::Init(2, int(0, 0)),
            Instruction::Binary(BinOp::Mul, int(0, 0), int(0, 0), int(0, 1)),
            Instruction::Binary(BinOp::Add, int(0, 1), int(0, 1), int(0, 2)),
            Instruction::Return(int(0, 2)),
        ],
        3,
        &expect![[r#"
            Program main:
                %r0.v0 = init 2
                %r0.v0.p2 = init 2
                %r0.v0.p1 = init 2
                %r0.v1 = mul %r0.v0, %r0.v0.p2
                %r0.v1.p1 = mul %r0.v0, %r0.v0.p1
                %r0.v2 = add %r0.v1, %r0.v1.p1
                return %r0.v2"#]],
    );
}

#[test]
fn distinct_operands_are_left_alone() {
    check(
        vec![
            Instruction::Init(2, int(0, 0)),
            Instruction::Init(3, int(1, 0)),
            Instruction::Binary(BinOp::Sub, int(0, 0), int(1, 0), int(0, 1)),
            Instruction::Return(int(0, 1)),
        ],
        0,
        &expect![[r#"
            Program main:
                %r0.v0 = init 2
                %r1.v0 = init 3
                %r0.v1 = sub %r0.v0, %r1.v0
                return %r0.v1"#]],
    );
}
