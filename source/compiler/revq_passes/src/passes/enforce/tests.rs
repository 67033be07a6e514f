// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use expect_test::{Expect, expect};
use revq_cir::cir::{BinOp, Predicate, Ty};
use revq_dialect::{
    dialect::{Instruction, Program, Register, RegisterId},
    eval::{self, evaluate},
    graph::DependencyGraph,
};

use super::{EnforceStats, enforce};
use crate::{Config, Error, PassFlags};

fn int(id: u32, version: u32) -> Register {
    Register {
        version,
        ..Register::new(RegisterId(id), Ty::Integer)
    }
}

fn graph(instructions: Vec<Instruction>) -> DependencyGraph {
    DependencyGraph::from_program(&Program::new("main".into(), instructions))
        .expect("graph should build")
}

fn check(graph: &mut DependencyGraph, stats: &EnforceStats, expect: &Expect) {
    let actual = enforce(graph, &Config::default()).expect("enforcement should converge");
    assert_eq!(actual, *stats);
    expect.assert_eq(&graph.to_program().to_string());
}

fn double_read() -> Vec<Instruction> {
    vec![
        Instruction::Init(5, int(0, 0)),
        Instruction::Binary(BinOp::Add, int(0, 0), int(0, 0), int(0, 1)),
        Instruction::Return(int(0, 1)),
    ]
}

fn read_after_overwrite() -> Vec<Instruction> {
    vec![
        Instruction::Init(4, int(0, 0)),
        Instruction::Init(1, int(1, 0)),
        Instruction::Binary(BinOp::Add, int(0, 0), int(1, 0), int(0, 1)),
        Instruction::Icmp(
            Predicate::Eq,
            int(0, 0),
            int(1, 0),
            Register::new(RegisterId(2), Ty::Boolean),
        ),
        Instruction::Return(int(0, 1)),
    ]
}

#[test]
fn split_operand_is_replaced_by_fresh_copy() {
    let mut graph = graph(double_read());
    check(
        &mut graph,
        &EnforceStats {
            iterations: 2,
            splits: 1,
            duplications: 1,
            recomputed: 1,
            swept: 1,
        },
        &expect![[r#"
            Program main:
                %r0.v0 = init 5
                %r1.v0 = init 5
                %r0.v1 = add %r0.v0, %r1.v0
                return %r0.v1"#]],
    );
    assert_eq!(evaluate(&graph.to_program()), Ok(vec![10]));
}

#[test]
fn pairing_with_an_in_place_result_recomputes_its_chain() {
    let mut graph = graph(vec![
        Instruction::Init(3, int(0, 0)),
        Instruction::Init(4, int(1, 0)),
        Instruction::Binary(BinOp::Add, int(0, 0), int(1, 0), int(0, 1)),
        Instruction::Binary(BinOp::Mul, int(0, 1), int(0, 1), int(0, 2)),
        Instruction::Return(int(0, 2)),
    ]);
    check(
        &mut graph,
        &EnforceStats {
            iterations: 2,
            splits: 1,
            duplications: 1,
            recomputed: 3,
            swept: 1,
        },
        &expect![[r#"
            Program main:
                %r0.v0 = init 3
                %r1.v0 = init 4
                %r0.v1 = add %r0.v0, %r1.v0
                %r2.v0 = init 3
                %r3.v0 = init 4
                %r2.v1 = add %r2.v0, %r3.v0
                %r0.v2 = mul %r0.v1, %r2.v1
                return %r0.v2"#]],
    );
    assert_eq!(evaluate(&graph.to_program()), Ok(vec![49]));
}

#[test]
fn writer_gets_a_copy_when_its_operand_is_read_later() {
    let mut graph = graph(read_after_overwrite());
    assert!(matches!(
        evaluate(&graph.to_program()),
        Err(eval::Error::StaleRead { index: 3, .. })
    ));

    check(
        &mut graph,
        &EnforceStats {
            iterations: 2,
            splits: 0,
            duplications: 0,
            recomputed: 1,
            swept: 0,
        },
        &expect![[r#"
            Program main:
                %r0.v0 = init 4
                %r1.v0 = init 1
                %r3.v0 = init 4
                %r3.v1 = add %r3.v0, %r1.v0
                %r2.v0 = icmp eq %r0.v0, %r1.v0
                return %r3.v1"#]],
    );
    assert_eq!(evaluate(&graph.to_program()), Ok(vec![5]));
}

#[test]
fn clean_graph_is_stable_after_one_round() {
    let mut graph = graph(vec![
        Instruction::Init(2, int(0, 0)),
        Instruction::Init(3, int(1, 0)),
        Instruction::Binary(BinOp::Add, int(0, 0), int(1, 0), int(0, 1)),
        Instruction::Binary(BinOp::Mul, int(0, 1), int(1, 0), int(0, 2)),
        Instruction::Return(int(0, 2)),
    ]);
    let before = graph.to_program();
    let stats = enforce(&mut graph, &Config::default()).expect("enforcement should converge");
    assert_eq!(stats.iterations, 1);
    assert_eq!(graph.to_program(), before);
}

#[test]
fn disabled_rules_leave_violations_in_place() {
    let mut graph = graph(double_read());
    let config = Config::default().with_passes(PassFlags::empty());
    let stats = enforce(&mut graph, &config).expect("enforcement should converge");
    assert_eq!(stats, EnforceStats {
        iterations: 1,
        ..EnforceStats::default()
    });
    assert_eq!(graph.node(graph.schedule()[1]).inputs.len(), 2);
    assert_eq!(graph.to_program().instructions, double_read());
}

#[test]
fn iteration_limit_is_enforced() {
    let mut graph = graph(read_after_overwrite());
    let config = Config::default().with_max_iterations(1);
    assert_eq!(
        enforce(&mut graph, &config),
        Err(Error::EnforcementDidNotConverge { iterations: 1 })
    );
}
