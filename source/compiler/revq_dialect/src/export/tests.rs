// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use expect_test::expect;
use revq_cir::cir::{BinOp, Ty};

use super::{GraphExport, RegisterTrace, to_dot};
use crate::{
    dialect::{Instruction, Program, Register, RegisterId},
    graph::{DependencyGraph, NodeId},
};

fn int(id: u32, version: u32) -> Register {
    Register {
        version,
        ..Register::new(RegisterId(id), Ty::Integer)
    }
}

fn add_program() -> Program {
    Program::new(
        "main".into(),
        vec![
            Instruction::Init(2, int(0, 0)),
            Instruction::Init(3, int(1, 0)),
            Instruction::Binary(BinOp::Add, int(0, 0), int(1, 0), int(0, 1)),
            Instruction::Return(int(0, 1)),
        ],
    )
}

#[test]
fn dot_labels_nodes_with_ssa_form_and_edges_with_slots() {
    let mut graph = DependencyGraph::from_program(&add_program()).expect("graph should build");
    let clone = graph.split(NodeId(1));
    graph.rewire(NodeId(2), 1, clone);

    expect![[r#"
        digraph "main" {
            n0 [label="%r0.v0 = 2"];
            n1 [label="%r1.v0 = 3"];
            n4 [label="%r1.v0.p1 = 3", style=dashed];
            n2 [label="%r0.v1 = %r0.v0 + %r1.v0.p1"];
            n3 [label="return %r0.v1"];
            n0 -> n2 [label="lhs"];
            n4 -> n2 [label="rhs"];
            n2 -> n3 [label="operand"];
        }"#]]
    .assert_eq(&to_dot(&graph));
}

#[test]
fn json_export_lists_nodes_and_edges() {
    let program = Program::new(
        "tiny".into(),
        vec![Instruction::Init(5, int(0, 0)), Instruction::Return(int(0, 0))],
    );
    let graph = DependencyGraph::from_program(&program).expect("graph should build");
    let json = GraphExport::new(&graph)
        .to_json()
        .expect("export should serialize");

    expect![[r#"
        {
          "name": "tiny",
          "nodes": [
            {
              "id": 0,
              "label": "%r0.v0 = 5",
              "register": {
                "id": 0,
                "version": 0,
                "path": 0
              },
              "origin": "translated"
            },
            {
              "id": 1,
              "label": "return %r0.v0",
              "origin": "translated"
            }
          ],
          "edges": [
            {
              "from": 0,
              "to": 1,
              "slot": "operand",
              "multiplicity": 1
            }
          ]
        }"#]]
    .assert_eq(&json);

    let parsed: GraphExport = serde_json::from_str(&json).expect("export should parse");
    assert_eq!(parsed, GraphExport::new(&graph));
}

#[test]
fn json_export_counts_parallel_edges() {
    let program = Program::new(
        "double".into(),
        vec![
            Instruction::Init(4, int(0, 0)),
            Instruction::Init(0, int(1, 0)),
            Instruction::Binary(BinOp::Add, int(1, 0), int(0, 0), int(1, 1)),
            Instruction::Binary(BinOp::Mul, int(1, 1), int(1, 1), int(1, 2)),
        ],
    );
    let graph = DependencyGraph::from_program(&program).expect("graph should build");
    let export = GraphExport::new(&graph);
    let multiplicities = export
        .edges
        .iter()
        .map(|edge| (edge.from, edge.to, edge.multiplicity))
        .collect::<Vec<_>>();
    assert_eq!(
        multiplicities,
        vec![(1, 2, 1), (0, 2, 1), (2, 3, 2), (2, 3, 2)]
    );
}

#[test]
fn trace_has_a_column_per_register_path() {
    let program = Program::new(
        "main".into(),
        vec![
            Instruction::Init(2, int(0, 0)),
            Instruction::Init(3, int(1, 0)),
            Instruction::Binary(BinOp::Add, int(0, 0), int(1, 0), int(0, 1)),
            Instruction::Init(2, int(0, 0).with_path(1)),
            Instruction::Return(int(0, 1)),
        ],
    );
    let trace = RegisterTrace::new(&program);
    assert_eq!(trace.rows[2].registers.len(), 3);

    expect![[r#"
        step | r0    | r0.p1 | r1  | operation
        0    | =v0   |       |     | %r0.v0 = 2
        1    |       |       | =v0 | %r1.v0 = 3
        2    | v0>v1 |       | v0  | %r0.v1 = %r0.v0 + %r1.v0
        3    |       | =v0   |     | %r0.v0.p1 = 2
        4    | v1    |       |     | return %r0.v1"#]]
    .assert_eq(&trace.to_string());
}

#[test]
fn trace_json_lists_rows_with_their_registers() {
    let program = Program::new(
        "dec".into(),
        vec![
            Instruction::Init(5, int(0, 0)),
            Instruction::BinaryImm(BinOp::Sub, int(0, 0), 1, int(0, 1)),
        ],
    );
    let trace = RegisterTrace::new(&program);
    let json = trace.to_json().expect("trace should serialize");

    expect![[r#"
        {
          "columns": [
            "r0"
          ],
          "rows": [
            {
              "timestep": 0,
              "registers": [
                {
                  "id": 0,
                  "version": 0,
                  "path": 0
                }
              ],
              "cells": [
                "=v0"
              ],
              "operation": "%r0.v0 = 5"
            },
            {
              "timestep": 1,
              "registers": [
                {
                  "id": 0,
                  "version": 0,
                  "path": 0
                },
                {
                  "id": 0,
                  "version": 1,
                  "path": 0
                }
              ],
              "cells": [
                "v0>v1"
              ],
              "operation": "%r0.v1 = %r0.v0 - 1"
            }
          ]
        }"#]]
    .assert_eq(&json);

    let parsed: RegisterTrace = serde_json::from_str(&json).expect("trace should parse");
    assert_eq!(parsed, trace);
}
