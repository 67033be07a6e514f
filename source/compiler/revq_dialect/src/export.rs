// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Textual and structured views of a dependency graph or program: Graphviz dot,
//! a JSON node/edge list, and a per-timestep register trace.

#[cfg(test)]
mod tests;

use crate::{
    dialect::{Instruction, Program, Register, RegisterId},
    graph::{DependencyGraph, NodeOrigin},
};
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeSet,
    fmt::{self, Display, Formatter, Write},
};

/// Human-readable SSA form of an instruction, e.g. `%r0.v1 = %r0.v0 + %r1.v0 if %r2.v0`.
#[must_use]
pub fn ssa_label(instr: &Instruction) -> String {
    match instr {
        Instruction::Init(literal, result) => format!("{result} = {literal}"),
        Instruction::CInit(ctrl, literal, result) => format!("{result} = {literal} if {ctrl}"),
        Instruction::Binary(op, lhs, rhs, result) => {
            format!("{result} = {lhs} {} {rhs}", op.symbol())
        }
        Instruction::BinaryImm(op, lhs, imm, result) => {
            format!("{result} = {lhs} {} {imm}", op.symbol())
        }
        Instruction::CBinary(op, lhs, rhs, ctrl, result) => {
            format!("{result} = {lhs} {} {rhs} if {ctrl}", op.symbol())
        }
        Instruction::CBinaryImm(op, lhs, imm, ctrl, result) => {
            format!("{result} = {lhs} {} {imm} if {ctrl}", op.symbol())
        }
        Instruction::Icmp(predicate, lhs, rhs, result) => {
            format!("{result} = {lhs} {} {rhs}", predicate.symbol())
        }
        Instruction::CIcmp(predicate, lhs, rhs, ctrl, result) => {
            format!("{result} = {lhs} {} {rhs} if {ctrl}", predicate.symbol())
        }
        Instruction::LogicalAnd(lhs, rhs, result) => format!("{result} = {lhs} && {rhs}"),
        Instruction::LogicalNot(operand, result) => format!("{result} = !{operand}"),
        Instruction::Return(value) => format!("return {value}"),
    }
}

/// Renders the graph in Graphviz dot syntax. Nodes introduced by rewriting are dashed.
#[must_use]
pub fn to_dot(graph: &DependencyGraph) -> String {
    Dot(graph).to_string()
}

struct Dot<'a>(&'a DependencyGraph);

impl Display for Dot<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let graph = self.0;
        writeln!(f, "digraph \"{}\" {{", escape(graph.name()))?;
        for (id, node) in graph.iter() {
            write!(
                f,
                "    {id} [label=\"{}\"",
                escape(&ssa_label(&graph.instruction(id)))
            )?;
            if node.origin != NodeOrigin::Translated {
                write!(f, ", style=dashed")?;
            }
            writeln!(f, "];")?;
        }
        for edge in graph.edges() {
            writeln!(f, "    {} -> {} [label=\"{}\"];", edge.from, edge.to, edge.slot)?;
        }
        write!(f, "}}")
    }
}

fn escape(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct RegisterExport {
    pub id: u32,
    pub version: u32,
    pub path: u32,
}

impl From<Register> for RegisterExport {
    fn from(register: Register) -> Self {
        Self {
            id: register.id.0,
            version: register.version,
            path: register.path,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct NodeExport {
    pub id: usize,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub register: Option<RegisterExport>,
    pub origin: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct EdgeExport {
    pub from: usize,
    pub to: usize,
    pub slot: String,
    /// Number of parallel edges between the same two nodes.
    pub multiplicity: usize,
}

/// A serializable snapshot of a dependency graph.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct GraphExport {
    pub name: String,
    pub nodes: Vec<NodeExport>,
    pub edges: Vec<EdgeExport>,
}

impl GraphExport {
    #[must_use]
    pub fn new(graph: &DependencyGraph) -> Self {
        let nodes = graph
            .iter()
            .map(|(id, node)| NodeExport {
                id: id.into(),
                label: ssa_label(&graph.instruction(id)),
                register: node.register.map(RegisterExport::from),
                origin: node.origin.to_string(),
            })
            .collect();
        let edges = graph
            .edges()
            .iter()
            .map(|edge| EdgeExport {
                from: edge.from.into(),
                to: edge.to.into(),
                slot: edge.slot.to_string(),
                multiplicity: graph.edge_multiplicity(edge.from, edge.to),
            })
            .collect();
        Self {
            name: graph.name().to_string(),
            nodes,
            edges,
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct TraceRow {
    pub timestep: usize,
    /// Every register the instruction reads or writes, operands first.
    pub registers: Vec<RegisterExport>,
    /// One cell per trace column: `v1` for a read, `=v1` for a write, `v0>v1` for both.
    pub cells: Vec<String>,
    pub operation: String,
}

/// Register activity per timestep. There is one column per physical register and
/// path, so values that coexist under the same id show up side by side.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct RegisterTrace {
    pub columns: Vec<String>,
    pub rows: Vec<TraceRow>,
}

impl RegisterTrace {
    #[must_use]
    pub fn new(program: &Program) -> Self {
        let mut lanes: BTreeSet<(RegisterId, u32)> = BTreeSet::new();
        for instr in &program.instructions {
            for register in instr.operands().into_iter().chain(instr.result()) {
                lanes.insert((register.id, register.path));
            }
        }
        let lanes = lanes.into_iter().collect::<Vec<_>>();

        let rows = program
            .instructions
            .iter()
            .enumerate()
            .map(|(timestep, instr)| {
                let operands = instr.operands();
                let result = instr.result();
                let cells = lanes
                    .iter()
                    .map(|lane| {
                        let read = operands
                            .iter()
                            .find(|reg| (reg.id, reg.path) == *lane)
                            .map(|reg| reg.version);
                        let written = result
                            .filter(|reg| (reg.id, reg.path) == *lane)
                            .map(|reg| reg.version);
                        match (read, written) {
                            (Some(read), Some(written)) => format!("v{read}>v{written}"),
                            (Some(read), None) => format!("v{read}"),
                            (None, Some(written)) => format!("=v{written}"),
                            (None, None) => String::new(),
                        }
                    })
                    .collect();
                TraceRow {
                    timestep,
                    registers: operands
                        .iter()
                        .copied()
                        .chain(result)
                        .map(RegisterExport::from)
                        .collect(),
                    cells,
                    operation: ssa_label(instr),
                }
            })
            .collect();

        let columns = lanes
            .iter()
            .map(|(id, path)| {
                if *path == 0 {
                    id.to_string()
                } else {
                    format!("{id}.p{path}")
                }
            })
            .collect();

        Self { columns, rows }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl Display for RegisterTrace {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let header = std::iter::once("step".to_string())
            .chain(self.columns.iter().cloned())
            .collect::<Vec<_>>();
        let body = self
            .rows
            .iter()
            .map(|row| {
                std::iter::once(row.timestep.to_string())
                    .chain(row.cells.iter().cloned())
                    .collect::<Vec<_>>()
            })
            .collect::<Vec<_>>();

        let mut widths = header.iter().map(String::len).collect::<Vec<_>>();
        for cells in &body {
            for (width, cell) in widths.iter_mut().zip(cells) {
                *width = (*width).max(cell.len());
            }
        }

        let mut out = String::new();
        for (cell, width) in header.iter().zip(widths.iter().copied()) {
            write!(out, "{cell:<width$} | ")?;
        }
        out.push_str("operation");
        for (cells, row) in body.iter().zip(&self.rows) {
            out.push('\n');
            for (cell, width) in cells.iter().zip(widths.iter().copied()) {
                write!(out, "{cell:<width$} | ")?;
            }
            out.push_str(&row.operation);
        }
        write!(f, "{out}")
    }
}
