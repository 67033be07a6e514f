// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Dependency graph over dialect instructions.
//!
//! Every instruction is a node and every operand read is an edge from the node that
//! produced the register to the node that reads it, keyed by the operand slot. A
//! consumer that reads one producer through two slots holds two parallel edges.
//! The graph also keeps an explicit schedule so it can be lowered back to a program
//! in a valid execution order after rewriting.


use crate::dialect::{Instruction, Op, Program, Register, RegisterId, Slot};
use index_map::IndexMap;
use miette::Diagnostic;
use revq_cir::cir::Ty;
use rustc_hash::FxHashMap;
use std::{
    fmt::{self, Display, Formatter},
    rc::Rc,
};
use thiserror::Error;

#[derive(Clone, Debug, Diagnostic, Error, PartialEq, Eq)]
pub enum Error {
    #[error("instruction {index} `{instruction}` reads {register}, which no earlier instruction produces")]
    #[diagnostic(code("Revq.Graph.UnknownOperand"))]
    UnknownOperand {
        index: usize,
        instruction: Instruction,
        register: Register,
    },

    #[error("instruction {index} `{instruction}` produces {register}, which is already defined")]
    #[diagnostic(code("Revq.Graph.DuplicateRegister"))]
    #[diagnostic(help("every (id, version, path) triple must be written exactly once"))]
    DuplicateRegister {
        index: usize,
        instruction: Instruction,
        register: Register,
    },
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

impl NodeId {
    #[must_use]
    pub fn successor(self) -> Self {
        Self(self.0 + 1)
    }
}

impl From<NodeId> for usize {
    fn from(id: NodeId) -> Self {
        id.0
    }
}

impl From<usize> for NodeId {
    fn from(value: usize) -> Self {
        Self(value)
    }
}

impl Display for NodeId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// Where a node came from: the translator, a no-double-consume split, or a
/// recomputation emitted while enforcing constraints.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeOrigin {
    Translated,
    Split,
    Recomputed,
}

impl Display for NodeOrigin {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            NodeOrigin::Translated => write!(f, "translated"),
            NodeOrigin::Split => write!(f, "split"),
            NodeOrigin::Recomputed => write!(f, "recomputed"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Node {
    pub op: Op,
    /// Producers feeding each operand slot, in [`Op::slots`] order.
    pub inputs: Vec<NodeId>,
    pub register: Option<Register>,
    pub origin: NodeOrigin,
}

impl Node {
    /// The slot the `index`-th input feeds.
    #[must_use]
    pub fn slot(&self, index: usize) -> Slot {
        self.op.slots()[index]
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Edge {
    pub from: NodeId,
    pub to: NodeId,
    pub slot: Slot,
}

/// A consumer of some producer, identified by the consuming node and the index of
/// the input that reads the producer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Use {
    pub node: NodeId,
    pub input: usize,
}

#[derive(Clone, Debug)]
pub struct DependencyGraph {
    name: Rc<str>,
    nodes: IndexMap<NodeId, Node>,
    schedule: Vec<NodeId>,
    next_node: NodeId,
    next_register: RegisterId,
    next_path: FxHashMap<(RegisterId, u32), u32>,
}

impl DependencyGraph {
    /// Builds the graph of `program`, linking each operand to the instruction that
    /// produced exactly that register triple.
    pub fn from_program(program: &Program) -> Result<Self, Error> {
        let mut graph = Self {
            name: program.name.clone(),
            nodes: IndexMap::default(),
            schedule: Vec::new(),
            next_node: NodeId::default(),
            next_register: RegisterId::default(),
            next_path: FxHashMap::default(),
        };
        let mut producers: FxHashMap<(RegisterId, u32, u32), NodeId> = FxHashMap::default();

        for (index, instr) in program.instructions.iter().enumerate() {
            let mut inputs = Vec::new();
            for register in instr.operands() {
                let Some(producer) = producers.get(&register.triple()) else {
                    return Err(Error::UnknownOperand {
                        index,
                        instruction: instr.clone(),
                        register,
                    });
                };
                inputs.push(*producer);
            }

            let register = instr.result();
            let id = graph.add_node(Node {
                op: instr.op(),
                inputs,
                register,
                origin: NodeOrigin::Translated,
            });
            graph.schedule.push(id);

            if let Some(register) = register {
                if producers.insert(register.triple(), id).is_some() {
                    return Err(Error::DuplicateRegister {
                        index,
                        instruction: instr.clone(),
                        register,
                    });
                }
                graph.reserve(register);
            }
        }

        Ok(graph)
    }

    /// Lowers the graph back to a program following the schedule.
    #[must_use]
    pub fn to_program(&self) -> Program {
        let instructions = self.schedule.iter().map(|id| self.instruction(*id)).collect();
        Program::new(self.name.clone(), instructions)
    }

    /// The instruction a node stands for, with operands read from its producers.
    #[must_use]
    pub fn instruction(&self, id: NodeId) -> Instruction {
        let node = self.node(id);
        let operands = node
            .inputs
            .iter()
            .map(|input| {
                self.node(*input)
                    .register
                    .expect("producer node should have a result register")
            })
            .collect::<Vec<_>>();
        Instruction::from_parts(node.op, &operands, node.register)
    }

    #[must_use]
    pub fn name(&self) -> &Rc<str> {
        &self.name
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.schedule.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.schedule.is_empty()
    }

    #[must_use]
    pub fn schedule(&self) -> &[NodeId] {
        &self.schedule
    }

    #[must_use]
    pub fn node(&self, id: NodeId) -> &Node {
        self.nodes.get(id).expect("node should exist in graph")
    }

    #[must_use]
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Nodes in schedule order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.schedule.iter().map(|id| (*id, self.node(*id)))
    }

    /// All edges, grouped by consumer in schedule order and by slot within a consumer.
    #[must_use]
    pub fn edges(&self) -> Vec<Edge> {
        self.iter()
            .flat_map(|(to, node)| {
                node.op
                    .slots()
                    .iter()
                    .zip(&node.inputs)
                    .map(move |(slot, from)| Edge {
                        from: *from,
                        to,
                        slot: *slot,
                    })
            })
            .collect()
    }

    /// Number of parallel edges from `from` into `to`.
    #[must_use]
    pub fn edge_multiplicity(&self, from: NodeId, to: NodeId) -> usize {
        self.node(to)
            .inputs
            .iter()
            .filter(|input| **input == from)
            .count()
    }

    /// For each producer, its uses in schedule order.
    #[must_use]
    pub fn uses(&self) -> FxHashMap<NodeId, Vec<Use>> {
        let mut uses: FxHashMap<NodeId, Vec<Use>> = FxHashMap::default();
        for (node, data) in self.iter() {
            for (input, producer) in data.inputs.iter().enumerate() {
                uses.entry(*producer).or_default().push(Use { node, input });
            }
        }
        uses
    }

    /// Position of every scheduled node.
    #[must_use]
    pub fn positions(&self) -> FxHashMap<NodeId, usize> {
        self.schedule
            .iter()
            .enumerate()
            .map(|(position, id)| (*id, position))
            .collect()
    }

    /// Clones `producer` with the same shape, inputs, register id and version, and
    /// the next free path. The clone is scheduled right after the original.
    pub fn split(&mut self, producer: NodeId) -> NodeId {
        let original = self.node(producer).clone();
        let register = original.register.map(|register| {
            let path = self.alloc_path(register.id, register.version);
            register.with_path(path)
        });
        let position = self.position(producer) + 1;
        let id = self.add_node(Node {
            op: original.op,
            inputs: original.inputs,
            register,
            origin: NodeOrigin::Split,
        });
        self.schedule.insert(position, id);
        id
    }

    /// Re-emits the computation of `producer` into fresh registers, scheduled just
    /// before `before`. Value operands are recomputed recursively so the copy shares
    /// no register with the original; control operands are read as they are.
    /// Returns the node holding the recomputed value.
    pub fn recompute(&mut self, producer: NodeId, before: NodeId) -> NodeId {
        let position = self.position(before);
        let mut emitted = Vec::new();
        let root = self.clone_fresh(producer, &mut emitted);
        self.schedule.splice(position..position, emitted);
        root
    }

    fn clone_fresh(&mut self, producer: NodeId, emitted: &mut Vec<NodeId>) -> NodeId {
        let original = self.node(producer).clone();
        let mut inputs = Vec::with_capacity(original.inputs.len());
        for (index, input) in original.inputs.iter().enumerate() {
            if original.slot(index) == Slot::Ctrl {
                inputs.push(*input);
            } else {
                inputs.push(self.clone_fresh(*input, emitted));
            }
        }

        let register = match original.register {
            Some(_) if original.op.writes_in_place() => {
                let lhs = self
                    .node(inputs[0])
                    .register
                    .expect("left operand should produce a register");
                Some(self.derive_in_place(lhs))
            }
            Some(register) => Some(self.fresh_register(register.ty)),
            None => None,
        };

        let id = self.add_node(Node {
            op: original.op,
            inputs,
            register,
            origin: NodeOrigin::Recomputed,
        });
        emitted.push(id);
        id
    }

    /// Points input `input` of `consumer` at `producer`. When the left operand of a
    /// binary-family node changes, its result register is re-derived from the new
    /// left operand, and so is every in-place write chained on top of it.
    pub fn rewire(&mut self, consumer: NodeId, input: usize, producer: NodeId) {
        let node = self
            .nodes
            .get_mut(consumer)
            .expect("node should exist in graph");
        node.inputs[input] = producer;
        if input == 0 && node.op.writes_in_place() {
            self.rederive_chain(consumer);
        }
    }

    fn rederive_chain(&mut self, start: NodeId) {
        let mut worklist = vec![start];
        while let Some(id) = worklist.pop() {
            let lhs_node = self.node(id).inputs[0];
            let lhs = self
                .node(lhs_node)
                .register
                .expect("left operand should produce a register");
            let register = self.derive_in_place(lhs);
            self.nodes
                .get_mut(id)
                .expect("node should exist in graph")
                .register = Some(register);

            for (other, node) in self.nodes.iter() {
                if node.op.writes_in_place() && node.inputs.first() == Some(&id) {
                    worklist.push(other);
                }
            }
        }
    }

    /// Removes a node from the graph and the schedule. The caller is responsible for
    /// making sure nothing still reads it.
    pub fn remove(&mut self, id: NodeId) -> Node {
        self.schedule.retain(|scheduled| *scheduled != id);
        self.nodes.remove(id).expect("node should exist in graph")
    }

    /// Allocates a register with an id no node has used yet.
    pub fn fresh_register(&mut self, ty: Ty) -> Register {
        let id = self.next_register;
        self.next_register = id.successor();
        let path = self.alloc_path(id, 0);
        Register::new(id, ty).with_path(path)
    }

    fn derive_in_place(&mut self, lhs: Register) -> Register {
        let next = lhs.next_version();
        let path = self.alloc_path(next.id, next.version);
        next.with_path(path)
    }

    fn alloc_path(&mut self, id: RegisterId, version: u32) -> u32 {
        let next = self.next_path.entry((id, version)).or_default();
        let path = *next;
        *next += 1;
        path
    }

    fn reserve(&mut self, register: Register) {
        if register.id >= self.next_register {
            self.next_register = register.id.successor();
        }
        let next = self
            .next_path
            .entry((register.id, register.version))
            .or_default();
        *next = (*next).max(register.path + 1);
    }

    fn add_node(&mut self, node: Node) -> NodeId {
        let id = self.next_node;
        self.next_node = id.successor();
        self.nodes.insert(id, node);
        id
    }

    fn position(&self, id: NodeId) -> usize {
        self.schedule
            .iter()
            .position(|scheduled| *scheduled == id)
            .expect("node should be scheduled")
    }
}
