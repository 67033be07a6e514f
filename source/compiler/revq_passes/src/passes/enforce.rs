// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Rewrites a dependency graph until it obeys the reversible-execution rules:
//!
//! - no instruction reads one producer through two slots (normalization),
//! - no instruction reads two paths of the same register version,
//! - no in-place write destroys a value that is still read afterwards.
//!
//! Violations are repaired by recomputing the offending value into fresh
//! registers right before the instruction that needs it. Repairs can introduce new
//! violations, so the rules run in rounds until a round changes nothing.

#[cfg(test)]
mod tests;

use super::normalize;
use crate::{Config, Error, PassFlags};
use revq_dialect::{
    dialect::Register,
    graph::{DependencyGraph, NodeId, NodeOrigin},
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EnforceStats {
    /// Rounds run, including the final round that found nothing to do.
    pub iterations: usize,
    /// Clones made by normalization.
    pub splits: usize,
    /// Operands of one instruction separated from a same-version partner.
    pub duplications: usize,
    /// Nodes emitted by recomputation.
    pub recomputed: usize,
    /// Clones and recomputations deleted for having no consumers.
    pub swept: usize,
}

pub fn enforce(graph: &mut DependencyGraph, config: &Config) -> Result<EnforceStats, Error> {
    let mut stats = EnforceStats::default();
    loop {
        if stats.iterations >= config.max_iterations {
            return Err(Error::EnforcementDidNotConverge {
                iterations: stats.iterations,
            });
        }
        stats.iterations += 1;

        let mut changed = false;
        if config.passes.contains(PassFlags::NORMALIZE) {
            let splits = normalize(graph);
            stats.splits += splits;
            changed |= splits > 0;
        }
        if config.passes.contains(PassFlags::NO_SELF_PAIRING) {
            changed |= separate_same_version_operands(graph, &mut stats);
        }
        let swept = sweep(graph);
        stats.swept += swept;
        changed |= swept > 0;
        if config.passes.contains(PassFlags::NO_PREMATURE_OVERWRITE) {
            changed |= preserve_overwritten_operands(graph, &mut stats);
        }

        if !changed {
            break;
        }
    }
    log::debug!("enforcement on {} finished: {stats:?}", graph.name());
    Ok(stats)
}

/// An instruction may not read two registers that share an id and version. The
/// later slot gets its own recomputed copy.
fn separate_same_version_operands(graph: &mut DependencyGraph, stats: &mut EnforceStats) -> bool {
    let mut changed = false;
    for node in graph.schedule().to_vec() {
        let input_count = graph.node(node).inputs.len();
        for later in 1..input_count {
            let Some(register) = input_register(graph, node, later) else {
                continue;
            };
            let paired = (0..later).any(|earlier| {
                input_register(graph, node, earlier)
                    .is_some_and(|other| other.same_version(&register))
            });
            if !paired {
                continue;
            }

            let producer = graph.node(node).inputs[later];
            let copy = recompute(graph, producer, node, stats);
            log::debug!(
                "{node} pairs {register} with its own version, {} now reads recomputed {copy}",
                graph.node(node).slot(later)
            );
            graph.rewire(node, later, copy);
            stats.duplications += 1;
            changed = true;
        }
    }
    changed
}

/// An in-place write may not consume its left operand while another instruction
/// still reads that operand later on. The writer is given a recomputed copy of the
/// operand to destroy instead.
fn preserve_overwritten_operands(graph: &mut DependencyGraph, stats: &mut EnforceStats) -> bool {
    let mut changed = false;
    for writer in graph.schedule().to_vec() {
        if !graph.node(writer).op.writes_in_place() {
            continue;
        }
        let producer = graph.node(writer).inputs[0];
        let positions = graph.positions();
        let position = positions[&writer];
        let read_later = graph.uses().get(&producer).is_some_and(|uses| {
            uses.iter()
                .any(|reader| reader.node != writer && positions[&reader.node] > position)
        });
        if !read_later {
            continue;
        }

        let copy = recompute(graph, producer, writer, stats);
        log::debug!("{writer} would overwrite {producer} before its last read, now writes {copy}");
        graph.rewire(writer, 0, copy);
        changed = true;
    }
    changed
}

fn recompute(
    graph: &mut DependencyGraph,
    producer: NodeId,
    before: NodeId,
    stats: &mut EnforceStats,
) -> NodeId {
    let len = graph.len();
    let copy = graph.recompute(producer, before);
    stats.recomputed += graph.len() - len;
    copy
}

fn input_register(
    graph: &DependencyGraph,
    node: NodeId,
    input: usize,
) -> Option<Register> {
    graph.node(graph.node(node).inputs[input]).register
}

/// Deletes clones and recomputations nothing reads, repeating as deletions free up
/// their own inputs. Translated nodes are always kept.
fn sweep(graph: &mut DependencyGraph) -> usize {
    let mut swept = 0;
    loop {
        let uses = graph.uses();
        let dead = graph
            .iter()
            .filter(|(id, node)| {
                node.origin != NodeOrigin::Translated
                    && node.op.has_result()
                    && !uses.contains_key(id)
            })
            .map(|(id, _)| id)
            .collect::<Vec<_>>();
        if dead.is_empty() {
            break;
        }
        for id in dead {
            graph.remove(id);
            swept += 1;
        }
    }
    if swept > 0 {
        log::debug!("swept {swept} unused nodes");
    }
    swept
}
