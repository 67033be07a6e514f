// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#[cfg(test)]
mod tests;

use revq_dialect::graph::DependencyGraph;
use rustc_hash::FxHashSet;

/// Ensures no instruction reads the same producer through two slots. Each repeated
/// read is rewired to a clone of the producer that differs only in its path.
/// Returns the number of clones made.
pub fn normalize(graph: &mut DependencyGraph) -> usize {
    let mut splits = 0;
    // Consumers are visited before their producers, and clones are queued so that a
    // producer that itself reads one node twice gets fixed in the clone as well.
    let mut worklist = graph.schedule().to_vec();
    while let Some(node) = worklist.pop() {
        if !graph.contains(node) {
            continue;
        }
        let inputs = graph.node(node).inputs.clone();
        let mut seen = FxHashSet::default();
        for (index, producer) in inputs.into_iter().enumerate() {
            if seen.insert(producer) {
                continue;
            }
            let clone = graph.split(producer);
            log::trace!(
                "{node} reads {producer} through {} again, rewired to clone {clone}",
                graph.node(node).slot(index)
            );
            graph.rewire(node, index, clone);
            worklist.push(clone);
            splits += 1;
        }
    }
    if splits > 0 {
        log::debug!("normalization split {splits} producers");
    }
    splits
}
