// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Translation of classical integer code into the reversible dialect, followed by
//! the graph passes that make the result executable without implicit copies or
//! premature overwrites.


pub mod config;
pub mod control;
pub mod error;
pub mod passes;
pub mod tracker;
pub mod translate;

pub use config::{Config, PassFlags};
pub use error::Error;

use passes::EnforceStats;
use revq_cir::cir::{self, Function};
use revq_dialect::{dialect::Program, graph::DependencyGraph};

/// Every artifact produced while compiling one function.
#[derive(Clone, Debug)]
pub struct Compilation {
    /// Output of translation, before any graph pass.
    pub translated: Program,
    /// The graph after enforcement.
    pub graph: DependencyGraph,
    /// The final program, in the graph's schedule order.
    pub program: Program,
    pub stats: EnforceStats,
}

pub fn compile_function(function: &Function, config: &Config) -> Result<Compilation, Error> {
    let translated = translate::translate(function)?;
    let mut graph = DependencyGraph::from_program(&translated)?;
    let stats = passes::enforce(&mut graph, config)?;
    let program = graph.to_program();
    check_write_in_place(&program, config)?;

    Ok(Compilation {
        translated,
        graph,
        program,
        stats,
    })
}

/// Final check on a lowered program, fail-fast or aggregated as `config` asks.
fn check_write_in_place(program: &Program, config: &Config) -> Result<(), Error> {
    if !config.passes.contains(PassFlags::VERIFY) {
        return Ok(());
    }
    if config.collect_all_violations {
        let violations = passes::verify_all(program);
        if violations.is_empty() {
            Ok(())
        } else {
            Err(Error::Violations { violations })
        }
    } else {
        passes::verify(program)
    }
}

/// Compiles each function on its own. A failure in one function does not affect
/// the others.
#[must_use]
pub fn compile_program(program: &cir::Program, config: &Config) -> Vec<Result<Compilation, Error>> {
    program
        .functions
        .iter()
        .map(|function| compile_function(function, config))
        .collect()
}
