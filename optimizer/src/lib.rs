// Optimizer module: redundancy elimination over the IR
//
// Module organization:
// - classify.rs: per-instruction dead/eligible policy
// - simplify.rs: constant folding and algebraic identities
// - dce.rs: dead code elimination
// - cse.rs: dominance-scoped common subexpression elimination
// - memory.rs: redundant load/store elimination and store forwarding
// - stats.rs: run counters and module summary

mod classify;
mod cse;
mod dce;
mod memory;
mod simplify;
mod stats;

pub use stats::{Stats, Summary};

use ir::Module;

/// Run the full elimination schedule over every function in the module.
///
/// The schedule is fixed, not iterated to a fixpoint:
/// simplify, removeDead, cse, redundantLoad, redundantStore, cse,
/// simplify, removeDead. CSE runs again after the memory passes because
/// forwarding exposes duplicate computations, and the trailing
/// simplify/removeDead sweep cleans up whatever the memory passes
/// orphaned.
///
/// # Arguments
/// * `module` - The module to optimize in place
///
/// # Returns
/// * Counters for every elimination the run performed
pub fn run_cse(module: &mut Module) -> Stats {
    let mut stats = Stats::default();
    for func in &mut module.functions {
        simplify::run(func, &mut stats);
        dce::remove_dead(func, &mut stats);
        cse::run(func, &mut stats);
        memory::redundant_loads(func, &mut stats);
        memory::redundant_stores(func, &mut stats);
        cse::run(func, &mut stats);
        simplify::run(func, &mut stats);
        dce::remove_dead(func, &mut stats);
    }
    stats
}
