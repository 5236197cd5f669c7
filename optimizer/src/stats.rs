use ir::{Module, Opcode};

/// Per-run optimization counters. Created by the orchestrator, incremented
/// exactly once per matching event by each sub-pass, read at end of run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Stats {
    /// Dead instructions removed.
    pub dead: u64,
    /// Redundant instructions merged into an earlier equivalent.
    pub eliminated: u64,
    /// Instructions replaced by a simpler value.
    pub simplified: u64,
    /// Redundant loads merged into an earlier load.
    pub loads_elided: u64,
    /// Loads replaced by a preceding store's value.
    pub forwarded: u64,
    /// Stores proven dead by a later store.
    pub stores_elided: u64,
}

impl Stats {
    /// Counter rows in the order they are reported, as `(name, value)`.
    pub fn rows(&self) -> [(&'static str, u64); 6] {
        [
            ("CSEDead", self.dead),
            ("CSEElim", self.eliminated),
            ("CSESimplify", self.simplified),
            ("CSELdElim", self.loads_elided),
            ("CSEStore2Load", self.forwarded),
            ("CSEStElim", self.stores_elided),
        ]
    }

    pub fn total(&self) -> u64 {
        self.rows().iter().map(|&(_, value)| value).sum()
    }
}

/// Post-run module shape counters, reported alongside [`Stats`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub functions: u64,
    pub instructions: u64,
    pub loads: u64,
    pub stores: u64,
}

impl Summary {
    pub fn collect(module: &Module) -> Self {
        let mut summary = Summary::default();
        for func in &module.functions {
            if func.blocks().is_empty() {
                continue;
            }
            summary.functions += 1;
            for block in func.blocks() {
                for &id in block.insts() {
                    let Some(inst) = func.inst(id) else { continue };
                    summary.instructions += 1;
                    match inst.opcode {
                        Opcode::Load => summary.loads += 1,
                        Opcode::Store => summary.stores += 1,
                        _ => {}
                    }
                }
            }
        }
        summary
    }

    pub fn rows(&self) -> [(&'static str, u64); 4] {
        [
            ("Functions", self.functions),
            ("Instructions", self.instructions),
            ("Loads", self.loads),
            ("Stores", self.stores),
        ]
    }
}
