// Dead code elimination: erase instructions with zero uses and a pure
// opcode. Sweeps forward per block and repeats until a sweep removes
// nothing, so chains that become dead one link at a time are fully
// cleaned up in one call.

use crate::classify;
use crate::stats::Stats;
use ir::{BlockId, Function, InstId};

pub fn remove_dead(func: &mut Function, stats: &mut Stats) -> bool {
    let mut changed = false;
    loop {
        let mut removed_any = false;
        let block_ids: Vec<BlockId> = func.blocks().iter().map(|b| b.id).collect();
        for block in block_ids {
            let ids: Vec<InstId> = func.block(block).insts().to_vec();
            for id in ids {
                if classify::is_dead(func, id) {
                    // Zero uses by definition of dead, so no redirect needed.
                    func.erase_from_parent(id);
                    stats.dead += 1;
                    removed_any = true;
                }
            }
        }
        if !removed_any {
            break;
        }
        changed = true;
    }
    changed
}
