// Redundant memory operation elimination. Same-block forward scans only,
// with exact address-operand identity standing in for alias analysis:
// any intervening store, call, or unmatched memory access is assumed to
// alias and stops the scan.

use crate::stats::Stats;
use ir::{BlockId, Function, InstId, Opcode, Operand};

/// Load-after-load: a later non-volatile load of the same address and
/// access type rereads the value the earlier load already produced. Any
/// store or call ends the window.
pub fn redundant_loads(func: &mut Function, stats: &mut Stats) -> bool {
    let mut changed = false;
    let block_ids: Vec<BlockId> = func.blocks().iter().map(|b| b.id).collect();
    for block in block_ids {
        let ids: Vec<InstId> = func.block(block).insts().to_vec();
        for (position, &id) in ids.iter().enumerate() {
            let Some(inst) = func.inst(id) else { continue };
            if inst.opcode != Opcode::Load {
                continue;
            }
            let address = inst.operands[0].clone();
            let ty = inst.ty;
            for &later in &ids[position + 1..] {
                let Some(candidate) = func.inst(later) else {
                    continue;
                };
                match candidate.opcode {
                    Opcode::Load
                        if !candidate.volatile
                            && candidate.ty == ty
                            && candidate.operands[0] == address =>
                    {
                        func.replace_all_uses_with(later, Operand::Inst(id));
                        func.erase_from_parent(later);
                        stats.loads_elided += 1;
                        changed = true;
                    }
                    // A volatile load rereads memory but writes nothing.
                    Opcode::Load => {}
                    Opcode::Store | Opcode::Call => break,
                    _ => {}
                }
            }
        }
    }
    changed
}

/// Store-to-load forwarding and dead store elimination. For a
/// non-volatile store S: a later non-volatile load of the same address
/// and type takes S's stored value instead; a later store of the same
/// address and type proves S dead (nothing observed it). Any other
/// load, store, or call ends the window. Volatile stores open no window
/// at all: their value must not be forwarded and they are never elided.
pub fn redundant_stores(func: &mut Function, stats: &mut Stats) -> bool {
    let mut changed = false;
    let block_ids: Vec<BlockId> = func.blocks().iter().map(|b| b.id).collect();
    for block in block_ids {
        let ids: Vec<InstId> = func.block(block).insts().to_vec();
        for (position, &id) in ids.iter().enumerate() {
            let Some(inst) = func.inst(id) else { continue };
            if inst.opcode != Opcode::Store || inst.volatile {
                continue;
            }
            let value = inst.operands[0].clone();
            let address = inst.operands[1].clone();
            let ty = inst.ty;
            for &later in &ids[position + 1..] {
                let Some(candidate) = func.inst(later) else {
                    continue;
                };
                match candidate.opcode {
                    Opcode::Load
                        if !candidate.volatile
                            && candidate.ty == ty
                            && candidate.operands[0] == address =>
                    {
                        func.replace_all_uses_with(later, value.clone());
                        func.erase_from_parent(later);
                        stats.forwarded += 1;
                        changed = true;
                    }
                    Opcode::Store
                        if candidate.ty == ty && candidate.operands[1] == address =>
                    {
                        // The later store overwrites S before any read.
                        func.erase_from_parent(id);
                        stats.stores_elided += 1;
                        changed = true;
                        break;
                    }
                    Opcode::Load | Opcode::Store | Opcode::Call => break,
                    _ => {}
                }
            }
        }
    }
    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use ir::Terminator;

    fn func_of(text: &str) -> Function {
        let mut m = parser::parse_module(text).unwrap();
        m.functions.remove(0)
    }

    #[test]
    fn second_load_reuses_the_first() {
        let mut f = func_of(
            "global i32 @g\n\
             define i32 @f() {\n\
             entry:\n\
             \x20 %a = load i32, ptr @g\n\
             \x20 %b = load i32, ptr @g\n\
             \x20 %s = add i32 %a, %b\n\
             \x20 ret i32 %s\n\
             }\n",
        );
        let mut stats = Stats::default();
        assert!(redundant_loads(&mut f, &mut stats));
        assert_eq!(stats.loads_elided, 1);
        let entry = f.blocks()[0].id;
        let a = f.block(entry).insts()[0];
        assert_eq!(f.use_count(a), 2);
        assert_eq!(f.live_inst_count(), 2);
    }

    #[test]
    fn a_store_in_between_blocks_load_reuse() {
        let mut f = func_of(
            "global i32 @g\n\
             define i32 @f(i32 %v) {\n\
             entry:\n\
             \x20 %a = load i32, ptr @g\n\
             \x20 store i32 %v, ptr @g\n\
             \x20 %b = load i32, ptr @g\n\
             \x20 %s = add i32 %a, %b\n\
             \x20 ret i32 %s\n\
             }\n",
        );
        let mut stats = Stats::default();
        assert!(!redundant_loads(&mut f, &mut stats));
        assert_eq!(stats.loads_elided, 0);
    }

    #[test]
    fn a_call_in_between_blocks_load_reuse() {
        let mut f = func_of(
            "global i32 @g\n\
             define i32 @f() {\n\
             entry:\n\
             \x20 %a = load i32, ptr @g\n\
             \x20 call void @g()\n\
             \x20 %b = load i32, ptr @g\n\
             \x20 %s = add i32 %a, %b\n\
             \x20 ret i32 %s\n\
             }\n",
        );
        let mut stats = Stats::default();
        assert!(!redundant_loads(&mut f, &mut stats));
        assert_eq!(stats.loads_elided, 0);
    }

    #[test]
    fn volatile_reload_survives() {
        let mut f = func_of(
            "global i32 @g\n\
             define i32 @f() {\n\
             entry:\n\
             \x20 %a = load i32, ptr @g\n\
             \x20 %b = load volatile i32, ptr @g\n\
             \x20 %s = add i32 %a, %b\n\
             \x20 ret i32 %s\n\
             }\n",
        );
        let mut stats = Stats::default();
        assert!(!redundant_loads(&mut f, &mut stats));
        assert_eq!(stats.loads_elided, 0);
        assert_eq!(f.live_inst_count(), 3);
    }

    #[test]
    fn loads_from_different_addresses_are_untouched() {
        let mut f = func_of(
            "global i32 @g\n\
             global i32 @h\n\
             define i32 @f() {\n\
             entry:\n\
             \x20 %a = load i32, ptr @g\n\
             \x20 %b = load i32, ptr @h\n\
             \x20 %s = add i32 %a, %b\n\
             \x20 ret i32 %s\n\
             }\n",
        );
        let mut stats = Stats::default();
        assert!(!redundant_loads(&mut f, &mut stats));
        assert_eq!(stats.loads_elided, 0);
    }

    #[test]
    fn store_value_is_forwarded_to_a_following_load() {
        let mut f = func_of(
            "global i32 @g\n\
             define i32 @f(i32 %v) {\n\
             entry:\n\
             \x20 store i32 %v, ptr @g\n\
             \x20 %l = load i32, ptr @g\n\
             \x20 ret i32 %l\n\
             }\n",
        );
        let mut stats = Stats::default();
        assert!(redundant_stores(&mut f, &mut stats));
        assert_eq!(stats.forwarded, 1);
        assert!(matches!(
            f.blocks()[0].terminator(),
            Terminator::Ret(Some(Operand::Arg(0)))
        ));
        // The store itself remains.
        assert_eq!(f.live_inst_count(), 1);
    }

    #[test]
    fn overwritten_store_is_removed() {
        let mut f = func_of(
            "global i32 @g\n\
             define void @f(i32 %v, i32 %w) {\n\
             entry:\n\
             \x20 store i32 %v, ptr @g\n\
             \x20 store i32 %w, ptr @g\n\
             \x20 ret void\n\
             }\n",
        );
        let mut stats = Stats::default();
        assert!(redundant_stores(&mut f, &mut stats));
        assert_eq!(stats.stores_elided, 1);
        let entry = f.blocks()[0].id;
        assert_eq!(f.block(entry).insts().len(), 1);
        let kept = f.inst(f.block(entry).insts()[0]).unwrap();
        assert_eq!(kept.operands[0], Operand::Arg(1));
    }

    #[test]
    fn a_volatile_store_never_forwards_its_value() {
        let mut f = func_of(
            "global i32 @g\n\
             define i32 @f(i32 %v) {\n\
             entry:\n\
             \x20 store volatile i32 %v, ptr @g\n\
             \x20 %l = load i32, ptr @g\n\
             \x20 ret i32 %l\n\
             }\n",
        );
        let mut stats = Stats::default();
        assert!(!redundant_stores(&mut f, &mut stats));
        assert_eq!(stats.forwarded, 0);
        assert_eq!(f.live_inst_count(), 2);
        let entry = f.blocks()[0].id;
        let l = f.block(entry).insts()[1];
        assert!(matches!(
            f.block(entry).terminator(),
            Terminator::Ret(Some(Operand::Inst(id))) if *id == l
        ));
    }

    #[test]
    fn a_volatile_store_is_never_removed() {
        let mut f = func_of(
            "global i32 @g\n\
             define void @f(i32 %v, i32 %w) {\n\
             entry:\n\
             \x20 store volatile i32 %v, ptr @g\n\
             \x20 store i32 %w, ptr @g\n\
             \x20 ret void\n\
             }\n",
        );
        let mut stats = Stats::default();
        assert!(!redundant_stores(&mut f, &mut stats));
        assert_eq!(stats.stores_elided, 0);
        assert_eq!(f.live_inst_count(), 2);
    }

    #[test]
    fn an_intervening_read_keeps_the_earlier_store() {
        let mut f = func_of(
            "global i32 @g\n\
             global i32 @h\n\
             define i32 @f(i32 %v, i32 %w) {\n\
             entry:\n\
             \x20 store i32 %v, ptr @g\n\
             \x20 %l = load i32, ptr @h\n\
             \x20 store i32 %w, ptr @g\n\
             \x20 ret i32 %l\n\
             }\n",
        );
        let mut stats = Stats::default();
        assert!(!redundant_stores(&mut f, &mut stats));
        assert_eq!(stats.stores_elided, 0);
        assert_eq!(f.live_inst_count(), 3);
    }

    #[test]
    fn forwarding_continues_past_the_forwarded_load() {
        let mut f = func_of(
            "global i32 @g\n\
             define i32 @f(i32 %v) {\n\
             entry:\n\
             \x20 store i32 %v, ptr @g\n\
             \x20 %a = load i32, ptr @g\n\
             \x20 %b = load i32, ptr @g\n\
             \x20 %s = add i32 %a, %b\n\
             \x20 ret i32 %s\n\
             }\n",
        );
        let mut stats = Stats::default();
        redundant_stores(&mut f, &mut stats);
        assert_eq!(stats.forwarded, 2);
        let entry = f.blocks()[0].id;
        let s = f.block(entry).insts()[1];
        assert_eq!(
            f.inst(s).unwrap().operands,
            vec![Operand::Arg(0), Operand::Arg(0)]
        );
    }
}
