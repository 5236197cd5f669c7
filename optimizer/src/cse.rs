// Common subexpression elimination, scoped by dominance.
//
// For each eligible instruction I, every later equivalent instruction in
// the same block is merged into I, and so is every equivalent instruction
// in blocks I's block dominates (transitively down the dominator tree).
// In both cases I is guaranteed to have executed on every path reaching
// the duplicate, so the merge is sound. The earlier instruction is always
// the canonical one.

use crate::classify;
use crate::stats::Stats;
use ir::dom::DomTree;
use ir::{BlockId, Function, InstId, Operand};

pub fn run(func: &mut Function, stats: &mut Stats) -> bool {
    // CSE never edits the CFG, so one tree stays valid for the whole scan.
    let dom = DomTree::compute(func);
    let mut changed = false;
    let block_ids: Vec<BlockId> = func.blocks().iter().map(|b| b.id).collect();
    for block in block_ids {
        let ids: Vec<InstId> = func.block(block).insts().to_vec();
        for (position, &id) in ids.iter().enumerate() {
            let Some(inst) = func.inst(id) else {
                continue; // merged into an earlier instruction this scan
            };
            if !classify::cse_supports(inst) {
                continue;
            }
            // Same block, strictly after I.
            for &later in &ids[position + 1..] {
                if equivalent(func, id, later) {
                    merge(func, id, later, stats);
                    changed = true;
                }
            }
            // Every block the dominator tree places under I's block.
            let mut worklist: Vec<BlockId> = dom.children(block).to_vec();
            while let Some(child) = worklist.pop() {
                let child_ids: Vec<InstId> = func.block(child).insts().to_vec();
                for later in child_ids {
                    if equivalent(func, id, later) {
                        merge(func, id, later, stats);
                        changed = true;
                    }
                }
                worklist.extend_from_slice(dom.children(child));
            }
        }
    }
    changed
}

fn merge(func: &mut Function, keep: InstId, drop: InstId, stats: &mut Stats) {
    func.replace_all_uses_with(drop, Operand::Inst(keep));
    func.erase_from_parent(drop);
    stats.eliminated += 1;
}

/// Pairwise equivalence: same opcode, same type, operands identical by
/// reference at every index (no commutative matching), and for icmp the
/// same predicate. Erased instructions never match.
fn equivalent(func: &Function, a: InstId, b: InstId) -> bool {
    if a == b {
        return false;
    }
    let (Some(ia), Some(ib)) = (func.inst(a), func.inst(b)) else {
        return false;
    };
    ia.opcode == ib.opcode
        && ia.ty == ib.ty
        && ia.operands.len() == ib.operands.len()
        && ia.operands == ib.operands
        && ia.predicate == ib.predicate
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
    fn merges_a_same_block_duplicate() {
        let mut f = func_of(
            "define i32 @f(i32 %x, i32 %y) {\n\
             entry:\n\
             \x20 %a = add i32 %x, %y\n\
             \x20 %b = add i32 %x, %y\n\
             \x20 ret i32 %b\n\
             }\n",
        );
        let mut stats = Stats::default();
        assert!(run(&mut f, &mut stats));
        assert_eq!(stats.eliminated, 1);
        let entry = f.blocks()[0].id;
        assert_eq!(f.block(entry).insts().len(), 1);
        let a = f.block(entry).insts()[0];
        assert!(matches!(
            f.block(entry).terminator(),
            Terminator::Ret(Some(Operand::Inst(id))) if *id == a
        ));
    }

    #[test]
    fn different_predicates_never_merge() {
        let mut f = func_of(
            "define i32 @f(i32 %x, i32 %y) {\n\
             entry:\n\
             \x20 %p = icmp eq i32 %x, %y\n\
             \x20 %q = icmp ne i32 %x, %y\n\
             \x20 %z = zext i1 %p to i32\n\
             \x20 %w = zext i1 %q to i32\n\
             \x20 %s = add i32 %z, %w\n\
             \x20 ret i32 %s\n\
             }\n",
        );
        let mut stats = Stats::default();
        assert!(!run(&mut f, &mut stats));
        assert_eq!(stats.eliminated, 0);
        assert_eq!(f.live_inst_count(), 5);
    }

    #[test]
    fn matching_icmp_predicates_merge() {
        let mut f = func_of(
            "define i1 @f(i32 %x, i32 %y) {\n\
             entry:\n\
             \x20 %p = icmp slt i32 %x, %y\n\
             \x20 %q = icmp slt i32 %x, %y\n\
             \x20 %r = and i1 %p, %q\n\
             \x20 ret i1 %r\n\
             }\n",
        );
        let mut stats = Stats::default();
        run(&mut f, &mut stats);
        assert_eq!(stats.eliminated, 1);
    }

    #[test]
    fn swapped_operands_do_not_match() {
        let mut f = func_of(
            "define i32 @f(i32 %x, i32 %y) {\n\
             entry:\n\
             \x20 %a = add i32 %x, %y\n\
             \x20 %b = add i32 %y, %x\n\
             \x20 %s = add i32 %a, %b\n\
             \x20 ret i32 %s\n\
             }\n",
        );
        let mut stats = Stats::default();
        assert!(!run(&mut f, &mut stats));
        assert_eq!(stats.eliminated, 0);
    }

    #[test]
    fn loads_are_left_to_the_memory_pass() {
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
        assert!(!run(&mut f, &mut stats));
        assert_eq!(stats.eliminated, 0);
        assert_eq!(f.live_inst_count(), 3);
    }

    #[test]
    fn eliminates_into_dominated_blocks() {
        // entry dominates both arms and the merge block; all three copies
        // of the add fold into the one in entry.
        let mut f = func_of(
            "define i32 @f(i32 %x, i32 %y, i1 %c) {\n\
             entry:\n\
             \x20 %a = add i32 %x, %y\n\
             \x20 br i1 %c, label %then, label %else\n\
             then:\n\
             \x20 %b = add i32 %x, %y\n\
             \x20 br label %merge\n\
             else:\n\
             \x20 %d = add i32 %x, %y\n\
             \x20 br label %merge\n\
             merge:\n\
             \x20 %e = add i32 %x, %y\n\
             \x20 %s = add i32 %a, %e\n\
             \x20 ret i32 %s\n\
             }\n",
        );
        let mut stats = Stats::default();
        run(&mut f, &mut stats);
        assert_eq!(stats.eliminated, 3);
        let entry = f.blocks()[0].id;
        let a = f.block(entry).insts()[0];
        assert_eq!(f.use_count(a), 2); // both operands of %s
    }

    #[test]
    fn descends_through_grandchild_blocks() {
        // leaf's immediate dominator is mid, not entry; the duplicate in
        // leaf must still fold into entry's copy two levels up.
        let mut f = func_of(
            "define i32 @f(i32 %x, i32 %y, i1 %c) {\n\
             entry:\n\
             \x20 %a = add i32 %x, %y\n\
             \x20 br label %mid\n\
             mid:\n\
             \x20 br i1 %c, label %leaf, label %exit\n\
             leaf:\n\
             \x20 %b = add i32 %x, %y\n\
             \x20 ret i32 %b\n\
             exit:\n\
             \x20 ret i32 %a\n\
             }\n",
        );
        let mut stats = Stats::default();
        assert!(run(&mut f, &mut stats));
        assert_eq!(stats.eliminated, 1);
        let entry = f.blocks()[0].id;
        let leaf = f.blocks()[2].id;
        assert!(f.block(leaf).insts().is_empty());
        let a = f.block(entry).insts()[0];
        assert!(matches!(
            f.block(leaf).terminator(),
            Terminator::Ret(Some(Operand::Inst(id))) if *id == a
        ));
    }

    #[test]
    fn sibling_branches_never_merge_into_each_other() {
        // Neither arm dominates the other; the duplicates must survive.
        let mut f = func_of(
            "define i32 @f(i32 %x, i32 %y, i1 %c) {\n\
             entry:\n\
             \x20 br i1 %c, label %then, label %else\n\
             then:\n\
             \x20 %a = add i32 %x, %y\n\
             \x20 ret i32 %a\n\
             else:\n\
             \x20 %b = add i32 %x, %y\n\
             \x20 ret i32 %b\n\
             }\n",
        );
        let mut stats = Stats::default();
        assert!(!run(&mut f, &mut stats));
        assert_eq!(stats.eliminated, 0);
        assert_eq!(f.live_inst_count(), 2);
    }

    #[test]
    fn later_duplicate_is_the_one_erased() {
        let mut f = func_of(
            "define i32 @f(i32 %x) {\n\
             entry:\n\
             \x20 %a = mul i32 %x, %x\n\
             \x20 %b = mul i32 %x, %x\n\
             \x20 %c = mul i32 %x, %x\n\
             \x20 %s = add i32 %a, %b\n\
             \x20 %t = add i32 %s, %c\n\
             \x20 ret i32 %t\n\
             }\n",
        );
        let mut stats = Stats::default();
        run(&mut f, &mut stats);
        assert_eq!(stats.eliminated, 2);
        let entry = f.blocks()[0].id;
        let a = f.block(entry).insts()[0];
        assert_eq!(f.inst(a).unwrap().name, "a");
        assert_eq!(f.use_count(a), 3);
    }
}
