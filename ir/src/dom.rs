// Dominator tree over a function's CFG.
//
// Block A dominates block B iff every path from the entry to B passes
// through A. Computed with the iterative Cooper-Harvey-Kennedy dataflow
// over reverse postorder. One tree is computed per function and passed to
// the passes that need it; the tree is only valid until the CFG changes
// (block or edge added/removed) and must be recomputed after.

use crate::{BlockId, Function};

pub struct DomTree {
    // idom[entry] = entry internally; exposed as None (tree root).
    idom: Vec<Option<BlockId>>,
    children: Vec<Vec<BlockId>>,
    rpo_number: Vec<Option<usize>>,
    entry: BlockId,
}

impl DomTree {
    pub fn compute(func: &Function) -> Self {
        let n = func.blocks().len();
        let entry = func.entry_block;

        // Postorder DFS from the entry; unreachable blocks get no number.
        let mut postorder: Vec<BlockId> = Vec::with_capacity(n);
        let mut visited = vec![false; n];
        let mut stack: Vec<(BlockId, usize)> = Vec::new();
        if n > 0 {
            visited[entry.0] = true;
            stack.push((entry, 0));
        }
        while let Some(frame) = stack.last_mut() {
            let (block, next) = *frame;
            let succs = func.successors(block);
            if next < succs.len() {
                frame.1 += 1;
                let succ = succs[next];
                if !visited[succ.0] {
                    visited[succ.0] = true;
                    stack.push((succ, 0));
                }
            } else {
                postorder.push(block);
                stack.pop();
            }
        }

        let rpo: Vec<BlockId> = postorder.iter().rev().copied().collect();
        let mut rpo_number: Vec<Option<usize>> = vec![None; n];
        for (number, block) in rpo.iter().enumerate() {
            rpo_number[block.0] = Some(number);
        }

        let preds = func.predecessors();
        let mut idom: Vec<Option<BlockId>> = vec![None; n];
        if n > 0 {
            idom[entry.0] = Some(entry);
        }

        let mut changed = true;
        while changed {
            changed = false;
            for &block in rpo.iter().skip(1) {
                let mut new_idom: Option<BlockId> = None;
                if let Some(block_preds) = preds.get(&block) {
                    for &pred in block_preds {
                        if idom[pred.0].is_none() {
                            continue; // unreachable or not yet processed
                        }
                        new_idom = Some(match new_idom {
                            None => pred,
                            Some(current) => intersect(&idom, &rpo_number, pred, current),
                        });
                    }
                }
                if let Some(found) = new_idom {
                    if idom[block.0] != Some(found) {
                        idom[block.0] = Some(found);
                        changed = true;
                    }
                }
            }
        }

        let mut children: Vec<Vec<BlockId>> = vec![Vec::new(); n];
        for index in 0..n {
            let block = BlockId(index);
            if block == entry {
                continue;
            }
            if let Some(parent) = idom[index] {
                children[parent.0].push(block);
            }
        }

        DomTree {
            idom,
            children,
            rpo_number,
            entry,
        }
    }

    /// Immediate dominator; `None` for the entry block and for blocks
    /// unreachable from the entry.
    pub fn idom(&self, block: BlockId) -> Option<BlockId> {
        if block == self.entry {
            return None;
        }
        self.idom[block.0]
    }

    /// Blocks whose immediate dominator is `block` (its dominator-tree
    /// children), in block order.
    pub fn children(&self, block: BlockId) -> &[BlockId] {
        &self.children[block.0]
    }

    pub fn is_reachable(&self, block: BlockId) -> bool {
        self.rpo_number[block.0].is_some()
    }

    /// True iff `a` dominates `b` (reflexively). Unreachable blocks
    /// dominate nothing and are dominated by nothing.
    pub fn dominates(&self, a: BlockId, b: BlockId) -> bool {
        if !self.is_reachable(a) || !self.is_reachable(b) {
            return false;
        }
        let mut current = b;
        loop {
            if current == a {
                return true;
            }
            match self.idom[current.0] {
                Some(parent) if parent != current => current = parent,
                _ => return false,
            }
        }
    }
}

// Walk both candidates up the partial idom tree until they meet; the one
// with the larger RPO number moves first.
fn intersect(
    idom: &[Option<BlockId>],
    rpo_number: &[Option<usize>],
    mut a: BlockId,
    mut b: BlockId,
) -> BlockId {
    while a != b {
        if rpo_number[a.0] > rpo_number[b.0] {
            match idom[a.0] {
                Some(parent) => a = parent,
                None => return b,
            }
        } else {
            match idom[b.0] {
                Some(parent) => b = parent,
                None => return a,
            }
        }
    }
    a
}
