// Local simplification: per-instruction constant folding and algebraic
// identities, using only the instruction's own operands. When a simpler
// value exists the instruction's uses are redirected to it and the
// instruction is erased.

use crate::stats::Stats;
use ir::{BlockId, Function, InstId, Opcode, Operand, Predicate, Type};

pub fn run(func: &mut Function, stats: &mut Stats) -> bool {
    let mut changed = false;
    let block_ids: Vec<BlockId> = func.blocks().iter().map(|b| b.id).collect();
    for block in block_ids {
        // Snapshot: the list shrinks as instructions are erased.
        let ids: Vec<InstId> = func.block(block).insts().to_vec();
        for id in ids {
            let Some(replacement) = simplified_value(func, id) else {
                continue;
            };
            func.replace_all_uses_with(id, replacement);
            func.erase_from_parent(id);
            stats.simplified += 1;
            changed = true;
        }
    }
    changed
}

/// A value the instruction can be replaced by, if one exists. Returns
/// `None` for erased instructions and for anything not provably
/// simplifiable from its own operands.
fn simplified_value(func: &Function, id: InstId) -> Option<Operand> {
    let inst = func.inst(id)?;
    let ops = &inst.operands;
    match inst.opcode {
        opcode if opcode.is_binary() => {
            if let (Operand::Const(a), Operand::Const(b)) = (&ops[0], &ops[1]) {
                if let Some(value) = fold_binary(opcode, *a, *b, inst.ty) {
                    return Some(Operand::Const(value));
                }
            }
            algebraic_identity(opcode, &ops[0], &ops[1])
        }
        Opcode::ICmp => {
            let pred = inst.predicate?;
            if let (Operand::Const(a), Operand::Const(b)) = (&ops[0], &ops[1]) {
                let width = int_width(inst.ty)?;
                return Some(Operand::Const(fold_icmp(pred, *a, *b, width) as i64));
            }
            // x <pred> x for the reflexive/irreflexive integer predicates.
            if ops[0] == ops[1] {
                return match pred {
                    Predicate::Eq
                    | Predicate::Ule
                    | Predicate::Uge
                    | Predicate::Sle
                    | Predicate::Sge => Some(Operand::Const(1)),
                    Predicate::Ne
                    | Predicate::Ult
                    | Predicate::Ugt
                    | Predicate::Slt
                    | Predicate::Sgt => Some(Operand::Const(0)),
                    _ => None,
                };
            }
            None
        }
        Opcode::Select => {
            if let Operand::Const(cond) = &ops[0] {
                return Some(if *cond != 0 { ops[1].clone() } else { ops[2].clone() });
            }
            if ops[1] == ops[2] {
                return Some(ops[1].clone());
            }
            None
        }
        Opcode::Trunc => {
            if let Operand::Const(value) = &ops[0] {
                let width = int_width(inst.ty)?;
                return Some(Operand::Const(truncate(*value, width)));
            }
            None
        }
        _ => None,
    }
}

fn algebraic_identity(opcode: Opcode, a: &Operand, b: &Operand) -> Option<Operand> {
    let a_zero = matches!(a, Operand::Const(0));
    let b_zero = matches!(b, Operand::Const(0));
    let b_one = matches!(b, Operand::Const(1));
    match opcode {
        Opcode::Add => {
            if a_zero {
                return Some(b.clone());
            }
            if b_zero {
                return Some(a.clone());
            }
            None
        }
        Opcode::Sub => {
            if b_zero {
                return Some(a.clone());
            }
            if a == b {
                return Some(Operand::Const(0));
            }
            None
        }
        Opcode::Mul => {
            if a_zero || b_zero {
                return Some(Operand::Const(0));
            }
            if matches!(a, Operand::Const(1)) {
                return Some(b.clone());
            }
            if b_one {
                return Some(a.clone());
            }
            None
        }
        Opcode::UDiv | Opcode::SDiv => b_one.then(|| a.clone()),
        Opcode::URem | Opcode::SRem => b_one.then_some(Operand::Const(0)),
        Opcode::And => {
            if a_zero || b_zero {
                return Some(Operand::Const(0));
            }
            (a == b).then(|| a.clone())
        }
        Opcode::Or => {
            if a_zero {
                return Some(b.clone());
            }
            if b_zero || a == b {
                return Some(a.clone());
            }
            None
        }
        Opcode::Xor => {
            if a == b {
                return Some(Operand::Const(0));
            }
            if a_zero {
                return Some(b.clone());
            }
            b_zero.then(|| a.clone())
        }
        Opcode::Shl | Opcode::LShr | Opcode::AShr => {
            if b_zero {
                return Some(a.clone());
            }
            a_zero.then_some(Operand::Const(0))
        }
        _ => None,
    }
}

fn int_width(ty: Type) -> Option<u32> {
    match ty {
        Type::I1 => Some(1),
        Type::I8 => Some(8),
        Type::I16 => Some(16),
        Type::I32 => Some(32),
        Type::I64 => Some(64),
        _ => None,
    }
}

// Reduce a 64-bit value to `width` bits, sign-extended back to i64.
fn truncate(value: i64, width: u32) -> i64 {
    if width >= 64 {
        return value;
    }
    let mask = (1i64 << width) - 1;
    let low = value & mask;
    if low & (1i64 << (width - 1)) != 0 {
        low | !mask
    } else {
        low
    }
}

fn zext_bits(value: i64, width: u32) -> u64 {
    if width >= 64 {
        value as u64
    } else {
        (value as u64) & ((1u64 << width) - 1)
    }
}

fn fold_binary(opcode: Opcode, a: i64, b: i64, ty: Type) -> Option<i64> {
    let width = int_width(ty)?;
    let sa = truncate(a, width);
    let sb = truncate(b, width);
    let ua = zext_bits(a, width);
    let ub = zext_bits(b, width);
    let value = match opcode {
        Opcode::Add => sa.wrapping_add(sb),
        Opcode::Sub => sa.wrapping_sub(sb),
        Opcode::Mul => sa.wrapping_mul(sb),
        // Division and remainder by zero stay as written.
        Opcode::SDiv => {
            if sb == 0 {
                return None;
            }
            sa.wrapping_div(sb)
        }
        Opcode::UDiv => {
            if ub == 0 {
                return None;
            }
            (ua / ub) as i64
        }
        Opcode::SRem => {
            if sb == 0 {
                return None;
            }
            sa.wrapping_rem(sb)
        }
        Opcode::URem => {
            if ub == 0 {
                return None;
            }
            (ua % ub) as i64
        }
        Opcode::Shl => {
            if ub >= width as u64 {
                return None;
            }
            sa.wrapping_shl(ub as u32)
        }
        Opcode::LShr => {
            if ub >= width as u64 {
                return None;
            }
            (ua >> ub) as i64
        }
        Opcode::AShr => {
            if ub >= width as u64 {
                return None;
            }
            sa >> ub
        }
        Opcode::And => sa & sb,
        Opcode::Or => sa | sb,
        Opcode::Xor => sa ^ sb,
        // Float arithmetic is never folded here.
        _ => return None,
    };
    Some(truncate(value, width))
}

fn fold_icmp(pred: Predicate, a: i64, b: i64, width: u32) -> bool {
    let sa = truncate(a, width);
    let sb = truncate(b, width);
    let ua = zext_bits(a, width);
    let ub = zext_bits(b, width);
    match pred {
        Predicate::Eq | Predicate::Oeq => sa == sb,
        Predicate::Ne | Predicate::One => sa != sb,
        Predicate::Ugt => ua > ub,
        Predicate::Uge => ua >= ub,
        Predicate::Ult => ua < ub,
        Predicate::Ule => ua <= ub,
        Predicate::Sgt | Predicate::Ogt => sa > sb,
        Predicate::Sge | Predicate::Oge => sa >= sb,
        Predicate::Slt | Predicate::Olt => sa < sb,
        Predicate::Sle | Predicate::Ole => sa <= sb,
    }
}
