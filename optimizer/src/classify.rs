// Per-instruction eligibility policy shared by the passes.

use ir::{Function, InstId, Instruction, Opcode};

/// True iff the opcode has no externally visible effect: its only output
/// is its result value, so a zero-use instance can be removed.
fn is_pure(opcode: Opcode) -> bool {
    opcode.is_binary()
        || opcode.is_cast()
        || matches!(
            opcode,
            Opcode::FNeg
                | Opcode::ICmp
                | Opcode::FCmp
                | Opcode::Select
                | Opcode::Alloca
                | Opcode::GetElementPtr
                | Opcode::ExtractElement
                | Opcode::InsertElement
                | Opcode::ShuffleVector
                | Opcode::ExtractValue
                | Opcode::InsertValue
                | Opcode::Phi
        )
}

/// True iff the instruction has zero uses and a pure opcode. A volatile
/// load is never dead regardless of use count; stores, calls and va_arg
/// are never dead. Erased instructions report false.
pub fn is_dead(func: &Function, id: InstId) -> bool {
    let Some(inst) = func.inst(id) else {
        return false;
    };
    match inst.opcode {
        Opcode::Load => !inst.volatile && func.use_count(id) == 0,
        opcode if is_pure(opcode) => func.use_count(id) == 0,
        _ => false,
    }
}

/// True iff the instruction may participate in equivalence matching.
///
/// Memory operations, phis, calls, allocas and va_arg are excluded for
/// the usual effect/position reasons. fcmp is excluded while icmp is
/// not: floating-point predicates interact with NaN under reordering,
/// so merging them is unsafe without ordered-predicate reasoning.
pub fn cse_supports(inst: &Instruction) -> bool {
    !matches!(
        inst.opcode,
        Opcode::Load
            | Opcode::Store
            | Opcode::Phi
            | Opcode::Call
            | Opcode::Alloca
            | Opcode::FCmp
            | Opcode::VaArg
            | Opcode::ExtractValue
    )
}
