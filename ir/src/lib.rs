// IR host: instruction/block/function/module containers, the operand and
// type system, and the use-list machinery the optimization passes rely on.
//
// Instructions live in a per-function arena and are referenced by `InstId`.
// Erasing an instruction tombstones its arena slot, so outstanding ids stay
// valid (lookups return `None`) and block lists never dangle. Every value
// producer carries a weak back-reference list of its users; the producer
// does not own its consumers, it only observes them.

use std::collections::HashMap;

pub mod dom;
pub mod printer;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct InstId(pub usize);

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct BlockId(pub usize);

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Type {
    Void,
    I1,
    I8,
    I16,
    I32,
    I64,
    F32,
    F64,
    Ptr,
}

impl Type {
    pub fn mnemonic(self) -> &'static str {
        match self {
            Type::Void => "void",
            Type::I1 => "i1",
            Type::I8 => "i8",
            Type::I16 => "i16",
            Type::I32 => "i32",
            Type::I64 => "i64",
            Type::F32 => "float",
            Type::F64 => "double",
            Type::Ptr => "ptr",
        }
    }

    pub fn from_mnemonic(text: &str) -> Option<Type> {
        Some(match text {
            "void" => Type::Void,
            "i1" => Type::I1,
            "i8" => Type::I8,
            "i16" => Type::I16,
            "i32" => Type::I32,
            "i64" => Type::I64,
            "float" => Type::F32,
            "double" => Type::F64,
            "ptr" => Type::Ptr,
            _ => return None,
        })
    }
}

/// The fixed opcode enumeration. Terminators are not instructions here;
/// they live in [`Terminator`] so a block structurally always ends in one.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Opcode {
    // Integer and float arithmetic
    Add,
    FAdd,
    Sub,
    FSub,
    Mul,
    FMul,
    UDiv,
    SDiv,
    FDiv,
    URem,
    SRem,
    FRem,
    FNeg,
    // Shifts and bitwise logic
    Shl,
    LShr,
    AShr,
    And,
    Or,
    Xor,
    // Casts
    Trunc,
    ZExt,
    SExt,
    FPToUI,
    FPToSI,
    UIToFP,
    SIToFP,
    FPTrunc,
    FPExt,
    PtrToInt,
    IntToPtr,
    BitCast,
    AddrSpaceCast,
    // Comparisons
    ICmp,
    FCmp,
    Select,
    // Memory
    Alloca,
    Load,
    Store,
    GetElementPtr,
    // Aggregate / vector
    ExtractElement,
    InsertElement,
    ShuffleVector,
    ExtractValue,
    InsertValue,
    // Other
    Phi,
    Call,
    VaArg,
}

impl Opcode {
    pub fn mnemonic(self) -> &'static str {
        match self {
            Opcode::Add => "add",
            Opcode::FAdd => "fadd",
            Opcode::Sub => "sub",
            Opcode::FSub => "fsub",
            Opcode::Mul => "mul",
            Opcode::FMul => "fmul",
            Opcode::UDiv => "udiv",
            Opcode::SDiv => "sdiv",
            Opcode::FDiv => "fdiv",
            Opcode::URem => "urem",
            Opcode::SRem => "srem",
            Opcode::FRem => "frem",
            Opcode::FNeg => "fneg",
            Opcode::Shl => "shl",
            Opcode::LShr => "lshr",
            Opcode::AShr => "ashr",
            Opcode::And => "and",
            Opcode::Or => "or",
            Opcode::Xor => "xor",
            Opcode::Trunc => "trunc",
            Opcode::ZExt => "zext",
            Opcode::SExt => "sext",
            Opcode::FPToUI => "fptoui",
            Opcode::FPToSI => "fptosi",
            Opcode::UIToFP => "uitofp",
            Opcode::SIToFP => "sitofp",
            Opcode::FPTrunc => "fptrunc",
            Opcode::FPExt => "fpext",
            Opcode::PtrToInt => "ptrtoint",
            Opcode::IntToPtr => "inttoptr",
            Opcode::BitCast => "bitcast",
            Opcode::AddrSpaceCast => "addrspacecast",
            Opcode::ICmp => "icmp",
            Opcode::FCmp => "fcmp",
            Opcode::Select => "select",
            Opcode::Alloca => "alloca",
            Opcode::Load => "load",
            Opcode::Store => "store",
            Opcode::GetElementPtr => "getelementptr",
            Opcode::ExtractElement => "extractelement",
            Opcode::InsertElement => "insertelement",
            Opcode::ShuffleVector => "shufflevector",
            Opcode::ExtractValue => "extractvalue",
            Opcode::InsertValue => "insertvalue",
            Opcode::Phi => "phi",
            Opcode::Call => "call",
            Opcode::VaArg => "va_arg",
        }
    }

    pub fn from_mnemonic(text: &str) -> Option<Opcode> {
        Some(match text {
            "add" => Opcode::Add,
            "fadd" => Opcode::FAdd,
            "sub" => Opcode::Sub,
            "fsub" => Opcode::FSub,
            "mul" => Opcode::Mul,
            "fmul" => Opcode::FMul,
            "udiv" => Opcode::UDiv,
            "sdiv" => Opcode::SDiv,
            "fdiv" => Opcode::FDiv,
            "urem" => Opcode::URem,
            "srem" => Opcode::SRem,
            "frem" => Opcode::FRem,
            "fneg" => Opcode::FNeg,
            "shl" => Opcode::Shl,
            "lshr" => Opcode::LShr,
            "ashr" => Opcode::AShr,
            "and" => Opcode::And,
            "or" => Opcode::Or,
            "xor" => Opcode::Xor,
            "trunc" => Opcode::Trunc,
            "zext" => Opcode::ZExt,
            "sext" => Opcode::SExt,
            "fptoui" => Opcode::FPToUI,
            "fptosi" => Opcode::FPToSI,
            "uitofp" => Opcode::UIToFP,
            "sitofp" => Opcode::SIToFP,
            "fptrunc" => Opcode::FPTrunc,
            "fpext" => Opcode::FPExt,
            "ptrtoint" => Opcode::PtrToInt,
            "inttoptr" => Opcode::IntToPtr,
            "bitcast" => Opcode::BitCast,
            "addrspacecast" => Opcode::AddrSpaceCast,
            "icmp" => Opcode::ICmp,
            "fcmp" => Opcode::FCmp,
            "select" => Opcode::Select,
            "alloca" => Opcode::Alloca,
            "load" => Opcode::Load,
            "store" => Opcode::Store,
            "getelementptr" => Opcode::GetElementPtr,
            "extractelement" => Opcode::ExtractElement,
            "insertelement" => Opcode::InsertElement,
            "shufflevector" => Opcode::ShuffleVector,
            "extractvalue" => Opcode::ExtractValue,
            "insertvalue" => Opcode::InsertValue,
            "phi" => Opcode::Phi,
            "call" => Opcode::Call,
            "va_arg" => Opcode::VaArg,
            _ => return None,
        })
    }

    /// Two-operand `op ty a, b` instructions.
    pub fn is_binary(self) -> bool {
        matches!(
            self,
            Opcode::Add
                | Opcode::FAdd
                | Opcode::Sub
                | Opcode::FSub
                | Opcode::Mul
                | Opcode::FMul
                | Opcode::UDiv
                | Opcode::SDiv
                | Opcode::FDiv
                | Opcode::URem
                | Opcode::SRem
                | Opcode::FRem
                | Opcode::Shl
                | Opcode::LShr
                | Opcode::AShr
                | Opcode::And
                | Opcode::Or
                | Opcode::Xor
        )
    }

    /// `op srcty a to dstty` instructions.
    pub fn is_cast(self) -> bool {
        matches!(
            self,
            Opcode::Trunc
                | Opcode::ZExt
                | Opcode::SExt
                | Opcode::FPToUI
                | Opcode::FPToSI
                | Opcode::UIToFP
                | Opcode::SIToFP
                | Opcode::FPTrunc
                | Opcode::FPExt
                | Opcode::PtrToInt
                | Opcode::IntToPtr
                | Opcode::BitCast
                | Opcode::AddrSpaceCast
        )
    }
}

/// Comparison predicate for icmp/fcmp. The `O*` variants are the ordered
/// float predicates; the rest are the integer predicates.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Predicate {
    Eq,
    Ne,
    Ugt,
    Uge,
    Ult,
    Ule,
    Sgt,
    Sge,
    Slt,
    Sle,
    Oeq,
    One,
    Ogt,
    Oge,
    Olt,
    Ole,
}

impl Predicate {
    pub fn mnemonic(self) -> &'static str {
        match self {
            Predicate::Eq => "eq",
            Predicate::Ne => "ne",
            Predicate::Ugt => "ugt",
            Predicate::Uge => "uge",
            Predicate::Ult => "ult",
            Predicate::Ule => "ule",
            Predicate::Sgt => "sgt",
            Predicate::Sge => "sge",
            Predicate::Slt => "slt",
            Predicate::Sle => "sle",
            Predicate::Oeq => "oeq",
            Predicate::One => "one",
            Predicate::Ogt => "ogt",
            Predicate::Oge => "oge",
            Predicate::Olt => "olt",
            Predicate::Ole => "ole",
        }
    }

    pub fn from_mnemonic(text: &str) -> Option<Predicate> {
        Some(match text {
            "eq" => Predicate::Eq,
            "ne" => Predicate::Ne,
            "ugt" => Predicate::Ugt,
            "uge" => Predicate::Uge,
            "ult" => Predicate::Ult,
            "ule" => Predicate::Ule,
            "sgt" => Predicate::Sgt,
            "sge" => Predicate::Sge,
            "slt" => Predicate::Slt,
            "sle" => Predicate::Sle,
            "oeq" => Predicate::Oeq,
            "one" => Predicate::One,
            "ogt" => Predicate::Ogt,
            "oge" => Predicate::Oge,
            "olt" => Predicate::Olt,
            "ole" => Predicate::Ole,
            _ => return None,
        })
    }
}

/// A value reference. `Inst` compares by arena identity, so operand
/// equality between two instructions is reference identity, not
/// structural equality.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Const(i64),
    Inst(InstId),
    Arg(usize),
    Global(String),
}

#[derive(Debug, Clone)]
pub struct Instruction {
    pub opcode: Opcode,
    /// The instruction's primary type: the result type for value producers,
    /// the accessed type for load/store, the element type for getelementptr.
    pub ty: Type,
    /// Result name, unique within the function; empty for non-producers
    /// (stores, void calls).
    pub name: String,
    pub operands: Vec<Operand>,
    /// Load/store only.
    pub volatile: bool,
    /// icmp/fcmp only.
    pub predicate: Option<Predicate>,
    /// Phi only: incoming block per operand, parallel to `operands`.
    pub incoming: Vec<BlockId>,
}

impl Instruction {
    pub fn new(opcode: Opcode, ty: Type, name: impl Into<String>, operands: Vec<Operand>) -> Self {
        Instruction {
            opcode,
            ty,
            name: name.into(),
            operands,
            volatile: false,
            predicate: None,
            incoming: Vec::new(),
        }
    }

    pub fn with_predicate(mut self, predicate: Predicate) -> Self {
        self.predicate = Some(predicate);
        self
    }

    pub fn with_volatile(mut self, volatile: bool) -> Self {
        self.volatile = volatile;
        self
    }

    /// Type of the value this instruction defines. Comparisons always
    /// produce `i1`; stores and void calls produce nothing.
    pub fn result_type(&self) -> Type {
        match self.opcode {
            Opcode::ICmp | Opcode::FCmp => Type::I1,
            Opcode::Store => Type::Void,
            Opcode::Alloca | Opcode::GetElementPtr => Type::Ptr,
            _ => self.ty,
        }
    }

    pub fn produces_value(&self) -> bool {
        self.result_type() != Type::Void
    }
}

#[derive(Debug, Clone)]
pub enum Terminator {
    Br(BlockId),
    CondBr {
        cond: Operand,
        then_block: BlockId,
        else_block: BlockId,
    },
    Switch {
        value: Operand,
        default: BlockId,
        cases: Vec<(i64, BlockId)>,
    },
    Ret(Option<Operand>),
    Unreachable,
}

impl Terminator {
    /// Every terminator reads at most one value.
    pub fn operand(&self) -> Option<&Operand> {
        match self {
            Terminator::CondBr { cond, .. } => Some(cond),
            Terminator::Switch { value, .. } => Some(value),
            Terminator::Ret(op) => op.as_ref(),
            Terminator::Br(_) | Terminator::Unreachable => None,
        }
    }

    pub fn operand_mut(&mut self) -> Option<&mut Operand> {
        match self {
            Terminator::CondBr { cond, .. } => Some(cond),
            Terminator::Switch { value, .. } => Some(value),
            Terminator::Ret(op) => op.as_mut(),
            Terminator::Br(_) | Terminator::Unreachable => None,
        }
    }

    pub fn successors(&self) -> Vec<BlockId> {
        match self {
            Terminator::Br(target) => vec![*target],
            Terminator::CondBr {
                then_block,
                else_block,
                ..
            } => vec![*then_block, *else_block],
            Terminator::Switch { default, cases, .. } => {
                let mut succs = vec![*default];
                succs.extend(cases.iter().map(|&(_, b)| b));
                succs
            }
            Terminator::Ret(_) | Terminator::Unreachable => Vec::new(),
        }
    }
}

/// A consumer of an instruction's result: either another instruction or a
/// block terminator. One entry per use edge, so an instruction using a
/// value twice appears twice.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum User {
    Inst(InstId),
    Terminator(BlockId),
}

#[derive(Debug, Clone)]
struct Slot {
    inst: Option<Instruction>,
    users: Vec<User>,
    block: BlockId,
}

#[derive(Debug, Clone)]
pub struct BasicBlock {
    pub id: BlockId,
    pub label: String,
    insts: Vec<InstId>,
    terminator: Terminator,
}

impl BasicBlock {
    /// Live instructions in block order.
    pub fn insts(&self) -> &[InstId] {
        &self.insts
    }

    pub fn terminator(&self) -> &Terminator {
        &self.terminator
    }
}

#[derive(Debug, Clone)]
pub struct Param {
    pub ty: Type,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct Function {
    pub name: String,
    pub return_type: Type,
    pub params: Vec<Param>,
    pub entry_block: BlockId,
    blocks: Vec<BasicBlock>,
    slots: Vec<Slot>,
}

impl Function {
    pub fn new(name: impl Into<String>, return_type: Type, params: Vec<Param>) -> Self {
        Function {
            name: name.into(),
            return_type,
            params,
            entry_block: BlockId(0),
            blocks: Vec::new(),
            slots: Vec::new(),
        }
    }

    /// New block ending in `Unreachable` until a terminator is set.
    pub fn add_block(&mut self, label: impl Into<String>) -> BlockId {
        let id = BlockId(self.blocks.len());
        self.blocks.push(BasicBlock {
            id,
            label: label.into(),
            insts: Vec::new(),
            terminator: Terminator::Unreachable,
        });
        id
    }

    pub fn blocks(&self) -> &[BasicBlock] {
        &self.blocks
    }

    pub fn block(&self, id: BlockId) -> &BasicBlock {
        &self.blocks[id.0]
    }

    /// Append an instruction to a block, registering its use edges.
    pub fn append(&mut self, block: BlockId, inst: Instruction) -> InstId {
        let id = InstId(self.slots.len());
        self.register_uses(&inst, User::Inst(id));
        self.slots.push(Slot {
            inst: Some(inst),
            users: Vec::new(),
            block,
        });
        self.blocks[block.0].insts.push(id);
        id
    }

    /// Insert an instruction immediately before `before` in its block.
    pub fn insert_before(&mut self, before: InstId, inst: Instruction) -> InstId {
        let block = self.slots[before.0].block;
        let id = InstId(self.slots.len());
        self.register_uses(&inst, User::Inst(id));
        self.slots.push(Slot {
            inst: Some(inst),
            users: Vec::new(),
            block,
        });
        let insts = &mut self.blocks[block.0].insts;
        let pos = insts.iter().position(|&i| i == before).unwrap_or(insts.len());
        insts.insert(pos, id);
        id
    }

    /// `None` once the instruction has been erased.
    pub fn inst(&self, id: InstId) -> Option<&Instruction> {
        self.slots[id.0].inst.as_ref()
    }

    /// Block the instruction was placed in (valid while live).
    pub fn parent_block(&self, id: InstId) -> BlockId {
        self.slots[id.0].block
    }

    /// Number of live use edges, O(1).
    pub fn use_count(&self, id: InstId) -> usize {
        self.slots[id.0].users.len()
    }

    /// Consumers of this instruction's result, one entry per use edge.
    pub fn users(&self, id: InstId) -> &[User] {
        &self.slots[id.0].users
    }

    /// Rewrite one operand, keeping use-lists consistent.
    pub fn set_operand(&mut self, id: InstId, index: usize, op: Operand) {
        let old = match self.slots[id.0].inst.as_ref() {
            Some(inst) => inst.operands[index].clone(),
            None => return,
        };
        if let Operand::Inst(src) = old {
            remove_one_user(&mut self.slots[src.0].users, User::Inst(id));
        }
        if let Operand::Inst(src) = &op {
            self.slots[src.0].users.push(User::Inst(id));
        }
        if let Some(inst) = self.slots[id.0].inst.as_mut() {
            inst.operands[index] = op;
        }
    }

    /// Redirect every use of `from` to `to`. After this call `from` has a
    /// use count of zero and is safe to erase. No partial state is
    /// observable: each user is rewritten and re-registered in one step.
    pub fn replace_all_uses_with(&mut self, from: InstId, to: Operand) {
        debug_assert!(
            to != Operand::Inst(from),
            "cannot replace an instruction's uses with itself"
        );
        let users = std::mem::take(&mut self.slots[from.0].users);
        for user in users {
            match user {
                User::Inst(uid) => {
                    if let Some(inst) = self.slots[uid.0].inst.as_mut() {
                        if let Some(op) = inst
                            .operands
                            .iter_mut()
                            .find(|op| **op == Operand::Inst(from))
                        {
                            *op = to.clone();
                        }
                    }
                    if let Operand::Inst(dst) = &to {
                        self.slots[dst.0].users.push(User::Inst(uid));
                    }
                }
                User::Terminator(bid) => {
                    if let Some(op) = self.blocks[bid.0].terminator.operand_mut() {
                        if *op == Operand::Inst(from) {
                            *op = to.clone();
                        }
                    }
                    if let Operand::Inst(dst) = &to {
                        self.slots[dst.0].users.push(User::Terminator(bid));
                    }
                }
            }
        }
    }

    /// Remove an instruction from its block and tombstone its slot.
    /// Caller precondition: all uses already redirected or proven zero.
    pub fn erase_from_parent(&mut self, id: InstId) {
        debug_assert_eq!(
            self.use_count(id),
            0,
            "erasing an instruction that still has uses"
        );
        let inst = match self.slots[id.0].inst.take() {
            Some(inst) => inst,
            None => return,
        };
        for op in &inst.operands {
            if let Operand::Inst(src) = op {
                remove_one_user(&mut self.slots[src.0].users, User::Inst(id));
            }
        }
        let block = self.slots[id.0].block;
        self.blocks[block.0].insts.retain(|&i| i != id);
    }

    /// Replace a block's terminator, keeping use edges consistent. The
    /// block always ends in exactly one terminator.
    pub fn set_terminator(&mut self, block: BlockId, terminator: Terminator) {
        if let Some(Operand::Inst(src)) = self.blocks[block.0].terminator.operand() {
            let src = *src;
            remove_one_user(&mut self.slots[src.0].users, User::Terminator(block));
        }
        if let Some(Operand::Inst(src)) = terminator.operand() {
            self.slots[src.0].users.push(User::Terminator(block));
        }
        self.blocks[block.0].terminator = terminator;
    }

    pub fn successors(&self, block: BlockId) -> Vec<BlockId> {
        self.blocks[block.0].terminator.successors()
    }

    /// Block -> predecessor blocks, from terminator edges.
    pub fn predecessors(&self) -> HashMap<BlockId, Vec<BlockId>> {
        let mut preds: HashMap<BlockId, Vec<BlockId>> = HashMap::new();
        for block in &self.blocks {
            for succ in block.terminator.successors() {
                preds.entry(succ).or_default().push(block.id);
            }
        }
        preds
    }

    pub fn live_inst_count(&self) -> usize {
        self.slots.iter().filter(|s| s.inst.is_some()).count()
    }

    /// Type of a value, where one is known: instruction results, arguments
    /// and globals. Bare constants are untyped.
    pub fn operand_type(&self, op: &Operand) -> Option<Type> {
        match op {
            Operand::Inst(id) => self.inst(*id).map(Instruction::result_type),
            Operand::Arg(index) => self.params.get(*index).map(|p| p.ty),
            Operand::Global(_) => Some(Type::Ptr),
            Operand::Const(_) => None,
        }
    }

    fn register_uses(&mut self, inst: &Instruction, user: User) {
        for op in &inst.operands {
            if let Operand::Inst(src) = op {
                self.slots[src.0].users.push(user);
            }
        }
    }
}

fn remove_one_user(users: &mut Vec<User>, user: User) {
    if let Some(pos) = users.iter().position(|&u| u == user) {
        users.swap_remove(pos);
    }
}

#[derive(Debug, Clone)]
pub struct Global {
    pub name: String,
    pub ty: Type,
}

#[derive(Debug, Clone)]
pub struct Module {
    pub functions: Vec<Function>,
    pub globals: Vec<Global>,
}

impl Module {
    pub fn new() -> Self {
        Module {
            functions: Vec::new(),
            globals: Vec::new(),
        }
    }
}

impl Default for Module {
    fn default() -> Self {
        Module::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn add(a: Operand, b: Operand, name: &str) -> Instruction {
        Instruction::new(Opcode::Add, Type::I32, name, vec![a, b])
    }

    #[test]
    fn append_registers_use_edges() {
        let mut f = Function::new(
            "f",
            Type::I32,
            vec![Param { ty: Type::I32, name: "x".into() }],
        );
        let entry = f.add_block("entry");
        let a = f.append(entry, add(Operand::Arg(0), Operand::Const(1), "a"));
        assert_eq!(f.use_count(a), 0);

        let b = f.append(entry, add(Operand::Inst(a), Operand::Inst(a), "b"));
        assert_eq!(f.use_count(a), 2); // one edge per operand occurrence
        assert_eq!(f.users(a), &[User::Inst(b), User::Inst(b)]);
    }

    #[test]
    fn terminator_counts_as_a_use() {
        let mut f = Function::new("f", Type::I32, vec![]);
        let entry = f.add_block("entry");
        let a = f.append(entry, add(Operand::Const(1), Operand::Const(2), "a"));
        f.set_terminator(entry, Terminator::Ret(Some(Operand::Inst(a))));
        assert_eq!(f.use_count(a), 1);

        f.set_terminator(entry, Terminator::Ret(Some(Operand::Const(0))));
        assert_eq!(f.use_count(a), 0);
    }

    #[test]
    fn replace_all_uses_rewrites_instructions_and_terminators() {
        let mut f = Function::new(
            "f",
            Type::I32,
            vec![Param { ty: Type::I32, name: "x".into() }],
        );
        let entry = f.add_block("entry");
        let a = f.append(entry, add(Operand::Arg(0), Operand::Const(1), "a"));
        let b = f.append(entry, add(Operand::Arg(0), Operand::Const(1), "b"));
        let c = f.append(entry, add(Operand::Inst(b), Operand::Const(2), "c"));
        f.set_terminator(entry, Terminator::Ret(Some(Operand::Inst(b))));

        f.replace_all_uses_with(b, Operand::Inst(a));
        assert_eq!(f.use_count(b), 0);
        assert_eq!(f.use_count(a), 2);
        assert_eq!(f.inst(c).unwrap().operands[0], Operand::Inst(a));
        assert!(matches!(
            f.block(entry).terminator(),
            Terminator::Ret(Some(Operand::Inst(id))) if *id == a
        ));
    }

    #[test]
    fn erase_removes_from_block_and_releases_operand_uses() {
        let mut f = Function::new("f", Type::I32, vec![]);
        let entry = f.add_block("entry");
        let a = f.append(entry, add(Operand::Const(1), Operand::Const(2), "a"));
        let b = f.append(entry, add(Operand::Inst(a), Operand::Const(3), "b"));
        assert_eq!(f.use_count(a), 1);

        f.erase_from_parent(b);
        assert!(f.inst(b).is_none());
        assert_eq!(f.use_count(a), 0);
        assert_eq!(f.block(entry).insts(), &[a]);
        assert_eq!(f.live_inst_count(), 1);
    }

    #[test]
    fn insert_before_keeps_block_order() {
        let mut f = Function::new("f", Type::I32, vec![]);
        let entry = f.add_block("entry");
        let a = f.append(entry, add(Operand::Const(1), Operand::Const(2), "a"));
        let b = f.insert_before(a, add(Operand::Const(3), Operand::Const(4), "b"));
        assert_eq!(f.block(entry).insts(), &[b, a]);
        assert_eq!(f.parent_block(b), entry);
    }

    #[test]
    fn icmp_result_type_is_i1() {
        let inst = Instruction::new(
            Opcode::ICmp,
            Type::I32,
            "c",
            vec![Operand::Const(1), Operand::Const(2)],
        )
        .with_predicate(Predicate::Eq);
        assert_eq!(inst.result_type(), Type::I1);
        assert!(inst.produces_value());
    }

    #[test]
    fn store_produces_no_value() {
        let inst = Instruction::new(
            Opcode::Store,
            Type::I32,
            "",
            vec![Operand::Const(1), Operand::Global("g".into())],
        );
        assert!(!inst.produces_value());
    }
}
