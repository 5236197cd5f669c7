// Instruction and terminator grammar. Each opcode family has the same
// shape the printer emits, so a printed module always parses back.

use crate::{Cursor, Tok};
use ir::{
    BlockId, Function, InstId, Instruction, Opcode, Operand, Predicate, Terminator, Type,
};
use std::collections::HashMap;

struct PhiFixup {
    inst: InstId,
    operand_index: usize,
    name: String,
    line: usize,
}

pub(crate) struct FuncParser {
    func: Function,
    names: HashMap<String, Operand>,
    labels: HashMap<String, BlockId>,
    current: Option<BlockId>,
    terminated: Vec<bool>,
    fixups: Vec<PhiFixup>,
}

impl FuncParser {
    pub(crate) fn new(
        func: Function,
        names: HashMap<String, Operand>,
        labels: HashMap<String, BlockId>,
    ) -> Self {
        let block_count = func.blocks().len();
        FuncParser {
            func,
            names,
            labels,
            current: None,
            terminated: vec![false; block_count],
            fixups: Vec::new(),
        }
    }

    pub(crate) fn start_block(&mut self, label: &str, line_no: usize) -> Result<(), String> {
        if let Some(prev) = self.current {
            if !self.terminated[prev.0] {
                return Err(format!(
                    "line {}: block '{}' is missing a terminator",
                    line_no,
                    self.func.block(prev).label
                ));
            }
        }
        let block = *self
            .labels
            .get(label)
            .ok_or_else(|| format!("line {}: unknown label '{}'", line_no, label))?;
        self.current = Some(block);
        Ok(())
    }

    pub(crate) fn parse_line(&mut self, mut cursor: Cursor) -> Result<(), String> {
        let block = self
            .current
            .ok_or_else(|| cursor.err("instruction outside a block"))?;
        if self.terminated[block.0] {
            return Err(cursor.err("instruction after the block terminator"));
        }
        let is_terminator = matches!(
            cursor.peek(),
            Some(Tok::Word(word)) if matches!(word.as_str(), "ret" | "br" | "switch" | "unreachable")
        );
        if is_terminator {
            let term = self.parse_terminator(&mut cursor)?;
            cursor.expect_end()?;
            self.func.set_terminator(block, term);
            self.terminated[block.0] = true;
            Ok(())
        } else {
            self.parse_instruction(block, cursor)
        }
    }

    pub(crate) fn finish(mut self) -> Result<Function, String> {
        if let Some(block) = self.current {
            if !self.terminated[block.0] {
                return Err(format!(
                    "block '{}' is missing a terminator",
                    self.func.block(block).label
                ));
            }
        }
        // Patch phi operands that referenced results defined later in the
        // body. set_operand keeps the use-lists consistent.
        for fixup in std::mem::take(&mut self.fixups) {
            let op = self.names.get(&fixup.name).cloned().ok_or_else(|| {
                format!(
                    "line {}: '%{}' is never defined in this function",
                    fixup.line, fixup.name
                )
            })?;
            self.func.set_operand(fixup.inst, fixup.operand_index, op);
        }
        Ok(self.func)
    }

    fn block_ref(&self, label: &str, cursor: &Cursor) -> Result<BlockId, String> {
        self.labels
            .get(label)
            .copied()
            .ok_or_else(|| cursor.err(format!("unknown label '{}'", label)))
    }

    fn parse_operand(&self, cursor: &mut Cursor) -> Result<Operand, String> {
        match cursor.next()? {
            Tok::Int(value) => Ok(Operand::Const(value)),
            Tok::GlobalRef(name) => Ok(Operand::Global(name)),
            Tok::Local(name) => self.names.get(&name).cloned().ok_or_else(|| {
                cursor.err(format!("'%{}' used before its definition", name))
            }),
            other => Err(cursor.err(format!("expected operand, found {:?}", other))),
        }
    }

    fn parse_terminator(&mut self, cursor: &mut Cursor) -> Result<Terminator, String> {
        let word = cursor.expect_word()?;
        match word.as_str() {
            "ret" => {
                if cursor.eat_word("void") {
                    if self.func.return_type != Type::Void {
                        return Err(cursor.err(format!(
                            "ret void in a function returning {}",
                            self.func.return_type.mnemonic()
                        )));
                    }
                    Ok(Terminator::Ret(None))
                } else {
                    let ty = cursor.expect_type()?;
                    if ty != self.func.return_type {
                        return Err(cursor.err(format!(
                            "ret type {} does not match function return type {}",
                            ty.mnemonic(),
                            self.func.return_type.mnemonic()
                        )));
                    }
                    let op = self.parse_operand(cursor)?;
                    Ok(Terminator::Ret(Some(op)))
                }
            }
            "br" => {
                if matches!(cursor.peek(), Some(Tok::Word(w)) if w == "label") {
                    let label = cursor.expect_label_ref()?;
                    Ok(Terminator::Br(self.block_ref(&label, cursor)?))
                } else {
                    let _ty = cursor.expect_type()?;
                    let cond = self.parse_operand(cursor)?;
                    cursor.expect_punct(',')?;
                    let then_label = cursor.expect_label_ref()?;
                    cursor.expect_punct(',')?;
                    let else_label = cursor.expect_label_ref()?;
                    Ok(Terminator::CondBr {
                        cond,
                        then_block: self.block_ref(&then_label, cursor)?,
                        else_block: self.block_ref(&else_label, cursor)?,
                    })
                }
            }
            "switch" => {
                let _ty = cursor.expect_type()?;
                let value = self.parse_operand(cursor)?;
                cursor.expect_punct(',')?;
                let default_label = cursor.expect_label_ref()?;
                let default = self.block_ref(&default_label, cursor)?;
                cursor.expect_punct('[')?;
                let mut cases = Vec::new();
                while !cursor.eat_punct(']') {
                    let case = match cursor.next()? {
                        Tok::Int(value) => value,
                        other => {
                            return Err(
                                cursor.err(format!("expected case constant, found {:?}", other))
                            );
                        }
                    };
                    cursor.expect_punct(',')?;
                    let label = cursor.expect_label_ref()?;
                    cases.push((case, self.block_ref(&label, cursor)?));
                }
                Ok(Terminator::Switch {
                    value,
                    default,
                    cases,
                })
            }
            "unreachable" => Ok(Terminator::Unreachable),
            other => Err(cursor.err(format!("unknown terminator '{}'", other))),
        }
    }

    fn parse_instruction(&mut self, block: BlockId, mut cursor: Cursor) -> Result<(), String> {
        let name = if matches!(cursor.peek(), Some(Tok::Local(_))) {
            let name = cursor.expect_local()?;
            cursor.expect_punct('=')?;
            if self.names.contains_key(&name) {
                return Err(cursor.err(format!("duplicate definition of '%{}'", name)));
            }
            Some(name)
        } else {
            None
        };
        let word = cursor.expect_word()?;
        let opcode = Opcode::from_mnemonic(&word)
            .ok_or_else(|| cursor.err(format!("unknown opcode '{}'", word)))?;
        let result_name = name.clone().unwrap_or_default();

        let mut phi_forwards: Vec<(usize, String)> = Vec::new();
        let inst = match opcode {
            op if op.is_binary() => {
                let ty = cursor.expect_type()?;
                let a = self.parse_operand(&mut cursor)?;
                cursor.expect_punct(',')?;
                let b = self.parse_operand(&mut cursor)?;
                Instruction::new(opcode, ty, result_name, vec![a, b])
            }
            op if op.is_cast() => {
                let _src_ty = cursor.expect_type()?;
                let a = self.parse_operand(&mut cursor)?;
                if !cursor.eat_word("to") {
                    return Err(cursor.err("expected 'to'"));
                }
                let dst_ty = cursor.expect_type()?;
                Instruction::new(opcode, dst_ty, result_name, vec![a])
            }
            Opcode::FNeg => {
                let ty = cursor.expect_type()?;
                let a = self.parse_operand(&mut cursor)?;
                Instruction::new(opcode, ty, result_name, vec![a])
            }
            Opcode::ICmp | Opcode::FCmp => {
                let pred_word = cursor.expect_word()?;
                let pred = Predicate::from_mnemonic(&pred_word)
                    .ok_or_else(|| cursor.err(format!("unknown predicate '{}'", pred_word)))?;
                let ty = cursor.expect_type()?;
                let a = self.parse_operand(&mut cursor)?;
                cursor.expect_punct(',')?;
                let b = self.parse_operand(&mut cursor)?;
                Instruction::new(opcode, ty, result_name, vec![a, b]).with_predicate(pred)
            }
            Opcode::Select => {
                let _cond_ty = cursor.expect_type()?;
                let cond = self.parse_operand(&mut cursor)?;
                cursor.expect_punct(',')?;
                let ty = cursor.expect_type()?;
                let a = self.parse_operand(&mut cursor)?;
                cursor.expect_punct(',')?;
                let _ty2 = cursor.expect_type()?;
                let b = self.parse_operand(&mut cursor)?;
                Instruction::new(opcode, ty, result_name, vec![cond, a, b])
            }
            Opcode::Alloca => {
                let ty = cursor.expect_type()?;
                Instruction::new(opcode, ty, result_name, vec![])
            }
            Opcode::Load => {
                let volatile = cursor.eat_word("volatile");
                let ty = cursor.expect_type()?;
                cursor.expect_punct(',')?;
                if !cursor.eat_word("ptr") {
                    return Err(cursor.err("expected 'ptr'"));
                }
                let addr = self.parse_operand(&mut cursor)?;
                Instruction::new(opcode, ty, result_name, vec![addr]).with_volatile(volatile)
            }
            Opcode::Store => {
                let volatile = cursor.eat_word("volatile");
                let ty = cursor.expect_type()?;
                let value = self.parse_operand(&mut cursor)?;
                cursor.expect_punct(',')?;
                if !cursor.eat_word("ptr") {
                    return Err(cursor.err("expected 'ptr'"));
                }
                let addr = self.parse_operand(&mut cursor)?;
                Instruction::new(opcode, ty, result_name, vec![value, addr])
                    .with_volatile(volatile)
            }
            Opcode::GetElementPtr => {
                let ty = cursor.expect_type()?;
                cursor.expect_punct(',')?;
                if !cursor.eat_word("ptr") {
                    return Err(cursor.err("expected 'ptr'"));
                }
                let base = self.parse_operand(&mut cursor)?;
                cursor.expect_punct(',')?;
                let index = self.parse_operand(&mut cursor)?;
                Instruction::new(opcode, ty, result_name, vec![base, index])
            }
            Opcode::Call => {
                let ty = cursor.expect_type()?;
                let callee = self.parse_operand(&mut cursor)?;
                cursor.expect_punct('(')?;
                let mut operands = vec![callee];
                if !cursor.eat_punct(')') {
                    loop {
                        let _arg_ty = cursor.expect_type()?;
                        operands.push(self.parse_operand(&mut cursor)?);
                        if cursor.eat_punct(')') {
                            break;
                        }
                        cursor.expect_punct(',')?;
                    }
                }
                Instruction::new(opcode, ty, result_name, operands)
            }
            Opcode::Phi => {
                let ty = cursor.expect_type()?;
                let mut operands = Vec::new();
                let mut incoming = Vec::new();
                loop {
                    cursor.expect_punct('[')?;
                    match cursor.next()? {
                        Tok::Int(value) => operands.push(Operand::Const(value)),
                        Tok::GlobalRef(global) => operands.push(Operand::Global(global)),
                        Tok::Local(value_name) => match self.names.get(&value_name) {
                            Some(op) => operands.push(op.clone()),
                            None => {
                                // Loop-carried value; patched in finish().
                                phi_forwards.push((operands.len(), value_name));
                                operands.push(Operand::Const(0));
                            }
                        },
                        other => {
                            return Err(
                                cursor.err(format!("expected phi value, found {:?}", other))
                            );
                        }
                    }
                    cursor.expect_punct(',')?;
                    let label = cursor.expect_local()?;
                    incoming.push(self.block_ref(&label, &cursor)?);
                    cursor.expect_punct(']')?;
                    if !cursor.eat_punct(',') {
                        break;
                    }
                }
                let mut inst = Instruction::new(opcode, ty, result_name, operands);
                inst.incoming = incoming;
                inst
            }
            _ => {
                // Aggregate/vector ops and va_arg: generic operand list.
                let ty = cursor.expect_type()?;
                let mut operands = Vec::new();
                if !cursor.done() {
                    loop {
                        operands.push(self.parse_operand(&mut cursor)?);
                        if !cursor.eat_punct(',') {
                            break;
                        }
                    }
                }
                Instruction::new(opcode, ty, result_name, operands)
            }
        };
        cursor.expect_end()?;

        let produces = inst.produces_value();
        let id = self.func.append(block, inst);
        for (operand_index, forward_name) in phi_forwards {
            self.fixups.push(PhiFixup {
                inst: id,
                operand_index,
                name: forward_name,
                line: cursor.line,
            });
        }
        if let Some(name) = name {
            if !produces {
                return Err(cursor.err(format!(
                    "'%{}' names an instruction that produces no value",
                    name
                )));
            }
            self.names.insert(name, Operand::Inst(id));
        }
        Ok(())
    }
}
