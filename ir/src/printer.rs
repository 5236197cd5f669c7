// Textual output for modules: the one serialized form this tool produces.
// The syntax is exactly what the `parser` crate reads back.

use crate::{Function, Instruction, Module, Opcode, Operand, Terminator, Type};
use std::fmt;

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for global in &self.globals {
            writeln!(f, "global {} @{}", global.ty.mnemonic(), global.name)?;
        }
        if !self.globals.is_empty() {
            writeln!(f)?;
        }
        for (index, func) in self.functions.iter().enumerate() {
            if index > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", func)?;
        }
        Ok(())
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "define {} @{}(", self.return_type.mnemonic(), self.name)?;
        for (index, param) in self.params.iter().enumerate() {
            if index > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{} %{}", param.ty.mnemonic(), param.name)?;
        }
        writeln!(f, ") {{")?;
        for block in self.blocks() {
            writeln!(f, "{}:", block.label)?;
            for &id in block.insts() {
                if let Some(inst) = self.inst(id) {
                    writeln!(f, "  {}", render_inst(self, inst))?;
                }
            }
            writeln!(f, "  {}", render_terminator(self, block.terminator()))?;
        }
        writeln!(f, "}}")
    }
}

fn operand(func: &Function, op: &Operand) -> String {
    match op {
        Operand::Const(value) => value.to_string(),
        Operand::Inst(id) => match func.inst(*id) {
            Some(inst) => format!("%{}", inst.name),
            None => "%<erased>".to_string(),
        },
        Operand::Arg(index) => format!("%{}", func.params[*index].name),
        Operand::Global(name) => format!("@{}", name),
    }
}

fn typed_operand(func: &Function, op: &Operand) -> String {
    let ty = func.operand_type(op).unwrap_or(Type::I32);
    format!("{} {}", ty.mnemonic(), operand(func, op))
}

fn render_inst(func: &Function, inst: &Instruction) -> String {
    let mnemonic = inst.opcode.mnemonic();
    let ty = inst.ty.mnemonic();
    let prefix = if inst.produces_value() {
        format!("%{} = ", inst.name)
    } else {
        String::new()
    };
    let body = match inst.opcode {
        op if op.is_binary() => format!(
            "{} {} {}, {}",
            mnemonic,
            ty,
            operand(func, &inst.operands[0]),
            operand(func, &inst.operands[1])
        ),
        op if op.is_cast() => format!(
            "{} {} to {}",
            mnemonic,
            typed_operand(func, &inst.operands[0]),
            ty
        ),
        Opcode::FNeg => format!("{} {} {}", mnemonic, ty, operand(func, &inst.operands[0])),
        Opcode::ICmp | Opcode::FCmp => {
            let pred = inst.predicate.map(|p| p.mnemonic()).unwrap_or("eq");
            format!(
                "{} {} {} {}, {}",
                mnemonic,
                pred,
                ty,
                operand(func, &inst.operands[0]),
                operand(func, &inst.operands[1])
            )
        }
        Opcode::Select => format!(
            "select i1 {}, {} {}, {} {}",
            operand(func, &inst.operands[0]),
            ty,
            operand(func, &inst.operands[1]),
            ty,
            operand(func, &inst.operands[2])
        ),
        Opcode::Alloca => format!("alloca {}", ty),
        Opcode::Load => format!(
            "load {}{}, ptr {}",
            if inst.volatile { "volatile " } else { "" },
            ty,
            operand(func, &inst.operands[0])
        ),
        Opcode::Store => format!(
            "store {}{} {}, ptr {}",
            if inst.volatile { "volatile " } else { "" },
            ty,
            operand(func, &inst.operands[0]),
            operand(func, &inst.operands[1])
        ),
        Opcode::GetElementPtr => format!(
            "getelementptr {}, ptr {}, {}",
            ty,
            operand(func, &inst.operands[0]),
            operand(func, &inst.operands[1])
        ),
        Opcode::Call => {
            let args = inst.operands[1..]
                .iter()
                .map(|arg| typed_operand(func, arg))
                .collect::<Vec<_>>()
                .join(", ");
            format!(
                "call {} {}({})",
                ty,
                operand(func, &inst.operands[0]),
                args
            )
        }
        Opcode::Phi => {
            let incoming = inst
                .operands
                .iter()
                .zip(&inst.incoming)
                .map(|(op, block)| {
                    format!("[ {}, %{} ]", operand(func, op), func.block(*block).label)
                })
                .collect::<Vec<_>>()
                .join(", ");
            format!("phi {} {}", ty, incoming)
        }
        _ => {
            // Aggregate/vector ops and va_arg: generic operand list.
            let ops = inst
                .operands
                .iter()
                .map(|op| operand(func, op))
                .collect::<Vec<_>>()
                .join(", ");
            format!("{} {} {}", mnemonic, ty, ops)
        }
    };
    format!("{}{}", prefix, body)
}

fn render_terminator(func: &Function, term: &Terminator) -> String {
    match term {
        Terminator::Br(target) => format!("br label %{}", func.block(*target).label),
        Terminator::CondBr {
            cond,
            then_block,
            else_block,
        } => format!(
            "br i1 {}, label %{}, label %{}",
            operand(func, cond),
            func.block(*then_block).label,
            func.block(*else_block).label
        ),
        Terminator::Switch {
            value,
            default,
            cases,
        } => {
            let arms = cases
                .iter()
                .map(|(case, block)| format!("{}, label %{}", case, func.block(*block).label))
                .collect::<Vec<_>>()
                .join(" ");
            format!(
                "switch {}, label %{} [ {} ]",
                typed_operand(func, value),
                func.block(*default).label,
                arms
            )
        }
        Terminator::Ret(Some(op)) => format!(
            "ret {} {}",
            func.return_type.mnemonic(),
            operand(func, op)
        ),
        Terminator::Ret(None) => "ret void".to_string(),
        Terminator::Unreachable => "unreachable".to_string(),
    }
}
