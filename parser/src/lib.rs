// Parser module: reads the textual IR form into an ir::Module
//
// Module organization:
// - lib.rs: module/function structure, tokenizer (regex-lite)
// - inst.rs: per-instruction and terminator grammar
//
// Names may be referenced before their definition only by phi operands
// (loop-carried values); phis are patched once the whole function body has
// been read. Any other use-before-definition is a parse error, as are
// duplicate result names, unknown opcodes/types, and blocks that do not
// end in a terminator.

mod inst;

use ir::{BlockId, Function, Global, Module, Operand, Param, Type};
use regex_lite::Regex;
use std::collections::HashMap;

use inst::FuncParser;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Tok {
    Local(String),
    GlobalRef(String),
    Int(i64),
    Word(String),
    Punct(char),
}

pub(crate) struct Tokenizer {
    pattern: Regex,
}

impl Tokenizer {
    fn new() -> Result<Self, String> {
        let pattern = Regex::new(
            r"^(%[A-Za-z_.][A-Za-z0-9_.]*|@[A-Za-z_.][A-Za-z0-9_.]*|-?[0-9]+|[A-Za-z_.][A-Za-z0-9_.]*|[(){}\[\],=:])",
        )
        .map_err(|e| format!("internal token pattern error: {}", e))?;
        Ok(Tokenizer { pattern })
    }

    pub(crate) fn tokenize(&self, line: &str, line_no: usize) -> Result<Vec<Tok>, String> {
        let mut toks = Vec::new();
        let mut rest = line.trim_start();
        while !rest.is_empty() {
            let m = self
                .pattern
                .find(rest)
                .ok_or_else(|| format!("line {}: unexpected character near '{}'", line_no, rest))?;
            let text = m.as_str();
            let tok = if let Some(name) = text.strip_prefix('%') {
                Tok::Local(name.to_string())
            } else if let Some(name) = text.strip_prefix('@') {
                Tok::GlobalRef(name.to_string())
            } else if text.chars().next().is_some_and(|c| c == '-' || c.is_ascii_digit()) {
                let value = text
                    .parse::<i64>()
                    .map_err(|_| format!("line {}: integer '{}' out of range", line_no, text))?;
                Tok::Int(value)
            } else if text.len() == 1 && "(){}[],=:".contains(text) {
                Tok::Punct(text.chars().next().unwrap_or(' '))
            } else {
                Tok::Word(text.to_string())
            };
            toks.push(tok);
            rest = rest[m.end()..].trim_start();
        }
        Ok(toks)
    }
}

/// Cursor over one line's tokens with line-numbered errors.
pub(crate) struct Cursor {
    toks: Vec<Tok>,
    pos: usize,
    pub(crate) line: usize,
}

impl Cursor {
    pub(crate) fn new(toks: Vec<Tok>, line: usize) -> Self {
        Cursor { toks, pos: 0, line }
    }

    pub(crate) fn err(&self, message: impl AsRef<str>) -> String {
        format!("line {}: {}", self.line, message.as_ref())
    }

    pub(crate) fn peek(&self) -> Option<&Tok> {
        self.toks.get(self.pos)
    }

    pub(crate) fn next(&mut self) -> Result<Tok, String> {
        let tok = self
            .toks
            .get(self.pos)
            .cloned()
            .ok_or_else(|| self.err("unexpected end of line"))?;
        self.pos += 1;
        Ok(tok)
    }

    pub(crate) fn done(&self) -> bool {
        self.pos >= self.toks.len()
    }

    pub(crate) fn expect_end(&self) -> Result<(), String> {
        if self.done() {
            Ok(())
        } else {
            Err(self.err("trailing tokens"))
        }
    }

    pub(crate) fn expect_punct(&mut self, c: char) -> Result<(), String> {
        match self.next()? {
            Tok::Punct(found) if found == c => Ok(()),
            other => Err(self.err(format!("expected '{}', found {:?}", c, other))),
        }
    }

    pub(crate) fn eat_punct(&mut self, c: char) -> bool {
        if matches!(self.peek(), Some(Tok::Punct(found)) if *found == c) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    pub(crate) fn eat_word(&mut self, word: &str) -> bool {
        if matches!(self.peek(), Some(Tok::Word(found)) if found == word) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    pub(crate) fn expect_word(&mut self) -> Result<String, String> {
        match self.next()? {
            Tok::Word(word) => Ok(word),
            other => Err(self.err(format!("expected keyword, found {:?}", other))),
        }
    }

    pub(crate) fn expect_type(&mut self) -> Result<Type, String> {
        let word = self.expect_word()?;
        Type::from_mnemonic(&word).ok_or_else(|| self.err(format!("unknown type '{}'", word)))
    }

    pub(crate) fn expect_local(&mut self) -> Result<String, String> {
        match self.next()? {
            Tok::Local(name) => Ok(name),
            other => Err(self.err(format!("expected %name, found {:?}", other))),
        }
    }

    pub(crate) fn expect_label_ref(&mut self) -> Result<String, String> {
        if !self.eat_word("label") {
            return Err(self.err("expected 'label'"));
        }
        self.expect_local()
    }
}

fn strip_comment(line: &str) -> &str {
    match line.find(';') {
        Some(pos) => &line[..pos],
        None => line,
    }
}

/// Parse the textual IR form of a whole module.
///
/// # Returns
/// * `Ok(Module)` - module ready for optimization
/// * `Err(String)` - first error found, with a line number
pub fn parse_module(input: &str) -> Result<Module, String> {
    let tokenizer = Tokenizer::new()?;
    let mut module = Module::new();

    let lines: Vec<(usize, &str)> = input
        .lines()
        .enumerate()
        .map(|(index, line)| (index + 1, strip_comment(line)))
        .filter(|(_, line)| !line.trim().is_empty())
        .collect();

    let mut index = 0;
    while index < lines.len() {
        let (line_no, line) = lines[index];
        let mut cursor = Cursor::new(tokenizer.tokenize(line, line_no)?, line_no);
        let keyword = cursor.expect_word()?;
        match keyword.as_str() {
            "global" => {
                let ty = cursor.expect_type()?;
                let name = match cursor.next()? {
                    Tok::GlobalRef(name) => name,
                    other => return Err(cursor.err(format!("expected @name, found {:?}", other))),
                };
                cursor.expect_end()?;
                if module.globals.iter().any(|g| g.name == name) {
                    return Err(cursor.err(format!("duplicate global '@{}'", name)));
                }
                module.globals.push(Global { name, ty });
                index += 1;
            }
            "define" => {
                let func_start = index;
                let mut end = None;
                for (body_index, &(_, body_line)) in lines.iter().enumerate().skip(index + 1) {
                    if body_line.trim() == "}" {
                        end = Some(body_index);
                        break;
                    }
                }
                let end = end
                    .ok_or_else(|| format!("line {}: unterminated function body", line_no))?;
                let func = parse_function(
                    &tokenizer,
                    cursor,
                    &lines[func_start + 1..end],
                )?;
                if module.functions.iter().any(|f| f.name == func.name) {
                    return Err(format!("line {}: duplicate function '@{}'", line_no, func.name));
                }
                module.functions.push(func);
                index = end + 1;
            }
            other => {
                return Err(cursor.err(format!("expected 'global' or 'define', found '{}'", other)));
            }
        }
    }
    Ok(module)
}

// Header cursor sits after the 'define' keyword.
fn parse_function(
    tokenizer: &Tokenizer,
    mut header: Cursor,
    body: &[(usize, &str)],
) -> Result<Function, String> {
    let return_type = header.expect_type()?;
    let name = match header.next()? {
        Tok::GlobalRef(name) => name,
        other => return Err(header.err(format!("expected @name, found {:?}", other))),
    };
    header.expect_punct('(')?;
    let mut params = Vec::new();
    if !header.eat_punct(')') {
        loop {
            let ty = header.expect_type()?;
            let param_name = header.expect_local()?;
            params.push(Param { ty, name: param_name });
            if header.eat_punct(')') {
                break;
            }
            header.expect_punct(',')?;
        }
    }
    header.expect_punct('{')?;
    header.expect_end()?;

    let mut func = Function::new(name, return_type, params);
    let mut names: HashMap<String, Operand> = HashMap::new();
    for (arg_index, param) in func.params.iter().enumerate() {
        if names
            .insert(param.name.clone(), Operand::Arg(arg_index))
            .is_some()
        {
            return Err(format!(
                "line {}: duplicate parameter '%{}'",
                header.line, param.name
            ));
        }
    }

    // First pass: create every labeled block so branches and phis can
    // refer to blocks defined later in the text.
    let mut labels: HashMap<String, BlockId> = HashMap::new();
    for &(line_no, line) in body {
        if let Some(label) = label_of(line) {
            if labels.contains_key(label) {
                return Err(format!("line {}: duplicate label '{}'", line_no, label));
            }
            let block = func.add_block(label);
            labels.insert(label.to_string(), block);
        }
    }
    if func.blocks().is_empty() {
        return Err(format!(
            "function '@{}' has no basic blocks",
            func.name
        ));
    }

    let mut parser = FuncParser::new(func, names, labels);
    for &(line_no, line) in body {
        if let Some(label) = label_of(line) {
            parser.start_block(label, line_no)?;
            continue;
        }
        let cursor = Cursor::new(tokenizer.tokenize(line, line_no)?, line_no);
        parser.parse_line(cursor)?;
    }
    parser.finish()
}

fn label_of(line: &str) -> Option<&str> {
    let trimmed = line.trim();
    let label = trimmed.strip_suffix(':')?;
    let valid = !label.is_empty()
        && label
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.');
    valid.then_some(label)
}
