//! This scanner tokenizes Orn mnemonic text.
use std::convert::TryFrom;

use regex::Regex;

use super::error::AsmError;
use super::isa::{Opcode, Register};

/// Tokens carry the 1-based line they appear on.
#[derive(Clone, PartialEq, Debug)]
pub enum AsmToken {
    LabelDef(String, usize),
    Op(Opcode, usize),
    Reg(Register, usize),
    Int(i64, usize),
    Float(f64, usize),
    /// A bare identifier, used as a jump target.
    Name(String, usize),
}

impl AsmToken {
    pub fn line(&self) -> usize {
        match self {
            AsmToken::LabelDef(_, line)
            | AsmToken::Op(_, line)
            | AsmToken::Reg(_, line)
            | AsmToken::Int(_, line)
            | AsmToken::Float(_, line)
            | AsmToken::Name(_, line) => *line,
        }
    }
}

pub struct Scanner {
    ident: Regex,
}

impl Scanner {
    pub fn new() -> Self {
        Scanner {
            ident: Regex::new(r"^[A-Za-z_$][A-Za-z0-9_$]*$").unwrap(),
        }
    }

    /// Scans the whole text. Comments run from `;` to end of line;
    /// everything else splits on whitespace.
    pub fn scan(&self, text: &str) -> Result<Vec<AsmToken>, AsmError> {
        let mut tokens = Vec::with_capacity(256);

        for (index, raw) in text.lines().enumerate() {
            let line = index + 1;
            let code = raw.split(';').next().unwrap_or("");

            for word in code.split_whitespace() {
                tokens.push(self.classify(word, line)?);
            }
        }

        Ok(tokens)
    }

    fn classify(&self, word: &str, line: usize) -> Result<AsmToken, AsmError> {
        if let Some(name) = word.strip_suffix(':') {
            // A label named after a mnemonic or register could be
            // defined but never referenced: the bare word would always
            // classify as Op/Reg first. Refuse the definition instead.
            if Opcode::from_mnemonic(name).is_some() {
                return Err(AsmError::Scan {
                    line,
                    message: format!("label `{}` shadows the mnemonic `{}`", name, name),
                });
            }
            if Register::try_from(name).is_ok() {
                return Err(AsmError::Scan {
                    line,
                    message: format!("label `{}` shadows the register `{}`", name, name),
                });
            }
            if self.ident.is_match(name) {
                return Ok(AsmToken::LabelDef(name.to_owned(), line));
            }
            return Err(AsmError::Scan {
                line,
                message: format!("malformed label definition `{}`", word),
            });
        }

        if let Some(op) = Opcode::from_mnemonic(word) {
            return Ok(AsmToken::Op(op, line));
        }

        if let Ok(reg) = Register::try_from(word) {
            return Ok(AsmToken::Reg(reg, line));
        }

        if let Ok(value) = word.parse::<i64>() {
            return Ok(AsmToken::Int(value, line));
        }

        if let Ok(value) = word.parse::<f64>() {
            return Ok(AsmToken::Float(value, line));
        }

        if self.ident.is_match(word) {
            return Ok(AsmToken::Name(word.to_owned(), line));
        }

        Err(AsmError::Scan {
            line,
            message: format!("unrecognized token `{}`", word),
        })
    }
}

impl Default for Scanner {
    fn default() -> Self {
        Scanner::new()
    }
}
