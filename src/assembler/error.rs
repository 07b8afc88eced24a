//! Error kinds shared by every stage of the assembler.
use std::fmt;

use super::isa::ENTRY_LABEL;

#[derive(Debug)]
pub enum AsmError {
    /// Malformed mnemonic text, or a valid token in an invalid position.
    Scan { line: usize, message: String },
    /// A label name bound more than once.
    DuplicateLabel { name: String, line: usize },
    /// A jump target that no label definition ever bound.
    UnresolvedLabel { name: String },
    /// The reserved entry label was never defined.
    MissingEntryLabel,
    /// An operand patch landed outside the emitted buffer.
    PatchRange { pos: usize, len: usize },
    /// Buffer growth was refused by the allocator.
    Allocation { requested: usize },
    /// Fewer or more bytes moved than requested.
    IoMismatch { expected: usize, actual: usize },
    Io(std::io::Error),
}

impl fmt::Display for AsmError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AsmError::Scan { line, message } => {
                write!(f, "scan error at line {}: {}", line, message)
            }
            AsmError::DuplicateLabel { name, line } => {
                write!(f, "duplicate label `{}` at line {}", name, line)
            }
            AsmError::UnresolvedLabel { name } => {
                write!(f, "unresolved label `{}`", name)
            }
            AsmError::MissingEntryLabel => {
                write!(f, "no `{}` label: the program has no entry point", ENTRY_LABEL)
            }
            AsmError::PatchRange { pos, len } => {
                write!(f, "patch position {} is outside the {}-byte image", pos, len)
            }
            AsmError::Allocation { requested } => {
                write!(f, "failed to grow the output buffer to {} bytes", requested)
            }
            AsmError::IoMismatch { expected, actual } => {
                write!(f, "expected to move {} bytes, moved {}", expected, actual)
            }
            AsmError::Io(err) => write!(f, "io error: {}", err),
        }
    }
}

impl From<std::io::Error> for AsmError {
    fn from(err: std::io::Error) -> Self {
        AsmError::Io(err)
    }
}
