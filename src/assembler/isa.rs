//! The Orn instruction set.
//!
//! Every instruction encodes as `[1-byte opcode id][alignment padding]
//! [operand bytes]`, operands little-endian. An operand begins at an
//! offset that is a multiple of its natural size, fixed by the CPU's
//! addressing rules.
//!
//! Supported instructions:
//!
//! ```nasm
//! hlt             ; stop the machine
//! push 3.14       ; push a float immediate
//! pushr rax       ; push a register
//! popr rax        ; pop into a register
//! add             ; the arithmetic group pops two, pushes one
//! sub
//! mul
//! div
//! pow
//! sqrt            ; unary group pops one, pushes one
//! sin
//! cos
//! in              ; push a value read from the input port
//! out             ; pop a value to the output port
//! jmp label       ; the jump group takes a label operand
//! ja label        ; conditional jumps pop and compare two values
//! jae label
//! jb label
//! jbe label
//! je label
//! jne label
//! call label
//! ret
//! ```
//!
//! Labels are declared as `name:`. Comments run from `;` to end of line.
//! Mnemonics and register names are case-insensitive.

use std::convert::TryFrom;
use std::fmt;
use std::mem::size_of;

/// Int-class operands begin at a multiple of this offset.
pub const INT_ALIGN: usize = size_of::<i32>();
/// Float-class operands begin at a multiple of this offset.
pub const DOUBLE_ALIGN: usize = size_of::<f64>();
/// Placeholder operand emitted for every jump until resolution patches it.
pub const POISON_JMP_POS: i32 = -1;
/// Execution always begins at this label, wherever it appears lexically.
pub const ENTRY_LABEL: &str = "main";
/// XOR key applied to the finalized image before persistence.
pub const OUTPUT_MASK: u8 = 0xAA;

/// The size class of an instruction's operand.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum OperandKind {
    None,
    Int,
    Float,
    /// A label reference, encoded as an `Int` placeholder and patched
    /// once the target offset is known.
    Target,
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Opcode {
    HLT,
    PUSH,
    PUSHR,
    POPR,
    ADD,
    SUB,
    MUL,
    DIV,
    POW,
    SQRT,
    SIN,
    COS,
    IN,
    OUT,
    JMP,
    JA,
    JAE,
    JB,
    JBE,
    JE,
    JNE,
    CALL,
    RET,
}

impl Opcode {
    /// Returns the opcode's one-byte identifier.
    pub fn id(self) -> u8 {
        use Opcode::*;
        match self {
            HLT => 0x00,
            PUSH => 0x01,
            PUSHR => 0x02,
            POPR => 0x03,
            ADD => 0x04,
            SUB => 0x05,
            MUL => 0x06,
            DIV => 0x07,
            POW => 0x08,
            SQRT => 0x09,
            SIN => 0x0A,
            COS => 0x0B,
            IN => 0x0C,
            OUT => 0x0D,
            JMP => 0x0E,
            JA => 0x0F,
            JAE => 0x10,
            JB => 0x11,
            JBE => 0x12,
            JE => 0x13,
            JNE => 0x14,
            CALL => 0x15,
            RET => 0x16,
        }
    }

    pub fn operand(self) -> OperandKind {
        use Opcode::*;
        match self {
            PUSH => OperandKind::Float,
            PUSHR | POPR => OperandKind::Int,
            JMP | JA | JAE | JB | JBE | JE | JNE | CALL => OperandKind::Target,
            _ => OperandKind::None,
        }
    }

    pub fn mnemonic(self) -> &'static str {
        use Opcode::*;
        match self {
            HLT => "hlt",
            PUSH => "push",
            PUSHR => "pushr",
            POPR => "popr",
            ADD => "add",
            SUB => "sub",
            MUL => "mul",
            DIV => "div",
            POW => "pow",
            SQRT => "sqrt",
            SIN => "sin",
            COS => "cos",
            IN => "in",
            OUT => "out",
            JMP => "jmp",
            JA => "ja",
            JAE => "jae",
            JB => "jb",
            JBE => "jbe",
            JE => "je",
            JNE => "jne",
            CALL => "call",
            RET => "ret",
        }
    }

    /// Case-insensitive mnemonic lookup.
    pub fn from_mnemonic(word: &str) -> Option<Opcode> {
        use Opcode::*;
        match word.to_ascii_lowercase().as_str() {
            "hlt" => Some(HLT),
            "push" => Some(PUSH),
            "pushr" => Some(PUSHR),
            "popr" => Some(POPR),
            "add" => Some(ADD),
            "sub" => Some(SUB),
            "mul" => Some(MUL),
            "div" => Some(DIV),
            "pow" => Some(POW),
            "sqrt" => Some(SQRT),
            "sin" => Some(SIN),
            "cos" => Some(COS),
            "in" => Some(IN),
            "out" => Some(OUT),
            "jmp" => Some(JMP),
            "ja" => Some(JA),
            "jae" => Some(JAE),
            "jb" => Some(JB),
            "jbe" => Some(JBE),
            "je" => Some(JE),
            "jne" => Some(JNE),
            "call" => Some(CALL),
            "ret" => Some(RET),
            _ => None,
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.mnemonic())
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Register {
    RAX,
    RBX,
    RCX,
    RDX,
}

impl Register {
    /// The register's id as it is encoded in an int-class operand.
    pub fn id(self) -> i32 {
        use Register::*;
        match self {
            RAX => 0,
            RBX => 1,
            RCX => 2,
            RDX => 3,
        }
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use Register::*;
        let name = match self {
            RAX => "rax",
            RBX => "rbx",
            RCX => "rcx",
            RDX => "rdx",
        };
        write!(f, "{}", name)
    }
}

impl TryFrom<&str> for Register {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        use Register::*;
        match value.to_ascii_lowercase().as_str() {
            "rax" => Ok(RAX),
            "rbx" => Ok(RBX),
            "rcx" => Ok(RCX),
            "rdx" => Ok(RDX),
            _ => Err(format!("unknown register `{}`", value)),
        }
    }
}
