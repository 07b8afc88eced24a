//! The two-phase pipeline at the heart of the assembler: emit the image
//! with placeholder jump operands, then resolve and patch them.
//!
//! Everything here works on a buffer plus the two tables; no I/O.
use std::convert::TryFrom;

use super::buffer::ByteBuffer;
use super::error::AsmError;
use super::isa::{
    Opcode, OperandKind, DOUBLE_ALIGN, ENTRY_LABEL, INT_ALIGN, POISON_JMP_POS,
};
use super::scanner::AsmToken;
use super::tables::{JumpTable, LabelTable};

/// Emission pass. Walks the token stream left to right, packing each
/// instruction as `[opcode id][padding][operand]`, binding labels to the
/// current carriage and recording jump placeholders as it goes.
///
/// The image always opens with a synthesized `jmp` whose operand is
/// patched to the entry label later; its patch position is returned.
pub fn emit_program(
    code: &mut ByteBuffer,
    labels: &mut LabelTable,
    jumps: &mut JumpTable,
    tokens: &[AsmToken],
) -> Result<usize, AsmError> {
    code.write_u8(Opcode::JMP.id())?;
    code.align_to(INT_ALIGN)?;
    let entry_patch = code.len();
    code.write_i32(POISON_JMP_POS)?;

    let mut pos = 0;
    while pos < tokens.len() {
        match &tokens[pos] {
            AsmToken::LabelDef(name, line) => {
                debug!("binding label `{}` at offset {}", name, code.len());
                labels.bind(name, code.len(), *line)?;
                pos += 1;
            }
            AsmToken::Op(op, line) => {
                pos += 1;
                pos = emit_instruction(code, jumps, tokens, pos, *op, *line)?;
            }
            stray => {
                return Err(AsmError::Scan {
                    line: stray.line(),
                    message: format!("{:?} is not valid at instruction position", stray),
                });
            }
        }
    }

    Ok(entry_patch)
}

/// Emits one instruction whose opcode token has already been consumed.
/// `pos` indexes the instruction's operand token, if any; returns the
/// index of the next instruction.
fn emit_instruction(
    code: &mut ByteBuffer,
    jumps: &mut JumpTable,
    tokens: &[AsmToken],
    pos: usize,
    op: Opcode,
    line: usize,
) -> Result<usize, AsmError> {
    code.write_u8(op.id())?;

    match op.operand() {
        OperandKind::None => Ok(pos),
        OperandKind::Int => {
            let value = match tokens.get(pos) {
                Some(AsmToken::Reg(reg, _)) => reg.id(),
                Some(AsmToken::Int(value, line)) => {
                    i32::try_from(*value).map_err(|_| AsmError::Scan {
                        line: *line,
                        message: format!("integer operand {} is out of range", value),
                    })?
                }
                _ => return Err(operand_error(op, line, "a register or integer")),
            };
            code.align_to(INT_ALIGN)?;
            code.write_i32(value)?;
            Ok(pos + 1)
        }
        OperandKind::Float => {
            let value = match tokens.get(pos) {
                Some(AsmToken::Float(value, _)) => *value,
                // Integer immediates widen to the float class.
                Some(AsmToken::Int(value, _)) => *value as f64,
                _ => return Err(operand_error(op, line, "a numeric immediate")),
            };
            code.align_to(DOUBLE_ALIGN)?;
            code.write_f64(value)?;
            Ok(pos + 1)
        }
        OperandKind::Target => {
            let target = match tokens.get(pos) {
                Some(AsmToken::Name(name, _)) => name,
                _ => return Err(operand_error(op, line, "a label name")),
            };
            code.align_to(INT_ALIGN)?;
            jumps.record(target, code.len());
            code.write_i32(POISON_JMP_POS)?;
            Ok(pos + 1)
        }
    }
}

fn operand_error(op: Opcode, line: usize, expected: &str) -> AsmError {
    AsmError::Scan {
        line,
        message: format!("`{}` expects {} operand", op, expected),
    }
}

/// Resolution pass. Patches every recorded placeholder with its target
/// label's offset, in record order.
pub fn resolve_jumps(
    code: &mut ByteBuffer,
    labels: &LabelTable,
    jumps: &mut JumpTable,
) -> Result<(), AsmError> {
    for jump in jumps.iter_mut() {
        let ip_pos = labels
            .lookup(&jump.target)
            .ok_or_else(|| AsmError::UnresolvedLabel {
                name: jump.target.clone(),
            })?;

        debug!("patching jump to `{}` at {} -> {}", jump.target, jump.patch_pos, ip_pos);
        code.patch_i32(jump.patch_pos, ip_pos as i32)?;
        jump.resolved = Some(ip_pos);
    }

    Ok(())
}

/// Entry fix-up. The synthesized opening jump receives the entry
/// label's offset, so execution begins there regardless of where the
/// label appears lexically.
pub fn patch_entry(
    code: &mut ByteBuffer,
    labels: &LabelTable,
    entry_patch: usize,
) -> Result<(), AsmError> {
    let ip_pos = labels
        .lookup(ENTRY_LABEL)
        .ok_or(AsmError::MissingEntryLabel)?;

    code.patch_i32(entry_patch, ip_pos as i32)
}

#[cfg(test)]
mod tests {
    use std::convert::TryInto;

    use super::super::scanner::Scanner;
    use super::*;

    /// Width of the synthesized entry jump: opcode byte, padding to
    /// INT_ALIGN, then the i32 operand.
    const HEADER_LEN: usize = 2 * INT_ALIGN;

    fn emit(source: &str) -> (ByteBuffer, LabelTable, JumpTable, usize) {
        let tokens = Scanner::new().scan(source).unwrap();
        let mut code = ByteBuffer::new();
        let mut labels = LabelTable::new();
        let mut jumps = JumpTable::new();
        let entry_patch = emit_program(&mut code, &mut labels, &mut jumps, &tokens).unwrap();
        (code, labels, jumps, entry_patch)
    }

    #[test]
    fn test_entry_jump_header() {
        let (code, _, _, entry_patch) = emit("main: hlt");

        assert_eq!(entry_patch, INT_ALIGN);
        assert_eq!(code.as_slice()[0], Opcode::JMP.id());
        assert_eq!(
            &code.as_slice()[INT_ALIGN..HEADER_LEN],
            &POISON_JMP_POS.to_le_bytes()[..]
        );
        // `main` binds just past the header, then one hlt byte.
        assert_eq!(code.len(), HEADER_LEN + 1);
        assert_eq!(code.as_slice()[HEADER_LEN], Opcode::HLT.id());
    }

    #[test]
    fn test_float_operand_alignment() {
        let (code, _, _, _) = emit("main: push 2.5");

        // Opcode at 8, padding to 16, operand at 16..24.
        assert_eq!(code.as_slice()[HEADER_LEN], Opcode::PUSH.id());
        assert_eq!(code.len() % DOUBLE_ALIGN, 0);
        assert_eq!(
            &code.as_slice()[2 * DOUBLE_ALIGN..],
            &2.5f64.to_le_bytes()[..]
        );
    }

    #[test]
    fn test_int_immediate_widens_to_float() {
        let (code, _, _, _) = emit("main: push 5");
        assert_eq!(
            &code.as_slice()[2 * DOUBLE_ALIGN..],
            &5.0f64.to_le_bytes()[..]
        );
    }

    #[test]
    fn test_register_operand() {
        let (code, _, _, _) = emit("main: pushr rcx");

        assert_eq!(code.as_slice()[HEADER_LEN], Opcode::PUSHR.id());
        assert_eq!(code.len() % INT_ALIGN, 0);
        let operand_at = HEADER_LEN + INT_ALIGN;
        assert_eq!(&code.as_slice()[operand_at..], &2i32.to_le_bytes()[..]);
    }

    #[test]
    fn test_forward_and_backward_references_resolve() {
        let (mut code, labels, mut jumps, _) = emit("main: jmp end\nloop: jmp loop\nend: hlt");

        resolve_jumps(&mut code, &labels, &mut jumps).unwrap();

        let loop_pos = labels.lookup("loop").unwrap();
        let end_pos = labels.lookup("end").unwrap();

        let refs: Vec<&super::super::tables::JumpRef> = jumps.iter().collect();
        assert_eq!(refs.len(), 2);
        assert_eq!(refs[0].resolved, Some(end_pos));
        assert_eq!(refs[1].resolved, Some(loop_pos));

        for jump in &refs {
            let at = jump.patch_pos;
            let patched =
                i32::from_le_bytes(code.as_slice()[at..at + 4].try_into().unwrap());
            assert_eq!(patched as usize, jump.resolved.unwrap());
        }
    }

    #[test]
    fn test_unresolved_label() {
        let (mut code, labels, mut jumps, _) = emit("main: jmp nowhere");

        let err = resolve_jumps(&mut code, &labels, &mut jumps).unwrap_err();
        assert!(matches!(
            err,
            AsmError::UnresolvedLabel { ref name } if name == "nowhere"
        ));
    }

    #[test]
    fn test_entry_patch() {
        let (mut code, labels, mut jumps, entry_patch) = emit("add\nmain: hlt");
        resolve_jumps(&mut code, &labels, &mut jumps).unwrap();
        patch_entry(&mut code, &labels, entry_patch).unwrap();

        let main_pos = labels.lookup("main").unwrap();
        let patched = i32::from_le_bytes(
            code.as_slice()[entry_patch..entry_patch + 4].try_into().unwrap(),
        );
        assert_eq!(patched as usize, main_pos);
    }

    #[test]
    fn test_missing_entry_label() {
        let (mut code, labels, _, entry_patch) = emit("start: hlt");

        assert!(matches!(
            patch_entry(&mut code, &labels, entry_patch),
            Err(AsmError::MissingEntryLabel)
        ));
    }

    #[test]
    fn test_missing_operand() {
        let tokens = Scanner::new().scan("main: pushr").unwrap();
        let mut code = ByteBuffer::new();
        let mut labels = LabelTable::new();
        let mut jumps = JumpTable::new();

        let err = emit_program(&mut code, &mut labels, &mut jumps, &tokens).unwrap_err();
        assert!(matches!(err, AsmError::Scan { line: 1, .. }));
    }

    #[test]
    fn test_stray_operand_token() {
        let tokens = Scanner::new().scan("main: hlt\nrax").unwrap();
        let mut code = ByteBuffer::new();
        let mut labels = LabelTable::new();
        let mut jumps = JumpTable::new();

        let err = emit_program(&mut code, &mut labels, &mut jumps, &tokens).unwrap_err();
        assert!(matches!(err, AsmError::Scan { line: 2, .. }));
    }

    #[test]
    fn test_out_of_range_int_operand() {
        let tokens = Scanner::new().scan("main: pushr 4294967296").unwrap();
        let mut code = ByteBuffer::new();
        let mut labels = LabelTable::new();
        let mut jumps = JumpTable::new();

        assert!(emit_program(&mut code, &mut labels, &mut jumps, &tokens).is_err());
    }
}
