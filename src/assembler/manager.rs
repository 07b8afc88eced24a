//! The Manager owns everything one assembly unit allocates: the source
//! text, the label table, the jump table, and the output byte buffer.
//!
//! Nothing is shared between units, so independent assemblies may run
//! in parallel without locking; teardown is a single `reset` (or plain
//! drop) over whatever was filled in so far.
use std::fs::File;
use std::io::Write;
use std::path::Path;

use super::buffer::ByteBuffer;
use super::emitter;
use super::error::AsmError;
use super::isa::OUTPUT_MASK;
use super::scanner::Scanner;
use super::tables::{JumpTable, LabelTable};

#[derive(Debug, Default)]
pub struct Manager {
    source: String,
    labels: LabelTable,
    jumps: JumpTable,
    byte_code: ByteBuffer,
}

/// Assembles one unit of mnemonic text into a finalized image.
///
/// Runs scan, emission, jump resolution, entry fix-up, and compaction.
/// On error the partially filled manager is dropped; no artifact can be
/// produced from a failed run.
pub fn assemble(source: &str) -> Result<Manager, AsmError> {
    let mut manager = Manager {
        source: source.to_owned(),
        labels: LabelTable::new(),
        jumps: JumpTable::new(),
        byte_code: ByteBuffer::new(),
    };
    manager.run()?;
    Ok(manager)
}

impl Manager {
    fn run(&mut self) -> Result<(), AsmError> {
        let tokens = Scanner::new().scan(&self.source)?;
        debug!("scanned {} tokens", tokens.len());

        let entry_patch = emitter::emit_program(
            &mut self.byte_code,
            &mut self.labels,
            &mut self.jumps,
            &tokens,
        )?;

        emitter::resolve_jumps(&mut self.byte_code, &self.labels, &mut self.jumps)?;
        emitter::patch_entry(&mut self.byte_code, &self.labels, entry_patch)?;

        self.byte_code.compact();

        info!(
            "assembled {} bytes, {} label(s), {} jump(s)",
            self.byte_code.len(),
            self.labels.len(),
            self.jumps.len()
        );
        self.log_labels();
        self.log_jumps();

        Ok(())
    }

    /// The finalized, unmasked image.
    pub fn image(&self) -> &[u8] {
        self.byte_code.as_slice()
    }

    pub fn labels(&self) -> &LabelTable {
        &self.labels
    }

    pub fn jumps(&self) -> &JumpTable {
        &self.jumps
    }

    /// The image as it is persisted: every byte XORed with the fixed
    /// output mask. Applying the mask again restores the image.
    pub fn masked_image(&self) -> Vec<u8> {
        self.byte_code
            .as_slice()
            .iter()
            .map(|byte| byte ^ OUTPUT_MASK)
            .collect()
    }

    /// Writes the masked image to `path`. A short write is an
    /// `IoMismatch`; nothing is retried.
    pub fn create_bin<P: AsRef<Path>>(&self, path: P) -> Result<(), AsmError> {
        let masked = self.masked_image();

        let mut file = File::create(path)?;
        let written = file.write(&masked)?;
        if written != masked.len() {
            return Err(AsmError::IoMismatch {
                expected: masked.len(),
                actual: written,
            });
        }
        file.flush()?;

        Ok(())
    }

    /// Returns every substructure to the known-empty state. Idempotent,
    /// and safe whatever was (or was not) filled in before the call.
    pub fn reset(&mut self) {
        self.source = String::new();
        self.labels.clear();
        self.jumps.clear();
        self.byte_code.clear();
    }

    fn log_labels(&self) {
        for label in self.labels.iter() {
            debug!("label `{}` -> {:#06X}", label.name, label.ip_pos);
        }
    }

    fn log_jumps(&self) {
        for jump in self.jumps.iter() {
            debug!(
                "jump at {:#06X} -> `{}` ({:?})",
                jump.patch_pos, jump.target, jump.resolved
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use std::convert::TryInto;

    use super::super::isa::{Opcode, INT_ALIGN};
    use super::*;

    const SOURCE: &str = "\
main:
    push 2.0
    push 3.0
    pow           ; 2^3
loop:
    pushr rax
    popr rbx
    jb loop
    jmp end
end:
    hlt
";

    #[test]
    fn test_assemble_happy_path() {
        let manager = assemble(SOURCE).unwrap();

        // Entry jump targets `main`, which binds just past the header.
        let main_pos = manager.labels().lookup("main").unwrap();
        assert_eq!(main_pos, 2 * INT_ALIGN);
        let entry = i32::from_le_bytes(
            manager.image()[INT_ALIGN..2 * INT_ALIGN].try_into().unwrap(),
        );
        assert_eq!(entry as usize, main_pos);
        assert_eq!(manager.image()[0], Opcode::JMP.id());

        assert_eq!(manager.labels().len(), 3);
        assert_eq!(manager.jumps().len(), 2);
        assert!(manager.jumps().iter().all(|j| j.resolved.is_some()));
    }

    #[test]
    fn test_missing_entry_label_yields_no_manager() {
        let err = assemble("start: hlt").unwrap_err();
        assert!(matches!(err, AsmError::MissingEntryLabel));
    }

    #[test]
    fn test_duplicate_label_fails() {
        let err = assemble("main: hlt\nmain: hlt").unwrap_err();
        assert!(matches!(
            err,
            AsmError::DuplicateLabel { ref name, line: 2 } if name == "main"
        ));
    }

    #[test]
    fn test_image_is_compacted() {
        let manager = assemble(SOURCE).unwrap();
        assert_eq!(manager.byte_code.capacity(), manager.byte_code.len());
    }

    #[test]
    fn test_masked_image_round_trips() {
        let manager = assemble("main: hlt").unwrap();

        let masked = manager.masked_image();
        assert_ne!(&masked[..], manager.image());

        let unmasked: Vec<u8> = masked.iter().map(|b| b ^ OUTPUT_MASK).collect();
        assert_eq!(&unmasked[..], manager.image());
    }

    #[test]
    fn test_create_bin_writes_masked_artifact() {
        let manager = assemble("main: push 1.5\nhlt").unwrap();

        let path = std::env::temp_dir().join("oasm_create_bin_test.bin");
        manager.create_bin(&path).unwrap();

        let on_disk = std::fs::read(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(on_disk, manager.masked_image());
        assert_eq!(on_disk.len(), manager.image().len());
    }

    #[test]
    fn test_reset_is_idempotent() {
        let mut manager = assemble("main: jmp main").unwrap();

        manager.reset();
        assert!(manager.image().is_empty());
        assert!(manager.labels().is_empty());
        assert!(manager.jumps().is_empty());

        manager.reset();
        assert!(manager.image().is_empty());
    }
}
