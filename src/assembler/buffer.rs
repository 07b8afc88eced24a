//! A growable length-tagged byte buffer.
//!
//! The buffer distinguishes its carriage (how many bytes were written)
//! from its capacity (how many were allocated). All writes append at
//! the carriage; growth is geometric and happens at most once per
//! append.
use super::error::AsmError;

/// Smallest allocation made by the first write.
const MIN_CAPACITY: usize = 64;

#[derive(Debug, Default)]
pub struct ByteBuffer {
    bytes: Vec<u8>,
}

impl ByteBuffer {
    pub fn new() -> Self {
        ByteBuffer { bytes: Vec::new() }
    }

    /// Current carriage: the number of bytes written so far.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.bytes.capacity()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    /// Ensures room for `extra` more bytes, doubling the capacity until
    /// it fits. Reallocates at most once and never touches written
    /// bytes.
    fn grow_for(&mut self, extra: usize) -> Result<(), AsmError> {
        let needed = self.bytes.len() + extra;
        if needed <= self.bytes.capacity() {
            return Ok(());
        }

        let mut target = self.bytes.capacity().max(MIN_CAPACITY);
        while target < needed {
            target *= 2;
        }

        self.bytes
            .try_reserve_exact(target - self.bytes.len())
            .map_err(|_| AsmError::Allocation { requested: target })
    }

    pub fn write(&mut self, data: &[u8]) -> Result<(), AsmError> {
        self.grow_for(data.len())?;
        self.bytes.extend_from_slice(data);
        Ok(())
    }

    pub fn write_u8(&mut self, value: u8) -> Result<(), AsmError> {
        self.write(&[value])
    }

    pub fn write_i32(&mut self, value: i32) -> Result<(), AsmError> {
        self.write(&value.to_le_bytes())
    }

    pub fn write_f64(&mut self, value: f64) -> Result<(), AsmError> {
        self.write(&value.to_le_bytes())
    }

    /// Pads with zero bytes until the carriage is a multiple of `align`.
    pub fn align_to(&mut self, align: usize) -> Result<(), AsmError> {
        let rem = self.bytes.len() % align;
        if rem != 0 {
            let pad = align - rem;
            self.grow_for(pad)?;
            self.bytes.resize(self.bytes.len() + pad, 0);
        }
        Ok(())
    }

    /// Overwrites four already-written bytes at `pos` in place.
    pub fn patch_i32(&mut self, pos: usize, value: i32) -> Result<(), AsmError> {
        let end = pos + std::mem::size_of::<i32>();
        if end > self.bytes.len() {
            return Err(AsmError::PatchRange {
                pos,
                len: self.bytes.len(),
            });
        }
        self.bytes[pos..end].copy_from_slice(&value.to_le_bytes());
        Ok(())
    }

    /// XORs every written byte with `key`. Self-inverse.
    pub fn mask(&mut self, key: u8) {
        for byte in self.bytes.iter_mut() {
            *byte ^= key;
        }
    }

    /// Shrinks the allocation to the carriage, so no unused trailing
    /// capacity survives into the artifact.
    pub fn compact(&mut self) {
        self.bytes.shrink_to_fit();
    }

    pub fn clear(&mut self) {
        self.bytes = Vec::new();
    }
}
