//! Label and jump bookkeeping for one compilation unit.
//!
//! Both tables are append-only during emission; their carriage is the
//! vector length. The jump table is the single source of truth for what
//! the resolution pass must patch.
use super::error::AsmError;

/// A named binding to an instruction-pointer offset in the image.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Label {
    pub name: String,
    pub ip_pos: usize,
}

#[derive(Debug, Default)]
pub struct LabelTable {
    labels: Vec<Label>,
}

impl LabelTable {
    pub fn new() -> Self {
        LabelTable { labels: Vec::new() }
    }

    /// Binds `name` to `ip_pos`. Binding a name twice is a hard error.
    pub fn bind(&mut self, name: &str, ip_pos: usize, line: usize) -> Result<(), AsmError> {
        if self.lookup(name).is_some() {
            return Err(AsmError::DuplicateLabel {
                name: name.to_owned(),
                line,
            });
        }

        self.labels.push(Label {
            name: name.to_owned(),
            ip_pos,
        });
        Ok(())
    }

    pub fn lookup(&self, name: &str) -> Option<usize> {
        self.labels
            .iter()
            .find(|label| label.name == name)
            .map(|label| label.ip_pos)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Label> {
        self.labels.iter()
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn clear(&mut self) {
        self.labels = Vec::new();
    }
}

/// A jump operand awaiting resolution. Recorded when the placeholder is
/// emitted, possibly before its target label exists.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct JumpRef {
    pub target: String,
    pub patch_pos: usize,
    pub resolved: Option<usize>,
}

#[derive(Debug, Default)]
pub struct JumpTable {
    jumps: Vec<JumpRef>,
}

impl JumpTable {
    pub fn new() -> Self {
        JumpTable { jumps: Vec::new() }
    }

    pub fn record(&mut self, target: &str, patch_pos: usize) {
        self.jumps.push(JumpRef {
            target: target.to_owned(),
            patch_pos,
            resolved: None,
        });
    }

    pub fn iter(&self) -> impl Iterator<Item = &JumpRef> {
        self.jumps.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut JumpRef> {
        self.jumps.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.jumps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jumps.is_empty()
    }

    pub fn clear(&mut self) {
        self.jumps = Vec::new();
    }
}
