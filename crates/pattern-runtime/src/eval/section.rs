// Section store: independently addressable byte buffers owned by one evaluation

use std::fmt;

use crate::error::{ErrorKind, EvalError};

/// Identifier of a byte store patterns can live in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SectionId(pub u64);

impl SectionId {
    /// The originally loaded input. Always present, never writable.
    pub const MAIN: SectionId = SectionId(0);
    /// Scratch space for composite-pattern evaluation.
    pub const HEAP: SectionId = SectionId(u64::MAX);

    /// Whether this id is one of the two reserved sections
    pub fn is_reserved(self) -> bool {
        self == Self::MAIN || self == Self::HEAP
    }
}

impl From<SectionId> for u128 {
    fn from(id: SectionId) -> Self {
        u128::from(id.0)
    }
}

impl fmt::Display for SectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            SectionId::MAIN => write!(f, "main"),
            SectionId::HEAP => write!(f, "heap"),
            SectionId(id) => write!(f, "{}", id),
        }
    }
}

/// A user-created section
#[derive(Debug, Clone, Default)]
pub struct Section {
    pub name: String,
    pub bytes: Vec<u8>,
}

/// Arena of dynamically created sections plus the heap.
///
/// Slot `i` holds section id `i + 1`. Removing a section empties its slot but
/// never frees the id, so a stale pattern cannot address a later section.
pub struct SectionStore {
    slots: Vec<Option<Section>>,
    heap: Vec<u8>,
    max_section_size: u64,
}

impl SectionStore {
    pub fn new(max_section_size: u64) -> Self {
        Self {
            slots: Vec::new(),
            heap: Vec::new(),
            max_section_size,
        }
    }

    /// Allocate a new empty section and return its id
    pub fn create(&mut self, name: impl Into<String>) -> SectionId {
        let name = name.into();
        // Ids start at 1 and can never reach HEAP in practice.
        let id = SectionId(self.slots.len() as u64 + 1);
        tracing::debug!(section = %id, name = %name, "created section");
        self.slots.push(Some(Section {
            name,
            bytes: Vec::new(),
        }));
        id
    }

    /// Delete a section; its id becomes invalid for the rest of the run
    pub fn remove(&mut self, id: SectionId) -> Result<(), EvalError> {
        if id.is_reserved() {
            return Err(invalid_section(id));
        }
        let section = self.slot_mut(id)?.take().ok_or_else(|| invalid_section(id))?;
        tracing::debug!(section = %id, name = %section.name, "removed section");
        Ok(())
    }

    /// Look up a live section (the heap has no metadata and is rejected here)
    pub fn get(&self, id: SectionId) -> Result<&Section, EvalError> {
        self.slot_index(id)
            .and_then(|idx| self.slots[idx].as_ref())
            .ok_or_else(|| invalid_section(id))
    }

    pub fn get_mut(&mut self, id: SectionId) -> Result<&mut Section, EvalError> {
        self.slot_mut(id)?.as_mut().ok_or_else(|| invalid_section(id))
    }

    /// Bytes of a live section or the heap
    pub fn bytes(&self, id: SectionId) -> Result<&[u8], EvalError> {
        if id == SectionId::HEAP {
            return Ok(&self.heap);
        }
        if id == SectionId::MAIN {
            return Err(invalid_section(id));
        }
        self.get(id).map(|s| s.bytes.as_slice())
    }

    fn bytes_mut(&mut self, id: SectionId) -> Result<&mut Vec<u8>, EvalError> {
        match id {
            SectionId::MAIN => Err(EvalError::new(ErrorKind::ImmutableSection).with_hint(
                "The main section represents the currently loaded data and is immutable.",
            )),
            SectionId::HEAP => Ok(&mut self.heap),
            _ => self.get_mut(id).map(|s| &mut s.bytes),
        }
    }

    pub fn size(&self, id: SectionId) -> Result<u64, EvalError> {
        self.bytes(id).map(|b| b.len() as u64)
    }

    /// Write `data` at `address`, growing the section and zero-filling any gap.
    pub fn write(&mut self, id: SectionId, address: u64, data: &[u8]) -> Result<(), EvalError> {
        let end = self.ensure_len(id, address, data.len() as u64)?;
        let bytes = self.bytes_mut(id)?;
        bytes[address as usize..end].copy_from_slice(data);
        Ok(())
    }

    /// Grow the section so that `[address, address + size)` is addressable.
    /// Returns the end offset of the range.
    pub fn ensure_len(&mut self, id: SectionId, address: u64, size: u64) -> Result<usize, EvalError> {
        let limit = self.max_section_size;
        let requested = address.checked_add(size).ok_or_else(|| {
            EvalError::new(ErrorKind::SectionSizeLimit {
                section: id,
                requested: u64::MAX,
                limit,
            })
        })?;
        let bytes = self.bytes_mut(id)?;
        if requested > bytes.len() as u64 {
            if requested > limit {
                return Err(EvalError::new(ErrorKind::SectionSizeLimit {
                    section: id,
                    requested,
                    limit,
                }));
            }
            bytes.resize(requested as usize, 0);
        }
        Ok(requested as usize)
    }

    fn slot_index(&self, id: SectionId) -> Option<usize> {
        if id.is_reserved() {
            return None;
        }
        let idx = (id.0 - 1) as usize;
        (idx < self.slots.len()).then_some(idx)
    }

    fn slot_mut(&mut self, id: SectionId) -> Result<&mut Option<Section>, EvalError> {
        match self.slot_index(id) {
            Some(idx) => Ok(&mut self.slots[idx]),
            None => Err(invalid_section(id)),
        }
    }
}

pub(crate) fn invalid_section(id: SectionId) -> EvalError {
    EvalError::new(ErrorKind::InvalidSection(id.into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> SectionStore {
        SectionStore::new(1 << 20)
    }

    #[test]
    fn test_create_returns_fresh_ids() {
        let mut s = store();
        let a = s.create("a");
        let b = s.create("b");
        assert_ne!(a, b);
        assert!(!a.is_reserved());
        assert!(!b.is_reserved());
        assert_eq!(s.size(a).unwrap(), 0);
        assert_eq!(s.get(b).unwrap().name, "b");
    }

    #[test]
    fn test_write_past_end_zero_fills() {
        let mut s = store();
        let id = s.create("stream");
        s.write(id, 4, &[0xAA, 0xBB]).unwrap();
        assert_eq!(s.bytes(id).unwrap(), &[0, 0, 0, 0, 0xAA, 0xBB]);
    }

    #[test]
    fn test_write_inside_does_not_shrink() {
        let mut s = store();
        let id = s.create("stream");
        s.write(id, 0, &[1, 2, 3, 4]).unwrap();
        s.write(id, 1, &[9]).unwrap();
        assert_eq!(s.bytes(id).unwrap(), &[1, 9, 3, 4]);
    }

    #[test]
    fn test_removed_id_is_never_reused() {
        let mut s = store();
        let a = s.create("a");
        s.remove(a).unwrap();
        let b = s.create("b");
        assert_ne!(a, b);
        assert!(matches!(
            s.size(a).unwrap_err().kind,
            ErrorKind::InvalidSection(id) if id == u128::from(a)
        ));
    }

    #[test]
    fn test_remove_reserved_fails() {
        let mut s = store();
        for id in [SectionId::MAIN, SectionId::HEAP, SectionId(42)] {
            assert!(matches!(
                s.remove(id).unwrap_err().kind,
                ErrorKind::InvalidSection(_)
            ));
        }
    }

    #[test]
    fn test_write_main_is_immutable() {
        let mut s = store();
        let err = s.write(SectionId::MAIN, 0, &[1]).unwrap_err();
        assert_eq!(err.kind, ErrorKind::ImmutableSection);
        assert!(err.hint.is_some());
    }

    #[test]
    fn test_heap_is_internally_writable() {
        let mut s = store();
        s.write(SectionId::HEAP, 2, &[7]).unwrap();
        assert_eq!(s.bytes(SectionId::HEAP).unwrap(), &[0, 0, 7]);
    }

    #[test]
    fn test_growth_limit() {
        let mut s = SectionStore::new(8);
        let id = s.create("small");
        s.write(id, 4, &[0; 4]).unwrap();
        let err = s.write(id, 5, &[0; 4]).unwrap_err();
        assert!(matches!(
            err.kind,
            ErrorKind::SectionSizeLimit { requested: 9, limit: 8, .. }
        ));
    }

    #[test]
    fn test_section_id_display() {
        assert_eq!(SectionId::MAIN.to_string(), "main");
        assert_eq!(SectionId::HEAP.to_string(), "heap");
        assert_eq!(SectionId(5).to_string(), "5");
    }
}
