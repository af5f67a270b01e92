// Interned qualified names (`builtin::std::mem::size`) used as function table keys

use rustc_hash::FxHashMap;
use std::fmt;
use std::sync::Arc;

/// Handle to an interned string. Only meaningful for the interner that made it.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Name(u32);

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Name#{}", self.0)
    }
}

/// Append-only string table. The same text always maps to the same `Name`.
#[derive(Default)]
pub struct StringInterner {
    strings: Vec<Arc<str>>,
    index: FxHashMap<Arc<str>, u32>,
}

impl StringInterner {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn intern(&mut self, text: &str) -> Name {
        if let Some(&idx) = self.index.get(text) {
            return Name(idx);
        }
        let idx = self.strings.len() as u32;
        let shared: Arc<str> = Arc::from(text);
        self.strings.push(shared.clone());
        self.index.insert(shared, idx);
        Name(idx)
    }

    /// Find an existing name without adding one
    pub fn lookup(&self, text: &str) -> Option<Name> {
        self.index.get(text).map(|&idx| Name(idx))
    }

    /// Text behind `name`, `None` for handles from another interner
    pub fn resolve(&self, name: Name) -> Option<&str> {
        self.strings.get(name.0 as usize).map(|s| &**s)
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }
}
