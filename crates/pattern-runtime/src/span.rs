// Source position tracking for diagnostics raised at call sites

/// Unique identifier for a source file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourceId(pub u32);

/// A span representing a range in source code.
/// The AST walker hands these to the runtime so errors can point at the call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: u32,
    pub end: u32,
    pub source_id: SourceId,
}

impl Span {
    pub fn new(start: u32, end: u32, source_id: SourceId) -> Self {
        Self {
            start,
            end,
            source_id,
        }
    }
}

/// Convert a byte offset to (line, col), both 1-based.
pub fn offset_to_line_col(source: &str, offset: u32) -> (u32, u32) {
    let offset = offset as usize;
    let mut line = 1u32;
    let mut col = 1u32;
    for (i, b) in source.bytes().enumerate() {
        if i >= offset {
            break;
        }
        if b == b'\n' {
            line += 1;
            col = 1;
        } else {
            col += 1;
        }
    }
    (line, col)
}
