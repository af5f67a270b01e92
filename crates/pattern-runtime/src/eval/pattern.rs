// PatternNode: a typed view over a byte range in some section

use smallvec::SmallVec;

use super::section::SectionId;

/// A decoded region of a section.
/// Nodes never own section bytes; `offset + size` is checked when read.
#[derive(Debug, Clone)]
pub struct PatternNode {
    /// Display name of this pattern
    pub name: String,
    /// Type name (e.g., "u32", "Header")
    pub type_name: String,
    /// Section the bytes live in
    pub section: SectionId,
    /// Byte offset in the section
    pub offset: u64,
    /// Size in bytes
    pub size: u64,
    /// Decoded value
    pub value: PatternValue,
    /// Child nodes (struct members, array elements, etc.)
    pub children: Vec<PatternNode>,
}

/// The decoded value of a pattern node
#[derive(Debug, Clone, PartialEq)]
pub enum PatternValue {
    Unsigned(u128),
    Signed(i128),
    Float(f64),
    Bool(bool),
    Char(char),
    String(String),
    /// Enum variant: value + variant name
    Enum {
        value: u128,
        name: String,
    },
    /// Array (children contain elements)
    Array,
    /// Struct (children contain members)
    Struct,
    /// Union (children contain members)
    Union,
    /// Bitfield (children contain fields)
    Bitfield,
}

impl PatternValue {
    /// Arrays, structs, unions and bitfields carry the iteration capability
    pub fn is_composite(&self) -> bool {
        matches!(
            self,
            PatternValue::Array | PatternValue::Struct | PatternValue::Union | PatternValue::Bitfield
        )
    }
}

/// Ordered traversal over the direct children of a composite pattern.
pub trait Iterable {
    fn entry_count(&self) -> u64;

    /// Visit entries `start..end` (in ascending offset order) with their index.
    /// Each call starts a fresh traversal.
    fn for_each_entry(&self, start: u64, end: u64, visit: &mut dyn FnMut(u64, &PatternNode));
}

impl Iterable for PatternNode {
    fn entry_count(&self) -> u64 {
        self.children.len() as u64
    }

    fn for_each_entry(&self, start: u64, end: u64, visit: &mut dyn FnMut(u64, &PatternNode)) {
        let mut order: SmallVec<[usize; 16]> = (0..self.children.len()).collect();
        // Stable: members sharing an offset (unions) keep declaration order.
        order.sort_by_key(|&i| self.children[i].offset);
        let end = end.min(self.entry_count());
        for index in start..end {
            visit(index, &self.children[order[index as usize]]);
        }
    }
}

impl PatternNode {
    pub fn new(
        name: impl Into<String>,
        type_name: impl Into<String>,
        section: SectionId,
        offset: u64,
        size: u64,
        value: PatternValue,
    ) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            section,
            offset,
            size,
            value,
            children: Vec::new(),
        }
    }

    /// Add a child node
    pub fn with_child(mut self, child: PatternNode) -> Self {
        self.children.push(child);
        self
    }

    /// The iteration capability, present only on composite patterns
    pub fn as_iterable(&self) -> Option<&dyn Iterable> {
        if self.value.is_composite() {
            Some(self)
        } else {
            None
        }
    }

    /// Structured textual rendering used by `print`/`format` and string conversion
    pub fn to_display_string(&self) -> String {
        let mut out = String::new();
        self.render_into(&mut out);
        out
    }

    fn render_into(&self, out: &mut String) {
        match &self.value {
            PatternValue::Unsigned(v) => out.push_str(&v.to_string()),
            PatternValue::Signed(v) => out.push_str(&v.to_string()),
            PatternValue::Float(v) => out.push_str(&v.to_string()),
            PatternValue::Bool(v) => out.push_str(if *v { "true" } else { "false" }),
            PatternValue::Char(c) => out.push(*c),
            PatternValue::String(s) => out.push_str(s),
            PatternValue::Enum { value, name } => {
                if name.is_empty() {
                    out.push_str(&format!("{}::??? ({:#x})", self.type_name, value));
                } else {
                    out.push_str(&format!("{}::{}", self.type_name, name));
                }
            }
            PatternValue::Array => {
                out.push('[');
                let mut first = true;
                self.for_each_entry(0, self.entry_count(), &mut |_, child| {
                    if !first {
                        out.push_str(", ");
                    }
                    first = false;
                    child.render_into(out);
                });
                out.push(']');
            }
            PatternValue::Struct | PatternValue::Union | PatternValue::Bitfield => {
                out.push_str(&self.type_name);
                out.push_str(" {");
                let mut first = true;
                self.for_each_entry(0, self.entry_count(), &mut |_, child| {
                    out.push_str(if first { " " } else { ", " });
                    first = false;
                    out.push_str(&child.name);
                    out.push_str(" = ");
                    child.render_into(out);
                });
                out.push_str(" }");
            }
        }
    }
}
