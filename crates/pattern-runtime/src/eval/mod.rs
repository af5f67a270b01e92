// Evaluation context: data access, sections, environment and console for one run

pub mod console;
pub mod data_source;
pub mod decode;
pub mod pattern;
pub mod registry;
pub mod section;
pub mod value;

use std::borrow::Cow;
use std::collections::BTreeMap;

use memchr::memmem;

use crate::config::RuntimeConfig;
use crate::error::{ErrorKind, EvalError};
use console::{Console, LogLevel};
use data_source::{checked_range, DataSource};
use decode::Endianness;
use section::{invalid_section, Section, SectionId, SectionStore};
use value::{string_to_bytes, Value};

/// State shared by every native call of one evaluation.
///
/// Owns the section store exclusively; the main section is the borrowed
/// `DataSource`. One script evaluates against one `Evaluator` at a time.
pub struct Evaluator<'a> {
    data: &'a dyn DataSource,
    sections: SectionStore,
    console: Console,
    env: BTreeMap<String, String>,
    base_address: u64,
    default_endian: Endianness,
}

impl<'a> Evaluator<'a> {
    pub fn new(data: &'a dyn DataSource, config: &RuntimeConfig) -> Self {
        Self {
            data,
            sections: SectionStore::new(config.max_section_size),
            console: Console::new(config.max_console_entries),
            env: config.env.clone(),
            base_address: config.base_address,
            default_endian: config.default_endian,
        }
    }

    /// Mapping origin of the main section
    pub fn data_base_address(&self) -> u64 {
        self.base_address
    }

    /// Length of the main section
    pub fn data_size(&self) -> u64 {
        self.data.size()
    }

    pub fn default_endian(&self) -> Endianness {
        self.default_endian
    }

    pub fn set_default_endian(&mut self, endian: Endianness) {
        self.default_endian = endian;
    }

    /// Decode a script endian enumerant against the configured native order
    pub fn resolve_endian(&self, enumerant: u128) -> Result<Endianness, EvalError> {
        Endianness::from_enumerant(enumerant, self.default_endian)
    }

    pub fn console(&self) -> &Console {
        &self.console
    }

    pub fn console_mut(&mut self) -> &mut Console {
        &mut self.console
    }

    pub fn log(&mut self, level: LogLevel, message: impl Into<String>) {
        self.console.log(level, message);
    }

    /// Look up a host-provided variable. A miss is not an error.
    pub fn env_variable(&self, name: &str) -> Option<&str> {
        self.env.get(name).map(String::as_str)
    }

    pub fn set_env_variable(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.env.insert(name.into(), value.into());
    }

    // ========== Sections ==========

    pub fn create_section(&mut self, name: impl Into<String>) -> SectionId {
        self.sections.create(name)
    }

    pub fn remove_section(&mut self, id: SectionId) -> Result<(), EvalError> {
        self.sections.remove(id)
    }

    /// Metadata and bytes of a user section
    pub fn section(&self, id: SectionId) -> Result<&Section, EvalError> {
        self.sections.get(id)
    }

    pub fn sections(&self) -> &SectionStore {
        &self.sections
    }

    /// Direct store access for the pattern evaluator (heap writes and the like)
    pub fn sections_mut(&mut self) -> &mut SectionStore {
        &mut self.sections
    }

    /// Current length of any section, main and heap included
    pub fn section_size(&self, id: SectionId) -> Result<u64, EvalError> {
        if id == SectionId::MAIN {
            Ok(self.data.size())
        } else {
            self.sections.size(id)
        }
    }

    // ========== Read pipeline ==========

    /// Bounds-checked copy of `size` bytes at `address` in `section`
    pub fn read_data(&self, address: u64, size: u64, section: SectionId) -> Result<Vec<u8>, EvalError> {
        if section == SectionId::MAIN {
            return self.data.read_bytes(address, size);
        }
        let bytes = self.sections.bytes(section)?;
        let range = checked_range(address, size, bytes.len() as u64).ok_or_else(|| {
            EvalError::new(ErrorKind::OutOfBounds {
                section,
                address: address.into(),
                size: size.into(),
                section_size: bytes.len() as u64,
            })
        })?;
        Ok(bytes[range].to_vec())
    }

    /// Read a `size`-byte unsigned integer (1..=16 bytes)
    pub fn read_unsigned(
        &self,
        address: u64,
        size: i128,
        endian: Endianness,
        section: SectionId,
    ) -> Result<u128, EvalError> {
        let size = decode::check_read_size(size)?;
        let bytes = self.read_data(address, size, section)?;
        Ok(decode::decode_unsigned(&bytes, endian))
    }

    /// Read a `size`-byte signed integer, sign-extended to 128 bits
    pub fn read_signed(
        &self,
        address: u64,
        size: i128,
        endian: Endianness,
        section: SectionId,
    ) -> Result<i128, EvalError> {
        let size = decode::check_read_size(size)?;
        let bytes = self.read_data(address, size, section)?;
        Ok(decode::decode_signed(&bytes, endian))
    }

    /// Raw bytes of the main section as a string, no terminator required
    pub fn read_string(&self, address: u64, size: u64) -> Result<String, EvalError> {
        let bytes = self.read_data(address, size, SectionId::MAIN)?;
        Ok(value::bytes_to_string(&bytes))
    }

    /// Address of the `occurrence`-th (0-based) match of `sequence` in the main
    /// section, searching `[from, end)`. `to <= from` searches to the end of data.
    pub fn find_sequence(
        &self,
        occurrence: u64,
        from: u64,
        to: u64,
        sequence: &[u8],
    ) -> Result<Option<u64>, EvalError> {
        let data_size = self.data.size();
        let end = if to <= from { data_size } else { data_size.min(to) };
        if sequence.is_empty() || from >= end || end - from < sequence.len() as u64 {
            return Ok(None);
        }
        // Search in-memory input in place; other sources hand over a copy of the window
        let in_memory = self
            .data
            .as_slice()
            .and_then(|slice| slice.get(from as usize..end as usize));
        let window: Cow<'_, [u8]> = match in_memory {
            Some(slice) => Cow::Borrowed(slice),
            None => Cow::Owned(self.read_data(from, end - from, SectionId::MAIN)?),
        };
        let finder = memmem::Finder::new(sequence);
        let mut seen = 0u64;
        let mut start = 0usize;
        while let Some(pos) = finder.find(&window[start..]) {
            let at = start + pos;
            if seen == occurrence {
                return Ok(Some(from + at as u64));
            }
            seen += 1;
            start = at + 1;
        }
        Ok(None)
    }

    // ========== Cross-section copy ==========

    /// Copy `size` bytes between sections; the destination grows as needed.
    pub fn copy_to_section(
        &mut self,
        from: SectionId,
        from_address: u64,
        to: SectionId,
        to_address: u64,
        size: u64,
    ) -> Result<(), EvalError> {
        self.check_copy_target(to)?;
        let bytes = self.read_data(from_address, size, from)?;
        self.sections.write(to, to_address, &bytes)
    }

    /// Copy a string's bytes or a pattern's bytes into a section.
    /// Composite patterns are flattened: direct children are written back to
    /// back in ascending order, ignoring gaps between them in the source.
    /// The destination grows only by the bytes written, so a pattern with
    /// gaps leaves it shorter than `to_address` plus the pattern's size.
    pub fn copy_value_to_section(
        &mut self,
        value: &Value,
        to: SectionId,
        to_address: u64,
    ) -> Result<(), EvalError> {
        self.check_copy_target(to)?;
        let bytes = match value {
            Value::String(s) => string_to_bytes(s),
            Value::Pattern(pattern) => match pattern.as_iterable() {
                Some(iterable) => {
                    let mut bytes = Vec::new();
                    let mut failure = None;
                    iterable.for_each_entry(0, iterable.entry_count(), &mut |_, entry| {
                        if failure.is_some() {
                            return;
                        }
                        match self.read_data(entry.offset, entry.size, entry.section) {
                            Ok(chunk) => bytes.extend_from_slice(&chunk),
                            Err(e) => failure = Some(e),
                        }
                    });
                    if let Some(e) = failure {
                        return Err(e);
                    }
                    bytes
                }
                None => self.read_data(pattern.offset, pattern.size, pattern.section)?,
            },
            Value::Unsigned(_)
            | Value::Signed(_)
            | Value::Float(_)
            | Value::Bool(_)
            | Value::Char(_) => {
                return Err(EvalError::new(ErrorKind::InvalidValueType {
                    expected: "string or pattern",
                    found: value.kind_name(),
                })
                .with_hint("Only strings and patterns are allowed."))
            }
        };
        self.sections.write(to, to_address, &bytes)
    }

    /// Destinations of user copies: never main, never heap, must be alive
    pub fn check_copy_target(&self, to: SectionId) -> Result<(), EvalError> {
        match to {
            SectionId::MAIN => Err(EvalError::new(ErrorKind::ImmutableSection).with_hint(
                "The main section represents the currently loaded data and is immutable.",
            )),
            SectionId::HEAP => Err(invalid_section(to)),
            _ => self.sections.get(to).map(|_| ()),
        }
    }
}
