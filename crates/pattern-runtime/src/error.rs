// Error types for the pattern language runtime

use crate::eval::console::LogEntry;
use crate::eval::registry::ParameterCount;
use crate::eval::section::SectionId;
use crate::span::Span;
use std::fmt;
use thiserror::Error;

/// What went wrong. Every variant aborts the current evaluation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ErrorKind {
    /// Carries the id as the script passed it, which may not fit a `SectionId`
    #[error("invalid section id {}", section_label(*.0))]
    InvalidSection(u128),

    #[error("cannot write to main section")]
    ImmutableSection,

    #[error(
        "access of {size} bytes at {address:#x} is out of bounds for section {section} (size {section_size})"
    )]
    OutOfBounds {
        section: SectionId,
        address: u128,
        size: u128,
        section_size: u64,
    },

    #[error("section {section} cannot grow to {requested} bytes (limit {limit})")]
    SectionSizeLimit {
        section: SectionId,
        requested: u64,
        limit: u64,
    },

    #[error("read size {0} is out of range")]
    InvalidSize(i128),

    #[error("invalid byte value {0}")]
    InvalidByteValue(u128),

    #[error("invalid value type: expected {expected}, found {found}")]
    InvalidValueType {
        expected: &'static str,
        found: &'static str,
    },

    #[error("function '{function}' expects {expected} parameters, got {found}")]
    ArityMismatch {
        function: String,
        expected: ParameterCount,
        found: usize,
    },

    #[error("call to unknown function '{0}'")]
    UnknownFunction(String),

    #[error("format error: {0}")]
    FormatError(String),

    /// Raised by `std::error`; the message is the user's own.
    #[error("{0}")]
    UserAbort(String),
}

fn section_label(id: u128) -> String {
    match u64::try_from(id) {
        Ok(id) => SectionId(id).to_string(),
        Err(_) => id.to_string(),
    }
}

/// Evaluation error: a kind plus an optional remediation hint and call-site location
#[derive(Debug, Clone, PartialEq)]
pub struct EvalError {
    pub kind: ErrorKind,
    pub hint: Option<String>,
    pub span: Option<Span>,
    pub line: Option<u32>,
    pub col: Option<u32>,
}

impl EvalError {
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            hint: None,
            span: None,
            line: None,
            col: None,
        }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    /// Set span if not already present
    pub fn with_span_if_none(mut self, span: Span) -> Self {
        if self.span.is_none() {
            self.span = Some(span);
        }
        self
    }

    /// Compute line/col from source text (if span is set but line/col are not)
    pub fn resolve_location(mut self, source: &str) -> Self {
        if let (Some(span), None) = (&self.span, &self.line) {
            let (line, col) = crate::span::offset_to_line_col(source, span.start);
            self.line = Some(line);
            self.col = Some(col);
        }
        self
    }

    /// The human-readable message, without location or hint
    pub fn message(&self) -> String {
        self.kind.to_string()
    }
}

impl From<ErrorKind> for EvalError {
    fn from(kind: ErrorKind) -> Self {
        Self::new(kind)
    }
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.line, self.col) {
            (Some(line), Some(col)) => write!(f, "eval error at {}:{}: {}", line, col, self.kind),
            _ => write!(f, "eval error: {}", self.kind),
        }
    }
}

impl std::error::Error for EvalError {}

/// Top-level abort produced by the driver.
/// Carries the console output logged before evaluation stopped.
#[derive(Debug, Clone)]
pub struct Abort {
    pub error: EvalError,
    pub console: Vec<LogEntry>,
}

impl Abort {
    pub fn kind(&self) -> &ErrorKind {
        &self.error.kind
    }
}

impl fmt::Display for Abort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;
        if let Some(ref hint) = self.error.hint {
            write!(f, "\nhint: {}", hint)?;
        }
        Ok(())
    }
}

impl std::error::Error for Abort {}
