// Evaluation substrate for the ImHex pattern language: sections, typed reads,
// searches, cross-section copies and the native function registry

pub mod config;
pub mod error;
pub mod eval;
pub mod format;
pub mod name;
pub mod span;
pub mod stdlib;

pub use config::RuntimeConfig;
pub use error::{Abort, ErrorKind, EvalError};
pub use eval::console::{Console, LogEntry, LogLevel};
pub use eval::data_source::{DataSource, SliceDataSource};
pub use eval::decode::Endianness;
pub use eval::pattern::{Iterable, PatternNode, PatternValue};
pub use eval::registry::{FunctionRegistry, ParameterCount};
pub use eval::section::SectionId;
pub use eval::value::Value;
pub use eval::Evaluator;
pub use span::{SourceId, Span};

use std::sync::Arc;

/// Result of a completed run: the driver's value plus everything logged
#[derive(Debug)]
pub struct Completed<T> {
    pub value: T,
    pub console: Vec<LogEntry>,
}

/// Main entry point: owns the function table and the settings every
/// evaluation context is created with.
///
/// The table is immutable once built, so cloning a runtime (or handing the
/// `Arc` from [`PatternRuntime::functions`] to other threads) shares it.
#[derive(Clone)]
pub struct PatternRuntime {
    functions: Arc<FunctionRegistry>,
    config: RuntimeConfig,
}

impl PatternRuntime {
    /// Runtime with the standard library and default settings
    pub fn new() -> Self {
        Self::with_config(RuntimeConfig::default())
    }

    pub fn with_config(config: RuntimeConfig) -> Self {
        let mut functions = FunctionRegistry::new();
        stdlib::register_all(&mut functions);
        tracing::debug!(functions = functions.len(), "function registry built");
        Self::with_registry(Arc::new(functions), config)
    }

    /// Runtime over a caller-built table, e.g. the standard library plus host functions
    pub fn with_registry(functions: Arc<FunctionRegistry>, config: RuntimeConfig) -> Self {
        Self { functions, config }
    }

    pub fn functions(&self) -> &Arc<FunctionRegistry> {
        &self.functions
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Fresh context over `data` with its own section store and console
    pub fn create_context<'a>(&self, data: &'a dyn DataSource) -> Evaluator<'a> {
        Evaluator::new(data, &self.config)
    }

    /// Dispatch one native call
    pub fn call(
        &self,
        ctx: &mut Evaluator<'_>,
        name: &str,
        args: &[Value],
    ) -> Result<Option<Value>, EvalError> {
        self.functions.call(ctx, name, args)
    }

    /// Dispatch a call made at `span` in `source`; errors point at the call
    /// unless the handler already attached a location.
    pub fn call_at(
        &self,
        ctx: &mut Evaluator<'_>,
        name: &str,
        args: &[Value],
        span: Span,
        source: &str,
    ) -> Result<Option<Value>, EvalError> {
        self.functions
            .call(ctx, name, args)
            .map_err(|e| e.with_span_if_none(span).resolve_location(source))
    }

    /// Top-level driver.
    ///
    /// Runs `body` against a fresh context over `data`. An error returned by
    /// any step ends the whole run and is turned into an [`Abort`] carrying the
    /// console output produced up to that point.
    pub fn run<T>(
        &self,
        data: &dyn DataSource,
        body: impl FnOnce(&Self, &mut Evaluator<'_>) -> Result<T, EvalError>,
    ) -> Result<Completed<T>, Abort> {
        let mut ctx = self.create_context(data);
        match body(self, &mut ctx) {
            Ok(value) => Ok(Completed {
                value,
                console: ctx.console_mut().drain(),
            }),
            Err(error) => {
                tracing::error!(hint = error.hint.as_deref(), "evaluation aborted: {}", error.kind);
                Err(Abort {
                    error,
                    console: ctx.console_mut().drain(),
                })
            }
        }
    }
}

impl Default for PatternRuntime {
    fn default() -> Self {
        Self::new()
    }
}
