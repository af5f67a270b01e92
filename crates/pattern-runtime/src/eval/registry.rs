// Native function registry: qualified name -> handler + parameter count contract

use rustc_hash::FxHashMap;
use std::fmt;

use crate::error::{ErrorKind, EvalError};
use crate::name::{Name, StringInterner};

use super::value::Value;
use super::Evaluator;

/// How many arguments a native function accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterCount {
    None,
    Exactly(usize),
    AtLeast(usize),
    MoreThan(usize),
}

impl ParameterCount {
    pub const fn none() -> Self {
        ParameterCount::None
    }

    pub const fn exactly(n: usize) -> Self {
        ParameterCount::Exactly(n)
    }

    pub const fn at_least(n: usize) -> Self {
        ParameterCount::AtLeast(n)
    }

    pub const fn more_than(n: usize) -> Self {
        ParameterCount::MoreThan(n)
    }

    /// Whether a call with `count` arguments satisfies the contract
    pub fn accepts(self, count: usize) -> bool {
        match self {
            ParameterCount::None => count == 0,
            ParameterCount::Exactly(n) => count == n,
            ParameterCount::AtLeast(n) => count >= n,
            ParameterCount::MoreThan(n) => count > n,
        }
    }
}

impl fmt::Display for ParameterCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterCount::None => write!(f, "no"),
            ParameterCount::Exactly(n) => write!(f, "exactly {}", n),
            ParameterCount::AtLeast(n) => write!(f, "at least {}", n),
            ParameterCount::MoreThan(n) => write!(f, "more than {}", n),
        }
    }
}

/// Native function signature. `None` means the call produced no value.
pub type NativeFn =
    Box<dyn Fn(&mut Evaluator<'_>, &[Value]) -> Result<Option<Value>, EvalError> + Send + Sync>;

/// A registered native function
pub struct Function {
    pub qualified_name: String,
    pub parameter_count: ParameterCount,
    handler: NativeFn,
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("qualified_name", &self.qualified_name)
            .field("parameter_count", &self.parameter_count)
            .finish_non_exhaustive()
    }
}

/// Prefix every standard library namespace starts with
pub const BUILTIN_PREFIX: &str = "builtin::";

/// Table of native functions.
///
/// Filled once before the first evaluation, then shared read-only (usually
/// behind an `Arc`) by every `Evaluator`. Lookups never intern new names.
#[derive(Default)]
pub struct FunctionRegistry {
    interner: StringInterner,
    functions: FxHashMap<Name, Function>,
}

impl FunctionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `namespace::name`.
    ///
    /// # Panics
    /// If the qualified name is already registered.
    pub fn add_function(
        &mut self,
        namespace: &[&str],
        name: &str,
        parameter_count: ParameterCount,
        handler: impl Fn(&mut Evaluator<'_>, &[Value]) -> Result<Option<Value>, EvalError>
            + Send
            + Sync
            + 'static,
    ) {
        let qualified_name = qualify(namespace, name);
        let key = self.interner.intern(&qualified_name);
        assert!(
            !self.functions.contains_key(&key),
            "function '{}' registered twice",
            qualified_name
        );
        self.functions.insert(
            key,
            Function {
                qualified_name,
                parameter_count,
                handler: Box::new(handler),
            },
        );
    }

    /// Find a function by qualified name, with or without the `builtin::` prefix
    pub fn get(&self, name: &str) -> Option<&Function> {
        let direct = self
            .interner
            .lookup(name)
            .and_then(|key| self.functions.get(&key));
        if direct.is_some() || name.starts_with(BUILTIN_PREFIX) {
            return direct;
        }
        let prefixed = format!("{}{}", BUILTIN_PREFIX, name);
        self.interner
            .lookup(&prefixed)
            .and_then(|key| self.functions.get(&key))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Validate the argument count and invoke the handler
    pub fn call(
        &self,
        ctx: &mut Evaluator<'_>,
        name: &str,
        args: &[Value],
    ) -> Result<Option<Value>, EvalError> {
        let function = self
            .get(name)
            .ok_or_else(|| EvalError::new(ErrorKind::UnknownFunction(name.to_string())))?;
        if !function.parameter_count.accepts(args.len()) {
            return Err(EvalError::new(ErrorKind::ArityMismatch {
                function: function.qualified_name.clone(),
                expected: function.parameter_count,
                found: args.len(),
            }));
        }
        tracing::trace!(function = %function.qualified_name, args = args.len(), "native call");
        (function.handler)(ctx, args)
    }

    /// Registered qualified names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .functions
            .keys()
            .filter_map(|&key| self.interner.resolve(key))
            .collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

fn qualify(namespace: &[&str], name: &str) -> String {
    let mut qualified = namespace.join("::");
    if !qualified.is_empty() {
        qualified.push_str("::");
    }
    qualified.push_str(name);
    qualified
}
