// Standard library: native functions registered under `builtin::std`

pub mod io;
pub mod mem;

use crate::error::{ErrorKind, EvalError};
use crate::eval::registry::FunctionRegistry;
use crate::eval::section::SectionId;
use crate::eval::value::Value;
use crate::eval::Evaluator;

/// Register all standard library functions
pub fn register_all(registry: &mut FunctionRegistry) {
    io::register(registry);
    mem::register(registry);
}

/// Section id argument. Ids that do not fit 64 bits name no section.
pub(crate) fn arg_section(value: &Value) -> Result<SectionId, EvalError> {
    let id = value.to_unsigned()?;
    u64::try_from(id)
        .map(SectionId)
        .map_err(|_| EvalError::new(ErrorKind::InvalidSection(id)))
}

/// Address and size of an access to `section`. Anything past 64 bits lies
/// outside every section.
pub(crate) fn arg_range(
    ctx: &Evaluator<'_>,
    section: SectionId,
    address: u128,
    size: u128,
) -> Result<(u64, u64), EvalError> {
    match (u64::try_from(address), u64::try_from(size)) {
        (Ok(address), Ok(size)) => Ok((address, size)),
        _ => Err(EvalError::new(ErrorKind::OutOfBounds {
            section,
            address,
            size,
            section_size: ctx.section_size(section)?,
        })),
    }
}

/// Search bound or occurrence index. Values past 64 bits clamp to `u64::MAX`,
/// which is past the end of any data and so behaves like the original value.
pub(crate) fn arg_clamped(value: &Value) -> Result<u64, EvalError> {
    let v = value.to_unsigned()?;
    Ok(u64::try_from(v).unwrap_or(u64::MAX))
}
