// std - console output, formatting, environment and user aborts

use crate::error::{ErrorKind, EvalError};
use crate::eval::console::LogLevel;
use crate::eval::registry::{FunctionRegistry, ParameterCount};
use crate::eval::value::Value;
use crate::eval::Evaluator;
use crate::format::format;

const NAMESPACE: [&str; 2] = ["builtin", "std"];

pub fn register(registry: &mut FunctionRegistry) {
    // print(format, args...)
    registry.add_function(&NAMESPACE, "print", ParameterCount::more_than(0), |ctx, params| {
        let message = render(params)?;
        ctx.log(LogLevel::Info, message);
        Ok(None)
    });

    // format(format, args...)
    registry.add_function(&NAMESPACE, "format", ParameterCount::more_than(0), |_, params| {
        Ok(Some(Value::String(render(params)?)))
    });

    registry.add_function(&NAMESPACE, "env", ParameterCount::exactly(1), env);

    registry.add_function(
        &NAMESPACE,
        "sizeof_pack",
        ParameterCount::at_least(0),
        |_, params| Ok(Some(Value::Unsigned(params.len() as u128))),
    );

    registry.add_function(&NAMESPACE, "error", ParameterCount::exactly(1), |_, params| {
        Err(EvalError::new(ErrorKind::UserAbort(
            params[0].to_display_string(),
        )))
    });

    registry.add_function(&NAMESPACE, "warning", ParameterCount::exactly(1), |ctx, params| {
        ctx.log(LogLevel::Warning, params[0].to_display_string());
        Ok(None)
    });
}

fn render(params: &[Value]) -> Result<String, EvalError> {
    let fmt = params[0].to_display_string();
    format(&fmt, &params[1..])
}

fn env(ctx: &mut Evaluator<'_>, params: &[Value]) -> Result<Option<Value>, EvalError> {
    let name = params[0].to_display_string();
    match ctx.env_variable(&name) {
        Some(value) => Ok(Some(Value::String(value.to_string()))),
        None => {
            ctx.log(
                LogLevel::Warning,
                format!("environment variable '{}' does not exist", name),
            );
            Ok(Some(Value::String(String::new())))
        }
    }
}
