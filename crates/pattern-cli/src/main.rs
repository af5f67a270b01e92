// pl-call: load a file as the main section and dispatch one native function

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use pattern_runtime::{LogLevel, PatternRuntime, RuntimeConfig, SliceDataSource, Value};
use tracing_subscriber::EnvFilter;

/// Call a pattern-language native function against a binary file
#[derive(Parser)]
#[clap(name = "pl-call", version)]
struct Args {
    /// File loaded as the main section
    #[clap(required_unless_present = "list")]
    file: Option<PathBuf>,

    /// Function to call, e.g. `std::mem::read_unsigned`
    #[clap(required_unless_present = "list")]
    function: Option<String>,

    /// Arguments: 42, 0x2A, -1, true, 'c', "text" (anything else is a string)
    #[clap(allow_hyphen_values = true)]
    args: Vec<String>,

    /// Settings file (defaults to the user config directory)
    #[clap(short, long)]
    config: Option<PathBuf>,

    /// List registered functions and exit
    #[clap(short, long)]
    list: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => RuntimeConfig::load_from(path),
        None => RuntimeConfig::load(),
    };
    let runtime = PatternRuntime::with_config(config);

    if args.list {
        for name in runtime.functions().names() {
            println!("{}", name);
        }
        return ExitCode::SUCCESS;
    }

    let (Some(file), Some(function)) = (args.file, args.function) else {
        eprintln!("error: a file and a function name are required");
        return ExitCode::FAILURE;
    };

    let data = match std::fs::read(&file) {
        Ok(data) => data,
        Err(e) => {
            eprintln!("error: cannot read {}: {}", file.display(), e);
            return ExitCode::FAILURE;
        }
    };
    tracing::debug!(path = %file.display(), bytes = data.len(), "loaded main section");
    let call_args: Vec<Value> = args.args.iter().map(|a| parse_literal(a)).collect();

    let source = SliceDataSource::new(&data);
    match runtime.run(&source, |rt, ctx| rt.call(ctx, &function, &call_args)) {
        Ok(done) => {
            for entry in &done.console {
                print_entry(entry.level, &entry.message);
            }
            if let Some(value) = done.value {
                println!("{}", value.to_display_string());
            }
            ExitCode::SUCCESS
        }
        Err(abort) => {
            for entry in &abort.console {
                print_entry(entry.level, &entry.message);
            }
            eprintln!("{}", abort);
            ExitCode::FAILURE
        }
    }
}

fn print_entry(level: LogLevel, message: &str) {
    match level {
        LogLevel::Debug => eprintln!("[DEBUG] {}", message),
        LogLevel::Info => eprintln!("[INFO] {}", message),
        LogLevel::Warning => eprintln!("[WARN] {}", message),
        LogLevel::Error => eprintln!("[ERROR] {}", message),
    }
}

/// Interpret a command-line argument as a literal value
fn parse_literal(text: &str) -> Value {
    match text {
        "true" => return Value::Bool(true),
        "false" => return Value::Bool(false),
        _ => {}
    }
    if text.len() >= 2 && text.starts_with('"') && text.ends_with('"') {
        return Value::String(text[1..text.len() - 1].to_string());
    }
    if text.len() >= 3 && text.starts_with('\'') && text.ends_with('\'') {
        let inner = &text[1..text.len() - 1];
        let mut chars = inner.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            return Value::Char(c);
        }
    }
    if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        if let Ok(v) = u128::from_str_radix(&hex.replace('_', ""), 16) {
            return Value::Unsigned(v);
        }
    }
    if text.starts_with('-') {
        if let Ok(v) = text.parse::<i128>() {
            return Value::Signed(v);
        }
    }
    if let Ok(v) = text.parse::<u128>() {
        return Value::Unsigned(v);
    }
    if text.contains('.') {
        if let Ok(v) = text.parse::<f64>() {
            return Value::Float(v);
        }
    }
    Value::String(text.to_string())
}
