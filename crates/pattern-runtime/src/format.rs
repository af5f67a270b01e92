// Format-string rendering for std::print / std::format
//
// Placeholders follow the {fmt} library syntax scripts are written against:
// `{}`, `{1}`, `{:08X}`, `{0:>10}`, with `{{` and `}}` as escapes.

use crate::error::{ErrorKind, EvalError};
use crate::eval::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Align {
    Left,
    Right,
    Center,
}

#[derive(Debug, Default)]
struct FormatSpec {
    fill: Option<char>,
    align: Option<Align>,
    plus: bool,
    alternate: bool,
    zero: bool,
    width: usize,
    precision: Option<usize>,
    ty: Option<char>,
}

/// Render `fmt` against `args`
pub fn format(fmt: &str, args: &[Value]) -> Result<String, EvalError> {
    let mut out = String::with_capacity(fmt.len());
    let mut chars = fmt.chars().peekable();
    let mut next_auto = 0usize;
    let mut manual = None::<bool>;

    while let Some(c) = chars.next() {
        match c {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                out.push('{');
            }
            '{' => {
                let mut body = String::new();
                loop {
                    match chars.next() {
                        Some('}') => break,
                        Some(ch) => body.push(ch),
                        None => return Err(format_error("missing '}' in format string")),
                    }
                }
                let (id, spec) = match body.split_once(':') {
                    Some((id, spec)) => (id, spec),
                    None => (body.as_str(), ""),
                };
                let index = if id.is_empty() {
                    if manual == Some(true) {
                        return Err(format_error(
                            "cannot switch from manual to automatic argument indexing",
                        ));
                    }
                    manual = Some(false);
                    next_auto += 1;
                    next_auto - 1
                } else {
                    if manual == Some(false) {
                        return Err(format_error(
                            "cannot switch from automatic to manual argument indexing",
                        ));
                    }
                    manual = Some(true);
                    id.trim()
                        .parse::<usize>()
                        .map_err(|_| format_error(format!("invalid argument id '{}'", id)))?
                };
                let arg = args
                    .get(index)
                    .ok_or_else(|| format_error("argument not found"))?;
                let spec = parse_spec(spec)?;
                out.push_str(&render(arg, &spec)?);
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                out.push('}');
            }
            '}' => return Err(format_error("unmatched '}' in format string")),
            _ => out.push(c),
        }
    }
    Ok(out)
}

fn format_error(message: impl Into<String>) -> EvalError {
    EvalError::new(ErrorKind::FormatError(message.into()))
}

fn parse_spec(spec: &str) -> Result<FormatSpec, EvalError> {
    let chars: Vec<char> = spec.chars().collect();
    let mut parsed = FormatSpec::default();
    let mut i = 0;

    let align_of = |c: char| match c {
        '<' => Some(Align::Left),
        '>' => Some(Align::Right),
        '^' => Some(Align::Center),
        _ => None,
    };
    if chars.len() >= 2 && align_of(chars[1]).is_some() {
        parsed.fill = Some(chars[0]);
        parsed.align = align_of(chars[1]);
        i = 2;
    } else if let Some(align) = chars.first().and_then(|&c| align_of(c)) {
        parsed.align = Some(align);
        i = 1;
    }
    if chars.get(i) == Some(&'+') {
        parsed.plus = true;
        i += 1;
    }
    if chars.get(i) == Some(&'#') {
        parsed.alternate = true;
        i += 1;
    }
    if chars.get(i) == Some(&'0') {
        parsed.zero = true;
        i += 1;
    }
    let start = i;
    while chars.get(i).is_some_and(|c| c.is_ascii_digit()) {
        i += 1;
    }
    if i > start {
        parsed.width = parse_count(&chars[start..i])?;
    }
    if chars.get(i) == Some(&'.') {
        i += 1;
        let start = i;
        while chars.get(i).is_some_and(|c| c.is_ascii_digit()) {
            i += 1;
        }
        if i == start {
            return Err(format_error("missing precision specifier"));
        }
        parsed.precision = Some(parse_count(&chars[start..i])?);
    }
    if let Some(&ty) = chars.get(i) {
        if !"dxXobBeEfFsc".contains(ty) {
            return Err(format_error(format!("invalid type specifier '{}'", ty)));
        }
        parsed.ty = Some(ty);
        i += 1;
    }
    if i != chars.len() {
        return Err(format_error(format!("invalid format specifier '{}'", spec)));
    }
    Ok(parsed)
}

/// Largest width or precision accepted, matching a C `int`
const MAX_COUNT: usize = i32::MAX as usize;

fn parse_count(digits: &[char]) -> Result<usize, EvalError> {
    let text: String = digits.iter().collect();
    text.parse::<usize>()
        .ok()
        .filter(|&n| n <= MAX_COUNT)
        .ok_or_else(|| format_error("number is too big"))
}

fn render(arg: &Value, spec: &FormatSpec) -> Result<String, EvalError> {
    match arg {
        Value::Unsigned(v) => render_integer(false, *v, spec),
        Value::Signed(v) => render_integer(*v < 0, v.unsigned_abs(), spec),
        Value::Bool(b) => match spec.ty {
            None | Some('s') => Ok(pad_text(&b.to_string(), spec)),
            Some(_) => render_integer(false, u128::from(*b), spec),
        },
        Value::Char(c) => match spec.ty {
            None | Some('c') => Ok(pad_text(&c.to_string(), spec)),
            Some(_) => render_integer(false, *c as u128, spec),
        },
        Value::Float(f) => render_float(*f, spec),
        Value::String(s) => render_text(s, spec),
        Value::Pattern(p) => render_text(&p.to_display_string(), spec),
    }
}

fn render_integer(negative: bool, magnitude: u128, spec: &FormatSpec) -> Result<String, EvalError> {
    if spec.precision.is_some() {
        return Err(format_error("precision not allowed for this argument type"));
    }
    let (digits, prefix) = match spec.ty {
        None | Some('d') => (magnitude.to_string(), ""),
        Some('x') => (format!("{:x}", magnitude), "0x"),
        Some('X') => (format!("{:X}", magnitude), "0X"),
        Some('o') => (format!("{:o}", magnitude), "0"),
        Some('b') => (format!("{:b}", magnitude), "0b"),
        Some('B') => (format!("{:b}", magnitude), "0B"),
        Some('c') => {
            let c = u32::try_from(magnitude)
                .ok()
                .and_then(char::from_u32)
                .ok_or_else(|| format_error("invalid character value"))?;
            return Ok(pad_text(&c.to_string(), spec));
        }
        Some(ty) => {
            return Err(format_error(format!(
                "invalid type specifier '{}' for integer",
                ty
            )))
        }
    };
    let sign = if negative {
        "-"
    } else if spec.plus {
        "+"
    } else {
        ""
    };
    let prefix = if spec.alternate { prefix } else { "" };
    Ok(pad_number(sign, prefix, &digits, spec))
}

fn render_float(value: f64, spec: &FormatSpec) -> Result<String, EvalError> {
    let body = match (spec.ty, spec.precision) {
        (None, None) => value.abs().to_string(),
        (None | Some('f') | Some('F'), Some(p)) => format!("{:.*}", p, value.abs()),
        (Some('f') | Some('F'), None) => format!("{:.6}", value.abs()),
        (Some('e'), p) => format!("{:.*e}", p.unwrap_or(6), value.abs()),
        (Some('E'), p) => format!("{:.*E}", p.unwrap_or(6), value.abs()),
        (Some(ty), _) => {
            return Err(format_error(format!(
                "invalid type specifier '{}' for float",
                ty
            )))
        }
    };
    let sign = if value.is_sign_negative() && value != 0.0 {
        "-"
    } else if spec.plus {
        "+"
    } else {
        ""
    };
    Ok(pad_number(sign, "", &body, spec))
}

fn render_text(text: &str, spec: &FormatSpec) -> Result<String, EvalError> {
    match spec.ty {
        None | Some('s') => {}
        Some(ty) => {
            return Err(format_error(format!(
                "invalid type specifier '{}' for string",
                ty
            )))
        }
    }
    if spec.plus || spec.alternate || spec.zero {
        return Err(format_error("format specifier requires numeric argument"));
    }
    let text: String = match spec.precision {
        Some(p) => text.chars().take(p).collect(),
        None => text.to_string(),
    };
    Ok(pad_text(&text, spec))
}

fn pad_number(sign: &str, prefix: &str, digits: &str, spec: &FormatSpec) -> String {
    let len = sign.len() + prefix.len() + digits.chars().count();
    if spec.zero && spec.align.is_none() && spec.width > len {
        let zeros = "0".repeat(spec.width - len);
        return format!("{}{}{}{}", sign, prefix, zeros, digits);
    }
    let body = format!("{}{}{}", sign, prefix, digits);
    pad(&body, spec, Align::Right)
}

fn pad_text(text: &str, spec: &FormatSpec) -> String {
    pad(text, spec, Align::Left)
}

fn pad(body: &str, spec: &FormatSpec, default_align: Align) -> String {
    let len = body.chars().count();
    if spec.width <= len {
        return body.to_string();
    }
    let fill = spec.fill.unwrap_or(' ');
    let total = spec.width - len;
    let (left, right) = match spec.align.unwrap_or(default_align) {
        Align::Left => (0, total),
        Align::Right => (total, 0),
        Align::Center => (total / 2, total - total / 2),
    };
    let mut out = String::with_capacity(spec.width);
    out.extend(std::iter::repeat(fill).take(left));
    out.push_str(body);
    out.extend(std::iter::repeat(fill).take(right));
    out
}
