//! Builtin functions callable from expressions.
//!
//! Dispatch is a fixed table: unknown names, wrong argument counts and wrong
//! argument types are reported through dedicated error variants so the
//! caller can tell a typo from a type problem.

use crate::evaluator::EvalError;
use crate::value::Value;

pub fn call(name: &str, args: &[Value]) -> Result<Value, EvalError> {
    match name {
        "len" => len(args),
        "substr" => substr(args),
        "contains" => contains(args),
        "tolower" => map_text(args, "tolower", |s| s.to_lowercase()),
        "toupper" => map_text(args, "toupper", |s| s.to_uppercase()),
        "title" => map_text(args, "title", title_case),
        "abs" => map_number(args, "abs", f64::abs),
        "sqrt" => map_number(args, "sqrt", f64::sqrt),
        "min" => fold_numbers(args, "min", f64::min),
        "max" => fold_numbers(args, "max", f64::max),
        "avg" => avg(args),
        "lshift" => shift(args, "lshift", |u, n| u.checked_shl(n).unwrap_or(0)),
        "rshift" => shift(args, "rshift", |u, n| u.checked_shr(n).unwrap_or(0)),
        _ => Err(EvalError::UnknownFunction(name.to_string())),
    }
}

fn len(args: &[Value]) -> Result<Value, EvalError> {
    let text = one_text(args, "len")?;
    Ok(Value::Number(text.len() as f64))
}

// substr(text, to) or substr(text, from, to): 0-based, half-open.
fn substr(args: &[Value]) -> Result<Value, EvalError> {
    let (from, to) = match args.len() {
        2 => (0.0, number_arg(&args[1], "substr")?),
        3 => (
            number_arg(&args[1], "substr")?,
            number_arg(&args[2], "substr")?,
        ),
        _ => return Err(EvalError::ArgNum("substr")),
    };
    let text = match &args[0] {
        Value::Text(s) => s,
        _ => return Err(EvalError::ArgType("substr")),
    };
    if from < 0.0 || from.fract() != 0.0 || to < 0.0 || to.fract() != 0.0 {
        return Err(EvalError::Range("substr bounds must be non-negative integers".to_string()));
    }
    let (from, to) = (from as usize, to as usize);
    if from >= to || to > text.len() {
        return Err(EvalError::Range(format!(
            "substr bounds {}..{} out of range for length {}",
            from,
            to,
            text.len()
        )));
    }
    match text.get(from..to) {
        Some(slice) => Ok(Value::Text(slice.to_string())),
        None => Err(EvalError::Range(format!(
            "substr bounds {}..{} split a character",
            from, to
        ))),
    }
}

fn contains(args: &[Value]) -> Result<Value, EvalError> {
    if args.len() < 2 {
        return Err(EvalError::ArgNum("contains"));
    }
    let text = match &args[0] {
        Value::Text(s) => s,
        _ => return Err(EvalError::ArgType("contains")),
    };
    for needle in &args[1..] {
        match needle {
            Value::Text(n) => {
                if text.contains(n.as_str()) {
                    return Ok(Value::Bool(true));
                }
            }
            _ => return Err(EvalError::ArgType("contains")),
        }
    }
    Ok(Value::Bool(false))
}

fn avg(args: &[Value]) -> Result<Value, EvalError> {
    if args.is_empty() {
        return Ok(Value::Number(0.0));
    }
    let mut sum = 0.0;
    for arg in args {
        sum += number_arg(arg, "avg")?;
    }
    Ok(Value::Number(sum / args.len() as f64))
}

fn shift(args: &[Value], name: &'static str, apply: fn(u64, u32) -> u64) -> Result<Value, EvalError> {
    if args.len() != 2 {
        return Err(EvalError::ArgNum(name));
    }
    let value = number_arg(&args[0], name)?;
    let by = number_arg(&args[1], name)?;
    if value < 0.0 || value.fract() != 0.0 || by < 0.0 || by.fract() != 0.0 {
        return Err(EvalError::Range(format!(
            "{} operates on non-negative integers",
            name
        )));
    }
    Ok(Value::Number(apply(value as u64, by as u32) as f64))
}

fn map_text(args: &[Value], name: &'static str, apply: fn(&str) -> String) -> Result<Value, EvalError> {
    let text = one_text(args, name)?;
    Ok(Value::Text(apply(text)))
}

fn map_number(args: &[Value], name: &'static str, apply: fn(f64) -> f64) -> Result<Value, EvalError> {
    if args.len() != 1 {
        return Err(EvalError::ArgNum(name));
    }
    Ok(Value::Number(apply(number_arg(&args[0], name)?)))
}

fn fold_numbers(args: &[Value], name: &'static str, apply: fn(f64, f64) -> f64) -> Result<Value, EvalError> {
    let mut result: Option<f64> = None;
    for arg in args {
        let n = number_arg(arg, name)?;
        result = Some(match result {
            Some(acc) => apply(acc, n),
            None => n,
        });
    }
    Ok(Value::Number(result.unwrap_or(0.0)))
}

fn one_text<'a>(args: &'a [Value], name: &'static str) -> Result<&'a str, EvalError> {
    if args.len() != 1 {
        return Err(EvalError::ArgNum(name));
    }
    match &args[0] {
        Value::Text(s) => Ok(s),
        _ => Err(EvalError::ArgType(name)),
    }
}

fn number_arg(value: &Value, name: &'static str) -> Result<f64, EvalError> {
    match value {
        Value::Number(n) => Ok(*n),
        _ => Err(EvalError::ArgType(name)),
    }
}

// Uppercase every letter that follows a non-letter, like titles do.
pub(crate) fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut boundary = true;
    for ch in s.chars() {
        if boundary {
            out.extend(ch.to_uppercase());
        } else {
            out.push(ch);
        }
        boundary = !ch.is_alphabetic();
    }
    out
}
