//! Tree-walking evaluation of expressions against a row.
//!
//! A single routine dispatches on the expression variant. Rows stay
//! `Vec<String>` end to end; values are promoted to [`Value`] only for the
//! duration of one evaluation. The evaluator owns the random source so that
//! `RAND` can be made reproducible in tests.

use std::env;
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::{
    ast::{BinOp, Expr, Tag, UnOp},
    functions,
    value::{parse_bool, Value},
};

/// Errors that can occur while evaluating an expression.
#[derive(Debug, Clone, PartialEq)]
pub enum EvalError {
    /// Row reference outside `[1..len]`
    Index { index: i32, len: usize },
    /// Operator applied to operands it does not support
    Type(String),
    /// A value that would not coerce to the requested type
    Cast { target: &'static str, value: String },
    /// Division or modulo by zero
    DivisionByZero,
    /// Call of a name missing from the builtin table
    UnknownFunction(String),
    /// Builtin called with the wrong number of arguments
    ArgNum(&'static str),
    /// Builtin called with the wrong type of arguments
    ArgType(&'static str),
    /// Builtin argument outside its domain
    Range(String),
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvalError::Index { index, len } => {
                write!(f, "index {} out of range for row of {} fields", index, len)
            }
            EvalError::Type(msg) => write!(f, "type mismatch: {}", msg),
            EvalError::Cast { target, value } => {
                write!(f, "can not cast '{}' to {}", value, target)
            }
            EvalError::DivisionByZero => write!(f, "division by zero"),
            EvalError::UnknownFunction(name) => write!(f, "unknown function '{}'", name),
            EvalError::ArgNum(name) => write!(f, "wrong number of arguments for {}", name),
            EvalError::ArgType(name) => write!(f, "wrong type of arguments for {}", name),
            EvalError::Range(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for EvalError {}

pub struct Evaluator {
    rng: StdRng,
}

impl Evaluator {
    /// An evaluator whose `RAND` stream is seeded from the wall clock.
    pub fn new() -> Self {
        let seed = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0);
        Evaluator::with_seed(seed)
    }

    /// An evaluator with a fixed `RAND` stream, for reproducible tests.
    pub fn with_seed(seed: u64) -> Self {
        Evaluator {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Evaluate an expression to a value.
    pub fn eval_value(&mut self, expr: &Expr, row: &[String]) -> Result<Value, EvalError> {
        match expr {
            Expr::Literal(n) => Ok(Value::Number(*n)),
            Expr::Text(s) => Ok(Value::Text(s.clone())),
            Expr::Bool(b) => Ok(Value::Bool(*b)),
            Expr::Identifier { index, cast } => resolve_identifier(*index, *cast, row),
            Expr::Internal(name) => Ok(self.resolve_internal(name)),
            Expr::Cast { inner, target } => {
                let value = self.eval_value(inner, row)?;
                coerce(value, *target)
            }
            Expr::Prefix { op, right } => {
                let value = self.eval_value(right, row)?;
                match (op, value) {
                    (UnOp::Not, Value::Bool(b)) => Ok(Value::Bool(!b)),
                    (UnOp::Negate, Value::Number(n)) => Ok(Value::Number(-n)),
                    (op, value) => Err(EvalError::Type(format!(
                        "{}{}",
                        op.symbol(),
                        value.type_name()
                    ))),
                }
            }
            Expr::Infix { op, left, right } => self.eval_infix(*op, left, right, row),
            Expr::Ternary {
                cond,
                then,
                otherwise,
            } => {
                let chosen = if self.eval_value(cond, row)?.is_truthy() {
                    then
                } else {
                    otherwise
                };
                self.eval_value(chosen, row)
            }
            Expr::Call { name, args } => {
                let mut values = Vec::with_capacity(args.len());
                for arg in args {
                    values.push(self.eval_value(arg, row)?);
                }
                functions::call(name, &values)
            }
            Expr::Assign { value, .. } => self.eval_value(value, row),
        }
    }

    /// Evaluate a filter expression and coerce the result to a boolean.
    pub fn is_match(&mut self, expr: &Expr, row: &[String]) -> Result<bool, EvalError> {
        Ok(self.eval_value(expr, row)?.is_truthy())
    }

    /// Apply an assignment expression, producing the rewritten row.
    pub fn eval_assign(&mut self, expr: &Expr, mut row: Vec<String>) -> Result<Vec<String>, EvalError> {
        let (target, value) = match expr {
            Expr::Assign { target, value } => (target, value),
            _ => {
                return Err(EvalError::Type(
                    "expression does not rewrite the row".to_string(),
                ))
            }
        };
        let rendered = self.eval_value(value, &row)?.to_string();
        match target.as_deref() {
            None => row.push(rendered),
            Some(Expr::Literal(position)) => {
                if position.fract() != 0.0 {
                    return Err(EvalError::Type(
                        "assignment position must be an integer".to_string(),
                    ));
                }
                let position = *position as i64;
                if position < 1 || position as usize > row.len() {
                    return Err(EvalError::Index {
                        index: position as i32,
                        len: row.len(),
                    });
                }
                row.insert(position as usize - 1, rendered);
            }
            Some(Expr::Identifier { index, .. }) => {
                if *index < 1 || *index as usize > row.len() {
                    return Err(EvalError::Index {
                        index: *index,
                        len: row.len(),
                    });
                }
                row[*index as usize - 1] = rendered;
            }
            // The parser rejects every other target shape.
            Some(_) => {
                return Err(EvalError::Type(
                    "invalid assignment target".to_string(),
                ))
            }
        }
        Ok(row)
    }

    fn resolve_internal(&mut self, name: &str) -> Value {
        match name {
            "NOW" => {
                let now = SystemTime::now()
                    .duration_since(UNIX_EPOCH)
                    .map(|d| d.as_secs_f64())
                    .unwrap_or(0.0);
                Value::Number(now)
            }
            "RAND" => Value::Number(self.rng.gen::<f64>()),
            "HOST" => {
                let host = hostname::get()
                    .map(|h| h.to_string_lossy().into_owned())
                    .unwrap_or_else(|_| "localhost".to_string());
                Value::Text(host)
            }
            _ => Value::Text(env::var(name).unwrap_or_default()),
        }
    }

    fn eval_infix(
        &mut self,
        op: BinOp,
        left: &Expr,
        right: &Expr,
        row: &[String],
    ) -> Result<Value, EvalError> {
        // || decides on the left value alone when it can.
        if op == BinOp::Or {
            return self.eval_or(left, right, row);
        }
        let left = self.eval_value(left, row)?;
        let right = self.eval_value(right, row)?;
        match op {
            BinOp::Add => match (left, right) {
                (Value::Number(x), Value::Number(y)) => Ok(Value::Number(x + y)),
                (Value::Text(x), Value::Text(y)) => Ok(Value::Text(x + &y)),
                (left, right) => Err(mismatch(op, &left, &right)),
            },
            BinOp::Subtract => numeric(op, left, right, |x, y| Ok(x - y)),
            BinOp::Multiply => match (left, right) {
                (Value::Number(x), Value::Number(y)) => Ok(Value::Number(x * y)),
                (Value::Number(n), Value::Text(s)) | (Value::Text(s), Value::Number(n)) => {
                    repeat_text(&s, n)
                }
                (left, right) => Err(mismatch(op, &left, &right)),
            },
            BinOp::Divide => numeric(op, left, right, |x, y| {
                if y == 0.0 {
                    Err(EvalError::DivisionByZero)
                } else {
                    Ok(x / y)
                }
            }),
            BinOp::Modulo => numeric(op, left, right, |x, y| {
                if y == 0.0 {
                    Err(EvalError::DivisionByZero)
                } else {
                    Ok(x % y)
                }
            }),
            BinOp::Power => numeric(op, left, right, |x, y| Ok(x.powf(y))),
            BinOp::And => Ok(Value::Bool(left.is_truthy() && right.is_truthy())),
            BinOp::Equal => equality(op, &left, &right).map(Value::Bool),
            BinOp::NotEqual => equality(op, &left, &right).map(|b| Value::Bool(!b)),
            BinOp::LessThan => ordering(op, &left, &right, |o| o.is_lt()),
            BinOp::LessEqual => ordering(op, &left, &right, |o| o.is_le()),
            BinOp::GreaterThan => ordering(op, &left, &right, |o| o.is_gt()),
            BinOp::GreaterEqual => ordering(op, &left, &right, |o| o.is_ge()),
            BinOp::Or => unreachable!("|| handled before operand evaluation"),
        }
    }

    // A truthy left short-circuits. Between two numbers the chosen operand
    // is returned as-is rather than collapsed to a boolean.
    fn eval_or(&mut self, left: &Expr, right: &Expr, row: &[String]) -> Result<Value, EvalError> {
        let left = self.eval_value(left, row)?;
        if left.is_truthy() {
            return Ok(match left {
                Value::Number(_) => left,
                _ => Value::Bool(true),
            });
        }
        let right = self.eval_value(right, row)?;
        match (&left, &right) {
            (Value::Number(_), Value::Number(_)) => Ok(right),
            _ => Ok(Value::Bool(right.is_truthy())),
        }
    }
}

impl Default for Evaluator {
    fn default() -> Self {
        Evaluator::new()
    }
}

fn resolve_identifier(index: i32, cast: Option<Tag>, row: &[String]) -> Result<Value, EvalError> {
    let len = row.len() as i64;
    let at = if index < 0 {
        len + index as i64
    } else {
        index as i64 - 1
    };
    if at < 0 || at >= len {
        return Err(EvalError::Index {
            index,
            len: row.len(),
        });
    }
    let raw = &row[at as usize];
    match cast {
        Some(Tag::Number) => raw.parse::<f64>().map(Value::Number).map_err(|_| EvalError::Cast {
            target: "number",
            value: raw.clone(),
        }),
        Some(Tag::Bool) => parse_bool(raw).map(Value::Bool).ok_or_else(|| EvalError::Cast {
            target: "bool",
            value: raw.clone(),
        }),
        Some(Tag::Text) => Ok(Value::Text(raw.clone())),
        // Uncasted references promote through number, then bool, then text.
        None => Ok(raw
            .parse::<f64>()
            .map(Value::Number)
            .ok()
            .or_else(|| parse_bool(raw).map(Value::Bool))
            .unwrap_or_else(|| Value::Text(raw.clone()))),
    }
}

fn coerce(value: Value, target: Tag) -> Result<Value, EvalError> {
    match target {
        Tag::Number => match value {
            Value::Number(_) => Ok(value),
            Value::Bool(b) => Ok(Value::Number(if b { 1.0 } else { 0.0 })),
            Value::Text(s) => s.parse::<f64>().map(Value::Number).map_err(|_| EvalError::Cast {
                target: "number",
                value: s,
            }),
        },
        Tag::Text => Ok(Value::Text(value.to_string())),
        Tag::Bool => Ok(Value::Bool(value.is_truthy())),
    }
}

fn numeric(
    op: BinOp,
    left: Value,
    right: Value,
    apply: impl Fn(f64, f64) -> Result<f64, EvalError>,
) -> Result<Value, EvalError> {
    match (left, right) {
        (Value::Number(x), Value::Number(y)) => apply(x, y).map(Value::Number),
        (left, right) => Err(mismatch(op, &left, &right)),
    }
}

fn equality(op: BinOp, left: &Value, right: &Value) -> Result<bool, EvalError> {
    match (left, right) {
        (Value::Number(x), Value::Number(y)) => Ok(x == y),
        (Value::Text(x), Value::Text(y)) => Ok(x == y),
        (Value::Bool(x), Value::Bool(y)) => Ok(x == y),
        _ => Err(mismatch(op, left, right)),
    }
}

fn ordering(
    op: BinOp,
    left: &Value,
    right: &Value,
    test: impl Fn(std::cmp::Ordering) -> bool,
) -> Result<Value, EvalError> {
    let order = match (left, right) {
        (Value::Number(x), Value::Number(y)) => {
            x.partial_cmp(y).unwrap_or(std::cmp::Ordering::Equal)
        }
        (Value::Text(x), Value::Text(y)) => x.cmp(y),
        _ => return Err(mismatch(op, left, right)),
    };
    Ok(Value::Bool(test(order)))
}

fn repeat_text(s: &str, count: f64) -> Result<Value, EvalError> {
    if count < 0.0 {
        return Err(EvalError::Range(
            "can not repeat text a negative number of times".to_string(),
        ));
    }
    Ok(Value::Text(s.repeat(count as usize)))
}

fn mismatch(op: BinOp, left: &Value, right: &Value) -> EvalError {
    EvalError::Type(format!(
        "{} {} {}",
        left.type_name(),
        op.symbol(),
        right.type_name()
    ))
}
