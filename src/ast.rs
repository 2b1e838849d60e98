//! Tokens and the expression tree for the row mini-language.
//!
//! Expressions drive three commands: `filter` (any expression, coerced to a
//! boolean per the truthiness rule), `eval` (assignment expressions that
//! rewrite the row) and `split` (a filter choosing which rows are routed).
//! The tree is a plain tagged enum; the evaluator dispatches on the variant
//! rather than on virtual calls, which keeps parser output inspectable.

use std::fmt;

/// A lexical token of the expression language.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Numeric literal, e.g. `42` or `3.14`
    Number(f64),

    /// Quoted text literal, e.g. `"west"`
    Text(String),

    /// Bare identifier: `true`, `false`, or a builtin function name
    Variable(String),

    /// Row reference, e.g. `$3`; negative counts from the end (`$-1`)
    Index(i32),

    /// Braced reference, e.g. `{NOW}` or `{HOME}`
    Env(String),

    /// Cast suffix, e.g. `::number`
    Cast(String),

    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Caret,
    LParen,
    RParen,
    Comma,
    Question,
    Colon,
    Bang,
    Assign,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    And,
    Or,
    Eof,
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Power,
    And,
    Or,
    Equal,
    NotEqual,
    LessThan,
    LessEqual,
    GreaterThan,
    GreaterEqual,
}

impl BinOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Subtract => "-",
            BinOp::Multiply => "*",
            BinOp::Divide => "/",
            BinOp::Modulo => "%",
            BinOp::Power => "^",
            BinOp::And => "&&",
            BinOp::Or => "||",
            BinOp::Equal => "==",
            BinOp::NotEqual => "!=",
            BinOp::LessThan => "<",
            BinOp::LessEqual => "<=",
            BinOp::GreaterThan => ">",
            BinOp::GreaterEqual => ">=",
        }
    }
}

/// Prefix operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnOp {
    Negate,
    Not,
}

impl UnOp {
    pub fn symbol(self) -> &'static str {
        match self {
            UnOp::Negate => "-",
            UnOp::Not => "!",
        }
    }
}

/// Target type of an explicit cast (`::number`, `::text`, `::bool`).
///
/// Spelling variants are folded here at parse time; an unknown name is a
/// parse error, never a row-time surprise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
    Number,
    Text,
    Bool,
}

impl Tag {
    pub fn from_name(name: &str) -> Option<Tag> {
        match name {
            "number" | "float" | "int" => Some(Tag::Number),
            "text" | "string" => Some(Tag::Text),
            "bool" | "boolean" => Some(Tag::Bool),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Tag::Number => "number",
            Tag::Text => "text",
            Tag::Bool => "bool",
        }
    }
}

/// A parsed expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Numeric constant
    Literal(f64),

    /// Text constant
    Text(String),

    /// Boolean constant
    Bool(bool),

    /// Row reference: 1-based index, negative counts from the end.
    ///
    /// Without an explicit cast the field value is promoted through the
    /// number → bool → text fallback chain at evaluation time.
    Identifier { index: i32, cast: Option<Tag> },

    /// Builtin symbol (`NOW`, `RAND`, `HOST`) or environment variable
    Internal(String),

    /// Explicit coercion of a constant or internal
    Cast { inner: Box<Expr>, target: Tag },

    /// `!x` or `-x`
    Prefix { op: UnOp, right: Box<Expr> },

    /// Arithmetic, logic or comparison
    Infix {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },

    /// `cond ? then : otherwise`; only the chosen branch is evaluated
    Ternary {
        cond: Box<Expr>,
        then: Box<Expr>,
        otherwise: Box<Expr>,
    },

    /// Builtin function application; a bare name is a zero-argument call
    Call { name: String, args: Vec<Expr> },

    /// Row mutation. The parser guarantees the target is absent (append),
    /// a `Literal` (insert at that 1-based position) or an `Identifier`
    /// (overwrite that position).
    Assign {
        target: Option<Box<Expr>>,
        value: Box<Expr>,
    },
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Literal(n) => write!(f, "{}", n),
            Expr::Text(s) => write!(f, "\"{}\"", s),
            Expr::Bool(b) => write!(f, "{}", b),
            Expr::Identifier { index, cast } => {
                write!(f, "${}", index)?;
                if let Some(tag) = cast {
                    write!(f, "::{}", tag.name())?;
                }
                Ok(())
            }
            Expr::Internal(name) => write!(f, "{{{}}}", name),
            Expr::Cast { inner, target } => write!(f, "{}::{}", inner, target.name()),
            Expr::Prefix { op, right } => write!(f, "({}{})", op.symbol(), right),
            Expr::Infix { op, left, right } => {
                write!(f, "({} {} {})", left, op.symbol(), right)
            }
            Expr::Ternary {
                cond,
                then,
                otherwise,
            } => write!(f, "({} ? {} : {})", cond, then, otherwise),
            Expr::Call { name, args } => {
                if args.is_empty() {
                    return f.write_str(name);
                }
                write!(f, "{}(", name)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                f.write_str(")")
            }
            Expr::Assign { target, value } => {
                if let Some(target) = target {
                    write!(f, "{} = {}", target, value)
                } else {
                    write!(f, "= {}", value)
                }
            }
        }
    }
}
