//! The purely streaming commands: one row in, at most one row out.

use crate::ast::Expr;
use crate::evaluator::Evaluator;
use crate::parser;

use super::{CliError, Settings};

/// `select <selection>`: project columns.
pub fn select(settings: &Settings, selection: &str) -> Result<(), CliError> {
    let mut reader = settings.reader(selection, &[])?;
    let mut out = settings.writer();
    while let Some(row) = reader.next_row()? {
        out.write_row(&row)?;
    }
    Ok(out.flush()?)
}

/// `filter <expression>`: keep rows whose expression is truthy.
pub fn filter(settings: &Settings, expression: &str) -> Result<(), CliError> {
    let expr = parser::parse_expression(expression)?;
    let mut evaluator = Evaluator::new();
    let mut reader = settings.reader("", &[])?;
    let mut out = settings.writer();
    while let Some(row) = reader.filter_row(&expr, &mut evaluator)? {
        out.write_row(&row)?;
    }
    Ok(out.flush()?)
}

/// `format <spec>…`: rewrite columns in place.
pub fn format(settings: &Settings, specs: &[String]) -> Result<(), CliError> {
    let mut reader = settings.reader("", specs)?;
    let mut out = settings.writer();
    while let Some(row) = reader.next_row()? {
        out.write_row(&row)?;
    }
    Ok(out.flush()?)
}

/// `eval <expression>…`: apply assignment expressions to every row, in the
/// order they were given.
pub fn eval(settings: &Settings, expressions: &[String]) -> Result<(), CliError> {
    let parsed: Vec<Expr> = expressions
        .iter()
        .map(|e| parser::parse_evaluator(e))
        .collect::<Result<_, _>>()?;
    let mut evaluator = Evaluator::new();
    let mut reader = settings.reader("", &[])?;
    let mut out = settings.writer();
    while let Some(mut row) = reader.next_row()? {
        for expr in &parsed {
            row = evaluator.eval_assign(expr, row)?;
        }
        out.write_row(&row)?;
    }
    Ok(out.flush()?)
}

/// `show [header]…`: table output with an optional row limit.
pub fn show(settings: &Settings, headers: &[String], limit: Option<usize>) -> Result<(), CliError> {
    let mut reader = settings.reader("", &[])?;
    let mut out = settings.table_writer();
    if !headers.is_empty() {
        out.write_header(headers)?;
    }
    let mut shown = 0usize;
    while let Some(row) = reader.next_row()? {
        if let Some(limit) = limit {
            if shown >= limit {
                break;
            }
        }
        out.write_row(&row)?;
        shown += 1;
    }
    Ok(out.flush()?)
}
