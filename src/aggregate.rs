//! Numeric folds used by `group`: min, max, sum, count and mean over the
//! columns an operation's selection projects out of each row.
//!
//! Every fold keeps a vector of per-column partials. The vector is sized by
//! the first non-empty input and locked from then on; a later row projecting
//! a different width is rejected rather than silently realigned.

use std::fmt;

/// Errors from feeding an aggregate.
#[derive(Debug, Clone, PartialEq)]
pub enum AggregateError {
    /// A row projected a different number of columns than the first one
    Width { expected: usize, got: usize },
    /// A value that does not parse as a number
    Number(String),
}

impl fmt::Display for AggregateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AggregateError::Width { expected, got } => {
                write!(f, "aggregate expects {} columns, got {}", expected, got)
            }
            AggregateError::Number(v) => write!(f, "'{}' is not a number", v),
        }
    }
}

impl std::error::Error for AggregateError {}

/// A stateful fold over rows of numeric text.
pub trait Aggregate {
    fn update(&mut self, values: &[String]) -> Result<(), AggregateError>;
    fn result(&self) -> Vec<f64>;
}

/// The operations `group` understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Min,
    Max,
    Sum,
    Count,
    Mean,
}

impl Op {
    pub fn from_name(name: &str) -> Option<Op> {
        match name {
            "min" => Some(Op::Min),
            "max" => Some(Op::Max),
            "sum" => Some(Op::Sum),
            "count" => Some(Op::Count),
            "mean" | "avg" => Some(Op::Mean),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Op::Min => "min",
            Op::Max => "max",
            Op::Sum => "sum",
            Op::Count => "count",
            Op::Mean => "mean",
        }
    }

    /// A fresh accumulator for this operation.
    pub fn instantiate(self) -> Box<dyn Aggregate> {
        match self {
            Op::Min => Box::new(Extremum::new(f64::min)),
            Op::Max => Box::new(Extremum::new(f64::max)),
            Op::Sum => Box::new(Sum::default()),
            Op::Count => Box::new(Count::default()),
            Op::Mean => Box::new(Mean::default()),
        }
    }
}

fn parse_column(value: &str) -> Result<f64, AggregateError> {
    value
        .trim()
        .parse::<f64>()
        .map_err(|_| AggregateError::Number(value.to_string()))
}

fn parse_row(values: &[String]) -> Result<Vec<f64>, AggregateError> {
    values.iter().map(|v| parse_column(v)).collect()
}

fn check_width(expected: usize, got: usize) -> Result<(), AggregateError> {
    if expected != got {
        return Err(AggregateError::Width { expected, got });
    }
    Ok(())
}

/// Element-wise min or max; the first row seeds the partials.
struct Extremum {
    values: Vec<f64>,
    pick: fn(f64, f64) -> f64,
}

impl Extremum {
    fn new(pick: fn(f64, f64) -> f64) -> Self {
        Extremum {
            values: Vec::new(),
            pick,
        }
    }
}

impl Aggregate for Extremum {
    fn update(&mut self, values: &[String]) -> Result<(), AggregateError> {
        if values.is_empty() {
            return Ok(());
        }
        let parsed = parse_row(values)?;
        if self.values.is_empty() {
            self.values = parsed;
            return Ok(());
        }
        check_width(self.values.len(), parsed.len())?;
        for (slot, value) in self.values.iter_mut().zip(parsed) {
            *slot = (self.pick)(*slot, value);
        }
        Ok(())
    }

    fn result(&self) -> Vec<f64> {
        self.values.clone()
    }
}

#[derive(Default)]
struct Sum {
    values: Vec<f64>,
}

impl Aggregate for Sum {
    fn update(&mut self, values: &[String]) -> Result<(), AggregateError> {
        if values.is_empty() {
            return Ok(());
        }
        let parsed = parse_row(values)?;
        if self.values.is_empty() {
            self.values = parsed;
            return Ok(());
        }
        check_width(self.values.len(), parsed.len())?;
        for (slot, value) in self.values.iter_mut().zip(parsed) {
            *slot += value;
        }
        Ok(())
    }

    fn result(&self) -> Vec<f64> {
        self.values.clone()
    }
}

/// Counts rows, once per column, regardless of the column values.
#[derive(Default)]
struct Count {
    values: Vec<i64>,
}

impl Aggregate for Count {
    fn update(&mut self, values: &[String]) -> Result<(), AggregateError> {
        if values.is_empty() {
            return Ok(());
        }
        if self.values.is_empty() {
            self.values = vec![0; values.len()];
        }
        check_width(self.values.len(), values.len())?;
        for slot in self.values.iter_mut() {
            *slot += 1;
        }
        Ok(())
    }

    fn result(&self) -> Vec<f64> {
        self.values.iter().map(|&n| n as f64).collect()
    }
}

#[derive(Default)]
struct Mean {
    sum: Sum,
    rows: usize,
}

impl Aggregate for Mean {
    fn update(&mut self, values: &[String]) -> Result<(), AggregateError> {
        self.sum.update(values)?;
        if !values.is_empty() {
            self.rows += 1;
        }
        Ok(())
    }

    fn result(&self) -> Vec<f64> {
        let sums = self.sum.result();
        if self.rows == 0 {
            return vec![0.0; sums.len()];
        }
        let rows = self.rows as f64;
        sums.into_iter().map(|s| s / rows).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn folds() {
        let mut min = Op::Min.instantiate();
        let mut max = Op::Max.instantiate();
        let mut sum = Op::Sum.instantiate();
        let mut count = Op::Count.instantiate();
        let mut mean = Op::Mean.instantiate();
        for r in [row(&["2", "10"]), row(&["8", "4"]), row(&["5", "7"])] {
            for aggr in [&mut min, &mut max, &mut sum, &mut count, &mut mean] {
                aggr.update(&r).unwrap();
            }
        }
        assert_eq!(min.result(), vec![2.0, 4.0]);
        assert_eq!(max.result(), vec![8.0, 10.0]);
        assert_eq!(sum.result(), vec![15.0, 21.0]);
        assert_eq!(count.result(), vec![3.0, 3.0]);
        assert_eq!(mean.result(), vec![5.0, 7.0]);
    }

    #[test]
    fn width_is_locked_by_first_input() {
        let mut sum = Op::Sum.instantiate();
        sum.update(&row(&["1", "2"])).unwrap();
        let err = sum.update(&row(&["1"])).unwrap_err();
        assert_eq!(err, AggregateError::Width { expected: 2, got: 1 });
    }

    #[test]
    fn non_numeric_input_is_reported() {
        let mut min = Op::Min.instantiate();
        assert!(matches!(
            min.update(&row(&["over9000"])),
            Err(AggregateError::Number(_))
        ));
    }

    #[test]
    fn empty_stream_yields_empty_or_zero() {
        let min = Op::Min.instantiate();
        assert!(min.result().is_empty());
        let mean = Op::Mean.instantiate();
        assert!(mean.result().is_empty());
    }
}
