//! Column selections: `"1,3:5,7:"` picks field 1, fields 3 through 5 and
//! everything from 7 on. Indices are 1-based; a range written backwards
//! (`5:3`) yields its fields in reverse order; a missing bound leaves that
//! side of the range open. Bounds are checked against each row when the
//! selection is applied, not when it is parsed.

use std::fmt;

/// Errors from parsing or applying a selection.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectError {
    Syntax(String),
    OutOfRange { index: usize, len: usize },
}

impl fmt::Display for SelectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectError::Syntax(msg) => write!(f, "invalid selection: {}", msg),
            SelectError::OutOfRange { index, len } => {
                write!(f, "selection {} out of range for row of {} fields", index, len)
            }
        }
    }
}

impl std::error::Error for SelectError {}

/// One selection atom: a single 1-based index, or an interval whose bounds
/// may be 0 meaning "open on that side".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    start: usize,
    end: usize,
    interval: bool,
}

impl Selection {
    pub fn single(index: usize) -> Self {
        Selection {
            start: index,
            end: 0,
            interval: false,
        }
    }

    pub fn interval(start: usize, end: usize) -> Self {
        Selection {
            start,
            end,
            interval: true,
        }
    }

    /// Resolve this atom against a row.
    pub fn select(&self, row: &[String]) -> Result<Vec<String>, SelectError> {
        if !self.interval {
            return self.select_single(row);
        }
        self.select_interval(row)
    }

    fn select_single(&self, row: &[String]) -> Result<Vec<String>, SelectError> {
        if self.start == 0 || self.start > row.len() {
            return Err(SelectError::OutOfRange {
                index: self.start,
                len: row.len(),
            });
        }
        Ok(vec![row[self.start - 1].clone()])
    }

    fn select_interval(&self, row: &[String]) -> Result<Vec<String>, SelectError> {
        let len = row.len() as i64;
        let (mut start, mut end) = match (self.start, self.end) {
            (0, 0) => (0, len - 1),
            (0, e) => (0, e as i64 - 1),
            (s, 0) => (s as i64 - 1, len - 1),
            (s, e) => (s as i64 - 1, e as i64 - 1),
        };
        let reversed = start > end;
        if reversed {
            std::mem::swap(&mut start, &mut end);
        }
        if end >= len {
            return Err(SelectError::OutOfRange {
                index: end as usize + 1,
                len: row.len(),
            });
        }
        if start > end {
            // Only possible on an empty row with open bounds.
            return Ok(Vec::new());
        }
        let mut fields: Vec<String> = row[start as usize..=end as usize].to_vec();
        if reversed {
            fields.reverse();
        }
        Ok(fields)
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.interval {
            return write!(f, "{}", self.start);
        }
        if self.start > 0 {
            write!(f, "{}", self.start)?;
        }
        f.write_str(":")?;
        if self.end > 0 {
            write!(f, "{}", self.end)?;
        }
        Ok(())
    }
}

/// Parse a selection list. Whitespace is allowed only directly behind a
/// comma; an empty input is a valid, empty selection.
pub fn parse(input: &str) -> Result<Vec<Selection>, SelectError> {
    if input.is_empty() {
        return Ok(Vec::new());
    }
    fn close_atom(
        selections: &mut Vec<Selection>,
        digits: &mut String,
        interval: &mut bool,
    ) -> Result<(), SelectError> {
        let bound = if digits.is_empty() {
            0
        } else {
            digits
                .parse::<usize>()
                .map_err(|_| SelectError::Syntax(format!("bad index '{}'", digits)))?
        };
        digits.clear();
        if *interval {
            match selections.last_mut() {
                Some(last) => last.end = bound,
                None => return Err(SelectError::Syntax("dangling ':'".to_string())),
            }
            *interval = false;
        } else {
            if bound == 0 {
                return Err(SelectError::Syntax("empty atom".to_string()));
            }
            selections.push(Selection::single(bound));
        }
        Ok(())
    }

    let mut selections = Vec::new();
    let mut digits = String::new();
    let mut interval = false;
    let mut prev: Option<char> = None;

    for ch in input.chars() {
        match ch {
            '0'..='9' => digits.push(ch),
            ',' => close_atom(&mut selections, &mut digits, &mut interval)?,
            ':' => {
                if interval {
                    return Err(SelectError::Syntax("chained ':'".to_string()));
                }
                let start = if digits.is_empty() {
                    0
                } else {
                    digits
                        .parse::<usize>()
                        .map_err(|_| SelectError::Syntax(format!("bad index '{}'", digits)))?
                };
                digits.clear();
                selections.push(Selection::interval(start, 0));
                interval = true;
            }
            c if c.is_whitespace() => {
                if prev != Some(',') {
                    return Err(SelectError::Syntax(
                        "whitespace is only allowed after a comma".to_string(),
                    ));
                }
            }
            c => return Err(SelectError::Syntax(format!("unexpected character '{}'", c))),
        }
        prev = Some(ch);
    }
    close_atom(&mut selections, &mut digits, &mut interval)?;
    Ok(selections)
}

/// Apply a whole selection list to a row. An empty list passes the row
/// through unchanged.
pub fn select_all(selections: &[Selection], row: &[String]) -> Result<Vec<String>, SelectError> {
    if selections.is_empty() {
        return Ok(row.to_vec());
    }
    let mut fields = Vec::with_capacity(selections.len());
    for selection in selections {
        fields.extend(selection.select(row)?);
    }
    Ok(fields)
}
