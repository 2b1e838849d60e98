//! The streaming record pipeline: decode a delimited row, run the
//! formatters in registration order, project the selection, yield.
//!
//! The reader is a pull-based iterator with three states. Errors are
//! sticky: after the first failure every subsequent call reports the same
//! error, and after end-of-input every call reports end-of-input.
//!
//! ```text
//! Ready ──read──▶ (Ready | AtEnd | Failed)
//! Failed ──any──▶ Failed
//! AtEnd  ──any──▶ AtEnd
//! ```

use std::fmt;
use std::fs::File;
use std::io;
use std::path::Path;

use crate::ast::Expr;
use crate::evaluator::{EvalError, Evaluator};
use crate::format::{self, FormatError, Formatter};
use crate::select::{self, SelectError, Selection};

/// Errors surfaced by the record pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum ReadError {
    /// Separator outside the accepted class (punctuation, space, tab)
    InvalidSeparator(char),
    /// Selection syntax or application failure
    Select(SelectError),
    /// Formatter configuration or value failure
    Format(FormatError),
    /// Filter expression failure
    Filter(EvalError),
    /// Formatter column beyond the decoded row
    Range { index: usize, len: usize },
    /// Malformed delimited input (unequal field counts included)
    Parse(String),
    /// Underlying stream failure
    Io(String),
}

impl fmt::Display for ReadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReadError::InvalidSeparator(c) => write!(f, "invalid separator '{}'", c),
            ReadError::Select(e) => write!(f, "{}", e),
            ReadError::Format(e) => write!(f, "{}", e),
            ReadError::Filter(e) => write!(f, "{}", e),
            ReadError::Range { index, len } => {
                write!(f, "column {} out of range for row of {} fields", index + 1, len)
            }
            ReadError::Parse(msg) => write!(f, "malformed input: {}", msg),
            ReadError::Io(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for ReadError {}

impl From<SelectError> for ReadError {
    fn from(e: SelectError) -> Self {
        ReadError::Select(e)
    }
}

impl From<FormatError> for ReadError {
    fn from(e: FormatError) -> Self {
        ReadError::Format(e)
    }
}

/// Flat reader configuration. Every option has a working default; anything
/// unrecognized fails when the reader is built, not at row time.
#[derive(Debug, Clone)]
pub struct ReaderOptions {
    pub separator: char,
    pub selection: String,
    pub formatters: Vec<String>,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        ReaderOptions {
            separator: ',',
            selection: String::new(),
            formatters: Vec::new(),
        }
    }
}

enum Status {
    Ready,
    AtEnd,
    Failed(ReadError),
}

pub struct Reader<R: io::Read> {
    inner: csv::Reader<R>,
    selections: Vec<Selection>,
    formatters: Vec<Formatter>,
    record: csv::StringRecord,
    status: Status,
}

impl Reader<File> {
    pub fn open<P: AsRef<Path>>(path: P, options: &ReaderOptions) -> Result<Self, ReadError> {
        let file = File::open(path).map_err(|e| ReadError::Io(e.to_string()))?;
        Reader::from_reader(file, options)
    }
}

impl<R: io::Read> Reader<R> {
    pub fn from_reader(reader: R, options: &ReaderOptions) -> Result<Self, ReadError> {
        let sep = options.separator;
        if !(sep.is_ascii_punctuation() || sep == ' ' || sep == '\t') {
            return Err(ReadError::InvalidSeparator(sep));
        }
        let selections = select::parse(&options.selection)?;
        let formatters = format::parse_specs(&options.formatters)?;
        let inner = csv::ReaderBuilder::new()
            .delimiter(sep as u8)
            .has_headers(false)
            .flexible(false)
            .from_reader(reader);
        Ok(Reader {
            inner,
            selections,
            formatters,
            record: csv::StringRecord::new(),
            status: Status::Ready,
        })
    }

    /// Pull the next record: `Ok(Some(row))`, `Ok(None)` at end-of-input,
    /// or the (sticky) error that stopped the stream.
    pub fn next_row(&mut self) -> Result<Option<Vec<String>>, ReadError> {
        match &self.status {
            Status::Failed(err) => return Err(err.clone()),
            Status::AtEnd => return Ok(None),
            Status::Ready => {}
        }
        let more = match self.inner.read_record(&mut self.record) {
            Ok(more) => more,
            Err(err) => return Err(self.fail(classify(err))),
        };
        if !more {
            self.status = Status::AtEnd;
            return Ok(None);
        }
        let mut row: Vec<String> = self
            .record
            .iter()
            .map(|field| field.trim_start().to_string())
            .collect();
        for at in 0..self.formatters.len() {
            let index = self.formatters[at].index;
            if index >= row.len() {
                let err = ReadError::Range {
                    index,
                    len: row.len(),
                };
                return Err(self.fail(err));
            }
            match self.formatters[at].apply(&row[index]) {
                Ok(value) => row[index] = value,
                Err(err) => return Err(self.fail(err.into())),
            }
        }
        if !self.selections.is_empty() {
            match select::select_all(&self.selections, &row) {
                Ok(projected) => row = projected,
                Err(err) => return Err(self.fail(err.into())),
            }
        }
        Ok(Some(row))
    }

    /// Pull rows until one satisfies the filter expression. A thin adapter
    /// around [`next_row`](Reader::next_row).
    pub fn filter_row(
        &mut self,
        expr: &Expr,
        evaluator: &mut Evaluator,
    ) -> Result<Option<Vec<String>>, ReadError> {
        loop {
            let row = match self.next_row()? {
                Some(row) => row,
                None => return Ok(None),
            };
            match evaluator.is_match(expr, &row) {
                Ok(true) => return Ok(Some(row)),
                Ok(false) => continue,
                Err(err) => return Err(self.fail(ReadError::Filter(err))),
            }
        }
    }

    fn fail(&mut self, err: ReadError) -> ReadError {
        self.status = Status::Failed(err.clone());
        err
    }
}

fn classify(err: csv::Error) -> ReadError {
    match err.kind() {
        csv::ErrorKind::Io(_) => ReadError::Io(err.to_string()),
        _ => ReadError::Parse(err.to_string()),
    }
}
