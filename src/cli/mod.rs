//! Command implementations behind the binary's flag surface.
//!
//! Everything here is thin plumbing: open the input, build the pipeline out
//! of library pieces, loop, write. Errors from every stage funnel into
//! [`CliError`] so the binary maps any failure to a single exit code.

pub mod reshape;
pub mod stream;
pub mod summary;

use std::fmt;
use std::fs::File;
use std::io;

use crate::evaluator::EvalError;
use crate::group::GroupError;
use crate::output::RecordWriter;
use crate::parser::ParseError;
use crate::reader::{Reader, ReaderOptions, ReadError};
use crate::select::SelectError;

/// Errors that can occur while running a command.
#[derive(Debug)]
pub enum CliError {
    /// Expression parse error
    Parse(ParseError),
    /// Expression evaluation error
    Eval(EvalError),
    /// Record pipeline error
    Read(ReadError),
    /// Selection error outside the reader (sort keys, split keys)
    Select(SelectError),
    /// Grouping error
    Group(GroupError),
    /// File-system or stream error
    Io(io::Error),
    /// Input where a non-empty stream was required
    Empty,
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Parse(e) => write!(f, "parse error: {}", e),
            CliError::Eval(e) => write!(f, "evaluation error: {}", e),
            CliError::Read(e) => write!(f, "{}", e),
            CliError::Select(e) => write!(f, "{}", e),
            CliError::Group(e) => write!(f, "{}", e),
            CliError::Io(e) => write!(f, "{}", e),
            CliError::Empty => write!(f, "empty input"),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Parse(e) => Some(e),
            CliError::Eval(e) => Some(e),
            CliError::Read(e) => Some(e),
            CliError::Select(e) => Some(e),
            CliError::Group(e) => Some(e),
            CliError::Io(e) => Some(e),
            CliError::Empty => None,
        }
    }
}

impl From<ParseError> for CliError {
    fn from(e: ParseError) -> Self {
        CliError::Parse(e)
    }
}

impl From<EvalError> for CliError {
    fn from(e: EvalError) -> Self {
        CliError::Eval(e)
    }
}

impl From<ReadError> for CliError {
    fn from(e: ReadError) -> Self {
        CliError::Read(e)
    }
}

impl From<SelectError> for CliError {
    fn from(e: SelectError) -> Self {
        CliError::Select(e)
    }
}

impl From<GroupError> for CliError {
    fn from(e: GroupError) -> Self {
        CliError::Group(e)
    }
}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        CliError::Io(e)
    }
}

/// The flags every command shares.
#[derive(Debug, Clone)]
pub struct Settings {
    pub file: String,
    pub separator: char,
    pub table: bool,
    pub width: usize,
    pub tag: Option<String>,
}

impl Settings {
    fn options(&self, selection: &str, formatters: &[String]) -> ReaderOptions {
        ReaderOptions {
            separator: self.separator,
            selection: selection.to_string(),
            formatters: formatters.to_vec(),
        }
    }

    /// Open the configured input (`-` means stdin) with the given pipeline.
    pub fn reader(
        &self,
        selection: &str,
        formatters: &[String],
    ) -> Result<Reader<Box<dyn io::Read>>, CliError> {
        self.reader_for(&self.file, selection, formatters)
    }

    /// Open a specific file with the shared separator; used by `cat`.
    pub fn reader_for(
        &self,
        file: &str,
        selection: &str,
        formatters: &[String],
    ) -> Result<Reader<Box<dyn io::Read>>, CliError> {
        let input: Box<dyn io::Read> = if file.is_empty() || file == "-" {
            Box::new(io::stdin())
        } else {
            Box::new(File::open(file)?)
        };
        Ok(Reader::from_reader(input, &self.options(selection, formatters))?)
    }

    pub fn writer(&self) -> RecordWriter<io::Stdout> {
        RecordWriter::new(io::stdout(), self.table, self.width, self.tag.clone())
    }

    /// Like [`writer`](Settings::writer) but always in table layout; used
    /// by `show`.
    pub fn table_writer(&self) -> RecordWriter<io::Stdout> {
        RecordWriter::new(io::stdout(), true, self.width, self.tag.clone())
    }
}
