//! Commands that rearrange whole streams: `transpose`, `cat`, `sort` and
//! `split`. The first three materialize what they must; `split` stays
//! streaming but fans rows out over per-key files.

use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use crate::evaluator::Evaluator;
use crate::parser;
use crate::select;

use super::{CliError, Settings};

/// `transpose`: materialize every row, emit column-major.
pub fn transpose(settings: &Settings) -> Result<(), CliError> {
    let mut reader = settings.reader("", &[])?;
    let mut rows = Vec::new();
    while let Some(row) = reader.next_row()? {
        rows.push(row);
    }
    let mut out = settings.writer();
    for row in transpose_rows(&rows) {
        out.write_row(&row)?;
    }
    Ok(out.flush()?)
}

/// Column-major view of uniform-width rows.
pub fn transpose_rows(rows: &[Vec<String>]) -> Vec<Vec<String>> {
    let columns = rows.first().map_or(0, Vec::len);
    (0..columns)
        .map(|column| rows.iter().map(|row| row[column].clone()).collect())
        .collect()
}

/// `cat <file>…`: with `--append`, concatenate row streams; otherwise zip
/// the files' rows side by side, stopping at the shortest input.
pub fn cat(settings: &Settings, files: &[String], append: bool) -> Result<(), CliError> {
    let fallback = [settings.file.clone()];
    let files: &[String] = if files.is_empty() { &fallback } else { files };
    let mut out = settings.writer();

    if append {
        for file in files {
            let mut reader = settings.reader_for(file, "", &[])?;
            while let Some(row) = reader.next_row()? {
                out.write_row(&row)?;
            }
        }
        return Ok(out.flush()?);
    }

    let mut readers = files
        .iter()
        .map(|file| settings.reader_for(file, "", &[]))
        .collect::<Result<Vec<_>, _>>()?;
    'zip: loop {
        let mut combined = Vec::new();
        for reader in &mut readers {
            match reader.next_row()? {
                Some(row) => combined.extend(row),
                None => break 'zip,
            }
        }
        out.write_row(&combined)?;
    }
    Ok(out.flush()?)
}

/// `sort <selection>`: stable sort of the whole stream by composite key.
pub fn sort(settings: &Settings, selection: &str) -> Result<(), CliError> {
    let selections = select::parse(selection)?;
    let mut reader = settings.reader("", &[])?;
    let mut keyed = Vec::new();
    while let Some(row) = reader.next_row()? {
        let keys = select::select_all(&selections, &row)?;
        keyed.push((keys, row));
    }
    keyed.sort_by(|a, b| a.0.cmp(&b.0));
    let mut out = settings.writer();
    for (_, row) in keyed {
        out.write_row(&row)?;
    }
    Ok(out.flush()?)
}

/// `split <key-selection> <expression>`: route rows matching the expression
/// into one file per composite key.
///
/// Files live under `datadir` (created if missing), named
/// `[prefix-]key1_key2….csv` lowercased, opened lazily on the first row of
/// their key and kept open until the command exits.
pub fn split(
    settings: &Settings,
    key_selection: &str,
    expression: &str,
    datadir: &str,
    prefix: &str,
    append: bool,
) -> Result<(), CliError> {
    let selections = select::parse(key_selection)?;
    let matcher = if expression.is_empty() {
        None
    } else {
        Some(parser::parse_expression(expression)?)
    };
    fs::create_dir_all(datadir)?;

    let mut evaluator = Evaluator::new();
    let mut reader = settings.reader("", &[])?;
    let mut sinks: HashMap<PathBuf, csv::Writer<fs::File>> = HashMap::new();

    loop {
        let row = match &matcher {
            Some(expr) => reader.filter_row(expr, &mut evaluator)?,
            None => reader.next_row()?,
        };
        let row = match row {
            Some(row) => row,
            None => break,
        };
        let keys = select::select_all(&selections, &row)?;
        if keys.is_empty() {
            continue;
        }
        let path = split_path(datadir, prefix, &keys);
        if !sinks.contains_key(&path) {
            let file = open_split_file(&path, append)?;
            sinks.insert(path.clone(), csv::Writer::from_writer(file));
        }
        if let Some(writer) = sinks.get_mut(&path) {
            writer
                .write_record(&row)
                .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        }
    }
    for writer in sinks.values_mut() {
        writer.flush()?;
    }
    Ok(())
}

fn split_path(datadir: &str, prefix: &str, keys: &[String]) -> PathBuf {
    let mut name = String::new();
    if !prefix.is_empty() {
        name.push_str(prefix);
        name.push('-');
    }
    name.push_str(&keys.join("_"));
    name.push_str(".csv");
    Path::new(datadir).join(name.to_lowercase())
}

fn open_split_file(path: &Path, append: bool) -> io::Result<fs::File> {
    let mut options = OpenOptions::new();
    options.create(true).write(true);
    if append {
        options.append(true);
    } else {
        options.truncate(true);
    }
    options.open(path)
}
