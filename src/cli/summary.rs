//! Commands that summarize the stream: `group`, `frequency`, `describe`.

use std::io;

use crate::group::GroupTree;
use crate::sniff;

use super::{CliError, Settings};

/// `group <key-selection> [op sel]…`: fold every row into its composite-key
/// group, then emit one row per group in key order.
pub fn group(
    settings: &Settings,
    key_selection: &str,
    operations: &[String],
    reverse: bool,
) -> Result<(), CliError> {
    let mut tree = GroupTree::new(key_selection, operations, reverse)?;
    let mut reader = settings.reader("", &[])?;
    while let Some(row) = reader.next_row()? {
        tree.upsert(&row)?;
    }
    let mut out = settings.writer();
    let mut failure: Option<io::Error> = None;
    tree.traverse(&mut |group| {
        if failure.is_some() {
            return;
        }
        let mut row = group.keys.clone();
        for values in group.results() {
            row.extend(values.iter().map(|v| format!("{}", v)));
        }
        if let Err(err) = out.write_row(&row) {
            failure = Some(err);
        }
    });
    if let Some(err) = failure {
        return Err(err.into());
    }
    Ok(out.flush()?)
}

/// `frequency <key-selection>`: per-key row count with cumulative count and
/// percentage of the total.
pub fn frequency(settings: &Settings, key_selection: &str, reverse: bool) -> Result<(), CliError> {
    let operations = ["count".to_string(), key_selection.to_string()];
    let mut tree = GroupTree::new(key_selection, &operations, reverse)?;
    let mut total = 0u64;
    let mut reader = settings.reader("", &[])?;
    while let Some(row) = reader.next_row()? {
        tree.upsert(&row)?;
        total += 1;
    }
    let mut counted: Vec<(Vec<String>, u64)> = Vec::new();
    tree.traverse(&mut |group| {
        let count = group
            .results()
            .first()
            .and_then(|values| values.first().copied())
            .unwrap_or(0.0) as u64;
        counted.push((group.keys.clone(), count));
    });
    let mut out = settings.writer();
    let mut cumulative = 0u64;
    for (keys, count) in counted {
        cumulative += count;
        let percent = if total == 0 {
            0.0
        } else {
            count as f64 * 100.0 / total as f64
        };
        let mut row = keys;
        row.push(count.to_string());
        row.push(cumulative.to_string());
        row.push(format!("{:.2}", percent));
        out.write_row(&row)?;
    }
    Ok(out.flush()?)
}

/// `describe`: sniff the first row and report one line per field with its
/// index, guessed kind and value.
pub fn describe(settings: &Settings) -> Result<(), CliError> {
    let mut reader = settings.reader("", &[])?;
    let row = reader.next_row()?.ok_or(CliError::Empty)?;
    let mut out = settings.writer();
    for (at, field) in row.iter().enumerate() {
        let kind = sniff::sniff(field);
        out.write_row(&[(at + 1).to_string(), kind.to_string(), field.clone()])?;
    }
    Ok(out.flush()?)
}
