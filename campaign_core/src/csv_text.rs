// Primitives for reading and writing comma separated text.

use log::debug;
use snafu::ensure;

use crate::error::*;

/// A rectangular table of cells. The first row is the header.
pub type Rows = Vec<Vec<String>>;

/// Parses the full text of a CSV file.
///
/// A leading byte order mark is skipped. Lines are split on `\n` or `\r\n` and lines that are blank after trimming are dropped, so
/// trailing empty lines never produce rows. Quoted fields may contain commas and doubled quotes,
/// but not line breaks. Short rows are padded with empty cells to the width of the widest row.
pub fn parse(raw_text: &str) -> CoreResult<Rows> {
    // Spreadsheet programs often start the file with a byte order mark.
    let text = raw_text.strip_prefix('\u{feff}').unwrap_or(raw_text);
    let mut rows: Rows = text
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .filter(|line| !line.trim().is_empty())
        .map(tokenize_line)
        .collect();
    ensure!(!rows.is_empty(), EmptyFileSnafu {});

    let width = rows.iter().map(|r| r.len()).max().unwrap_or(0);
    for row in rows.iter_mut() {
        row.resize(width, String::new());
    }
    debug!("parse: {} rows, {} columns", rows.len(), width);
    Ok(rows)
}

/// Splits one line into cells.
///
/// A double quote toggles the "inside quotes" state. While inside quotes, a comma is part of
/// the cell and two consecutive quotes stand for one literal quote.
pub fn tokenize_line(line: &str) -> Vec<String> {
    let mut cells: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                chars.next();
                current.push('"');
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => cells.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    cells.push(current);
    cells
}

/// Writes rows as CSV text, quoting only the cells that need it.
///
/// Rows are separated by `\n` and the text has no trailing line break.
pub fn write_rows<I, R, S>(rows: I) -> CoreResult<String>
where
    I: IntoIterator<Item = R>,
    R: IntoIterator<Item = S>,
    S: AsRef<[u8]>,
{
    let mut wtr = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Necessary)
        .terminator(csv::Terminator::Any(b'\n'))
        .flexible(true)
        .from_writer(vec![]);
    for row in rows {
        wtr.write_record(row).map_err(encoding_error)?;
    }
    let bytes = wtr
        .into_inner()
        .map_err(|e| encoding_error(csv::Error::from(e.into_error())))?;
    let mut text = String::from_utf8(bytes).map_err(|e| CoreError::Encoding {
        what: "CSV text".to_string(),
        message: e.to_string(),
    })?;
    if text.ends_with('\n') {
        text.pop();
    }
    Ok(text)
}

/// One row of CSV, without line break.
pub fn join_row<S: AsRef<[u8]>>(cells: &[S]) -> CoreResult<String> {
    write_rows(std::iter::once(cells))
}

fn encoding_error(e: csv::Error) -> CoreError {
    CoreError::Encoding {
        what: "CSV text".to_string(),
        message: e.to_string(),
    }
}
