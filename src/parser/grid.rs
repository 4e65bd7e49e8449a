//! Delimited text to rectangular grid of string cells
//!
//! The sheet export encodes multi-class timetable cells as quoted fields with
//! embedded newlines, so cells must survive the scan verbatim. This is a
//! single left-to-right pass with a quote-state flag rather than a streaming
//! CSV reader, which would want to own the record/line framing.

/// Parse comma-delimited text into rows of cells
pub fn parse_csv(text: &str) -> Vec<Vec<String>> {
    parse_delimited(text, ',')
}

/// Parse delimited text into rows of cells
///
/// Rules:
/// - a `"` toggles quote state; `""` inside quotes is a literal quote
/// - the delimiter outside quotes ends the current cell
/// - `\n` outside quotes ends the current row; a preceding `\r` belongs to
///   the terminator, not the cell
/// - rows whose cells are all blank are dropped
/// - the final row is flushed even without a trailing terminator
/// - an unterminated quote leaves the remaining text in the last cell
pub fn parse_delimited(text: &str, delimiter: char) -> Vec<Vec<String>> {
    let mut rows: Vec<Vec<String>> = Vec::new();
    let mut row: Vec<String> = Vec::new();
    let mut cell = String::new();
    let mut in_quotes = false;

    let mut chars = text.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '"' => {
                if in_quotes && chars.peek() == Some(&'"') {
                    // Escaped quote within quoted cell
                    cell.push('"');
                    chars.next();
                } else {
                    in_quotes = !in_quotes;
                }
            }
            c if c == delimiter && !in_quotes => {
                row.push(std::mem::take(&mut cell));
            }
            '\r' if !in_quotes && chars.peek() == Some(&'\n') => {
                // Windows line ending; let the \n terminate the row
            }
            '\n' if !in_quotes => {
                row.push(std::mem::take(&mut cell));
                flush_row(&mut rows, &mut row);
            }
            c => cell.push(c),
        }
    }

    // Flush the last row if the input had no trailing terminator
    if !cell.is_empty() || !row.is_empty() {
        row.push(cell);
        flush_row(&mut rows, &mut row);
    }

    rows
}

/// Emit the row unless every cell is blank
fn flush_row(rows: &mut Vec<Vec<String>>, row: &mut Vec<String>) {
    if row.iter().any(|cell| !cell.trim().is_empty()) {
        rows.push(std::mem::take(row));
    } else {
        row.clear();
    }
}
