//! Delimited text reader.
//!
//! Handles quoted fields, doubled quotes inside quoted fields, line breaks
//! inside quoted fields, and both `\n` and `\r\n` record separators.

use std::fmt;

/// Parse failure, with the 1-based line the offending record starts on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvError {
    pub line: usize,
    pub message: String,
}

impl fmt::Display for CsvError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.message)
    }
}

impl std::error::Error for CsvError {}

/// Parsed file: optional header row plus data records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Records {
    pub header: Option<Vec<String>>,
    pub rows: Vec<Vec<String>>,
}

/// Split `content` into records.
///
/// When `has_header` is set the first record becomes [`Records::header`].
/// Lines with no characters at all are skipped; a line holding only `""` is
/// a record with one empty cell.
pub fn parse(content: &str, delimiter: char, has_header: bool) -> Result<Records, CsvError> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);

    let mut records: Vec<Vec<String>> = Vec::new();
    let mut record: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    // Whether the current record has any content, quotes or delimiters.
    let mut touched = false;
    let mut line = 1;
    let mut record_line = 1;
    let mut chars = content.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            touched = true;
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => in_quotes = false,
                '\n' => {
                    line += 1;
                    field.push(c);
                }
                _ => field.push(c),
            }
            continue;
        }

        match c {
            '"' if field.trim().is_empty() => {
                field.clear();
                in_quotes = true;
                touched = true;
            }
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' => {
                if std::mem::take(&mut touched) {
                    finish_record(&mut records, &mut record, &mut field);
                }
                line += 1;
                record_line = line;
            }
            c if c == delimiter => {
                record.push(std::mem::take(&mut field));
                touched = true;
            }
            _ => {
                field.push(c);
                touched = true;
            }
        }
    }

    if in_quotes {
        return Err(CsvError {
            line: record_line,
            message: "unterminated quoted field".to_string(),
        });
    }
    if touched {
        finish_record(&mut records, &mut record, &mut field);
    }

    let mut rows = records.into_iter();
    let header = if has_header { rows.next() } else { None };
    Ok(Records {
        header,
        rows: rows.collect(),
    })
}

fn finish_record(records: &mut Vec<Vec<String>>, record: &mut Vec<String>, field: &mut String) {
    record.push(std::mem::take(field));
    records.push(std::mem::take(record));
}
