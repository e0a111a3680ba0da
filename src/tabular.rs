//! CSV parsing for exported tables.
//!
//! Exports pair a `_all.csv` full dump (row data) with a view CSV (column
//! order). Both go through this parser: standard quoted-field semantics,
//! leading BOM stripped, blank lines skipped, headers trimmed. Every value
//! stays a string; typing happens later in [`crate::schema`].

use std::collections::BTreeMap;

/// Parsed table: trimmed header names plus header-keyed string records.
#[derive(Debug, Clone)]
pub struct CsvTable {
    pub headers: Vec<String>,
    pub rows: Vec<BTreeMap<String, String>>,
}

/// Parse failure. The pipeline skips the file's contribution and continues;
/// there is no recovery within a file.
#[derive(Debug)]
pub enum CsvError {
    /// Input ended inside a quoted field.
    UnclosedQuote { record: usize },
    /// A quote appeared where only field content or a separator is valid.
    StrayQuote { record: usize },
}

impl std::fmt::Display for CsvError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CsvError::UnclosedQuote { record } => {
                write!(f, "unclosed quote in record {}", record)
            }
            CsvError::StrayQuote { record } => {
                write!(f, "stray quote in record {}", record)
            }
        }
    }
}

impl std::error::Error for CsvError {}

#[derive(Clone, Copy, PartialEq)]
enum State {
    FieldStart,
    Unquoted,
    Quoted,
    /// Just closed a quoted field; only a separator or newline may follow.
    QuoteEnd,
}

/// Parses CSV text into headers and header-keyed records.
///
/// Records shorter than the header get empty strings for the missing
/// columns; extra trailing fields are dropped.
pub fn parse_csv(content: &str) -> Result<CsvTable, CsvError> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let records = parse_records(content)?;

    let mut iter = records.into_iter();
    let headers: Vec<String> = match iter.next() {
        Some(header_record) => header_record.iter().map(|h| h.trim().to_string()).collect(),
        None => Vec::new(),
    };

    let rows = iter
        .map(|record| {
            headers
                .iter()
                .enumerate()
                .map(|(i, h)| (h.clone(), record.get(i).cloned().unwrap_or_default()))
                .collect()
        })
        .collect();

    Ok(CsvTable { headers, rows })
}

fn parse_records(input: &str) -> Result<Vec<Vec<String>>, CsvError> {
    let mut records: Vec<Vec<String>> = Vec::new();
    let mut record: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut state = State::FieldStart;

    let mut chars = input.chars().peekable();
    while let Some(c) = chars.next() {
        match state {
            State::FieldStart => match c {
                '"' => state = State::Quoted,
                ',' => record.push(std::mem::take(&mut field)),
                '\n' | '\r' => {
                    if c == '\r' {
                        chars.next_if_eq(&'\n');
                    }
                    end_record(&mut records, &mut record, &mut field);
                }
                _ => {
                    field.push(c);
                    state = State::Unquoted;
                }
            },
            State::Unquoted => match c {
                ',' => {
                    record.push(std::mem::take(&mut field));
                    state = State::FieldStart;
                }
                '\n' | '\r' => {
                    if c == '\r' {
                        chars.next_if_eq(&'\n');
                    }
                    end_record(&mut records, &mut record, &mut field);
                    state = State::FieldStart;
                }
                '"' => {
                    return Err(CsvError::StrayQuote {
                        record: records.len() + 1,
                    })
                }
                _ => field.push(c),
            },
            State::Quoted => match c {
                '"' => {
                    if chars.next_if_eq(&'"').is_some() {
                        field.push('"');
                    } else {
                        state = State::QuoteEnd;
                    }
                }
                _ => field.push(c),
            },
            State::QuoteEnd => match c {
                ',' => {
                    record.push(std::mem::take(&mut field));
                    state = State::FieldStart;
                }
                '\n' | '\r' => {
                    if c == '\r' {
                        chars.next_if_eq(&'\n');
                    }
                    end_record(&mut records, &mut record, &mut field);
                    state = State::FieldStart;
                }
                _ => {
                    return Err(CsvError::StrayQuote {
                        record: records.len() + 1,
                    })
                }
            },
        }
    }

    if state == State::Quoted {
        return Err(CsvError::UnclosedQuote {
            record: records.len() + 1,
        });
    }
    if !field.is_empty() || !record.is_empty() || state == State::QuoteEnd {
        end_record(&mut records, &mut record, &mut field);
    }

    Ok(records)
}

fn end_record(records: &mut Vec<Vec<String>>, record: &mut Vec<String>, field: &mut String) {
    record.push(std::mem::take(field));
    // A lone empty field is a blank line; skip it.
    if !(record.len() == 1 && record[0].is_empty()) {
        records.push(std::mem::take(record));
    } else {
        record.clear();
    }
}
