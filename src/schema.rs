//! Column type inference.
//!
//! Assigns one semantic type per column from raw string values plus column
//! name hints. The heuristic is deliberately approximate; wrong guesses are
//! correctable through the metadata side-channel ([`crate::metadata`]), so
//! the thresholds below are pinned behavior, not tunables.

use crate::models::{ColumnSchema, ColumnType, DatabaseRecord};
use crate::uid::normalize_title;
use regex::Regex;
use std::collections::{BTreeSet, HashSet};
use std::sync::LazyLock;

// "January 31, 2024" or "Sep 8, 2024"
static DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z][a-z]+ \d{1,2}, \d{4}$").unwrap());

/// Range separator: "Sep 8, 2024 → Sep 12, 2024".
const RANGE_SEPARATOR: char = '→';

const TITLE_HINTS: [&str; 2] = ["name", "task name"];
const PERSON_HINTS: [&str; 6] = ["attendees", "assignee", "owner", "person", "people", "assigned"];

const TITLE_MATCH_RATIO: f64 = 0.3;
const DATE_RANGE_RATIO: f64 = 0.3;
const DATE_RATIO: f64 = 0.5;
const URL_RATIO: f64 = 0.3;
const MULTI_SELECT_RATIO: f64 = 0.1;
const STATUS_MAX_DISTINCT: usize = 10;
const SELECT_MAX_DISTINCT: usize = 15;
const SELECT_DISTINCT_RATIO: f64 = 0.3;

/// Infers a schema for every column, in header order.
///
/// `known_titles` are the titles of pages already known to belong to this
/// database; they feed the title-column detection and may be empty.
pub fn infer_column_types(
    headers: &[String],
    rows: &[DatabaseRecord],
    known_titles: &[String],
) -> Vec<ColumnSchema> {
    let normalized_titles: HashSet<String> =
        known_titles.iter().map(|t| normalize_title(t)).collect();

    headers
        .iter()
        .enumerate()
        .map(|(index, name)| {
            let values: Vec<&str> = rows
                .iter()
                .map(|r| r.values.get(name).map(String::as_str).unwrap_or("").trim())
                .filter(|v| !v.is_empty())
                .collect();

            // A column with no values carries no signal.
            if values.is_empty() {
                return ColumnSchema {
                    name: name.clone(),
                    column_type: ColumnType::Text,
                    options: None,
                };
            }

            let column_type = infer_single_column(name, index, &values, &normalized_titles);
            let options = if column_type.has_options() {
                Some(options_from_values(&values, column_type))
            } else {
                None
            };

            ColumnSchema {
                name: name.clone(),
                column_type,
                options,
            }
        })
        .collect()
}

/// First match wins; the order here is load-bearing.
fn infer_single_column(
    name: &str,
    index: usize,
    values: &[&str],
    normalized_titles: &HashSet<String>,
) -> ColumnType {
    let lower_name = name.to_lowercase();
    let total = values.len() as f64;

    // Title: only the first column qualifies, by name hint or because the
    // values line up with known page titles.
    if index == 0 {
        if TITLE_HINTS.contains(&lower_name.as_str()) {
            return ColumnType::Title;
        }
        if !normalized_titles.is_empty() {
            let hits = values
                .iter()
                .filter(|v| normalized_titles.contains(&normalize_title(v)))
                .count();
            if hits as f64 > total * TITLE_MATCH_RATIO {
                return ColumnType::Title;
            }
        }
    }

    let range_count = values.iter().filter(|v| v.contains(RANGE_SEPARATOR)).count();
    if range_count as f64 > total * DATE_RANGE_RATIO {
        return ColumnType::DateRange;
    }

    let date_count = values.iter().filter(|v| DATE_RE.is_match(v)).count();
    if date_count as f64 > total * DATE_RATIO {
        return ColumnType::Date;
    }

    let url_count = values
        .iter()
        .filter(|v| v.starts_with("http://") || v.starts_with("https://"))
        .count();
    if url_count as f64 > total * URL_RATIO {
        return ColumnType::Url;
    }

    if PERSON_HINTS.iter().any(|h| lower_name.contains(h)) {
        return ColumnType::Person;
    }

    if lower_name.contains("status") {
        let distinct: HashSet<&&str> = values.iter().collect();
        if distinct.len() <= STATUS_MAX_DISTINCT {
            return ColumnType::Status;
        }
    }

    let comma_count = values.iter().filter(|v| v.contains(',')).count();
    if comma_count as f64 > total * MULTI_SELECT_RATIO {
        return ColumnType::MultiSelect;
    }

    if lower_name != "name" {
        let distinct: HashSet<&&str> = values.iter().collect();
        if distinct.len() <= SELECT_MAX_DISTINCT && (distinct.len() as f64) < total * SELECT_DISTINCT_RATIO
        {
            return ColumnType::Select;
        }
    }

    ColumnType::Text
}

/// Recomputes a column's option list from row data. Used when a metadata
/// override turns a column categorical after inference already ran.
pub fn compute_options(
    rows: &[DatabaseRecord],
    column: &str,
    column_type: ColumnType,
) -> Vec<String> {
    let values: Vec<&str> = rows
        .iter()
        .map(|r| r.values.get(column).map(String::as_str).unwrap_or("").trim())
        .filter(|v| !v.is_empty())
        .collect();
    options_from_values(&values, column_type)
}

fn options_from_values(values: &[&str], column_type: ColumnType) -> Vec<String> {
    let mut set = BTreeSet::new();
    for v in values {
        if matches!(column_type, ColumnType::MultiSelect | ColumnType::Person) {
            // Multi-valued cell: each comma-separated token is one option.
            for token in v.split(',') {
                let token = token.trim();
                if !token.is_empty() {
                    set.insert(token.to_string());
                }
            }
        } else {
            set.insert((*v).to_string());
        }
    }
    set.into_iter().collect()
}
