//! Core data models used throughout Pagemill.
//!
//! These types represent the scanned files, databases, pages, and manifest
//! entries that flow through the resolution pipeline and out to the static
//! JSON contract consumed by the viewer.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// How the scanner classified a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    /// Full-dump CSV (`<Title> <uid>_all.csv`) — the row data source.
    TableFull,
    /// View CSV — used only for column ordering.
    TableView,
    /// Markdown page.
    Document,
    /// Binary attachment (image, office document, archive, media).
    Asset,
}

/// One filesystem entry of interest, produced by the scanner.
#[derive(Debug, Clone)]
pub struct ScannedFile {
    pub path: PathBuf,
    /// Path relative to the export root, `/`-separated.
    pub relative_path: String,
    pub name: String,
    /// 32-char hex identifier embedded in the filename, if present.
    pub uid: Option<String>,
    pub kind: FileKind,
    /// Ancestor directory names relative to the export root, shallowest first.
    pub dir_parts: Vec<String>,
}

/// Semantic type assigned to a column by inference (or by a user override).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    Title,
    Text,
    Date,
    DateRange,
    MultiSelect,
    Url,
    Person,
    Status,
    Select,
}

impl ColumnType {
    /// All valid types, in the order they appear in `metadata.json`.
    pub const ALL: [ColumnType; 9] = [
        ColumnType::Title,
        ColumnType::Text,
        ColumnType::Date,
        ColumnType::DateRange,
        ColumnType::MultiSelect,
        ColumnType::Url,
        ColumnType::Person,
        ColumnType::Status,
        ColumnType::Select,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnType::Title => "title",
            ColumnType::Text => "text",
            ColumnType::Date => "date",
            ColumnType::DateRange => "date_range",
            ColumnType::MultiSelect => "multi_select",
            ColumnType::Url => "url",
            ColumnType::Person => "person",
            ColumnType::Status => "status",
            ColumnType::Select => "select",
        }
    }

    pub fn parse(s: &str) -> Option<ColumnType> {
        ColumnType::ALL.iter().copied().find(|t| t.as_str() == s)
    }

    /// Whether this type carries a sorted option list.
    pub fn has_options(&self) -> bool {
        matches!(
            self,
            ColumnType::Select | ColumnType::MultiSelect | ColumnType::Status | ColumnType::Person
        )
    }
}

/// Schema for a single database column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnSchema {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    /// Distinct values seen, sorted. Only for select/multi_select/status/person.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
}

/// One database row: raw string values plus the page it resolved to, if any.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseRecord {
    /// Set when the row's title matched a page; `null` is a valid terminal state.
    pub uid: Option<String>,
    /// Column name → raw string value.
    pub values: BTreeMap<String, String>,
}

/// A resolved table: paired CSV dump + view file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Database {
    pub uid: String,
    pub title: String,
    /// Column schemas in view order.
    pub columns: Vec<ColumnSchema>,
    pub rows: Vec<DatabaseRecord>,
    /// Parent page when this database is nested inside a page's folder.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_page_uid: Option<String>,
}

/// A resolved markdown page.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub uid: String,
    pub title: String,
    /// Key-value pairs parsed from the document head.
    pub metadata: BTreeMap<String, String>,
    /// Markdown body after the metadata block.
    pub body: String,
    /// Owning database, when the page lives under a database's folder.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database_uid: Option<String>,
    /// Parent page for standalone pages nested under another page's folder.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_page_uid: Option<String>,
    /// Databases referenced inline in the body.
    pub inline_database_uids: Vec<String>,
    /// Output-relative asset paths (`assets/<uid>/<name>`).
    pub assets: Vec<String>,
}

/// One export's fully resolved databases and pages.
#[derive(Debug, Clone)]
pub struct ExportData {
    pub name: String,
    pub databases: Vec<Database>,
    pub pages: Vec<Page>,
}

/// Lightweight database summary in the manifest.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseSummary {
    pub uid: String,
    pub title: String,
    pub row_count: usize,
    pub column_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_page_uid: Option<String>,
}

/// A page with no owning database, linked to its standalone children.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StandalonePage {
    pub uid: String,
    pub title: String,
    pub child_page_uids: Vec<String>,
}

/// Per-export section of the manifest.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestExport {
    pub name: String,
    pub databases: Vec<DatabaseSummary>,
    pub standalone_pages: Vec<StandalonePage>,
    pub page_count: usize,
}

/// Cross-export summary written to `manifest.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    pub exports: Vec<ManifestExport>,
    /// ISO-8601 generation timestamp.
    pub generated_at: String,
}

/// One entry of `search-index.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchEntry {
    pub uid: String,
    pub title: String,
    pub metadata: BTreeMap<String, String>,
    /// First 300 characters of the body.
    pub body_preview: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database_uid: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_type_wire_names_round_trip() {
        for t in ColumnType::ALL {
            assert_eq!(ColumnType::parse(t.as_str()), Some(t));
            let json = serde_json::to_string(&t).unwrap();
            assert_eq!(json, format!("\"{}\"", t.as_str()));
        }
    }

    #[test]
    fn unset_row_uid_serializes_as_null() {
        let rec = DatabaseRecord {
            uid: None,
            values: BTreeMap::new(),
        };
        let json = serde_json::to_string(&rec).unwrap();
        assert!(json.contains("\"uid\":null"));
    }

    #[test]
    fn absent_parent_page_is_omitted() {
        let db = Database {
            uid: "a".repeat(32),
            title: "Tasks".to_string(),
            columns: vec![],
            rows: vec![],
            parent_page_uid: None,
        };
        let json = serde_json::to_string(&db).unwrap();
        assert!(!json.contains("parentPageUid"));
    }
}
