//! Schema metadata persistence and type-override merge.
//!
//! Each export may carry a `metadata.json` recording, per database column,
//! the inferred type and a possibly user-edited type. On every run the
//! user's override (when `type` differs from `_inferred`) is applied to the
//! in-memory schema, then the file is rewritten with this run's fresh
//! inference recorded alongside whichever type is authoritative. Overrides
//! survive re-runs; they are lost only when the user edits the field again.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

use crate::models::{ColumnType, Database};
use crate::schema::compute_options;

pub const METADATA_FILENAME: &str = "metadata.json";

const DESCRIPTION: &str = "Schema metadata. Edit 'type' to override an inferred column type, \
then re-run the build to apply.";

/// Per-column record: the authoritative type plus what inference produced.
/// Types are kept as raw strings so one bad value does not invalidate the
/// whole file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnMetadata {
    #[serde(rename = "type")]
    pub column_type: String,
    #[serde(rename = "_inferred")]
    pub inferred: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseMetadata {
    pub title: String,
    pub columns: BTreeMap<String, ColumnMetadata>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetadataFile {
    #[serde(rename = "_description")]
    pub description: String,
    #[serde(rename = "_validTypes")]
    pub valid_types: Vec<String>,
    pub databases: BTreeMap<String, DatabaseMetadata>,
}

impl ColumnMetadata {
    /// A user override is a valid `type` that differs from `_inferred`.
    fn override_type(&self) -> Option<ColumnType> {
        if self.column_type == self.inferred {
            return None;
        }
        ColumnType::parse(&self.column_type)
    }
}

/// Reads an export's `metadata.json`. A missing file is `None`; an
/// unparseable one is warned about and treated as absent.
pub fn read_metadata(export_path: &Path) -> Option<MetadataFile> {
    let path = export_path.join(METADATA_FILENAME);
    let content = fs::read_to_string(&path).ok()?;
    match serde_json::from_str(&content) {
        Ok(meta) => Some(meta),
        Err(e) => {
            eprintln!(
                "warning: could not parse {}, ignoring existing metadata: {}",
                path.display(),
                e
            );
            None
        }
    }
}

/// Applies user type overrides to the in-memory schemas. When a column
/// becomes (or stops being) categorical, its option list is recomputed
/// from row data (or removed).
pub fn apply_overrides(databases: &mut [Database], existing: Option<&MetadataFile>) {
    let Some(existing) = existing else {
        return;
    };

    for db in databases {
        let Some(db_meta) = existing.databases.get(&db.uid) else {
            continue;
        };
        let rows = db.rows.clone();
        for col in &mut db.columns {
            let Some(col_meta) = db_meta.columns.get(&col.name) else {
                continue;
            };
            let Some(new_type) = col_meta.override_type() else {
                continue;
            };

            let old_type = col.column_type;
            if new_type == old_type {
                continue;
            }
            col.column_type = new_type;

            if new_type.has_options() && !old_type.has_options() {
                col.options = Some(compute_options(&rows, &col.name, new_type));
            } else if !new_type.has_options() && old_type.has_options() {
                col.options = None;
            }

            println!(
                "  override: {} / \"{}\": {} -> {}",
                db.title,
                col.name,
                old_type.as_str(),
                new_type.as_str()
            );
        }
    }
}

/// Merges this run's freshly inferred types with any prior overrides and
/// rewrites `metadata.json`.
///
/// For each column: a prior user override keeps the user's type with
/// `_inferred` updated; otherwise both fields adopt the current values.
pub fn merge_and_write(
    export_path: &Path,
    databases: &[Database],
    inferred: &HashMap<String, HashMap<String, ColumnType>>,
    existing: Option<&MetadataFile>,
) -> Result<()> {
    let mut out = MetadataFile {
        description: DESCRIPTION.to_string(),
        valid_types: ColumnType::ALL.iter().map(|t| t.as_str().to_string()).collect(),
        databases: BTreeMap::new(),
    };

    for db in databases {
        let db_inferred = inferred.get(&db.uid);
        let old_db = existing.and_then(|m| m.databases.get(&db.uid));

        let mut columns = BTreeMap::new();
        for col in &db.columns {
            let fresh = db_inferred
                .and_then(|m| m.get(&col.name).copied())
                .unwrap_or(col.column_type);
            let old_col = old_db.and_then(|d| d.columns.get(&col.name));

            let entry = match old_col {
                Some(old) if old.override_type().is_some() => ColumnMetadata {
                    column_type: old.column_type.clone(),
                    inferred: fresh.as_str().to_string(),
                },
                _ => ColumnMetadata {
                    column_type: col.column_type.as_str().to_string(),
                    inferred: fresh.as_str().to_string(),
                },
            };
            columns.insert(col.name.clone(), entry);
        }

        out.databases.insert(
            db.uid.clone(),
            DatabaseMetadata {
                title: db.title.clone(),
                columns,
            },
        );
    }

    let path = export_path.join(METADATA_FILENAME);
    let json = serde_json::to_string_pretty(&out)?;
    fs::write(&path, json + "\n").with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}
