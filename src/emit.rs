//! Static JSON emission.
//!
//! Serializes the resolved graph to the output contract: `manifest.json`,
//! one `db-<uid>.json` per database, one `page-<uid>.json` per page, and a
//! flat `search-index.json`. Identifiers must be globally unique across the
//! merged exports; that is validated here rather than assumed. Writes are
//! idempotent, so re-running over an existing output directory is safe.

use anyhow::{bail, Context, Result};
use chrono::Utc;
use serde::Serialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::models::{
    DatabaseSummary, ExportData, Manifest, ManifestExport, Page, SearchEntry, StandalonePage,
};

/// Characters of body text kept in each search-index entry.
const BODY_PREVIEW_CHARS: usize = 300;

/// Validates global uniqueness, then writes the whole output contract.
pub fn emit_all(output_dir: &Path, exports: &[ExportData], pretty: bool) -> Result<()> {
    validate_unique_uids(exports)?;

    fs::create_dir_all(output_dir)
        .with_context(|| format!("failed to create {}", output_dir.display()))?;

    let manifest = build_manifest(exports);
    write_json(&output_dir.join("manifest.json"), &manifest, pretty)?;

    for export in exports {
        for db in &export.databases {
            write_json(&output_dir.join(format!("db-{}.json", db.uid)), db, pretty)?;
        }
        for page in &export.pages {
            write_json(&output_dir.join(format!("page-{}.json", page.uid)), page, pretty)?;
        }
    }

    let search_index = build_search_index(exports);
    write_json(&output_dir.join("search-index.json"), &search_index, pretty)?;

    let db_count: usize = exports.iter().map(|e| e.databases.len()).sum();
    let page_count: usize = exports.iter().map(|e| e.pages.len()).sum();
    println!(
        "emitted manifest + {} databases + {} pages + search index ({} exports) to {}",
        db_count,
        page_count,
        exports.len(),
        output_dir.display()
    );
    Ok(())
}

/// Identifiers land in one flat output namespace, so a collision anywhere
/// (across exports, or between a database and a page) corrupts the output.
fn validate_unique_uids(exports: &[ExportData]) -> Result<()> {
    let mut seen: HashMap<&str, &str> = HashMap::new();
    for export in exports {
        let uids = export
            .databases
            .iter()
            .map(|d| d.uid.as_str())
            .chain(export.pages.iter().map(|p| p.uid.as_str()));
        for uid in uids {
            if let Some(first) = seen.insert(uid, export.name.as_str()) {
                bail!(
                    "identifier {} appears in both export '{}' and export '{}'",
                    uid,
                    first,
                    export.name
                );
            }
        }
    }
    Ok(())
}

pub fn build_manifest(exports: &[ExportData]) -> Manifest {
    Manifest {
        exports: exports
            .iter()
            .map(|export| ManifestExport {
                name: export.name.clone(),
                databases: export
                    .databases
                    .iter()
                    .map(|db| DatabaseSummary {
                        uid: db.uid.clone(),
                        title: db.title.clone(),
                        row_count: db.rows.len(),
                        column_count: db.columns.len(),
                        parent_page_uid: db.parent_page_uid.clone(),
                    })
                    .collect(),
                standalone_pages: standalone_tree(&export.pages),
                page_count: export.pages.len(),
            })
            .collect(),
        generated_at: Utc::now().to_rfc3339(),
    }
}

/// Pages with no owning database form a parent/child tree; each entry
/// lists its direct standalone children.
fn standalone_tree(pages: &[Page]) -> Vec<StandalonePage> {
    let standalone: Vec<&Page> = pages.iter().filter(|p| p.database_uid.is_none()).collect();
    standalone
        .iter()
        .map(|p| StandalonePage {
            uid: p.uid.clone(),
            title: p.title.clone(),
            child_page_uids: standalone
                .iter()
                .filter(|c| c.parent_page_uid.as_deref() == Some(p.uid.as_str()))
                .map(|c| c.uid.clone())
                .collect(),
        })
        .collect()
}

fn build_search_index(exports: &[ExportData]) -> Vec<SearchEntry> {
    exports
        .iter()
        .flat_map(|export| {
            export.pages.iter().map(|p| SearchEntry {
                uid: p.uid.clone(),
                title: p.title.clone(),
                metadata: p.metadata.clone(),
                body_preview: p.body.chars().take(BODY_PREVIEW_CHARS).collect(),
                database_uid: p.database_uid.clone(),
            })
        })
        .collect()
}

fn write_json<T: Serialize>(path: &Path, value: &T, pretty: bool) -> Result<()> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    fs::write(path, json + "\n").with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}
