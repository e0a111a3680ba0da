//! Per-export orchestration.
//!
//! Composes the scanner, parsers, and resolvers once per export directory:
//! scan → pair and parse CSVs → parse pages → decide ownership → infer
//! schemas → apply overrides → match rows → resolve inline tables and
//! standalone parents → copy assets. Exports are independent; nothing here
//! crosses an export boundary.

use anyhow::{bail, Context, Result};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::assets::{self, AssetIndex};
use crate::config::Config;
use crate::document::parse_document;
use crate::metadata;
use crate::models::{ColumnType, Database, DatabaseRecord, ExportData, FileKind, Page, ScannedFile};
use crate::progress::{BuildProgressEvent, BuildProgressReporter};
use crate::resolve::{match_rows_to_pages, resolve_inline_refs, resolve_owner};
use crate::scanner::scan_export;
use crate::schema::infer_column_types;
use crate::tabular::parse_csv;
use crate::uid::{extract_title, normalize_title};

/// Lists the export subdirectories of the data root, sorted by name.
/// Zero exports is fatal: there is nothing to build.
pub fn discover_exports(data_root: &Path) -> Result<Vec<(String, PathBuf)>> {
    let entries = fs::read_dir(data_root)
        .with_context(|| format!("failed to read data root {}", data_root.display()))?;

    let mut exports = Vec::new();
    for entry in entries {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            exports.push((entry.file_name().to_string_lossy().to_string(), entry.path()));
        }
    }
    exports.sort_by(|a, b| a.0.cmp(&b.0));

    if exports.is_empty() {
        bail!(
            "no export directories found in {}; place exports as subdirectories of the data root",
            data_root.display()
        );
    }
    Ok(exports)
}

/// Runs the full resolution pipeline for one export directory.
///
/// `output_dir` is needed here (not just at emission) because asset copies
/// land directly in the output tree.
pub fn process_export(
    name: &str,
    export_path: &Path,
    config: &Config,
    output_dir: &Path,
    reporter: &dyn BuildProgressReporter,
) -> Result<ExportData> {
    let excludes = config.scanner.build_excludes()?;
    reporter.report(BuildProgressEvent::Scanning {
        export: name.to_string(),
    });
    let files = scan_export(export_path, &excludes, config.scanner.follow_symlinks)?;

    let table_full: Vec<&ScannedFile> = files.iter().filter(|f| f.kind == FileKind::TableFull).collect();
    let table_view: Vec<&ScannedFile> = files.iter().filter(|f| f.kind == FileKind::TableView).collect();
    let documents: Vec<&ScannedFile> = files.iter().filter(|f| f.kind == FileKind::Document).collect();
    let asset_files: Vec<ScannedFile> = files
        .iter()
        .filter(|f| f.kind == FileKind::Asset)
        .cloned()
        .collect();

    println!(
        "{}: found {} full CSVs, {} view CSVs, {} documents, {} assets",
        name,
        table_full.len(),
        table_view.len(),
        documents.len(),
        asset_files.len()
    );

    let total = (table_full.len() + documents.len()) as u64;
    let mut processed = 0u64;
    let report_step = |processed: &mut u64| {
        *processed += 1;
        reporter.report(BuildProgressEvent::Resolving {
            export: name.to_string(),
            n: *processed,
            total,
        });
    };

    // Pair full dumps with their view counterpart by embedded identifier.
    #[derive(Default)]
    struct CsvPair<'a> {
        full: Option<&'a ScannedFile>,
        view: Option<&'a ScannedFile>,
    }
    let mut csv_by_uid: std::collections::BTreeMap<String, CsvPair<'_>> = Default::default();
    for f in &table_full {
        if let Some(uid) = &f.uid {
            csv_by_uid.entry(uid.clone()).or_default().full = Some(*f);
        }
    }
    for f in &table_view {
        if let Some(uid) = &f.uid {
            csv_by_uid.entry(uid.clone()).or_default().view = Some(*f);
        }
    }

    let mut databases: Vec<Database> = Vec::new();
    let mut headers_by_uid: HashMap<String, Vec<String>> = HashMap::new();

    for (uid, pair) in csv_by_uid {
        let Some(full) = pair.full else {
            // View CSV with no full dump: column order with no data.
            continue;
        };
        report_step(&mut processed);

        let content = match fs::read_to_string(&full.path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("warning: skipping {}: {}", full.relative_path, e);
                continue;
            }
        };
        let table = match parse_csv(&content) {
            Ok(t) => t,
            Err(e) => {
                eprintln!("warning: skipping {}: {}", full.relative_path, e);
                continue;
            }
        };

        // The view file only contributes column order.
        let headers = match pair.view {
            Some(view) => match fs::read_to_string(&view.path).map_err(anyhow::Error::from).and_then(
                |c| parse_csv(&c).map_err(anyhow::Error::from),
            ) {
                Ok(view_table) => view_table.headers,
                Err(e) => {
                    eprintln!(
                        "warning: unreadable view CSV {}, using dump column order: {}",
                        view.relative_path, e
                    );
                    table.headers.clone()
                }
            },
            None => table.headers.clone(),
        };

        let parent_page_uid = nested_parent_uid(full, &documents);

        let rows: Vec<DatabaseRecord> = table
            .rows
            .into_iter()
            .map(|values| DatabaseRecord { uid: None, values })
            .collect();

        headers_by_uid.insert(uid.clone(), headers);
        databases.push(Database {
            uid,
            title: extract_title(&full.name),
            columns: Vec::new(),
            rows,
            parent_page_uid,
        });
    }

    // Parse pages, build the asset-folder index, and decide ownership.
    let candidates: Vec<(String, String)> = databases
        .iter()
        .map(|db| (db.uid.clone(), db.title.clone()))
        .collect();

    let mut pages: Vec<Page> = Vec::new();
    // (uid, file title, dir parts) in scan order, for row matching and
    // standalone-parent linking.
    let mut page_files: Vec<(String, String, Vec<String>)> = Vec::new();
    let mut asset_index = AssetIndex::new();
    let mut csv_refs_by_page: HashMap<String, Vec<String>> = HashMap::new();

    for mf in &documents {
        let Some(uid) = &mf.uid else {
            eprintln!(
                "warning: document without embedded identifier, skipping {}",
                mf.relative_path
            );
            continue;
        };
        report_step(&mut processed);

        let raw = match fs::read_to_string(&mf.path) {
            Ok(r) => r,
            Err(e) => {
                eprintln!("warning: skipping {}: {}", mf.relative_path, e);
                continue;
            }
        };
        let parsed = parse_document(&raw);

        let file_title = extract_title(&mf.name);
        asset_index.insert_page(&mf.dir_parts, &file_title, uid);

        if !parsed.csv_refs.is_empty() {
            csv_refs_by_page.insert(uid.clone(), parsed.csv_refs.clone());
        }

        let title = if parsed.title.is_empty() {
            file_title.clone()
        } else {
            parsed.title
        };

        pages.push(Page {
            uid: uid.clone(),
            title,
            metadata: parsed.metadata,
            body: parsed.body,
            database_uid: resolve_owner(&mf.dir_parts, &candidates),
            parent_page_uid: None,
            inline_database_uids: Vec::new(),
            assets: Vec::new(),
        });
        page_files.push((uid.clone(), file_title, mf.dir_parts.clone()));
    }

    let page_idx: HashMap<String, usize> = pages
        .iter()
        .enumerate()
        .map(|(i, p)| (p.uid.clone(), i))
        .collect();

    // Schema inference, with each database seeing the titles of its own
    // pages so the title-column rule has something to match against.
    let mut inferred: HashMap<String, HashMap<String, ColumnType>> = HashMap::new();
    for db in &mut databases {
        let known_titles: Vec<String> = pages
            .iter()
            .filter(|p| p.database_uid.as_deref() == Some(db.uid.as_str()))
            .map(|p| p.title.clone())
            .collect();
        let headers = &headers_by_uid[&db.uid];
        db.columns = infer_column_types(headers, &db.rows, &known_titles);
        inferred.insert(
            db.uid.clone(),
            db.columns
                .iter()
                .map(|c| (c.name.clone(), c.column_type))
                .collect(),
        );
    }

    let existing_meta = metadata::read_metadata(export_path);
    metadata::apply_overrides(&mut databases, existing_meta.as_ref());
    metadata::merge_and_write(export_path, &databases, &inferred, existing_meta.as_ref())?;

    // Row ↔ page matching per database.
    for db in &mut databases {
        let owned: Vec<(String, String)> = page_files
            .iter()
            .filter(|(uid, _, _)| {
                page_idx
                    .get(uid)
                    .map_or(false, |&i| pages[i].database_uid.as_deref() == Some(db.uid.as_str()))
            })
            .map(|(uid, file_title, _)| (file_title.clone(), uid.clone()))
            .collect();
        match_rows_to_pages(db, &owned);
        let matched = db.rows.iter().filter(|r| r.uid.is_some()).count();
        println!("  {}: matched {}/{} rows", db.title, matched, db.rows.len());
    }

    for page in &mut pages {
        if let Some(refs) = csv_refs_by_page.get(&page.uid) {
            page.inline_database_uids = resolve_inline_refs(refs);
        }
    }

    // Standalone pages nested under another page's folder form a
    // parent/child hierarchy; the enclosing folder is the parent.
    for (uid, _, dir_parts) in &page_files {
        let i = page_idx[uid];
        if pages[i].database_uid.is_some() {
            continue;
        }
        if let Some(parent) = asset_index.lookup(dir_parts) {
            if parent != uid {
                pages[i].parent_page_uid = Some(parent.to_string());
            }
        }
    }

    let asset_map = assets::resolve_assets(&asset_files, &asset_index, output_dir)?;
    let copied: usize = asset_map.values().map(Vec::len).sum();
    for (uid, paths) in asset_map {
        if let Some(&i) = page_idx.get(&uid) {
            pages[i].assets = paths;
        }
    }
    println!(
        "  assets: {} copied, {} orphaned",
        copied,
        asset_files.len() - copied
    );
    println!("  parsed {} databases, {} pages", databases.len(), pages.len());

    Ok(ExportData {
        name: name.to_string(),
        databases,
        pages,
    })
}

/// A table nested at least two levels deep may live inside a page's folder;
/// the folder name points back at the parent page.
fn nested_parent_uid(full: &ScannedFile, documents: &[&ScannedFile]) -> Option<String> {
    if full.dir_parts.len() < 2 {
        return None;
    }
    let parent_dir = normalize_title(full.dir_parts.last()?);
    documents
        .iter()
        .find(|m| m.uid.is_some() && normalize_title(&extract_title(&m.name)) == parent_dir)
        .and_then(|m| m.uid.clone())
}
