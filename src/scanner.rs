//! Export directory scanning.
//!
//! Walks one export tree and classifies every recognized file. The scan is
//! read-only, recursive with no depth limit, and exhaustive; an unreadable
//! directory fails the whole export rather than producing a partial listing.

use anyhow::{Context, Result};
use globset::GlobSet;
use std::path::Path;
use walkdir::WalkDir;

use crate::models::{FileKind, ScannedFile};
use crate::uid::extract_uid;

/// Binary extensions treated as page assets. Anything not matching a
/// category here is silently skipped.
pub const ASSET_EXTENSIONS: [&str; 18] = [
    "png", "jpg", "jpeg", "gif", "svg", "webp", "ico", "pdf", "docx", "pptx", "xlsx", "doc",
    "ppt", "xls", "zip", "mp4", "mov", "mp3",
];

/// Scans an export root and returns every recognized descendant file,
/// sorted by relative path for deterministic downstream ordering.
pub fn scan_export(root: &Path, excludes: &GlobSet, follow_symlinks: bool) -> Result<Vec<ScannedFile>> {
    let mut files = Vec::new();

    let walker = WalkDir::new(root).follow_links(follow_symlinks);
    for entry in walker {
        let entry = entry.with_context(|| format!("failed to scan {}", root.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let relative = path.strip_prefix(root).unwrap_or(path);
        let relative_path = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        if excludes.is_match(&relative_path) {
            continue;
        }

        let name = entry.file_name().to_string_lossy().to_string();
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        let kind = if ext == "csv" {
            if name.ends_with("_all.csv") {
                FileKind::TableFull
            } else {
                FileKind::TableView
            }
        } else if ext == "md" {
            FileKind::Document
        } else if is_asset_extension(&ext) {
            FileKind::Asset
        } else {
            continue;
        };

        let dir_parts: Vec<String> = relative
            .parent()
            .map(|p| {
                p.components()
                    .map(|c| c.as_os_str().to_string_lossy().to_string())
                    .collect()
            })
            .unwrap_or_default();

        files.push(ScannedFile {
            path: path.to_path_buf(),
            relative_path,
            name: name.clone(),
            uid: extract_uid(&name),
            kind,
            dir_parts,
        });
    }

    files.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
    Ok(files)
}

fn is_asset_extension(ext: &str) -> bool {
    ASSET_EXTENSIONS.contains(&ext)
}
