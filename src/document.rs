//! Markdown document parsing.
//!
//! Exported pages follow a fixed shape:
//!
//! ```text
//! # Title
//! Key: Value      (metadata lines, no blank line before them)
//! Key: Value
//!                 (blank line separates metadata from body)
//! Body content...
//! ```
//!
//! The parser splits title, metadata, and body, and scans the body for
//! tabular-link and image references.

use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;

/// Colon must appear within the first 40 characters of a metadata line.
const METADATA_COLON_LIMIT: usize = 40;
/// Metadata keys have at most 5 whitespace-separated tokens.
const METADATA_KEY_MAX_TOKENS: usize = 5;

// Tabular links: [Label](path/to/file.csv)
static CSV_LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[[^\]]*\]\(([^)]+\.csv)\)").unwrap());
// Image embeds: ![alt](path/to/image.png), any target extension.
static IMAGE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"!\[[^\]]*\]\(([^)]+)\)").unwrap());

/// Result of parsing one document file.
#[derive(Debug, Clone)]
pub struct ParsedDocument {
    /// First `# ` heading, marker stripped. Empty when the file has none.
    pub title: String,
    pub metadata: BTreeMap<String, String>,
    pub body: String,
    /// Raw tabular-link targets found in the body, in order, undeduplicated.
    pub csv_refs: Vec<String>,
    /// Raw image targets found in the body, in order, undeduplicated.
    pub image_refs: Vec<String>,
}

/// Parses raw document content into title, metadata block, body, and
/// embedded references.
pub fn parse_document(raw: &str) -> ParsedDocument {
    let lines: Vec<&str> = raw.split('\n').map(|l| l.strip_suffix('\r').unwrap_or(l)).collect();

    let mut title = String::new();
    let mut metadata = BTreeMap::new();
    let mut i = 0;

    while i < lines.len() && lines[i].trim().is_empty() {
        i += 1;
    }

    if i < lines.len() && lines[i].starts_with("# ") {
        title = lines[i][2..].trim().to_string();
        i += 1;
    }

    // Metadata block: blank lines are skippable only until the first key is
    // captured; the first blank after that ends the block.
    while i < lines.len() {
        let line = lines[i].trim();
        if line.is_empty() {
            i += 1;
            if !metadata.is_empty() {
                break;
            }
            continue;
        }
        if let Some((key, value)) = split_metadata_line(line) {
            metadata.insert(key, value);
            i += 1;
            continue;
        }
        // Not a metadata line; the body starts here.
        break;
    }

    let body = lines[i..].join("\n").trim().to_string();

    let csv_refs = CSV_LINK_RE
        .captures_iter(&body)
        .map(|c| c.get(1).unwrap().as_str().to_string())
        .collect();
    let image_refs = IMAGE_RE
        .captures_iter(&body)
        .map(|c| c.get(1).unwrap().as_str().to_string())
        .collect();

    ParsedDocument {
        title,
        metadata,
        body,
        csv_refs,
        image_refs,
    }
}

fn split_metadata_line(line: &str) -> Option<(String, String)> {
    let colon = line.find(':')?;
    if colon == 0 || line[..colon].chars().count() >= METADATA_COLON_LIMIT {
        return None;
    }
    let key = line[..colon].trim();
    if key.split_whitespace().count() > METADATA_KEY_MAX_TOKENS {
        return None;
    }
    let value = line[colon + 1..].trim();
    Some((key.to_string(), value.to_string()))
}
