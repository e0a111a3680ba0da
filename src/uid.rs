//! Identifier and title extraction from export filenames.
//!
//! Export filenames embed a 32-char lowercase hex identifier before the
//! extension: `"ABSA - 2024 planning 83016875ffb04abb89a97755538684e1.md"`.
//! The identifier is the primary join key everywhere; the stripped title is
//! the fuzzy, human-oriented key used only where no identifier link exists.

use regex::Regex;
use std::sync::LazyLock;

static UID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s([0-9a-f]{32})(?:[._]|$)").unwrap());

static UID_STRIP_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s[0-9a-f]{32}").unwrap());

static CSV_SUFFIX_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(_all)?\.csv$").unwrap());

/// Extracts the embedded 32-char hex identifier from a filename, if present.
///
/// The token must be preceded by whitespace and followed by a `.`/`_`
/// separator or the end of the string.
pub fn extract_uid(filename: &str) -> Option<String> {
    UID_RE
        .captures(filename)
        .map(|c| c.get(1).unwrap().as_str().to_string())
}

/// Strips the identifier token and any recognized extension suffix from a
/// filename, returning the human title.
pub fn extract_title(filename: &str) -> String {
    let stripped = UID_STRIP_RE.replace(filename, "");
    let stripped = CSV_SUFFIX_RE.replace(&stripped, "");
    stripped
        .strip_suffix(".md")
        .unwrap_or(&stripped)
        .trim()
        .to_string()
}

/// Normalizes a title for fuzzy matching: percent-decode, lowercase, and
/// keep only ASCII alphanumerics.
pub fn normalize_title(title: &str) -> String {
    percent_decode(title)
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect()
}

/// Decodes `%XX` percent-escapes. Invalid or truncated escapes are kept
/// verbatim rather than failing, since folder names in exports are not
/// guaranteed to be well-formed URI components.
pub fn percent_decode(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            if let (Some(hi), Some(lo)) = (hex_val(bytes.get(i + 1)), hex_val(bytes.get(i + 2))) {
                out.push(hi * 16 + lo);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn hex_val(b: Option<&u8>) -> Option<u8> {
    match b {
        Some(b @ b'0'..=b'9') => Some(b - b'0'),
        Some(b @ b'a'..=b'f') => Some(b - b'a' + 10),
        Some(b @ b'A'..=b'F') => Some(b - b'A' + 10),
        _ => None,
    }
}
