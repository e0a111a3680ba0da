//! Asset resolution and relocation.
//!
//! Assets live under a folder named after their owning page
//! (`Meetings/Kickoff/image.png`, possibly deeper). Ownership is resolved
//! by probing the asset's ancestor directories, deepest first, against an
//! index of page asset-folder keys; matched assets are copied into the
//! output tree under `assets/<pageUid>/`. Copies are idempotent, so re-runs
//! need no cleanup. Orphans are dropped.

use anyhow::{Context, Result};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

use crate::models::ScannedFile;

/// Index from a page's asset-folder key (`<dir>/<title>` relative to the
/// export root) to the page's identifier.
#[derive(Debug, Default)]
pub struct AssetIndex {
    by_dir: HashMap<String, String>,
}

impl AssetIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a page's asset folder. A second entry with the title
    /// percent-encoded covers exports that kept encoded folder names.
    pub fn insert_page(&mut self, dir_parts: &[String], title: &str, uid: &str) {
        let parent = dir_parts.join("/");
        self.by_dir.insert(join_key(&parent, title), uid.to_string());

        let encoded = title.replace(' ', "%20").replace('&', "%26");
        if encoded != title {
            self.by_dir.insert(join_key(&parent, &encoded), uid.to_string());
        }
    }

    /// Walks a file's ancestor path deepest-first and returns the owning
    /// page, if any ancestor is a registered asset folder.
    pub fn lookup(&self, dir_parts: &[String]) -> Option<&str> {
        for depth in (1..=dir_parts.len()).rev() {
            let key = dir_parts[..depth].join("/");
            if let Some(uid) = self.by_dir.get(&key) {
                return Some(uid.as_str());
            }
        }
        None
    }
}

fn join_key(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", parent, name)
    }
}

/// Copies every resolvable asset to `<output>/assets/<pageUid>/<name>` and
/// returns page uid → output-relative asset paths. Unresolvable assets are
/// skipped; the caller reports the orphan count.
pub fn resolve_assets(
    assets: &[ScannedFile],
    index: &AssetIndex,
    output_dir: &Path,
) -> Result<BTreeMap<String, Vec<String>>> {
    let mut by_page: BTreeMap<String, Vec<String>> = BTreeMap::new();
    let assets_dir = output_dir.join("assets");

    for asset in assets {
        let Some(page_uid) = index.lookup(&asset.dir_parts) else {
            continue;
        };

        let dest_dir = assets_dir.join(page_uid);
        fs::create_dir_all(&dest_dir)
            .with_context(|| format!("failed to create {}", dest_dir.display()))?;
        let dest = dest_dir.join(&asset.name);
        fs::copy(&asset.path, &dest).with_context(|| {
            format!(
                "failed to copy {} to {}",
                asset.path.display(),
                dest.display()
            )
        })?;

        by_page
            .entry(page_uid.to_string())
            .or_default()
            .push(format!("assets/{}/{}", page_uid, asset.name));
    }

    Ok(by_page)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FileKind;
    use std::path::PathBuf;

    fn scanned_asset(root: &Path, rel_dir: &[&str], name: &str) -> ScannedFile {
        let mut path = PathBuf::from(root);
        for d in rel_dir {
            path.push(d);
        }
        fs::create_dir_all(&path).unwrap();
        path.push(name);
        fs::write(&path, b"bytes").unwrap();
        ScannedFile {
            path,
            relative_path: format!("{}/{}", rel_dir.join("/"), name),
            name: name.to_string(),
            uid: None,
            kind: FileKind::Asset,
            dir_parts: rel_dir.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn asset_resolves_to_enclosing_page_folder() {
        let tmp = tempfile::TempDir::new().unwrap();
        let out = tmp.path().join("out");
        let uid = "a".repeat(32);

        let mut index = AssetIndex::new();
        index.insert_page(&["Projects".to_string()], "Kickoff", &uid);

        let asset = scanned_asset(tmp.path(), &["Projects", "Kickoff"], "image.png");
        let map = resolve_assets(&[asset], &index, &out).unwrap();

        assert_eq!(map[&uid], vec![format!("assets/{}/image.png", uid)]);
        assert!(out.join("assets").join(&uid).join("image.png").exists());
    }

    #[test]
    fn deepest_folder_wins() {
        let uid_outer = "a".repeat(32);
        let uid_inner = "b".repeat(32);
        let mut index = AssetIndex::new();
        index.insert_page(&[], "Projects", &uid_outer);
        index.insert_page(&["Projects".to_string()], "Kickoff", &uid_inner);

        let dirs = vec!["Projects".to_string(), "Kickoff".to_string(), "sub".to_string()];
        assert_eq!(index.lookup(&dirs), Some(uid_inner.as_str()));
    }

    #[test]
    fn encoded_folder_name_still_resolves() {
        let uid = "c".repeat(32);
        let mut index = AssetIndex::new();
        index.insert_page(&[], "R&D Notes", &uid);

        assert_eq!(index.lookup(&["R%26D%20Notes".to_string()]), Some(uid.as_str()));
        assert_eq!(index.lookup(&["R&D Notes".to_string()]), Some(uid.as_str()));
    }

    #[test]
    fn orphan_assets_are_dropped() {
        let tmp = tempfile::TempDir::new().unwrap();
        let out = tmp.path().join("out");
        let index = AssetIndex::new();
        let asset = scanned_asset(tmp.path(), &["Nowhere"], "stray.png");
        let map = resolve_assets(&[asset], &index, &out).unwrap();
        assert!(map.is_empty());
        assert!(!out.join("assets").exists());
    }

    #[test]
    fn copying_twice_is_safe() {
        let tmp = tempfile::TempDir::new().unwrap();
        let out = tmp.path().join("out");
        let uid = "d".repeat(32);
        let mut index = AssetIndex::new();
        index.insert_page(&[], "Kickoff", &uid);
        let asset = scanned_asset(tmp.path(), &["Kickoff"], "pic.png");

        resolve_assets(&[asset.clone()], &index, &out).unwrap();
        let map = resolve_assets(&[asset], &index, &out).unwrap();
        assert_eq!(map[&uid].len(), 1);
    }
}
