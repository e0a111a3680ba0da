use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub scanner: ScannerConfig,
    #[serde(default)]
    pub emit: EmitConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DataConfig {
    /// Root holding one subdirectory per export.
    #[serde(default = "default_data_root")]
    pub root: PathBuf,
    /// Where the static JSON and assets are written.
    #[serde(default = "default_output_dir")]
    pub output: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            root: default_data_root(),
            output: default_output_dir(),
        }
    }
}

fn default_data_root() -> PathBuf {
    PathBuf::from("./data")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("./public/data")
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct ScannerConfig {
    /// Glob patterns (relative to each export root) to skip while scanning.
    #[serde(default)]
    pub exclude_globs: Vec<String>,
    #[serde(default)]
    pub follow_symlinks: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmitConfig {
    /// Pretty-print the emitted JSON. On by default; the files are meant to
    /// be diffable and hand-inspectable.
    #[serde(default = "default_pretty")]
    pub pretty: bool,
}

impl Default for EmitConfig {
    fn default() -> Self {
        Self {
            pretty: default_pretty(),
        }
    }
}

fn default_pretty() -> bool {
    true
}

impl ScannerConfig {
    /// Compiles the exclude patterns. Validated once at load time.
    pub fn build_excludes(&self) -> Result<GlobSet> {
        let mut builder = GlobSetBuilder::new();
        for pattern in &self.exclude_globs {
            builder.add(
                Glob::new(pattern)
                    .with_context(|| format!("invalid exclude glob: {}", pattern))?,
            );
        }
        Ok(builder.build()?)
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    // Surface bad globs at load time, not mid-scan.
    config.scanner.build_excludes()?;

    Ok(config)
}
