//! # Pagemill CLI
//!
//! The `pagemill` binary turns a tree of exported CSV + Markdown files into
//! the static JSON contract consumed by the viewer.
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `pagemill build` | Resolve every export under the data root and emit JSON |
//! | `pagemill scan` | Inventory the exports without writing anything |
//!
//! ## Examples
//!
//! ```bash
//! # Resolve ./data into ./public/data
//! pagemill build
//!
//! # Explicit locations, machine-readable progress
//! pagemill build --data-root ./exports --output ./dist --progress json
//!
//! # Check what a build would pick up
//! pagemill scan --data-root ./exports
//! ```

mod assets;
mod config;
mod document;
mod emit;
mod metadata;
mod models;
mod pipeline;
mod progress;
mod resolve;
mod scanner;
mod schema;
mod tabular;
mod uid;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::models::FileKind;
use crate::progress::ProgressMode;

/// Pagemill — resolve exported CSV + Markdown trees into static JSON.
#[derive(Parser)]
#[command(
    name = "pagemill",
    about = "Resolve exported CSV + Markdown trees into static JSON for a read-only viewer",
    version
)]
struct Cli {
    /// Path to an optional TOML configuration file.
    ///
    /// CLI flags override values from the file; without a file, built-in
    /// defaults apply (`./data` in, `./public/data` out).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Progress reporting on stderr: `off`, `human`, or `json`.
    /// Defaults to `human` when stderr is a TTY, otherwise `off`.
    #[arg(long, global = true)]
    progress: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve every export under the data root and emit static JSON.
    ///
    /// Scans each export subdirectory, parses CSV tables and Markdown
    /// pages, resolves cross-references and assets, applies metadata type
    /// overrides, and writes the output contract. Idempotent — safe to
    /// re-run over an existing output directory.
    Build {
        /// Root holding one subdirectory per export.
        #[arg(long)]
        data_root: Option<PathBuf>,

        /// Output directory for the JSON files and copied assets.
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Inventory the exports without writing anything.
    ///
    /// Walks each export and prints per-category file counts. Useful for
    /// verifying directory layout before a build.
    Scan {
        /// Root holding one subdirectory per export.
        #[arg(long)]
        data_root: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut cfg = match &cli.config {
        Some(path) => config::load_config(path)?,
        None => config::Config::default(),
    };

    let mode = match cli.progress.as_deref() {
        None => ProgressMode::default_for_tty(),
        Some("off") => ProgressMode::Off,
        Some("human") => ProgressMode::Human,
        Some("json") => ProgressMode::Json,
        Some(other) => bail!("Unknown progress mode: '{}'. Must be off, human, or json.", other),
    };

    match cli.command {
        Commands::Build { data_root, output } => {
            if let Some(root) = data_root {
                cfg.data.root = root;
            }
            if let Some(out) = output {
                cfg.data.output = out;
            }
            run_build(&cfg, mode)?;
        }
        Commands::Scan { data_root } => {
            if let Some(root) = data_root {
                cfg.data.root = root;
            }
            run_scan(&cfg)?;
        }
    }

    Ok(())
}

fn run_build(cfg: &config::Config, mode: ProgressMode) -> Result<()> {
    let reporter = mode.reporter();
    let exports = pipeline::discover_exports(&cfg.data.root)?;
    println!(
        "found {} export(s): {}",
        exports.len(),
        exports
            .iter()
            .map(|(name, _)| name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );

    let mut resolved = Vec::new();
    for (name, path) in &exports {
        resolved.push(pipeline::process_export(
            name,
            path,
            cfg,
            &cfg.data.output,
            reporter.as_ref(),
        )?);
    }

    emit::emit_all(&cfg.data.output, &resolved, cfg.emit.pretty)?;
    println!("build complete");
    Ok(())
}

fn run_scan(cfg: &config::Config) -> Result<()> {
    let excludes = cfg.scanner.build_excludes()?;
    let exports = pipeline::discover_exports(&cfg.data.root)?;

    for (name, path) in &exports {
        let files = scanner::scan_export(path, &excludes, cfg.scanner.follow_symlinks)?;
        let count = |kind: FileKind| files.iter().filter(|f| f.kind == kind).count();
        println!("{}", name);
        println!("  full CSVs: {}", count(FileKind::TableFull));
        println!("  view CSVs: {}", count(FileKind::TableView));
        println!("  documents: {}", count(FileKind::Document));
        println!("  assets:    {}", count(FileKind::Asset));
        let without_uid = files
            .iter()
            .filter(|f| f.kind == FileKind::Document && f.uid.is_none())
            .count();
        if without_uid > 0 {
            println!("  documents without identifier: {}", without_uid);
        }
    }
    Ok(())
}
