//! # Pagemill
//!
//! Pagemill resolves a directory tree of exported tabular and document
//! files (CSV tables paired with Markdown pages, cross-referencing each
//! other through filename-embedded identifiers) into a normalized set of
//! static JSON documents for a read-only viewer.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌───────────────┐   ┌─────────────┐   ┌──────────┐
//! │ Scanner  │──▶│ CSV + MD      │──▶│ Cross-ref    │──▶│ Emitter  │
//! │ walkdir  │   │ parsers +     │   │ + asset      │   │ JSON +   │
//! │          │   │ type inference│   │ resolution   │   │ assets/  │
//! └──────────┘   └───────────────┘   └─────────────┘   └──────────┘
//! ```
//!
//! One run processes every export subdirectory of the data root, then
//! merges the results into one flat, identifier-keyed output directory.
//!
//! ## Quick Start
//!
//! ```bash
//! pagemill scan                  # inventory the exports, write nothing
//! pagemill build                 # resolve and emit static JSON
//! pagemill build --output dist   # emit somewhere else
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`scanner`] | Export directory scanning |
//! | [`uid`] | Identifier/title extraction |
//! | [`tabular`] | CSV parsing |
//! | [`schema`] | Column type inference |
//! | [`document`] | Markdown page parsing |
//! | [`resolve`] | Cross-reference resolution |
//! | [`assets`] | Asset relocation |
//! | [`metadata`] | Type-override persistence |
//! | [`pipeline`] | Per-export orchestration |
//! | [`emit`] | Static JSON emission |

pub mod assets;
pub mod config;
pub mod document;
pub mod emit;
pub mod metadata;
pub mod models;
pub mod pipeline;
pub mod progress;
pub mod resolve;
pub mod scanner;
pub mod schema;
pub mod tabular;
pub mod uid;
