//! # cssweld - CSS module linker
//!
//! Ingests CSS files that declare locally-scoped class/id/keyframe names and
//! cross-file composition relationships, then links them into one
//! globally-consistent, renamed output.
//!
//! cssweld provides:
//! - Per-file scoping of classes, ids, and `@keyframes` through a pluggable namer
//! - `composes`, `@value`, and `:external(...)` resolution across files
//! - A dependency graph with deterministic, lexicographically tie-broken ordering
//! - Byte-stable output assembly with optional merged source maps
//! - An export table (`compositions`) consumed by downstream tooling

pub mod parser;
pub mod selector;
pub mod symbols;
pub mod edge;
pub mod graph;
pub mod resolve;
pub mod namer;
pub mod linker;
pub mod processor;
pub mod output;
pub mod sourcemap;
pub mod stage;
pub mod config;
pub mod watcher;

// Re-exports for convenient access
pub use edge::{Edge, EdgeKind};
pub use graph::FileGraph;
pub use namer::Namer;
pub use output::{MapMode, Output, OutputOptions};
pub use processor::{ProcessResult, Processor, ProcessorOptions};
pub use stage::{Phase, Stage, StageContext};

use std::path::PathBuf;

/// Result type alias for cssweld operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for cssweld operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("SyntaxError: {file}:{line}: {detail}", file = .file.display())]
    Syntax {
        file: PathBuf,
        line: u32,
        detail: String,
    },

    #[error("Unable to locate \"{request}\" from \"{from}\"", from = .from.display())]
    UnableToLocate { request: String, from: PathBuf },

    #[error("Invalid composes reference: {name}")]
    InvalidComposesReference { name: String },

    #[error("Invalid external reference: {name}")]
    InvalidExternalReference { name: String },

    #[error("Invalid @value reference: {detail}")]
    InvalidValue { detail: String },

    #[error("composes must be the first declaration ({file})", file = .file.display())]
    ComposesNotFirst { file: PathBuf },

    #[error("Only simple singular selectors may use composition ({selector})")]
    ComposesComplexSelector { selector: String },

    #[error("Unable to re-use the same selector for global & local ({name})")]
    GlobalLocalCollision { name: String },

    #[error(":global(...) must not be empty ({file})", file = .file.display())]
    EmptyGlobal { file: PathBuf },

    #[error("externals must be from another file ({file})", file = .file.display())]
    ExternalMissingFrom { file: PathBuf },

    #[error("Circular reference between \"{from}\" and \"{to}\"", from = .from.display(), to = .to.display())]
    CircularReference { from: PathBuf, to: PathBuf },

    #[error("{phase} stage \"{stage}\" failed: {message}")]
    Stage {
        phase: Phase,
        stage: String,
        message: String,
    },

    #[error("No files have been processed")]
    NoFilesProcessed,

    #[error("Unknown file requested: \"{file}\"", file = .file.display())]
    UnknownFile { file: PathBuf },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Status of a file during processing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileStatus {
    New,
    Modified,
    Unchanged,
}
