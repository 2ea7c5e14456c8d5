//! Namer - maps `(file, localName)` pairs to final scoped identifiers
//!
//! The namer is tagged configuration rather than duck-typing: either the
//! built-in default (a blake3-derived per-file prefix) or a user function.
//! Results are cached per `(file, localName)` so a pair always maps to the
//! same identifier for the lifetime of one processor.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// User namer contract: `(filePath, localName) -> finalName`. Must be pure
/// and stable for the lifetime of one processor.
pub type NamerFn = dyn Fn(&Path, &str) -> String + Send + Sync;

/// Scoped-name generation strategy.
#[derive(Clone, Default)]
pub enum Namer {
    /// `mc<hash8>_<name>` where `hash8` is derived from the file path.
    #[default]
    Default,
    /// A caller-supplied naming function.
    Custom(Arc<NamerFn>),
}

impl std::fmt::Debug for Namer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Namer::Default => write!(f, "Namer::Default"),
            Namer::Custom(_) => write!(f, "Namer::Custom(..)"),
        }
    }
}

impl Namer {
    fn apply(&self, file: &Path, name: &str) -> String {
        match self {
            Namer::Default => {
                let hash = blake3::hash(file.to_string_lossy().as_bytes());
                format!("mc{}_{}", &hash.to_hex().as_str()[..8], name)
            }
            Namer::Custom(f) => f(file, name),
        }
    }
}

/// Memoized `(file, localName) -> scoped` mapping. The cache is the only
/// cross-file mutable state besides the graph; keying strictly on the pair
/// keeps reads/extends safe from any file's resolution.
#[derive(Debug, Default)]
pub struct NameCache {
    names: HashMap<(PathBuf, String), String>,
}

impl NameCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scoped name for a local, computed once and stable afterwards.
    pub fn scoped(&mut self, namer: &Namer, file: &Path, name: &str) -> String {
        if let Some(existing) = self.names.get(&(file.to_path_buf(), name.to_string())) {
            return existing.clone();
        }

        let scoped = namer.apply(file, name);
        self.names
            .insert((file.to_path_buf(), name.to_string()), scoped.clone());
        scoped
    }
}
