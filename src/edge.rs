//! Edge types - file-to-file dependency representation
//!
//! Every cross-file reference reduces to three edge kinds:
//! - `Value`: `@value name from "./other.css"`
//! - `Composes`: `composes: name from "./other.css"`
//! - `External`: `:external(name from "./other.css")`

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// The reference kind that created an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeKind {
    /// `@value ... from "x"` import
    Value,
    /// `composes: ... from "x"` reference
    Composes,
    /// `:external(... from "x")` reference
    External,
}

impl EdgeKind {
    /// Get the string representation of the edge kind
    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeKind::Value => "value",
            EdgeKind::Composes => "composes",
            EdgeKind::External => "external",
        }
    }

    /// Get all edge kinds
    pub fn all() -> &'static [EdgeKind] {
        &[EdgeKind::Value, EdgeKind::Composes, EdgeKind::External]
    }
}

impl std::fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A dependency edge between two resolved absolute file paths.
///
/// Edges only ever connect resolved paths; an unresolved reference becomes
/// an error before it can become an edge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Edge {
    /// The file containing the reference
    pub from: PathBuf,
    /// The file being referenced
    pub to: PathBuf,
    /// The reference kind
    pub kind: EdgeKind,
}

impl Edge {
    pub fn new(from: impl Into<PathBuf>, to: impl Into<PathBuf>, kind: EdgeKind) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            kind,
        }
    }
}

impl PartialEq for Edge {
    fn eq(&self, other: &Self) -> bool {
        self.from == other.from && self.to == other.to && self.kind == other.kind
    }
}

impl Eq for Edge {}

impl std::hash::Hash for Edge {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.from.hash(state);
        self.to.hash(state);
        self.kind.hash(state);
    }
}
