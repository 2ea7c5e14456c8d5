//! Path identity and the resolver chain
//!
//! File identity is an absolute, component-normalized path. Import requests
//! are turned into identities by an ordered chain of resolver functions;
//! the first non-empty answer wins, with a default relative-then-
//! node_modules resolver as the final fallback.

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

/// Resolver function contract: `(fromFile, request) -> absolutePath | None`.
pub type ResolverFn = dyn Fn(&Path, &str) -> Option<PathBuf> + Send + Sync;

/// Make `path` absolute against `base` and clean `.`/`..` components.
/// Purely lexical; never touches the filesystem.
pub fn normalize(base: &Path, path: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    };

    let mut out = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    out
}

/// The ordered resolution pipeline.
#[derive(Clone, Default)]
pub struct ResolverChain {
    resolvers: Vec<Arc<ResolverFn>>,
}

impl std::fmt::Debug for ResolverChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolverChain")
            .field("resolvers", &self.resolvers.len())
            .finish()
    }
}

impl ResolverChain {
    pub fn new(resolvers: Vec<Arc<ResolverFn>>) -> Self {
        Self { resolvers }
    }

    /// Run user resolvers in order, falling back to the default resolver.
    ///
    /// `known` reports whether a candidate path is already registered with
    /// the processor - string-added files exist there without being on
    /// disk, and must still be resolvable as import targets.
    pub fn resolve(
        &self,
        from: &Path,
        request: &str,
        known: &dyn Fn(&Path) -> bool,
    ) -> Option<PathBuf> {
        let base = from.parent().unwrap_or(from);

        for resolver in &self.resolvers {
            if let Some(path) = resolver(from, request) {
                return Some(normalize(base, &path));
            }
        }

        default_resolve(from, request, known)
    }
}

/// Relative-path resolution first, then a node_modules-style walk up the
/// directory tree.
fn default_resolve(from: &Path, request: &str, known: &dyn Fn(&Path) -> bool) -> Option<PathBuf> {
    let base = from.parent().unwrap_or(from);
    let request_path = Path::new(request);

    if request.starts_with("./") || request.starts_with("../") || request_path.is_absolute() {
        let candidate = normalize(base, request_path);
        if known(&candidate) || candidate.is_file() {
            return Some(candidate);
        }
        return None;
    }

    for dir in base.ancestors() {
        let candidate = normalize(dir, &Path::new("node_modules").join(request_path));
        if known(&candidate) || candidate.is_file() {
            return Some(candidate);
        }
    }

    None
}
