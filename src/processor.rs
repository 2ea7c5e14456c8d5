//! The processing pipeline.
//!
//! `Processor` owns the dependency graph, the per-file records, and the
//! shared name cache. Files enter through [`Processor::file`] (disk) or
//! [`Processor::string`] (in-memory); dependencies load recursively before
//! the referencing file links. All state sits behind one async mutex, so
//! submissions serialize and every observer sees a consistent graph.

use crate::edge::Edge;
use crate::graph::FileGraph;
use crate::linker::{self, DepExports};
use crate::namer::{NameCache, Namer};
use crate::output::{self, Output, OutputFile, OutputOptions};
use crate::parser::{self, ast::Stylesheet};
use crate::resolve::{self, ResolverChain};
use crate::stage::{run_stages, Phase, Stage, StageContext};
use crate::symbols::{self, FileSymbols};
use crate::{Error, FileStatus, Result};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Processor construction options.
#[derive(Clone)]
pub struct ProcessorOptions {
    /// Base directory for normalization and cwd-relative reporting.
    pub cwd: PathBuf,
    pub namer: Namer,
    pub resolvers: ResolverChain,
    pub stages: Vec<Arc<dyn Stage>>,
}

impl Default for ProcessorOptions {
    fn default() -> Self {
        Self {
            cwd: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            namer: Namer::default(),
            resolvers: ResolverChain::default(),
            stages: Vec::new(),
        }
    }
}

impl std::fmt::Debug for ProcessorOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessorOptions")
            .field("cwd", &self.cwd)
            .field("resolvers", &self.resolvers)
            .field("stages", &self.stages.len())
            .finish()
    }
}

/// Result of submitting one file.
#[derive(Debug, Clone)]
pub struct ProcessResult {
    /// Normalized absolute path.
    pub file: PathBuf,
    pub status: FileStatus,
    pub exports: BTreeMap<String, Vec<String>>,
    pub values: BTreeMap<String, String>,
    /// Transitive dependencies, emit order.
    pub dependencies: Vec<PathBuf>,
}

struct FileRecord {
    /// Freshness token. `None` marks the record stale, forcing the next
    /// submission to reprocess regardless of content.
    token: Option<blake3::Hash>,
    source: String,
    sheet: Stylesheet,
    exports: BTreeMap<String, Vec<String>>,
    values: BTreeMap<String, String>,
}

struct Inner {
    options: ProcessorOptions,
    graph: FileGraph,
    files: HashMap<PathBuf, FileRecord>,
    cache: NameCache,
    /// Files currently on the recursive loading path, for cycle detection.
    loading: HashSet<PathBuf>,
}

/// The CSS module linker. Cheap to share behind `Arc`; all methods take
/// `&self`.
pub struct Processor {
    inner: Mutex<Inner>,
}

impl Processor {
    pub fn new(options: ProcessorOptions) -> Self {
        Self {
            inner: Mutex::new(Inner {
                options,
                graph: FileGraph::new(),
                files: HashMap::new(),
                cache: NameCache::new(),
                loading: HashSet::new(),
            }),
        }
    }

    /// Submit a file from disk.
    pub async fn file(&self, path: &Path) -> Result<ProcessResult> {
        let mut inner = self.inner.lock().await;
        let abs = resolve::normalize(&inner.options.cwd, path);
        let source = tokio::fs::read_to_string(&abs).await?;
        Self::submit(&mut inner, abs, source).await
    }

    /// Submit in-memory CSS under a path. The path anchors relative imports
    /// and scoped-name derivation; nothing is written to disk.
    pub async fn string(&self, path: &Path, css: impl Into<String>) -> Result<ProcessResult> {
        let mut inner = self.inner.lock().await;
        let abs = resolve::normalize(&inner.options.cwd, path);
        Self::submit(&mut inner, abs, css.into()).await
    }

    pub async fn has(&self, path: &Path) -> bool {
        let inner = self.inner.lock().await;
        let abs = resolve::normalize(&inner.options.cwd, path);
        inner.files.contains_key(&abs)
    }

    /// Remove files from the processor. Their dependents stay but are marked
    /// stale, so resubmitting a dependent reprocesses it. Returns the paths
    /// actually removed; unknown paths are ignored.
    pub async fn remove(&self, paths: &[PathBuf]) -> Vec<PathBuf> {
        let mut inner = self.inner.lock().await;
        let abs: Vec<PathBuf> = paths
            .iter()
            .map(|p| resolve::normalize(&inner.options.cwd, p))
            .collect();

        let mut stale = Vec::new();
        for path in &abs {
            stale.extend(inner.graph.dependents_of(path));
        }

        let removed = inner.graph.remove(&abs);
        for path in &removed {
            inner.files.remove(path);
            tracing::debug!(file = %path.display(), "removed");
        }
        for path in stale {
            if let Some(record) = inner.files.get_mut(&path) {
                record.token = None;
            }
        }
        removed
    }

    /// Force reprocessing of a file on its next submission.
    pub async fn invalidate(&self, path: &Path) {
        let mut inner = self.inner.lock().await;
        let abs = resolve::normalize(&inner.options.cwd, path);
        if let Some(record) = inner.files.get_mut(&abs) {
            record.token = None;
        }
    }

    /// Dependencies of one file, or the entire graph in emit order.
    pub async fn dependencies(&self, file: Option<&Path>) -> Vec<PathBuf> {
        let inner = self.inner.lock().await;
        match file {
            Some(path) => {
                let abs = resolve::normalize(&inner.options.cwd, path);
                inner.graph.dependencies_of(&abs)
            }
            None => inner.graph.dependencies(),
        }
    }

    /// Files that directly or transitively depend on `file`.
    pub async fn dependents(&self, file: &Path) -> Result<Vec<PathBuf>> {
        let inner = self.inner.lock().await;
        let abs = resolve::normalize(&inner.options.cwd, file);
        if !inner.graph.contains(&abs) {
            return Err(Error::UnknownFile { file: abs });
        }
        Ok(inner.graph.dependents_of(&abs))
    }

    /// The export table of an already-processed file.
    pub async fn file_exports(&self, file: &Path) -> Result<BTreeMap<String, Vec<String>>> {
        let inner = self.inner.lock().await;
        let abs = resolve::normalize(&inner.options.cwd, file);
        match inner.files.get(&abs) {
            Some(record) => Ok(record.exports.clone()),
            None => Err(Error::UnknownFile { file: abs }),
        }
    }

    /// Snapshot of the construction options.
    pub async fn options(&self) -> ProcessorOptions {
        self.inner.lock().await.options.clone()
    }

    /// Every processed file with its export table, deterministic order.
    pub async fn files(&self) -> BTreeMap<PathBuf, BTreeMap<String, Vec<String>>> {
        let inner = self.inner.lock().await;
        inner
            .files
            .iter()
            .map(|(path, record)| (path.clone(), record.exports.clone()))
            .collect()
    }

    /// Assemble output for `files` plus their dependencies, or for every
    /// processed file when `files` is empty. Requested files that were never
    /// processed are an error; duplicate coverage collapses, each file is
    /// emitted once.
    pub async fn output(&self, files: &[PathBuf], options: &OutputOptions) -> Result<Output> {
        let inner = self.inner.lock().await;
        if inner.files.is_empty() {
            return Err(Error::NoFilesProcessed);
        }

        let scope: Option<HashSet<PathBuf>> = if files.is_empty() {
            None
        } else {
            let mut scope = HashSet::new();
            for file in files {
                let abs = resolve::normalize(&inner.options.cwd, file);
                if !inner.files.contains_key(&abs) {
                    return Err(Error::UnknownFile { file: abs });
                }
                scope.extend(inner.graph.dependencies_of(&abs));
                scope.insert(abs);
            }
            Some(scope)
        };

        let ordered: Vec<PathBuf> = inner
            .graph
            .dependencies()
            .into_iter()
            .filter(|path| scope.as_ref().is_none_or(|s| s.contains(path)))
            .collect();

        let mut queued = Vec::with_capacity(ordered.len());
        for path in ordered {
            let Some(record) = inner.files.get(&path) else {
                continue;
            };
            queued.push(OutputFile {
                path,
                source: record.source.clone(),
                sheet: record.sheet.clone(),
                exports: record.exports.clone(),
            });
        }

        output::assemble(queued, &inner.options.stages, &inner.options.cwd, options).await
    }

    async fn submit(inner: &mut Inner, path: PathBuf, source: String) -> Result<ProcessResult> {
        inner.loading.clear();
        let status = process_file(inner, path.clone(), source).await?;

        let record = inner
            .files
            .get(&path)
            .ok_or_else(|| Error::UnknownFile { file: path.clone() })?;

        Ok(ProcessResult {
            status,
            exports: record.exports.clone(),
            values: record.values.clone(),
            dependencies: inner.graph.dependencies_of(&path),
            file: path,
        })
    }
}

/// Per-file freshness token: content hashed together with the cwd, so the
/// same file processed under a different root reprocesses.
fn freshness_token(cwd: &Path, source: &str) -> blake3::Hash {
    let mut hasher = blake3::Hasher::new();
    hasher.update(cwd.as_os_str().as_encoded_bytes());
    hasher.update(&[0]);
    hasher.update(source.as_bytes());
    hasher.finalize()
}

/// Parse, extract, load dependencies, and link one file. Boxed because the
/// dependency loads recurse.
fn process_file<'a>(
    inner: &'a mut Inner,
    path: PathBuf,
    source: String,
) -> Pin<Box<dyn Future<Output = Result<FileStatus>> + Send + 'a>> {
    Box::pin(async move {
        let token = freshness_token(&inner.options.cwd, &source);
        let status = match inner.files.get(&path) {
            Some(record) if record.token == Some(token) => {
                tracing::debug!(file = %path.display(), "unchanged");
                return Ok(FileStatus::Unchanged);
            }
            Some(_) => FileStatus::Modified,
            None => FileStatus::New,
        };

        if !inner.loading.insert(path.clone()) {
            return Err(Error::CircularReference {
                from: path.clone(),
                to: path,
            });
        }
        tracing::debug!(file = %path.display(), ?status, "processing");

        let result = link_file(inner, &path, &source, token).await;
        inner.loading.remove(&path);
        result?;

        // A replaced record invalidates everything built on top of it, so
        // dependents reprocess even when their own bytes did not change.
        if matches!(status, FileStatus::Modified) {
            for dependent in inner.graph.dependents_of(&path) {
                if let Some(record) = inner.files.get_mut(&dependent) {
                    record.token = None;
                }
            }
        }
        Ok(status)
    })
}

async fn link_file(
    inner: &mut Inner,
    path: &Path,
    source: &str,
    token: blake3::Hash,
) -> Result<()> {
    let mut sheet = parser::parse(path, source)?;

    let mut ctx = StageContext::for_file(path.to_path_buf(), inner.options.cwd.clone());
    run_stages(&inner.options.stages, Phase::Before, &mut sheet, &mut ctx).await?;

    let syms = symbols::extract(path, &sheet)?;
    let (resolved, edges) = resolve_requests(inner, path, &syms)?;

    // Load anything not seen before. A dependency already mid-load on the
    // current path is a cycle and fails inside the recursive call.
    for target in resolved.values() {
        if inner.files.contains_key(target) && !inner.loading.contains(target) {
            continue;
        }
        let dep_source = tokio::fs::read_to_string(target).await?;
        process_file(inner, target.clone(), dep_source).await?;
    }

    let targets: Vec<PathBuf> = resolved.values().cloned().collect();
    if let Some(offender) = inner.graph.would_cycle(path, &targets) {
        return Err(Error::CircularReference {
            from: path.to_path_buf(),
            to: offender,
        });
    }

    let mut deps: BTreeMap<PathBuf, DepExports> = BTreeMap::new();
    for target in &targets {
        let Some(record) = inner.files.get(target) else {
            continue;
        };
        deps.insert(
            target.clone(),
            DepExports {
                exports: record.exports.clone(),
                values: record.values.clone(),
            },
        );
    }

    let linked = linker::link(
        path,
        sheet,
        &syms,
        &resolved,
        &deps,
        &inner.options.namer,
        &mut inner.cache,
    )?;

    let mut sheet = linked.sheet;
    let mut exports = linked.exports;
    let mut ctx = StageContext::for_file(path.to_path_buf(), inner.options.cwd.clone());
    run_stages(&inner.options.stages, Phase::Processing, &mut sheet, &mut ctx).await?;
    for (name, scoped) in ctx.extra_exports {
        let entry = exports.entry(name).or_default();
        entry.extend(scoped);
        *entry = linker::dedup_preserving_order(std::mem::take(entry));
    }

    // Edges register only once the whole file succeeded; a failed
    // submission leaves no trace of the file behind.
    inner.graph.add(path, edges);
    inner.files.insert(
        path.to_path_buf(),
        FileRecord {
            token: Some(token),
            source: source.to_string(),
            sheet,
            exports,
            values: linked.values,
        },
    );
    Ok(())
}

/// Resolve every request in `syms` through the resolver chain, producing the
/// request map the linker wants and the graph edges for this file.
fn resolve_requests(
    inner: &Inner,
    path: &Path,
    syms: &FileSymbols,
) -> Result<(HashMap<String, PathBuf>, Vec<Edge>)> {
    let mut resolved: HashMap<String, PathBuf> = HashMap::new();
    let mut edges = Vec::new();

    for dep in syms.dependency_refs() {
        let target = if let Some(existing) = resolved.get(&dep.request) {
            existing.clone()
        } else {
            let known = |candidate: &Path| inner.files.contains_key(candidate);
            let target = inner
                .options
                .resolvers
                .resolve(path, &dep.request, &known)
                .ok_or_else(|| Error::UnableToLocate {
                    request: dep.request.clone(),
                    from: path.to_path_buf(),
                })?;
            resolved.insert(dep.request.clone(), target.clone());
            target
        };

        edges.push(Edge {
            from: path.to_path_buf(),
            to: target,
            kind: dep.kind,
        });
    }

    Ok((resolved, edges))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn processor(cwd: &Path) -> Processor {
        Processor::new(ProcessorOptions {
            cwd: cwd.to_path_buf(),
            namer: Namer::Custom(Arc::new(|file, name| {
                let stem = file
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_default();
                format!("{}_{}", stem, name)
            })),
            ..ProcessorOptions::default()
        })
    }

    fn write(dir: &Path, name: &str, css: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, css).unwrap();
        path
    }

    #[tokio::test]
    async fn chain_orders_dependencies_first() {
        let dir = TempDir::new().unwrap();
        let _c = write(dir.path(), "c.css", ".c { color: green; }");
        let _b = write(dir.path(), "b.css", ".b { composes: c from \"./c.css\"; color: blue; }");
        let a = write(dir.path(), "a.css", ".a { composes: b from \"./b.css\"; color: red; }");

        let proc = processor(dir.path());
        let result = proc.file(&a).await.unwrap();
        assert_eq!(result.status, FileStatus::New);
        assert_eq!(
            result.exports.get("a").unwrap(),
            &vec!["a_a".to_string(), "b_b".to_string(), "c_c".to_string()]
        );

        let out = proc.output(&[], &OutputOptions::default()).await.unwrap();
        let c = out.css.find(".c_c").unwrap();
        let b = out.css.find(".b_b").unwrap();
        let a_idx = out.css.find(".a_a").unwrap();
        assert!(c < b && b < a_idx);
    }

    #[tokio::test]
    async fn resubmission_is_stable() {
        let dir = TempDir::new().unwrap();
        let a = write(dir.path(), "a.css", ".a { color: red; }");

        let proc = processor(dir.path());
        let first = proc.file(&a).await.unwrap();
        assert_eq!(first.status, FileStatus::New);

        let second = proc.file(&a).await.unwrap();
        assert_eq!(second.status, FileStatus::Unchanged);
        assert_eq!(first.exports, second.exports);
    }

    #[tokio::test]
    async fn modified_content_reprocesses() {
        let dir = TempDir::new().unwrap();
        let a = write(dir.path(), "a.css", ".a { color: red; }");

        let proc = processor(dir.path());
        proc.file(&a).await.unwrap();

        write(dir.path(), "a.css", ".a { color: blue; }");
        let second = proc.file(&a).await.unwrap();
        assert_eq!(second.status, FileStatus::Modified);

        let out = proc.output(&[], &OutputOptions::default()).await.unwrap();
        assert!(out.css.contains("color: blue;"));
        assert!(!out.css.contains("color: red;"));
    }

    #[tokio::test]
    async fn output_without_files_is_rejected() {
        let proc = processor(Path::new("/"));
        let err = proc.output(&[], &OutputOptions::default()).await.unwrap_err();
        assert!(matches!(err, Error::NoFilesProcessed));
    }

    #[tokio::test]
    async fn string_files_resolve_each_other() {
        let proc = processor(Path::new("/virtual"));
        proc.string(Path::new("/virtual/b.css"), ".b { color: blue; }")
            .await
            .unwrap();
        let result = proc
            .string(
                Path::new("/virtual/a.css"),
                ".a { composes: b from \"./b.css\"; }",
            )
            .await
            .unwrap();

        assert_eq!(
            result.exports.get("a").unwrap(),
            &vec!["a_a".to_string(), "b_b".to_string()]
        );
    }

    #[tokio::test]
    async fn missing_import_is_located_error() {
        let proc = processor(Path::new("/virtual"));
        let err = proc
            .string(
                Path::new("/virtual/a.css"),
                ".a { composes: b from \"./missing.css\"; }",
            )
            .await
            .unwrap_err();
        assert!(err
            .to_string()
            .starts_with("Unable to locate \"./missing.css\""));
    }

    #[tokio::test]
    async fn invalid_composes_reference_surfaces() {
        let dir = TempDir::new().unwrap();
        let _b = write(dir.path(), "b.css", ".b { color: blue; }");
        let a = write(dir.path(), "a.css", ".a { composes: nope from \"./b.css\"; }");

        let proc = processor(dir.path());
        let err = proc.file(&a).await.unwrap_err();
        assert_eq!(err.to_string(), "Invalid composes reference: nope");
    }

    #[tokio::test]
    async fn circular_imports_rejected() {
        let dir = TempDir::new().unwrap();
        let a = write(dir.path(), "a.css", ".a { composes: b from \"./b.css\"; }");
        let _b = write(dir.path(), "b.css", ".b { composes: a from \"./a.css\"; }");

        let proc = processor(dir.path());
        let err = proc.file(&a).await.unwrap_err();
        assert!(matches!(err, Error::CircularReference { .. }));
    }

    #[tokio::test]
    async fn removal_marks_dependents_stale() {
        let dir = TempDir::new().unwrap();
        let b = write(dir.path(), "b.css", ".b { color: blue; }");
        let a = write(dir.path(), "a.css", ".a { composes: b from \"./b.css\"; }");

        let proc = processor(dir.path());
        proc.file(&a).await.unwrap();
        assert!(proc.has(&b).await);

        let removed = proc.remove(std::slice::from_ref(&b)).await;
        assert_eq!(removed, vec![b.clone()]);
        assert!(!proc.has(&b).await);

        // unchanged bytes, but the dependent was invalidated
        let again = proc.file(&a).await.unwrap();
        assert_eq!(again.status, FileStatus::Modified);
    }

    #[tokio::test]
    async fn modified_dependency_marks_dependents_stale() {
        let dir = TempDir::new().unwrap();
        let b = write(dir.path(), "b.css", "@value primary: blue;");
        let a = write(
            dir.path(),
            "a.css",
            "@value primary from \"./b.css\";\n.a { color: primary; }",
        );

        let proc = processor(dir.path());
        proc.file(&a).await.unwrap();

        write(dir.path(), "b.css", "@value primary: red;");
        let changed = proc.file(&b).await.unwrap();
        assert_eq!(changed.status, FileStatus::Modified);

        // unchanged bytes, but the dependency was replaced underneath
        let again = proc.file(&a).await.unwrap();
        assert_eq!(again.status, FileStatus::Modified);

        let out = proc.output(&[], &OutputOptions::default()).await.unwrap();
        assert!(out.css.contains("color: red;"));
        assert!(!out.css.contains("color: blue;"));
    }

    #[tokio::test]
    async fn remove_unknown_is_noop() {
        let dir = TempDir::new().unwrap();
        let a = write(dir.path(), "a.css", ".a { color: red; }");

        let proc = processor(dir.path());
        proc.file(&a).await.unwrap();
        let removed = proc.remove(&[dir.path().join("nope.css")]).await;
        assert!(removed.is_empty());
        assert!(proc.has(&a).await);
    }

    #[tokio::test]
    async fn duplicate_inclusion_collapses() {
        let dir = TempDir::new().unwrap();
        let b = write(dir.path(), "b.css", ".b { color: blue; }");
        let a = write(dir.path(), "a.css", ".a { composes: b from \"./b.css\"; color: red; }");

        let proc = processor(dir.path());
        proc.file(&a).await.unwrap();

        // b is both requested directly and pulled in as a dependency of a
        let out = proc
            .output(&[a, b], &OutputOptions::default())
            .await
            .unwrap();
        assert_eq!(out.css.matches(".b_b").count(), 1);
    }

    #[tokio::test]
    async fn output_of_unknown_file_rejected() {
        let dir = TempDir::new().unwrap();
        let a = write(dir.path(), "a.css", ".a { color: red; }");

        let proc = processor(dir.path());
        proc.file(&a).await.unwrap();
        let err = proc
            .output(&[dir.path().join("nope.css")], &OutputOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::UnknownFile { .. }));
    }

    #[tokio::test]
    async fn scoped_output_excludes_unrelated_files() {
        let dir = TempDir::new().unwrap();
        let a = write(dir.path(), "a.css", ".a { color: red; }");
        let z = write(dir.path(), "z.css", ".z { color: green; }");

        let proc = processor(dir.path());
        proc.file(&a).await.unwrap();
        proc.file(&z).await.unwrap();

        let out = proc
            .output(std::slice::from_ref(&a), &OutputOptions::default())
            .await
            .unwrap();
        assert!(out.css.contains(".a_a"));
        assert!(!out.css.contains(".z_z"));
    }

    #[tokio::test]
    async fn values_flow_across_files() {
        let dir = TempDir::new().unwrap();
        let _colors = write(dir.path(), "colors.css", "@value primary: blue;");
        let a = write(
            dir.path(),
            "a.css",
            "@value primary from \"./colors.css\";\n.a { color: primary; }",
        );

        let proc = processor(dir.path());
        let result = proc.file(&a).await.unwrap();
        assert_eq!(result.values.get("primary").unwrap(), "blue");

        let out = proc.output(&[], &OutputOptions::default()).await.unwrap();
        assert!(out.css.contains("color: blue;"));
    }

    #[tokio::test]
    async fn dependents_reported() {
        let dir = TempDir::new().unwrap();
        let b = write(dir.path(), "b.css", ".b { color: blue; }");
        let a = write(dir.path(), "a.css", ".a { composes: b from \"./b.css\"; }");

        let proc = processor(dir.path());
        proc.file(&a).await.unwrap();
        assert_eq!(proc.dependents(&b).await.unwrap(), vec![a.clone()]);
        assert!(proc.dependents(Path::new("/nope.css")).await.is_err());

        assert_eq!(proc.dependencies(Some(&a)).await, vec![b]);
    }

    struct ExtraExports;

    #[async_trait::async_trait]
    impl Stage for ExtraExports {
        fn name(&self) -> &str {
            "extra-exports"
        }

        fn phase(&self) -> Phase {
            Phase::Processing
        }

        async fn transform(
            &self,
            _sheet: &mut Stylesheet,
            ctx: &mut StageContext,
        ) -> anyhow::Result<()> {
            ctx.extra_exports
                .insert("injected".to_string(), vec!["i_injected".to_string()]);
            Ok(())
        }
    }

    #[tokio::test]
    async fn processing_stage_exports_merge() {
        let dir = TempDir::new().unwrap();
        let a = write(dir.path(), "a.css", ".a { color: red; }");

        let proc = Processor::new(ProcessorOptions {
            cwd: dir.path().to_path_buf(),
            stages: vec![Arc::new(ExtraExports)],
            ..ProcessorOptions::default()
        });

        let result = proc.file(&a).await.unwrap();
        assert_eq!(
            result.exports.get("injected").unwrap(),
            &vec!["i_injected".to_string()]
        );
        assert!(result.exports.contains_key("a"));
    }

    struct RepeatExisting;

    #[async_trait::async_trait]
    impl Stage for RepeatExisting {
        fn name(&self) -> &str {
            "repeat-existing"
        }

        fn phase(&self) -> Phase {
            Phase::Processing
        }

        async fn transform(
            &self,
            _sheet: &mut Stylesheet,
            ctx: &mut StageContext,
        ) -> anyhow::Result<()> {
            ctx.extra_exports
                .insert("a".to_string(), vec!["mc_extra".to_string(), "mc_extra".to_string()]);
            Ok(())
        }
    }

    #[tokio::test]
    async fn stage_exports_dedupe_against_existing() {
        let dir = TempDir::new().unwrap();
        let a = write(dir.path(), "a.css", ".a { color: red; }");

        let proc = Processor::new(ProcessorOptions {
            cwd: dir.path().to_path_buf(),
            namer: Namer::Custom(Arc::new(|_, _| "mc_extra".to_string())),
            stages: vec![Arc::new(RepeatExisting)],
            ..ProcessorOptions::default()
        });

        let result = proc.file(&a).await.unwrap();
        assert_eq!(
            result.exports.get("a").unwrap(),
            &vec!["mc_extra".to_string()]
        );
    }

    #[tokio::test]
    async fn compositions_keyed_relative_to_cwd() {
        let dir = TempDir::new().unwrap();
        let a = write(dir.path(), "a.css", ".a { color: red; }");

        let proc = processor(dir.path());
        proc.file(&a).await.unwrap();
        let out = proc.output(&[], &OutputOptions::default()).await.unwrap();
        assert_eq!(
            out.compositions.get("a.css").unwrap().get("a").unwrap(),
            &vec!["a_a".to_string()]
        );

        let files = proc.files().await;
        assert_eq!(files.len(), 1);
    }
}
