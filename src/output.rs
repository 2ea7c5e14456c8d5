//! Output assembly.
//!
//! Merges linked per-file stylesheets into one CSS document in dependency
//! order, runs the `After` and `Done` stage phases over the merged sheet,
//! and emits the export table alongside an optional source map.
//!
//! With maps off and with a separate map the CSS bytes are identical; only
//! inline mode appends a trailer comment to the document itself.

use crate::parser::ast::{Item, RuleItem, Stylesheet};
use crate::sourcemap::{MapBuilder, SourceMap};
use crate::stage::{run_stages, Phase, Stage, StageContext};
use crate::Result;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Source-map emission mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MapMode {
    #[default]
    Off,
    /// Emit the map as a standalone document, CSS untouched.
    Separate,
    /// Append the map to the CSS as a base64 `sourceMappingURL` trailer.
    Inline,
}

#[derive(Debug, Clone)]
pub struct OutputOptions {
    /// Name recorded in the source map's `file` field.
    pub file_name: String,
    pub map: MapMode,
    /// Embed original sources in the map's `sourcesContent`.
    pub map_contents: bool,
}

impl Default for OutputOptions {
    fn default() -> Self {
        Self {
            file_name: "out.css".to_string(),
            map: MapMode::Off,
            map_contents: true,
        }
    }
}

/// One linked file queued for assembly, already in emit order.
#[derive(Debug, Clone)]
pub struct OutputFile {
    pub path: PathBuf,
    pub source: String,
    pub sheet: Stylesheet,
    pub exports: BTreeMap<String, Vec<String>>,
}

/// Assembled output document.
#[derive(Debug, Clone)]
pub struct Output {
    pub css: String,
    pub map: Option<SourceMap>,
    /// cwd-relative file -> exported name -> ordered scoped names.
    pub compositions: BTreeMap<String, BTreeMap<String, Vec<String>>>,
    /// The files included, in emit order.
    pub files: Vec<PathBuf>,
}

/// Merge `files` (already ordered, dependencies first) into one document.
pub async fn assemble(
    files: Vec<OutputFile>,
    stages: &[Arc<dyn Stage>],
    cwd: &Path,
    options: &OutputOptions,
) -> Result<Output> {
    let mut merged = Stylesheet::default();
    let mut builder = MapBuilder::new();
    let mut compositions = BTreeMap::new();
    let mut included = Vec::with_capacity(files.len());

    for file in files {
        let src = builder.add_source(cwd, &file.path, &file.source);

        let mut items = file.sheet.items;
        retag_src(&mut items, src);
        merged.items.extend(items);

        compositions.insert(relative_key(cwd, &file.path), file.exports.clone());
        included.push(file.path);
    }

    let mut ctx = StageContext::for_output(cwd.to_path_buf());
    run_stages(stages, Phase::After, &mut merged, &mut ctx).await?;
    run_stages(stages, Phase::Done, &mut merged, &mut ctx).await?;

    let printed = merged.print();
    for mapping in &printed.lines {
        builder.push_line(*mapping);
    }

    let (css, map) = match options.map {
        MapMode::Off => (printed.css, None),
        MapMode::Separate => {
            let map = builder.build(&options.file_name, options.map_contents);
            (printed.css, Some(map))
        }
        MapMode::Inline => {
            let map = builder.build(&options.file_name, options.map_contents);
            let css = format!("{}{}\n", printed.css, map.inline_comment());
            (css, Some(map))
        }
    };

    tracing::debug!(files = included.len(), bytes = css.len(), "assembled output");

    Ok(Output {
        css,
        map,
        compositions,
        files: included,
    })
}

/// Point every node at the merged document's source index for this file.
fn retag_src(items: &mut [Item], src: u32) {
    for item in items {
        match item {
            Item::Rule(rule) => {
                rule.pos.src = src;
                for part in &mut rule.items {
                    match part {
                        RuleItem::Decl(decl) => decl.pos.src = src,
                        RuleItem::Comment(comment) => comment.pos.src = src,
                    }
                }
            }
            Item::AtRule(at) => {
                at.pos.src = src;
                if let Some(block) = &mut at.block {
                    retag_src(block, src);
                }
            }
            Item::Comment(comment) => comment.pos.src = src,
        }
    }
}

fn relative_key(cwd: &Path, path: &Path) -> String {
    path.strip_prefix(cwd)
        .unwrap_or(path)
        .to_string_lossy()
        .replace('\\', "/")
}
