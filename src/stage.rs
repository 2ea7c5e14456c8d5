//! User-supplied transform stages.
//!
//! Stages hook into four points of the pipeline: `Before` (raw parse, before
//! symbol extraction), `Processing` (after linking, may add export metadata),
//! `After` (the merged output sheet), and `Done` (final pass over the merged
//! sheet). All four run the same trait; a stage failing aborts the pipeline
//! with the phase and stage name attached.

use crate::parser::ast::Stylesheet;
use async_trait::async_trait;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// Where in the lifecycle a stage runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Before,
    Processing,
    After,
    Done,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Phase::Before => "before",
            Phase::Processing => "processing",
            Phase::After => "after",
            Phase::Done => "done",
        };
        f.write_str(s)
    }
}

/// Mutable context handed to a stage alongside the stylesheet.
#[derive(Debug)]
pub struct StageContext {
    /// The file being transformed. `None` for the merged output sheet.
    pub file: Option<PathBuf>,
    pub cwd: PathBuf,
    /// Extra export entries contributed by processing stages. Merged into
    /// the file's export table after the phase completes.
    pub extra_exports: BTreeMap<String, Vec<String>>,
}

impl StageContext {
    pub fn for_file(file: PathBuf, cwd: PathBuf) -> Self {
        Self {
            file: Some(file),
            cwd,
            extra_exports: BTreeMap::new(),
        }
    }

    pub fn for_output(cwd: PathBuf) -> Self {
        Self {
            file: None,
            cwd,
            extra_exports: BTreeMap::new(),
        }
    }
}

/// A pipeline transform. Implementations must be cheap to share; the
/// processor holds them behind `Arc` and runs them sequentially.
#[async_trait]
pub trait Stage: Send + Sync {
    /// Stable identifier used in error reporting and logs.
    fn name(&self) -> &str;

    /// Which phase this stage participates in.
    fn phase(&self) -> Phase;

    async fn transform(&self, sheet: &mut Stylesheet, ctx: &mut StageContext) -> anyhow::Result<()>;
}

/// Run every stage registered for `phase`, in registration order. A failing
/// stage aborts with its phase and name attached.
pub async fn run_stages(
    stages: &[std::sync::Arc<dyn Stage>],
    phase: Phase,
    sheet: &mut Stylesheet,
    ctx: &mut StageContext,
) -> crate::Result<()> {
    for stage in stages.iter().filter(|s| s.phase() == phase) {
        tracing::debug!(stage = stage.name(), %phase, "running stage");
        stage
            .transform(sheet, ctx)
            .await
            .map_err(|err| crate::Error::Stage {
                phase,
                stage: stage.name().to_string(),
                message: format!("{err:#}"),
            })?;
    }
    Ok(())
}
