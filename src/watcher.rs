//! Watch mode: resubmit changed CSS files and trigger a rebuild.

use crate::processor::Processor;
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher as NotifyWatcher};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub struct Watcher {
    processor: Arc<Processor>,
    root: PathBuf,
}

impl Watcher {
    pub fn new(processor: Arc<Processor>, root: PathBuf) -> Self {
        Self { processor, root }
    }

    /// Watch the root recursively. After every batch of relevant changes,
    /// `on_change` runs to rebuild the output. Runs until the watch channel
    /// closes.
    pub async fn run<F, Fut>(&self, mut on_change: F) -> anyhow::Result<()>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = anyhow::Result<()>>,
    {
        let (tx, mut rx) = tokio::sync::mpsc::channel(64);

        let mut watcher = RecommendedWatcher::new(
            move |res| {
                // notify delivers on its own thread
                let _ = tx.blocking_send(res);
            },
            Config::default(),
        )?;
        watcher.watch(&self.root, RecursiveMode::Recursive)?;

        tracing::info!(root = %self.root.display(), "watching for changes");

        while let Some(res) = rx.recv().await {
            let event = match res {
                Ok(event) => event,
                Err(err) => {
                    tracing::warn!("watch error: {err}");
                    continue;
                }
            };

            if self.handle_event(event).await {
                if let Err(err) = on_change().await {
                    tracing::error!("rebuild failed: {err:#}");
                }
            }
        }

        Ok(())
    }

    /// Returns true when the event touched a tracked stylesheet.
    async fn handle_event(&self, event: Event) -> bool {
        let mut changed = false;
        match event.kind {
            EventKind::Create(_) | EventKind::Modify(_) => {
                for path in event.paths {
                    if !is_css(&path) || !path.is_file() {
                        continue;
                    }
                    if !self.processor.has(&path).await {
                        continue;
                    }
                    self.processor.invalidate(&path).await;
                    match self.processor.file(&path).await {
                        Ok(result) => {
                            tracing::info!(file = %path.display(), status = ?result.status, "reprocessed");
                            changed = true;
                        }
                        Err(err) => {
                            tracing::error!(file = %path.display(), "reprocess failed: {err}");
                            continue;
                        }
                    }

                    // Everything built on the changed file recomputes its
                    // substituted values and exports.
                    let dependents = self.processor.dependents(&path).await.unwrap_or_default();
                    for dependent in dependents {
                        if let Err(err) = self.processor.file(&dependent).await {
                            tracing::error!(file = %dependent.display(), "reprocess failed: {err}");
                        }
                    }
                }
            }
            EventKind::Remove(_) => {
                for path in event.paths {
                    if !is_css(&path) {
                        continue;
                    }
                    let removed = self.processor.remove(std::slice::from_ref(&path)).await;
                    if !removed.is_empty() {
                        tracing::info!(file = %path.display(), "removed");
                        changed = true;
                    }
                }
            }
            _ => {}
        }
        changed
    }
}

fn is_css(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("css"))
}
