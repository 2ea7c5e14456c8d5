//! cssweld CLI - link CSS modules into one deterministic bundle

use anyhow::Context;
use clap::Parser;
use cssweld::config;
use cssweld::output::{MapMode, OutputOptions};
use cssweld::processor::{Processor, ProcessorOptions};
use cssweld::watcher::Watcher;
use owo_colors::OwoColorize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "cssweld")]
#[command(version)]
#[command(about = "CSS module linker - scopes selectors, resolves composes/@value/:external, emits one bundle")]
#[command(long_about = r#"
cssweld links CSS modules:
  • Classes, ids, and @keyframes get per-file scoped names
  • composes / @value / :external(...) resolve across files
  • Output is concatenated dependencies-first, byte-stable

Example usage:
  cssweld "css/**/*.css" --out dist/bundle.css
  cssweld entry.css --out dist/bundle.css --map=inline --json dist/exports.json
  cssweld "css/**/*.css" --out dist/bundle.css --watch
"#)]
struct Cli {
    /// Glob patterns of entry files, relative to the working directory
    patterns: Vec<String>,

    /// Write the bundled CSS here (stdout when omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// Emit a source map; "separate" writes <out>.map, "inline" appends
    /// a data URI trailer
    #[arg(short, long, num_args = 0..=1, default_missing_value = "separate")]
    map: Option<String>,

    /// Write the compositions table as JSON
    #[arg(short, long)]
    json: Option<PathBuf>,

    /// Working directory for resolution and relative reporting
    #[arg(short, long)]
    dir: Option<PathBuf>,

    /// Rebuild on file changes
    #[arg(short, long)]
    watch: bool,

    /// Config file (default: cssweld.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Clone)]
struct BuildTargets {
    out: Option<PathBuf>,
    json: Option<PathBuf>,
    map: MapMode,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let config = config::load_config(cli.config.as_deref())?.unwrap_or_default();

    let patterns = if cli.patterns.is_empty() {
        config.patterns.clone().unwrap_or_default()
    } else {
        cli.patterns.clone()
    };
    anyhow::ensure!(!patterns.is_empty(), "no input patterns given");

    let cwd = match cli.dir.or(config.dir) {
        Some(dir) => std::path::absolute(&dir)
            .with_context(|| format!("bad working directory {:?}", dir))?,
        None => std::env::current_dir()?,
    };

    let map = match cli.map.or(config.map) {
        Some(mode) => config::parse_map_mode(&mode)?,
        None => MapMode::Off,
    };

    let targets = BuildTargets {
        out: cli.out.or(config.out),
        json: cli.json.or(config.json),
        map,
    };

    let processor = Arc::new(Processor::new(ProcessorOptions {
        cwd: cwd.clone(),
        ..ProcessorOptions::default()
    }));

    let files = collect_files(&cwd, &patterns)?;
    anyhow::ensure!(!files.is_empty(), "no files matched {:?}", patterns);

    for file in &files {
        processor
            .file(file)
            .await
            .with_context(|| format!("failed to process {}", file.display()))?;
    }

    build(&processor, &targets).await?;

    if cli.watch {
        let watcher = Watcher::new(processor.clone(), cwd);
        watcher
            .run(|| {
                let processor = processor.clone();
                let targets = targets.clone();
                async move { build(&processor, &targets).await }
            })
            .await?;
    }

    Ok(())
}

fn collect_files(cwd: &Path, patterns: &[String]) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for pattern in patterns {
        let full = if Path::new(pattern).is_absolute() {
            pattern.clone()
        } else {
            cwd.join(pattern).to_string_lossy().into_owned()
        };

        for entry in glob::glob(&full).with_context(|| format!("bad pattern {:?}", pattern))? {
            files.push(entry?);
        }
    }
    files.sort();
    files.dedup();
    Ok(files)
}

async fn build(processor: &Processor, targets: &BuildTargets) -> anyhow::Result<()> {
    let file_name = targets
        .out
        .as_deref()
        .and_then(Path::file_name)
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "out.css".to_string());

    let options = OutputOptions {
        file_name,
        map: targets.map,
        map_contents: true,
    };
    let output = processor.output(&[], &options).await?;

    match &targets.out {
        Some(path) => {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    tokio::fs::create_dir_all(parent).await?;
                }
            }
            tokio::fs::write(path, &output.css).await?;
            println!(
                "{} {} ({} files, {} bytes)",
                "wrote".green(),
                path.display(),
                output.files.len(),
                output.css.len()
            );

            if targets.map == MapMode::Separate {
                if let Some(map) = &output.map {
                    let map_path = path.with_extension("css.map");
                    tokio::fs::write(&map_path, map.to_json()).await?;
                    println!("{} {}", "wrote".green(), map_path.display());
                }
            }
        }
        None => print!("{}", output.css),
    }

    if let Some(json_path) = &targets.json {
        if let Some(parent) = json_path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let json = serde_json::to_string_pretty(&output.compositions)?;
        tokio::fs::write(json_path, json).await?;
        println!("{} {}", "wrote".green(), json_path.display());
    }

    Ok(())
}
