use std::fs::{OpenOptions, create_dir_all};
use std::path::{Path, PathBuf};
use std::process::Command;

use chrono::{DateTime, Utc};
use dagsim_core::ColumnSummary;
use dagsim_export::WriteReceipt;
use serde::Serialize;

use super::{RegistryError, RegistryResult};

/// Simulation settings recorded with every run.
#[derive(Debug, Clone, Serialize)]
pub struct RunOptions {
    pub model_path: PathBuf,
    pub model_name: Option<String>,
    pub rows: usize,
    pub seed: Option<u64>,
    pub format: String,
}

/// Metadata captured at run start.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub run_dir: PathBuf,
    pub options: RunOptions,
}

/// JSON config written to each run directory.
#[derive(Debug, Serialize)]
pub struct RunConfig {
    pub run_id: String,
    pub started_at: String,
    pub options: RunOptions,
    pub git: GitInfo,
}

/// Git metadata for reproducibility.
#[derive(Debug, Serialize)]
pub struct GitInfo {
    pub commit: Option<String>,
    pub dirty: Option<bool>,
}

/// Paths for run artifacts.
#[derive(Debug, Clone)]
pub struct RunPaths {
    pub root: PathBuf,
    pub logs_path: PathBuf,
    pub summary_path: PathBuf,
}

/// Outcome of a finished simulation, written as `summary.json`.
#[derive(Debug, Serialize)]
pub struct RunSummary {
    pub run_id: String,
    pub finished_at: String,
    pub duration_ms: u64,
    pub rows: usize,
    pub columns: Vec<ColumnSummary>,
    pub outputs: Vec<WriteReceipt>,
}

pub fn start_run(ctx: &RunContext) -> RegistryResult<RunPaths> {
    let timestamp = ctx.started_at.format("%Y-%m-%dT%H-%M-%SZ").to_string();
    let root = ctx.run_dir.join(format!("{timestamp}__run_{}", ctx.run_id));

    create_dir_all(&root)?;

    let config_path = root.join("config.json");
    let logs_path = root.join("logs.ndjson");
    let summary_path = root.join("summary.json");

    let config = RunConfig {
        run_id: ctx.run_id.clone(),
        started_at: ctx.started_at.to_rfc3339(),
        options: ctx.options.clone(),
        git: collect_git_info(),
    };

    write_json(&config_path, &config)?;

    OpenOptions::new()
        .create(true)
        .append(true)
        .open(&logs_path)?;

    Ok(RunPaths {
        root,
        logs_path,
        summary_path,
    })
}

pub fn write_summary(paths: &RunPaths, summary: &RunSummary) -> RegistryResult<()> {
    write_json(&paths.summary_path, summary)
}

/// Commit and dirty flag of the working tree; `None` outside a git checkout.
pub fn collect_git_info() -> GitInfo {
    let commit = git(&["rev-parse", "HEAD"])
        .map(|stdout| String::from_utf8_lossy(&stdout).trim().to_string())
        .filter(|commit| !commit.is_empty());
    let dirty = commit
        .as_ref()
        .and_then(|_| git(&["status", "--porcelain"]))
        .map(|stdout| !stdout.is_empty());

    GitInfo { commit, dirty }
}

fn git(args: &[&str]) -> Option<Vec<u8>> {
    let output = Command::new("git").args(args).output().ok()?;
    output.status.success().then_some(output.stdout)
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> RegistryResult<()> {
    let file = OpenOptions::new()
        .create(true)
        .truncate(true)
        .write(true)
        .open(path)?;
    serde_json::to_writer_pretty(file, value).map_err(RegistryError::from)
}
