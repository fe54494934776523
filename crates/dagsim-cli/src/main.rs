mod registry;

use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{Args, Parser, Subcommand};
use dagsim_core::Error as CoreError;
use dagsim_export::dot::write_dot;
use dagsim_export::{ExportError, LocalSink, TableFormat, TableSink};
use dagsim_model::{
    ModelError, ModelSpec, load_model, load_model_value, model_json_schema, validate_model,
    validate_model_json,
};
use registry::{
    LogTarget, RunContext, RunOptions, RunSummary, init_logging, start_run, write_summary,
};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
enum CliError {
    #[error("registry error: {0}")]
    Registry(#[from] registry::RegistryError),
    #[error("model error: {0}")]
    Model(#[from] ModelError),
    #[error("simulation error: {0}")]
    Simulation(#[from] CoreError),
    #[error("export error: {0}")]
    Export(#[from] ExportError),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("model has {0} validation error(s)")]
    ValidationFailed(usize),
}

#[derive(Parser, Debug)]
#[command(name = "dagsim", version, about = "Simulate tabular data from causal graphs")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Simulate a model into a new run directory.
    Simulate(SimulateArgs),
    /// Print the model's formulas and distributions.
    Describe(ModelArgs),
    /// Render the model graph as Graphviz DOT.
    Dot(DotArgs),
    /// Check a model document and report every issue.
    Validate(ModelArgs),
    /// Print the JSON Schema for model documents.
    Schema,
}

#[derive(Args, Debug)]
struct ModelArgs {
    /// Model document (.toml or .json).
    #[arg(long, value_name = "FILE")]
    model: PathBuf,
}

#[derive(Args, Debug)]
struct SimulateArgs {
    #[command(flatten)]
    model: ModelArgs,
    /// Number of rows; overrides the model's `rows`.
    #[arg(long)]
    rows: Option<usize>,
    /// Model seed; overrides the model's `seed`.
    #[arg(long)]
    seed: Option<u64>,
    /// Output encoding: csv or json.
    #[arg(long, default_value = "csv")]
    format: TableFormat,
    /// Output directory for runs.
    #[arg(long, default_value = "runs")]
    run_dir: PathBuf,
    /// Optional extra copy of the data file.
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct DotArgs {
    #[command(flatten)]
    model: ModelArgs,
    /// Write to a file instead of stdout.
    #[arg(long)]
    out: Option<PathBuf>,
}

fn main() -> Result<(), CliError> {
    let cli = Cli::parse();

    if !matches!(cli.command, Command::Simulate(_)) {
        init_logging(LogTarget::Stderr)?;
    }

    match cli.command {
        Command::Simulate(args) => run_simulate(args),
        Command::Describe(args) => run_describe(args),
        Command::Dot(args) => run_dot(args),
        Command::Validate(args) => run_validate(args),
        Command::Schema => run_schema(),
    }
}

fn run_simulate(args: SimulateArgs) -> Result<(), CliError> {
    let SimulateArgs {
        model,
        rows,
        seed,
        format,
        run_dir,
        out,
    } = args;

    let mut spec = load_model(&model.model)?;
    if seed.is_some() {
        spec.seed = seed;
    }
    let rows = rows.or(spec.rows).ok_or_else(|| {
        CliError::InvalidConfig("row count missing: pass --rows or set `rows` in the model".to_string())
    })?;

    let mut built = spec.build()?;

    let run_id = Uuid::new_v4().to_string();
    let started_at = chrono::Utc::now();
    let run_ctx = RunContext {
        run_id: run_id.clone(),
        started_at,
        run_dir,
        options: RunOptions {
            model_path: model.model.clone(),
            model_name: spec.name.clone(),
            rows,
            seed: spec.seed,
            format: format.to_string(),
        },
    };

    let run_paths = start_run(&run_ctx)?;
    init_logging(LogTarget::RunFile(&run_paths.logs_path))?;

    tracing::info!(event = "run_started", run_id = %run_id, model = %model.model.display());
    tracing::info!(event = "model_built", nodes = built.dag.len(), edges = built.dag.edge_count());

    let timer = Instant::now();

    let table = built.simulate(rows)?;
    tracing::info!(event = "simulation_finished", rows = table.n_rows(), columns = table.n_columns());

    let data_name = format!("data.{}", format.extension());
    let mut outputs = vec![LocalSink::new(&run_paths.root).write_table(&data_name, &table, format)?];
    if let Some(out) = out.as_deref() {
        let (root, name) = split_out_path(out)?;
        outputs.push(LocalSink::new(root).write_table(&name, &table, format)?);
    }
    for receipt in &outputs {
        tracing::info!(event = "table_written", path = %receipt.location.display(), bytes = receipt.bytes_written);
    }

    let duration_ms = timer.elapsed().as_millis() as u64;
    let summary = RunSummary {
        run_id,
        finished_at: chrono::Utc::now().to_rfc3339(),
        duration_ms,
        rows: table.n_rows(),
        columns: table.summary(),
        outputs,
    };
    write_summary(&run_paths, &summary)?;
    tracing::info!(event = "summary_written", path = %run_paths.summary_path.display());

    println!("{}", run_paths.root.display());
    tracing::info!(event = "run_finished", status = "success", duration_ms = duration_ms);

    Ok(())
}

fn run_describe(args: ModelArgs) -> Result<(), CliError> {
    let built = load_model(&args.model)?.build()?;
    if let Some(name) = &built.name {
        println!("# {name}");
    }
    println!("{}", built.dag);
    Ok(())
}

fn run_dot(args: DotArgs) -> Result<(), CliError> {
    let built = load_model(&args.model.model)?.build()?;
    match args.out {
        Some(out) => {
            write_dot(&out, &built.dag)?;
        }
        None => print!("{}", built.dag.to_dot()),
    }
    Ok(())
}

fn run_validate(args: ModelArgs) -> Result<(), CliError> {
    let value = load_model_value(&args.model)?;
    let schema = serde_json::to_value(model_json_schema())?;
    let mut report = validate_model_json(&value, &schema)?;

    if report.is_ok() {
        let spec: ModelSpec = serde_json::from_value(value)?;
        report.merge(validate_model(&spec));
    }

    for issue in report.errors.iter().chain(&report.warnings) {
        println!("{issue}");
    }
    if !report.is_ok() {
        return Err(CliError::ValidationFailed(report.errors.len()));
    }
    println!(
        "{}: ok ({} warning(s))",
        args.model.display(),
        report.warnings.len()
    );
    Ok(())
}

fn run_schema() -> Result<(), CliError> {
    let schema = model_json_schema();
    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(())
}

fn split_out_path(out: &Path) -> Result<(PathBuf, String), CliError> {
    let name = out
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .ok_or_else(|| CliError::InvalidConfig(format!("invalid --out path: {}", out.display())))?;
    let root = match out.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    Ok((root, name))
}
