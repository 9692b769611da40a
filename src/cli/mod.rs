//! CLI definition and handler

use anyhow::{bail, Context, Result};
use clap::Parser;
use dag_prognosis::config::{load_config_file, load_project_config};
use dag_prognosis::reporters::{self, OutputFormat};
use dag_prognosis::{
    AnalysisMode, AnalysisReport, ClassificationSets, DagSnapshot, Engine, EngineConfig,
    PerformanceMetrics, ProviderMapping,
};
use ignore::WalkBuilder;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Health analysis for Airflow DAG files
#[derive(Parser, Debug)]
#[command(name = "dag-prognosis")]
#[command(
    version,
    about = "Score Airflow DAG files for import hygiene, top-level side effects and task reliability",
    after_help = "\
Examples:
  dag-prognosis dags/                                 Analyze every DAG under dags/
  dag-prognosis dags/etl.py --format json             JSON output for scripting
  dag-prognosis dags/etl.py --dag-snapshot etl.json   Runtime prognosis from an exported DAG
  dag-prognosis dags/ --fail-under 60                 Exit code 1 if any file scores below 60"
)]
pub struct Cli {
    /// DAG files or folders (default: current directory)
    #[arg(default_value = ".")]
    pub paths: Vec<PathBuf>,

    /// Output format: text, json
    #[arg(long, short = 'f', value_parser = ["text", "json"])]
    pub format: Option<String>,

    /// Config file (default: dag-prognosis.toml or .dag-prognosis.json in the current directory)
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,

    /// Provider mapping file (TOML or JSON), replaces the built-in table
    #[arg(long)]
    pub provider_map: Option<PathBuf>,

    /// Exported DAG object (JSON) for runtime prognosis; needs exactly one path
    #[arg(long)]
    pub dag_snapshot: Option<PathBuf>,

    /// Profiling harness metrics (JSON); needs exactly one path
    #[arg(long)]
    pub metrics: Option<PathBuf>,

    /// Exit with code 1 if any file scores below this
    #[arg(long)]
    pub fail_under: Option<f64>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "warn", value_parser = ["error", "warn", "info", "debug", "trace"])]
    pub log_level: String,
}

fn load_config(cli: &Cli) -> Result<EngineConfig> {
    match &cli.config {
        Some(path) => load_config_file(path)
            .with_context(|| format!("Failed to load config {}", path.display())),
        None => Ok(load_project_config(Path::new("."))),
    }
}

fn load_providers(cli: &Cli, config: &EngineConfig) -> Result<ProviderMapping> {
    let mapping = match &cli.provider_map {
        Some(path) => ProviderMapping::load(path)?.with_overrides(&config.providers.overrides),
        None => ProviderMapping::from_config(config)?,
    };
    debug!("Using {} provider mappings", mapping.len());
    Ok(mapping)
}

/// Expand folders into the `.py` files under them, honouring .gitignore
fn collect_dag_files(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_file() {
            files.push(path.clone());
            continue;
        }
        if !path.is_dir() {
            bail!("Path not found: {}", path.display());
        }
        let mut found: Vec<PathBuf> = WalkBuilder::new(path)
            .hidden(true)
            .git_ignore(true)
            .build()
            .filter_map(|e| e.ok())
            .map(|e| e.into_path())
            .filter(|p| p.is_file() && p.extension().and_then(|e| e.to_str()) == Some("py"))
            .collect();
        found.sort();
        files.extend(found);
    }
    Ok(files)
}

pub fn run(cli: Cli) -> Result<()> {
    let config = load_config(&cli)?;
    let sets = ClassificationSets::from_config(&config);
    let providers = load_providers(&cli, &config)?;

    let format: OutputFormat = cli
        .format
        .as_deref()
        .or(config.defaults.format.as_deref())
        .unwrap_or("text")
        .parse()?;
    let fail_under = cli.fail_under.or(config.defaults.fail_under);

    let files = collect_dag_files(&cli.paths)?;
    if files.is_empty() {
        bail!("No DAG files found");
    }
    if (cli.dag_snapshot.is_some() || cli.metrics.is_some()) && files.len() != 1 {
        bail!(
            "--dag-snapshot and --metrics apply to a single DAG file, got {}",
            files.len()
        );
    }

    let snapshot = cli
        .dag_snapshot
        .as_deref()
        .map(DagSnapshot::load)
        .transpose()
        .context("Failed to load DAG snapshot")?;
    let metrics = cli
        .metrics
        .as_deref()
        .map(PerformanceMetrics::load)
        .transpose()
        .context("Failed to load performance metrics")?;

    info!("Analyzing {} DAG files", files.len());
    let engine = Engine::new(&sets, &providers);
    let reports: Vec<(String, AnalysisReport)> = files
        .par_iter()
        .map(|path| -> Result<(String, AnalysisReport)> {
            let source = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let mode = match &snapshot {
                Some(dag) => AnalysisMode::Runtime(dag),
                None => AnalysisMode::Static,
            };
            let report = engine
                .analyze_with_metrics(&source, mode, metrics.as_ref(), &config.performance)
                .with_context(|| format!("Failed to analyze {}", path.display()))?;
            Ok((path.display().to_string(), report))
        })
        .collect::<Result<_>>()?;

    let output = match reports.as_slice() {
        [(_, report)] => reporters::render(report, format)?,
        _ => reporters::render_many(&reports, format)?,
    };
    println!("{}", output);

    if let Some(threshold) = fail_under {
        let failing: Vec<&str> = reports
            .iter()
            .filter(|(_, report)| report.score < threshold)
            .map(|(path, _)| path.as_str())
            .collect();
        if !failing.is_empty() {
            eprintln!(
                "Failing due to --fail-under={}: {}",
                threshold,
                failing.join(", ")
            );
            std::process::exit(1);
        }
    }

    Ok(())
}
