//! heatload CLI: full report, single-preset evaluation and preset listing.

use std::path::{Path, PathBuf};
use std::process;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use comfy_table::{Cell, Table};

use heatload::report::{self, ReportFormat};
use heatload::{Analysis, AnalysisConfig, CsvDataLoader, DataLoader, Dataset, Evaluator, ModelDirector, Partition};

#[derive(Parser)]
#[command(name = "heatload", version, about = "Heating-load regression analysis")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate every report preset and run the diagnostics
    Report {
        /// CSV file with the building data
        #[arg(long)]
        data: PathBuf,

        /// TOML config file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Override the partition seed
        #[arg(long)]
        seed: Option<u64>,

        /// Output format: text or json
        #[arg(long, default_value = "text")]
        format: String,

        /// Write the report here instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Evaluate one preset on the train/test partition
    Evaluate {
        /// CSV file with the building data
        #[arg(long)]
        data: PathBuf,

        /// Preset name (see `heatload presets`)
        #[arg(long)]
        preset: String,

        /// TOML config file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Override the partition seed
        #[arg(long)]
        seed: Option<u64>,

        /// Method hyperparameter, e.g. alpha=0.5 or max_depth=4 (repeatable)
        #[arg(long = "param", value_name = "KEY=VALUE")]
        params: Vec<String>,

        /// Output format: text or json
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// List the available presets
    Presets,
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("heatload=info".parse().expect("static directive")),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Report {
            data,
            config,
            seed,
            format,
            output,
        } => run_report(&data, config.as_deref(), seed, &format, output.as_deref()),
        Commands::Evaluate {
            data,
            preset,
            config,
            seed,
            params,
            format,
        } => run_evaluate(&data, &preset, config.as_deref(), seed, &params, &format),
        Commands::Presets => run_presets(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

fn load_inputs(data: &Path, config: Option<&Path>, seed: Option<u64>) -> Result<(AnalysisConfig, Dataset)> {
    let mut config = AnalysisConfig::load(config).context("failed to load config")?;
    if let Some(seed) = seed {
        config.seed = seed;
    }
    let dataset = CsvDataLoader::new(config.index_columns)
        .load_path(data)
        .with_context(|| format!("failed to load {}", data.display()))?;
    Ok((config, dataset))
}

fn run_report(
    data: &Path,
    config: Option<&Path>,
    seed: Option<u64>,
    format: &str,
    output: Option<&Path>,
) -> Result<()> {
    let format: ReportFormat = format.parse()?;
    let (config, dataset) = load_inputs(data, config, seed)?;
    let analysis = Analysis::new(config);
    let report = analysis.run(&dataset)?;

    let rendered = match format {
        ReportFormat::Text => report::render_report(&report),
        ReportFormat::Json => report::to_json(&report)?,
    };
    match output {
        Some(path) => {
            std::fs::write(path, rendered).with_context(|| format!("failed to write {}", path.display()))?;
            tracing::info!(path = %path.display(), "report written");
        }
        None => print!("{rendered}"),
    }
    Ok(())
}

fn run_evaluate(
    data: &Path,
    preset: &str,
    config: Option<&Path>,
    seed: Option<u64>,
    params: &[String],
    format: &str,
) -> Result<()> {
    let format: ReportFormat = format.parse()?;
    let (config, dataset) = load_inputs(data, config, seed)?;
    config.validate()?;

    let mut spec = ModelDirector::preset(preset, &config)?;
    for param in params {
        let (key, value) = param
            .split_once('=')
            .ok_or_else(|| anyhow!("parameter '{param}' is not KEY=VALUE"))?;
        spec.method.set_param(key.trim(), value.trim())?;
    }
    spec.validate()?;

    let partition = Partition::split(dataset.len(), config.train_fraction, config.seed)?;
    let evaluation = Evaluator::evaluate(&dataset, &partition, &spec)
        .with_context(|| format!("preset '{}' failed", spec.name))?;

    match format {
        ReportFormat::Text => print!("{}", report::render_evaluation(&spec.formula(), &evaluation)),
        ReportFormat::Json => println!("{}", report::to_json(&evaluation)?),
    }
    Ok(())
}

fn run_presets() -> Result<()> {
    let mut table = Table::new();
    table.set_header(vec!["Preset", "Method", "In report", "Description"]);
    for preset in ModelDirector::available_presets() {
        table.add_row(vec![
            Cell::new(preset.name),
            Cell::new(preset.method),
            Cell::new(if preset.in_report { "yes" } else { "no" }),
            Cell::new(preset.description),
        ]);
    }
    println!("{table}");
    Ok(())
}
