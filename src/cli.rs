//! CLI definition and dispatch.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::config_validation::validate_config;
use crate::domain::error::FlowError;
use crate::domain::features::{FeatureTable, FEATURE_COLUMNS};
use crate::domain::grouping::GroupBy;
use crate::domain::pipeline::{
    group_trades, run_pipeline, PipelineConfig, DEFAULT_MODEL, DEFAULT_PREVIEW_ROWS,
    DEFAULT_SUFFIX,
};
use crate::ports::config_port::ConfigPort;
use crate::ports::feature_sink::FeatureSink;

#[derive(Parser, Debug)]
#[command(name = "flowtrader", about = "Options order-flow feature builder")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Build the feature table from the export directory
    Train {
        #[command(flatten)]
        args: RunArgs,
    },
    /// List group keys with their trade counts
    Groups {
        #[command(flatten)]
        data: DataArgs,
    },
}

#[derive(Args, Debug, Clone, Default)]
pub struct DataArgs {
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    #[arg(short, long)]
    pub data_dir: Option<PathBuf>,
    #[arg(long)]
    pub suffix: Option<String>,
    #[arg(short, long)]
    pub group_by: Option<String>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct RunArgs {
    #[command(flatten)]
    pub data: DataArgs,
    /// Model family (reported only)
    #[arg(short, long)]
    pub model: Option<String>,
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

pub fn run(cli: Cli) -> ExitCode {
    let result = match cli.command {
        Command::Train { args } => run_train(&args),
        Command::Groups { data } => run_groups(&RunArgs {
            data,
            ..RunArgs::default()
        }),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

pub fn load_config(path: &PathBuf) -> Result<FileConfigAdapter, FlowError> {
    FileConfigAdapter::from_file(path).map_err(|e| FlowError::ConfigParse {
        file: path.display().to_string(),
        reason: e.to_string(),
    })
}

/// Merge the optional config file with CLI overrides. CLI values win.
pub fn build_pipeline_config(
    config: Option<&dyn ConfigPort>,
    args: &RunArgs,
) -> Result<PipelineConfig, FlowError> {
    let lookup = |section: &str, key: &str| config.and_then(|c| c.get_string(section, key));

    let data_dir = args
        .data
        .data_dir
        .clone()
        .or_else(|| lookup("data", "dir").map(PathBuf::from))
        .ok_or_else(|| FlowError::ConfigMissing {
            section: "data".into(),
            key: "dir".into(),
        })?;

    let suffix = args
        .data
        .suffix
        .clone()
        .or_else(|| lookup("data", "suffix"))
        .unwrap_or_else(|| DEFAULT_SUFFIX.to_string());

    let group_by = match args
        .data
        .group_by
        .clone()
        .or_else(|| lookup("features", "group_by"))
    {
        Some(s) => s.parse::<GroupBy>().map_err(|reason| FlowError::ConfigInvalid {
            section: "features".into(),
            key: "group_by".into(),
            reason,
        })?,
        None => GroupBy::default(),
    };

    let output_dir = args
        .output
        .clone()
        .or_else(|| lookup("output", "dir").map(PathBuf::from));

    let preview_rows = config
        .map(|c| c.get_int("output", "preview_rows", DEFAULT_PREVIEW_ROWS as i64))
        .unwrap_or(DEFAULT_PREVIEW_ROWS as i64);
    let preview_rows = usize::try_from(preview_rows).map_err(|_| FlowError::ConfigInvalid {
        section: "output".into(),
        key: "preview_rows".into(),
        reason: "preview_rows must be non-negative".into(),
    })?;

    let model = args
        .model
        .clone()
        .or_else(|| lookup("train", "model"))
        .unwrap_or_else(|| DEFAULT_MODEL.to_string());

    Ok(PipelineConfig {
        data_dir,
        suffix,
        group_by,
        output_dir,
        preview_rows,
        model,
    })
}

fn resolve_config(args: &RunArgs) -> Result<PipelineConfig, FlowError> {
    match &args.data.config {
        Some(path) => {
            eprintln!("Loading config from {}", path.display());
            let adapter = load_config(path)?;
            validate_config(&adapter)?;
            build_pipeline_config(Some(&adapter), args)
        }
        None => build_pipeline_config(None, args),
    }
}

fn run_train(args: &RunArgs) -> Result<(), FlowError> {
    let config = resolve_config(args)?;
    eprintln!("Model: {} (training not implemented)", config.model);
    eprintln!(
        "Loading {} files from {}",
        config.suffix,
        config.data_dir.display()
    );

    let start = Instant::now();
    let source = CsvAdapter::new(config.data_dir.clone(), config.suffix.clone());
    let output = run_pipeline(&source, config.group_by)?;
    let runtime = start.elapsed();

    eprintln!("Runtime: {:.2}s", runtime.as_secs_f64());
    eprintln!(
        "{} trades in {} groups (by {})",
        output.trade_count,
        output.groups.len(),
        config.group_by
    );

    if let Some(dir) = &config.output_dir {
        CsvReportAdapter::new(dir.clone()).write(&output.features, &output.meta)?;
        eprintln!("Features written to: {}", dir.display());
    }

    print!("{}", render_preview(&output.features, config.preview_rows));
    Ok(())
}

fn run_groups(args: &RunArgs) -> Result<(), FlowError> {
    let config = resolve_config(args)?;
    let source = CsvAdapter::new(config.data_dir.clone(), config.suffix.clone());
    let (trade_count, groups) = group_trades(&source, config.group_by)?;

    for (key, trades) in &groups {
        println!("{}\t{}", key, trades.len());
    }
    eprintln!("{} groups, {} trades", groups.len(), trade_count);
    Ok(())
}

/// First `rows` rows of the table as aligned text, headed by the column names.
pub fn render_preview(table: &FeatureTable, rows: usize) -> String {
    if rows == 0 {
        return String::new();
    }

    let header: Vec<String> = std::iter::once("key")
        .chain(FEATURE_COLUMNS)
        .map(str::to_string)
        .collect();
    let body: Vec<Vec<String>> = table
        .rows
        .iter()
        .take(rows)
        .map(|r| std::iter::once(r.key.clone()).chain(r.features.values()).collect())
        .collect();

    let mut widths: Vec<usize> = header.iter().map(String::len).collect();
    for line in &body {
        for (width, cell) in widths.iter_mut().zip(line) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    for line in std::iter::once(&header).chain(&body) {
        let cells: Vec<String> = line
            .iter()
            .zip(&widths)
            .map(|(cell, &width)| format!("{cell:<width$}"))
            .collect();
        out.push_str(cells.join("  ").trim_end());
        out.push('\n');
    }
    out
}
