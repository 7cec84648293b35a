use std::collections::HashMap;
use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{ArgGroup, Parser, ValueEnum, error::ErrorKind};

use crate::config::{InsufficientPolicy, ShotConfig};
use crate::constants::sampler::{DEFAULT_REPLICATES, DEFAULT_SEED};
use crate::constants::strategy::FEW;
use crate::constants::tasks::task_group;
use crate::metrics::class_balance;
use crate::orchestrator::{BatchSummary, ReplicateOrchestrator};
use crate::sampler::ShotSet;
use crate::source::{FileLabelStore, LabelSource};
use crate::splits::{SplitAssignments, SplitLabel};
use crate::strategy::StrategyTable;
use crate::types::LabelingFunctionId;
use crate::writer::JsonShotWriter;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SplitArg {
    Train,
    Val,
    Test,
}

impl From<SplitArg> for SplitLabel {
    fn from(value: SplitArg) -> Self {
        match value {
            SplitArg::Train => SplitLabel::Train,
            SplitArg::Val => SplitLabel::Validation,
            SplitArg::Test => SplitLabel::Test,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum InsufficientArg {
    WritePartial,
    SkipEmptyClass,
    SkipShort,
}

impl From<InsufficientArg> for InsufficientPolicy {
    fn from(value: InsufficientArg) -> Self {
        match value {
            InsufficientArg::WritePartial => InsufficientPolicy::WritePartial,
            InsufficientArg::SkipEmptyClass => InsufficientPolicy::SkipEmptyClass,
            InsufficientArg::SkipShort => InsufficientPolicy::SkipShort,
        }
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "make_shots",
    disable_help_subcommand = true,
    about = "Generate deterministic few-shot support sets",
    long_about = "Sample per-class shot sets for each labeling function, strategy, and replicate, and write them as JSON.",
    after_help = "Re-running with identical arguments reproduces identical shot sets and overwrites prior output.",
    group(ArgGroup::new("tasks").required(true).args(["labeling_functions", "all"]))
)]
/// CLI for `make_shots`.
///
/// Common usage:
/// - One task, default strategy: `--labeling-function guo_readmission`
/// - Every task under the data root: `--all`
/// - Several strategies: `--strategy few --strategy all`
struct MakeShotsCli {
    #[arg(
        long = "labeling-function",
        value_name = "NAME",
        help = "Labeling function to sample, repeat as needed"
    )]
    labeling_functions: Vec<LabelingFunctionId>,
    #[arg(long, help = "Sample every labeling function found under the data root")]
    all: bool,
    #[arg(
        long = "strategy",
        value_name = "NAME",
        help = "Shot strategy to sample, repeat as needed (default: few)"
    )]
    strategies: Vec<String>,
    #[arg(
        long,
        default_value_t = DEFAULT_REPLICATES,
        value_parser = parse_positive_usize,
        help = "Replicates per strategy and shot count"
    )]
    replicates: usize,
    #[arg(long = "data-root", value_name = "PATH", help = "Directory holding one folder per labeling function")]
    data_root: PathBuf,
    #[arg(long, value_name = "PATH", help = "Directory shot sets are written to")]
    output: PathBuf,
    #[arg(
        long = "splits-csv",
        value_name = "PATH",
        help = "Companion patient_id,split mapping for artifacts without a split column"
    )]
    splits_csv: Option<PathBuf>,
    #[arg(long, default_value_t = DEFAULT_SEED, help = "Base seed mixed into every draw")]
    seed: u64,
    #[arg(long, default_value_t = 0, help = "Worker threads (0 = all available CPUs)")]
    threads: usize,
    #[arg(
        long = "insufficient-policy",
        value_enum,
        default_value = "write-partial",
        help = "What to do with shot sets that fall short of their target"
    )]
    insufficient: InsufficientArg,
    #[arg(
        long = "strategy-table",
        value_name = "JSON",
        help = "Replace the built-in strategy table"
    )]
    strategy_table: Option<PathBuf>,
    #[arg(
        long = "passthrough-split",
        value_enum,
        help = "Split copied whole regardless of strategy, repeat as needed"
    )]
    passthrough_splits: Vec<SplitArg>,
    #[arg(
        long = "numeric-threshold",
        value_name = "LF=VALUE",
        value_parser = parse_threshold_arg,
        help = "Binarize numeric labels of a labeling function, repeat as needed"
    )]
    numeric_thresholds: Vec<(LabelingFunctionId, f64)>,
}

/// Parse arguments, generate shot sets, and print a summary.
///
/// Returns `Ok(true)` when every labeling function ran and every write
/// succeeded, `Ok(false)` when something failed but was reported.
pub fn run_make_shots<I>(args_iter: I) -> Result<bool, Box<dyn Error>>
where
    I: Iterator<Item = String>,
{
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .try_init();

    let Some(cli) =
        parse_cli::<MakeShotsCli, _>(std::iter::once("make_shots".to_string()).chain(args_iter))?
    else {
        return Ok(true);
    };

    let strategies = if cli.strategies.is_empty() {
        vec![FEW.to_string()]
    } else {
        cli.strategies.clone()
    };
    let config = ShotConfig {
        seed: cli.seed,
        replicates: cli.replicates,
        num_threads: cli.threads,
        insufficient: cli.insufficient.into(),
        strategies: match &cli.strategy_table {
            Some(path) => StrategyTable::from_json_file(path)?,
            None => StrategyTable::default(),
        },
        passthrough_splits: cli.passthrough_splits.iter().map(|&s| s.into()).collect(),
        numeric_thresholds: cli.numeric_thresholds.iter().cloned().collect::<HashMap<_, _>>(),
    };
    for name in &strategies {
        config.strategies.resolve(name)?;
    }

    let mut store =
        FileLabelStore::new(&cli.data_root).with_numeric_thresholds(config.numeric_thresholds.clone());
    if let Some(path) = &cli.splits_csv {
        store = store.with_split_store(Arc::new(SplitAssignments::from_csv(path)?));
    }
    let labeling_functions = if cli.all {
        store.labeling_functions()?
    } else {
        cli.labeling_functions.clone()
    };
    if labeling_functions.is_empty() {
        return Err(format!("no labeling functions found under {}", cli.data_root.display()).into());
    }

    let writer = Arc::new(JsonShotWriter::new(&cli.output));
    let orchestrator = ReplicateOrchestrator::new(config, Arc::new(store), writer.clone())?;
    let summary = orchestrator.run_many(&labeling_functions, &strategies);
    print_summary(&summary, &writer);
    Ok(!summary.has_failures())
}

fn print_summary(summary: &BatchSummary, writer: &JsonShotWriter) {
    println!("=== shot generation summary ===");
    println!("output root: {}", writer.root().display());
    for report in &summary.reports {
        let group = task_group(&report.labeling_function).unwrap_or("custom");
        println!(
            "[{} / {}] group={} written={} skipped={} failed={} partial_replicates={}/{}",
            report.labeling_function,
            report.strategy,
            group,
            report.written.len(),
            report.skipped.len(),
            report.failed.len(),
            report.partial_replicates,
            report.replicates
        );
        if let Some(first) = report.written.first()
            && let Ok(raw) = std::fs::read(writer.path_for(first))
            && let Ok(shot_set) = serde_json::from_slice::<ShotSet>(&raw)
            && let Some(balance) = class_balance(&shot_set)
        {
            println!(
                "  {}: {} examples over {} classes (min {}, max {})",
                first, balance.total, balance.classes, balance.min, balance.max
            );
        }
    }
    for report in &summary.reports {
        for warning in &report.warnings {
            eprintln!(
                "warning: {} / {}: class '{}' in {} short in {} shot sets (available {})",
                report.labeling_function,
                report.strategy,
                warning.class,
                warning.split,
                warning.occurrences,
                warning.available
            );
        }
        for failure in &report.failed {
            eprintln!("error: {}: {}", failure.key, failure.error);
        }
        if let Some(err) = &report.manifest_error {
            eprintln!("error: {}", err);
        }
    }
    for (labeling_function, err) in &summary.aborted {
        eprintln!("error: {labeling_function}: {err}");
    }
}

fn parse_positive_usize(raw: &str) -> Result<usize, String> {
    let parsed = raw
        .parse::<usize>()
        .map_err(|_| format!("Could not parse '{raw}' as a positive integer"))?;
    if parsed == 0 {
        return Err("value must be greater than zero".to_string());
    }
    Ok(parsed)
}

fn parse_threshold_arg(raw: &str) -> Result<(LabelingFunctionId, f64), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("--numeric-threshold expects LF=VALUE, got '{raw}'"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err("--numeric-threshold needs a labeling function name".to_string());
    }
    let value = value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .ok_or_else(|| format!("invalid threshold '{}': must be a finite number", value.trim()))?;
    Ok((name.to_string(), value))
}

fn parse_cli<T, I>(args: I) -> Result<Option<T>, Box<dyn Error>>
where
    T: Parser,
    I: IntoIterator,
    I::Item: Into<std::ffi::OsString> + Clone,
{
    match T::try_parse_from(args) {
        Ok(cli) => Ok(Some(cli)),
        Err(err) => match err.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                err.print()?;
                Ok(None)
            }
            _ => Err(err.into()),
        },
    }
}
