use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args as ClapArgs, Parser, Subcommand};
use color_eyre::eyre::eyre;
use revsim::init_logging;
use revsim::provider::{HazardRatioFile, YamlHazardRatioSource};
use revsim::report::{metric_table, to_json};
use revsim::run_file::{Overrides, RunFile, parse_prevalence};
use revsim_core::registry::{DefaultSource, HazardRatioRegistry, HazardRatioSource};
use revsim_core::scenario::ScenarioComparator;
use revsim_core::simulation::SimulationEngine;
use revsim_core::summary::SummaryMetric;

#[derive(Parser, Debug)]
#[command(name = "revsim")]
#[command(about = "Monte Carlo estimate of implant revision rates against regulatory thresholds")]
struct Args {
    /// YAML run file; command-line values override it
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// YAML hazard-ratio table (default: built-in table)
    #[arg(long, global = true)]
    hazard_ratios: Option<PathBuf>,

    /// Log level (debug, info, warn, error)
    #[arg(short, long, default_value = "warn", global = true)]
    log_level: String,

    /// Write logs to `revsim.log` in this directory instead of stderr
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pretty: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Simulate one cohort and print its summary
    Run(CohortArgs),
    /// Simulate every scenario in the run file and compare against the first
    Compare {
        #[command(flatten)]
        cohort: CohortArgs,

        /// Print a table of this metric instead of JSON (mean, median, p5, p95, std, probability_pass)
        #[arg(short, long)]
        metric: Option<String>,
    },
    /// Print the hazard-ratio table in use
    HazardRatios {
        /// Emit YAML suitable for `--hazard-ratios`
        #[arg(long)]
        yaml: bool,
    },
}

#[derive(ClapArgs, Debug)]
struct CohortArgs {
    /// Number of synthetic patients
    #[arg(short = 'n', long)]
    patients: Option<usize>,

    /// Monte Carlo iterations
    #[arg(short, long)]
    iterations: Option<usize>,

    /// Threshold key (fda_510k, mdr_pmcf, registry_parity)
    #[arg(short, long)]
    threshold: Option<String>,

    /// Random seed; a random one is drawn and reported when omitted
    #[arg(short, long)]
    seed: Option<u64>,

    /// Prevalence override, repeatable (e.g. `-p diabetes=0.2`)
    #[arg(short, long = "prevalence", value_parser = parse_prevalence)]
    prevalence: Vec<(String, f64)>,
}

impl From<CohortArgs> for Overrides {
    fn from(args: CohortArgs) -> Self {
        Self {
            n_patients: args.patients,
            n_iterations: args.iterations,
            threshold_key: args.threshold,
            seed: args.seed,
            prevalence: args.prevalence,
        }
    }
}

fn load_registry(path: Option<PathBuf>) -> color_eyre::Result<HazardRatioRegistry> {
    let source: Box<dyn HazardRatioSource> = match path {
        Some(path) => Box::new(YamlHazardRatioSource::new(path)),
        None => Box::new(DefaultSource),
    };
    Ok(HazardRatioRegistry::load(source.as_ref())?)
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let args = Args::parse();
    init_logging(args.log_dir.as_deref(), &args.log_level)?;

    let mut run_file = RunFile::load_or_default(args.config.as_deref())?;
    let registry = Arc::new(load_registry(args.hazard_ratios)?);

    let output = match args.command {
        Command::HazardRatios { yaml } => {
            let file = HazardRatioFile {
                hazard_ratios: registry.specs().cloned().collect(),
            };
            if yaml {
                file.to_yaml()
                    .map_err(|e| eyre!("failed to serialize hazard ratios: {e}"))?
            } else {
                to_json(&file, args.pretty)?
            }
        }
        Command::Run(cohort) => {
            run_file.apply(&cohort.into());
            let engine = SimulationEngine::new(registry, run_file.engine.clone())?;
            let report = engine.simulate_request(&run_file.simulation_request())?;
            tracing::info!(
                verdict = %report.summary.verdict,
                probability_pass = report.summary.probability_pass,
                seed = report.summary.seed,
                "run complete"
            );
            to_json(&report, args.pretty)?
        }
        Command::Compare { cohort, metric } => {
            let metric = metric
                .as_deref()
                .map(str::parse::<SummaryMetric>)
                .transpose()?;
            run_file.apply(&cohort.into());
            let engine = SimulationEngine::new(registry, run_file.engine.clone())?;
            let comparisons =
                ScenarioComparator::new(&engine).compare_request(&run_file.comparison_request())?;
            match metric {
                Some(metric) => metric_table(&comparisons, metric),
                None => to_json(&comparisons, args.pretty)?,
            }
        }
    };

    println!("{}", output.trim_end());
    Ok(())
}
