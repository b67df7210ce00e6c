use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Parser;
use std::path::PathBuf;
use storm_ensemble_core::io::{parse_atcf_datetime, TrackProvider};
use storm_ensemble_core::{
    AtcfFileProvider, DateWindow, EnsembleConfig, EnsembleGenerator, EnsembleMode, Fort22Writer,
    PerturbedVariable,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Generate a perturbed track ensemble from an ATCF best track
#[derive(Parser, Debug)]
#[command(name = "make-storm-ensemble")]
#[command(about = "Tropical cyclone track ensemble generator", long_about = None)]
struct Args {
    /// Storm identifier, e.g. al062018
    storm: String,

    /// Number of members per perturbed variable
    #[arg(short = 'n', long, default_value_t = 10)]
    members: usize,

    /// First record time kept (YYYYMMDDHH or YYYY-MM-DDTHH:MM:SSZ)
    #[arg(long, value_parser = parse_time)]
    start: Option<DateTime<Utc>>,

    /// Last record time kept (YYYYMMDDHH or YYYY-MM-DDTHH:MM:SSZ)
    #[arg(long, value_parser = parse_time)]
    end: Option<DateTime<Utc>>,

    /// Variables to perturb (wind_speed, radius_of_maximum_winds, ...).
    /// Defaults to wind_speed unless only a pressure scale is requested
    #[arg(long, value_delimiter = ',')]
    variables: Vec<PerturbedVariable>,

    /// Also write central_pressure.22 with central pressure multiplied by
    /// this factor and wind rebalanced through Holland B
    #[arg(long, value_name = "ALPHA")]
    scale_central_pressure: Option<f64>,

    /// Directory holding b-deck files (b{storm}.dat)
    #[arg(long, default_value = ".")]
    data_dir: PathBuf,

    /// Directory receiving the ensemble
    #[arg(short, long, default_value = "ensemble")]
    output_dir: PathBuf,

    /// Seed for reproducible ensembles
    #[arg(long)]
    seed: Option<u64>,

    /// Perturb every variable in each member instead of one variable at a time
    #[arg(long)]
    joint: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn parse_time(value: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(time) = DateTime::parse_from_rfc3339(value) {
        return Ok(time.with_timezone(&Utc));
    }
    parse_atcf_datetime(value)
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let window = DateWindow::new(args.start, args.end);
    let provider = AtcfFileProvider::new(&args.data_dir);
    let track = provider
        .load(&args.storm, window)
        .with_context(|| format!("loading best track for {}", args.storm))?;

    let mode = if args.joint {
        EnsembleMode::Joint
    } else {
        EnsembleMode::PerVariable
    };
    let variables = if args.variables.is_empty() && args.scale_central_pressure.is_none() {
        vec![PerturbedVariable::MaxSustainedWindSpeed]
    } else {
        args.variables
    };
    let mut config = EnsembleConfig::new(args.members, variables).with_mode(mode);
    config.seed = args.seed;
    config.central_pressure_scale = args.scale_central_pressure;

    let writer = Fort22Writer::new(&args.output_dir)
        .with_context(|| format!("creating {}", args.output_dir.display()))?;
    let generator = EnsembleGenerator::new(&track).context("preparing base track")?;
    let report = generator
        .run(&config, &writer)
        .context("generating ensemble")?;

    let report_path = args.output_dir.join("ensemble.json");
    report
        .save(&report_path)
        .with_context(|| format!("saving {}", report_path.display()))?;

    info!(
        "Ensemble of {} members for {} written to {} (seed {})",
        report.outputs.len(),
        report.storm,
        args.output_dir.display(),
        report.seed
    );
    Ok(())
}
