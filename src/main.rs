use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use refugium_lib::experiment::{
    build_run_export, run_disturbance_grid_study, run_experiment, to_pretty_json, ExperimentInput,
    GridStudyInput,
};
use refugium_lib::model::metrics::{init_logging, RunMetrics};
use refugium_lib::{LifeSimulation, SimulationConfig};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Simulation config file (TOML); missing fields keep their defaults
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Write the JSON export here instead of stdout
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a single simulation and export its series and history
    Run {
        #[arg(long, default_value_t = 20_260_221)]
        seed: u64,
        #[arg(long, default_value_t = 200)]
        steps: usize,
        #[arg(long, default_value_t = 25)]
        window: usize,
        /// Log a progress line every N ticks
        #[arg(long, default_value_t = 25)]
        report_every: u64,
    },
    /// Sweep consecutive seeds over one configuration
    Experiment {
        /// Read the whole experiment from a TOML or JSON file instead of flags
        #[arg(long)]
        input: Option<PathBuf>,
        #[command(flatten)]
        sweep: SweepArgs,
    },
    /// Paired global-versus-local disturbance study over a parameter grid
    Grid {
        /// Read the whole study from a TOML or JSON file instead of flags
        #[arg(long)]
        input: Option<PathBuf>,
        #[command(flatten)]
        sweep: SweepArgs,
        #[arg(long, value_delimiter = ',')]
        intervals: Vec<u64>,
        #[arg(long, value_delimiter = ',')]
        amplitudes: Vec<f64>,
        #[arg(long, value_delimiter = ',', default_value = "0")]
        phases: Vec<f64>,
        #[arg(long, default_value_t = 2)]
        local_radius: u64,
        #[arg(long, default_value_t = 0.35)]
        local_refugia_fraction: f64,
    },
}

#[derive(Args, Debug)]
struct SweepArgs {
    #[arg(long, default_value_t = 8)]
    runs: usize,
    #[arg(long, default_value_t = 300)]
    steps: usize,
    #[arg(long, default_value_t = 25)]
    window: usize,
    #[arg(long, default_value_t = 1)]
    seed: u64,
    #[arg(long, default_value_t = 1)]
    seed_step: u64,
    /// Keep stepping after a run goes extinct
    #[arg(long)]
    keep_going: bool,
}

impl SweepArgs {
    fn experiment_input(&self, simulation: SimulationConfig) -> ExperimentInput {
        let mut input = ExperimentInput::new(self.runs, self.steps, self.window, self.seed);
        input.seed_step = self.seed_step;
        input.stop_when_extinct = !self.keep_going;
        input.simulation = simulation;
        input
    }
}

fn load_config(path: Option<&Path>) -> Result<SimulationConfig> {
    match path {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            SimulationConfig::from_toml(&content)
                .with_context(|| format!("invalid config in {}", path.display()))
        }
        None => Ok(SimulationConfig::default()),
    }
}

/// Reads a TOML or JSON document, picked by file extension.
fn load_document<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    if path.extension().is_some_and(|ext| ext == "json") {
        Ok(serde_json::from_str(&content)?)
    } else {
        Ok(toml::from_str(&content)?)
    }
}

fn emit(json: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
            tracing::info!(path = %path.display(), "Export written");
        }
        None => print!("{json}"),
    }
    Ok(())
}

fn run_single(config: SimulationConfig, seed: u64, steps: usize, window: usize, report_every: u64) -> Result<String> {
    let mut sim = LifeSimulation::new(seed, config)?;
    let metrics = RunMetrics::new(report_every);
    let mut summaries = Vec::with_capacity(steps);
    let mut analytics = Vec::with_capacity(steps);

    for _ in 0..steps {
        let events = sim.disturbance_events().len();
        let started = Instant::now();
        let summary = sim.step()?;
        metrics.record_step(&summary, started.elapsed());
        if sim.disturbance_events().len() > events {
            metrics.record_disturbance();
        }
        analytics.push(sim.analytics(window)?);
        let extinct = summary.population == 0;
        summaries.push(summary);
        if extinct {
            break;
        }
    }
    metrics.log_summary();

    let snapshot = sim.snapshot();
    tracing::info!(
        tick = snapshot.tick,
        population = snapshot.population,
        species = snapshot.active_species,
        clades = snapshot.active_clades,
        extinct_species = snapshot.extinct_species,
        extinct_clades = snapshot.extinct_clades,
        "Final state"
    );

    let series = refugium_lib::model::data::SimulationRunSeries {
        summaries,
        analytics,
    };
    let export = build_run_export(window, series, sim.history(), None)?;
    to_pretty_json(&export)
}

fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    let json = match cli.command {
        Command::Run {
            seed,
            steps,
            window,
            report_every,
        } => run_single(config, seed, steps, window, report_every)?,
        Command::Experiment { input, sweep } => {
            let input = match input {
                Some(path) => load_document::<ExperimentInput>(&path)?,
                None => sweep.experiment_input(config),
            };
            let export = run_experiment(&input)?;
            to_pretty_json(&export)?
        }
        Command::Grid {
            input: Some(path), ..
        } => {
            let input = load_document::<GridStudyInput>(&path)?;
            to_pretty_json(&run_disturbance_grid_study(&input)?)?
        }
        Command::Grid {
            input: None,
            sweep,
            intervals,
            amplitudes,
            phases,
            local_radius,
            local_refugia_fraction,
        } => {
            let mut input = GridStudyInput::new(sweep.runs, sweep.steps, sweep.window, sweep.seed);
            input.seed_step = sweep.seed_step;
            input.stop_when_extinct = !sweep.keep_going;
            input.intervals = intervals;
            input.amplitudes = amplitudes;
            input.phases = phases;
            input.local_radius = local_radius;
            input.local_refugia_fraction = local_refugia_fraction;
            input.simulation = config;
            let export = run_disturbance_grid_study(&input)?;
            to_pretty_json(&export)?
        }
    };

    emit(&json, cli.output.as_deref())
}
