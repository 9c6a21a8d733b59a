//! Seed sweeps: the same configuration run under consecutive seeds.

use crate::aggregate::{clamp_unit, summarize, NumericAggregate};
use anyhow::{ensure, Context, Result};
use rayon::prelude::*;
use refugium_core::{resilience_stability_index, LifeSimulation, SimulationConfig};
use refugium_data::{AgentSeed, EvolutionAnalyticsSnapshot, ResilienceAnalytics, StepSummary};
use serde::{Deserialize, Serialize};

fn default_seed_step() -> u64 {
    1
}

fn default_stop_when_extinct() -> bool {
    true
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
/// Parameters of a seed sweep.
pub struct ExperimentInput {
    pub runs: usize,
    pub steps: usize,
    pub analytics_window: usize,
    pub seed: u64,
    #[serde(default = "default_seed_step")]
    pub seed_step: u64,
    #[serde(default = "default_stop_when_extinct")]
    pub stop_when_extinct: bool,
    #[serde(default)]
    pub simulation: SimulationConfig,
    /// Replaces the random founders of every run when present.
    #[serde(default)]
    pub seed_agents: Option<Vec<AgentSeed>>,
    /// Pins the export timestamp; the current time is used otherwise.
    #[serde(default)]
    pub generated_at: Option<String>,
}

impl ExperimentInput {
    #[must_use]
    pub fn new(runs: usize, steps: usize, analytics_window: usize, seed: u64) -> Self {
        Self {
            runs,
            steps,
            analytics_window,
            seed,
            seed_step: default_seed_step(),
            stop_when_extinct: default_stop_when_extinct(),
            simulation: SimulationConfig::default(),
            seed_agents: None,
            generated_at: None,
        }
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(self.runs > 0, "runs must be > 0");
        ensure!(self.steps > 0, "steps must be > 0");
        ensure!(self.analytics_window > 0, "analyticsWindow must be > 0");
        ensure!(self.seed_step > 0, "seedStep must be > 0");
        self.simulation
            .validate()
            .context("invalid simulation config")?;
        Ok(())
    }

    /// Seed of the zero-based `run`.
    pub fn seed_for(&self, run: usize) -> Result<u64> {
        (run as u64)
            .checked_mul(self.seed_step)
            .and_then(|offset| self.seed.checked_add(offset))
            .with_context(|| format!("seed overflow for run {}", run + 1))
    }

    pub(crate) fn config_echo(&self) -> ExperimentConfig {
        ExperimentConfig {
            runs: self.runs,
            steps: self.steps,
            analytics_window: self.analytics_window,
            seed: self.seed,
            seed_step: self.seed_step,
            stop_when_extinct: self.stop_when_extinct,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
/// Normalized sweep parameters echoed into the export.
pub struct ExperimentConfig {
    pub runs: usize,
    pub steps: usize,
    pub analytics_window: usize,
    pub seed: u64,
    pub seed_step: u64,
    pub stop_when_extinct: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
/// Outcome of a single run of a sweep.
pub struct ExperimentRunSummary {
    /// 1-based run number.
    pub run: usize,
    pub seed: u64,
    pub steps_executed: usize,
    pub extinct: bool,
    pub final_resilience_stability_index: f64,
    pub final_resilience_memory_stability_index: f64,
    pub final_resilience_relapse_event_fraction: f64,
    pub final_summary: StepSummary,
    pub final_analytics: EvolutionAnalyticsSnapshot,
}

impl ExperimentRunSummary {
    /// Recovery lag of the latest event; unrecovered events count as one
    /// tick longer than the run.
    #[must_use]
    pub fn comparable_latest_recovery_lag(&self) -> f64 {
        let lag = self.final_analytics.resilience.latest_event_recovery_lag_ticks;
        if lag < 0 {
            (self.steps_executed + 1) as f64
        } else {
            lag as f64
        }
    }

    /// Mean recovery lag over every event, penalized by the share of events
    /// that never recovered.
    #[must_use]
    pub fn comparable_memory_recovery_lag(&self) -> f64 {
        let resilience = &self.final_analytics.resilience;
        let lag = resilience.memory_recovery_lag_ticks_mean.max(0.0);
        let recovered = clamp_unit(resilience.memory_recovered_event_fraction);
        lag + (1.0 - recovered) * (self.steps_executed + 1) as f64
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ExperimentAggregateSummary {
    pub runs: usize,
    pub extinct_runs: usize,
    pub extinction_rate: f64,
    pub steps_executed: NumericAggregate,
    pub final_population: NumericAggregate,
    pub final_mean_energy: NumericAggregate,
    pub final_active_clades: NumericAggregate,
    pub final_active_species: NumericAggregate,
    pub final_dominant_species_share: NumericAggregate,
    pub final_species_speciation_rate: NumericAggregate,
    pub final_species_extinction_rate: NumericAggregate,
    pub final_species_net_diversification_rate: NumericAggregate,
    pub final_resilience_stability_index: NumericAggregate,
    pub final_resilience_memory_stability_index: NumericAggregate,
    pub final_resilience_relapse_event_fraction: NumericAggregate,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExperimentExport {
    pub generated_at: String,
    pub config: ExperimentConfig,
    /// Hex SHA-256 of the simulation configuration shared by every run.
    pub config_fingerprint: String,
    pub runs: Vec<ExperimentRunSummary>,
    pub aggregate: ExperimentAggregateSummary,
}

/// Stability index of the latest disturbance, with progress clamped to
/// `[0, 1]` and negative counters treated as zero.
#[must_use]
pub fn compute_resilience_stability_index(resilience: &ResilienceAnalytics) -> f64 {
    resilience_stability_index(
        clamp_unit(resilience.recovery_progress),
        resilience.sustained_recovery_ticks as f64,
        resilience.recovery_relapses as f64,
    )
}

/// Runs `input.runs` independent simulations with seeds
/// `seed + run * seed_step` and aggregates their final state.
pub fn run_experiment(input: &ExperimentInput) -> Result<ExperimentExport> {
    input.validate()?;
    tracing::info!(
        runs = input.runs,
        steps = input.steps,
        seed = input.seed,
        "Starting experiment"
    );

    let runs = (0..input.runs)
        .into_par_iter()
        .map(|run| execute_run(input, run))
        .collect::<Result<Vec<_>>>()?;

    let aggregate = aggregate_runs(&runs);
    tracing::info!(
        runs = aggregate.runs,
        extinct_runs = aggregate.extinct_runs,
        "Experiment complete"
    );
    Ok(ExperimentExport {
        generated_at: crate::timestamp(input.generated_at.as_deref()),
        config: input.config_echo(),
        config_fingerprint: input.simulation.fingerprint(),
        runs,
        aggregate,
    })
}

fn execute_run(input: &ExperimentInput, run: usize) -> Result<ExperimentRunSummary> {
    let seed = input.seed_for(run)?;
    let mut sim = match &input.seed_agents {
        Some(agents) => LifeSimulation::with_agents(seed, input.simulation.clone(), agents),
        None => LifeSimulation::new(seed, input.simulation.clone()),
    }
    .with_context(|| format!("failed to build run {}", run + 1))?;

    let mut series = sim
        .run_with_analytics(input.steps, input.analytics_window, input.stop_when_extinct)
        .with_context(|| format!("run {} failed", run + 1))?;
    let (Some(final_summary), Some(final_analytics)) =
        (series.summaries.pop(), series.analytics.pop())
    else {
        anyhow::bail!("Experiment run {} produced no step data", run + 1);
    };

    tracing::debug!(
        run = run + 1,
        seed,
        population = final_summary.population,
        "Run complete"
    );
    Ok(ExperimentRunSummary {
        run: run + 1,
        seed,
        steps_executed: series.summaries.len() + 1,
        extinct: final_summary.population == 0,
        final_resilience_stability_index: compute_resilience_stability_index(
            &final_analytics.resilience,
        ),
        final_resilience_memory_stability_index: clamp_unit(
            final_analytics.resilience.memory_stability_index_mean,
        ),
        final_resilience_relapse_event_fraction: clamp_unit(
            final_analytics.resilience.memory_relapse_event_fraction,
        ),
        final_summary,
        final_analytics,
    })
}

pub(crate) fn aggregate_runs(runs: &[ExperimentRunSummary]) -> ExperimentAggregateSummary {
    let extinct_runs = runs.iter().filter(|run| run.extinct).count();
    let over = |f: fn(&ExperimentRunSummary) -> f64| summarize(runs.iter().map(f));
    ExperimentAggregateSummary {
        runs: runs.len(),
        extinct_runs,
        extinction_rate: if runs.is_empty() {
            0.0
        } else {
            extinct_runs as f64 / runs.len() as f64
        },
        steps_executed: over(|r| r.steps_executed as f64),
        final_population: over(|r| r.final_summary.population as f64),
        final_mean_energy: over(|r| r.final_summary.mean_energy),
        final_active_clades: over(|r| r.final_summary.active_clades as f64),
        final_active_species: over(|r| r.final_summary.active_species as f64),
        final_dominant_species_share: over(|r| r.final_summary.dominant_species_share),
        final_species_speciation_rate: over(|r| r.final_analytics.species.speciation_rate),
        final_species_extinction_rate: over(|r| r.final_analytics.species.extinction_rate),
        final_species_net_diversification_rate: over(|r| {
            r.final_analytics.species.net_diversification_rate
        }),
        final_resilience_stability_index: over(|r| r.final_resilience_stability_index),
        final_resilience_memory_stability_index: over(|r| {
            r.final_resilience_memory_stability_index
        }),
        final_resilience_relapse_event_fraction: over(|r| {
            r.final_resilience_relapse_event_fraction
        }),
    }
}
