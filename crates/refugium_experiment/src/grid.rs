//! Paired global-versus-local disturbance studies over a parameter grid.
//!
//! Every grid cell runs two sweeps on identical seeds: one where each
//! disturbance hits the whole grid, and one where it hits a bounded
//! neighborhood with a fraction of refugia spared. Paired deltas are
//! oriented so that positive values favor the local regime.

use crate::aggregate::{summarize, summarize_paired, NumericAggregate, PairedDeltaAggregate};
use crate::runner::{run_experiment, ExperimentAggregateSummary, ExperimentInput, ExperimentRunSummary};
use anyhow::{ensure, Result};
use refugium_core::SimulationConfig;
use serde::{Deserialize, Serialize};

fn default_seed_step() -> u64 {
    1
}

fn default_stop_when_extinct() -> bool {
    true
}

fn default_phases() -> Vec<f64> {
    vec![0.0]
}

fn default_local_radius() -> u64 {
    2
}

fn default_local_refugia_fraction() -> f64 {
    0.35
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GridStudyInput {
    pub runs: usize,
    pub steps: usize,
    pub analytics_window: usize,
    pub seed: u64,
    #[serde(default = "default_seed_step")]
    pub seed_step: u64,
    #[serde(default = "default_stop_when_extinct")]
    pub stop_when_extinct: bool,
    /// Disturbance intervals in ticks.
    pub intervals: Vec<u64>,
    /// Used as both energy loss and resource loss, each in `[0, 1]`.
    pub amplitudes: Vec<f64>,
    /// Phase offsets, wrapped into `[0, 1)`.
    #[serde(default = "default_phases")]
    pub phases: Vec<f64>,
    #[serde(default = "default_local_radius")]
    pub local_radius: u64,
    #[serde(default = "default_local_refugia_fraction")]
    pub local_refugia_fraction: f64,
    #[serde(default)]
    pub simulation: SimulationConfig,
    #[serde(default)]
    pub generated_at: Option<String>,
}

impl GridStudyInput {
    #[must_use]
    pub fn new(runs: usize, steps: usize, analytics_window: usize, seed: u64) -> Self {
        Self {
            runs,
            steps,
            analytics_window,
            seed,
            seed_step: default_seed_step(),
            stop_when_extinct: default_stop_when_extinct(),
            intervals: Vec::new(),
            amplitudes: Vec::new(),
            phases: default_phases(),
            local_radius: default_local_radius(),
            local_refugia_fraction: default_local_refugia_fraction(),
            simulation: SimulationConfig::default(),
            generated_at: None,
        }
    }

    /// Checks the grid axes and returns the normalized study parameters.
    pub fn normalize(&self) -> Result<GridStudyConfig> {
        self.base_input().validate()?;
        ensure!(!self.intervals.is_empty(), "intervals must not be empty");
        for (index, &interval) in self.intervals.iter().enumerate() {
            ensure!(interval > 0, "intervals[{}] must be > 0", index);
        }
        ensure!(!self.amplitudes.is_empty(), "amplitudes must not be empty");
        for (index, &amplitude) in self.amplitudes.iter().enumerate() {
            ensure!(amplitude.is_finite(), "amplitudes[{}] must be finite", index);
            ensure!(
                (0.0..=1.0).contains(&amplitude),
                "amplitudes[{}] must be between 0 and 1", index
            );
        }
        ensure!(!self.phases.is_empty(), "phases must not be empty");
        let mut phases = Vec::with_capacity(self.phases.len());
        for (index, &phase) in self.phases.iter().enumerate() {
            ensure!(phase.is_finite(), "phases[{}] must be finite", index);
            phases.push(phase.rem_euclid(1.0));
        }
        ensure!(
            self.local_refugia_fraction.is_finite(),
            "localRefugiaFraction must be finite"
        );
        ensure!(
            (0.0..=1.0).contains(&self.local_refugia_fraction),
            "localRefugiaFraction must be between 0 and 1"
        );

        Ok(GridStudyConfig {
            runs: self.runs,
            steps: self.steps,
            analytics_window: self.analytics_window,
            seed: self.seed,
            seed_step: self.seed_step,
            stop_when_extinct: self.stop_when_extinct,
            intervals: self.intervals.clone(),
            amplitudes: self.amplitudes.clone(),
            phases,
            local_radius: self.local_radius,
            local_refugia_fraction: self.local_refugia_fraction,
        })
    }

    fn base_input(&self) -> ExperimentInput {
        ExperimentInput {
            runs: self.runs,
            steps: self.steps,
            analytics_window: self.analytics_window,
            seed: self.seed,
            seed_step: self.seed_step,
            stop_when_extinct: self.stop_when_extinct,
            simulation: self.simulation.clone(),
            seed_agents: None,
            generated_at: self.generated_at.clone(),
        }
    }

    fn sweep(&self, regime: Regime) -> ExperimentInput {
        let mut input = self.base_input();
        input.simulation.disturbance_interval = regime.interval as f64;
        input.simulation.disturbance_phase_offset = regime.phase;
        input.simulation.disturbance_energy_loss = regime.amplitude;
        input.simulation.disturbance_resource_loss = regime.amplitude;
        input.simulation.disturbance_radius = regime.radius;
        input.simulation.disturbance_refugia_fraction = regime.refugia_fraction;
        input
    }
}

#[derive(Debug, Clone, Copy)]
struct Regime {
    interval: u64,
    amplitude: f64,
    phase: f64,
    radius: f64,
    refugia_fraction: f64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
/// Normalized study parameters echoed into the export.
pub struct GridStudyConfig {
    pub runs: usize,
    pub steps: usize,
    pub analytics_window: usize,
    pub seed: u64,
    pub seed_step: u64,
    pub stop_when_extinct: bool,
    pub intervals: Vec<u64>,
    pub amplitudes: Vec<f64>,
    pub phases: Vec<f64>,
    pub local_radius: u64,
    pub local_refugia_fraction: f64,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct PairedDeltas {
    pub resilience_stability_delta: PairedDeltaAggregate,
    pub memory_stability_delta: PairedDeltaAggregate,
    pub relapse_event_reduction: PairedDeltaAggregate,
    pub turnover_spike_reduction: PairedDeltaAggregate,
    /// Memory stability gain minus immediate stability gain.
    pub path_dependence_gain: PairedDeltaAggregate,
    pub latest_recovery_lag_reduction: PairedDeltaAggregate,
    pub memory_recovery_lag_reduction: PairedDeltaAggregate,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
/// Where in the seasonal cycle the disturbances of each regime landed.
pub struct TimingDiagnostics {
    pub global_latest_event_phase_mean: f64,
    pub local_latest_event_phase_mean: f64,
    pub global_memory_event_phase_concentration_mean: f64,
    pub local_memory_event_phase_concentration_mean: f64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GridCellSummary {
    pub interval: u64,
    pub amplitude: f64,
    pub phase: f64,
    pub global: ExperimentAggregateSummary,
    pub local: ExperimentAggregateSummary,
    pub paired_deltas: PairedDeltas,
    pub timing_diagnostics: TimingDiagnostics,
    /// Local disturbance both reduced relapses and added path dependence.
    pub hypothesis_support: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct GridStudySummary {
    pub cells: usize,
    pub supported_cells: usize,
    pub support_fraction: f64,
    pub memory_stability_delta: NumericAggregate,
    pub relapse_event_reduction: NumericAggregate,
    pub path_dependence_gain: NumericAggregate,
    pub latest_recovery_lag_reduction: NumericAggregate,
    pub memory_recovery_lag_reduction: NumericAggregate,
    pub global_memory_event_phase_concentration: NumericAggregate,
    pub local_memory_event_phase_concentration: NumericAggregate,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GridStudyExport {
    pub generated_at: String,
    pub config: GridStudyConfig,
    /// Fingerprint of the base simulation configuration, before the
    /// per-cell disturbance overrides.
    pub config_fingerprint: String,
    pub cells: Vec<GridCellSummary>,
    pub summary: GridStudySummary,
}

/// Runs a paired global/local sweep for every (interval, amplitude, phase)
/// combination, in that nesting order.
pub fn run_disturbance_grid_study(input: &GridStudyInput) -> Result<GridStudyExport> {
    let config = input.normalize()?;
    let mut cells = Vec::with_capacity(config.intervals.len() * config.amplitudes.len() * config.phases.len());

    for &interval in &config.intervals {
        for &amplitude in &config.amplitudes {
            for &phase in &config.phases {
                let global = run_experiment(&input.sweep(Regime {
                    interval,
                    amplitude,
                    phase,
                    radius: -1.0,
                    refugia_fraction: 0.0,
                }))?;
                let local = run_experiment(&input.sweep(Regime {
                    interval,
                    amplitude,
                    phase,
                    radius: config.local_radius as f64,
                    refugia_fraction: config.local_refugia_fraction,
                }))?;

                let paired_deltas = paired_deltas(&global.runs, &local.runs)?;
                let timing_diagnostics = timing_diagnostics(&global.runs, &local.runs)?;
                let hypothesis_support = paired_deltas.relapse_event_reduction.mean > 0.0
                    && paired_deltas.path_dependence_gain.mean > 0.0;
                tracing::info!(
                    interval,
                    amplitude,
                    phase,
                    hypothesis_support,
                    "Grid cell complete"
                );
                cells.push(GridCellSummary {
                    interval,
                    amplitude,
                    phase,
                    global: global.aggregate,
                    local: local.aggregate,
                    paired_deltas,
                    timing_diagnostics,
                    hypothesis_support,
                });
            }
        }
    }

    let summary = summarize_study(&cells);
    Ok(GridStudyExport {
        generated_at: crate::timestamp(input.generated_at.as_deref()),
        config,
        config_fingerprint: input.simulation.fingerprint(),
        cells,
        summary,
    })
}

/// Global and local runs must pair up one to one on identical seeds.
fn ensure_paired(global: &[ExperimentRunSummary], local: &[ExperimentRunSummary]) -> Result<()> {
    ensure!(
        global.len() == local.len(),
        "Mismatched paired runs: global={} local={}",
        global.len(),
        local.len()
    );
    for (index, (g, l)) in global.iter().zip(local).enumerate() {
        ensure!(
            g.seed == l.seed,
            "Seed mismatch for paired runs at index {}: globalSeed={} localSeed={}",
            index,
            g.seed,
            l.seed
        );
    }
    Ok(())
}

fn paired<F>(global: &[ExperimentRunSummary], local: &[ExperimentRunSummary], delta: F) -> PairedDeltaAggregate
where
    F: Fn(&ExperimentRunSummary, &ExperimentRunSummary) -> f64,
{
    let values: Vec<f64> = global.iter().zip(local).map(|(g, l)| delta(g, l)).collect();
    summarize_paired(&values)
}

pub(crate) fn paired_deltas(
    global: &[ExperimentRunSummary],
    local: &[ExperimentRunSummary],
) -> Result<PairedDeltas> {
    ensure_paired(global, local)?;
    Ok(PairedDeltas {
        resilience_stability_delta: paired(global, local, |g, l| {
            l.final_resilience_stability_index - g.final_resilience_stability_index
        }),
        memory_stability_delta: paired(global, local, |g, l| {
            l.final_resilience_memory_stability_index - g.final_resilience_memory_stability_index
        }),
        relapse_event_reduction: paired(global, local, |g, l| {
            g.final_resilience_relapse_event_fraction - l.final_resilience_relapse_event_fraction
        }),
        turnover_spike_reduction: paired(global, local, |g, l| {
            g.final_analytics.resilience.turnover_spike - l.final_analytics.resilience.turnover_spike
        }),
        path_dependence_gain: paired(global, local, |g, l| {
            let memory = l.final_resilience_memory_stability_index
                - g.final_resilience_memory_stability_index;
            let immediate =
                l.final_resilience_stability_index - g.final_resilience_stability_index;
            memory - immediate
        }),
        latest_recovery_lag_reduction: paired(global, local, |g, l| {
            g.comparable_latest_recovery_lag() - l.comparable_latest_recovery_lag()
        }),
        memory_recovery_lag_reduction: paired(global, local, |g, l| {
            g.comparable_memory_recovery_lag() - l.comparable_memory_recovery_lag()
        }),
    })
}

fn timing_diagnostics(
    global: &[ExperimentRunSummary],
    local: &[ExperimentRunSummary],
) -> Result<TimingDiagnostics> {
    ensure_paired(global, local)?;
    let mean_of = |runs: &[ExperimentRunSummary], f: fn(&ExperimentRunSummary) -> f64| {
        summarize(runs.iter().map(f)).mean
    };
    Ok(TimingDiagnostics {
        global_latest_event_phase_mean: mean_of(global, |r| {
            r.final_analytics.resilience.latest_event_seasonal_phase
        }),
        local_latest_event_phase_mean: mean_of(local, |r| {
            r.final_analytics.resilience.latest_event_seasonal_phase
        }),
        global_memory_event_phase_concentration_mean: mean_of(global, |r| {
            r.final_analytics.resilience.memory_event_phase_concentration
        }),
        local_memory_event_phase_concentration_mean: mean_of(local, |r| {
            r.final_analytics.resilience.memory_event_phase_concentration
        }),
    })
}

fn summarize_study(cells: &[GridCellSummary]) -> GridStudySummary {
    let supported_cells = cells.iter().filter(|c| c.hypothesis_support).count();
    let over = |f: fn(&GridCellSummary) -> f64| summarize(cells.iter().map(f));
    GridStudySummary {
        cells: cells.len(),
        supported_cells,
        support_fraction: if cells.is_empty() {
            0.0
        } else {
            supported_cells as f64 / cells.len() as f64
        },
        memory_stability_delta: over(|c| c.paired_deltas.memory_stability_delta.mean),
        relapse_event_reduction: over(|c| c.paired_deltas.relapse_event_reduction.mean),
        path_dependence_gain: over(|c| c.paired_deltas.path_dependence_gain.mean),
        latest_recovery_lag_reduction: over(|c| c.paired_deltas.latest_recovery_lag_reduction.mean),
        memory_recovery_lag_reduction: over(|c| c.paired_deltas.memory_recovery_lag_reduction.mean),
        global_memory_event_phase_concentration: over(|c| {
            c.timing_diagnostics.global_memory_event_phase_concentration_mean
        }),
        local_memory_event_phase_concentration: over(|c| {
            c.timing_diagnostics.local_memory_event_phase_concentration_mean
        }),
    }
}
