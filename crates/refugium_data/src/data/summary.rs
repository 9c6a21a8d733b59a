use super::agent::{Agent, Genome};
use super::analytics::EvolutionAnalyticsSnapshot;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
/// Result of a single simulation tick.
pub struct StepSummary {
    pub tick: u64,
    pub population: usize,
    pub births: usize,
    pub deaths: usize,
    pub mean_energy: f64,
    pub mean_genome: Genome,
    pub active_clades: usize,
    pub active_species: usize,
    pub dominant_species_share: f64,
    /// Energy-weighted mean genome minus the plain mean genome.
    pub selection_differential: Genome,
    pub clade_extinctions: usize,
    pub species_extinctions: usize,
    pub cumulative_extinct_clades: usize,
    pub cumulative_extinct_species: usize,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
/// Deep copy of the current world state.
pub struct SimulationSnapshot {
    pub tick: u64,
    pub population: usize,
    pub mean_energy: f64,
    pub active_clades: usize,
    pub active_species: usize,
    pub dominant_species_share: f64,
    pub extinct_clades: usize,
    pub extinct_species: usize,
    pub agents: Vec<Agent>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
/// Per-tick summaries and analytics produced by a run, index-aligned.
pub struct SimulationRunSeries {
    pub summaries: Vec<StepSummary>,
    pub analytics: Vec<EvolutionAnalyticsSnapshot>,
}
