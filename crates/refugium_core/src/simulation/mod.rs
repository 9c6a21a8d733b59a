//! The tick scheduler.
//!
//! [`LifeSimulation`] owns the whole world and advances it one discrete tick
//! at a time. The implementation is split by phase:
//! - `init`: world construction and the founding population
//! - `update`: the per-tick pipeline and end-of-tick bookkeeping
//! - `turn`: agent turns, encounters and reproduction
//! - `analytics`: read-only summaries, snapshots and rolling analytics

use crate::config::SimulationConfig;
use crate::disturbance::{DisturbanceEvent, DisturbanceLog, DisturbanceRegime};
use crate::environment::{BiomeMap, SeasonalForcing, Torus};
use crate::error::Result;
use crate::locality::LocalityHistory;
use crate::resources::ResourceField;
use crate::rng::Rng;
use crate::strategy::{SpeciesStrategies, SpeciesStrategy};
use crate::taxon_registry::TaxonRegistry;
use refugium_data::{Agent, EvolutionAnalyticsSnapshot, SimulationRunSeries, StepSummary};

mod analytics;
mod init;
mod turn;
mod update;

/// A seeded, single-threaded ecological simulation on a toroidal grid.
///
/// Two instances built from the same seed, configuration and seed agents
/// produce identical summaries, analytics and histories.
#[derive(Debug, Clone)]
pub struct LifeSimulation {
    config: SimulationConfig,
    torus: Torus,
    rng: Rng,
    biome: BiomeMap,
    forcing: SeasonalForcing,
    regime: DisturbanceRegime,
    resources: ResourceField,
    agents: Vec<Agent>,
    tick: u64,
    next_agent_id: u64,
    next_species_id: u64,
    clades: TaxonRegistry,
    species: TaxonRegistry,
    strategies: SpeciesStrategies,
    locality: LocalityHistory,
    disturbances: DisturbanceLog,
    extinct_clades: usize,
    extinct_species: usize,
}

impl LifeSimulation {
    /// Advances the simulation by `steps` ticks.
    pub fn run(&mut self, steps: usize) -> Result<Vec<StepSummary>> {
        let mut summaries = Vec::with_capacity(steps);
        for _ in 0..steps {
            summaries.push(self.step()?);
        }
        Ok(summaries)
    }

    /// Steps up to `steps` times, taking an analytics snapshot after each
    /// step. With `stop_when_extinct` the run ends right after the first
    /// step that leaves no agents.
    pub fn run_with_analytics(
        &mut self,
        steps: usize,
        window_size: usize,
        stop_when_extinct: bool,
    ) -> Result<SimulationRunSeries> {
        let mut series = SimulationRunSeries::default();
        for _ in 0..steps {
            let summary = self.step()?;
            let extinct = summary.population == 0;
            series.summaries.push(summary);
            series.analytics.push(self.analytics(window_size)?);
            if stop_when_extinct && extinct {
                break;
            }
        }
        Ok(series)
    }

    /// Analytics over the trailing `window_size` ticks.
    pub fn analytics(&self, window_size: usize) -> Result<EvolutionAnalyticsSnapshot> {
        self.build_analytics(window_size)
    }

    /// Overwrites a cell's resource through wrapped coordinates.
    pub fn set_resource(&mut self, x: i64, y: i64, value: f64) {
        self.resources.set(x, y, value);
    }

    #[must_use]
    pub fn get_resource(&self, x: i64, y: i64) -> f64 {
        self.resources.get(x, y)
    }

    #[must_use]
    pub fn get_biome_fertility(&self, x: i64, y: i64) -> f64 {
        self.biome.base(x, y)
    }

    #[must_use]
    pub fn tick(&self) -> u64 {
        self.tick
    }

    #[must_use]
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    #[must_use]
    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    #[must_use]
    pub fn disturbance_events(&self) -> &[DisturbanceEvent] {
        &self.disturbances.events
    }

    #[must_use]
    pub fn species_strategy(&self, species: u64) -> SpeciesStrategy {
        self.strategies.get(species)
    }
}
