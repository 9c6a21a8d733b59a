use super::LifeSimulation;
use crate::error::Result;
use crate::stats::Tally;
use refugium_data::{
    EvolutionAnalyticsSnapshot, EvolutionHistorySnapshot, ForcingAnalytics, Genome,
    SimulationSnapshot, TurnoverWindow,
};
use std::collections::HashSet;

pub(super) struct Diversity {
    pub active_clades: usize,
    pub active_species: usize,
    pub dominant_species_share: f64,
}

impl LifeSimulation {
    pub(super) fn mean_energy(&self) -> f64 {
        if self.agents.is_empty() {
            return 0.0;
        }
        self.agents.iter().map(|a| a.energy).sum::<f64>() / self.agents.len() as f64
    }

    pub(super) fn mean_genome(&self) -> Genome {
        if self.agents.is_empty() {
            return Genome::default();
        }
        let n = self.agents.len() as f64;
        let total = self.agents.iter().fold(Genome::default(), |acc, a| Genome {
            metabolism: acc.metabolism + a.genome.metabolism,
            harvest: acc.harvest + a.genome.harvest,
            aggression: acc.aggression + a.genome.aggression,
        });
        Genome {
            metabolism: total.metabolism / n,
            harvest: total.harvest / n,
            aggression: total.aggression / n,
        }
    }

    pub(super) fn diversity(&self) -> Diversity {
        if self.agents.is_empty() {
            return Diversity {
                active_clades: 0,
                active_species: 0,
                dominant_species_share: 0.0,
            };
        }
        let clades: HashSet<u64> = self.agents.iter().map(|a| a.lineage).collect();
        let species = Tally::from_keys(self.agents.iter().map(|a| a.species));
        let (_, dominant) = species.dominant();
        Diversity {
            active_clades: clades.len(),
            active_species: species.len(),
            dominant_species_share: dominant as f64 / self.agents.len() as f64,
        }
    }

    /// Energy-weighted mean genome minus the plain mean genome.
    pub(super) fn selection_differential(&self, mean: &Genome) -> Genome {
        if self.agents.is_empty() {
            return Genome::default();
        }
        let total_energy: f64 = self.agents.iter().map(|a| a.energy).sum();
        if total_energy <= 0.0 {
            return Genome::default();
        }
        let weighted = self.agents.iter().fold(Genome::default(), |acc, a| Genome {
            metabolism: acc.metabolism + a.genome.metabolism * a.energy,
            harvest: acc.harvest + a.genome.harvest * a.energy,
            aggression: acc.aggression + a.genome.aggression * a.energy,
        });
        Genome {
            metabolism: weighted.metabolism / total_energy - mean.metabolism,
            harvest: weighted.harvest / total_energy - mean.harvest,
            aggression: weighted.aggression / total_energy - mean.aggression,
        }
    }

    /// Deep copy of the current world state.
    #[must_use]
    pub fn snapshot(&self) -> SimulationSnapshot {
        let diversity = self.diversity();
        SimulationSnapshot {
            tick: self.tick,
            population: self.agents.len(),
            mean_energy: self.mean_energy(),
            active_clades: diversity.active_clades,
            active_species: diversity.active_species,
            dominant_species_share: diversity.dominant_species_share,
            extinct_clades: self.extinct_clades,
            extinct_species: self.extinct_species,
            agents: self.agents.clone(),
        }
    }

    /// Every clade and species ever tracked, sorted by id.
    #[must_use]
    pub fn history(&self) -> EvolutionHistorySnapshot {
        EvolutionHistorySnapshot {
            clades: self.clades.export(),
            species: self.species.export(),
            extinct_clades: self.extinct_clades,
            extinct_species: self.extinct_species,
        }
    }

    /// The trailing `window_size` ticks ending now, floored at one tick.
    fn turnover_window(&self, window_size: usize) -> TurnoverWindow {
        if self.tick == 0 {
            return TurnoverWindow::default();
        }
        let size = (window_size.max(1) as u64).min(self.tick);
        TurnoverWindow {
            start_tick: self.tick - size + 1,
            end_tick: self.tick,
            size,
        }
    }

    fn forcing_state(&self) -> ForcingAnalytics {
        ForcingAnalytics {
            cycle_length: self.forcing.cycle_length,
            phase: self.forcing.phase(self.tick),
            wave: self.forcing.wave(self.tick),
            regen_multiplier: self.forcing.regen_multiplier(self.tick),
            fertility_contrast_multiplier: self.forcing.contrast_multiplier(self.tick),
        }
    }

    pub(super) fn build_analytics(&self, window_size: usize) -> Result<EvolutionAnalyticsSnapshot> {
        let window = self.turnover_window(window_size);
        let total_cells = self.torus.cells();
        let radius = self.config.locality_reach();
        let species_counts = Tally::from_keys(self.agents.iter().map(|a| a.species));

        Ok(EvolutionAnalyticsSnapshot {
            tick: self.tick,
            window,
            species: self.species.species_turnover(&window, self.tick),
            clades: self.clades.clade_turnover(&window, self.tick),
            strategy: self.strategies.summarize(&species_counts),
            forcing: self.forcing_state(),
            disturbance: self.disturbances.analytics(&self.regime, &window),
            resilience: self.disturbances.resilience(
                self.tick,
                self.agents.len(),
                &self.forcing,
                &self.species,
            ),
            locality: self.locality.state(self.tick, total_cells)?,
            locality_turnover: self.locality.turnover(&window, total_cells),
            locality_radius: self.locality.radius_state(self.tick, radius)?,
            locality_radius_turnover: self.locality.radius_turnover(&window, total_cells, radius),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimulationConfig;
    use refugium_data::AgentSeed;

    fn small_world(seed: u64) -> LifeSimulation {
        let config = SimulationConfig {
            width: 6,
            height: 6,
            initial_agents: 10,
            ..Default::default()
        };
        LifeSimulation::new(seed, config).unwrap()
    }

    #[test]
    fn test_window_is_zero_before_first_step() {
        let sim = small_world(3);
        let analytics = sim.analytics(10).unwrap();
        assert_eq!(analytics.window, TurnoverWindow::default());
    }

    #[test]
    fn test_window_clamped_to_elapsed_ticks() {
        let mut sim = small_world(3);
        sim.run(4).unwrap();
        let window = sim.turnover_window(10);
        assert_eq!((window.start_tick, window.end_tick, window.size), (1, 4, 4));
        let window = sim.turnover_window(0);
        assert_eq!((window.start_tick, window.end_tick, window.size), (4, 4, 1));
    }

    #[test]
    fn test_empty_world_reports_zeros() {
        let sim = LifeSimulation::with_agents(1, SimulationConfig::default(), &[]).unwrap();
        let snapshot = sim.snapshot();
        assert_eq!(snapshot.population, 0);
        assert_eq!(snapshot.mean_energy, 0.0);
        assert_eq!(snapshot.dominant_species_share, 0.0);
        assert_eq!(sim.mean_genome(), Genome::default());
        assert_eq!(sim.selection_differential(&Genome::default()), Genome::default());
    }

    #[test]
    fn test_selection_differential_favors_energetic_genomes() {
        let seeds = [
            AgentSeed::new(0, 0, 9.0, Genome::new(1.0, 2.0, 0.0)),
            AgentSeed::new(3, 3, 1.0, Genome::new(1.0, 1.0, 0.0)),
        ];
        let sim = LifeSimulation::with_agents(1, SimulationConfig::default(), &seeds).unwrap();
        let mean = sim.mean_genome();
        assert!((mean.harvest - 1.5).abs() < 1e-12);
        let differential = sim.selection_differential(&mean);
        assert!((differential.harvest - 0.4).abs() < 1e-12);
        assert!(differential.metabolism.abs() < 1e-12);
    }

    #[test]
    fn test_diversity_dominant_share() {
        let seeds = [
            AgentSeed::new(0, 0, 5.0, Genome::new(1.0, 1.0, 0.0)).with_species(4),
            AgentSeed::new(1, 0, 5.0, Genome::new(1.0, 1.0, 0.0)).with_species(4),
            AgentSeed::new(2, 0, 5.0, Genome::new(1.0, 1.0, 0.0)).with_species(9),
        ];
        let sim = LifeSimulation::with_agents(1, SimulationConfig::default(), &seeds).unwrap();
        let diversity = sim.diversity();
        assert_eq!(diversity.active_clades, 3);
        assert_eq!(diversity.active_species, 2);
        assert!((diversity.dominant_species_share - 2.0 / 3.0).abs() < 1e-12);
    }
}
