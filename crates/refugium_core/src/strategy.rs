//! Species-level ecological strategies.
//!
//! Every species carries a habitat preference, a trophic level and a defense
//! level. Founding species derive them from their members at construction;
//! a species born through speciation inherits its parent's values shifted by
//! the direction of the genome mutation that created it.

use crate::config::SimulationConfig;
use crate::stats::{clamp, mean, std_dev, Tally};
use refugium_data::{Agent, Genome, StrategyAnalytics, StrategyAxisAnalytics, GENOME_MAX, GENOME_MIN};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeciesStrategy {
    /// Fertility the species forages best at, in `[0.1, 2]`.
    pub habitat_preference: f64,
    /// Predatory tendency in `[0, 1]`.
    pub trophic_level: f64,
    /// Resistance to theft in `[0, 1]`.
    pub defense_level: f64,
}

impl Default for SpeciesStrategy {
    fn default() -> Self {
        Self {
            habitat_preference: 1.0,
            trophic_level: 0.0,
            defense_level: 0.0,
        }
    }
}

fn normalize_trait(value: f64, min: f64, max: f64) -> f64 {
    if max <= min {
        return 0.0;
    }
    clamp((value - min) / (max - min), 0.0, 1.0)
}

/// Aggressive, low-harvest genomes read as predators.
#[must_use]
pub fn trophic_signal(genome: &Genome) -> f64 {
    let harvest = normalize_trait(genome.harvest, GENOME_MIN.harvest, GENOME_MAX.harvest);
    clamp(genome.aggression * 0.7 + (1.0 - harvest) * 0.3, 0.0, 1.0)
}

/// Docile, high-metabolism genomes read as defended.
#[must_use]
pub fn defense_signal(genome: &Genome) -> f64 {
    let metabolism = normalize_trait(
        genome.metabolism,
        GENOME_MIN.metabolism,
        GENOME_MAX.metabolism,
    );
    clamp((1.0 - genome.aggression) * 0.65 + metabolism * 0.35, 0.0, 1.0)
}

fn mutation_shift(signal: f64, scale: f64) -> f64 {
    let scale = scale.max(0.0);
    if scale == 0.0 {
        return 0.0;
    }
    clamp(signal, -1.0, 1.0) * scale
}

#[derive(Debug, Clone, Default)]
pub struct SpeciesStrategies {
    entries: HashMap<u64, SpeciesStrategy>,
}

impl SpeciesStrategies {
    /// Derives founding strategies from the initial population.
    ///
    /// `fertility_at` reports the effective fertility of a cell at tick zero.
    pub fn from_founders<F>(agents: &[Agent], fertility_at: F) -> Self
    where
        F: Fn(usize, usize) -> f64,
    {
        #[derive(Default)]
        struct Sums {
            habitat: f64,
            trophic: f64,
            defense: f64,
            count: usize,
        }

        let mut sums: HashMap<u64, Sums> = HashMap::new();
        for agent in agents {
            let entry = sums.entry(agent.species).or_default();
            entry.habitat += fertility_at(agent.x, agent.y);
            entry.trophic += trophic_signal(&agent.genome);
            entry.defense += defense_signal(&agent.genome);
            entry.count += 1;
        }

        let entries = sums
            .into_iter()
            .map(|(species, sum)| {
                let n = sum.count as f64;
                let strategy = SpeciesStrategy {
                    habitat_preference: clamp(sum.habitat / n, 0.1, 2.0),
                    trophic_level: clamp(sum.trophic / n, 0.0, 1.0),
                    defense_level: clamp(sum.defense / n, 0.0, 1.0),
                };
                (species, strategy)
            })
            .collect();
        Self { entries }
    }

    /// Strategy of `species`, or the neutral strategy if it was never assigned.
    #[must_use]
    pub fn get(&self, species: u64) -> SpeciesStrategy {
        self.entries.get(&species).copied().unwrap_or_default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Assigns a new species its strategy, derived from the parent species
    /// and the parent-to-child genome shift.
    pub fn speciate(
        &mut self,
        parent_species: u64,
        child_species: u64,
        parent: &Genome,
        child: &Genome,
        config: &SimulationConfig,
    ) -> SpeciesStrategy {
        let base = self.get(parent_species);

        let habitat_shift = mutation_shift(
            (child.harvest - parent.harvest) * 0.65 + (parent.metabolism - child.metabolism) * 0.35,
            config.habitat_preference_mutation,
        );
        let trophic_shift = mutation_shift(
            (child.aggression - parent.aggression) * 0.7 + (parent.harvest - child.harvest) * 0.3,
            config.trophic_mutation,
        );
        let defense_shift = mutation_shift(
            (parent.aggression - child.aggression) * 0.65
                + (child.metabolism - parent.metabolism) * 0.35,
            config.defense_mutation,
        );

        let strategy = SpeciesStrategy {
            habitat_preference: clamp(base.habitat_preference + habitat_shift, 0.1, 2.0),
            trophic_level: clamp(base.trophic_level + trophic_shift, 0.0, 1.0),
            defense_level: clamp(base.defense_level + defense_shift, 0.0, 1.0),
        };
        self.entries.insert(child_species, strategy);
        strategy
    }

    /// Foraging multiplier for a species standing on a cell of `fertility`.
    #[must_use]
    pub fn habitat_match(&self, species: u64, fertility: f64, config: &SimulationConfig) -> f64 {
        let strength = config.habitat_preference_strength.max(0.0);
        if strength == 0.0 {
            return 1.0;
        }
        let mismatch = fertility - self.get(species).habitat_preference;
        (-strength * mismatch * mismatch).exp().max(0.05)
    }

    #[must_use]
    pub fn trophic_efficiency(&self, species: u64, config: &SimulationConfig) -> f64 {
        let penalty = clamp(config.trophic_foraging_penalty, 0.0, 0.95);
        (1.0 - penalty * self.get(species).trophic_level).max(0.05)
    }

    #[must_use]
    pub fn defense_efficiency(&self, species: u64, config: &SimulationConfig) -> f64 {
        let penalty = clamp(config.defense_foraging_penalty, 0.0, 0.95);
        (1.0 - penalty * self.get(species).defense_level).max(0.05)
    }

    /// Extra metabolic drain for species specialized away from average fertility.
    #[must_use]
    pub fn specialization_penalty(&self, agent: &Agent, config: &SimulationConfig) -> f64 {
        let scale = config.specialization_metabolic_cost.max(0.0);
        if scale == 0.0 {
            return 0.0;
        }
        let load = (self.get(agent.species).habitat_preference - 1.0).abs().min(1.0);
        scale * load * agent.genome.metabolism
    }

    /// Distribution of strategies over living species, weighted by population.
    #[must_use]
    pub fn summarize(&self, species_counts: &Tally) -> StrategyAnalytics {
        let mut habitat = Vec::with_capacity(species_counts.len());
        let mut trophic = Vec::with_capacity(species_counts.len());
        let mut defense = Vec::with_capacity(species_counts.len());
        let (mut habitat_weighted, mut trophic_weighted, mut defense_weighted) = (0.0, 0.0, 0.0);
        let mut total_population = 0usize;

        for (species, population) in species_counts.iter() {
            let strategy = self.get(species);
            let weight = population as f64;
            habitat.push(strategy.habitat_preference);
            trophic.push(strategy.trophic_level);
            defense.push(strategy.defense_level);
            habitat_weighted += strategy.habitat_preference * weight;
            trophic_weighted += strategy.trophic_level * weight;
            defense_weighted += strategy.defense_level * weight;
            total_population += population;
        }

        StrategyAnalytics {
            active_species: species_counts.len(),
            habitat_preference: summarize_axis(&habitat, habitat_weighted, total_population),
            trophic_level: summarize_axis(&trophic, trophic_weighted, total_population),
            defense_level: summarize_axis(&defense, defense_weighted, total_population),
        }
    }
}

fn summarize_axis(values: &[f64], weighted_total: f64, total_weight: usize) -> StrategyAxisAnalytics {
    if values.is_empty() {
        return StrategyAxisAnalytics::default();
    }
    StrategyAxisAnalytics {
        mean: mean(values),
        std_dev: std_dev(values),
        min: values.iter().copied().fold(f64::INFINITY, f64::min),
        max: values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        weighted_mean: if total_weight == 0 {
            0.0
        } else {
            weighted_total / total_weight as f64
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn agent(species: u64, x: usize, genome: Genome) -> Agent {
        Agent {
            id: species,
            lineage: species,
            species,
            x,
            y: 0,
            energy: 5.0,
            age: 0,
            genome,
        }
    }

    #[test]
    fn test_signals_at_trait_extremes() {
        let predator = Genome::new(GENOME_MIN.metabolism, GENOME_MIN.harvest, 1.0);
        assert!((trophic_signal(&predator) - 1.0).abs() < 1e-12);
        assert!((defense_signal(&predator) - 0.0).abs() < 1e-12);

        let grazer = Genome::new(GENOME_MAX.metabolism, GENOME_MAX.harvest, 0.0);
        assert_eq!(trophic_signal(&grazer), 0.0);
        assert!((defense_signal(&grazer) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_founders_average_over_members() {
        let genome = Genome::new(1.0, 1.0, 0.0);
        let agents = vec![agent(1, 0, genome), agent(1, 1, genome), agent(2, 2, genome)];
        let strategies =
            SpeciesStrategies::from_founders(&agents, |x, _| if x == 0 { 0.8 } else { 1.4 });
        assert!((strategies.get(1).habitat_preference - 1.1).abs() < 1e-12);
        assert!((strategies.get(2).habitat_preference - 1.4).abs() < 1e-12);
        assert_eq!(strategies.len(), 2);
    }

    #[test]
    fn test_unknown_species_is_neutral() {
        let strategies = SpeciesStrategies::default();
        assert_eq!(strategies.get(42), SpeciesStrategy::default());
        let config = SimulationConfig::default();
        assert_eq!(strategies.trophic_efficiency(42, &config), 1.0);
        assert_eq!(strategies.habitat_match(42, 1.0, &config), 1.0);
    }

    #[test]
    fn test_speciation_shifts_follow_mutation_direction() {
        let mut strategies = SpeciesStrategies::default();
        let config = SimulationConfig::default();
        let parent = Genome::new(1.0, 1.0, 0.2);
        let child = Genome::new(1.0, 1.0, 0.6);
        let derived = strategies.speciate(1, 2, &parent, &child, &config);
        // trophic: 0.4 * 0.7 = 0.28 scaled by 0.18
        assert!((derived.trophic_level - 0.28 * 0.18).abs() < 1e-12);
        assert_eq!(derived.defense_level, 0.0);
        assert_eq!(derived.habitat_preference, 1.0);
        assert_eq!(strategies.get(2), derived);
    }

    #[test]
    fn test_specialization_penalty_zero_for_generalists() {
        let strategies = SpeciesStrategies::default();
        let config = SimulationConfig::default();
        let a = agent(3, 0, Genome::new(2.0, 1.0, 0.0));
        assert_eq!(strategies.specialization_penalty(&a, &config), 0.0);
    }

    #[test]
    fn test_summarize_empty_population() {
        let strategies = SpeciesStrategies::default();
        let summary = strategies.summarize(&Tally::new());
        assert_eq!(summary.active_species, 0);
        assert_eq!(summary.trophic_level, StrategyAxisAnalytics::default());
    }
}
