use super::LifeSimulation;
use crate::config::SimulationConfig;
use crate::disturbance::{DisturbanceLog, DisturbanceRegime};
use crate::environment::{BiomeMap, SeasonalForcing, Torus};
use crate::error::{Result, SimError};
use crate::locality::{LocalityFrame, LocalityHistory};
use crate::resources::ResourceField;
use crate::rng::Rng;
use crate::stats::Tally;
use crate::strategy::SpeciesStrategies;
use crate::taxon_registry::TaxonRegistry;
use refugium_data::{Agent, AgentSeed, Genome, GENOME_MAX, GENOME_MIN};

impl LifeSimulation {
    /// Builds a world with a randomly spawned founding population.
    pub fn new(seed: u64, config: SimulationConfig) -> Result<Self> {
        Self::build(seed, config, None)
    }

    /// Builds a world populated from caller-supplied agents instead of
    /// spawning `initial_agents` at random.
    pub fn with_agents(seed: u64, config: SimulationConfig, seeds: &[AgentSeed]) -> Result<Self> {
        Self::build(seed, config, Some(seeds))
    }

    fn build(seed: u64, config: SimulationConfig, seeds: Option<&[AgentSeed]>) -> Result<Self> {
        if config.width == 0 || config.height == 0 {
            return Err(SimError::invalid_config(format!(
                "grid must be at least 1x1, got {}x{}",
                config.width, config.height
            )));
        }

        let torus = Torus::new(config.width, config.height);
        let mut rng = Rng::new(seed);
        let biome = BiomeMap::generate(&config);
        let forcing = SeasonalForcing::from_config(&config);
        let regime = DisturbanceRegime::from_config(&config);
        let resources = ResourceField::random(torus, config.max_resource, &mut rng);

        let mut sim = Self {
            torus,
            rng,
            biome,
            forcing,
            regime,
            resources,
            agents: Vec::new(),
            tick: 0,
            next_agent_id: 1,
            next_species_id: 1,
            clades: TaxonRegistry::new(),
            species: TaxonRegistry::new(),
            strategies: SpeciesStrategies::default(),
            locality: LocalityHistory::default(),
            disturbances: DisturbanceLog::default(),
            extinct_clades: 0,
            extinct_species: 0,
            config,
        };

        let agents = match seeds {
            Some(seeds) => seeds
                .iter()
                .enumerate()
                .map(|(index, seed)| sim.agent_from_seed(seed, index as u64 + 1))
                .collect(),
            None => sim.spawn_founders()?,
        };
        sim.agents = agents;
        if let Some(max_id) = sim.agents.iter().map(|a| a.id).max() {
            sim.next_agent_id = max_id + 1;
        }
        if let Some(max_species) = sim.agents.iter().map(|a| a.species).max() {
            sim.next_species_id = max_species + 1;
        }

        let biome = &sim.biome;
        let forcing = &sim.forcing;
        sim.strategies =
            SpeciesStrategies::from_founders(&sim.agents, |x, y| biome.effective(x, y, forcing, 0));
        sim.clades
            .seed(&Tally::from_keys(sim.agents.iter().map(|a| a.lineage)));
        sim.species
            .seed(&Tally::from_keys(sim.agents.iter().map(|a| a.species)));
        sim.record_locality(0);

        tracing::debug!(
            seed,
            width = sim.torus.width,
            height = sim.torus.height,
            agents = sim.agents.len(),
            species = sim.strategies.len(),
            "Simulation initialized"
        );
        Ok(sim)
    }

    fn random_trait(&mut self, min: f64, max: f64) -> f64 {
        min + self.rng.float() * (max - min)
    }

    /// Spawns `initial_agents` founders, each its own clade and species.
    fn spawn_founders(&mut self) -> Result<Vec<Agent>> {
        let mut agents = Vec::with_capacity(self.config.initial_agents);
        for _ in 0..self.config.initial_agents {
            let genome = Genome {
                metabolism: self.random_trait(GENOME_MIN.metabolism, GENOME_MAX.metabolism),
                harvest: self.random_trait(GENOME_MIN.harvest, GENOME_MAX.harvest),
                aggression: self.random_trait(GENOME_MIN.aggression, GENOME_MAX.aggression),
            };
            let id = self.next_agent_id;
            self.next_agent_id += 1;
            let species = self.next_species_id;
            self.next_species_id += 1;
            let x = self.rng.int(self.torus.width)?;
            let y = self.rng.int(self.torus.height)?;
            let energy = self.config.initial_energy * (0.8 + self.rng.float() * 0.4);
            agents.push(Agent {
                id,
                lineage: id,
                species,
                x,
                y,
                energy,
                age: 0,
                genome,
            });
        }
        Ok(agents)
    }

    /// Places a caller-supplied agent; lineage and species fall back to its
    /// 1-based position in the seed list.
    fn agent_from_seed(&mut self, seed: &AgentSeed, position: u64) -> Agent {
        let id = self.next_agent_id;
        self.next_agent_id += 1;
        Agent {
            id,
            lineage: seed.lineage.unwrap_or(position),
            species: seed.species.unwrap_or(position),
            x: self.torus.wrap_x(seed.x),
            y: self.torus.wrap_y(seed.y),
            energy: seed.energy,
            age: seed.age.unwrap_or(0),
            genome: seed.genome.clamped(),
        }
    }

    pub(super) fn record_locality(&mut self, tick: u64) {
        let frame = LocalityFrame::capture(&self.agents, self.torus, self.config.locality_reach());
        self.locality.record(tick, frame);
    }
}
