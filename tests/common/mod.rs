use refugium_lib::model::data::{AgentSeed, Genome};
use refugium_lib::{LifeSimulation, SimulationConfig};

#[allow(dead_code)]
pub struct SimulationBuilder {
    config: SimulationConfig,
    agents: Vec<AgentSeed>,
    random_founders: bool,
    seed: u64,
}

#[allow(dead_code)]
impl SimulationBuilder {
    /// An empty 10x10 world; add agents or call `with_random_founders`.
    pub fn new() -> Self {
        Self {
            config: SimulationConfig {
                width: 10,
                height: 10,
                ..Default::default()
            },
            agents: Vec::new(),
            random_founders: false,
            seed: 1,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_config<F>(mut self, modifier: F) -> Self
    where
        F: FnOnce(&mut SimulationConfig),
    {
        modifier(&mut self.config);
        self
    }

    pub fn with_grid(mut self, width: usize, height: usize) -> Self {
        self.config.width = width;
        self.config.height = height;
        self
    }

    pub fn with_agent(mut self, agent: AgentSeed) -> Self {
        self.agents.push(agent);
        self
    }

    /// Places a neutral agent; lineage and species default to its position.
    pub fn with_agent_at(self, x: i64, y: i64, energy: f64) -> Self {
        self.with_agent(AgentSeed::new(x, y, energy, neutral_genome()))
    }

    pub fn with_random_founders(mut self, count: usize) -> Self {
        self.config.initial_agents = count;
        self.random_founders = true;
        self
    }

    /// No food and a metabolic cost of one unit per tick, nothing else.
    pub fn starving(self) -> Self {
        self.with_config(|c| {
            c.resource_regen = 0.0;
            c.harvest_cap = 0.0;
            c.metabolism_cost_base = 1.0;
            c.move_cost = 0.0;
            c.specialization_metabolic_cost = 0.0;
        })
    }

    /// Every agent above the threshold reproduces each tick.
    pub fn fertile(self) -> Self {
        self.with_config(|c| {
            c.reproduce_threshold = 20.0;
            c.reproduce_probability = 1.0;
        })
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn build(self) -> LifeSimulation {
        if self.random_founders {
            LifeSimulation::new(self.seed, self.config).expect("valid simulation")
        } else {
            LifeSimulation::with_agents(self.seed, self.config, &self.agents)
                .expect("valid simulation")
        }
    }
}

#[allow(dead_code)]
pub fn neutral_genome() -> Genome {
    Genome::new(1.0, 1.0, 0.0)
}

#[allow(dead_code)]
pub fn assert_unit(value: f64, what: &str) {
    assert!(
        (0.0..=1.0).contains(&value),
        "{what} should be within [0, 1], got {value}"
    );
}
