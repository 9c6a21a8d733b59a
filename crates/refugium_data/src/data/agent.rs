use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
/// Heritable traits of a single organism.
///
/// Each trait lives inside the closed range given by [`GENOME_MIN`] and
/// [`GENOME_MAX`]. Offspring receive a mutated copy, never a shared reference.
pub struct Genome {
    /// Scales every metabolic and movement cost.
    pub metabolism: f64,
    /// Scales how much of a cell's resource pool can be harvested per tick.
    pub harvest: f64,
    /// Decides who dominates a shared cell and how much energy is taken.
    pub aggression: f64,
}

/// Lower bound of every genome trait.
pub const GENOME_MIN: Genome = Genome {
    metabolism: 0.3,
    harvest: 0.4,
    aggression: 0.0,
};

/// Upper bound of every genome trait.
pub const GENOME_MAX: Genome = Genome {
    metabolism: 2.2,
    harvest: 2.8,
    aggression: 1.0,
};

impl Genome {
    #[must_use]
    pub fn new(metabolism: f64, harvest: f64, aggression: f64) -> Self {
        Self {
            metabolism,
            harvest,
            aggression,
        }
    }

    /// Clamps every trait into its documented range.
    #[must_use]
    pub fn clamped(self) -> Self {
        Self {
            metabolism: self
                .metabolism
                .clamp(GENOME_MIN.metabolism, GENOME_MAX.metabolism),
            harvest: self.harvest.clamp(GENOME_MIN.harvest, GENOME_MAX.harvest),
            aggression: self
                .aggression
                .clamp(GENOME_MIN.aggression, GENOME_MAX.aggression),
        }
    }

    /// L1 distance between two genomes.
    #[must_use]
    pub fn distance(&self, other: &Genome) -> f64 {
        (self.metabolism - other.metabolism).abs()
            + (self.harvest - other.harvest).abs()
            + (self.aggression - other.aggression).abs()
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
/// A living individual on the toroidal grid.
pub struct Agent {
    /// Monotonically increasing identity.
    pub id: u64,
    /// Clade id, fixed at birth and inherited unchanged.
    pub lineage: u64,
    /// Species id, changes only through speciation at birth.
    pub species: u64,
    pub x: usize,
    pub y: usize,
    /// The agent dies once this reaches zero.
    pub energy: f64,
    pub age: u64,
    pub genome: Genome,
}

impl Agent {
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.energy > 0.0
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
/// Description of an agent placed into a fresh simulation by the caller.
///
/// Coordinates may lie outside the grid; they are wrapped toroidally. Missing
/// lineage and species ids default to the 1-based position of the seed.
pub struct AgentSeed {
    pub x: i64,
    pub y: i64,
    pub energy: f64,
    pub genome: Genome,
    #[serde(default)]
    pub age: Option<u64>,
    #[serde(default)]
    pub lineage: Option<u64>,
    #[serde(default)]
    pub species: Option<u64>,
}

impl AgentSeed {
    #[must_use]
    pub fn new(x: i64, y: i64, energy: f64, genome: Genome) -> Self {
        Self {
            x,
            y,
            energy,
            genome,
            age: None,
            lineage: None,
            species: None,
        }
    }

    #[must_use]
    pub fn with_lineage(mut self, lineage: u64) -> Self {
        self.lineage = Some(lineage);
        self
    }

    #[must_use]
    pub fn with_species(mut self, species: u64) -> Self {
        self.species = Some(species);
        self
    }

    #[must_use]
    pub fn with_age(mut self, age: u64) -> Self {
        self.age = Some(age);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_genome_clamped_to_bounds() {
        let genome = Genome::new(5.0, -1.0, 0.5).clamped();
        assert_eq!(genome.metabolism, GENOME_MAX.metabolism);
        assert_eq!(genome.harvest, GENOME_MIN.harvest);
        assert_eq!(genome.aggression, 0.5);
    }

    #[test]
    fn test_genome_distance_is_l1() {
        let a = Genome::new(1.0, 1.0, 0.0);
        let b = Genome::new(1.5, 0.75, 0.25);
        assert!((a.distance(&b) - 1.0).abs() < 1e-12);
        assert_eq!(a.distance(&a), 0.0);
    }

    #[test]
    fn test_agent_seed_serde_defaults() {
        let json = r#"{"x":3,"y":-1,"energy":4.0,"genome":{"metabolism":1.0,"harvest":1.0,"aggression":0.0}}"#;
        let seed: AgentSeed = serde_json::from_str(json).expect("seed should parse");
        assert_eq!(seed.lineage, None);
        assert_eq!(seed.species, None);
        assert_eq!(seed.y, -1);
    }
}
