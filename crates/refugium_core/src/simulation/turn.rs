use super::LifeSimulation;
use crate::error::Result;
use crate::stats::clamp;
use refugium_data::{Agent, Genome, GENOME_MAX, GENOME_MIN};
use std::cmp::Ordering;
use std::collections::BTreeMap;

impl LifeSimulation {
    fn occupancy(&self) -> Vec<usize> {
        let mut occupancy = vec![0usize; self.torus.cells()];
        for agent in &self.agents {
            occupancy[self.torus.index(agent.x, agent.y)] += 1;
        }
        occupancy
    }

    /// Habitat match of `species` at a cell, under next tick's forcing.
    pub(super) fn habitat_efficiency(&self, species: u64, x: usize, y: usize, step_tick: u64) -> f64 {
        let fertility = self.biome.effective(x, y, &self.forcing, step_tick);
        self.strategies.habitat_match(species, fertility, &self.config)
    }

    /// Every living agent takes one turn, in a freshly shuffled order.
    pub(super) fn pass_agent_turns(&mut self, step_tick: u64) -> Result<()> {
        let mut occupancy = self.occupancy();
        let mut order: Vec<usize> = (0..self.agents.len()).collect();
        self.rng.shuffle(&mut order)?;

        let mut agents = std::mem::take(&mut self.agents);
        let mut outcome = Ok(());
        for index in order {
            if !agents[index].is_alive() {
                continue;
            }
            outcome = self.take_turn(&mut agents[index], &mut occupancy, step_tick);
            if outcome.is_err() {
                break;
            }
        }
        self.agents = agents;
        outcome
    }

    fn vacate(&self, occupancy: &mut [usize], x: usize, y: usize) {
        let cell = &mut occupancy[self.torus.index(x, y)];
        *cell = cell.saturating_sub(1);
    }

    /// Ageing and upkeep, an optional move, then foraging.
    fn take_turn(&mut self, agent: &mut Agent, occupancy: &mut [usize], step_tick: u64) -> Result<()> {
        agent.age += 1;
        agent.energy -= self.config.metabolism_cost_base * agent.genome.metabolism;
        agent.energy -= self.strategies.specialization_penalty(agent, &self.config);
        if agent.energy <= 0.0 || agent.age > self.config.max_age {
            self.vacate(occupancy, agent.x, agent.y);
            return Ok(());
        }

        let (x, y) = self.pick_destination(agent, occupancy, step_tick);
        if (x, y) != (agent.x, agent.y) {
            self.vacate(occupancy, agent.x, agent.y);
            occupancy[self.torus.index(x, y)] += 1;
            agent.x = x;
            agent.y = y;
            agent.energy -= self.config.move_cost * agent.genome.metabolism;
        }
        if agent.energy <= 0.0 {
            self.vacate(occupancy, agent.x, agent.y);
            return Ok(());
        }

        let demand = self.config.harvest_cap
            * agent.genome.harvest
            * self.habitat_efficiency(agent.species, agent.x, agent.y, step_tick)
            * self.strategies.trophic_efficiency(agent.species, &self.config)
            * self.strategies.defense_efficiency(agent.species, &self.config);
        agent.energy += self.resources.harvest(agent.x, agent.y, demand);
        Ok(())
    }

    /// Scores staying and the four neighbours by habitat-weighted food minus
    /// crowding plus a little jitter; the first strictly best option wins.
    fn pick_destination(&mut self, agent: &Agent, occupancy: &[usize], step_tick: u64) -> (usize, usize) {
        let options = self.torus.stay_or_step(agent.x, agent.y);
        let mut best = options[0];
        let mut best_score = f64::NEG_INFINITY;
        for (x, y) in options {
            let food = self.resources.at(x, y) * self.habitat_efficiency(agent.species, x, y, step_tick);
            let crowding = self.crowding(x, y, occupancy);
            let score = food - self.config.dispersal_pressure * crowding + self.rng.float() * 0.05;
            if score > best_score {
                best_score = score;
                best = (x, y);
            }
        }
        best
    }

    /// Occupancy around a cell, weighted by `1 / (distance + 1)`.
    fn crowding(&self, x: usize, y: usize, occupancy: &[usize]) -> f64 {
        let radius = self.config.dispersal_reach();
        if radius == 0 {
            return occupancy[self.torus.index(x, y)] as f64;
        }

        let r = radius as i64;
        let mut weighted = 0.0;
        let mut total_weight = 0.0;
        for dy in -r..=r {
            for dx in -r..=r {
                let distance = dx.abs() + dy.abs();
                if distance > r {
                    continue;
                }
                let weight = 1.0 / (distance as f64 + 1.0);
                let nx = self.torus.wrap_x(x as i64 + dx);
                let ny = self.torus.wrap_y(y as i64 + dy);
                weighted += occupancy[self.torus.index(nx, ny)] as f64 * weight;
                total_weight += weight;
            }
        }
        if total_weight == 0.0 {
            0.0
        } else {
            weighted / total_weight
        }
    }

    /// In every shared cell the most aggressive agent takes energy from
    /// each cohabitant.
    pub(super) fn resolve_encounters(&mut self) {
        let mut by_cell: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for (index, agent) in self.agents.iter().enumerate() {
            if agent.is_alive() {
                by_cell
                    .entry(self.torus.index(agent.x, agent.y))
                    .or_default()
                    .push(index);
            }
        }

        let mitigation = clamp(self.config.defense_mitigation, 0.0, 0.95);
        let predation = self.config.predation_pressure.max(0.0);
        for mut members in by_cell.into_values() {
            if members.len() < 2 {
                continue;
            }
            members.sort_by(|&a, &b| {
                let (a, b) = (&self.agents[a], &self.agents[b]);
                b.genome
                    .aggression
                    .partial_cmp(&a.genome.aggression)
                    .unwrap_or(Ordering::Equal)
                    .then(b.energy.partial_cmp(&a.energy).unwrap_or(Ordering::Equal))
            });

            let dominant = members[0];
            let dominant_aggression = self.agents[dominant].genome.aggression;
            let dominant_trophic = self.strategies.get(self.agents[dominant].species).trophic_level;
            for &target in &members[1..] {
                let prey = &self.agents[target];
                let prey_strategy = self.strategies.get(prey.species);
                let pressure = (dominant_aggression - prey.genome.aggression + 0.1).max(0.0);
                let predation_multiplier =
                    1.0 + predation * (dominant_trophic - prey_strategy.trophic_level).max(0.0);
                let defense_multiplier = (1.0 - mitigation * prey_strategy.defense_level).max(0.05);
                let stolen = prey
                    .energy
                    .min(prey.energy * pressure * 0.25 * predation_multiplier * defense_multiplier);
                if stolen <= 0.0 {
                    continue;
                }
                self.agents[target].energy -= stolen;
                self.agents[dominant].energy += stolen;
            }
        }
    }

    /// Living parents at or above the energy threshold reproduce with the
    /// configured probability. Offspring are returned, not yet placed.
    pub(super) fn pass_reproduction(&mut self) -> Result<Vec<Agent>> {
        let mut offspring = Vec::new();
        for index in 0..self.agents.len() {
            if !self.agents[index].is_alive() {
                continue;
            }
            if self.agents[index].energy >= self.config.reproduce_threshold
                && self.rng.float() < self.config.reproduce_probability
            {
                offspring.push(self.reproduce(index)?);
            }
        }
        Ok(offspring)
    }

    fn reproduce(&mut self, parent_index: usize) -> Result<Agent> {
        let child_energy = self.agents[parent_index].energy * self.config.offspring_energy_fraction;
        self.agents[parent_index].energy -= child_energy;

        let parent = self.agents[parent_index].clone();
        let child_genome = self.mutate(&parent.genome);
        let species = if parent.genome.distance(&child_genome) >= self.config.speciation_threshold {
            let species = self.next_species_id;
            self.next_species_id += 1;
            self.strategies
                .speciate(parent.species, species, &parent.genome, &child_genome, &self.config);
            species
        } else {
            parent.species
        };

        let (x, y) = *self
            .rng
            .pick(&self.torus.stay_or_step(parent.x, parent.y))?;
        let id = self.next_agent_id;
        self.next_agent_id += 1;
        Ok(Agent {
            id,
            lineage: parent.lineage,
            species,
            x,
            y,
            energy: child_energy,
            age: 0,
            genome: child_genome,
        })
    }

    fn mutate(&mut self, genome: &Genome) -> Genome {
        Genome {
            metabolism: self.mutate_trait(genome.metabolism, GENOME_MIN.metabolism, GENOME_MAX.metabolism),
            harvest: self.mutate_trait(genome.harvest, GENOME_MIN.harvest, GENOME_MAX.harvest),
            aggression: self.mutate_trait(genome.aggression, GENOME_MIN.aggression, GENOME_MAX.aggression),
        }
    }

    /// Triangular perturbation in `(-amount, amount)`, clamped to bounds.
    fn mutate_trait(&mut self, value: f64, min: f64, max: f64) -> f64 {
        let delta = (self.rng.float() + self.rng.float() - 1.0) * self.config.mutation_amount;
        clamp(value + delta, min, max)
    }
}
