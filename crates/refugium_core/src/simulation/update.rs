use super::LifeSimulation;
use crate::disturbance::{DisturbanceEvent, ShockCensus};
use crate::error::Result;
use crate::stats::Tally;
use crate::taxon_registry::TickCensus;
use refugium_data::{Agent, StepSummary};
use std::collections::HashSet;

impl LifeSimulation {
    /// Advances the simulation by one tick.
    ///
    /// Phases run in a fixed order:
    /// 1. Resource regeneration under next tick's seasonal forcing
    /// 2. Scheduled disturbance
    /// 3. Agent turns in shuffled order
    /// 4. Encounters in shared cells
    /// 5. Reproduction
    /// 6. Mortality and nutrient recycling
    /// 7. Taxon history, locality frame and disturbance recovery bookkeeping
    pub fn step(&mut self) -> Result<StepSummary> {
        let before_count = self.agents.len();
        let step_tick = self.tick + 1;

        self.resources
            .regenerate(self.config.resource_regen, &self.biome, &self.forcing, step_tick);
        self.pass_disturbance(step_tick)?;
        self.pass_agent_turns(step_tick)?;
        self.resolve_encounters();

        let offspring = self.pass_reproduction()?;
        let births = offspring.len();
        let birth_lineages = Tally::from_keys(offspring.iter().map(|a| a.lineage));
        let birth_species = Tally::from_keys(offspring.iter().map(|a| a.species));
        self.agents.extend(offspring);

        let dead = self.pass_mortality(step_tick);

        let after_count = self.agents.len();
        let mean_energy = self.mean_energy();
        let mean_genome = self.mean_genome();
        let diversity = self.diversity();
        self.tick = step_tick;

        let clade_delta = self.clades.record_tick(
            self.tick,
            &TickCensus {
                population: &Tally::from_keys(self.agents.iter().map(|a| a.lineage)),
                births: &birth_lineages,
                deaths: &Tally::from_keys(dead.iter().map(|a| a.lineage)),
            },
        );
        let species_delta = self.species.record_tick(
            self.tick,
            &TickCensus {
                population: &Tally::from_keys(self.agents.iter().map(|a| a.species)),
                births: &birth_species,
                deaths: &Tally::from_keys(dead.iter().map(|a| a.species)),
            },
        );
        self.extinct_clades = apply_delta(self.extinct_clades, clade_delta);
        self.extinct_species = apply_delta(self.extinct_species, species_delta);

        self.record_locality(self.tick);
        self.disturbances
            .observe(self.tick, after_count, diversity.active_species);

        if clade_delta > 0 || species_delta > 0 {
            tracing::debug!(
                tick = self.tick,
                clade_extinctions = clade_delta.max(0),
                species_extinctions = species_delta.max(0),
                "Taxa went extinct"
            );
        }
        if after_count == 0 && before_count > 0 {
            tracing::info!(tick = self.tick, "Population extinct");
        }

        let summary = StepSummary {
            tick: self.tick,
            population: after_count,
            births,
            deaths: (before_count + births).saturating_sub(after_count),
            mean_energy,
            mean_genome,
            active_clades: diversity.active_clades,
            active_species: diversity.active_species,
            dominant_species_share: diversity.dominant_species_share,
            selection_differential: self.selection_differential(&mean_genome),
            clade_extinctions: clade_delta.max(0) as usize,
            species_extinctions: species_delta.max(0) as usize,
            cumulative_extinct_clades: self.extinct_clades,
            cumulative_extinct_species: self.extinct_species,
        };
        tracing::trace!(?summary, "Step complete");
        Ok(summary)
    }

    /// Applies the scheduled disturbance, if any, and logs the event.
    fn pass_disturbance(&mut self, step_tick: u64) -> Result<()> {
        if !self.regime.is_scheduled(step_tick) || self.regime.is_harmless() {
            return Ok(());
        }
        let footprint = self.regime.footprint(self.torus, &mut self.rng)?;
        if footprint.is_empty() {
            return Ok(());
        }

        let before = self.shock_census();
        if self.regime.resource_loss > 0.0 {
            self.resources
                .scale_cells(&footprint.affected, 1.0 - self.regime.resource_loss);
        }
        if self.regime.energy_loss > 0.0 {
            let factor = 1.0 - self.regime.energy_loss;
            let torus = self.torus;
            for agent in &mut self.agents {
                if footprint.contains(torus.index(agent.x, agent.y)) {
                    agent.energy *= factor;
                }
            }
        }
        let after = self.shock_census();

        let event = DisturbanceEvent::new(step_tick, &footprint, self.torus.cells(), before, after);
        tracing::debug!(
            tick = step_tick,
            targeted = event.targeted_cells,
            affected = event.affected_cells,
            population_before = event.population_before,
            population_after = event.population_after_shock,
            "Disturbance applied"
        );
        self.disturbances.push(event);
        Ok(())
    }

    fn shock_census(&self) -> ShockCensus {
        let living = || self.agents.iter().filter(|a| a.is_alive());
        ShockCensus {
            population: living().count(),
            active_species: living().map(|a| a.species).collect::<HashSet<_>>().len(),
            total_resources: self.resources.total(),
        }
    }

    /// Removes starved and aged-out agents and returns their remains to the
    /// soil. Returns the dead, in population order.
    fn pass_mortality(&mut self, step_tick: u64) -> Vec<Agent> {
        let max_age = self.config.max_age;
        let (survivors, dead): (Vec<Agent>, Vec<Agent>) = std::mem::take(&mut self.agents)
            .into_iter()
            .partition(|a| a.is_alive() && a.age <= max_age);

        for agent in &dead {
            let fertility = self.biome.effective(agent.x, agent.y, &self.forcing, step_tick);
            let recycled = (self.config.decomposition_base
                + agent.energy.max(0.0) * self.config.decomposition_energy_fraction)
                * fertility;
            if recycled > 0.0 {
                self.resources.deposit(agent.x, agent.y, recycled);
            }
        }
        self.agents = survivors;
        dead
    }
}

fn apply_delta(count: usize, delta: i64) -> usize {
    if delta >= 0 {
        count + delta as usize
    } else {
        count.saturating_sub(delta.unsigned_abs() as usize)
    }
}
