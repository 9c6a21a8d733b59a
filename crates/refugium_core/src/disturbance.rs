//! Scheduled disturbances and the resilience measured after them.
//!
//! A disturbance removes a fraction of agent energy and cell resources in a
//! footprint of cells. Every event keeps tracking the population afterwards:
//! the trough it falls into, when it first regains its pre-shock size and how
//! often it slips back below that size.

use crate::config::{clamp_unit, SimulationConfig};
use crate::environment::{SeasonalForcing, Torus};
use crate::error::Result;
use crate::rng::Rng;
use crate::stats::clamp;
use crate::taxon_registry::TaxonRegistry;
use refugium_data::{DisturbanceAnalytics, ResilienceAnalytics, TurnoverWindow};
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;

/// Stability of a recovery: full progress held for long with no relapses
/// approaches `progress`; every relapse pulls it toward zero.
#[must_use]
pub fn resilience_stability_index(progress: f64, sustained_ticks: f64, relapses: f64) -> f64 {
    let progress = clamp(progress, 0.0, 1.0);
    let sustained = sustained_ticks.max(0.0);
    let relapses = relapses.max(0.0);
    progress * (sustained + 1.0) / (sustained + relapses + 1.0)
}

/// Normalized disturbance parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisturbanceRegime {
    pub interval: u64,
    pub phase_offset: f64,
    pub energy_loss: f64,
    pub resource_loss: f64,
    /// `-1` targets the whole grid.
    pub radius: i64,
    pub refugia_fraction: f64,
}

impl DisturbanceRegime {
    #[must_use]
    pub fn from_config(config: &SimulationConfig) -> Self {
        Self {
            interval: config.disturbance_period(),
            phase_offset: config.disturbance_phase(),
            energy_loss: clamp_unit(config.disturbance_energy_loss),
            resource_loss: clamp_unit(config.disturbance_resource_loss),
            radius: config.disturbance_reach(),
            refugia_fraction: config.refugia_fraction(),
        }
    }

    fn phase_tick(&self) -> u64 {
        (self.phase_offset * self.interval as f64).floor() as u64
    }

    #[must_use]
    pub fn is_scheduled(&self, step_tick: u64) -> bool {
        if self.interval == 0 || step_tick == 0 {
            return false;
        }
        step_tick % self.interval == self.phase_tick()
    }

    #[must_use]
    pub fn is_harmless(&self) -> bool {
        self.energy_loss <= 0.0 && self.resource_loss <= 0.0
    }

    /// Chooses the targeted cells and, after sparing refugia, the affected ones.
    ///
    /// A localized footprint draws its center (x then y) from `rng`; partial
    /// refugia shuffle a copy of the targeted cells.
    pub fn footprint(&self, torus: Torus, rng: &mut Rng) -> Result<Footprint> {
        let total = torus.cells();
        let targeted: Vec<usize> = if self.radius < 0 {
            (0..total).collect()
        } else {
            let cx = rng.int(torus.width)?;
            let cy = rng.int(torus.height)?;
            torus.diamond(cx, cy, usize::try_from(self.radius).unwrap_or(usize::MAX))
        };

        let affected = if targeted.is_empty() || self.refugia_fraction <= 0.0 {
            targeted.clone()
        } else {
            let count = (targeted.len() as f64 * (1.0 - self.refugia_fraction)).floor() as usize;
            if count == 0 {
                Vec::new()
            } else if count >= targeted.len() {
                targeted.clone()
            } else {
                let mut shuffled = targeted.clone();
                rng.shuffle(&mut shuffled)?;
                shuffled.truncate(count);
                shuffled
            }
        };

        let mut mask = vec![false; total];
        for &index in &affected {
            mask[index] = true;
        }
        Ok(Footprint {
            targeted: targeted.len(),
            affected,
            mask,
        })
    }
}

/// Cells hit by one disturbance.
#[derive(Debug, Clone)]
pub struct Footprint {
    pub targeted: usize,
    pub affected: Vec<usize>,
    mask: Vec<bool>,
}

impl Footprint {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.affected.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn contains(&self, cell: usize) -> bool {
        self.mask.get(cell).copied().unwrap_or(false)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DisturbanceEvent {
    pub tick: u64,
    pub population_before: usize,
    pub population_after_shock: usize,
    pub active_species_before: usize,
    pub active_species_after_shock: usize,
    pub total_resources_before: f64,
    pub total_resources_after_shock: f64,
    pub targeted_cells: usize,
    pub affected_cells: usize,
    pub total_cells: usize,
    pub min_population_since_event: usize,
    pub min_population_tick_since_event: u64,
    pub min_active_species_since_event: usize,
    pub recovery_tick: Option<u64>,
    pub recovery_relapses: u64,
}

/// Snapshot of the world around a shock.
#[derive(Debug, Clone, Copy)]
pub struct ShockCensus {
    pub population: usize,
    pub active_species: usize,
    pub total_resources: f64,
}

impl DisturbanceEvent {
    #[must_use]
    pub fn new(
        tick: u64,
        footprint: &Footprint,
        total_cells: usize,
        before: ShockCensus,
        after: ShockCensus,
    ) -> Self {
        let recovered = before.population == 0 || after.population >= before.population;
        Self {
            tick,
            population_before: before.population,
            population_after_shock: after.population,
            active_species_before: before.active_species,
            active_species_after_shock: after.active_species,
            total_resources_before: before.total_resources,
            total_resources_after_shock: after.total_resources,
            targeted_cells: footprint.targeted,
            affected_cells: footprint.affected.len(),
            total_cells,
            min_population_since_event: after.population,
            min_population_tick_since_event: tick,
            min_active_species_since_event: after.active_species,
            recovery_tick: recovered.then_some(tick),
            recovery_relapses: 0,
        }
    }

    fn population_shock(&self) -> f64 {
        if self.population_before == 0 {
            return 0.0;
        }
        let before = self.population_before as f64;
        clamp((before - self.population_after_shock as f64) / before, 0.0, 1.0)
    }

    /// Ticks from the event to its current recovery, `-1` if unrecovered.
    #[must_use]
    pub fn recovery_lag(&self) -> i64 {
        match self.recovery_tick {
            Some(t) => t.saturating_sub(self.tick) as i64,
            None => -1,
        }
    }

    fn recovery_state(&self, now: u64, population: usize) -> RecoveryState {
        if self.population_before == 0 {
            return RecoveryState {
                ticks: 0,
                progress: 1.0,
                relapses: 0,
                sustained: 0,
            };
        }
        RecoveryState {
            ticks: self.recovery_lag(),
            progress: clamp(population as f64 / self.population_before as f64, 0.0, 1.0),
            relapses: self.recovery_relapses,
            sustained: self.recovery_tick.map_or(0, |t| now.saturating_sub(t)),
        }
    }
}

struct RecoveryState {
    ticks: i64,
    progress: f64,
    relapses: u64,
    sustained: u64,
}

impl RecoveryState {
    fn stability(&self) -> f64 {
        resilience_stability_index(self.progress, self.sustained as f64, self.relapses as f64)
    }
}

/// Circular mean and concentration of phases in `[0, 1)`.
fn circular_phase(phases: &[f64]) -> (f64, f64) {
    if phases.is_empty() {
        return (0.0, 0.0);
    }
    let n = phases.len() as f64;
    let (sin_total, cos_total) = phases.iter().fold((0.0, 0.0), |(s, c), phase| {
        let angle = phase * TAU;
        (s + angle.sin(), c + angle.cos())
    });
    let (mean_sin, mean_cos) = (sin_total / n, cos_total / n);
    let concentration = clamp((mean_sin.powi(2) + mean_cos.powi(2)).sqrt(), 0.0, 1.0);
    if concentration == 0.0 {
        return (0.0, 0.0);
    }
    let mut mean = mean_sin.atan2(mean_cos) / TAU;
    if mean < 0.0 {
        mean += 1.0;
    }
    (mean, concentration)
}

/// Every disturbance event in order of occurrence.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct DisturbanceLog {
    pub events: Vec<DisturbanceEvent>,
}

impl DisturbanceLog {
    pub fn push(&mut self, event: DisturbanceEvent) {
        self.events.push(event);
    }

    #[must_use]
    pub fn latest(&self) -> Option<&DisturbanceEvent> {
        self.events.last()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Folds the end-of-tick census into every event that has already happened.
    pub fn observe(&mut self, tick: u64, population: usize, active_species: usize) {
        for event in self.events.iter_mut().filter(|e| e.tick <= tick) {
            if population < event.min_population_since_event {
                event.min_population_since_event = population;
                event.min_population_tick_since_event = tick;
            }
            event.min_active_species_since_event =
                event.min_active_species_since_event.min(active_species);
            if event.population_before == 0 {
                continue;
            }
            if population < event.population_before {
                if event.recovery_tick.is_some() {
                    event.recovery_relapses += 1;
                }
                event.recovery_tick = None;
            } else if event.recovery_tick.is_none() {
                event.recovery_tick = Some(tick);
            }
        }
    }

    #[must_use]
    pub fn count_in(&self, window: &TurnoverWindow) -> usize {
        self.events
            .iter()
            .filter(|e| e.tick >= window.start_tick && e.tick <= window.end_tick)
            .count()
    }

    #[must_use]
    pub fn analytics(&self, regime: &DisturbanceRegime, window: &TurnoverWindow) -> DisturbanceAnalytics {
        let latest = self.latest();
        let resource_shock = latest.map_or(0.0, |e| {
            if e.total_resources_before <= 0.0 {
                0.0
            } else {
                clamp(
                    (e.total_resources_before - e.total_resources_after_shock)
                        / e.total_resources_before,
                    0.0,
                    1.0,
                )
            }
        });
        let affected_fraction = latest.map_or(0.0, |e| {
            if e.total_cells == 0 {
                0.0
            } else {
                clamp(e.affected_cells as f64 / e.total_cells as f64, 0.0, 1.0)
            }
        });
        let refugia_fraction = latest.map_or(0.0, |e| {
            if e.targeted_cells == 0 {
                0.0
            } else {
                let spared = e.targeted_cells.saturating_sub(e.affected_cells) as f64;
                clamp(spared / e.targeted_cells as f64, 0.0, 1.0)
            }
        });

        DisturbanceAnalytics {
            interval: regime.interval,
            phase_offset: regime.phase_offset,
            energy_loss: regime.energy_loss,
            resource_loss: regime.resource_loss,
            radius: regime.radius,
            refugia_fraction: regime.refugia_fraction,
            events_in_window: self.count_in(window),
            last_event_tick: latest.map_or(0, |e| e.tick),
            last_event_population_shock: latest.map_or(0.0, DisturbanceEvent::population_shock),
            last_event_resource_shock: resource_shock,
            last_event_affected_cell_fraction: affected_fraction,
            last_event_refugia_cell_fraction: refugia_fraction,
        }
    }

    /// Recovery of the latest event plus aggregates over every event that hit
    /// a living population.
    #[must_use]
    pub fn resilience(
        &self,
        now: u64,
        population: usize,
        forcing: &SeasonalForcing,
        species: &TaxonRegistry,
    ) -> ResilienceAnalytics {
        let Some(latest) = self.latest() else {
            return ResilienceAnalytics::default();
        };

        let memory: Vec<&DisturbanceEvent> = self
            .events
            .iter()
            .filter(|e| e.population_before > 0)
            .collect();
        let phases: Vec<f64> = memory.iter().map(|e| forcing.phase(e.tick)).collect();
        let (phase_mean, phase_concentration) = circular_phase(&phases);

        let mut recovered = 0usize;
        let mut lag_total = 0i64;
        let mut relapsed = 0usize;
        let mut stability_total = 0.0;
        for event in &memory {
            let state = event.recovery_state(now, population);
            let lag = event.recovery_lag();
            if lag >= 0 {
                recovered += 1;
                lag_total += lag;
            }
            if state.relapses > 0 {
                relapsed += 1;
            }
            stability_total += state.stability();
        }
        let memory_count = memory.len();
        let fraction = |count: f64, of: usize| if of == 0 { 0.0 } else { count / of as f64 };

        let state = latest.recovery_state(now, population);
        let immediate_shock = latest.population_shock();
        let (trough_depth, trough_ticks) = if latest.population_before == 0 {
            (0.0, 0)
        } else {
            let before = latest.population_before as f64;
            (
                clamp(
                    (before - latest.min_population_since_event as f64) / before,
                    0.0,
                    1.0,
                ),
                latest
                    .min_population_tick_since_event
                    .saturating_sub(latest.tick),
            )
        };

        let (post_size, post_rate) = species.turnover_rate_between(latest.tick, now);
        let pre_rate = match latest.tick.checked_sub(1) {
            Some(pre_end) if pre_end >= 1 => {
                let pre_start = (pre_end + 1).saturating_sub(post_size).max(1);
                species.turnover_rate_between(pre_start, pre_end).1
            }
            _ => 0.0,
        };
        let turnover_spike = if pre_rate <= 0.0 {
            post_rate
        } else {
            post_rate / pre_rate
        };

        ResilienceAnalytics {
            recovery_ticks: state.ticks,
            recovery_progress: state.progress,
            recovery_relapses: state.relapses,
            sustained_recovery_ticks: state.sustained,
            population_trough_depth: trough_depth,
            population_trough_ticks: trough_ticks,
            delayed_population_shock_depth: (trough_depth - immediate_shock).max(0.0),
            pre_disturbance_turnover_rate: pre_rate,
            post_disturbance_turnover_rate: post_rate,
            turnover_spike,
            extinction_burst_depth: latest
                .active_species_before
                .saturating_sub(latest.min_active_species_since_event),
            memory_event_count: memory_count,
            memory_recovered_event_fraction: fraction(recovered as f64, memory_count),
            memory_relapse_event_fraction: fraction(relapsed as f64, memory_count),
            memory_stability_index_mean: fraction(stability_total, memory_count),
            latest_event_seasonal_phase: forcing.phase(latest.tick),
            latest_event_recovery_lag_ticks: latest.recovery_lag(),
            memory_recovery_lag_ticks_mean: fraction(lag_total as f64, recovered),
            memory_event_phase_mean: phase_mean,
            memory_event_phase_concentration: phase_concentration,
        }
    }
}
