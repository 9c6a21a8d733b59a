use crate::stats::Tally;
use refugium_data::{
    DurationStats, SpeciesTurnoverAnalytics, TaxonHistory, TaxonTimelinePoint,
    TaxonTurnoverAnalytics, TurnoverWindow,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Lifecycle bookkeeping for one clade or species.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct TaxonRecord {
    pub id: u64,
    pub first_seen_tick: u64,
    pub extinct_tick: Option<u64>,
    pub total_births: usize,
    pub total_deaths: usize,
    pub peak_population: usize,
    pub last_population: usize,
    pub timeline: Vec<TaxonTimelinePoint>,
}

impl TaxonRecord {
    fn founded(id: u64, tick: u64) -> Self {
        Self {
            id,
            first_seen_tick: tick,
            extinct_tick: None,
            total_births: 0,
            total_deaths: 0,
            peak_population: 0,
            last_population: 0,
            timeline: Vec::new(),
        }
    }

    #[must_use]
    pub fn is_extinct(&self) -> bool {
        self.extinct_tick.is_some()
    }
}

/// Counts of a taxon rank changed during one tick.
pub struct TickCensus<'a> {
    pub population: &'a Tally,
    pub births: &'a Tally,
    pub deaths: &'a Tally,
}

/// Registry of every taxon of one rank that has ever existed.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct TaxonRegistry {
    pub taxa: BTreeMap<u64, TaxonRecord>,
}

impl TaxonRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the founding population at tick zero.
    pub fn seed(&mut self, population: &Tally) {
        for (id, count) in population.iter() {
            self.taxa.insert(
                id,
                TaxonRecord {
                    id,
                    first_seen_tick: 0,
                    extinct_tick: None,
                    total_births: count,
                    total_deaths: 0,
                    peak_population: count,
                    last_population: count,
                    timeline: vec![TaxonTimelinePoint {
                        tick: 0,
                        population: count,
                        births: count,
                        deaths: 0,
                    }],
                },
            );
        }
    }

    /// Appends a timeline point for every taxon touched this tick and returns
    /// the net change in the number of extinct taxa (revivals count as -1).
    pub fn record_tick(&mut self, tick: u64, census: &TickCensus<'_>) -> i64 {
        let mut touched: BTreeSet<u64> = BTreeSet::new();
        touched.extend(census.population.keys());
        touched.extend(census.births.keys());
        touched.extend(census.deaths.keys());
        touched.extend(
            self.taxa
                .values()
                .filter(|record| !record.is_extinct() || record.last_population > 0)
                .map(|record| record.id),
        );

        let mut extinction_delta = 0i64;
        for id in touched {
            let population = census.population.get(id);
            let births = census.births.get(id);
            let deaths = census.deaths.get(id);

            let record = self
                .taxa
                .entry(id)
                .or_insert_with(|| TaxonRecord::founded(id, tick));

            let had_population = record.last_population > 0 || births > 0;
            let was_extinct = record.is_extinct();

            record.total_births += births;
            record.total_deaths += deaths;
            record.peak_population = record.peak_population.max(population);

            if was_extinct && population > 0 {
                record.extinct_tick = None;
                extinction_delta -= 1;
            }
            if !record.is_extinct() && had_population && population == 0 {
                record.extinct_tick = Some(tick);
                extinction_delta += 1;
            }

            record.timeline.push(TaxonTimelinePoint {
                tick,
                population,
                births,
                deaths,
            });
            record.last_population = population;
        }
        extinction_delta
    }

    /// Exported histories, sorted by id.
    #[must_use]
    pub fn export(&self) -> Vec<TaxonHistory> {
        self.taxa
            .values()
            .map(|record| TaxonHistory {
                id: record.id,
                first_seen_tick: record.first_seen_tick,
                extinct_tick: record.extinct_tick,
                total_births: record.total_births,
                total_deaths: record.total_deaths,
                peak_population: record.peak_population,
                timeline: record.timeline.clone(),
            })
            .collect()
    }

    /// Taxa first seen after tick zero inside `[start, end]`.
    #[must_use]
    pub fn originations_between(&self, start: u64, end: u64) -> usize {
        self.taxa
            .values()
            .filter(|r| r.first_seen_tick > 0 && (start..=end).contains(&r.first_seen_tick))
            .count()
    }

    #[must_use]
    pub fn extinctions_between(&self, start: u64, end: u64) -> usize {
        self.taxa
            .values()
            .filter(|r| r.extinct_tick.is_some_and(|t| (start..=end).contains(&t)))
            .count()
    }

    /// Species turnover per tick over `[start_tick, end_tick]`, with the
    /// start floored at one. Returns the span size alongside the rate.
    #[must_use]
    pub fn turnover_rate_between(&self, start_tick: u64, end_tick: u64) -> (u64, f64) {
        let start = start_tick.max(1);
        if end_tick < start {
            return (0, 0.0);
        }
        let size = end_tick - start + 1;
        let events =
            self.originations_between(start, end_tick) + self.extinctions_between(start, end_tick);
        (size, events as f64 / size as f64)
    }

    fn extinct_lifespans(&self) -> Vec<u64> {
        self.taxa
            .values()
            .filter_map(|r| r.extinct_tick.map(|t| t.saturating_sub(r.first_seen_tick)))
            .collect()
    }

    fn active_ages(&self, now: u64) -> Vec<u64> {
        self.taxa
            .values()
            .filter(|r| !r.is_extinct())
            .map(|r| now.saturating_sub(r.first_seen_tick))
            .collect()
    }

    fn window_rates(&self, window: &TurnoverWindow) -> WindowRates {
        let originations = self.originations_between(window.start_tick, window.end_tick);
        let extinctions = self.extinctions_between(window.start_tick, window.end_tick);
        let per_tick = |count: f64| {
            if window.size == 0 {
                0.0
            } else {
                count / window.size as f64
            }
        };
        WindowRates {
            originations,
            extinctions,
            origination_rate: per_tick(originations as f64),
            extinction_rate: per_tick(extinctions as f64),
            turnover_rate: per_tick((originations + extinctions) as f64),
            net_rate: per_tick(originations as f64 - extinctions as f64),
        }
    }

    #[must_use]
    pub fn species_turnover(&self, window: &TurnoverWindow, now: u64) -> SpeciesTurnoverAnalytics {
        let rates = self.window_rates(window);
        SpeciesTurnoverAnalytics {
            speciations_in_window: rates.originations,
            extinctions_in_window: rates.extinctions,
            speciation_rate: rates.origination_rate,
            extinction_rate: rates.extinction_rate,
            turnover_rate: rates.turnover_rate,
            net_diversification_rate: rates.net_rate,
            extinct_lifespan: summarize_durations(&self.extinct_lifespans()),
            active_age: summarize_durations(&self.active_ages(now)),
        }
    }

    #[must_use]
    pub fn clade_turnover(&self, window: &TurnoverWindow, now: u64) -> TaxonTurnoverAnalytics {
        let rates = self.window_rates(window);
        TaxonTurnoverAnalytics {
            originations_in_window: rates.originations,
            extinctions_in_window: rates.extinctions,
            origination_rate: rates.origination_rate,
            extinction_rate: rates.extinction_rate,
            turnover_rate: rates.turnover_rate,
            net_diversification_rate: rates.net_rate,
            extinct_lifespan: summarize_durations(&self.extinct_lifespans()),
            active_age: summarize_durations(&self.active_ages(now)),
        }
    }
}

struct WindowRates {
    originations: usize,
    extinctions: usize,
    origination_rate: f64,
    extinction_rate: f64,
    turnover_rate: f64,
    net_rate: f64,
}

fn summarize_durations(values: &[u64]) -> DurationStats {
    if values.is_empty() {
        return DurationStats::default();
    }
    let total: u64 = values.iter().sum();
    DurationStats {
        count: values.len(),
        mean: total as f64 / values.len() as f64,
        max: values.iter().copied().max().unwrap_or(0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn census_tick(
        registry: &mut TaxonRegistry,
        tick: u64,
        population: &[u64],
        births: &[u64],
        deaths: &[u64],
    ) -> i64 {
        let population = Tally::from_keys(population.iter().copied());
        let births = Tally::from_keys(births.iter().copied());
        let deaths = Tally::from_keys(deaths.iter().copied());
        registry.record_tick(
            tick,
            &TickCensus {
                population: &population,
                births: &births,
                deaths: &deaths,
            },
        )
    }

    #[test]
    fn test_seed_records_founders() {
        let mut registry = TaxonRegistry::new();
        registry.seed(&Tally::from_keys([1, 1, 2]));
        let history = registry.export();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].total_births, 2);
        assert_eq!(history[0].timeline[0].population, 2);
        assert_eq!(history[1].first_seen_tick, 0);
    }

    #[test]
    fn test_extinction_recorded_once() {
        let mut registry = TaxonRegistry::new();
        registry.seed(&Tally::from_keys([1, 2]));
        assert_eq!(census_tick(&mut registry, 1, &[1], &[], &[2]), 1);
        assert_eq!(registry.taxa[&2].extinct_tick, Some(1));
        // An extinct taxon with no population is no longer touched.
        assert_eq!(census_tick(&mut registry, 2, &[1], &[], &[]), 0);
        assert_eq!(registry.taxa[&2].timeline.len(), 2);
    }

    #[test]
    fn test_new_taxon_born_and_dying_same_tick() {
        let mut registry = TaxonRegistry::new();
        registry.seed(&Tally::from_keys([1]));
        let delta = census_tick(&mut registry, 3, &[1], &[9], &[9]);
        assert_eq!(delta, 1);
        let record = &registry.taxa[&9];
        assert_eq!(record.first_seen_tick, 3);
        assert_eq!(record.extinct_tick, Some(3));
        assert_eq!(registry.originations_between(1, 3), 1);
        assert_eq!(registry.extinctions_between(3, 3), 1);
    }

    #[test]
    fn test_turnover_rate_between_floors_start() {
        let mut registry = TaxonRegistry::new();
        registry.seed(&Tally::from_keys([1]));
        census_tick(&mut registry, 1, &[1, 5], &[5], &[]);
        let (size, rate) = registry.turnover_rate_between(0, 2);
        assert_eq!(size, 2);
        assert!((rate - 0.5).abs() < 1e-12);
        assert_eq!(registry.turnover_rate_between(3, 2), (0, 0.0));
    }

    #[test]
    fn test_summarize_durations() {
        assert_eq!(summarize_durations(&[]), DurationStats::default());
        let stats = summarize_durations(&[2, 1]);
        assert_eq!(stats.count, 2);
        assert!((stats.mean - 1.5).abs() < 1e-12);
        assert_eq!(stats.max, 2);
    }
}
