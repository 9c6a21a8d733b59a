mod common;

use common::SimulationBuilder;
use refugium_lib::model::data::TaxonTimelinePoint;

/// Species 1 starts with two units of energy, species 2 with one; each pays
/// one unit per tick and finds no food.
fn starving_pair() -> SimulationBuilder {
    SimulationBuilder::new()
        .starving()
        .with_agent_at(0, 0, 2.0)
        .with_agent_at(5, 5, 1.0)
}

fn point(tick: u64, population: usize, births: usize, deaths: usize) -> TaxonTimelinePoint {
    TaxonTimelinePoint {
        tick,
        population,
        births,
        deaths,
    }
}

#[test]
fn test_taxon_lifecycle_under_starvation() {
    let mut sim = starving_pair().build();

    let first = sim.step().unwrap();
    assert_eq!(first.population, 1);
    assert_eq!(first.deaths, 1);
    assert_eq!(first.species_extinctions, 1);
    assert_eq!(first.cumulative_extinct_species, 1);

    let second = sim.step().unwrap();
    assert_eq!(second.population, 0);
    assert_eq!(second.deaths, 1);
    assert_eq!(second.species_extinctions, 1);
    assert_eq!(second.cumulative_extinct_species, 2);
    assert_eq!(second.cumulative_extinct_clades, 2);

    let history = sim.history();
    assert_eq!(history.extinct_species, 2);
    assert_eq!(history.extinct_clades, 2);

    let species1 = &history.species[0];
    assert_eq!(species1.id, 1);
    assert_eq!(species1.extinct_tick, Some(2));
    assert_eq!(
        species1.timeline,
        vec![point(0, 1, 1, 0), point(1, 1, 0, 0), point(2, 0, 0, 1)]
    );

    let species2 = &history.species[1];
    assert_eq!(species2.id, 2);
    assert_eq!(species2.extinct_tick, Some(1));
    assert_eq!(species2.timeline, vec![point(0, 1, 1, 0), point(1, 0, 0, 1)]);
    assert_eq!(species2.total_deaths, 1);
    assert_eq!(species2.peak_population, 1);
}

#[test]
fn test_rolling_extinction_rates() {
    let mut sim = starving_pair().build();
    sim.run(2).unwrap();

    let wide = sim.analytics(2).unwrap();
    assert_eq!((wide.window.start_tick, wide.window.end_tick, wide.window.size), (1, 2, 2));
    assert_eq!(wide.species.extinctions_in_window, 2);
    assert_eq!(wide.species.extinction_rate, 1.0);
    assert_eq!(wide.species.net_diversification_rate, -1.0);
    assert_eq!(wide.species.extinct_lifespan.count, 2);
    assert_eq!(wide.species.extinct_lifespan.mean, 1.5);
    assert_eq!(wide.species.extinct_lifespan.max, 2);
    assert_eq!(wide.species.active_age.count, 0);

    let narrow = sim.analytics(1).unwrap();
    assert_eq!(narrow.species.extinctions_in_window, 1);
    assert_eq!(narrow.species.extinction_rate, 1.0);
    assert_eq!(narrow.clades.extinctions_in_window, 1);
}

#[test]
fn test_run_stops_when_extinct() {
    let mut sim = starving_pair().build();
    let series = sim.run_with_analytics(10, 5, true).unwrap();
    assert_eq!(series.summaries.len(), 2);
    assert_eq!(series.analytics.len(), 2);
    assert_eq!(series.summaries[1].population, 0);
    assert_eq!(series.analytics[1].tick, 2);
}

#[test]
fn test_run_continues_past_extinction_when_asked() {
    let mut sim = starving_pair().build();
    let series = sim.run_with_analytics(6, 5, false).unwrap();
    assert_eq!(series.summaries.len(), 6);
    assert_eq!(sim.tick(), 6);
    assert!(series.summaries[2..].iter().all(|s| s.population == 0));
    assert_eq!(sim.history().extinct_species, 2);
}

#[test]
fn test_dead_agents_feed_their_cell() {
    let mut sim = SimulationBuilder::new()
        .starving()
        .with_agent_at(3, 3, 1.0)
        .build();
    sim.set_resource(3, 3, 0.0);
    let fertility = sim.get_biome_fertility(3, 3);

    let summary = sim.step().unwrap();
    assert_eq!(summary.deaths, 1);
    let expected = sim.config().decomposition_base * fertility.clamp(0.1, 2.0);
    assert!((sim.get_resource(3, 3) - expected).abs() < 1e-9);
}

#[test]
fn test_old_age_kills() {
    let mut sim = SimulationBuilder::new()
        .with_config(|c| {
            c.max_age = 3;
            c.reproduce_probability = 0.0;
        })
        .with_agent_at(1, 1, 50.0)
        .build();
    let summaries = sim.run(3).unwrap();
    assert_eq!(summaries[2].population, 1);
    let summary = sim.step().unwrap();
    assert_eq!(summary.population, 0);
    assert_eq!(summary.deaths, 1);
}

#[test]
fn test_empty_world_is_all_zero() {
    let mut sim = SimulationBuilder::new().build();
    let summary = sim.step().unwrap();
    assert_eq!(summary.population, 0);
    assert_eq!(summary.mean_energy, 0.0);
    assert_eq!(summary.dominant_species_share, 0.0);

    let analytics = sim.analytics(5).unwrap();
    assert_eq!(analytics.locality.occupied_cells, 0);
    assert_eq!(analytics.strategy.active_species, 0);
    assert_eq!(analytics.resilience.memory_event_count, 0);
    assert!(analytics.locality.mean_dominant_species_share.is_finite());
}
