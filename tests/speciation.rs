mod common;

use common::SimulationBuilder;
use std::collections::BTreeSet;

fn three_breeders() -> SimulationBuilder {
    SimulationBuilder::new()
        .fertile()
        .with_agent_at(0, 0, 40.0)
        .with_agent_at(5, 5, 40.0)
        .with_agent_at(2, 7, 40.0)
}

#[test]
fn test_zero_threshold_always_speciates() {
    let mut sim = three_breeders()
        .with_config(|c| c.speciation_threshold = 0.0)
        .build();
    let summary = sim.step().unwrap();
    assert_eq!(summary.births, 3);

    let offspring: BTreeSet<u64> = sim
        .agents()
        .iter()
        .filter(|a| a.age == 0)
        .map(|a| a.species)
        .collect();
    assert_eq!(offspring, BTreeSet::from([4, 5, 6]));
    assert_eq!(summary.active_species, 6);
    assert_eq!(summary.active_clades, 3);

    let history = sim.history();
    assert_eq!(history.species.len(), 6);
    assert!(history.species[3..].iter().all(|s| s.first_seen_tick == 1));
}

#[test]
fn test_high_threshold_keeps_parent_species() {
    let mut sim = three_breeders()
        .with_config(|c| c.speciation_threshold = 100.0)
        .build();
    let summary = sim.step().unwrap();
    assert_eq!(summary.births, 3);
    for child in sim.agents().iter().filter(|a| a.age == 0) {
        assert_eq!(child.species, child.lineage);
    }
    assert_eq!(sim.history().species.len(), 3);
}

#[test]
fn test_speciation_rates_in_window() {
    let mut sim = three_breeders()
        .with_config(|c| c.speciation_threshold = 0.0)
        .build();
    sim.step().unwrap();

    let analytics = sim.analytics(1).unwrap();
    assert_eq!(analytics.species.speciations_in_window, 3);
    assert_eq!(analytics.species.speciation_rate, 3.0);
    assert_eq!(analytics.species.net_diversification_rate, 3.0);
    assert_eq!(analytics.clades.originations_in_window, 0);
    assert_eq!(analytics.strategy.active_species, 6);
}

#[test]
fn test_new_species_strategy_is_bounded() {
    let mut sim = three_breeders()
        .with_config(|c| {
            c.speciation_threshold = 0.0;
            c.habitat_preference_mutation = 5.0;
            c.trophic_mutation = 5.0;
            c.defense_mutation = 5.0;
        })
        .build();
    sim.step().unwrap();
    for species in 4..=6 {
        let strategy = sim.species_strategy(species);
        assert!((0.1..=2.0).contains(&strategy.habitat_preference));
        assert!((0.0..=1.0).contains(&strategy.trophic_level));
        assert!((0.0..=1.0).contains(&strategy.defense_level));
    }
}

#[test]
fn test_unknown_species_strategy_is_neutral() {
    let sim = three_breeders().build();
    let strategy = sim.species_strategy(999);
    assert_eq!(strategy.habitat_preference, 1.0);
    assert_eq!(strategy.trophic_level, 0.0);
    assert_eq!(strategy.defense_level, 0.0);
}

#[test]
fn test_offspring_split_parent_energy() {
    let mut sim = SimulationBuilder::new()
        .fertile()
        .starving()
        .with_config(|c| c.offspring_energy_fraction = 0.5)
        .with_agent_at(4, 4, 41.0)
        .build();
    sim.step().unwrap();

    let agents = sim.agents();
    assert_eq!(agents.len(), 2);
    // 41 - 1 upkeep = 40, split in half.
    assert!((agents[0].energy - 20.0).abs() < 1e-9);
    assert!((agents[1].energy - 20.0).abs() < 1e-9);
    assert_eq!(agents[1].lineage, agents[0].lineage);
}

#[test]
fn test_threshold_equal_to_child_distance_speciates() {
    let lone_breeder = |threshold: f64| {
        SimulationBuilder::new()
            .fertile()
            .with_config(move |c| c.speciation_threshold = threshold)
            .with_agent_at(4, 4, 40.0)
            .build()
    };
    let child_of = |sim: &refugium_lib::LifeSimulation| {
        sim.agents()
            .iter()
            .find(|a| a.age == 0)
            .cloned()
            .expect("one offspring")
    };

    let mut reference = lone_breeder(100.0);
    reference.step().unwrap();
    let distance = common::neutral_genome().distance(&child_of(&reference).genome);
    assert!(distance > 0.0);

    let mut at_threshold = lone_breeder(distance);
    at_threshold.step().unwrap();
    let child = child_of(&at_threshold);
    assert_eq!(child.genome, child_of(&reference).genome);
    assert_eq!(child.species, 2);

    let just_above = f64::from_bits(distance.to_bits() + 1);
    let mut above_threshold = lone_breeder(just_above);
    above_threshold.step().unwrap();
    let child = child_of(&above_threshold);
    assert_eq!(child.genome, child_of(&reference).genome);
    assert_eq!(child.species, 1);
}
