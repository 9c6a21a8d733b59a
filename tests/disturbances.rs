mod common;

use common::{assert_unit, SimulationBuilder};
use refugium_lib::model::disturbance::resilience_stability_index;
use refugium_lib::{LifeSimulation, SimulationConfig};

fn every_tick(radius: f64, refugia: f64) -> impl FnOnce(&mut SimulationConfig) {
    move |c: &mut SimulationConfig| {
        c.disturbance_interval = 1.0;
        c.disturbance_energy_loss = 0.5;
        c.disturbance_resource_loss = 0.5;
        c.disturbance_radius = radius;
        c.disturbance_refugia_fraction = refugia;
    }
}

#[test]
fn test_zero_radius_targets_single_cell() {
    let mut builder = SimulationBuilder::new()
        .with_grid(5, 1)
        .with_config(every_tick(0.0, 0.0));
    for x in 0..5 {
        builder = builder.with_agent_at(x, 0, 10.0);
    }
    let mut sim = builder.build();
    sim.step().unwrap();

    let events = sim.disturbance_events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].targeted_cells, 1);
    assert_eq!(events[0].affected_cells, 1);
    assert_eq!(events[0].population_before, 5);

    let disturbance = sim.analytics(1).unwrap().disturbance;
    assert_eq!(disturbance.last_event_affected_cell_fraction, 0.2);
    assert_eq!(disturbance.last_event_refugia_cell_fraction, 0.0);
    assert_eq!(disturbance.events_in_window, 1);
    assert_eq!(disturbance.last_event_tick, 1);
    assert_eq!(disturbance.radius, 0);
}

#[test]
fn test_global_footprint_spares_refugia() {
    let mut sim = SimulationBuilder::new()
        .with_grid(4, 4)
        .with_config(every_tick(-1.0, 0.5))
        .build();
    sim.step().unwrap();

    let event = &sim.disturbance_events()[0];
    assert_eq!(event.targeted_cells, 16);
    assert_eq!(event.affected_cells, 8);
    let disturbance = sim.analytics(1).unwrap().disturbance;
    assert_eq!(disturbance.last_event_affected_cell_fraction, 0.5);
    assert_eq!(disturbance.last_event_refugia_cell_fraction, 0.5);
    assert_eq!(disturbance.radius, -1);
}

#[test]
fn test_resource_loss_scales_pools() {
    let mut sim = SimulationBuilder::new()
        .with_grid(4, 4)
        .with_config(|c| {
            c.disturbance_interval = 1.0;
            c.disturbance_resource_loss = 0.5;
        })
        .build();
    sim.step().unwrap();

    let event = &sim.disturbance_events()[0];
    assert!(event.total_resources_before > 0.0);
    assert!((event.total_resources_after_shock - event.total_resources_before * 0.5).abs() < 1e-9);
    let shock = sim.analytics(1).unwrap().disturbance.last_event_resource_shock;
    assert!((shock - 0.5).abs() < 1e-9);
}

#[test]
fn test_harmless_regime_records_nothing() {
    let mut sim = SimulationBuilder::new()
        .with_random_founders(10)
        .with_config(|c| c.disturbance_interval = 1.0)
        .build();
    sim.run(5).unwrap();
    assert!(sim.disturbance_events().is_empty());
    assert_eq!(sim.analytics(5).unwrap().resilience, Default::default());
}

#[test]
fn test_phase_offset_shifts_schedule() {
    let mut sim = SimulationBuilder::new()
        .with_config(|c| {
            c.disturbance_interval = 4.0;
            c.disturbance_phase_offset = 0.5;
            c.disturbance_resource_loss = 0.2;
        })
        .build();
    sim.run(10).unwrap();
    let ticks: Vec<u64> = sim.disturbance_events().iter().map(|e| e.tick).collect();
    assert_eq!(ticks, vec![2, 6, 10]);
    assert_eq!(sim.analytics(4).unwrap().disturbance.events_in_window, 1);
}

#[test]
fn test_wipeout_never_recovers() {
    let mut sim = SimulationBuilder::new()
        .with_config(|c| {
            c.disturbance_interval = 3.0;
            c.disturbance_energy_loss = 1.0;
            c.reproduce_probability = 0.0;
        })
        .with_agent_at(0, 0, 10.0)
        .with_agent_at(5, 5, 10.0)
        .build();
    sim.run(5).unwrap();

    let event = &sim.disturbance_events()[0];
    assert_eq!(event.tick, 3);
    assert_eq!(event.population_before, 2);
    assert_eq!(event.recovery_tick, None);

    let resilience = sim.analytics(5).unwrap().resilience;
    assert_eq!(resilience.recovery_ticks, -1);
    assert_eq!(resilience.recovery_progress, 0.0);
    assert_eq!(resilience.population_trough_depth, 1.0);
    assert_eq!(resilience.memory_event_count, 1);
    assert_eq!(resilience.memory_recovered_event_fraction, 0.0);
    assert_eq!(resilience.latest_event_recovery_lag_ticks, -1);
}

#[test]
fn test_resilience_metrics_stay_bounded() {
    let mut sim = SimulationBuilder::new()
        .with_seed(2024)
        .with_grid(14, 14)
        .with_random_founders(40)
        .with_config(|c| {
            c.disturbance_interval = 7.0;
            c.disturbance_energy_loss = 0.6;
            c.disturbance_resource_loss = 0.7;
            c.disturbance_radius = 3.0;
            c.disturbance_refugia_fraction = 0.25;
            c.seasonal_cycle_length = 30.0;
            c.seasonal_regen_amplitude = 0.4;
        })
        .build();
    let series = sim.run_with_analytics(60, 15, true).unwrap();

    for analytics in &series.analytics {
        let r = &analytics.resilience;
        assert_unit(r.recovery_progress, "recovery progress");
        assert_unit(r.population_trough_depth, "trough depth");
        assert_unit(r.memory_recovered_event_fraction, "recovered fraction");
        assert_unit(r.memory_relapse_event_fraction, "relapse fraction");
        assert_unit(r.memory_stability_index_mean, "memory stability");
        assert_unit(r.memory_event_phase_concentration, "phase concentration");
        assert_unit(r.latest_event_seasonal_phase, "seasonal phase");
        assert!(r.recovery_ticks >= -1);
        assert!(r.latest_event_recovery_lag_ticks >= -1);
        assert!(r.memory_event_count <= sim.disturbance_events().len());

        let index = resilience_stability_index(
            r.recovery_progress,
            r.sustained_recovery_ticks as f64,
            r.recovery_relapses as f64,
        );
        assert_unit(index, "stability index");
    }
}

#[test]
fn test_stability_index_examples() {
    assert_eq!(resilience_stability_index(2.0, -2.0, -5.0), 1.0);
    assert_eq!(resilience_stability_index(1.0, 2.0, 3.0), 0.5);
    assert_eq!(resilience_stability_index(0.0, 10.0, 0.0), 0.0);
}

/// Empties every pool except the ones under living agents, so that nobody
/// leaves their cell and no two agents ever meet.
fn anchor_in_place(sim: &mut LifeSimulation) {
    let (width, height) = (sim.config().width as i64, sim.config().height as i64);
    let full = sim.config().max_resource;
    for y in 0..height {
        for x in 0..width {
            sim.set_resource(x, y, 0.0);
        }
    }
    let homes: Vec<(i64, i64)> = sim
        .agents()
        .iter()
        .map(|a| (a.x as i64, a.y as i64))
        .collect();
    for (x, y) in homes {
        sim.set_resource(x, y, full);
    }
}

/// Starving agents that each die at the tick equal to their energy, under a
/// resource-only disturbance every `interval` ticks.
fn doomed_colony(interval: f64, energies: &[f64]) -> LifeSimulation {
    const HOMES: [(i64, i64); 5] = [(0, 0), (3, 3), (6, 6), (2, 7), (7, 2)];
    let mut builder = SimulationBuilder::new().starving().with_config(move |c| {
        c.disturbance_interval = interval;
        c.disturbance_resource_loss = 0.5;
    });
    for (&(x, y), &energy) in HOMES.iter().zip(energies) {
        builder = builder.with_agent_at(x, y, energy);
    }
    let mut sim = builder.build();
    anchor_in_place(&mut sim);
    sim
}

#[test]
fn test_turnover_spike_without_prior_turnover() {
    // Deaths at ticks 6 and 7 only follow the event at tick 5.
    let mut sim = doomed_colony(5.0, &[6.0, 7.0, 10.0, 10.0]);
    sim.run(8).unwrap();
    assert_eq!(sim.disturbance_events()[0].tick, 5);
    assert_eq!(sim.history().extinct_species, 2);

    let resilience = sim.analytics(1).unwrap().resilience;
    assert_eq!(resilience.pre_disturbance_turnover_rate, 0.0);
    assert_eq!(resilience.post_disturbance_turnover_rate, 0.5);
    assert_eq!(resilience.turnover_spike, 0.5);
}

#[test]
fn test_turnover_spike_relative_to_prior_turnover() {
    // One extinction in ticks 1..=4, two in ticks 5..=8.
    let mut sim = doomed_colony(5.0, &[2.0, 6.0, 7.0, 10.0, 10.0]);
    sim.run(8).unwrap();
    assert_eq!(sim.history().extinct_species, 3);

    let resilience = sim.analytics(1).unwrap().resilience;
    assert_eq!(resilience.pre_disturbance_turnover_rate, 0.25);
    assert_eq!(resilience.post_disturbance_turnover_rate, 0.5);
    assert_eq!(resilience.turnover_spike, 2.0);
}

#[test]
fn test_relapses_are_remembered_across_events() {
    // Events at ticks 3 and 6 leave the population untouched, so both start
    // recovered; the deaths at ticks 4 and 8 each push one back below baseline.
    let mut sim = doomed_colony(3.0, &[4.0, 8.0, 10.0, 10.0]);
    sim.run(7).unwrap();

    let events = sim.disturbance_events();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].population_before, 4);
    assert_eq!(events[0].recovery_tick, None);
    assert_eq!(events[0].recovery_relapses, 1);
    assert_eq!(events[1].population_before, 3);
    assert_eq!(events[1].recovery_tick, Some(6));

    let r = sim.analytics(1).unwrap().resilience;
    assert_eq!(r.recovery_ticks, 0);
    assert_eq!(r.recovery_progress, 1.0);
    assert_eq!(r.recovery_relapses, 0);
    assert_eq!(r.sustained_recovery_ticks, 1);
    assert_eq!(r.memory_event_count, 2);
    assert_eq!(r.memory_recovered_event_fraction, 0.5);
    assert_eq!(r.memory_relapse_event_fraction, 0.5);
    // (0.75 / 2 + 1.0) / 2
    assert_eq!(r.memory_stability_index_mean, 0.6875);
    assert_eq!(r.memory_recovery_lag_ticks_mean, 0.0);
    assert_eq!(r.latest_event_recovery_lag_ticks, 0);

    sim.step().unwrap();
    assert_eq!(sim.disturbance_events()[1].recovery_relapses, 1);

    let r = sim.analytics(1).unwrap().resilience;
    assert_eq!(r.recovery_ticks, -1);
    assert_eq!(r.recovery_relapses, 1);
    assert_eq!(r.sustained_recovery_ticks, 0);
    assert!((r.recovery_progress - 2.0 / 3.0).abs() < 1e-12);
    assert!((r.population_trough_depth - 1.0 / 3.0).abs() < 1e-12);
    assert_eq!(r.population_trough_ticks, 2);
    assert_eq!(r.memory_recovered_event_fraction, 0.0);
    assert_eq!(r.memory_relapse_event_fraction, 1.0);
    // (0.5 / 2 + (2/3) / 2) / 2
    assert!((r.memory_stability_index_mean - (0.25 + 1.0 / 3.0) / 2.0).abs() < 1e-12);
    assert_eq!(r.latest_event_recovery_lag_ticks, -1);
}
