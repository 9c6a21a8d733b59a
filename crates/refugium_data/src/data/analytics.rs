use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
/// Inclusive tick range used by rolling analytics.
pub struct TurnoverWindow {
    pub start_tick: u64,
    pub end_tick: u64,
    pub size: u64,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct DurationStats {
    pub count: usize,
    pub mean: f64,
    pub max: u64,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
/// Rolling speciation and extinction rates of species.
pub struct SpeciesTurnoverAnalytics {
    pub speciations_in_window: usize,
    pub extinctions_in_window: usize,
    pub speciation_rate: f64,
    pub extinction_rate: f64,
    pub turnover_rate: f64,
    pub net_diversification_rate: f64,
    pub extinct_lifespan: DurationStats,
    pub active_age: DurationStats,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
/// Rolling origination and extinction rates of clades.
pub struct TaxonTurnoverAnalytics {
    pub originations_in_window: usize,
    pub extinctions_in_window: usize,
    pub origination_rate: f64,
    pub extinction_rate: f64,
    pub turnover_rate: f64,
    pub net_diversification_rate: f64,
    pub extinct_lifespan: DurationStats,
    pub active_age: DurationStats,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct StrategyAxisAnalytics {
    pub mean: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
    /// Mean weighted by each species' living population.
    pub weighted_mean: f64,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
/// Distribution of species-level strategies among living species.
pub struct StrategyAnalytics {
    pub active_species: usize,
    pub habitat_preference: StrategyAxisAnalytics,
    pub trophic_level: StrategyAxisAnalytics,
    pub defense_level: StrategyAxisAnalytics,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
/// Seasonal forcing state at the current tick.
pub struct ForcingAnalytics {
    pub cycle_length: u64,
    pub phase: f64,
    pub wave: f64,
    pub regen_multiplier: f64,
    pub fertility_contrast_multiplier: f64,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
/// Normalized disturbance settings and the footprint of the latest event.
pub struct DisturbanceAnalytics {
    pub interval: u64,
    pub phase_offset: f64,
    pub energy_loss: f64,
    pub resource_loss: f64,
    /// `-1` means the whole grid is targeted.
    pub radius: i64,
    pub refugia_fraction: f64,
    pub events_in_window: usize,
    /// `0` when no event has happened yet.
    pub last_event_tick: u64,
    pub last_event_population_shock: f64,
    pub last_event_resource_shock: f64,
    pub last_event_affected_cell_fraction: f64,
    pub last_event_refugia_cell_fraction: f64,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
/// Recovery of the latest disturbance plus aggregates over every event.
///
/// All fields are zero until the first event has occurred.
pub struct ResilienceAnalytics {
    /// Ticks from the event to first recovery, `-1` if not yet recovered.
    pub recovery_ticks: i64,
    pub recovery_progress: f64,
    pub recovery_relapses: u64,
    pub sustained_recovery_ticks: u64,
    pub population_trough_depth: f64,
    pub population_trough_ticks: u64,
    pub delayed_population_shock_depth: f64,
    pub pre_disturbance_turnover_rate: f64,
    pub post_disturbance_turnover_rate: f64,
    pub turnover_spike: f64,
    pub extinction_burst_depth: usize,
    pub memory_event_count: usize,
    pub memory_recovered_event_fraction: f64,
    pub memory_relapse_event_fraction: f64,
    pub memory_stability_index_mean: f64,
    pub latest_event_seasonal_phase: f64,
    /// `-1` if the latest event has not recovered.
    pub latest_event_recovery_lag_ticks: i64,
    pub memory_recovery_lag_ticks_mean: f64,
    pub memory_event_phase_mean: f64,
    pub memory_event_phase_concentration: f64,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct LocalityStateAnalytics {
    pub occupied_cells: usize,
    pub occupied_cell_fraction: f64,
    pub mean_dominant_species_share: f64,
    pub dominant_species_share_std_dev: f64,
    pub mean_species_richness: f64,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct LocalityTurnoverAnalytics {
    pub transitions: usize,
    pub changed_dominant_cell_fraction_mean: f64,
    pub changed_dominant_cell_fraction_std_dev: f64,
    pub per_cell_dominant_turnover_mean: f64,
    pub per_cell_dominant_turnover_std_dev: f64,
    pub per_cell_dominant_turnover_max: f64,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct LocalityRadiusAnalytics {
    pub radius: usize,
    pub mean_dominant_species_share: f64,
    pub dominant_species_share_std_dev: f64,
    pub mean_species_richness: f64,
    pub center_dominant_alignment: f64,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct LocalityRadiusTurnoverAnalytics {
    pub radius: usize,
    pub transitions: usize,
    pub changed_dominant_cell_fraction_mean: f64,
    pub changed_dominant_cell_fraction_std_dev: f64,
    pub per_cell_dominant_turnover_mean: f64,
    pub per_cell_dominant_turnover_std_dev: f64,
    pub per_cell_dominant_turnover_max: f64,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
/// Every derived metric for the trailing window at one tick.
pub struct EvolutionAnalyticsSnapshot {
    pub tick: u64,
    pub window: TurnoverWindow,
    pub species: SpeciesTurnoverAnalytics,
    pub clades: TaxonTurnoverAnalytics,
    pub strategy: StrategyAnalytics,
    pub forcing: ForcingAnalytics,
    pub disturbance: DisturbanceAnalytics,
    pub resilience: ResilienceAnalytics,
    pub locality: LocalityStateAnalytics,
    pub locality_turnover: LocalityTurnoverAnalytics,
    pub locality_radius: LocalityRadiusAnalytics,
    pub locality_radius_turnover: LocalityRadiusTurnoverAnalytics,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analytics_serialize_camel_case() {
        let snapshot = EvolutionAnalyticsSnapshot::default();
        let json = serde_json::to_string(&snapshot).expect("serialize");
        assert!(json.contains("\"localityRadiusTurnover\""));
        assert!(json.contains("\"netDiversificationRate\""));
        assert!(json.contains("\"memoryEventPhaseConcentration\""));
    }
}
