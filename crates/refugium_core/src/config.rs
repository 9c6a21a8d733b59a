//! Configuration management for simulation parameters.
//!
//! `SimulationConfig` is a flat structure whose fields all carry defaults, so
//! a partial TOML or JSON document merges over the built-in values.
//!
//! ## Example `config.toml`
//!
//! ```toml
//! width = 32
//! height = 24
//! initialAgents = 60
//! disturbanceInterval = 40
//! disturbanceEnergyLoss = 0.5
//! disturbanceRadius = 3
//! disturbanceRefugiaFraction = 0.35
//! ```
//!
//! Out-of-range rates are accepted here and normalized by the engine where
//! they are used (clamped fractions, floored radii and intervals).

use serde::{Deserialize, Deserializer, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct SimulationConfig {
    #[serde(deserialize_with = "floored_usize")]
    pub width: usize,
    #[serde(deserialize_with = "floored_usize")]
    pub height: usize,
    pub max_resource: f64,
    pub resource_regen: f64,

    // Seasonal forcing
    pub seasonal_cycle_length: f64,
    pub seasonal_regen_amplitude: f64,
    pub seasonal_fertility_contrast_amplitude: f64,

    // Disturbance regime
    pub disturbance_interval: f64,
    pub disturbance_phase_offset: f64,
    pub disturbance_energy_loss: f64,
    pub disturbance_resource_loss: f64,
    /// Negative values target the whole grid.
    pub disturbance_radius: f64,
    pub disturbance_refugia_fraction: f64,

    // Biome and nutrient recycling
    pub biome_bands: f64,
    pub biome_contrast: f64,
    pub decomposition_base: f64,
    pub decomposition_energy_fraction: f64,

    // Population and metabolism
    #[serde(deserialize_with = "floored_usize")]
    pub initial_agents: usize,
    pub initial_energy: f64,
    pub metabolism_cost_base: f64,
    pub move_cost: f64,
    pub dispersal_pressure: f64,
    pub dispersal_radius: f64,
    pub locality_radius: f64,

    // Species strategies
    pub habitat_preference_strength: f64,
    pub habitat_preference_mutation: f64,
    pub specialization_metabolic_cost: f64,
    pub predation_pressure: f64,
    pub trophic_foraging_penalty: f64,
    pub trophic_mutation: f64,
    pub defense_mitigation: f64,
    pub defense_foraging_penalty: f64,
    pub defense_mutation: f64,

    // Reproduction and evolution
    pub harvest_cap: f64,
    pub reproduce_threshold: f64,
    pub reproduce_probability: f64,
    pub offspring_energy_fraction: f64,
    pub mutation_amount: f64,
    pub speciation_threshold: f64,
    #[serde(deserialize_with = "floored_u64")]
    pub max_age: u64,
}

// Integer fields accept any number: fractions are floored and the cast
// saturates, so negatives become zero.
fn floored_usize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<usize, D::Error> {
    Ok(f64::deserialize(deserializer)?.floor() as usize)
}

fn floored_u64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    Ok(f64::deserialize(deserializer)?.floor() as u64)
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            width: 20,
            height: 20,
            max_resource: 8.0,
            resource_regen: 0.6,
            seasonal_cycle_length: 120.0,
            seasonal_regen_amplitude: 0.0,
            seasonal_fertility_contrast_amplitude: 0.0,
            disturbance_interval: 0.0,
            disturbance_phase_offset: 0.0,
            disturbance_energy_loss: 0.0,
            disturbance_resource_loss: 0.0,
            disturbance_radius: -1.0,
            disturbance_refugia_fraction: 0.0,
            biome_bands: 4.0,
            biome_contrast: 0.45,
            decomposition_base: 0.6,
            decomposition_energy_fraction: 0.25,
            initial_agents: 24,
            initial_energy: 12.0,
            metabolism_cost_base: 0.25,
            move_cost: 0.15,
            dispersal_pressure: 0.8,
            dispersal_radius: 1.0,
            locality_radius: 2.0,
            habitat_preference_strength: 1.4,
            habitat_preference_mutation: 0.2,
            specialization_metabolic_cost: 0.08,
            predation_pressure: 0.35,
            trophic_foraging_penalty: 0.35,
            trophic_mutation: 0.18,
            defense_mitigation: 0.45,
            defense_foraging_penalty: 0.2,
            defense_mutation: 0.16,
            harvest_cap: 2.5,
            reproduce_threshold: 20.0,
            reproduce_probability: 0.35,
            offspring_energy_fraction: 0.45,
            mutation_amount: 0.2,
            speciation_threshold: 0.25,
            max_age: 120,
        }
    }
}

/// Floors a float-valued count, mapping non-finite input to zero.
pub(crate) fn floor_count(value: f64) -> u64 {
    if value.is_finite() && value > 0.0 {
        value.floor() as u64
    } else {
        0
    }
}

impl SimulationConfig {
    /// Validates the configuration.
    ///
    /// Only structurally impossible worlds are rejected. Rates outside their
    /// meaningful range are normalized by the engine instead.
    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(self.width > 0, "World width must be positive");
        anyhow::ensure!(self.height > 0, "World height must be positive");
        anyhow::ensure!(
            self.width.saturating_mul(self.height) <= 4_000_000,
            "World too large (max 4,000,000 cells)"
        );
        anyhow::ensure!(
            self.max_resource.is_finite() && self.max_resource >= 0.0,
            "Max resource must be finite and non-negative"
        );

        let finite_fields = [
            ("resourceRegen", self.resource_regen),
            ("seasonalCycleLength", self.seasonal_cycle_length),
            ("seasonalRegenAmplitude", self.seasonal_regen_amplitude),
            (
                "seasonalFertilityContrastAmplitude",
                self.seasonal_fertility_contrast_amplitude,
            ),
            ("disturbanceInterval", self.disturbance_interval),
            ("disturbanceEnergyLoss", self.disturbance_energy_loss),
            ("disturbanceResourceLoss", self.disturbance_resource_loss),
            ("disturbanceRadius", self.disturbance_radius),
            ("disturbanceRefugiaFraction", self.disturbance_refugia_fraction),
            ("biomeBands", self.biome_bands),
            ("biomeContrast", self.biome_contrast),
            ("decompositionBase", self.decomposition_base),
            ("decompositionEnergyFraction", self.decomposition_energy_fraction),
            ("initialEnergy", self.initial_energy),
            ("metabolismCostBase", self.metabolism_cost_base),
            ("moveCost", self.move_cost),
            ("dispersalPressure", self.dispersal_pressure),
            ("dispersalRadius", self.dispersal_radius),
            ("localityRadius", self.locality_radius),
            ("habitatPreferenceStrength", self.habitat_preference_strength),
            ("habitatPreferenceMutation", self.habitat_preference_mutation),
            ("specializationMetabolicCost", self.specialization_metabolic_cost),
            ("predationPressure", self.predation_pressure),
            ("trophicForagingPenalty", self.trophic_foraging_penalty),
            ("trophicMutation", self.trophic_mutation),
            ("defenseMitigation", self.defense_mitigation),
            ("defenseForagingPenalty", self.defense_foraging_penalty),
            ("defenseMutation", self.defense_mutation),
            ("harvestCap", self.harvest_cap),
            ("reproduceThreshold", self.reproduce_threshold),
            ("reproduceProbability", self.reproduce_probability),
            ("offspringEnergyFraction", self.offspring_energy_fraction),
            ("mutationAmount", self.mutation_amount),
            ("speciationThreshold", self.speciation_threshold),
        ];
        for (name, value) in finite_fields {
            anyhow::ensure!(value.is_finite(), "{name} must be a finite number");
        }

        // The phase offset is wrapped into [0, 1), so any value is accepted.
        Ok(())
    }

    /// Parses a TOML document over the defaults and validates it.
    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        let config = toml::from_str::<Self>(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Hex SHA-256 digest identifying this parameter set.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        use sha2::{Digest, Sha256};
        let mut hasher = Sha256::new();
        hasher.update(format!("{:?}", self).as_bytes());
        hex::encode(hasher.finalize())
    }

    #[must_use]
    pub fn total_cells(&self) -> usize {
        self.width * self.height
    }

    pub(crate) fn seasonal_cycle(&self) -> u64 {
        floor_count(self.seasonal_cycle_length)
    }

    pub(crate) fn disturbance_period(&self) -> u64 {
        floor_count(self.disturbance_interval)
    }

    /// Phase offset wrapped into `[0, 1)`; non-finite input maps to zero.
    pub(crate) fn disturbance_phase(&self) -> f64 {
        let value = self.disturbance_phase_offset;
        if !value.is_finite() {
            return 0.0;
        }
        let wrapped = value % 1.0;
        let wrapped = if wrapped < 0.0 { wrapped + 1.0 } else { wrapped };
        if wrapped >= 1.0 {
            0.0
        } else {
            wrapped
        }
    }

    /// Disturbance radius floored to an integer; `-1` targets every cell.
    pub(crate) fn disturbance_reach(&self) -> i64 {
        let radius = self.disturbance_radius;
        if !radius.is_finite() {
            return if radius > 0.0 { i64::MAX } else { -1 };
        }
        (radius.floor() as i64).max(-1)
    }

    pub(crate) fn refugia_fraction(&self) -> f64 {
        clamp_unit(self.disturbance_refugia_fraction)
    }

    pub(crate) fn locality_reach(&self) -> usize {
        floor_count(self.locality_radius) as usize
    }

    pub(crate) fn dispersal_reach(&self) -> usize {
        floor_count(self.dispersal_radius) as usize
    }

    pub(crate) fn band_count(&self) -> u64 {
        floor_count(self.biome_bands).max(1)
    }
}

/// Clamps into `[0, 1]`, mapping NaN to zero.
pub(crate) fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_validates() {
        let config = SimulationConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_width() {
        let config = SimulationConfig {
            width: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_non_finite_rate_rejected() {
        let config = SimulationConfig {
            move_cost: f64::NAN,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_out_of_range_rates_accepted() {
        let config = SimulationConfig {
            disturbance_energy_loss: 3.0,
            disturbance_refugia_fraction: -1.0,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
        assert_eq!(config.refugia_fraction(), 0.0);
    }

    #[test]
    fn test_partial_toml_merges_over_defaults() {
        let config = SimulationConfig::from_toml(
            r#"
            width = 8
            disturbanceRadius = 2.7
            "#,
        )
        .expect("partial config should parse");
        assert_eq!(config.width, 8);
        assert_eq!(config.height, 20);
        assert_eq!(config.disturbance_reach(), 2);
        assert_eq!(config.max_age, 120);
    }

    #[test]
    fn test_partial_json_merges_over_defaults() {
        let config: SimulationConfig =
            serde_json::from_str(r#"{"height":5,"speciationThreshold":0}"#)
                .expect("partial json config should parse");
        assert_eq!(config.height, 5);
        assert_eq!(config.width, 20);
        assert_eq!(config.speciation_threshold, 0.0);
    }

    #[test]
    fn test_integer_fields_floor_any_number() {
        let config: SimulationConfig = serde_json::from_str(
            r#"{"width":12.7,"height":6,"initialAgents":5.9,"maxAge":-4}"#,
        )
        .expect("numeric fields should parse");
        assert_eq!(config.width, 12);
        assert_eq!(config.height, 6);
        assert_eq!(config.initial_agents, 5);
        assert_eq!(config.max_age, 0);

        let config = SimulationConfig::from_toml("width = 9.5\nmaxAge = 30.2")
            .expect("fractional toml counts should parse");
        assert_eq!(config.width, 9);
        assert_eq!(config.max_age, 30);
    }

    #[test]
    fn test_negative_height_floors_to_invalid_world() {
        let err = SimulationConfig::from_toml("height = -3").unwrap_err();
        assert!(err.to_string().contains("height must be positive"));
    }

    #[test]
    fn test_phase_offset_wraps() {
        let mut config = SimulationConfig {
            disturbance_phase_offset: 1.25,
            ..Default::default()
        };
        assert!((config.disturbance_phase() - 0.25).abs() < 1e-12);
        config.disturbance_phase_offset = -0.25;
        assert!((config.disturbance_phase() - 0.75).abs() < 1e-12);
        config.disturbance_phase_offset = f64::INFINITY;
        assert_eq!(config.disturbance_phase(), 0.0);
    }

    #[test]
    fn test_floor_normalization() {
        let config = SimulationConfig {
            seasonal_cycle_length: 7.9,
            disturbance_interval: -3.0,
            biome_bands: 0.2,
            locality_radius: 1.5,
            ..Default::default()
        };
        assert_eq!(config.seasonal_cycle(), 7);
        assert_eq!(config.disturbance_period(), 0);
        assert_eq!(config.band_count(), 1);
        assert_eq!(config.locality_reach(), 1);
    }

    #[test]
    fn test_fingerprint_consistency() {
        let config1 = SimulationConfig::default();
        let config2 = SimulationConfig::default();
        assert_eq!(config1.fingerprint(), config2.fingerprint());

        let config3 = SimulationConfig {
            mutation_amount: 0.3,
            ..Default::default()
        };
        assert_ne!(config1.fingerprint(), config3.fingerprint());
    }
}
