//! Renewable resource pool per cell.

use crate::environment::{BiomeMap, SeasonalForcing, Torus};
use crate::rng::Rng;
use crate::stats::clamp;

/// Row-major resource amounts, each kept in `[0, max_resource]`.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceField {
    torus: Torus,
    max_resource: f64,
    cells: Vec<f64>,
}

impl ResourceField {
    /// Fills every cell with a uniform draw in `[0, max_resource)`, one float
    /// per cell in row-major order.
    pub fn random(torus: Torus, max_resource: f64, rng: &mut Rng) -> Self {
        let cells = (0..torus.cells())
            .map(|_| rng.float() * max_resource)
            .collect();
        Self {
            torus,
            max_resource,
            cells,
        }
    }

    #[must_use]
    pub fn max_resource(&self) -> f64 {
        self.max_resource
    }

    #[inline]
    #[must_use]
    pub fn at(&self, x: usize, y: usize) -> f64 {
        self.cells[self.torus.index(x, y)]
    }

    /// Reads through wrapped coordinates.
    #[must_use]
    pub fn get(&self, x: i64, y: i64) -> f64 {
        self.at(self.torus.wrap_x(x), self.torus.wrap_y(y))
    }

    /// Writes through wrapped coordinates, clamping into range.
    pub fn set(&mut self, x: i64, y: i64, value: f64) {
        let index = self.torus.index(self.torus.wrap_x(x), self.torus.wrap_y(y));
        self.cells[index] = clamp(value, 0.0, self.max_resource);
    }

    /// Adds `amount` to a cell, clamping into range.
    pub fn deposit(&mut self, x: usize, y: usize, amount: f64) {
        let index = self.torus.index(x, y);
        self.cells[index] = clamp(self.cells[index] + amount, 0.0, self.max_resource);
    }

    /// Removes up to `demand` from a cell and returns what was taken.
    pub fn harvest(&mut self, x: usize, y: usize, demand: f64) -> f64 {
        let index = self.torus.index(x, y);
        let taken = self.cells[index].min(demand);
        self.cells[index] -= taken;
        taken
    }

    /// Multiplies the listed cells by `factor`, clamping into range.
    pub fn scale_cells(&mut self, indices: &[usize], factor: f64) {
        for &index in indices {
            self.cells[index] = clamp(self.cells[index] * factor, 0.0, self.max_resource);
        }
    }

    /// Grows every cell by `regen * season * fertility` for the given tick.
    pub fn regenerate(
        &mut self,
        regen: f64,
        biome: &BiomeMap,
        forcing: &SeasonalForcing,
        tick: u64,
    ) {
        let season = forcing.regen_multiplier(tick);
        for y in 0..self.torus.height {
            for x in 0..self.torus.width {
                let fertility = biome.effective(x, y, forcing, tick);
                self.deposit(x, y, regen * season * fertility);
            }
        }
    }

    /// Row-major sum over every cell.
    #[must_use]
    pub fn total(&self) -> f64 {
        self.cells.iter().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimulationConfig;

    fn field(value: f64) -> ResourceField {
        let torus = Torus::new(3, 2);
        let mut rng = Rng::new(1);
        let mut field = ResourceField::random(torus, 8.0, &mut rng);
        for y in 0..2 {
            for x in 0..3 {
                field.set(x, y, value);
            }
        }
        field
    }

    #[test]
    fn test_random_fill_in_range() {
        let mut rng = Rng::new(11);
        let field = ResourceField::random(Torus::new(4, 4), 8.0, &mut rng);
        for y in 0..4 {
            for x in 0..4 {
                assert!((0.0..8.0).contains(&field.at(x, y)));
            }
        }
    }

    #[test]
    fn test_set_clamps_and_wraps() {
        let mut field = field(0.0);
        field.set(-1, -1, 100.0);
        assert_eq!(field.at(2, 1), 8.0);
        field.set(4, 0, -3.0);
        assert_eq!(field.get(1, 0), 0.0);
    }

    #[test]
    fn test_harvest_never_overdraws() {
        let mut field = field(1.5);
        assert_eq!(field.harvest(0, 0, 4.0), 1.5);
        assert_eq!(field.at(0, 0), 0.0);
        assert_eq!(field.harvest(1, 0, 0.5), 0.5);
        assert_eq!(field.at(1, 0), 1.0);
    }

    #[test]
    fn test_regenerate_scales_with_fertility() {
        let config = SimulationConfig {
            width: 3,
            height: 2,
            biome_contrast: 0.0,
            ..Default::default()
        };
        let biome = BiomeMap::generate(&config);
        let forcing = SeasonalForcing::from_config(&config);
        let mut field = field(1.0);
        field.regenerate(0.6, &biome, &forcing, 1);
        assert!((field.at(2, 1) - 1.6).abs() < 1e-12);
        assert!((field.total() - 9.6).abs() < 1e-9);
    }
}
