//! Static biome fertility, seasonal forcing and toroidal geometry.

use crate::config::{clamp_unit, SimulationConfig};
use crate::stats::clamp;
use std::f64::consts::TAU;

/// Row-major toroidal grid geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Torus {
    pub width: usize,
    pub height: usize,
}

impl Torus {
    #[must_use]
    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height }
    }

    #[must_use]
    pub fn cells(&self) -> usize {
        self.width * self.height
    }

    #[inline]
    #[must_use]
    pub fn wrap_x(&self, x: i64) -> usize {
        x.rem_euclid(self.width as i64) as usize
    }

    #[inline]
    #[must_use]
    pub fn wrap_y(&self, y: i64) -> usize {
        y.rem_euclid(self.height as i64) as usize
    }

    #[inline]
    #[must_use]
    pub fn index(&self, x: usize, y: usize) -> usize {
        y * self.width + x
    }

    #[inline]
    #[must_use]
    pub fn coords(&self, index: usize) -> (usize, usize) {
        (index % self.width, index / self.width)
    }

    /// The cell itself followed by its four von Neumann neighbours.
    #[must_use]
    pub fn stay_or_step(&self, x: usize, y: usize) -> [(usize, usize); 5] {
        let (xi, yi) = (x as i64, y as i64);
        [
            (x, y),
            (self.wrap_x(xi + 1), y),
            (self.wrap_x(xi - 1), y),
            (x, self.wrap_y(yi + 1)),
            (x, self.wrap_y(yi - 1)),
        ]
    }

    /// Smallest radius whose diamond visits the same cells in the same order
    /// as `radius`. Row `k` of the scan spans `|dx| <= k` for every `k <= r`,
    /// so once row `width / 2 + height - 1` is reached the grid is covered and
    /// only `radius mod height` still decides which row comes first.
    #[must_use]
    pub fn bounded_reach(&self, radius: usize) -> usize {
        let covered = self.width / 2 + self.height.saturating_sub(1);
        if radius <= covered {
            radius
        } else {
            covered + (radius - covered) % self.height.max(1)
        }
    }

    /// Distinct cell indices within Manhattan distance `radius`, scanning rows
    /// then columns. Cells reached twice through wrapping are kept once.
    #[must_use]
    pub fn diamond(&self, x: usize, y: usize, radius: usize) -> Vec<usize> {
        self.scan_diamond(x, y, self.bounded_reach(radius))
    }

    fn scan_diamond(&self, x: usize, y: usize, radius: usize) -> Vec<usize> {
        let r = radius as i64;
        let mut seen = vec![false; self.cells()];
        let mut cells = Vec::new();
        for dy in -r..=r {
            for dx in -r..=r {
                if dx.abs() + dy.abs() > r {
                    continue;
                }
                let index = self.index(self.wrap_x(x as i64 + dx), self.wrap_y(y as i64 + dy));
                if !seen[index] {
                    seen[index] = true;
                    cells.push(index);
                }
            }
        }
        cells
    }
}

/// Sinusoidal seasonal cycle modulating regeneration and biome contrast.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeasonalForcing {
    pub cycle_length: u64,
    regen_amplitude: f64,
    contrast_amplitude: f64,
}

impl SeasonalForcing {
    #[must_use]
    pub fn from_config(config: &SimulationConfig) -> Self {
        Self {
            cycle_length: config.seasonal_cycle(),
            regen_amplitude: clamp_unit(config.seasonal_regen_amplitude),
            contrast_amplitude: clamp_unit(config.seasonal_fertility_contrast_amplitude),
        }
    }

    /// Position within the cycle in `[0, 1)`; tick 1 sits at phase zero.
    #[must_use]
    pub fn phase(&self, tick: u64) -> f64 {
        if self.cycle_length <= 1 {
            return 0.0;
        }
        let offset = tick.saturating_sub(1);
        (offset % self.cycle_length) as f64 / self.cycle_length as f64
    }

    #[must_use]
    pub fn wave(&self, tick: u64) -> f64 {
        (self.phase(tick) * TAU).sin()
    }

    #[must_use]
    pub fn regen_multiplier(&self, tick: u64) -> f64 {
        self.modulate(self.regen_amplitude, tick)
    }

    #[must_use]
    pub fn contrast_multiplier(&self, tick: u64) -> f64 {
        self.modulate(self.contrast_amplitude, tick)
    }

    fn modulate(&self, amplitude: f64, tick: u64) -> f64 {
        if amplitude == 0.0 {
            return 1.0;
        }
        (1.0 + amplitude * self.wave(tick)).max(0.0)
    }
}

/// Per-cell base fertility in `[0.1, 2]`, fixed at construction.
#[derive(Debug, Clone, PartialEq)]
pub struct BiomeMap {
    torus: Torus,
    fertility: Vec<f64>,
}

impl BiomeMap {
    /// Latitude bands blended with longitudinal and diagonal waves.
    #[must_use]
    pub fn generate(config: &SimulationConfig) -> Self {
        let torus = Torus::new(config.width, config.height);
        let contrast = clamp(config.biome_contrast, 0.0, 0.95);
        let bands = config.band_count() as f64;

        if torus.width < 2 || torus.height < 2 || contrast == 0.0 {
            return Self {
                torus,
                fertility: vec![1.0; torus.cells()],
            };
        }

        let mut fertility = Vec::with_capacity(torus.cells());
        for y in 0..torus.height {
            let band = ((y as f64 / torus.height as f64) * bands).floor();
            let lat_phase = (band + 0.5) / bands;
            for x in 0..torus.width {
                let lon_phase = (x as f64 + 0.5) / torus.width as f64;
                let lat_wave = (lat_phase * TAU).sin();
                let lon_wave = (lon_phase * TAU).cos();
                let patch_wave = ((lat_phase + lon_phase) * TAU).sin();
                let mixed = lat_wave * 0.55 + lon_wave * 0.3 + patch_wave * 0.15;
                fertility.push(clamp(1.0 + mixed * contrast, 0.1, 2.0));
            }
        }
        Self { torus, fertility }
    }

    /// Base fertility at wrapped coordinates.
    #[must_use]
    pub fn base(&self, x: i64, y: i64) -> f64 {
        self.fertility[self.torus.index(self.torus.wrap_x(x), self.torus.wrap_y(y))]
    }

    #[inline]
    #[must_use]
    pub fn base_at(&self, x: usize, y: usize) -> f64 {
        self.fertility[self.torus.index(x, y)]
    }

    /// Fertility after seasonal contrast modulation at `tick`.
    #[must_use]
    pub fn effective(&self, x: usize, y: usize, forcing: &SeasonalForcing, tick: u64) -> f64 {
        let base = self.base_at(x, y);
        clamp(1.0 + (base - 1.0) * forcing.contrast_multiplier(tick), 0.1, 2.0)
    }
}
