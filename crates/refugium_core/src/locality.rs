//! Per-cell and neighbourhood species dominance, recorded once per tick.

use crate::environment::Torus;
use crate::error::{Result, SimError};
use crate::stats::{max_or_zero, mean, std_dev, Tally};
use refugium_data::{
    Agent, LocalityRadiusAnalytics, LocalityRadiusTurnoverAnalytics, LocalityStateAnalytics,
    LocalityTurnoverAnalytics, TurnoverWindow,
};

/// Spatial structure of the population at the end of one tick.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalityFrame {
    /// Dominant species per cell, `0` for empty cells.
    pub dominant_by_cell: Vec<u64>,
    pub dominance_shares: Vec<f64>,
    pub richness: Vec<f64>,
    /// Dominant species over each cell's neighbourhood, `0` if it is empty.
    pub neighborhood_dominant_by_cell: Vec<u64>,
    pub neighborhood_dominance_shares: Vec<f64>,
    pub neighborhood_richness: Vec<f64>,
    pub center_alignment: Vec<f64>,
    pub occupied_cells: usize,
}

impl LocalityFrame {
    /// Builds a frame from living agents. Share and richness vectors only
    /// hold entries for occupied cells.
    #[must_use]
    pub fn capture(agents: &[Agent], torus: Torus, radius: usize) -> Self {
        let cells = torus.cells();
        let mut counts: Vec<Tally> = vec![Tally::new(); cells];
        for agent in agents {
            counts[torus.index(agent.x, agent.y)].add(agent.species, 1);
        }

        let mut frame = Self {
            dominant_by_cell: vec![0; cells],
            dominance_shares: Vec::new(),
            richness: Vec::new(),
            neighborhood_dominant_by_cell: vec![0; cells],
            neighborhood_dominance_shares: Vec::new(),
            neighborhood_richness: Vec::new(),
            center_alignment: Vec::new(),
            occupied_cells: 0,
        };

        for (cell, tally) in counts.iter().enumerate() {
            if tally.is_empty() {
                continue;
            }
            frame.occupied_cells += 1;
            let (dominant, dominant_count) = tally.dominant();
            frame.dominant_by_cell[cell] = dominant;
            frame
                .dominance_shares
                .push(share(dominant_count, tally.total()));
            frame.richness.push(tally.len() as f64);
        }

        for cell in 0..cells {
            let (cx, cy) = torus.coords(cell);
            let mut neighborhood = Tally::new();
            for index in torus.diamond(cx, cy, radius) {
                for (species, count) in counts[index].iter() {
                    neighborhood.add(species, count);
                }
            }
            let (dominant, dominant_count) = neighborhood.dominant();
            frame.neighborhood_dominant_by_cell[cell] = dominant;

            if counts[cell].is_empty() {
                continue;
            }
            frame
                .neighborhood_dominance_shares
                .push(share(dominant_count, neighborhood.total()));
            frame.neighborhood_richness.push(neighborhood.len() as f64);
            let center = frame.dominant_by_cell[cell];
            frame
                .center_alignment
                .push(if center != 0 && center == dominant { 1.0 } else { 0.0 });
        }

        frame
    }
}

fn share(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64
    }
}

struct DominanceTurnover {
    transitions: usize,
    fraction_mean: f64,
    fraction_std_dev: f64,
    per_cell_mean: f64,
    per_cell_std_dev: f64,
    per_cell_max: f64,
}

/// Frames indexed by the tick they were recorded at.
#[derive(Debug, Clone, Default)]
pub struct LocalityHistory {
    frames: Vec<Option<LocalityFrame>>,
}

impl LocalityHistory {
    pub fn record(&mut self, tick: u64, frame: LocalityFrame) {
        let slot = tick as usize;
        if self.frames.len() <= slot {
            self.frames.resize(slot + 1, None);
        }
        self.frames[slot] = Some(frame);
    }

    #[must_use]
    pub fn get(&self, tick: u64) -> Option<&LocalityFrame> {
        self.frames.get(tick as usize).and_then(Option::as_ref)
    }

    pub fn frame(&self, tick: u64) -> Result<&LocalityFrame> {
        self.get(tick)
            .ok_or(SimError::MissingLocalityFrame { tick })
    }

    pub fn state(&self, tick: u64, total_cells: usize) -> Result<LocalityStateAnalytics> {
        let frame = self.frame(tick)?;
        Ok(LocalityStateAnalytics {
            occupied_cells: frame.occupied_cells,
            occupied_cell_fraction: share(frame.occupied_cells, total_cells),
            mean_dominant_species_share: mean(&frame.dominance_shares),
            dominant_species_share_std_dev: std_dev(&frame.dominance_shares),
            mean_species_richness: mean(&frame.richness),
        })
    }

    pub fn radius_state(&self, tick: u64, radius: usize) -> Result<LocalityRadiusAnalytics> {
        let frame = self.frame(tick)?;
        Ok(LocalityRadiusAnalytics {
            radius,
            mean_dominant_species_share: mean(&frame.neighborhood_dominance_shares),
            dominant_species_share_std_dev: std_dev(&frame.neighborhood_dominance_shares),
            mean_species_richness: mean(&frame.neighborhood_richness),
            center_dominant_alignment: mean(&frame.center_alignment),
        })
    }

    #[must_use]
    pub fn turnover(&self, window: &TurnoverWindow, total_cells: usize) -> LocalityTurnoverAnalytics {
        let t = self.dominance_turnover(window, total_cells, |f| &f.dominant_by_cell);
        LocalityTurnoverAnalytics {
            transitions: t.transitions,
            changed_dominant_cell_fraction_mean: t.fraction_mean,
            changed_dominant_cell_fraction_std_dev: t.fraction_std_dev,
            per_cell_dominant_turnover_mean: t.per_cell_mean,
            per_cell_dominant_turnover_std_dev: t.per_cell_std_dev,
            per_cell_dominant_turnover_max: t.per_cell_max,
        }
    }

    #[must_use]
    pub fn radius_turnover(
        &self,
        window: &TurnoverWindow,
        total_cells: usize,
        radius: usize,
    ) -> LocalityRadiusTurnoverAnalytics {
        let t = self.dominance_turnover(window, total_cells, |f| &f.neighborhood_dominant_by_cell);
        LocalityRadiusTurnoverAnalytics {
            radius,
            transitions: t.transitions,
            changed_dominant_cell_fraction_mean: t.fraction_mean,
            changed_dominant_cell_fraction_std_dev: t.fraction_std_dev,
            per_cell_dominant_turnover_mean: t.per_cell_mean,
            per_cell_dominant_turnover_std_dev: t.per_cell_std_dev,
            per_cell_dominant_turnover_max: t.per_cell_max,
        }
    }

    /// Compares consecutive frames across the window and tallies how often
    /// each cell's dominant species changed.
    fn dominance_turnover<F>(
        &self,
        window: &TurnoverWindow,
        total_cells: usize,
        select: F,
    ) -> DominanceTurnover
    where
        F: Fn(&LocalityFrame) -> &Vec<u64>,
    {
        let mut changed_fractions = Vec::new();
        let mut per_cell_changes = vec![0usize; total_cells];
        let mut transitions = 0usize;

        for tick in window.start_tick.max(1)..=window.end_tick {
            let (Some(previous), Some(current)) = (self.get(tick - 1), self.get(tick)) else {
                continue;
            };
            transitions += 1;
            let mut changed = 0usize;
            for (cell, (before, after)) in select(previous).iter().zip(select(current)).enumerate() {
                if before != after {
                    changed += 1;
                    per_cell_changes[cell] += 1;
                }
            }
            changed_fractions.push(share(changed, total_cells));
        }

        if transitions == 0 {
            return DominanceTurnover {
                transitions: 0,
                fraction_mean: 0.0,
                fraction_std_dev: 0.0,
                per_cell_mean: 0.0,
                per_cell_std_dev: 0.0,
                per_cell_max: 0.0,
            };
        }

        let rates: Vec<f64> = per_cell_changes
            .iter()
            .map(|&count| count as f64 / transitions as f64)
            .collect();
        DominanceTurnover {
            transitions,
            fraction_mean: mean(&changed_fractions),
            fraction_std_dev: std_dev(&changed_fractions),
            per_cell_mean: mean(&rates),
            per_cell_std_dev: std_dev(&rates),
            per_cell_max: max_or_zero(&rates),
        }
    }
}
