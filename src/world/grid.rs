//! Sugar landscape: per-cell capacity, growback, pollution
//!
//! Capacity is fixed for the run and derived from distance to the nearest
//! configured peak. Current sugar and pollution mutate every tick. Occupancy
//! is owned by the registry, not the grid.

use serde::Serialize;

use crate::core::config::SimulationConfig;
use crate::core::types::{Position, Tick};

/// One grid cell
#[derive(Debug, Clone, Serialize)]
pub struct Cell {
    /// Static maximum sugar, set at construction
    pub capacity: f64,
    /// Current sugar, 0 <= sugar <= capacity
    pub sugar: f64,
    /// Accumulated pollution, >= 0, unbounded above
    pub pollution: f64,
}

/// The sugarscape itself
#[derive(Debug, Clone)]
pub struct Grid {
    width: i32,
    height: i32,
    cells: Vec<Cell>,
}

impl Grid {
    /// Build the capacity landscape from the configured peaks
    ///
    /// Capacity falls off linearly with distance to the nearest peak over
    /// `peak_radius`, starts at `max_capacity`, and is floored at zero.
    /// Cells start at full capacity.
    pub fn new(config: &SimulationConfig) -> Self {
        let width = config.grid_width;
        let height = config.grid_height;
        let mut cells = Vec::with_capacity((width * height) as usize);
        for y in 0..height {
            for x in 0..width {
                let here = Position::new(x, y);
                let nearest = config
                    .sugar_peaks
                    .iter()
                    .map(|peak| f64::from(here.manhattan(peak)))
                    .fold(f64::INFINITY, f64::min);
                let capacity = if nearest.is_finite() && config.peak_radius > 0.0 {
                    (config.max_capacity * (1.0 - nearest / config.peak_radius))
                        .clamp(0.0, config.max_capacity)
                        .round()
                } else {
                    config.max_capacity
                };
                cells.push(Cell {
                    capacity,
                    sugar: capacity,
                    pollution: 0.0,
                });
            }
        }
        Self {
            width,
            height,
            cells,
        }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn in_bounds(&self, pos: Position) -> bool {
        pos.x >= 0 && pos.x < self.width && pos.y >= 0 && pos.y < self.height
    }

    fn index(&self, pos: Position) -> usize {
        (pos.y * self.width + pos.x) as usize
    }

    /// Cell at `pos`; None out of bounds
    pub fn cell(&self, pos: Position) -> Option<&Cell> {
        if self.in_bounds(pos) {
            self.cells.get(self.index(pos))
        } else {
            None
        }
    }

    pub fn cell_mut(&mut self, pos: Position) -> Option<&mut Cell> {
        if self.in_bounds(pos) {
            let idx = self.index(pos);
            self.cells.get_mut(idx)
        } else {
            None
        }
    }

    /// Sugar at `pos`, 0 out of bounds
    pub fn sugar_at(&self, pos: Position) -> f64 {
        self.cell(pos).map(|c| c.sugar).unwrap_or(0.0)
    }

    /// Welfare of a cell: sugar, discounted by pollution when enabled
    pub fn welfare(&self, pos: Position, pollution_enabled: bool) -> f64 {
        match self.cell(pos) {
            Some(cell) if pollution_enabled => cell.sugar / (1.0 + cell.pollution),
            Some(cell) => cell.sugar,
            None => 0.0,
        }
    }

    /// Plain growback: every cell regrows toward capacity at `rate`
    pub fn growback(&mut self, rate: f64) {
        for cell in &mut self.cells {
            cell.sugar = (cell.sugar + rate).min(cell.capacity);
        }
    }

    /// Seasonal growback: the summer half grows at the full rate, the winter
    /// half at rate / divisor; halves flip every `season_duration` ticks
    pub fn seasonal_growback(&mut self, tick: Tick, config: &SimulationConfig) {
        let north_is_summer = (tick / config.season_duration) % 2 == 0;
        let winter_rate = config.growth_rate / config.winter_growth_divisor;
        let half = self.height / 2;
        for y in 0..self.height {
            let north = y < half;
            let rate = if north == north_is_summer {
                config.growth_rate
            } else {
                winter_rate
            };
            for x in 0..self.width {
                let idx = self.index(Position::new(x, y));
                let cell = &mut self.cells[idx];
                cell.sugar = (cell.sugar + rate).min(cell.capacity);
            }
        }
    }

    /// Von Neumann mean diffusion: each cell's pollution becomes the mean of
    /// its in-bounds 4-neighbors' pollution
    pub fn diffuse_pollution(&mut self) {
        let mut next = vec![0.0; self.cells.len()];
        for y in 0..self.height {
            for x in 0..self.width {
                let here = Position::new(x, y);
                let mut sum = 0.0;
                let mut count = 0u32;
                for n in here.von_neumann() {
                    if let Some(cell) = self.cell(n) {
                        sum += cell.pollution;
                        count += 1;
                    }
                }
                next[self.index(here)] = if count > 0 { sum / f64::from(count) } else { 0.0 };
            }
        }
        for (cell, pollution) in self.cells.iter_mut().zip(next) {
            cell.pollution = pollution;
        }
    }

    /// All in-bounds positions within Manhattan distance `vision` of `origin`,
    /// the origin itself included as the zero-distance baseline
    pub fn visible_positions(&self, origin: Position, vision: u32) -> Vec<Position> {
        let r = vision as i32;
        let mut out = Vec::new();
        for dy in -r..=r {
            let span = r - dy.abs();
            for dx in -span..=span {
                let pos = Position::new(origin.x + dx, origin.y + dy);
                if self.in_bounds(pos) {
                    out.push(pos);
                }
            }
        }
        out
    }

    /// Read-only iteration for external consumers (analytics, visualization)
    pub fn iter_cells(&self) -> impl Iterator<Item = (Position, &Cell)> {
        let width = self.width;
        self.cells.iter().enumerate().map(move |(i, cell)| {
            let i = i as i32;
            (Position::new(i % width, i / width), cell)
        })
    }
}
