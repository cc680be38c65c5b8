//! Simulation configuration with documented constants
//!
//! All tunables are collected here. Construction of external sources
//! (environment files, CLI) is owned by the caller; the engine only
//! validates and consumes the finished struct.

use serde::{Deserialize, Serialize};

use crate::core::error::{Result, SugarError};
use crate::core::types::Position;

/// Configuration for a simulation run
///
/// Defaults reproduce the classic two-peak 50x50 scenario. Two runs with
/// identical config (seed included) produce identical histories.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    // === GRID ===
    /// Grid width in cells
    pub grid_width: i32,
    /// Grid height in cells
    pub grid_height: i32,
    /// Sugar peak centers; cell capacity falls off with distance to the nearest peak
    pub sugar_peaks: Vec<Position>,
    /// Capacity at a peak center (sugar units)
    pub max_capacity: f64,
    /// Distance over which capacity falls off linearly from a peak to zero
    pub peak_radius: f64,

    // === GROWBACK ===
    /// Sugar regrown per cell per tick, up to capacity
    pub growth_rate: f64,
    /// Seasonal growback: halves of the grid alternate summer/winter
    pub seasonal_growback: bool,
    /// Ticks between summer/winter flips
    pub season_duration: u64,
    /// Winter growth = growth_rate / this divisor
    pub winter_growth_divisor: f64,

    // === POLLUTION ===
    /// Enables pollution production, diffusion, and welfare discounting
    pub pollution_enabled: bool,
    /// Pollution produced per unit of sugar collected
    pub pollution_production_rate: f64,
    /// Pollution produced per unit of metabolism
    pub pollution_consumption_rate: f64,
    /// Ticks between von Neumann mean diffusion passes
    pub pollution_diffusion_interval: u64,

    // === POPULATION ===
    /// Number of agents spawned at model init
    pub initial_population: usize,
    /// Inclusive sampling range for vision
    pub vision_range: (u32, u32),
    /// Inclusive sampling range for metabolism
    pub metabolism_range: (u32, u32),
    /// Inclusive sampling range for maximum age
    pub max_age_range: (u32, u32),
    /// Inclusive sampling range for the initial sugar endowment
    pub endowment_range: (f64, f64),

    // === RULE TOGGLES ===
    /// Combat replaces movement for agents with a legal target
    pub combat_enabled: bool,
    /// Credit origination and repayment
    pub credit_enabled: bool,
    /// Sexual reproduction; when disabled, deaths spawn replacement agents
    pub reproduction_enabled: bool,
    /// Cultural transmission
    pub culture_enabled: bool,
    /// Disease transmission and immune response
    pub disease_enabled: bool,

    // === COMBAT ===
    /// Cap on wealth lootable from a victim (the classic rule's alpha)
    pub combat_limit: f64,

    // === CREDIT ===
    /// Ticks until a loan falls due
    pub loan_duration: u64,
    /// Interest rate applied once at the due tick
    pub interest_rate: f64,

    // === REPRODUCTION ===
    /// Fertile age window for males (inclusive)
    pub male_fertility: (u32, u32),
    /// Fertile age window for females (inclusive)
    pub female_fertility: (u32, u32),

    // === CULTURE ===
    /// Length of every culture tag in the population; must be odd so the
    /// majority-bit tribe classification never ties
    pub culture_length: usize,

    // === DISEASE ===
    /// Length of each agent's immunity bit-vector
    pub immunity_length: usize,
    /// Inclusive length range for disease bit-strings; max must stay below
    /// immunity_length so window search is well-defined
    pub disease_length_range: (usize, usize),
    /// Number of distinct diseases generated at model init
    pub disease_pool_size: usize,
    /// Diseases dealt to each initial agent from the pool
    pub initial_diseases_per_agent: usize,

    // === DETERMINISM ===
    /// Seed for the single run-level RNG
    pub seed: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            grid_width: 50,
            grid_height: 50,
            sugar_peaks: vec![Position::new(12, 37), Position::new(37, 12)],
            max_capacity: 4.0,
            peak_radius: 30.0,
            growth_rate: 1.0,
            seasonal_growback: false,
            season_duration: 50,
            winter_growth_divisor: 8.0,
            pollution_enabled: false,
            pollution_production_rate: 1.0,
            pollution_consumption_rate: 1.0,
            pollution_diffusion_interval: 1,
            initial_population: 250,
            vision_range: (1, 6),
            metabolism_range: (1, 4),
            max_age_range: (60, 100),
            endowment_range: (50.0, 100.0),
            combat_enabled: false,
            credit_enabled: false,
            reproduction_enabled: false,
            culture_enabled: false,
            disease_enabled: false,
            combat_limit: 50.0,
            loan_duration: 10,
            interest_rate: 0.1,
            male_fertility: (15, 50),
            female_fertility: (15, 40),
            culture_length: 11,
            immunity_length: 50,
            disease_length_range: (2, 10),
            disease_pool_size: 25,
            initial_diseases_per_agent: 4,
            seed: 12345,
        }
    }
}

impl SimulationConfig {
    /// Validate construction-time invariants
    ///
    /// Violations here abort the run before any agent is spawned.
    pub fn validate(&self) -> Result<()> {
        if self.grid_width <= 0 || self.grid_height <= 0 {
            return Err(SugarError::InvalidConfig(format!(
                "grid dimensions must be positive, got {}x{}",
                self.grid_width, self.grid_height
            )));
        }
        let cells = (self.grid_width as usize) * (self.grid_height as usize);
        if self.initial_population > cells {
            return Err(SugarError::InvalidConfig(format!(
                "initial population {} exceeds {} grid cells",
                self.initial_population, cells
            )));
        }
        if self.vision_range.0 == 0 || self.vision_range.0 > self.vision_range.1 {
            return Err(SugarError::InvalidConfig(format!(
                "vision range must be positive and ordered, got {:?}",
                self.vision_range
            )));
        }
        if self.metabolism_range.0 == 0 || self.metabolism_range.0 > self.metabolism_range.1 {
            return Err(SugarError::InvalidConfig(format!(
                "metabolism range must be positive and ordered, got {:?}",
                self.metabolism_range
            )));
        }
        if self.endowment_range.0 <= 0.0 || self.endowment_range.0 > self.endowment_range.1 {
            return Err(SugarError::InvalidConfig(format!(
                "endowment range must be positive and ordered, got {:?}",
                self.endowment_range
            )));
        }
        if self.culture_length == 0 || self.culture_length % 2 == 0 {
            return Err(SugarError::InvalidConfig(format!(
                "culture length must be odd and positive, got {}",
                self.culture_length
            )));
        }
        if self.disease_enabled {
            if self.disease_length_range.0 == 0
                || self.disease_length_range.0 > self.disease_length_range.1
            {
                return Err(SugarError::InvalidConfig(format!(
                    "disease length range must be positive and ordered, got {:?}",
                    self.disease_length_range
                )));
            }
            if self.disease_length_range.1 >= self.immunity_length {
                return Err(SugarError::InvalidConfig(format!(
                    "disease length {} must stay below immunity length {}",
                    self.disease_length_range.1, self.immunity_length
                )));
            }
        }
        if self.seasonal_growback && self.season_duration == 0 {
            return Err(SugarError::InvalidConfig(
                "season duration must be positive when seasonal growback is on".into(),
            ));
        }
        if self.pollution_enabled && self.pollution_diffusion_interval == 0 {
            return Err(SugarError::InvalidConfig(
                "pollution diffusion interval must be positive".into(),
            ));
        }
        if self.credit_enabled && self.loan_duration == 0 {
            return Err(SugarError::InvalidConfig(
                "loan duration must be positive when credit is on".into(),
            ));
        }
        Ok(())
    }

    /// Fertile age window for a sex
    pub fn fertility_window(&self, sex: crate::core::types::Sex) -> (u32, u32) {
        match sex {
            crate::core::types::Sex::Male => self.male_fertility,
            crate::core::types::Sex::Female => self.female_fertility,
        }
    }
}
