//! World state: the single owned context passed into every rule
//!
//! Owns the grid, the agent registry, the loan arena, the run-level RNG,
//! the tick counter, and cumulative metrics. All randomness routes through
//! `World::rng` so a seed fully determines a run.

pub mod agent;
pub mod grid;
pub mod loans;
pub mod metrics;
pub mod registry;

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::core::bitset::BitVec;
use crate::core::config::SimulationConfig;
use crate::core::error::Result;
use crate::core::types::{AgentId, Position, Sex, Tick};
use crate::decision::provider::DecisionProvider;
use crate::world::agent::Agent;
use crate::world::grid::Grid;
use crate::world::loans::LoanArena;
use crate::world::metrics::Metrics;
use crate::world::registry::Registry;

pub struct World {
    pub config: SimulationConfig,
    pub grid: Grid,
    pub registry: Registry,
    pub loans: LoanArena,
    pub rng: ChaCha8Rng,
    pub tick: Tick,
    pub metrics: Metrics,
    /// Disease bit-strings circulating in this run, fixed at init
    pub disease_pool: Vec<BitVec>,
    /// Installed in strict decision mode; rule-based mode leaves this None
    pub provider: Option<Box<dyn DecisionProvider>>,
}

impl World {
    /// Build a world and spawn the initial population
    ///
    /// Fails fast on configuration/invariant errors; never fails afterward
    /// due to decision content in rule-based mode.
    pub fn new(config: SimulationConfig) -> Result<Self> {
        config.validate()?;
        let grid = Grid::new(&config);
        let mut world = Self {
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            grid,
            registry: Registry::new(),
            loans: LoanArena::new(),
            tick: 0,
            metrics: Metrics::default(),
            disease_pool: Vec::new(),
            provider: None,
            config,
        };

        if world.config.disease_enabled {
            world.disease_pool = (0..world.config.disease_pool_size)
                .map(|_| {
                    let (lo, hi) = world.config.disease_length_range;
                    let len = world.rng.gen_range(lo..=hi);
                    BitVec::random(len, &mut world.rng)
                })
                .collect();
        }

        for _ in 0..world.config.initial_population {
            let id = world.spawn_random_agent()?;
            if world.config.disease_enabled {
                if let Some(id) = id {
                    world.deal_initial_diseases(id);
                }
            }
        }
        tracing::info!(
            population = world.registry.len(),
            seed = world.config.seed,
            "world initialized"
        );
        Ok(world)
    }

    /// Install an external decision provider, switching on strict mode
    pub fn with_provider(mut self, provider: Box<dyn DecisionProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Strict mode is active when a provider is installed
    pub fn strict_mode(&self) -> bool {
        self.provider.is_some()
    }

    /// Spawn a freshly initialized agent at a random empty cell
    ///
    /// Returns None when the grid is saturated (no empty cell).
    pub fn spawn_random_agent(&mut self) -> Result<Option<AgentId>> {
        let empty = self.empty_positions();
        if empty.is_empty() {
            return Ok(None);
        }
        let position = empty[self.rng.gen_range(0..empty.len())];
        let (v_lo, v_hi) = self.config.vision_range;
        let (m_lo, m_hi) = self.config.metabolism_range;
        let (a_lo, a_hi) = self.config.max_age_range;
        let (e_lo, e_hi) = self.config.endowment_range;
        let endowment = self.rng.gen_range(e_lo..=e_hi);
        let id = self.registry.allocate_id();
        let agent = Agent {
            id,
            position,
            vision: self.rng.gen_range(v_lo..=v_hi),
            metabolism: self.rng.gen_range(m_lo..=m_hi),
            sugar: endowment,
            age: 0,
            max_age: self.rng.gen_range(a_lo..=a_hi),
            sex: if self.rng.gen_bool(0.5) {
                Sex::Male
            } else {
                Sex::Female
            },
            culture: BitVec::random(self.config.culture_length, &mut self.rng),
            immunity: BitVec::random(self.config.immunity_length, &mut self.rng),
            diseases: Vec::new(),
            loans_given: Vec::new(),
            loans_owed: Vec::new(),
            children: Vec::new(),
            initial_sugar: endowment,
            acted: false,
            personality: None,
        };
        self.registry.insert(agent)?;
        Ok(Some(id))
    }

    fn deal_initial_diseases(&mut self, id: AgentId) {
        if self.disease_pool.is_empty() {
            return;
        }
        let mut drawn = Vec::new();
        for _ in 0..self.config.initial_diseases_per_agent {
            let disease = self.disease_pool[self.rng.gen_range(0..self.disease_pool.len())].clone();
            if !drawn.contains(&disease) {
                drawn.push(disease);
            }
        }
        if let Some(agent) = self.registry.get_mut(id) {
            agent.diseases = drawn;
        }
    }

    /// All currently unoccupied in-bounds positions
    pub fn empty_positions(&self) -> Vec<Position> {
        let mut out = Vec::new();
        for y in 0..self.grid.height() {
            for x in 0..self.grid.width() {
                let pos = Position::new(x, y);
                if self.registry.is_empty_cell(pos) {
                    out.push(pos);
                }
            }
        }
        out
    }

    /// Live agents on the four von Neumann neighbor cells of `id`
    pub fn neighbor_agents(&self, id: AgentId) -> Vec<AgentId> {
        let Some(agent) = self.registry.get(id) else {
            return Vec::new();
        };
        agent
            .position
            .von_neumann()
            .iter()
            .filter(|pos| self.grid.in_bounds(**pos))
            .filter_map(|pos| self.registry.occupant(*pos))
            .collect()
    }

    /// Agent iteration order for this tick, randomized once per tick
    pub fn shuffled_ids(&mut self) -> Vec<AgentId> {
        let mut ids = self.registry.ids();
        ids.sort_unstable(); // stable base order so the shuffle is seed-determined
        ids.shuffle(&mut self.rng);
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_world_spawns_population() {
        let config = SimulationConfig {
            grid_width: 10,
            grid_height: 10,
            initial_population: 20,
            ..Default::default()
        };
        let world = World::new(config).unwrap();
        assert_eq!(world.registry.len(), 20);
        assert!(!world.strict_mode());
    }

    #[test]
    fn test_same_seed_same_world() {
        let config = SimulationConfig {
            grid_width: 10,
            grid_height: 10,
            initial_population: 15,
            ..Default::default()
        };
        let a = World::new(config.clone()).unwrap();
        let b = World::new(config).unwrap();
        for agent in a.registry.iter() {
            let twin = b.registry.get(agent.id).unwrap();
            assert_eq!(agent.position, twin.position);
            assert_eq!(agent.vision, twin.vision);
            assert_eq!(agent.culture, twin.culture);
            assert_eq!(agent.sugar, twin.sugar);
        }
    }

    #[test]
    fn test_no_overlap_at_init() {
        let config = SimulationConfig {
            grid_width: 8,
            grid_height: 8,
            initial_population: 60,
            ..Default::default()
        };
        let world = World::new(config).unwrap();
        let mut seen = std::collections::HashSet::new();
        for agent in world.registry.iter() {
            assert!(seen.insert(agent.position), "two agents share a cell");
        }
    }

    #[test]
    fn test_invalid_config_rejected_at_construction() {
        let config = SimulationConfig {
            grid_width: 0,
            ..Default::default()
        };
        assert!(World::new(config).is_err());
    }
}
