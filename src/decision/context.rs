//! Serializable context snapshots handed to the decision provider
//!
//! Each rule builds one of these from the live world before asking for a
//! decision. Snapshots are plain data: the provider never touches the world
//! directly, and the personality extension rides along here (and only here).

use serde::Serialize;

use crate::core::types::{AgentId, Position, Sex};
use crate::world::agent::{PersonalityTraits, Tribe};
use crate::world::World;

/// Public view of one agent
#[derive(Debug, Clone, Serialize)]
pub struct AgentView {
    pub id: AgentId,
    pub position: Position,
    pub wealth: f64,
    pub vision: u32,
    pub age: u32,
    pub sex: Sex,
    pub tribe: Tribe,
    pub fertile: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub personality: Option<PersonalityTraits>,
}

impl AgentView {
    /// Snapshot an agent; panics never, missing agents yield None
    pub fn of(world: &World, id: AgentId) -> Option<Self> {
        let agent = world.registry.get(id)?;
        Some(Self {
            id: agent.id,
            position: agent.position,
            wealth: agent.sugar,
            vision: agent.vision,
            age: agent.age,
            sex: agent.sex,
            tribe: agent.tribe(),
            fertile: agent.fertile(&world.config),
            personality: agent.personality,
        })
    }
}

/// One cell the deciding agent can see
#[derive(Debug, Clone, Serialize)]
pub struct CellView {
    pub position: Position,
    pub sugar: f64,
    pub pollution: f64,
    pub welfare: f64,
    pub occupied: bool,
    pub distance: u32,
}

/// Context for the movement rule
#[derive(Debug, Clone, Serialize)]
pub struct MovementContext {
    pub agent: AgentView,
    pub visible_cells: Vec<CellView>,
}

impl MovementContext {
    pub fn build(world: &World, id: AgentId) -> Option<Self> {
        let agent = AgentView::of(world, id)?;
        let visible_cells = world
            .grid
            .visible_positions(agent.position, agent.vision)
            .into_iter()
            .filter_map(|pos| {
                let cell = world.grid.cell(pos)?;
                Some(CellView {
                    position: pos,
                    sugar: cell.sugar,
                    pollution: cell.pollution,
                    welfare: world.grid.welfare(pos, world.config.pollution_enabled),
                    occupied: !world.registry.is_empty_cell(pos),
                    distance: pos.manhattan(&agent.position),
                })
            })
            .collect();
        Some(Self {
            agent,
            visible_cells,
        })
    }
}

/// One legal combat target
#[derive(Debug, Clone, Serialize)]
pub struct CombatCandidate {
    pub id: AgentId,
    pub position: Position,
    pub wealth: f64,
    /// Site sugar plus capped loot for this victim
    pub reward: f64,
    pub distance: u32,
}

/// Context for the combat rule; `candidates` already passed the tribe,
/// wealth, and retaliation filters
#[derive(Debug, Clone, Serialize)]
pub struct CombatContext {
    pub agent: AgentView,
    pub candidates: Vec<CombatCandidate>,
}

/// A neighbor eligible to borrow, with how much it needs
#[derive(Debug, Clone, Serialize)]
pub struct BorrowerView {
    pub id: AgentId,
    pub required: f64,
}

/// Context for the credit rule (lender side)
#[derive(Debug, Clone, Serialize)]
pub struct CreditContext {
    pub agent: AgentView,
    pub amount_available: f64,
    pub eligible_borrowers: Vec<BorrowerView>,
}

/// Context for the reproduction rule
#[derive(Debug, Clone, Serialize)]
pub struct ReproductionContext {
    pub agent: AgentView,
    pub max_matings: u32,
    pub candidates: Vec<AgentView>,
}

/// Context for the culture rule
#[derive(Debug, Clone, Serialize)]
pub struct CultureContext {
    pub agent: AgentView,
    pub culture_length: usize,
    pub neighbors: Vec<AgentView>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::SimulationConfig;

    #[test]
    fn test_movement_context_sees_own_cell() {
        let config = SimulationConfig {
            grid_width: 10,
            grid_height: 10,
            initial_population: 1,
            ..Default::default()
        };
        let world = World::new(config).unwrap();
        let id = world.registry.ids()[0];
        let ctx = MovementContext::build(&world, id).unwrap();
        let own = ctx
            .visible_cells
            .iter()
            .find(|c| c.position == ctx.agent.position)
            .expect("own cell visible at distance zero");
        assert_eq!(own.distance, 0);
        assert!(own.occupied);
        // context must serialize: it crosses the provider boundary as JSON
        let json = serde_json::to_string(&ctx).unwrap();
        assert!(json.contains("visible_cells"));
    }
}
