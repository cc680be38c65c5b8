//! Movement/foraging rule
//!
//! An agent surveys every cell it can see, scores them by welfare, and
//! claims the best one: max welfare, then min distance, then a uniform
//! random pick through the run RNG. Harvest, metabolism, ageing, and
//! pollution production all land here so combat can reuse the same
//! side-effect path for its own relocation.

use ordered_float::OrderedFloat;
use rand::Rng;

use crate::core::error::{DecisionFailure, Result, SugarError};
use crate::core::types::{AgentId, Position};
use crate::decision::context::MovementContext;
use crate::decision::types::MovementDecision;
use crate::world::World;

/// Resolve and execute one agent's movement for this tick
///
/// No-op if the agent already acted (combat) or died earlier in the tick.
pub fn move_agent(world: &mut World, id: AgentId) -> Result<()> {
    let Some(agent) = world.registry.get(id) else {
        return Ok(());
    };
    if agent.acted {
        return Ok(());
    }
    let origin = agent.position;
    let vision = agent.vision;

    let decision = if let Some(provider) = &world.provider {
        let ctx = MovementContext::build(world, id).ok_or(SugarError::AgentNotFound(id))?;
        Some(provider.movement_decision(&ctx)?)
    } else {
        None
    };
    let destination = match decision {
        Some(decision) => resolve_provider_target(world, id, origin, vision, &decision)?,
        None => best_cell(world, origin, vision),
    };

    apply_move(world, id, destination)
}

/// Validate a provider-chosen target
///
/// An inconsistent decision (move with no target) is a strict-mode error.
/// A consistent but illegal target (occupied, out of bounds, out of vision)
/// means the agent idles in place per the movement contract.
fn resolve_provider_target(
    world: &World,
    id: AgentId,
    origin: Position,
    vision: u32,
    decision: &MovementDecision,
) -> Result<Position> {
    if !decision.move_to {
        return Ok(origin);
    }
    let Some(target) = decision.target else {
        return Err(SugarError::decision(
            "movement",
            id,
            "target",
            DecisionFailure::Validation,
            "move is true but no target was given",
        ));
    };
    let legal = world.grid.in_bounds(target)
        && origin.manhattan(&target) <= vision
        && (target == origin || world.registry.is_empty_cell(target));
    if legal {
        Ok(target)
    } else {
        tracing::debug!(agent = id.0, ?target, "illegal movement target, idling");
        Ok(origin)
    }
}

/// Default rule: max welfare, then min distance, then uniform random
fn best_cell(world: &mut World, origin: Position, vision: u32) -> Position {
    let candidates: Vec<Position> = world
        .grid
        .visible_positions(origin, vision)
        .into_iter()
        .filter(|pos| *pos == origin || world.registry.is_empty_cell(*pos))
        .collect();

    let pollution = world.config.pollution_enabled;
    let best_welfare = candidates
        .iter()
        .map(|pos| OrderedFloat(world.grid.welfare(*pos, pollution)))
        .max()
        .unwrap_or(OrderedFloat(0.0));
    let richest: Vec<Position> = candidates
        .into_iter()
        .filter(|pos| OrderedFloat(world.grid.welfare(*pos, pollution)) == best_welfare)
        .collect();

    let min_distance = richest
        .iter()
        .map(|pos| pos.manhattan(&origin))
        .min()
        .unwrap_or(0);
    let nearest: Vec<Position> = richest
        .into_iter()
        .filter(|pos| pos.manhattan(&origin) == min_distance)
        .collect();

    if nearest.len() <= 1 {
        nearest.first().copied().unwrap_or(origin)
    } else {
        nearest[world.rng.gen_range(0..nearest.len())]
    }
}

/// Common side effects of claiming a cell (also the idle-in-place path)
///
/// Collects the destination's sugar, zeroes it, pays metabolism, ages the
/// agent by one tick, and deposits pollution when enabled.
pub(crate) fn apply_move(world: &mut World, id: AgentId, destination: Position) -> Result<()> {
    let collected = world.grid.sugar_at(destination);
    world.registry.move_agent(id, destination)?;

    let agent = world
        .registry
        .get_mut(id)
        .ok_or(SugarError::AgentNotFound(id))?;
    let metabolism = f64::from(agent.metabolism);
    agent.sugar += collected - metabolism;
    agent.age += 1;

    if let Some(cell) = world.grid.cell_mut(destination) {
        cell.sugar = 0.0;
        if world.config.pollution_enabled {
            cell.pollution += world.config.pollution_production_rate * collected
                + world.config.pollution_consumption_rate * metabolism;
        }
    }
    Ok(())
}
