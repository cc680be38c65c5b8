//! Combat rule
//!
//! Combat and movement are mutually exclusive per tick: an attacker takes
//! its victim's cell instead of foraging. Target resolution runs three
//! filters (other tribe, strictly poorer, not retaliation-exposed) before
//! ranking by reward, then distance, then a random pick. With no surviving
//! candidate the rule falls back to plain movement.

use ordered_float::OrderedFloat;
use rand::Rng;

use crate::core::error::{DecisionFailure, Result, SugarError};
use crate::core::types::{AgentId, Position};
use crate::decision::context::{AgentView, CombatCandidate, CombatContext};
use crate::world::agent::Tribe;
use crate::world::metrics::DeathCause;
use crate::world::World;

use super::{death, movement};

/// Resolve one agent's action: combat when a legal target exists, movement
/// otherwise
pub fn combat_or_move(world: &mut World, id: AgentId) -> Result<()> {
    if !world.config.combat_enabled {
        return movement::move_agent(world, id);
    }
    let Some(agent) = world.registry.get(id) else {
        return Ok(());
    };
    if agent.acted {
        return Ok(());
    }
    let origin = agent.position;
    let attacker_tribe = agent.tribe();
    let wealth = agent.sugar;

    let candidates = legal_targets(world, id, origin, agent.vision, attacker_tribe, wealth);
    if candidates.is_empty() {
        return movement::move_agent(world, id);
    }

    let chosen = if world.provider.is_some() {
        match provider_target(world, id, &candidates)? {
            Some(candidate) => candidate,
            None => return movement::move_agent(world, id),
        }
    } else {
        best_target(world, &candidates)
    };

    execute(world, id, &chosen)
}

#[derive(Debug, Clone)]
struct Target {
    victim: AgentId,
    position: Position,
    reward: f64,
    distance: u32,
}

/// Visible other-tribe agents that are strictly poorer and whose cell is not
/// exposed to retaliation
fn legal_targets(
    world: &World,
    attacker: AgentId,
    origin: Position,
    vision: u32,
    attacker_tribe: Tribe,
    wealth: f64,
) -> Vec<Target> {
    let limit = world.config.combat_limit;
    world
        .grid
        .visible_positions(origin, vision)
        .into_iter()
        .filter_map(|pos| {
            let victim_id = world.registry.occupant(pos)?;
            if victim_id == attacker {
                return None;
            }
            let victim = world.registry.get(victim_id)?;
            if victim.tribe() == attacker_tribe || victim.sugar >= wealth {
                return None;
            }
            let reward = world.grid.sugar_at(pos) + victim.sugar.min(limit);
            if exposed_to_retaliation(world, attacker, attacker_tribe, wealth + reward, pos) {
                return None;
            }
            Some(Target {
                victim: victim_id,
                position: pos,
                reward,
                distance: pos.manhattan(&origin),
            })
        })
        .collect()
}

/// A cell is exposed when any third agent of a different tribe than the
/// attacker, strictly wealthier than the attacker-after-reward, can see it
/// within its own vision
fn exposed_to_retaliation(
    world: &World,
    attacker: AgentId,
    attacker_tribe: Tribe,
    wealth_after: f64,
    cell: Position,
) -> bool {
    world.registry.iter().any(|third| {
        third.id != attacker
            && third.position != cell
            && third.tribe() != attacker_tribe
            && third.sugar > wealth_after
            && third.position.manhattan(&cell) <= third.vision
    })
}

/// Default rule: max reward, then nearest, then uniform random
fn best_target(world: &mut World, candidates: &[Target]) -> Target {
    let best_reward = candidates
        .iter()
        .map(|t| OrderedFloat(t.reward))
        .max()
        .unwrap_or(OrderedFloat(0.0));
    let richest: Vec<&Target> = candidates
        .iter()
        .filter(|t| OrderedFloat(t.reward) == best_reward)
        .collect();
    let min_distance = richest.iter().map(|t| t.distance).min().unwrap_or(0);
    let nearest: Vec<&Target> = richest
        .into_iter()
        .filter(|t| t.distance == min_distance)
        .collect();
    if nearest.len() == 1 {
        nearest[0].clone()
    } else {
        nearest[world.rng.gen_range(0..nearest.len())].clone()
    }
}

/// Ask the provider; None means it declined and movement runs instead
///
/// A decision naming a target outside the legal candidate set is a
/// validation error: combat defines no idle fallback for a bad target.
fn provider_target(
    world: &World,
    id: AgentId,
    candidates: &[Target],
) -> Result<Option<Target>> {
    let Some(provider) = &world.provider else {
        return Ok(None);
    };
    let agent = AgentView::of(world, id).ok_or(SugarError::AgentNotFound(id))?;
    let ctx = CombatContext {
        agent,
        candidates: candidates
            .iter()
            .map(|t| CombatCandidate {
                id: t.victim,
                position: t.position,
                wealth: world.registry.get(t.victim).map(|v| v.sugar).unwrap_or(0.0),
                reward: t.reward,
                distance: t.distance,
            })
            .collect(),
    };
    let decision = provider.combat_decision(&ctx)?;
    if !decision.attack {
        return Ok(None);
    }
    let Some(target_id) = decision.target_id else {
        return Err(SugarError::decision(
            "combat",
            id,
            "target_id",
            DecisionFailure::Validation,
            "attack is true but no target was given",
        ));
    };
    candidates
        .iter()
        .find(|t| t.victim == target_id)
        .cloned()
        .map(Some)
        .ok_or_else(|| {
            SugarError::decision(
                "combat",
                id,
                "target_id",
                DecisionFailure::Validation,
                format!("agent {} is not a legal combat target", target_id.0),
            )
        })
}

/// Kill the victim, take its cell, collect the reward
fn execute(world: &mut World, attacker: AgentId, target: &Target) -> Result<()> {
    // Remove the victim first so its cell frees up, deduct the looted share,
    // then run death bookkeeping on the remainder (cause = combat).
    let Some(mut victim) = world.registry.remove(target.victim) else {
        return Ok(());
    };
    let loot = victim.sugar.min(world.config.combat_limit);
    victim.sugar -= loot;
    world.metrics.combat_kills += 1;
    tracing::debug!(
        attacker = attacker.0,
        victim = victim.id.0,
        reward = target.reward,
        "combat kill"
    );

    world.registry.move_agent(attacker, target.position)?;
    {
        let agent = world
            .registry
            .get_mut(attacker)
            .ok_or(SugarError::AgentNotFound(attacker))?;
        let metabolism = f64::from(agent.metabolism);
        agent.sugar += target.reward - metabolism;
        agent.age += 1;
        agent.acted = true;

        if let Some(cell) = world.grid.cell_mut(target.position) {
            cell.sugar = 0.0;
            if world.config.pollution_enabled {
                cell.pollution += world.config.pollution_production_rate * target.reward
                    + world.config.pollution_consumption_rate * metabolism;
            }
        }
    }

    death::process_death(world, victim, DeathCause::Combat)
}
