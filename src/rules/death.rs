//! Death, inheritance, and replacement
//!
//! The death check runs right after movement/combat, before reproduction
//! and credit, so starvation removes non-positive-wealth agents before any
//! estate is divided: inheritance only ever sees positive wealth.

use crate::core::error::Result;
use crate::core::types::AgentId;
use crate::world::agent::Agent;
use crate::world::metrics::DeathCause;
use crate::world::World;

use super::credit;

/// Check starvation and old age; returns true when the agent died
pub fn death_check(world: &mut World, id: AgentId) -> Result<bool> {
    let Some(agent) = world.registry.get(id) else {
        return Ok(true); // already removed this tick
    };
    let cause = if agent.sugar <= 0.0 {
        Some(DeathCause::Starvation)
    } else if agent.age >= agent.max_age {
        Some(DeathCause::OldAge)
    } else {
        None
    };
    match cause {
        Some(cause) => {
            kill_agent(world, id, cause)?;
            Ok(true)
        }
        None => Ok(false),
    }
}

/// Remove an agent and run all death bookkeeping
pub fn kill_agent(world: &mut World, id: AgentId, cause: DeathCause) -> Result<()> {
    let Some(agent) = world.registry.remove(id) else {
        return Ok(());
    };
    process_death(world, agent, cause)
}

/// Bookkeeping for an already-removed agent
///
/// Order matters: the estate goes to living children first, then the loan
/// ledgers are settled (heirs may pick up the deceased's claims), then the
/// counters update. With reproduction disabled a replacement agent spawns
/// to conserve population size.
pub fn process_death(world: &mut World, agent: Agent, cause: DeathCause) -> Result<()> {
    tracing::debug!(agent = agent.id.0, ?cause, age = agent.age, "death");

    if world.config.reproduction_enabled && agent.sugar > 0.0 {
        distribute_inheritance(world, &agent);
    }
    credit::settle_death(world, &agent);
    world.metrics.record_death(cause, agent.age);

    if !world.config.reproduction_enabled {
        if world.spawn_random_agent()?.is_none() {
            tracing::debug!("grid saturated, replacement skipped");
        }
    }
    Ok(())
}

/// Floor-integer division of the estate among living children
///
/// Children are checked for existence per id; with none alive the wealth
/// leaves the system. A zero share (estate smaller than the child count)
/// is a guarded no-op.
fn distribute_inheritance(world: &mut World, deceased: &Agent) {
    let heirs: Vec<AgentId> = deceased
        .children
        .iter()
        .copied()
        .filter(|child| world.registry.contains(*child))
        .collect();
    if heirs.is_empty() {
        return;
    }
    let share = (deceased.sugar / heirs.len() as f64).floor();
    if share <= 0.0 {
        return;
    }
    for child in &heirs {
        if let Some(heir) = world.registry.get_mut(*child) {
            heir.sugar += share;
        }
    }
    world.metrics.total_inheritances += heirs.len() as u64;
    world.metrics.inherited_sugar += share * heirs.len() as f64;
    tracing::debug!(
        deceased = deceased.id.0,
        heirs = heirs.len(),
        share,
        "inheritance distributed"
    );
}
