//! Tick orchestrator
//!
//! Fixed per-tick order: environment phase (growback, pollution diffusion),
//! then every agent in a once-per-tick randomized order runs
//! combat-or-movement, the death check, reproduction, culture, and credit
//! (repay before lend), then the model-wide disease passes. A tick either
//! completes fully or the run aborts on the propagated error; rules never
//! leave a half-applied action behind on the paths that can fail.

use crate::core::error::Result;
use crate::rules::{combat, credit, culture, death, disease, reproduction};
use crate::world::World;

/// Advance the simulation by one tick
pub fn run_tick(world: &mut World) -> Result<()> {
    // transient per-tick flags reset before anyone acts
    for id in world.registry.ids() {
        if let Some(agent) = world.registry.get_mut(id) {
            agent.acted = false;
        }
    }

    // 1. environment: growback
    if world.config.seasonal_growback {
        world.grid.seasonal_growback(world.tick, &world.config);
    } else {
        world.grid.growback(world.config.growth_rate);
    }

    // 2. environment: pollution diffusion on its interval
    if world.config.pollution_enabled
        && world.tick % world.config.pollution_diffusion_interval == 0
    {
        world.grid.diffuse_pollution();
    }

    // 3. per-agent phase, order randomized once for the whole tick
    let order = world.shuffled_ids();
    for &id in &order {
        if !world.registry.contains(id) {
            continue; // died earlier this tick
        }
        combat::combat_or_move(world, id)?;
        if death::death_check(world, id)? {
            continue;
        }
        if world.config.reproduction_enabled {
            reproduction::reproduce(world, id)?;
        }
        if world.config.culture_enabled {
            culture::spread(world, id)?;
        }
        if world.config.credit_enabled {
            credit::repay_due_loans(world, id)?;
            credit::originate(world, id)?;
        }
    }

    // 4. model-wide disease passes, same tick order
    if world.config.disease_enabled {
        disease::transmission(world, &order);
        disease::immune_response(world, &order);
    }

    world.tick += 1;
    tracing::debug!(
        tick = world.tick,
        population = world.registry.len(),
        "tick complete"
    );
    Ok(())
}
