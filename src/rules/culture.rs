//! Cultural transmission rule
//!
//! One-directional assimilation: for each von Neumann neighbor the agent
//! picks a random tag position and, if the neighbor disagrees there, flips
//! the neighbor's bit to its own value. The agent's own tag never changes
//! from this interaction. Tribe membership is derived from the tag's
//! majority bit, never stored.

use rand::Rng;

use crate::core::error::{DecisionFailure, Result, SugarError};
use crate::core::types::AgentId;
use crate::decision::context::{AgentView, CultureContext};
use crate::world::World;

/// Resolve one agent's culture spread for this tick
pub fn spread(world: &mut World, id: AgentId) -> Result<()> {
    let Some(agent) = world.registry.get(id) else {
        return Ok(());
    };
    let tag_length = agent.culture.len();
    let neighbors = world.neighbor_agents(id);
    if neighbors.is_empty() {
        return Ok(());
    }

    let flips: Vec<(AgentId, usize)> = match provider_targets(world, id, tag_length, &neighbors)? {
        Some(targets) => targets,
        None if world.strict_mode() => return Ok(()),
        None => neighbors
            .into_iter()
            .map(|nid| (nid, world.rng.gen_range(0..tag_length)))
            .collect(),
    };

    for (nid, bit_index) in flips {
        let Some(my_bit) = world.registry.get(id).map(|a| a.culture.get(bit_index)) else {
            return Ok(());
        };
        if let Some(neighbor) = world.registry.get_mut(nid) {
            if neighbor.culture.get(bit_index) != my_bit {
                neighbor.culture.set(bit_index, my_bit);
            }
        }
    }
    Ok(())
}

/// Strict mode: (target, bit) pairs from the provider, validated against
/// actual neighbors and the fixed tag length
fn provider_targets(
    world: &World,
    id: AgentId,
    tag_length: usize,
    neighbors: &[AgentId],
) -> Result<Option<Vec<(AgentId, usize)>>> {
    let Some(provider) = &world.provider else {
        return Ok(None);
    };
    let agent = AgentView::of(world, id).ok_or(SugarError::AgentNotFound(id))?;
    let ctx = CultureContext {
        agent,
        culture_length: tag_length,
        neighbors: neighbors
            .iter()
            .filter_map(|nid| AgentView::of(world, *nid))
            .collect(),
    };
    let decision = provider.culture_decision(&ctx)?;
    if !decision.spread {
        return Ok(None);
    }
    let mut flips = Vec::with_capacity(decision.targets.len());
    for target in decision.targets {
        if !neighbors.contains(&target.target_id) {
            return Err(SugarError::decision(
                "culture",
                id,
                "targets",
                DecisionFailure::Validation,
                format!("agent {} is not a von Neumann neighbor", target.target_id.0),
            ));
        }
        if target.bit_index >= tag_length {
            return Err(SugarError::decision(
                "culture",
                id,
                "targets",
                DecisionFailure::Validation,
                format!(
                    "bit index {} out of range for tag length {}",
                    target.bit_index, tag_length
                ),
            ));
        }
        flips.push((target.target_id, target.bit_index));
    }
    Ok(Some(flips))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::bitset::BitVec;
    use crate::core::config::SimulationConfig;
    use crate::core::types::Position;
    use crate::world::agent::Tribe;

    fn culture_world() -> World {
        let config = SimulationConfig {
            grid_width: 6,
            grid_height: 6,
            initial_population: 0,
            culture_enabled: true,
            culture_length: 5,
            ..Default::default()
        };
        World::new(config).unwrap()
    }

    fn place(world: &mut World, pos: Position, culture: &str) -> AgentId {
        let id = world.spawn_random_agent().unwrap().unwrap();
        world.registry.move_agent(id, pos).unwrap();
        world.registry.get_mut(id).unwrap().culture =
            BitVec::from_bits(culture.chars().map(|c| c == '1').collect());
        id
    }

    fn hamming(world: &World, a: AgentId, b: AgentId) -> usize {
        world
            .registry
            .get(a)
            .unwrap()
            .culture
            .hamming(&world.registry.get(b).unwrap().culture)
    }

    #[test]
    fn test_spread_never_increases_distance() {
        let mut world = culture_world();
        let a = place(&mut world, Position::new(2, 2), "11111");
        let b = place(&mut world, Position::new(2, 3), "00000");

        let mut previous = hamming(&world, a, b);
        for _ in 0..50 {
            spread(&mut world, a).unwrap();
            let now = hamming(&world, a, b);
            assert!(now <= previous, "assimilation must not diverge tags");
            previous = now;
        }
        assert_eq!(previous, 0, "repeated spread converges the neighbor");
        // one-directional: the speaker's tag is untouched
        let tag = &world.registry.get(a).unwrap().culture;
        assert_eq!(tag.count_ones(), 5);
    }

    #[test]
    fn test_spread_can_flip_tribe() {
        let mut world = culture_world();
        let a = place(&mut world, Position::new(2, 2), "11111");
        let b = place(&mut world, Position::new(2, 3), "00011");
        assert_eq!(world.registry.get(b).unwrap().tribe(), Tribe::Blue);

        for _ in 0..50 {
            spread(&mut world, a).unwrap();
        }
        assert_eq!(world.registry.get(b).unwrap().tribe(), Tribe::Red);
    }

    #[test]
    fn test_no_neighbors_no_op() {
        let mut world = culture_world();
        let a = place(&mut world, Position::new(2, 2), "10101");
        spread(&mut world, a).unwrap();
        assert_eq!(world.registry.get(a).unwrap().culture.count_ones(), 3);
    }
}
