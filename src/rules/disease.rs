//! Disease rule
//!
//! Two model-wide passes per tick. Transmission: every agent catches one
//! random disease from each von Neumann neighbor unless it already carries
//! that exact strain. Immune response: for each uncontained disease the
//! immune system finds its closest window and mutates one bit toward the
//! strain; fully contained strains are cleared, and each strain still
//! uncontained costs one sugar of extra metabolism.

use rand::Rng;

use crate::core::bitset::BitVec;
use crate::core::types::AgentId;
use crate::world::World;

/// Transmission pass over all agents in tick order
pub fn transmission(world: &mut World, order: &[AgentId]) {
    for &id in order {
        if !world.registry.contains(id) {
            continue;
        }
        let neighbors = world.neighbor_agents(id);
        for nid in neighbors {
            let strain: Option<BitVec> = world.registry.get(nid).and_then(|donor| {
                if donor.diseases.is_empty() {
                    None
                } else {
                    let pick = world.rng.gen_range(0..donor.diseases.len());
                    Some(donor.diseases[pick].clone())
                }
            });
            let Some(strain) = strain else {
                continue;
            };
            if let Some(agent) = world.registry.get_mut(id) {
                if !agent.diseases.contains(&strain) {
                    agent.diseases.push(strain);
                }
            }
        }
    }
}

/// Immune response pass over all agents in tick order
///
/// At most one immunity bit mutates per disease per tick. The metabolic
/// penalty is applied after the immunity update, counting only strains the
/// updated immune system still does not contain.
pub fn immune_response(world: &mut World, order: &[AgentId]) {
    for &id in order {
        let Some(agent) = world.registry.get_mut(id) else {
            continue;
        };
        let carried = std::mem::take(&mut agent.diseases);
        let mut remaining = Vec::with_capacity(carried.len());
        let mut penalty = 0u32;

        for strain in carried {
            if agent.immunity.contains_window(&strain) {
                // recovered: a contained strain has no further effect
                continue;
            }
            if let Some((start, _)) = agent.immunity.best_window(&strain) {
                for i in 0..strain.len() {
                    if agent.immunity.get(start + i) != strain.get(i) {
                        agent.immunity.set(start + i, strain.get(i));
                        break;
                    }
                }
            }
            if agent.immunity.contains_window(&strain) {
                continue;
            }
            penalty += 1;
            remaining.push(strain);
        }

        agent.diseases = remaining;
        agent.sugar -= f64::from(penalty);
    }
}
