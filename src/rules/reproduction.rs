//! Reproduction rule
//!
//! Fertile agents mate with opposite-sex fertile von Neumann neighbors.
//! Each mating costs each parent half of its initial endowment, which
//! becomes the child's starting wealth; vision, metabolism, and max age
//! come from either parent at random, culture and immunity by per-bit
//! crossover. The wealth ratio bounds matings per tick so an agent cannot
//! spend itself below fertility mid-pass without the formula noticing.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::core::bitset::BitVec;
use crate::core::error::{DecisionFailure, Result, SugarError};
use crate::core::types::{AgentId, Position, Sex};
use crate::decision::context::{AgentView, ReproductionContext};
use crate::world::agent::Agent;
use crate::world::World;

/// Matings allowed this tick: max(floor(log2(wealth / endowment)) + 1, 0)
pub fn max_matings(agent: &Agent) -> u32 {
    if agent.initial_sugar <= 0.0 || agent.sugar <= 0.0 {
        return 0;
    }
    let ratio = agent.sugar / agent.initial_sugar;
    if ratio < 1.0 {
        return 0;
    }
    let bound = (ratio.log2().floor() as i64) + 1;
    bound.max(0) as u32
}

/// Resolve one agent's reproduction for this tick
pub fn reproduce(world: &mut World, id: AgentId) -> Result<()> {
    if !world.config.reproduction_enabled {
        return Ok(());
    }
    let Some(agent) = world.registry.get(id) else {
        return Ok(());
    };
    if !agent.fertile(&world.config) {
        return Ok(());
    }
    let budget = max_matings(agent);
    if budget == 0 {
        return Ok(());
    }

    let sex = agent.sex;
    let eligible: Vec<AgentId> = world
        .neighbor_agents(id)
        .into_iter()
        .filter(|pid| {
            world
                .registry
                .get(*pid)
                .is_some_and(|p| p.sex != sex && p.fertile(&world.config))
        })
        .collect();
    if eligible.is_empty() {
        return Ok(());
    }

    let partners = match provider_partners(world, id, budget, &eligible)? {
        Some(partners) => partners,
        None if world.strict_mode() => return Ok(()),
        None => {
            let mut pool = eligible.clone();
            pool.shuffle(&mut world.rng);
            pool.truncate(budget as usize);
            pool
        }
    };

    for partner_id in partners {
        // wealth drops with each mating; both parents must still qualify
        let still_fertile = world
            .registry
            .get(id)
            .is_some_and(|a| a.fertile(&world.config));
        let partner_fertile = world
            .registry
            .get(partner_id)
            .is_some_and(|p| p.sex != sex && p.fertile(&world.config));
        if !still_fertile {
            break;
        }
        if !partner_fertile {
            continue;
        }
        try_conceive(world, id, partner_id)?;
    }
    Ok(())
}

/// Strict mode: partner list from the provider, bounded and validated
fn provider_partners(
    world: &World,
    id: AgentId,
    budget: u32,
    eligible: &[AgentId],
) -> Result<Option<Vec<AgentId>>> {
    let Some(provider) = &world.provider else {
        return Ok(None);
    };
    let agent = AgentView::of(world, id).ok_or(SugarError::AgentNotFound(id))?;
    let ctx = ReproductionContext {
        agent,
        max_matings: budget,
        candidates: eligible
            .iter()
            .filter_map(|pid| AgentView::of(world, *pid))
            .collect(),
    };
    let decision = provider.reproduction_decision(&ctx)?;
    if !decision.reproduce {
        return Ok(None);
    }
    if decision.partner_ids.len() > budget as usize {
        return Err(SugarError::decision(
            "reproduction",
            id,
            "partner_ids",
            DecisionFailure::Validation,
            format!(
                "{} partners exceeds the mating budget of {}",
                decision.partner_ids.len(),
                budget
            ),
        ));
    }
    for pid in &decision.partner_ids {
        if !eligible.contains(pid) {
            return Err(SugarError::decision(
                "reproduction",
                id,
                "partner_ids",
                DecisionFailure::Validation,
                format!("agent {} is not an eligible partner", pid.0),
            ));
        }
    }
    Ok(Some(decision.partner_ids))
}

/// One mating attempt; silently a no-op when no free cell adjoins a parent
fn try_conceive(world: &mut World, mother: AgentId, father: AgentId) -> Result<()> {
    let (pos_a, pos_b) = {
        let a = world.registry.get(mother).ok_or(SugarError::AgentNotFound(mother))?;
        let b = world.registry.get(father).ok_or(SugarError::AgentNotFound(father))?;
        (a.position, b.position)
    };
    let mut free: Vec<Position> = pos_a
        .von_neumann()
        .into_iter()
        .chain(pos_b.von_neumann())
        .filter(|pos| world.grid.in_bounds(*pos) && world.registry.is_empty_cell(*pos))
        .collect();
    free.dedup();
    if free.is_empty() {
        return Ok(());
    }
    let birthplace = free[world.rng.gen_range(0..free.len())];

    let (contribution_a, contribution_b, child) = {
        let a = world.registry.get(mother).ok_or(SugarError::AgentNotFound(mother))?;
        let b = world.registry.get(father).ok_or(SugarError::AgentNotFound(father))?;
        let contribution_a = a.initial_sugar / 2.0;
        let contribution_b = b.initial_sugar / 2.0;
        let endowment = contribution_a + contribution_b;

        let vision = if world.rng.gen_bool(0.5) { a.vision } else { b.vision };
        let metabolism = if world.rng.gen_bool(0.5) {
            a.metabolism
        } else {
            b.metabolism
        };
        let max_age = if world.rng.gen_bool(0.5) { a.max_age } else { b.max_age };
        let sex = if world.rng.gen_bool(0.5) {
            Sex::Male
        } else {
            Sex::Female
        };
        let culture = BitVec::crossover(&a.culture, &b.culture, &mut world.rng);
        let immunity = BitVec::crossover(&a.immunity, &b.immunity, &mut world.rng);

        let child = Agent {
            id: AgentId(0), // assigned below
            position: birthplace,
            vision,
            metabolism,
            sugar: endowment,
            age: 0,
            max_age,
            sex,
            culture,
            immunity,
            diseases: Vec::new(),
            loans_given: Vec::new(),
            loans_owed: Vec::new(),
            children: Vec::new(),
            initial_sugar: endowment,
            acted: false,
            personality: None,
        };
        (contribution_a, contribution_b, child)
    };

    let child_id = world.registry.allocate_id();
    let mut child = child;
    child.id = child_id;
    world.registry.insert(child)?;

    if let Some(a) = world.registry.get_mut(mother) {
        a.sugar -= contribution_a;
        a.children.push(child_id);
    }
    if let Some(b) = world.registry.get_mut(father) {
        b.sugar -= contribution_b;
        b.children.push(child_id);
    }
    world.metrics.births += 1;
    tracing::debug!(
        parent_a = mother.0,
        parent_b = father.0,
        child = child_id.0,
        "birth"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::SimulationConfig;

    fn family_world() -> World {
        let config = SimulationConfig {
            grid_width: 8,
            grid_height: 8,
            initial_population: 0,
            reproduction_enabled: true,
            ..Default::default()
        };
        World::new(config).unwrap()
    }

    fn place_parent(world: &mut World, pos: Position, sex: Sex, sugar: f64) -> AgentId {
        let id = world.spawn_random_agent().unwrap().unwrap();
        world.registry.move_agent(id, pos).unwrap();
        let agent = world.registry.get_mut(id).unwrap();
        agent.sex = sex;
        agent.age = 25;
        agent.sugar = sugar;
        agent.initial_sugar = 50.0;
        id
    }

    #[test]
    fn test_max_matings_formula() {
        let mut agent = crate::world::agent::tests::test_agent(1, "00100");
        agent.initial_sugar = 50.0;
        agent.sugar = 50.0; // ratio 1 -> floor(0) + 1
        assert_eq!(max_matings(&agent), 1);
        agent.sugar = 100.0; // ratio 2 -> 2
        assert_eq!(max_matings(&agent), 2);
        agent.sugar = 250.0; // ratio 5 -> floor(2.32) + 1
        assert_eq!(max_matings(&agent), 3);
        agent.sugar = 25.0; // below endowment
        assert_eq!(max_matings(&agent), 0);
    }

    #[test]
    fn test_child_conserves_parent_wealth() {
        let mut world = family_world();
        let mother = place_parent(&mut world, Position::new(3, 3), Sex::Female, 60.0);
        let father = place_parent(&mut world, Position::new(3, 4), Sex::Male, 80.0);

        reproduce(&mut world, mother).unwrap();

        assert_eq!(world.metrics.births, 1);
        let m = world.registry.get(mother).unwrap();
        let f = world.registry.get(father).unwrap();
        // each contributed half its endowment of 50
        assert_eq!(m.sugar, 35.0);
        assert_eq!(f.sugar, 55.0);
        assert_eq!(m.children.len(), 1);
        assert_eq!(m.children, f.children);

        let child = world.registry.get(m.children[0]).unwrap();
        assert_eq!(child.sugar, 50.0);
        assert_eq!(child.initial_sugar, 50.0);
        assert_eq!(child.age, 0);
        assert_eq!(child.culture.len(), world.config.culture_length);
        // child sits next to a parent
        let near_parent = child.position.manhattan(&m.position) == 1
            || child.position.manhattan(&f.position) == 1;
        assert!(near_parent);
    }

    #[test]
    fn test_infertile_agents_do_not_reproduce() {
        let mut world = family_world();
        let mother = place_parent(&mut world, Position::new(3, 3), Sex::Female, 60.0);
        let father = place_parent(&mut world, Position::new(3, 4), Sex::Male, 80.0);
        // mother below her endowment: not fertile
        world.registry.get_mut(mother).unwrap().sugar = 20.0;

        reproduce(&mut world, mother).unwrap();
        reproduce(&mut world, father).unwrap(); // partner now infertile too

        assert_eq!(world.metrics.births, 0);
    }

    #[test]
    fn test_same_sex_neighbors_not_partners() {
        let mut world = family_world();
        let a = place_parent(&mut world, Position::new(3, 3), Sex::Female, 60.0);
        place_parent(&mut world, Position::new(3, 4), Sex::Female, 60.0);

        reproduce(&mut world, a).unwrap();
        assert_eq!(world.metrics.births, 0);
    }

    #[test]
    fn test_no_free_cell_no_child() {
        let mut world = family_world();
        // parents in a corner, every adjacent cell occupied by extras
        let mother = place_parent(&mut world, Position::new(0, 0), Sex::Female, 60.0);
        let father = place_parent(&mut world, Position::new(0, 1), Sex::Male, 60.0);
        place_parent(&mut world, Position::new(1, 0), Sex::Female, 10.0);
        place_parent(&mut world, Position::new(1, 1), Sex::Female, 10.0);
        place_parent(&mut world, Position::new(0, 2), Sex::Female, 10.0);
        place_parent(&mut world, Position::new(1, 2), Sex::Female, 10.0);

        reproduce(&mut world, mother).unwrap();
        assert_eq!(world.metrics.births, 0);
        // contributions must not have been deducted
        assert_eq!(world.registry.get(mother).unwrap().sugar, 60.0);
        assert_eq!(world.registry.get(father).unwrap().sugar, 60.0);
    }
}
