//! Integration tests for the reproduction rule
//!
//! Verifies that births conserve wealth, that children inherit their
//! attributes from the parents, and that a fertile colony actually grows
//! under the full tick loop.

use sugarscape::core::config::SimulationConfig;
use sugarscape::core::types::{Position, Sex};
use sugarscape::simulation::run_tick;
use sugarscape::World;

fn fertile_config() -> SimulationConfig {
    SimulationConfig {
        grid_width: 20,
        grid_height: 20,
        sugar_peaks: vec![Position::new(10, 10)],
        peak_radius: 25.0,
        initial_population: 30,
        reproduction_enabled: true,
        ..Default::default()
    }
}

#[test]
fn test_colony_grows_under_run() {
    let mut world = World::new(fertile_config()).unwrap();
    // make everyone fertile from the start
    let ids = world.registry.ids();
    for id in ids {
        let agent = world.registry.get_mut(id).unwrap();
        agent.age = 20;
        agent.sugar = agent.initial_sugar * 2.0;
    }
    for _ in 0..15 {
        run_tick(&mut world).unwrap();
    }
    assert!(
        world.metrics.births > 0,
        "a fertile colony should produce children"
    );
}

#[test]
fn test_births_conserve_agent_wealth() {
    let config = SimulationConfig {
        grid_width: 10,
        grid_height: 10,
        sugar_peaks: vec![],
        max_capacity: 0.0,
        growth_rate: 0.0,
        initial_population: 0,
        reproduction_enabled: true,
        metabolism_range: (1, 1),
        ..Default::default()
    };
    let mut world = World::new(config).unwrap();
    for (pos, sex) in [
        (Position::new(4, 4), Sex::Female),
        (Position::new(4, 5), Sex::Male),
        (Position::new(5, 4), Sex::Male),
        (Position::new(6, 6), Sex::Female),
    ] {
        let id = world.spawn_random_agent().unwrap().unwrap();
        world.registry.move_agent(id, pos).unwrap();
        let agent = world.registry.get_mut(id).unwrap();
        agent.sex = sex;
        agent.age = 25;
        agent.max_age = 200;
        agent.sugar = 100.0;
        agent.initial_sugar = 40.0;
    }

    let wealth_before: f64 = world.registry.iter().map(|a| a.sugar).sum();
    let adults = world.registry.len();
    run_tick(&mut world).unwrap();

    // on a barren grid the only wealth flows are metabolism and the
    // parent-to-child endowment transfers, which net to zero; children
    // born mid-tick do not metabolize until the next pass
    let burned = adults as f64;
    let wealth_after: f64 = world.registry.iter().map(|a| a.sugar).sum();
    assert!(
        (wealth_before - burned - wealth_after).abs() < 1e-9,
        "before {wealth_before}, after {wealth_after}, burned {burned}"
    );
}

#[test]
fn test_child_attributes_drawn_from_parents() {
    let config = SimulationConfig {
        grid_width: 10,
        grid_height: 10,
        sugar_peaks: vec![],
        max_capacity: 0.0,
        initial_population: 0,
        reproduction_enabled: true,
        ..Default::default()
    };
    let mut world = World::new(config).unwrap();
    let mut parents = Vec::new();
    for (pos, sex, vision, metabolism) in [
        (Position::new(4, 4), Sex::Female, 2u32, 1u32),
        (Position::new(4, 5), Sex::Male, 5u32, 3u32),
    ] {
        let id = world.spawn_random_agent().unwrap().unwrap();
        world.registry.move_agent(id, pos).unwrap();
        let agent = world.registry.get_mut(id).unwrap();
        agent.sex = sex;
        agent.age = 25;
        agent.sugar = 60.0;
        agent.initial_sugar = 50.0;
        agent.vision = vision;
        agent.metabolism = metabolism;
        parents.push(id);
    }

    sugarscape::rules::reproduction::reproduce(&mut world, parents[0]).unwrap();
    assert_eq!(world.metrics.births, 1);

    let child_id = world.registry.get(parents[0]).unwrap().children[0];
    let child = world.registry.get(child_id).unwrap();
    assert!(child.vision == 2 || child.vision == 5);
    assert!(child.metabolism == 1 || child.metabolism == 3);
    assert_eq!(child.immunity.len(), world.config.immunity_length);
    assert!(child.diseases.is_empty());
    assert!(child.loans_owed.is_empty() && child.loans_given.is_empty());
}
