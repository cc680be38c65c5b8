//! Credit rule
//!
//! Per agent per tick: settle loans falling due (full repayment, or pay
//! half wealth and roll the remainder into a fresh loan), then lend any
//! surplus to von Neumann neighbors that want to borrow. Loans live in the
//! world arena; both ledger sides hold the same arena id, so settlement is
//! atomic by construction. Death forgives or reassigns: lenders' claims
//! pass to living children when inheritance is active, borrowers' debts
//! die with them.

use crate::core::error::{DecisionFailure, Result, SugarError};
use crate::core::types::AgentId;
use crate::decision::context::{AgentView, BorrowerView, CreditContext};
use crate::world::agent::Agent;
use crate::world::loans::LoanId;
use crate::world::World;

/// Lendable surplus for this tick
///
/// Past the fertile window: half of current wealth. Fertile by age with
/// wealth above the initial endowment: the excess. Otherwise (too young,
/// or fertile without surplus): nothing.
pub fn amount_available(world: &World, agent: &Agent) -> f64 {
    if agent.past_fertility(&world.config) {
        (agent.sugar / 2.0).max(0.0)
    } else if agent.fertile_by_age(&world.config) && agent.sugar > agent.initial_sugar {
        agent.sugar - agent.initial_sugar
    } else {
        0.0
    }
}

/// Borrowing need for this tick
///
/// An agent borrows only while fertile by age, below its initial endowment,
/// and with positive income (wealth minus metabolism minus everything it
/// already owes). Need is the gap back to the endowment.
pub fn amount_required(world: &World, agent: &Agent) -> f64 {
    if !agent.fertile_by_age(&world.config) || agent.sugar >= agent.initial_sugar {
        return 0.0;
    }
    let owed: f64 = agent
        .loans_owed
        .iter()
        .filter_map(|lid| world.loans.get(*lid))
        .map(|loan| loan.principal)
        .sum();
    let income = agent.sugar - f64::from(agent.metabolism) - owed;
    if income <= 0.0 {
        return 0.0;
    }
    (agent.initial_sugar - agent.sugar).max(0.0)
}

fn drop_given(world: &mut World, lender: AgentId, lid: LoanId) {
    if let Some(agent) = world.registry.get_mut(lender) {
        agent.loans_given.retain(|x| *x != lid);
    }
}

fn drop_owed(world: &mut World, borrower: AgentId, lid: LoanId) {
    if let Some(agent) = world.registry.get_mut(borrower) {
        agent.loans_owed.retain(|x| *x != lid);
    }
}

/// Settle this borrower's loans that fall due at the current tick
pub fn repay_due_loans(world: &mut World, id: AgentId) -> Result<()> {
    let Some(agent) = world.registry.get(id) else {
        return Ok(());
    };
    let due: Vec<LoanId> = agent
        .loans_owed
        .iter()
        .copied()
        .filter(|lid| {
            world
                .loans
                .get(*lid)
                .is_some_and(|loan| loan.due_tick <= world.tick)
        })
        .collect();

    for lid in due {
        let Some(loan) = world.loans.get(lid).cloned() else {
            continue;
        };
        if !world.registry.contains(loan.lender) {
            // lender vanished without settlement: forgive
            world.loans.remove(lid);
            drop_owed(world, id, lid);
            world.metrics.loans_forgiven += 1;
            continue;
        }
        let amount_due = loan.amount_due();
        let wealth = world.registry.get(id).map(|a| a.sugar).unwrap_or(0.0);

        if wealth >= amount_due {
            // full repayment: transfer and retire both sides
            if let Some(borrower) = world.registry.get_mut(id) {
                borrower.sugar -= amount_due;
            }
            if let Some(lender) = world.registry.get_mut(loan.lender) {
                lender.sugar += amount_due;
            }
            world.loans.remove(lid);
            drop_owed(world, id, lid);
            drop_given(world, loan.lender, lid);
            world.metrics.loans_repaid += 1;
            tracing::debug!(loan = lid.0, amount = amount_due, "loan repaid in full");
        } else {
            // partial: pay half current wealth, roll the remainder over
            let payment = (wealth / 2.0).max(0.0);
            if let Some(borrower) = world.registry.get_mut(id) {
                borrower.sugar -= payment;
            }
            if let Some(lender) = world.registry.get_mut(loan.lender) {
                lender.sugar += payment;
            }
            let remainder = amount_due - payment;
            world.loans.remove(lid);
            drop_owed(world, id, lid);
            drop_given(world, loan.lender, lid);
            let rolled = world.loans.insert(
                loan.lender,
                id,
                remainder,
                world.tick + world.config.loan_duration,
                loan.rate,
            );
            if let Some(lender) = world.registry.get_mut(loan.lender) {
                lender.loans_given.push(rolled);
            }
            if let Some(borrower) = world.registry.get_mut(id) {
                borrower.loans_owed.push(rolled);
            }
            tracing::debug!(
                loan = lid.0,
                rolled = rolled.0,
                payment,
                remainder,
                "loan rolled over"
            );
        }
    }
    Ok(())
}

/// Lend surplus to willing von Neumann neighbors
pub fn originate(world: &mut World, id: AgentId) -> Result<()> {
    let Some(agent) = world.registry.get(id) else {
        return Ok(());
    };
    let mut available = amount_available(world, agent);
    if available <= 0.0 {
        return Ok(());
    }

    let eligible: Vec<(AgentId, f64)> = world
        .neighbor_agents(id)
        .into_iter()
        .filter_map(|nid| {
            let neighbor = world.registry.get(nid)?;
            let required = amount_required(world, neighbor);
            (required > 0.0).then_some((nid, required))
        })
        .collect();
    if eligible.is_empty() {
        return Ok(());
    }

    let order = match provider_counterparties(world, id, available, &eligible)? {
        Some(order) => order,
        // declined, or rule-based mode: lend in neighbor order
        None if world.strict_mode() => return Ok(()),
        None => eligible.iter().map(|(nid, _)| *nid).collect(),
    };

    for nid in order {
        if available <= 0.0 {
            break;
        }
        // recompute: earlier loans this pass may have changed the neighbor
        let required = world
            .registry
            .get(nid)
            .map(|n| amount_required(world, n))
            .unwrap_or(0.0);
        if required <= 0.0 {
            continue;
        }
        let amount = available.min(required);
        if let Some(lender) = world.registry.get_mut(id) {
            lender.sugar -= amount;
        }
        if let Some(borrower) = world.registry.get_mut(nid) {
            borrower.sugar += amount;
        }
        let lid = world.loans.insert(
            id,
            nid,
            amount,
            world.tick + world.config.loan_duration,
            world.config.interest_rate,
        );
        if let Some(lender) = world.registry.get_mut(id) {
            lender.loans_given.push(lid);
        }
        if let Some(borrower) = world.registry.get_mut(nid) {
            borrower.loans_owed.push(lid);
        }
        world.metrics.loans_originated += 1;
        available -= amount;
        tracing::debug!(lender = id.0, borrower = nid.0, amount, "loan originated");
    }
    Ok(())
}

/// Strict mode: ask the provider for the lending order
///
/// Ok(None) means the provider declined to act (or rule-based mode).
fn provider_counterparties(
    world: &World,
    id: AgentId,
    available: f64,
    eligible: &[(AgentId, f64)],
) -> Result<Option<Vec<AgentId>>> {
    let Some(provider) = &world.provider else {
        return Ok(None);
    };
    let agent = AgentView::of(world, id).ok_or(SugarError::AgentNotFound(id))?;
    let ctx = CreditContext {
        agent,
        amount_available: available,
        eligible_borrowers: eligible
            .iter()
            .map(|(nid, required)| BorrowerView {
                id: *nid,
                required: *required,
            })
            .collect(),
    };
    let decision = provider.credit_decision(&ctx)?;
    if !decision.act {
        return Ok(None);
    }
    for nid in &decision.counterparties {
        if !eligible.iter().any(|(e, _)| e == nid) {
            return Err(SugarError::decision(
                "credit",
                id,
                "counterparties",
                DecisionFailure::Validation,
                format!("agent {} is not an eligible borrower", nid.0),
            ));
        }
    }
    Ok(Some(decision.counterparties))
}

/// Settle the ledgers of a dead agent
///
/// As lender: each claim is reassigned to living children (co-creditors of
/// the same amount and terms) when inheritance is active, forgiven
/// otherwise. As borrower: the lender simply loses the claim.
pub fn settle_death(world: &mut World, deceased: &Agent) {
    for lid in &deceased.loans_given {
        let Some(loan) = world.loans.remove(*lid) else {
            continue;
        };
        drop_owed(world, loan.borrower, *lid);

        let heirs: Vec<AgentId> = if world.config.reproduction_enabled {
            deceased
                .children
                .iter()
                .copied()
                .filter(|child| world.registry.contains(*child))
                .collect()
        } else {
            Vec::new()
        };

        if heirs.is_empty() || !world.registry.contains(loan.borrower) {
            world.metrics.loans_forgiven += 1;
            continue;
        }
        for child in heirs {
            let new_id = world.loans.insert(
                child,
                loan.borrower,
                loan.principal,
                loan.due_tick,
                loan.rate,
            );
            if let Some(heir) = world.registry.get_mut(child) {
                heir.loans_given.push(new_id);
            }
            if let Some(borrower) = world.registry.get_mut(loan.borrower) {
                borrower.loans_owed.push(new_id);
            }
        }
    }

    for lid in &deceased.loans_owed {
        let Some(loan) = world.loans.remove(*lid) else {
            continue;
        };
        drop_given(world, loan.lender, *lid);
        world.metrics.loans_forgiven += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::SimulationConfig;
    use crate::core::types::Position;

    fn credit_world() -> World {
        let config = SimulationConfig {
            grid_width: 8,
            grid_height: 8,
            initial_population: 0,
            credit_enabled: true,
            loan_duration: 5,
            interest_rate: 0.1,
            ..Default::default()
        };
        World::new(config).unwrap()
    }

    fn place(world: &mut World, pos: Position, sugar: f64, endowment: f64, age: u32) -> AgentId {
        let id = world.spawn_random_agent().unwrap().unwrap();
        world.registry.move_agent(id, pos).unwrap();
        let agent = world.registry.get_mut(id).unwrap();
        agent.sugar = sugar;
        agent.initial_sugar = endowment;
        agent.age = age;
        agent.metabolism = 1;
        agent.sex = crate::core::types::Sex::Male; // fertile window 15..=50
        id
    }

    #[test]
    fn test_lending_capacity() {
        let world = credit_world();
        let mut old = crate::world::agent::tests::test_agent(1, "00100");
        old.sex = crate::core::types::Sex::Male;
        old.age = 60; // past window
        old.sugar = 80.0;
        assert_eq!(amount_available(&world, &old), 40.0);

        let mut fertile = crate::world::agent::tests::test_agent(2, "00100");
        fertile.sex = crate::core::types::Sex::Male;
        fertile.age = 30;
        fertile.initial_sugar = 50.0;
        fertile.sugar = 70.0;
        assert_eq!(amount_available(&world, &fertile), 20.0);

        fertile.sugar = 40.0; // no surplus
        assert_eq!(amount_available(&world, &fertile), 0.0);

        fertile.age = 5; // too young
        fertile.sugar = 100.0;
        assert_eq!(amount_available(&world, &fertile), 0.0);
    }

    #[test]
    fn test_origination_creates_symmetric_ledger() {
        let mut world = credit_world();
        let lender = place(&mut world, Position::new(3, 3), 100.0, 50.0, 30);
        let borrower = place(&mut world, Position::new(3, 4), 30.0, 50.0, 30);

        originate(&mut world, lender).unwrap();

        assert_eq!(world.metrics.loans_originated, 1);
        let l = world.registry.get(lender).unwrap();
        let b = world.registry.get(borrower).unwrap();
        assert_eq!(l.loans_given.len(), 1);
        assert_eq!(b.loans_owed.len(), 1);
        assert_eq!(l.loans_given[0], b.loans_owed[0]);
        // need was 20 (endowment 50 - wealth 30), lender had 50 spare
        assert_eq!(l.sugar, 80.0);
        assert_eq!(b.sugar, 50.0);
        let loan = world.loans.get(l.loans_given[0]).unwrap();
        assert_eq!(loan.principal, 20.0);
        assert_eq!(loan.due_tick, 5);
    }

    #[test]
    fn test_full_repayment_nets_interest() {
        let mut world = credit_world();
        let lender = place(&mut world, Position::new(3, 3), 100.0, 50.0, 30);
        let borrower = place(&mut world, Position::new(3, 4), 30.0, 50.0, 30);
        originate(&mut world, lender).unwrap();

        // give the borrower the means to pay and jump to the due tick
        world.registry.get_mut(borrower).unwrap().sugar = 100.0;
        world.tick = 5;
        repay_due_loans(&mut world, borrower).unwrap();

        assert_eq!(world.metrics.loans_repaid, 1);
        assert_eq!(world.loans.live_count(), 0);
        let l = world.registry.get(lender).unwrap();
        let b = world.registry.get(borrower).unwrap();
        assert!(l.loans_given.is_empty());
        assert!(b.loans_owed.is_empty());
        // principal 20 at 10%: lender 80 + 22, borrower 100 - 22
        assert!((l.sugar - 102.0).abs() < 1e-9);
        assert!((b.sugar - 78.0).abs() < 1e-9);
    }

    #[test]
    fn test_partial_repayment_rolls_over() {
        let mut world = credit_world();
        let lender = place(&mut world, Position::new(3, 3), 100.0, 50.0, 30);
        let borrower = place(&mut world, Position::new(3, 4), 30.0, 50.0, 30);
        originate(&mut world, lender).unwrap();
        // loan: principal 20, due 22 at tick 5

        world.registry.get_mut(borrower).unwrap().sugar = 10.0;
        world.tick = 5;
        repay_due_loans(&mut world, borrower).unwrap();

        // paid half of 10, remainder 17 rolled into a fresh loan
        let b = world.registry.get(borrower).unwrap();
        assert!((b.sugar - 5.0).abs() < 1e-9);
        assert_eq!(b.loans_owed.len(), 1);
        let rolled = world.loans.get(b.loans_owed[0]).unwrap();
        assert!((rolled.principal - 17.0).abs() < 1e-9);
        assert_eq!(rolled.due_tick, 10);
        let l = world.registry.get(lender).unwrap();
        assert_eq!(l.loans_given, b.loans_owed);
        assert!((l.sugar - 85.0).abs() < 1e-9);
    }

    #[test]
    fn test_borrower_death_forgives_debt() {
        let mut world = credit_world();
        let lender = place(&mut world, Position::new(3, 3), 100.0, 50.0, 30);
        let borrower = place(&mut world, Position::new(3, 4), 30.0, 50.0, 30);
        originate(&mut world, lender).unwrap();

        let dead = world.registry.remove(borrower).unwrap();
        settle_death(&mut world, &dead);

        assert_eq!(world.loans.live_count(), 0);
        assert!(world.registry.get(lender).unwrap().loans_given.is_empty());
        assert_eq!(world.metrics.loans_forgiven, 1);
    }

    #[test]
    fn test_lender_death_reassigns_to_children() {
        let mut world = credit_world();
        world.config.reproduction_enabled = true;
        let lender = place(&mut world, Position::new(3, 3), 100.0, 50.0, 30);
        let borrower = place(&mut world, Position::new(3, 4), 30.0, 50.0, 30);
        let child = place(&mut world, Position::new(6, 6), 20.0, 50.0, 5);
        world.registry.get_mut(lender).unwrap().children.push(child);
        originate(&mut world, lender).unwrap();
        let original = world.loans.get(world.registry.get(lender).unwrap().loans_given[0])
            .unwrap()
            .clone();

        let dead = world.registry.remove(lender).unwrap();
        settle_death(&mut world, &dead);

        let heir = world.registry.get(child).unwrap();
        assert_eq!(heir.loans_given.len(), 1);
        let reassigned = world.loans.get(heir.loans_given[0]).unwrap();
        assert_eq!(reassigned.borrower, borrower);
        assert_eq!(reassigned.principal, original.principal);
        assert_eq!(reassigned.due_tick, original.due_tick);
        let b = world.registry.get(borrower).unwrap();
        assert_eq!(b.loans_owed, heir.loans_given);
    }
}
