//! Agent state
//!
//! The core record consumed by every rule, plus the optional personality
//! extension that only decision contexts read. Rule invariants never branch
//! on the extension.

use serde::{Deserialize, Serialize};

use crate::core::bitset::BitVec;
use crate::core::config::SimulationConfig;
use crate::core::types::{AgentId, Position, Sex};
use crate::world::loans::LoanId;

/// Tribe classification derived from the culture tag's majority bit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tribe {
    /// More zero bits than one bits
    Blue,
    /// More one bits than zero bits
    Red,
}

/// Big-Five personality extension, consulted only by the decision provider
///
/// Values in [0, 1]. The rule engine carries it opaquely; no invariant or
/// default rule reads it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PersonalityTraits {
    pub openness: f32,
    pub conscientiousness: f32,
    pub extraversion: f32,
    pub agreeableness: f32,
    pub neuroticism: f32,
}

/// One Sugarscape agent
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Agent {
    /// Registry-owned unique id, immutable after spawn
    pub id: AgentId,
    /// Current cell; at most one agent per cell
    pub position: Position,
    /// Perception/action radius in cells, positive
    pub vision: u32,
    /// Sugar burned per tick, positive
    pub metabolism: u32,
    /// Current wealth; transiently negative until the death check runs
    pub sugar: f64,
    pub age: u32,
    pub max_age: u32,
    pub sex: Sex,
    /// Culture tag; one fixed odd length across the whole population
    pub culture: BitVec,
    /// Immune system bit-vector
    pub immunity: BitVec,
    /// Diseases currently carried, each strictly shorter than immunity
    pub diseases: Vec<BitVec>,
    /// Arena ids of loans where this agent is the lender
    pub loans_given: Vec<LoanId>,
    /// Arena ids of loans where this agent is the borrower
    pub loans_owed: Vec<LoanId>,
    /// Ids of children fathered/mothered, living or dead
    pub children: Vec<AgentId>,
    /// Endowment at creation; fertility and credit formulas key off this
    pub initial_sugar: f64,
    /// Set when combat consumed this tick's action; reset at tick start
    #[serde(skip)]
    pub acted: bool,
    /// Optional trait extension for personality-augmented runs
    pub personality: Option<PersonalityTraits>,
}

impl Agent {
    /// Tribe from the majority bit of the culture tag
    pub fn tribe(&self) -> Tribe {
        if self.culture.majority_one() {
            Tribe::Red
        } else {
            Tribe::Blue
        }
    }

    /// Age falls inside the sex-specific fertile window
    pub fn fertile_by_age(&self, config: &SimulationConfig) -> bool {
        let (start, end) = config.fertility_window(self.sex);
        self.age >= start && self.age <= end
    }

    /// Age is past the fertile window entirely
    pub fn past_fertility(&self, config: &SimulationConfig) -> bool {
        let (_, end) = config.fertility_window(self.sex);
        self.age > end
    }

    /// Fertile: right age and wealth at least the initial endowment
    pub fn fertile(&self, config: &SimulationConfig) -> bool {
        self.fertile_by_age(config) && self.sugar >= self.initial_sugar
    }
}
