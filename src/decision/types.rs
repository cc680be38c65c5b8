//! Per-rule decision records
//!
//! Produced fresh each tick by a provider (or implicitly by the default
//! rules) and consumed exactly once; never persisted. The engine validates
//! every provider-produced decision before applying it.

use serde::{Deserialize, Serialize};

use crate::core::types::{AgentId, Position};

/// Movement rule decision
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovementDecision {
    /// False means stay put (still ages, metabolizes, harvests in place)
    #[serde(rename = "move")]
    pub move_to: bool,
    /// Required when `move` is true
    pub target: Option<Position>,
}

/// Combat rule decision
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombatDecision {
    pub attack: bool,
    /// Required when `attack` is true; must name a legal candidate
    pub target_id: Option<AgentId>,
}

/// Credit rule decision: ordered counterparties to lend to
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreditDecision {
    pub act: bool,
    #[serde(default)]
    pub counterparties: Vec<AgentId>,
}

/// Reproduction rule decision
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReproductionDecision {
    pub reproduce: bool,
    /// Bounded by the agent's max_matings for this tick
    #[serde(default)]
    pub partner_ids: Vec<AgentId>,
}

/// One culture transmission attempt
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CultureTarget {
    pub target_id: AgentId,
    pub bit_index: usize,
}

/// Culture rule decision
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CultureDecision {
    pub spread: bool,
    #[serde(default)]
    pub targets: Vec<CultureTarget>,
}
