//! The decision provider seam
//!
//! One method per action-bearing rule. The engine never branches on what
//! sits behind the trait, only on whether a provider is installed (strict
//! mode) or not (rule-based mode, provider never called). Provider failures
//! propagate as classified `SugarError::Decision` values; the engine must
//! not substitute defaults for them.

use crate::core::error::Result;
use crate::decision::context::{
    CombatContext, CreditContext, CultureContext, MovementContext, ReproductionContext,
};
use crate::decision::types::{
    CombatDecision, CreditDecision, CultureDecision, MovementDecision, ReproductionDecision,
};

/// Source of per-rule decisions
pub trait DecisionProvider {
    fn movement_decision(&self, ctx: &MovementContext) -> Result<MovementDecision>;
    fn combat_decision(&self, ctx: &CombatContext) -> Result<CombatDecision>;
    fn credit_decision(&self, ctx: &CreditContext) -> Result<CreditDecision>;
    fn reproduction_decision(&self, ctx: &ReproductionContext) -> Result<ReproductionDecision>;
    fn culture_decision(&self, ctx: &CultureContext) -> Result<CultureDecision>;
}
