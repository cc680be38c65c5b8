//! The per-tick rule set
//!
//! Each rule is a free function taking the world context and an agent id,
//! mirroring the tick order: combat-or-movement, death/reproduction,
//! culture, credit, then the model-wide disease passes.

pub mod combat;
pub mod credit;
pub mod culture;
pub mod death;
pub mod disease;
pub mod movement;
pub mod reproduction;
