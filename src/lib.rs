//! Sugarscape - multi-agent economic simulation rule engine
//!
//! The engine evolves a population of agents over discrete ticks on a grid
//! carrying renewable sugar and optional pollution. Each tick runs movement
//! or combat, death and reproduction, culture, credit, and disease in a
//! fixed order. Every action-bearing rule consumes an abstract decision:
//! the built-in rules in rule-based mode, or a pluggable provider (e.g. an
//! LLM) in strict mode. Rendering, analytics, and config loading live
//! outside this crate; it exposes read-only agent/grid/metric views for
//! them.

pub mod core;
pub mod decision;
pub mod rules;
pub mod simulation;
pub mod world;

pub use crate::core::config::SimulationConfig;
pub use crate::core::error::{Result, SugarError};
pub use crate::simulation::run_tick;
pub use crate::world::World;
