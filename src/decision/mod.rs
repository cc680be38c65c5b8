//! Decision provider boundary
//!
//! The rule engine is decision-source-agnostic: rules consume validated
//! `Decision` records and never care how they were produced. This module
//! holds the record types, the serializable context snapshots, the provider
//! trait, and the HTTP/LLM implementation.

pub mod client;
pub mod context;
pub mod parser;
pub mod provider;
pub mod types;

pub use client::{LlmClient, LlmProvider};
pub use provider::DecisionProvider;
