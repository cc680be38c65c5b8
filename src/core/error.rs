//! Error taxonomy for the rule engine
//!
//! Three families: configuration/invariant errors (fatal at construction),
//! decision provider errors (propagated in strict mode, never swallowed),
//! and passthroughs for IO/serialization at the provider boundary.
//! Runtime edge cases (no legal target, underflow) are rule no-ops, not errors.

use thiserror::Error;

use crate::core::types::AgentId;

/// Classification of a decision provider failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecisionFailure {
    /// Transport or API-level failure (HTTP status, empty completion)
    Api,
    /// Response could not be parsed into the rule's decision schema
    Schema,
    /// Well-formed decision that is logically inconsistent or illegal
    Validation,
}

#[derive(Error, Debug)]
pub enum SugarError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Culture tag length mismatch: expected {expected}, found {found}")]
    CultureLengthMismatch { expected: usize, found: usize },

    #[error("Agent not found: {0:?}")]
    AgentNotFound(AgentId),

    #[error("{kind:?} decision error in rule '{rule}' for agent {agent}, field '{field}': {message}")]
    Decision {
        rule: &'static str,
        agent: u64,
        field: &'static str,
        kind: DecisionFailure,
        message: String,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),
}

impl SugarError {
    /// Strict-mode decision error carrying rule name, agent id, and offending field
    pub fn decision(
        rule: &'static str,
        agent: AgentId,
        field: &'static str,
        kind: DecisionFailure,
        message: impl Into<String>,
    ) -> Self {
        Self::Decision {
            rule,
            agent: agent.0,
            field,
            kind,
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SugarError>;
