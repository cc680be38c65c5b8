//! Agent registry
//!
//! Owns id allocation, the id -> agent map, and cell occupancy. The
//! unique-per-cell invariant is maintained here: every position change goes
//! through `move_agent`, and insertion rejects occupied cells.

use ahash::AHashMap;

use crate::core::error::{Result, SugarError};
use crate::core::types::{AgentId, Position};
use crate::world::agent::Agent;

#[derive(Debug, Clone, Default)]
pub struct Registry {
    agents: AHashMap<AgentId, Agent>,
    occupancy: AHashMap<Position, AgentId>,
    next_id: u64,
    /// Culture tag length fixed by the first insertion
    culture_length: Option<usize>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the next agent id
    pub fn allocate_id(&mut self) -> AgentId {
        let id = AgentId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Insert a fully built agent
    ///
    /// Rejects occupied cells and culture tags whose length differs from the
    /// population's fixed length (a fatal invariant violation).
    pub fn insert(&mut self, agent: Agent) -> Result<()> {
        let expected = *self.culture_length.get_or_insert(agent.culture.len());
        if agent.culture.len() != expected {
            return Err(SugarError::CultureLengthMismatch {
                expected,
                found: agent.culture.len(),
            });
        }
        if self.occupancy.contains_key(&agent.position) {
            return Err(SugarError::InvalidConfig(format!(
                "cell {:?} already occupied",
                agent.position
            )));
        }
        self.occupancy.insert(agent.position, agent.id);
        self.agents.insert(agent.id, agent);
        Ok(())
    }

    /// Remove an agent, releasing its cell
    pub fn remove(&mut self, id: AgentId) -> Option<Agent> {
        let agent = self.agents.remove(&id)?;
        self.occupancy.remove(&agent.position);
        Some(agent)
    }

    pub fn contains(&self, id: AgentId) -> bool {
        self.agents.contains_key(&id)
    }

    pub fn get(&self, id: AgentId) -> Option<&Agent> {
        self.agents.get(&id)
    }

    pub fn get_mut(&mut self, id: AgentId) -> Option<&mut Agent> {
        self.agents.get_mut(&id)
    }

    /// Agent occupying `pos`, if any
    pub fn occupant(&self, pos: Position) -> Option<AgentId> {
        self.occupancy.get(&pos).copied()
    }

    pub fn is_empty_cell(&self, pos: Position) -> bool {
        !self.occupancy.contains_key(&pos)
    }

    /// Move an agent to a new cell, keeping occupancy consistent
    ///
    /// The destination must be empty (or the agent's own cell).
    pub fn move_agent(&mut self, id: AgentId, to: Position) -> Result<()> {
        if let Some(occupant) = self.occupant(to) {
            if occupant != id {
                return Err(SugarError::InvalidConfig(format!(
                    "cell {to:?} already occupied by {occupant:?}"
                )));
            }
            return Ok(());
        }
        let agent = self.agents.get_mut(&id).ok_or(SugarError::AgentNotFound(id))?;
        self.occupancy.remove(&agent.position);
        agent.position = to;
        self.occupancy.insert(to, id);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// Snapshot of all live ids (stable for iteration while mutating agents)
    pub fn ids(&self) -> Vec<AgentId> {
        self.agents.keys().copied().collect()
    }

    /// Read-only iteration for external consumers
    pub fn iter(&self) -> impl Iterator<Item = &Agent> {
        self.agents.values()
    }
}
