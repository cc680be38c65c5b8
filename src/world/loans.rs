//! Loan arena
//!
//! Loans live in one world-owned arena keyed by integer id; agents hold id
//! lists for the two sides of the ledger. A live loan id appears in exactly
//! one lender's `loans_given` and its borrower's `loans_owed`, so the two
//! sides can never drift apart.

use serde::{Deserialize, Serialize};

use crate::core::types::{AgentId, Tick};

/// Arena id of a loan record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LoanId(pub u64);

/// One outstanding loan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Loan {
    pub id: LoanId,
    pub lender: AgentId,
    pub borrower: AgentId,
    pub principal: f64,
    pub due_tick: Tick,
    pub rate: f64,
}

impl Loan {
    /// Amount owed at the due tick: principal plus one interest application
    pub fn amount_due(&self) -> f64 {
        self.principal * (1.0 + self.rate)
    }
}

/// World-owned arena of loan records
#[derive(Debug, Clone, Default)]
pub struct LoanArena {
    slots: Vec<Option<Loan>>,
}

impl LoanArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new loan and return its id
    pub fn insert(
        &mut self,
        lender: AgentId,
        borrower: AgentId,
        principal: f64,
        due_tick: Tick,
        rate: f64,
    ) -> LoanId {
        let id = LoanId(self.slots.len() as u64);
        self.slots.push(Some(Loan {
            id,
            lender,
            borrower,
            principal,
            due_tick,
            rate,
        }));
        id
    }

    pub fn get(&self, id: LoanId) -> Option<&Loan> {
        self.slots.get(id.0 as usize).and_then(|s| s.as_ref())
    }

    /// Retire a settled or forgiven loan, returning the record
    pub fn remove(&mut self, id: LoanId) -> Option<Loan> {
        self.slots.get_mut(id.0 as usize).and_then(|s| s.take())
    }

    /// Count of live loans
    pub fn live_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn iter_live(&self) -> impl Iterator<Item = &Loan> {
        self.slots.iter().filter_map(|s| s.as_ref())
    }
}
