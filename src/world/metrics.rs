//! Cumulative run counters exposed read-only to external consumers

use serde::Serialize;

/// Why an agent died
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DeathCause {
    Starvation,
    OldAge,
    Combat,
}

/// Aggregate statistics, updated by the rules as events happen
#[derive(Debug, Clone, Default, Serialize)]
pub struct Metrics {
    pub births: u64,
    pub deaths_starvation: u64,
    pub deaths_old_age: u64,
    pub deaths_combat: u64,
    /// Summed ages at death, per cause, for mean-lifespan reporting
    pub lifespan_starvation: u64,
    pub lifespan_old_age: u64,
    pub lifespan_combat: u64,
    pub combat_kills: u64,
    /// Number of child bequests paid out
    pub total_inheritances: u64,
    /// Total sugar bequeathed to children
    pub inherited_sugar: f64,
    pub loans_originated: u64,
    pub loans_repaid: u64,
    pub loans_forgiven: u64,
}

impl Metrics {
    pub fn record_death(&mut self, cause: DeathCause, age: u32) {
        let age = u64::from(age);
        match cause {
            DeathCause::Starvation => {
                self.deaths_starvation += 1;
                self.lifespan_starvation += age;
            }
            DeathCause::OldAge => {
                self.deaths_old_age += 1;
                self.lifespan_old_age += age;
            }
            DeathCause::Combat => {
                self.deaths_combat += 1;
                self.lifespan_combat += age;
            }
        }
    }

    pub fn total_deaths(&self) -> u64 {
        self.deaths_starvation + self.deaths_old_age + self.deaths_combat
    }
}
