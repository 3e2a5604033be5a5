use std::collections::BTreeMap;

use crate::model::VaccineStock;

use super::EngineError;

/// Per-vaccine dose counts. A count never goes below zero: `decrease`
/// checks and subtracts in one step, under the schedule write lock.
#[derive(Debug, Default)]
pub struct InventoryLedger {
    doses: BTreeMap<String, u32>,
}

impl InventoryLedger {
    /// Create the vaccine with zero doses if this name is new.
    /// Returns whether a row was created. Idempotent.
    pub fn ensure_exists(&mut self, name: &str) -> bool {
        if self.doses.contains_key(name) {
            return false;
        }
        self.doses.insert(name.to_string(), 0);
        true
    }

    /// Add doses to an existing vaccine. Overflow is checked by the engine
    /// before the event is durable, so saturation here is a formality.
    pub fn increase(&mut self, name: &str, amount: u32) -> Result<(), EngineError> {
        match self.doses.get_mut(name) {
            Some(d) => {
                *d = d.saturating_add(amount);
                Ok(())
            }
            None => Err(EngineError::VaccineNotFound(name.to_string())),
        }
    }

    /// Check-and-subtract in one step, so two decrements can never jointly
    /// take a count below zero.
    pub fn decrease(&mut self, name: &str, amount: u32) -> Result<(), EngineError> {
        let Some(d) = self.doses.get_mut(name) else {
            return Err(EngineError::VaccineNotFound(name.to_string()));
        };
        if *d < amount {
            return Err(EngineError::InsufficientStock(name.to_string()));
        }
        *d -= amount;
        Ok(())
    }

    pub fn current_doses(&self, name: &str) -> Option<u32> {
        self.doses.get(name).copied()
    }

    /// Full inventory, ascending by vaccine name.
    pub fn snapshot(&self) -> Vec<VaccineStock> {
        self.doses
            .iter()
            .map(|(name, &doses)| VaccineStock {
                name: name.clone(),
                doses,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ensure_exists_is_idempotent() {
        let mut ledger = InventoryLedger::default();
        assert!(ledger.ensure_exists("Pfizer"));
        ledger.increase("Pfizer", 4).unwrap();
        assert!(!ledger.ensure_exists("Pfizer"));
        assert_eq!(ledger.current_doses("Pfizer"), Some(4)); // not reset
    }

    #[test]
    fn increase_unknown_vaccine() {
        let mut ledger = InventoryLedger::default();
        assert_eq!(
            ledger.increase("Moderna", 5),
            Err(EngineError::VaccineNotFound("Moderna".into()))
        );
    }

    #[test]
    fn increase_accumulates() {
        let mut ledger = InventoryLedger::default();
        ledger.ensure_exists("Pfizer");
        ledger.increase("Pfizer", 2).unwrap();
        ledger.increase("Pfizer", 3).unwrap();
        assert_eq!(ledger.current_doses("Pfizer"), Some(5));
    }

    #[test]
    fn decrease_never_crosses_zero() {
        let mut ledger = InventoryLedger::default();
        ledger.ensure_exists("Pfizer");
        ledger.increase("Pfizer", 1).unwrap();
        ledger.decrease("Pfizer", 1).unwrap();
        assert_eq!(ledger.current_doses("Pfizer"), Some(0));
        assert_eq!(
            ledger.decrease("Pfizer", 1),
            Err(EngineError::InsufficientStock("Pfizer".into()))
        );
        assert_eq!(ledger.current_doses("Pfizer"), Some(0));
    }

    #[test]
    fn decrease_more_than_stock() {
        let mut ledger = InventoryLedger::default();
        ledger.ensure_exists("Pfizer");
        ledger.increase("Pfizer", 1).unwrap();
        assert_eq!(
            ledger.decrease("Pfizer", 2),
            Err(EngineError::InsufficientStock("Pfizer".into()))
        );
        assert_eq!(ledger.current_doses("Pfizer"), Some(1)); // untouched
    }

    #[test]
    fn decrease_unknown_vaccine() {
        let mut ledger = InventoryLedger::default();
        assert_eq!(
            ledger.decrease("Novavax", 1),
            Err(EngineError::VaccineNotFound("Novavax".into()))
        );
    }

    #[test]
    fn snapshot_sorted_by_name() {
        let mut ledger = InventoryLedger::default();
        for name in ["Moderna", "Pfizer", "AstraZeneca"] {
            ledger.ensure_exists(name);
        }
        ledger.increase("Pfizer", 7).unwrap();
        let names: Vec<_> = ledger.snapshot().iter().map(|v| v.name.clone()).collect();
        assert_eq!(names, vec!["AstraZeneca", "Moderna", "Pfizer"]);
    }
}
