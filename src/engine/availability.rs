use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;

/// Which caregivers have declared themselves free on which day. A
/// `(caregiver, date)` pair is simply present or absent: booking consumes
/// it, cancellation restores it, and at most one row per pair can exist.
#[derive(Debug, Default)]
pub struct AvailabilitySet {
    by_date: BTreeMap<NaiveDate, BTreeSet<String>>,
}

impl AvailabilitySet {
    /// Insert the fact. Idempotent — a repeated declare changes nothing.
    /// Returns whether the fact was newly inserted.
    pub fn declare(&mut self, caregiver: &str, date: NaiveDate) -> bool {
        self.by_date
            .entry(date)
            .or_default()
            .insert(caregiver.to_string())
    }

    /// Check presence and remove in one step; returns whether the fact was
    /// there. Of two callers racing for the same pair exactly one sees
    /// `true` — and under the schedule write lock the race cannot happen
    /// at all.
    pub fn consume(&mut self, caregiver: &str, date: NaiveDate) -> bool {
        match self.by_date.get_mut(&date) {
            Some(set) => {
                let removed = set.remove(caregiver);
                if set.is_empty() {
                    self.by_date.remove(&date);
                }
                removed
            }
            None => false,
        }
    }

    /// Re-insert a consumed fact after cancellation. Idempotent.
    pub fn restore(&mut self, caregiver: &str, date: NaiveDate) {
        self.by_date
            .entry(date)
            .or_default()
            .insert(caregiver.to_string());
    }

    /// All caregivers with a surviving fact for the date, ascending
    /// lexical order.
    pub fn caregivers_for(&self, date: NaiveDate) -> Vec<String> {
        self.by_date
            .get(&date)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn contains(&self, caregiver: &str, date: NaiveDate) -> bool {
        self.by_date.get(&date).is_some_and(|s| s.contains(caregiver))
    }

    /// Every surviving fact, for compaction snapshots.
    pub fn iter_facts(&self) -> impl Iterator<Item = (&str, NaiveDate)> + '_ {
        self.by_date
            .iter()
            .flat_map(|(date, set)| set.iter().map(move |cg| (cg.as_str(), *date)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::parse_date;

    fn d(s: &str) -> NaiveDate {
        parse_date(s).unwrap()
    }

    #[test]
    fn declare_is_idempotent() {
        let mut set = AvailabilitySet::default();
        assert!(set.declare("bob", d("2022-05-01")));
        assert!(!set.declare("bob", d("2022-05-01")));
        assert_eq!(set.caregivers_for(d("2022-05-01")), vec!["bob"]);
    }

    #[test]
    fn consume_is_exactly_once() {
        let mut set = AvailabilitySet::default();
        set.declare("bob", d("2022-05-01"));
        assert!(set.consume("bob", d("2022-05-01")));
        assert!(!set.consume("bob", d("2022-05-01")));
        assert!(!set.contains("bob", d("2022-05-01")));
    }

    #[test]
    fn consume_absent_pair() {
        let mut set = AvailabilitySet::default();
        assert!(!set.consume("bob", d("2022-05-01")));
        set.declare("bob", d("2022-05-01"));
        assert!(!set.consume("bob", d("2022-05-02"))); // wrong date
        assert!(!set.consume("amy", d("2022-05-01"))); // wrong caregiver
    }

    #[test]
    fn restore_after_consume() {
        let mut set = AvailabilitySet::default();
        set.declare("bob", d("2022-05-01"));
        assert!(set.consume("bob", d("2022-05-01")));
        set.restore("bob", d("2022-05-01"));
        assert!(set.contains("bob", d("2022-05-01")));
        assert!(set.consume("bob", d("2022-05-01"))); // consumable again
    }

    #[test]
    fn restore_is_idempotent() {
        let mut set = AvailabilitySet::default();
        set.restore("bob", d("2022-05-01"));
        set.restore("bob", d("2022-05-01"));
        assert_eq!(set.caregivers_for(d("2022-05-01")), vec!["bob"]);
    }

    #[test]
    fn caregivers_sorted_ascending() {
        let mut set = AvailabilitySet::default();
        for cg in ["zoe", "amy", "bob"] {
            set.declare(cg, d("2022-05-01"));
        }
        assert_eq!(set.caregivers_for(d("2022-05-01")), vec!["amy", "bob", "zoe"]);
    }

    #[test]
    fn dates_are_independent() {
        let mut set = AvailabilitySet::default();
        set.declare("bob", d("2022-05-01"));
        set.declare("bob", d("2022-05-02"));
        assert!(set.consume("bob", d("2022-05-01")));
        assert!(set.contains("bob", d("2022-05-02")));
        assert!(set.caregivers_for(d("2022-05-01")).is_empty());
    }

    #[test]
    fn iter_facts_covers_everything() {
        let mut set = AvailabilitySet::default();
        set.declare("bob", d("2022-05-01"));
        set.declare("amy", d("2022-05-01"));
        set.declare("bob", d("2022-05-02"));
        let mut facts: Vec<_> = set
            .iter_facts()
            .map(|(cg, date)| (cg.to_string(), date))
            .collect();
        facts.sort();
        assert_eq!(
            facts,
            vec![
                ("amy".to_string(), d("2022-05-01")),
                ("bob".to_string(), d("2022-05-01")),
                ("bob".to_string(), d("2022-05-02")),
            ]
        );
    }
}
