use std::collections::BTreeMap;

use crate::model::{Appointment, Event};

use super::appointments::AppointmentStore;
use super::availability::AvailabilitySet;
use super::inventory::InventoryLedger;

/// Everything a reservation touches, behind one lock. Holding the write
/// guard makes the multi-store read-check-write sequence a serializable
/// transaction; there is no other way to mutate any of the three stores.
#[derive(Debug, Default)]
pub struct ScheduleState {
    pub inventory: InventoryLedger,
    pub availability: AvailabilitySet,
    pub appointments: AppointmentStore,
}

impl ScheduleState {
    /// Apply one WAL event. This is the only mutation path: live commits
    /// call it after the event is durable, startup replay calls it for
    /// every logged event. Registration events are applied to the accounts
    /// map instead, not here.
    ///
    /// `AppointmentReserved` and `AppointmentCancelled` perform their whole
    /// transaction in one call, so the three stores cannot disagree no
    /// matter where a crash falls. Engine validation runs before the event
    /// is appended, which is why the asserts below cannot fire on a log
    /// this process wrote.
    pub fn apply_event(&mut self, event: &Event) {
        match event {
            Event::DosesAdded { vaccine, amount } => {
                self.inventory.ensure_exists(vaccine);
                let increased = self.inventory.increase(vaccine, *amount);
                debug_assert!(increased.is_ok(), "doses added to a missing vaccine");
            }
            Event::AvailabilityDeclared { caregiver, date } => {
                self.availability.declare(caregiver, *date);
            }
            Event::AppointmentReserved {
                id,
                patient,
                caregiver,
                vaccine,
                date,
            } => {
                let consumed = self.availability.consume(caregiver, *date);
                debug_assert!(consumed, "reserved slot missing from availability set");
                let decreased = self.inventory.decrease(vaccine, 1);
                debug_assert!(decreased.is_ok(), "reserved dose missing from inventory");
                let inserted = self.appointments.insert(Appointment {
                    id: *id,
                    patient: patient.clone(),
                    caregiver: caregiver.clone(),
                    vaccine: vaccine.clone(),
                    date: *date,
                });
                debug_assert!(inserted.is_ok(), "appointment id already stored");
            }
            Event::AppointmentCancelled { id } => {
                let removed = self.appointments.remove(*id);
                debug_assert!(removed.is_ok(), "cancelled appointment was not stored");
                if let Ok(appointment) = removed {
                    self.availability
                        .restore(&appointment.caregiver, appointment.date);
                    let restocked = self.inventory.increase(&appointment.vaccine, 1);
                    debug_assert!(restocked.is_ok(), "cancelled dose has no vaccine row");
                }
            }
            Event::SequenceSet { next_id } => {
                self.appointments.advance_sequence(*next_id);
            }
            Event::PatientRegistered { .. } | Event::CaregiverRegistered { .. } => {}
        }
    }

    /// A minimal event history that recreates this state when replayed
    /// through `apply_event`. Account events are prepended by the caller.
    ///
    /// Live appointments are re-emitted as `AppointmentReserved`, and
    /// applying one consumes an availability fact and a dose. So the
    /// snapshot declares a synthetic fact right before each appointment
    /// and inflates each dose count by the appointments that will
    /// re-consume it; replay then nets out to exactly this state. The
    /// final `SequenceSet` carries the id floor, which the surviving ids
    /// alone would understate once anything was cancelled.
    pub fn snapshot_events(&self) -> Vec<Event> {
        let mut events = Vec::new();

        let mut doses_consumed: BTreeMap<&str, u32> = BTreeMap::new();
        for appointment in self.appointments.iter() {
            *doses_consumed
                .entry(appointment.vaccine.as_str())
                .or_default() += 1;
        }
        for stock in self.inventory.snapshot() {
            let consumed = doses_consumed.get(stock.name.as_str()).copied().unwrap_or(0);
            // Amount 0 still recreates the row for a drained vaccine.
            events.push(Event::DosesAdded {
                vaccine: stock.name,
                amount: stock.doses + consumed,
            });
        }

        for (caregiver, date) in self.availability.iter_facts() {
            events.push(Event::AvailabilityDeclared {
                caregiver: caregiver.to_string(),
                date,
            });
        }

        for appointment in self.appointments.iter() {
            events.push(Event::AvailabilityDeclared {
                caregiver: appointment.caregiver.clone(),
                date: appointment.date,
            });
            events.push(Event::AppointmentReserved {
                id: appointment.id,
                patient: appointment.patient.clone(),
                caregiver: appointment.caregiver.clone(),
                vaccine: appointment.vaccine.clone(),
                date: appointment.date,
            });
        }

        events.push(Event::SequenceSet {
            next_id: self.appointments.next_id(),
        });
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{parse_date, Role};

    fn seeded_state() -> ScheduleState {
        let mut state = ScheduleState::default();
        let date = parse_date("2022-05-01").unwrap();
        state.apply_event(&Event::DosesAdded {
            vaccine: "Pfizer".into(),
            amount: 3,
        });
        state.apply_event(&Event::AvailabilityDeclared {
            caregiver: "bob".into(),
            date,
        });
        state
    }

    #[test]
    fn reserved_applies_whole_transaction() {
        let mut state = seeded_state();
        let date = parse_date("2022-05-01").unwrap();
        state.apply_event(&Event::AppointmentReserved {
            id: 0,
            patient: "alice".into(),
            caregiver: "bob".into(),
            vaccine: "Pfizer".into(),
            date,
        });

        assert!(!state.availability.contains("bob", date));
        assert_eq!(state.inventory.current_doses("Pfizer"), Some(2));
        assert_eq!(state.appointments.find(0, "alice").unwrap().caregiver, "bob");
        assert_eq!(state.appointments.next_id(), 1);
    }

    #[test]
    fn cancelled_reverses_reserved() {
        let mut state = seeded_state();
        let date = parse_date("2022-05-01").unwrap();
        state.apply_event(&Event::AppointmentReserved {
            id: 0,
            patient: "alice".into(),
            caregiver: "bob".into(),
            vaccine: "Pfizer".into(),
            date,
        });
        state.apply_event(&Event::AppointmentCancelled { id: 0 });

        assert!(state.availability.contains("bob", date));
        assert_eq!(state.inventory.current_doses("Pfizer"), Some(3));
        assert!(state.appointments.is_empty());
        assert_eq!(state.appointments.next_id(), 1); // floor survives
    }

    #[test]
    fn snapshot_roundtrip_recreates_state() {
        let mut state = seeded_state();
        let d1 = parse_date("2022-05-01").unwrap();
        let d2 = parse_date("2022-05-02").unwrap();
        state.apply_event(&Event::AvailabilityDeclared {
            caregiver: "amy".into(),
            date: d2,
        });
        state.apply_event(&Event::AppointmentReserved {
            id: 0,
            patient: "alice".into(),
            caregiver: "bob".into(),
            vaccine: "Pfizer".into(),
            date: d1,
        });
        // A second booking, cancelled again: only the sequence floor remains.
        state.apply_event(&Event::AvailabilityDeclared {
            caregiver: "bob".into(),
            date: d2,
        });
        state.apply_event(&Event::AppointmentReserved {
            id: 1,
            patient: "carol".into(),
            caregiver: "bob".into(),
            vaccine: "Pfizer".into(),
            date: d2,
        });
        state.apply_event(&Event::AppointmentCancelled { id: 1 });

        let mut rebuilt = ScheduleState::default();
        for event in state.snapshot_events() {
            rebuilt.apply_event(&event);
        }

        assert_eq!(
            rebuilt.inventory.snapshot(),
            state.inventory.snapshot()
        );
        let facts = |s: &ScheduleState| {
            let mut v: Vec<_> = s
                .availability
                .iter_facts()
                .map(|(cg, d)| (cg.to_string(), d))
                .collect();
            v.sort();
            v
        };
        assert_eq!(facts(&rebuilt), facts(&state));
        assert_eq!(
            rebuilt.appointments.list_for("alice", Role::Patient),
            state.appointments.list_for("alice", Role::Patient)
        );
        assert_eq!(rebuilt.appointments.len(), 1);
        assert_eq!(rebuilt.appointments.next_id(), 2); // not 1
    }

    #[test]
    fn snapshot_keeps_drained_vaccines() {
        let mut state = ScheduleState::default();
        state.apply_event(&Event::DosesAdded {
            vaccine: "Moderna".into(),
            amount: 1,
        });
        let date = parse_date("2022-05-01").unwrap();
        state.apply_event(&Event::AvailabilityDeclared {
            caregiver: "bob".into(),
            date,
        });
        state.apply_event(&Event::AppointmentReserved {
            id: 0,
            patient: "alice".into(),
            caregiver: "bob".into(),
            vaccine: "Moderna".into(),
            date,
        });
        state.apply_event(&Event::AppointmentCancelled { id: 0 });
        // Drain to zero without an appointment holding the dose.
        state
            .inventory
            .decrease("Moderna", 1)
            .unwrap();

        let mut rebuilt = ScheduleState::default();
        for event in state.snapshot_events() {
            rebuilt.apply_event(&event);
        }
        assert_eq!(rebuilt.inventory.current_doses("Moderna"), Some(0));
    }
}
