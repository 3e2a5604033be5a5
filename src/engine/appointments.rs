use std::collections::BTreeMap;

use crate::model::{Appointment, AppointmentId, Role};

use super::EngineError;

/// The authoritative set of booked appointments, plus the id sequence.
///
/// The sequence is store state: every insert advances it and removal never
/// lowers it, so ids strictly increase and are never reissued, even when
/// the highest appointment is cancelled. Replay rebuilds it from the ids
/// in the log.
#[derive(Debug, Default)]
pub struct AppointmentStore {
    by_id: BTreeMap<AppointmentId, Appointment>,
    next_id: AppointmentId,
}

impl AppointmentStore {
    /// The id the next reservation will receive: 0 for a store that has
    /// never booked, otherwise one past the highest id ever issued.
    /// Callers hold the schedule write lock, which serializes assignment.
    pub fn next_id(&self) -> AppointmentId {
        self.next_id
    }

    pub fn insert(&mut self, appointment: Appointment) -> Result<(), EngineError> {
        let id = appointment.id;
        if self.by_id.contains_key(&id) {
            return Err(EngineError::DuplicateId(id));
        }
        self.by_id.insert(id, appointment);
        self.next_id = self.next_id.max(id + 1);
        Ok(())
    }

    pub fn remove(&mut self, id: AppointmentId) -> Result<Appointment, EngineError> {
        self.by_id
            .remove(&id)
            .ok_or(EngineError::AppointmentNotFound(id))
    }

    /// Fetch by id only if it belongs to this patient. Ownership is the
    /// authorization check: someone else's id looks identical to a missing
    /// one, so nothing leaks about other patients' bookings.
    pub fn find(&self, id: AppointmentId, patient: &str) -> Option<&Appointment> {
        self.by_id.get(&id).filter(|a| a.patient == patient)
    }

    /// All appointments where this user sits in the column their role
    /// selects, ascending by id.
    pub fn list_for(&self, username: &str, role: Role) -> Vec<&Appointment> {
        self.by_id
            .values()
            .filter(|a| match role {
                Role::Patient => a.patient == username,
                Role::Caregiver => a.caregiver == username,
            })
            .collect()
    }

    /// Live appointments ascending by id, for compaction snapshots.
    pub fn iter(&self) -> impl Iterator<Item = &Appointment> {
        self.by_id.values()
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Raise the sequence floor without touching rows. Used when replaying
    /// a compaction marker; never lowers the sequence.
    pub fn advance_sequence(&mut self, next_id: AppointmentId) {
        self.next_id = self.next_id.max(next_id);
    }
}
