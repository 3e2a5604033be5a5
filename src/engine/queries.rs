use chrono::NaiveDate;

use crate::model::*;

use super::{Engine, EngineError};

impl Engine {
    /// Verify a username/password pair for the requested role. A username
    /// registered under the other role fails exactly like a wrong password,
    /// so the two cases are indistinguishable from outside.
    pub fn login(&self, username: &str, password: &str, role: Role) -> Result<Actor, EngineError> {
        let verified = self
            .accounts
            .get(username)
            .is_some_and(|account| account.role == role && account.credential.verify(password));
        if !verified {
            metrics::counter!(crate::observability::AUTH_FAILURES_TOTAL).increment(1);
            return Err(EngineError::InvalidCredentials);
        }
        Ok(Actor::new(role, username))
    }

    /// Everything bookable on `date`: caregivers with a surviving fact, in
    /// ascending order, plus the full dose snapshot.
    pub async fn search_schedule(&self, date: NaiveDate) -> ScheduleView {
        let state = self.state.read().await;
        ScheduleView {
            caregivers: state.availability.caregivers_for(date),
            vaccines: state.inventory.snapshot(),
        }
    }

    /// The actor's appointments, ascending by id. Patients see the caregiver
    /// column as counterparty, caregivers the patient column.
    pub async fn list_appointments(&self, actor: &Actor) -> Vec<AppointmentInfo> {
        let state = self.state.read().await;
        state
            .appointments
            .list_for(&actor.username, actor.role)
            .into_iter()
            .map(|a| AppointmentInfo {
                id: a.id,
                vaccine: a.vaccine.clone(),
                date: a.date,
                counterparty: match actor.role {
                    Role::Patient => a.caregiver.clone(),
                    Role::Caregiver => a.patient.clone(),
                },
            })
            .collect()
    }

    /// Live appointment count; startup uses it to seed the gauge.
    pub async fn appointment_count(&self) -> usize {
        self.state.read().await.appointments.len()
    }
}
