use chrono::NaiveDate;
use tokio::sync::oneshot;

use crate::auth::{check_password, Credential};
use crate::limits::*;
use crate::model::*;

use super::{Engine, EngineError, WalCommand};

impl Engine {
    pub async fn register_patient(&self, username: &str, password: &str) -> Result<(), EngineError> {
        self.register_account(Role::Patient, username, password).await
    }

    pub async fn register_caregiver(&self, username: &str, password: &str) -> Result<(), EngineError> {
        self.register_account(Role::Caregiver, username, password).await
    }

    /// One username keyspace for both roles: a name taken by a patient is
    /// taken for caregivers too. The registration mutex makes the
    /// check-then-insert safe against a concurrent registration of the
    /// same name.
    async fn register_account(
        &self,
        role: Role,
        username: &str,
        password: &str,
    ) -> Result<(), EngineError> {
        if username.is_empty() || username.len() > MAX_USERNAME_LEN {
            return Err(EngineError::LimitExceeded("username length"));
        }
        if password.len() > MAX_PASSWORD_LEN {
            return Err(EngineError::LimitExceeded("password length"));
        }
        check_password(password).map_err(EngineError::InvalidInput)?;

        let _register = self.register_lock.lock().await;
        if self.accounts.contains_key(username) {
            return Err(EngineError::UsernameTaken(username.to_string()));
        }
        if self.accounts.len() >= MAX_ACCOUNTS {
            return Err(EngineError::LimitExceeded("too many accounts"));
        }

        let credential = Credential::derive(password);
        let event = match role {
            Role::Patient => Event::PatientRegistered {
                username: username.to_string(),
                credential: credential.clone(),
            },
            Role::Caregiver => Event::CaregiverRegistered {
                username: username.to_string(),
                credential: credential.clone(),
            },
        };
        self.wal_append(&event).await?;
        self.accounts
            .insert(username.to_string(), Account { role, credential });
        Ok(())
    }

    /// Book the first available caregiver on `date` and one dose of
    /// `vaccine` for the acting patient. The write guard is held from the
    /// first read to the commit, so two reservations can never claim the
    /// same slot or jointly drain a dose count below zero.
    pub async fn reserve(
        &self,
        actor: &Actor,
        date: NaiveDate,
        vaccine: &str,
    ) -> Result<(AppointmentId, String), EngineError> {
        if actor.role != Role::Patient {
            return Err(EngineError::WrongRole(Role::Patient));
        }

        let mut state = self.state.write().await;
        // Start of availability = lexically first (deterministic tie-break).
        let caregiver = state
            .availability
            .caregivers_for(date)
            .into_iter()
            .next()
            .ok_or(EngineError::NoAvailableCaregiver)?;
        if state.inventory.current_doses(vaccine).unwrap_or(0) == 0 {
            return Err(EngineError::NoAvailableVaccine);
        }

        let id = state.appointments.next_id();
        let event = Event::AppointmentReserved {
            id,
            patient: actor.username.clone(),
            caregiver: caregiver.clone(),
            vaccine: vaccine.to_string(),
            date,
        };
        self.persist_and_apply(&mut state, &event).await?;
        metrics::gauge!(crate::observability::APPOINTMENTS_ACTIVE).increment(1.0);
        Ok((id, caregiver))
    }

    /// Cancel one of the acting patient's appointments. Removing the
    /// record, restoring the availability fact, and returning the dose all
    /// ride on a single event, so the reversal is atomic.
    pub async fn cancel(&self, actor: &Actor, id: AppointmentId) -> Result<(), EngineError> {
        if actor.role != Role::Patient {
            return Err(EngineError::WrongRole(Role::Patient));
        }

        let mut state = self.state.write().await;
        // Ownership check: someone else's id reads as missing.
        if state.appointments.find(id, &actor.username).is_none() {
            return Err(EngineError::AppointmentNotFound(id));
        }

        let event = Event::AppointmentCancelled { id };
        self.persist_and_apply(&mut state, &event).await?;
        metrics::gauge!(crate::observability::APPOINTMENTS_ACTIVE).decrement(1.0);
        Ok(())
    }

    /// Declare the acting caregiver available on `date`. Re-declaring an
    /// existing fact is a no-op without a WAL append. A date the caregiver
    /// is already booked on is also left alone: the pair stays out of the
    /// availability set until that appointment is cancelled.
    pub async fn upload_availability(
        &self,
        actor: &Actor,
        date: NaiveDate,
    ) -> Result<(), EngineError> {
        if actor.role != Role::Caregiver {
            return Err(EngineError::WrongRole(Role::Caregiver));
        }

        let mut state = self.state.write().await;
        if state.availability.contains(&actor.username, date) {
            return Ok(());
        }
        if state
            .appointments
            .list_for(&actor.username, Role::Caregiver)
            .iter()
            .any(|a| a.date == date)
        {
            return Ok(());
        }

        let event = Event::AvailabilityDeclared {
            caregiver: actor.username.clone(),
            date,
        };
        self.persist_and_apply(&mut state, &event).await
    }

    pub async fn add_doses(
        &self,
        actor: &Actor,
        vaccine: &str,
        amount: u32,
    ) -> Result<(), EngineError> {
        if actor.role != Role::Caregiver {
            return Err(EngineError::WrongRole(Role::Caregiver));
        }
        if amount == 0 {
            return Err(EngineError::InvalidInput("amount must be positive"));
        }
        if amount > MAX_DOSES_PER_ADD {
            return Err(EngineError::LimitExceeded("dose amount"));
        }
        if vaccine.is_empty() || vaccine.len() > MAX_VACCINE_NAME_LEN {
            return Err(EngineError::LimitExceeded("vaccine name length"));
        }

        let mut state = self.state.write().await;
        let current = state.inventory.current_doses(vaccine).unwrap_or(0);
        if current.checked_add(amount).is_none() {
            return Err(EngineError::LimitExceeded("dose count overflow"));
        }

        // One event covers both the lazy create and the increment.
        let event = Event::DosesAdded {
            vaccine: vaccine.to_string(),
            amount,
        };
        self.persist_and_apply(&mut state, &event).await
    }

    /// Compact the WAL by rewriting it with only the events needed to recreate
    /// the current state. Both the registration mutex and the schedule write
    /// lock stay held until the writer confirms the swap, so no commit can
    /// land in the old file after the snapshot was cut.
    pub async fn compact_wal(&self) -> Result<(), EngineError> {
        let _register = self.register_lock.lock().await;
        let state = self.state.write().await;

        let mut events = Vec::with_capacity(self.accounts.len() + 16);
        for entry in self.accounts.iter() {
            let username = entry.key().clone();
            let credential = entry.value().credential.clone();
            events.push(match entry.value().role {
                Role::Patient => Event::PatientRegistered { username, credential },
                Role::Caregiver => Event::CaregiverRegistered { username, credential },
            });
        }
        events.extend(state.snapshot_events());

        let (tx, rx) = oneshot::channel();
        self.wal_tx
            .send(WalCommand::Compact { events, response: tx })
            .await
            .map_err(|_| EngineError::StoreUnavailable("WAL writer shut down".into()))?;
        rx.await
            .map_err(|_| EngineError::StoreUnavailable("WAL writer dropped response".into()))?
            .map_err(|e| EngineError::StoreUnavailable(e.to_string()))?;
        metrics::counter!(crate::observability::WAL_COMPACTIONS_TOTAL).increment(1);
        Ok(())
    }

    pub async fn wal_appends_since_compact(&self) -> u64 {
        let (tx, rx) = oneshot::channel();
        if self
            .wal_tx
            .send(WalCommand::AppendsSinceCompact { response: tx })
            .await
            .is_err()
        {
            return 0;
        }
        rx.await.unwrap_or(0)
    }
}
