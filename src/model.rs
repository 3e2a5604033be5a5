use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::auth::Credential;

/// Appointment ids — small integers from a persisted sequence, starting at 0.
pub type AppointmentId = u64;

/// The two kinds of registered user. Usernames are unique across both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    Patient,
    Caregiver,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Patient => write!(f, "patient"),
            Role::Caregiver => write!(f, "caregiver"),
        }
    }
}

/// The authenticated identity an operation runs on behalf of.
/// Built at login, owned by the connection that logged in — never global.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub role: Role,
    pub username: String,
}

impl Actor {
    pub fn new(role: Role, username: impl Into<String>) -> Self {
        Self {
            role,
            username: username.into(),
        }
    }
}

/// One registered user: role plus credential material.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub role: Role,
    pub credential: Credential,
}

/// A booked appointment: one patient, one caregiver, one dose, one day.
///
/// While this record exists, the `(caregiver, date)` pair is absent from
/// the availability set — booking consumed it, cancellation puts it back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: AppointmentId,
    pub patient: String,
    pub caregiver: String,
    pub vaccine: String,
    pub date: NaiveDate,
}

/// Strict `%Y-%m-%d` parse — the only accepted date syntax.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

/// The event types — flat, no nesting. This is the WAL record format.
///
/// `AppointmentReserved` and `AppointmentCancelled` each stand for a whole
/// transaction: applying one performs every coordinated store write of that
/// transaction, so durability and atomicity coincide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    PatientRegistered {
        username: String,
        credential: Credential,
    },
    CaregiverRegistered {
        username: String,
        credential: Credential,
    },
    DosesAdded {
        vaccine: String,
        amount: u32,
    },
    AvailabilityDeclared {
        caregiver: String,
        date: NaiveDate,
    },
    AppointmentReserved {
        id: AppointmentId,
        patient: String,
        caregiver: String,
        vaccine: String,
        date: NaiveDate,
    },
    AppointmentCancelled {
        id: AppointmentId,
    },
    /// Compaction marker: floor for the id sequence, so ids issued before
    /// the snapshot are never reissued even when the appointments that
    /// carried them were cancelled.
    SequenceSet {
        next_id: AppointmentId,
    },
}

// ── Query result types ───────────────────────────────────────────

/// One row of `show_appointments`. The counterparty is the caregiver when a
/// patient asks and the patient when a caregiver asks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppointmentInfo {
    pub id: AppointmentId,
    pub vaccine: String,
    pub date: NaiveDate,
    pub counterparty: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaccineStock {
    pub name: String,
    pub doses: u32,
}

/// Snapshot returned by `search_caregiver_schedule`: every caregiver still
/// available on the date (ascending) plus the full dose inventory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleView {
    pub caregivers: Vec<String>,
    pub vaccines: Vec<VaccineStock>,
}
