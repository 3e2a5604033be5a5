use crate::model::{AppointmentId, Role};

#[derive(Debug, PartialEq, Eq)]
pub enum EngineError {
    /// No session on the connection. Produced by the command layer; carried
    /// here so every failure a command can see has one type.
    NotAuthenticated,
    /// The operation requires the given role.
    WrongRole(Role),
    /// Malformed input; the str names the offending field.
    InvalidInput(&'static str),
    /// Unknown username, wrong password, or wrong role at login.
    InvalidCredentials,
    UsernameTaken(String),
    /// No appointment with this id owned by the calling patient.
    AppointmentNotFound(AppointmentId),
    VaccineNotFound(String),
    NoAvailableCaregiver,
    NoAvailableVaccine,
    /// Dose decrement would cross zero. Engine validation makes this
    /// unreachable in live commits; the ledger still enforces it.
    InsufficientStock(String),
    /// Id collision in the appointment store — a sequence bug, not a user error.
    DuplicateId(AppointmentId),
    LimitExceeded(&'static str),
    /// WAL append or swap failed; nothing was applied.
    StoreUnavailable(String),
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::NotAuthenticated => write!(f, "not authenticated"),
            EngineError::WrongRole(required) => write!(f, "requires {required} role"),
            EngineError::InvalidInput(what) => write!(f, "invalid input: {what}"),
            EngineError::InvalidCredentials => write!(f, "invalid credentials"),
            EngineError::UsernameTaken(u) => write!(f, "username taken: {u}"),
            EngineError::AppointmentNotFound(id) => write!(f, "no appointment: {id}"),
            EngineError::VaccineNotFound(name) => write!(f, "no vaccine: {name}"),
            EngineError::NoAvailableCaregiver => write!(f, "no available caregiver"),
            EngineError::NoAvailableVaccine => write!(f, "no available vaccine"),
            EngineError::InsufficientStock(name) => {
                write!(f, "insufficient stock of {name}")
            }
            EngineError::DuplicateId(id) => write!(f, "duplicate appointment id: {id}"),
            EngineError::LimitExceeded(msg) => write!(f, "limit exceeded: {msg}"),
            EngineError::StoreUnavailable(e) => write!(f, "store unavailable: {e}"),
        }
    }
}

impl std::error::Error for EngineError {}
