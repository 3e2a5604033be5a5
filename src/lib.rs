//! vaxd — a vaccination appointment reservation service.
//!
//! State lives in memory and is made durable by an append-only event WAL;
//! a line-oriented TCP protocol exposes the operator vocabulary
//! (`create_patient`, `reserve`, `upload_availability`, ...).

pub mod auth;
pub mod command;
pub mod compactor;
pub mod engine;
pub mod limits;
pub mod model;
pub mod observability;
pub mod wal;
pub mod wire;
