//! Herald domain core.
//!
//! Pure types and rules shared by the server-side engine (`herald-db`,
//! `herald-events`, `herald-api`) and the client-side delivery controller
//! (`herald-client`). This crate has zero internal deps and performs no I/O.

pub mod checkpoint;
pub mod error;
pub mod job_fair;
pub mod notification;
pub mod preferences;
pub mod roles;
pub mod summary;
pub mod types;
