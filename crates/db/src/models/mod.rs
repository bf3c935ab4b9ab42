//! Row models and DTOs, one module per table family.

pub mod chat;
pub mod community;
pub mod job_fair;
pub mod notification;
pub mod user;
