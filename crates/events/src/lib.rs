//! Herald server-side notification engine.
//!
//! - [`NotificationHub`]: in-process fan-out of stored notifications to
//!   push relays, backed by `tokio::sync::broadcast`.
//! - [`NotificationService`]: store-then-publish entry point for event
//!   producers.
//! - [`SummaryAggregator`]: builds at most one digest per user per window.
//! - [`DigestScheduler`]: runs the aggregator at each subscriber's
//!   configured time of day.

pub mod digest;
pub mod hub;
pub mod service;
pub mod store;
pub mod summary;

#[cfg(test)]
mod testing;

pub use digest::DigestScheduler;
pub use hub::NotificationHub;
pub use service::NotificationService;
pub use store::{PgSummaryStore, SummaryStore};
pub use summary::{NotEligibleReason, RunGuard, SummaryAggregator, SummaryError, SummaryOutcome};
