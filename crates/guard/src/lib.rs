//! The machine guard: watches the report stream, opens and merges issues,
//! and keeps machine statuses current.
//!
//! - [`feed::ReportFeed`] polls for new reports.
//! - [`ingest::Ingestor`] evaluates them one at a time.
//! - [`workflow::IssueService`] moves issues through repair.
//! - [`registry::MachineRegistry`] adds and removes machines.
//! - [`status_sync::StatusSync`] recomputes machine status on every change.

pub mod cache;
pub mod config;
pub mod error;
pub mod feed;
pub mod ingest;
pub mod registry;
pub mod status_sync;
pub mod workflow;

pub use config::GuardConfig;
pub use error::GuardError;
