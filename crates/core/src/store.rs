//! Ports to the external document store.
//!
//! The fault logic never talks to a database directly. The ingestion loop
//! and the issue workflow depend on these traits; `machwatch-db` provides the
//! Postgres implementation and tests plug in an in-memory one.

use async_trait::async_trait;

use crate::error::StoreError;
use crate::issue::{Issue, IssueDraft, IssuePatch};
use crate::machine::{Machine, MachineStatus, NewMachine};
use crate::report::RawReport;
use crate::types::DbId;

/// Read/write access to issues ("logs").
#[async_trait]
pub trait LogStore: Send + Sync {
    /// The machine's issue in status `Open`, if any.
    ///
    /// At most one is expected. If several exist, the adapter returns the
    /// first in its natural order (oldest first).
    async fn find_open_issue(&self, machine_id: DbId) -> Result<Option<Issue>, StoreError>;

    /// An issue opened by, or merged from, `report_id`.
    async fn find_issue_by_report(&self, report_id: DbId) -> Result<Option<Issue>, StoreError>;

    /// Insert a new issue and return its id.
    async fn create_issue(&self, draft: &IssueDraft) -> Result<DbId, StoreError>;

    /// Apply a partial update. Fails with [`StoreError::NotFound`] if the
    /// issue no longer exists.
    async fn update_issue(&self, issue_id: DbId, patch: &IssuePatch) -> Result<(), StoreError>;

    async fn get_issue(&self, issue_id: DbId) -> Result<Option<Issue>, StoreError>;

    /// All open and in-progress issues for a machine.
    async fn list_unresolved(&self, machine_id: DbId) -> Result<Vec<Issue>, StoreError>;
}

/// Lookup of machine profiles.
#[async_trait]
pub trait MachineDirectory: Send + Sync {
    async fn get_machine(&self, machine_id: DbId) -> Result<Option<Machine>, StoreError>;

    async fn list_machines(&self) -> Result<Vec<Machine>, StoreError>;

    /// Insert an already validated machine profile.
    async fn create_machine(&self, input: &NewMachine) -> Result<Machine, StoreError>;

    /// Delete a machine and, with it, its issues. Returns `false` if no
    /// machine has this id.
    async fn delete_machine(&self, machine_id: DbId) -> Result<bool, StoreError>;

    /// Persist the coarse traffic-light status shown in machine lists.
    async fn set_machine_status(
        &self,
        machine_id: DbId,
        status: MachineStatus,
    ) -> Result<(), StoreError>;
}

/// Append-only stream of sensor reports, consumed by polling.
#[async_trait]
pub trait ReportSource: Send + Sync {
    /// Id of the newest report, or `None` when the stream is empty.
    async fn latest_report_id(&self) -> Result<Option<DbId>, StoreError>;

    /// Up to `limit` reports with id greater than `cursor`, oldest first.
    async fn reports_after(&self, cursor: DbId, limit: i64) -> Result<Vec<RawReport>, StoreError>;
}
