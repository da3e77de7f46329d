//! [`PgStore`]: the Postgres implementation of the core store ports.

use async_trait::async_trait;
use machwatch_core::error::{CoreError, StoreError};
use machwatch_core::event_names::{ENTITY_ISSUE, ENTITY_MACHINE};
use machwatch_core::issue::{Issue, IssueDraft, IssuePatch};
use machwatch_core::machine::{Machine, MachineStatus, NewMachine};
use machwatch_core::report::RawReport;
use machwatch_core::store::{LogStore, MachineDirectory, ReportSource};
use machwatch_core::types::DbId;

use crate::repositories::{IssueRepo, MachineRepo, ReportRepo};
use crate::DbPool;

/// Wraps a pool and exposes the repositories through the store traits.
#[derive(Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

fn backend(e: sqlx::Error) -> StoreError {
    StoreError::Backend(e.to_string())
}

fn corrupt(e: CoreError) -> StoreError {
    StoreError::Backend(format!("corrupt row: {e}"))
}

#[async_trait]
impl LogStore for PgStore {
    async fn find_open_issue(&self, machine_id: DbId) -> Result<Option<Issue>, StoreError> {
        IssueRepo::find_open_for_machine(&self.pool, machine_id)
            .await
            .map_err(backend)?
            .map(Issue::try_from)
            .transpose()
            .map_err(corrupt)
    }

    async fn find_issue_by_report(&self, report_id: DbId) -> Result<Option<Issue>, StoreError> {
        IssueRepo::find_by_report(&self.pool, report_id)
            .await
            .map_err(backend)?
            .map(Issue::try_from)
            .transpose()
            .map_err(corrupt)
    }

    async fn create_issue(&self, draft: &IssueDraft) -> Result<DbId, StoreError> {
        let row = IssueRepo::create(&self.pool, draft).await.map_err(backend)?;
        tracing::debug!(issue_id = row.id, machine_id = row.machine_id, "Issue inserted");
        Ok(row.id)
    }

    async fn update_issue(&self, issue_id: DbId, patch: &IssuePatch) -> Result<(), StoreError> {
        match IssueRepo::update(&self.pool, issue_id, patch)
            .await
            .map_err(backend)?
        {
            Some(_) => Ok(()),
            None => Err(StoreError::NotFound {
                entity: ENTITY_ISSUE,
                id: issue_id,
            }),
        }
    }

    async fn get_issue(&self, issue_id: DbId) -> Result<Option<Issue>, StoreError> {
        IssueRepo::get_by_id(&self.pool, issue_id)
            .await
            .map_err(backend)?
            .map(Issue::try_from)
            .transpose()
            .map_err(corrupt)
    }

    async fn list_unresolved(&self, machine_id: DbId) -> Result<Vec<Issue>, StoreError> {
        IssueRepo::list_unresolved(&self.pool, machine_id)
            .await
            .map_err(backend)?
            .into_iter()
            .map(Issue::try_from)
            .collect::<Result<Vec<_>, _>>()
            .map_err(corrupt)
    }
}

#[async_trait]
impl MachineDirectory for PgStore {
    async fn get_machine(&self, machine_id: DbId) -> Result<Option<Machine>, StoreError> {
        MachineRepo::get_by_id(&self.pool, machine_id)
            .await
            .map_err(backend)?
            .map(Machine::try_from)
            .transpose()
            .map_err(corrupt)
    }

    async fn list_machines(&self) -> Result<Vec<Machine>, StoreError> {
        MachineRepo::list_all(&self.pool)
            .await
            .map_err(backend)?
            .into_iter()
            .map(Machine::try_from)
            .collect::<Result<Vec<_>, _>>()
            .map_err(corrupt)
    }

    async fn create_machine(&self, input: &NewMachine) -> Result<Machine, StoreError> {
        let row = MachineRepo::create(&self.pool, input)
            .await
            .map_err(backend)?;
        Machine::try_from(row).map_err(corrupt)
    }

    async fn delete_machine(&self, machine_id: DbId) -> Result<bool, StoreError> {
        MachineRepo::delete(&self.pool, machine_id)
            .await
            .map_err(backend)
    }

    async fn set_machine_status(
        &self,
        machine_id: DbId,
        status: MachineStatus,
    ) -> Result<(), StoreError> {
        let updated = MachineRepo::update_status(&self.pool, machine_id, status)
            .await
            .map_err(backend)?;
        if updated {
            Ok(())
        } else {
            Err(StoreError::NotFound {
                entity: ENTITY_MACHINE,
                id: machine_id,
            })
        }
    }
}

#[async_trait]
impl ReportSource for PgStore {
    async fn latest_report_id(&self) -> Result<Option<DbId>, StoreError> {
        ReportRepo::latest_id(&self.pool).await.map_err(backend)
    }

    async fn reports_after(&self, cursor: DbId, limit: i64) -> Result<Vec<RawReport>, StoreError> {
        let rows = ReportRepo::list_after(&self.pool, cursor, limit)
            .await
            .map_err(backend)?;
        Ok(rows.into_iter().map(RawReport::from).collect())
    }
}
