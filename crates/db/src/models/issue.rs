//! Issue rows.

use machwatch_core::error::CoreError;
use machwatch_core::issue::{Issue, IssueStatus, StatusId};
use machwatch_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `issues` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct IssueRow {
    pub id: DbId,
    pub machine_id: DbId,
    pub message: String,
    pub fault_probability: i32,
    pub temperature: f64,
    pub vibration: f64,
    pub sound: String,
    pub status_id: StatusId,
    pub fix_description: Option<String>,
    pub report_id: Option<DbId>,
    pub merged_report_ids: Vec<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl TryFrom<IssueRow> for Issue {
    type Error = CoreError;

    fn try_from(row: IssueRow) -> Result<Self, Self::Error> {
        Ok(Issue {
            id: row.id,
            machine_id: row.machine_id,
            message: row.message,
            fault_probability: row.fault_probability,
            temperature: row.temperature,
            vibration: row.vibration,
            sound: row.sound.parse()?,
            status: IssueStatus::from_id(row.status_id)?,
            fix_description: row.fix_description,
            report_id: row.report_id,
            merged_report_ids: row.merged_report_ids,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
