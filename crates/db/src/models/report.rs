//! Sensor report rows (append-only).

use machwatch_core::report::RawReport;
use machwatch_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `reports` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ReportRow {
    pub id: DbId,
    pub machine_id: DbId,
    pub temp: Option<f64>,
    pub vib: Option<f64>,
    pub sound: Option<String>,
    pub recorded_at: Timestamp,
    pub created_at: Timestamp,
}

impl From<ReportRow> for RawReport {
    fn from(row: ReportRow) -> Self {
        RawReport {
            id: row.id,
            machine_id: row.machine_id,
            temp: row.temp,
            vib: row.vib,
            sound: row.sound,
            recorded_at: row.recorded_at,
        }
    }
}

/// DTO for inserting a report.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateReport {
    pub machine_id: DbId,
    pub temp: Option<f64>,
    pub vib: Option<f64>,
    pub sound: Option<String>,
    pub recorded_at: Timestamp,
}
