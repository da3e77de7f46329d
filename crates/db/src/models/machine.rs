//! Machine rows.

use machwatch_core::error::CoreError;
use machwatch_core::machine::Machine;
use machwatch_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `machines` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct MachineRow {
    pub id: DbId,
    pub name: String,
    pub min_temp: f64,
    pub max_temp: f64,
    pub min_vib: f64,
    pub max_vib: f64,
    pub interval_secs: i32,
    pub notes: Option<String>,
    pub image: Option<String>,
    pub status: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl TryFrom<MachineRow> for Machine {
    type Error = CoreError;

    fn try_from(row: MachineRow) -> Result<Self, Self::Error> {
        Ok(Machine {
            id: row.id,
            name: row.name,
            min_temp: row.min_temp,
            max_temp: row.max_temp,
            min_vib: row.min_vib,
            max_vib: row.max_vib,
            interval_secs: row.interval_secs,
            notes: row.notes,
            image: row.image,
            status: row.status.parse()?,
        })
    }
}
