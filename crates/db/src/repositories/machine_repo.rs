//! Repository for the `machines` table.

use machwatch_core::machine::{MachineStatus, NewMachine};
use machwatch_core::types::DbId;
use sqlx::PgPool;

use crate::models::machine::MachineRow;

/// Column list for `machines` queries.
const COLUMNS: &str = "\
    id, name, min_temp, max_temp, min_vib, max_vib, interval_secs, \
    notes, image, status, created_at, updated_at";

/// Provides CRUD operations for machine profiles.
pub struct MachineRepo;

impl MachineRepo {
    /// Insert a machine. Callers validate with [`NewMachine::check`] first;
    /// the table constraints reject anything that slips through.
    pub async fn create(pool: &PgPool, input: &NewMachine) -> Result<MachineRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO machines \
                (name, min_temp, max_temp, min_vib, max_vib, interval_secs, notes, image) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, MachineRow>(&query)
            .bind(input.name.trim())
            .bind(input.min_temp)
            .bind(input.max_temp)
            .bind(input.min_vib)
            .bind(input.max_vib)
            .bind(input.interval_secs)
            .bind(&input.notes)
            .bind(&input.image)
            .fetch_one(pool)
            .await
    }

    pub async fn get_by_id(pool: &PgPool, id: DbId) -> Result<Option<MachineRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM machines WHERE id = $1");
        sqlx::query_as::<_, MachineRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list_all(pool: &PgPool) -> Result<Vec<MachineRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM machines ORDER BY id");
        sqlx::query_as::<_, MachineRow>(&query)
            .fetch_all(pool)
            .await
    }

    /// Set the coarse status. Returns `false` if no machine has this id.
    pub async fn update_status(
        pool: &PgPool,
        id: DbId,
        status: MachineStatus,
    ) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("UPDATE machines SET status = $2, updated_at = NOW() WHERE id = $1")
                .bind(id)
                .bind(status.as_str())
                .execute(pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete a machine. Its issues go with it (FK cascade).
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM machines WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
