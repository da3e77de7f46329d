//! Repository for the append-only `reports` table.

use machwatch_core::types::DbId;
use sqlx::PgPool;

use crate::models::report::{CreateReport, ReportRow};

/// Column list for `reports` queries.
const COLUMNS: &str = "id, machine_id, temp, vib, sound, recorded_at, created_at";

/// Provides insert and cursor-based read operations for reports.
pub struct ReportRepo;

impl ReportRepo {
    pub async fn insert(pool: &PgPool, input: &CreateReport) -> Result<ReportRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO reports (machine_id, temp, vib, sound, recorded_at) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ReportRow>(&query)
            .bind(input.machine_id)
            .bind(input.temp)
            .bind(input.vib)
            .bind(&input.sound)
            .bind(input.recorded_at)
            .fetch_one(pool)
            .await
    }

    /// Id of the newest report, if any.
    pub async fn latest_id(pool: &PgPool) -> Result<Option<DbId>, sqlx::Error> {
        sqlx::query_scalar::<_, Option<DbId>>("SELECT MAX(id) FROM reports")
            .fetch_one(pool)
            .await
    }

    /// Reports with `id > cursor`, oldest first.
    pub async fn list_after(
        pool: &PgPool,
        cursor: DbId,
        limit: i64,
    ) -> Result<Vec<ReportRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM reports WHERE id > $1 ORDER BY id ASC LIMIT $2"
        );
        sqlx::query_as::<_, ReportRow>(&query)
            .bind(cursor)
            .bind(limit)
            .fetch_all(pool)
            .await
    }
}
