//! Repository for the `issues` table.
//!
//! Status is stored as a SMALLINT foreign key into `issue_statuses`; see
//! [`IssueStatus::id`].

use machwatch_core::issue::{IssueDraft, IssuePatch, IssueStatus};
use machwatch_core::types::DbId;
use sqlx::PgPool;

use crate::models::issue::IssueRow;

/// Column list for `issues` queries.
const COLUMNS: &str = "\
    id, machine_id, message, fault_probability, temperature, vibration, \
    sound, status_id, fix_description, report_id, merged_report_ids, \
    created_at, updated_at";

/// Provides query operations for machine issues.
pub struct IssueRepo;

impl IssueRepo {
    /// Oldest `Open` issue for a machine.
    pub async fn find_open_for_machine(
        pool: &PgPool,
        machine_id: DbId,
    ) -> Result<Option<IssueRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM issues \
             WHERE machine_id = $1 AND status_id = $2 \
             ORDER BY created_at ASC, id ASC \
             LIMIT 1"
        );
        sqlx::query_as::<_, IssueRow>(&query)
            .bind(machine_id)
            .bind(IssueStatus::Open.id())
            .fetch_optional(pool)
            .await
    }

    /// Issue whose origin or merged reports include `report_id`.
    pub async fn find_by_report(
        pool: &PgPool,
        report_id: DbId,
    ) -> Result<Option<IssueRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM issues \
             WHERE report_id = $1 OR merged_report_ids @> ARRAY[$1::BIGINT] \
             ORDER BY id ASC \
             LIMIT 1"
        );
        sqlx::query_as::<_, IssueRow>(&query)
            .bind(report_id)
            .fetch_optional(pool)
            .await
    }

    pub async fn create(pool: &PgPool, draft: &IssueDraft) -> Result<IssueRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO issues \
                (machine_id, message, fault_probability, temperature, vibration, \
                 sound, status_id, report_id, merged_report_ids) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, ARRAY[$8::BIGINT]) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, IssueRow>(&query)
            .bind(draft.machine_id)
            .bind(&draft.message)
            .bind(draft.fault_probability)
            .bind(draft.temperature)
            .bind(draft.vibration)
            .bind(draft.sound.as_str())
            .bind(draft.status.id())
            .bind(draft.report_id)
            .fetch_one(pool)
            .await
    }

    /// Apply a partial update. Absent fields keep their stored value; a
    /// merged report id is appended unless already present.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        patch: &IssuePatch,
    ) -> Result<Option<IssueRow>, sqlx::Error> {
        let query = format!(
            "UPDATE issues SET \
                message = COALESCE($2, message), \
                fault_probability = COALESCE($3, fault_probability), \
                temperature = COALESCE($4, temperature), \
                vibration = COALESCE($5, vibration), \
                sound = COALESCE($6, sound), \
                status_id = COALESCE($7, status_id), \
                fix_description = COALESCE($8, fix_description), \
                merged_report_ids = CASE \
                    WHEN $9::BIGINT IS NULL OR $9::BIGINT = ANY(merged_report_ids) \
                        THEN merged_report_ids \
                    ELSE array_append(merged_report_ids, $9::BIGINT) \
                END, \
                updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, IssueRow>(&query)
            .bind(id)
            .bind(&patch.message)
            .bind(patch.fault_probability)
            .bind(patch.temperature)
            .bind(patch.vibration)
            .bind(patch.sound.map(|s| s.as_str()))
            .bind(patch.status.map(IssueStatus::id))
            .bind(&patch.fix_description)
            .bind(patch.merged_report_id)
            .fetch_optional(pool)
            .await
    }

    pub async fn get_by_id(pool: &PgPool, id: DbId) -> Result<Option<IssueRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM issues WHERE id = $1");
        sqlx::query_as::<_, IssueRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Open and in-progress issues for a machine, oldest first.
    pub async fn list_unresolved(
        pool: &PgPool,
        machine_id: DbId,
    ) -> Result<Vec<IssueRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM issues \
             WHERE machine_id = $1 AND status_id IN ($2, $3) \
             ORDER BY created_at ASC, id ASC"
        );
        sqlx::query_as::<_, IssueRow>(&query)
            .bind(machine_id)
            .bind(IssueStatus::Open.id())
            .bind(IssueStatus::InProgress.id())
            .fetch_all(pool)
            .await
    }
}
