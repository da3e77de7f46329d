//! Report feed: polls the report stream and hands new reports to the
//! ingestion loop.
//!
//! The cursor starts at the newest report present at startup, so history is
//! never re-analysed after a restart. Each poll fetches reports with a
//! greater id, oldest first, and keeps fetching while batches come back full.
//!
//! Ids come from a sequence, so a report whose insert commits after a higher
//! id was already read falls behind the cursor and is never analysed. Such a
//! report is a missed alert, not an error; the next report from the same
//! machine is evaluated normally.

use std::sync::Arc;
use std::time::Duration;

use machwatch_core::report::RawReport;
use machwatch_core::store::ReportSource;
use machwatch_core::types::DbId;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

pub struct ReportFeed {
    source: Arc<dyn ReportSource>,
    poll_interval: Duration,
    batch_size: i64,
    start_cursor: Option<DbId>,
}

impl ReportFeed {
    pub fn new(source: Arc<dyn ReportSource>, poll_interval: Duration, batch_size: i64) -> Self {
        Self {
            source,
            poll_interval,
            batch_size: batch_size.max(1),
            start_cursor: None,
        }
    }

    /// Start after `cursor` instead of at the newest report.
    pub fn starting_after(mut self, cursor: DbId) -> Self {
        self.start_cursor = Some(cursor);
        self
    }

    /// Run until `cancel` fires or the ingestion side hangs up. Returns the
    /// id of the last report handed over.
    pub async fn run(self, tx: mpsc::Sender<RawReport>, cancel: CancellationToken) -> DbId {
        let mut interval = tokio::time::interval(self.poll_interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        // Reports committed late below the cursor are skipped (see module docs).
        let mut cursor = self.start_cursor;

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!(cursor = ?cursor, "Report feed stopping");
                    break;
                }
                _ = interval.tick() => {
                    let Some(current) = cursor else {
                        cursor = self.initial_cursor().await;
                        continue;
                    };
                    match self.drain(current, &tx, &cancel).await {
                        Ok(next) => cursor = Some(next),
                        Err(next) => {
                            tracing::info!(cursor = next, "Ingestion closed, report feed stopping");
                            return next;
                        }
                    }
                }
            }
        }

        cursor.unwrap_or_default()
    }

    async fn initial_cursor(&self) -> Option<DbId> {
        match self.source.latest_report_id().await {
            Ok(latest) => {
                let cursor = latest.unwrap_or(0);
                tracing::info!(cursor, "Report feed started");
                Some(cursor)
            }
            Err(e) => {
                tracing::error!(error = %e, "Report feed: failed to read latest report id");
                None
            }
        }
    }

    /// Forward every report after `cursor`. `Err` carries the cursor reached
    /// when the receiver was dropped.
    async fn drain(
        &self,
        mut cursor: DbId,
        tx: &mpsc::Sender<RawReport>,
        cancel: &CancellationToken,
    ) -> Result<DbId, DbId> {
        loop {
            let batch = match self.source.reports_after(cursor, self.batch_size).await {
                Ok(batch) => batch,
                Err(e) => {
                    tracing::error!(error = %e, cursor, "Report feed: poll failed");
                    return Ok(cursor);
                }
            };
            let full = batch.len() as i64 >= self.batch_size;

            for report in batch {
                let id = report.id;
                tokio::select! {
                    _ = cancel.cancelled() => return Ok(cursor),
                    sent = tx.send(report) => {
                        if sent.is_err() {
                            return Err(cursor);
                        }
                    }
                }
                cursor = id;
            }

            if !full || cancel.is_cancelled() {
                return Ok(cursor);
            }
        }
    }
}
