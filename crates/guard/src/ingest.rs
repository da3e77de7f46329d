//! Report ingestion: the single consumer that turns reports into issues.
//!
//! Exactly one task runs [`Ingestor::run`], so reports are evaluated and
//! merged strictly one at a time and two reports for the same machine can
//! never race on its open issue.

use std::sync::Arc;

use chrono::Utc;
use machwatch_core::event_names::{EVENT_ISSUE_CREATED, EVENT_ISSUE_MERGED};
use machwatch_core::fault::evaluator::evaluate;
use machwatch_core::fault::merge::{merge_evaluation, MergeDecision};
use machwatch_core::report::RawReport;
use machwatch_core::store::LogStore;
use machwatch_core::types::DbId;
use machwatch_events::{EventBus, MonitorEvent};
use tokio::sync::mpsc;

use crate::cache::MachineCache;
use crate::error::GuardError;

/// Why a report was not evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Malformed,
    Stale,
    UnknownMachine,
}

/// What processing one report did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Skipped(SkipReason),
    /// All readings within limits.
    Clear,
    /// The report was already folded into an issue.
    Duplicate { issue_id: DbId },
    Created { issue_id: DbId },
    Merged { issue_id: DbId },
}

/// Counters returned when the loop exits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestStats {
    pub received: u64,
    pub created: u64,
    pub merged: u64,
    pub skipped: u64,
    pub failed: u64,
}

pub struct Ingestor {
    logs: Arc<dyn LogStore>,
    machines: Arc<MachineCache>,
    bus: Arc<EventBus>,
    max_age: Option<chrono::Duration>,
}

impl Ingestor {
    pub fn new(logs: Arc<dyn LogStore>, machines: Arc<MachineCache>, bus: Arc<EventBus>) -> Self {
        Self {
            logs,
            machines,
            bus,
            max_age: None,
        }
    }

    /// Ignore reports recorded longer ago than `max_age`.
    pub fn with_max_age(mut self, max_age: Option<chrono::Duration>) -> Self {
        self.max_age = max_age;
        self
    }

    /// Consume reports until the channel closes, then return the counters.
    ///
    /// A report that fails is logged and dropped; the loop carries on.
    pub async fn run(self, mut rx: mpsc::Receiver<RawReport>) -> IngestStats {
        let mut stats = IngestStats::default();
        tracing::info!("Ingestion loop started");

        while let Some(raw) = rx.recv().await {
            stats.received += 1;
            let report_id = raw.id;
            let machine_id = raw.machine_id;

            match self.process(raw).await {
                Ok(Outcome::Created { .. }) => stats.created += 1,
                Ok(Outcome::Merged { .. }) => stats.merged += 1,
                Ok(Outcome::Skipped(_)) => stats.skipped += 1,
                Ok(Outcome::Clear | Outcome::Duplicate { .. }) => {}
                Err(e) => {
                    stats.failed += 1;
                    tracing::error!(
                        error = %e,
                        report_id,
                        machine_id,
                        "Failed to process report, dropping it"
                    );
                }
            }
        }

        tracing::info!(
            received = stats.received,
            created = stats.created,
            merged = stats.merged,
            skipped = stats.skipped,
            failed = stats.failed,
            "Ingestion loop stopped"
        );
        stats
    }

    /// Evaluate one report and write the resulting issue change.
    pub async fn process(&self, raw: RawReport) -> Result<Outcome, GuardError> {
        let report = match raw.validate() {
            Ok(report) => report,
            Err(e) => {
                tracing::warn!(error = %e, "Malformed report skipped");
                return Ok(Outcome::Skipped(SkipReason::Malformed));
            }
        };

        if let Some(max_age) = self.max_age {
            let age = Utc::now().signed_duration_since(report.recorded_at);
            if age > max_age {
                tracing::debug!(
                    report_id = report.id,
                    age_secs = age.num_seconds(),
                    "Stale report skipped"
                );
                return Ok(Outcome::Skipped(SkipReason::Stale));
            }
        }

        let Some(machine) = self.machines.get(report.machine_id).await? else {
            tracing::debug!(
                report_id = report.id,
                machine_id = report.machine_id,
                "Report for unknown machine skipped"
            );
            return Ok(Outcome::Skipped(SkipReason::UnknownMachine));
        };

        let mut evaluation = evaluate(&report, &machine)?;
        if !evaluation.is_violation() {
            return Ok(Outcome::Clear);
        }

        // About to write: the cached profile may be stale.
        let Some(current) = self.machines.reload(report.machine_id).await? else {
            tracing::debug!(
                report_id = report.id,
                machine_id = report.machine_id,
                "Machine removed since cached, report skipped"
            );
            return Ok(Outcome::Skipped(SkipReason::UnknownMachine));
        };
        if current != machine {
            evaluation = evaluate(&report, &current)?;
            if !evaluation.is_violation() {
                return Ok(Outcome::Clear);
            }
        }

        if let Some(issue) = self.logs.find_issue_by_report(report.id).await? {
            tracing::debug!(report_id = report.id, issue_id = issue.id, "Report already recorded");
            return Ok(Outcome::Duplicate { issue_id: issue.id });
        }

        let existing = self.logs.find_open_issue(report.machine_id).await?;

        match merge_evaluation(&report, &evaluation, existing.as_ref()) {
            MergeDecision::NoAction => Ok(Outcome::Clear),
            MergeDecision::Create(draft) => {
                let issue_id = self.logs.create_issue(&draft).await?;
                tracing::info!(
                    machine_id = draft.machine_id,
                    report_id = report.id,
                    issue_id,
                    fault_probability = draft.fault_probability,
                    message = %draft.message,
                    "Issue opened"
                );
                self.bus.publish(
                    MonitorEvent::new(EVENT_ISSUE_CREATED, draft.machine_id)
                        .with_issue(issue_id)
                        .with_report(report.id)
                        .with_payload(serde_json::json!({
                            "message": draft.message,
                            "fault_probability": draft.fault_probability,
                        })),
                );
                Ok(Outcome::Created { issue_id })
            }
            MergeDecision::Update { issue_id, patch } => {
                self.logs.update_issue(issue_id, &patch).await?;
                tracing::info!(
                    machine_id = report.machine_id,
                    report_id = report.id,
                    issue_id,
                    fault_probability = ?patch.fault_probability,
                    "Report merged into open issue"
                );
                self.bus.publish(
                    MonitorEvent::new(EVENT_ISSUE_MERGED, report.machine_id)
                        .with_issue(issue_id)
                        .with_report(report.id)
                        .with_payload(serde_json::json!({
                            "fault_probability": patch.fault_probability,
                            "message": patch.message,
                        })),
                );
                Ok(Outcome::Merged { issue_id })
            }
        }
    }
}
