//! Issue merging: fold a report's violations into at most one open issue
//! per machine.
//!
//! Probability is additive and never decays on its own. A machine with
//! intermittent faults escalates until someone resolves the issue.

use serde::Serialize;

use crate::error::CoreError;
use crate::fault::evaluator::{evaluate, Evaluation};
use crate::issue::{Issue, IssueDraft, IssuePatch, IssueStatus};
use crate::machine::Machine;
use crate::report::Report;
use crate::types::DbId;

/// Highest probability a freshly created issue may carry.
pub const CREATE_PROBABILITY_CAP: i32 = 99;

/// Highest probability a merged issue may reach.
pub const MERGE_PROBABILITY_CAP: i32 = 100;

/// Separator between problem phrases in an issue message.
pub const PHRASE_SEPARATOR: &str = ", ";

/// What the caller should write to the log store for one report.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum MergeDecision {
    /// Nothing to write.
    NoAction,
    /// Open a new issue.
    Create(IssueDraft),
    /// Patch the existing open issue.
    Update { issue_id: DbId, patch: IssuePatch },
}

/// Evaluate `report` and decide how it changes the machine's issues.
///
/// `existing` is the machine's current open issue, if the store has one.
pub fn merge(
    report: &Report,
    machine: &Machine,
    existing: Option<&Issue>,
) -> Result<MergeDecision, CoreError> {
    let evaluation = evaluate(report, machine)?;
    Ok(merge_evaluation(report, &evaluation, existing))
}

/// Decide the store writes for an already evaluated report.
pub fn merge_evaluation(
    report: &Report,
    evaluation: &Evaluation,
    existing: Option<&Issue>,
) -> MergeDecision {
    if !evaluation.is_violation() {
        return MergeDecision::NoAction;
    }

    match existing {
        Some(issue) if issue.references_report(report.id) => MergeDecision::NoAction,
        Some(issue) if issue.status.is_mergeable() && issue.machine_id == report.machine_id => {
            MergeDecision::Update {
                issue_id: issue.id,
                patch: merge_patch(issue, report, evaluation),
            }
        }
        _ => MergeDecision::Create(new_issue(report, evaluation)),
    }
}

fn new_issue(report: &Report, evaluation: &Evaluation) -> IssueDraft {
    IssueDraft {
        machine_id: report.machine_id,
        message: evaluation.phrases().join(PHRASE_SEPARATOR),
        fault_probability: evaluation.raw_probability.min(CREATE_PROBABILITY_CAP),
        temperature: report.temp,
        vibration: report.vib,
        sound: report.sound,
        status: IssueStatus::Open,
        report_id: report.id,
    }
}

fn merge_patch(issue: &Issue, report: &Report, evaluation: &Evaluation) -> IssuePatch {
    let message = extend_message(&issue.message, &evaluation.phrases());
    let probability = issue
        .fault_probability
        .saturating_add(evaluation.raw_probability)
        .min(MERGE_PROBABILITY_CAP);

    IssuePatch {
        message: (message != issue.message).then_some(message),
        fault_probability: Some(probability),
        temperature: Some(report.temp),
        vibration: Some(report.vib),
        // The worst sound heard since the issue opened is kept.
        sound: Some(issue.sound.max(report.sound)),
        merged_report_id: Some(report.id),
        ..IssuePatch::default()
    }
}

/// The keyword identifying a phrase: its text before the first `(`.
pub fn phrase_keyword(phrase: &str) -> &str {
    phrase.split('(').next().unwrap_or(phrase).trim()
}

/// Append every phrase whose keyword the message does not mention yet.
pub fn extend_message(existing: &str, phrases: &[String]) -> String {
    let mut message = existing.trim().to_string();
    for phrase in phrases {
        if message.contains(phrase_keyword(phrase)) {
            continue;
        }
        if !message.is_empty() {
            message.push_str(PHRASE_SEPARATOR);
        }
        message.push_str(phrase);
    }
    message
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
